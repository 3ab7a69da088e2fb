//! # Etiquetas: Classes Gramaticais, Rótulo TERM e Esquema BIO
//!
//! Define o vocabulário de rótulos usado pelo sistema:
//!
//! - [`Pos`]: classes gramaticais (conjunto Universal Dependencies) atribuídas
//!   pelo provedor de anotação e consultadas pelos padrões.
//! - [`EntityMatch`]: um trecho `[start, end)` de uma sentença rotulado como `TERM`.
//! - [`Tag`]: o esquema **BIO** usado na saída do corpus.
//!
//! ## Esquema BIO
//!
//! - `B-TERM`: Begin — primeiro token de um termo
//! - `I-TERM`: Inside — tokens subsequentes do mesmo termo
//! - `O`: Outside — não faz parte de nenhum termo

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// O único rótulo de entidade produzido pelo sistema.
pub const TERM_LABEL: &str = "TERM";

/// Classes gramaticais (Universal POS tags).
///
/// Os padrões só olham para `ADJ`, `NOUN` e `PROPN`, mas o provedor de anotação
/// precisa distinguir as demais para não deixar um verbo entrar num sintagma nominal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Pos {
    Adj,
    Adp,
    Adv,
    Aux,
    Cconj,
    Det,
    Intj,
    Noun,
    Num,
    Part,
    Pron,
    Propn,
    Punct,
    Sconj,
    Sym,
    Verb,
    X,
}

impl Pos {
    /// Substantivo comum ou próprio.
    pub fn is_nominal(&self) -> bool {
        matches!(self, Pos::Noun | Pos::Propn)
    }
}

/// Um termo encontrado numa sentença.
///
/// Os offsets são relativos ao início da **sentença** que contém o termo
/// (não do documento), em bytes. `sentence[start..end]` é exatamente o
/// trecho casado pelo padrão.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMatch {
    pub start: usize,
    pub end: usize,
    pub label: String,
}

impl EntityMatch {
    pub fn term(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            label: TERM_LABEL.to_string(),
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Dois matches se sobrepõem quando compartilham ao menos um byte.
    pub fn overlaps(&self, other: &EntityMatch) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Tag BIO aplicada a um token do corpus de saída.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tag {
    /// **Begin**: primeiro token de um termo.
    Begin,
    /// **Inside**: continuação de um termo.
    Inside,
    /// **Outside**: o token não faz parte de nenhum termo.
    Outside,
}

impl Tag {
    /// Representação textual da tag (ex: "B-TERM", "I-TERM", "O")
    pub fn label(&self) -> String {
        match self {
            Tag::Begin => format!("B-{TERM_LABEL}"),
            Tag::Inside => format!("I-{TERM_LABEL}"),
            Tag::Outside => "O".to_string(),
        }
    }
}

/// Converte spans de tokens (não sobrepostos, fim exclusivo) em tags BIO.
///
/// Spans fora do intervalo `0..n_tokens` são ignorados.
///
/// # Exemplo
/// `n_tokens = 5`, spans `[1..3, 4..5]` -> `[O, B, I, O, B]`
pub fn spans_to_tags(n_tokens: usize, spans: &[Range<usize>]) -> Vec<Tag> {
    let mut tags = vec![Tag::Outside; n_tokens];
    for span in spans {
        if span.start >= span.end || span.end > n_tokens {
            continue;
        }
        tags[span.start] = Tag::Begin;
        for tag in &mut tags[span.start + 1..span.end] {
            *tag = Tag::Inside;
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_labels() {
        assert_eq!(Tag::Outside.label(), "O");
        assert_eq!(Tag::Begin.label(), "B-TERM");
        assert_eq!(Tag::Inside.label(), "I-TERM");
    }

    #[test]
    fn test_pos_serde_names() {
        // nomes UD em maiúsculas, como no corpus gravado
        assert_eq!(serde_json::to_string(&Pos::Propn).unwrap(), "\"PROPN\"");
        assert_eq!(serde_json::to_string(&Pos::Cconj).unwrap(), "\"CCONJ\"");
        for pos in [Pos::Adj, Pos::Noun, Pos::Propn, Pos::Verb, Pos::Punct] {
            let json = serde_json::to_string(&pos).unwrap();
            assert_eq!(serde_json::from_str::<Pos>(&json).unwrap(), pos);
        }
        assert!(serde_json::from_str::<Pos>("\"nope\"").is_err());
    }

    #[test]
    fn test_nominal_classes() {
        assert!(Pos::Noun.is_nominal());
        assert!(Pos::Propn.is_nominal());
        assert!(!Pos::Adj.is_nominal());
    }

    #[test]
    fn test_spans_to_tags() {
        let tags = spans_to_tags(5, &[1..3, 4..5]);
        assert_eq!(
            tags,
            vec![Tag::Outside, Tag::Begin, Tag::Inside, Tag::Outside, Tag::Begin]
        );
    }

    #[test]
    fn test_entity_overlap() {
        let a = EntityMatch::term(0, 5);
        assert!(a.overlaps(&EntityMatch::term(4, 8)));
        assert!(!a.overlaps(&EntityMatch::term(5, 8)));
    }
}
