//! # Compilador de Padrões — Da Lista de Termos às Regras de Tokens
//!
//! Cada termo do vocabulário vira um ou mais [`Pattern`]s: sequências de
//! restrições sobre tokens anotados, cada uma com um quantificador.
//!
//! ## Regras de compilação
//!
//! | Entrada | Padrão |
//! |---------|--------|
//! | termo com várias palavras | `MOD*` + uma restrição `TEXT=palavra` por palavra + `NOME*` |
//! | termo de uma palavra (a) | `MOD*` + `TEXT=termo ∧ POS∈{NOUN,PROPN}` + `NOME_SEM_DIGITO*` |
//! | termo de uma palavra (b) | `MOD*` + `TEXT=termo ∧ POS∈{NOUN,PROPN}` + `TEXT=of` + `NOME+` |
//! | fixo (c) | três sequências `TITULO+` (nomes próprios compostos) |
//! | fixo (d) | sigla: `^[A-Z]{2,}s?`, até 4 caracteres, fora da lista de exclusão |
//!
//! Onde `MOD` = `POS∈{ADJ,NOUN,PROPN} ∧ ¬stop` e `NOME` = `POS∈{NOUN,PROPN} ∧ ¬stop`.
//!
//! O padrão (b) captura construções genitivas do tipo "sensor of temperature".

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::annotation::AnnotatedToken;
use crate::error::{NerDataError, Result};
use crate::tagger::Pos;
use crate::vocabulary::Term;

/// Capacidade de testar um único token.
pub trait TokenTest {
    fn matches(&self, token: &AnnotatedToken) -> bool;
}

/// Um predicado atômico sobre um token.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Classe gramatical pertence ao conjunto.
    PosIn(Vec<Pos>),
    IsStop(bool),
    /// Texto exato (sensível a maiúsculas).
    Text(String),
    /// Texto fora da lista.
    TextNotIn(Vec<String>),
    IsTitle(bool),
    IsDigit(bool),
    /// Comprimento em caracteres menor ou igual ao limite.
    LengthAtMost(usize),
    /// Busca da regex no texto do token.
    Regex(Regex),
}

impl PartialEq for Predicate {
    fn eq(&self, other: &Self) -> bool {
        use Predicate::*;
        match (self, other) {
            (PosIn(a), PosIn(b)) => a == b,
            (IsStop(a), IsStop(b)) => a == b,
            (Text(a), Text(b)) => a == b,
            (TextNotIn(a), TextNotIn(b)) => a == b,
            (IsTitle(a), IsTitle(b)) => a == b,
            (IsDigit(a), IsDigit(b)) => a == b,
            (LengthAtMost(a), LengthAtMost(b)) => a == b,
            (Regex(a), Regex(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl TokenTest for Predicate {
    fn matches(&self, token: &AnnotatedToken) -> bool {
        match self {
            Predicate::PosIn(tags) => tags.contains(&token.pos),
            Predicate::IsStop(flag) => token.is_stop == *flag,
            Predicate::Text(text) => token.text == *text,
            Predicate::TextNotIn(list) => !list.iter().any(|t| *t == token.text),
            Predicate::IsTitle(flag) => token.is_title == *flag,
            Predicate::IsDigit(flag) => token.is_digit == *flag,
            Predicate::LengthAtMost(max) => token.char_len() <= *max,
            Predicate::Regex(re) => re.is_match(&token.text),
        }
    }
}

/// Quantas vezes uma restrição pode se repetir.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Quantifier {
    /// Exatamente uma vez.
    #[default]
    One,
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
}

impl Quantifier {
    /// Pode ser pulada sem consumir token.
    pub fn is_optional(&self) -> bool {
        matches!(self, Quantifier::ZeroOrMore)
    }

    /// Pode consumir mais de um token.
    pub fn repeats(&self) -> bool {
        matches!(self, Quantifier::ZeroOrMore | Quantifier::OneOrMore)
    }
}

/// Conjunção de predicados + quantificador.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TokenConstraint {
    pub predicates: Vec<Predicate>,
    pub quantifier: Quantifier,
}

impl TokenConstraint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn pos(self, tags: &[Pos]) -> Self {
        self.with(Predicate::PosIn(tags.to_vec()))
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.with(Predicate::Text(text.into()))
    }

    pub fn not_stop(self) -> Self {
        self.with(Predicate::IsStop(false))
    }

    pub fn zero_or_more(mut self) -> Self {
        self.quantifier = Quantifier::ZeroOrMore;
        self
    }

    pub fn one_or_more(mut self) -> Self {
        self.quantifier = Quantifier::OneOrMore;
        self
    }
}

impl TokenTest for TokenConstraint {
    fn matches(&self, token: &AnnotatedToken) -> bool {
        self.predicates.iter().all(|p| p.matches(token))
    }
}

/// Sequência ordenada e não vazia de restrições. Imutável depois de criada.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    constraints: Vec<TokenConstraint>,
}

impl Pattern {
    pub fn new(constraints: Vec<TokenConstraint>) -> Result<Self> {
        if constraints.is_empty() {
            return Err(NerDataError::EmptyPattern);
        }
        Ok(Self { constraints })
    }

    pub fn constraints(&self) -> &[TokenConstraint] {
        &self.constraints
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Textos exatos que todo casamento contém: os predicados `Text` das
    /// restrições não opcionais.
    pub fn required_texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.constraints
            .iter()
            .filter(|c| !c.quantifier.is_optional())
            .flat_map(|c| c.predicates.iter())
            .filter_map(|p| match p {
                Predicate::Text(text) => Some(text.as_str()),
                _ => None,
            })
    }
}

/// Siglas que o padrão (d) aceitaria mas que são ruído em patentes.
pub const DEFAULT_ACRONYM_EXCLUSIONS: &[&str] =
    &["XMLs", "FIG", "FIGS", "CODE", "CORE", "TIME", "ART", "LIST"];

const ACRONYM_REGEX: &str = "^[A-Z]{2,}s?";
const ACRONYM_MAX_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    pub acronym_exclusions: Vec<String>,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            acronym_exclusions: DEFAULT_ACRONYM_EXCLUSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

const MODIFIER_POS: &[Pos] = &[Pos::Adj, Pos::Noun, Pos::Propn];
const NOMINAL_POS: &[Pos] = &[Pos::Propn, Pos::Noun];

/// Transforma a lista de termos em padrões de tokens.
pub struct PatternCompiler {
    config: PatternConfig,
    acronym_regex: Regex,
}

impl PatternCompiler {
    pub fn new(config: PatternConfig) -> Result<Self> {
        Ok(Self {
            config,
            acronym_regex: Regex::new(ACRONYM_REGEX)?,
        })
    }

    /// Compila o vocabulário. Os padrões de cada termo vêm na ordem do
    /// vocabulário, seguidos dos dois padrões estruturais fixos.
    pub fn compile(&self, terms: &[Term]) -> Result<Vec<Pattern>> {
        let mut patterns = Vec::with_capacity(terms.len() * 2 + 2);
        for term in terms {
            if term.is_blank() {
                warn!("termo vazio ignorado na compilação");
                continue;
            }
            if term.is_multi_word() {
                patterns.push(self.multi_word(term)?);
            } else {
                let (noun_run, genitive) = self.single_word(&term.words[0])?;
                patterns.push(noun_run);
                patterns.push(genitive);
            }
        }
        patterns.push(self.title_run()?);
        patterns.push(self.acronym()?);
        Ok(patterns)
    }

    fn modifier_run() -> TokenConstraint {
        TokenConstraint::new().pos(MODIFIER_POS).not_stop().zero_or_more()
    }

    fn multi_word(&self, term: &Term) -> Result<Pattern> {
        let mut constraints = vec![Self::modifier_run()];
        constraints.extend(term.words.iter().map(|w| TokenConstraint::new().text(w.as_str())));
        constraints.push(TokenConstraint::new().pos(NOMINAL_POS).not_stop().zero_or_more());
        Pattern::new(constraints)
    }

    fn single_word(&self, word: &str) -> Result<(Pattern, Pattern)> {
        let head = TokenConstraint::new().text(word).pos(NOMINAL_POS);

        let noun_run = Pattern::new(vec![
            Self::modifier_run(),
            head.clone(),
            TokenConstraint::new()
                .pos(NOMINAL_POS)
                .not_stop()
                .with(Predicate::IsDigit(false))
                .zero_or_more(),
        ])?;

        let genitive = Pattern::new(vec![
            Self::modifier_run(),
            head,
            TokenConstraint::new().text("of"),
            TokenConstraint::new().pos(NOMINAL_POS).not_stop().one_or_more(),
        ])?;

        Ok((noun_run, genitive))
    }

    fn title_run(&self) -> Result<Pattern> {
        let titled = TokenConstraint::new()
            .pos(NOMINAL_POS)
            .with(Predicate::IsTitle(true))
            .one_or_more();
        Pattern::new(vec![titled.clone(), titled.clone(), titled])
    }

    fn acronym(&self) -> Result<Pattern> {
        Pattern::new(vec![TokenConstraint::new()
            .pos(NOMINAL_POS)
            .with(Predicate::LengthAtMost(ACRONYM_MAX_LEN))
            .not_stop()
            .with(Predicate::Regex(self.acronym_regex.clone()))
            .with(Predicate::TextNotIn(self.config.acronym_exclusions.clone()))])
    }
}
