//! # Casamento de Padrões — Spans de Termos em Sentenças Anotadas
//!
//! O [`Matcher`] recebe os padrões compilados (todos sob o rótulo `TERM`) e
//! os executa sobre um [`Doc`] anotado.
//!
//! ## Algoritmo
//!
//! Cada padrão é um autômato com um estado por restrição. A partir de cada
//! token inicial, simulamos o autômato no estilo Thompson (conjunto de
//! estados ativos, sem backtracking):
//!
//! - `*` pode ser pulada (transição vazia) ou consumir e permanecer;
//! - `+` precisa consumir ao menos uma vez e pode permanecer;
//! - sem quantificador, consome exatamente um token.
//!
//! **Todo** ponto em que o estado de aceitação é alcançado gera um span:
//! "heat exchanger" e "heat exchanger core" saem ambos. A escolha fica para
//! [`filter_spans`]: mais longo primeiro, empate resolvido pelo início mais
//! à esquerda, sem nunca compartilhar tokens.
//!
//! ## Exemplo
//! ```text
//! "A heat exchanger core"   termo: "heat exchanger"
//!   candidatos: [1..3] [1..4]
//!   filtrado:   [1..4] → "heat exchanger core"
//! ```

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::ops::Range;

use tracing::trace;

use crate::annotation::{AnnotatedToken, Doc};
use crate::dataset::Record;
use crate::pattern::{Pattern, TokenTest};
use crate::tagger::EntityMatch;

/// Intervalo de tokens `[start, end)` dentro de um [`Doc`].
pub type TokenSpan = Range<usize>;

/// Executa um lote de padrões registrados sob um único rótulo.
#[derive(Debug, Clone)]
pub struct Matcher {
    label: String,
    patterns: Vec<Pattern>,
}

impl Matcher {
    pub fn new(label: impl Into<String>, patterns: Vec<Pattern>) -> Self {
        Self {
            label: label.into(),
            patterns,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Todos os spans casados por algum padrão, sem repetição, ordenados por
    /// `(start, end)`. Spans sobrepostos são mantidos.
    ///
    /// Padrões que exigem uma palavra ausente do documento nem são simulados.
    pub fn find_all(&self, doc: &Doc) -> Vec<TokenSpan> {
        let words: HashSet<&str> = doc.tokens.iter().map(|t| t.text.as_str()).collect();
        let mut nfa = NfaBuffers::default();
        let mut found: HashSet<(usize, usize)> = HashSet::new();
        for pattern in &self.patterns {
            if !pattern.required_texts().all(|w| words.contains(w)) {
                continue;
            }
            for start in 0..doc.tokens.len() {
                nfa.run(pattern, &doc.tokens, start, |end| {
                    found.insert((start, end));
                });
            }
        }
        let mut spans: Vec<TokenSpan> = found.into_iter().map(|(s, e)| s..e).collect();
        spans.sort_by_key(|s| (s.start, s.end));
        spans
    }

    /// Spans finais: [`find_all`](Self::find_all) seguido de [`filter_spans`].
    pub fn find(&self, doc: &Doc) -> Vec<TokenSpan> {
        filter_spans(self.find_all(doc))
    }

    /// Agrupa os spans finais por sentença.
    ///
    /// Os offsets de cada [`EntityMatch`] são bytes relativos ao início da
    /// sentença. As sentenças saem na ordem em que aparecem no documento.
    /// Uma sentença repetida no documento forma um só grupo, e um match que
    /// se sobrepõe a outro do grupo é ignorado. Um span cuja sentença não
    /// pode ser determinada é descartado.
    pub fn collect_sentences(&self, doc: &Doc) -> Vec<(String, Vec<EntityMatch>)> {
        let mut grouped: Vec<(String, Vec<EntityMatch>)> = Vec::new();
        let mut position: HashMap<String, usize> = HashMap::new();

        for span in self.find(doc) {
            let (Some(sentence), Some(bytes)) =
                (doc.sentence_of(span.clone()), doc.byte_range(span.clone()))
            else {
                trace!("span {:?} sem sentença, descartado", span);
                continue;
            };
            let entity = EntityMatch {
                start: bytes.start - sentence.start,
                end: bytes.end - sentence.start,
                label: self.label.clone(),
            };
            match position.get(sentence.text) {
                Some(&i) => {
                    let entities = &mut grouped[i].1;
                    if !entities.iter().any(|e| e.overlaps(&entity)) {
                        entities.push(entity);
                    }
                }
                None => {
                    position.insert(sentence.text.to_string(), grouped.len());
                    grouped.push((sentence.text.to_string(), vec![entity]));
                }
            }
        }
        for (_, entities) in &mut grouped {
            entities.sort_by_key(|e| e.start);
        }
        grouped
    }
}

/// Conjuntos de estados da simulação, reaproveitados entre execuções.
#[derive(Debug, Default)]
struct NfaBuffers {
    states: Vec<bool>,
    next: Vec<bool>,
}

impl NfaBuffers {
    /// Simula o autômato do padrão a partir de `start` e chama `on_accept`
    /// com cada posição final (exclusiva) em que ele aceita. Casamentos
    /// vazios não contam.
    fn run(
        &mut self,
        pattern: &Pattern,
        tokens: &[AnnotatedToken],
        start: usize,
        mut on_accept: impl FnMut(usize),
    ) {
        let constraints = pattern.constraints();
        let accept = constraints.len();

        let closure = |states: &mut [bool]| {
            for i in 0..accept {
                if states[i] && constraints[i].quantifier.is_optional() {
                    states[i + 1] = true;
                }
            }
        };

        self.states.clear();
        self.states.resize(accept + 1, false);
        self.states[0] = true;
        closure(&mut self.states[..]);

        for (offset, token) in tokens[start..].iter().enumerate() {
            self.next.clear();
            self.next.resize(accept + 1, false);
            for i in 0..accept {
                if self.states[i] && constraints[i].matches(token) {
                    self.next[i + 1] = true;
                    if constraints[i].quantifier.repeats() {
                        self.next[i] = true;
                    }
                }
            }
            closure(&mut self.next[..]);
            if !self.next.contains(&true) {
                break;
            }
            if self.next[accept] {
                on_accept(start + offset + 1);
            }
            std::mem::swap(&mut self.states, &mut self.next);
        }
    }
}

/// Resolve sobreposições: ordena por (tamanho desc, início asc) e aceita
/// gulosamente cada span que não compartilha token com um já aceito.
/// O resultado sai ordenado por início.
pub fn filter_spans(mut spans: Vec<TokenSpan>) -> Vec<TokenSpan> {
    spans.sort_by_key(|s| (Reverse(s.len()), s.start));

    let mut taken: HashSet<usize> = HashSet::new();
    let mut kept = Vec::new();
    for span in spans {
        if span.is_empty() || span.clone().any(|i| taken.contains(&i)) {
            continue;
        }
        taken.extend(span.clone());
        kept.push(span);
    }
    kept.sort_by_key(|s| s.start);
    kept
}

/// Registros indexados pelo texto da sentença, na ordem da primeira inserção.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: Vec<Record>,
    index: HashMap<String, usize>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insere os matches de uma sentença.
    ///
    /// Se a sentença já existe, só entram os matches que não se sobrepõem a
    /// nenhum já presente. Sem matches, nenhum registro é criado.
    pub fn insert(&mut self, text: String, matches: Vec<EntityMatch>) {
        if matches.is_empty() {
            return;
        }
        let i = match self.index.get(&text) {
            Some(&i) => i,
            None => {
                self.index.insert(text.clone(), self.records.len());
                self.records.push(Record {
                    text,
                    entities: Vec::new(),
                });
                self.records.len() - 1
            }
        };

        let entities = &mut self.records[i].entities;
        for m in matches {
            if !entities.iter().any(|e| e.overlaps(&m)) {
                entities.push(m);
            }
        }
        entities.sort_by_key(|e| e.start);
    }

    /// Insere todas as sentenças com termos de um documento.
    pub fn extend_from_doc(&mut self, matcher: &Matcher, doc: &Doc) {
        for (text, matches) in matcher.collect_sentences(doc) {
            self.insert(text, matches);
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, text: &str) -> Option<&Record> {
        self.index.get(text).map(|&i| &self.records[i])
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnotationProvider, HeuristicAnnotator};
    use crate::pattern::{PatternCompiler, PatternConfig};
    use crate::tagger::TERM_LABEL;
    use crate::vocabulary::Term;

    fn matcher(terms: &[&str]) -> Matcher {
        let terms: Vec<Term> = terms.iter().map(|t| Term::new(t)).collect();
        let patterns = PatternCompiler::new(PatternConfig::default())
            .unwrap()
            .compile(&terms)
            .unwrap();
        Matcher::new(TERM_LABEL, patterns)
    }

    fn matched_texts(matcher: &Matcher, text: &str) -> Vec<String> {
        let doc = HeuristicAnnotator::default().annotate(text);
        matcher
            .find(&doc)
            .into_iter()
            .filter_map(|s| doc.byte_range(s))
            .map(|r| text[r].to_string())
            .collect()
    }

    #[test]
    fn test_heat_exchanger() {
        let m = matcher(&["heat exchanger"]);
        let text = "A heat exchanger transfers thermal energy.";
        let groups = m.collect_sentences(&HeuristicAnnotator::default().annotate(text));
        assert_eq!(groups.len(), 1);
        let (sentence, matches) = &groups[0];
        assert_eq!(sentence, text);
        assert_eq!(matches, &vec![EntityMatch::term(2, 16)]);
        assert_eq!(&sentence[2..16], "heat exchanger");
    }

    #[test]
    fn test_longest_match_wins() {
        let m = matcher(&["heat exchanger", "exchanger"]);
        let doc = HeuristicAnnotator::default().annotate("A heat exchanger core");
        let all = m.find_all(&doc);
        assert!(all.contains(&(1..3)));
        assert!(all.contains(&(2..4)));
        assert_eq!(m.find(&doc), vec![1..4]);
    }

    #[test]
    fn test_determiner_blocks_genitive() {
        let m = matcher(&["sensor"]);
        assert_eq!(
            matched_texts(&m, "a temperature sensor of the engine"),
            ["temperature sensor"]
        );
    }

    #[test]
    fn test_genitive_construction() {
        let m = matcher(&["sensor"]);
        assert_eq!(
            matched_texts(&m, "a temperature sensor of engine coolant"),
            ["temperature sensor of engine coolant"]
        );
    }

    #[test]
    fn test_single_word_requires_noun() {
        let m = matcher(&["cooling"]);
        // particípio como adjetivo: não é núcleo nominal
        assert!(matched_texts(&m, "the cooling fan is mounted").is_empty());
    }

    #[test]
    fn test_title_run_and_acronym() {
        let m = matcher(&[]);
        assert_eq!(
            matched_texts(&m, "Data is sent over the Controller Area Network bus"),
            ["Controller Area Network"]
        );
        assert_eq!(matched_texts(&m, "the ECU controls the valve"), ["ECU"]);
        assert!(matched_texts(&m, "as shown in FIG 3 the valve").is_empty());
    }

    #[test]
    fn test_filter_spans_order_and_ties() {
        let spans = vec![0..2, 1..3, 3..4, 2..5, 5..6];
        // 2..5 é o mais longo; entre 0..2 e 1..3 vence o que começa antes
        assert_eq!(filter_spans(spans), vec![0..2, 2..5, 5..6]);
        assert!(filter_spans(vec![]).is_empty());
    }

    #[test]
    fn test_filtered_spans_never_overlap() {
        let m = matcher(&["heat exchanger", "exchanger", "core", "heat", "valve"]);
        let text = "The primary heat exchanger core feeds a heat valve core assembly.";
        let doc = HeuristicAnnotator::default().annotate(text);
        let spans = m.find(&doc);
        assert!(!spans.is_empty());
        for pair in spans.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
        for (sentence, matches) in m.collect_sentences(&doc) {
            for e in &matches {
                let piece = &sentence[e.range()];
                assert_eq!(piece, piece.trim());
                assert!(!piece.is_empty());
            }
        }
    }

    #[test]
    fn test_offsets_relative_to_sentence() {
        let m = matcher(&["heat exchanger"]);
        let doc = HeuristicAnnotator::default().annotate("The pump runs. The heat exchanger is cooled.");
        let groups = m.collect_sentences(&doc);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].0, "The heat exchanger is cooled.");
        assert_eq!(groups[0].1, vec![EntityMatch::term(4, 18)]);
    }

    #[test]
    fn test_repeated_sentence_in_doc_has_no_duplicates() {
        let m = matcher(&["valve"]);
        let doc = HeuristicAnnotator::default().annotate("The valve opens! The valve opens!");
        let groups = m.collect_sentences(&doc);
        // a mesma sentença duas vezes vira um grupo com um único match
        assert_eq!(
            groups,
            vec![("The valve opens!".to_string(), vec![EntityMatch::term(4, 15)])]
        );
    }

    #[test]
    fn test_span_crossing_sentence_is_dropped() {
        let m = matcher(&["heat exchanger", "pump housing"]);
        let mut doc = HeuristicAnnotator::default().annotate("the heat exchanger and the pump housing");
        // fronteira artificial entre "heat" e "exchanger"
        doc.sents = vec![0..2, 2..7];
        assert_eq!(m.find(&doc), vec![1..3, 5..7]);

        let groups = m.collect_sentences(&doc);
        assert_eq!(
            groups,
            vec![("exchanger and the pump housing".to_string(), vec![EntityMatch::term(18, 30)])]
        );
    }

    #[test]
    fn test_unrelated_terms_do_not_change_spans() {
        let text = "A temperature sensor of engine coolant feeds the heat exchanger controller.";
        let small = matcher(&["heat exchanger", "sensor"]);
        let mut terms = vec!["heat exchanger", "sensor"];
        terms.extend(["gear train", "piston ring", "rotor blade", "valve seat", "bearing"]);
        let large = matcher(&terms);

        let doc = HeuristicAnnotator::default().annotate(text);
        assert_eq!(small.find_all(&doc), large.find_all(&doc));
        assert_eq!(matched_texts(&small, text), matched_texts(&large, text));
        assert!(!small.find(&doc).is_empty());
    }

    #[test]
    fn test_record_set_merges_without_overlap() {
        let mut set = RecordSet::new();
        let text = "a heat exchanger and a pump housing".to_string();
        set.insert(text.clone(), vec![EntityMatch::term(2, 16)]);
        set.insert(text.clone(), vec![EntityMatch::term(7, 16), EntityMatch::term(23, 35)]);
        set.insert("nothing here at all".to_string(), vec![]);

        assert_eq!(set.len(), 1);
        let record = set.get(&text).unwrap();
        assert_eq!(
            record.entities,
            vec![EntityMatch::term(2, 16), EntityMatch::term(23, 35)]
        );
    }

    #[test]
    fn test_record_set_keeps_first_insertion_order() {
        let mut set = RecordSet::new();
        for text in ["b sentence", "a sentence", "b sentence", "c sentence"] {
            set.insert(text.to_string(), vec![EntityMatch::term(0, 1)]);
        }
        let texts: Vec<String> = set.into_records().into_iter().map(|r| r.text).collect();
        assert_eq!(texts, ["b sentence", "a sentence", "c sentence"]);
    }
}
