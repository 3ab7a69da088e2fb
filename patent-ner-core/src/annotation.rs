//! # Provedor de Anotação — Tokens com Classe Gramatical e Flags Lexicais
//!
//! Os padrões de casamento não olham para o texto cru: eles consultam atributos
//! de cada token (classe gramatical, stop-word, capitalização, dígito). Quem
//! produz esses atributos é um **provedor de anotação**, modelado aqui pelo
//! trait [`AnnotationProvider`].
//!
//! ## Contrato
//!
//! Dada uma sentença, o provedor devolve um [`Doc`] com:
//! 1. Tokens com offsets, `pos`, `is_stop`, `is_title`, `is_digit`.
//! 2. Fronteiras de sentença (intervalos de tokens).
//! 3. Um resolvedor `char_span` que converte offsets de caractere em spans de tokens,
//!    com modo de alinhamento configurável ([`AlignmentMode`]).
//!
//! ## Implementação inclusa
//!
//! [`HeuristicAnnotator`] é um anotador determinístico baseado em regras:
//! léxico de classes fechadas (artigos, preposições, pronomes...), regras de
//! sufixo (-ly, -al, -ous, -ed, -ing...) e duas regras de contexto. Não é um
//! tagger estatístico, mas cobre bem o inglês formulaico das patentes.

use std::collections::HashSet;
use std::ops::Range;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{NerDataError, Result};
use crate::tagger::Pos;
use crate::tokenizer::{tokenize, Token};

/// Token enriquecido com os atributos consultados pelos padrões.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedToken {
    pub text: String,
    /// Índice de byte inicial no texto do [`Doc`] (inclusive).
    pub start: usize,
    /// Índice de byte final no texto do [`Doc`] (exclusivo).
    pub end: usize,
    pub index: usize,
    pub pos: Pos,
    pub is_stop: bool,
    /// Capitalização de título ("Heat", "Heat-Exchange"), como `str.istitle`.
    pub is_title: bool,
    /// Apenas dígitos ASCII ("2023").
    pub is_digit: bool,
}

impl AnnotatedToken {
    /// Número de caracteres (não bytes) do token.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Como ajustar um span de caracteres às fronteiras de token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentMode {
    /// O span precisa começar e terminar exatamente em fronteiras de token.
    Strict,
    /// Encolhe o span para os tokens inteiramente contidos nele.
    #[default]
    Contract,
    /// Expande o span para todos os tokens que ele toca.
    Expand,
}

/// Uma sentença dentro de um [`Doc`].
#[derive(Debug, Clone, PartialEq)]
pub struct SentenceView<'a> {
    /// Intervalo de tokens da sentença.
    pub tokens: Range<usize>,
    /// Offset de byte do primeiro token.
    pub start: usize,
    /// Offset de byte do fim do último token.
    pub end: usize,
    pub text: &'a str,
}

/// Texto anotado: tokens, fronteiras de sentença e resolução de spans.
#[derive(Debug, Clone, PartialEq)]
pub struct Doc {
    pub text: String,
    pub tokens: Vec<AnnotatedToken>,
    /// Intervalos de tokens de cada sentença, em ordem e sem buracos.
    pub sents: Vec<Range<usize>>,
}

impl Doc {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Itera sobre as sentenças do documento.
    pub fn sentences(&self) -> impl Iterator<Item = SentenceView<'_>> + '_ {
        self.sents.iter().filter_map(move |range| self.view(range.clone()))
    }

    /// Sentença que contém inteiramente o span de tokens.
    ///
    /// Retorna `None` se o span for vazio, estiver fora do documento ou
    /// atravessar uma fronteira de sentença.
    pub fn sentence_of(&self, span: Range<usize>) -> Option<SentenceView<'_>> {
        if span.start >= span.end || span.end > self.tokens.len() {
            return None;
        }
        let range = self
            .sents
            .iter()
            .find(|s| s.start <= span.start && span.end <= s.end)?;
        self.view(range.clone())
    }

    fn view(&self, range: Range<usize>) -> Option<SentenceView<'_>> {
        let first = self.tokens.get(range.start)?;
        let last = self.tokens.get(range.end.checked_sub(1)?)?;
        Some(SentenceView {
            tokens: range,
            start: first.start,
            end: last.end,
            text: self.text.get(first.start..last.end)?,
        })
    }

    /// Offsets de byte `[start, end)` de um span de tokens.
    pub fn byte_range(&self, span: Range<usize>) -> Option<Range<usize>> {
        if span.start >= span.end {
            return None;
        }
        let first = self.tokens.get(span.start)?;
        let last = self.tokens.get(span.end - 1)?;
        Some(first.start..last.end)
    }

    /// Converte um span de bytes `[start, end)` em um span de tokens.
    ///
    /// # Modos
    /// - `Strict`: só aceita spans que caem exatamente em fronteiras de token.
    /// - `Contract`: mantém apenas os tokens inteiramente dentro do span.
    /// - `Expand`: inclui todo token que intersecta o span.
    ///
    /// Retorna `None` quando o span é inválido ou nenhum token sobra.
    pub fn char_span(&self, start: usize, end: usize, mode: AlignmentMode) -> Option<Range<usize>> {
        let bounds: Vec<Range<usize>> = self.tokens.iter().map(|t| t.start..t.end).collect();
        align_span(&bounds, self.text.len(), start, end, mode)
    }
}

/// Alinha o span de bytes `[start, end)` aos tokens cujos offsets estão em
/// `bounds` (em ordem), num texto de `text_len` bytes.
pub fn align_span(
    bounds: &[Range<usize>],
    text_len: usize,
    start: usize,
    end: usize,
    mode: AlignmentMode,
) -> Option<Range<usize>> {
    if start >= end || end > text_len {
        return None;
    }
    let mut selected = bounds.iter().enumerate().filter(|(_, t)| match mode {
        AlignmentMode::Strict | AlignmentMode::Contract => t.start >= start && t.end <= end,
        AlignmentMode::Expand => t.start < end && t.end > start,
    });
    let (first, first_bounds) = selected.next()?;
    let (last, last_bounds) = selected.last().unwrap_or((first, first_bounds));
    if mode == AlignmentMode::Strict && (first_bounds.start != start || last_bounds.end != end) {
        return None;
    }
    Some(first..last + 1)
}

/// Paralelismo da anotação em lote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOptions {
    /// Número de workers do pool (1 = sequencial).
    pub n_process: usize,
    /// Quantos textos cada worker processa por vez.
    pub batch_size: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            n_process: 4,
            batch_size: 2000,
        }
    }
}

/// Serviço de anotação: tokenização, classes gramaticais e flags lexicais.
pub trait AnnotationProvider: Send + Sync {
    /// Anota um único texto.
    fn annotate(&self, text: &str) -> Doc;

    /// Anota vários textos, preservando a ordem: o resultado `i` corresponde ao texto `i`.
    ///
    /// Com `n_process > 1`, os lotes de `batch_size` textos são distribuídos num
    /// pool rayon limitado a `n_process` threads. O provedor é apenas lido pelos workers.
    fn annotate_batch(&self, texts: &[String], options: &BatchOptions) -> Result<Vec<Doc>> {
        if options.n_process <= 1 {
            return Ok(texts.iter().map(|t| self.annotate(t)).collect());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.n_process)
            .build()
            .map_err(|e| NerDataError::ThreadPool(e.to_string()))?;

        let batches: Vec<Vec<Doc>> = pool.install(|| {
            texts
                .par_chunks(options.batch_size.max(1))
                .map(|chunk| chunk.iter().map(|t| self.annotate(t)).collect())
                .collect()
        });
        Ok(batches.into_iter().flatten().collect())
    }
}

/// Stop-words padrão do inglês (forma lowercase).
const DEFAULT_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all",
    "almost", "alone", "along", "already", "also", "although", "always", "am", "among",
    "amongst", "an", "and", "another", "any", "anyhow", "anyone", "anything", "anyway",
    "anywhere", "are", "around", "as", "at", "back", "be", "became", "because", "become",
    "becomes", "becoming", "been", "before", "beforehand", "behind", "being", "below",
    "beside", "besides", "between", "beyond", "both", "bottom", "but", "by", "can",
    "cannot", "could", "did", "do", "does", "doing", "done", "down", "due", "during",
    "each", "eight", "either", "eleven", "else", "elsewhere", "empty", "enough", "even",
    "ever", "every", "everyone", "everything", "everywhere", "except", "few", "fifteen",
    "fifty", "first", "five", "for", "former", "formerly", "forty", "four", "from",
    "front", "full", "further", "get", "give", "go", "had", "has", "have", "he", "hence",
    "her", "here", "hereafter", "hereby", "herein", "hereupon", "hers", "herself", "him",
    "himself", "his", "how", "however", "hundred", "i", "if", "in", "indeed", "into",
    "is", "it", "its", "itself", "just", "keep", "last", "latter", "latterly", "least",
    "made", "make", "many", "may", "me", "meanwhile", "might", "mine", "most", "mostly",
    "move", "much", "must", "my", "myself", "name", "namely", "neither", "never",
    "nevertheless", "next", "nine", "no", "nobody", "none", "noone", "nor", "not",
    "nothing", "now", "nowhere", "of", "off", "often", "on", "once", "one", "only",
    "onto", "or", "other", "others", "otherwise", "our", "ours", "ourselves", "out",
    "over", "own", "part", "per", "perhaps", "please", "put", "quite", "rather", "re",
    "really", "regarding", "same", "say", "see", "seem", "seemed", "seeming", "seems",
    "serious", "several", "she", "should", "show", "side", "since", "six", "sixty", "so",
    "some", "somehow", "someone", "something", "sometime", "sometimes", "somewhere",
    "still", "such", "take", "ten", "than", "that", "the", "their", "them", "themselves",
    "then", "thence", "there", "thereafter", "thereby", "therefore", "therein",
    "thereupon", "these", "they", "this", "those", "though", "three", "through",
    "throughout", "thru", "thus", "to", "together", "too", "top", "toward", "towards",
    "twelve", "twenty", "two", "under", "unless", "until", "up", "upon", "us", "used",
    "using", "various", "very", "via", "was", "we", "well", "were", "what", "whatever",
    "when", "whence", "whenever", "where", "whereafter", "whereas", "whereby", "wherein",
    "whereupon", "wherever", "whether", "which", "while", "whither", "who", "whoever",
    "whole", "whom", "whose", "why", "will", "with", "within", "without", "would", "yet",
    "you", "your", "yours", "yourself", "yourselves",
];

/// Stop-words adicionais para patentes: ordinais e comparativos que
/// não devem iniciar nem estender um termo.
pub const PATENT_STOP_WORDS: &[&str] = &[
    "secondary", "primary", "second", "third", "forth", "fourth", "useful", "fewer",
    "more", "less",
];

/// Conjunto de stop-words passado ao anotador na construção.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    /// Lista padrão do inglês acrescida de `extra`.
    pub fn with_additions<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut words: HashSet<String> =
            DEFAULT_STOP_WORDS.iter().map(|w| w.to_string()).collect();
        words.extend(extra.into_iter().map(|w| w.as_ref().to_lowercase()));
        Self { words }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for StopWords {
    fn default() -> Self {
        Self::with_additions(PATENT_STOP_WORDS)
    }
}

const DETERMINERS: &[&str] = &[
    "a", "an", "the", "this", "that", "these", "those", "each", "every", "any", "some",
    "no", "all", "both", "either", "neither", "another", "such", "said",
];
const ADPOSITIONS: &[&str] = &[
    "of", "in", "on", "at", "by", "for", "with", "from", "to", "into", "onto", "over",
    "under", "between", "through", "within", "without", "via", "about", "above", "below",
    "along", "across", "after", "before", "during", "against", "among", "around",
    "behind", "beside", "beyond", "near", "toward", "towards", "upon", "throughout", "per",
];
const PRONOUNS: &[&str] = &[
    "it", "its", "they", "them", "their", "he", "she", "his", "her", "we", "our", "i",
    "you", "your", "which", "who", "whom", "whose", "itself", "themselves", "there",
];
const CONJUNCTIONS: &[&str] = &["and", "or", "but", "nor", "yet"];
const SUBORDINATORS: &[&str] = &[
    "if", "when", "while", "because", "although", "whereby", "wherein", "whereas",
    "unless", "until", "since", "whether",
];
const AUXILIARIES: &[&str] = &[
    "is", "are", "was", "were", "be", "been", "being", "has", "have", "had", "may", "can",
    "could", "should", "would", "will", "shall", "must", "might", "does", "do", "did",
];
const ADVERBS: &[&str] = &[
    "also", "further", "then", "thus", "therefore", "very", "however", "still", "here",
    "herein", "thereof", "therein", "thereby", "only", "even", "so", "too", "already",
    "not", "respectively", "preferably", "again",
];
const NUMBER_WORDS: &[&str] = &[
    "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
];
const VERBS: &[&str] = &[
    "comprises", "comprise", "comprising", "includes", "include", "including", "shows",
    "show", "illustrates", "illustrate", "depicts", "depict", "provides", "provide",
    "contains", "contain", "having", "allows", "allow", "enables", "enable", "uses", "use",
    "receives", "receive", "transmits", "transmit", "generates", "generate", "performs",
    "perform", "consists", "consist", "extends", "extend", "defines", "define",
];

/// Sufixos adjetivais (aplicados a palavras com mais de 4 caracteres).
const ADJ_SUFFIXES: &[&str] = &["al", "ous", "ive", "ic", "able", "ible", "ful", "less", "ary"];

/// Substantivos frequentes em patentes que enganam as regras de sufixo.
const NOUN_EXCEPTIONS: &[&str] = &[
    "material", "signal", "terminal", "interval", "metal", "crystal", "pedal", "portal",
    "removal", "potential", "capital", "mineral", "adhesive", "drive", "logic", "plastic",
    "fabric", "boundary", "summary", "library", "thing", "string", "ring", "spring",
    "bearing", "housing", "coating", "opening", "bed", "shed", "sled", "feed", "seed",
    "speed", "need", "assembly", "supply",
];

/// Anotador baseado em regras para inglês técnico.
#[derive(Debug, Clone, Default)]
pub struct HeuristicAnnotator {
    stop_words: StopWords,
}

impl HeuristicAnnotator {
    pub fn new(stop_words: StopWords) -> Self {
        Self { stop_words }
    }

    pub fn stop_words(&self) -> &StopWords {
        &self.stop_words
    }

    fn annotate_tokens(&self, tokens: &[Token]) -> Vec<AnnotatedToken> {
        // Passo 1: tag de cada token isolado
        let mut tags: Vec<Pos> = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let sentence_initial = i == 0 || is_sentence_end(&tokens[i - 1].text);
                base_pos(&t.text, sentence_initial)
            })
            .collect();

        // Passo 2: regras de contexto
        for i in 0..tokens.len() {
            let prev = i.checked_sub(1).map(|j| tags[j]);
            let next = tags.get(i + 1).copied();
            let lower = tokens[i].text.to_lowercase();

            // "the cooling fan", "a heated plate" → particípio como adjetivo
            if tags[i] == Pos::Verb && !VERBS.contains(&lower.as_str()) {
                if matches!(prev, Some(Pos::Det | Pos::Adj | Pos::Adp)) {
                    tags[i] = if next.map(|p| p.is_nominal()).unwrap_or(false) {
                        Pos::Adj
                    } else {
                        Pos::Noun
                    };
                }
                continue;
            }

            // "the exchanger transfers thermal energy" → verbo na 3ª pessoa
            if tags[i] == Pos::Noun
                && looks_like_third_person(&lower)
                && matches!(prev, Some(Pos::Noun | Pos::Propn | Pos::Pron))
                && matches!(next, Some(Pos::Det | Pos::Adj | Pos::Num | Pos::Pron))
            {
                tags[i] = Pos::Verb;
            }
        }

        tokens
            .iter()
            .zip(tags)
            .map(|(t, pos)| AnnotatedToken {
                text: t.text.clone(),
                start: t.start,
                end: t.end,
                index: t.index,
                pos,
                is_stop: self.stop_words.contains(&t.text),
                is_title: is_title(&t.text),
                is_digit: !t.text.is_empty() && t.text.chars().all(|c| c.is_ascii_digit()),
            })
            .collect()
    }
}

impl AnnotationProvider for HeuristicAnnotator {
    fn annotate(&self, text: &str) -> Doc {
        let tokens = tokenize(text);
        let annotated = self.annotate_tokens(&tokens);
        let sents = segment(&annotated);
        Doc {
            text: text.to_string(),
            tokens: annotated,
            sents,
        }
    }
}

/// Fronteiras de sentença: após ".", "!" ou "?".
fn segment(tokens: &[AnnotatedToken]) -> Vec<Range<usize>> {
    let mut sents = Vec::new();
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        if is_sentence_end(&token.text) {
            sents.push(start..i + 1);
            start = i + 1;
        }
    }
    if start < tokens.len() {
        sents.push(start..tokens.len());
    }
    sents
}

fn is_sentence_end(text: &str) -> bool {
    matches!(text, "." | "!" | "?")
}

/// Classe gramatical de um token sem olhar para os vizinhos.
fn base_pos(text: &str, sentence_initial: bool) -> Pos {
    if !text.chars().any(char::is_alphanumeric) {
        return if text.chars().all(|c| "%+=<>/*&#$§°×~^|@".contains(c)) {
            Pos::Sym
        } else {
            Pos::Punct
        };
    }
    if text.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false)
        && text.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',')
    {
        return Pos::Num;
    }

    let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
    let is_acronym = letters.len() >= 2
        && letters.iter().filter(|c| c.is_uppercase()).count() >= 2
        && text.chars().next().map(char::is_uppercase).unwrap_or(false);
    if is_acronym {
        return Pos::Propn;
    }

    let lower = text.to_lowercase();
    let word = lower.as_str();
    for (lexicon, pos) in [
        (DETERMINERS, Pos::Det),
        (ADPOSITIONS, Pos::Adp),
        (PRONOUNS, Pos::Pron),
        (CONJUNCTIONS, Pos::Cconj),
        (SUBORDINATORS, Pos::Sconj),
        (AUXILIARIES, Pos::Aux),
        (ADVERBS, Pos::Adv),
        (NUMBER_WORDS, Pos::Num),
        (VERBS, Pos::Verb),
    ] {
        if lexicon.contains(&word) {
            return pos;
        }
    }

    let capitalized = text.chars().next().map(char::is_uppercase).unwrap_or(false);
    if capitalized && !sentence_initial {
        return Pos::Propn;
    }

    if NOUN_EXCEPTIONS.contains(&word) {
        return Pos::Noun;
    }
    let long = word.chars().count() > 4;
    if long && word.ends_with("ly") {
        return Pos::Adv;
    }
    if long && ADJ_SUFFIXES.iter().any(|s| word.ends_with(s)) {
        return Pos::Adj;
    }
    if long && (word.ends_with("ed") || word.ends_with("ing")) {
        return Pos::Verb;
    }
    Pos::Noun
}

/// "transfers", "rotates" — mas não "glass", "apparatus", "axis".
fn looks_like_third_person(word: &str) -> bool {
    word.len() > 3
        && word.ends_with('s')
        && !word.ends_with("ss")
        && !word.ends_with("us")
        && !word.ends_with("is")
}

/// Equivalente a `str.istitle`: cada letra após uma não-letra é maiúscula,
/// as demais minúsculas, e há pelo menos uma letra com caixa.
pub fn is_title(text: &str) -> bool {
    let mut cased = false;
    let mut previous_cased = false;
    for c in text.chars() {
        if c.is_uppercase() {
            if previous_cased {
                return false;
            }
            previous_cased = true;
            cased = true;
        } else if c.is_lowercase() {
            if !previous_cased {
                return false;
            }
            previous_cased = true;
            cased = true;
        } else {
            previous_cased = false;
        }
    }
    cased
}
