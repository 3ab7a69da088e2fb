//! # patent-ner-core — Construção de Dataset NER de Termos Técnicos em Patentes
//!
//! Este crate transforma texto bruto de patentes e uma lista de termos do
//! domínio em um dataset rotulado para NER: sentenças com os trechos que são
//! termos técnicos marcados com o rótulo único `TERM`.
//!
//! ## Arquitetura do Sistema
//!
//! 1.  **Entrada**: texto das patentes + lista de termos ([`vocabulary`]).
//! 2.  **Padrões** ([`pattern`]): cada termo vira regras sobre tokens anotados.
//! 3.  **Sentenças** ([`splitter`]): o texto é dividido em candidatas filtradas.
//! 4.  **Anotação** ([`annotation`]): tokens ([`tokenizer`]) com classe gramatical e flags.
//! 5.  **Casamento** ([`matcher`]): spans de termos, sem sobreposição, agrupados por sentença.
//! 6.  **Saída** ([`dataset`]): divisão treino/avaliação e corpora tokenizados com tags BIO ([`tagger`]).
//!
//! O orquestrador ([`pipeline`]) liga tudo e reporta o progresso por eventos.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use patent_ner_core::{AnnotationProvider, HeuristicAnnotator, Matcher, PatternCompiler, PatternConfig, Term, TERM_LABEL};
//!
//! let patterns = PatternCompiler::new(PatternConfig::default())
//!     .unwrap()
//!     .compile(&[Term::new("heat exchanger")])
//!     .unwrap();
//! let matcher = Matcher::new(TERM_LABEL, patterns);
//!
//! let doc = HeuristicAnnotator::default().annotate("A heat exchanger transfers thermal energy.");
//! for (sentence, matches) in matcher.collect_sentences(&doc) {
//!     for m in matches {
//!         println!("{} -> {}", &sentence[m.range()], m.label);
//!     }
//! }
//! ```

pub mod annotation;
pub mod config;
pub mod dataset;
pub mod error;
pub mod matcher;
pub mod pattern;
pub mod pipeline;
pub mod splitter;
pub mod tagger;
pub mod tokenizer;
pub mod vocabulary;

pub use annotation::{AlignmentMode, AnnotationProvider, BatchOptions, Doc, HeuristicAnnotator, StopWords};
pub use config::PipelineConfig;
pub use dataset::{Corpus, CorpusWriter, Record, SplitDataset};
pub use error::{NerDataError, Result};
pub use matcher::{filter_spans, Matcher, RecordSet};
pub use pattern::{Pattern, PatternCompiler, PatternConfig};
pub use pipeline::{DatasetPipeline, PipelineEvent, PipelineSummary};
pub use splitter::{SentenceSplitter, SplitterConfig};
pub use tagger::{EntityMatch, Pos, Tag, TERM_LABEL};
pub use tokenizer::{tokenize, Token};
pub use vocabulary::{load_terms, Term};
