//! # Pipeline do Dataset — Orquestrador com Eventos Observáveis
//!
//! Liga todos os estágios, do arquivo bruto aos dois corpora:
//!
//! 1. Carrega a lista de termos e compila os padrões.
//! 2. Lê o texto das patentes e o divide em sentenças candidatas.
//! 3. Embaralha as candidatas e mantém no máximo `max_docs`.
//! 4. Anota em lote (pool limitado, ordem preservada).
//! 5. Casa os padrões e agrupa os termos por sentença.
//! 6. Divide em treino/avaliação, converte e grava.
//!
//! Cada etapa concluída emite um [`PipelineEvent`] num canal `mpsc`. Se
//! ninguém estiver ouvindo, o envio falha em silêncio e a execução segue.

use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::annotation::{AnnotationProvider, HeuristicAnnotator};
use crate::config::PipelineConfig;
use crate::dataset::{convert_format, save_records, train_eval_split, CorpusWriter};
use crate::error::{NerDataError, Result};
use crate::matcher::{Matcher, RecordSet};
use crate::pattern::PatternCompiler;
use crate::splitter::SentenceSplitter;
use crate::tagger::TERM_LABEL;
use crate::vocabulary::load_terms;

/// Eventos emitidos ao fim de cada etapa.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PipelineEvent {
    /// Vocabulário lido e padrões compilados.
    VocabularyLoaded { terms: usize, patterns: usize },
    /// Texto dividido; `kept` é quantas seguem para a anotação.
    SentencesSplit { candidates: usize, kept: usize },
    /// Anotação em lote concluída.
    Annotated { docs: usize },
    /// Sentenças com pelo menos um termo.
    RecordsCollected { records: usize },
    DatasetSplit { train: usize, eval: usize },
    CorpusWritten {
        training_path: PathBuf,
        eval_path: PathBuf,
    },
    Done { processing_ms: u64 },
    /// Falha fatal; a execução parou.
    Error { message: String },
}

/// Números de uma execução completa.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub terms: usize,
    pub patterns: usize,
    pub candidates: usize,
    pub annotated: usize,
    pub records: usize,
    pub train: usize,
    pub eval: usize,
    /// Entidades que sobreviveram ao alinhamento, nos dois corpora.
    pub entities: usize,
    pub training_path: PathBuf,
    pub eval_path: PathBuf,
    pub records_path: Option<PathBuf>,
    pub processing_ms: u64,
}

/// Constrói o dataset a partir de uma configuração e de um provedor de anotação.
pub struct DatasetPipeline<A: AnnotationProvider> {
    config: PipelineConfig,
    annotator: A,
}

impl DatasetPipeline<HeuristicAnnotator> {
    /// Pipeline com o anotador heurístico e as stop-words da configuração.
    pub fn heuristic(config: PipelineConfig) -> Result<Self> {
        let annotator = HeuristicAnnotator::new(config.stop_words());
        Self::new(config, annotator)
    }
}

impl<A: AnnotationProvider> DatasetPipeline<A> {
    pub fn new(config: PipelineConfig, annotator: A) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, annotator })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Executa todas as etapas. Erros fatais também são emitidos como
    /// [`PipelineEvent::Error`] antes de retornar.
    pub fn run(&self, tx: mpsc::Sender<PipelineEvent>) -> Result<PipelineSummary> {
        let result = self.execute(&tx);
        if let Err(e) = &result {
            let _ = tx.send(PipelineEvent::Error {
                message: e.to_string(),
            });
        }
        result
    }

    fn execute(&self, tx: &mpsc::Sender<PipelineEvent>) -> Result<PipelineSummary> {
        let start = Instant::now();
        let config = &self.config;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };

        // === Passo 1: vocabulário e padrões ===
        let terms = load_terms(&config.matching_list)?;
        let patterns = PatternCompiler::new(config.patterns.clone())?.compile(&terms)?;
        let matcher = Matcher::new(TERM_LABEL, patterns);
        info!("{} padrões compilados para {} termos", matcher.len(), terms.len());
        let _ = tx.send(PipelineEvent::VocabularyLoaded {
            terms: terms.len(),
            patterns: matcher.len(),
        });

        // === Passo 2: sentenças candidatas ===
        let text = std::fs::read_to_string(&config.in_file)
            .map_err(|e| NerDataError::io(&config.in_file, e))?;
        let mut sentences = SentenceSplitter::new(config.splitter.clone())?.split(&text);
        let candidates = sentences.len();
        sentences.shuffle(&mut rng);
        sentences.truncate(config.max_docs);
        info!("{} sentenças candidatas, {} mantidas", candidates, sentences.len());
        let _ = tx.send(PipelineEvent::SentencesSplit {
            candidates,
            kept: sentences.len(),
        });

        // === Passo 3: anotação ===
        let docs = self
            .annotator
            .annotate_batch(&sentences, &config.batch_options())?;
        let _ = tx.send(PipelineEvent::Annotated { docs: docs.len() });

        // === Passo 4: casamento ===
        let mut record_set = RecordSet::new();
        for doc in &docs {
            record_set.extend_from_doc(&matcher, doc);
        }
        let records = record_set.into_records();
        info!("{} sentenças com termos", records.len());
        let _ = tx.send(PipelineEvent::RecordsCollected {
            records: records.len(),
        });

        // === Passo 5: divisão e escrita ===
        let writer = CorpusWriter::new(&config.out_dir, &config.in_file);
        let records_path = if config.save_records {
            let path = config.out_dir.join(format!("{}_records.json", writer.stem()));
            save_records(&records, &path)?;
            Some(path)
        } else {
            None
        };

        let n_records = records.len();
        let split = train_eval_split(records, config.eval_size, &mut rng);
        let _ = tx.send(PipelineEvent::DatasetSplit {
            train: split.train.len(),
            eval: split.eval.len(),
        });

        let train = convert_format(&split.train);
        let eval = convert_format(&split.eval);
        let (training_path, eval_path) = writer.write(&train, &eval)?;
        let _ = tx.send(PipelineEvent::CorpusWritten {
            training_path: training_path.clone(),
            eval_path: eval_path.clone(),
        });

        let processing_ms = start.elapsed().as_millis() as u64;
        let _ = tx.send(PipelineEvent::Done { processing_ms });

        Ok(PipelineSummary {
            terms: terms.len(),
            patterns: matcher.len(),
            candidates,
            annotated: docs.len(),
            records: n_records,
            train: train.len(),
            eval: eval.len(),
            entities: train.entity_count() + eval.entity_count(),
            training_path,
            eval_path,
            records_path,
            processing_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn setup(dir: &Path, text: &str) -> PipelineConfig {
        let vocabulary = dir.join("matching_list.csv");
        fs::write(&vocabulary, "term\theading\nheat exchanger\t1\ncoolant pump\t1\n").unwrap();
        let input = dir.join("patents.txt");
        fs::write(&input, text).unwrap();
        PipelineConfig {
            in_file: input,
            out_dir: dir.to_path_buf(),
            matching_list: vocabulary,
            n_process: 1,
            seed: Some(3),
            ..Default::default()
        }
    }

    #[test]
    fn test_pipeline_events_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let text = "A heat exchanger transfers thermal energy to the cabin.\n\
                    The coolant pump circulates the water through the engine block.\n\
                    This sentence mentions nothing of interest to anyone";
        let pipeline = DatasetPipeline::heuristic(setup(dir.path(), text)).unwrap();
        let (tx, rx) = mpsc::channel();
        let summary = pipeline.run(tx).unwrap();

        let events: Vec<PipelineEvent> = rx.try_iter().collect();
        assert!(matches!(events[0], PipelineEvent::VocabularyLoaded { terms: 2, patterns: 4 }));
        assert!(matches!(events.last(), Some(PipelineEvent::Done { .. })));
        assert!(!events.iter().any(|e| matches!(e, PipelineEvent::Error { .. })));

        assert_eq!(summary.candidates, 3);
        assert_eq!(summary.annotated, 3);
        assert_eq!(summary.records, 2);
        assert_eq!(summary.train + summary.eval, 2);
        assert!(summary.training_path.exists());
        assert!(summary.eval_path.exists());
        assert!(summary.records_path.is_none());
    }

    #[test]
    fn test_max_docs_limits_annotation() {
        let dir = tempfile::tempdir().unwrap();
        let text: String = (0..10)
            .map(|i| format!("sentence {i} describes a heat exchanger core\n"))
            .collect();
        let config = PipelineConfig {
            max_docs: 4,
            ..setup(dir.path(), &text)
        };
        let (tx, _rx) = mpsc::channel();
        let summary = DatasetPipeline::heuristic(config).unwrap().run(tx).unwrap();
        assert_eq!(summary.candidates, 10);
        assert_eq!(summary.annotated, 4);
        assert_eq!(summary.records, 4);
    }

    #[test]
    fn test_missing_input_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = setup(dir.path(), "");
        config.in_file = dir.path().join("missing.txt");
        let (tx, rx) = mpsc::channel();
        let err = DatasetPipeline::heuristic(config).unwrap().run(tx).unwrap_err();
        assert!(matches!(err, NerDataError::Io { .. }));

        let events: Vec<PipelineEvent> = rx.try_iter().collect();
        assert!(matches!(events.last(), Some(PipelineEvent::Error { .. })));
        assert!(!dir.path().join("missing_training.json").exists());
    }

    #[test]
    fn test_dropped_receiver_does_not_fail() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(dir.path(), "A heat exchanger transfers thermal energy to the cabin.");
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let summary = DatasetPipeline::heuristic(config).unwrap().run(tx).unwrap();
        assert_eq!(summary.records, 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PipelineConfig {
            in_file: PathBuf::from("x.txt"),
            eval_size: 1.0,
            ..Default::default()
        };
        assert!(matches!(
            DatasetPipeline::heuristic(config),
            Err(NerDataError::InvalidConfig(_))
        ));
    }
}
