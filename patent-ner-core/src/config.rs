//! # Configuração do Pipeline
//!
//! Todos os parâmetros de uma execução em um único struct serializável.
//! O binário preenche os campos a partir da linha de comando; os testes
//! partem de [`PipelineConfig::default`] e alteram só o necessário.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::annotation::{BatchOptions, StopWords, PATENT_STOP_WORDS};
use crate::error::{NerDataError, Result};
use crate::pattern::PatternConfig;
use crate::splitter::SplitterConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Texto bruto das patentes.
    pub in_file: PathBuf,
    /// Diretório dos corpora gerados.
    pub out_dir: PathBuf,
    /// Lista de termos (TSV com coluna `term`).
    pub matching_list: PathBuf,
    /// Fração dos registros reservada para avaliação, em `[0, 1)`.
    pub eval_size: f64,
    /// Máximo de sentenças candidatas enviadas à anotação.
    pub max_docs: usize,
    pub n_process: usize,
    pub batch_size: usize,
    /// Stop-words somadas à lista padrão do inglês.
    pub extra_stop_words: Vec<String>,
    pub patterns: PatternConfig,
    pub splitter: SplitterConfig,
    /// Também grava os registros crus (`{stem}_records.json`).
    pub save_records: bool,
    /// Semente do embaralhamento; sem ela, cada execução sorteia uma.
    pub seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            in_file: PathBuf::new(),
            out_dir: PathBuf::from("../03_spaCy_ner"),
            matching_list: PathBuf::from("../01_make_matching_list/matching_list.csv"),
            eval_size: 0.2,
            max_docs: 100_000,
            n_process: 4,
            batch_size: 2000,
            extra_stop_words: PATENT_STOP_WORDS.iter().map(|s| s.to_string()).collect(),
            patterns: PatternConfig::default(),
            splitter: SplitterConfig::default(),
            save_records: false,
            seed: None,
        }
    }
}

impl PipelineConfig {
    /// Rejeita combinações que tornariam a execução sem sentido.
    pub fn validate(&self) -> Result<()> {
        if self.in_file.as_os_str().is_empty() {
            return Err(NerDataError::InvalidConfig("in_file não informado".into()));
        }
        if !(0.0..1.0).contains(&self.eval_size) {
            return Err(NerDataError::InvalidConfig(format!(
                "eval_size deve estar em [0, 1), recebido {}",
                self.eval_size
            )));
        }
        if self.max_docs == 0 {
            return Err(NerDataError::InvalidConfig("max_docs deve ser positivo".into()));
        }
        if self.n_process == 0 || self.batch_size == 0 {
            return Err(NerDataError::InvalidConfig(
                "n_process e batch_size devem ser positivos".into(),
            ));
        }
        Ok(())
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            n_process: self.n_process,
            batch_size: self.batch_size,
        }
    }

    pub fn stop_words(&self) -> StopWords {
        StopWords::with_additions(&self.extra_stop_words)
    }
}
