//! Linha de comando que gera os corpora de treino e avaliação a partir do texto das patentes.

use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use patent_ner_core::{DatasetPipeline, PipelineConfig, PipelineEvent};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Gera um dataset NER de termos técnicos (rótulo TERM) a partir de texto de patentes.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Arquivo com o texto bruto das patentes.
    #[arg(long = "in_file")]
    in_file: PathBuf,

    /// Diretório de saída dos corpora.
    #[arg(long = "out_dir", default_value = "../03_spaCy_ner")]
    out_dir: PathBuf,

    /// Lista de termos (TSV com coluna `term`).
    #[arg(long = "matching_list", default_value = "../01_make_matching_list/matching_list.csv")]
    matching_list: PathBuf,

    /// Fração reservada para avaliação, em [0, 1).
    #[arg(long = "eval_size", default_value = "0.2")]
    eval_size: f64,

    /// Máximo de sentenças enviadas à anotação.
    #[arg(long = "max_docs", default_value = "100000")]
    max_docs: usize,

    /// Workers da anotação.
    #[arg(long = "n_process", default_value = "4")]
    n_process: usize,

    /// Sentenças por lote de anotação.
    #[arg(long = "batch_size", default_value = "2000")]
    batch_size: usize,

    /// Também grava os registros crus em JSON.
    #[arg(long = "save_records", default_value = "false")]
    save_records: bool,

    /// Semente do embaralhamento.
    #[arg(long)]
    seed: Option<u64>,
}

impl From<Args> for PipelineConfig {
    fn from(args: Args) -> Self {
        PipelineConfig {
            in_file: args.in_file,
            out_dir: args.out_dir,
            matching_list: args.matching_list,
            eval_size: args.eval_size,
            max_docs: args.max_docs,
            n_process: args.n_process,
            batch_size: args.batch_size,
            save_records: args.save_records,
            seed: args.seed,
            ..Default::default()
        }
    }
}

fn describe(event: &PipelineEvent) -> String {
    match event {
        PipelineEvent::VocabularyLoaded { terms, patterns } => {
            format!("{terms} termos, {patterns} padrões")
        }
        PipelineEvent::SentencesSplit { candidates, kept } => {
            format!("anotando {kept} de {candidates} sentenças")
        }
        PipelineEvent::Annotated { docs } => format!("casando padrões em {docs} sentenças"),
        PipelineEvent::RecordsCollected { records } => format!("{records} sentenças com termos"),
        PipelineEvent::DatasetSplit { train, eval } => {
            format!("gravando {train} treino / {eval} avaliação")
        }
        PipelineEvent::CorpusWritten { training_path, .. } => {
            format!("corpora gravados em {}", training_path.display())
        }
        PipelineEvent::Done { processing_ms } => format!("concluído em {processing_ms} ms"),
        PipelineEvent::Error { message } => format!("falhou: {message}"),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = PipelineConfig::from(Args::parse());

    std::fs::create_dir_all(&config.out_dir)
        .with_context(|| format!("não foi possível criar {}", config.out_dir.display()))?;
    info!("saída em {}", config.out_dir.display());

    let pipeline = DatasetPipeline::heuristic(config).context("configuração inválida")?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message("carregando vocabulário");

    let (tx, rx) = mpsc::channel();
    let worker = thread::spawn(move || pipeline.run(tx));
    for event in rx {
        pb.set_message(describe(&event));
    }

    let summary = worker
        .join()
        .map_err(|_| anyhow!("a thread do pipeline entrou em pânico"))?
        .context("falha ao construir o dataset")?;
    pb.finish_with_message(format!(
        "{} registros ({} treino / {} avaliação, {} entidades)",
        summary.records, summary.train, summary.eval, summary.entities
    ));

    info!("treino: {}", summary.training_path.display());
    info!("avaliação: {}", summary.eval_path.display());
    if let Some(path) = &summary.records_path {
        info!("registros: {}", path.display());
    }
    Ok(())
}
