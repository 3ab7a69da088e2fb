//! # Montagem do Dataset — Divisão, Conversão e Escrita dos Corpora
//!
//! Os registros coletados pelo matcher viram dois artefatos: um corpus de
//! treino e um de avaliação.
//!
//! ## Etapas
//!
//! 1. **Divisão** ([`train_eval_split`]): embaralha tudo e separa
//!    `floor(n × eval_fraction)` registros para avaliação; o resto é treino.
//! 2. **Conversão** ([`convert_format`]): retokeniza cada sentença e alinha
//!    cada entidade aos tokens em modo `Contract`. Entidades que não sobram
//!    após o alinhamento são descartadas; a sentença fica, mesmo sem entidades.
//! 3. **Escrita** ([`CorpusWriter`]): `{stem}_training.json` e `{stem}_eval.json`.
//!
//! ## Formato de saída
//!
//! ```json
//! { "documents": [ {
//!     "text": "A heat exchanger transfers thermal energy.",
//!     "tokens": [ { "text": "A", "start": 0, "end": 1, "index": 0 }, ... ],
//!     "tags": ["O", "B-TERM", "I-TERM", "O", "O", "O", "O"],
//!     "entities": [ { "start_token": 1, "end_token": 3, "start": 2, "end": 16,
//!                     "start_char": 2, "end_char": 16, "label": "TERM",
//!                     "text": "heat exchanger" } ]
//! } ] }
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::annotation::{align_span, AlignmentMode};
use crate::error::{NerDataError, Result};
use crate::tagger::{spans_to_tags, EntityMatch};
use crate::tokenizer::{tokenize, Token};

/// Uma sentença com seus termos (offsets de byte relativos à sentença).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub text: String,
    /// Não sobrepostas, ordenadas por início.
    pub entities: Vec<EntityMatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitDataset {
    pub train: Vec<Record>,
    pub eval: Vec<Record>,
}

/// Embaralha os registros e separa `floor(n × eval_fraction)` para avaliação.
///
/// Frações fora de `[0, 1]` são limitadas ao intervalo; `NaN` conta como 0.
pub fn train_eval_split<R: Rng + ?Sized>(
    mut records: Vec<Record>,
    eval_fraction: f64,
    rng: &mut R,
) -> SplitDataset {
    let fraction = if eval_fraction.is_nan() {
        0.0
    } else {
        eval_fraction.clamp(0.0, 1.0)
    };
    records.shuffle(rng);

    let split = ((records.len() as f64 * fraction).floor() as usize).min(records.len());
    let train = records.split_off(split);
    debug!("divisão: {} treino / {} avaliação", train.len(), records.len());
    SplitDataset {
        train,
        eval: records,
    }
}

/// Entidade alinhada a tokens no corpus de saída.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusEntity {
    pub start_token: usize,
    /// Exclusivo.
    pub end_token: usize,
    /// Offset de byte.
    pub start: usize,
    pub end: usize,
    /// Offset em caracteres (code points).
    pub start_char: usize,
    pub end_char: usize,
    pub label: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusDocument {
    pub text: String,
    pub tokens: Vec<Token>,
    /// Uma tag BIO por token.
    pub tags: Vec<String>,
    pub entities: Vec<CorpusEntity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    pub documents: Vec<CorpusDocument>,
}

impl Corpus {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn entity_count(&self) -> usize {
        self.documents.iter().map(|d| d.entities.len()).sum()
    }
}

/// Converte registros em documentos tokenizados com entidades alinhadas.
pub fn convert_format(records: &[Record]) -> Corpus {
    let documents = records.iter().map(convert_record).collect();
    Corpus { documents }
}

fn convert_record(record: &Record) -> CorpusDocument {
    let text = &record.text;
    let tokens = tokenize(text);
    let bounds: Vec<Range<usize>> = tokens.iter().map(|t| t.start..t.end).collect();

    let mut spans = Vec::new();
    let mut entities = Vec::new();
    for entity in &record.entities {
        let aligned = align_span(&bounds, text.len(), entity.start, entity.end, AlignmentMode::Contract)
            .and_then(|span| to_corpus_entity(text, &bounds, span, &entity.label));
        match aligned {
            Some(e) => {
                spans.push(e.start_token..e.end_token);
                entities.push(e);
            }
            None => debug!(
                "entidade {}..{} não alinha com os tokens de {:?}, descartada",
                entity.start, entity.end, text
            ),
        }
    }

    let tags = spans_to_tags(tokens.len(), &spans)
        .iter()
        .map(|t| t.label())
        .collect();
    CorpusDocument {
        text: text.clone(),
        tokens,
        tags,
        entities,
    }
}

fn to_corpus_entity(
    text: &str,
    bounds: &[Range<usize>],
    span: Range<usize>,
    label: &str,
) -> Option<CorpusEntity> {
    let start = bounds.get(span.start)?.start;
    let end = bounds.get(span.end.checked_sub(1)?)?.end;
    Some(CorpusEntity {
        start_token: span.start,
        end_token: span.end,
        start,
        end,
        start_char: char_offset(text, start)?,
        end_char: char_offset(text, end)?,
        label: label.to_string(),
        text: text.get(start..end)?.to_string(),
    })
}

/// Offset em caracteres correspondente a um offset de byte.
fn char_offset(text: &str, byte: usize) -> Option<usize> {
    text.get(..byte).map(|prefix| prefix.chars().count())
}

/// Escreve os dois corpora em `out_dir`, nomeados a partir do arquivo de entrada.
#[derive(Debug, Clone)]
pub struct CorpusWriter {
    out_dir: PathBuf,
    stem: String,
}

impl CorpusWriter {
    /// O prefixo é o nome base de `in_file` até o primeiro `.`
    /// (`patents.en.txt` → `patents`).
    pub fn new(out_dir: impl Into<PathBuf>, in_file: &Path) -> Self {
        let name = in_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = name.split('.').next().unwrap_or_default().to_string();
        Self {
            out_dir: out_dir.into(),
            stem,
        }
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn training_path(&self) -> PathBuf {
        self.out_dir.join(format!("{}_training.json", self.stem))
    }

    pub fn eval_path(&self) -> PathBuf {
        self.out_dir.join(format!("{}_eval.json", self.stem))
    }

    /// Grava treino e avaliação; devolve os dois caminhos.
    pub fn write(&self, train: &Corpus, eval: &Corpus) -> Result<(PathBuf, PathBuf)> {
        let training_path = self.training_path();
        let eval_path = self.eval_path();
        write_json(train, &training_path)?;
        write_json(eval, &eval_path)?;
        info!(
            "corpora gravados: {} ({} docs), {} ({} docs)",
            training_path.display(),
            train.len(),
            eval_path.display(),
            eval.len()
        );
        Ok((training_path, eval_path))
    }
}

#[derive(Serialize)]
struct RawEntities {
    entities: Vec<(usize, usize, String)>,
}

/// Salva os registros crus no formato `[texto, {"entities": [[início, fim, rótulo]]}]`,
/// com offsets em caracteres.
pub fn save_records(records: &[Record], path: &Path) -> Result<()> {
    let raw: Vec<(&str, RawEntities)> = records
        .iter()
        .map(|r| {
            let entities = r
                .entities
                .iter()
                .filter_map(|e| {
                    Some((
                        char_offset(&r.text, e.start)?,
                        char_offset(&r.text, e.end)?,
                        e.label.clone(),
                    ))
                })
                .collect();
            (r.text.as_str(), RawEntities { entities })
        })
        .collect();
    write_json(&raw, path)?;
    info!("{} registros salvos em {}", records.len(), path.display());
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| NerDataError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush().map_err(|e| NerDataError::io(path, e))?;
    Ok(())
}
