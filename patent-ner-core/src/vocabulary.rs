//! # Vocabulário de Termos
//!
//! Lê a lista de termos (arquivo separado por tabulação com uma coluna `term`).
//! Células vazias são strings vazias, nunca "nulos": o termo em branco é
//! apenas ignorado, com um aviso no log.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{NerDataError, Result};

/// Um termo do vocabulário.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub text: String,
    /// Palavras do termo, na ordem.
    pub words: Vec<String>,
}

impl Term {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            words: text.split_whitespace().map(str::to_string).collect(),
        }
    }

    /// Termo composto (MWE)?
    pub fn is_multi_word(&self) -> bool {
        self.words.len() > 1
    }

    pub fn is_blank(&self) -> bool {
        self.words.is_empty()
    }
}

/// Carrega os termos de um arquivo TSV com cabeçalho.
pub fn load_terms(path: impl AsRef<Path>) -> Result<Vec<Term>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| NerDataError::io(path, e))?;
    let terms = read_terms(file).map_err(|e| match e {
        NerDataError::Vocabulary { message, .. } => NerDataError::Vocabulary {
            path: path.to_path_buf(),
            message,
        },
        other => other,
    })?;
    info!("{} termos carregados de {}", terms.len(), path.display());
    Ok(terms)
}

/// Lê os termos de qualquer leitor TSV com cabeçalho.
pub fn read_terms<R: std::io::Read>(reader: R) -> Result<Vec<Term>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let column = rdr
        .headers()?
        .iter()
        .position(|h| h.trim() == "term")
        .ok_or_else(|| NerDataError::Vocabulary {
            path: Default::default(),
            message: "coluna `term` não encontrada no cabeçalho".to_string(),
        })?;

    let mut terms = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record?;
        let term = Term::new(record.get(column).unwrap_or(""));
        if term.is_blank() {
            warn!("linha {} sem termo, ignorada", line + 2);
            continue;
        }
        terms.push(term);
    }
    Ok(terms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_words() {
        let term = Term::new(" heat  exchanger ");
        assert_eq!(term.words, vec!["heat", "exchanger"]);
        assert!(term.is_multi_word());
        assert!(!Term::new("valve").is_multi_word());
        assert!(Term::new("   ").is_blank());
    }

    #[test]
    fn test_read_terms_tsv() {
        let data = "id\tterm\tfreq\n1\theat exchanger\t10\n2\t\t3\n3\tsensor\n";
        let terms = read_terms(data.as_bytes()).unwrap();
        let texts: Vec<&str> = terms.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["heat exchanger", "sensor"]);
    }

    #[test]
    fn test_missing_term_column() {
        let err = read_terms("word\nvalve\n".as_bytes()).unwrap_err();
        assert!(matches!(err, NerDataError::Vocabulary { .. }));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let err = load_terms("/nonexistent/matching_list.csv").unwrap_err();
        assert!(matches!(err, NerDataError::Io { .. }));
    }
}
