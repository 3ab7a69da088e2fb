//! # Segmentação do Texto de Patentes em Sentenças Candidatas
//!
//! O texto bruto chega como uma sequência de patentes separadas por três
//! quebras de linha. A segmentação é propositalmente simples:
//!
//! 1. "FIG." / "FIGS." perdem o ponto (senão viram fim de sentença).
//! 2. Divide pelo separador de documentos (`"\n\n\n"`).
//! 3. Divide cada documento em quebra de linha, ponto ou ponto-e-vírgula.
//! 4. Remove espaços nas pontas.
//! 5. Mantém só candidatos com mais de 25 caracteres e sem
//!    sequências de underscores (placeholders do tipo `____`).

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitterConfig {
    /// Separador entre patentes.
    pub document_separator: String,
    /// Tamanho mínimo (exclusivo), em caracteres.
    pub min_chars: usize,
    /// Quantos underscores seguidos marcam um placeholder.
    pub placeholder_run: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            document_separator: "\n\n\n".to_string(),
            min_chars: 25,
            placeholder_run: 4,
        }
    }
}

pub struct SentenceSplitter {
    config: SplitterConfig,
    figure: Regex,
    breaks: Regex,
    placeholder: String,
}

impl SentenceSplitter {
    pub fn new(config: SplitterConfig) -> Result<Self> {
        Ok(Self {
            figure: Regex::new(r"(?i)(figs?)\.")?,
            breaks: Regex::new(r"[\n.;]")?,
            placeholder: "_".repeat(config.placeholder_run.max(1)),
            config,
        })
    }

    /// Divide o texto em sentenças candidatas já filtradas.
    pub fn split(&self, text: &str) -> Vec<String> {
        let units: Vec<&str> = if self.config.document_separator.is_empty() {
            vec![text]
        } else {
            text.split(self.config.document_separator.as_str()).collect()
        };

        let mut sentences = Vec::new();
        for unit in units {
            let unit = self.figure.replace_all(unit, "$1");
            sentences.extend(
                self.breaks
                    .split(&unit)
                    .map(str::trim)
                    .filter(|s| self.keep(s))
                    .map(str::to_string),
            );
        }
        sentences
    }

    /// Filtro de tamanho e de placeholder.
    pub fn keep(&self, candidate: &str) -> bool {
        candidate.chars().count() > self.config.min_chars && !candidate.contains(&self.placeholder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splitter() -> SentenceSplitter {
        SentenceSplitter::new(SplitterConfig::default()).unwrap()
    }

    #[test]
    fn test_split_documents_and_sentences() {
        let text = "A heat exchanger transfers thermal energy. The pump circulates the coolant fluid; \
                    a valve regulates the flow rate\n\n\nSecond patent describes a rotor blade assembly.";
        let sentences = splitter().split(text);
        assert_eq!(
            sentences,
            vec![
                "A heat exchanger transfers thermal energy",
                "The pump circulates the coolant fluid",
                "a valve regulates the flow rate",
                "Second patent describes a rotor blade assembly",
            ]
        );
    }

    #[test]
    fn test_fig_period_is_not_a_break() {
        let sentences = splitter().split("As shown in FIG. 3 the housing holds the rotor shaft.");
        assert_eq!(sentences, vec!["As shown in FIG 3 the housing holds the rotor shaft"]);

        let sentences = splitter().split("see figs. 4 and 5 for the complete cooling circuit");
        assert_eq!(sentences, vec!["see figs 4 and 5 for the complete cooling circuit"]);
    }

    #[test]
    fn test_placeholder_lines_are_dropped() {
        let text = "FIG. 3 shows ____________ in a detailed sectional view\nThis line is long enough to be kept here";
        let sentences = splitter().split(text);
        assert_eq!(sentences, vec!["This line is long enough to be kept here"]);
    }

    #[test]
    fn test_every_candidate_respects_filters() {
        let text = "short one. another short; x\n____ placeholder padding padding padding\n\
                    this sentence has enough characters to pass___ the filter";
        for sentence in splitter().split(text) {
            assert!(sentence.chars().count() > 25);
            assert!(!sentence.contains("____"));
            assert_eq!(sentence, sentence.trim());
        }
    }

    #[test]
    fn test_length_counts_characters_after_trim() {
        let s = splitter();
        // 25 caracteres exatos: rejeitado
        assert!(!s.keep("abcdefghijklmnopqrstuvwxy"));
        assert!(s.keep("abcdefghijklmnopqrstuvwxyz"));
        assert_eq!(s.split("   abcdefghijklmnopqrstuvwxy   "), Vec::<String>::new());
    }
}
