//! # Tokenizador para Inglês Técnico (Patentes)
//!
//! Responsável por dividir o texto bruto em tokens individuais (palavras, pontuações).
//! Cada token preserva sua posição original no texto (offset) para permitir
//! recuperar exatamente o trecho marcado como entidade.
//!
//! ## Esquema de Tokenização
//!
//! - Sequências alfanuméricas formam palavras.
//! - Hífens e apóstrofos internos ficam na palavra ("heat-resistant", "device's").
//! - O ponto é mantido em abreviações conhecidas ("Fig.", "approx.") e entre dígitos ("1.5").
//! - Qualquer outro caractere não-espaço vira um token de pontuação isolado.
//!
//! Os offsets são índices de **byte** no texto original, de modo que
//! `&text[token.start..token.end] == token.text` vale sempre.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use patent_ner_core::tokenizer::tokenize;
//!
//! let tokens = tokenize("A heat-resistant valve (see Fig. 2).");
//! let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
//! assert_eq!(texts, ["A", "heat-resistant", "valve", "(", "see", "Fig.", "2", ")", "."]);
//! ```

use serde::{Deserialize, Serialize};

/// Um token extraído do texto original.
///
/// O `Token` é a unidade atômica de processamento do pipeline. Ele mantém a referência
/// exata de sua posição no texto original (`start` e `end`), o que é crucial para
/// converter spans de tokens em spans de caracteres e vice-versa.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    /// O texto do token (ex: "valve", ",", "exchanger").
    pub text: String,
    /// Índice de byte inicial no texto original (inclusive).
    pub start: usize,
    /// Índice de byte final no texto original (exclusivo).
    pub end: usize,
    /// Índice sequencial do token na lista (0, 1, 2...).
    pub index: usize,
}

/// Abreviações comuns em patentes que não devem ter o ponto separado
const ABBREVIATIONS: &[&str] = &[
    "approx", "Co", "Corp", "Dr", "etc", "Fig", "Figs", "Inc", "Ltd", "Mr",
    "Mrs", "No", "Nos", "Ref", "vs", "wt",
];

/// Tokeniza um texto.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current_start = 0;
    let mut current_text = String::new();
    let chars: Vec<(usize, char)> = text.char_indices().collect();

    for (i, &(byte_pos, ch)) in chars.iter().enumerate() {
        let next = chars.get(i + 1).map(|(_, c)| *c);
        let next_is_alnum = next.map(char::is_alphanumeric).unwrap_or(false);

        if ch.is_alphanumeric() {
            if current_text.is_empty() {
                current_start = byte_pos;
            }
            current_text.push(ch);
        } else if (ch == '-' || ch == '\'' || ch == '\u{2019}')
            && !current_text.is_empty()
            && next_is_alnum
        {
            current_text.push(ch);
        } else if ch == '.' && !current_text.is_empty() {
            let is_abbrev = ABBREVIATIONS.contains(&current_text.as_str());
            let current_is_num = current_text.chars().all(|c| c.is_ascii_digit());
            let next_is_num = next.map(|c| c.is_ascii_digit()).unwrap_or(false);

            if current_is_num && next_is_num {
                current_text.push('.');
            } else if is_abbrev {
                current_text.push('.');
                flush_token(&mut tokens, &mut current_text, current_start, byte_pos + 1);
            } else {
                flush_token(&mut tokens, &mut current_text, current_start, byte_pos);
                push_token(&mut tokens, ".".to_string(), byte_pos, byte_pos + 1);
            }
        } else if ch.is_whitespace() {
            flush_token(&mut tokens, &mut current_text, current_start, byte_pos);
        } else {
            flush_token(&mut tokens, &mut current_text, current_start, byte_pos);
            push_token(&mut tokens, ch.to_string(), byte_pos, byte_pos + ch.len_utf8());
        }
    }

    flush_token(&mut tokens, &mut current_text, current_start, text.len());

    // Re-indexa os tokens
    for (i, token) in tokens.iter_mut().enumerate() {
        token.index = i;
    }
    tokens
}

/// Fecha o token acumulado e adiciona à lista (se não vazio)
fn flush_token(tokens: &mut Vec<Token>, text: &mut String, start: usize, end: usize) {
    if !text.is_empty() {
        tokens.push(Token {
            text: text.clone(),
            start,
            end,
            index: 0, // será atribuído depois
        });
        text.clear();
    }
}

/// Adiciona um token de pontuação diretamente
fn push_token(tokens: &mut Vec<Token>, text: String, start: usize, end: usize) {
    tokens.push(Token {
        text,
        start,
        end,
        index: 0,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_tokenize_basic() {
        let tokens = tokenize("A heat exchanger transfers thermal energy.");
        assert_eq!(
            texts(&tokens),
            ["A", "heat", "exchanger", "transfers", "thermal", "energy", "."]
        );
    }

    #[test]
    fn test_offsets_slice_original_text() {
        let text = "  Válvula de escape; 3.5 mm  ";
        for token in tokenize(text) {
            assert_eq!(&text[token.start..token.end], token.text);
        }
    }

    #[test]
    fn test_decimal_and_abbreviation() {
        let tokens = tokenize("approx. 1.5 mm");
        assert_eq!(texts(&tokens), ["approx.", "1.5", "mm"]);
    }

    #[test]
    fn test_hyphen_and_apostrophe() {
        let tokens = tokenize("the device's heat-resistant - layer");
        assert_eq!(
            texts(&tokens),
            ["the", "device's", "heat-resistant", "-", "layer"]
        );
    }

    #[test]
    fn test_indices_are_sequential() {
        let tokens = tokenize("a, b; c");
        for (i, token) in tokens.iter().enumerate() {
            assert_eq!(token.index, i);
        }
    }
}
