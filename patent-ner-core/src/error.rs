//! # Erros do Pipeline
//!
//! Um único tipo de erro para toda a biblioteca. Falhas de I/O na entrada
//! (texto da patente, lista de termos) são fatais; problemas pontuais
//! durante o casamento de padrões ou a serialização NÃO passam por aqui,
//! eles são descartados silenciosamente no próprio estágio.

use std::path::PathBuf;

/// Erros produzidos pela construção do dataset.
#[derive(Debug, thiserror::Error)]
pub enum NerDataError {
    /// Falha ao ler ou escrever um arquivo.
    #[error("falha de I/O em {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A lista de termos não tem o formato esperado (ex: falta a coluna `term`).
    #[error("lista de termos inválida ({path}): {message}")]
    Vocabulary { path: PathBuf, message: String },

    /// Erro do leitor TSV.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// Erro de serialização do corpus.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Parâmetro de configuração fora do domínio permitido.
    #[error("configuração inválida: {0}")]
    InvalidConfig(String),

    /// Tentativa de construir um padrão sem nenhuma restrição.
    #[error("um padrão precisa de pelo menos uma restrição de token")]
    EmptyPattern,

    /// Expressão regular de um predicado não compilou.
    #[error(transparent)]
    Regex(#[from] regex::Error),

    /// O pool de threads da anotação não pôde ser criado.
    #[error("falha ao criar o pool de anotação: {0}")]
    ThreadPool(String),
}

impl NerDataError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        NerDataError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Resultado padrão da biblioteca.
pub type Result<T> = std::result::Result<T, NerDataError>;
