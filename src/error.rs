//! Error taxonomy shared by the registry, orchestrator and stores.
//!
//! The `Display` text of the execution variants is exactly what ends up in
//! the orchestrator's `error` field, so settling a run is `err.to_string()`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The buffer was empty; no request was sent.
    #[error("No code to run")]
    EmptyInput,

    /// The execution service rejected the request itself.
    #[error("{0}")]
    Service(String),

    #[error("{0}")]
    Compile(String),

    #[error("{0}")]
    Runtime(String),

    /// Network or decoding failure. The cause is logged, never shown.
    #[error("Error running code")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unknown language '{0}'")]
    UnknownLanguage(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("You need to be a pro user to use {language}")]
    ProRequired { language: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn transport(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
