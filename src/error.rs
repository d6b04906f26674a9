//! Error types for AuraSonic

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuraSonicError {
    #[error("no source or clip named '{0}'")]
    NotFound(String),

    #[error("no audio backend initialized")]
    BackendUnsupported,

    #[error("no free voice for source '{0}'")]
    VoiceExhausted(String),

    #[error("decode failed for '{0}': {1}")]
    DecodeFailed(String, String),

    #[error("audio format not supported: {0}")]
    FormatUnsupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, AuraSonicError>;
