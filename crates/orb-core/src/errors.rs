/// Core error type for the bot.
///
/// Adapter crates map their specific errors into this type so the bot core
/// can handle failures consistently (fixed user-facing message vs logged
/// internal detail). Quota checks treat a `Store` error as "not allowed":
/// an unreachable store must never grant unlimited use.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("message quota exhausted")]
    QuotaExceeded,

    #[error("model not allowed for tier")]
    ModelNotAllowed,

    #[error("file processing failed: {0}")]
    FileProcessing(String),

    #[error("download failed: {0}")]
    Download(String),

    #[error("completion api error: {0}")]
    Completion(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
