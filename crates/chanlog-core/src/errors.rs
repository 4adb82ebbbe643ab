/// Core error type.
///
/// Adapter crates map their client errors into this type. Only
/// `ContentTooLarge` and `DestinationForbidden` are ever recovered by the
/// channel logger; every other variant propagates to the caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("content too large: {0}")]
    ContentTooLarge(String),

    #[error("destination forbidden: {0}")]
    DestinationForbidden(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
