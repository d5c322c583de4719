use thiserror::Error;

/// Top-level error type for kasbot.
#[derive(Debug, Error)]
pub enum KasbotError {
    /// Missing or wrong API credential.
    #[error("unauthorized")]
    Unauthorized,

    /// A request is missing required fields.
    #[error("validation error: {0}")]
    Validation(String),

    /// The requested resource does not exist yet (e.g. no QR issued).
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Error from the messaging platform (send, logout, connection).
    #[error("transport error: {0}")]
    Transport(String),

    /// The external amount could not be fetched or parsed.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// The group label could not be changed.
    #[error("rename error: {0}")]
    Rename(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),
}
