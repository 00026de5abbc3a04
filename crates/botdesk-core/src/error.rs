use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotdeskError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("authentication required: {0}")]
    Auth(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("user not found")]
    UserNotFound,

    #[error("account banned")]
    AccountBanned,

    #[error("internal error: {0}")]
    InternalError(String),
}

pub type BotdeskResult<T> = Result<T, BotdeskError>;
