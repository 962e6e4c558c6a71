use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid gateway url: {0}")]
    InvalidUrl(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status without a JSON body the client understands.
    #[error("gateway returned {status}: {detail}")]
    Gateway { status: u16, detail: String },

    /// The interaction was closed before the call resolved.
    #[error("execution cancelled")]
    Cancelled,
}
