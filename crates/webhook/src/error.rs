#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("signature rejected: {0}")]
    Signature(String),

    #[error("invalid bind address {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    #[must_use]
    pub fn signature(message: impl Into<String>) -> Self {
        Self::Signature(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
