#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Channel(#[from] zbot_channels::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
