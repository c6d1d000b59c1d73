/// Errors raised while building the dispatch tables.
///
/// Dispatching a line never fails; see [`crate::router::Outcome`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("command keyword registered twice: {keyword}")]
    DuplicateKeyword { keyword: String },

    #[error("invalid command keyword {keyword:?}: {reason}")]
    InvalidKeyword { keyword: String, reason: &'static str },
}

pub type Result<T> = std::result::Result<T, Error>;
