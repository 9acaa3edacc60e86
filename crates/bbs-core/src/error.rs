//! Error kinds surfaced across the RPC boundary.

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("network: {0}")]
    Network(String),
    #[error("parse: {0}")]
    Parse(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("auth required: {0}")]
    AuthRequired(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("post rejected: {0:?}")]
    PostRejected(PostResultType),
    #[error("filesystem: {0}")]
    Filesystem(String),
    #[error("config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

use crate::post::PostResultType;

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Filesystem(e.to_string())
    }
}
