use std::io;

#[derive(thiserror::Error, Debug)]
pub enum GuardError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("private or loopback target not allowed: {0}")]
    PrivateTarget(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("timeout")]
    Timeout,
    #[error("http error: {0}")]
    Http(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("unknown error")]
    Unknown,
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<reqwest::Error> for GuardError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GuardError::Timeout
        } else if err.is_connect() {
            GuardError::Network(err.to_string())
        } else if err.is_status() {
            GuardError::Http(err.to_string())
        } else {
            GuardError::Unknown
        }
    }
}
