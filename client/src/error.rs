use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Please enter a username.")]
    EmptyUsername,
    #[error("username is longer than {max} characters")]
    UsernameTooLong { max: usize },
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("client I/O error: {0}")]
    Io(#[from] io::Error),
}
