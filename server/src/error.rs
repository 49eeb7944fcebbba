use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("heartbeat interval must be greater than zero")]
    InvalidHeartbeat,
    #[error("server I/O error: {0}")]
    Io(#[from] io::Error),
}
