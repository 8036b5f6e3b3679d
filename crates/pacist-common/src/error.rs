// error.rs -- error kinds shared between server and client

use std::io;

use thiserror::Error;

/// Failure kinds surfaced by the protocol, parser and session layers.
///
/// `Disconnected` is kept separate from `Io` so that callers can tell an
/// orderly peer close (EOF on a pipe) apart from a hard I/O failure.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("peer closed the connection")]
    Disconnected,

    #[error("malformed frame: {0}")]
    Protocol(&'static str),

    #[error("server refused the connection (result {0})")]
    Refused(u8),

    #[error("level load failed: {0}")]
    Load(String),

    #[error("out of resources: {0}")]
    Resource(String),
}

pub type GameResult<T> = Result<T, GameError>;

impl GameError {
    /// True when the error means the peer went away rather than that the
    /// local end misbehaved.
    pub fn is_disconnect(&self) -> bool {
        match self {
            GameError::Disconnected => true,
            GameError::Io(e) => {
                matches!(
                    e.kind(),
                    io::ErrorKind::BrokenPipe | io::ErrorKind::UnexpectedEof
                )
            }
            _ => false,
        }
    }
}
