// lib.rs -- shared definitions between the pacist server and client

pub mod board;
pub mod debug;
pub mod error;
pub mod parser;
pub mod protocol;

pub use error::{GameError, GameResult};
