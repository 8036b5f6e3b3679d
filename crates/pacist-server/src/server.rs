// server.rs -- core server types and constants

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use pacist_common::board::Board;

/// Period of the per-session snapshot broadcaster.
pub const BROADCAST_PERIOD_MS: u64 = 50;

/// Where the operator report lands, relative to the server's working dir.
pub const TOP5_PATH: &str = "top5_gamers.txt";

/// One session's world, shared between its actors under the world lock.
pub type SharedBoard = Arc<RwLock<Board>>;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub levels_dir: PathBuf,
    pub max_games: usize,
    pub register_pipe: PathBuf,
}

/// Numeric client id from a request pipe path: the basename up to the first
/// underscore. Malformed paths give -1.
pub fn extract_client_id(path: &str) -> i32 {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.split('_').next())
        .and_then(|id| id.parse().ok())
        .unwrap_or(-1)
}
