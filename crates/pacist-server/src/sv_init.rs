// sv_init.rs -- server startup and teardown

use std::fs;
use std::sync::Arc;
use std::thread;

use log::info;
use nix::sys::stat::Mode;
use nix::unistd::mkfifo;

use pacist_common::{GameError, GameResult};

use crate::server::ServerConfig;
use crate::sv_main::listener_loop;
use crate::sv_queue::RequestQueue;
use crate::sv_report::{block_sigusr1, install_sigusr1_handler, ActiveGames};
use crate::sv_session::worker_loop;

/// Bring the server up and run it. Only returns if the registration FIFO
/// becomes unusable or setup fails.
pub fn run_server(config: ServerConfig) -> GameResult<()> {
    // the mask is inherited by every thread spawned below; the listener
    // unblocks the signal for itself
    block_sigusr1()?;
    install_sigusr1_handler()?;

    let _ = fs::remove_file(&config.register_pipe);
    mkfifo(&config.register_pipe, Mode::from_bits_truncate(0o666))
        .map_err(|e| GameError::Io(e.into()))?;

    let queue = Arc::new(RequestQueue::new(config.max_games));
    let registry = Arc::new(ActiveGames::new(config.max_games));

    for n in 0..config.max_games {
        let queue = Arc::clone(&queue);
        let registry = Arc::clone(&registry);
        let levels_dir = config.levels_dir.clone();
        thread::Builder::new()
            .name(format!("session-worker-{n}"))
            .spawn(move || worker_loop(queue, registry, levels_dir))
            .map_err(|e| GameError::Resource(format!("spawn worker {n}: {e}")))?;
    }
    info!("{} session workers started", config.max_games);

    let listener = {
        let register_pipe = config.register_pipe.clone();
        let queue = Arc::clone(&queue);
        let registry = Arc::clone(&registry);
        thread::Builder::new()
            .name("listener".to_owned())
            .spawn(move || listener_loop(&register_pipe, &queue, &registry))
            .map_err(|e| GameError::Resource(format!("spawn listener: {e}")))?
    };

    let result = listener
        .join()
        .unwrap_or_else(|_| Err(GameError::Resource("listener panicked".to_owned())));

    let _ = fs::remove_file(&config.register_pipe);
    result
}
