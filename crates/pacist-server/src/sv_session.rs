// sv_session.rs -- workers and the per-session engine
//
// A worker owns one session at a time: it dequeues an admitted request,
// finishes the handshake, then drives the session's levels to completion.
// The broadcaster loop runs on the worker thread itself; the pacman, ghost
// and input actors run on threads of their own.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};

use pacist_common::parser::{load_level_from_file, load_levels_from_dir};
use pacist_common::protocol::{encode_connect_ack, write_full};
use pacist_common::{GameError, GameResult};

use crate::server::{extract_client_id, SharedBoard, BROADCAST_PERIOD_MS};
use crate::sv_game::{ghost_actor, pacman_actor};
use crate::sv_queue::RequestQueue;
use crate::sv_report::ActiveGames;
use crate::sv_send::send_board;
use crate::sv_user::input_actor;

/// Worker main loop; runs for the lifetime of the server.
pub fn worker_loop(queue: Arc<RequestQueue>, registry: Arc<ActiveGames>, levels_dir: PathBuf) {
    loop {
        let Some(req) = queue.pop() else {
            return;
        };

        let mut notif = match File::options().write(true).open(&req.notif_pipe) {
            Ok(f) => f,
            Err(e) => {
                warn!("cannot open {}: {e}", req.notif_pipe);
                queue.release_slot();
                continue;
            }
        };

        if let Err(e) = write_full(&mut notif, &encode_connect_ack(0)) {
            warn!("handshake ack failed for {}: {e}", req.notif_pipe);
            queue.release_slot();
            continue;
        }

        // blocks until the client opens its write end, which it does right
        // after reading the ack
        let req_file = match File::open(&req.req_pipe) {
            Ok(f) => f,
            Err(e) => {
                warn!("cannot open {}: {e}", req.req_pipe);
                queue.release_slot();
                continue;
            }
        };

        let client_id = extract_client_id(&req.req_pipe);
        info!("session start: client {client_id}");

        match run_session(&levels_dir, req_file, notif, client_id, &registry) {
            Ok(()) => info!("session end: client {client_id}"),
            Err(e) if e.is_disconnect() => info!("client {client_id} disconnected"),
            Err(e) => warn!("session for client {client_id} failed: {e}"),
        }

        queue.release_slot();
    }
}

struct LevelOutcome {
    exit_requested: bool,
    dead: bool,
    points: i32,
}

/// Run one session to completion: levels in filename order, points carried
/// across level boundaries. Endpoints are closed when this returns.
pub fn run_session(
    levels_dir: &Path,
    req_file: File,
    notif: File,
    client_id: i32,
    registry: &ActiveGames,
) -> GameResult<()> {
    let levels = load_levels_from_dir(levels_dir)?;

    let req = Arc::new(req_file);
    let notif = Arc::new(Mutex::new(notif));
    let mut points = 0;

    for path in &levels {
        let mut board = load_level_from_file(path, levels_dir)?;
        board.pacman.points = points;
        debug!(
            "client {client_id}: level {} ({}x{}, {} ghosts)",
            path.display(),
            board.width,
            board.height,
            board.ghosts.len()
        );

        let tick = Duration::from_millis(board.tick_ms());
        let n_ghosts = board.ghosts.len();
        let shared: SharedBoard = Arc::new(RwLock::new(board));

        let slot = registry.register(client_id, Arc::clone(&shared));
        let outcome = run_level(&shared, &req, &notif, tick, n_ghosts);
        if let Some(slot) = slot {
            registry.deregister(slot);
        }

        let outcome = outcome?;
        points = outcome.points;
        if outcome.exit_requested || outcome.dead {
            break;
        }
    }

    Ok(())
}

/// Drive one level: start the actors, broadcast snapshots until a terminal
/// condition, then stop everything and emit the final frame.
fn run_level(
    shared: &SharedBoard,
    req: &Arc<File>,
    notif: &Arc<Mutex<File>>,
    tick: Duration,
    n_ghosts: usize,
) -> GameResult<LevelOutcome> {
    let mut handles: Vec<JoinHandle<()>> = Vec::new();

    let spawned = (|| -> GameResult<()> {
        let b = Arc::clone(shared);
        handles.push(spawn_actor("pacman", move || pacman_actor(&b, tick))?);

        let b = Arc::clone(shared);
        let r = Arc::clone(req);
        handles.push(spawn_actor("input-reader", move || input_actor(&b, &r))?);

        for id in 0..n_ghosts {
            let b = Arc::clone(shared);
            handles.push(spawn_actor(&format!("ghost-{id}"), move || {
                ghost_actor(&b, id, tick)
            })?);
        }
        Ok(())
    })();

    let mut stream_err = None;
    if spawned.is_ok() {
        loop {
            {
                let board = shared.read();
                if !board.running || !board.pacman.alive || board.exit_requested {
                    break;
                }
            }

            if let Err(e) = send_board(notif, shared) {
                // the client stopped reading; wind the level down as a
                // disconnect
                let mut board = shared.write();
                board.running = false;
                board.exit_requested = true;
                stream_err = Some(e);
                break;
            }

            thread::sleep(Duration::from_millis(BROADCAST_PERIOD_MS));
        }
    }

    shared.write().running = false;
    for handle in handles {
        let _ = handle.join();
    }

    // one last frame reflecting the terminal state; if the stream is
    // already gone this fails along with it
    let _ = send_board(notif, shared);

    spawned?;
    if let Some(e) = stream_err {
        return Err(e);
    }

    let board = shared.read();
    Ok(LevelOutcome {
        exit_requested: board.exit_requested,
        dead: !board.pacman.alive,
        points: board.pacman.points,
    })
}

fn spawn_actor<F>(name: &str, f: F) -> GameResult<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(name.to_owned())
        .spawn(f)
        .map_err(|e| GameError::Resource(format!("spawn {name}: {e}")))
}
