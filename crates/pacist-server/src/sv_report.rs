// sv_report.rs -- active-session registry and the operator's top-5 report
//
// SIGUSR1 sets a process-global flag from the handler; the listener polls
// it between reads and writes the report. The signal is blocked everywhere
// except the listener thread so the interrupted read is always the
// listener's.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use log::info;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal, SigmaskHow};
use parking_lot::Mutex;

use pacist_common::{GameError, GameResult};

use crate::server::SharedBoard;

/// How many ranked entries the report shows, independent of registry size.
pub const TOP_RANKS: usize = 5;

pub static SIGUSR1_RECEIVED: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_sigusr1(_signum: libc::c_int) {
    SIGUSR1_RECEIVED.store(true, Ordering::Relaxed);
}

/// Install the SIGUSR1 handler. SA_RESTART is deliberately absent so the
/// listener's blocking reads return EINTR and reach the flag check.
pub fn install_sigusr1_handler() -> GameResult<()> {
    let action = SigAction::new(
        SigHandler::Handler(handle_sigusr1),
        SaFlags::empty(),
        SigSet::empty(),
    );
    unsafe { signal::sigaction(Signal::SIGUSR1, &action) }
        .map_err(|e| GameError::Io(e.into()))?;
    Ok(())
}

fn usr1_set() -> SigSet {
    let mut set = SigSet::empty();
    set.add(Signal::SIGUSR1);
    set
}

/// Block SIGUSR1 on the calling thread; call from main before spawning so
/// every worker inherits the mask.
pub fn block_sigusr1() -> GameResult<()> {
    signal::pthread_sigmask(SigmaskHow::SIG_BLOCK, Some(&usr1_set()), None)
        .map_err(|e| GameError::Io(e.into()))
}

/// Unblock SIGUSR1 on the calling thread; the listener calls this for
/// itself.
pub fn unblock_sigusr1() -> GameResult<()> {
    signal::pthread_sigmask(SigmaskHow::SIG_UNBLOCK, Some(&usr1_set()), None)
        .map_err(|e| GameError::Io(e.into()))
}

struct GameSlot {
    client_id: i32,
    /// Present exactly while the slot is active.
    board: Option<SharedBoard>,
}

/// Fixed-size registry of the sessions currently running, used only to
/// produce the operator report.
pub struct ActiveGames {
    slots: Mutex<Vec<GameSlot>>,
}

impl ActiveGames {
    pub fn new(capacity: usize) -> ActiveGames {
        let mut slots = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            slots.push(GameSlot {
                client_id: -1,
                board: None,
            });
        }
        ActiveGames {
            slots: Mutex::new(slots),
        }
    }

    /// Claim the first free slot. Returns None when the registry is full;
    /// the session then simply runs unregistered.
    pub fn register(&self, client_id: i32, board: SharedBoard) -> Option<usize> {
        let mut slots = self.slots.lock();
        for (i, slot) in slots.iter_mut().enumerate() {
            if slot.board.is_none() {
                slot.client_id = client_id;
                slot.board = Some(board);
                return Some(i);
            }
        }
        None
    }

    pub fn deregister(&self, index: usize) {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.get_mut(index) {
            slot.client_id = -1;
            slot.board = None;
        }
    }

    /// Write the ranked report of active games, truncating prior contents.
    ///
    /// The board refs are copied out under the registry mutex and the
    /// points read after it is released; a world lock is never taken while
    /// the registry is held.
    pub fn write_report(&self, path: &Path) -> io::Result<()> {
        let active: Vec<(usize, i32, SharedBoard)> = {
            let slots = self.slots.lock();
            slots
                .iter()
                .enumerate()
                .filter_map(|(i, s)| s.board.clone().map(|b| (i, s.client_id, b)))
                .collect()
        };

        let mut ranked: Vec<(usize, i32, i32)> = active
            .into_iter()
            .map(|(i, id, board)| (i, id, board.read().pacman.points))
            .collect();
        ranked.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)));

        let mut f = File::create(path)?;
        writeln!(f, "--- TOP {TOP_RANKS} PLAYERS ---")?;
        if ranked.is_empty() {
            writeln!(f, "No active games.")?;
        }
        for (rank, (_, client_id, points)) in ranked.iter().take(TOP_RANKS).enumerate() {
            writeln!(f, "Rank {}: Client ID {client_id} - Points: {points}", rank + 1)?;
        }

        info!("wrote operator report to {}", path.display());
        Ok(())
    }
}
