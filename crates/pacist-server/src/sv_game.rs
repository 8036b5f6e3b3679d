// sv_game.rs -- the ticking entity actors of one session
//
// Each actor takes the world lock exclusively for exactly one tick's worth
// of work and sleeps the tick period in between. Cancellation flows through
// board.running / board.exit_requested only.

use std::thread;
use std::time::Duration;

use pacist_common::board::Command;
use pacist_game::{advance_ghost, advance_pacman, MoveResult};

use crate::server::SharedBoard;

/// Drives pacman: scripted moves when the level declares them, the input
/// mailbox otherwise. Ends the level on a portal and honors `Q`.
pub fn pacman_actor(shared: &SharedBoard, tick: Duration) {
    loop {
        {
            let mut board = shared.write();
            if !board.running || !board.pacman.alive {
                break;
            }
            if board.exit_requested {
                board.running = false;
                break;
            }

            if !board.pacman.moves.is_empty() {
                let cursor = board.pacman.cursor;
                let cmd = board.pacman.moves[cursor % board.pacman.moves.len()];
                if advance_pacman(&mut board, cmd) == MoveResult::ReachedPortal {
                    board.running = false;
                }
                board.pacman.cursor = cursor.wrapping_add(1);
            } else if let Some(key) = board.pending_input.take() {
                if key.to_ascii_uppercase() == b'Q' {
                    board.exit_requested = true;
                    board.running = false;
                } else if let Some(cmd) = Command::from_key(key) {
                    if advance_pacman(&mut board, cmd) == MoveResult::ReachedPortal {
                        board.running = false;
                    }
                }
            }
        }

        thread::sleep(tick);
    }
}

/// Drives one scripted ghost; a ghost with no script just idles until the
/// level stops.
pub fn ghost_actor(shared: &SharedBoard, ghost_id: usize, tick: Duration) {
    loop {
        {
            let mut board = shared.write();
            if !board.running {
                break;
            }

            if ghost_id < board.ghosts.len() && !board.ghosts[ghost_id].moves.is_empty() {
                let len = board.ghosts[ghost_id].moves.len();
                let cursor = board.ghosts[ghost_id].cursor;
                let cmd = board.ghosts[ghost_id].moves[cursor % len];
                advance_ghost(&mut board, ghost_id, cmd);
                board.ghosts[ghost_id].cursor = cursor.wrapping_add(1);
            }
        }

        thread::sleep(tick);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pacist_common::board::{Board, CellFlags, Ghost};
    use parking_lot::RwLock;
    use std::sync::Arc;

    fn open_board() -> Board {
        let mut board = Board::new(6, 3);
        board.tempo = 1;
        board
    }

    fn run_pacman(shared: &SharedBoard) -> thread::JoinHandle<()> {
        let b = Arc::clone(shared);
        thread::spawn(move || pacman_actor(&b, Duration::from_millis(1)))
    }

    #[test]
    fn test_scripted_pacman_reaches_portal_and_stops() {
        let mut board = open_board();
        *board.cell_mut(3, 1) |= CellFlags::PORTAL;
        board.pacman.moves = vec![Command::Right, Command::Right];
        let shared: SharedBoard = Arc::new(RwLock::new(board));

        run_pacman(&shared).join().unwrap();

        let board = shared.read();
        assert!(!board.running);
        assert!(board.pacman.alive);
        assert!(!board.exit_requested);
        assert_eq!((board.pacman.x, board.pacman.y), (3, 1));
    }

    #[test]
    fn test_mailbox_consumed_once() {
        let mut board = open_board();
        board.pending_input = Some(b'd');
        let shared: SharedBoard = Arc::new(RwLock::new(board));

        let handle = run_pacman(&shared);
        // wait for the command to be consumed, then stop the actor
        for _ in 0..200 {
            if shared.read().pending_input.is_none() {
                break;
            }
            thread::sleep(Duration::from_millis(1));
        }
        thread::sleep(Duration::from_millis(10));
        shared.write().running = false;
        handle.join().unwrap();

        let board = shared.read();
        // one queued command moves exactly one cell
        assert_eq!((board.pacman.x, board.pacman.y), (2, 1));
        assert_eq!(board.pending_input, None);
    }

    #[test]
    fn test_quit_command_sets_exit_request() {
        let mut board = open_board();
        board.pending_input = Some(b'Q');
        let shared: SharedBoard = Arc::new(RwLock::new(board));

        run_pacman(&shared).join().unwrap();

        let board = shared.read();
        assert!(board.exit_requested);
        assert!(!board.running);
        assert!(board.pacman.alive);
    }

    #[test]
    fn test_ghost_actor_walks_script_and_stops() {
        let mut board = open_board();
        board.pacman.x = 5;
        board.pacman.y = 2;
        board.ghosts.push(Ghost {
            x: 1,
            y: 1,
            moves: vec![Command::Right],
            ..Ghost::default()
        });
        let shared: SharedBoard = Arc::new(RwLock::new(board));

        let b = Arc::clone(&shared);
        let handle = thread::spawn(move || ghost_actor(&b, 0, Duration::from_millis(1)));

        for _ in 0..200 {
            if shared.read().ghosts[0].x >= 3 {
                break;
            }
            thread::sleep(Duration::from_millis(1));
        }
        shared.write().running = false;
        handle.join().unwrap();

        assert!(shared.read().ghosts[0].x >= 3);
    }
}
