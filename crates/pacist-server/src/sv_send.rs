// sv_send.rs -- snapshot serialization to the client's notification pipe

use std::fs::File;

use parking_lot::Mutex;

use pacist_common::protocol::{write_full, BoardFrame};
use pacist_common::GameResult;

use crate::server::SharedBoard;

/// Build a BOARD frame from a point-in-time consistent view of the world
/// and emit it as a single write.
///
/// Lock order is fixed: the output mutex is taken first, the world lock
/// (read) nested inside it, and the world lock is released before the
/// bytes hit the pipe.
pub fn send_board(notif: &Mutex<File>, shared: &SharedBoard) -> GameResult<()> {
    let mut out = notif.lock();

    let frame = {
        let board = shared.read();
        BoardFrame {
            width: board.width,
            height: board.height,
            tempo: board.tempo,
            victory: i32::from(!board.running && board.pacman.alive && !board.exit_requested),
            game_over: i32::from(!board.pacman.alive),
            points: board.pacman.points,
            data: board.render(),
        }
    };

    write_full(&mut *out, &frame.encode())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pacist_common::board::Board;
    use pacist_common::protocol::{msg_read_byte, BoardFrame, OP_BOARD};
    use parking_lot::RwLock;
    use std::io::{Read, Seek, SeekFrom};
    use std::sync::Arc;

    fn frame_through_file(board: Board) -> BoardFrame {
        let mut tmp = tempfile::tempfile().unwrap();
        let notif = Mutex::new(tmp.try_clone().unwrap());
        let shared: SharedBoard = Arc::new(RwLock::new(board));

        send_board(&notif, &shared).unwrap();

        tmp.seek(SeekFrom::Start(0)).unwrap();
        let mut r = tmp.by_ref();
        assert_eq!(msg_read_byte(&mut r).unwrap(), OP_BOARD);
        BoardFrame::read_payload(&mut r).unwrap()
    }

    #[test]
    fn test_running_board_has_no_terminal_bits() {
        let mut board = Board::new(3, 2);
        board.pacman.points = 30;
        let frame = frame_through_file(board);
        assert_eq!((frame.victory, frame.game_over), (0, 0));
        assert_eq!(frame.points, 30);
        assert_eq!(frame.data.len(), 6);
    }

    #[test]
    fn test_victory_and_game_over_are_exclusive() {
        // natural end of level: stopped, alive, no exit request
        let mut board = Board::new(2, 2);
        board.running = false;
        let frame = frame_through_file(board.clone());
        assert_eq!((frame.victory, frame.game_over), (1, 0));

        // dead pacman
        board.pacman.alive = false;
        let frame = frame_through_file(board.clone());
        assert_eq!((frame.victory, frame.game_over), (0, 1));

        // client-requested exit: neither flag
        board.pacman.alive = true;
        board.exit_requested = true;
        let frame = frame_through_file(board);
        assert_eq!((frame.victory, frame.game_over), (0, 0));
    }
}
