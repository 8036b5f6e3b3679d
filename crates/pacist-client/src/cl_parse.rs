// cl_parse.rs -- board frames arriving on the notification pipe

use std::io::Read;

use pacist_common::protocol::{msg_read_byte, BoardFrame, OP_BOARD};
use pacist_common::{GameError, GameResult};

/// Read the next BOARD frame. `Disconnected` means the server closed the
/// stream, which is how sessions normally end.
pub fn receive_board<R: Read>(r: &mut R) -> GameResult<BoardFrame> {
    match msg_read_byte(r)? {
        OP_BOARD => BoardFrame::read_payload(r),
        _ => Err(GameError::Protocol("expected BOARD frame")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_receive_board_stream() {
        let a = BoardFrame {
            width: 2,
            height: 2,
            tempo: 100,
            victory: 0,
            game_over: 0,
            points: 0,
            data: b"C  M".to_vec(),
        };
        let mut b = a.clone();
        b.points = 10;
        b.game_over = 1;

        let mut stream = a.encode();
        stream.extend_from_slice(&b.encode());

        let mut r = Cursor::new(stream);
        assert_eq!(receive_board(&mut r).unwrap(), a);
        assert_eq!(receive_board(&mut r).unwrap(), b);
        assert!(matches!(
            receive_board(&mut r),
            Err(GameError::Disconnected)
        ));
    }

    #[test]
    fn test_receive_board_rejects_other_opcode() {
        let mut r = Cursor::new(vec![9u8, 0, 0]);
        assert!(matches!(
            receive_board(&mut r),
            Err(GameError::Protocol(_))
        ));
    }
}
