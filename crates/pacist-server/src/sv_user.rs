// sv_user.rs -- per-session reader of client requests
//
// One actor per session blocks on the request pipe and turns what arrives
// into world-state changes: PLAY commands land in the single-slot input
// mailbox (last write wins), everything that signals the client going away
// turns into an exit request.

use std::fs::File;

use log::{debug, warn};

use pacist_common::protocol::{msg_read_byte, OP_DISCONNECT, OP_PLAY};

use crate::server::SharedBoard;

/// Runs until the session stops or the client disconnects.
pub fn input_actor(shared: &SharedBoard, req: &File) {
    let mut reader = req;

    loop {
        {
            let board = shared.read();
            if !board.running {
                break;
            }
        }

        let op = match msg_read_byte(&mut reader) {
            Ok(op) => op,
            Err(_) => {
                // pipe closed or unreadable: the client is gone
                request_exit(shared);
                break;
            }
        };

        match op {
            OP_DISCONNECT => {
                debug!("client sent DISCONNECT");
                request_exit(shared);
                break;
            }
            OP_PLAY => match msg_read_byte(&mut reader) {
                Ok(cmd) => {
                    let mut board = shared.write();
                    board.pending_input = Some(cmd);
                }
                Err(_) => continue,
            },
            other => {
                // a malformed frame on a session pipe is fatal to the session
                warn!("unexpected opcode {other} on request pipe");
                request_exit(shared);
                break;
            }
        }
    }
}

fn request_exit(shared: &SharedBoard) {
    let mut board = shared.write();
    board.exit_requested = true;
    board.running = false;
}
