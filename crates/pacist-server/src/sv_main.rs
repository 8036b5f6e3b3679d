// sv_main.rs -- the listener on the registration FIFO
//
// The listener is the only thread with SIGUSR1 unblocked. Its blocking
// reads return EINTR when the signal lands, which sends the loop back to
// the flag check at the top; the report is therefore written between
// frames, never in the middle of one.

use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::sync::atomic::Ordering;

use log::{debug, warn};

use pacist_common::protocol::{ConnectRequest, OP_CONNECT};
use pacist_common::GameResult;

use crate::server::TOP5_PATH;
use crate::sv_queue::RequestQueue;
use crate::sv_report::{unblock_sigusr1, ActiveGames, SIGUSR1_RECEIVED};

/// Accept connection requests until the registration FIFO becomes
/// unusable. Runs on its own thread.
pub fn listener_loop(
    register_pipe: &Path,
    queue: &RequestQueue,
    registry: &ActiveGames,
) -> GameResult<()> {
    unblock_sigusr1()?;

    let mut reader = open_register_reader(register_pipe, registry)?;

    // a write end held open by ourselves keeps the FIFO from reading EOF
    // every time the last client closes it; losing it is tolerable because
    // EOF now triggers a reopen
    let _dummy = OpenOptions::new()
        .write(true)
        .custom_flags(libc::O_NONBLOCK)
        .open(register_pipe)
        .ok();

    let mut op = [0u8; 1];
    loop {
        check_operator_signal(registry);

        match reader.read(&mut op) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!("registration pipe read error: {e}");
                continue;
            }
            Ok(0) => {
                reader = open_register_reader(register_pipe, registry)?;
                continue;
            }
            Ok(_) => {}
        }

        if op[0] != OP_CONNECT {
            // garbage on the registration channel is dropped, never fatal
            debug!("ignoring stray opcode {} on registration pipe", op[0]);
            continue;
        }

        match ConnectRequest::read_payload(&mut reader) {
            Ok(req) => {
                debug!("connection request: {} / {}", req.req_pipe, req.notif_pipe);
                queue.push(req);
            }
            Err(e) => {
                debug!("dropping malformed connection request: {e}");
                continue;
            }
        }
    }
}

fn check_operator_signal(registry: &ActiveGames) {
    if SIGUSR1_RECEIVED.swap(false, Ordering::Relaxed) {
        if let Err(e) = registry.write_report(Path::new(TOP5_PATH)) {
            warn!("cannot write {TOP5_PATH}: {e}");
        }
    }
}

/// Open the FIFO for reading, retrying when the open itself is interrupted
/// by the operator signal. A failure here is fatal to the server.
fn open_register_reader(register_pipe: &Path, registry: &ActiveGames) -> GameResult<File> {
    loop {
        check_operator_signal(registry);
        match File::open(register_pipe) {
            Ok(f) => return Ok(f),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}
