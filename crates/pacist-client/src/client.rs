// client.rs -- session lifecycle against the server's FIFOs
//
// The client owns both per-client FIFOs on disk: it creates them before
// the handshake and unlinks them on disconnect.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use nix::sys::stat::Mode;
use nix::unistd::mkfifo;

use pacist_common::protocol::{
    read_connect_ack, write_full, ConnectRequest, OP_DISCONNECT, OP_PLAY,
};
use pacist_common::{GameError, GameResult};

pub struct ClientSession {
    req_pipe_path: PathBuf,
    notif_pipe_path: PathBuf,
    /// Write end of the request pipe; None once disconnected.
    req: Option<File>,
}

impl ClientSession {
    /// Negotiate a session. Creates the two per-client FIFOs under /tmp,
    /// posts the CONNECT request, waits for the ACK and opens the request
    /// pipe. Returns the session plus the notification reader for the
    /// receive loop.
    pub fn connect(client_id: &str, register_pipe: &Path) -> GameResult<(ClientSession, File)> {
        let req_pipe_path = PathBuf::from(format!("/tmp/{client_id}_request"));
        let notif_pipe_path = PathBuf::from(format!("/tmp/{client_id}_notification"));

        let _ = fs::remove_file(&req_pipe_path);
        let _ = fs::remove_file(&notif_pipe_path);

        match Self::handshake(&req_pipe_path, &notif_pipe_path, register_pipe) {
            Ok((req, notif)) => {
                debug!("connected as {client_id}");
                Ok((
                    ClientSession {
                        req_pipe_path,
                        notif_pipe_path,
                        req: Some(req),
                    },
                    notif,
                ))
            }
            Err(e) => {
                let _ = fs::remove_file(&req_pipe_path);
                let _ = fs::remove_file(&notif_pipe_path);
                Err(e)
            }
        }
    }

    fn handshake(
        req_pipe_path: &Path,
        notif_pipe_path: &Path,
        register_pipe: &Path,
    ) -> GameResult<(File, File)> {
        let mode = Mode::from_bits_truncate(0o666);
        mkfifo(req_pipe_path, mode).map_err(|e| GameError::Io(e.into()))?;
        mkfifo(notif_pipe_path, mode).map_err(|e| GameError::Io(e.into()))?;

        let request = ConnectRequest {
            req_pipe: req_pipe_path.to_string_lossy().into_owned(),
            notif_pipe: notif_pipe_path.to_string_lossy().into_owned(),
        };

        {
            let mut register = OpenOptions::new().write(true).open(register_pipe)?;
            write_full(&mut register, &request.encode()?)?;
        }

        // blocks until a worker picks the request up and opens its end
        let mut notif = File::open(notif_pipe_path)?;
        let result = read_connect_ack(&mut notif)?;
        if result != 0 {
            return Err(GameError::Refused(result));
        }

        let req = OpenOptions::new().write(true).open(req_pipe_path)?;
        Ok((req, notif))
    }

    /// Send one PLAY command byte.
    pub fn play(&mut self, cmd: u8) -> GameResult<()> {
        let Some(req) = self.req.as_mut() else {
            return Err(GameError::Disconnected);
        };
        write_full(req, &[OP_PLAY, cmd])?;
        Ok(())
    }

    /// Orderly termination: send DISCONNECT, close the request pipe and
    /// remove both FIFOs. Calling it again is a no-op.
    pub fn disconnect(&mut self) {
        if let Some(mut req) = self.req.take() {
            if let Err(e) = write_full(&mut req, &[OP_DISCONNECT]) {
                warn!("disconnect not delivered: {e}");
            }
            let _ = fs::remove_file(&self.req_pipe_path);
            let _ = fs::remove_file(&self.notif_pipe_path);
        }
    }
}

impl Drop for ClientSession {
    fn drop(&mut self) {
        self.disconnect();
    }
}
