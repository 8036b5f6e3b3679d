// cl_main.rs -- client driver: handshake, input loop, receiver thread

use std::fs::File;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{info, warn};

use pacist_common::{GameError, GameResult};

use crate::cl_input::{poll_key, Script};
use crate::cl_parse::receive_board;
use crate::cl_scrn::Screen;
use crate::client::ClientSession;

/// Pacing used before the first BOARD frame announces the real tempo.
pub const DEFAULT_TEMPO_MS: i32 = 200;

/// Longest uninterruptible sleep; keeps the input loop responsive to
/// server-initiated termination.
const POLL_SLICE_MS: u64 = 50;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub client_id: String,
    pub register_pipe: PathBuf,
    pub commands_file: Option<PathBuf>,
}

pub fn run_client(config: &ClientConfig) -> GameResult<()> {
    let script = config
        .commands_file
        .as_deref()
        .map(Script::load)
        .transpose()?;

    let (mut session, notif) = ClientSession::connect(&config.client_id, &config.register_pipe)?;
    info!("connected to {}", config.register_pipe.display());

    let stop = Arc::new(AtomicBool::new(false));
    let tempo = Arc::new(AtomicI32::new(DEFAULT_TEMPO_MS));

    let screen = Screen::init();
    let receiver = {
        let stop = Arc::clone(&stop);
        let tempo = Arc::clone(&tempo);
        thread::Builder::new()
            .name("receiver".to_owned())
            .spawn(move || receiver_loop(notif, screen, &stop, &tempo))
            .map_err(|e| GameError::Resource(format!("spawn receiver: {e}")))?
    };

    drive_loop(&mut session, script, &stop, &tempo);

    session.disconnect();

    let mut screen = receiver.join().unwrap_or_else(|_| Screen::inactive());
    if screen.is_active() {
        // leave the final frame on screen long enough to read it
        thread::sleep(Duration::from_millis(2000));
    }
    screen.cleanup();
    Ok(())
}

/// Draw every incoming frame until the session ends, keeping the shared
/// tempo current for the input pacing.
fn receiver_loop(
    mut notif: File,
    mut screen: Screen,
    stop: &AtomicBool,
    tempo: &AtomicI32,
) -> Screen {
    loop {
        match receive_board(&mut notif) {
            Ok(frame) => {
                tempo.store(frame.tempo, Ordering::Relaxed);
                screen.draw(&frame);
                if frame.game_over != 0 {
                    break;
                }
            }
            Err(e) => {
                if !e.is_disconnect() {
                    warn!("notification stream error: {e}");
                }
                break;
            }
        }
    }
    stop.store(true, Ordering::Relaxed);
    screen
}

fn drive_loop(
    session: &mut ClientSession,
    mut script: Option<Script>,
    stop: &AtomicBool,
    tempo: &AtomicI32,
) {
    loop {
        if stop.load(Ordering::Relaxed) {
            break;
        }

        let key = match script.as_mut() {
            Some(script) => {
                let Some(key) = script.next_key() else {
                    break;
                };
                sleep_one_tempo(tempo, stop);
                if stop.load(Ordering::Relaxed) {
                    break;
                }
                Some(key)
            }
            None => poll_key(Duration::from_millis(POLL_SLICE_MS)),
        };

        let Some(key) = key else {
            continue;
        };

        if session.play(key).is_err() {
            break;
        }
        if key == b'Q' {
            break;
        }
    }
}

/// Sleep one tempo period in slices so a stop request cuts it short.
fn sleep_one_tempo(tempo: &AtomicI32, stop: &AtomicBool) {
    let mut left = tempo.load(Ordering::Relaxed).max(0) as u64;
    while left > 0 && !stop.load(Ordering::Relaxed) {
        let step = left.min(POLL_SLICE_MS);
        thread::sleep(Duration::from_millis(step));
        left -= step;
    }
}
