// session.rs -- end-to-end tests over real FIFOs
//
// Each test brings up a full server (listener, workers, sessions) inside
// this process and talks to it through the client library, exactly the way
// the binaries do.

use std::path::{Path, PathBuf};
use std::process;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use pacist_client::cl_parse::receive_board;
use pacist_client::ClientSession;
use pacist_server::server::ServerConfig;
use pacist_server::sv_init::run_server;

// two identical levels: a dot two steps right of the start, the portal two
// steps further
const LEVEL: &str = "\
DIM 4 6
TEMPO 20
XXXXXX
X o @X
X    X
XXXXXX
";

fn start_server(max_games: usize, levels: &[&str]) -> (PathBuf, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    for name in levels {
        std::fs::write(dir.path().join(name), LEVEL).unwrap();
    }

    let register_pipe = dir.path().join("register.fifo");
    let config = ServerConfig {
        levels_dir: dir.path().to_path_buf(),
        max_games,
        register_pipe: register_pipe.clone(),
    };
    thread::Builder::new()
        .name("test-server".to_owned())
        .spawn(move || {
            let _ = run_server(config);
        })
        .unwrap();

    for _ in 0..100 {
        if register_pipe.exists() {
            break;
        }
        thread::sleep(Duration::from_millis(20));
    }
    assert!(register_pipe.exists(), "server did not create its FIFO");
    (register_pipe, dir)
}

fn unique_client_id(suffix: u32) -> String {
    format!("{}{suffix:02}", process::id())
}

#[test]
fn full_session_across_two_levels() {
    let (register_pipe, _dir) = start_server(2, &["1.lvl", "2.lvl"]);

    let id = unique_client_id(1);
    let (mut session, mut notif) =
        ClientSession::connect(&id, &register_pipe).expect("handshake should succeed");

    // keep nudging pacman right; each level ends at the portal and the
    // second victory closes the stream
    let mut victories = 0;
    let mut last_points = 0;
    let mut ended = false;
    for _ in 0..1000 {
        let _ = session.play(b'D');
        match receive_board(&mut notif) {
            Ok(frame) => {
                assert_eq!((frame.width, frame.height), (6, 4));
                assert!(
                    frame.points >= last_points,
                    "points went backwards: {} -> {}",
                    last_points,
                    frame.points
                );
                last_points = frame.points;
                if frame.victory == 1 {
                    victories += 1;
                    assert_eq!(frame.game_over, 0);
                }
            }
            Err(_) => {
                ended = true;
                break;
            }
        }
    }

    assert!(ended, "notification stream should close after the last level");
    assert_eq!(victories, 2);
    // one dot per level, carried across the boundary
    assert_eq!(last_points, 20);

    session.disconnect();
}

#[test]
fn quit_command_ends_session_without_game_over() {
    let (register_pipe, _dir) = start_server(1, &["1.lvl"]);

    let id = unique_client_id(2);
    let (mut session, mut notif) = ClientSession::connect(&id, &register_pipe).unwrap();

    let first = receive_board(&mut notif).expect("a running frame before quitting");
    assert_eq!((first.victory, first.game_over), (0, 0));

    session.play(b'Q').unwrap();
    // as in the real driver, disconnect follows the Q immediately; it is
    // what unblocks the server's input reader for the final join
    session.disconnect();

    // frames keep their terminal bits clear all the way to the close
    let mut ended = false;
    for _ in 0..1000 {
        match receive_board(&mut notif) {
            Ok(frame) => {
                assert_eq!(frame.victory, 0);
                assert_eq!(frame.game_over, 0);
            }
            Err(_) => {
                ended = true;
                break;
            }
        }
    }
    assert!(ended, "session should end after Q");
}

#[test]
fn excess_client_waits_for_a_free_slot() {
    let (register_pipe, _dir) = start_server(1, &["1.lvl"]);

    let id_a = unique_client_id(3);
    let (mut a, notif_a) = ClientSession::connect(&id_a, &register_pipe).unwrap();

    let id_b = unique_client_id(4);
    let (tx, rx) = mpsc::channel();
    let register_b = register_pipe.clone();
    thread::spawn(move || {
        tx.send(ClientSession::connect(&id_b, &register_b)).ok();
    });

    // with the only slot busy, the second handshake must not complete
    assert!(
        rx.recv_timeout(Duration::from_millis(400)).is_err(),
        "second client connected while no slot was free"
    );

    a.disconnect();
    drop(notif_a);

    let (mut b, mut notif_b) = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("second client should be admitted once the slot frees")
        .expect("second handshake should succeed");

    let frame = receive_board(&mut notif_b).expect("admitted client receives snapshots");
    assert_eq!((frame.victory, frame.game_over), (0, 0));

    b.disconnect();
}

#[test]
fn client_ids_follow_the_pipe_naming() {
    // not an end-to-end concern, but pin the naming contract the server
    // relies on for the report
    let path = format!("/tmp/{}_request", unique_client_id(5));
    let name = Path::new(&path).file_name().unwrap().to_str().unwrap();
    assert!(name.ends_with("_request"));
    assert!(name.split('_').next().unwrap().parse::<i64>().is_ok());
}
