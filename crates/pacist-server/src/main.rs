// main.rs -- pacist-server entry point

use std::path::PathBuf;
use std::process;

use clap::Parser;

use pacist_common::debug::open_debug_file;
use pacist_server::server::{ServerConfig, TOP5_PATH};
use pacist_server::sv_init::run_server;

#[derive(Parser)]
#[command(name = "pacist-server", about = "Multi-session pacman server over named pipes")]
struct Args {
    /// Directory holding the .lvl files played by every session
    levels_dir: PathBuf,

    /// Maximum number of concurrent sessions
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    max_games: u32,

    /// Path of the registration FIFO to create
    register_pipe: PathBuf,
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            process::exit(1);
        }
    };
    open_debug_file("server_debug.log");

    let pid = process::id();
    println!(
        "pacist server starting on pipe '{}'",
        args.register_pipe.display()
    );
    println!("PID: {pid} (kill -USR1 {pid} writes {TOP5_PATH})");

    let config = ServerConfig {
        levels_dir: args.levels_dir,
        max_games: args.max_games as usize,
        register_pipe: args.register_pipe,
    };

    if let Err(e) = run_server(config) {
        eprintln!("pacist-server: {e}");
        process::exit(1);
    }
}
