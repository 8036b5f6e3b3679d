// main.rs -- pacist-client entry point

use std::path::PathBuf;
use std::process;

use clap::Parser;

use pacist_client::cl_main::{run_client, ClientConfig};
use pacist_common::debug::open_debug_file;

#[derive(Parser)]
#[command(name = "pacist-client", about = "Pacman client over named pipes")]
struct Args {
    /// Identifier used to name this client's FIFOs under /tmp
    client_id: String,

    /// The server's registration FIFO
    register_pipe: PathBuf,

    /// Optional command script; without it, play is interactive (WASD, Q)
    commands_file: Option<PathBuf>,
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            process::exit(1);
        }
    };
    open_debug_file("client_debug.log");

    let config = ClientConfig {
        client_id: args.client_id,
        register_pipe: args.register_pipe,
        commands_file: args.commands_file,
    };

    if let Err(e) = run_client(&config) {
        eprintln!("pacist-client: {e}");
        process::exit(1);
    }
}
