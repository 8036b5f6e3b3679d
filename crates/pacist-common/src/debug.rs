// debug.rs -- debug log file setup
//
// Both binaries log through the `log` facade into a debug file in the
// working directory. RUST_LOG overrides the default level.

use std::fs::File;

use env_logger::{Builder, Env, Target};

/// Route the log facade into `path`, falling back to stderr when the file
/// cannot be created. Safe to call more than once; later calls lose.
pub fn open_debug_file(path: &str) {
    let env = Env::default().default_filter_or("debug");
    let mut builder = Builder::from_env(env);
    if let Ok(file) = File::create(path) {
        builder.target(Target::Pipe(Box::new(file)));
    }
    let _ = builder.try_init();
}
