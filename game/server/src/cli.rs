//! CLI arguments, grounded on the teacher's clap usage in
//! `server/services/authenticator/src/main.rs`, modernized to `clap::Parser`
//! derive per the pack's `rdaum-moor` examples (the teacher's own `clap` 2.x
//! `App`/`Arg` builder API predates the derive macro).

use clap::Parser;
use std::path::PathBuf;

/// Runs the hangman match server.
#[derive(Parser, Debug)]
#[command(name = "hangman-server", version)]
pub struct Args {
    /// TCP port to listen on.
    #[arg(default_value_t = 5000)]
    pub port: u16,

    /// Number of worker threads draining the job queue.
    #[arg(long, default_value_t = 1)]
    pub workers: usize,

    /// Directory holding users.txt, history/, and the word corpora.
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Log severity: trace, debug, info, warning, error, critical.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
