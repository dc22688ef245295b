//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

/// Baseline session shape: 10 iterations of a 30 second profiling window.
pub const DEFAULT_ITERATIONS: u32 = 10;
pub const DEFAULT_WINDOW_MS: u64 = 30_000;

#[derive(Parser)]
#[command(
    name = "profcycle",
    about = "Capture paired heap snapshots and CPU profiles of a running process, \
             then pack the session into one archive",
    after_help = "\
EXAMPLES:
    profcycle --pid 1234                          Profile process 1234 with defaults
    profcycle --pid 1234 --iterations 3 --window-ms 5000
    profcycle --output-dir /tmp/prof --quiet      Self-profile into /tmp/prof"
)]
pub struct Args {
    /// Process ID to profile (defaults to profcycle's own process)
    #[arg(short, long)]
    pub pid: Option<u32>,

    /// Number of profiling iterations to run
    #[arg(long, default_value_t = DEFAULT_ITERATIONS)]
    pub iterations: u32,

    /// CPU profiling window per iteration, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_WINDOW_MS)]
    pub window_ms: u64,

    /// Directory artifacts and the final archive are written to
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}
