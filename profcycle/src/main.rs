//! # profcycle - Main Entry Point
//!
//! Runs one profiling session against a target PID (or profcycle's own
//! process) and exits. Partial capture failures do not abort the session;
//! they are summarized at the end and reflected in the exit status.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::Path;
use std::time::Duration;

use profcycle::cli::Args;
use profcycle::domain::Pid;
use profcycle::engine::ProcEngine;
use profcycle::session::{SessionConfig, SessionRunner};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_PARTIAL: i32 = 3;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            EXIT_ERROR
        }
    });
}

/// Refuse to start a session against a PID that is not alive.
fn check_process_exists(pid: Pid) -> Result<()> {
    if Path::new(&format!("/proc/{}", pid.0)).exists() {
        Ok(())
    } else {
        bail!("Process {pid} not found");
    }
}

#[tokio::main]
async fn run() -> Result<i32> {
    let args = Args::parse();

    let pid = Pid(args.pid.unwrap_or_else(std::process::id));
    check_process_exists(pid)?;

    std::fs::create_dir_all(&args.output_dir).with_context(|| {
        format!("Failed to create output directory {}", args.output_dir.display())
    })?;

    if !args.quiet {
        println!("profcycle v{}", env!("CARGO_PKG_VERSION"));
        println!("pid: {}", pid.0);
        println!("iterations: {}", args.iterations);
        println!("window: {}ms", args.window_ms);
        println!("output: {}", args.output_dir.display());
    }

    let config = SessionConfig {
        iterations: args.iterations,
        window: Duration::from_millis(args.window_ms),
        output_dir: args.output_dir,
    };
    let report = SessionRunner::new(ProcEngine::new(pid), config)
        .run()
        .await
        .context("Failed to pack session archive")?;

    if !args.quiet {
        eprintln!(
            "\nsession: {} iterations, {} artifacts, {} failed steps",
            report.iterations_completed,
            report.artifacts_written,
            report.failures.len(),
        );
        match &report.archive {
            Some(path) => println!("saved: {}", path.display()),
            None => println!("no artifacts captured"),
        }
    }

    if report.fully_succeeded() {
        Ok(EXIT_SUCCESS)
    } else {
        eprintln!("{} capture steps failed:", report.failures.len());
        for failure in &report.failures {
            eprintln!("  {failure}");
        }
        Ok(EXIT_PARTIAL)
    }
}
