//! Iteration controller and session loop
//!
//! Drives each iteration through its fixed step sequence:
//!
//! ```text
//! START snapshot ─▶ start profiling ─▶ window ─▶ stop profiling
//!        ─▶ END snapshot ─▶ export profile ─▶ release engine state
//! ```
//!
//! Steps are strictly ordered within an iteration, and iteration N+1 never
//! starts before iteration N's release has completed, bounding peak memory
//! to one iteration's worth of in-flight profiling data. No step failure
//! halts the session: failures are logged, recorded in the report, and the
//! session runs to completion within its `iterations × window` time budget.

use std::path::PathBuf;
use std::time::Duration;

use log::{info, warn};

use crate::archive;
use crate::capture;
use crate::domain::{ArchiveError, IterationRef};
use crate::engine::ProfilingEngine;
use crate::session::SessionTracker;

/// Session parameters. The defaults live on the CLI; everything below is
/// explicit so tests can run sub-second sessions.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Number of iterations to run. Zero finalizes immediately.
    pub iterations: u32,
    /// CPU profiling window per iteration.
    pub window: Duration,
    /// Directory artifacts and the final archive are written to.
    pub output_dir: PathBuf,
}

/// What a completed session did, for the end-of-run summary and the exit
/// status decision.
#[derive(Debug)]
pub struct SessionReport {
    pub iterations_completed: u32,
    pub artifacts_written: usize,
    /// One entry per failed step, in occurrence order.
    pub failures: Vec<String>,
    /// Path of the packed archive, or `None` when the session produced no
    /// artifacts and packing was skipped.
    pub archive: Option<PathBuf>,
}

impl SessionReport {
    pub fn fully_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Owns the engine and the session state for one full profiling session.
pub struct SessionRunner<E> {
    engine: E,
    config: SessionConfig,
    tracker: SessionTracker,
    failures: Vec<String>,
}

impl<E: ProfilingEngine> SessionRunner<E> {
    pub fn new(engine: E, config: SessionConfig) -> Self {
        Self { engine, config, tracker: SessionTracker::new(), failures: Vec::new() }
    }

    /// Run every configured iteration, then pack the session archive.
    ///
    /// # Errors
    /// Only a failure to create the archive itself is an error; individual
    /// capture failures are recorded in the report instead.
    pub async fn run(mut self) -> Result<SessionReport, ArchiveError> {
        while self.tracker.current_iteration() < self.config.iterations {
            self.run_iteration().await;
            // Next iteration starts on a fresh scheduler turn, letting
            // pending I/O completions interleave between iterations.
            tokio::task::yield_now().await;
        }

        let artifacts = self.tracker.take_artifacts();
        let artifacts_written = artifacts.len();
        let archive = archive::pack(&self.config.output_dir, &artifacts)?;

        Ok(SessionReport {
            iterations_completed: self.tracker.current_iteration(),
            artifacts_written,
            failures: self.failures,
            archive,
        })
    }

    async fn run_iteration(&mut self) {
        let reference = IterationRef::generate();
        info!(
            "iteration {}/{}: reference {reference}",
            self.tracker.current_iteration() + 1,
            self.config.iterations
        );

        // The START snapshot's write completes before sampling begins, so
        // its serialization cost stays out of the CPU profile.
        self.capture_snapshot(&reference, "START").await;

        self.engine.start_profiling(&reference, true);
        tokio::time::sleep(self.config.window).await;

        let stopped = self.engine.stop_profiling(&reference).await;
        let profile = match stopped {
            Ok(profile) => Some(profile),
            Err(e) => {
                self.record_failure(format!("stop profiling {reference}: {e}"));
                None
            }
        };

        // END snapshot before the profile export: the export's CPU cost is
        // not part of what this iteration's profile measured.
        self.capture_snapshot(&reference, "END").await;

        if let Some(profile) = profile {
            let exported =
                capture::export_profile(&profile, &self.config.output_dir, &reference).await;
            match exported {
                Ok(filename) => self.tracker.record_artifact(filename),
                Err(e) => self.record_failure(format!("export profile {reference}: {e}")),
            }
            self.engine.release_profile(profile);
        }
        // Engine state for this iteration's run is dropped here and nowhere
        // else; retained runs would grow with iteration count otherwise.
        self.engine.release_all_profiles();

        self.tracker.increment_iteration();
    }

    async fn capture_snapshot(&mut self, reference: &IterationRef, suffix: &str) {
        let label = format!("{reference}_{suffix}");
        let captured =
            capture::capture_heap_snapshot(&self.engine, &self.config.output_dir, &label).await;
        match captured {
            Ok(filename) => self.tracker.record_artifact(filename),
            Err(e) => self.record_failure(format!("heap snapshot {label}: {e}")),
        }
    }

    fn record_failure(&mut self, what: String) {
        warn!("{what}");
        self.failures.push(what);
    }
}
