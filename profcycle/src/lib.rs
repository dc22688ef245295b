//! # profcycle - Scheduled Profiling-Session Orchestrator
//!
//! profcycle repeatedly captures paired memory and CPU-time snapshots of a
//! running process, keeps the overhead of one capture kind from polluting
//! the other, persists every capture to disk, and packs the whole session
//! into a single gzipped tarball for offline analysis.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Session Runner                         │
//! │                                                             │
//! │  per iteration (strictly ordered):                          │
//! │                                                             │
//! │  ┌──────────┐  ┌───────────┐  ┌──────────┐  ┌──────────┐ │
//! │  │ snapshot │─▶│  profile  │─▶│ snapshot │─▶│ release  │ │
//! │  │  START   │  │  window   │  │   END    │  │  engine  │ │
//! │  └──────────┘  └───────────┘  └──────────┘  └──────────┘ │
//! │         │             │              │                      │
//! │         ▼             ▼              ▼                      │
//! │  ┌──────────────────────────────────────┐  ┌────────────┐ │
//! │  │       Session Tracker (filenames)    │─▶│  Archiver  │ │
//! │  └──────────────────────────────────────┘  │  (tar.gz)  │ │
//! │                                             └────────────┘ │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`session`]: the state machine — iteration controller and session
//!   bookkeeping. Iterations run in strict sequence; iteration N+1 never
//!   starts before iteration N released its engine state.
//! - [`engine`]: the profiling engine seam ([`engine::ProfilingEngine`])
//!   and the built-in `/proc`-backed implementation.
//! - [`capture`]: lands snapshot and profile exports on disk as
//!   `HEAPSNAPSHOT_<ref>_{START,END}` and `CPUPROFILE_<ref>` artifacts.
//! - [`archive`]: packs the session's artifacts into
//!   `profiling_session-<timestamp>.tar.gz` and removes the originals.
//! - [`domain`]: iteration references, process ids, error types.
//! - [`cli`]: command-line argument parsing.
//!
//! ## Why two snapshots per profile?
//!
//! Serializing a heap snapshot costs CPU. Taking the START snapshot to
//! completion *before* the profiling window opens, and the END snapshot
//! *after* it closes, keeps that cost out of the CPU profile while still
//! bracketing the window with memory state.
//!
//! ## Typical Usage
//!
//! ```bash
//! # Ten 30s iterations against PID 1234, archive in the current directory
//! profcycle --pid 1234
//!
//! # A quick session against profcycle itself
//! profcycle --iterations 2 --window-ms 1000 --output-dir /tmp/prof
//! ```

pub mod archive;
pub mod capture;
pub mod cli;
pub mod domain;
pub mod engine;
pub mod session;
