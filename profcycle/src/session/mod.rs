//! Session state machine
//!
//! The heart of the orchestrator: a fixed number of iterations, each an
//! ordered sequence of mutually-interfering capture steps, driven to
//! completion with exactly-once engine cleanup per iteration and a single
//! archival hand-off at the end.

pub mod runner;
pub mod tracker;

pub use runner::{SessionConfig, SessionReport, SessionRunner};
pub use tracker::SessionTracker;
