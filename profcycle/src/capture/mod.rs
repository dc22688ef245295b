//! Artifact capture
//!
//! Wraps the engine's snapshot and profile operations and lands each result
//! on disk as a uniquely-named artifact file. The capturers own the
//! filename convention; callers only see the returned names.

pub mod profile;
pub mod snapshot;

pub use profile::export_profile;
pub use snapshot::capture_heap_snapshot;
