//! Profiling engine abstraction
//!
//! The orchestrator drives an engine through a narrow seam: take a heap
//! snapshot, start/stop a named CPU profiling run, export either result as
//! bytes, and release engine-held state. Everything above this module is
//! engine-agnostic; [`ProcEngine`] is the built-in implementation that reads
//! the target's `/proc` entries.
//!
//! Engines keep a registry of profiling runs keyed by iteration reference.
//! Entries stay registered until explicitly released, so a caller that skips
//! the release step accumulates every run for the life of the process —
//! [`ProfilingEngine::retained_profiles`] exposes the registry size so that
//! leak can be observed.

#![allow(async_fn_in_trait)]

pub mod proc;

pub use proc::{CpuProfile, CpuSample, MemorySnapshot, ProcEngine};

use crate::domain::{CaptureError, IterationRef};

/// One point-in-time heap snapshot held in engine memory.
///
/// Snapshots are large; callers must [`release`](SnapshotHandle::release) a
/// handle as soon as its bytes have been exported, and never hold more than
/// one at a time.
pub trait SnapshotHandle {
    /// Serialize the snapshot to bytes.
    async fn export(&self) -> Result<Vec<u8>, CaptureError>;

    /// Free the in-memory snapshot.
    fn release(self);
}

/// The in-memory result of a stopped CPU profiling run.
pub trait ProfileHandle {
    /// Serialize the profile to bytes.
    async fn export(&self) -> Result<Vec<u8>, CaptureError>;
}

/// Operations the orchestrator needs from a profiling engine.
pub trait ProfilingEngine {
    type Snapshot: SnapshotHandle;
    type Profile: ProfileHandle;

    /// Take one point-in-time heap snapshot of the target process.
    fn take_heap_snapshot(&self) -> Result<Self::Snapshot, CaptureError>;

    /// Begin a CPU sampling run under `reference`. Returns immediately;
    /// sampling proceeds in the background until [`stop_profiling`].
    ///
    /// With `record_samples` false the run keeps only its first and latest
    /// sample instead of the full series.
    ///
    /// [`stop_profiling`]: ProfilingEngine::stop_profiling
    fn start_profiling(&self, reference: &IterationRef, record_samples: bool);

    /// End the sampling run under `reference` and return its result handle.
    /// The run stays registered in the engine until released.
    async fn stop_profiling(&self, reference: &IterationRef)
        -> Result<Self::Profile, CaptureError>;

    /// Free the registry entry behind one profile handle.
    fn release_profile(&self, profile: Self::Profile);

    /// Free every registered profiling run.
    fn release_all_profiles(&self);

    /// Number of profiling runs the engine currently retains.
    fn retained_profiles(&self) -> usize;
}
