//! Scripted engine for session state-machine tests
//!
//! Records every engine call with a timestamp and models the run registry's
//! retention semantics, so tests can assert ordering, windows, and
//! exactly-once release without a real profiling target.

#![allow(dead_code)] // not every test file uses every helper

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use profcycle::domain::{CaptureError, IterationRef};
use profcycle::engine::{ProfileHandle, ProfilingEngine, SnapshotHandle};

#[derive(Default)]
pub struct MockState {
    pub snapshot_calls: usize,
    /// (reference, instant) per `start_profiling` call, in call order.
    pub starts: Vec<(String, Instant)>,
    /// (reference, instant) per `stop_profiling` call, in call order.
    pub stops: Vec<(String, Instant)>,
    pub release_profile_calls: usize,
    pub release_all_calls: usize,
    /// References currently retained in the run registry.
    pub registered: Vec<String>,
}

#[derive(Default)]
pub struct MockEngine {
    state: Arc<Mutex<MockState>>,
    /// Zero-based snapshot call indices that fail with a capture error.
    failing_snapshots: Vec<usize>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failing_snapshots(failing_snapshots: Vec<usize>) -> Self {
        Self { failing_snapshots, ..Self::default() }
    }

    /// Shared view of the call record, kept alive after the engine is
    /// consumed by a session runner.
    pub fn state_handle(&self) -> Arc<Mutex<MockState>> {
        Arc::clone(&self.state)
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct MockSnapshot {
    bytes: Vec<u8>,
}

impl SnapshotHandle for MockSnapshot {
    async fn export(&self) -> Result<Vec<u8>, CaptureError> {
        Ok(self.bytes.clone())
    }

    fn release(self) {}
}

pub struct MockProfile {
    pub reference: String,
}

impl ProfileHandle for MockProfile {
    async fn export(&self) -> Result<Vec<u8>, CaptureError> {
        Ok(format!("{{\"mock_profile\":\"{}\"}}", self.reference).into_bytes())
    }
}

impl ProfilingEngine for MockEngine {
    type Snapshot = MockSnapshot;
    type Profile = MockProfile;

    fn take_heap_snapshot(&self) -> Result<MockSnapshot, CaptureError> {
        let mut state = self.state();
        let call = state.snapshot_calls;
        state.snapshot_calls += 1;
        if self.failing_snapshots.contains(&call) {
            return Err(CaptureError::SnapshotFailed(format!("injected failure on call {call}")));
        }
        Ok(MockSnapshot { bytes: b"{\"mock_snapshot\":true}".to_vec() })
    }

    fn start_profiling(&self, reference: &IterationRef, _record_samples: bool) {
        let mut state = self.state();
        state.starts.push((reference.as_str().to_string(), Instant::now()));
        state.registered.push(reference.as_str().to_string());
    }

    async fn stop_profiling(&self, reference: &IterationRef) -> Result<MockProfile, CaptureError> {
        let mut state = self.state();
        if !state.registered.iter().any(|r| r == reference.as_str()) {
            return Err(CaptureError::UnknownReference(reference.to_string()));
        }
        state.stops.push((reference.as_str().to_string(), Instant::now()));
        Ok(MockProfile { reference: reference.as_str().to_string() })
    }

    fn release_profile(&self, profile: MockProfile) {
        let mut state = self.state();
        state.release_profile_calls += 1;
        state.registered.retain(|r| r != &profile.reference);
    }

    fn release_all_profiles(&self) {
        let mut state = self.state();
        state.release_all_calls += 1;
        state.registered.clear();
    }

    fn retained_profiles(&self) -> usize {
        self.state().registered.len()
    }
}
