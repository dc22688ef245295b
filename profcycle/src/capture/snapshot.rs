//! Heap snapshot capture
//!
//! One snapshot per call: take, export, release, write. The in-memory
//! snapshot is released as soon as its bytes exist — snapshots are large and
//! at most one may be held at a time.

use std::path::Path;

use crate::domain::CaptureError;
use crate::engine::{ProfilingEngine, SnapshotHandle};

/// Capture one heap snapshot and write it to `<dir>/HEAPSNAPSHOT_<label>`.
///
/// Returns the artifact filename once the write has completed, so a
/// subsequent profiling run does not observe the snapshot's serialization
/// cost.
///
/// # Errors
/// Returns an error if the engine cannot produce or export the snapshot, or
/// if the write fails. No retries either way.
pub async fn capture_heap_snapshot<E: ProfilingEngine>(
    engine: &E,
    dir: &Path,
    label: &str,
) -> Result<String, CaptureError> {
    let snapshot = engine.take_heap_snapshot()?;
    let exported = snapshot.export().await;
    snapshot.release();
    let bytes = exported?;

    let filename = format!("HEAPSNAPSHOT_{label}");
    let path = dir.join(&filename);
    tokio::fs::write(&path, &bytes).await.map_err(|e| CaptureError::WriteFailed {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;

    Ok(filename)
}
