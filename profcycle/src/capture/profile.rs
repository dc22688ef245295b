//! CPU profile export
//!
//! The start/stop half of profile capture lives on the engine itself (runs
//! are keyed by iteration reference); this module serializes a stopped run's
//! result to its artifact file.

use std::path::Path;

use crate::domain::{CaptureError, IterationRef};
use crate::engine::ProfileHandle;

/// Write a stopped profiling run's result to `<dir>/CPUPROFILE_<reference>`.
///
/// Returns the artifact filename once the write has completed. The handle is
/// left alive; releasing it is the iteration's cleanup step.
///
/// # Errors
/// Returns an error if the export or the write fails. No retries.
pub async fn export_profile<P: ProfileHandle>(
    profile: &P,
    dir: &Path,
    reference: &IterationRef,
) -> Result<String, CaptureError> {
    let bytes = profile.export().await?;

    let filename = format!("CPUPROFILE_{reference}");
    let path = dir.join(&filename);
    tokio::fs::write(&path, &bytes).await.map_err(|e| CaptureError::WriteFailed {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;

    Ok(filename)
}
