//! Session archive
//!
//! Bundles a completed session's artifact files into one gzipped tarball
//! named after the completion timestamp, then deletes the originals.
//! Packing is synchronous: the session is not finished until the archive
//! exists. Cleanup is best-effort — a file that cannot be deleted is logged
//! and skipped, never failing the session.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use log::{info, warn};

use crate::domain::{unix_millis, ArchiveError};

/// Pack `artifacts` (filenames relative to `dir`) into
/// `<dir>/profiling_session-<completion millis>.tar.gz` and delete the
/// originals.
///
/// An artifact that cannot be added (e.g. its capture failed earlier and the
/// file never existed) is logged and skipped so the rest of the session
/// still archives. Returns `None` when `artifacts` is empty: a zero-
/// iteration session skips packing entirely rather than producing a
/// degenerate archive.
///
/// # Errors
/// Returns an error if the archive file itself cannot be created or
/// finalized.
pub fn pack(dir: &Path, artifacts: &[String]) -> Result<Option<PathBuf>, ArchiveError> {
    if artifacts.is_empty() {
        info!("no artifacts captured, skipping archive");
        return Ok(None);
    }

    let archive_path = dir.join(format!("profiling_session-{}.tar.gz", unix_millis()));
    let file = File::create(&archive_path).map_err(|e| ArchiveError::CreateFailed {
        path: archive_path.display().to_string(),
        error: e.to_string(),
    })?;

    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for name in artifacts {
        let path = dir.join(name);
        if let Err(e) = builder.append_path_with_name(&path, name) {
            warn!("could not add {} to archive: {e}", path.display());
        }
    }
    builder.into_inner()?.finish()?;

    remove_files(dir, artifacts);

    info!("packed {} artifacts into {}", artifacts.len(), archive_path.display());
    Ok(Some(archive_path))
}

/// Delete the original artifact files. A failed deletion is logged and does
/// not stop the remaining deletions.
fn remove_files(dir: &Path, artifacts: &[String]) {
    for name in artifacts {
        let path = dir.join(name);
        if let Err(e) = fs::remove_file(&path) {
            warn!("could not unlink file {}: {e}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;

    fn write_artifact(dir: &Path, name: &str) {
        fs::write(dir.join(name), format!("payload of {name}")).unwrap();
    }

    fn archive_entry_names(path: &Path) -> Vec<String> {
        let mut archive = tar::Archive::new(GzDecoder::new(File::open(path).unwrap()));
        archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().display().to_string())
            .collect()
    }

    #[test]
    fn test_pack_moves_artifacts_into_archive() {
        let dir = tempfile::tempdir().unwrap();
        let names = vec!["HEAPSNAPSHOT_r1_START".to_string(), "CPUPROFILE_r1".to_string()];
        for name in &names {
            write_artifact(dir.path(), name);
        }

        let archive = pack(dir.path(), &names).unwrap().unwrap();

        assert!(archive.exists());
        assert_eq!(archive_entry_names(&archive), names);
        for name in &names {
            assert!(!dir.path().join(name).exists(), "{name} should have been deleted");
        }
    }

    #[test]
    fn test_pack_empty_list_skips_archive() {
        let dir = tempfile::tempdir().unwrap();
        assert!(pack(dir.path(), &[]).unwrap().is_none());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_artifact_does_not_abort_packing() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(dir.path(), "CPUPROFILE_r1");
        let names = vec!["HEAPSNAPSHOT_never_written".to_string(), "CPUPROFILE_r1".to_string()];

        let archive = pack(dir.path(), &names).unwrap().unwrap();

        assert_eq!(archive_entry_names(&archive), ["CPUPROFILE_r1"]);
        assert!(!dir.path().join("CPUPROFILE_r1").exists());
    }

    #[test]
    fn test_undeletable_artifact_does_not_stop_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        // A directory under an artifact name survives remove_file
        fs::create_dir(dir.path().join("HEAPSNAPSHOT_stuck")).unwrap();
        write_artifact(dir.path(), "HEAPSNAPSHOT_ok_START");
        write_artifact(dir.path(), "CPUPROFILE_ok");
        let names = vec![
            "HEAPSNAPSHOT_ok_START".to_string(),
            "HEAPSNAPSHOT_stuck".to_string(),
            "CPUPROFILE_ok".to_string(),
        ];

        let archive = pack(dir.path(), &names).unwrap().unwrap();

        assert!(archive.exists());
        assert!(dir.path().join("HEAPSNAPSHOT_stuck").exists());
        assert!(!dir.path().join("HEAPSNAPSHOT_ok_START").exists());
        assert!(!dir.path().join("CPUPROFILE_ok").exists());
    }

    #[test]
    fn test_archive_name_carries_completion_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(dir.path(), "CPUPROFILE_r1");
        let before = unix_millis();

        let archive = pack(dir.path(), &["CPUPROFILE_r1".to_string()]).unwrap().unwrap();

        let name = archive.file_name().unwrap().to_string_lossy().into_owned();
        let ts: u64 = name
            .strip_prefix("profiling_session-")
            .and_then(|rest| rest.strip_suffix(".tar.gz"))
            .unwrap()
            .parse()
            .unwrap();
        assert!(ts >= before);
    }
}
