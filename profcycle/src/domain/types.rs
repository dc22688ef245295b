//! Domain types providing compile-time safety and self-documentation
//!
//! Newtype wrappers prevent common bugs like passing a raw counter where an
//! iteration reference is expected, and make function signatures more
//! expressive.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Process ID
///
/// Represents a process ID in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pid(pub u32);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PID:{}", self.0)
    }
}

/// Unique reference correlating one iteration's artifacts and engine handles.
///
/// Composed of wall-clock millis, the orchestrator's own PID, and a
/// process-wide monotonic counter, so references stay unique across
/// iterations of one session and across orchestrator instances running
/// concurrently against the same process (e.g. a multi-worker deployment).
/// Never reused once generated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IterationRef(String);

/// Monotonic per-process sequence component of [`IterationRef`].
static NEXT_SEQ: AtomicU64 = AtomicU64::new(0);

impl IterationRef {
    /// Generate a fresh reference. Each call returns a distinct value.
    pub fn generate() -> Self {
        let seq = NEXT_SEQ.fetch_add(1, Ordering::Relaxed);
        IterationRef(format!("{}_{}_{}", unix_millis(), std::process::id(), seq))
    }

    /// The reference as it appears embedded in artifact filenames.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IterationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Milliseconds since the Unix epoch.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_references_are_unique() {
        let refs: HashSet<String> = (0..1000)
            .map(|_| IterationRef::generate().as_str().to_string())
            .collect();
        assert_eq!(refs.len(), 1000);
    }

    #[test]
    fn test_reference_embeds_own_pid() {
        let reference = IterationRef::generate();
        let pid = std::process::id().to_string();
        assert!(reference.as_str().split('_').any(|part| part == pid));
    }

    #[test]
    fn test_pid_display() {
        assert_eq!(Pid(1234).to_string(), "PID:1234");
    }
}
