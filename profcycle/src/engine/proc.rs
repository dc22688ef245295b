//! `/proc`-backed profiling engine
//!
//! Profiles a target process without instrumenting it, by reading the
//! kernel's accounting files:
//!
//! - Heap snapshot: point-in-time memory fields from `/proc/<pid>/status`
//!   (`VmRSS`, `VmHWM`, `VmSize`, `VmData`, `RssAnon`, `RssFile`, `Threads`).
//! - CPU profile: a background task samples `utime`/`stime` from
//!   `/proc/<pid>/stat` on a fixed interval for the lifetime of the run.
//!
//! Both export as JSON documents.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::domain::{unix_millis, CaptureError, IterationRef, Pid};
use crate::engine::{ProfileHandle, ProfilingEngine, SnapshotHandle};

/// Default interval between CPU time samples.
const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// Memory state of a process at one point in time, from `/proc/<pid>/status`.
///
/// All sizes in kilobytes, as reported by the kernel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    pub taken_unix_ms: u64,
    pub pid: u32,
    pub vm_rss_kb: u64,
    pub vm_hwm_kb: u64,
    pub vm_size_kb: u64,
    pub vm_data_kb: u64,
    pub rss_anon_kb: u64,
    pub rss_file_kb: u64,
    pub threads: u64,
}

/// One CPU time sample. Tick counts are cumulative since process start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuSample {
    /// Offset from the start of the profiling run, in milliseconds.
    pub at_ms: u64,
    pub utime_ticks: u64,
    pub stime_ticks: u64,
}

/// Result of a completed CPU profiling run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuProfile {
    pub reference: String,
    pub pid: u32,
    pub started_unix_ms: u64,
    pub duration_ms: u64,
    pub clock_ticks_per_sec: u64,
    pub samples: Vec<CpuSample>,
}

/// A registered profiling run. The entry outlives its sampling task: it is
/// created by `start_profiling` and removed only by the release calls.
struct Run {
    stop: Arc<AtomicBool>,
    samples: Arc<Mutex<Vec<CpuSample>>>,
    task: Option<tokio::task::JoinHandle<()>>,
    started: Instant,
    started_unix_ms: u64,
}

/// Profiling engine reading `/proc/<pid>` accounting files.
pub struct ProcEngine {
    pid: Pid,
    sample_interval: Duration,
    runs: Arc<Mutex<HashMap<String, Run>>>,
}

impl ProcEngine {
    /// Engine for the given target process.
    pub fn new(pid: Pid) -> Self {
        Self::with_sample_interval(pid, DEFAULT_SAMPLE_INTERVAL)
    }

    /// Engine with a non-default CPU sampling interval.
    pub fn with_sample_interval(pid: Pid, sample_interval: Duration) -> Self {
        Self { pid, sample_interval, runs: Arc::new(Mutex::new(HashMap::new())) }
    }

    fn runs(&self) -> MutexGuard<'_, HashMap<String, Run>> {
        self.runs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ProfilingEngine for ProcEngine {
    type Snapshot = ProcSnapshot;
    type Profile = ProcProfile;

    fn take_heap_snapshot(&self) -> Result<ProcSnapshot, CaptureError> {
        let status = fs::read_to_string(format!("/proc/{}/status", self.pid.0))
            .map_err(|e| CaptureError::SnapshotFailed(format!("{}: {e}", self.pid)))?;
        Ok(ProcSnapshot { snapshot: parse_status(&status, self.pid) })
    }

    fn start_profiling(&self, reference: &IterationRef, record_samples: bool) {
        let stop = Arc::new(AtomicBool::new(false));
        let samples = Arc::new(Mutex::new(Vec::new()));
        let started = Instant::now();

        let task = tokio::spawn(sample_loop(
            self.pid,
            self.sample_interval,
            record_samples,
            started,
            Arc::clone(&stop),
            Arc::clone(&samples),
        ));

        let run = Run {
            stop,
            samples,
            task: Some(task),
            started,
            started_unix_ms: unix_millis(),
        };
        if self.runs().insert(reference.as_str().to_string(), run).is_some() {
            warn!("profiling run {reference} was already registered, replacing it");
        }
    }

    async fn stop_profiling(&self, reference: &IterationRef) -> Result<ProcProfile, CaptureError> {
        let task = {
            let mut runs = self.runs();
            let run = runs
                .get_mut(reference.as_str())
                .ok_or_else(|| CaptureError::UnknownReference(reference.to_string()))?;
            run.stop.store(true, Ordering::Release);
            run.task.take()
        };

        // Wait for the sampler to observe the stop flag and take its final
        // sample before reading the series.
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!("CPU sampler task for {reference} did not shut down cleanly: {e}");
            }
        }

        let runs = self.runs();
        let run = runs
            .get(reference.as_str())
            .ok_or_else(|| CaptureError::UnknownReference(reference.to_string()))?;
        let samples = run.samples.lock().unwrap_or_else(PoisonError::into_inner).clone();
        let duration_ms = u64::try_from(run.started.elapsed().as_millis()).unwrap_or(u64::MAX);

        Ok(ProcProfile {
            profile: CpuProfile {
                reference: reference.as_str().to_string(),
                pid: self.pid.0,
                started_unix_ms: run.started_unix_ms,
                duration_ms,
                clock_ticks_per_sec: clock_ticks_per_sec(),
                samples,
            },
        })
    }

    fn release_profile(&self, profile: ProcProfile) {
        self.runs().remove(&profile.profile.reference);
    }

    fn release_all_profiles(&self) {
        let mut runs = self.runs();
        for run in runs.values() {
            run.stop.store(true, Ordering::Release);
        }
        runs.clear();
    }

    fn retained_profiles(&self) -> usize {
        self.runs().len()
    }
}

/// Heap snapshot handle for [`ProcEngine`].
pub struct ProcSnapshot {
    snapshot: MemorySnapshot,
}

impl SnapshotHandle for ProcSnapshot {
    async fn export(&self) -> Result<Vec<u8>, CaptureError> {
        serde_json::to_vec_pretty(&self.snapshot).map_err(|e| CaptureError::ExportFailed {
            kind: "heap snapshot".to_string(),
            error: e.to_string(),
        })
    }

    fn release(self) {}
}

/// CPU profile handle for [`ProcEngine`].
pub struct ProcProfile {
    profile: CpuProfile,
}

impl ProcProfile {
    pub fn profile(&self) -> &CpuProfile {
        &self.profile
    }
}

impl ProfileHandle for ProcProfile {
    async fn export(&self) -> Result<Vec<u8>, CaptureError> {
        serde_json::to_vec_pretty(&self.profile).map_err(|e| CaptureError::ExportFailed {
            kind: "CPU profile".to_string(),
            error: e.to_string(),
        })
    }
}

/// Background sampling loop for one profiling run.
///
/// Takes a sample immediately, then on every interval tick, then one final
/// sample when the stop flag is raised. With `record_samples` false only the
/// first and latest samples are kept.
async fn sample_loop(
    pid: Pid,
    interval: Duration,
    record_samples: bool,
    started: Instant,
    stop: Arc<AtomicBool>,
    samples: Arc<Mutex<Vec<CpuSample>>>,
) {
    loop {
        match read_cpu_times(pid) {
            Ok((utime_ticks, stime_ticks)) => {
                let at_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                let sample = CpuSample { at_ms, utime_ticks, stime_ticks };
                let mut series = samples.lock().unwrap_or_else(PoisonError::into_inner);
                if record_samples || series.len() < 2 {
                    series.push(sample);
                } else if let Some(last) = series.last_mut() {
                    *last = sample;
                }
            }
            Err(e) => warn!("could not sample CPU times for {pid}: {e}"),
        }

        // The sample above doubles as the final one once the flag is raised.
        if stop.load(Ordering::Acquire) {
            break;
        }
        tokio::time::sleep(interval).await;
    }
}

/// Read cumulative (utime, stime) clock ticks from `/proc/<pid>/stat`.
///
/// The comm field may contain spaces, so fields are counted from the last
/// closing paren.
fn read_cpu_times(pid: Pid) -> io::Result<(u64, u64)> {
    let stat = fs::read_to_string(format!("/proc/{}/stat", pid.0))?;
    parse_stat_cpu_times(&stat)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "malformed /proc stat line"))
}

fn parse_stat_cpu_times(stat: &str) -> Option<(u64, u64)> {
    let (_, rest) = stat.rsplit_once(')')?;
    let mut fields = rest.split_whitespace();
    // utime and stime are stat fields 14 and 15; the first field after the
    // comm's closing paren is field 3.
    let utime = fields.nth(11)?.parse().ok()?;
    let stime = fields.next()?.parse().ok()?;
    Some((utime, stime))
}

fn parse_status(status: &str, pid: Pid) -> MemorySnapshot {
    MemorySnapshot {
        taken_unix_ms: unix_millis(),
        pid: pid.0,
        vm_rss_kb: status_field(status, "VmRSS"),
        vm_hwm_kb: status_field(status, "VmHWM"),
        vm_size_kb: status_field(status, "VmSize"),
        vm_data_kb: status_field(status, "VmData"),
        rss_anon_kb: status_field(status, "RssAnon"),
        rss_file_kb: status_field(status, "RssFile"),
        threads: status_field(status, "Threads"),
    }
}

/// Numeric value of one `Name:  <number> [kB]` line from
/// `/proc/<pid>/status`. Missing fields read as 0 (kernels differ in which
/// fields they expose).
fn status_field(status: &str, name: &str) -> u64 {
    status
        .lines()
        .find_map(|line| {
            let rest = line.strip_prefix(name)?.strip_prefix(':')?;
            rest.split_whitespace().next()?.parse().ok()
        })
        .unwrap_or(0)
}

// sysconf() requires unsafe
#[allow(unsafe_code)]
fn clock_ticks_per_sec() -> u64 {
    let ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    u64::try_from(ticks).unwrap_or(100)
}
