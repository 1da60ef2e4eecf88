//! Cross-process sentinel file locks and per-stage in-process mutexes.
//!
//! The sentinel file is the sole cross-process exclusion guarantee. The
//! named in-process mutex is a fast path that keeps threads of one process
//! from churning on the sentinel; it carries no cross-process meaning.

use crate::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, warn};

/// Default bounded wait for a stage lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(180);
/// Sentinels older than this are considered abandoned.
pub const DEFAULT_STALE_THRESHOLD: Duration = Duration::from_secs(30 * 60);

const POLL_INTERVAL: Duration = Duration::from_millis(25);
/// A reclaim guard older than this belongs to a dead reclaimer.
const RECLAIM_GUARD_TTL: Duration = Duration::from_secs(5);

/// Contents of a lock sentinel file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockSentinel {
    pub pid: u32,
    pub hostname: String,
    pub created_at_ms: u64,
    pub resource: String,
}

fn hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string())
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(target_os = "linux")]
fn is_pid_alive(pid: u32) -> bool {
    Path::new(&format!("/proc/{pid}")).exists()
}

#[cfg(not(target_os = "linux"))]
fn is_pid_alive(_pid: u32) -> bool {
    // Cannot verify; age-based staleness still applies.
    true
}

impl LockSentinel {
    fn current(resource: &str) -> Self {
        Self {
            pid: std::process::id(),
            hostname: hostname(),
            created_at_ms: now_ms(),
            resource: resource.to_string(),
        }
    }

    fn is_stale(&self, threshold: Duration) -> bool {
        let age = Duration::from_millis(now_ms().saturating_sub(self.created_at_ms));
        if age > threshold {
            return true;
        }
        // Same-host dead holders are recoverable immediately.
        self.hostname == hostname() && !is_pid_alive(self.pid)
    }
}

/// RAII advisory file lock; released (sentinel removed) on drop.
#[derive(Debug)]
pub struct FileLock {
    path: PathBuf,
}

impl FileLock {
    /// Acquire with the default timeout and stale threshold.
    pub fn acquire(path: &Path, resource: &str) -> StoreResult<Self> {
        Self::acquire_with(path, resource, DEFAULT_LOCK_TIMEOUT, DEFAULT_STALE_THRESHOLD)
    }

    /// Bounded acquire: poll `create_new` until the sentinel can be created,
    /// recovering stale sentinels along the way; `LockTimeout` on expiry.
    pub fn acquire_with(
        path: &Path,
        resource: &str,
        timeout: Duration,
        stale_threshold: Duration,
    ) -> StoreResult<Self> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let started = Instant::now();

        loop {
            match OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(mut file) => {
                    let sentinel = LockSentinel::current(resource);
                    let json = serde_json::to_string_pretty(&sentinel).map_err(|e| {
                        StoreError::ArtifactCorrupt {
                            path: path.to_path_buf(),
                            detail: e.to_string(),
                        }
                    })?;
                    file.write_all(json.as_bytes())?;
                    debug!(resource, pid = sentinel.pid, "file lock acquired");
                    return Ok(Self {
                        path: path.to_path_buf(),
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    if let Ok(observed) = std::fs::read_to_string(path) {
                        if let Ok(existing) = serde_json::from_str::<LockSentinel>(&observed) {
                            if existing.is_stale(stale_threshold) {
                                reclaim_stale(path, resource, existing.pid, &observed);
                                continue;
                            }
                        }
                    }
                }
                Err(e) => return Err(StoreError::Io(e)),
            }

            if started.elapsed() >= timeout {
                return Err(StoreError::LockTimeout {
                    resource: resource.to_string(),
                    waited_ms: started.elapsed().as_millis() as u64,
                });
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

/// Remove a sentinel previously judged stale.
///
/// Recovery is serialized through a `.reclaim` guard file so two contenders
/// cannot both judge-then-delete, and the sentinel is re-read under the
/// guard: it is removed only while still byte-identical to the content that
/// was judged stale. A fresh sentinel written by a new holder in between is
/// therefore never deleted. While the guard is held, nothing else can
/// create the sentinel (it still exists) or delete it (deletion requires
/// the guard).
fn reclaim_stale(path: &Path, resource: &str, holder_pid: u32, observed: &str) {
    let guard = path.with_extension("reclaim");
    match OpenOptions::new().write(true).create_new(true).open(&guard) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            // A reclaimer that died leaves its guard behind; clear it once
            // it has aged out, then let the next poll retry.
            let aged = std::fs::metadata(&guard)
                .and_then(|m| m.modified())
                .ok()
                .and_then(|m| m.elapsed().ok())
                .map_or(false, |age| age > RECLAIM_GUARD_TTL);
            if aged {
                let _ = std::fs::remove_file(&guard);
            }
            return;
        }
        Err(_) => return,
    }

    match std::fs::read_to_string(path) {
        Ok(current) if current == observed => {
            warn!(resource, holder_pid, "recovering stale lock sentinel");
            let _ = std::fs::remove_file(path);
        }
        // The slot was re-acquired since the staleness check; leave it.
        _ => {}
    }
    let _ = std::fs::remove_file(&guard);
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "failed to release file lock");
            }
        }
    }
}

/// Composes the cross-process file lock with a named in-process mutex,
/// held only within the file lock's scope.
pub struct LockManager {
    locks_dir: PathBuf,
    timeout: Duration,
    mutexes: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LockManager {
    pub fn new(locks_dir: impl Into<PathBuf>) -> Self {
        Self::with_timeout(locks_dir, DEFAULT_LOCK_TIMEOUT)
    }

    pub fn with_timeout(locks_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            locks_dir: locks_dir.into(),
            timeout,
            mutexes: Mutex::new(HashMap::new()),
        }
    }

    fn mutex_for(&self, resource: &str) -> Arc<Mutex<()>> {
        let mut map = self
            .mutexes
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        map.entry(resource.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Run `work` holding both locks for `resource`. At most one in-flight
    /// execution per resource on this machine.
    pub fn with_resource<T>(&self, resource: &str, work: impl FnOnce() -> T) -> StoreResult<T> {
        let lock_path = self.locks_dir.join(format!("{resource}.lock"));
        let _file_lock =
            FileLock::acquire_with(&lock_path, resource, self.timeout, DEFAULT_STALE_THRESHOLD)?;
        let mutex = self.mutex_for(resource);
        let _guard = mutex.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(work())
    }
}
