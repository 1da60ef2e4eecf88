//! Four-stage pipeline state machine.
//!
//! Register -> Baseline -> Configure -> Run. State is keyed per `run_id`,
//! so concurrent analyses cannot corrupt each other's signals. Every
//! transition holds a stage-and-run-scoped file lock plus an in-process
//! mutex; registration arms an expiry deadline that force-resets abandoned
//! runs.

use crate::error::{AppError, AppResult};
use ef_store::LockManager;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

/// Default abandoned-run expiry.
pub const DEFAULT_RUN_EXPIRY: Duration = Duration::from_secs(30 * 60);

/// Gated pipeline stages. Registration is the entry transition and is not
/// gated by a prior signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Baseline,
    Configure,
    Run,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Baseline => write!(f, "baseline"),
            Self::Configure => write!(f, "configure"),
            Self::Run => write!(f, "run"),
        }
    }
}

#[derive(Debug, Clone)]
struct PipelineState {
    active: bool,
    payload_registered: bool,
    baseline_completed: bool,
    configured: bool,
    runs_completed: bool,
    created: Instant,
}

impl PipelineState {
    fn fresh() -> Self {
        Self {
            active: true,
            payload_registered: false,
            baseline_completed: false,
            configured: false,
            runs_completed: false,
            created: Instant::now(),
        }
    }
}

/// Read-only view of a run's signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStateView {
    pub active: bool,
    pub payload_registered: bool,
    pub baseline_completed: bool,
    pub configured: bool,
    pub runs_completed: bool,
}

pub struct PipelineCoordinator {
    locks: LockManager,
    expiry: Duration,
    states: Mutex<HashMap<String, PipelineState>>,
}

impl PipelineCoordinator {
    pub fn new(locks_dir: &Path) -> Self {
        Self::with_settings(locks_dir, ef_store::lock::DEFAULT_LOCK_TIMEOUT, DEFAULT_RUN_EXPIRY)
    }

    pub fn with_settings(locks_dir: &Path, lock_timeout: Duration, expiry: Duration) -> Self {
        Self {
            locks: LockManager::with_timeout(locks_dir, lock_timeout),
            expiry,
            states: Mutex::new(HashMap::new()),
        }
    }

    fn states(&self) -> std::sync::MutexGuard<'_, HashMap<String, PipelineState>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop every run whose expiry deadline has passed.
    pub fn reap_expired(&self) {
        let mut states = self.states();
        let expiry = self.expiry;
        states.retain(|run_id, state| {
            let alive = state.created.elapsed() <= expiry;
            if !alive {
                warn!(run_id, "pipeline run expired, resetting all signals");
            }
            alive
        });
    }

    /// Register a payload: fresh `run_id`, all signals cleared, expiry armed.
    /// `work` persists the payload; the registration signal is only set if it
    /// succeeds.
    pub fn register<T>(&self, work: impl FnOnce(&str) -> AppResult<T>) -> AppResult<(String, T)> {
        self.reap_expired();
        let run_id = Uuid::new_v4().to_string();
        self.states().insert(run_id.clone(), PipelineState::fresh());

        let resource = format!("{run_id}.register");
        let outcome = match self.locks.with_resource(&resource, || work(&run_id)) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.states().remove(&run_id);
                return Err(e.into());
            }
        };
        match outcome {
            Ok(value) => {
                if let Some(state) = self.states().get_mut(&run_id) {
                    state.payload_registered = true;
                }
                info!(run_id, "payload registered");
                Ok((run_id, value))
            }
            Err(e) => {
                self.states().remove(&run_id);
                Err(e)
            }
        }
    }

    /// Run one gated stage transition: prerequisite check, work, signal set.
    /// The stage signal is only set if `work` completes without error.
    pub fn advance<T>(
        &self,
        run_id: &str,
        stage: Stage,
        work: impl FnOnce() -> AppResult<T>,
    ) -> AppResult<T> {
        self.check_alive(run_id)?;

        let resource = format!("{run_id}.{stage}");
        let outcome = self.locks.with_resource(&resource, || {
            {
                let states = self.states();
                let state = states.get(run_id).ok_or_else(|| AppError::RunNotFound {
                    run_id: run_id.to_string(),
                })?;
                let prerequisite = match stage {
                    Stage::Baseline => state.payload_registered,
                    Stage::Configure => state.baseline_completed,
                    Stage::Run => state.configured,
                };
                if !prerequisite {
                    return Err(AppError::PrerequisiteNotMet {
                        run_id: run_id.to_string(),
                        stage,
                    });
                }
            }

            let value = work()?;

            let mut states = self.states();
            if let Some(state) = states.get_mut(run_id) {
                match stage {
                    Stage::Baseline => state.baseline_completed = true,
                    Stage::Configure => state.configured = true,
                    Stage::Run => {
                        state.runs_completed = true;
                        state.active = false;
                    }
                }
            }
            // The last stage completes the run; its state is discarded.
            if stage == Stage::Run {
                states.remove(run_id);
                info!(run_id, "pipeline run completed");
            }
            Ok(value)
        })?;
        outcome
    }

    fn check_alive(&self, run_id: &str) -> AppResult<()> {
        let mut states = self.states();
        let state = states.get(run_id).ok_or_else(|| AppError::RunNotFound {
            run_id: run_id.to_string(),
        })?;
        if state.created.elapsed() > self.expiry {
            states.remove(run_id);
            warn!(run_id, "pipeline run expired, resetting all signals");
            return Err(AppError::RunExpired {
                run_id: run_id.to_string(),
            });
        }
        Ok(())
    }

    pub fn state(&self, run_id: &str) -> Option<PipelineStateView> {
        self.states().get(run_id).map(|s| PipelineStateView {
            active: s.active,
            payload_registered: s.payload_registered,
            baseline_completed: s.baseline_completed,
            configured: s.configured,
            runs_completed: s.runs_completed,
        })
    }
}
