//! Throttled version and usage checks merged into persisted state

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::update::clock::Clock;
use crate::update::error::{SourceError, StateError};
use crate::update::policy::{Notifier, UpdateDecision, classify};
use crate::update::resolver::resolve;
use crate::update::scheme::format_version;
use crate::update::source::{ReleaseSource, UsageSource};
use crate::update::state::UpdateState;
use crate::update::store::StateStore;
use crate::update::throttle::allow;

/// Result of a single scheduled check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The throttle window has not elapsed; nothing was touched
    Throttled,
    /// Another invocation of the same check is still running
    InFlight,
    /// Fetch succeeded and the result was merged into state
    Updated,
    /// Remote list was empty; state left untouched
    NoRemoteVersion,
    /// Fetch failed; state left untouched apart from the attempt timestamp
    Failed(String),
}

impl CheckOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, CheckOutcome::Failed(_))
    }
}

/// Holds an in-flight flag for the lifetime of one check
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct UpdateScheduler {
    config: AppConfig,
    state: Mutex<UpdateState>,
    store: Arc<dyn StateStore>,
    source: Arc<dyn ReleaseSource>,
    usage: Arc<dyn UsageSource>,
    clock: Arc<dyn Clock>,
    notifier: Option<Arc<dyn Notifier>>,
    /// Set when the stored record must not be overwritten (newer schema)
    read_only: bool,
    version_in_flight: AtomicBool,
    usage_in_flight: AtomicBool,
}

impl UpdateScheduler {
    /// Load persisted state and build a scheduler around it.
    ///
    /// A failed load falls back to defaults held in memory.
    pub fn new(
        config: AppConfig,
        store: Arc<dyn StateStore>,
        source: Arc<dyn ReleaseSource>,
        usage: Arc<dyn UsageSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut read_only = false;
        let mut state = match store.load() {
            Ok(Some(state)) => state,
            Ok(None) => {
                info!("No persisted update state, starting with defaults");
                UpdateState::default()
            }
            Err(e @ StateError::UnsupportedSchema { .. }) => {
                error!("{}; keeping update state in memory only", e);
                read_only = true;
                UpdateState::default()
            }
            Err(e) => {
                error!("Failed to load update state, starting with defaults: {}", e);
                UpdateState::default()
            }
        };

        if state.version_type != config.version_type {
            info!(
                "Version type changed from {} to {}, discarding remote version",
                state.version_type.as_str(),
                config.version_type.as_str()
            );
            state.version_type = config.version_type;
            state.remote_version = None;
            state.last_update = 0;
        }

        Self {
            config,
            state: Mutex::new(state),
            store,
            source,
            usage,
            clock,
            notifier: None,
            read_only,
            version_in_flight: AtomicBool::new(false),
            usage_in_flight: AtomicBool::new(false),
        }
    }

    /// Attach a notifier that receives the decision after each successful version fetch
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Snapshot of the current state
    pub fn state(&self) -> UpdateState {
        self.lock_state().clone()
    }

    /// Apply the active scheme's comparison format
    pub fn format_version(&self, version: &str) -> String {
        format_version(self.config.version_type, version)
    }

    /// Classify the last-known state without any I/O
    pub fn decision(&self) -> UpdateDecision {
        let state = self.state();
        let current = self.format_version(&state.version);
        let remote = state
            .remote_version
            .as_deref()
            .map(|r| self.format_version(r));
        classify(&current, remote.as_deref())
    }

    /// Refresh the remote version if the version throttle window has elapsed.
    ///
    /// The local version is refreshed from configuration on every call.
    pub async fn check_version(&self, force: bool) -> CheckOutcome {
        self.refresh_local_version();

        let Some(_guard) = InFlightGuard::try_acquire(&self.version_in_flight) else {
            debug!("Version check already in flight");
            return CheckOutcome::InFlight;
        };

        let now = self.clock.now_ms();
        let last = self.lock_state().last_update;
        if !allow(now, last, self.config.version_check_interval, force) {
            debug!("Version check throttled (last attempt at {})", last);
            return CheckOutcome::Throttled;
        }

        // The attempt consumes the window whatever the fetch does
        self.update_state(|state| state.last_update = state.last_update.max(now));

        let version_type = self.config.version_type;
        match resolve(self.source.as_ref(), version_type).await {
            Ok(remote) => {
                info!("Got upstream {} version {}", version_type.as_str(), remote);
                self.update_state(|state| state.remote_version = Some(remote));
                self.notify();
                CheckOutcome::Updated
            }
            Err(SourceError::EmptyResult) => {
                warn!(
                    "Upstream returned no {} entries, remote version unchanged",
                    version_type.as_str()
                );
                CheckOutcome::NoRemoteVersion
            }
            Err(e) => {
                error!("Failed to fetch upstream version: {}", e);
                CheckOutcome::Failed(e.to_string())
            }
        }
    }

    /// Refresh usage metrics if the usage throttle window has elapsed
    pub async fn check_usage(&self, force: bool) -> CheckOutcome {
        let Some(_guard) = InFlightGuard::try_acquire(&self.usage_in_flight) else {
            debug!("Usage check already in flight");
            return CheckOutcome::InFlight;
        };

        let now = self.clock.now_ms();
        let last = self.lock_state().last_update_usage;
        if !allow(now, last, self.config.usage_check_interval, force) {
            debug!("Usage check throttled (last attempt at {})", last);
            return CheckOutcome::Throttled;
        }

        self.update_state(|state| state.last_update_usage = state.last_update_usage.max(now));

        let provider = self.usage.name();
        match self.usage.usage().await {
            Ok(usage) => {
                info!(
                    "Got {} usage: {} of {}",
                    provider, usage.used, usage.total
                );
                self.update_state(|state| {
                    state.used = usage.used;
                    state.subscription = usage.total;
                });
                CheckOutcome::Updated
            }
            Err(e) => {
                error!("Failed to fetch {} usage: {}", provider, e);
                CheckOutcome::Failed(e.to_string())
            }
        }
    }

    fn refresh_local_version(&self) {
        let local = self.config.local_version();
        let snapshot = {
            let mut state = self.lock_state();
            if state.version == local {
                None
            } else {
                debug!("Local version is now {}", local);
                state.version = local.to_string();
                Some(state.clone())
            }
        };
        if let Some(snapshot) = snapshot {
            self.persist(&snapshot);
        }
    }

    fn notify(&self) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        let current = self.format_version(&self.lock_state().version);
        notifier.notify(&current, &self.decision());
    }

    fn update_state(&self, apply: impl FnOnce(&mut UpdateState)) {
        let snapshot = {
            let mut state = self.lock_state();
            apply(&mut state);
            state.clone()
        };
        self.persist(&snapshot);
    }

    /// Write through to the store; failures keep the in-memory state authoritative
    fn persist(&self, snapshot: &UpdateState) {
        if self.read_only {
            return;
        }
        let _ = self.store.save(snapshot).inspect_err(|e| {
            error!(
                "Failed to persist update state, continuing in memory: {}",
                e
            )
        });
    }

    fn lock_state(&self) -> MutexGuard<'_, UpdateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
