//! Debounced background saving of the open draft.
//!
//! One [`AutoSaver`] per store and identity provider. [`AutoSaver::attach`]
//! opens a session for a draft and returns its [`AutoSaveHandle`]; attaching
//! another draft detaches the previous one. Each session owns its last
//! persisted snapshot, record id, and version.
//!
//! Per session:
//! - edits go through the change detector, then the debounce window
//! - at most one save in flight; edits made meanwhile cause exactly one
//!   follow-up save with the draft as it is when the first one finishes
//! - conflicts go through the saver's [`ConflictPolicy`] ([`SilentPolicy`]
//!   unless [`AutoSaver::with_policy`] says otherwise), transport errors
//!   through the shared retry settings
//! - a draft that fails validation is never sent
//! - a result that arrives after its session was detached is dropped

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tally_config::{ConflictConfig, TallyConfig};
use tally_core::draft::{DraftSnapshot, has_changed};
use tally_core::entities::Decision;
use tally_core::enums::SavePhase;
use tally_core::errors::ValidationError;
use tally_core::identity::IdentityProvider;
use tally_db::conflict::{SaveError, SaveErrorKind};
use tally_db::retry::RetryConfig;
use tally_db::store::DecisionStore;
use tally_db::upsert::ExistingRecord;
use tokio::sync::watch;

use crate::debounce::Debouncer;
use crate::draft_cell::DraftCell;
use crate::persist::{Persisted, persist_with_policy};
use crate::policy::{ConflictPolicy, SilentPolicy};

/// Tuning for an [`AutoSaver`].
#[derive(Debug, Clone)]
pub struct AutoSaveSettings {
    pub enabled: bool,
    pub debounce: Duration,
    pub retry: RetryConfig,
    /// Limits for the default [`SilentPolicy`].
    pub conflicts: ConflictConfig,
}

impl From<&TallyConfig> for AutoSaveSettings {
    fn from(config: &TallyConfig) -> Self {
        Self {
            enabled: config.autosave.enabled,
            debounce: config.autosave.debounce(),
            retry: RetryConfig::from(&config.retry),
            conflicts: config.conflicts.clone(),
        }
    }
}

impl Default for AutoSaveSettings {
    fn default() -> Self {
        Self::from(&TallyConfig::default())
    }
}

/// Why the last save failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveFailure {
    pub kind: SaveErrorKind,
    pub message: String,
}

impl From<&SaveError> for SaveFailure {
    fn from(error: &SaveError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// What the editing surface renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AutoSaveStatus {
    pub phase: SavePhase,
    pub last_error: Option<SaveFailure>,
    /// Bound on the first successful create.
    pub decision_id: Option<String>,
    pub version: Option<i64>,
    pub last_saved_at: Option<DateTime<Utc>>,
}

impl AutoSaveStatus {
    #[must_use]
    pub const fn is_saving(&self) -> bool {
        self.phase.is_saving()
    }
}

/// Result of [`AutoSaveHandle::notify_changed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// Debounce window (re)started.
    Scheduled,
    /// A save is in flight; one follow-up save will run after it.
    Queued,
    /// Draft equals the last persisted snapshot.
    Unchanged,
    SkippedEmptyTitle,
    /// No authenticated user. Not a failure; the draft is kept.
    SkippedUnauthenticated,
    /// Out of bounds. Nothing is sent to the store.
    Invalid(ValidationError),
    Disabled,
    /// The handle's session was replaced by a later attach.
    Detached,
}

struct Shared<S, P> {
    store: Arc<S>,
    identity: Arc<dyn IdentityProvider>,
    settings: AutoSaveSettings,
    policy: P,
    next_key: AtomicU64,
    /// Key of the attached session, `0` when none.
    active_key: AtomicU64,
    current: Mutex<Option<Weak<Session<S, P>>>>,
}

/// Owns auto-save sessions for one store, identity provider, and conflict
/// policy.
pub struct AutoSaver<S, P = SilentPolicy> {
    shared: Arc<Shared<S, P>>,
}

impl<S: DecisionStore + 'static> AutoSaver<S> {
    /// Saver resolving conflicts silently, within `settings.conflicts`.
    pub fn new(
        store: Arc<S>,
        identity: Arc<dyn IdentityProvider>,
        settings: AutoSaveSettings,
    ) -> Self {
        let policy = SilentPolicy::from(&settings.conflicts);
        Self::with_policy(store, identity, settings, policy)
    }
}

impl<S, P> AutoSaver<S, P>
where
    S: DecisionStore + 'static,
    P: ConflictPolicy + 'static,
{
    pub fn with_policy(
        store: Arc<S>,
        identity: Arc<dyn IdentityProvider>,
        settings: AutoSaveSettings,
        policy: P,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                store,
                identity,
                settings,
                policy,
                next_key: AtomicU64::new(0),
                active_key: AtomicU64::new(0),
                current: Mutex::new(None),
            }),
        }
    }

    /// Start watching `draft`. Pass the stored decision when the draft edits
    /// one; `None` means the first save creates it.
    ///
    /// Cancels the previous session's pending save. A save of the previous
    /// draft that is already running finishes, but its result is dropped.
    #[must_use]
    pub fn attach(&self, draft: DraftCell, persisted: Option<Decision>) -> AutoSaveHandle<S, P> {
        let shared = &self.shared;
        let key = shared.next_key.fetch_add(1, Ordering::SeqCst) + 1;

        let status = AutoSaveStatus {
            decision_id: persisted.as_ref().map(|d| d.id.clone()),
            version: persisted.as_ref().map(|d| d.version),
            last_saved_at: persisted.as_ref().map(|d| d.updated_at),
            ..AutoSaveStatus::default()
        };
        let state = SessionState {
            last_persisted: persisted.as_ref().map(Decision::snapshot),
            record: persisted.as_ref().map(ExistingRecord::from),
            saving: false,
            rerun: false,
        };

        let session = Arc::new_cyclic(|weak: &Weak<Session<S, P>>| {
            let weak = weak.clone();
            Session {
                key,
                shared: Arc::clone(shared),
                draft,
                state: Mutex::new(state),
                status: watch::channel(status).0,
                debouncer: Debouncer::new(shared.settings.debounce, move |()| {
                    if let Some(session) = weak.upgrade() {
                        session.start_save();
                    }
                }),
            }
        });

        let previous = {
            let mut current = shared.current.lock().unwrap_or_else(PoisonError::into_inner);
            shared.active_key.store(key, Ordering::SeqCst);
            current.replace(Arc::downgrade(&session))
        };
        if let Some(previous) = previous.and_then(|w| w.upgrade()) {
            tracing::debug!(previous = previous.key, key, "switching auto-save to another draft");
            previous.debouncer.cancel();
            previous.settle_if_idle();
        }

        AutoSaveHandle { session }
    }
}

struct SessionState {
    last_persisted: Option<DraftSnapshot>,
    record: Option<ExistingRecord>,
    saving: bool,
    /// Draft changed while `saving`.
    rerun: bool,
}

struct Session<S, P> {
    key: u64,
    shared: Arc<Shared<S, P>>,
    draft: DraftCell,
    state: Mutex<SessionState>,
    status: watch::Sender<AutoSaveStatus>,
    debouncer: Debouncer<()>,
}

impl<S, P> Session<S, P>
where
    S: DecisionStore + 'static,
    P: ConflictPolicy + 'static,
{
    fn is_active(&self) -> bool {
        self.shared.active_key.load(Ordering::SeqCst) == self.key
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, phase: SavePhase) {
        self.status.send_if_modified(|s| {
            if s.phase == phase {
                false
            } else {
                s.phase = phase;
                true
            }
        });
    }

    fn settle_if_idle(&self) {
        let state = self.lock_state();
        if !state.saving {
            self.set_phase(SavePhase::Idle);
        }
    }

    fn skip(&self, outcome: ChangeOutcome) -> ChangeOutcome {
        self.debouncer.cancel();
        self.settle_if_idle();
        outcome
    }

    fn notify_changed(&self) -> ChangeOutcome {
        if !self.is_active() {
            return ChangeOutcome::Detached;
        }
        if !self.shared.settings.enabled {
            return ChangeOutcome::Disabled;
        }
        let snapshot = self.draft.snapshot();
        if !snapshot.has_title() {
            return self.skip(ChangeOutcome::SkippedEmptyTitle);
        }
        if self.shared.identity.current_user().is_none() {
            return self.skip(ChangeOutcome::SkippedUnauthenticated);
        }
        if let Err(e) = snapshot.validate() {
            return self.skip(ChangeOutcome::Invalid(e));
        }

        let mut state = self.lock_state();
        if state.saving {
            state.rerun = true;
            return ChangeOutcome::Queued;
        }
        if !has_changed(state.last_persisted.as_ref(), &snapshot) {
            self.debouncer.cancel();
            self.set_phase(SavePhase::Idle);
            return ChangeOutcome::Unchanged;
        }
        self.debouncer.trigger(());
        self.set_phase(SavePhase::PendingChange);
        tracing::debug!(key = self.key, delay = ?self.debouncer.delay(), "auto-save scheduled");
        ChangeOutcome::Scheduled
    }

    /// Debounce fired.
    fn start_save(self: Arc<Self>) {
        {
            let mut state = self.lock_state();
            if state.saving {
                state.rerun = true;
                return;
            }
            state.saving = true;
            self.set_phase(SavePhase::Saving);
        }
        tokio::spawn(async move { self.run().await });
    }

    async fn run(&self) {
        loop {
            self.save_once().await;

            let again = {
                let mut state = self.lock_state();
                let again = std::mem::take(&mut state.rerun) && self.is_active() && {
                    let snapshot = self.draft.snapshot();
                    snapshot.validate().is_ok()
                        && has_changed(state.last_persisted.as_ref(), &snapshot)
                };
                if again {
                    self.set_phase(SavePhase::Saving);
                } else {
                    state.saving = false;
                    self.set_phase(SavePhase::Idle);
                }
                again
            };
            if !again {
                break;
            }
            tracing::debug!(key = self.key, "draft changed during save, saving again");
        }
    }

    async fn save_once(&self) {
        let snapshot = self.draft.snapshot();
        if !snapshot.has_title() {
            return;
        }
        if let Err(e) = snapshot.validate() {
            tracing::debug!(key = self.key, error = %e, "draft is invalid, skipping save");
            return;
        }
        let Some(user) = self.shared.identity.current_user() else {
            tracing::debug!(key = self.key, "no authenticated user, skipping save");
            return;
        };
        let (last_persisted, record) = {
            let state = self.lock_state();
            (state.last_persisted.clone(), state.record.clone())
        };
        if !has_changed(last_persisted.as_ref(), &snapshot) {
            return;
        }

        let draft = self.draft.clone();
        let result = persist_with_policy(
            self.shared.store.as_ref(),
            &self.shared.policy,
            &self.shared.settings.retry,
            &user,
            record,
            move || draft.snapshot(),
            |phase| self.set_phase(phase),
        )
        .await;

        if !self.is_active() {
            tracing::debug!(key = self.key, "dropping save result of a detached draft");
            return;
        }
        match result {
            Ok(persisted) => self.apply_success(&persisted),
            Err(e) => {
                tracing::warn!(key = self.key, kind = %e.kind(), error = %e, "auto-save failed");
                let failure = SaveFailure::from(&e);
                self.status.send_modify(|s| s.last_error = Some(failure));
            }
        }
    }

    fn apply_success(&self, persisted: &Persisted) {
        let decision = &persisted.upserted.decision;
        {
            let mut state = self.lock_state();
            state.last_persisted = Some(decision.snapshot());
            state.record = Some(ExistingRecord::from(decision));
        }
        if persisted.was_renamed()
            && self
                .draft
                .replace_title_if(&persisted.drafted_title, &decision.title)
        {
            tracing::info!(from = %persisted.drafted_title, to = %decision.title, "title taken, draft renamed");
        }
        self.status.send_modify(|s| {
            s.decision_id = Some(decision.id.clone());
            s.version = Some(decision.version);
            s.last_saved_at = Some(decision.updated_at);
            s.last_error = None;
        });
    }

    fn detach(&self) {
        self.debouncer.cancel();
        let _ = self.shared.active_key.compare_exchange(
            self.key,
            0,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
        self.settle_if_idle();
    }
}

/// Handle to one attached draft. Dropping it detaches.
pub struct AutoSaveHandle<S, P = SilentPolicy>
where
    S: DecisionStore + 'static,
    P: ConflictPolicy + 'static,
{
    session: Arc<Session<S, P>>,
}

impl<S, P> AutoSaveHandle<S, P>
where
    S: DecisionStore + 'static,
    P: ConflictPolicy + 'static,
{
    /// Call after every edit of the draft.
    pub fn notify_changed(&self) -> ChangeOutcome {
        self.session.notify_changed()
    }

    #[must_use]
    pub fn status(&self) -> AutoSaveStatus {
        self.session.status.borrow().clone()
    }

    /// Receiver for status changes. Dropping it unsubscribes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AutoSaveStatus> {
        self.session.status.subscribe()
    }

    /// Resolve once nothing is pending or in flight.
    pub async fn wait_idle(&self) -> AutoSaveStatus {
        let mut rx = self.subscribe();
        let idle = rx
            .wait_for(|s| s.phase == SavePhase::Idle)
            .await
            .map(|s| s.clone());
        idle.unwrap_or_else(|_| self.status())
    }

    #[must_use]
    pub fn draft(&self) -> &DraftCell {
        &self.session.draft
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.session.is_active()
    }

    /// Cancel any pending save and stop applying results.
    pub fn detach(self) {
        drop(self);
    }
}

impl<S, P> Drop for AutoSaveHandle<S, P>
where
    S: DecisionStore + 'static,
    P: ConflictPolicy + 'static,
{
    fn drop(&mut self) {
        self.session.detach();
    }
}
