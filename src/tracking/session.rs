use tracing::{debug, info};

use super::reconcile::{reconcile, Outcome, ReconcileError, TrackingState};
use super::snapshot::Snapshot;
use super::window::{self, Sample};
use crate::accounting::StateStore;

/// What the presentation side gets to see.
#[derive(Debug, Clone, PartialEq)]
pub struct Earnings {
    pub cumulative_mined: f64,
    pub samples: Vec<Sample>,
    pub estimated_daily_rate: Option<f64>,
}

/// Everything tied to one logged-in account.
///
/// Created when tracking starts for an account and consumed by [`Session::end`];
/// nothing about the account outlives it except what the store persisted.
pub struct Session<S: StateStore> {
    account: String,
    store: S,
    state: Option<TrackingState>,
}

impl<S: StateStore> Session<S> {
    pub fn start(account: impl Into<String>, store: S) -> Self {
        let account = account.into();
        let state = store.load(&account);
        match &state {
            Some(s) => info!(
                account = %account,
                mined = s.cumulative_mined,
                samples = s.samples.len(),
                "restored tracking state"
            ),
            None => info!(account = %account, "no tracking state yet, starting from zero"),
        }

        Self {
            account,
            store,
            state,
        }
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn state(&self) -> Option<&TrackingState> {
        self.state.as_ref()
    }

    /// Fold one snapshot in and persist the result.
    pub fn reconcile(&mut self, snapshot: &Snapshot, now: u64) -> Result<Outcome, ReconcileError> {
        let outcome = reconcile(&mut self.state, &self.account, snapshot, now)?;
        if let Some(state) = &self.state {
            self.store.save(&self.account, state);
        }
        debug!(account = %self.account, ?outcome, "reconciled snapshot");
        Ok(outcome)
    }

    /// Current totals, with the window cut at `now`.
    pub fn earnings(&self, now: u64) -> Option<Earnings> {
        let state = self.state.as_ref()?;
        let samples = window::prune(state.samples.clone(), now);
        Some(Earnings {
            cumulative_mined: state.cumulative_mined,
            estimated_daily_rate: super::rate::estimate(&samples),
            samples,
        })
    }

    /// Drop the session and its in-memory state.
    pub fn end(self) {
        info!(account = %self.account, "tracking session ended");
    }
}
