//! Folding polled snapshots into the mined-earnings state.
//!
//! The server only reports a total balance and a short list of recent
//! transactions. Whatever part of a balance change is not explained by a newly
//! seen incoming transfer is attributed to mining. Transfers that fall outside
//! the returned list are therefore counted as mined; that approximation is
//! inherent to the data available.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::dedup::KnownTransactions;
use super::rate;
use super::snapshot::{Balance, Snapshot};
use super::window::{self, Sample};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReconcileError {
    #[error("snapshot carries no balance")]
    MissingBalance,

    #[error("balance is not a number, nothing to start tracking from")]
    UnparseableBalance,
}

/// Per-account tracking state, persisted between sessions.
///
/// Field names on disk are kept short and flat:
/// `{"minedTotal", "lastBalance", "knownTxIds", "points"}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingState {
    /// Mined since tracking started. Never decreases.
    #[serde(rename = "minedTotal", default)]
    pub cumulative_mined: f64,
    #[serde(rename = "lastBalance", default)]
    pub last_observed_balance: f64,
    #[serde(rename = "knownTxIds", default)]
    pub known_transactions: KnownTransactions,
    /// Trailing 24h of `(timestamp, cumulative_mined)`, oldest first.
    #[serde(rename = "points", default)]
    pub samples: Vec<Sample>,
}

/// What a reconciliation did, for logging.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// First observation: tracking starts at zero.
    Seeded { known_transactions: usize },
    Applied {
        new_transactions: usize,
        incoming_transfers: f64,
        mined_delta: f64,
    },
}

impl TrackingState {
    /// State for the first observation of an account. Every visible
    /// transaction counts as already known; nothing is computed retroactively.
    pub fn seed(snapshot: &Snapshot, now: u64) -> Result<Self, ReconcileError> {
        let balance = match snapshot.balance {
            Balance::Missing => return Err(ReconcileError::MissingBalance),
            Balance::Unparseable => return Err(ReconcileError::UnparseableBalance),
            Balance::Known(v) => v,
        };

        Ok(Self {
            cumulative_mined: 0.0,
            last_observed_balance: balance,
            known_transactions: snapshot
                .transactions
                .iter()
                .filter_map(|tx| tx.id.clone())
                .collect(),
            samples: vec![Sample::new(now, 0.0)],
        })
    }

    /// Fold one snapshot into existing state.
    ///
    /// A missing balance leaves the state untouched. An unparseable balance
    /// records a zero delta and leaves the transaction ids unseen so their
    /// amounts still offset the balance change once it parses again.
    pub fn apply(
        &mut self,
        account: &str,
        snapshot: &Snapshot,
        now: u64,
    ) -> Result<Outcome, ReconcileError> {
        let balance = match snapshot.balance {
            Balance::Missing => return Err(ReconcileError::MissingBalance),
            Balance::Unparseable => None,
            Balance::Known(v) => Some(v),
        };

        let mut new_transactions = 0;
        let mut incoming_transfers = 0.0;
        let mut mined_delta = 0.0;

        if let Some(balance) = balance {
            for tx in &snapshot.transactions {
                // no id, no way to tell it apart from last poll's copy
                let Some(id) = tx.id.as_deref() else { continue };
                if !self.known_transactions.is_new(id) {
                    continue;
                }
                self.known_transactions.mark_known(id);
                new_transactions += 1;

                if tx.is_incoming_to(account) {
                    incoming_transfers += tx.amount.unwrap_or(0.0);
                }
            }

            let raw_delta = balance - self.last_observed_balance;
            mined_delta = clamp_mined(raw_delta - incoming_transfers);
            self.last_observed_balance = balance;
        }

        self.cumulative_mined += mined_delta;
        let samples = std::mem::take(&mut self.samples);
        self.samples = window::prune(
            window::append(samples, Sample::new(now, self.cumulative_mined)),
            now,
        );

        Ok(Outcome::Applied {
            new_transactions,
            incoming_transfers,
            mined_delta,
        })
    }

    /// Daily rate over the samples still in the window at `now`.
    pub fn estimated_daily_rate(&self, now: u64) -> Option<f64> {
        let cutoff = window::cutoff(now);
        let start = self.samples.partition_point(|s| s.timestamp < cutoff);
        rate::estimate(&self.samples[start..])
    }
}

/// Spending lowers the balance; that is never negative mining.
fn clamp_mined(delta: f64) -> f64 {
    if delta.is_finite() && delta > 0.0 {
        delta
    } else {
        0.0
    }
}

/// Fold `snapshot` into `state`, creating it on the first observation.
///
/// On error `state` is left exactly as it was.
pub fn reconcile(
    state: &mut Option<TrackingState>,
    account: &str,
    snapshot: &Snapshot,
    now: u64,
) -> Result<Outcome, ReconcileError> {
    match state {
        Some(existing) => existing.apply(account, snapshot, now),
        None => {
            let seeded = TrackingState::seed(snapshot, now)?;
            let known_transactions = seeded.known_transactions.len();
            *state = Some(seeded);
            Ok(Outcome::Seeded { known_transactions })
        }
    }
}
