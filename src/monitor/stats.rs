use serde::{Deserialize, Serialize};

use crate::api::types::{coerce_number, coerce_text, MinerInfo, RawTransaction, UserData};
use crate::tracking::{Earnings, Snapshot};
use crate::util::format::format_utc_timestamp;
use crate::util::timestamp::TxTimestamp;

/// Transactions shown on the dashboard.
pub const RECENT_TRANSACTIONS: usize = 5;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub username: Option<String>,
    pub verified: bool,
    pub trust_score: Option<String>,
    pub balance: Option<f64>,
    /// Only set when the exchange rate is known and the value is positive.
    pub balance_usd: Option<f64>,
    pub miners_count: usize,
    pub transaction_count: usize,
    pub total_hashrate: f64,
}

impl AccountSummary {
    pub fn from_user(data: &UserData, balance: Option<f64>) -> Self {
        let balance_usd = match (balance, data.usd_rate()) {
            (Some(b), Some(rate)) => Some(b * rate).filter(|v| v.is_finite() && *v > 0.0),
            _ => None,
        };
        let info = data.balance.as_ref();
        Self {
            username: info.and_then(|b| b.username.clone()).filter(|u| !u.is_empty()),
            verified: info.is_some_and(|b| b.is_verified()),
            trust_score: info.and_then(|b| b.trust_score()),
            balance,
            balance_usd,
            miners_count: data.miners().len(),
            transaction_count: data.transaction_count(),
            total_hashrate: data.total_hashrate(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionLine {
    pub sender: String,
    pub amount: Option<f64>,
    pub memo: String,
    pub at_ms: Option<i64>,
    /// Exact UTC time, or the raw text when it could not be parsed.
    pub exact_time: String,
    pub hash: Option<String>,
}

fn exact_time(ts: &TxTimestamp) -> String {
    match (ts.to_epoch_ms().and_then(format_utc_timestamp), ts) {
        (Some(exact), _) => exact,
        (None, TxTimestamp::Unrecognized(raw)) => raw.clone(),
        (None, _) => String::new(),
    }
}

impl From<&RawTransaction> for TransactionLine {
    fn from(raw: &RawTransaction) -> Self {
        let tx = raw.normalize();
        Self {
            sender: tx.sender.unwrap_or_else(|| "unknown".to_string()),
            amount: tx.amount,
            memo: tx.memo.unwrap_or_else(|| "Transaction".to_string()),
            at_ms: tx.timestamp.to_epoch_ms(),
            exact_time: exact_time(&tx.timestamp),
            hash: raw.explorer_hash(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MinerLine {
    pub software: String,
    pub identifier: String,
    pub accepted: u64,
    pub rejected: u64,
    pub hashrate: f64,
    pub difficulty: String,
    pub ping_ms: Option<f64>,
    pub pool: String,
    pub algorithm: String,
}

fn or_dash(s: Option<String>) -> String {
    s.filter(|s| !s.is_empty()).unwrap_or_else(|| "-".to_string())
}

impl From<&MinerInfo> for MinerLine {
    fn from(m: &MinerInfo) -> Self {
        let count = |v: Option<&serde_json::Value>| coerce_number(v).unwrap_or(0.0).max(0.0) as u64;
        Self {
            software: m.software.clone().unwrap_or_default(),
            identifier: or_dash(m.identifier.clone().filter(|id| id != "None")),
            accepted: count(m.accepted.as_ref()),
            rejected: count(m.rejected.as_ref()),
            hashrate: m.hashrate_hs(),
            difficulty: or_dash(coerce_text(m.diff.as_ref())),
            ping_ms: m.pg.as_ref().and_then(|v| v.as_f64()),
            pool: or_dash(m.pool.clone()),
            algorithm: or_dash(m.algorithm.clone()),
        }
    }
}

/// Everything the dashboard renders, published after every poll.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub account: String,
    pub summary: Option<AccountSummary>,
    /// Balance shown by the refresh before this one.
    pub previous_balance: Option<f64>,
    pub mined_total: Option<f64>,
    pub daily_rate: Option<f64>,
    pub samples_in_window: usize,
    pub recent_transactions: Vec<TransactionLine>,
    pub miners: Vec<MinerLine>,
    pub last_update_ms: Option<u64>,
    /// Set when the last fetch failed; earlier data stays in place.
    pub error: Option<String>,
}

impl DashboardStats {
    pub fn new(account: &str) -> Self {
        Self {
            account: account.to_string(),
            ..Self::default()
        }
    }

    pub fn set_earnings(&mut self, earnings: Option<&Earnings>) {
        self.mined_total = earnings.map(|e| e.cumulative_mined);
        self.daily_rate = earnings.and_then(|e| e.estimated_daily_rate);
        self.samples_in_window = earnings.map_or(0, |e| e.samples.len());
    }

    pub fn set_account_data(&mut self, data: &UserData, snapshot: &Snapshot, now: u64) {
        self.previous_balance = self.summary.as_ref().and_then(|s| s.balance);
        self.summary = Some(AccountSummary::from_user(data, snapshot.balance.value()));
        self.recent_transactions = data
            .transactions
            .as_deref()
            .unwrap_or_default()
            .iter()
            .take(RECENT_TRANSACTIONS)
            .map(TransactionLine::from)
            .collect();
        self.miners = data.miners().iter().map(MinerLine::from).collect();
        self.last_update_ms = Some(now);
        self.error = None;
    }
}
