use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tracking::{Balance, Snapshot, Transaction};
use crate::util::timestamp::TxTimestamp;

// The user document is loosely typed: numbers show up as JSON numbers or as
// strings, ids as either. Everything that varies stays a `Value` here and is
// coerced once when building a `Snapshot`.

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UserEnvelope {
    #[serde(default)]
    pub result: Option<UserData>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct UserData {
    #[serde(default)]
    pub balance: Option<BalanceInfo>,
    #[serde(default)]
    pub miners: Option<Vec<MinerInfo>>,
    #[serde(default)]
    pub transactions: Option<Vec<RawTransaction>>,
    #[serde(default)]
    pub exch_rtes: Option<ExchangeRates>,
    #[serde(default)]
    pub prices: Option<Prices>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct BalanceInfo {
    #[serde(default)]
    pub balance: Option<Value>,
    #[serde(default)]
    pub username: Option<String>,
    /// `"yes"` once the account passed verification
    #[serde(default)]
    pub verified: Option<Value>,
    #[serde(default)]
    pub trust_score: Option<Value>,
    /// Older nodes spell it `trustScore`.
    #[serde(default, rename = "trustScore")]
    pub trust_score_legacy: Option<Value>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct MinerInfo {
    #[serde(default)]
    pub software: Option<String>,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub threadid: Option<Value>,
    #[serde(default)]
    pub accepted: Option<Value>,
    #[serde(default)]
    pub rejected: Option<Value>,
    #[serde(default)]
    pub hashrate: Option<Value>,
    #[serde(default)]
    pub diff: Option<Value>,
    /// Ping in ms
    #[serde(default)]
    pub pg: Option<Value>,
    #[serde(default)]
    pub pool: Option<String>,
    #[serde(default)]
    pub algorithm: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct RawTransaction {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub hash: Option<Value>,
    #[serde(default)]
    pub sender: Option<Value>,
    #[serde(default)]
    pub recipient: Option<Value>,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub memo: Option<Value>,
    #[serde(default)]
    pub datetime: Option<Value>,
    #[serde(default)]
    pub timestamp: Option<Value>,
    #[serde(default)]
    pub time: Option<Value>,
    #[serde(default)]
    pub date: Option<Value>,
    #[serde(default)]
    pub datetime_utc: Option<Value>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ExchangeRates {
    #[serde(default)]
    pub max: Option<ExchangeRate>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ExchangeRate {
    #[serde(default)]
    pub price: Option<Value>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Prices {
    #[serde(default)]
    pub max: Option<Value>,
}

/// Finite number from a JSON number or numeric string.
pub fn coerce_number(v: Option<&Value>) -> Option<f64> {
    let n = match v? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Non-empty text from a string or number.
pub fn coerce_text(v: Option<&Value>) -> Option<String> {
    let s = match v? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

impl RawTransaction {
    /// `id` wins over `hash`; an empty id means no usable identifier.
    pub fn identifier(&self) -> Option<String> {
        coerce_text(self.id.as_ref().or(self.hash.as_ref()))
    }

    /// First non-empty of `datetime`, `timestamp`, `time`, `date`, `datetime_utc`.
    pub fn timestamp(&self) -> TxTimestamp {
        let raw = [
            &self.datetime,
            &self.timestamp,
            &self.time,
            &self.date,
            &self.datetime_utc,
        ]
        .into_iter()
        .filter_map(Option::as_ref)
        .find(|v| !matches!(v, Value::String(s) if s.trim().is_empty()));
        TxTimestamp::from_value(raw)
    }

    /// What the block explorer is searched by: `hash`, else `id`.
    pub fn explorer_hash(&self) -> Option<String> {
        coerce_text(self.hash.as_ref()).or_else(|| coerce_text(self.id.as_ref()))
    }

    pub fn normalize(&self) -> Transaction {
        Transaction {
            id: self.identifier(),
            sender: coerce_text(self.sender.as_ref()),
            recipient: coerce_text(self.recipient.as_ref()),
            amount: coerce_number(self.amount.as_ref()),
            timestamp: self.timestamp(),
            memo: coerce_text(self.memo.as_ref()).filter(|m| !m.trim().is_empty()),
        }
    }
}

impl BalanceInfo {
    pub fn is_verified(&self) -> bool {
        coerce_text(self.verified.as_ref()).is_some_and(|v| v.eq_ignore_ascii_case("yes"))
    }

    pub fn trust_score(&self) -> Option<String> {
        coerce_text(self.trust_score.as_ref().or(self.trust_score_legacy.as_ref()))
    }
}

impl MinerInfo {
    pub fn hashrate_hs(&self) -> f64 {
        coerce_number(self.hashrate.as_ref()).unwrap_or(0.0)
    }
}

impl UserData {
    pub fn snapshot(&self) -> Snapshot {
        let balance = match self.balance.as_ref().and_then(|b| b.balance.as_ref()) {
            None => Balance::Missing,
            Some(v) => Balance::from_number(coerce_number(Some(v))),
        };
        let transactions = self
            .transactions
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(RawTransaction::normalize)
            .collect();

        Snapshot {
            balance,
            transactions,
        }
    }

    pub fn miners(&self) -> &[MinerInfo] {
        self.miners.as_deref().unwrap_or_default()
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.as_ref().map_or(0, Vec::len)
    }

    pub fn total_hashrate(&self) -> f64 {
        self.miners().iter().map(MinerInfo::hashrate_hs).sum()
    }

    /// USD per coin: `exch_rtes.max.price`, else `prices.max`. Zero and
    /// unparseable rates count as unknown.
    pub fn usd_rate(&self) -> Option<f64> {
        let from_exchange = self
            .exch_rtes
            .as_ref()
            .and_then(|r| r.max.as_ref())
            .and_then(|m| coerce_number(m.price.as_ref()))
            .filter(|p| *p != 0.0);
        from_exchange.or_else(|| {
            self.prices
                .as_ref()
                .and_then(|p| coerce_number(p.max.as_ref()))
                .filter(|p| *p != 0.0)
        })
    }
}
