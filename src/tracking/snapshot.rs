use crate::util::timestamp::TxTimestamp;

/// Balance as read from one poll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Balance {
    /// The field was not in the response at all.
    Missing,
    /// Present but not a finite number.
    Unparseable,
    Known(f64),
}

impl Balance {
    pub fn from_number(v: Option<f64>) -> Self {
        match v {
            Some(v) if v.is_finite() => Balance::Known(v),
            _ => Balance::Unparseable,
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Balance::Known(v) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// From the `id` field, falling back to `hash`. `None` when neither is
    /// usable; such entries cannot be deduplicated.
    pub id: Option<String>,
    pub sender: Option<String>,
    pub recipient: Option<String>,
    /// `None` when the amount is absent or not a finite number.
    pub amount: Option<f64>,
    pub timestamp: TxTimestamp,
    pub memo: Option<String>,
}

impl Transaction {
    /// Whether `account` received this transaction (case-insensitive).
    pub fn is_incoming_to(&self, account: &str) -> bool {
        self.recipient
            .as_deref()
            .is_some_and(|r| !r.is_empty() && r.to_lowercase() == account.to_lowercase())
    }
}

/// One polled account state.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub balance: Balance,
    pub transactions: Vec<Transaction>,
}

#[cfg(test)]
pub(crate) fn tx(id: &str, sender: &str, recipient: &str, amount: f64) -> Transaction {
    Transaction {
        id: if id.is_empty() { None } else { Some(id.to_string()) },
        sender: Some(sender.to_string()),
        recipient: Some(recipient.to_string()),
        amount: Some(amount),
        timestamp: TxTimestamp::Absent,
        memo: None,
    }
}
