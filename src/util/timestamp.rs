use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// Numbers below this are read as epoch seconds, anything else as epoch millis.
const MILLIS_THRESHOLD: f64 = 1e12;

/// Current wall clock in epoch milliseconds.
pub fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

/// The encodings a transaction timestamp shows up in.
///
/// The server is not consistent about it: the same account can return
/// `"17/03/2025 14:02:11"`, an ISO string, or a bare unix number depending on
/// which node answered. Parsing happens once, up front, so nothing downstream
/// has to guess.
#[derive(Debug, Clone, PartialEq)]
pub enum TxTimestamp {
    Absent,
    EpochSeconds(f64),
    EpochMillis(f64),
    /// `dd/mm/yyyy hh:mm:ss`, UTC
    DayFirst(NaiveDateTime),
    /// `yyyy-mm-dd hh:mm:ss` (space or `T`), UTC
    YearFirst(NaiveDateTime),
    /// `yyyy-mm-dd`, UTC midnight
    DateOnly(NaiveDate),
    Rfc3339(DateTime<FixedOffset>),
    Unrecognized(String),
}

impl TxTimestamp {
    /// Classify a raw JSON field. `None` and `null` are [`TxTimestamp::Absent`].
    pub fn from_value(raw: Option<&Value>) -> Self {
        match raw {
            None | Some(Value::Null) => TxTimestamp::Absent,
            Some(Value::Number(n)) => match n.as_f64() {
                Some(v) if v.is_finite() && v >= 0.0 => Self::from_number(v),
                _ => TxTimestamp::Unrecognized(n.to_string()),
            },
            Some(Value::String(s)) => Self::parse(s),
            Some(other) => TxTimestamp::Unrecognized(other.to_string()),
        }
    }

    pub fn parse(raw: &str) -> Self {
        let s = raw.trim();
        if s.is_empty() {
            return TxTimestamp::Absent;
        }

        if is_plain_number(s) {
            return match s.parse::<f64>() {
                Ok(v) if v.is_finite() => Self::from_number(v),
                _ => TxTimestamp::Unrecognized(s.to_string()),
            };
        }

        let clock = strip_fraction(&s.replacen('T', " ", 1));
        if let Ok(dt) = NaiveDateTime::parse_from_str(&clock, "%d/%m/%Y %H:%M:%S") {
            return TxTimestamp::DayFirst(dt);
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(&clock, "%Y-%m-%d %H:%M:%S") {
            return TxTimestamp::YearFirst(dt);
        }
        if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return TxTimestamp::DateOnly(d);
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return TxTimestamp::Rfc3339(dt);
        }
        if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
            return TxTimestamp::Rfc3339(dt);
        }

        TxTimestamp::Unrecognized(s.to_string())
    }

    fn from_number(v: f64) -> Self {
        if v < MILLIS_THRESHOLD {
            TxTimestamp::EpochSeconds(v)
        } else {
            TxTimestamp::EpochMillis(v)
        }
    }

    /// Normalize to epoch milliseconds. `None` when the source carried no
    /// usable instant.
    pub fn to_epoch_ms(&self) -> Option<i64> {
        match self {
            TxTimestamp::Absent | TxTimestamp::Unrecognized(_) => None,
            TxTimestamp::EpochSeconds(s) => Some((s * 1000.0) as i64),
            TxTimestamp::EpochMillis(ms) => Some(*ms as i64),
            TxTimestamp::DayFirst(dt) | TxTimestamp::YearFirst(dt) => {
                Some(dt.and_utc().timestamp_millis())
            }
            TxTimestamp::DateOnly(d) => d
                .and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc().timestamp_millis()),
            TxTimestamp::Rfc3339(dt) => Some(dt.timestamp_millis()),
        }
    }
}

fn is_plain_number(s: &str) -> bool {
    let mut parts = s.splitn(2, '.');
    let int = parts.next().unwrap_or("");
    let frac = parts.next();
    !int.is_empty()
        && int.bytes().all(|b| b.is_ascii_digit())
        && frac.map_or(true, |f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()))
}

/// Drop a trailing `.123` sub-second part from a `...hh:mm:ss.123` clock.
fn strip_fraction(s: &str) -> String {
    match s.rfind('.') {
        Some(dot)
            if s[..dot].contains(':')
                && dot + 1 < s.len()
                && s[dot + 1..].bytes().all(|b| b.is_ascii_digit()) =>
        {
            s[..dot].to_string()
        }
        _ => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_day_first_is_utc() {
        let ts = TxTimestamp::parse("02/01/2024 03:04:05");
        assert!(matches!(ts, TxTimestamp::DayFirst(_)));
        // 2024-01-02T03:04:05Z
        assert_eq!(ts.to_epoch_ms(), Some(1_704_164_645_000));
    }

    #[test]
    fn test_year_first_with_t_and_fraction() {
        let ts = TxTimestamp::parse("2024-01-02T03:04:05.789");
        assert!(matches!(ts, TxTimestamp::YearFirst(_)));
        assert_eq!(ts.to_epoch_ms(), Some(1_704_164_645_000));
    }

    #[test]
    fn test_small_numbers_are_seconds() {
        let ts = TxTimestamp::from_value(Some(&json!(1_704_164_645)));
        assert_eq!(ts, TxTimestamp::EpochSeconds(1_704_164_645.0));
        assert_eq!(ts.to_epoch_ms(), Some(1_704_164_645_000));
    }

    #[test]
    fn test_large_numbers_are_millis() {
        let ts = TxTimestamp::parse("1704164645000");
        assert_eq!(ts, TxTimestamp::EpochMillis(1_704_164_645_000.0));
        assert_eq!(ts.to_epoch_ms(), Some(1_704_164_645_000));
    }

    #[test]
    fn test_rfc3339_with_offset() {
        let ts = TxTimestamp::parse("2024-01-02T04:04:05+01:00");
        assert!(matches!(ts, TxTimestamp::Rfc3339(_)));
        assert_eq!(ts.to_epoch_ms(), Some(1_704_164_645_000));
    }

    #[test]
    fn test_date_only() {
        let ts = TxTimestamp::parse("2024-01-02");
        assert_eq!(ts.to_epoch_ms(), Some(1_704_153_600_000));
    }

    #[test]
    fn test_absent_and_garbage() {
        assert_eq!(TxTimestamp::from_value(None), TxTimestamp::Absent);
        assert_eq!(TxTimestamp::from_value(Some(&Value::Null)), TxTimestamp::Absent);
        assert_eq!(TxTimestamp::parse("   "), TxTimestamp::Absent);

        let junk = TxTimestamp::parse("yesterday-ish");
        assert_eq!(junk, TxTimestamp::Unrecognized("yesterday-ish".into()));
        assert_eq!(junk.to_epoch_ms(), None);

        // impossible calendar date
        assert_eq!(TxTimestamp::parse("31/02/2024 00:00:00").to_epoch_ms(), None);
    }
}
