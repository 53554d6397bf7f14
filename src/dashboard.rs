use chrono::{Local, TimeZone, Timelike};
use tokio::sync::watch;

use crate::monitor::stats::{AccountSummary, DashboardStats, MinerLine};
use crate::util::format::{format_hashrate, greeting, relative_time, status_age};
use crate::util::timestamp::now_ms;

fn coins(v: Option<f64>) -> String {
    v.map(|v| format!("ᕲ {}", v)).unwrap_or_else(|| "-".into())
}

fn greeting_line(st: &DashboardStats, summary: &AccountSummary, now: u64) -> String {
    let hour = Local
        .timestamp_millis_opt(now as i64)
        .single()
        .map_or(12, |t| t.hour());
    let name = if st.account.is_empty() {
        summary.username.as_deref().unwrap_or("Miner")
    } else {
        st.account.as_str()
    };
    format!(
        "{}, {}!  {} · Trust score: {}\n",
        greeting(hour),
        name,
        if summary.verified { "Verified" } else { "Not verified" },
        summary.trust_score.as_deref().unwrap_or("-")
    )
}

fn miner_row(i: usize, m: &MinerLine) -> String {
    format!(
        "  {:<2} {:<24} {:<13} {:>8}/{:<8} {:<12} {:<8} {:<8} {:<14} {}\n",
        i + 1,
        m.software,
        m.identifier,
        m.accepted,
        m.rejected,
        format_hashrate(m.hashrate),
        m.difficulty,
        m.ping_ms.map_or_else(|| "-".to_string(), |p| format!("{} ms", p)),
        m.pool,
        m.algorithm
    )
}

/// Render one frame of the dashboard.
pub fn render(st: &DashboardStats, now: u64) -> String {
    let mut out = String::new();
    let summary = st.summary.clone().unwrap_or_default();

    out.push_str(&format!("=== DUCO Tracker – {} ===\n", st.account));
    if st.summary.is_some() {
        out.push_str(&greeting_line(st, &summary, now));
    }
    let status = match (&st.error, st.last_update_ms) {
        (Some(err), _) => err.clone(),
        (None, Some(at)) => format!("Live • Updated {}", status_age(now.saturating_sub(at) / 1000)),
        (None, None) => "Fetching...".to_string(),
    };
    out.push_str(&format!("Status              : {}\n", status));

    let change = match (summary.balance, st.previous_balance) {
        (Some(now_b), Some(prev)) if now_b != prev => format!(" ({:+})", now_b - prev),
        _ => String::new(),
    };
    out.push_str(&format!("Balance             : {}{}\n", coins(summary.balance), change));
    out.push_str(&format!(
        "Balance (USD)       : {}\n",
        summary
            .balance_usd
            .map(|v| format!("~ ${:.2}", v))
            .unwrap_or_else(|| "-".into())
    ));
    out.push_str(&format!("Mined since tracking: {}\n", coins(st.mined_total)));
    out.push_str(&format!(
        "Est. daily earnings : {}\n",
        st.daily_rate
            .map(|v| format!("ᕲ {:.4}", v))
            .unwrap_or_else(|| "n/a".into())
    ));
    out.push_str(&format!("Active miners       : {}\n", summary.miners_count));
    out.push_str(&format!("Transactions        : {}\n", summary.transaction_count));
    out.push_str(&format!("Total hashrate      : {}\n", format_hashrate(summary.total_hashrate)));

    out.push_str("\nMiners:\n");
    if st.miners.is_empty() {
        out.push_str("  No active miners.\n");
    } else {
        out.push_str(
            "  #  software                 identifier    accepted/rejected  hashrate     diff     ping     pool           algorithm\n",
        );
        for (i, m) in st.miners.iter().enumerate() {
            out.push_str(&miner_row(i, m));
        }
    }

    out.push_str("\nRecent transactions:\n");
    if st.recent_transactions.is_empty() {
        out.push_str("  No transactions found.\n");
    }
    for tx in &st.recent_transactions {
        let relative = tx
            .at_ms
            .map(|at| relative_time(at, now as i64))
            .unwrap_or_default();
        let mut when = match (relative.is_empty(), tx.exact_time.is_empty()) {
            (true, _) => tx.exact_time.clone(),
            (false, true) => relative,
            (false, false) => format!("{} ({})", relative, tx.exact_time),
        };
        if let Some(hash) = &tx.hash {
            when.push_str(&format!(" · {}", hash));
        }
        out.push_str(&format!(
            "  from {:<16} {:>14}  \"{}\"  {}\n",
            tx.sender,
            coins(tx.amount),
            tx.memo,
            when
        ));
    }
    out
}

/// Very simple terminal dashboard.
/// Prints the latest stats once per second. No blocking stdout guards across await.
pub async fn launch_dashboard(mut rx: watch::Receiver<DashboardStats>) {
    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(1));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let st = rx.borrow().clone();
                println!("{}", render(&st, now_ms()));
            }

            // React to explicit updates quickly too
            changed = rx.changed() => {
                if changed.is_err() { break; } // sender dropped
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::stats::TransactionLine;

    #[test]
    fn test_render_before_first_fetch() {
        let frame = render(&DashboardStats::new("alice"), 0);
        assert!(frame.contains("alice"));
        assert!(frame.contains("Fetching..."));
        assert!(frame.contains("Est. daily earnings : n/a"));
        assert!(frame.contains("No transactions found."));
        assert!(frame.contains("No active miners."));
        assert!(!frame.contains("Trust score"));
    }

    #[test]
    fn test_render_full_frame() {
        let mut st = DashboardStats::new("alice");
        st.summary = Some(AccountSummary {
            username: Some("Alice".into()),
            verified: true,
            trust_score: Some("9".into()),
            balance: Some(12.5),
            balance_usd: Some(0.25),
            miners_count: 2,
            transaction_count: 14,
            total_hashrate: 2_500.0,
        });
        st.miners = vec![
            MinerLine {
                software: "Official PC Miner".into(),
                identifier: "rig-1".into(),
                accepted: 10,
                rejected: 1,
                hashrate: 1_500.0,
                difficulty: "777".into(),
                ping_ms: Some(42.0),
                pool: "magi-pool".into(),
                algorithm: "DUCO-S1".into(),
            },
            MinerLine {
                software: "Official AVR Miner".into(),
                identifier: "-".into(),
                accepted: 0,
                rejected: 0,
                hashrate: 1_000.0,
                difficulty: "-".into(),
                ping_ms: None,
                pool: "-".into(),
                algorithm: "-".into(),
            },
        ];
        st.previous_balance = Some(10.0);
        st.mined_total = Some(2.5);
        st.daily_rate = Some(60.0);
        st.last_update_ms = Some(10_000);
        st.recent_transactions = vec![TransactionLine {
            sender: "bob".into(),
            amount: Some(1.0),
            memo: "hi".into(),
            at_ms: Some(0),
            exact_time: "1 January 1970 12:00:00 AM UTC".into(),
            hash: Some("abc123".into()),
        }];

        let frame = render(&st, 40_000);
        assert!(frame.contains("Live • Updated 30 seconds ago"));
        assert!(frame.contains("ᕲ 12.5 (+2.5)"));
        assert!(frame.contains("~ $0.25"));
        assert!(frame.contains("ᕲ 60.0000"));
        assert!(frame.contains("2.50 kH/s"));
        assert!(frame.contains("40 seconds ago (1 January 1970 12:00:00 AM UTC) · abc123"));

        assert!(frame.contains(", alice!  Verified · Trust score: 9"));
        assert!(frame.contains("Transactions        : 14"));
        assert!(!frame.contains("No active miners."));
        let rig = frame.lines().find(|l| l.contains("rig-1")).unwrap();
        for column in ["777", "42 ms", "magi-pool", "DUCO-S1", "1.50 kH/s", "10/1"] {
            assert!(rig.contains(column), "{column} missing from {rig:?}");
        }
        let avr = frame.lines().find(|l| l.contains("AVR")).unwrap();
        assert!(avr.contains("1.00 kH/s"));
        assert!(!avr.contains(" ms"));
    }

    #[test]
    fn test_unparsed_time_shows_raw_text() {
        let mut st = DashboardStats::new("alice");
        st.recent_transactions = vec![TransactionLine {
            sender: "bob".into(),
            amount: None,
            memo: "Transaction".into(),
            at_ms: None,
            exact_time: "soon".into(),
            hash: None,
        }];
        let frame = render(&st, 0);
        let line = frame.lines().find(|l| l.contains("from bob")).unwrap();
        assert!(line.ends_with("\"Transaction\"  soon"));
    }

    #[test]
    fn test_render_error_status() {
        let mut st = DashboardStats::new("alice");
        st.error = Some("Failed to reach DUCO server.".into());
        assert!(render(&st, 0).contains("Status              : Failed to reach DUCO server."));
    }
}
