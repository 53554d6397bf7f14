use chrono::DateTime;

/// Hashrate with a unit suffix, two decimals.
pub fn format_hashrate(hs: f64) -> String {
    let (v, unit) = if hs >= 1_000_000.0 {
        (hs / 1_000_000.0, "MH/s")
    } else if hs >= 1_000.0 {
        (hs / 1_000.0, "kH/s")
    } else {
        (hs, "H/s")
    };
    format!("{:.2} {}", v, unit)
}

fn plural(n: i64, unit: &str) -> String {
    format!("{} {}{} ago", n, unit, if n == 1 { "" } else { "s" })
}

/// "3 minutes ago" style age of an event. Future instants read as "just now".
pub fn relative_time(event_ms: i64, now_ms: i64) -> String {
    let seconds = (now_ms - event_ms).div_euclid(1000);
    if seconds < 5 {
        return "just now".to_string();
    }
    if seconds < 60 {
        return plural(seconds, "second");
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return plural(minutes, "minute");
    }
    let hours = seconds / 3600;
    if hours < 24 {
        return plural(hours, "hour");
    }
    plural(seconds / 86_400, "day")
}

/// Age of the last successful refresh, for the status line.
pub fn status_age(seconds: u64) -> String {
    let s = seconds as i64;
    if s < 3 {
        "just now".to_string()
    } else if s < 60 {
        plural(s, "second")
    } else if s < 3600 {
        plural(s / 60, "minute")
    } else {
        plural(s / 3600, "hour")
    }
}

/// Exact instant for a transaction, e.g. `2 January 2024 3:04:05 AM UTC`.
pub fn format_utc_timestamp(ms: i64) -> Option<String> {
    let dt = DateTime::from_timestamp_millis(ms)?;
    Some(dt.format("%-d %B %Y %-I:%M:%S %p UTC").to_string())
}

/// Greeting for the local hour of day.
pub fn greeting(hour: u32) -> &'static str {
    match hour {
        0..=11 => "Good morning",
        12..=17 => "Good afternoon",
        _ => "Good evening",
    }
}
