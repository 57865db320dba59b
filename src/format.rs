//! Display formatting for durations, timestamps and counts.

const US: i64 = 1_000;
const MS: i64 = 1_000_000;
const S: i64 = 1_000_000_000;

/// Formats a duration in nanoseconds at display precision.
pub fn format_duration(ns: i64) -> String {
    let sign = if ns < 0 { "-" } else { "" };
    let abs = ns.unsigned_abs();

    if abs < US as u64 {
        format!("{sign}{abs}ns")
    } else if abs < MS as u64 {
        format!("{sign}{:.1}us", abs as f64 / US as f64)
    } else if abs < S as u64 {
        format!("{sign}{:.3}ms", abs as f64 / MS as f64)
    } else {
        format!("{sign}{:.3}s", abs as f64 / S as f64)
    }
}

/// Formats a timestamp relative to the start of the trace.
pub fn format_timestamp(ts: i64) -> String {
    if ts == 0 {
        "0".to_owned()
    } else {
        format_duration(ts)
    }
}

/// Groups digits in threes: `1234567` becomes `1,234,567`.
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn format_percent(value: f64) -> String {
    format!("{value:.2}%")
}
