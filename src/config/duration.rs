// src/config/duration.rs

use std::time::Duration;

/// Unit suffixes and their length in milliseconds. `ms` precedes `m`/`s` so
/// the longest suffix wins.
const UNITS: [(&str, u64); 4] = [("ms", 1), ("s", 1_000), ("m", 60_000), ("h", 3_600_000)];

/// Parse `"250ms"`, `"3s"`, `"1m"` or `"2h"` into a [`Duration`].
///
/// The unit is required: a bare `"30"` is an error rather than a guess.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let digits = s.bytes().take_while(u8::is_ascii_digit).count();
    if digits == s.len() {
        return Err(format!("duration '{s}' has no unit (use ms, s, m or h)"));
    }
    let (number, unit) = s.split_at(digits);
    let unit = unit.trim().to_ascii_lowercase();

    let per_unit = UNITS
        .iter()
        .find(|(suffix, _)| *suffix == unit)
        .map(|(_, millis)| *millis)
        .ok_or_else(|| format!("unknown duration unit '{unit}' in '{s}' (use ms, s, m or h)"))?;
    let count: u64 = number
        .parse()
        .map_err(|e| format!("bad number in duration '{s}': {e}"))?;

    count
        .checked_mul(per_unit)
        .map(Duration::from_millis)
        .ok_or_else(|| format!("duration '{s}' is too large"))
}
