//! Duration normalization for media results.

use super::PathMapper;
use serde_json::Value;

/// Whole seconds from milliseconds, truncating (185999 ms is 185 s).
pub fn millis_to_secs(millis: u64) -> u64 {
    millis / 1000
}

/// Seconds from a clock string such as `"3:05"`, `"1:02:03"` or a bare `"185"`.
pub fn parse_clock(text: &str) -> Option<u64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let mut total: u64 = 0;
    let mut fields = 0;
    for part in text.split(':') {
        fields += 1;
        if fields > 3 {
            return None;
        }
        let n: u64 = part.trim().parse().ok()?;
        total = total.checked_mul(60)?.checked_add(n)?;
    }
    Some(total)
}

/// Seconds from a field that may be a number or a clock string.
pub fn secs_at(obj: &Value, path: &str) -> Option<u64> {
    match PathMapper::get_path(obj, path)? {
        Value::String(s) => parse_clock(s),
        _ => PathMapper::get_u64(obj, path),
    }
}

/// First path among `paths` holding a usable duration.
pub fn first_secs(obj: &Value, paths: &[&str]) -> Option<u64> {
    paths.iter().find_map(|p| secs_at(obj, p))
}
