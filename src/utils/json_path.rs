//! Path lookups for untyped provider payloads
//!
//! Supports:
//! - Nested path access (e.g., "data.play")
//! - Array indexing (e.g., "choices[0].message.content")
//! - Dot-index segments (e.g., "items.0.id")
//! - Ordered candidate lists, where the first non-empty match wins

use serde_json::Value;

/// Path mapper for extracting values from JSON using dot-notation paths
pub struct PathMapper;

impl PathMapper {
    /// Get value from JSON using dot-notation path (supports array indexing)
    ///
    /// Examples:
    /// - "choices[0].message.content"
    /// - "responseData.translatedText"
    /// - "[0][0][0]"
    pub fn get_path<'a>(obj: &'a Value, path: &str) -> Option<&'a Value> {
        if path.is_empty() {
            return None;
        }

        // Remove leading "$." if present (JSONPath style)
        let normalized = path.trim().trim_start_matches("$.").to_string();
        let mut current = obj;

        for part in normalized.split('.') {
            if part.is_empty() {
                return None;
            }

            // Split "key[0][1]" into the key and each index
            let (key, indexes) = match part.find('[') {
                Some(bracket_pos) => (&part[..bracket_pos], &part[bracket_pos..]),
                None => (part, ""),
            };

            if !key.is_empty() {
                current = match current {
                    Value::Object(map) => map.get(key)?,
                    Value::Array(arr) => {
                        // Support "0" / "1" style index segments
                        if let Ok(idx) = key.parse::<usize>() {
                            arr.get(idx)?
                        } else if key == "*" {
                            arr.first()?
                        } else {
                            return None;
                        }
                    }
                    _ => return None,
                };
            }

            for raw in indexes.split('[').skip(1) {
                let idx_str = raw.trim_end_matches(']');
                let arr = current.as_array()?;
                current = if idx_str == "*" {
                    arr.first()?
                } else {
                    arr.get(idx_str.parse::<usize>().ok()?)?
                };
            }
        }

        Some(current)
    }

    /// Get a non-empty string from path (numbers are rendered as text)
    pub fn get_string(obj: &Value, path: &str) -> Option<String> {
        match Self::get_path(obj, path)? {
            Value::String(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// First non-empty string among `paths`, checked in order
    pub fn first_string(obj: &Value, paths: &[&str]) -> Option<String> {
        paths.iter().find_map(|p| Self::get_string(obj, p))
    }

    /// Numeric value at path; numeric strings ("12.5") are accepted
    pub fn get_f64(obj: &Value, path: &str) -> Option<f64> {
        match Self::get_path(obj, path)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Non-negative integer at path; fractional values are floored
    pub fn get_u64(obj: &Value, path: &str) -> Option<u64> {
        let v = Self::get_f64(obj, path)?;
        (v.is_finite() && v >= 0.0).then(|| v.floor() as u64)
    }

    /// Non-empty array at path
    pub fn get_non_empty_array<'a>(obj: &'a Value, path: &str) -> Option<&'a Vec<Value>> {
        Self::get_path(obj, path)
            .and_then(Value::as_array)
            .filter(|a| !a.is_empty())
    }
}
