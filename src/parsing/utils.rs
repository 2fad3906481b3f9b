use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parses `YYYY-MM-DD`, `YYYY/MM/DD` or `YYYYMMDD`. Anything after the date part
/// (a time component) is ignored.
pub fn parse_flexible_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let head: String = s.chars().take(10).collect();
    NaiveDate::parse_from_str(&head, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&head, "%Y/%m/%d"))
        .ok()
        .or_else(|| {
            let compact: String = s.chars().take(8).collect();
            if compact.len() == 8 && compact.chars().all(|c| c.is_ascii_digit()) {
                NaiveDate::parse_from_str(&compact, "%Y%m%d").ok()
            } else {
                None
            }
        })
}

/// Parses EDINET submission timestamps (`YYYY-MM-DD HH:MM`, optionally with seconds).
/// A bare date is read as midnight.
pub fn parse_submit_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| parse_flexible_date(s).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

/// Deserializes an optional date, treating empty or unparsable values as `None`.
pub fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?;
    Ok(s.as_deref().and_then(parse_flexible_date))
}

pub fn deserialize_optional_datetime<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?;
    Ok(s.as_deref().and_then(parse_submit_datetime))
}

/// Deserializes a number that may arrive as a JSON number, a numeric string
/// (thousands separators allowed), an empty string or `null`.
pub fn deserialize_lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => {
            let cleaned = s.trim().replace(',', "");
            if cleaned.is_empty() {
                None
            } else {
                cleaned.parse::<f64>().ok()
            }
        }
        _ => None,
    })
}
