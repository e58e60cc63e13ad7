/// Input parsing helpers shared by HTML forms and the JSON API.
///
/// HTML checkboxes send `on` (or nothing at all), while JSON clients send a
/// real boolean. [`deserialize_checkbox`] accepts both.
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Text(String),
}

pub fn deserialize_checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let flag: Option<Flag> = Option::deserialize(deserializer)?;
    Ok(match flag {
        None => false,
        Some(Flag::Bool(b)) => b,
        Some(Flag::Text(s)) => matches!(s.to_lowercase().as_str(), "on" | "true" | "1" | "yes"),
    })
}

/// Parse a user-typed amount, ignoring every non-digit character
/// (`"1,200 Lek"` reads as `1200`). Empty, zero, and overflowing
/// inputs are rejected.
pub fn parse_amount(raw: &str) -> Option<i64> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    digits.parse::<i64>().ok().filter(|amount| *amount > 0)
}
