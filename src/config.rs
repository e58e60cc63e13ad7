use std::env;
use std::str::FromStr;

use crate::models::DEFAULT_VAT_RATE;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// VAT rate in percent applied to VAT-inclusive incomes.
    pub vat_rate: u32,
    pub currency: String,
    pub locale: String,
    /// Show sample data when the address carries no state.
    pub sample_data: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 7070,
            vat_rate: DEFAULT_VAT_RATE,
            currency: "ALL".into(),
            locale: "sq-AL".into(),
            sample_data: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup; unset or invalid values keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            host: lookup("CASHKEY_HOST").unwrap_or(defaults.host),
            port: parsed(&lookup, "CASHKEY_PORT").unwrap_or(defaults.port),
            vat_rate: parsed(&lookup, "CASHKEY_VAT_RATE").unwrap_or(defaults.vat_rate),
            currency: lookup("CASHKEY_CURRENCY").unwrap_or(defaults.currency),
            locale: lookup("CASHKEY_LOCALE").unwrap_or(defaults.locale),
            sample_data: lookup("CASHKEY_SAMPLE_DATA")
                .map(|v| !matches!(v.to_lowercase().as_str(), "false" | "0" | "no" | "off"))
                .unwrap_or(defaults.sample_data),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid {}={:?}, using default", key, raw);
            None
        }
    }
}
