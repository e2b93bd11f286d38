//! Provider REST payloads

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

/// Call resource returned by `POST /Accounts/{sid}/Calls.json`
///
/// Only the fields the dialer reads are kept. `duration` and `price` are
/// reported as strings, numbers or null depending on the call's progress.
#[derive(Debug, Clone, Deserialize)]
pub struct CallResource {
    pub sid: String,

    pub status: String,

    #[serde(default, deserialize_with = "lenient_seconds")]
    pub duration: Option<i32>,

    #[serde(default, deserialize_with = "lenient_decimal")]
    pub price: Option<Decimal>,
}

/// Error body the provider sends with a non-2xx status
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderErrorBody {
    #[serde(default)]
    pub code: Option<i64>,

    pub message: String,

    #[serde(default)]
    pub status: Option<u16>,

    #[serde(default)]
    pub more_info: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Scalar>::deserialize(deserializer)?;
    Ok(match value {
        Some(Scalar::Int(n)) => i32::try_from(n).ok(),
        Some(Scalar::Float(f)) if f.is_finite() => Some(f.trunc() as i32),
        Some(Scalar::Text(s)) => s.trim().parse::<i32>().ok(),
        _ => None,
    })
}

fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Scalar>::deserialize(deserializer)?;
    Ok(match value {
        Some(Scalar::Int(n)) => Some(Decimal::from(n)),
        Some(Scalar::Float(f)) => Decimal::try_from(f).ok(),
        Some(Scalar::Text(s)) => Decimal::from_str(s.trim()).ok(),
        None => None,
    })
}
