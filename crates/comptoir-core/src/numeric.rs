//! # Lenient Numbers
//!
//! Backend exports are not strict about numbers: a quantity may arrive as
//! `1.5`, a price as `"50"` or `"12,50"`. Anything that is not a usable
//! number decodes as missing, which the aggregates count as zero, instead
//! of failing the whole file.
//!
//! ```text
//!   2        ──► 2          "3"    ──► 3
//!   1.5      ──► 2 (qty)    "12,50" ──► 12.5
//!   "n/a"    ──► missing    true, {} ──► missing
//! ```

use serde::de::IgnoredAny;
use serde::Deserialize;

/// Any JSON value in a numeric slot.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Numeric {
    Int(i64),
    Float(f64),
    Text(String),
    Other(IgnoredAny),
}

impl Numeric {
    /// The value as a float, if it is a finite number.
    pub(crate) fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Numeric::Int(n) => *n as f64,
            Numeric::Float(f) => *f,
            Numeric::Text(text) => parse_text(text)?,
            Numeric::Other(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    /// The value as a whole count; fractions round to the nearest unit.
    pub(crate) fn as_i64(&self) -> Option<i64> {
        match self {
            Numeric::Int(n) => Some(*n),
            Numeric::Text(text) => text
                .trim()
                .parse::<i64>()
                .ok()
                .or_else(|| self.as_f64().map(|f| f.round() as i64)),
            _ => self.as_f64().map(|f| f.round() as i64),
        }
    }
}

fn parse_text(text: &str) -> Option<f64> {
    text.trim().replace(',', ".").parse::<f64>().ok()
}

/// Serde adapter for unit counts (`quantitySold`, stock quantity).
///
/// ```rust,ignore
/// #[serde(default, with = "crate::numeric::quantity")]
/// pub quantity_sold: i64,
/// ```
pub mod quantity {
    use super::Numeric;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(*value)
    }

    /// `null` and unusable values decode as zero.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let raw = Option::<Numeric>::deserialize(deserializer)?;
        Ok(raw.and_then(|n| n.as_i64()).unwrap_or_default())
    }
}

/// Same as [`quantity`] for optional fields; unusable values stay `None`.
pub mod quantity_opt {
    use super::Numeric;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(qty) => serializer.serialize_some(qty),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<i64>, D::Error> {
        let raw = Option::<Numeric>::deserialize(deserializer)?;
        Ok(raw.and_then(|n| n.as_i64()))
    }
}
