//! Normalization of upstream payloads: nanoERG units, list envelopes, and the
//! double-encoded price feed.

use serde::Deserialize;
use thiserror::Error;

/// nanoERG per ERG.
pub const NANO_ERG_PER_ERG: f64 = 1_000_000_000.0;

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("invalid json: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("invalid price: {0}")]
    InvalidPrice(f64),
}

/// Convert a nanoERG amount to ERG.
pub fn nano_to_erg(nano: u64) -> f64 {
    nano as f64 / NANO_ERG_PER_ERG
}

/// A list response that is either a bare array or wrapped as `{"items": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListOrEnvelope<T> {
    List(Vec<T>),
    Envelope { items: Vec<T> },
}

impl<T> ListOrEnvelope<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            ListOrEnvelope::List(items) => items,
            ListOrEnvelope::Envelope { items } => items,
        }
    }
}

/// Unwrap one layer of JSON string encoding from a raw body.
///
/// Trims whitespace, strips a single pair of surrounding double quotes, and
/// replaces every `\"` with `"`. Bodies that are already plain JSON pass
/// through unchanged.
pub fn unquote_json_body(raw: &str) -> String {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    inner.replace("\\\"", "\"")
}

/// Decode a possibly double-encoded JSON body into a value.
pub fn decode_quoted_json(raw: &str) -> Result<serde_json::Value, NormalizeError> {
    let unquoted = unquote_json_body(raw);
    Ok(serde_json::from_str(&unquoted)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nano_conversion_is_exact_division() {
        assert_eq!(nano_to_erg(0), 0.0);
        assert_eq!(nano_to_erg(1_000_000_000), 1.0);
        assert_eq!(nano_to_erg(1), 1e-9);
        assert_eq!(nano_to_erg(67_500_000_000), 67.5);
        assert_eq!(nano_to_erg(1_500_000), 0.0015);
    }

    #[test]
    fn envelope_and_bare_list() {
        let env: ListOrEnvelope<u32> = serde_json::from_str(r#"{"items":[1,2],"total":2}"#).unwrap();
        assert_eq!(env.into_items(), vec![1, 2]);
        let bare: ListOrEnvelope<u32> = serde_json::from_str("[3]").unwrap();
        assert_eq!(bare.into_items(), vec![3]);
    }

    #[test]
    fn decode_double_encoded() {
        let raw = "  \"{\\\"latest_price\\\": 1.25, \\\"title\\\": \\\"ERG/USD\\\"}\"\n";
        let v = decode_quoted_json(raw).unwrap();
        assert_eq!(v["latest_price"], 1.25);
        assert_eq!(v["title"], "ERG/USD");
    }

    #[test]
    fn decode_plain_json() {
        let v = decode_quoted_json(r#"{"latest_price": 0.9}"#).unwrap();
        assert_eq!(v["latest_price"], 0.9);
    }

    #[test]
    fn decode_garbage_fails() {
        assert!(matches!(
            decode_quoted_json("<html>bad gateway</html>"),
            Err(NormalizeError::InvalidJson(_))
        ));
    }
}
