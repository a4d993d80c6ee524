use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A decoded ABI argument value, canonical enough to serialize
/// byte-identically on every replay.
///
/// Integers are represented as decimal strings rather than JSON numbers:
/// `uint256` values routinely exceed `f64`/`i64` range, and the store's
/// `event_data` column must reproduce the exact same bytes whether it was
/// written by the producer or reconstructed by a rollback replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Address(String),
    Uint(String),
    Str(String),
    Bool(bool),
}

impl ArgValue {
    pub fn as_uint(&self) -> Option<u128> {
        match self {
            ArgValue::Uint(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<&str> {
        match self {
            ArgValue::Address(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str_value(&self) -> Option<&str> {
        match self {
            ArgValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// A name-keyed, sorted map of decoded event arguments. `BTreeMap` gives
/// deterministic key order for free, which `serde_json`'s map serialization
/// preserves — the property the store's canonical JSON column depends on.
pub type ArgMap = BTreeMap<String, ArgValue>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_keys_serialize_in_order() {
        let mut map = ArgMap::new();
        map.insert("goal".to_string(), ArgValue::Uint("1000".to_string()));
        map.insert("campaign".to_string(), ArgValue::Address("0xabc".to_string()));
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"campaign":"0xabc","goal":"1000"}"#);
    }
}
