//! Entity-path grammar (§4.6, §6): a comma-separated list of `key=value`
//! pairs, grounded on `original_source/utils/entity_path_parser.cpp`'s
//! `std::map<string,string>` shape, with `operator[]`/`contains` carried
//! over as `get`/`contains` (§11).

use crate::error::EntityError;
use crate::expand_env::expand_env;
use std::collections::BTreeMap;

/// Recognized keys the core itself interprets; anything else is passed
/// through to the runtime plugin unchanged (§4.6 point 1).
pub const RECOGNIZED_KEYS: &[&str] = &["callable", "global", "field", "getter", "setter"];

/// A parsed entity path: an ordered map of `key -> value`, with every
/// value already environment-expanded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityPath {
    items: BTreeMap<String, String>,
}

impl EntityPath {
    /// Parse `raw` (§4.6 point 1). A bare `key` with no `=` is stored with
    /// an empty value, mirroring the original's `entity_path_items[keyval[0]] = ""`.
    pub fn parse(raw: &str) -> Result<Self, EntityError> {
        let mut items = BTreeMap::new();
        for item in raw.split(',') {
            if item.is_empty() {
                continue;
            }
            let mut parts = item.splitn(2, '=');
            let key = parts.next().unwrap_or_default();
            match parts.next() {
                None => {
                    items.insert(key.to_string(), String::new());
                }
                Some(value) => {
                    if value.contains('=') {
                        return Err(EntityError::InvalidPath(raw.to_string()));
                    }
                    items.insert(key.to_string(), expand_env(value));
                }
            }
        }
        Ok(Self { items })
    }

    /// Look up `key`, returning an empty string if absent — mirrors
    /// `entity_path_parser::operator[]`.
    pub fn get(&self, key: &str) -> &str {
        self.items.get(key).map(String::as_str).unwrap_or("")
    }

    /// True if `key` was present in the path.
    pub fn contains(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    /// Iterate every `(key, value)` pair, in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.items.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
