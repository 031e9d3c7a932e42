//! Hierarchical section/key/value configuration store
//!
//! Absence of a (section, key) entry is the "unset" state. A present
//! `Bool(false)`, `Int(0)` or empty string is a real value and must never be
//! confused with absence; all merge and override logic depends on that
//! distinction.

use std::collections::BTreeMap;
use std::fmt;

/// One configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<String>),
}

impl ConfigValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ConfigValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(b) => write!(f, "{b}"),
            ConfigValue::Int(n) => write!(f, "{n}"),
            ConfigValue::Str(s) => write!(f, "{s}"),
            ConfigValue::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Bool(b)
    }
}

impl From<i64> for ConfigValue {
    fn from(n: i64) -> Self {
        ConfigValue::Int(n)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::Str(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::Str(s)
    }
}

impl From<Vec<String>> for ConfigValue {
    fn from(items: Vec<String>) -> Self {
        ConfigValue::List(items)
    }
}

/// Section -> key -> value store. Sections are created lazily on first write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigTree {
    sections: BTreeMap<String, BTreeMap<String, ConfigValue>>,
}

impl ConfigTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&ConfigValue> {
        self.sections.get(section).and_then(|s| s.get(key))
    }

    pub fn contains(&self, section: &str, key: &str) -> bool {
        self.get(section, key).is_some()
    }

    pub fn set(&mut self, section: &str, key: &str, value: impl Into<ConfigValue>) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    /// Removes a key, dropping the section once it holds nothing else.
    pub fn remove(&mut self, section: &str, key: &str) -> Option<ConfigValue> {
        let entries = self.sections.get_mut(section)?;
        let removed = entries.remove(key);
        if entries.is_empty() {
            self.sections.remove(section);
        }
        removed
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Iterates every (section, key, value) triple in section/key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &ConfigValue)> {
        self.sections.iter().flat_map(|(section, entries)| {
            entries
                .iter()
                .map(move |(key, value)| (section.as_str(), key.as_str(), value))
        })
    }

    pub fn get_bool(&self, section: &str, key: &str) -> Option<bool> {
        self.get(section, key).and_then(ConfigValue::as_bool)
    }

    pub fn get_int(&self, section: &str, key: &str) -> Option<i64> {
        self.get(section, key).and_then(ConfigValue::as_int)
    }

    pub fn get_str(&self, section: &str, key: &str) -> Option<&str> {
        self.get(section, key).and_then(ConfigValue::as_str)
    }

    pub fn get_list(&self, section: &str, key: &str) -> Option<&[String]> {
        self.get(section, key).and_then(ConfigValue::as_list)
    }
}
