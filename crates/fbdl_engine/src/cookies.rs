use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

static COOKIE_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z0-9_\-]+)=([^;\r\n]*)").expect("cookie pattern is valid")
});

/// Session cookies presented on every request of a run.
///
/// Built once from the raw text copied out of a browser's request headers
/// (`c_user=...; xs=...;`) and shared read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    entries: BTreeMap<String, String>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `name=value` pairs separated by `;` or newlines.
    ///
    /// Never fails: text without any pair yields an empty jar. A later pair
    /// with the same name overwrites the earlier one.
    pub fn parse(raw: &str) -> Self {
        let entries = COOKIE_PAIR
            .captures_iter(raw)
            .map(|caps| (caps[1].to_string(), caps[2].trim().to_string()))
            .collect();
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Value for the HTTP `Cookie` header, `None` for an empty jar.
    pub fn header_value(&self) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .entries
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        Some(pairs.join("; "))
    }
}
