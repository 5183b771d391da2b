//! Per-key translation rules applied during filter compilation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Translates one exact `(key, value)` filter into a different query parameter.
///
/// Used for sentinel values the backend does not accept literally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteRule {
    pub key: String,
    pub value: String,
    pub to_key: String,
    pub to_value: String,
}

impl RewriteRule {
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        to_key: impl Into<String>,
        to_value: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            to_key: to_key.into(),
            to_value: to_value.into(),
        }
    }

    /// `estado=todos` becomes `show_all=true`.
    ///
    /// List endpoints hide inactive records unless `show_all` is present; there is
    /// no `estado` value that means "every status".
    pub fn show_all_statuses() -> Self {
        Self::new("estado", "todos", "show_all", "true")
    }

    fn matches(&self, key: &str, value: &str) -> bool {
        self.key == key && self.value == value
    }
}

/// Rewrite rules plus key aliases for one collection.
///
/// Rewrites are checked first, against the logical key. A key with no matching
/// rewrite is renamed through `aliases` (e.g. `nombre` to `nombre__icontains`),
/// or passed through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterRules {
    rewrites: Vec<RewriteRule>,
    aliases: BTreeMap<String, String>,
}

impl FilterRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rewrite(mut self, rule: RewriteRule) -> Self {
        self.rewrites.push(rule);
        self
    }

    pub fn with_alias(mut self, key: impl Into<String>, param: impl Into<String>) -> Self {
        self.aliases.insert(key.into(), param.into());
        self
    }

    pub fn rewrites(&self) -> &[RewriteRule] {
        &self.rewrites
    }

    /// Translates a single non-empty filter into its wire form.
    pub fn apply(&self, key: &str, value: &str) -> (String, String) {
        if let Some(rule) = self.rewrites.iter().find(|r| r.matches(key, value)) {
            return (rule.to_key.clone(), rule.to_value.clone());
        }
        let param = self.aliases.get(key).map(String::as_str).unwrap_or(key);
        (param.to_string(), value.to_string())
    }
}
