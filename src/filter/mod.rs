//! # Filter Compiler
//!
//! Turns a [`FilterSet`] (logical filter keys chosen by a screen) into the query
//! parameters the backend understands.
//!
//! Compilation is a pure function: keys are visited in lexicographic order, blank
//! values are dropped, and each surviving pair goes through the configured
//! [`FilterRules`] exactly once. Backend parameter names follow the
//! `field__lookup` convention (`nombre__icontains`) and are passed through untouched.

pub mod rules;

pub use rules::*;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The active search criteria for a collection.
///
/// Backed by a `BTreeMap`, so two sets with the same content compare and
/// iterate identically regardless of insertion history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet(BTreeMap<String, String>);

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts or replaces `key`. Returns the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in lexicographic key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FilterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Compiles filter sets into query parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCompiler {
    rules: FilterRules,
}

impl FilterCompiler {
    pub fn new(rules: FilterRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &FilterRules {
        &self.rules
    }

    /// Compiles `filters` into `(param, value)` pairs.
    ///
    /// Values are trimmed; empty or whitespace-only values are omitted.
    pub fn compile(&self, filters: &FilterSet) -> Vec<(String, String)> {
        filters
            .iter()
            .filter_map(|(key, value)| {
                let value = value.trim();
                (!value.is_empty()).then(|| self.rules.apply(key, value))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_compile_sorts_keys_and_drops_blank_values() {
        let compiler = FilterCompiler::default();
        let filters = FilterSet::new()
            .with("resolucion", "")
            .with("nombre__icontains", " Juan ")
            .with("apellido__icontains", "   ")
            .with("activo", "true");

        assert_eq!(
            compiler.compile(&filters),
            pairs(&[("activo", "true"), ("nombre__icontains", "Juan")])
        );
    }

    #[test]
    fn test_compile_is_independent_of_insertion_order() {
        let compiler = FilterCompiler::new(FilterRules::new().with_rewrite(RewriteRule::show_all_statuses()));

        let forward = FilterSet::new().with("a", "1").with("estado", "todos").with("z", "9");
        let mut backward = FilterSet::new();
        backward.insert("z", "9");
        backward.insert("estado", "todos");
        backward.insert("a", "1");

        assert_eq!(forward, backward);
        assert_eq!(compiler.compile(&forward), compiler.compile(&backward));
    }

    #[test]
    fn test_show_all_statuses_rewrite() {
        let compiler = FilterCompiler::new(FilterRules::new().with_rewrite(RewriteRule::show_all_statuses()));

        let all = FilterSet::new().with("estado", "todos");
        assert_eq!(compiler.compile(&all), pairs(&[("show_all", "true")]));

        // Other statuses go through literally.
        let active = FilterSet::new().with("estado", "activo");
        assert_eq!(compiler.compile(&active), pairs(&[("estado", "activo")]));
    }

    #[test]
    fn test_filter_set_deserializes_from_json_object() {
        let filters: FilterSet = serde_json::from_str(r#"{"nombre":"Ana","estado":"todos"}"#).unwrap();
        assert_eq!(filters.len(), 2);
        assert_eq!(filters.get("nombre"), Some("Ana"));
        let keys: Vec<_> = filters.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["estado", "nombre"]);
    }
}
