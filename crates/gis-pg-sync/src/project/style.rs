//! Named style variants attached to a layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Style variants of one layer, keyed by name, with at most one active.
///
/// Bodies are opaque QML documents; this crate never looks inside them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleManager {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    current: Option<String>,
    #[serde(default)]
    variants: BTreeMap<String, String>,
}

impl StyleManager {
    /// A manager holding a single active style.
    pub fn single(name: impl Into<String>, body: impl Into<String>) -> Self {
        let name = name.into();
        let mut variants = BTreeMap::new();
        variants.insert(name.clone(), body.into());
        Self {
            current: Some(name),
            variants,
        }
    }

    /// Name of the active style, if it still exists.
    pub fn current_style(&self) -> Option<&str> {
        self.current
            .as_deref()
            .filter(|name| self.variants.contains_key(*name))
    }

    /// Body of the active style.
    pub fn current_body(&self) -> Option<&str> {
        self.current_style().and_then(|name| self.style(name))
    }

    pub fn style(&self, name: &str) -> Option<&str> {
        self.variants.get(name).map(String::as_str)
    }

    pub fn styles(&self) -> impl Iterator<Item = &str> {
        self.variants.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variants.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Add a style. Returns false if the name is already taken.
    pub fn add_style(&mut self, name: &str, body: &str) -> bool {
        if self.variants.contains_key(name) {
            return false;
        }
        self.variants.insert(name.to_string(), body.to_string());
        true
    }

    /// Remove a style. Removing the active style leaves no style active.
    pub fn remove_style(&mut self, name: &str) -> bool {
        let removed = self.variants.remove(name).is_some();
        if removed && self.current.as_deref() == Some(name) {
            self.current = None;
        }
        removed
    }

    /// Make an existing style active. Returns false for unknown names.
    pub fn set_current_style(&mut self, name: &str) -> bool {
        if !self.variants.contains_key(name) {
            return false;
        }
        self.current = Some(name.to_string());
        true
    }

    /// Drop every variant except `keep`.
    pub fn retain_only(&mut self, keep: &str) {
        self.variants.retain(|name, _| name == keep);
        if self.current.as_deref() != Some(keep) {
            self.current = None;
        }
    }
}
