// SPDX-License-Identifier: MIT OR Apache-2.0
//! View registry.
//!
//! Views are groupings of models kept outside the sequence document. A view
//! refers to its members by name only; nothing here is updated when models
//! are renamed or deleted.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

/// A named view and its member model names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewEntry {
    /// View name
    pub name: String,
    /// Comma-separated member model names, in display order
    pub models: String,
}

/// Membership table mapping view names to model lists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewRegistry {
    views: Vec<ViewEntry>,
}

impl ViewRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `<view name=".." models=".."/>` entries from an XML document.
    ///
    /// Parsing is best-effort: entries read before a syntax error are kept.
    pub fn from_xml_str(xml: &str) -> Self {
        let mut registry = Self::new();
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Eof) => break,
                Ok(Event::Start(ref e) | Event::Empty(ref e)) if e.name().as_ref() == b"view" => {
                    let mut name = String::new();
                    let mut models = String::new();
                    for attr in e.attributes().flatten() {
                        let value = attr
                            .unescape_value()
                            .map(|v| v.into_owned())
                            .unwrap_or_default();
                        match attr.key.as_ref() {
                            b"name" => name = value,
                            b"models" => models = value,
                            _ => {}
                        }
                    }
                    if !name.is_empty() {
                        registry.add_view(name, models);
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        "View registry parse stopped at byte {}: {}",
                        reader.buffer_position(),
                        e
                    );
                    break;
                }
                _ => {}
            }
        }

        registry
    }

    /// Add a view. Later entries with a duplicate name are shadowed by earlier ones.
    pub fn add_view(&mut self, name: impl Into<String>, models: impl Into<String>) {
        self.views.push(ViewEntry {
            name: name.into(),
            models: models.into(),
        });
    }

    /// Get all entries
    pub fn views(&self) -> impl Iterator<Item = &ViewEntry> {
        self.views.iter()
    }

    /// Get view count
    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    /// Comma-joined member list of `view_name`, or empty if no such view
    pub fn get_view_models(&self, view_name: &str) -> &str {
        self.views
            .iter()
            .find(|v| v.name == view_name)
            .map(|v| v.models.as_str())
            .unwrap_or("")
    }

    /// Member model names of `view_name`, in list order
    pub fn view_members(&self, view_name: &str) -> Vec<&str> {
        self.get_view_models(view_name)
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect()
    }
}
