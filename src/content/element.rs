//! Generic content document elements
//!
//! Content packages ship declarative documents describing event prefabs,
//! event set trees and manager settings. A document is an element tree:
//! every element has a name, a flat string attribute map and child elements.
//! Documents arrive as JSON renderings of that shape; the typed accessors
//! here are what the parsers build on. Element and attribute names are
//! matched case-insensitively.

use crate::error::{EventCoreError, Result};
use serde::Deserialize;
use std::collections::HashMap;

/// One node of a content document tree
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentElement {
    pub name: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    #[serde(default)]
    pub children: Vec<ContentElement>,
}

impl ContentElement {
    /// Parse a document from its JSON rendering
    pub fn parse_document(text: &str) -> Result<ContentElement> {
        let element: ContentElement = serde_json::from_str(text)?;
        if element.name.is_empty() {
            return Err(EventCoreError::DocumentError(
                "document root element has no name".to_string(),
            ));
        }
        Ok(element)
    }

    /// Does this element have the given name? (case-insensitive)
    #[inline]
    pub fn name_is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Raw attribute lookup (case-insensitive)
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// String attribute with default
    pub fn attr_str(&self, name: &str, default: &str) -> String {
        self.attr(name).unwrap_or(default).to_string()
    }

    /// Lowercased identifier attribute, `None` when absent or empty
    pub fn attr_ident(&self, name: &str) -> Option<String> {
        self.attr(name)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_ascii_lowercase)
    }

    /// Comma-separated identifier list attribute (trimmed, lowercased)
    pub fn attr_ident_list(&self, name: &str) -> Vec<String> {
        self.attr(name)
            .map(|value| {
                value
                    .split(',')
                    .map(|part| part.trim().to_ascii_lowercase())
                    .filter(|part| !part.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Float attribute with default; unparseable values fall back to default
    pub fn attr_f32(&self, name: &str, default: f32) -> f32 {
        self.attr(name)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Float attribute, `None` when absent or unparseable
    pub fn attr_f32_opt(&self, name: &str) -> Option<f32> {
        self.attr(name).and_then(|value| value.trim().parse().ok())
    }

    /// Integer attribute with default
    pub fn attr_i32(&self, name: &str, default: i32) -> i32 {
        self.attr(name)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Integer attribute, `None` when absent or unparseable
    pub fn attr_i32_opt(&self, name: &str) -> Option<i32> {
        self.attr(name).and_then(|value| value.trim().parse().ok())
    }

    /// Unsigned count attribute with default
    pub fn attr_usize(&self, name: &str, default: usize) -> usize {
        self.attr(name)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Boolean attribute with default; accepts true/false/1/0
    pub fn attr_bool(&self, name: &str, default: bool) -> bool {
        match self.attr(name).map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("true") || value == "1" => true,
            Some(value) if value.eq_ignore_ascii_case("false") || value == "0" => false,
            _ => default,
        }
    }

    /// First child with the given name
    pub fn child(&self, name: &str) -> Option<&ContentElement> {
        self.children.iter().find(|child| child.name_is(name))
    }

    /// All children with the given name
    pub fn children_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a ContentElement> + 'a {
        self.children.iter().filter(move |child| child.name_is(name))
    }

    /// Does the root declare a full override of previously loaded content?
    pub fn is_override(&self) -> bool {
        self.attr_bool("override", false)
    }
}
