//! Content loading and the prefab catalog
//!
//! The catalog is an explicitly owned object built once per content-package
//! activation and passed by reference to the parser and the scheduler. It is
//! never a process-wide global; an override reload tears the affected kind
//! down and rebuilds it.

pub mod element;
pub mod prefab;
pub mod settings;

pub use element::ContentElement;
pub use prefab::{EventKind, EventPrefab, SubEventPrefab};
pub use settings::{EventManagerSettings, DEFAULT_SETTINGS};

use crate::error::Result;
use crate::eventset::EventSet;
use ahash::AHashMap;
use std::sync::Arc;
use tracing::{error, warn};

/// All loaded event content: prefabs, manager settings and set trees
#[derive(Debug, Default)]
pub struct ContentCatalog {
    prefabs: AHashMap<String, Arc<EventPrefab>>,
    settings: Vec<EventManagerSettings>,
    event_sets: Vec<Arc<EventSet>>,
    set_index_counter: usize,
}

impl ContentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load one parsed document into the catalog.
    ///
    /// Recognized roots: `eventprefabs`, `eventsets`, `eventmanagersettings`.
    /// A root carrying `override="true"` fully replaces the previously loaded
    /// content of its kind. Individual malformed entries are logged and
    /// skipped.
    pub fn load_document(&mut self, document: &ContentElement) -> Result<()> {
        if document.name_is("eventprefabs") {
            if document.is_override() {
                self.prefabs.clear();
            }
            for child in &document.children {
                match EventPrefab::from_element(child) {
                    Ok(prefab) => {
                        let identifier = prefab.identifier.clone();
                        if self
                            .prefabs
                            .insert(identifier.clone(), Arc::new(prefab))
                            .is_some()
                        {
                            warn!(prefab = %identifier, "duplicate event prefab replaced");
                        }
                    }
                    Err(err) => error!(%err, "skipping invalid event prefab"),
                }
            }
        } else if document.name_is("eventsets") {
            if document.is_override() {
                self.event_sets.clear();
                self.set_index_counter = 0;
            }
            for child in document.children_named("eventset") {
                let set = EventSet::from_element(child, &self.prefabs, &mut self.set_index_counter)?;
                self.event_sets.push(Arc::new(set));
            }
        } else if document.name_is("eventmanagersettings") {
            if document.is_override() {
                self.settings.clear();
            }
            for child in &document.children {
                match EventManagerSettings::from_element(child) {
                    Ok(settings) => self.settings.push(settings),
                    Err(err) => error!(%err, "skipping invalid event manager settings"),
                }
            }
        } else {
            warn!(root = %document.name, "unrecognized content document root, ignored");
        }
        Ok(())
    }

    /// Parse and load documents from their JSON renderings
    pub fn load_texts<'a>(&mut self, texts: impl IntoIterator<Item = &'a str>) -> Result<()> {
        for text in texts {
            let document = ContentElement::parse_document(text)?;
            self.load_document(&document)?;
        }
        Ok(())
    }

    /// Push the built-in settings band, for sessions run without tuning content
    pub fn ensure_default_settings(&mut self) {
        if self.settings.is_empty() {
            self.settings.push(DEFAULT_SETTINGS.clone());
        }
    }

    pub fn prefab(&self, identifier: &str) -> Option<&Arc<EventPrefab>> {
        self.prefabs.get(identifier)
    }

    pub fn prefabs(&self) -> &AHashMap<String, Arc<EventPrefab>> {
        &self.prefabs
    }

    pub fn event_sets(&self) -> &[Arc<EventSet>] {
        &self.event_sets
    }

    /// Settings for a level difficulty; errors when no settings are loaded
    pub fn settings_for(&self, difficulty: f32) -> Result<EventManagerSettings> {
        EventManagerSettings::for_difficulty(&self.settings, difficulty).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFABS_DOC: &str = r#"{
        "name": "eventprefabs",
        "children": [
            {"name": "monsterevent", "attributes": {"identifier": "crawlerswarm", "commonness": "4"}},
            {"name": "scriptedevent", "attributes": {"identifier": "distresscall"}},
            {"name": "notanevent", "attributes": {"identifier": "broken"}}
        ]
    }"#;

    const SETS_DOC: &str = r#"{
        "name": "eventsets",
        "children": [
            {"name": "eventset", "attributes": {"identifier": "openwater"}, "children": [
                {"name": "monsterevent", "attributes": {"identifier": "crawlerswarm"}}
            ]},
            {"name": "eventset", "attributes": {"identifier": "ambush"}}
        ]
    }"#;

    #[test]
    fn test_load_prefabs_skips_invalid() {
        let mut catalog = ContentCatalog::new();
        catalog.load_texts([PREFABS_DOC]).unwrap();
        assert!(catalog.prefab("crawlerswarm").is_some());
        assert!(catalog.prefab("distresscall").is_some());
        assert!(catalog.prefab("broken").is_none());
    }

    #[test]
    fn test_load_sets_resolves_references() {
        let mut catalog = ContentCatalog::new();
        catalog.load_texts([PREFABS_DOC, SETS_DOC]).unwrap();
        assert_eq!(catalog.event_sets().len(), 2);
        assert_eq!(catalog.event_sets()[0].event_prefabs.len(), 1);
        // Indices keep growing across documents of the same load
        assert_eq!(catalog.event_sets()[1].index, 1);
    }

    #[test]
    fn test_override_replaces_sets() {
        let mut catalog = ContentCatalog::new();
        catalog.load_texts([PREFABS_DOC, SETS_DOC]).unwrap();

        let override_doc = r#"{
            "name": "eventsets",
            "attributes": {"override": "true"},
            "children": [
                {"name": "eventset", "attributes": {"identifier": "replacement"}}
            ]
        }"#;
        catalog.load_texts([override_doc]).unwrap();
        assert_eq!(catalog.event_sets().len(), 1);
        assert_eq!(catalog.event_sets()[0].identifier, "replacement");
        assert_eq!(catalog.event_sets()[0].index, 0);
    }

    #[test]
    fn test_settings_fallback_to_builtin() {
        let mut catalog = ContentCatalog::new();
        assert!(catalog.settings_for(50.0).is_err());
        catalog.ensure_default_settings();
        let settings = catalog.settings_for(50.0).unwrap();
        assert_eq!(settings.identifier, "default");
    }
}
