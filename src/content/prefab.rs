//! Event prefab definitions
//!
//! A prefab is the immutable template for one concrete event. Prefabs are
//! created once at content load and shared by reference; event instances
//! never mutate them.

use crate::content::element::ContentElement;
use crate::error::{EventCoreError, Result};
use std::sync::Arc;

/// Closed set of implemented event kinds, resolved from the element tag.
///
/// Data-driven extensibility stays string-keyed at the content boundary, but
/// dispatch inside the engine is a plain enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Monster,
    Scripted,
    Malfunction,
    Artifact,
}

impl EventKind {
    /// Resolve a content element tag to an event kind
    pub fn from_tag(tag: &str) -> Option<EventKind> {
        match tag.to_ascii_lowercase().as_str() {
            "monsterevent" => Some(EventKind::Monster),
            "scriptedevent" => Some(EventKind::Scripted),
            "malfunctionevent" => Some(EventKind::Malfunction),
            "artifactevent" => Some(EventKind::Artifact),
            _ => None,
        }
    }

    /// Canonical element tag for this kind
    pub fn tag(&self) -> &'static str {
        match self {
            EventKind::Monster => "monsterevent",
            EventKind::Scripted => "scriptedevent",
            EventKind::Malfunction => "malfunctionevent",
            EventKind::Artifact => "artifactevent",
        }
    }
}

/// Immutable description of one event type
#[derive(Debug, Clone)]
pub struct EventPrefab {
    pub identifier: String,
    pub kind: EventKind,
    /// Relative selection weight among sibling candidates
    pub commonness: f32,
    /// Independent roll gate in [0,1], applied before instantiation
    pub probability: f32,
    pub biome_identifier: Option<String>,
    pub faction: Option<String>,
    /// Cap on instances materialized per level, unlimited when `None`
    pub max_per_level: Option<u32>,
    /// Never re-rolled in the same level once it has run
    pub non_repeatable: bool,
    /// Whether activating an instance of this prefab may start the global
    /// event cooldown. Defaults true only for scripted events; the set-level
    /// flag must also agree.
    pub trigger_event_cooldown: bool,
    /// External content descriptors to preload before the round begins
    pub preload_files: Vec<String>,
    /// Defining element, retained for kind-specific instance construction
    pub payload: ContentElement,
}

impl EventPrefab {
    /// Build a prefab from its defining element
    pub fn from_element(element: &ContentElement) -> Result<EventPrefab> {
        let kind = EventKind::from_tag(&element.name)
            .ok_or_else(|| EventCoreError::UnknownEventKind(element.name.clone()))?;
        let identifier = element.attr_ident("identifier").ok_or_else(|| {
            EventCoreError::MalformedElement {
                element: element.name.clone(),
                message: "event prefab has no identifier".to_string(),
            }
        })?;

        let preload_files = element
            .attr("preloadfiles")
            .map(|value| {
                value
                    .split(',')
                    .map(|part| part.trim().to_string())
                    .filter(|part| !part.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(EventPrefab {
            identifier,
            kind,
            commonness: element.attr_f32("commonness", 1.0).max(0.0),
            probability: element.attr_f32("probability", 1.0).clamp(0.0, 1.0),
            biome_identifier: element.attr_ident("biome"),
            faction: element.attr_ident("faction"),
            max_per_level: element
                .attr_i32_opt("maxperlevel")
                .filter(|count| *count >= 0)
                .map(|count| count as u32),
            non_repeatable: element.attr_bool("nonrepeatable", false),
            trigger_event_cooldown: element
                .attr_bool("triggereventcooldown", kind == EventKind::Scripted),
            preload_files,
            payload: element.clone(),
        })
    }
}

/// A resolved group of prefabs sharing one commonness/probability pair.
///
/// An event set option may list several identifiers ("pick any of these as a
/// single weighted choice"); the group weight comes from explicit attributes
/// when present, else from the referenced prefabs' own defaults.
#[derive(Debug, Clone)]
pub struct SubEventPrefab {
    pub prefabs: Vec<Arc<EventPrefab>>,
    pub commonness: Option<f32>,
    pub probability: Option<f32>,
}

impl SubEventPrefab {
    pub fn new(
        prefabs: Vec<Arc<EventPrefab>>,
        commonness: Option<f32>,
        probability: Option<f32>,
    ) -> Self {
        Self {
            prefabs,
            commonness,
            probability,
        }
    }

    /// Group commonness: explicit attribute, else the first prefab's default
    pub fn commonness(&self) -> f32 {
        self.commonness
            .or_else(|| self.prefabs.first().map(|prefab| prefab.commonness))
            .unwrap_or(0.0)
    }

    /// Group probability: explicit attribute, else the first prefab's default
    pub fn probability(&self) -> f32 {
        self.probability
            .or_else(|| self.prefabs.first().map(|prefab| prefab.probability))
            .unwrap_or(0.0)
            .clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monster_element() -> ContentElement {
        ContentElement::parse_document(
            r#"{
                "name": "MonsterEvent",
                "attributes": {
                    "identifier": "crawlerswarm",
                    "commonness": "4",
                    "probability": "0.5",
                    "biome": "ColdCaverns",
                    "preloadfiles": "Content/Characters/Crawler.xml"
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_prefab_from_element() {
        let prefab = EventPrefab::from_element(&monster_element()).unwrap();
        assert_eq!(prefab.identifier, "crawlerswarm");
        assert_eq!(prefab.kind, EventKind::Monster);
        assert_eq!(prefab.commonness, 4.0);
        assert_eq!(prefab.probability, 0.5);
        assert_eq!(prefab.biome_identifier.as_deref(), Some("coldcaverns"));
        assert_eq!(prefab.preload_files.len(), 1);
        // Only scripted events request cooldown by default
        assert!(!prefab.trigger_event_cooldown);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let element = ContentElement {
            name: "dancepartyevent".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            EventPrefab::from_element(&element),
            Err(EventCoreError::UnknownEventKind(_))
        ));
    }

    #[test]
    fn test_missing_identifier_rejected() {
        let element = ContentElement {
            name: "monsterevent".to_string(),
            ..Default::default()
        };
        assert!(EventPrefab::from_element(&element).is_err());
    }

    #[test]
    fn test_sub_event_prefab_defaults() {
        let prefab = Arc::new(EventPrefab::from_element(&monster_element()).unwrap());
        let group = SubEventPrefab::new(vec![prefab.clone()], None, None);
        assert_eq!(group.commonness(), 4.0);
        assert_eq!(group.probability(), 0.5);

        let overridden = SubEventPrefab::new(vec![prefab], Some(1.5), Some(1.0));
        assert_eq!(overridden.commonness(), 1.5);
        assert_eq!(overridden.probability(), 1.0);
    }
}
