//! Event set tree construction
//!
//! Builds the immutable decision tree from content elements. Prefab
//! references resolve against the already-loaded prefab catalog; unresolved
//! identifiers are content errors that skip the reference without aborting
//! the parse.

use crate::content::element::ContentElement;
use crate::content::prefab::{EventPrefab, SubEventPrefab};
use crate::error::{EventCoreError, Result};
use crate::eventset::{EventSet, DEFAULT_COMMONNESS_KEY};
use crate::world::LevelType;
use ahash::AHashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, warn};

/// Flag defaults a nested set inherits from its parent when not explicitly set
#[derive(Debug, Clone, Copy, Default)]
struct InheritedDefaults {
    ignore_cooldown: bool,
    is_campaign_set: bool,
}

impl EventSet {
    /// Parse an event set tree from its defining element.
    ///
    /// `index_counter` assigns each node a stable depth-first index across
    /// the whole catalog.
    pub fn from_element(
        element: &ContentElement,
        prefabs: &AHashMap<String, Arc<EventPrefab>>,
        index_counter: &mut usize,
    ) -> Result<EventSet> {
        parse_set(element, prefabs, index_counter, InheritedDefaults::default())
    }
}

fn parse_set(
    element: &ContentElement,
    prefabs: &AHashMap<String, Arc<EventPrefab>>,
    index_counter: &mut usize,
    inherited: InheritedDefaults,
) -> Result<EventSet> {
    let index = *index_counter;
    *index_counter += 1;

    let identifier = element
        .attr_ident("identifier")
        .unwrap_or_else(|| format!("eventset{}", index));

    let per_ruin = element.attr_bool("perruin", false);
    let per_cave = element.attr_bool("percave", false);
    let per_wreck = element.attr_bool("perwreck", false);
    let per_structure = per_ruin || per_cave || per_wreck;

    // Spatially exhaustible sets default to ignoring the time-based cooldown
    let ignore_cooldown =
        element.attr_bool("ignorecooldown", per_structure || inherited.ignore_cooldown);
    let is_campaign_set = element.attr_bool("campaignset", inherited.is_campaign_set);
    let delay_when_crew_away = element.attr_bool("delaywhencrewaway", !per_structure);

    let min_level_difficulty = element.attr_f32("minleveldifficulty", 0.0);
    let max_level_difficulty = element
        .attr_f32("maxleveldifficulty", 100.0)
        .max(min_level_difficulty);
    let min_intensity = element.attr_f32("minintensity", 0.0);
    let max_intensity = element.attr_f32("maxintensity", 1.0).max(min_intensity);

    let level_type = match element.attr_ident("leveltype").as_deref() {
        None => None,
        Some("locationconnection") => Some(LevelType::LocationConnection),
        Some("outpost") => Some(LevelType::Outpost),
        Some(other) => {
            error!(set = %identifier, level_type = other, "unknown level type in event set");
            None
        }
    };

    let mut set = EventSet {
        index,
        identifier,
        min_level_difficulty,
        max_level_difficulty,
        min_intensity,
        max_intensity,
        level_type,
        biome_identifier: element.attr_ident("biome"),
        location_type_identifiers: element.attr_ident_list("locationtype"),
        faction: element.attr_ident("faction"),
        choose_random: element.attr_bool("chooserandom", false),
        event_count: element.attr_usize("eventcount", 1),
        min_distance_traveled: element.attr_f32("mindistancetraveled", 0.0).clamp(0.0, 1.0),
        min_mission_time: element.attr_f32("minmissiontime", 0.0).max(0.0),
        allow_at_start: element.attr_bool("allowatstart", false),
        ignore_cooldown,
        ignore_intensity: element.attr_bool("ignoreintensity", false),
        delay_when_crew_away,
        trigger_event_cooldown: element.attr_bool("triggereventcooldown", true),
        is_campaign_set,
        campaign_tutorial_only: element.attr_bool("campaigntutorialonly", false),
        additive: element.attr_bool("additive", false),
        exhaustible: element.attr_bool("exhaustible", false),
        compatible_with_hunting_grounds: element.attr_bool("huntinggroundscompatible", true),
        per_ruin,
        per_cave,
        per_wreck,
        reset_time: element.attr_f32("resettime", 0.0).max(0.0),
        force_at_discovered_nr: element.attr_i32_opt("forceatdiscoverednr"),
        force_at_visited_nr: element.attr_i32_opt("forceatvisitednr"),
        commonness: HashMap::new(),
        event_prefabs: Vec::new(),
        child_sets: Vec::new(),
    };

    let child_defaults = InheritedDefaults {
        ignore_cooldown: set.ignore_cooldown,
        is_campaign_set: set.is_campaign_set,
    };

    for child in &element.children {
        if child.name_is("commonness") {
            parse_commonness(child, &mut set.commonness);
        } else if child.name_is("eventset") {
            let nested = parse_set(child, prefabs, index_counter, child_defaults)?;
            set.child_sets.push(Arc::new(nested));
        } else if is_prefab_reference(child) {
            if let Some(group) = resolve_reference(child, prefabs, &set.identifier) {
                set.event_prefabs.push(group);
            }
        } else {
            match EventPrefab::from_element(child) {
                Ok(prefab) => {
                    set.event_prefabs
                        .push(SubEventPrefab::new(vec![Arc::new(prefab)], None, None));
                }
                Err(err) => {
                    // Content error: skip the definition, keep the set
                    error!(set = %set.identifier, %err, "invalid inline event prefab");
                }
            }
        }
    }

    Ok(set)
}

/// The base commonness lives under the default key; nested `override`
/// children add per-level-type keys, first occurrence per key wins.
fn parse_commonness(element: &ContentElement, commonness: &mut HashMap<String, f32>) {
    commonness
        .entry(DEFAULT_COMMONNESS_KEY.to_string())
        .or_insert_with(|| element.attr_f32("commonness", 1.0));

    for override_element in element.children_named("override") {
        let Some(key) = override_element.attr_ident("leveltype") else {
            warn!("commonness override without a level type key");
            continue;
        };
        let weight = override_element.attr_f32("commonness", 1.0);
        commonness.entry(key).or_insert(weight);
    }
}

/// A reference node lists identifiers only, with an optional shared
/// commonness/probability pair, and has no sub-elements.
fn is_prefab_reference(element: &ContentElement) -> bool {
    element.children.is_empty()
        && element.attr("identifier").is_some()
        && element
            .attributes
            .keys()
            .all(|key| {
                key.eq_ignore_ascii_case("identifier")
                    || key.eq_ignore_ascii_case("commonness")
                    || key.eq_ignore_ascii_case("probability")
            })
}

fn resolve_reference(
    element: &ContentElement,
    prefabs: &AHashMap<String, Arc<EventPrefab>>,
    set_identifier: &str,
) -> Option<SubEventPrefab> {
    let identifiers = element.attr_ident_list("identifier");
    let mut resolved = Vec::with_capacity(identifiers.len());
    for identifier in &identifiers {
        match prefabs.get(identifier) {
            Some(prefab) => resolved.push(prefab.clone()),
            None => {
                error!(
                    set = set_identifier,
                    prefab = %identifier,
                    "event set references an unknown event prefab"
                );
            }
        }
    }
    if resolved.is_empty() {
        return None;
    }
    Some(SubEventPrefab::new(
        resolved,
        element.attr_f32_opt("commonness"),
        element.attr_f32_opt("probability"),
    ))
}
