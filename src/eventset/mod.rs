//! Event set decision tree
//!
//! Event sets form a weighted, gated rule tree built once per content load.
//! Each node carries activation gates (difficulty, intensity, distance, time,
//! location filters), a commonness map keyed by generation-parameter
//! identifier, candidate prefab groups and child sets. The tree is a reusable
//! template; per-round state lives in the scheduler.

mod parser;
pub mod selection;

#[cfg(test)]
mod property_tests;

pub use selection::{select_random_events, weighted_random_index, SelectionContext};

use crate::content::prefab::SubEventPrefab;
use crate::world::{Level, LevelData, LevelType, Location};
use std::collections::HashMap;
use std::sync::Arc;

/// Commonness map key used when no per-level-type override applies
pub const DEFAULT_COMMONNESS_KEY: &str = "";

/// One node of the decision tree
#[derive(Debug, Clone)]
pub struct EventSet {
    /// Stable index within the catalog, assigned depth-first at parse time.
    /// Used as the non-owning bookkeeping key for materialized instances.
    pub index: usize,
    pub identifier: String,

    pub min_level_difficulty: f32,
    pub max_level_difficulty: f32,
    pub min_intensity: f32,
    pub max_intensity: f32,

    pub level_type: Option<LevelType>,
    pub biome_identifier: Option<String>,
    pub location_type_identifiers: Vec<String>,
    pub faction: Option<String>,

    /// Exclusive weighted pick among candidates vs. activate every qualifying one
    pub choose_random: bool,
    /// How many weighted picks a choose-random set makes
    pub event_count: usize,

    pub min_distance_traveled: f32,
    pub min_mission_time: f32,
    pub allow_at_start: bool,
    pub ignore_cooldown: bool,
    pub ignore_intensity: bool,
    pub delay_when_crew_away: bool,
    pub trigger_event_cooldown: bool,

    pub is_campaign_set: bool,
    pub campaign_tutorial_only: bool,
    /// Additive sets layer on top of a second, independent top-level selection
    pub additive: bool,
    /// Exhaustible sets stop producing once the level's events are exhausted
    pub exhaustible: bool,
    pub compatible_with_hunting_grounds: bool,

    pub per_ruin: bool,
    pub per_cave: bool,
    pub per_wreck: bool,

    /// Seconds after the last instance finishes before the set re-queues,
    /// 0 disables repetition
    pub reset_time: f32,
    pub force_at_discovered_nr: Option<i32>,
    pub force_at_visited_nr: Option<i32>,

    /// Selection weight per generation-parameter key, default under `""`
    pub commonness: HashMap<String, f32>,
    pub event_prefabs: Vec<SubEventPrefab>,
    pub child_sets: Vec<Arc<EventSet>>,
}

impl EventSet {
    /// Commonness resolved by the level's generation-parameter key, falling
    /// back to the default key
    pub fn get_commonness(&self, level: &Level) -> f32 {
        self.commonness
            .get(&level.generation_params)
            .or_else(|| self.commonness.get(DEFAULT_COMMONNESS_KEY))
            .copied()
            .unwrap_or(1.0)
    }

    /// Is this set scoped to individual ruins, caves or wrecks?
    pub fn per_structure(&self) -> bool {
        self.per_ruin || self.per_cave || self.per_wreck
    }

    /// Difficulty, level-type and biome gates (selection step 1)
    pub fn matches_level(&self, level: &Level) -> bool {
        if level.difficulty < self.min_level_difficulty
            || level.difficulty > self.max_level_difficulty
        {
            return false;
        }
        if let Some(level_type) = self.level_type {
            if level_type != level.level_type {
                return false;
            }
        }
        if let Some(ref biome) = self.biome_identifier {
            if *biome != level.biome_identifier {
                return false;
            }
        }
        true
    }

    /// Faction and location-type gates (selection step 3). A set without a
    /// location-type restriction only passes where generic events are allowed.
    pub fn matches_location(&self, location: &Location) -> bool {
        if let Some(ref faction) = self.faction {
            let primary = location.faction.as_deref() == Some(faction.as_str());
            let secondary = location.secondary_faction.as_deref() == Some(faction.as_str());
            if !primary && !secondary {
                return false;
            }
        }
        if self.location_type_identifiers.is_empty() {
            location.allow_generic_events
        } else {
            self.location_type_identifiers
                .iter()
                .any(|ident| *ident == location.location_type)
        }
    }

    /// Full validity check used when recursing into activate-all children
    pub fn valid_for(&self, level: &Level, location: &Location) -> bool {
        self.matches_level(level) && self.matches_location(location)
    }

    /// How many independent materialization passes this set makes for the
    /// level, with the structure indices each pass is restricted to.
    /// One unrestricted pass normally; one per ruin / cave / not-yet-defeated
    /// wreck when the matching flag is set.
    pub fn apply_passes(&self, level: &Level) -> Vec<Option<usize>> {
        if self.per_ruin {
            (0..level.ruin_count).map(Some).collect()
        } else if self.per_cave {
            (0..level.cave_count).map(Some).collect()
        } else if self.per_wreck {
            level
                .wrecks
                .iter()
                .enumerate()
                .filter(|(_, wreck)| !wreck.defeated)
                .map(|(i, _)| Some(i))
                .collect()
        } else {
            vec![None]
        }
    }
}

/// Effective selection weight of a prefab for this level:
/// 0 for non-repeatable identifiers, 0.1 x base for identifiers already in
/// the event history, base otherwise
pub fn calculate_commonness(base: f32, identifier: &str, level_data: &LevelData) -> f32 {
    if level_data.non_repeatable_events.contains(identifier) {
        return 0.0;
    }
    if level_data.has_seen(identifier) {
        return base * 0.1;
    }
    base
}

/// Blank permissive set for tests across the crate
#[cfg(test)]
pub(crate) fn test_set(index: usize) -> EventSet {
    EventSet {
        index,
        identifier: format!("set{}", index),
        min_level_difficulty: 0.0,
        max_level_difficulty: 100.0,
        min_intensity: 0.0,
        max_intensity: 1.0,
        level_type: None,
        biome_identifier: None,
        location_type_identifiers: Vec::new(),
        faction: None,
        choose_random: false,
        event_count: 1,
        min_distance_traveled: 0.0,
        min_mission_time: 0.0,
        allow_at_start: false,
        ignore_cooldown: false,
        ignore_intensity: false,
        delay_when_crew_away: true,
        trigger_event_cooldown: true,
        is_campaign_set: false,
        campaign_tutorial_only: false,
        additive: false,
        exhaustible: false,
        compatible_with_hunting_grounds: true,
        per_ruin: false,
        per_cave: false,
        per_wreck: false,
        reset_time: 0.0,
        force_at_discovered_nr: None,
        force_at_visited_nr: None,
        commonness: HashMap::new(),
        event_prefabs: Vec::new(),
        child_sets: Vec::new(),
    }
}
