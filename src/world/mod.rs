//! Session-boundary world model
//!
//! Read-only views of the simulated world consumed by the scheduler and the
//! intensity estimator each tick, plus the per-level record the scheduler
//! writes its history into. The engine never owns the world; the session
//! controller assembles a [`WorldSnapshot`] per tick from whatever physics
//! and character state it keeps.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

/// Display units to real-world meters (100 display units per meter)
pub const DISPLAY_TO_REAL_WORLD_RATIO: f32 = 0.01;

/// Bounded length of the per-level event history
pub const MAX_EVENT_HISTORY: usize = 20;

/// 2D world position in display units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Vec2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Kind of level the round takes place in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelType {
    /// A passage between two locations, the normal play space
    LocationConnection,
    /// A level generated around a single outpost
    Outpost,
}

/// Spatial region a spawn position belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionType {
    MainPath,
    Cave,
    Ruin,
    Wreck,
}

/// One candidate spawn position inside the level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub position: Vec2,
    pub region: RegionType,
    /// Index of the cave/ruin/wreck this point belongs to, `None` on the main path
    pub region_index: Option<usize>,
}

/// A wreck present in the level
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Wreck {
    /// Defeated wrecks no longer receive per-wreck events
    pub defeated: bool,
}

/// Immutable description of the generated level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    pub seed: String,
    /// 0..100
    pub difficulty: f32,
    pub level_type: LevelType,
    /// Generation-parameter identifier, used as the commonness key
    pub generation_params: String,
    pub biome_identifier: String,
    pub start_position: Vec2,
    pub end_position: Vec2,
    pub ruin_count: usize,
    pub cave_count: usize,
    pub wrecks: Vec<Wreck>,
    pub spawn_points: Vec<SpawnPoint>,
    /// Hunting-grounds levels exclude incompatible sets outright
    pub hunting_grounds: bool,
}

impl Level {
    /// Minimal level for tests and benchmarks
    pub fn test_level(seed: &str, difficulty: f32) -> Level {
        Level {
            seed: seed.to_string(),
            difficulty,
            level_type: LevelType::LocationConnection,
            generation_params: String::new(),
            biome_identifier: String::new(),
            start_position: Vec2::default(),
            end_position: Vec2::new(100_000.0, 0.0),
            ruin_count: 0,
            cave_count: 0,
            wrecks: Vec::new(),
            spawn_points: Vec::new(),
            hunting_grounds: false,
        }
    }
}

/// Mutable per-level record owned by the session, fed back into selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LevelData {
    /// Most recent completed event identifiers, oldest first, capped at
    /// [`MAX_EVENT_HISTORY`]
    pub event_history: Vec<String>,
    /// Identifiers that may never run again in this level
    pub non_repeatable_events: AHashSet<String>,
    /// Materialization counts per prefab, for per-level caps
    pub event_counts: AHashMap<String, u32>,
    /// Exhaustible sets stop producing events once this is set
    pub events_exhausted: bool,
}

impl LevelData {
    /// Append an identifier to the history, trimming the oldest past the cap
    pub fn add_to_history(&mut self, identifier: &str) {
        self.event_history.push(identifier.to_string());
        while self.event_history.len() > MAX_EVENT_HISTORY {
            self.event_history.remove(0);
        }
    }

    pub fn has_seen(&self, identifier: &str) -> bool {
        self.event_history.iter().any(|seen| seen == identifier)
    }

    pub fn count_of(&self, identifier: &str) -> u32 {
        self.event_counts.get(identifier).copied().unwrap_or(0)
    }

    pub fn record_materialized(&mut self, identifier: &str) {
        *self.event_counts.entry(identifier.to_string()).or_insert(0) += 1;
    }
}

/// The location the round starts from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Location {
    pub faction: Option<String>,
    pub secondary_faction: Option<String>,
    pub location_type: String,
    /// How many locations had been discovered when this one was, if known
    pub discovery_index: Option<i32>,
    /// How many locations had been visited when this one was, if known
    pub visit_index: Option<i32>,
    /// Whether sets without a location-type restriction may run here
    pub allow_generic_events: bool,
}

/// Kind of session the round runs under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionKind {
    SinglePlayerCampaign { tutorial_enabled: bool },
    MultiplayerCampaign,
    Mission,
}

impl SessionKind {
    pub fn is_campaign(&self) -> bool {
        matches!(
            self,
            SessionKind::SinglePlayerCampaign { .. } | SessionKind::MultiplayerCampaign
        )
    }

    /// Campaign-tutorial-only sets require a single-player campaign with
    /// tutorials enabled
    pub fn is_tutorial_campaign(&self) -> bool {
        matches!(
            self,
            SessionKind::SinglePlayerCampaign {
                tutorial_enabled: true
            }
        )
    }
}

/// One crew or remote-player character, as the estimator sees it
#[derive(Debug, Clone, Copy, Default)]
pub struct CrewStatus {
    pub vitality: f32,
    pub max_vitality: f32,
    pub unconscious: bool,
    pub npc: bool,
    pub dead: bool,
}

/// One room of the player submarine
#[derive(Debug, Clone, Copy, Default)]
pub struct RoomStatus {
    pub water_volume: f32,
    pub volume: f32,
    /// Ballast and other always-wet rooms are excluded from flooding
    pub wet: bool,
    pub player_owned: bool,
}

/// One hostile character
#[derive(Debug, Clone, Copy, Default)]
pub struct EnemyStatus {
    pub combat_strength: f32,
    pub inside_player_sub: bool,
    pub targeting_player_sub: bool,
    pub active: bool,
}

/// Read-only view of the world assembled by the session controller per tick
#[derive(Debug, Clone, Default)]
pub struct WorldSnapshot {
    pub crew: Vec<CrewStatus>,
    pub rooms: Vec<RoomStatus>,
    /// Sum of open gap sizes relative to hull size
    pub total_open_gap_fraction: f32,
    /// Widths of active fire sources, in display units
    pub fire_widths: Vec<f32>,
    pub enemies: Vec<EnemyStatus>,
    /// Enemy submarines crewed by hostile humans within sonar range
    pub hostile_submarines_in_sonar_range: usize,
    pub player_submarine_positions: Vec<Vec2>,
    /// Fraction of the level path traveled, 0..1
    pub distance_traveled: f32,
    /// Seconds since the round started
    pub mission_time: f32,
    /// True while the whole crew is away from the submarine
    pub crew_away: bool,
    /// Seed identifiers of spawned characters that have died
    pub dead_characters: AHashSet<String>,
    /// Identifiers of items delivered inside the player submarine
    pub delivered_items: AHashSet<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_cap() {
        let mut data = LevelData::default();
        for i in 0..25 {
            data.add_to_history(&format!("event{}", i));
        }
        assert_eq!(data.event_history.len(), MAX_EVENT_HISTORY);
        // Oldest entries trimmed first
        assert_eq!(data.event_history[0], "event5");
        assert!(data.has_seen("event24"));
        assert!(!data.has_seen("event4"));
    }

    #[test]
    fn test_level_data_serde_round_trip() {
        let mut data = LevelData::default();
        data.add_to_history("distresscall");
        data.non_repeatable_events.insert("ambush".to_string());
        data.record_materialized("husk");
        data.events_exhausted = true;

        let json = serde_json::to_string(&data).unwrap();
        let restored: LevelData = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.event_history, vec!["distresscall".to_string()]);
        assert!(restored.non_repeatable_events.contains("ambush"));
        assert_eq!(restored.count_of("husk"), 1);
        assert!(restored.events_exhausted);
    }

    #[test]
    fn test_materialization_counts() {
        let mut data = LevelData::default();
        assert_eq!(data.count_of("husk"), 0);
        data.record_materialized("husk");
        data.record_materialized("husk");
        assert_eq!(data.count_of("husk"), 2);
    }

    #[test]
    fn test_session_kind() {
        assert!(SessionKind::SinglePlayerCampaign {
            tutorial_enabled: true
        }
        .is_tutorial_campaign());
        assert!(!SessionKind::MultiplayerCampaign.is_tutorial_campaign());
        assert!(SessionKind::MultiplayerCampaign.is_campaign());
        assert!(!SessionKind::Mission.is_campaign());
    }

    #[test]
    fn test_distance() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(3.0, 4.0);
        assert_eq!(a.distance(b), 5.0);
    }
}
