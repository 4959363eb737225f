//! Event manager tuning settings
//!
//! Settings prefabs tune the pacing knobs of the scheduler per difficulty
//! band: the intensity ceiling under which new events may activate, how fast
//! that ceiling grows back, and the cooldown between activations.

use crate::content::element::ContentElement;
use crate::error::{EventCoreError, Result};
use once_cell::sync::Lazy;
use tracing::warn;

/// Built-in fallback used when a content package ships no settings at all
pub static DEFAULT_SETTINGS: Lazy<EventManagerSettings> = Lazy::new(|| EventManagerSettings {
    identifier: "default".to_string(),
    min_level_difficulty: 0.0,
    max_level_difficulty: 100.0,
    default_event_threshold: 0.2,
    event_threshold_increase: 0.0005,
    event_cooldown: 360.0,
});

/// Per-difficulty scheduler tuning
#[derive(Debug, Clone)]
pub struct EventManagerSettings {
    pub identifier: String,
    pub min_level_difficulty: f32,
    pub max_level_difficulty: f32,
    /// Intensity ceiling reset to on every activation
    pub default_event_threshold: f32,
    /// Ceiling growth per second while the cooldown is inactive
    pub event_threshold_increase: f32,
    /// Seconds between cooldown-triggering activations
    pub event_cooldown: f32,
}

impl EventManagerSettings {
    /// Build settings from a defining element
    pub fn from_element(element: &ContentElement) -> Result<EventManagerSettings> {
        let identifier = element.attr_ident("identifier").ok_or_else(|| {
            EventCoreError::MalformedElement {
                element: element.name.clone(),
                message: "settings element has no identifier".to_string(),
            }
        })?;

        let min_level_difficulty = element.attr_f32("minleveldifficulty", 0.0);
        let max_level_difficulty = element
            .attr_f32("maxleveldifficulty", 100.0)
            .max(min_level_difficulty);

        Ok(EventManagerSettings {
            identifier,
            min_level_difficulty,
            max_level_difficulty,
            default_event_threshold: element.attr_f32("eventthreshold", 0.2).clamp(0.0, 1.0),
            event_threshold_increase: element
                .attr_f32("eventthresholdincrease", 0.0005)
                .max(0.0),
            event_cooldown: element.attr_f32("eventcooldown", 360.0).max(0.0),
        })
    }

    /// Pick the settings matching a level difficulty.
    ///
    /// No exact match is a content error: the closest band is used and a
    /// warning logged. An empty settings list is unrecoverable for the round.
    pub fn for_difficulty(
        settings: &[EventManagerSettings],
        difficulty: f32,
    ) -> Result<&EventManagerSettings> {
        if settings.is_empty() {
            return Err(EventCoreError::NoSettingsLoaded);
        }
        if let Some(matching) = settings.iter().find(|candidate| {
            difficulty >= candidate.min_level_difficulty
                && difficulty <= candidate.max_level_difficulty
        }) {
            return Ok(matching);
        }

        warn!(
            difficulty,
            "no event manager settings match the level difficulty, using closest band"
        );
        settings
            .iter()
            .min_by(|a, b| {
                band_distance(a, difficulty)
                    .total_cmp(&band_distance(b, difficulty))
            })
            .ok_or(EventCoreError::SettingsNotFound(difficulty))
    }
}

fn band_distance(settings: &EventManagerSettings, difficulty: f32) -> f32 {
    (difficulty - settings.min_level_difficulty)
        .abs()
        .min((difficulty - settings.max_level_difficulty).abs())
}
