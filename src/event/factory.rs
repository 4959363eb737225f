//! Behavior construction
//!
//! Resolves a prefab's payload element into the concrete behavior for its
//! kind. All kind-specific attribute parsing lives here so the instance
//! types stay plain state machines.

use crate::content::element::ContentElement;
use crate::content::prefab::{EventKind, EventPrefab};
use crate::error::{EventCoreError, Result};
use crate::event::artifact::ArtifactEvent;
use crate::event::malfunction::MalfunctionEvent;
use crate::event::monster::MonsterEvent;
use crate::event::scripted::{ScriptedAction, ScriptedEvent};
use crate::event::EventBehavior;
use crate::world::RegionType;

/// Default minimum spawn distance from player submarines, display units
const DEFAULT_SPAWN_DISTANCE: f32 = 8_000.0;

/// Build the behavior for one instance of `prefab`. `spawn_filter` pins
/// position searches to one structure index for per-ruin/cave/wreck sets.
pub fn build_behavior(
    prefab: &EventPrefab,
    seed: u64,
    spawn_filter: Option<usize>,
) -> Result<EventBehavior> {
    let payload = &prefab.payload;
    match prefab.kind {
        EventKind::Monster => {
            let species = payload
                .attr_ident("character")
                .or_else(|| payload.attr_ident("species"))
                .ok_or_else(|| EventCoreError::MalformedElement {
                    element: payload.name.clone(),
                    message: format!("monster event '{}' has no character", prefab.identifier),
                })?;
            let (min_amount, max_amount) = amount_range(payload);
            Ok(EventBehavior::Monster(MonsterEvent::new(
                species,
                min_amount,
                max_amount,
                spawn_region(payload),
                spawn_filter,
                payload.attr_f32("spawndistance", DEFAULT_SPAWN_DISTANCE).max(0.0),
                payload.attr_f32("resettime", 0.0).max(0.0),
                seed,
            )))
        }
        EventKind::Scripted => {
            let actions = payload
                .children_named("action")
                .filter_map(ScriptedAction::from_element)
                .collect();
            Ok(EventBehavior::Scripted(ScriptedEvent::new(actions)))
        }
        EventKind::Malfunction => Ok(EventBehavior::Malfunction(MalfunctionEvent::new(
            payload
                .attr_ident("itemtag")
                .unwrap_or_else(|| "junctionbox".to_string()),
            payload.attr_f32("delay", 60.0),
        ))),
        EventKind::Artifact => {
            let item_identifier = payload.attr_ident("item").ok_or_else(|| {
                EventCoreError::MalformedElement {
                    element: payload.name.clone(),
                    message: format!("artifact event '{}' has no item", prefab.identifier),
                }
            })?;
            Ok(EventBehavior::Artifact(ArtifactEvent::new(
                item_identifier,
                spawn_region(payload),
                spawn_filter,
                seed,
            )))
        }
    }
}

fn amount_range(payload: &ContentElement) -> (u32, u32) {
    let base = payload.attr_i32("amount", 1).max(0) as u32;
    let min = payload
        .attr_i32_opt("minamount")
        .map(|value| value.max(0) as u32)
        .unwrap_or(base);
    let max = payload
        .attr_i32_opt("maxamount")
        .map(|value| value.max(0) as u32)
        .unwrap_or(base)
        .max(min);
    (min, max)
}

fn spawn_region(payload: &ContentElement) -> RegionType {
    match payload.attr_ident("spawnregion").as_deref() {
        Some("cave") => RegionType::Cave,
        Some("ruin") => RegionType::Ruin,
        Some("wreck") => RegionType::Wreck,
        _ => RegionType::MainPath,
    }
}
