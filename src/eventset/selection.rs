//! Weighted branch selection
//!
//! Roulette-wheel selection over event set candidates, after a pipeline of
//! hard filters. The single remaining candidate fast path consumes no
//! entropy, keeping branch selection reproducible for a given level seed and
//! history.

use crate::eventset::EventSet;
use crate::world::{Level, Location, SessionKind};
use rand::Rng;
use std::sync::Arc;
use tracing::warn;

/// Inputs the selection filters run against
pub struct SelectionContext<'a> {
    pub level: &'a Level,
    pub location: &'a Location,
    pub session: SessionKind,
}

/// Weighted random index pick, `None` for empty input or all-zero weights
pub fn weighted_random_index(weights: &[f32], rng: &mut impl Rng) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }

    let total_weight: f32 = weights.iter().sum();
    if total_weight <= 0.0 {
        return None;
    }

    let mut random_value = rng.gen::<f32>() * total_weight;
    for (index, weight) in weights.iter().enumerate() {
        random_value -= weight;
        if random_value <= 0.0 {
            return Some(index);
        }
    }

    // Fallback to last item
    Some(weights.len() - 1)
}

/// Select one event set among the candidates.
///
/// Filter pipeline: difficulty/level-type/biome, campaign requirement (with
/// fallback), location faction/type, tutorial-only, forced
/// discovery/visit-index handling. A single surviving candidate is returned
/// directly; otherwise a commonness-weighted roulette pick decides.
pub fn select_random_events(
    sets: &[Arc<EventSet>],
    require_campaign_set: Option<bool>,
    ctx: &SelectionContext<'_>,
    rng: &mut impl Rng,
) -> Option<Arc<EventSet>> {
    let mut candidates: Vec<&Arc<EventSet>> = sets
        .iter()
        .filter(|set| set.matches_level(ctx.level))
        .collect();

    if let Some(required) = require_campaign_set {
        let matching: Vec<&Arc<EventSet>> = candidates
            .iter()
            .copied()
            .filter(|set| set.is_campaign_set == required)
            .collect();
        if matching.is_empty() {
            warn!(
                required,
                "no event sets satisfy the campaign requirement, falling back to all candidates"
            );
        } else {
            candidates = matching;
        }
    }

    candidates.retain(|set| set.matches_location(ctx.location));

    if !ctx.session.is_tutorial_campaign() {
        candidates.retain(|set| !set.campaign_tutorial_only);
    }

    // Sets forced to a specific discovery/visit index either monopolize the
    // pick at that index or are excluded entirely
    let forced: Vec<&Arc<EventSet>> = candidates
        .iter()
        .copied()
        .filter(|set| is_forced_here(set, ctx.location))
        .collect();
    if forced.is_empty() {
        candidates
            .retain(|set| set.force_at_discovered_nr.is_none() && set.force_at_visited_nr.is_none());
    } else {
        candidates = forced;
    }

    match candidates.len() {
        0 => None,
        1 => Some(candidates[0].clone()),
        _ => {
            let weights: Vec<f32> = candidates
                .iter()
                .map(|set| set.get_commonness(ctx.level))
                .collect();
            weighted_random_index(&weights, rng).map(|index| candidates[index].clone())
        }
    }
}

fn is_forced_here(set: &EventSet, location: &Location) -> bool {
    let discovered = set.force_at_discovered_nr.is_some()
        && set.force_at_discovered_nr == location.discovery_index;
    let visited =
        set.force_at_visited_nr.is_some() && set.force_at_visited_nr == location.visit_index;
    discovered || visited
}
