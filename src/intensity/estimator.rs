//! Intensity estimator
//!
//! Samples the world on a fixed interval and folds crew health, hull
//! integrity, flooding, fire and enemy threat into one normalized scalar.
//! Two trackers follow the sampled target at different speeds: the gameplay
//! tracker rises slowly and decays much slower still, so event gating reacts
//! conservatively; the music tracker moves symmetrically and fast enough for
//! the ambience layer to feel responsive.

use crate::world::WorldSnapshot;

/// Seconds between world samples
pub const UPDATE_INTERVAL: f32 = 5.0;

/// Gameplay tracker rise rate per second (full range in ~25s)
pub const CURRENT_RISE_RATE: f32 = 0.04;
/// Gameplay tracker decay rate per second (full range in ~400s)
pub const CURRENT_DECAY_RATE: f32 = 0.0025;
/// Music tracker rate per second, symmetric (full range in ~20s)
pub const MUSIC_RATE: f32 = 0.05;

#[derive(Debug, Clone, Default)]
pub struct IntensityEstimator {
    update_timer: f32,
    target_intensity: f32,
    current_intensity: f32,
    music_intensity: f32,
}

impl IntensityEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intensity consumed by event gating, [0,1]
    #[inline]
    pub fn current_intensity(&self) -> f32 {
        self.current_intensity
    }

    /// Intensity consumed by the ambience/music layer, [0,1]
    #[inline]
    pub fn music_intensity(&self) -> f32 {
        self.music_intensity
    }

    /// Most recently sampled target, [0,1]
    #[inline]
    pub fn target_intensity(&self) -> f32 {
        self.target_intensity
    }

    /// Advance the estimator. Trackers only move when the accumulated time
    /// crosses the sampling interval; smaller steps leave them untouched.
    pub fn update(&mut self, delta_time: f32, world: &WorldSnapshot) {
        self.update_timer -= delta_time;
        if self.update_timer > 0.0 {
            return;
        }
        self.update_timer = UPDATE_INTERVAL;

        self.target_intensity = calculate_target_intensity(world);

        self.current_intensity = step_towards(
            self.current_intensity,
            self.target_intensity,
            CURRENT_RISE_RATE * UPDATE_INTERVAL,
            CURRENT_DECAY_RATE * UPDATE_INTERVAL,
        );
        self.music_intensity = step_towards(
            self.music_intensity,
            self.target_intensity,
            MUSIC_RATE * UPDATE_INTERVAL,
            MUSIC_RATE * UPDATE_INTERVAL,
        );
    }
}

fn step_towards(value: f32, target: f32, rise_step: f32, fall_step: f32) -> f32 {
    if value < target {
        (value + rise_step).min(target)
    } else {
        (value - fall_step).max(target)
    }
    .clamp(0.0, 1.0)
}

/// Fold the raw world signals into one scalar
pub fn calculate_target_intensity(world: &WorldSnapshot) -> f32 {
    let avg_crew_health = average_crew_health(world);
    let avg_hull_integrity = (1.0 - world.total_open_gap_fraction / 10.0).clamp(0.0, 1.0);
    let flooding = flooding_amount(world);
    let fire = fire_amount(world);
    let enemy_danger = enemy_danger(world);

    let intensity = ((1.0 - avg_crew_health) + (1.0 - avg_hull_integrity) + flooding) / 3.0
        + fire * 0.5
        + enemy_danger;
    intensity.clamp(0.0, 1.0)
}

/// Mean vitality fraction over living, non-NPC characters, halved while
/// unconscious; 0.5 when nobody qualifies
fn average_crew_health(world: &WorldSnapshot) -> f32 {
    let mut total = 0.0;
    let mut count = 0;
    for character in &world.crew {
        if character.dead || character.npc || character.max_vitality <= 0.0 {
            continue;
        }
        let mut health = (character.vitality / character.max_vitality).clamp(0.0, 1.0);
        if character.unconscious {
            health *= 0.5;
        }
        total += health;
        count += 1;
    }
    if count == 0 {
        0.5
    } else {
        total / count as f32
    }
}

/// Enemies inside the submarine weigh 10x more than ones merely targeting it;
/// the flat per-submarine term models hostile boats on sonar. The secondary
/// active-monster term intentionally double-counts: being near costs less
/// per-unit than being targeted, modeling parallel threats.
fn enemy_danger(world: &WorldSnapshot) -> f32 {
    let mut danger = 0.0;
    for enemy in &world.enemies {
        if enemy.inside_player_sub {
            danger += enemy.combat_strength / 500.0;
        } else if enemy.targeting_player_sub {
            danger += enemy.combat_strength / 5000.0;
        }
    }
    danger += 0.2 * world.hostile_submarines_in_sonar_range as f32;
    danger = danger.clamp(0.0, 1.0);

    let total_monster_strength: f32 = world
        .enemies
        .iter()
        .filter(|enemy| enemy.active)
        .map(|enemy| enemy.combat_strength)
        .sum();
    (danger + total_monster_strength / 5000.0).clamp(0.0, 1.0)
}

/// Water volume over dry-room volume for player-owned rooms; readings under
/// 0.1 are treated as normal ballast operation
fn flooding_amount(world: &WorldSnapshot) -> f32 {
    let mut water = 0.0;
    let mut volume = 0.0;
    for room in &world.rooms {
        if !room.player_owned || room.wet || room.volume <= 0.0 {
            continue;
        }
        water += room.water_volume;
        volume += room.volume;
    }
    if volume <= 0.0 {
        return 0.0;
    }
    let amount = water / volume;
    if amount < 0.1 {
        0.0
    } else {
        (amount * 1.5).clamp(0.0, 1.0)
    }
}

/// Total fire-source width scaled down, floored at 0.2 once anything burns
fn fire_amount(world: &WorldSnapshot) -> f32 {
    if world.fire_widths.is_empty() {
        return 0.0;
    }
    let total_width: f32 = world.fire_widths.iter().sum();
    (total_width / 1000.0).clamp(0.2, 1.0)
}
