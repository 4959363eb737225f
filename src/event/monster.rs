//! Monster spawn event
//!
//! Searches for a spawn position inside the allowed region, far enough from
//! every player submarine, then spawns its monsters staggered over a short
//! window and waits for all of them to die. An optional reset timer respawns
//! the wave instead of finishing.

use crate::event::{DelayQueue, EventContext, SpawnCommand};
use crate::world::{RegionType, SpawnPoint, Vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Seconds between consecutive spawns of one wave
const SPAWN_STAGGER: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MonsterState {
    FindSpawnPos,
    PendingSpawn,
    Active,
}

#[derive(Debug)]
pub struct MonsterEvent {
    species: String,
    min_amount: u32,
    max_amount: u32,
    spawn_region: RegionType,
    /// Structure index restriction from per-ruin/cave/wreck materialization
    spawn_filter: Option<usize>,
    /// Minimum distance from every player submarine, display units
    spawn_distance: f32,
    /// Seconds after the wave dies before respawning, 0 finishes instead
    reset_time: f32,
    state: MonsterState,
    spawn_queue: DelayQueue<SpawnCommand>,
    /// Seed identifiers of every character spawned so far
    monsters: Vec<String>,
    /// Monotonic spawn index, keeps respawn seeds distinct
    spawned_total: u32,
    reset_timer: f32,
    rng: StdRng,
}

impl MonsterEvent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        species: String,
        min_amount: u32,
        max_amount: u32,
        spawn_region: RegionType,
        spawn_filter: Option<usize>,
        spawn_distance: f32,
        reset_time: f32,
        seed: u64,
    ) -> MonsterEvent {
        MonsterEvent {
            species,
            min_amount,
            max_amount: max_amount.max(min_amount),
            spawn_region,
            spawn_filter,
            spawn_distance,
            reset_time,
            state: MonsterState::FindSpawnPos,
            spawn_queue: DelayQueue::default(),
            monsters: Vec::new(),
            spawned_total: 0,
            reset_timer: 0.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn monsters(&self) -> &[String] {
        &self.monsters
    }

    #[cfg(test)]
    pub(crate) fn spawn_filter(&self) -> Option<usize> {
        self.spawn_filter
    }

    /// Returns true once the event has run to completion
    pub fn update(&mut self, delta_time: f32, ctx: &mut EventContext<'_>) -> bool {
        match self.state {
            MonsterState::FindSpawnPos => self.find_spawn_pos(ctx),
            MonsterState::PendingSpawn => {
                for command in self.spawn_queue.tick(delta_time) {
                    self.monsters.push(command.character_seed.clone());
                    ctx.outbox.spawns.push(command);
                }
                if self.spawn_queue.is_empty() {
                    self.state = MonsterState::Active;
                }
                false
            }
            MonsterState::Active => self.wait_for_wave(delta_time, ctx),
        }
    }

    fn find_spawn_pos(&mut self, ctx: &mut EventContext<'_>) -> bool {
        let candidates: Vec<&SpawnPoint> = ctx
            .level
            .spawn_points
            .iter()
            .filter(|point| point.region == self.spawn_region)
            .filter(|point| {
                self.spawn_filter.is_none() || point.region_index == self.spawn_filter
            })
            .collect();

        if candidates.is_empty() {
            // No position can ever satisfy the region constraint
            debug!(species = %self.species, "no spawn positions in the allowed region, finishing");
            return true;
        }

        let valid: Vec<&&SpawnPoint> = candidates
            .iter()
            .filter(|point| self.far_enough(point.position, ctx))
            .collect();
        if valid.is_empty() {
            // Positions exist but the players are too close, retry later
            return false;
        }

        let position = valid[self.rng.gen_range(0..valid.len())].position;
        let amount = if self.max_amount > self.min_amount {
            self.rng.gen_range(self.min_amount..=self.max_amount)
        } else {
            self.min_amount
        };
        for i in 0..amount {
            let index = self.spawned_total + i;
            self.spawn_queue.push(
                i as f32 * SPAWN_STAGGER,
                SpawnCommand {
                    character_seed: format!("{}-{}-{}", ctx.level.seed, self.species, index),
                    species: self.species.clone(),
                    position,
                },
            );
        }
        self.spawned_total += amount;
        self.state = MonsterState::PendingSpawn;
        false
    }

    fn far_enough(&self, position: Vec2, ctx: &EventContext<'_>) -> bool {
        ctx.world
            .player_submarine_positions
            .iter()
            .all(|submarine| submarine.distance(position) >= self.spawn_distance)
    }

    fn wait_for_wave(&mut self, delta_time: f32, ctx: &mut EventContext<'_>) -> bool {
        let all_dead = self
            .monsters
            .iter()
            .all(|seed| ctx.world.dead_characters.contains(seed));
        if !all_dead {
            self.reset_timer = 0.0;
            return false;
        }
        if self.reset_time <= 0.0 {
            return true;
        }
        self.reset_timer += delta_time;
        if self.reset_timer >= self.reset_time {
            self.reset_timer = 0.0;
            self.monsters.clear();
            self.state = MonsterState::FindSpawnPos;
        }
        false
    }
}
