//! Artifact retrieval event
//!
//! Spawns one item at a spawn position in the target region, then waits
//! until the session reports the item delivered inside the player submarine.

use crate::event::{EventContext, ItemSpawnCommand};
use crate::world::RegionType;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

#[derive(Debug)]
pub struct ArtifactEvent {
    item_identifier: String,
    spawn_region: RegionType,
    spawn_filter: Option<usize>,
    /// Stable identifier assigned to the spawned item, filled on spawn
    item_id: Option<String>,
    rng: StdRng,
}

impl ArtifactEvent {
    pub fn new(
        item_identifier: String,
        spawn_region: RegionType,
        spawn_filter: Option<usize>,
        seed: u64,
    ) -> ArtifactEvent {
        ArtifactEvent {
            item_identifier,
            spawn_region,
            spawn_filter,
            item_id: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn item_id(&self) -> Option<&str> {
        self.item_id.as_deref()
    }

    /// Returns true once the artifact has been delivered
    pub fn update(&mut self, _delta_time: f32, ctx: &mut EventContext<'_>) -> bool {
        match &self.item_id {
            None => {
                let candidates: Vec<_> = ctx
                    .level
                    .spawn_points
                    .iter()
                    .filter(|point| point.region == self.spawn_region)
                    .filter(|point| {
                        self.spawn_filter.is_none() || point.region_index == self.spawn_filter
                    })
                    .collect();
                if candidates.is_empty() {
                    debug!(
                        item = %self.item_identifier,
                        "no spawn positions for the artifact, finishing"
                    );
                    return true;
                }
                let position = candidates[self.rng.gen_range(0..candidates.len())].position;
                let item_id = format!("{}-{}", ctx.level.seed, self.item_identifier);
                ctx.outbox.item_spawns.push(ItemSpawnCommand {
                    item_id: item_id.clone(),
                    item_identifier: self.item_identifier.clone(),
                    position,
                });
                self.item_id = Some(item_id);
                false
            }
            Some(item_id) => ctx.world.delivered_items.contains(item_id),
        }
    }
}
