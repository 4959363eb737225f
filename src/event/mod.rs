//! Event instances
//!
//! Per-round mutable state machines materialized from prefabs. Every
//! instance honors the same lifecycle contract the scheduler consumes:
//! `init` once (idempotent), `update` every active tick, a read-only
//! finished flag and a finished notification that fires exactly once.
//! Instances talk to the world only through the [`EventOutbox`]; they never
//! touch scheduler state.

pub mod artifact;
pub mod factory;
pub mod malfunction;
pub mod monster;
pub mod scripted;

#[cfg(test)]
mod property_tests;

pub use factory::build_behavior;

use crate::content::prefab::EventPrefab;
use crate::world::{Level, Vec2, WorldSnapshot};
use smallvec::SmallVec;
use std::sync::Arc;

use artifact::ArtifactEvent;
use malfunction::MalfunctionEvent;
use monster::MonsterEvent;
use scripted::ScriptedEvent;

/// Request to spawn one character, executed by the session controller
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnCommand {
    /// Stable per-character seed identifier
    pub character_seed: String,
    pub species: String,
    pub position: Vec2,
}

/// Request to spawn one item
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSpawnCommand {
    pub item_id: String,
    pub item_identifier: String,
    pub position: Vec2,
}

/// Request to break items matching a tag
#[derive(Debug, Clone, PartialEq)]
pub struct MalfunctionCommand {
    pub item_tag: String,
}

/// Commands produced by event instances during one tick
#[derive(Debug, Default)]
pub struct EventOutbox {
    pub spawns: Vec<SpawnCommand>,
    pub item_spawns: Vec<ItemSpawnCommand>,
    pub malfunctions: Vec<MalfunctionCommand>,
    pub messages: Vec<String>,
}

impl EventOutbox {
    pub fn clear(&mut self) {
        self.spawns.clear();
        self.item_spawns.clear();
        self.malfunctions.clear();
        self.messages.clear();
    }
}

/// Read-only world access handed to instances each tick
pub struct EventContext<'a> {
    pub level: &'a Level,
    pub world: &'a WorldSnapshot,
    pub outbox: &'a mut EventOutbox,
}

/// Cooperative invoke-after-delay queue, drained each tick.
/// Used to stagger multi-spawn events without an ambient coroutine manager.
#[derive(Debug, Clone)]
pub(crate) struct DelayQueue<T> {
    entries: SmallVec<[(f32, T); 4]>,
}

// Not derived: a derive would require `T: Default`, and the queued payloads
// (spawn commands) have no meaningful default value
impl<T> Default for DelayQueue<T> {
    fn default() -> Self {
        DelayQueue {
            entries: SmallVec::new(),
        }
    }
}

impl<T> DelayQueue<T> {
    pub fn push(&mut self, delay: f32, value: T) {
        self.entries.push((delay.max(0.0), value));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Advance timers and drain entries that have come due, in push order
    pub fn tick(&mut self, delta_time: f32) -> SmallVec<[T; 4]> {
        let mut ready = SmallVec::new();
        let mut index = 0;
        while index < self.entries.len() {
            self.entries[index].0 -= delta_time;
            if self.entries[index].0 <= 0.0 {
                ready.push(self.entries.remove(index).1);
            } else {
                index += 1;
            }
        }
        ready
    }
}

/// Concrete behaviors behind the shared lifecycle contract
#[derive(Debug)]
pub enum EventBehavior {
    Monster(MonsterEvent),
    Scripted(ScriptedEvent),
    Malfunction(MalfunctionEvent),
    Artifact(ArtifactEvent),
}

impl EventBehavior {
    /// Returns true once the behavior has run to completion
    fn update(&mut self, delta_time: f32, ctx: &mut EventContext<'_>) -> bool {
        match self {
            EventBehavior::Monster(event) => event.update(delta_time, ctx),
            EventBehavior::Scripted(event) => event.update(delta_time, ctx),
            EventBehavior::Malfunction(event) => event.update(delta_time, ctx),
            EventBehavior::Artifact(event) => event.update(delta_time, ctx),
        }
    }
}

/// Notification invoked with the prefab identifier when an event completes
pub type FinishedHook = Box<dyn FnMut(&str)>;

/// One materialized event instance
pub struct Event {
    pub prefab: Arc<EventPrefab>,
    /// Per-instance random seed drawn from the round generator
    pub seed: u64,
    /// Index of the set this instance was materialized from; bookkeeping
    /// only, never control flow
    pub parent_set: Option<usize>,
    initialized: bool,
    finished: bool,
    finished_notified: bool,
    on_finished: Option<FinishedHook>,
    behavior: EventBehavior,
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("prefab", &self.prefab.identifier)
            .field("seed", &self.seed)
            .field("parent_set", &self.parent_set)
            .field("initialized", &self.initialized)
            .field("finished", &self.finished)
            .finish()
    }
}

impl Event {
    /// Materialize an instance from a prefab. `spawn_filter` restricts spawn
    /// positions to one structure index for per-ruin/cave/wreck sets.
    pub fn new(
        prefab: Arc<EventPrefab>,
        seed: u64,
        spawn_filter: Option<usize>,
    ) -> crate::error::Result<Event> {
        let behavior = build_behavior(&prefab, seed, spawn_filter)?;
        Ok(Event {
            prefab,
            seed,
            parent_set: None,
            initialized: false,
            finished: false,
            finished_notified: false,
            on_finished: None,
            behavior,
        })
    }

    /// One-time initialization when the instance activates. Queued events
    /// carry no parent set. Safe to call again; repeat calls do nothing.
    pub fn init(&mut self, parent_set: Option<usize>) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        self.parent_set = parent_set;
    }

    pub fn initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Force completion, used for disallowed or infeasible events
    pub fn finish(&mut self) {
        self.finished = true;
    }

    pub fn set_finished_hook(&mut self, hook: FinishedHook) {
        self.on_finished = Some(hook);
    }

    /// Advance the instance by one tick
    pub fn update(&mut self, delta_time: f32, ctx: &mut EventContext<'_>) {
        if self.finished {
            return;
        }
        if self.behavior.update(delta_time, ctx) {
            self.finished = true;
        }
    }

    /// Fire the finished notification if completion has not been reported
    /// yet. Returns true exactly once per instance.
    pub fn take_finished_notification(&mut self) -> bool {
        if !self.finished || self.finished_notified {
            return false;
        }
        self.finished_notified = true;
        if let Some(hook) = self.on_finished.as_mut() {
            hook(&self.prefab.identifier);
        }
        true
    }

    /// External content descriptors to preload before the round begins
    pub fn files_to_preload(&self) -> impl Iterator<Item = &str> {
        self.prefab.preload_files.iter().map(String::as_str)
    }

    /// Whether activating this instance may start the global event cooldown
    pub fn triggers_cooldown(&self) -> bool {
        self.prefab.trigger_event_cooldown
    }

    #[cfg(test)]
    pub(crate) fn behavior(&self) -> &EventBehavior {
        &self.behavior
    }
}
