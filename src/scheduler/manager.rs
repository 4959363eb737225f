//! The event manager
//!
//! Round lifecycle: `start_round` selects the initial set tree and
//! materializes instances, `update` runs the activation gates and ticks
//! active events, `end_round` tears per-round state down. Selection and
//! materialization draw from a generator re-derived each round from the
//! level seed and the level's event history, so branch decisions reproduce
//! for a given level and history.

use crate::content::prefab::{EventPrefab, SubEventPrefab};
use crate::content::{ContentCatalog, EventManagerSettings, DEFAULT_SETTINGS};
use crate::event::{Event, EventContext, EventOutbox};
use crate::eventset::{
    calculate_commonness, select_random_events, weighted_random_index, EventSet, SelectionContext,
};
use crate::intensity::IntensityEstimator;
use crate::world::{
    Level, LevelData, Location, SessionKind, WorldSnapshot, DISPLAY_TO_REAL_WORLD_RATIO,
};
use ahash::{AHashMap, AHashSet};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Events may not start within this many meters of the level exits
const EXIT_SAFETY_DISTANCE: f32 = 50.0;

/// A set waiting to respawn its instances after they all finished
#[derive(Debug)]
struct ResetEntry {
    set: Arc<EventSet>,
    timer: f32,
    armed: bool,
}

/// Owns all per-round scheduling state. Not reentrant; the session
/// controller calls the lifecycle operations from its single update loop.
#[derive(Debug)]
pub struct EventManager {
    enabled: bool,
    settings: EventManagerSettings,
    /// Materialized instances per set index, filled by `create_events`
    selected_events: AHashMap<usize, Vec<Event>>,
    /// Materialized prefab identifiers with their non-repeatable flag,
    /// in materialization order
    selected_identifiers: Vec<(String, bool)>,
    pending_sets: Vec<Arc<EventSet>>,
    active_events: Vec<Event>,
    finished_events: AHashSet<String>,
    queued_for_next_round: Vec<String>,
    reset_entries: Vec<ResetEntry>,
    event_threshold: f32,
    cooldown: f32,
    estimator: IntensityEstimator,
    rng: StdRng,
    level: Option<Level>,
    location: Location,
    session: SessionKind,
}

impl Default for EventManager {
    fn default() -> Self {
        EventManager {
            enabled: false,
            settings: DEFAULT_SETTINGS.clone(),
            selected_events: AHashMap::new(),
            selected_identifiers: Vec::new(),
            pending_sets: Vec::new(),
            active_events: Vec::new(),
            finished_events: AHashSet::new(),
            queued_for_next_round: Vec::new(),
            reset_entries: Vec::new(),
            event_threshold: DEFAULT_SETTINGS.default_event_threshold,
            cooldown: 0.0,
            estimator: IntensityEstimator::new(),
            rng: StdRng::seed_from_u64(0),
            level: None,
            location: Location::default(),
            session: SessionKind::Mission,
        }
    }
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn current_intensity(&self) -> f32 {
        self.estimator.current_intensity()
    }

    pub fn music_intensity(&self) -> f32 {
        self.estimator.music_intensity()
    }

    pub fn active_events(&self) -> &[Event] {
        &self.active_events
    }

    /// External content descriptors for every materialized instance, sorted
    /// and deduplicated
    pub fn files_to_preload(&self) -> Vec<String> {
        let mut files: AHashSet<String> = AHashSet::new();
        for events in self.selected_events.values() {
            for event in events {
                files.extend(event.files_to_preload().map(str::to_string));
            }
        }
        for event in &self.active_events {
            files.extend(event.files_to_preload().map(str::to_string));
        }
        let mut files: Vec<String> = files.into_iter().collect();
        files.sort();
        files
    }

    /// Defer an event to the next round
    pub fn queue_for_next_round(&mut self, identifier: &str) {
        self.queued_for_next_round.push(identifier.to_string());
    }

    /// Persisted save fragment: the queued identifiers, comma-joined
    pub fn save(&self) -> String {
        self.queued_for_next_round.join(",")
    }

    /// Restore the queued identifiers from a save fragment
    pub fn load(&mut self, data: &str) {
        self.queued_for_next_round = data
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect();
    }

    /// Begin a round: re-derive the generator, select the initial set tree
    /// and materialize its instances, drain queued events into the active
    /// list. Selection failure disables the scheduler for the round rather
    /// than aborting the session.
    pub fn start_round(
        &mut self,
        catalog: &ContentCatalog,
        level: Level,
        location: Location,
        session: SessionKind,
        level_data: &mut LevelData,
    ) {
        self.reset_round_state();
        self.session = session;

        match catalog.settings_for(level.difficulty) {
            Ok(settings) => self.settings = settings,
            Err(err) => {
                error!(%err, "no event manager settings available, scheduler disabled");
                self.level = Some(level);
                self.location = location;
                return;
            }
        }
        self.event_threshold = self.settings.default_event_threshold;
        self.rng = StdRng::seed_from_u64(derive_round_seed(&level, level_data));

        let selection = SelectionContext {
            level: &level,
            location: &location,
            session,
        };
        let Some(initial) = select_random_events(
            catalog.event_sets(),
            Some(session.is_campaign()),
            &selection,
            &mut self.rng,
        ) else {
            warn!("no event set could be selected, scheduler disabled");
            self.level = Some(level);
            self.location = location;
            return;
        };

        let mut roots = vec![initial.clone()];
        if initial.additive {
            // An additive initial set layers on top of a second, independent
            // top-level selection among the non-additive sets
            let non_additive: Vec<Arc<EventSet>> = catalog
                .event_sets()
                .iter()
                .filter(|set| !set.additive)
                .cloned()
                .collect();
            if let Some(second) = select_random_events(
                &non_additive,
                Some(session.is_campaign()),
                &selection,
                &mut self.rng,
            ) {
                roots.push(second);
            }
        }

        {
            let mut materializer = Materializer {
                rng: &mut self.rng,
                level: &level,
                location: &location,
                level_data,
                selected: &mut self.selected_events,
                selected_identifiers: &mut self.selected_identifiers,
            };
            for root in &roots {
                materializer.create_events(root);
            }
        }
        for root in &roots {
            info!(set = %root.identifier, "initial event set selected");
        }
        self.pending_sets.extend(roots);

        for identifier in std::mem::take(&mut self.queued_for_next_round) {
            let Some(prefab) = catalog.prefab(&identifier) else {
                warn!(prefab = %identifier, "queued event references an unknown prefab");
                continue;
            };
            let seed = self.rng.gen();
            match Event::new(prefab.clone(), seed, None) {
                Ok(mut event) => {
                    event.init(None);
                    self.selected_identifiers
                        .push((prefab.identifier.clone(), prefab.non_repeatable));
                    self.active_events.push(event);
                }
                Err(err) => error!(prefab = %identifier, %err, "skipping queued event"),
            }
        }

        self.level = Some(level);
        self.location = location;
        self.enabled = true;
    }

    /// Advance one simulation tick: sample intensity, grow the threshold,
    /// run the activation fixed point, update active events and collect
    /// their completions.
    pub fn update(
        &mut self,
        delta_time: f32,
        world: &WorldSnapshot,
        level_data: &mut LevelData,
        outbox: &mut EventOutbox,
    ) {
        if !self.enabled {
            return;
        }
        self.estimator.update(delta_time, world);

        if self.cooldown > 0.0 {
            self.cooldown = (self.cooldown - delta_time).max(0.0);
        } else {
            self.event_threshold = (self.event_threshold
                + self.settings.event_threshold_increase * delta_time)
                .min(1.0);
        }

        // Fixed point: activating a set appends its children to the pending
        // list, which may themselves activate in the same tick. One set per
        // pass, so a cooldown started by an activation gates the rest of the
        // pending list immediately.
        loop {
            let ready = (0..self.pending_sets.len())
                .find(|&i| self.can_activate(&self.pending_sets[i], world));
            let Some(i) = ready else {
                break;
            };
            let set = self.pending_sets.remove(i);
            self.activate_set(set);
        }

        if let Some(level) = self.level.as_ref() {
            let mut ctx = EventContext {
                level,
                world,
                outbox,
            };
            for event in &mut self.active_events {
                event.update(delta_time, &mut ctx);
            }
        }
        for event in &mut self.active_events {
            if event.take_finished_notification() {
                self.finished_events.insert(event.prefab.identifier.clone());
            }
        }

        self.handle_resets(delta_time, level_data);
    }

    /// Tear down per-round state, keeping only the next-round queue
    pub fn end_round(&mut self) {
        self.reset_round_state();
        self.level = None;
    }

    /// Record this round's events into the level record: identifiers enter
    /// the history (finished instances only when requested), non-repeatable
    /// prefabs enter the never-again set.
    pub fn register_event_history(&self, register_finished_only: bool, level_data: &mut LevelData) {
        for (identifier, non_repeatable) in &self.selected_identifiers {
            if register_finished_only && !self.finished_events.contains(identifier) {
                continue;
            }
            level_data.add_to_history(identifier);
            if *non_repeatable {
                level_data.non_repeatable_events.insert(identifier.clone());
            }
        }
    }

    fn reset_round_state(&mut self) {
        self.enabled = false;
        self.selected_events.clear();
        self.selected_identifiers.clear();
        self.pending_sets.clear();
        self.active_events.clear();
        self.finished_events.clear();
        self.reset_entries.clear();
        self.estimator = IntensityEstimator::new();
        self.event_threshold = self.settings.default_event_threshold;
        self.cooldown = 0.0;
    }

    fn can_activate(&self, set: &EventSet, world: &WorldSnapshot) -> bool {
        if self.cooldown > 0.0 && !set.ignore_cooldown {
            return false;
        }
        if self.estimator.current_intensity() > self.event_threshold && !set.ignore_intensity {
            return false;
        }
        self.can_start_event_set(set, world)
    }

    fn can_start_event_set(&self, set: &EventSet, world: &WorldSnapshot) -> bool {
        let Some(level) = self.level.as_ref() else {
            return false;
        };
        if !set.allow_at_start {
            let near_exit = world.player_submarine_positions.iter().any(|position| {
                position.distance(level.start_position) * DISPLAY_TO_REAL_WORLD_RATIO
                    < EXIT_SAFETY_DISTANCE
                    || position.distance(level.end_position) * DISPLAY_TO_REAL_WORLD_RATIO
                        < EXIT_SAFETY_DISTANCE
            });
            if near_exit {
                return false;
            }
        }
        if set.delay_when_crew_away && world.crew_away {
            return false;
        }
        // Either progress gate suffices
        if world.distance_traveled < set.min_distance_traveled
            && world.mission_time < set.min_mission_time
        {
            return false;
        }
        let intensity = self.estimator.current_intensity();
        intensity >= set.min_intensity && intensity <= set.max_intensity
    }

    fn activate_set(&mut self, set: Arc<EventSet>) {
        debug!(set = %set.identifier, "event set activated");
        self.event_threshold = self.settings.default_event_threshold;

        let instances = self
            .selected_events
            .get_mut(&set.index)
            .map(std::mem::take)
            .unwrap_or_default();

        // Cooldown starts only when the set and at least one of its
        // instances both request it
        if set.trigger_event_cooldown
            && instances.iter().any(Event::triggers_cooldown)
        {
            self.cooldown = self.settings.event_cooldown;
        }

        for mut event in instances {
            event.init(Some(set.index));
            self.active_events.push(event);
        }

        for child in &set.child_sets {
            if self.selected_events.contains_key(&child.index) {
                self.pending_sets.push(child.clone());
            }
        }

        if set.reset_time > 0.0 {
            self.reset_entries.push(ResetEntry {
                set,
                timer: 0.0,
                armed: false,
            });
        }
    }

    /// Re-queue resettable sets once all of their instances have finished
    /// and the reset delay has elapsed
    fn handle_resets(&mut self, delta_time: f32, level_data: &mut LevelData) {
        let mut due: Vec<Arc<EventSet>> = Vec::new();
        for entry in &mut self.reset_entries {
            let index = entry.set.index;
            if entry.armed {
                entry.timer -= delta_time;
                if entry.timer <= 0.0 {
                    due.push(entry.set.clone());
                }
                continue;
            }
            let mut any = false;
            let mut all_finished = true;
            for event in &self.active_events {
                if event.parent_set == Some(index) {
                    any = true;
                    all_finished &= event.is_finished();
                }
            }
            if any && all_finished {
                entry.armed = true;
                entry.timer = entry.set.reset_time;
            }
        }

        if due.is_empty() {
            return;
        }
        // Fired entries go away for good; re-activation through the pending
        // list makes a fresh entry for the next cycle
        self.reset_entries
            .retain(|entry| !due.iter().any(|set| set.index == entry.set.index));
        if let Some(level) = self.level.as_ref() {
            let mut materializer = Materializer {
                rng: &mut self.rng,
                level,
                location: &self.location,
                level_data,
                selected: &mut self.selected_events,
                selected_identifiers: &mut self.selected_identifiers,
            };
            for set in &due {
                debug!(set = %set.identifier, "re-queueing resettable event set");
                materializer.create_events(set);
            }
        }
        for set in due {
            let index = set.index;
            self.active_events
                .retain(|event| event.parent_set != Some(index));
            self.pending_sets.push(set);
        }
    }

    #[cfg(test)]
    pub(crate) fn pending_sets(&self) -> &[Arc<EventSet>] {
        &self.pending_sets
    }

    #[cfg(test)]
    pub(crate) fn selected_events(&self) -> &AHashMap<usize, Vec<Event>> {
        &self.selected_events
    }

    #[cfg(test)]
    pub(crate) fn selected_identifiers(&self) -> &[(String, bool)] {
        &self.selected_identifiers
    }

    #[cfg(test)]
    pub(crate) fn finished_events(&self) -> &AHashSet<String> {
        &self.finished_events
    }

    #[cfg(test)]
    pub(crate) fn reset_entry_count(&self) -> usize {
        self.reset_entries.len()
    }

    #[cfg(test)]
    pub(crate) fn event_threshold(&self) -> f32 {
        self.event_threshold
    }

    #[cfg(test)]
    pub(crate) fn cooldown(&self) -> f32 {
        self.cooldown
    }
}

/// Round generator seed: level seed folded with the event history, so a
/// replayed level with the same history makes the same branch decisions
fn derive_round_seed(level: &Level, level_data: &LevelData) -> u64 {
    let mut hasher = DefaultHasher::new();
    level.seed.hash(&mut hasher);
    for identifier in &level_data.event_history {
        identifier.hash(&mut hasher);
    }
    hasher.finish()
}

/// Recursive instance materialization over one selected set tree.
/// Borrows the disjoint manager fields it needs so it can run both at round
/// start and from the reset re-queue path.
struct Materializer<'a> {
    rng: &'a mut StdRng,
    level: &'a Level,
    location: &'a Location,
    level_data: &'a mut LevelData,
    selected: &'a mut AHashMap<usize, Vec<Event>>,
    selected_identifiers: &'a mut Vec<(String, bool)>,
}

impl Materializer<'_> {
    fn create_events(&mut self, set: &Arc<EventSet>) {
        if self.level.hunting_grounds && !set.compatible_with_hunting_grounds {
            debug!(set = %set.identifier, "skipped: incompatible with hunting grounds");
            return;
        }
        if set.exhaustible && self.level_data.events_exhausted {
            debug!(set = %set.identifier, "skipped: level events exhausted");
            return;
        }
        self.selected.entry(set.index).or_default();

        for filter in set.apply_passes(self.level) {
            if set.choose_random {
                self.materialize_random(set, filter);
            } else {
                self.materialize_all(set, filter);
            }
        }

        if set.choose_random {
            // One weighted-random child branch, not all of them
            let valid: Vec<&Arc<EventSet>> = set
                .child_sets
                .iter()
                .filter(|child| child.valid_for(self.level, self.location))
                .collect();
            let weights: Vec<f32> = valid
                .iter()
                .map(|child| child.get_commonness(self.level))
                .collect();
            if let Some(pick) = weighted_random_index(&weights, self.rng) {
                self.create_events(valid[pick]);
            }
        } else {
            for child in &set.child_sets {
                if child.valid_for(self.level, self.location) {
                    self.create_events(child);
                }
            }
        }
    }

    /// Up to `event_count` exclusive weighted picks among the set's groups
    fn materialize_random(&mut self, set: &Arc<EventSet>, filter: Option<usize>) {
        let mut used = vec![false; set.event_prefabs.len()];
        for _ in 0..set.event_count.max(1) {
            let weights: Vec<f32> = set
                .event_prefabs
                .iter()
                .enumerate()
                .map(|(i, group)| {
                    if used[i] {
                        0.0
                    } else {
                        self.group_weight(group)
                    }
                })
                .collect();
            let Some(pick) = weighted_random_index(&weights, self.rng) else {
                // All remaining candidates have zero effective commonness
                break;
            };
            used[pick] = true;
            let group = &set.event_prefabs[pick];
            if self.rng.gen::<f32>() < group.probability() {
                self.instantiate_from_group(set, group, filter);
            }
        }
    }

    /// Every suitable group whose independent probability roll passes
    fn materialize_all(&mut self, set: &Arc<EventSet>, filter: Option<usize>) {
        for group in &set.event_prefabs {
            if !self.any_suitable(group) {
                continue;
            }
            if self.rng.gen::<f32>() >= group.probability() {
                continue;
            }
            self.instantiate_from_group(set, group, filter);
        }
    }

    /// Weighted pick of one concrete prefab within the group, then
    /// instantiation with the pass's spawn filter
    fn instantiate_from_group(
        &mut self,
        set: &Arc<EventSet>,
        group: &SubEventPrefab,
        filter: Option<usize>,
    ) {
        let candidates: Vec<&Arc<EventPrefab>> = group
            .prefabs
            .iter()
            .filter(|prefab| self.prefab_suitable(prefab))
            .collect();
        if candidates.is_empty() {
            return;
        }
        let weights: Vec<f32> = candidates
            .iter()
            .map(|prefab| {
                calculate_commonness(prefab.commonness, &prefab.identifier, self.level_data)
            })
            .collect();
        let pick = weighted_random_index(&weights, self.rng).unwrap_or(0);
        let prefab = candidates[pick].clone();

        let seed = self.rng.gen();
        match Event::new(prefab.clone(), seed, filter) {
            Ok(event) => {
                self.level_data.record_materialized(&prefab.identifier);
                self.selected_identifiers
                    .push((prefab.identifier.clone(), prefab.non_repeatable));
                self.selected.entry(set.index).or_default().push(event);
            }
            Err(err) => {
                error!(prefab = %prefab.identifier, %err, "skipping unbuildable event prefab");
            }
        }
    }

    /// Group selection weight: the best effective commonness over its
    /// suitable prefabs, zero when nothing in the group qualifies
    fn group_weight(&self, group: &SubEventPrefab) -> f32 {
        group
            .prefabs
            .iter()
            .filter(|prefab| self.prefab_suitable(prefab))
            .map(|prefab| {
                calculate_commonness(group.commonness(), &prefab.identifier, self.level_data)
            })
            .fold(0.0, f32::max)
    }

    fn any_suitable(&self, group: &SubEventPrefab) -> bool {
        group.prefabs.iter().any(|prefab| self.prefab_suitable(prefab))
    }

    /// Biome and faction gates plus the per-level bookkeeping gates
    fn prefab_suitable(&self, prefab: &EventPrefab) -> bool {
        if let Some(ref biome) = prefab.biome_identifier {
            if *biome != self.level.biome_identifier {
                return false;
            }
        }
        if let Some(ref faction) = prefab.faction {
            let primary = self.location.faction.as_deref() == Some(faction.as_str());
            let secondary = self.location.secondary_faction.as_deref() == Some(faction.as_str());
            if !primary && !secondary {
                return false;
            }
        }
        if self
            .level_data
            .non_repeatable_events
            .contains(&prefab.identifier)
        {
            return false;
        }
        if let Some(cap) = prefab.max_per_level {
            if self.level_data.count_of(&prefab.identifier) >= cap {
                return false;
            }
        }
        true
    }
}
