//! Property tests for event instances

use proptest::prelude::*;

use crate::content::element::ContentElement;
use crate::content::prefab::EventPrefab;
use crate::event::monster::MonsterEvent;
use crate::event::scripted::ScriptedEvent;
use crate::event::{Event, EventContext, EventOutbox};
use crate::world::{Level, RegionType, SpawnPoint, Vec2, WorldSnapshot};
use std::sync::Arc;

fn open_level(seed: &str) -> Level {
    let mut level = Level::test_level(seed, 30.0);
    level.spawn_points = vec![SpawnPoint {
        position: Vec2::new(40_000.0, -2_000.0),
        region: RegionType::MainPath,
        region_index: None,
    }];
    level
}

fn drive(event: &mut MonsterEvent, level: &Level, ticks: usize) -> Vec<String> {
    let world = WorldSnapshot::default();
    let mut outbox = EventOutbox::default();
    let mut seeds = Vec::new();
    for _ in 0..ticks {
        let mut ctx = EventContext {
            level,
            world: &world,
            outbox: &mut outbox,
        };
        event.update(1.0, &mut ctx);
        seeds.extend(outbox.spawns.drain(..).map(|command| command.character_seed));
    }
    seeds
}

proptest! {
    /// A fixed-amount monster event spawns exactly that many characters and
    /// the character seeds are a pure function of level seed and species
    #[test]
    fn prop_monster_amount_exact(amount in 1u32..8, seed in any::<u64>()) {
        let level = open_level("prop");
        let mut event = MonsterEvent::new(
            "crawler".to_string(),
            amount,
            amount,
            RegionType::MainPath,
            None,
            1_000.0,
            0.0,
            seed,
        );
        let seeds = drive(&mut event, &level, 20);
        prop_assert_eq!(seeds.len() as u32, amount);
        for (i, character_seed) in seeds.iter().enumerate() {
            prop_assert_eq!(character_seed, &format!("prop-crawler-{}", i));
        }
    }

    /// A ranged amount always lands within the configured bounds
    #[test]
    fn prop_monster_amount_in_range(min in 1u32..4, span in 0u32..4, seed in any::<u64>()) {
        let level = open_level("prop");
        let max = min + span;
        let mut event = MonsterEvent::new(
            "crawler".to_string(),
            min,
            max,
            RegionType::MainPath,
            None,
            1_000.0,
            0.0,
            seed,
        );
        let count = drive(&mut event, &level, 20).len() as u32;
        prop_assert!((min..=max).contains(&count));
    }

    /// An empty script reports completion on the very first update
    #[test]
    fn prop_empty_script_finishes(dt in 0.001f32..=10.0) {
        let level = open_level("prop");
        let world = WorldSnapshot::default();
        let mut outbox = EventOutbox::default();
        let mut event = ScriptedEvent::new(Vec::new());
        let mut ctx = EventContext {
            level: &level,
            world: &world,
            outbox: &mut outbox,
        };
        prop_assert!(event.update(dt, &mut ctx));
    }

    /// The finished notification fires exactly once no matter how often the
    /// instance is polled afterwards
    #[test]
    fn prop_finished_notification_once(polls in 1usize..12) {
        let element = ContentElement::parse_document(
            r#"{"name": "scriptedevent", "attributes": {"identifier": "noop"}}"#,
        )
        .unwrap();
        let prefab = Arc::new(EventPrefab::from_element(&element).unwrap());
        let mut event = Event::new(prefab, 1, None).unwrap();
        event.finish();

        prop_assert!(event.take_finished_notification());
        for _ in 0..polls {
            prop_assert!(!event.take_finished_notification());
        }
    }
}
