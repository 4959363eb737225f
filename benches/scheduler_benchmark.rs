//! Benchmark for round scheduling performance
//!
//! Target: starting a round over a midsize catalog should complete in <1ms

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fathom_event_core::event::EventOutbox;
use fathom_event_core::world::{RegionType, SpawnPoint, Vec2};
use fathom_event_core::{
    ContentCatalog, EventManager, Level, LevelData, Location, SessionKind, WorldSnapshot,
};

/// Build a realistic midsize catalog: 120 prefabs and 40 set trees with
/// nested children and commonness overrides
fn create_test_catalog() -> ContentCatalog {
    let mut prefab_children = Vec::new();
    for i in 0..120 {
        let entry = match i % 3 {
            0 => format!(
                r#"{{"name": "monsterevent", "attributes": {{
                    "identifier": "monster{i}", "character": "crawler{i}",
                    "minamount": "1", "maxamount": "4", "commonness": "{c}"
                }}}}"#,
                i = i,
                c = 1 + i % 5
            ),
            1 => format!(
                r#"{{"name": "scriptedevent", "attributes": {{"identifier": "script{i}"}},
                    "children": [
                        {{"name": "action", "attributes": {{"kind": "wait", "seconds": "5"}}}},
                        {{"name": "action", "attributes": {{"kind": "message", "text": "ping"}}}}
                    ]}}"#,
                i = i
            ),
            _ => format!(
                r#"{{"name": "malfunctionevent", "attributes": {{
                    "identifier": "fault{i}", "itemtag": "pump", "delay": "30"
                }}}}"#,
                i = i
            ),
        };
        prefab_children.push(entry);
    }
    let prefabs_doc = format!(
        r#"{{"name": "eventprefabs", "children": [{}]}}"#,
        prefab_children.join(",")
    );

    let mut set_children = Vec::new();
    for i in 0..40 {
        let a = (i * 3) % 120;
        let b = (i * 3 + 1) % 120;
        let c = (i * 3 + 2) % 120;
        set_children.push(format!(
            r#"{{"name": "eventset",
                "attributes": {{"identifier": "set{i}", "chooserandom": "true", "eventcount": "2"}},
                "children": [
                    {{"name": "commonness", "attributes": {{"commonness": "{w}"}}}},
                    {{"name": "monsterevent", "attributes": {{"identifier": "{pa}"}}}},
                    {{"name": "scriptedevent", "attributes": {{"identifier": "{pb}"}}}},
                    {{"name": "eventset", "attributes": {{"identifier": "set{i}child"}},
                     "children": [
                        {{"name": "malfunctionevent", "attributes": {{"identifier": "{pc}"}}}}
                    ]}}
                ]}}"#,
            i = i,
            w = 1 + i % 4,
            pa = prefab_name(a),
            pb = prefab_name(b),
            pc = prefab_name(c),
        ));
    }
    let sets_doc = format!(
        r#"{{"name": "eventsets", "children": [{}]}}"#,
        set_children.join(",")
    );

    let mut catalog = ContentCatalog::new();
    catalog
        .load_texts([prefabs_doc.as_str(), sets_doc.as_str()])
        .expect("benchmark catalog must load");
    catalog.ensure_default_settings();
    catalog
}

fn prefab_name(i: usize) -> String {
    match i % 3 {
        0 => format!("monster{}", i),
        1 => format!("script{}", i),
        _ => format!("fault{}", i),
    }
}

fn create_test_level() -> Level {
    let mut level = Level::test_level("benchlevel", 55.0);
    level.ruin_count = 2;
    level.cave_count = 3;
    level.spawn_points = (0..50)
        .map(|i| SpawnPoint {
            position: Vec2::new(i as f32 * 2_000.0, -(i as f32) * 100.0),
            region: match i % 4 {
                0 => RegionType::MainPath,
                1 => RegionType::Cave,
                2 => RegionType::Ruin,
                _ => RegionType::Wreck,
            },
            region_index: if i % 4 == 0 { None } else { Some(i % 3) },
        })
        .collect();
    level
}

fn open_location() -> Location {
    Location {
        allow_generic_events: true,
        ..Default::default()
    }
}

fn bench_catalog_load(c: &mut Criterion) {
    c.bench_function("catalog_load", |b| {
        b.iter(|| black_box(create_test_catalog()))
    });
}

fn bench_start_round(c: &mut Criterion) {
    let catalog = create_test_catalog();
    let level = create_test_level();

    c.bench_function("start_round", |b| {
        b.iter(|| {
            let mut manager = EventManager::new();
            let mut data = LevelData::default();
            manager.start_round(
                black_box(&catalog),
                level.clone(),
                open_location(),
                SessionKind::Mission,
                &mut data,
            );
            black_box(manager)
        })
    });
}

fn bench_round_ticks(c: &mut Criterion) {
    let catalog = create_test_catalog();
    let level = create_test_level();
    let world = WorldSnapshot::default();

    c.bench_function("round_100_ticks", |b| {
        b.iter(|| {
            let mut manager = EventManager::new();
            let mut data = LevelData::default();
            let mut outbox = EventOutbox::default();
            manager.start_round(
                &catalog,
                level.clone(),
                open_location(),
                SessionKind::Mission,
                &mut data,
            );
            for _ in 0..100 {
                manager.update(black_box(1.0), &world, &mut data, &mut outbox);
                outbox.clear();
            }
            black_box(manager.current_intensity())
        })
    });
}

criterion_group!(
    benches,
    bench_catalog_load,
    bench_start_round,
    bench_round_ticks
);
criterion_main!(benches);
