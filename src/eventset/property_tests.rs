//! Property tests for the event set tree
//!
//! Covers parse-time invariant clamping, commonness penalties and the
//! weighted selection behavior.

use proptest::prelude::*;
use std::sync::Arc;

use crate::content::element::ContentElement;
use crate::eventset::selection::{select_random_events, weighted_random_index, SelectionContext};
use crate::eventset::{calculate_commonness, test_set, EventSet};
use crate::world::{Level, LevelData, Location, SessionKind};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn weights_strategy() -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(0.1f32..=10.0, 1..=10)
}

proptest! {
    /// Parsed sets never violate the range invariants, whatever the document says
    #[test]
    fn prop_parse_clamps_ranges(
        min_difficulty in -50.0f32..=150.0,
        max_difficulty in -50.0f32..=150.0,
        min_intensity in -1.0f32..=2.0,
        max_intensity in -1.0f32..=2.0,
    ) {
        let document = format!(
            r#"{{
                "name": "eventset",
                "attributes": {{
                    "identifier": "anyset",
                    "minleveldifficulty": "{}", "maxleveldifficulty": "{}",
                    "minintensity": "{}", "maxintensity": "{}"
                }}
            }}"#,
            min_difficulty, max_difficulty, min_intensity, max_intensity
        );
        let element = ContentElement::parse_document(&document).unwrap();
        let mut counter = 0;
        let set = EventSet::from_element(&element, &Default::default(), &mut counter).unwrap();
        prop_assert!(set.max_level_difficulty >= set.min_level_difficulty);
        prop_assert!(set.max_intensity >= set.min_intensity);
    }

    /// Non-repeatable identifiers weigh exactly 0, history entries exactly
    /// 0.1 x base, everything else exactly base
    #[test]
    fn prop_commonness_penalties_exact(base in 0.0f32..=100.0) {
        let mut data = LevelData::default();
        prop_assert_eq!(calculate_commonness(base, "fresh", &data), base);

        data.add_to_history("seen");
        prop_assert_eq!(calculate_commonness(base, "seen", &data), base * 0.1);

        data.non_repeatable_events.insert("banned".to_string());
        prop_assert_eq!(calculate_commonness(base, "banned", &data), 0.0);
    }

    /// Positive weights always produce a pick, and the pick is in range
    #[test]
    fn prop_weighted_random_in_range(weights in weights_strategy(), seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let index = weighted_random_index(&weights, &mut rng);
        prop_assert!(index.is_some());
        prop_assert!(index.unwrap() < weights.len());
    }

    /// A single valid candidate is always returned, independent of the seed
    #[test]
    fn prop_single_candidate_deterministic(seed in any::<u64>(), difficulty in 0.0f32..=100.0) {
        let level = Level::test_level("seed", difficulty);
        let location = Location { allow_generic_events: true, ..Default::default() };
        let ctx = SelectionContext {
            level: &level,
            location: &location,
            session: SessionKind::Mission,
        };
        let only = Arc::new(test_set(0));
        let mut rng = StdRng::seed_from_u64(seed);
        let chosen = select_random_events(&[only.clone()], None, &ctx, &mut rng);
        prop_assert_eq!(chosen.unwrap().index, only.index);
    }

    /// Candidates outside the difficulty range are never selected
    #[test]
    fn prop_difficulty_filter_holds(seed in any::<u64>()) {
        let level = Level::test_level("seed", 50.0);
        let location = Location { allow_generic_events: true, ..Default::default() };
        let ctx = SelectionContext {
            level: &level,
            location: &location,
            session: SessionKind::Mission,
        };

        let in_range = Arc::new(test_set(0));
        let out_of_range = Arc::new({
            let mut set = test_set(1);
            set.min_level_difficulty = 60.0;
            set
        });

        let mut rng = StdRng::seed_from_u64(seed);
        let chosen = select_random_events(
            &[in_range, out_of_range],
            None,
            &ctx,
            &mut rng,
        );
        prop_assert_eq!(chosen.unwrap().index, 0);
    }
}
