//! Property-based tests for the leg enumerator.

use proptest::prelude::*;

use cu_calc::exact_distribution;
use cu_core::{apply, legal_tile_spaces, Action, CalcConfig, Chance, PlayerId, RaceState, Rules, TileEffect};

/// A random start with `draws` dice already rolled and optionally one tile down.
fn position(seed: u64, crazy: bool, draws: usize, tile: Option<TileEffect>) -> (RaceState, Rules) {
    let rules = if crazy { Rules::crazy() } else { Rules::classic() };
    let mut chance = Chance::new(seed);
    let mut s = chance.setup(&rules, 2).unwrap();
    for _ in 0..draws {
        let draw = chance.roll(&s, &rules).unwrap();
        s = apply(&s, Action::draw(draw, None), &rules).unwrap();
    }
    if let Some(effect) = tile {
        let owner = PlayerId(1);
        if let Some(&space) = legal_tile_spaces(&s, owner, &rules).first() {
            s = apply(&s, Action::PlaceTile { space, effect, owner }, &rules).unwrap();
        }
    }
    (s, rules)
}

fn tile_strategy() -> impl Strategy<Value = Option<TileEffect>> {
    prop_oneof![
        Just(None),
        Just(Some(TileEffect::Oasis)),
        Just(Some(TileEffect::Mirage)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    // 1. Outcome probabilities sum to one and every rank is filled exactly once.
    #[test]
    fn probabilities_are_a_distribution(
        seed in 0u64..10_000,
        crazy in any::<bool>(),
        draws in 1..=4usize,
        tile in tile_strategy(),
    ) {
        let (s, rules) = position(seed, crazy, draws, tile);
        let d = exact_distribution(&s, &rules, &CalcConfig::default()).unwrap();
        prop_assert!((d.total_probability() - 1.0).abs() < 1e-9);

        let n = rules.racing_camels.len();
        let mut per_rank = vec![0.0; n];
        for &c in &rules.racing_camels {
            let ranks = d.rank_probabilities(c);
            prop_assert_eq!(ranks.len(), n);
            prop_assert!((ranks.iter().sum::<f64>() - 1.0).abs() < 1e-9);
            for (acc, p) in per_rank.iter_mut().zip(&ranks) {
                *acc += p;
            }
        }
        for p in per_rank {
            prop_assert!((p - 1.0).abs() < 1e-9);
        }
    }

    // 2. Tile landings are bounded by the dice left and have non-negative variance.
    #[test]
    fn tile_landings_are_consistent(
        seed in 0u64..10_000,
        draws in 1..=4usize,
        effect in prop_oneof![Just(TileEffect::Oasis), Just(TileEffect::Mirage)],
    ) {
        let (s, rules) = position(seed, false, draws, Some(effect));
        let left = s.pool().remaining_dice() as f64;
        let d = exact_distribution(&s, &rules, &CalcConfig::default()).unwrap();
        for t in d.tiles() {
            prop_assert_eq!(t.owner, PlayerId(1));
            prop_assert!(t.mean >= 0.0 && t.mean <= left + 1e-9);
            prop_assert!(t.variance() >= -1e-9);
        }
    }
}
