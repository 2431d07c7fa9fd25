//! Shared fixtures for the criterion benches.

use cu_core::{apply, Action, Chance, RaceState, Rules};

/// Seeded classic race with `drawn` dice already rolled this leg.
pub fn classic_midleg(seed: u64, drawn: usize) -> (RaceState, Rules) {
    position(Rules::classic(), seed, drawn)
}

/// Same for the crazy camel variant.
pub fn crazy_midleg(seed: u64, drawn: usize) -> (RaceState, Rules) {
    position(Rules::crazy(), seed, drawn)
}

fn position(rules: Rules, seed: u64, drawn: usize) -> (RaceState, Rules) {
    let mut chance = Chance::new(seed);
    let mut state = match chance.setup(&rules, 4) {
        Ok(s) => s,
        Err(e) => panic!("fixture setup: {}", e),
    };
    for _ in 0..drawn {
        let Some(draw) = chance.roll(&state, &rules) else {
            break;
        };
        state = match apply(&state, Action::draw(draw, None), &rules) {
            Ok(s) => s,
            Err(e) => panic!("fixture draw: {}", e),
        };
    }
    (state, rules)
}
