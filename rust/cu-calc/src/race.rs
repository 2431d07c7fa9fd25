//! Whole-race Monte Carlo: who wins and who comes last.

use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;

use cu_core::{apply, settle, Action, CalcConfig, Color, RaceState, Rules, MAX_CAMELS};

use crate::CalcError;

/// Estimated end-of-race probabilities per racing color.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceOutlook {
    /// `(color, P(wins the race))` in rules order.
    pub winner: Vec<(Color, f64)>,
    /// `(color, P(finishes last))` in rules order.
    pub loser: Vec<(Color, f64)>,
    pub samples: u32,
    /// Samples cut off by `max_race_legs` before anyone finished; they count the standings
    /// at the cutoff.
    pub unfinished: u32,
}

impl RaceOutlook {
    pub fn winner_probability(&self, color: Color) -> f64 {
        lookup(&self.winner, color)
    }

    pub fn loser_probability(&self, color: Color) -> f64 {
        lookup(&self.loser, color)
    }
}

fn lookup(table: &[(Color, f64)], color: Color) -> f64 {
    table
        .iter()
        .find(|(c, _)| *c == color)
        .map(|(_, p)| *p)
        .unwrap_or(0.0)
}

/// Stream seed for sample `i`; independent of thread scheduling.
fn sample_seed(seed: u64, i: u32) -> u64 {
    seed ^ (i as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Play one random race to its end: (leader, last, finished).
fn play_out(
    state: &RaceState,
    rules: &Rules,
    max_legs: u32,
    seed: u64,
) -> Result<(Option<Color>, Option<Color>, bool), CalcError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut s = state.clone();
    let leg_limit = state.leg().saturating_add(max_legs);
    while !s.is_finished() && s.leg() < leg_limit {
        // A state built with `advance` can stop on a complete leg that was never paid out.
        if s.is_leg_complete(rules) {
            s = settle(&s, rules)?;
            continue;
        }
        let mut pool = *s.pool();
        let draw = pool.draw(rules, &mut rng);
        s = apply(&s, Action::draw(draw, None), rules)?;
    }
    let ranking = s.ranking();
    Ok((ranking.leader(), ranking.last(), s.is_finished()))
}

/// Sample `calc.race_samples` complete races from `state`.
///
/// Races that run past `calc.max_race_legs` further legs are stopped and scored as they stand.
/// With `calc.parallel` the samples are spread over the rayon pool; results do not depend on it.
pub fn sample_race(
    state: &RaceState,
    rules: &Rules,
    calc: &CalcConfig,
) -> Result<RaceOutlook, CalcError> {
    let samples = calc.race_samples.max(1);
    let run = |i: u32| play_out(state, rules, calc.max_race_legs, sample_seed(calc.seed, i));
    let results: Result<Vec<_>, CalcError> = if calc.parallel {
        (0..samples).into_par_iter().map(run).collect()
    } else {
        (0..samples).map(run).collect()
    };

    let mut wins = [0u32; MAX_CAMELS];
    let mut lasts = [0u32; MAX_CAMELS];
    let mut unfinished = 0u32;
    for (winner, loser, finished) in results? {
        if let Some(c) = winner {
            wins[c.index() as usize] += 1;
        }
        if let Some(c) = loser {
            lasts[c.index() as usize] += 1;
        }
        if !finished {
            unfinished += 1;
        }
    }

    let n = samples as f64;
    let table = |counts: &[u32; MAX_CAMELS]| -> Vec<(Color, f64)> {
        rules
            .racing_camels
            .iter()
            .map(|&c| (c, counts[c.index() as usize] as f64 / n))
            .collect()
    };
    Ok(RaceOutlook {
        winner: table(&wins),
        loser: table(&lasts),
        samples,
        unfinished,
    })
}
