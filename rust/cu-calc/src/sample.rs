//! Monte Carlo estimate of the leg outcome, used when exact enumeration is over budget.

use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;
use rustc_hash::FxHashMap;

use cu_core::{move_on_board, RaceState, Ranking, Rules};

use crate::outcome::{LegDistribution, Precision, TileLandings};
use crate::CalcError;

/// Play out the rest of the leg `samples` times with a `seed`ed stream.
pub fn sampled_distribution(
    state: &RaceState,
    rules: &Rules,
    samples: u32,
    seed: u64,
) -> Result<LegDistribution, CalcError> {
    let root = state.board();
    if state.is_finished() || root.is_leg_complete(rules) || samples == 0 {
        return Ok(LegDistribution::certain(
            state.ranking(),
            root.track.finish_reached(rules.finish_displacement()),
        ));
    }

    let tiles: Vec<_> = root.track.tiles().collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut counts: FxHashMap<Ranking, u32> = FxHashMap::default();
    let mut landing_sum = vec![0u64; tiles.len()];
    let mut landing_sq = vec![0u64; tiles.len()];
    let mut finished = 0u32;

    for _ in 0..samples {
        let mut board = root.clone();
        let mut hits = vec![0u64; tiles.len()];
        while !board.is_leg_complete(rules) {
            let mut pool = board.pool;
            let draw = pool.draw(rules, &mut rng);
            let landing = move_on_board(&mut board, draw, rules)?;
            if let Some((space, _)) = landing.tile {
                if let Some(i) = tiles.iter().position(|&(s, _)| s == space) {
                    hits[i] += 1;
                }
            }
        }
        *counts.entry(board.track.ranking()).or_insert(0) += 1;
        if board.track.finish_reached(rules.finish_displacement()) {
            finished += 1;
        }
        for (i, h) in hits.into_iter().enumerate() {
            landing_sum[i] += h;
            landing_sq[i] += h * h;
        }
    }

    let n = samples as f64;
    let landings = tiles
        .iter()
        .enumerate()
        .map(|(i, &(space, tile))| TileLandings {
            space,
            owner: tile.owner,
            mean: landing_sum[i] as f64 / n,
            second_moment: landing_sq[i] as f64 / n,
        })
        .collect();
    Ok(LegDistribution::new(
        counts.into_iter().map(|(r, c)| (r, c as f64 / n)),
        samples as u64,
        landings,
        finished as f64 / n,
        Precision::Sampled { samples },
    ))
}
