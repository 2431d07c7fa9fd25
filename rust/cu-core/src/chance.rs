//! Seeded chance stream: dice sampling and random race setup.
//!
//! The engine itself is deterministic; this is the one place that turns a seed into dice
//! values. Front ends sample a [`Draw`] here and hand it to [`crate::apply`].

use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;

use crate::color::Color;
use crate::config::Rules;
use crate::dice::Draw;
use crate::state::{RaceState, StateError};
use crate::track::Space;

/// Pseudorandom dice stream backed by a small PRNG.
#[derive(Debug, Clone)]
pub struct Chance {
    rng: ChaCha8Rng,
}

impl Chance {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Sample the next draw of the current leg. `state` is not touched.
    ///
    /// Returns `None` once the leg is complete or the race is over.
    pub fn roll(&mut self, state: &RaceState, rules: &Rules) -> Option<Draw> {
        if state.is_finished() || state.is_leg_complete(rules) {
            return None;
        }
        let mut pool = *state.pool();
        Some(pool.draw(rules, &mut self.rng))
    }

    /// Random starting layout for `rules`, see [`random_start`].
    pub fn start(&mut self, rules: &Rules) -> Vec<(Color, Space)> {
        random_start(rules, &mut self.rng)
    }

    /// New race on a random starting layout.
    pub fn setup(&mut self, rules: &Rules, players: usize) -> Result<RaceState, StateError> {
        let start = self.start(rules);
        RaceState::new(rules, players, &start)
    }
}

/// Roll every camel onto the board.
///
/// Racing camels start on space `face - 1`; crazy camels on space `length - face`. Each camel
/// rolled onto an occupied space slides under the camels already there, so the list is
/// returned in stacking order (bottom first).
pub fn random_start<R: Rng + ?Sized>(rules: &Rules, rng: &mut R) -> Vec<(Color, Space)> {
    let mut rolled: Vec<(Color, Space)> = Vec::new();
    for &color in &rules.racing_camels {
        let face = rules.die_faces.choose(rng).copied().unwrap_or(1);
        rolled.push((color, face.saturating_sub(1)));
    }
    for &color in rules.crazy_colors() {
        let face = rules.crazy_faces().choose(rng).copied().unwrap_or(1);
        rolled.push((color, rules.track_length - face));
    }
    rolled.reverse();
    rolled
}
