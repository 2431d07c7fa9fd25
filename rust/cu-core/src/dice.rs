//! The dice pyramid: which dice are still to be drawn this leg.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::color::{Color, ColorSet};
use crate::config::Rules;

/// One die in the pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Die {
    /// The die of one racing camel.
    Racing(Color),
    /// The shared die that moves one of the crazy camels backward.
    Crazy,
}

impl Die {
    /// Die that moves `color` under `rules`, if any.
    pub fn for_color(color: Color, rules: &Rules) -> Option<Die> {
        if rules.is_racing(color) {
            Some(Die::Racing(color))
        } else if rules.is_crazy(color) {
            Some(Die::Crazy)
        } else {
            None
        }
    }
}

/// An already sampled die result: which camel moves and how far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Draw {
    pub color: Color,
    pub value: u8,
}

impl Draw {
    pub fn new(color: Color, value: u8) -> Self {
        Self { color, value }
    }
}

/// Dice still available in the current leg.
///
/// Colors are drawn without replacement within a leg; the value of each draw is fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DicePool {
    racing: ColorSet,
    remaining: ColorSet,
    has_crazy: bool,
    crazy_remaining: bool,
}

impl DicePool {
    /// Full pool for `rules`.
    pub fn new(rules: &Rules) -> Self {
        let racing = rules.racing_set();
        let has_crazy = rules.crazy_camels.is_some();
        Self {
            racing,
            remaining: racing,
            has_crazy,
            crazy_remaining: has_crazy,
        }
    }

    /// True exactly when every racing color has been drawn this leg.
    #[inline]
    pub fn is_leg_over(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Make every die available again. Called when a leg ends.
    pub fn reset(&mut self) {
        self.remaining = self.racing;
        self.crazy_remaining = self.has_crazy;
    }

    /// Racing colors not drawn yet.
    #[inline]
    pub fn remaining_colors(&self) -> ColorSet {
        self.remaining
    }

    #[inline]
    pub fn crazy_available(&self) -> bool {
        self.crazy_remaining
    }

    /// Number of dice left in the pyramid, crazy die included.
    #[inline]
    pub fn remaining_dice(&self) -> usize {
        self.remaining.len() + self.crazy_remaining as usize
    }

    pub fn is_available(&self, die: Die) -> bool {
        match die {
            Die::Racing(color) => self.remaining.contains(color),
            Die::Crazy => self.crazy_remaining,
        }
    }

    /// Available dice, racing colors first in color order.
    pub fn available(&self) -> Vec<Die> {
        let mut dice: Vec<Die> = self.remaining.iter().map(Die::Racing).collect();
        if self.crazy_remaining {
            dice.push(Die::Crazy);
        }
        dice
    }

    /// Mark `die` as drawn. Returns false if it was not available.
    pub fn take(&mut self, die: Die) -> bool {
        match die {
            Die::Racing(color) => self.remaining.remove(color),
            Die::Crazy => std::mem::replace(&mut self.crazy_remaining, false),
        }
    }

    /// Pick a die uniformly among the available ones and roll it, marking it drawn.
    ///
    /// # Panics
    /// Panics if the leg is over; callers must check [`DicePool::is_leg_over`] first.
    pub fn draw<R: Rng + ?Sized>(&mut self, rules: &Rules, rng: &mut R) -> Draw {
        assert!(!self.is_leg_over(), "draw from an exhausted dice pool");
        let dice = self.available();
        let die = dice[rng.gen_range(0..dice.len())];
        self.take(die);
        match die {
            Die::Racing(color) => Draw {
                color,
                value: *rules
                    .die_faces
                    .choose(rng)
                    .expect("validated rules have die faces"),
            },
            Die::Crazy => Draw {
                color: *rules
                    .crazy_colors()
                    .choose(rng)
                    .expect("validated rules have crazy camels"),
                value: *rules
                    .crazy_faces()
                    .choose(rng)
                    .expect("validated rules have crazy faces"),
            },
        }
    }
}
