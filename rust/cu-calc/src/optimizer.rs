//! Expected-value ranking of the acting player's options.
//!
//! - Ticket: `EV = sum over ranks of P(rank) * payout(rank, face)`.
//! - Tile: one-step lookahead. The leg is re-enumerated with the tile placed; the value is the
//!   expected landings times the tile payout plus the change in value of the tickets the player
//!   already holds.
//! - Overall bet: whole-race sampling; a correct bet earns the next unclaimed payout.
//! - Roll: the roll reward.
//!
//! Ties on EV go to the lower variance, then to the [`Candidate`] order.

use std::cmp::Ordering;
use std::fmt;

use log::debug;
use rayon::prelude::*;
use serde::Serialize;

use cu_core::scoring::{next_overall_payout, ticket_payout};
use cu_core::{
    apply, can_bet_overall, legal_tile_spaces, Action, CalcConfig, Color, OverallSide, PlayerId,
    RaceState, Ranking, Rules, Space, Ticket, TileEffect,
};

use crate::outcome::LegDistribution;
use crate::race::{sample_race, RaceOutlook};
use crate::{distribution, CalcError};

/// One option of the acting player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Candidate {
    TakeTicket { color: Color },
    PlaceTile { space: Space, effect: TileEffect },
    BetOverall { color: Color, side: OverallSide },
    /// Roll the pyramid; the value is chance's.
    Roll,
}

impl Candidate {
    /// The engine action, except for `Roll` whose die value must be sampled first.
    pub fn to_action(self, player: PlayerId) -> Option<Action> {
        match self {
            Candidate::TakeTicket { color } => Some(Action::TakeTicket { color, player }),
            Candidate::PlaceTile { space, effect } => Some(Action::PlaceTile {
                space,
                effect,
                owner: player,
            }),
            Candidate::BetOverall { color, side } => Some(Action::BetOverall {
                color,
                side,
                player,
            }),
            Candidate::Roll => None,
        }
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Candidate::TakeTicket { color } => write!(f, "take {} ticket", color),
            Candidate::PlaceTile { space, effect } => {
                write!(f, "place {} tile on {}", effect, space)
            }
            Candidate::BetOverall { color, side } => write!(f, "bet {} overall {}", color, side),
            Candidate::Roll => f.write_str("roll"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankedAction {
    pub candidate: Candidate,
    pub ev: f64,
    pub variance: f64,
}

/// Everything the optimizer worked out for one decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub player: PlayerId,
    pub distribution: LegDistribution,
    /// Best first.
    pub actions: Vec<RankedAction>,
    /// Present when overall bets were evaluated.
    pub race: Option<RaceOutlook>,
}

impl Analysis {
    pub fn best(&self) -> Option<&RankedAction> {
        self.actions.first()
    }
}

/// Rank every option of `player`, best first.
pub fn best_actions(
    state: &RaceState,
    player: PlayerId,
    rules: &Rules,
    calc: &CalcConfig,
) -> Result<Vec<RankedAction>, CalcError> {
    Ok(analyze(state, player, rules, calc)?.actions)
}

/// [`best_actions`] plus the leg distribution and race outlook behind it.
pub fn analyze(
    state: &RaceState,
    player: PlayerId,
    rules: &Rules,
    calc: &CalcConfig,
) -> Result<Analysis, CalcError> {
    let dist = distribution(state, rules, calc)?;
    let mut actions = Vec::new();
    let mut race = None;
    if state.is_finished() || state.player(player).is_none() {
        return Ok(Analysis {
            player,
            distribution: dist,
            actions,
            race,
        });
    }

    for &color in &rules.racing_camels {
        if let Some(face) = state.next_ticket(color) {
            let ticket = Ticket { color, value: face };
            let (ev, variance) = moments(&dist, |r| ticket_payout(ticket, r, rules) as f64);
            actions.push(RankedAction {
                candidate: Candidate::TakeTicket { color },
                ev,
                variance,
            });
        }
    }

    actions.extend(tile_candidates(state, player, rules, calc, &dist)?);

    let bettable: Vec<Color> = rules
        .racing_camels
        .iter()
        .copied()
        .filter(|&c| can_bet_overall(state, player, c, rules))
        .collect();
    if !bettable.is_empty() {
        let outlook = sample_race(state, rules, calc)?;
        for &color in &bettable {
            for side in [OverallSide::Winner, OverallSide::Loser] {
                let p = match side {
                    OverallSide::Winner => outlook.winner_probability(color),
                    OverallSide::Loser => outlook.loser_probability(color),
                };
                let win = next_overall_payout(state.overall_bets(side), color, &rules.overall);
                let (ev, variance) = bernoulli(p, win as f64, rules.overall.wrong as f64);
                actions.push(RankedAction {
                    candidate: Candidate::BetOverall { color, side },
                    ev,
                    variance,
                });
            }
        }
        race = Some(outlook);
    }

    if !state.is_leg_complete(rules) {
        actions.push(RankedAction {
            candidate: Candidate::Roll,
            ev: rules.roll_reward as f64,
            variance: 0.0,
        });
    }

    actions.sort_by(compare);
    debug!(
        "ranked {} options for player {} ({:?})",
        actions.len(),
        player,
        dist.precision()
    );
    Ok(Analysis {
        player,
        distribution: dist,
        actions,
        race,
    })
}

/// Higher EV first, then lower variance, then candidate order.
fn compare(a: &RankedAction, b: &RankedAction) -> Ordering {
    b.ev.total_cmp(&a.ev)
        .then(a.variance.total_cmp(&b.variance))
        .then(a.candidate.cmp(&b.candidate))
}

/// Mean and variance of `payout` over the distribution.
fn moments(dist: &LegDistribution, payout: impl Fn(&Ranking) -> f64) -> (f64, f64) {
    let ev = dist.expectation(&payout);
    let second = dist.expectation(|r| payout(r).powi(2));
    (ev, (second - ev * ev).max(0.0))
}

fn bernoulli(p: f64, win: f64, lose: f64) -> (f64, f64) {
    let ev = p * win + (1.0 - p) * lose;
    let second = p * win * win + (1.0 - p) * lose * lose;
    (ev, (second - ev * ev).max(0.0))
}

/// Value of the player's held tickets under `dist`.
fn held_value(state: &RaceState, player: PlayerId, rules: &Rules, dist: &LegDistribution) -> f64 {
    let Some(p) = state.player(player) else {
        return 0.0;
    };
    dist.expectation(|r| {
        p.tickets
            .iter()
            .map(|&t| ticket_payout(t, r, rules) as f64)
            .sum()
    })
}

fn tile_candidates(
    state: &RaceState,
    player: PlayerId,
    rules: &Rules,
    calc: &CalcConfig,
    dist: &LegDistribution,
) -> Result<Vec<RankedAction>, CalcError> {
    if state.is_leg_complete(rules) {
        return Ok(Vec::new());
    }
    let options: Vec<(Space, TileEffect)> = legal_tile_spaces(state, player, rules)
        .into_iter()
        .flat_map(|s| [(s, TileEffect::Oasis), (s, TileEffect::Mirage)])
        .collect();
    if options.is_empty() {
        return Ok(Vec::new());
    }
    let held_now = held_value(state, player, rules, dist);
    let payout = rules.tiles.payout as f64;

    let eval = |&(space, effect): &(Space, TileEffect)| -> Result<RankedAction, CalcError> {
        let action = Action::PlaceTile {
            space,
            effect,
            owner: player,
        };
        let placed = apply(state, action, rules)?;
        let d = distribution(&placed, rules, calc)?;
        let (mean, var) = d
            .tile_landings(space)
            .map(|t| (t.mean, t.variance()))
            .unwrap_or((0.0, 0.0));
        Ok(RankedAction {
            candidate: Candidate::PlaceTile { space, effect },
            ev: mean * payout + held_value(&placed, player, rules, &d) - held_now,
            variance: var * payout * payout,
        })
    };

    if calc.parallel {
        options.par_iter().map(eval).collect()
    } else {
        options.iter().map(eval).collect()
    }
}
