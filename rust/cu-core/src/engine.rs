//! Move applier: state transitions for every [`Action`].
//!
//! This module is the single place that produces new `RaceState`s. `apply` never touches its
//! input: it validates, then transforms a private copy. Dice values arrive already sampled, so
//! the same action sequence from the same state always gives the same result.

use thiserror::Error;

use crate::action::Action;
use crate::config::Rules;
use crate::dice::{Die, Draw};
use crate::legal::tile_rejection;
use crate::scoring;
use crate::state::{Board, OverallBet, OverallSide, Phase, PlayerId, RaceState, StateError, Ticket};
use crate::track::{Landing, Tile};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// The action breaks a rule; the caller should pick another one.
    #[error("invalid action ({action}): {reason}")]
    InvalidAction {
        action: Action,
        reason: &'static str,
    },
    /// A draw after the leg ended. Callers must check for leg completion first.
    #[error("the leg is already over")]
    LegAlreadyOver,
    #[error("the race has finished")]
    RaceFinished,
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),
    #[error(transparent)]
    State(#[from] StateError),
}

/// Apply `action` to `state`, producing the next state.
///
/// A draw that completes the leg also settles it: tickets are paid, tiles removed, ticket
/// stacks and the dice pool restored. A draw that takes a racing camel over the finish settles
/// the leg and the overall bets and ends the race.
pub fn apply(state: &RaceState, action: Action, rules: &Rules) -> Result<RaceState, ApplyError> {
    if state.is_finished() {
        return Err(ApplyError::RaceFinished);
    }
    if let Some(player) = action.player() {
        if state.player(player).is_none() {
            return Err(ApplyError::UnknownPlayer(player));
        }
    }

    let mut next = state.clone();
    match action {
        Action::TakeTicket { color, player } => {
            let value = next.take_ticket(color).ok_or(ApplyError::InvalidAction {
                action,
                reason: "no ticket left for this camel",
            })?;
            next.player_mut(player).tickets.push(Ticket { color, value });
        }
        Action::PlaceTile {
            space,
            effect,
            owner,
        } => {
            if let Some(reason) = tile_rejection(state, space, owner, rules) {
                return Err(ApplyError::InvalidAction { action, reason });
            }
            next.board_mut().track.place_tile(space, Tile { owner, effect });
            next.player_mut(owner).placed_tile = Some(space);
        }
        Action::BetOverall {
            color,
            side,
            player,
        } => {
            let reason = if rules.finish_laps.is_none() {
                Some("the race has no finish line")
            } else if !rules.is_racing(color) {
                Some("camel is not racing")
            } else if next.player_mut(player).overall_colors.contains(color) {
                Some("player already bet on this camel")
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(ApplyError::InvalidAction { action, reason });
            }
            next.player_mut(player).overall_colors.insert(color);
            next.overall_bets_mut(side).push(OverallBet { color, player });
        }
        Action::DrawDice {
            color,
            value,
            roller,
        } => {
            let landing = move_on_board(next.board_mut(), Draw::new(color, value), rules)
                .map_err(|e| match e {
                    ApplyError::InvalidAction { reason, .. } => {
                        ApplyError::InvalidAction { action, reason }
                    }
                    other => other,
                })?;
            credit_tile(&mut next, landing, rules);
            if let Some(roller) = roller {
                next.player_mut(roller).coins += rules.roll_reward;
            }

            settle_due(&mut next, rules);
        }
    }
    Ok(next)
}

/// Settle a leg that [`advance`] completed but left open.
///
/// Pays the leg (and the race, if a camel crossed the finish) exactly as the completing
/// [`apply`] would have. A state with nothing to settle comes back unchanged.
pub fn settle(state: &RaceState, rules: &Rules) -> Result<RaceState, ApplyError> {
    if state.is_finished() {
        return Err(ApplyError::RaceFinished);
    }
    let mut next = state.clone();
    settle_due(&mut next, rules);
    Ok(next)
}

/// Raw draw transition: move the camel, credit the tile owner, mark the die drawn.
///
/// Unlike [`apply`] this never settles the leg, so the leg-end position stays observable.
/// Used to walk every draw sequence of a leg.
pub fn advance(state: &RaceState, draw: Draw, rules: &Rules) -> Result<RaceState, ApplyError> {
    if state.is_finished() {
        return Err(ApplyError::RaceFinished);
    }
    let mut next = state.clone();
    let landing = move_on_board(next.board_mut(), draw, rules)?;
    credit_tile(&mut next, landing, rules);
    Ok(next)
}

/// Apply one draw to a board: the shared core of [`apply`] and [`advance`].
///
/// Checks happen before anything moves, so on error the board is unchanged.
pub fn move_on_board(board: &mut Board, draw: Draw, rules: &Rules) -> Result<Landing, ApplyError> {
    let action = Action::draw(draw, None);
    if board.is_leg_complete(rules) {
        return Err(ApplyError::LegAlreadyOver);
    }
    let die = Die::for_color(draw.color, rules).ok_or(ApplyError::InvalidAction {
        action,
        reason: "camel is not in this race",
    })?;
    if !rules.faces_for(draw.color).contains(&draw.value) {
        return Err(ApplyError::InvalidAction {
            action,
            reason: "value is not a face of this die",
        });
    }
    if !board.pool.is_available(die) {
        return Err(ApplyError::InvalidAction {
            action,
            reason: "die already drawn this leg",
        });
    }

    let landing = board
        .track
        .move_camel(draw.color, draw.value, rules.finish_displacement())?;
    board.pool.take(die);
    Ok(landing)
}

fn credit_tile(state: &mut RaceState, landing: Landing, rules: &Rules) {
    if let Some((_, tile)) = landing.tile {
        state.player_mut(tile.owner).coins += rules.tiles.payout;
    }
}

fn settle_due(state: &mut RaceState, rules: &Rules) {
    if state.track().finish_reached(rules.finish_displacement()) {
        settle_leg(state, rules);
        finish_race(state, rules);
    } else if state.pool().is_leg_over() {
        settle_leg(state, rules);
    }
}

fn settle_leg(state: &mut RaceState, rules: &Rules) {
    let ranking = state.ranking();
    let payouts = scoring::leg_payouts(state.players(), &ranking, rules);
    for (player, delta) in state.players_mut().iter_mut().zip(payouts) {
        player.coins += delta;
        player.tickets.clear();
        player.placed_tile = None;
    }
    state.restock_tickets(rules);
    let board = state.board_mut();
    board.track.clear_tiles();
    board.pool.reset();
    state.next_leg();
}

fn finish_race(state: &mut RaceState, rules: &Rules) {
    let ranking = state.ranking();
    for (side, actual) in [
        (OverallSide::Winner, ranking.leader()),
        (OverallSide::Loser, ranking.last()),
    ] {
        let deltas = scoring::overall_payouts(state.overall_bets(side), actual, &rules.overall);
        for (player, delta) in deltas {
            state.player_mut(player).coins += delta;
        }
    }
    let winners = scoring::winners(state.players());
    state.set_phase(Phase::Finished { winners });
}
