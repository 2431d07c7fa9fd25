//! Legality checks and legal action generation.

use crate::action::Action;
use crate::color::Color;
use crate::config::Rules;
use crate::state::{OverallSide, PlayerId, RaceState};
use crate::track::{Space, TileEffect};

/// Why a tile cannot go on `space`, or `None` if `owner` may place one there.
///
/// Rules: spaces `1..length` only; one tile per space; no tile next to another tile (when
/// configured); no tile under camels; nothing within `lead_clearance` of the frontmost camel;
/// one tile per player per leg.
pub fn tile_rejection(
    state: &RaceState,
    space: Space,
    owner: PlayerId,
    rules: &Rules,
) -> Option<&'static str> {
    let track = state.track();
    let Some(player) = state.player(owner) else {
        return Some("unknown player");
    };
    if player.placed_tile.is_some() {
        return Some("player already placed a tile this leg");
    }
    if space == 0 || space >= track.length() {
        return Some("space is off the track");
    }
    if track.tile(space).is_some() {
        return Some("space already holds a tile");
    }
    if rules.tiles.forbid_adjacent {
        let len = track.length();
        let before = (space + len - 1) % len;
        let after = (space + 1) % len;
        if track.tile(before).is_some() || track.tile(after).is_some() {
            return Some("space is next to another tile");
        }
    }
    if track.is_occupied(space) {
        return Some("space holds camels");
    }
    if let Some(lead) = track.leader_space() {
        if track.circular_distance(space, lead) <= rules.tiles.lead_clearance {
            return Some("space is too close to the leading camel");
        }
    }
    None
}

/// Spaces where `owner` may place a tile right now.
pub fn legal_tile_spaces(state: &RaceState, owner: PlayerId, rules: &Rules) -> Vec<Space> {
    if state.is_finished() {
        return Vec::new();
    }
    (1..state.track().length())
        .filter(|&s| tile_rejection(state, s, owner, rules).is_none())
        .collect()
}

pub fn can_take_ticket(state: &RaceState, color: Color) -> bool {
    !state.is_finished() && state.next_ticket(color).is_some()
}

/// Overall bets need a finish line and one bet per color per player.
pub fn can_bet_overall(state: &RaceState, player: PlayerId, color: Color, rules: &Rules) -> bool {
    !state.is_finished()
        && rules.finish_laps.is_some()
        && rules.is_racing(color)
        && state
            .player(player)
            .is_some_and(|p| !p.overall_colors.contains(color))
}

/// Every action `player` may apply to `state`.
///
/// Dice draws are listed for every remaining die and face with `player` as roller; the
/// value itself is chance's choice, not the player's.
pub fn legal_actions(state: &RaceState, player: PlayerId, rules: &Rules) -> Vec<Action> {
    let mut out = Vec::new();
    if state.is_finished() || state.player(player).is_none() {
        return out;
    }

    for &color in &rules.racing_camels {
        if can_take_ticket(state, color) {
            out.push(Action::TakeTicket { color, player });
        }
    }

    for space in legal_tile_spaces(state, player, rules) {
        for effect in [TileEffect::Oasis, TileEffect::Mirage] {
            out.push(Action::PlaceTile {
                space,
                effect,
                owner: player,
            });
        }
    }

    for &color in &rules.racing_camels {
        if can_bet_overall(state, player, color, rules) {
            for side in [OverallSide::Winner, OverallSide::Loser] {
                out.push(Action::BetOverall {
                    color,
                    side,
                    player,
                });
            }
        }
    }

    if !state.is_leg_complete(rules) {
        let pool = state.pool();
        for color in pool.remaining_colors().iter() {
            for &value in &rules.die_faces {
                out.push(Action::DrawDice {
                    color,
                    value,
                    roller: Some(player),
                });
            }
        }
        if pool.crazy_available() {
            for &color in rules.crazy_colors() {
                for &value in rules.crazy_faces() {
                    out.push(Action::DrawDice {
                        color,
                        value,
                        roller: Some(player),
                    });
                }
            }
        }
    }
    out
}
