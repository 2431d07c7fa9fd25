//! Player and engine actions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::dice::Draw;
use crate::state::{OverallSide, PlayerId};
use crate::track::{Space, TileEffect};

/// One discrete choice applied to a race state.
///
/// The derived ordering is the stable tie-break order used when ranking candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Take the highest remaining leg ticket for `color`.
    TakeTicket { color: Color, player: PlayerId },
    /// Put a desert tile on `space`.
    PlaceTile {
        space: Space,
        effect: TileEffect,
        owner: PlayerId,
    },
    /// Bet on the overall race winner or loser.
    BetOverall {
        color: Color,
        side: OverallSide,
        player: PlayerId,
    },
    /// Move a camel by an already sampled die value. `roller` is paid for rolling, if given.
    DrawDice {
        color: Color,
        value: u8,
        roller: Option<PlayerId>,
    },
}

impl Action {
    /// Player acting, if any.
    pub fn player(&self) -> Option<PlayerId> {
        match *self {
            Action::TakeTicket { player, .. } => Some(player),
            Action::PlaceTile { owner, .. } => Some(owner),
            Action::BetOverall { player, .. } => Some(player),
            Action::DrawDice { roller, .. } => roller,
        }
    }

    pub fn draw(draw: Draw, roller: Option<PlayerId>) -> Action {
        Action::DrawDice {
            color: draw.color,
            value: draw.value,
            roller,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Action::TakeTicket { color, player } => write!(f, "{} takes a {} ticket", player, color),
            Action::PlaceTile {
                space,
                effect,
                owner,
            } => write!(f, "{} places a {} tile on space {}", owner, effect, space),
            Action::BetOverall {
                color,
                side,
                player,
            } => write!(f, "{} bets {} is the overall {}", player, color, side),
            Action::DrawDice {
                color,
                value,
                roller: Some(p),
            } => write!(f, "{} rolls {} {}", p, color, value),
            Action::DrawDice {
                color,
                value,
                roller: None,
            } => write!(f, "{} moves {}", color, value),
        }
    }
}
