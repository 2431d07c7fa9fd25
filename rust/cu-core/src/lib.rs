//! cu-core: Camel Up race state, stacking movement rules, betting and the move applier.
//!
//! Everything here is deterministic. Dice values enter the engine as explicit [`Draw`]s;
//! the only randomness lives in [`chance`], which front ends use to sample those draws.

pub mod action;
pub mod chance;
pub mod color;
pub mod config;
pub mod dice;
pub mod engine;
pub mod legal;
pub mod scoring;
pub mod state;
pub mod track;

pub use action::Action;
pub use chance::{random_start, Chance};
pub use color::{Color, ColorSet, ParseColorError, ALL_COLORS, MAX_CAMELS};
pub use config::{
    CalcConfig, Config, ConfigError, CrazyCamelRules, OverallBetRules, PayoutTable, RankPayout,
    Rules, SessionConfig, TicketRules, TileRules,
};
pub use dice::{DicePool, Die, Draw};
pub use engine::{advance, apply, move_on_board, settle, ApplyError};
pub use legal::{can_bet_overall, can_take_ticket, legal_actions, legal_tile_spaces, tile_rejection};
pub use state::{
    Board, OverallBet, OverallSide, Phase, PlayerId, PlayerState, RaceState, StateError, Ticket,
};
pub use track::{
    Camel, Heading, Landing, ParseTileEffectError, Ranking, Space, Tile, TileEffect, Track,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");


#[cfg(test)]
mod dice_tests;
#[cfg(test)]
mod engine_tests;
