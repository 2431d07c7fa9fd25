//! Race state snapshots and per-player state.
//!
//! A [`RaceState`] is a value: the engine never mutates one in place, every action produces a
//! new snapshot. Fields are private and read through accessors.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::{Color, ColorSet};
use crate::config::Rules;
use crate::dice::DicePool;
use crate::track::{Heading, Ranking, Space, Track};

/// Invariant violations in a race state or its setup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("camel {0} is not part of this race")]
    UnknownCamel(Color),
    #[error("camel {0} is placed more than once")]
    DuplicateCamel(Color),
    #[error("camel {0} has no starting space")]
    MissingCamel(Color),
    #[error("player count must be in 2..=8, got {0}")]
    PlayerCount(usize),
    #[error("corrupt race state: {0}")]
    Corrupt(String),
}

/// Seat index of a player. Displayed as a team letter (A, B, ...).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u8);

impl PlayerId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 26 {
            write!(f, "{}", (b'A' + self.0) as char)
        } else {
            write!(f, "P{}", self.0)
        }
    }
}

/// A leg betting ticket held by a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticket {
    pub color: Color,
    pub value: i32,
}

/// Which end of the race an overall bet is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallSide {
    Winner,
    Loser,
}

impl fmt::Display for OverallSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverallSide::Winner => f.write_str("winner"),
            OverallSide::Loser => f.write_str("loser"),
        }
    }
}

/// An overall bet, kept in placement order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverallBet {
    pub color: Color,
    pub player: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub coins: i32,
    /// Tickets taken this leg.
    pub tickets: Vec<Ticket>,
    /// Space of the tile placed this leg, if any.
    pub placed_tile: Option<Space>,
    /// Colors this player already used for an overall bet.
    pub overall_colors: ColorSet,
}

impl PlayerState {
    fn new(coins: i32) -> Self {
        Self {
            coins,
            tickets: Vec::new(),
            placed_tile: None,
            overall_colors: ColorSet::EMPTY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    Running,
    /// Race over; `winners` hold the most coins.
    Finished { winners: Vec<PlayerId> },
}

/// Track plus dice: the part of the state a leg's dice draws change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub track: Track,
    pub pool: DicePool,
}

impl Board {
    /// The leg ends once every racing die is drawn, or as soon as the race finishes.
    pub fn is_leg_complete(&self, rules: &Rules) -> bool {
        self.pool.is_leg_over() || self.track.finish_reached(rules.finish_displacement())
    }
}

/// Immutable snapshot of a race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceState {
    board: Board,
    /// Remaining ticket face values per racing color, highest first.
    tickets: BTreeMap<Color, Vec<i32>>,
    players: Vec<PlayerState>,
    overall_winner: Vec<OverallBet>,
    overall_loser: Vec<OverallBet>,
    /// Number of completed legs.
    leg: u32,
    phase: Phase,
}

impl RaceState {
    /// New race with camels at the given starting spaces.
    ///
    /// Every camel of `rules` must appear exactly once. Camels sharing a space are stacked in
    /// the order given, later entries on top.
    pub fn new(
        rules: &Rules,
        players: usize,
        start: &[(Color, Space)],
    ) -> Result<RaceState, StateError> {
        if !(2..=8).contains(&players) {
            return Err(StateError::PlayerCount(players));
        }
        let mut placements = Vec::with_capacity(start.len());
        for &(color, space) in start {
            let heading = if rules.is_racing(color) {
                Heading::Forward
            } else if rules.is_crazy(color) {
                Heading::Backward
            } else {
                return Err(StateError::UnknownCamel(color));
            };
            if space >= rules.track_length {
                return Err(StateError::Corrupt(format!(
                    "space {} is outside a track of length {}",
                    space, rules.track_length
                )));
            }
            placements.push((color, heading, space as i32));
        }
        if let Some(missing) = rules.camels().find(|c| !start.iter().any(|(s, _)| s == c)) {
            return Err(StateError::MissingCamel(missing));
        }

        let track = Track::new(rules.track_length, &placements)?;
        Ok(RaceState {
            board: Board {
                track,
                pool: DicePool::new(rules),
            },
            tickets: fresh_tickets(rules),
            players: (0..players)
                .map(|_| PlayerState::new(rules.starting_coins))
                .collect(),
            overall_winner: Vec::new(),
            overall_loser: Vec::new(),
            leg: 0,
            phase: Phase::Running,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn track(&self) -> &Track {
        &self.board.track
    }

    pub fn pool(&self) -> &DicePool {
        &self.board.pool
    }

    pub fn ranking(&self) -> Ranking {
        self.board.track.ranking()
    }

    pub fn is_leg_complete(&self, rules: &Rules) -> bool {
        self.board.is_leg_complete(rules)
    }

    /// Ticket values still available for `color`, highest first.
    pub fn tickets_left(&self, color: Color) -> &[i32] {
        self.tickets.get(&color).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Face value of the ticket the next taker of `color` would receive.
    pub fn next_ticket(&self, color: Color) -> Option<i32> {
        self.tickets_left(color).first().copied()
    }

    pub fn players(&self) -> &[PlayerState] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&PlayerState> {
        self.players.get(id.index())
    }

    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> {
        (0..self.players.len() as u8).map(PlayerId)
    }

    pub fn overall_bets(&self, side: OverallSide) -> &[OverallBet] {
        match side {
            OverallSide::Winner => &self.overall_winner,
            OverallSide::Loser => &self.overall_loser,
        }
    }

    /// Completed legs.
    pub fn leg(&self) -> u32 {
        self.leg
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished { .. })
    }

    pub fn winners(&self) -> Option<&[PlayerId]> {
        match &self.phase {
            Phase::Finished { winners } => Some(winners),
            Phase::Running => None,
        }
    }

    pub(crate) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub(crate) fn player_mut(&mut self, id: PlayerId) -> &mut PlayerState {
        &mut self.players[id.index()]
    }

    pub(crate) fn players_mut(&mut self) -> &mut [PlayerState] {
        &mut self.players
    }

    pub(crate) fn take_ticket(&mut self, color: Color) -> Option<i32> {
        let stack = self.tickets.get_mut(&color)?;
        if stack.is_empty() {
            None
        } else {
            Some(stack.remove(0))
        }
    }

    pub(crate) fn overall_bets_mut(&mut self, side: OverallSide) -> &mut Vec<OverallBet> {
        match side {
            OverallSide::Winner => &mut self.overall_winner,
            OverallSide::Loser => &mut self.overall_loser,
        }
    }

    pub(crate) fn restock_tickets(&mut self, rules: &Rules) {
        self.tickets = fresh_tickets(rules);
    }

    pub(crate) fn next_leg(&mut self) {
        self.leg += 1;
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    /// Check every entity invariant against `rules`. Use after deserializing a snapshot.
    pub fn validate(&self, rules: &Rules) -> Result<(), StateError> {
        let track = &self.board.track;
        track.validate()?;
        if track.length() != rules.track_length {
            return Err(StateError::Corrupt(format!(
                "track length {} does not match rules ({})",
                track.length(),
                rules.track_length
            )));
        }
        for camel in track.camels() {
            let expected = if rules.is_racing(camel.color) {
                Heading::Forward
            } else if rules.is_crazy(camel.color) {
                Heading::Backward
            } else {
                return Err(StateError::UnknownCamel(camel.color));
            };
            if camel.heading != expected {
                return Err(StateError::Corrupt(format!(
                    "camel {} has the wrong heading",
                    camel.color
                )));
            }
        }
        if let Some(missing) = rules.camels().find(|c| track.camel(*c).is_none()) {
            return Err(StateError::MissingCamel(missing));
        }
        if !(2..=8).contains(&self.players.len()) {
            return Err(StateError::PlayerCount(self.players.len()));
        }
        if !self
            .board
            .pool
            .remaining_colors()
            .is_subset(rules.racing_set())
        {
            return Err(StateError::Corrupt("dice pool holds unknown colors".into()));
        }
        for (color, stack) in &self.tickets {
            if !rules.is_racing(*color) {
                return Err(StateError::UnknownCamel(*color));
            }
            if stack.windows(2).any(|w| w[0] < w[1]) {
                return Err(StateError::Corrupt(format!(
                    "tickets for {} are not in descending order",
                    color
                )));
            }
        }
        for (space, tile) in track.tiles() {
            if tile.owner.index() >= self.players.len() {
                return Err(StateError::Corrupt(format!(
                    "tile on space {} belongs to unknown player {}",
                    space, tile.owner
                )));
            }
        }
        if !self.is_finished() && self.is_leg_complete(rules) {
            return Err(StateError::Corrupt(
                "leg is complete but was never settled".into(),
            ));
        }
        let bets = self.overall_winner.iter().chain(&self.overall_loser);
        for bet in bets {
            if bet.player.index() >= self.players.len() {
                return Err(StateError::Corrupt(format!(
                    "overall bet by unknown player {}",
                    bet.player
                )));
            }
        }
        Ok(())
    }
}

fn fresh_tickets(rules: &Rules) -> BTreeMap<Color, Vec<i32>> {
    rules
        .racing_camels
        .iter()
        .map(|&c| (c, rules.ticket_values(c)))
        .collect()
}
