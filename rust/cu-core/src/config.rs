//! Rules and calculator configuration.
//!
//! Every rule variant (track length, camel set, ticket values, payout tables, tile rules,
//! crazy camels, finish line) is data. The engine never hardcodes these constants; it reads
//! them from [`Rules`]. The same YAML file configures the CLI and the tests.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::{Color, ColorSet, MAX_CAMELS};

/// Configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Game rules handed to the engine.
    #[serde(default)]
    pub rules: Rules,
    /// Leg enumerator / optimizer settings.
    #[serde(default)]
    pub calc: CalcConfig,
    /// Play session settings used by the CLI.
    #[serde(default)]
    pub session: SessionConfig,
}

/// Data-driven rule set.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Rules {
    /// Number of spaces on the circular track.
    #[serde(default = "default_track_length")]
    pub track_length: u8,
    /// Camels that race and are ranked, in display order.
    #[serde(default = "default_racing_camels")]
    pub racing_camels: Vec<Color>,
    /// Faces of a racing die.
    #[serde(default = "default_die_faces")]
    pub die_faces: Vec<u8>,
    /// Crazy camel variant (one shared die moving non-ranked camels backward).
    #[serde(default)]
    pub crazy_camels: Option<CrazyCamelRules>,
    #[serde(default)]
    pub tickets: TicketRules,
    #[serde(default)]
    pub tiles: TileRules,
    #[serde(default)]
    pub overall: OverallBetRules,
    /// Laps after which the race ends. `None` keeps the race running indefinitely.
    #[serde(default)]
    pub finish_laps: Option<u8>,
    #[serde(default = "default_starting_coins")]
    pub starting_coins: i32,
    /// Coins a player earns for rolling a die.
    #[serde(default = "default_roll_reward")]
    pub roll_reward: i32,
}

fn default_track_length() -> u8 {
    16
}

fn default_racing_camels() -> Vec<Color> {
    vec![
        Color::Blue,
        Color::Green,
        Color::Orange,
        Color::Yellow,
        Color::White,
    ]
}

fn default_die_faces() -> Vec<u8> {
    vec![1, 2, 3]
}

fn default_starting_coins() -> i32 {
    3
}

fn default_roll_reward() -> i32 {
    1
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            track_length: default_track_length(),
            racing_camels: default_racing_camels(),
            die_faces: default_die_faces(),
            crazy_camels: None,
            tickets: TicketRules::default(),
            tiles: TileRules::default(),
            overall: OverallBetRules::default(),
            finish_laps: None,
            starting_coins: default_starting_coins(),
            roll_reward: default_roll_reward(),
        }
    }
}

/// Crazy camels: ranked never, moved backward by one shared die.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CrazyCamelRules {
    #[serde(default = "default_crazy_camels")]
    pub camels: Vec<Color>,
    #[serde(default = "default_die_faces")]
    pub faces: Vec<u8>,
}

fn default_crazy_camels() -> Vec<Color> {
    vec![Color::Black, Color::White]
}

impl Default for CrazyCamelRules {
    fn default() -> Self {
        Self {
            camels: default_crazy_camels(),
            faces: default_die_faces(),
        }
    }
}

/// Leg betting tickets.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TicketRules {
    /// Face values available for every color.
    #[serde(default = "default_ticket_values")]
    pub values: Vec<i32>,
    /// Per-color override of `values`.
    #[serde(default)]
    pub by_color: BTreeMap<Color, Vec<i32>>,
    /// Payout of a ticket by the final leg rank of its camel.
    #[serde(default)]
    pub payout: PayoutTable,
}

fn default_ticket_values() -> Vec<i32> {
    vec![5, 3, 2]
}

impl Default for TicketRules {
    fn default() -> Self {
        Self {
            values: default_ticket_values(),
            by_color: BTreeMap::new(),
            payout: PayoutTable::default(),
        }
    }
}

/// Payout for one rank in a [`PayoutTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RankPayout {
    /// Pays the ticket's face value.
    FaceValue,
    /// Pays a fixed number of coins (may be negative).
    Coins { amount: i32 },
}

/// `{rank -> payout}` table. `ranks[0]` is the leg leader.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PayoutTable {
    #[serde(default = "default_rank_payouts")]
    pub ranks: Vec<RankPayout>,
    /// Payout for every rank beyond the table.
    #[serde(default = "default_otherwise")]
    pub otherwise: i32,
}

fn default_rank_payouts() -> Vec<RankPayout> {
    vec![RankPayout::FaceValue, RankPayout::Coins { amount: 1 }]
}

fn default_otherwise() -> i32 {
    -1
}

impl Default for PayoutTable {
    fn default() -> Self {
        Self {
            ranks: default_rank_payouts(),
            otherwise: default_otherwise(),
        }
    }
}

impl PayoutTable {
    /// Payout for a ticket of `face` value whose camel finished at 0-based `rank`.
    pub fn payout(&self, rank: usize, face: i32) -> i32 {
        match self.ranks.get(rank) {
            Some(RankPayout::FaceValue) => face,
            Some(RankPayout::Coins { amount }) => *amount,
            None => self.otherwise,
        }
    }
}

/// Desert tiles (oasis +1 / mirage -1).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TileRules {
    /// Coins paid to the owner each time a stack lands on the tile.
    #[serde(default = "default_tile_payout")]
    pub payout: i32,
    /// Reject placements next to another tile.
    #[serde(default = "default_true")]
    pub forbid_adjacent: bool,
    /// Reject placements within this many spaces of the frontmost camel.
    #[serde(default = "default_lead_clearance")]
    pub lead_clearance: u8,
}

fn default_tile_payout() -> i32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_lead_clearance() -> u8 {
    1
}

impl Default for TileRules {
    fn default() -> Self {
        Self {
            payout: default_tile_payout(),
            forbid_adjacent: default_true(),
            lead_clearance: default_lead_clearance(),
        }
    }
}

/// Overall winner/loser bets, settled at the end of the race.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OverallBetRules {
    /// Payouts for correct bets in the order they were placed.
    #[serde(default = "default_overall_payouts")]
    pub payouts: Vec<i32>,
    /// Payout for a wrong bet.
    #[serde(default = "default_otherwise")]
    pub wrong: i32,
}

fn default_overall_payouts() -> Vec<i32> {
    vec![8, 5, 3, 2, 1]
}

impl Default for OverallBetRules {
    fn default() -> Self {
        Self {
            payouts: default_overall_payouts(),
            wrong: default_otherwise(),
        }
    }
}

/// Leg enumerator / optimizer settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CalcConfig {
    /// Exact enumeration is refused above this many remaining dice.
    #[serde(default = "default_max_exact_dice")]
    pub max_exact_dice: u8,
    /// Monte Carlo samples used when exact enumeration is refused.
    #[serde(default = "default_samples")]
    pub samples: u32,
    /// Seed for all sampling done by the calculator.
    #[serde(default)]
    pub seed: u64,
    /// Whole-race playouts used to price overall bets.
    #[serde(default = "default_race_samples")]
    pub race_samples: u32,
    /// Playouts stop after this many further legs and are scored as they stand.
    #[serde(default = "default_max_race_legs")]
    pub max_race_legs: u32,
    /// Evaluate tile candidates on the rayon pool.
    #[serde(default = "default_true")]
    pub parallel: bool,
}

fn default_max_exact_dice() -> u8 {
    5
}

fn default_samples() -> u32 {
    20_000
}

fn default_race_samples() -> u32 {
    2_000
}

fn default_max_race_legs() -> u32 {
    32
}

impl Default for CalcConfig {
    fn default() -> Self {
        Self {
            max_exact_dice: default_max_exact_dice(),
            samples: default_samples(),
            seed: 0,
            race_samples: default_race_samples(),
            max_race_legs: default_max_race_legs(),
            parallel: default_true(),
        }
    }
}

/// Settings for an interactive session.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SessionConfig {
    #[serde(default = "default_players")]
    pub players: u8,
    #[serde(default)]
    pub seed: u64,
}

fn default_players() -> u8 {
    4
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            players: default_players(),
            seed: 0,
        }
    }
}

impl Rules {
    /// One-lap race with the original five camels.
    pub fn classic() -> Self {
        Self {
            finish_laps: Some(1),
            ..Self::default()
        }
    }

    /// Second-edition style race: five racers plus black and white crazy camels.
    pub fn crazy() -> Self {
        Self {
            racing_camels: vec![
                Color::Blue,
                Color::Green,
                Color::Yellow,
                Color::Red,
                Color::Purple,
            ],
            crazy_camels: Some(CrazyCamelRules::default()),
            finish_laps: Some(1),
            ..Self::default()
        }
    }

    pub fn racing_set(&self) -> ColorSet {
        self.racing_camels.iter().copied().collect()
    }

    pub fn crazy_colors(&self) -> &[Color] {
        self.crazy_camels
            .as_ref()
            .map(|c| c.camels.as_slice())
            .unwrap_or(&[])
    }

    pub fn crazy_faces(&self) -> &[u8] {
        self.crazy_camels
            .as_ref()
            .map(|c| c.faces.as_slice())
            .unwrap_or(&[])
    }

    #[inline]
    pub fn is_racing(&self, color: Color) -> bool {
        self.racing_camels.contains(&color)
    }

    #[inline]
    pub fn is_crazy(&self, color: Color) -> bool {
        self.crazy_colors().contains(&color)
    }

    /// All camels on the board: racing camels first, then crazy camels.
    pub fn camels(&self) -> impl Iterator<Item = Color> + '_ {
        self.racing_camels
            .iter()
            .chain(self.crazy_colors().iter())
            .copied()
    }

    /// Faces that can come up for a draw moving `color`.
    pub fn faces_for(&self, color: Color) -> &[u8] {
        if self.is_crazy(color) {
            self.crazy_faces()
        } else {
            &self.die_faces
        }
    }

    /// Displacement a racing camel must reach to finish, if the race has a finish line.
    pub fn finish_displacement(&self) -> Option<i32> {
        self.finish_laps
            .map(|laps| laps as i32 * self.track_length as i32)
    }

    /// Ticket face values for `color`, highest first.
    pub fn ticket_values(&self, color: Color) -> Vec<i32> {
        let mut values = self
            .tickets
            .by_color
            .get(&color)
            .cloned()
            .unwrap_or_else(|| self.tickets.values.clone());
        values.sort_unstable_by(|a, b| b.cmp(a));
        values
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| -> Result<(), ConfigError> { Err(ConfigError::Invalid(msg)) };

        if self.racing_camels.is_empty() {
            return invalid("racing_camels must not be empty".into());
        }
        let racing = self.racing_set();
        if racing.len() != self.racing_camels.len() {
            return invalid("racing_camels contains duplicates".into());
        }
        let crazy: ColorSet = self.crazy_colors().iter().copied().collect();
        if crazy.len() != self.crazy_colors().len() {
            return invalid("crazy_camels.camels contains duplicates".into());
        }
        if let Some(c) = &self.crazy_camels {
            if c.camels.is_empty() {
                return invalid("crazy_camels.camels must not be empty".into());
            }
            if c.faces.is_empty() {
                return invalid("crazy_camels.faces must not be empty".into());
            }
        }
        if crazy.bits() & racing.bits() != 0 {
            return invalid("a color cannot be both racing and crazy".into());
        }
        if racing.len() + crazy.len() > MAX_CAMELS {
            return invalid(format!("at most {} camels per race", MAX_CAMELS));
        }
        if self.die_faces.is_empty() {
            return invalid("die_faces must not be empty".into());
        }
        let max_face = self
            .die_faces
            .iter()
            .chain(self.crazy_faces())
            .copied()
            .max()
            .unwrap_or(0);
        if self
            .die_faces
            .iter()
            .chain(self.crazy_faces())
            .any(|&f| f == 0 || f > 6)
        {
            return invalid("die faces must be in 1..=6".into());
        }
        // A move plus a tile shift must never come back around to its own space.
        if (self.track_length as u16) < max_face as u16 + 2 || self.track_length > 64 {
            return invalid(format!(
                "track_length must be in {}..=64, got {}",
                max_face + 2,
                self.track_length
            ));
        }
        if self.finish_laps == Some(0) {
            return invalid("finish_laps must be at least 1".into());
        }
        for color in self.tickets.by_color.keys() {
            if !self.is_racing(*color) {
                return invalid(format!("tickets.by_color names non-racing camel {}", color));
            }
        }
        if self.starting_coins < 0 {
            return invalid("starting_coins must be non-negative".into());
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string. The result is validated.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Classic one-lap race; what the CLI uses when no config file is given.
    pub fn classic() -> Self {
        Self {
            rules: Rules::classic(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rules.validate()?;
        if !(2..=8).contains(&self.session.players) {
            return Err(ConfigError::Invalid(format!(
                "session.players must be in 2..=8, got {}",
                self.session.players
            )));
        }
        if self.calc.samples == 0 {
            return Err(ConfigError::Invalid("calc.samples must be positive".into()));
        }
        Ok(())
    }
}
