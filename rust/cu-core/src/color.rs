//! Camel colors and a compact bitset over them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on camels in one race (racing + crazy).
pub const MAX_CAMELS: usize = 8;

/// Every camel color known to the engine, in index order.
pub const ALL_COLORS: [Color; MAX_CAMELS] = [
    Color::Blue,
    Color::Green,
    Color::Orange,
    Color::Yellow,
    Color::White,
    Color::Red,
    Color::Purple,
    Color::Black,
];

/// Camel identity. Which colors race and which are crazy camels is a rules decision.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    #[default]
    Blue,
    Green,
    Orange,
    Yellow,
    White,
    Red,
    Purple,
    Black,
}

impl Color {
    #[inline]
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(idx: u8) -> Option<Color> {
        ALL_COLORS.get(idx as usize).copied()
    }

    /// Lowercase name, as used in config files and CLI input.
    pub fn name(self) -> &'static str {
        match self {
            Color::Blue => "blue",
            Color::Green => "green",
            Color::Orange => "orange",
            Color::Yellow => "yellow",
            Color::White => "white",
            Color::Red => "red",
            Color::Purple => "purple",
            Color::Black => "black",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        let mut chars = name.chars();
        if let Some(first) = chars.next() {
            write!(f, "{}{}", first.to_ascii_uppercase(), chars.as_str())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown camel color '{0}'")]
pub struct ParseColorError(pub String);

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        ALL_COLORS
            .iter()
            .copied()
            .find(|c| c.name() == lower)
            .ok_or_else(|| ParseColorError(s.to_string()))
    }
}

/// Set of colors packed into one byte (bit `i` = `Color::from_index(i)`).
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorSet(u8);

impl ColorSet {
    pub const EMPTY: ColorSet = ColorSet(0);

    #[inline]
    pub fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn from_bits(bits: u8) -> ColorSet {
        ColorSet(bits)
    }

    #[inline]
    pub fn contains(self, color: Color) -> bool {
        (self.0 >> color.index()) & 1 != 0
    }

    /// Returns true if the color was newly inserted.
    #[inline]
    pub fn insert(&mut self, color: Color) -> bool {
        let had = self.contains(color);
        self.0 |= 1 << color.index();
        !had
    }

    /// Returns true if the color was present.
    #[inline]
    pub fn remove(&mut self, color: Color) -> bool {
        let had = self.contains(color);
        self.0 &= !(1 << color.index());
        had
    }

    #[inline]
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn is_subset(self, other: ColorSet) -> bool {
        self.0 & !other.0 == 0
    }

    /// Colors in index order.
    pub fn iter(self) -> impl Iterator<Item = Color> {
        ALL_COLORS.into_iter().filter(move |c| self.contains(*c))
    }
}

impl FromIterator<Color> for ColorSet {
    fn from_iter<I: IntoIterator<Item = Color>>(iter: I) -> Self {
        let mut set = ColorSet::EMPTY;
        for c in iter {
            set.insert(c);
        }
        set
    }
}

impl fmt::Debug for ColorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
