//! Circular track model: camel stacks, desert tiles and stacking movement.
//!
//! Positions are kept as a signed total displacement per camel. The space a camel stands on is
//! `displacement mod length`, so wrapping past the last space only bumps the lap while ranking
//! keeps working on displacement. Stack heights start at 0 (bottom) and are contiguous per space.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::color::{Color, MAX_CAMELS};
use crate::state::{PlayerId, StateError};

/// Index of a space on the track, `0..length`.
pub type Space = u8;

/// Direction a camel travels when its die comes up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Heading {
    Forward,
    Backward,
}

impl Heading {
    #[inline]
    pub fn sign(self) -> i32 {
        match self {
            Heading::Forward => 1,
            Heading::Backward => -1,
        }
    }
}

/// A camel on the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Camel {
    pub color: Color,
    pub heading: Heading,
    displacement: i32,
    height: u8,
}

impl Camel {
    /// Total signed distance travelled from space 0.
    #[inline]
    pub fn displacement(&self) -> i32 {
        self.displacement
    }

    /// Position in the stack, 0 = bottom.
    #[inline]
    pub fn height(&self) -> u8 {
        self.height
    }

    #[inline]
    pub fn space(&self, length: u8) -> Space {
        self.displacement.rem_euclid(length as i32) as Space
    }

    /// Completed laps (negative for camels that went backward past space 0).
    #[inline]
    pub fn lap(&self, length: u8) -> i32 {
        self.displacement.div_euclid(length as i32)
    }
}

/// Effect of a desert tile on a stack landing on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileEffect {
    /// One more space in the direction of travel; the stack stays on top.
    Oasis,
    /// One space back against the direction of travel; the stack slides underneath.
    Mirage,
}

impl TileEffect {
    #[inline]
    pub fn offset(self) -> i32 {
        match self {
            TileEffect::Oasis => 1,
            TileEffect::Mirage => -1,
        }
    }
}

impl fmt::Display for TileEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileEffect::Oasis => f.write_str("+1"),
            TileEffect::Mirage => f.write_str("-1"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tile effect '{0}' (expected forward/+1 or backward/-1)")]
pub struct ParseTileEffectError(pub String);

impl FromStr for TileEffect {
    type Err = ParseTileEffectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "+" | "+1" | "f" | "forward" | "oasis" => Ok(TileEffect::Oasis),
            "-" | "-1" | "b" | "backward" | "mirage" => Ok(TileEffect::Mirage),
            _ => Err(ParseTileEffectError(s.to_string())),
        }
    }
}

/// A tile placed by a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    pub owner: PlayerId,
    pub effect: TileEffect,
}

/// Where a move ended and what it triggered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Landing {
    /// Space where the moved stack came to rest.
    pub space: Space,
    /// Tile that fired, with its space. At most one per move: tile shifts never chain.
    pub tile: Option<(Space, Tile)>,
    /// A forward camel in the moved stack reached the finish displacement.
    pub finished: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    OnTop,
    Beneath,
}

/// Ordered racing camels, leader first.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ranking {
    len: u8,
    order: [Color; MAX_CAMELS],
}

impl Ranking {
    /// # Panics
    /// Panics if more than `MAX_CAMELS` colors are given.
    pub fn from_colors(colors: &[Color]) -> Ranking {
        assert!(colors.len() <= MAX_CAMELS, "too many camels in ranking");
        let mut order = [Color::default(); MAX_CAMELS];
        order[..colors.len()].copy_from_slice(colors);
        Ranking {
            len: colors.len() as u8,
            order,
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[Color] {
        &self.order[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn leader(&self) -> Option<Color> {
        self.as_slice().first().copied()
    }

    pub fn last(&self) -> Option<Color> {
        self.as_slice().last().copied()
    }

    /// 0-based rank of `color`.
    pub fn rank_of(&self, color: Color) -> Option<usize> {
        self.as_slice().iter().position(|&c| c == color)
    }
}

impl fmt::Display for Ranking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.as_slice().iter().enumerate() {
            if i > 0 {
                f.write_str(" > ")?;
            }
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Ranking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ranking({})", self)
    }
}

impl Serialize for Ranking {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.as_slice())
    }
}

impl<'de> Deserialize<'de> for Ranking {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let colors = Vec::<Color>::deserialize(deserializer)?;
        if colors.len() > MAX_CAMELS {
            return Err(serde::de::Error::custom("too many camels in ranking"));
        }
        Ok(Ranking::from_colors(&colors))
    }
}

/// The circular track with every camel and tile on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    length: u8,
    camels: Vec<Camel>,
    tiles: Vec<Option<Tile>>,
}

impl Track {
    /// Build a track from `(color, heading, displacement)` placements.
    ///
    /// Camels are stacked in the given order: a camel placed on an occupied space goes on top.
    pub fn new(length: u8, placements: &[(Color, Heading, i32)]) -> Result<Track, StateError> {
        if placements.len() > MAX_CAMELS {
            return Err(StateError::Corrupt("too many camels".into()));
        }
        let mut track = Track {
            length,
            camels: Vec::with_capacity(placements.len()),
            tiles: vec![None; length as usize],
        };
        for &(color, heading, displacement) in placements {
            if track.index_of(color).is_some() {
                return Err(StateError::DuplicateCamel(color));
            }
            let height = track.stack_height(displacement.rem_euclid(length as i32) as Space);
            track.camels.push(Camel {
                color,
                heading,
                displacement,
                height,
            });
        }
        Ok(track)
    }

    #[inline]
    pub fn length(&self) -> u8 {
        self.length
    }

    pub fn camels(&self) -> &[Camel] {
        &self.camels
    }

    pub fn camel(&self, color: Color) -> Option<&Camel> {
        self.camels.iter().find(|c| c.color == color)
    }

    #[inline]
    fn index_of(&self, color: Color) -> Option<usize> {
        self.camels.iter().position(|c| c.color == color)
    }

    #[inline]
    pub fn space_of(&self, displacement: i32) -> Space {
        displacement.rem_euclid(self.length as i32) as Space
    }

    pub fn stack_height(&self, space: Space) -> u8 {
        self.camels
            .iter()
            .filter(|c| c.space(self.length) == space)
            .count() as u8
    }

    pub fn is_occupied(&self, space: Space) -> bool {
        self.camels.iter().any(|c| c.space(self.length) == space)
    }

    /// Colors on `space`, bottom to top.
    pub fn stack_at(&self, space: Space) -> Vec<Color> {
        let mut stack: Vec<&Camel> = self
            .camels
            .iter()
            .filter(|c| c.space(self.length) == space)
            .collect();
        stack.sort_by_key(|c| c.height);
        stack.into_iter().map(|c| c.color).collect()
    }

    pub fn tile(&self, space: Space) -> Option<Tile> {
        self.tiles.get(space as usize).copied().flatten()
    }

    /// Placed tiles in space order.
    pub fn tiles(&self) -> impl Iterator<Item = (Space, Tile)> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .filter_map(|(s, t)| t.map(|t| (s as Space, t)))
    }

    pub(crate) fn place_tile(&mut self, space: Space, tile: Tile) {
        self.tiles[space as usize] = Some(tile);
    }

    pub(crate) fn clear_tiles(&mut self) {
        self.tiles.iter_mut().for_each(|t| *t = None);
    }

    /// Steps between two spaces going whichever way round is shorter.
    pub fn circular_distance(&self, a: Space, b: Space) -> u8 {
        let d = (a as i32 - b as i32).rem_euclid(self.length as i32) as u8;
        d.min(self.length - d)
    }

    /// Forward camels ordered by displacement, then stack height (higher is ahead).
    ///
    /// Displacement counts laps, so on a track without a finish a camel that has lapped the
    /// field ranks ahead of camels stacked on top of it. Height only breaks ties between
    /// camels that have covered the same distance.
    pub fn ranking(&self) -> Ranking {
        let mut racers = [(0i32, 0u8, Color::default()); MAX_CAMELS];
        let mut n = 0usize;
        for c in self.camels.iter().filter(|c| c.heading == Heading::Forward) {
            racers[n] = (c.displacement, c.height, c.color);
            n += 1;
        }
        racers[..n].sort_unstable_by(|a, b| (b.0, b.1).cmp(&(a.0, a.1)));
        let mut order = [Color::default(); MAX_CAMELS];
        for (slot, r) in order.iter_mut().zip(&racers[..n]) {
            *slot = r.2;
        }
        Ranking {
            len: n as u8,
            order,
        }
    }

    /// Space of the frontmost forward camel.
    pub fn leader_space(&self) -> Option<Space> {
        self.ranking()
            .leader()
            .and_then(|c| self.camel(c))
            .map(|c| c.space(self.length))
    }

    /// True once any forward camel has reached `finish` displacement.
    pub fn finish_reached(&self, finish: Option<i32>) -> bool {
        finish.is_some_and(|f| {
            self.camels
                .iter()
                .any(|c| c.heading == Heading::Forward && c.displacement >= f)
        })
    }

    /// Pure variant of [`Track::move_camel`].
    pub fn moved(
        &self,
        color: Color,
        steps: u8,
        finish: Option<i32>,
    ) -> Result<(Track, Landing), StateError> {
        let mut next = self.clone();
        let landing = next.move_camel(color, steps, finish)?;
        Ok((next, landing))
    }

    /// Move `color` and every camel stacked above it `steps` spaces along its heading.
    ///
    /// The carried stack keeps its order and lands on top of the destination stack. A tile on
    /// the destination fires once (no chaining): an oasis carries the stack one further space
    /// on top, a mirage drops it one space back underneath the camels there. A stack that
    /// crosses the finish ignores the tile.
    pub fn move_camel(
        &mut self,
        color: Color,
        steps: u8,
        finish: Option<i32>,
    ) -> Result<Landing, StateError> {
        let idx = self.index_of(color).ok_or(StateError::UnknownCamel(color))?;
        let mover = self.camels[idx];
        let group = self.stack_from(mover.space(self.length), mover.height);
        let sign = mover.heading.sign();

        let mut landing = Landing {
            space: self.relocate(&group, sign * steps as i32, Placement::OnTop),
            tile: None,
            finished: false,
        };
        landing.finished = self.group_finished(&group, finish);
        if landing.finished {
            return Ok(landing);
        }

        if let Some(tile) = self.tile(landing.space) {
            landing.tile = Some((landing.space, tile));
            let (shift, placement) = match tile.effect {
                TileEffect::Oasis => (sign, Placement::OnTop),
                TileEffect::Mirage => (-sign, Placement::Beneath),
            };
            landing.space = self.relocate(&group, shift, placement);
            landing.finished = self.group_finished(&group, finish);
        }
        Ok(landing)
    }

    /// Indices of the camels on `space` at `height` or above, bottom first.
    fn stack_from(&self, space: Space, height: u8) -> Vec<usize> {
        let mut group: Vec<usize> = (0..self.camels.len())
            .filter(|&i| {
                let c = &self.camels[i];
                c.space(self.length) == space && c.height >= height
            })
            .collect();
        group.sort_by_key(|&i| self.camels[i].height);
        group
    }

    fn relocate(&mut self, group: &[usize], delta: i32, placement: Placement) -> Space {
        let length = self.length;
        let base = self.camels[group[0]].height;
        let src = self.camels[group[0]].space(length);
        let dest = self.space_of(self.camels[group[0]].displacement + delta);
        debug_assert_ne!(src, dest, "a move must leave its space");

        let lift = match placement {
            Placement::OnTop => self.stack_height(dest),
            Placement::Beneath => {
                let n = group.len() as u8;
                for c in self.camels.iter_mut().filter(|c| c.space(length) == dest) {
                    c.height += n;
                }
                0
            }
        };
        for &i in group {
            let c = &mut self.camels[i];
            c.height = lift + (c.height - base);
            c.displacement += delta;
        }
        dest
    }

    fn group_finished(&self, group: &[usize], finish: Option<i32>) -> bool {
        finish.is_some_and(|f| {
            group.iter().any(|&i| {
                let c = &self.camels[i];
                c.heading == Heading::Forward && c.displacement >= f
            })
        })
    }

    /// Check stacking invariants: one camel per (space, height), heights contiguous from 0.
    pub fn validate(&self) -> Result<(), StateError> {
        if self.tiles.len() != self.length as usize {
            return Err(StateError::Corrupt(format!(
                "{} tile slots on a track of length {}",
                self.tiles.len(),
                self.length
            )));
        }
        for (i, c) in self.camels.iter().enumerate() {
            if self.camels[..i].iter().any(|o| o.color == c.color) {
                return Err(StateError::DuplicateCamel(c.color));
            }
        }
        for space in 0..self.length {
            let mut heights: Vec<u8> = self
                .camels
                .iter()
                .filter(|c| c.space(self.length) == space)
                .map(|c| c.height)
                .collect();
            heights.sort_unstable();
            if heights.iter().enumerate().any(|(i, &h)| h as usize != i) {
                return Err(StateError::Corrupt(format!(
                    "stack on space {} is not contiguous: heights {:?}",
                    space, heights
                )));
            }
        }
        Ok(())
    }
}
