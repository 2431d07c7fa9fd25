//! Compact memo key for a mid-leg board.

use cu_core::{Board, MAX_CAMELS};

/// Packed (camel positions, remaining dice) key.
///
/// Tiles are left out: they cannot change while a leg is being enumerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LegKey {
    camels: u128,
    dice: u16,
}

impl LegKey {
    pub fn of(board: &Board) -> LegKey {
        // Layout (low -> high bits), 16 bits per camel in track order:
        // - displacement: low 12 bits (wrapping; a leg moves a camel far less than 4096)
        // - stack height: 4 bits
        //
        // Total: 8 * 16 = 128 bits.
        let camels = board.track.camels();
        debug_assert!(camels.len() <= MAX_CAMELS);

        let mut x: u128 = 0;
        let mut shift: u32 = 0;
        for c in camels {
            x |= ((c.displacement() as u32 & 0xFFF) as u128) << shift;
            x |= ((c.height() as u128) & 0xF) << (shift + 12);
            shift += 16;
        }

        let pool = &board.pool;
        let dice = pool.remaining_colors().bits() as u16 | (pool.crazy_available() as u16) << 8;
        LegKey { camels: x, dice }
    }
}
