use crate::{config::MatchMode, palette::Palette};

/// Flag set in [ColorMatch::raw] when the match is exact.
pub const MATCH_PERFECT: u16 = 0x8000;
pub const MATCH_COLORMASK: u16 = 0xFF;

/// Result of a nearest-color search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorMatch {
    pub slot: u8,
    pub exact: bool,
}

impl ColorMatch {
    /// The packed form scripts see: the slot, with [MATCH_PERFECT] set for exact matches.
    pub fn raw(self) -> u16 {
        if self.exact {
            self.slot as u16 | MATCH_PERFECT
        } else {
            self.slot as u16
        }
    }
}

impl From<ColorMatch> for u16 {
    fn from(value: ColorMatch) -> Self {
        value.raw()
    }
}

/// Finds the used slot closest to the given color.
///
/// Ties go to the highest slot. If no slot is used at all, slot 255 is returned as an inexact
/// match.
pub fn match_color(palette: &Palette, mode: MatchMode, r: u8, g: u8, b: u8) -> ColorMatch {
    let mut best_difference = 0x7FFF;
    let mut best_slot = 255;

    match mode {
        MatchMode::Unsigned => {
            for (slot, color) in palette.colors.iter().enumerate() {
                if !color.is_used() {
                    continue;
                }
                let difference = color.r.abs_diff(r) as u16
                    + color.g.abs_diff(g) as u16
                    + color.b.abs_diff(b) as u16;
                if difference <= best_difference {
                    best_difference = difference;
                    best_slot = slot as u8;
                }
            }
        }
        MatchMode::SignedByte => {
            for (slot, color) in palette.colors.iter().enumerate() {
                if !color.is_used() {
                    continue;
                }
                let difference = signed_byte_difference(color.r, r) as u16
                    + signed_byte_difference(color.g, g) as u16
                    + signed_byte_difference(color.b, b) as u16;
                if difference <= best_difference {
                    best_difference = difference;
                    best_slot = slot as u8;
                }
            }
        }
    }

    ColorMatch {
        slot: best_slot,
        exact: best_difference == 0,
    }
}

/// Channel distance as computed with 8-bit signed arithmetic: anything 128 apart or more
/// wraps around and looks close.
#[inline]
fn signed_byte_difference(a: u8, b: u8) -> u8 {
    (a.wrapping_sub(b) as i8).unsigned_abs()
}
