mod color;
mod decode;
mod ega;

pub use color::{Color, Rgb, Usage};
pub use ega::{blend_colors, EGA_COLORS};

pub(crate) use ega::EgaMix;

#[cfg(test)]
pub(crate) use decode::tests::header_resource;

pub const PALETTE_SIZE: usize = 256;
pub const DEFAULT_INTENSITY: u8 = 100;

/// A 256-slot color table with per-slot intensity and merge mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub colors: [Color; PALETTE_SIZE],
    /// Brightness multiplier in percent, 0-200.
    pub intensity: [u8; PALETTE_SIZE],
    /// For a candidate palette: the system slot each original index ended up in.
    pub mapping: [u8; PALETTE_SIZE],
    pub timestamp: u32,
}

impl Palette {
    /// An all-free palette with identity mapping.
    pub fn new() -> Self {
        Default::default()
    }

    /// The initial system palette: free slots except hardcoded black at 0 and white at 255.
    pub fn system() -> Self {
        let mut palette = Self::new();
        palette.colors[0] = Color::used(0, 0, 0);
        palette.colors[255] = Color::used(255, 255, 255);
        palette
    }

    pub fn color(&self, slot: u8) -> &Color {
        &self.colors[slot as usize]
    }

    pub fn used_count(&self) -> usize {
        self.colors.iter().filter(|c| c.is_used()).count()
    }

    /// Packs the colors as 4 bytes per slot: used, r, g, b.
    pub fn to_bytes(&self) -> [u8; PALETTE_SIZE * 4] {
        let mut bytes = [0; PALETTE_SIZE * 4];
        for (chunk, color) in bytes.chunks_exact_mut(4).zip(&self.colors) {
            chunk.copy_from_slice(&[color.used.bits(), color.r, color.g, color.b]);
        }
        bytes
    }

    /// Inverse of [Palette::to_bytes]. Intensity, mapping and timestamp are reset.
    pub fn from_bytes(bytes: &[u8; PALETTE_SIZE * 4]) -> Self {
        let mut palette = Self::new();
        for (color, chunk) in palette.colors.iter_mut().zip(bytes.chunks_exact(4)) {
            *color = Color::new(Usage::from_bits_retain(chunk[0]), chunk[1], chunk[2], chunk[3]);
        }
        palette
    }
}

impl Default for Palette {
    fn default() -> Self {
        let mut mapping = [0; PALETTE_SIZE];
        for (slot, entry) in mapping.iter_mut().enumerate() {
            *entry = slot as u8;
        }

        Self {
            colors: [Color::default(); PALETTE_SIZE],
            intensity: [DEFAULT_INTENSITY; PALETTE_SIZE],
            mapping,
            timestamp: 0,
        }
    }
}
