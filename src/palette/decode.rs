use log::{debug, warn};

use super::{Color, Palette, Usage, PALETTE_SIZE};
use crate::config::ResourceEndian;

/// Smallest resource that carries a complete header.
const HEADER_SIZE: usize = 37;
/// Color table offset of the fixed 256-color layout, after its 256-byte mapping and 4-byte
/// header.
const FIXED_TABLE_OFFSET: usize = 260;

const START_OFFSET: usize = 25;
const COUNT_OFFSET: usize = 29;
const FORMAT_OFFSET: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryFormat {
    /// used, r, g, b.
    Variable,
    /// r, g, b; every entry is used.
    Constant,
    Unknown(u8),
}

impl EntryFormat {
    fn new(byte: u8) -> Self {
        match byte {
            0 => Self::Variable,
            1 => Self::Constant,
            x => Self::Unknown(x),
        }
    }

    fn entry_size(self) -> usize {
        match self {
            Self::Variable => 4,
            Self::Constant => 3,
            Self::Unknown(_) => 0,
        }
    }
}

#[derive(Debug)]
struct Layout {
    format: EntryFormat,
    offset: usize,
    start: usize,
    count: usize,
}

impl Layout {
    fn detect(bytes: &[u8], endian: ResourceEndian) -> Self {
        let count = endian.read_u16(bytes, COUNT_OFFSET);

        if bytes[0] == 0 && (bytes[1] == 1 || (bytes[1] == 0 && count == 0)) {
            Self {
                format: EntryFormat::Constant,
                offset: FIXED_TABLE_OFFSET,
                start: 0,
                count: PALETTE_SIZE,
            }
        } else {
            Self {
                format: EntryFormat::new(bytes[FORMAT_OFFSET]),
                offset: HEADER_SIZE,
                start: bytes[START_OFFSET] as usize,
                count: count as usize,
            }
        }
    }
}

impl Palette {
    /// Decodes a palette resource.
    ///
    /// Malformed resources never fail: anything that can't be read yields an empty palette
    /// with identity mapping, which merges as a no-op. Some shipped games contain such data.
    pub fn decode(bytes: &[u8], endian: ResourceEndian) -> Self {
        let mut palette = Self::new();

        if bytes.len() < HEADER_SIZE {
            debug!(
                "palette resource has {} bytes, expected at least a {HEADER_SIZE} byte header",
                bytes.len()
            );
            return palette;
        }

        let layout = Layout::detect(bytes, endian);
        if let EntryFormat::Unknown(format) = layout.format {
            warn!("unknown palette entry format {format}");
            return palette;
        }

        let entry_size = layout.format.entry_size();
        if bytes.len() < layout.offset + entry_size * layout.count {
            warn!(
                "palette resource ended unexpectedly, {} colors at offset {} need {} bytes, got {}",
                layout.count,
                layout.offset,
                layout.offset + entry_size * layout.count,
                bytes.len()
            );
            return palette;
        }

        let end = (layout.start + layout.count).min(PALETTE_SIZE);
        let table = &bytes[layout.offset..];
        for (slot, entry) in (layout.start..end).zip(table.chunks_exact(entry_size)) {
            palette.colors[slot] = match layout.format {
                EntryFormat::Variable => {
                    Color::new(Usage::from_bits_retain(entry[0]), entry[1], entry[2], entry[3])
                }
                _ => Color::used(entry[0], entry[1], entry[2]),
            };
        }

        palette
    }
}
