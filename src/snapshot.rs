//! Binary save state of the palette subsystem.
//!
//! The layout is a 12-byte header followed by a list of chunks, each made of a 4-byte
//! description, a little-endian `u32` size and the data:
//!
//! | Offset | Size | Content |
//! |---|---|---|
//! | 0 | 3 | `PAL` |
//! | 3 | 1 | format version |
//! | 4 | 4 | size of the uncompressed chunk list |
//! | 8 | 4 | size of the zlib-compressed chunk list, `0` or `0xFFFFFFFF` when stored plain |

use std::io::{Read, Write};

use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};
use log::warn;

use crate::{
    palette::{Palette, PALETTE_SIZE},
    vary::VarySession,
    PaletteError,
};

const MAGIC: &[u8; 3] = b"PAL";
const FORMAT_VERSION: u8 = 1;
const HEADER_SIZE: usize = 12;

const NO_VARY: i32 = -1;

/// Everything needed to bring a palette subsystem back to a saved point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteState {
    pub(crate) colors: Box<[u8; PALETTE_SIZE * 4]>,
    pub(crate) intensity: Box<[u8; PALETTE_SIZE]>,
    pub(crate) timestamp: u32,
    pub(crate) vary: Option<VarySession>,
}

impl PaletteState {
    pub(crate) fn capture(palette: &Palette, vary: Option<&VarySession>) -> Self {
        Self {
            colors: Box::new(palette.to_bytes()),
            intensity: Box::new(palette.intensity),
            timestamp: palette.timestamp,
            vary: vary.cloned(),
        }
    }

    /// Serializes the state, optionally zlib-compressing the chunk list.
    pub fn encode(&self, compress: bool) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend(serialize(&*self.colors, "COLR"));
        body.extend(serialize(&*self.intensity, "INTS"));
        body.extend(serialize(&self.timestamp, "TIME"));

        match &self.vary {
            Some(vary) => {
                body.extend(serialize(&(vary.resource_id as i32), "VRID"));
                body.extend(serialize(&vary.origin.to_bytes(), "VORG"));
                body.extend(serialize(&vary.target.to_bytes(), "VTGT"));
                body.extend(serialize(&vary.step, "VSTP"));
                body.extend(serialize(&vary.step_stop, "VEND"));
                body.extend(serialize(&vary.direction, "VDIR"));
                body.extend(serialize(&vary.ticks, "VTCK"));
                body.extend(serialize(&vary.paused, "VPAU"));
                body.extend(serialize(&vary.signal, "VSIG"));
            }
            None => body.extend(serialize(&NO_VARY, "VRID")),
        }

        let mut output = Vec::with_capacity(HEADER_SIZE + body.len());
        output.extend_from_slice(MAGIC);
        output.push(FORMAT_VERSION);
        output.extend_from_slice(&(body.len() as u32).to_le_bytes());

        let compressed = if compress {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            match encoder.write_all(&body).and_then(|_| encoder.finish()) {
                Ok(compressed) => Some(compressed),
                Err(e) => {
                    warn!("save state compression failed, storing it plain: {e}");
                    None
                }
            }
        } else {
            None
        };

        match compressed {
            Some(compressed) => {
                output.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
                output.extend_from_slice(&compressed);
            }
            None => {
                output.extend_from_slice(&0u32.to_le_bytes());
                output.extend_from_slice(&body);
            }
        }

        output
    }

    /// Parses a save state written by [PaletteState::encode].
    ///
    /// # Errors
    ///
    /// Returns an error if the data is truncated, corrupt or from another format version.
    pub fn decode(bytes: &[u8]) -> Result<Self, PaletteError> {
        if bytes.len() < HEADER_SIZE || &bytes[0..3] != MAGIC {
            return Err(snapshot_error("not a palette save state"));
        }
        if bytes[3] != FORMAT_VERSION {
            return Err(snapshot_error(format!(
                "unsupported format version {}",
                bytes[3]
            )));
        }

        let (header, rest) = bytes.split_at(HEADER_SIZE);
        let body_size = read_u32(&header[4..8]) as usize;
        let body = match read_u32(&header[8..12]) {
            0x00000000 | 0xFFFFFFFF => {
                if rest.len() != body_size {
                    return Err(snapshot_error("file size doesn't match header"));
                }
                rest.to_vec()
            }
            compressed_size => {
                if rest.len() != compressed_size as usize {
                    return Err(snapshot_error("compressed size doesn't match header"));
                }
                // One byte past the declared size is enough to tell an oversized body apart.
                let mut body = Vec::new();
                ZlibDecoder::new(rest)
                    .take(body_size as u64 + 1)
                    .read_to_end(&mut body)
                    .map_err(|e| snapshot_error(format!("decompression failed: {e}")))?;
                if body.len() != body_size {
                    return Err(snapshot_error("file size doesn't match header"));
                }
                body
            }
        };

        Self::from_chunks(&body)
    }

    fn from_chunks(body: &[u8]) -> Result<Self, PaletteError> {
        let mut colors = None;
        let mut intensity = None;
        let mut timestamp = 0;

        let mut resource_id = NO_VARY;
        let mut origin: Option<[u8; PALETTE_SIZE * 4]> = None;
        let mut target: Option<[u8; PALETTE_SIZE * 4]> = None;
        let mut step = 0;
        let mut step_stop = 0;
        let mut direction = 0;
        let mut ticks = 0;
        let mut paused = 0;
        let mut signal = 0;

        for (description, section) in Subchunk::new(body)? {
            match description {
                "COLR" => colors = Some(deserialize(section)?),
                "INTS" => intensity = Some(deserialize(section)?),
                "TIME" => timestamp = deserialize(section)?,
                "VRID" => resource_id = deserialize(section)?,
                "VORG" => origin = Some(deserialize(section)?),
                "VTGT" => target = Some(deserialize(section)?),
                "VSTP" => step = deserialize(section)?,
                "VEND" => step_stop = deserialize(section)?,
                "VDIR" => direction = deserialize(section)?,
                "VTCK" => ticks = deserialize(section)?,
                "VPAU" => paused = deserialize(section)?,
                "VSIG" => signal = deserialize(section)?,
                _ => warn!("unrecognized save state section `{description}`"),
            }
        }

        let vary = match resource_id {
            NO_VARY => None,
            id => {
                let (Some(origin), Some(target)) = (origin, target) else {
                    return Err(snapshot_error("palette vary is missing its palettes"));
                };
                Some(VarySession {
                    resource_id: id as u16,
                    origin: Palette::from_bytes(&origin),
                    target: Palette::from_bytes(&target),
                    step,
                    step_stop,
                    direction,
                    ticks,
                    paused,
                    signal,
                    timer_armed: step != step_stop,
                })
            }
        };

        Ok(Self {
            colors: colors.ok_or_else(|| snapshot_error("missing palette colors"))?,
            intensity: intensity.unwrap_or_else(|| Box::new([100; PALETTE_SIZE])),
            timestamp,
            vary,
        })
    }
}

fn snapshot_error(message: impl Into<String>) -> PaletteError {
    PaletteError::Snapshot(message.into())
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// The chunks of a save state body, in file order.
struct Subchunk<'a> {
    sections: Vec<(&'a str, &'a [u8])>,
}

impl<'a> Subchunk<'a> {
    fn new(mut bytes: &'a [u8]) -> Result<Self, PaletteError> {
        let mut sections = Vec::new();

        while !bytes.is_empty() {
            if bytes.len() < 8 {
                return Err(snapshot_error("chunk header ended unexpectedly"));
            }

            let (header, rest) = bytes.split_at(8);
            let size = read_u32(&header[4..8]) as usize;
            if rest.len() < size {
                return Err(snapshot_error("chunk length doesn't match header"));
            }

            let (section, rest) = rest.split_at(size);
            bytes = rest;

            let description = std::str::from_utf8(&header[0..4])
                .map_err(|_| snapshot_error("invalid chunk description"))?
                .trim_end_matches('\0');
            sections.push((description, section));
        }

        Ok(Self { sections })
    }
}

impl<'a> IntoIterator for Subchunk<'a> {
    type Item = (&'a str, &'a [u8]);
    type IntoIter = <Vec<Self::Item> as IntoIterator>::IntoIter;

    /// Iterates over tuples of a chunk's description and data.
    fn into_iter(self) -> Self::IntoIter {
        self.sections.into_iter()
    }
}

fn serialize<T: ToBytes + ?Sized>(value: &T, description: &str) -> Vec<u8> {
    let data = value.to_bytes();
    let mut chunk = Vec::with_capacity(8 + data.len());

    let mut name = [0u8; 4];
    for (dst, src) in name.iter_mut().zip(description.bytes()) {
        *dst = src;
    }
    chunk.extend_from_slice(&name);
    chunk.extend_from_slice(&(data.len() as u32).to_le_bytes());
    chunk.extend_from_slice(&data);
    chunk
}

fn deserialize<T: FromBytes>(bytes: &[u8]) -> Result<T, PaletteError> {
    T::from_bytes(bytes).ok_or_else(|| snapshot_error("invalid section size"))
}

trait ToBytes {
    fn to_bytes(&self) -> Vec<u8>;
}

trait FromBytes: Sized {
    fn from_bytes(bytes: &[u8]) -> Option<Self>;
}

macro_rules! impl_int_bytes {
    ($($ty:ty),*) => {
        $(
            impl ToBytes for $ty {
                fn to_bytes(&self) -> Vec<u8> {
                    self.to_le_bytes().into()
                }
            }

            impl FromBytes for $ty {
                fn from_bytes(bytes: &[u8]) -> Option<Self> {
                    Some(<$ty>::from_le_bytes(bytes.try_into().ok()?))
                }
            }
        )*
    };
}

impl_int_bytes!(u16, u32, i16, i32);

impl<const N: usize> ToBytes for [u8; N] {
    fn to_bytes(&self) -> Vec<u8> {
        self.to_vec()
    }
}

impl<const N: usize> FromBytes for [u8; N] {
    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        bytes.try_into().ok()
    }
}

impl<const N: usize> FromBytes for Box<[u8; N]> {
    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        Some(Box::new(bytes.try_into().ok()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Color;

    fn state_with_vary() -> PaletteState {
        let mut palette = Palette::system();
        palette.colors[3] = Color::used(1, 2, 3);
        palette.intensity[3] = 60;
        palette.timestamp = 1234;

        let mut target = Palette::system();
        target.colors[3] = Color::used(100, 100, 100);
        // Only the colors of the vary palettes are saved.
        let origin = Palette::from_bytes(&palette.to_bytes());
        let mut vary = VarySession::new(77, origin, target, 4, 64, 1);
        vary.advance(10);
        vary.pause(true);
        vary.signal = 3;

        PaletteState::capture(&palette, Some(&vary))
    }

    #[test]
    fn plain_state() {
        let state = PaletteState::capture(&Palette::system(), None);
        let bytes = state.encode(false);
        assert_eq!(&bytes[0..4], b"PAL\x01");
        assert_eq!(PaletteState::decode(&bytes), Ok(state));
    }

    #[test]
    fn compressed_state_with_vary() {
        let state = state_with_vary();
        let plain = state.encode(false);
        let compressed = state.encode(true);
        assert!(compressed.len() < plain.len());

        let decoded = PaletteState::decode(&compressed).unwrap();
        assert_eq!(decoded, state);
        let vary = decoded.vary.unwrap();
        assert_eq!(vary.resource_id(), 77);
        assert_eq!(vary.step(), 11);
        assert!(vary.is_paused());
        assert_eq!(vary.signal, 3);
        assert_eq!(decoded.intensity[3], 60);
        assert_eq!(decoded.timestamp, 1234);
    }

    #[test]
    fn rejects_garbage() {
        assert!(PaletteState::decode(b"FCS").is_err());
        assert!(PaletteState::decode(&[0; 32]).is_err());

        let mut bytes = PaletteState::capture(&Palette::system(), None).encode(false);
        bytes[3] = 9;
        assert!(PaletteState::decode(&bytes).is_err());

        let mut bytes = PaletteState::capture(&Palette::system(), None).encode(false);
        bytes.pop();
        assert_eq!(
            PaletteState::decode(&bytes),
            Err(PaletteError::Snapshot("file size doesn't match header".into()))
        );
    }

    #[test]
    fn oversized_compressed_body_is_rejected() {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&vec![0; 1 << 20]).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut bytes = b"PAL\x01".to_vec();
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&compressed);

        assert_eq!(
            PaletteState::decode(&bytes),
            Err(PaletteError::Snapshot("file size doesn't match header".into()))
        );
    }

    #[test]
    fn unknown_chunks_are_skipped() {
        let state = PaletteState::capture(&Palette::system(), None);
        let mut body = serialize(&*state.colors, "COLR");
        body.extend(serialize(&7u16, "XTRA"));
        body.extend(serialize(&NO_VARY, "VRID"));

        let decoded = PaletteState::from_chunks(&body).unwrap();
        assert_eq!(decoded.colors, state.colors);
        assert_eq!(decoded.vary, None);
    }

    #[test]
    fn missing_colors_is_an_error() {
        let body = serialize(&5u32, "TIME");
        assert!(PaletteState::from_chunks(&body).is_err());
    }
}
