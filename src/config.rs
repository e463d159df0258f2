use crate::PaletteError;

/// Distance metric used by the color matcher.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Sum of absolute channel differences. Used by the older interpreters.
    #[default]
    Unsigned,
    /// Each channel difference wraps to a signed byte before taking its absolute value. Later
    /// interpreters shipped with this defect and game art was tuned against it.
    SignedByte,
}

/// How a candidate palette is folded into the system palette.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Copy used colors over at their own index.
    #[default]
    Insert,
    /// Reconcile against colors already in use, reassigning slots where needed.
    Merge,
}

/// Byte order of 16-bit header fields in palette resources.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ResourceEndian {
    #[default]
    Little,
    /// Macintosh and Amiga releases store header words big-endian.
    Big,
}

impl ResourceEndian {
    pub fn read_u16(self, bytes: &[u8], offset: usize) -> u16 {
        let word = [bytes[offset], bytes[offset + 1]];
        match self {
            Self::Little => u16::from_le_bytes(word),
            Self::Big => u16::from_be_bytes(word),
        }
    }
}

/// Interpreter generation, as reported by game detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SciVersion {
    V0,
    V01,
    V1Early,
    V1Middle,
    V1Late,
    V1_1,
    V2,
    V2_1,
    V3,
}

/// Session-wide palette settings, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub match_mode: MatchMode,
    pub merge_strategy: MergeStrategy,
    /// Usable colors of the display mode: 16 (EGA), 32 or 64 (Amiga) or 256 (VGA).
    pub color_count: u16,
    pub endian: ResourceEndian,
}

impl Config {
    /// Picks strategy and matcher for an interpreter generation.
    ///
    /// Before 1.1 every game merges and uses the unsigned matcher. Some 1.1 interpreters still
    /// merge, which game detection reports through `merging_detected`; those also keep the
    /// unsigned matcher. Everything later copies colors over and carries the signed-byte defect.
    pub fn for_version(version: SciVersion, merging_detected: bool, color_count: u16) -> Self {
        let merging = match version {
            v if v < SciVersion::V1_1 => true,
            SciVersion::V1_1 => merging_detected,
            _ => false,
        };

        Self {
            match_mode: if merging {
                MatchMode::Unsigned
            } else {
                MatchMode::SignedByte
            },
            merge_strategy: if merging {
                MergeStrategy::Merge
            } else {
                MergeStrategy::Insert
            },
            color_count,
            endian: ResourceEndian::Little,
        }
    }

    pub fn with_endian(mut self, endian: ResourceEndian) -> Self {
        self.endian = endian;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), PaletteError> {
        match self.color_count {
            16 | 32 | 64 | 256 => Ok(()),
            n => Err(PaletteError::UnsupportedColorCount(n)),
        }
    }

    pub fn is_ega(&self) -> bool {
        self.color_count == 16
    }

    pub fn is_amiga(&self) -> bool {
        matches!(self.color_count, 32 | 64)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            match_mode: MatchMode::default(),
            merge_strategy: MergeStrategy::default(),
            color_count: 256,
            endian: ResourceEndian::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_heuristic() {
        let old = Config::for_version(SciVersion::V1Early, false, 256);
        assert_eq!(old.merge_strategy, MergeStrategy::Merge);
        assert_eq!(old.match_mode, MatchMode::Unsigned);

        // In-between 1.1 interpreters follow detection for both choices.
        let demo = Config::for_version(SciVersion::V1_1, true, 256);
        assert_eq!(demo.merge_strategy, MergeStrategy::Merge);
        assert_eq!(demo.match_mode, MatchMode::Unsigned);
        let late = Config::for_version(SciVersion::V1_1, false, 256);
        assert_eq!(late.merge_strategy, MergeStrategy::Insert);
        assert_eq!(late.match_mode, MatchMode::SignedByte);

        let sci32 = Config::for_version(SciVersion::V2_1, true, 256);
        assert_eq!(sci32.merge_strategy, MergeStrategy::Insert);
        assert_eq!(sci32.match_mode, MatchMode::SignedByte);
    }

    #[test]
    fn color_count_validation() {
        for n in [16, 32, 64, 256] {
            let config = Config {
                color_count: n,
                ..Default::default()
            };
            assert!(config.validate().is_ok());
        }
        let config = Config {
            color_count: 128,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(PaletteError::UnsupportedColorCount(128))
        );
    }

    #[test]
    fn header_words() {
        let bytes = [0x34, 0x12];
        assert_eq!(ResourceEndian::Little.read_u16(&bytes, 0), 0x1234);
        assert_eq!(ResourceEndian::Big.read_u16(&bytes, 0), 0x3412);

        let mac =
            Config::for_version(SciVersion::V1_1, false, 256).with_endian(ResourceEndian::Big);
        assert_eq!(mac.endian, ResourceEndian::Big);
        assert_eq!(mac.merge_strategy, MergeStrategy::Insert);
    }
}
