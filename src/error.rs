use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaletteError {
    #[error("unsupported display color count {0}, expected 16, 32, 64 or 256")]
    UnsupportedColorCount(u16),

    #[error("color {0} isn't remapped")]
    NotRemapped(u8),

    #[error("platform clut must be 768 bytes, got {0}")]
    BadClutLength(usize),

    #[error("palette restore buffer must be 1024 bytes, got {0}")]
    BadRestoreBuffer(usize),

    #[error("invalid palette save state: {0}")]
    Snapshot(String),
}
