mod clock;
mod config;
mod cycle;
mod error;
mod gfx;
pub mod matcher;
pub mod palette;
mod remap;
mod resource;
mod screen;
mod snapshot;
mod vary;

pub use clock::{Clock, ManualClock, SystemClock, TICKS_PER_SECOND};
pub use config::{Config, MatchMode, MergeStrategy, ResourceEndian, SciVersion};
pub use cycle::PaletteCycler;
pub use error::PaletteError;
pub use gfx::{insert, GfxPalette};
pub use matcher::{match_color, ColorMatch};
pub use palette::{Color, Palette, Rgb, Usage};
pub use remap::{RemapKind, RemapTable};
pub use resource::{ResourceMap, ResourceSource, DEFAULT_PALETTE, NO_RESOURCE};
pub use screen::{project, Display, MacClut, NullDisplay};
pub use snapshot::PaletteState;
pub use vary::{VarySession, VARY_STEPS};
