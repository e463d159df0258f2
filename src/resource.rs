use std::{borrow::Cow, collections::HashMap};

/// Palette resource id that stands for "no palette".
pub const NO_RESOURCE: u16 = 0xFFFF;
/// Resource holding the default VGA palette.
pub const DEFAULT_PALETTE: u16 = 999;

/// Supplies raw palette resources from the game's archives.
pub trait ResourceSource {
    fn palette(&self, id: u16) -> Option<Cow<'_, [u8]>>;
}

/// Palette resources held in memory.
#[derive(Debug, Default, Clone)]
pub struct ResourceMap {
    palettes: HashMap<u16, Vec<u8>>,
}

impl ResourceMap {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn insert(&mut self, id: u16, bytes: Vec<u8>) {
        self.palettes.insert(id, bytes);
    }
}

impl ResourceSource for ResourceMap {
    fn palette(&self, id: u16) -> Option<Cow<'_, [u8]>> {
        self.palettes.get(&id).map(|bytes| Cow::Borrowed(bytes.as_slice()))
    }
}
