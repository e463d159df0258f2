use crate::{palette::PALETTE_SIZE, PaletteError};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RemapKind {
    #[default]
    None,
    ByRange,
    ByPercent,
}

/// Alternate colors drawn in place of the screen color when a remapped color is painted over it.
#[derive(Debug, Clone)]
pub struct RemapTable {
    enabled: bool,
    kinds: [RemapKind; PALETTE_SIZE],
    by_range: [u8; PALETTE_SIZE],
    by_percent: [u8; PALETTE_SIZE],
    /// Darkening level the percent table has to be rebuilt with on the next palette sync.
    pending_percent: Option<u8>,
}

impl RemapTable {
    pub fn new() -> Self {
        Default::default()
    }

    /// Disables remapping and restores identity tables.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn kind(&self, color: u8) -> RemapKind {
        self.kinds[color as usize]
    }

    pub fn is_remapped(&self, color: u8) -> bool {
        self.enabled && self.kinds[color as usize] != RemapKind::None
    }

    /// Maps `screen_color` through the table selected for `color`.
    pub fn resolve(&self, color: u8, screen_color: u8) -> Result<u8, PaletteError> {
        match self.kinds[color as usize] {
            RemapKind::ByRange => Ok(self.by_range[screen_color as usize]),
            RemapKind::ByPercent => Ok(self.by_percent[screen_color as usize]),
            RemapKind::None => Err(PaletteError::NotRemapped(color)),
        }
    }

    /// Shifts screen colors `from..=to` by `base`.
    pub fn set_range(&mut self, color: u8, from: u8, to: u8, base: u8) {
        self.enabled = true;
        for screen_color in from..=to {
            self.by_range[screen_color as usize] = screen_color.wrapping_add(base);
        }
        self.kinds[color as usize] = RemapKind::ByRange;
    }

    /// Marks `color` as darkening by `percent`. The caller fills the table with
    /// [RemapTable::rebuild_percent], now and after every palette change.
    pub fn set_percent(&mut self, color: u8, percent: u8) {
        self.enabled = true;
        self.pending_percent = Some(percent);
        self.kinds[color as usize] = RemapKind::ByPercent;
    }

    pub fn pending_percent(&self) -> Option<u8> {
        self.pending_percent
    }

    pub(crate) fn take_pending_percent(&mut self) -> Option<u8> {
        self.pending_percent.take()
    }

    /// Refills the percent table, one entry per screen color.
    pub fn rebuild_percent(&mut self, mut find: impl FnMut(u8) -> u8) {
        for (screen_color, entry) in self.by_percent.iter_mut().enumerate() {
            *entry = find(screen_color as u8);
        }
    }
}

impl Default for RemapTable {
    fn default() -> Self {
        let mut identity = [0; PALETTE_SIZE];
        for (slot, entry) in identity.iter_mut().enumerate() {
            *entry = slot as u8;
        }

        Self {
            enabled: false,
            kinds: [RemapKind::None; PALETTE_SIZE],
            by_range: identity,
            by_percent: identity,
            pending_percent: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_remap() {
        let mut table = RemapTable::new();
        assert!(!table.is_remapped(3));

        table.set_range(3, 10, 12, 100);
        assert!(table.is_remapped(3));
        assert!(!table.is_remapped(4));
        assert_eq!(table.resolve(3, 9), Ok(9));
        assert_eq!(table.resolve(3, 10), Ok(110));
        assert_eq!(table.resolve(3, 12), Ok(112));
        assert_eq!(table.resolve(3, 13), Ok(13));
    }

    #[test]
    fn range_wraps() {
        let mut table = RemapTable::new();
        table.set_range(1, 250, 255, 10);
        assert_eq!(table.resolve(1, 255), Ok(9));
    }

    #[test]
    fn percent_remap() {
        let mut table = RemapTable::new();
        table.set_percent(7, 50);
        assert_eq!(table.pending_percent(), Some(50));
        table.rebuild_percent(|c| c / 2);
        assert_eq!(table.resolve(7, 200), Ok(100));
        assert_eq!(table.take_pending_percent(), Some(50));
        assert_eq!(table.pending_percent(), None);
    }

    #[test]
    fn unremapped_resolve_is_an_error() {
        let table = RemapTable::new();
        assert_eq!(table.resolve(9, 0), Err(PaletteError::NotRemapped(9)));
    }

    #[test]
    fn reset_restores_identity() {
        let mut table = RemapTable::new();
        table.set_range(3, 0, 255, 1);
        table.set_percent(4, 10);
        table.rebuild_percent(|_| 0);
        table.reset();

        assert!(!table.is_enabled());
        assert_eq!(table.kind(3), RemapKind::None);
        assert_eq!(table.pending_percent(), None);
        table.set_range(3, 0, 0, 0);
        for c in 1..=255 {
            assert_eq!(table.resolve(3, c), Ok(c));
        }
    }

    #[test]
    fn disabled_table_reports_nothing() {
        let mut table = RemapTable::new();
        table.set_range(3, 0, 0, 1);
        table.enabled = false;
        assert!(!table.is_remapped(3));
    }
}
