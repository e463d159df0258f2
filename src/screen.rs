use crate::{
    palette::{Palette, Rgb, PALETTE_SIZE},
    PaletteError,
};

/// The host display's hardware palette.
pub trait Display {
    /// Colors currently set on the display.
    fn palette(&self) -> [Rgb; PALETTE_SIZE];

    /// Replaces `count` colors starting at `start`. Ranges past the last slot are cut short.
    fn set_palette(&mut self, colors: &[Rgb; PALETTE_SIZE], start: usize, count: usize);
}

/// A display without output, for headless sessions.
#[derive(Debug, Clone)]
pub struct NullDisplay {
    colors: [Rgb; PALETTE_SIZE],
}

impl NullDisplay {
    pub fn new() -> Self {
        Default::default()
    }
}

impl Default for NullDisplay {
    fn default() -> Self {
        Self {
            colors: [Rgb::BLACK; PALETTE_SIZE],
        }
    }
}

impl Display for NullDisplay {
    fn palette(&self) -> [Rgb; PALETTE_SIZE] {
        self.colors
    }

    fn set_palette(&mut self, colors: &[Rgb; PALETTE_SIZE], start: usize, count: usize) {
        let end = start.saturating_add(count).min(PALETTE_SIZE);
        let start = start.min(end);
        self.colors[start..end].copy_from_slice(&colors[start..end]);
    }
}

/// Platform color table whose non-black entries override the system palette on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacClut {
    table: Box<[u8; PALETTE_SIZE * 3]>,
}

impl MacClut {
    pub fn new(bytes: &[u8]) -> Result<Self, PaletteError> {
        let table: [u8; PALETTE_SIZE * 3] = bytes
            .try_into()
            .map_err(|_| PaletteError::BadClutLength(bytes.len()))?;
        Ok(Self {
            table: Box::new(table),
        })
    }

    /// The color shown for `slot`, if the table overrides it. Black and white stay hardcoded.
    pub fn color(&self, slot: usize) -> Option<Rgb> {
        if slot == 0 || slot == PALETTE_SIZE - 1 {
            return None;
        }

        let entry = &self.table[slot * 3..slot * 3 + 3];
        let color = Rgb::new(entry[0], entry[1], entry[2]);
        if color.is_black() {
            return None;
        }
        Some(Rgb::new(
            mac_gamma(color.r),
            mac_gamma(color.g),
            mac_gamma(color.b),
        ))
    }
}

/// Converts a Macintosh gamma channel value to the interpreter's gamma.
fn mac_gamma(component: u8) -> u8 {
    (component as f32 * 255.0).sqrt() as u8
}

/// Projects the system palette onto `screen`: overrides from `clut`, intensity-scaled colors for
/// used slots, everything else left as it is.
pub fn project(palette: &Palette, clut: Option<&MacClut>, screen: &mut [Rgb; PALETTE_SIZE]) {
    for (slot, entry) in screen.iter_mut().enumerate() {
        if let Some(color) = clut.and_then(|clut| clut.color(slot)) {
            *entry = color;
        } else if palette.colors[slot].is_used() {
            *entry = palette.colors[slot].scaled(palette.intensity[slot] as u16);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::palette::Color;

    /// Records every palette upload. Clones share the log.
    #[derive(Debug, Clone)]
    pub(crate) struct RecordingDisplay {
        pub(crate) colors: Rc<RefCell<[Rgb; PALETTE_SIZE]>>,
        pub(crate) uploads: Rc<RefCell<usize>>,
    }

    impl RecordingDisplay {
        pub(crate) fn new() -> Self {
            Self {
                colors: Rc::new(RefCell::new([Rgb::new(1, 2, 3); PALETTE_SIZE])),
                uploads: Rc::new(RefCell::new(0)),
            }
        }

        pub(crate) fn color(&self, slot: usize) -> Rgb {
            self.colors.borrow()[slot]
        }

        pub(crate) fn uploads(&self) -> usize {
            *self.uploads.borrow()
        }
    }

    impl Display for RecordingDisplay {
        fn palette(&self) -> [Rgb; PALETTE_SIZE] {
            *self.colors.borrow()
        }

        fn set_palette(&mut self, colors: &[Rgb; PALETTE_SIZE], start: usize, count: usize) {
            assert_eq!((start, count), (0, PALETTE_SIZE));
            *self.colors.borrow_mut() = *colors;
            *self.uploads.borrow_mut() += 1;
        }
    }

    #[test]
    fn projection_scales_used_slots() {
        let mut palette = Palette::system();
        palette.colors[1] = Color::used(100, 150, 200);
        palette.intensity[1] = 150;
        palette.colors[2] = Color::default();

        let mut screen = [Rgb::new(9, 9, 9); PALETTE_SIZE];
        project(&palette, None, &mut screen);

        assert_eq!(screen[0], Rgb::BLACK);
        assert_eq!(screen[1], Rgb::new(150, 225, 255));
        assert_eq!(screen[2], Rgb::new(9, 9, 9));
        assert_eq!(screen[255], Rgb::WHITE);
    }

    #[test]
    fn clut_overrides_non_black_entries() {
        let mut bytes = vec![0; PALETTE_SIZE * 3];
        bytes[3..6].copy_from_slice(&[64, 0, 255]);
        bytes[0..3].copy_from_slice(&[255, 255, 255]);
        let clut = MacClut::new(&bytes).unwrap();

        let mut palette = Palette::system();
        palette.colors[1] = Color::used(1, 1, 1);
        palette.colors[2] = Color::used(2, 2, 2);

        let mut screen = [Rgb::BLACK; PALETTE_SIZE];
        project(&palette, Some(&clut), &mut screen);

        assert_eq!(screen[0], Rgb::BLACK);
        assert_eq!(screen[1], Rgb::new(127, 0, 255));
        assert_eq!(screen[2], Rgb::new(2, 2, 2));
    }

    #[test]
    fn clut_length_is_checked() {
        assert_eq!(MacClut::new(&[0; 10]), Err(PaletteError::BadClutLength(10)));
    }

    #[test]
    fn null_display_keeps_colors() {
        let mut display = NullDisplay::new();
        let mut colors = [Rgb::BLACK; PALETTE_SIZE];
        colors[4] = Rgb::new(4, 4, 4);
        colors[10] = Rgb::new(10, 10, 10);
        display.set_palette(&colors, 4, 2);
        assert_eq!(display.palette()[4], Rgb::new(4, 4, 4));
        assert_eq!(display.palette()[10], Rgb::BLACK);

        colors[255] = Rgb::WHITE;
        display.set_palette(&colors, 250, 20);
        display.set_palette(&colors, 300, 1);
        assert_eq!(display.palette()[255], Rgb::WHITE);
    }
}
