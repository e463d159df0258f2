bitflags::bitflags! {
    /// Claim state of a palette slot. Empty means the slot is free.
    ///
    /// Resources may store arbitrary usage bytes; unknown bits are kept as-is.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Usage: u8 {
        const USED = 0x01;
        /// Slot was handed out as an approximation during an exhausted merge.
        const SHARED = 0x10;

        const _ = !0;
    }
}

/// A color as the display backend sees it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn is_black(&self) -> bool {
        *self == Self::BLACK
    }
}

/// One palette slot.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub used: Usage,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(used: Usage, r: u8, g: u8, b: u8) -> Self {
        Self { used, r, g, b }
    }

    pub const fn used(r: u8, g: u8, b: u8) -> Self {
        Self::new(Usage::USED, r, g, b)
    }

    pub fn is_used(&self) -> bool {
        !self.used.is_empty()
    }

    pub fn rgb(&self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }

    pub fn same_rgb(&self, other: &Color) -> bool {
        self.r == other.r && self.g == other.g && self.b == other.b
    }

    pub fn set_rgb(&mut self, rgb: Rgb) {
        self.r = rgb.r;
        self.g = rgb.g;
        self.b = rgb.b;
    }

    /// Scales each channel by a percentage, clamping to a byte.
    pub fn scaled(&self, percent: u16) -> Rgb {
        let scale = |c: u8| (c as u32 * percent as u32 / 100).min(255) as u8;
        Rgb::new(scale(self.r), scale(self.g), scale(self.b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_keeps_unknown_bits() {
        let usage = Usage::from_bits_retain(0x83);
        assert!(usage.contains(Usage::USED));
        assert_eq!(usage.bits(), 0x83);

        let mut color = Color::new(usage, 1, 2, 3);
        color.used |= Usage::SHARED;
        assert_eq!(color.used.bits(), 0x93);
        assert!(color.is_used());
        assert!(!Color::default().is_used());
    }

    #[test]
    fn scaling_clamps() {
        let color = Color::used(200, 100, 10);
        assert_eq!(color.scaled(100), Rgb::new(200, 100, 10));
        assert_eq!(color.scaled(50), Rgb::new(100, 50, 5));
        assert_eq!(color.scaled(200), Rgb::new(255, 200, 20));
        assert_eq!(color.scaled(0), Rgb::BLACK);
        assert!(color.scaled(0).is_black());
        assert!(!color.scaled(1).is_black());
    }
}
