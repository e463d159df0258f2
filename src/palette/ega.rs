use super::Rgb;

/// The 16 EGA colors.
pub const EGA_COLORS: [Rgb; 16] = [
    Rgb::new(0x00, 0x00, 0x00),
    Rgb::new(0x00, 0x00, 0xAA),
    Rgb::new(0x00, 0xAA, 0x00),
    Rgb::new(0x00, 0xAA, 0xAA),
    Rgb::new(0xAA, 0x00, 0x00),
    Rgb::new(0xAA, 0x00, 0xAA),
    Rgb::new(0xAA, 0x55, 0x00),
    Rgb::new(0xAA, 0xAA, 0xAA),
    Rgb::new(0x55, 0x55, 0x55),
    Rgb::new(0x55, 0x55, 0xFF),
    Rgb::new(0x55, 0xFF, 0x55),
    Rgb::new(0x55, 0xFF, 0xFF),
    Rgb::new(0xFF, 0x55, 0x55),
    Rgb::new(0xFF, 0x55, 0xFF),
    Rgb::new(0xFF, 0xFF, 0x55),
    Rgb::new(0xFF, 0xFF, 0xFF),
];

/// Slot index of a 16-color mix: the two EGA colors dithered together.
#[bitfield_struct::bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct EgaMix {
    #[bits(4)]
    pub low: u8,
    #[bits(4)]
    pub high: u8,
}

impl EgaMix {
    /// The color a dither of both EGA colors appears as from a distance.
    pub fn color(self) -> Rgb {
        let a = EGA_COLORS[self.low() as usize];
        let b = EGA_COLORS[self.high() as usize];
        Rgb::new(
            blend_colors(a.r, b.r),
            blend_colors(a.g, b.g),
            blend_colors(a.b, b.b),
        )
    }
}

/// Averages two channel values in linear light, assuming a 2.2 display gamma.
pub fn blend_colors(c1: u8, c2: u8) -> u8 {
    let linear = |c: u8| (c as f64 / 255.0).powf(2.2) * 255.0;
    let t = linear(c1) + linear(c2);
    (0.5 + (0.5 * t / 255.0).powf(1.0 / 2.2) * 255.0) as u8
}
