//! Packed RGBA colours and sprite tinting.

use image::RgbaImage;
use tracing::warn;

/// A colour packed as `0xRRGGBBAA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

/// Named colours accepted in prototype `color` fields.
const NAMED_COLORS: &[(&str, u32)] = &[
    ("transparent", 0x0000_0000),
    ("black", 0x0000_00ff),
    ("white", 0xffff_ffff),
    ("red", 0xff00_00ff),
    ("lime", 0x00ff_00ff),
    ("green", 0x0080_00ff),
    ("blue", 0x0000_ffff),
    ("yellow", 0xffff_00ff),
    ("cyan", 0x00ff_ffff),
    ("aqua", 0x00ff_ffff),
    ("magenta", 0xff00_ffff),
    ("fuchsia", 0xff00_ffff),
    ("gray", 0x8080_80ff),
    ("grey", 0x8080_80ff),
    ("silver", 0xc0c0_c0ff),
    ("maroon", 0x8000_00ff),
    ("olive", 0x8080_00ff),
    ("navy", 0x0000_80ff),
    ("purple", 0x8000_80ff),
    ("teal", 0x0080_80ff),
    ("orange", 0xffa5_00ff),
    ("brown", 0xa52a_2aff),
    ("pink", 0xffc0_cbff),
    ("gold", 0xffd7_00ff),
];

impl Color {
    pub const WHITE: Color = Color(0xffff_ffff);

    pub fn from_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color(u32::from_be_bytes([r, g, b, a]))
    }

    pub fn channels(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    pub fn is_white(self) -> bool {
        self == Self::WHITE
    }

    /// Per-channel product, each channel scaled back into `0..=255`.
    pub fn multiply(self, other: Color) -> Color {
        let [r1, g1, b1, a1] = self.channels();
        let [r2, g2, b2, a2] = other.channels();
        Color::from_rgba(mul(r1, r2), mul(g1, g2), mul(b1, b2), mul(a1, a2))
    }

    /// Parse `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa` or a colour name.
    pub fn parse_css(s: &str) -> Option<Color> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }
        NAMED_COLORS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(s))
            .map(|&(_, value)| Color(value))
    }
}

fn mul(a: u8, b: u8) -> u8 {
    (a as u32 * b as u32 / 255) as u8
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|n| n * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => Some(Color::from_rgba(nibble(0)?, nibble(1)?, nibble(2)?, 0xff)),
        4 => Some(Color::from_rgba(nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?)),
        6 => Some(Color::from_rgba(byte(0)?, byte(2)?, byte(4)?, 0xff)),
        8 => Some(Color::from_rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

/// Parse an optional prototype colour. Missing colours are white;
/// unparseable ones are reported and treated as white.
pub fn parse_color_or_white(color: Option<&str>, entity: &str) -> Color {
    let Some(css) = color else {
        return Color::WHITE;
    };
    Color::parse_css(css).unwrap_or_else(|| {
        warn!("{entity}: unrecognized sprite color '{css}', using white");
        Color::WHITE
    })
}

/// Multiply the RGB channels of every pixel by `color`. Alpha is untouched.
pub fn modulate(image: &mut RgbaImage, color: Color) {
    let [r, g, b, _] = color.channels();
    for pixel in image.pixels_mut() {
        pixel[0] = mul(pixel[0], r);
        pixel[1] = mul(pixel[1], g);
        pixel[2] = mul(pixel[2], b);
    }
}
