//! Color palette for the settings screen.
//!
//! A small fixed dark palette; metatune has no theming machinery, just
//! enough named colors for the menu, modals, and toast line.

use ratatui::style::Color;

/// Palette used by rendering code.
pub struct Theme {
    /// Primary background color.
    pub base: Color,
    /// Panel background, slightly lifted from the base.
    pub mantle: Color,
    /// Border and separator color.
    pub overlay: Color,
    /// Primary foreground text color.
    pub text: Color,
    /// Secondary text for captions and hints.
    pub subtext: Color,
    /// Selection and interactive highlight accent.
    pub accent: Color,
    /// Success/positive state color.
    pub green: Color,
    /// Warning/attention state color.
    pub yellow: Color,
    /// Error/danger state color.
    pub red: Color,
}

/// Construct a [`Color::Rgb`] from an 8-bit RGB triplet.
const fn hex(rgb: (u8, u8, u8)) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

/// The application's palette.
#[must_use]
pub const fn theme() -> Theme {
    Theme {
        base: hex((0x1d, 0x20, 0x21)),
        mantle: hex((0x28, 0x2b, 0x2d)),
        overlay: hex((0x50, 0x54, 0x56)),
        text: hex((0xd4, 0xbe, 0x98)),
        subtext: hex((0x92, 0x83, 0x74)),
        accent: hex((0x7d, 0xae, 0xa3)),
        green: hex((0xa9, 0xb6, 0x65)),
        yellow: hex((0xd8, 0xa6, 0x57)),
        red: hex((0xea, 0x69, 0x62)),
    }
}
