//! Color palette and text styles for the LCD.

use embedded_graphics::mono_font::iso_8859_1::{FONT_4X6, FONT_6X10};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb565;

// ── Color palette ─────────────────────────────────────────────────────────────
// Rgb565::new takes 5/6/5-bit channels; the comments give the 8-bit source.

pub const C_BG: Rgb565 = Rgb565::new(0, 0, 0);
pub const C_TEXT: Rgb565 = Rgb565::new(31, 63, 31);
pub const C_TEXT_INVERTED: Rgb565 = Rgb565::new(0, 0, 0);
pub const C_HIGHLIGHT: Rgb565 = Rgb565::new(26, 0, 15); // (210, 0, 125)
pub const C_GREY: Rgb565 = Rgb565::new(10, 20, 10); // (80, 80, 80)
pub const C_VOLUME: Rgb565 = Rgb565::new(12, 24, 12); // (99, 99, 99)
pub const C_TAB_ACTIVE: Rgb565 = C_TEXT;
pub const C_TAB_INACTIVE: Rgb565 = C_GREY;
pub const C_DIALOG_BG: Rgb565 = C_GREY;
pub const C_DIALOG_BORDER: Rgb565 = C_TEXT;

// ── Fonts ─────────────────────────────────────────────────────────────────────
// Latin-1 variants so umlauts in configured labels render.

pub const FONT: &MonoFont<'static> = &FONT_6X10;
pub const FONT_SMALL: &MonoFont<'static> = &FONT_4X6;

pub fn style_default() -> MonoTextStyle<'static, Rgb565> {
    MonoTextStyle::new(FONT, C_TEXT)
}

pub fn style_selected() -> MonoTextStyle<'static, Rgb565> {
    MonoTextStyle::new(FONT, C_TEXT_INVERTED)
}

pub fn style_volume() -> MonoTextStyle<'static, Rgb565> {
    MonoTextStyle::new(FONT, C_VOLUME)
}

pub fn style_tab(active: bool) -> MonoTextStyle<'static, Rgb565> {
    let color = if active { C_TEXT_INVERTED } else { C_TEXT };
    MonoTextStyle::new(FONT_SMALL, color)
}

/// Pixel width of `text` in `font` (monospace, no letter spacing quirks).
pub fn text_width(font: &MonoFont<'_>, text: &str) -> u32 {
    let n = text.chars().count() as u32;
    if n == 0 {
        return 0;
    }
    n * font.character_size.width + (n - 1) * font.character_spacing
}
