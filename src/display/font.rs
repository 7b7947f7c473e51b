/*
 *  display/font.rs
 *
 *  KoMonS - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Font table - configuration names to embedded-graphics mono fonts
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::fmt;
use embedded_graphics::mono_font::MonoFont;
use embedded_graphics::mono_font::iso_8859_1::{
    FONT_4X6, FONT_5X7, FONT_5X8, FONT_6X9, FONT_6X10, FONT_6X12,
    FONT_6X13, FONT_6X13_BOLD, FONT_7X13, FONT_7X13_BOLD, FONT_7X14,
    FONT_7X14_BOLD, FONT_8X13, FONT_8X13_BOLD, FONT_9X15, FONT_9X15_BOLD,
    FONT_9X18, FONT_9X18_BOLD, FONT_10X20,
};
use crate::config::ConfigError;

static FONTS: &[(&str, &MonoFont<'static>)] = &[
    ("font_4x6", &FONT_4X6),
    ("font_5x7", &FONT_5X7),
    ("font_5x8", &FONT_5X8),
    ("font_6x9", &FONT_6X9),
    ("font_6x10", &FONT_6X10),
    ("font_6x12", &FONT_6X12),
    ("font_6x13", &FONT_6X13),
    ("font_6x13_bold", &FONT_6X13_BOLD),
    ("font_7x13", &FONT_7X13),
    ("font_7x13_bold", &FONT_7X13_BOLD),
    ("font_7x14", &FONT_7X14),
    ("font_7x14_bold", &FONT_7X14_BOLD),
    ("font_8x13", &FONT_8X13),
    ("font_8x13_bold", &FONT_8X13_BOLD),
    ("font_9x15", &FONT_9X15),
    ("font_9x15_bold", &FONT_9X15_BOLD),
    ("font_9x18", &FONT_9X18),
    ("font_9x18_bold", &FONT_9X18_BOLD),
    ("font_10x20", &FONT_10X20),
];

/// A resolved font. Identity is the table name, so two references to the
/// same face compare equal regardless of where they were resolved.
#[derive(Clone, Copy)]
pub struct FontRef {
    name: &'static str,
    font: &'static MonoFont<'static>,
}

impl FontRef {
    /// Look a font up by its configuration name
    pub fn lookup(name: &str) -> Result<Self, ConfigError> {
        FONTS
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(name, font)| FontRef { name, font })
            .ok_or_else(|| ConfigError::UnknownFont(name.to_string()))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn mono(&self) -> &'static MonoFont<'static> {
        self.font
    }

    /// Glyph cell width, including inter-character spacing
    pub fn advance(&self) -> u32 {
        self.font.character_size.width + self.font.character_spacing
    }

    pub fn height(&self) -> u32 {
        self.font.character_size.height
    }

    /// Rendered width of `text` in pixels
    pub fn measure(&self, text: &str) -> u32 {
        let n = text.chars().count() as u32;
        if n == 0 {
            return 0;
        }
        n * self.advance() - self.font.character_spacing
    }
}

impl PartialEq for FontRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for FontRef {}

impl fmt::Debug for FontRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FontRef").field(&self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_and_measure() {
        let font = FontRef::lookup("font_6x10").unwrap();
        assert_eq!(font.measure(""), 0);
        assert_eq!(font.measure("abc"), 18);
        assert_eq!(font.height(), 10);
        assert_eq!(FontRef::lookup("FONT_6X10").unwrap(), font);
    }

    #[test]
    fn test_unknown_font_is_config_error() {
        assert!(matches!(FontRef::lookup("comic_sans"), Err(ConfigError::UnknownFont(_))));
    }
}
