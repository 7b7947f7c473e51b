/*
 *  display/color.rs
 *
 *  KoMonS - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Named colour table, resolved once from configuration
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

use std::collections::{BTreeMap, HashMap};
use embedded_graphics::pixelcolor::{Rgb888, WebColors};
use embedded_graphics::prelude::*;
use crate::config::ConfigError;

/// Progress bar background when the table does not name one
pub const PROGRESS_BG_KEY: &str = "color_progbg";
/// Progress bar fill when the table does not name one
pub const PROGRESS_FG_KEY: &str = "color_progfg";

/// Parse a literal colour: `#rrggbb`, `#rgb` or a handful of plain names
pub fn parse_color(value: &str) -> Option<Rgb888> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        return match hex.len() {
            6 => {
                let rgb = u32::from_str_radix(hex, 16).ok()?;
                Some(Rgb888::new((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8))
            }
            3 => {
                let rgb = u16::from_str_radix(hex, 16).ok()?;
                let nib = |n: u16| ((n & 0xF) as u8) * 0x11;
                Some(Rgb888::new(nib(rgb >> 8), nib(rgb >> 4), nib(rgb)))
            }
            _ => None,
        };
    }
    match value.to_ascii_lowercase().as_str() {
        "black" => Some(Rgb888::BLACK),
        "white" => Some(Rgb888::WHITE),
        "red" => Some(Rgb888::RED),
        "green" => Some(Rgb888::GREEN),
        "blue" => Some(Rgb888::BLUE),
        "yellow" => Some(Rgb888::YELLOW),
        "cyan" => Some(Rgb888::CYAN),
        "magenta" => Some(Rgb888::MAGENTA),
        "gray" | "grey" => Some(Rgb888::CSS_GRAY),
        "lightgray" | "lightgrey" => Some(Rgb888::CSS_LIGHT_GRAY),
        "darkgray" | "darkgrey" => Some(Rgb888::CSS_DARK_GRAY),
        "orange" => Some(Rgb888::CSS_ORANGE),
        _ => None,
    }
}

/// Lookup table from `color_*` names to concrete colours
#[derive(Debug, Clone, Default)]
pub struct ColorTable {
    colors: HashMap<String, Rgb888>,
}

impl ColorTable {
    /// Build the table, failing on the first entry that does not parse
    pub fn from_config(entries: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let mut colors = HashMap::with_capacity(entries.len());
        for (name, value) in entries {
            let color = parse_color(value)
                .ok_or_else(|| ConfigError::UnknownColor(format!("{name}: {value}")))?;
            colors.insert(name.clone(), color);
        }
        Ok(Self { colors })
    }

    /// Resolve a layout colour reference, either a table name or a literal
    pub fn resolve(&self, reference: &str) -> Result<Rgb888, ConfigError> {
        if let Some(color) = self.colors.get(reference) {
            return Ok(*color);
        }
        parse_color(reference).ok_or_else(|| ConfigError::UnknownColor(reference.to_string()))
    }

    pub fn progress_bg(&self) -> Rgb888 {
        self.colors.get(PROGRESS_BG_KEY).copied().unwrap_or(Rgb888::CSS_DIM_GRAY)
    }

    pub fn progress_fg(&self) -> Rgb888 {
        self.colors.get(PROGRESS_FG_KEY).copied().unwrap_or(Rgb888::CSS_LIGHT_GRAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_color("#ff8000"), Some(Rgb888::new(255, 128, 0)));
        assert_eq!(parse_color("#fff"), Some(Rgb888::WHITE));
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("chartreuse-ish"), None);
    }

    #[test]
    fn test_table_resolution() {
        let mut entries = BTreeMap::new();
        entries.insert("color_artist".to_string(), "yellow".to_string());
        let table = ColorTable::from_config(&entries).unwrap();

        assert_eq!(table.resolve("color_artist").unwrap(), Rgb888::YELLOW);
        assert_eq!(table.resolve("#000000").unwrap(), Rgb888::BLACK);
        assert!(table.resolve("color_missing").is_err());
        // defaults when not configured
        assert_eq!(table.progress_fg(), Rgb888::CSS_LIGHT_GRAY);
    }
}
