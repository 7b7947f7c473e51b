/*
 *  display/page.rs
 *
 *  KoMonS - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Resolved page layouts - thumbnail, progress bar and fields
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

use embedded_graphics::prelude::*;
use crate::config::{ConfigError, RawLayout, RawProgress, RawThumb};
use crate::display::color::ColorTable;
use super::field::FieldSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbPlacement {
    /// Centered on both axes
    Centered,
    At(Point),
}

/// Cover art region; `size` bounds the long edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbSpec {
    pub size: u32,
    pub placement: ThumbPlacement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Fills left to right
    Horizontal,
    /// Fills bottom to top
    Vertical,
}

/// Two colour progress bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSpec {
    pub pos: Point,
    /// Thickness across the fill direction
    pub height: u32,
    pub short_len: u32,
    pub long_len: u32,
    pub orientation: Orientation,
}

impl ProgressSpec {
    /// Bar length; horizontal bars shorten when elapsed time grows an hours part
    pub fn length(&self, has_hours: bool) -> u32 {
        match self.orientation {
            Orientation::Horizontal if has_hours => self.long_len,
            _ => self.short_len,
        }
    }

    fn resolve(raw: &RawProgress) -> Result<Self, ConfigError> {
        let short_len = if raw.short_len > 0 { raw.short_len } else { raw.len.unwrap_or(0) };
        let long_len = if raw.long_len > 0 { raw.long_len } else { short_len };
        if short_len == 0 || raw.height == 0 {
            return Err(ConfigError::Validation("progress bar needs a length and height".into()));
        }
        Ok(Self {
            pos: Point::new(raw.x, raw.y),
            height: raw.height,
            short_len,
            long_len,
            orientation: if raw.vertical { Orientation::Vertical } else { Orientation::Horizontal },
        })
    }
}

impl ThumbSpec {
    fn resolve(raw: &RawThumb) -> Result<Self, ConfigError> {
        if raw.size == 0 {
            return Err(ConfigError::Validation("thumb size must be > 0".into()));
        }
        let placement = if raw.center {
            ThumbPlacement::Centered
        } else {
            ThumbPlacement::At(Point::new(raw.x, raw.y))
        };
        Ok(Self { size: raw.size, placement })
    }

    /// Top-left corner for an image of `img` size on a `frame` sized panel
    pub fn origin(&self, frame: (u32, u32), img: (u32, u32)) -> Point {
        match self.placement {
            ThumbPlacement::Centered => Point::new(
                (frame.0 as i32 - img.0 as i32) / 2,
                (frame.1 as i32 - img.1 as i32) / 2,
            ),
            ThumbPlacement::At(p) => p,
        }
    }
}

/// One screen variant, fully resolved to fonts and colours
#[derive(Debug, Clone)]
pub struct LayoutSpec {
    pub name: String,
    pub thumb: Option<ThumbSpec>,
    pub progress: Option<ProgressSpec>,
    pub fields: Vec<FieldSpec>,
}

impl LayoutSpec {
    pub fn resolve(name: &str, raw: &RawLayout, colors: &ColorTable) -> Result<Self, ConfigError> {
        Ok(Self {
            name: name.to_string(),
            thumb: raw.thumb.as_ref().map(ThumbSpec::resolve).transpose()?,
            progress: raw.progress.as_ref().map(ProgressSpec::resolve).transpose()?,
            fields: raw
                .fields
                .iter()
                .map(|f| FieldSpec::resolve(f, colors))
                .collect::<Result<_, _>>()?,
        })
    }

    /// Get a field by name
    pub fn get_field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_default_layouts_resolve() {
        let cfg = Config::default();
        let colors = ColorTable::from_config(&cfg.colors).unwrap();
        let audio = LayoutSpec::resolve("A_DEFAULT", &cfg.a_layout["A_DEFAULT"], &colors).unwrap();
        assert_eq!(audio.thumb.unwrap().size, 140);
        assert!(audio.get_field("MusicPlayer.Title").unwrap().truncate);
        let status = LayoutSpec::resolve("status", &cfg.status_layout, &colors).unwrap();
        assert!(status.progress.is_none());
        assert!(status.get_field("time_hrmin").is_some());
    }

    #[test]
    fn test_progress_length_selection() {
        let raw = RawProgress { x: 0, y: 0, height: 6, short_len: 90, long_len: 74, len: None, vertical: false };
        let bar = ProgressSpec::resolve(&raw).unwrap();
        assert_eq!(bar.length(false), 90);
        assert_eq!(bar.length(true), 74);

        let raw = RawProgress { x: 0, y: 0, height: 6, short_len: 0, long_len: 0, len: Some(120), vertical: true };
        let bar = ProgressSpec::resolve(&raw).unwrap();
        assert_eq!(bar.orientation, Orientation::Vertical);
        assert_eq!(bar.length(true), 120);
    }

    #[test]
    fn test_centered_thumb_origin() {
        let thumb = ThumbSpec::resolve(&RawThumb { size: 100, center: true, x: 0, y: 12 }).unwrap();
        // y is ignored once centered
        assert_eq!(thumb.origin((320, 240), (100, 100)), Point::new(110, 70));
        assert_eq!(thumb.origin((320, 240), (100, 50)), Point::new(110, 95));
        let fixed = ThumbSpec::resolve(&RawThumb { size: 100, center: false, x: 4, y: 5 }).unwrap();
        assert_eq!(fixed.origin((320, 240), (60, 60)), Point::new(4, 5));
    }
}
