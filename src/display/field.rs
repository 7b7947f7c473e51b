/*
 *  display/field.rs
 *
 *  KoMonS - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Field kinds and the text each one produces from a snapshot
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

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use crate::config::{ConfigError, RawField, RawLabel};
use crate::display::color::ColorTable;
use crate::display::font::FontRef;
use crate::kodiinfo::{LABEL_ARTIST, LABEL_CODEC, LABEL_COMPOSER, StatusSnapshot};

/// Kodi codec ids to what fits on a small panel
const CODECS: &[(&str, &str)] = &[
    ("ac3", "DD"),
    ("eac3", "DD"),
    ("dtshd_ma", "DTS-MA"),
    ("dca", "DTS"),
    ("truehd", "DD-HD"),
    ("wmapro", "WMA"),
    ("mp3float", "MP3"),
    ("flac", "FLAC"),
    ("alac", "ALAC"),
    ("vorbis", "OggV"),
    ("aac", "AAC"),
    ("pcm_s16be", "PCM"),
    ("mp2", "MP2"),
    ("pcm_u8", "PCM"),
    ("BXA", "AirPlay"),
    ("dsd_lsbf_planar", "DSD"),
];

pub fn codec_label(code: &str) -> Option<&'static str> {
    CODECS.iter().find(|(id, _)| *id == code).map(|&(_, label)| label)
}

/// Fixed prefix for idle-screen system labels
fn status_prefix(key: &str) -> &'static str {
    match key {
        "System.Uptime" => "Up: ",
        "System.CPUTemperature" => "CPU: ",
        _ => "",
    }
}

/// Where and how a run of text is drawn; `pos` is the top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub pos: Point,
    pub font: FontRef,
    pub fill: Rgb888,
}

/// Static caption drawn ahead of a field's value
#[derive(Debug, Clone, PartialEq)]
pub struct FieldLabel {
    pub text: String,
    pub style: TextStyle,
}

/// What a field shows; each kind has its own handler in the renderer
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Fixed text
    Label(String),
    /// A snapshot value, with an optional fixed prefix
    Value { key: String, prefix: &'static str },
    /// Codec id mapped through the codec table
    Codec,
    /// Artist, else "(composer)"
    Artist,
    /// "HH:MM AM" drawn as two runs, the remainder in `small_font`
    TimeHrMin { key: String, small_font: FontRef },
    /// Idle screen one-liner
    Summary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub style: TextStyle,
    pub label: Option<FieldLabel>,
    pub truncate: bool,
}

fn style(x: i32, y: i32, font: &str, fill: &str, colors: &ColorTable) -> Result<TextStyle, ConfigError> {
    Ok(TextStyle {
        pos: Point::new(x, y),
        font: FontRef::lookup(font)?,
        fill: colors.resolve(fill)?,
    })
}

impl FieldLabel {
    fn resolve(raw: &RawLabel, colors: &ColorTable) -> Result<Self, ConfigError> {
        Ok(Self {
            text: raw.text.clone(),
            style: style(raw.x, raw.y, &raw.font, &raw.fill, colors)?,
        })
    }
}

impl FieldSpec {
    /// Resolve a configured field; the name picks the kind
    pub fn resolve(raw: &RawField, colors: &ColorTable) -> Result<Self, ConfigError> {
        let style = style(raw.x, raw.y, &raw.font, &raw.fill, colors)?;
        let kind = match raw.name.as_str() {
            "version" => FieldKind::Label(format!("komons v{}", env!("CARGO_PKG_VERSION"))),
            "summary" => FieldKind::Summary,
            "codec" => FieldKind::Codec,
            "artist" => FieldKind::Artist,
            "time_hrmin" => FieldKind::TimeHrMin {
                key: "System.Time".to_string(),
                small_font: match raw.small_font.as_deref() {
                    Some(name) => FontRef::lookup(name)?,
                    None => style.font,
                },
            },
            key => FieldKind::Value { key: key.to_string(), prefix: status_prefix(key) },
        };
        let label = raw.label.as_ref().map(|l| FieldLabel::resolve(l, colors)).transpose()?;
        Ok(Self { name: raw.name.clone(), kind, style, label, truncate: raw.truncate })
    }

    /// Text this field shows for `snapshot`, or `None` to draw nothing
    pub fn text(&self, snapshot: &StatusSnapshot, summary: &str) -> Option<String> {
        match &self.kind {
            FieldKind::Label(text) => Some(text.clone()),
            FieldKind::Summary => Some(summary.to_string()),
            FieldKind::Codec => snapshot.get(LABEL_CODEC).and_then(codec_label).map(str::to_string),
            FieldKind::Artist => snapshot
                .get(LABEL_ARTIST)
                .map(str::to_string)
                .or_else(|| snapshot.get(LABEL_COMPOSER).map(|c| format!("({c})"))),
            FieldKind::TimeHrMin { key, .. } => snapshot.get(key).map(str::to_string),
            FieldKind::Value { key, prefix } => snapshot.get(key).map(|v| format!("{prefix}{v}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str) -> RawField {
        RawField {
            name: name.to_string(),
            x: 0,
            y: 0,
            font: "font_6x10".into(),
            fill: "white".into(),
            small_font: None,
            label: None,
            truncate: false,
        }
    }

    fn spec(name: &str) -> FieldSpec {
        FieldSpec::resolve(&raw(name), &ColorTable::default()).unwrap()
    }

    #[test]
    fn test_codec_lookup() {
        let field = spec("codec");
        let flac = StatusSnapshot::from_pairs([(LABEL_CODEC, "flac")]);
        assert_eq!(field.text(&flac, ""), Some("FLAC".to_string()));
        let unknown = StatusSnapshot::from_pairs([(LABEL_CODEC, "xyz")]);
        assert_eq!(field.text(&unknown, ""), None);
        assert_eq!(codec_label("BXA"), Some("AirPlay"));
    }

    #[test]
    fn test_artist_falls_back_to_composer() {
        let field = spec("artist");
        let snap = StatusSnapshot::from_pairs([(LABEL_ARTIST, ""), (LABEL_COMPOSER, "J.S. Bach")]);
        assert_eq!(field.text(&snap, ""), Some("(J.S. Bach)".to_string()));

        let snap = StatusSnapshot::from_pairs([(LABEL_ARTIST, "Miles Davis"), (LABEL_COMPOSER, "Bill Evans")]);
        assert_eq!(field.text(&snap, ""), Some("Miles Davis".to_string()));

        assert_eq!(field.text(&StatusSnapshot::default(), ""), None);
    }

    #[test]
    fn test_status_prefixes() {
        let snap = StatusSnapshot::from_pairs([
            ("System.Uptime", "2 days"),
            ("System.CPUTemperature", "48 C"),
            ("System.Date", "Monday, 19 October 2026"),
        ]);
        assert_eq!(spec("System.Uptime").text(&snap, ""), Some("Up: 2 days".into()));
        assert_eq!(spec("System.CPUTemperature").text(&snap, ""), Some("CPU: 48 C".into()));
        assert_eq!(spec("System.Date").text(&snap, ""), Some("Monday, 19 October 2026".into()));
    }

    #[test]
    fn test_special_kinds() {
        assert!(matches!(spec("version").kind, FieldKind::Label(ref t) if t.starts_with("komons v")));
        assert_eq!(spec("summary").text(&StatusSnapshot::default(), "Idle"), Some("Idle".into()));
        match spec("time_hrmin").kind {
            FieldKind::TimeHrMin { key, small_font } => {
                assert_eq!(key, "System.Time");
                assert_eq!(small_font.name(), "font_6x10");
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_unknown_font_rejected() {
        let mut bad = raw("MusicPlayer.Title");
        bad.font = "font_99x99".into();
        assert!(matches!(FieldSpec::resolve(&bad, &ColorTable::default()), Err(ConfigError::UnknownFont(_))));
    }
}
