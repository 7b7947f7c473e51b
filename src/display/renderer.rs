/*
 *  display/renderer.rs
 *
 *  KoMonS - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Layout renderer - draws one resolved layout into the shared frame
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

use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};
use image::RgbImage;
use crate::display::error::DisplayError;
use crate::display::field::{FieldKind, FieldSpec, TextStyle};
use crate::display::framebuffer::FrameBuffer;
use crate::display::page::{LayoutSpec, Orientation, ProgressSpec, ThumbSpec};
use crate::display::truncate::{ELLIPSIS, TruncationCache};
use crate::kodiinfo::{Progress, StatusSnapshot};

/// Right-hand margin kept clear of truncated text
const TRUNCATE_MARGIN: i32 = 20;
/// Gap between the two runs of a composite time field
const TIME_GAP: i32 = 5;

/// Filled length of a `len` pixel bar at fraction `p`
///
/// Zero or negative reads as 1%, anything past the end as full; the result
/// is never less than one pixel.
pub fn progress_extent(len: u32, p: f64) -> u32 {
    let p = if p.is_nan() || p <= 0.0 {
        0.01
    } else if p > 1.0 {
        1.0
    } else {
        p
    };
    ((len as f64 * p) as u32).clamp(1, len.max(1))
}

/// Owns the text memo and draws layouts field by field
#[derive(Debug)]
pub struct LayoutRenderer {
    truncation: TruncationCache,
    progress_bg: Rgb888,
    progress_fg: Rgb888,
    frame_width: u32,
}

impl LayoutRenderer {
    pub fn new(frame_width: u32, progress_bg: Rgb888, progress_fg: Rgb888) -> Self {
        Self { truncation: TruncationCache::new(), progress_bg, progress_fg, frame_width }
    }

    pub fn truncation(&self) -> &TruncationCache {
        &self.truncation
    }

    /// Draw `layout` for `snapshot`; `thumb` is the already resolved cover
    pub fn render(
        &mut self,
        frame: &mut FrameBuffer,
        layout: &LayoutSpec,
        snapshot: &StatusSnapshot,
        summary: &str,
        thumb: Option<&RgbImage>,
    ) -> Result<(), DisplayError> {
        if let (Some(spec), Some(image)) = (layout.thumb.as_ref(), thumb) {
            self.draw_thumb(frame, spec, image)?;
        }
        if let Some(bar) = layout.progress.as_ref() {
            if let Progress::Fraction(p) = snapshot.progress {
                self.draw_progress(frame, bar, p, snapshot.has_hours())?;
            }
        }
        for field in &layout.fields {
            self.draw_field(frame, field, snapshot, summary)?;
        }
        Ok(())
    }

    pub fn draw_field(
        &mut self,
        frame: &mut FrameBuffer,
        field: &FieldSpec,
        snapshot: &StatusSnapshot,
        summary: &str,
    ) -> Result<(), DisplayError> {
        let Some(text) = field.text(snapshot, summary) else {
            return Ok(());
        };

        if let Some(label) = field.label.as_ref() {
            draw_text(frame, &label.text, &label.style)?;
        }

        match &field.kind {
            FieldKind::TimeHrMin { small_font, .. } => {
                let (hrmin, rest) = text.split_once(' ').unwrap_or((text.as_str(), ""));
                let width = draw_text(frame, hrmin, &field.style)?;
                if !rest.is_empty() {
                    let small = TextStyle {
                        pos: Point::new(
                            field.style.pos.x + width as i32 + TIME_GAP,
                            field.style.pos.y + field.style.font.height() as i32 - small_font.height() as i32,
                        ),
                        font: *small_font,
                        fill: field.style.fill,
                    };
                    draw_text(frame, rest, &small)?;
                }
            }
            _ if field.truncate => {
                let max_width = (self.frame_width as i32 - TRUNCATE_MARGIN - field.style.pos.x).max(0) as u32;
                let fitted = self.truncation.truncate(&text, field.style.font, max_width);
                draw_text(frame, &fitted, &field.style)?;
            }
            _ => {
                draw_text(frame, &text, &field.style)?;
            }
        }
        Ok(())
    }

    pub fn draw_progress(
        &self,
        frame: &mut FrameBuffer,
        bar: &ProgressSpec,
        p: f64,
        has_hours: bool,
    ) -> Result<(), DisplayError> {
        let len = bar.length(has_hours);
        let filled = progress_extent(len, p);
        let (background, fill) = match bar.orientation {
            Orientation::Horizontal => (
                Rectangle::new(bar.pos, Size::new(len, bar.height)),
                Rectangle::new(bar.pos, Size::new(filled, bar.height)),
            ),
            Orientation::Vertical => (
                Rectangle::new(bar.pos, Size::new(bar.height, len)),
                Rectangle::new(
                    Point::new(bar.pos.x, bar.pos.y + (len - filled) as i32),
                    Size::new(bar.height, filled),
                ),
            ),
        };
        background
            .into_styled(PrimitiveStyle::with_fill(self.progress_bg))
            .draw(frame)
            .map_err(|_| DisplayError::Drawing("Failed to draw progress background".to_string()))?;
        fill.into_styled(PrimitiveStyle::with_fill(self.progress_fg))
            .draw(frame)
            .map_err(|_| DisplayError::Drawing("Failed to draw progress fill".to_string()))?;
        Ok(())
    }

    pub fn draw_thumb(&self, frame: &mut FrameBuffer, spec: &ThumbSpec, image: &RgbImage) -> Result<(), DisplayError> {
        let origin = spec.origin(frame.dimensions(), image.dimensions());
        let pixels = image.enumerate_pixels().map(|(x, y, px)| {
            Pixel(origin + Point::new(x as i32, y as i32), Rgb888::new(px[0], px[1], px[2]))
        });
        frame
            .draw_iter(pixels)
            .map_err(|_| DisplayError::Drawing("Failed to draw thumbnail".to_string()))
    }
}

/// Draw a single run of text, returning its width
///
/// A trailing ellipsis is drawn as three dots inside one glyph cell, since
/// the mono fonts carry no such glyph.
pub fn draw_text(frame: &mut FrameBuffer, text: &str, style: &TextStyle) -> Result<u32, DisplayError> {
    let font = style.font;
    let (body, ellipsis) = match text.strip_suffix(ELLIPSIS) {
        Some(body) => (body, true),
        None => (text, false),
    };

    let character_style = MonoTextStyle::new(font.mono(), style.fill);
    Text::with_baseline(body, style.pos, character_style, Baseline::Top)
        .draw(frame)
        .map_err(|_| DisplayError::Drawing(format!("Failed to draw '{body}'")))?;

    if ellipsis {
        let cell_x = style.pos.x + font.measure(body) as i32 + if body.is_empty() { 0 } else { font.mono().character_spacing as i32 };
        let cell_w = font.mono().character_size.width as i32;
        let dot = (cell_w / 6).max(1);
        let y = style.pos.y + font.mono().baseline as i32 + 1 - dot;
        for i in 0..3 {
            Rectangle::new(Point::new(cell_x + (cell_w * i) / 3 + dot / 2, y), Size::new(dot as u32, dot as u32))
                .into_styled(PrimitiveStyle::with_fill(style.fill))
                .draw(frame)
                .map_err(|_| DisplayError::Drawing("Failed to draw ellipsis".to_string()))?;
        }
    }
    Ok(font.measure(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::font::FontRef;
    use crate::display::page::ThumbPlacement;
    use crate::kodiinfo::{LABEL_ARTIST, LABEL_CODEC, LABEL_COMPOSER, LABEL_TIME};

    fn style(x: i32, y: i32) -> TextStyle {
        TextStyle { pos: Point::new(x, y), font: FontRef::lookup("font_6x10").unwrap(), fill: Rgb888::WHITE }
    }

    fn field(kind: FieldKind, truncate: bool) -> FieldSpec {
        FieldSpec { name: "test".into(), kind, style: style(0, 0), label: None, truncate }
    }

    fn renderer() -> LayoutRenderer {
        LayoutRenderer::new(120, Rgb888::BLUE, Rgb888::RED)
    }

    #[test]
    fn test_progress_extent_clamps() {
        assert_eq!(progress_extent(100, -0.5), 1);
        assert_eq!(progress_extent(100, 0.0), 1);
        assert_eq!(progress_extent(100, 0.5), 50);
        assert_eq!(progress_extent(100, 1.0), 100);
        assert_eq!(progress_extent(100, 7.0), 100);
        assert_eq!(progress_extent(10, 0.01), 1);
    }

    #[test]
    fn test_horizontal_bar_fills_left_to_right() {
        let mut fb = FrameBuffer::new(120, 20);
        let bar = ProgressSpec {
            pos: Point::new(10, 5),
            height: 4,
            short_len: 100,
            long_len: 80,
            orientation: Orientation::Horizontal,
        };
        renderer().draw_progress(&mut fb, &bar, 0.25, false).unwrap();
        assert_eq!(fb.count(Rgb888::RED), 25 * 4);
        assert_eq!(fb.count(Rgb888::BLUE), 75 * 4);
        assert_eq!(fb.pixel(10, 5), Some(Rgb888::RED));
        assert_eq!(fb.pixel(109, 8), Some(Rgb888::BLUE));

        let mut fb = FrameBuffer::new(120, 20);
        renderer().draw_progress(&mut fb, &bar, 2.0, true).unwrap();
        assert_eq!(fb.count(Rgb888::RED), 80 * 4);
        assert_eq!(fb.count(Rgb888::BLUE), 0);
    }

    #[test]
    fn test_vertical_bar_fills_bottom_up() {
        let mut fb = FrameBuffer::new(20, 120);
        let bar = ProgressSpec {
            pos: Point::new(2, 10),
            height: 3,
            short_len: 100,
            long_len: 100,
            orientation: Orientation::Vertical,
        };
        renderer().draw_progress(&mut fb, &bar, 0.1, false).unwrap();
        assert_eq!(fb.count(Rgb888::RED), 10 * 3);
        assert_eq!(fb.pixel(2, 109), Some(Rgb888::RED));
        assert_eq!(fb.pixel(2, 10), Some(Rgb888::BLUE));
    }

    #[test]
    fn test_empty_value_draws_nothing() {
        let mut fb = FrameBuffer::new(120, 20);
        let mut r = renderer();
        let snap = StatusSnapshot::from_pairs([("MusicPlayer.Album", "")]);
        let album = field(FieldKind::Value { key: "MusicPlayer.Album".into(), prefix: "" }, false);
        r.draw_field(&mut fb, &album, &snap, "").unwrap();
        let codec = field(FieldKind::Codec, false);
        r.draw_field(&mut fb, &codec, &StatusSnapshot::from_pairs([(LABEL_CODEC, "xyz")]), "").unwrap();
        assert_eq!(fb.count(Rgb888::BLACK), 120 * 20);
    }

    #[test]
    fn test_label_drawn_with_value() {
        let mut fb = FrameBuffer::new(120, 40);
        let mut r = renderer();
        let mut track = field(FieldKind::Value { key: "MusicPlayer.TrackNumber".into(), prefix: "" }, false);
        track.style.pos = Point::new(0, 20);
        track.label = Some(crate::display::field::FieldLabel {
            text: "Track".into(),
            style: TextStyle { fill: Rgb888::GREEN, ..style(0, 0) },
        });
        r.draw_field(&mut fb, &track, &StatusSnapshot::default(), "").unwrap();
        assert_eq!(fb.count(Rgb888::GREEN), 0);

        r.draw_field(&mut fb, &track, &StatusSnapshot::from_pairs([("MusicPlayer.TrackNumber", "07")]), "")
            .unwrap();
        assert!(fb.count(Rgb888::GREEN) > 0);
        assert!(fb.count(Rgb888::WHITE) > 0);
    }

    #[test]
    fn test_truncated_field_stays_inside_margin() {
        let mut fb = FrameBuffer::new(120, 20);
        let mut r = renderer();
        let title = field(FieldKind::Value { key: "MusicPlayer.Title".into(), prefix: "" }, true);
        let snap = StatusSnapshot::from_pairs([("MusicPlayer.Title", "Goldberg Variations, BWV 988: Aria da capo")]);
        r.draw_field(&mut fb, &title, &snap, "").unwrap();
        for x in 100..120 {
            for y in 0..20 {
                assert_eq!(fb.pixel(x, y), Some(Rgb888::BLACK), "pixel {x},{y}");
            }
        }
        r.draw_field(&mut fb, &title, &snap, "").unwrap();
        assert_eq!(r.truncation().measurements(), 1);
    }

    #[test]
    fn test_artist_composer_fallback_renders() {
        let mut with_composer = FrameBuffer::new(120, 20);
        let mut r = renderer();
        let artist = field(FieldKind::Artist, false);
        let snap = StatusSnapshot::from_pairs([(LABEL_ARTIST, ""), (LABEL_COMPOSER, "J.S. Bach")]);
        r.draw_field(&mut with_composer, &artist, &snap, "").unwrap();

        let mut literal = FrameBuffer::new(120, 20);
        draw_text(&mut literal, "(J.S. Bach)", &style(0, 0)).unwrap();
        assert_eq!(with_composer.as_slice(), literal.as_slice());
    }

    #[test]
    fn test_time_hrmin_split() {
        let mut fb = FrameBuffer::new(120, 30);
        let mut r = renderer();
        let small = FontRef::lookup("font_5x8").unwrap();
        let mut clock = field(FieldKind::TimeHrMin { key: "System.Time".into(), small_font: small }, false);
        clock.style.font = FontRef::lookup("font_10x20").unwrap();
        let snap = StatusSnapshot::from_pairs([("System.Time", "10:42 PM")]);
        r.draw_field(&mut fb, &clock, &snap, "").unwrap();
        // "10:42" is 50 px wide, the meridian starts past the gap
        let lit_past_gap = (55..65).any(|x| (12..20).any(|y| fb.pixel(x, y) == Some(Rgb888::WHITE)));
        assert!(lit_past_gap);
        assert!((50..55).all(|x| (0..30).all(|y| fb.pixel(x, y) == Some(Rgb888::BLACK))));
    }

    #[test]
    fn test_thumb_centered_and_clipped() {
        let mut fb = FrameBuffer::new(120, 20);
        let r = renderer();
        let image = RgbImage::from_pixel(40, 40, image::Rgb([0, 255, 0]));
        let spec = ThumbSpec { size: 40, placement: ThumbPlacement::Centered };
        r.draw_thumb(&mut fb, &spec, &image).unwrap();
        assert_eq!(fb.count(Rgb888::GREEN), 40 * 20);
        assert_eq!(fb.pixel(40, 0), Some(Rgb888::GREEN));
        assert_eq!(fb.pixel(39, 0), Some(Rgb888::BLACK));
    }

    #[test]
    fn test_unknown_progress_hides_bar() {
        let mut fb = FrameBuffer::new(120, 20);
        let mut r = renderer();
        let layout = LayoutSpec {
            name: "bar".into(),
            thumb: None,
            progress: Some(ProgressSpec {
                pos: Point::zero(),
                height: 4,
                short_len: 100,
                long_len: 100,
                orientation: Orientation::Horizontal,
            }),
            fields: vec![],
        };
        let snap = StatusSnapshot::from_pairs([(LABEL_TIME, "1:02")]);
        r.render(&mut fb, &layout, &snap, "", None).unwrap();
        assert_eq!(fb.count(Rgb888::BLACK), 120 * 20);
        r.render(&mut fb, &layout, &snap.with_progress(Progress::Fraction(0.5)), "", None).unwrap();
        assert_eq!(fb.count(Rgb888::RED), 50 * 4);
    }
}
