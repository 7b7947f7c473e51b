/*
 *  display/truncate.rs
 *
 *  KoMonS - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Ellipsis truncation with a small most-recent-first memo
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

use std::collections::VecDeque;
use log::debug;
use crate::display::font::FontRef;

/// Only this many leading characters take part in keying and truncation
pub const SOURCE_CHARS: usize = 59;
/// Memo capacity; the oldest entry goes first
pub const CAPACITY: usize = 9;
pub const ELLIPSIS: char = '\u{2026}';

#[derive(Debug, Clone)]
struct Entry {
    source: String,
    font: FontRef,
    max_width: u32,
    result: String,
}

/// Memoised text truncation
///
/// Title, artist and album lines are re-rendered every poll while a track
/// plays, so the measurement loop only runs when one of them changes.
#[derive(Debug, Default)]
pub struct TruncationCache {
    entries: VecDeque<Entry>,
    measurements: u64,
}

impl TruncationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit `text` into `max_width` pixels of `font`
    ///
    /// Returns `text` untouched when it already fits, otherwise a strict
    /// prefix of its first [`SOURCE_CHARS`] characters plus one [`ELLIPSIS`].
    /// An extent narrower than the ellipsis itself gets an empty string.
    pub fn truncate(&mut self, text: &str, font: FontRef, max_width: u32) -> String {
        if text.is_empty() {
            return String::new();
        }

        let source: String = text.chars().take(SOURCE_CHARS).collect();
        if let Some(hit) = self
            .entries
            .iter()
            .find(|e| e.font == font && e.max_width == max_width && e.source == source)
        {
            return hit.result.clone();
        }

        self.measurements += 1;
        let result = if font.measure(text) <= max_width {
            text.to_string()
        } else {
            Self::shorten(&source, font, max_width)
        };
        debug!("truncate miss: {:?} -> {:?} ({})", source, result, font.name());

        self.entries.push_front(Entry { source, font, max_width, result: result.clone() });
        self.entries.truncate(CAPACITY);
        result
    }

    /// Times the measurement path has run
    pub fn measurements(&self) -> u64 {
        self.measurements
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn shorten(source: &str, font: FontRef, max_width: u32) -> String {
        let chars: Vec<char> = source.chars().collect();
        let ellipsis = font.measure(&ELLIPSIS.to_string());

        // first guess from the mean glyph width, then walk back one at a time
        let advance = font.advance().max(1);
        let estimate = (max_width.saturating_sub(ellipsis) / advance) as usize;
        let mut len = estimate.min(chars.len().saturating_sub(1));

        loop {
            let mut candidate: String = chars[..len].iter().collect();
            candidate.push(ELLIPSIS);
            if font.measure(&candidate) <= max_width {
                return candidate;
            }
            if len == 0 {
                // not even the ellipsis fits
                return String::new();
            }
            len -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font() -> FontRef {
        FontRef::lookup("font_6x10").unwrap()
    }

    #[test]
    fn test_fitting_text_unchanged() {
        let mut cache = TruncationCache::new();
        assert_eq!(cache.truncate("Blue in Green", font(), 200), "Blue in Green");
        assert_eq!(cache.truncate("", font(), 0), "");
    }

    #[test]
    fn test_shortened_text_is_prefix_plus_ellipsis() {
        let mut cache = TruncationCache::new();
        let text = "Concerto for Two Violins in D minor, BWV 1043: I. Vivace";
        for width in [20u32, 61, 100, 150, 300] {
            let out = cache.truncate(text, font(), width);
            assert!(font().measure(&out) <= width, "width {width}: {out}");
            let body = out.strip_suffix(ELLIPSIS).expect("ellipsis");
            assert!(!body.contains(ELLIPSIS));
            assert!(text.starts_with(body));
            assert!(body.chars().count() < SOURCE_CHARS);
        }
    }

    #[test]
    fn test_extent_narrower_than_ellipsis_is_empty() {
        let mut cache = TruncationCache::new();
        assert_eq!(cache.truncate("Hello", font(), 3), "");
        assert_eq!(cache.truncate("Hello", font(), 0), "");
        assert_eq!(cache.truncate("Hello", font(), 6), ELLIPSIS.to_string());
    }

    #[test]
    fn test_long_text_capped_at_source_chars() {
        let mut cache = TruncationCache::new();
        let text = "x".repeat(120);
        let out = cache.truncate(&text, font(), 10_000);
        // fits outright, so it comes back whole
        assert_eq!(out, text);
        let out = cache.truncate(&text, font(), 6 * 100);
        assert!(out.chars().count() <= SOURCE_CHARS);
    }

    #[test]
    fn test_cache_hit_skips_measurement() {
        let mut cache = TruncationCache::new();
        let text = "A Love Supreme, Pt. I - Acknowledgement";
        let first = cache.truncate(text, font(), 90);
        assert_eq!(cache.measurements(), 1);
        let second = cache.truncate(text, font(), 90);
        assert_eq!(first, second);
        assert_eq!(cache.measurements(), 1);
    }

    #[test]
    fn test_font_is_part_of_key() {
        let mut cache = TruncationCache::new();
        let text = "So What / Freddie Freeloader / Blue in Green";
        let small = cache.truncate(text, font(), 120);
        let large = cache.truncate(text, FontRef::lookup("font_10x20").unwrap(), 120);
        assert_eq!(cache.measurements(), 2);
        assert_ne!(small, large);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut cache = TruncationCache::new();
        for i in 0..CAPACITY + 3 {
            cache.truncate(&format!("track {i}"), font(), 300);
        }
        assert_eq!(cache.len(), CAPACITY);
        cache.truncate("track 0", font(), 300);
        assert_eq!(cache.measurements(), (CAPACITY + 4) as u64);
        cache.truncate(&format!("track {}", CAPACITY + 2), font(), 300);
        assert_eq!(cache.measurements(), (CAPACITY + 4) as u64);
    }
}
