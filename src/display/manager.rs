/*
 *  display/manager.rs
 *
 *  KoMonS - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display manager - one render session: frame, caches, modes and sink
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

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use chrono::Local;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use image::RgbImage;
use log::{debug, error, info, warn};

use crate::config::Config;
use crate::display::artwork::{self, ArtworkDefaults, ArtworkResolver, Bitmap};
use crate::display::color::ColorTable;
use crate::display::error::DisplayError;
use crate::display::field::TextStyle;
use crate::display::font::FontRef;
use crate::display::framebuffer::FrameBuffer;
use crate::display::mode_controller::{AudioLayoutCycle, ScreenState};
use crate::display::page::LayoutSpec;
use crate::display::renderer::{self, LayoutRenderer};
use crate::display::traits::{Backlight, DisplaySink};
use crate::httprpc::KodiRpcError;
use crate::kodiinfo::{self, Activity, PlayerRpc, StatusSnapshot};

pub const SPLASH_TEXT: &str = "Waiting to connect with Kodi...";

/// What a poll cycle ended up showing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Now playing, with the layout used
    Audio { layout: String },
    /// Idle status screen
    Status,
    /// Nothing worth showing, backlight off
    Dark,
}

/// Everything one render session owns
///
/// Held behind a single async mutex by the poller; every method here runs
/// inside that critical section.
pub struct DisplayManager<S: DisplaySink> {
    frame: FrameBuffer,
    sink: S,
    renderer: LayoutRenderer,
    artwork: ArtworkResolver,
    cycle: AudioLayoutCycle,
    screen: ScreenState,
    layouts: HashMap<String, LayoutSpec>,
    status_layout: LayoutSpec,
    host_icon: Option<Bitmap>,
    splash_font: FontRef,
    backlight: Option<Backlight>,
}

impl<S: DisplaySink> DisplayManager<S> {
    /// Resolve layouts, load bundled images and take ownership of the sink
    pub fn from_config(cfg: &Config, sink: S) -> Result<Self, DisplayError> {
        let defaults = ArtworkDefaults::load(&cfg.thumbs)?;
        let host_icon = match artwork::load_image(&cfg.thumbs.kodi_thumb) {
            Ok(icon) => Some(icon.to_rgb8()),
            Err(e) => {
                warn!("host icon unavailable: {e}");
                None
            }
        };
        Self::with_defaults(cfg, sink, defaults, host_icon)
    }

    /// As `from_config`, with the fallback images supplied by the caller
    pub fn with_defaults(
        cfg: &Config,
        sink: S,
        defaults: ArtworkDefaults,
        host_icon: Option<RgbImage>,
    ) -> Result<Self, DisplayError> {
        let colors = ColorTable::from_config(&cfg.colors)?;
        let (width, height) = sink.dimensions();

        let mut layouts = HashMap::with_capacity(cfg.a_layout.len());
        for (name, raw) in &cfg.a_layout {
            layouts.insert(name.clone(), LayoutSpec::resolve(name, raw, &colors)?);
        }
        let status_layout = LayoutSpec::resolve("STATUS", &cfg.status_layout, &colors)?;
        let cycle = AudioLayoutCycle::new(cfg.alayout_names.clone(), cfg.alayout_initial.as_deref())?;
        if let Some(missing) = cfg.alayout_names.iter().find(|n| !layouts.contains_key(*n)) {
            return Err(DisplayError::Other(format!("audio layout '{missing}' is not defined")));
        }

        let host_icon = match (host_icon, status_layout.thumb.as_ref()) {
            (Some(icon), Some(thumb)) => {
                Some(Arc::new(artwork::fit(image::DynamicImage::ImageRgb8(icon), thumb.size)))
            }
            _ => None,
        };

        info!("display {}x{}, audio layouts {:?}, starting with {}", width, height, cfg.alayout_names, cycle.current());
        Ok(Self {
            frame: FrameBuffer::new(width, height),
            sink,
            renderer: LayoutRenderer::new(width, colors.progress_bg(), colors.progress_fg()),
            artwork: ArtworkResolver::new(defaults),
            cycle,
            screen: ScreenState::new(Duration::from_secs(cfg.screen_wake_secs)),
            layouts,
            status_layout,
            host_icon,
            splash_font: FontRef::lookup(&cfg.splash_font)?,
            backlight: None,
        })
    }

    pub fn current_layout(&self) -> &str {
        self.cycle.current()
    }

    pub fn screen_active(&self) -> bool {
        self.screen.is_active()
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn renderer(&self) -> &LayoutRenderer {
        &self.renderer
    }

    /// One poll cycle: ask what is playing, then draw accordingly
    ///
    /// `pressed` carries a coalesced press since the previous cycle. Only
    /// player errors come back; drawing and sink problems are logged.
    pub async fn update_display<R: PlayerRpc + ?Sized>(
        &mut self,
        rpc: &R,
        pressed: bool,
    ) -> Result<UpdateOutcome, KodiRpcError> {
        let activity = rpc.active_player().await?;

        if let Activity::Audio { player_id } = activity {
            if pressed {
                let next = self.cycle.advance();
                info!("audio layout -> {next}");
                self.artwork.reset();
            }
            self.set_backlight(Backlight::On);
            let snapshot = kodiinfo::track_snapshot(rpc, player_id).await?;
            self.render_audio(rpc, &snapshot).await;
            return Ok(UpdateOutcome::Audio { layout: self.cycle.current().to_string() });
        }

        self.artwork.reset();
        let now = Local::now();
        if pressed {
            self.screen.wake(now);
            info!("status screen on until {}", self.screen.off_time().format("%H:%M:%S"));
        } else if self.screen.expire(now) {
            info!("status screen off");
        }

        if self.screen.is_active() {
            let snapshot = kodiinfo::status_snapshot(rpc).await?;
            self.set_backlight(Backlight::On);
            self.render_status(&snapshot, activity.summary());
            Ok(UpdateOutcome::Status)
        } else {
            self.go_dark();
            Ok(UpdateOutcome::Dark)
        }
    }

    async fn render_audio<R: PlayerRpc + ?Sized>(&mut self, rpc: &R, snapshot: &StatusSnapshot) {
        let Some(layout) = self.layouts.get(self.cycle.current()) else {
            error!("audio layout {} vanished", self.cycle.current());
            return;
        };

        self.frame.clear_frame();
        let thumb = match layout.thumb.as_ref() {
            Some(spec) => Some(self.artwork.resolve(rpc, snapshot, spec.size).await),
            None => None,
        };
        if let Err(e) = self.renderer.render(&mut self.frame, layout, snapshot, "", thumb.as_deref()) {
            warn!("render {}: {e}", layout.name);
        }
        self.emit();
    }

    fn render_status(&mut self, snapshot: &StatusSnapshot, summary: &str) {
        self.frame.clear_frame();
        let icon = self.host_icon.as_deref();
        if let Err(e) = self.renderer.render(&mut self.frame, &self.status_layout, snapshot, summary, icon) {
            warn!("render status: {e}");
        }
        self.emit();
    }

    /// Splash shown while the player cannot be reached
    pub fn show_waiting(&mut self) {
        self.frame.clear_frame();
        let (w, h) = self.frame.dimensions();
        let text_w = self.splash_font.measure(SPLASH_TEXT) as i32;
        let style = TextStyle {
            pos: Point::new(((w as i32 - text_w) / 2).max(0), (h as i32 - self.splash_font.height() as i32) / 2),
            font: self.splash_font,
            fill: Rgb888::WHITE,
        };
        if let Err(e) = renderer::draw_text(&mut self.frame, SPLASH_TEXT, &style) {
            warn!("splash: {e}");
        }
        self.set_backlight(Backlight::On);
        self.emit();
    }

    /// Session lost: forget cached art and idle state
    pub fn disconnected(&mut self) {
        self.artwork.reset();
        self.screen.sleep();
    }

    /// Blank the panel and switch the backlight off
    pub fn shutdown(&mut self) {
        self.frame.clear_frame();
        self.emit();
        self.set_backlight(Backlight::Off);
    }

    fn go_dark(&mut self) {
        if self.backlight != Some(Backlight::Off) {
            self.frame.clear_frame();
            self.emit();
        }
        self.set_backlight(Backlight::Off);
    }

    fn set_backlight(&mut self, level: Backlight) {
        if self.backlight == Some(level) {
            return;
        }
        debug!("backlight {:?}", level);
        match self.sink.set_backlight(level) {
            Ok(()) => self.backlight = Some(level),
            Err(e) => warn!("backlight: {e}"),
        }
    }

    fn emit(&mut self) {
        if let Err(e) = self.sink.write_frame(&self.frame) {
            warn!("frame push failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::drivers::MockSink;
    use crate::kodiinfo::LABEL_TIME;
    use crate::mockrpc::MockPlayer;

    fn manager() -> (DisplayManager<MockSink>, MockSink) {
        let sink = MockSink::new(320, 240);
        let handle = sink.clone();
        let defaults = ArtworkDefaults::new(RgbImage::new(32, 32), RgbImage::new(16, 16), "/nonexistent".into());
        let mgr = DisplayManager::with_defaults(&Config::default(), sink, defaults, Some(RgbImage::new(200, 200)))
            .unwrap();
        (mgr, handle)
    }

    #[tokio::test]
    async fn test_idle_without_press_stays_dark() {
        let (mut mgr, sink) = manager();
        let mock = MockPlayer::new();
        assert_eq!(mgr.update_display(&mock, false).await.unwrap(), UpdateOutcome::Dark);
        let state = sink.state();
        let s = state.lock().unwrap();
        assert_eq!(s.backlight_state(), Some(Backlight::Off));
    }

    #[tokio::test]
    async fn test_idle_press_wakes_status_screen() {
        let (mut mgr, sink) = manager();
        let mock = MockPlayer::new();
        mock.set_label("System.Time", "10:42 PM");
        assert_eq!(mgr.update_display(&mock, true).await.unwrap(), UpdateOutcome::Status);
        assert!(mgr.screen_active());
        // stays lit on following cycles within the wake period
        assert_eq!(mgr.update_display(&mock, false).await.unwrap(), UpdateOutcome::Status);
        let state = sink.state();
        let s = state.lock().unwrap();
        assert_eq!(s.backlight_state(), Some(Backlight::On));
        assert_eq!(s.frame_count, 2);
        assert!(s.count_in_last(Rgb888::BLACK) < 320 * 240);
    }

    #[tokio::test]
    async fn test_audio_press_advances_layout() {
        let cfg = {
            let mut cfg = Config::default();
            let alt = cfg.a_layout["A_DEFAULT"].clone();
            cfg.a_layout.insert("A_ALT".into(), alt);
            cfg.alayout_names.push("A_ALT".into());
            cfg
        };
        let sink = MockSink::new(320, 240);
        let defaults = ArtworkDefaults::new(RgbImage::new(32, 32), RgbImage::new(16, 16), "/nonexistent".into());
        let mut mgr = DisplayManager::with_defaults(&cfg, sink, defaults, None).unwrap();

        let mock = MockPlayer::new();
        mock.set_activity(Activity::Audio { player_id: 0 });
        mock.set_label("MusicPlayer.Title", "Blue in Green");
        mock.set_label(LABEL_TIME, "2:14");
        mock.set_percentage(Some(0.4));

        let first = mgr.update_display(&mock, false).await.unwrap();
        assert_eq!(first, UpdateOutcome::Audio { layout: "A_DEFAULT".into() });
        let second = mgr.update_display(&mock, true).await.unwrap();
        assert_eq!(second, UpdateOutcome::Audio { layout: "A_ALT".into() });
        assert!(!mgr.screen_active());
        let third = mgr.update_display(&mock, true).await.unwrap();
        assert_eq!(third, UpdateOutcome::Audio { layout: "A_DEFAULT".into() });
    }

    #[tokio::test]
    async fn test_waiting_splash_lights_panel() {
        let (mut mgr, sink) = manager();
        mgr.show_waiting();
        let state = sink.state();
        let s = state.lock().unwrap();
        assert_eq!(s.backlight_state(), Some(Backlight::On));
        assert!(s.count_in_last(Rgb888::WHITE) > 0);
    }

    #[tokio::test]
    async fn test_status_screen_expires_to_dark() {
        let cfg = Config { screen_wake_secs: 0, ..Config::default() };
        let sink = MockSink::new(320, 240);
        let state = sink.state();
        let defaults = ArtworkDefaults::new(RgbImage::new(32, 32), RgbImage::new(16, 16), "/nonexistent".into());
        let mut mgr = DisplayManager::with_defaults(&cfg, sink, defaults, Some(RgbImage::new(200, 200))).unwrap();
        let mock = MockPlayer::new();
        mock.set_label("System.Time", "10:42 PM");

        assert_eq!(mgr.update_display(&mock, true).await.unwrap(), UpdateOutcome::Status);
        assert!(state.lock().unwrap().count_in_last(Rgb888::BLACK) < 320 * 240);

        assert_eq!(mgr.update_display(&mock, false).await.unwrap(), UpdateOutcome::Dark);
        assert!(!mgr.screen_active());
        let s = state.lock().unwrap();
        assert_eq!(s.backlight_state(), Some(Backlight::Off));
        assert_eq!(s.count_in_last(Rgb888::BLACK), 320 * 240);
        assert_eq!(s.frame_count, 2);
    }

    #[tokio::test]
    async fn test_sink_write_failure_keeps_cycle_alive() {
        let (mut mgr, sink) = manager();
        let state = sink.state();
        state.lock().unwrap().simulate_write_failure = true;
        let mock = MockPlayer::new();
        mock.set_label("System.Time", "10:42 PM");

        assert_eq!(mgr.update_display(&mock, true).await.unwrap(), UpdateOutcome::Status);
        let s = state.lock().unwrap();
        assert_eq!(s.frame_count, 0);
        assert_eq!(s.backlight_state(), Some(Backlight::On));
    }

    #[tokio::test]
    async fn test_query_failure_propagates() {
        let (mut mgr, _sink) = manager();
        let mock = MockPlayer::new();
        mock.set_offline(true);
        assert!(mgr.update_display(&mock, false).await.is_err());
    }
}
