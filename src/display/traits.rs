/*
 *  display/traits.rs
 *
 *  KoMonS - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display sink abstraction - where finished frames are handed off
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

use crate::display::error::DisplayError;
use crate::display::framebuffer::FrameBuffer;

/// Display capabilities and metadata
#[derive(Debug, Clone)]
pub struct DisplayCapabilities {
    /// Display width in pixels
    pub width: u32,

    /// Display height in pixels
    pub height: u32,

    /// Whether backlight commands do anything (OLED panels have none)
    pub supports_backlight: bool,
}

/// Discrete backlight command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backlight {
    On,
    Off,
    /// Brightness 0-255
    Level(u8),
}

/// Every frame sink implements this trait
///
/// The sink receives a fully composed frame; it never draws. Pixel push and
/// backlight wiring are the sink's concern alone.
pub trait DisplaySink: Send {
    /// Returns the capabilities of this display
    fn capabilities(&self) -> &DisplayCapabilities;

    /// Returns the display dimensions as (width, height)
    fn dimensions(&self) -> (u32, u32) {
        let caps = self.capabilities();
        (caps.width, caps.height)
    }

    /// Push a completed frame to the panel
    fn write_frame(&mut self, frame: &FrameBuffer) -> Result<(), DisplayError>;

    /// Switch or dim the backlight
    ///
    /// Sinks without a controllable backlight accept the call and do nothing.
    fn set_backlight(&mut self, level: Backlight) -> Result<(), DisplayError>;
}
