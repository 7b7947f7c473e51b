/*
 *  display/mod.rs
 *
 *  KoMonS - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display subsystem - layouts, caches, renderer and sinks
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

// Core trait definitions
pub mod traits;
pub mod error;
pub mod framebuffer;
pub mod color;
pub mod font;

// Display sinks
pub mod drivers;

// Field-based layout system
pub mod field;
pub mod page;

// Caches
pub mod truncate;
pub mod artwork;

pub mod renderer;

// Display mode controller
pub mod mode_controller;

// Display manager
pub mod manager;

// Re-exports for convenience
pub use traits::{Backlight, DisplayCapabilities, DisplaySink};
pub use error::DisplayError;
pub use framebuffer::FrameBuffer;
pub use font::FontRef;
pub use field::{FieldKind, FieldSpec, TextStyle};
pub use page::{LayoutSpec, Orientation, ProgressSpec, ThumbSpec};
pub use truncate::TruncationCache;
pub use artwork::{ArtworkDefaults, ArtworkResolver, Bitmap};
pub use renderer::LayoutRenderer;
pub use mode_controller::{AudioLayoutCycle, ScreenState};
pub use manager::{DisplayManager, UpdateOutcome};
