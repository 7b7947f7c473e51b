/*
 *  display/error.rs
 *
 *  KoMonS - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Error types for the display sink and image assets
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

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for display sink and asset operations
#[derive(Debug, Error)]
pub enum DisplayError {
    /// Device node could not be opened or mapped
    #[error("display device {path}: {source}")]
    Device {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Backlight control write failed
    #[error("backlight control: {0}")]
    Backlight(#[source] std::io::Error),

    /// Framebuffer size mismatch
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// A bundled image (default thumbnail, host icon) could not be loaded
    #[error("image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Layout, font or colour configuration did not resolve
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// Drawing onto the frame failed
    #[error("drawing error: {0}")]
    Drawing(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
