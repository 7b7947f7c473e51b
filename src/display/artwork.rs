/*
 *  display/artwork.rs
 *
 *  KoMonS - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Cover art resolution - fetch, decode, resize, remember
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

use std::path::{Path, PathBuf};
use std::sync::Arc;
use image::{DynamicImage, RgbImage};
use log::{debug, info};
use thiserror::Error;
use crate::config::ThumbsConfig;
use crate::display::error::DisplayError;
use crate::httprpc::KodiRpcError;
use crate::kodiinfo::{PlayerRpc, StatusSnapshot};

/// Decoded RGB image, shared between the cache and the renderer
pub type Bitmap = Arc<RgbImage>;

/// Kodi writes the cover of the current AirPlay stream here
const AIRPLAY_PREFIX: &str = "special://temp/";
const AIRPLAY_FILES: &[&str] = &["airtunes_album_thumb.png", "airtunes_album_thumb.jpg"];

#[derive(Debug, Error)]
enum ArtworkError {
    #[error("rpc: {0}")]
    Rpc(#[from] KodiRpcError),
    #[error("decode: {0}")]
    Decode(#[from] image::ImageError),
    #[error("read: {0}")]
    Io(#[from] std::io::Error),
}

/// File name of the AirPlay cover if `locator` names it
pub fn airplay_file(locator: &str) -> Option<&str> {
    locator
        .strip_prefix(AIRPLAY_PREFIX)
        .filter(|name| AIRPLAY_FILES.contains(name))
}

/// Kodi hands back its own placeholder name when a track has no art
fn is_placeholder(locator: &str) -> bool {
    locator.starts_with("Default") && !locator.contains("://")
}

/// Shrink to fit `size` on the long edge; smaller images pass untouched
pub fn fit(image: DynamicImage, size: u32) -> RgbImage {
    if image.width() > size || image.height() > size {
        image.thumbnail(size, size).to_rgb8()
    } else {
        image.to_rgb8()
    }
}

pub fn load_image(path: &Path) -> Result<DynamicImage, DisplayError> {
    image::open(path).map_err(|source| DisplayError::Image { path: path.to_path_buf(), source })
}

/// Images used when nothing better is available, always at native size
#[derive(Debug, Clone)]
pub struct ArtworkDefaults {
    pub default_thumb: Bitmap,
    pub default_airplay: Bitmap,
    /// Kodi's temp directory, read directly when Kodi is on this host
    pub local_temp_dir: PathBuf,
}

impl ArtworkDefaults {
    pub fn load(thumbs: &ThumbsConfig) -> Result<Self, DisplayError> {
        Ok(Self {
            default_thumb: Arc::new(load_image(&thumbs.default_thumb)?.to_rgb8()),
            default_airplay: Arc::new(load_image(&thumbs.default_airplay)?.to_rgb8()),
            local_temp_dir: thumbs.local_temp_dir.clone(),
        })
    }

    pub fn new(default_thumb: RgbImage, default_airplay: RgbImage, local_temp_dir: PathBuf) -> Self {
        Self {
            default_thumb: Arc::new(default_thumb),
            default_airplay: Arc::new(default_airplay),
            local_temp_dir,
        }
    }
}

/// Remembers the last cover so an unchanged locator costs no I/O
#[derive(Debug)]
pub struct ArtworkResolver {
    defaults: ArtworkDefaults,
    last_locator: Option<String>,
    last_image: Option<Bitmap>,
    last_modified: Option<String>,
}

impl ArtworkResolver {
    pub fn new(defaults: ArtworkDefaults) -> Self {
        Self { defaults, last_locator: None, last_image: None, last_modified: None }
    }

    /// Forget the cached cover; the next resolve starts from scratch
    pub fn reset(&mut self) {
        self.last_locator = None;
        self.last_image = None;
        self.last_modified = None;
    }

    pub fn defaults(&self) -> &ArtworkDefaults {
        &self.defaults
    }

    /// Cover for `snapshot`, at most `thumb_size` on the long edge
    pub async fn resolve<R: PlayerRpc + ?Sized>(
        &mut self,
        rpc: &R,
        snapshot: &StatusSnapshot,
        thumb_size: u32,
    ) -> Bitmap {
        let locator = snapshot.cover();
        match airplay_file(locator) {
            Some(file) => self.resolve_airplay(rpc, locator, file, thumb_size).await,
            None => self.resolve_library(rpc, locator, thumb_size).await,
        }
    }

    async fn resolve_library<R: PlayerRpc + ?Sized>(&mut self, rpc: &R, locator: &str, size: u32) -> Bitmap {
        if let Some(image) = self.cached(locator) {
            return image;
        }

        let image = if locator.is_empty() || is_placeholder(locator) {
            self.defaults.default_thumb.clone()
        } else {
            match fetch(rpc, locator, size).await {
                Ok(image) => {
                    info!("cover art: {locator}");
                    image
                }
                Err(e) => {
                    debug!("cover art {locator} unavailable ({e}), using default");
                    self.defaults.default_thumb.clone()
                }
            }
        };
        self.remember(locator, image, None)
    }

    async fn resolve_airplay<R: PlayerRpc + ?Sized>(
        &mut self,
        rpc: &R,
        locator: &str,
        file: &str,
        size: u32,
    ) -> Bitmap {
        if rpc.is_local() {
            return self.resolve_airplay_local(locator, file, size);
        }

        match rpc.file_last_modified(locator).await {
            Ok(token) => {
                if self.last_modified.as_deref() == Some(token.as_str()) {
                    if let Some(image) = self.cached(locator) {
                        return image;
                    }
                }
                let image = match fetch(rpc, locator, size).await {
                    Ok(image) => image,
                    Err(e) => {
                        debug!("airplay art unavailable ({e})");
                        self.airplay_fallback(&e)
                    }
                };
                self.remember(locator, image, Some(token))
            }
            Err(e) => {
                debug!("airplay art last-modified unavailable ({e})");
                self.remember(locator, self.defaults.default_airplay.clone(), None)
            }
        }
    }

    /// Kodi on this host: read the stream cover straight off disk
    fn resolve_airplay_local(&mut self, locator: &str, file: &str, size: u32) -> Bitmap {
        let path = self.defaults.local_temp_dir.join(file);
        let token = std::fs::metadata(&path)
            .and_then(|m| m.modified())
            .map(|t| format!("{t:?}"))
            .ok();

        let Some(token) = token else {
            return self.remember(locator, self.defaults.default_airplay.clone(), None);
        };
        if self.last_modified.as_deref() == Some(token.as_str()) {
            if let Some(image) = self.cached(locator) {
                return image;
            }
        }
        let image = match read_local(&path, size) {
            Ok(image) => image,
            Err(e) => {
                debug!("{}: {e}", path.display());
                self.airplay_fallback(&e)
            }
        };
        self.remember(locator, image, Some(token))
    }

    /// Undecodable bytes get the generic default; missing art the AirPlay one
    fn airplay_fallback(&self, err: &ArtworkError) -> Bitmap {
        match err {
            ArtworkError::Decode(_) => self.defaults.default_thumb.clone(),
            ArtworkError::Rpc(_) | ArtworkError::Io(_) => self.defaults.default_airplay.clone(),
        }
    }

    fn cached(&self, locator: &str) -> Option<Bitmap> {
        match (&self.last_locator, &self.last_image) {
            (Some(last), Some(image)) if last == locator => Some(image.clone()),
            _ => None,
        }
    }

    fn remember(&mut self, locator: &str, image: Bitmap, token: Option<String>) -> Bitmap {
        self.last_locator = Some(locator.to_string());
        self.last_image = Some(image.clone());
        self.last_modified = token;
        image
    }
}

async fn fetch<R: PlayerRpc + ?Sized>(rpc: &R, locator: &str, size: u32) -> Result<Bitmap, ArtworkError> {
    let url = if locator.starts_with("http://") || locator.starts_with("https://") {
        locator.to_string()
    } else {
        rpc.prepare_download(locator).await?
    };
    let bytes = rpc.fetch_bytes(&url).await?;
    let image = image::load_from_memory(&bytes)?;
    Ok(Arc::new(fit(image, size)))
}

fn read_local(path: &Path, size: u32) -> Result<Bitmap, ArtworkError> {
    let bytes = std::fs::read(path)?;
    let image = image::load_from_memory(&bytes)?;
    Ok(Arc::new(fit(image, size)))
}
