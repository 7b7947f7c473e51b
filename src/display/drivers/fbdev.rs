/*
 *  display/drivers/fbdev.rs
 *
 *  KoMonS - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Linux framebuffer sink (fbtft SPI panels) - RGB565 over a memory map
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

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use log::{debug, info};
use memmap2::{MmapMut, MmapOptions};

use crate::config::DisplayConfig;
use crate::display::error::DisplayError;
use crate::display::framebuffer::FrameBuffer;
use crate::display::traits::{Backlight, DisplayCapabilities, DisplaySink};

const BYTES_PER_PIXEL: usize = 2;
/// fbdev blanking levels as written to `bl_power`
const FB_BLANK_UNBLANK: &str = "0";
const FB_BLANK_POWERDOWN: &str = "4";

/// Frame sink over `/dev/fbN`
pub struct FbDevSink {
    device: PathBuf,
    mmap: MmapMut,
    /// bytes per line, may exceed width * 2
    stride: usize,
    capabilities: DisplayCapabilities,
    backlight: Option<PathBuf>,
}

impl std::fmt::Debug for FbDevSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FbDevSink")
            .field("device", &self.device)
            .field("stride", &self.stride)
            .field("capabilities", &self.capabilities)
            .field("backlight", &self.backlight)
            .finish()
    }
}

/// Line length the kernel reports for `device`, when it says
fn sysfs_stride(device: &Path) -> Option<usize> {
    let name = device.file_name()?.to_str()?;
    let text = fs::read_to_string(format!("/sys/class/graphics/{name}/stride")).ok()?;
    text.trim().parse().ok()
}

impl FbDevSink {
    pub fn open(config: &DisplayConfig) -> Result<Self, DisplayError> {
        let stride = sysfs_stride(&config.fbdev).unwrap_or(config.width as usize * BYTES_PER_PIXEL);
        Self::open_with(&config.fbdev, config.width, config.height, stride, config.backlight.clone())
    }

    pub fn open_with(
        device: &Path,
        width: u32,
        height: u32,
        stride: usize,
        backlight: Option<PathBuf>,
    ) -> Result<Self, DisplayError> {
        let row = width as usize * BYTES_PER_PIXEL;
        if stride < row {
            return Err(DisplayError::BufferSizeMismatch { expected: row, actual: stride });
        }
        let device_err = |source| DisplayError::Device { path: device.to_path_buf(), source };

        let file = OpenOptions::new().read(true).write(true).open(device).map_err(device_err)?;
        let len = stride * height as usize;
        let mmap = unsafe { MmapOptions::new().len(len).map_mut(&file) }.map_err(device_err)?;

        info!("framebuffer {} {}x{} stride {}", device.display(), width, height, stride);
        Ok(Self {
            device: device.to_path_buf(),
            mmap,
            stride,
            capabilities: DisplayCapabilities {
                width,
                height,
                supports_backlight: backlight.is_some(),
            },
            backlight,
        })
    }

    fn write_sysfs(&self, leaf: &str, value: &str) -> Result<(), DisplayError> {
        if let Some(dir) = self.backlight.as_ref() {
            debug!("backlight {}/{} <- {}", dir.display(), leaf, value);
            fs::write(dir.join(leaf), value).map_err(DisplayError::Backlight)?;
        }
        Ok(())
    }
}

impl DisplaySink for FbDevSink {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn write_frame(&mut self, frame: &FrameBuffer) -> Result<(), DisplayError> {
        let bytes = frame.to_rgb565_le();
        let row = self.capabilities.width as usize * BYTES_PER_PIXEL;
        let expected = row * self.capabilities.height as usize;
        if bytes.len() != expected {
            return Err(DisplayError::BufferSizeMismatch { expected, actual: bytes.len() });
        }
        for (y, line) in bytes.chunks_exact(row).enumerate() {
            let base = y * self.stride;
            self.mmap[base..base + row].copy_from_slice(line);
        }
        Ok(())
    }

    fn set_backlight(&mut self, level: Backlight) -> Result<(), DisplayError> {
        match level {
            Backlight::On => self.write_sysfs("bl_power", FB_BLANK_UNBLANK),
            Backlight::Off => self.write_sysfs("bl_power", FB_BLANK_POWERDOWN),
            Backlight::Level(0) => self.write_sysfs("bl_power", FB_BLANK_POWERDOWN),
            Backlight::Level(n) => {
                self.write_sysfs("bl_power", FB_BLANK_UNBLANK)?;
                self.write_sysfs("brightness", &n.to_string())
            }
        }
    }
}
