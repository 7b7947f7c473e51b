/*
 *  display/drivers/mock.rs
 *
 *  KoMonS - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Mock display sink - records frames and backlight commands
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

use std::sync::{Arc, Mutex, MutexGuard};
use embedded_graphics::pixelcolor::Rgb888;

use crate::display::error::DisplayError;
use crate::display::framebuffer::FrameBuffer;
use crate::display::traits::{Backlight, DisplayCapabilities, DisplaySink};

/// Mock display sink for testing
///
/// Simulates a panel without hardware. Every frame and backlight command is
/// recorded in shared state so a test can keep a handle after the sink has
/// been moved into the display manager.
#[derive(Debug, Clone)]
pub struct MockSink {
    capabilities: DisplayCapabilities,
    state: Arc<Mutex<MockSinkState>>,
}

/// Internal state for the mock sink (shared for inspection in tests)
#[derive(Debug, Default)]
pub struct MockSinkState {
    /// Number of frames written
    pub frame_count: usize,

    /// Copy of the most recent frame
    pub last_frame: Option<Vec<Rgb888>>,

    /// Every backlight command, oldest first
    pub backlight: Vec<Backlight>,

    /// Simulate failures (for error testing)
    pub simulate_write_failure: bool,
}

impl MockSinkState {
    /// Last backlight command, if any
    pub fn backlight_state(&self) -> Option<Backlight> {
        self.backlight.last().copied()
    }

    /// Count pixels of `color` in the last frame
    pub fn count_in_last(&self, color: Rgb888) -> usize {
        self.last_frame
            .as_ref()
            .map(|f| f.iter().filter(|&&p| p == color).count())
            .unwrap_or(0)
    }
}

impl MockSink {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            capabilities: DisplayCapabilities {
                width,
                height,
                supports_backlight: true,
            },
            state: Arc::new(Mutex::new(MockSinkState::default())),
        }
    }

    /// Get reference to state for inspection in tests
    pub fn state(&self) -> Arc<Mutex<MockSinkState>> {
        Arc::clone(&self.state)
    }

    fn lock(&self) -> MutexGuard<'_, MockSinkState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DisplaySink for MockSink {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn write_frame(&mut self, frame: &FrameBuffer) -> Result<(), DisplayError> {
        let (w, h) = frame.dimensions();
        if (w, h) != (self.capabilities.width, self.capabilities.height) {
            return Err(DisplayError::BufferSizeMismatch {
                expected: (self.capabilities.width * self.capabilities.height) as usize,
                actual: (w * h) as usize,
            });
        }
        let mut state = self.lock();
        if state.simulate_write_failure {
            return Err(DisplayError::Other("simulated write failure".into()));
        }
        state.frame_count += 1;
        state.last_frame = Some(frame.as_slice().to_vec());
        Ok(())
    }

    fn set_backlight(&mut self, level: Backlight) -> Result<(), DisplayError> {
        self.lock().backlight.push(level);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_frames_and_backlight() {
        let mut sink = MockSink::new(4, 4);
        let state = sink.state();
        sink.write_frame(&FrameBuffer::new(4, 4)).unwrap();
        sink.set_backlight(Backlight::On).unwrap();
        sink.set_backlight(Backlight::Off).unwrap();

        let s = state.lock().unwrap();
        assert_eq!(s.frame_count, 1);
        assert_eq!(s.count_in_last(Rgb888::new(0, 0, 0)), 16);
        assert_eq!(s.backlight_state(), Some(Backlight::Off));
    }

    #[test]
    fn test_size_mismatch_rejected() {
        let mut sink = MockSink::new(4, 4);
        assert!(matches!(
            sink.write_frame(&FrameBuffer::new(2, 2)),
            Err(DisplayError::BufferSizeMismatch { expected: 16, actual: 4 })
        ));
    }
}
