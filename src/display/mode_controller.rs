/*
 *  display/mode_controller.rs
 *
 *  KoMonS - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Audio layout cycle and idle screen power state
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

use chrono::{DateTime, Duration, Local};
use crate::config::ConfigError;

/// Configured audio layouts in press order; wraps from last to first
#[derive(Debug, Clone)]
pub struct AudioLayoutCycle {
    names: Vec<String>,
    index: usize,
}

impl AudioLayoutCycle {
    /// `initial` must be one of `names`; `None` starts at the first
    pub fn new(names: Vec<String>, initial: Option<&str>) -> Result<Self, ConfigError> {
        if names.is_empty() {
            return Err(ConfigError::Validation("audio layout cycle is empty".into()));
        }
        let index = match initial {
            Some(name) => names
                .iter()
                .position(|n| n == name)
                .ok_or_else(|| ConfigError::Validation(format!("unknown initial audio layout '{name}'")))?,
            None => 0,
        };
        Ok(Self { names, index })
    }

    pub fn current(&self) -> &str {
        &self.names[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Step to the next layout and return its name
    pub fn advance(&mut self) -> &str {
        self.index = (self.index + 1) % self.names.len();
        &self.names[self.index]
    }
}

/// Idle status screen power: lit for a while after a press, then dark
#[derive(Debug, Clone)]
pub struct ScreenState {
    active: bool,
    off_time: DateTime<Local>,
    wake: Duration,
}

impl ScreenState {
    pub fn new(wake: std::time::Duration) -> Self {
        Self {
            active: false,
            off_time: Local::now(),
            wake: Duration::from_std(wake).unwrap_or_else(|_| Duration::seconds(25)),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn off_time(&self) -> DateTime<Local> {
        self.off_time
    }

    /// Light up until `now + wake`
    pub fn wake(&mut self, now: DateTime<Local>) {
        self.active = true;
        self.off_time = now + self.wake;
    }

    /// Go dark once the wake period is over; true on that transition
    pub fn expire(&mut self, now: DateTime<Local>) -> bool {
        if self.active && now >= self.off_time {
            self.active = false;
            return true;
        }
        false
    }

    pub fn sleep(&mut self) {
        self.active = false;
    }
}
