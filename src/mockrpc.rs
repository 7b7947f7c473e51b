/*
 *  mockrpc.rs
 *
 *  KoMonS - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Scriptable in-memory player for tests and dry runs
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
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use async_trait::async_trait;
use crate::httprpc::KodiRpcError;
use crate::kodiinfo::{Activity, PlayerRpc};

#[derive(Debug, Default)]
struct Script {
    activity: Option<Activity>,
    labels: HashMap<String, String>,
    percentage: Option<f64>,
    /// url -> body
    files: HashMap<String, Vec<u8>>,
    last_modified: HashMap<String, String>,
    /// successful queries left before the link drops
    fail_after: Option<usize>,
}

/// In-memory `PlayerRpc`
///
/// Everything is served from the script; counters record what was asked
/// so tests can assert on I/O.
#[derive(Debug, Default)]
pub struct MockPlayer {
    script: Mutex<Script>,
    offline: AtomicBool,
    local: AtomicBool,
    pub pings: AtomicUsize,
    pub fetches: AtomicUsize,
    pub prepares: AtomicUsize,
}

impl MockPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_activity(&self, activity: Activity) {
        self.lock().activity = Some(activity);
    }

    pub fn set_label(&self, key: &str, value: &str) {
        self.lock().labels.insert(key.to_string(), value.to_string());
    }

    pub fn set_percentage(&self, p: Option<f64>) {
        self.lock().percentage = p;
    }

    /// Serve `body` at `url`, the address `prepare_download` hands out
    pub fn add_file(&self, path: &str, body: Vec<u8>) {
        self.lock().files.insert(Self::url_for(path), body);
    }

    pub fn set_last_modified(&self, file: &str, token: &str) {
        self.lock().last_modified.insert(file.to_string(), token.to_string());
    }

    /// Drop the link now (`true`) or bring it back
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
        if !offline {
            self.lock().fail_after = None;
        }
    }

    /// Answer `n` more player queries, then go offline
    pub fn fail_after(&self, n: usize) {
        self.lock().fail_after = Some(n);
    }

    pub fn set_local(&self, local: bool) {
        self.local.store(local, Ordering::SeqCst);
    }

    pub fn url_for(path: &str) -> String {
        format!("http://mock/vfs/{}", path.trim_start_matches('/'))
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        // a panicking test thread must not hide the script from the rest
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn link(&self) -> Result<(), KodiRpcError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(KodiRpcError::Status(503));
        }
        let mut script = self.lock();
        if let Some(n) = script.fail_after.as_mut() {
            if *n == 0 {
                drop(script);
                self.offline.store(true, Ordering::SeqCst);
                return Err(KodiRpcError::Status(503));
            }
            *n -= 1;
        }
        Ok(())
    }
}

#[async_trait]
impl PlayerRpc for MockPlayer {
    async fn ping(&self) -> Result<(), KodiRpcError> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(KodiRpcError::Status(503));
        }
        Ok(())
    }

    async fn active_player(&self) -> Result<Activity, KodiRpcError> {
        self.link()?;
        Ok(self.lock().activity.unwrap_or(Activity::Idle))
    }

    async fn info_labels(&self, labels: &[&str]) -> Result<HashMap<String, String>, KodiRpcError> {
        self.link()?;
        let script = self.lock();
        Ok(labels
            .iter()
            .map(|&l| (l.to_string(), script.labels.get(l).cloned().unwrap_or_default()))
            .collect())
    }

    async fn percentage(&self, _player_id: i64) -> Option<f64> {
        if self.offline.load(Ordering::SeqCst) {
            return None;
        }
        self.lock().percentage
    }

    async fn prepare_download(&self, path: &str) -> Result<String, KodiRpcError> {
        self.prepares.fetch_add(1, Ordering::SeqCst);
        self.link()?;
        Ok(Self::url_for(path))
    }

    async fn file_last_modified(&self, file: &str) -> Result<String, KodiRpcError> {
        self.link()?;
        self.lock()
            .last_modified
            .get(file)
            .cloned()
            .ok_or(KodiRpcError::MissingResult)
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, KodiRpcError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.link()?;
        self.lock().files.get(url).cloned().ok_or(KodiRpcError::Status(404))
    }

    fn is_local(&self) -> bool {
        self.local.load(Ordering::SeqCst)
    }
}
