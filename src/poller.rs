/*
 *  poller.rs
 *
 *  KoMonS - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Connect, poll, render, reconnect - the outer control loop
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

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use log::{debug, info, warn};
use tokio::sync::{Mutex as TokMutex, Notify, mpsc};
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::display::{DisplayManager, DisplaySink, UpdateOutcome};
use crate::httprpc::KodiRpcError;
use crate::kodiinfo::PlayerRpc;

/// At most one remembered press, and only while a session is up
#[derive(Debug, Default)]
pub struct PressLatch {
    pending: AtomicBool,
    session_active: AtomicBool,
    notify: Notify,
}

impl PressLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a press; false when ignored (no session) or coalesced
    pub fn press(&self) -> bool {
        if !self.session_active.load(Ordering::SeqCst) {
            debug!("press ignored, not connected");
            return false;
        }
        if self.pending.swap(true, Ordering::SeqCst) {
            debug!("press coalesced");
            return false;
        }
        self.notify.notify_one();
        true
    }

    /// Consume the pending press, if any
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::SeqCst)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn set_session(&self, active: bool) {
        self.session_active.store(active, Ordering::SeqCst);
        if !active {
            self.pending.store(false, Ordering::SeqCst);
        }
    }

    pub fn session_active(&self) -> bool {
        self.session_active.load(Ordering::SeqCst)
    }

    /// Resolves on the next accepted press
    pub async fn wait(&self) {
        self.notify.notified().await;
    }
}

/// Open-loop cadence: a cycle, then a fixed sleep
#[derive(Debug, Clone, Copy)]
pub struct PollTiming {
    pub interval: Duration,
    pub backoff: Duration,
}

impl PollTiming {
    pub fn from_config(cfg: &Config) -> Self {
        Self { interval: cfg.poll_interval(), backoff: cfg.reconnect_backoff() }
    }
}

/// Drives one display from one player, forever
pub struct Poller<R: PlayerRpc, S: DisplaySink> {
    rpc: Arc<R>,
    display: Arc<TokMutex<DisplayManager<S>>>,
    latch: Arc<PressLatch>,
    timing: PollTiming,
}

impl<R, S> Poller<R, S>
where
    R: PlayerRpc + 'static,
    S: DisplaySink + 'static,
{
    pub fn new(rpc: Arc<R>, display: Arc<TokMutex<DisplayManager<S>>>, timing: PollTiming) -> Self {
        Self { rpc, display, latch: Arc::new(PressLatch::new()), timing }
    }

    pub fn latch(&self) -> Arc<PressLatch> {
        Arc::clone(&self.latch)
    }

    pub fn display(&self) -> Arc<TokMutex<DisplayManager<S>>> {
        Arc::clone(&self.display)
    }

    /// Forward presses from `rx` into the latch until the sender goes away
    pub fn spawn_press_listener(&self, mut rx: mpsc::Receiver<()>) -> JoinHandle<()> {
        let latch = self.latch();
        tokio::spawn(async move {
            while rx.recv().await.is_some() {
                latch.press();
            }
            debug!("press source closed");
        })
    }

    /// Ping until the player answers, showing the splash meanwhile
    pub async fn connect(&self) {
        self.display.lock().await.show_waiting();
        loop {
            match self.rpc.ping().await {
                Ok(()) => {
                    info!("connected to Kodi");
                    return;
                }
                Err(e) => {
                    debug!("ping failed: {e}, retry in {:?}", self.timing.backoff);
                    tokio::time::sleep(self.timing.backoff).await;
                }
            }
        }
    }

    /// One guarded poll and render
    pub async fn cycle(&self) -> Result<UpdateOutcome, KodiRpcError> {
        let mut display = self.display.lock().await;
        let pressed = self.latch.take();
        display.update_display(self.rpc.as_ref(), pressed).await
    }

    /// Poll until the player stops answering; returns why
    pub async fn run_session(&self) -> KodiRpcError {
        self.latch.set_session(true);
        loop {
            if let Err(e) = self.cycle().await {
                self.latch.set_session(false);
                self.display.lock().await.disconnected();
                warn!("lost connection to Kodi: {e}");
                return e;
            }
            tokio::select! {
                _ = tokio::time::sleep(self.timing.interval) => {}
                _ = self.latch.wait() => {}
            }
        }
    }

    /// Connect, poll, and reconnect after every loss. Never returns.
    pub async fn run(&self) {
        loop {
            self.connect().await;
            self.run_session().await;
        }
    }
}
