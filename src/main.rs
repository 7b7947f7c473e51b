/*
 *  main.rs
 *
 *  KoMonS - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Kodi now-playing panel for framebuffer displays
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
use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::{error, info};
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::{Mutex as TokMutex, mpsc};

use komons::config::{self, Cli};
use komons::display::DisplayManager;
use komons::display::drivers::FbDevSink;
use komons::kodiinfo::KodiClient;
use komons::poller::{PollTiming, Poller};

const BUILD_DATE: &str = env!("KOMONS_BUILD_DATE");

/// Asynchronously waits for a SIGINT, SIGTERM, or SIGHUP signal.
async fn signal_handler() -> Result<(), std::io::Error> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

/// Host press source: the touch daemon signals SIGUSR1 once per debounced press
fn spawn_press_source(tx: mpsc::Sender<()>) -> Result<tokio::task::JoinHandle<()>, std::io::Error> {
    let mut sigusr1 = signal(SignalKind::user_defined1())?;
    Ok(tokio::spawn(async move {
        while sigusr1.recv().await.is_some() {
            // a full channel means a press is already queued
            let _ = tx.try_send(());
        }
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli).context("configuration")?;

    let level = cfg
        .log_level
        .clone()
        .unwrap_or_else(|| if cli.debug { "debug".into() } else { "info".into() });
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();

    info!("This {} worth the Squeeze", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);
    info!("Kodi at {}", cfg.base_url);

    let sink = FbDevSink::open(&cfg.display).context("opening display")?;
    let manager = DisplayManager::from_config(&cfg, sink).context("display setup")?;
    let display = Arc::new(TokMutex::new(manager));

    let rpc = Arc::new(KodiClient::from_config(&cfg).context("http client")?);
    let poller = Poller::new(rpc, Arc::clone(&display), PollTiming::from_config(&cfg));

    let (tx, rx) = mpsc::channel(1);
    let press_source = spawn_press_source(tx).context("press signal")?;
    let press_listener = poller.spawn_press_listener(rx);

    tokio::select! {
        res = signal_handler() => {
            if let Err(e) = res {
                error!("signal handler: {e}");
            }
        }
        _ = poller.run() => {}
    }

    press_source.abort();
    press_listener.abort();
    display.lock().await.shutdown();
    info!("Display shutdown complete");
    Ok(())
}
