/*
 *  tests/session.rs
 *
 *  Connect / poll / reconnect behaviour against a scripted player
 *
 *  KoMonS - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 */

use std::sync::Arc;
use std::time::Duration;

use image::RgbImage;
use komons::config::Config;
use komons::display::drivers::MockSink;
use komons::display::{ArtworkDefaults, DisplayManager};
use komons::kodiinfo::Activity;
use komons::mockrpc::MockPlayer;
use komons::poller::{PollTiming, Poller};
use tokio::sync::{Mutex as TokMutex, mpsc};

fn poller(mock: Arc<MockPlayer>, sink: MockSink) -> Poller<MockPlayer, MockSink> {
    let defaults = ArtworkDefaults::new(RgbImage::new(16, 16), RgbImage::new(16, 16), "/nonexistent".into());
    let mgr = DisplayManager::with_defaults(&Config::default(), sink, defaults, None).unwrap();
    let timing = PollTiming { interval: Duration::from_millis(5), backoff: Duration::from_millis(5) };
    Poller::new(mock, Arc::new(TokMutex::new(mgr)), timing)
}

async fn wait_until(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn test_connectivity_loss_returns_to_ping_loop() {
    let mock = Arc::new(MockPlayer::new());
    mock.set_activity(Activity::Audio { player_id: 1 });
    mock.set_label("MusicPlayer.Title", "Blue in Green");
    let sink = MockSink::new(320, 240);
    let poller = Arc::new(poller(Arc::clone(&mock), sink));
    let latch = poller.latch();

    let runner = Arc::clone(&poller);
    let task = tokio::spawn(async move { runner.run().await });

    wait_until(|| latch.session_active()).await;
    let pings_before = MockPlayer::count(&mock.pings);

    // link drops mid session
    mock.set_offline(true);
    wait_until(|| !latch.session_active()).await;
    wait_until(|| MockPlayer::count(&mock.pings) > pings_before + 1).await;

    // and comes back
    mock.set_offline(false);
    wait_until(|| latch.session_active()).await;
    assert!(!task.is_finished());
    task.abort();
}

#[tokio::test]
async fn test_press_channel_wakes_status_screen() {
    let mock = Arc::new(MockPlayer::new());
    mock.set_label("System.Time", "7:05 PM");
    let sink = MockSink::new(320, 240);
    let poller = Arc::new(poller(Arc::clone(&mock), sink));
    let display = poller.display();
    let latch = poller.latch();

    let (tx, rx) = mpsc::channel(1);
    let listener = poller.spawn_press_listener(rx);
    let runner = Arc::clone(&poller);
    let task = tokio::spawn(async move { runner.run().await });

    wait_until(|| latch.session_active()).await;
    assert!(!display.lock().await.screen_active());

    tx.send(()).await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), async {
        while !display.lock().await.screen_active() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("status screen never woke");

    task.abort();
    listener.abort();
}

#[tokio::test]
async fn test_press_before_connect_is_dropped() {
    let mock = Arc::new(MockPlayer::new());
    mock.set_offline(true);
    let poller = poller(Arc::clone(&mock), MockSink::new(320, 240));
    let latch = poller.latch();
    assert!(!latch.press());
    assert!(!latch.is_pending());
}
