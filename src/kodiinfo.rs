/*
 *  kodiinfo.rs
 *
 *  KoMonS - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Kodi player queries and the per-cycle status snapshot
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
use std::time::Duration;
use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use serde_json::{json, Value};
use crate::config::Config;
use crate::httprpc::{KodiRpcClient, KodiRpcError};

/// Labels fetched for the now-playing screens
pub const TRACK_LABELS: &[&str] = &[
    "MusicPlayer.Title",
    "MusicPlayer.Album",
    "MusicPlayer.Artist",
    "MusicPlayer.Time",
    "MusicPlayer.Duration",
    "MusicPlayer.TrackNumber",
    "MusicPlayer.Property(Role.Composer)",
    "MusicPlayer.Codec",
    "MusicPlayer.Year",
    "MusicPlayer.Genre",
    "MusicPlayer.Cover",
];

/// Labels fetched for the idle status screen
pub const STATUS_LABELS: &[&str] = &[
    "System.Uptime",
    "System.CPUTemperature",
    "System.Date",
    "System.Time",
];

pub const LABEL_ARTIST: &str = "MusicPlayer.Artist";
pub const LABEL_COMPOSER: &str = "MusicPlayer.Property(Role.Composer)";
pub const LABEL_CODEC: &str = "MusicPlayer.Codec";
pub const LABEL_COVER: &str = "MusicPlayer.Cover";
pub const LABEL_TIME: &str = "MusicPlayer.Time";

/// Playback position as reported, or not, by the player
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Progress {
    Unknown,
    /// Raw fraction, not yet clamped
    Fraction(f64),
}

/// Flat view of the player's info labels for one poll cycle
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    labels: HashMap<String, String>,
    pub progress: Progress,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self { labels: HashMap::new(), progress: Progress::Unknown }
    }
}

impl StatusSnapshot {
    pub fn new(labels: HashMap<String, String>, progress: Progress) -> Self {
        Self { labels, progress }
    }

    /// Build from literal pairs
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let labels = pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Self { labels, progress: Progress::Unknown }
    }

    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Non-empty value for `key`; absent and empty read the same
    pub fn get(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    pub fn cover(&self) -> &str {
        self.get(LABEL_COVER).unwrap_or("")
    }

    /// Elapsed time shows hours ("h:mm:ss")
    pub fn has_hours(&self) -> bool {
        self.get(LABEL_TIME).is_some_and(|t| t.matches(':').count() == 2)
    }
}

/// What, if anything, is playing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Idle,
    Audio { player_id: i64 },
    Video,
    Picture,
}

impl Activity {
    /// One line shown on the idle status screen
    pub fn summary(&self) -> &'static str {
        match self {
            Activity::Idle => "Idle",
            Activity::Audio { .. } => "Audio playing",
            Activity::Video => "Video playing",
            Activity::Picture => "Photo viewing",
        }
    }
}

#[derive(Debug, Deserialize)]
struct ActivePlayer {
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "playerid")]
    player_id: i64,
}

/// Interpret a `Player.GetActivePlayers` result
pub fn parse_activity(result: &Value) -> Result<Activity, KodiRpcError> {
    let players: Vec<ActivePlayer> = serde_json::from_value(result.clone())
        .map_err(KodiRpcError::Deserialization)?;
    Ok(match players.first() {
        None => Activity::Idle,
        Some(p) => match p.kind.as_str() {
            "audio" => Activity::Audio { player_id: p.player_id },
            "video" => Activity::Video,
            "picture" => Activity::Picture,
            _ => Activity::Idle,
        },
    })
}

/// Everything the panel asks of the player
///
/// The production implementation talks HTTP; tests script one in memory.
#[async_trait]
pub trait PlayerRpc: Send + Sync {
    /// Liveness check
    async fn ping(&self) -> Result<(), KodiRpcError>;

    async fn active_player(&self) -> Result<Activity, KodiRpcError>;

    /// Batched info-label query
    async fn info_labels(&self, labels: &[&str]) -> Result<HashMap<String, String>, KodiRpcError>;

    /// Playback fraction; `None` when the player does not say
    async fn percentage(&self, player_id: i64) -> Option<f64>;

    /// Servable URL for a player-side path
    async fn prepare_download(&self, path: &str) -> Result<String, KodiRpcError>;

    /// Last-modified token of a player-side file
    async fn file_last_modified(&self, file: &str) -> Result<String, KodiRpcError>;

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, KodiRpcError>;

    /// Player runs on this host
    fn is_local(&self) -> bool;
}

/// `PlayerRpc` over Kodi's JSON-RPC web interface
#[derive(Debug)]
pub struct KodiClient {
    rpc: KodiRpcClient,
    local: bool,
}

impl KodiClient {
    pub fn new(base_url: &str, timeout: Duration, local: bool) -> Result<Self, KodiRpcError> {
        Ok(Self { rpc: KodiRpcClient::new(base_url, timeout)?, local })
    }

    pub fn from_config(cfg: &Config) -> Result<Self, KodiRpcError> {
        Self::new(&cfg.base_url, cfg.rpc_timeout(), cfg.kodi_is_local())
    }

    fn unexpected(method: &str, reply: &Value) -> KodiRpcError {
        KodiRpcError::Unexpected { method: method.to_string(), reply: reply.to_string() }
    }
}

#[async_trait]
impl PlayerRpc for KodiClient {
    async fn ping(&self) -> Result<(), KodiRpcError> {
        let reply = self.rpc.call("JSONRPC.Ping", Value::Null).await?;
        if reply.as_str() == Some("pong") {
            Ok(())
        } else {
            Err(Self::unexpected("JSONRPC.Ping", &reply))
        }
    }

    async fn active_player(&self) -> Result<Activity, KodiRpcError> {
        let reply = self.rpc.call("Player.GetActivePlayers", Value::Null).await?;
        parse_activity(&reply)
    }

    async fn info_labels(&self, labels: &[&str]) -> Result<HashMap<String, String>, KodiRpcError> {
        let reply = self.rpc.call("XBMC.GetInfoLabels", json!({ "labels": labels })).await?;
        let map = reply
            .as_object()
            .ok_or_else(|| Self::unexpected("XBMC.GetInfoLabels", &reply))?;
        Ok(map
            .iter()
            .map(|(k, v)| (k.clone(), v.as_str().unwrap_or_default().to_string()))
            .collect())
    }

    async fn percentage(&self, player_id: i64) -> Option<f64> {
        let params = json!({ "playerid": player_id, "properties": ["percentage"] });
        match self.rpc.call("Player.GetProperties", params).await {
            Ok(reply) => reply.get("percentage").and_then(Value::as_f64).map(|p| p / 100.0),
            Err(e) => {
                debug!("percentage unavailable: {e}");
                None
            }
        }
    }

    async fn prepare_download(&self, path: &str) -> Result<String, KodiRpcError> {
        let reply = self.rpc.call("Files.PrepareDownload", json!({ "path": path })).await?;
        let servable = reply
            .pointer("/details/path")
            .and_then(Value::as_str)
            .ok_or_else(|| Self::unexpected("Files.PrepareDownload", &reply))?;
        Ok(format!("{}/{}", self.rpc.base_url(), servable))
    }

    async fn file_last_modified(&self, file: &str) -> Result<String, KodiRpcError> {
        let params = json!({ "file": file, "properties": ["lastmodified"] });
        let reply = self.rpc.call("Files.GetFileDetails", params).await?;
        reply
            .pointer("/filedetails/lastmodified")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Self::unexpected("Files.GetFileDetails", &reply))
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, KodiRpcError> {
        self.rpc.get_bytes(url).await
    }

    fn is_local(&self) -> bool {
        self.local
    }
}

/// Gather the audio snapshot: labels are required, progress best effort
pub async fn track_snapshot<R: PlayerRpc + ?Sized>(rpc: &R, player_id: i64) -> Result<StatusSnapshot, KodiRpcError> {
    let labels = rpc.info_labels(TRACK_LABELS).await?;
    let progress = match rpc.percentage(player_id).await {
        Some(p) => Progress::Fraction(p),
        None => Progress::Unknown,
    };
    Ok(StatusSnapshot::new(labels, progress))
}

pub async fn status_snapshot<R: PlayerRpc + ?Sized>(rpc: &R) -> Result<StatusSnapshot, KodiRpcError> {
    let labels = rpc.info_labels(STATUS_LABELS).await?;
    Ok(StatusSnapshot::new(labels, Progress::Unknown))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_locality_follows_config() {
        let local = KodiClient::from_config(&Config::default()).unwrap();
        assert!(local.is_local());
        let cfg = Config { base_url: "http://kodi.lan:8080".into(), ..Config::default() };
        assert!(!KodiClient::from_config(&cfg).unwrap().is_local());
    }

    #[test]
    fn test_parse_activity() {
        assert_eq!(parse_activity(&json!([])).unwrap(), Activity::Idle);
        assert_eq!(
            parse_activity(&json!([{"type": "audio", "playerid": 0}])).unwrap(),
            Activity::Audio { player_id: 0 }
        );
        assert_eq!(parse_activity(&json!([{"type": "video", "playerid": 1}])).unwrap(), Activity::Video);
        assert_eq!(parse_activity(&json!([{"type": "picture", "playerid": 2}])).unwrap(), Activity::Picture);
        assert!(parse_activity(&json!({"oops": true})).is_err());
    }

    #[test]
    fn test_summaries() {
        assert_eq!(Activity::Idle.summary(), "Idle");
        assert_eq!(Activity::Video.summary(), "Video playing");
        assert_eq!(Activity::Picture.summary(), "Photo viewing");
    }

    #[test]
    fn test_snapshot_empty_reads_absent() {
        let snap = StatusSnapshot::from_pairs([("MusicPlayer.Title", "So What"), ("MusicPlayer.Artist", "")]);
        assert_eq!(snap.get("MusicPlayer.Title"), Some("So What"));
        assert_eq!(snap.get("MusicPlayer.Artist"), None);
        assert_eq!(snap.get("MusicPlayer.Album"), None);
        assert_eq!(snap.cover(), "");
        assert_eq!(snap.progress, Progress::Unknown);
    }

    #[test]
    fn test_has_hours() {
        assert!(StatusSnapshot::from_pairs([(LABEL_TIME, "1:02:03")]).has_hours());
        assert!(!StatusSnapshot::from_pairs([(LABEL_TIME, "02:03")]).has_hours());
        assert!(!StatusSnapshot::default().has_hours());
    }
}
