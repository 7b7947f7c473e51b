/*
 *  config.rs
 *
 *  KoMonS - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  YAML configuration with command line overrides
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

use std::collections::BTreeMap;
use std::time::Duration;
use std::{fs, path::{Path, PathBuf}};
use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Unknown font: {0}")]
    UnknownFont(String),
    #[error("Unknown colour: {0}")]
    UnknownColor(String),
}

/// Top-level app configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Kodi web server, e.g. "http://192.168.1.20:8080"
    pub base_url: String,
    pub log_level: Option<String>,
    pub display: DisplayConfig,
    /// How long a press keeps the idle status screen lit
    pub screen_wake_secs: u64,
    pub poll_interval_ms: u64,
    pub reconnect_backoff_secs: u64,
    pub rpc_timeout_ms: u64,
    pub thumbs: ThumbsConfig,
    /// Font for the "waiting to connect" splash
    pub splash_font: String,
    /// `color_*` name to "#rrggbb"
    pub colors: BTreeMap<String, String>,
    /// Audio layout cycle, in press order
    pub alayout_names: Vec<String>,
    pub alayout_initial: Option<String>,
    pub a_layout: BTreeMap<String, RawLayout>,
    pub status_layout: RawLayout,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    /// Linux framebuffer device the panel is bound to (fbtft)
    pub fbdev: PathBuf,
    /// sysfs backlight directory, e.g. /sys/class/backlight/fb_ili9341;
    /// absent for panels without one (OLED)
    pub backlight: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbsConfig {
    /// Host icon for the status screen
    pub kodi_thumb: PathBuf,
    /// Shown when a track has no usable cover
    pub default_thumb: PathBuf,
    /// Shown for AirPlay streams without artwork
    pub default_airplay: PathBuf,
    /// Kodi's temp directory when running on the same host
    pub local_temp_dir: PathBuf,
}

/// Layout as written in YAML; fonts and colours are still names
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLayout {
    #[serde(default)]
    pub thumb: Option<RawThumb>,
    #[serde(default)]
    pub progress: Option<RawProgress>,
    #[serde(default)]
    pub fields: Vec<RawField>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawThumb {
    pub size: u32,
    #[serde(default)]
    pub center: bool,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawProgress {
    pub x: i32,
    pub y: i32,
    pub height: u32,
    /// Horizontal length while elapsed time reads mm:ss
    #[serde(default)]
    pub short_len: u32,
    /// Horizontal length while elapsed time reads h:mm:ss
    #[serde(default)]
    pub long_len: u32,
    /// Vertical bars use a single length
    #[serde(default)]
    pub len: Option<u32>,
    #[serde(default)]
    pub vertical: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawField {
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub font: String,
    pub fill: String,
    /// Secondary font for composite time fields
    #[serde(default)]
    pub small_font: Option<String>,
    #[serde(default)]
    pub label: Option<RawLabel>,
    #[serde(default)]
    pub truncate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLabel {
    pub text: String,
    pub x: i32,
    pub y: i32,
    pub font: String,
    pub fill: String,
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "komons", version, about = "Kodi now-playing panel", disable_help_flag = false)]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(short = 'c', long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    /// Kodi web server base URL
    #[arg(short = 'u', long)]
    pub base_url: Option<String>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// Enable debug log level
    #[arg(short = 'v', long, alias = "verbose", action = ArgAction::SetTrue)]
    pub debug: bool,
    #[arg(long)]
    pub display_width: Option<u32>,
    #[arg(long)]
    pub display_height: Option<u32>,
    /// Framebuffer device, e.g. /dev/fb1
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub fbdev: Option<PathBuf>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Public entry point: read YAML, merge CLI, validate.
pub fn load(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) YAML file (explicit path or search), else defaults
    let mut cfg = if let Some(p) = cli.config.as_ref() {
        if !p.exists() {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
        read_yaml(p)?
    } else if let Some(p) = find_config_file() {
        read_yaml(&p)?
    } else {
        Config::default()
    };

    // 2) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 3) Validate
    validate(&cfg)?;

    if cli.dump_config {
        let s = serde_yaml::to_string(&cfg)?;
        println!("{s}");
        std::process::exit(0);
    }

    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/komons/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/komons/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/komons.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["komons.yaml", "config.yaml", "config/komons.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

pub fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    parse_yaml(&s)
}

pub fn parse_yaml(text: &str) -> Result<Config, ConfigError> {
    let cfg: Config = serde_yaml::from_str(text)?;
    Ok(cfg)
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if let Some(url) = cli.base_url.as_ref()    { cfg.base_url = url.clone(); }
    if cli.log_level.is_some()                  { cfg.log_level = cli.log_level.clone(); }
    if let Some(w) = cli.display_width          { cfg.display.width = w; }
    if let Some(h) = cli.display_height         { cfg.display.height = h; }
    if let Some(dev) = cli.fbdev.as_ref()       { cfg.display.fbdev = dev.clone(); }
}

/// Put any invariants here (required fields, ranges, etc.)
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.display.width == 0 || cfg.display.height == 0 {
        return Err(ConfigError::Validation("display width/height must be > 0".into()));
    }
    if !(cfg.base_url.starts_with("http://") || cfg.base_url.starts_with("https://")) {
        return Err(ConfigError::Validation(format!("base_url must be http(s): {}", cfg.base_url)));
    }
    if cfg.alayout_names.is_empty() {
        return Err(ConfigError::Validation("alayout_names must name at least one layout".into()));
    }
    for name in &cfg.alayout_names {
        if !cfg.a_layout.contains_key(name) {
            return Err(ConfigError::Validation(format!("audio layout '{name}' is not defined in a_layout")));
        }
    }
    if let Some(initial) = cfg.alayout_initial.as_ref() {
        if !cfg.alayout_names.contains(initial) {
            return Err(ConfigError::Validation(format!("alayout_initial '{initial}' is not in alayout_names")));
        }
    }
    if cfg.poll_interval_ms == 0 {
        return Err(ConfigError::Validation("poll_interval_ms must be > 0".into()));
    }
    Ok(())
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn reconnect_backoff(&self) -> Duration {
        Duration::from_secs(self.reconnect_backoff_secs)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }

    /// Kodi on this very host: AirPlay art can be read straight off disk
    pub fn kodi_is_local(&self) -> bool {
        self.base_url.starts_with("http://localhost:") || self.base_url.starts_with("https://localhost:")
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            fbdev: PathBuf::from("/dev/fb1"),
            backlight: None,
        }
    }
}

impl Default for ThumbsConfig {
    fn default() -> Self {
        Self {
            kodi_thumb: PathBuf::from("images/kodi_thumb.png"),
            default_thumb: PathBuf::from("images/music_icon.png"),
            default_airplay: PathBuf::from("images/airplay_thumb.png"),
            local_temp_dir: PathBuf::from("/storage/.kodi/temp"),
        }
    }
}

fn field(name: &str, x: i32, y: i32, font: &str, fill: &str) -> RawField {
    RawField {
        name: name.to_string(),
        x,
        y,
        font: font.to_string(),
        fill: fill.to_string(),
        small_font: None,
        label: None,
        truncate: false,
    }
}

impl Default for Config {
    /// A single thumbnail-left layout for a 320x240 panel
    fn default() -> Self {
        let mut colors = BTreeMap::new();
        for (k, v) in [
            ("color_gray", "#6e6e6e"),
            ("color_7seg", "#00ff00"),
            ("color_artist", "yellow"),
            ("color_progbg", "#424242"),
            ("color_progfg", "#c8c8c8"),
        ] {
            colors.insert(k.to_string(), v.to_string());
        }

        let audio = RawLayout {
            thumb: Some(RawThumb { size: 140, center: false, x: 5, y: 7 }),
            progress: Some(RawProgress {
                x: 150, y: 7, height: 8, short_len: 90, long_len: 74, len: None, vertical: false,
            }),
            fields: vec![
                field("MusicPlayer.Time", 245, 4, "font_6x13", "white"),
                RawField { truncate: true, ..field("MusicPlayer.Title", 5, 152, "font_9x15_bold", "white") },
                RawField { truncate: true, ..field("artist", 5, 180, "font_8x13", "color_artist") },
                RawField { truncate: true, ..field("MusicPlayer.Album", 5, 204, "font_7x13", "white") },
                RawField {
                    label: Some(RawLabel {
                        text: "Track".into(), x: 150, y: 30, font: "font_6x10".into(), fill: "color_gray".into(),
                    }),
                    ..field("MusicPlayer.TrackNumber", 150, 42, "font_10x20", "white")
                },
                field("MusicPlayer.Duration", 150, 70, "font_6x13", "color_gray"),
                field("codec", 150, 90, "font_6x13", "white"),
                field("MusicPlayer.Genre", 150, 110, "font_6x13", "white"),
                field("MusicPlayer.Year", 150, 130, "font_6x13", "white"),
            ],
        };

        let status = RawLayout {
            thumb: Some(RawThumb { size: 128, center: false, x: 5, y: 5 }),
            progress: None,
            fields: vec![
                field("version", 145, 8, "font_6x13", "white"),
                field("summary", 145, 30, "font_7x14_bold", "color_artist"),
                RawField {
                    small_font: Some("font_6x13".into()),
                    ..field("time_hrmin", 145, 60, "font_10x20", "color_7seg")
                },
                field("System.Date", 5, 150, "font_7x14", "white"),
                field("System.Uptime", 5, 172, "font_7x14", "white"),
                field("System.CPUTemperature", 5, 194, "font_7x14", "white"),
            ],
        };

        let mut a_layout = BTreeMap::new();
        a_layout.insert("A_DEFAULT".to_string(), audio);

        Self {
            base_url: "http://localhost:8080".to_string(),
            log_level: None,
            display: DisplayConfig::default(),
            screen_wake_secs: 25,
            poll_interval_ms: 910,
            reconnect_backoff_secs: 5,
            rpc_timeout_ms: 2000,
            thumbs: ThumbsConfig::default(),
            splash_font: "font_8x13".to_string(),
            colors,
            alayout_names: vec!["A_DEFAULT".to_string()],
            alayout_initial: Some("A_DEFAULT".to_string()),
            a_layout,
            status_layout: status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = Config::default();
        assert!(validate(&cfg).is_ok());
        assert!(cfg.kodi_is_local());
        assert_eq!(cfg.poll_interval(), Duration::from_millis(910));
    }

    #[test]
    fn test_undefined_layout_rejected() {
        let mut cfg = Config::default();
        cfg.alayout_names.push("A_MISSING".into());
        assert!(matches!(validate(&cfg), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_initial_must_be_in_cycle() {
        let mut cfg = Config::default();
        cfg.alayout_initial = Some("A_OTHER".into());
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_cli_overrides_yaml() {
        let mut cfg = parse_yaml("base_url: http://kodi.lan:8080\ndisplay:\n  width: 480\n").unwrap();
        assert_eq!(cfg.display.width, 480);
        assert_eq!(cfg.display.height, 240);
        let cli = Cli {
            base_url: Some("http://10.0.0.5:8080".into()),
            display_height: Some(320),
            ..Default::default()
        };
        apply_cli_overrides(&mut cfg, &cli);
        assert_eq!(cfg.base_url, "http://10.0.0.5:8080");
        assert_eq!(cfg.display.height, 320);
        assert!(!cfg.kodi_is_local());
    }

    #[test]
    fn test_partial_yaml_keeps_default_layouts() {
        let cfg = parse_yaml("screen_wake_secs: 10\n").unwrap();
        assert_eq!(cfg.screen_wake_secs, 10);
        assert_eq!(cfg.alayout_names, vec!["A_DEFAULT".to_string()]);
        assert!(validate(&cfg).is_ok());
    }
}
