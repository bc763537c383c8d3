use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

/// Directory name under the platform config dir.
pub const APP_DIR_NAME: &str = "simple-video-downloader";

/// Environment variable overriding the engine binary.
pub const YTDLP_ENV: &str = "SVD_YTDLP";

/// User-level settings, read once at startup.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Name or path of the extraction engine binary.
    pub ytdlp_binary: String,
    /// Arguments placed before the engine's own, e.g. `["-m", "yt_dlp"]` when
    /// `ytdlp_binary` is a python interpreter.
    pub ytdlp_args: Vec<String>,
    /// Name or path of the transcoding binary probed at startup.
    pub ffmpeg_binary: String,
    /// Folder the destination field starts with.
    pub default_destination: PathBuf,
    /// Container video and audio streams get merged into.
    pub merge_container: String,
    /// MP3 bitrate (kbps) for the audio pass.
    pub audio_quality: String,
    /// Quality tier label the form starts with, e.g. `"1080p"`.
    pub default_quality: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ytdlp_binary: "yt-dlp".to_string(),
            ytdlp_args: Vec::new(),
            ffmpeg_binary: "ffmpeg".to_string(),
            default_destination: default_destination(),
            merge_container: "mp4".to_string(),
            audio_quality: "192".to_string(),
            default_quality: "720p".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads `config.json` from the platform config dir, falling back to defaults.
    pub fn load() -> Self {
        let mut config = match dirs::config_dir() {
            Some(dir) => Self::load_from(&dir.join(APP_DIR_NAME).join("config.json")),
            None => Self::default(),
        };

        if let Ok(binary) = std::env::var(YTDLP_ENV) {
            if !binary.trim().is_empty() {
                config.ytdlp_binary = binary;
            }
        }

        config
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            debug!("no config at {}, using defaults", path.display());
            return Self::default();
        }

        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|json| serde_json::from_str(&json).map_err(|e| e.to_string()));

        match parsed {
            Ok(config) => config,
            Err(e) => {
                warn!("ignoring unreadable config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

fn default_destination() -> PathBuf {
    dirs::desktop_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("nope.json"));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"ytdlp_binary": "/opt/yt-dlp", "audio_quality": "320"}"#)
            .unwrap();

        let config = AppConfig::load_from(&path);
        assert_eq!(config.ytdlp_binary, "/opt/yt-dlp");
        assert_eq!(config.audio_quality, "320");
        assert_eq!(config.ffmpeg_binary, "ffmpeg");
        assert_eq!(config.merge_container, "mp4");
    }

    #[test]
    fn test_python_launcher_and_quality() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"ytdlp_binary": "python3", "ytdlp_args": ["-m", "yt_dlp"], "default_quality": "1080p"}"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path);
        assert_eq!(config.ytdlp_binary, "python3");
        assert_eq!(config.ytdlp_args, vec!["-m", "yt_dlp"]);
        assert_eq!(config.default_quality, "1080p");
        assert_eq!(AppConfig::default().ytdlp_args, Vec::<String>::new());
        assert_eq!(AppConfig::default().default_quality, "720p");
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(AppConfig::load_from(&path), AppConfig::default());
    }
}
