use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Value;

use crate::domain::{AudioExtraction, PassSpec, SubtitleRequest};

/// Everything the engine needs for a single pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInvocation {
    pub url: String,
    pub format_selector: String,
    pub output_template: String,
    pub merge_container: Option<String>,
    pub subtitles: Option<SubtitleRequest>,
    pub audio_extraction: Option<AudioExtraction>,
    pub ffmpeg_location: Option<PathBuf>,
}

impl EngineInvocation {
    pub fn for_pass(url: &str, pass: &PassSpec, ffmpeg_location: Option<PathBuf>) -> Self {
        Self {
            url: url.to_string(),
            format_selector: pass.format_selector.clone(),
            output_template: pass.output_template.clone(),
            merge_container: pass.merge_container.clone(),
            subtitles: pass.subtitles.clone(),
            audio_extraction: pass.audio_extraction.clone(),
            ffmpeg_location,
        }
    }
}

/// Progress as the engine reports it, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProgress {
    /// `downloading`, `finished`, or whatever else the engine emits.
    pub status: String,
    /// Free-form percentage text such as `" 42.3%"`; may be garbage.
    pub percent: String,
}

impl RawProgress {
    pub fn new(status: impl Into<String>, percent: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            percent: percent.into(),
        }
    }
}

/// Metadata returned by a successful pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineReport {
    pub title: String,
    pub filepath: Option<PathBuf>,
    pub subtitle_languages: BTreeSet<String>,
    pub automatic_caption_languages: BTreeSet<String>,
}

/// The JSON object yt-dlp prints after moving the final file into place.
#[derive(Debug, Deserialize)]
struct PrintedInfo {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    filepath: Option<String>,
    #[serde(default)]
    subtitles: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    automatic_captions: Option<BTreeMap<String, Value>>,
}

impl EngineReport {
    pub fn from_printed_json(json: &str) -> Result<Self, serde_json::Error> {
        let info: PrintedInfo = serde_json::from_str(json.trim())?;

        Ok(Self {
            title: info.title.unwrap_or_default(),
            filepath: info
                .filepath
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            subtitle_languages: info.subtitles.unwrap_or_default().into_keys().collect(),
            automatic_caption_languages: info
                .automatic_captions
                .unwrap_or_default()
                .into_keys()
                .collect(),
        })
    }

    /// Manual subtitles and auto-generated captions together.
    pub fn available_subtitle_languages(&self) -> BTreeSet<String> {
        self.subtitle_languages
            .union(&self.automatic_caption_languages)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_printed_info() {
        let json = r#"{"title": "Big Buck Bunny", "filepath": "/tmp/out/Big Buck Bunny.mp4",
            "subtitles": {"de": [{"ext": "vtt"}]},
            "automatic_captions": {"en": [], "fr": []}}"#;
        let report = EngineReport::from_printed_json(json).unwrap();

        assert_eq!(report.title, "Big Buck Bunny");
        assert_eq!(
            report.filepath,
            Some(PathBuf::from("/tmp/out/Big Buck Bunny.mp4"))
        );
        let langs: Vec<_> = report.available_subtitle_languages().into_iter().collect();
        assert_eq!(langs, vec!["de", "en", "fr"]);
    }

    #[test]
    fn test_null_fields_are_tolerated() {
        let json = r#"{"title": "clip", "filepath": null, "subtitles": null, "automatic_captions": null}"#;
        let report = EngineReport::from_printed_json(json).unwrap();
        assert_eq!(report.filepath, None);
        assert!(report.available_subtitle_languages().is_empty());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(EngineReport::from_printed_json("NA").is_err());
    }
}
