use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::error::PassExecutionFailure;

/// Maximum video height the user is willing to download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QualityTier {
    P1080,
    P720,
    P480,
    P360,
}

impl QualityTier {
    pub const ALL: [QualityTier; 4] = [Self::P1080, Self::P720, Self::P480, Self::P360];

    pub fn label(self) -> &'static str {
        match self {
            Self::P1080 => "1080p",
            Self::P720 => "720p",
            Self::P480 => "480p",
            Self::P360 => "360p",
        }
    }

    /// Pixel-height ceiling, obtained by stripping the unit from the label.
    pub fn height(self) -> u32 {
        self.label()
            .trim_end_matches('p')
            .parse()
            .unwrap_or(720)
    }
}

impl Default for QualityTier {
    fn default() -> Self {
        Self::P720
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for QualityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown quality tier: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AudioMode {
    #[default]
    VideoOnly,
    Mp3Only,
    Both,
}

impl AudioMode {
    pub const ALL: [AudioMode; 3] = [Self::VideoOnly, Self::Mp3Only, Self::Both];

    pub fn wants_video(self) -> bool {
        matches!(self, Self::VideoOnly | Self::Both)
    }

    pub fn wants_audio(self) -> bool {
        matches!(self, Self::Mp3Only | Self::Both)
    }
}

impl fmt::Display for AudioMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::VideoOnly => "Video Only",
            Self::Mp3Only => "MP3 Only",
            Self::Both => "Both Video and MP3",
        })
    }
}

/// What the user asked for, exactly as entered.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadRequest {
    pub url: String,
    pub quality: QualityTier,
    pub audio_mode: AudioMode,
    pub want_subtitles: bool,
    pub destination_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PassKind {
    Video,
    Audio,
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Video => "Video",
            Self::Audio => "Audio",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleRequest {
    /// Preference order; duplicates are never present.
    pub languages: Vec<String>,
    pub format: String,
    pub include_auto_captions: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioExtraction {
    pub codec: String,
    pub quality: String,
}

/// One engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassSpec {
    pub kind: PassKind,
    pub format_selector: String,
    pub output_template: String,
    pub merge_container: Option<String>,
    pub subtitles: Option<SubtitleRequest>,
    pub audio_extraction: Option<AudioExtraction>,
}

/// Validated, ordered set of passes for one job. Only `PlanBuilder` constructs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadPlan {
    pub(crate) url: String,
    pub(crate) destination_dir: PathBuf,
    pub(crate) passes: Vec<PassSpec>,
}

impl DownloadPlan {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn destination_dir(&self) -> &std::path::Path {
        &self.destination_dir
    }

    pub fn passes(&self) -> &[PassSpec] {
        &self.passes
    }

    pub fn video_pass(&self) -> Option<&PassSpec> {
        self.passes.iter().find(|p| p.kind == PassKind::Video)
    }

    pub fn audio_pass(&self) -> Option<&PassSpec> {
        self.passes.iter().find(|p| p.kind == PassKind::Audio)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassResult {
    pub kind: PassKind,
    pub resolved_file_path: Option<PathBuf>,
    pub reported_subtitle_languages_available: BTreeSet<String>,
    pub subtitle_file: Option<PathBuf>,
    pub failure: Option<PassExecutionFailure>,
}

impl PassResult {
    pub fn failed(kind: PassKind, failure: PassExecutionFailure) -> Self {
        Self {
            kind,
            resolved_file_path: None,
            reported_subtitle_languages_available: BTreeSet::new(),
            subtitle_file: None,
            failure: Some(failure),
        }
    }

    pub fn subtitle_file_found(&self) -> bool {
        self.subtitle_file.is_some()
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Success,
    PartialSuccess,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub status: JobStatus,
    pub message: String,
    pub produced_files: BTreeSet<PathBuf>,
}

impl JobOutcome {
    /// Outcome for a job rejected before any pass ran.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Failed,
            message: message.into(),
            produced_files: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    Downloading,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressEvent {
    pub phase: ProgressPhase,
    /// 0.0 to 100.0
    pub percent: f32,
}

impl ProgressEvent {
    pub fn downloading(percent: f32) -> Self {
        Self {
            phase: ProgressPhase::Downloading,
            percent,
        }
    }

    pub fn finished() -> Self {
        Self {
            phase: ProgressPhase::Finished,
            percent: 100.0,
        }
    }
}
