use std::path::Path;

use tracing::debug;

use crate::{
    config::AppConfig,
    domain::{
        AudioExtraction, DownloadPlan, DownloadRequest, PassKind, PassSpec, PlanError,
        SubtitleRequest,
    },
    engine::Capabilities,
};

/// Subtitle languages, most preferred first.
pub const SUBTITLE_LANGUAGES: [&str; 2] = ["en", "en-US"];
pub const SUBTITLE_FORMAT: &str = "srt";
pub const AUDIO_CODEC: &str = "mp3";

const AUDIO_FORMAT_SELECTOR: &str = "bestaudio/best";
const VIDEO_NAME: &str = "%(title)s.%(ext)s";
const AUDIO_NAME: &str = "%(title)s_audio.%(ext)s";

/// Video selector with three fallbacks: split streams under the ceiling,
/// a combined stream under the ceiling, then anything.
pub fn video_format_selector(height: u32) -> String {
    format!(
        "bestvideo[height<={h}]+bestaudio/best[height<={h}]/best",
        h = height
    )
}

/// Turns user selections into a validated plan.
#[derive(Debug, Clone)]
pub struct PlanBuilder {
    capabilities: Capabilities,
    merge_container: String,
    audio_quality: String,
}

impl PlanBuilder {
    pub fn new(capabilities: Capabilities, config: &AppConfig) -> Self {
        Self {
            capabilities,
            merge_container: config.merge_container.clone(),
            audio_quality: config.audio_quality.clone(),
        }
    }

    pub fn build(&self, request: &DownloadRequest) -> Result<DownloadPlan, PlanError> {
        let url = request.url.trim();
        if url.is_empty() {
            return Err(PlanError::EmptyUrl);
        }

        if !request.destination_dir.is_dir() {
            return Err(PlanError::InvalidDestination(request.destination_dir.clone()));
        }

        let mut passes = Vec::with_capacity(2);

        if request.audio_mode.wants_video() {
            let pass = self.video_pass(request);
            if pass.merge_container.is_some() && !self.capabilities.is_merge_capable() {
                return Err(PlanError::MergeToolUnavailable);
            }
            passes.push(pass);
        }

        if request.audio_mode.wants_audio() {
            passes.push(self.audio_pass(&request.destination_dir));
        }

        debug!(
            "planned {} pass(es) for {} into {}",
            passes.len(),
            url,
            request.destination_dir.display()
        );

        Ok(DownloadPlan {
            url: url.to_string(),
            destination_dir: request.destination_dir.clone(),
            passes,
        })
    }

    fn video_pass(&self, request: &DownloadRequest) -> PassSpec {
        let subtitles = request.want_subtitles.then(|| SubtitleRequest {
            languages: SUBTITLE_LANGUAGES.iter().map(|l| l.to_string()).collect(),
            format: SUBTITLE_FORMAT.to_string(),
            include_auto_captions: true,
        });

        PassSpec {
            kind: PassKind::Video,
            format_selector: video_format_selector(request.quality.height()),
            output_template: output_template(&request.destination_dir, VIDEO_NAME),
            merge_container: Some(self.merge_container.clone()),
            subtitles,
            audio_extraction: None,
        }
    }

    fn audio_pass(&self, destination: &Path) -> PassSpec {
        PassSpec {
            kind: PassKind::Audio,
            format_selector: AUDIO_FORMAT_SELECTOR.to_string(),
            output_template: output_template(destination, AUDIO_NAME),
            merge_container: None,
            subtitles: None,
            audio_extraction: Some(AudioExtraction {
                codec: AUDIO_CODEC.to_string(),
                quality: self.audio_quality.clone(),
            }),
        }
    }
}

fn output_template(destination: &Path, name: &str) -> String {
    destination.join(name).to_string_lossy().to_string()
}
