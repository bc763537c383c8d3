use std::path::PathBuf;

use iced::{
    widget::{
        button, checkbox, column, pick_list, progress_bar, radio, row, text, text_input, Space,
    },
    Element, Length,
};

use crate::domain::{AudioMode, DownloadRequest, QualityTier};

/// Main view state. Lives for the whole session, so the chosen destination
/// is remembered between downloads.
pub struct DownloadView {
    pub url: String,
    pub quality: QualityTier,
    pub audio_mode: AudioMode,
    pub want_subtitles: bool,
    pub destination: String,
    pub status_message: String,
    pub is_downloading: bool,
    pub download_progress: f32,
}

impl Default for DownloadView {
    fn default() -> Self {
        Self::new(PathBuf::from("."))
    }
}

#[derive(Debug, Clone)]
pub enum DownloadMessage {
    UrlChanged(String),
    QualitySelected(QualityTier),
    AudioModeSelected(AudioMode),
    SubtitlesToggled(bool),
    DestinationChanged(String),
    BrowsePressed,
    DownloadPressed,
}

impl DownloadView {
    pub fn new(destination: PathBuf) -> Self {
        Self {
            url: String::new(),
            quality: QualityTier::default(),
            audio_mode: AudioMode::default(),
            want_subtitles: false,
            destination: destination.to_string_lossy().to_string(),
            status_message: "Paste a video URL to download".to_string(),
            is_downloading: false,
            download_progress: 0.0,
        }
    }

    /// Snapshot of the form as a request.
    pub fn request(&self) -> DownloadRequest {
        DownloadRequest {
            url: self.url.clone(),
            quality: self.quality,
            audio_mode: self.audio_mode,
            want_subtitles: self.want_subtitles,
            destination_dir: PathBuf::from(self.destination.trim()),
        }
    }

    pub fn update(&mut self, message: DownloadMessage) {
        match message {
            DownloadMessage::UrlChanged(url) => self.url = url,
            DownloadMessage::QualitySelected(quality) => self.quality = quality,
            DownloadMessage::AudioModeSelected(mode) => self.audio_mode = mode,
            DownloadMessage::SubtitlesToggled(on) => self.want_subtitles = on,
            DownloadMessage::DestinationChanged(dest) => self.destination = dest,
            DownloadMessage::BrowsePressed | DownloadMessage::DownloadPressed => {
                // Will be handled by the app
            }
        }
    }

    pub fn view(&self) -> Element<'_, DownloadMessage> {
        let audio_options = AudioMode::ALL.into_iter().fold(column![].spacing(4), |col, mode| {
            col.push(radio(
                mode.to_string(),
                mode,
                Some(self.audio_mode),
                DownloadMessage::AudioModeSelected,
            ))
        });

        let subtitle_options = checkbox(self.want_subtitles)
            .label("Download Subtitles")
            .on_toggle(DownloadMessage::SubtitlesToggled);

        let download = button("Download")
            .on_press_maybe((!self.is_downloading).then_some(DownloadMessage::DownloadPressed))
            .padding([10, 20]);

        column![
            text("Video Downloader").size(32),
            Space::new().height(Length::Fixed(20.0)),
            text("Video URL:").size(16),
            text_input("https://...", &self.url)
                .on_input(DownloadMessage::UrlChanged)
                .padding(10),
            text("Video quality:").size(16),
            pick_list(
                QualityTier::ALL,
                Some(self.quality),
                DownloadMessage::QualitySelected
            ),
            text("Audio download options:").size(16),
            audio_options,
            subtitle_options,
            text("Save location:").size(16),
            row![
                text_input("Folder...", &self.destination)
                    .on_input(DownloadMessage::DestinationChanged)
                    .padding(10),
                button("Browse")
                    .on_press(DownloadMessage::BrowsePressed)
                    .padding([10, 20]),
            ]
            .spacing(10),
            Space::new().height(Length::Fixed(10.0)),
            download,
            progress_bar(0.0..=100.0, self.download_progress),
            text(&self.status_message).size(14),
        ]
        .padding(20)
        .spacing(10)
        .into()
    }
}
