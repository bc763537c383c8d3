use std::path::PathBuf;
use std::sync::Arc;

use futures::StreamExt;
use iced::Task;
use tracing::{info, warn};

use crate::application::{DownloadCoordinator, JobEvent};
use crate::config::AppConfig;
use crate::domain::{JobStatus, ProgressPhase, QualityTier};
use crate::engine::{Capabilities, YtDlpEngine};
use crate::ui::{DownloadMessage, DownloadView};

pub struct DownloadApp {
    view: DownloadView,
    coordinator: DownloadCoordinator,
}

impl Default for DownloadApp {
    fn default() -> Self {
        Self::new(AppConfig::load())
    }
}

impl DownloadApp {
    pub fn new(config: AppConfig) -> Self {
        let capabilities = Capabilities::probe(&config.ffmpeg_binary);
        let engine = Arc::new(YtDlpEngine::new(
            config.ytdlp_binary.clone(),
            config.ytdlp_args.clone(),
        ));
        let coordinator = DownloadCoordinator::new(engine, capabilities, &config);
        let mut view = DownloadView::new(config.default_destination.clone());
        view.quality = initial_quality(&config);

        Self { view, coordinator }
    }
}

fn initial_quality(config: &AppConfig) -> QualityTier {
    config.default_quality.parse().unwrap_or_else(|e| {
        warn!("{}, using {}", e, QualityTier::default());
        QualityTier::default()
    })
}

#[derive(Debug, Clone)]
pub enum Message {
    UiMessage(DownloadMessage),
    /// Folder picked in the dialog, `None` when cancelled
    DestinationSelected(Option<PathBuf>),
    Job(JobEvent),
}

pub fn update(app: &mut DownloadApp, message: Message) -> Task<Message> {
    match message {
        Message::UiMessage(ui_msg) => {
            app.view.update(ui_msg.clone());

            match ui_msg {
                DownloadMessage::BrowsePressed => {
                    let coordinator = app.coordinator.clone();
                    let current = PathBuf::from(app.view.destination.trim());

                    return Task::perform(
                        async move { coordinator.choose_destination(current).await },
                        Message::DestinationSelected,
                    );
                }
                DownloadMessage::DownloadPressed if !app.view.is_downloading => {
                    let request = app.view.request();

                    match app.coordinator.prepare(&request) {
                        Ok(plan) => {
                            app.view.is_downloading = true;
                            app.view.download_progress = 0.0;
                            app.view.status_message = "Processing...".to_string();

                            return Task::stream(
                                app.coordinator
                                    .run_stream(plan, request)
                                    .map(Message::Job),
                            );
                        }
                        Err(e) => {
                            info!("request rejected: {}", e);
                            app.view.status_message = e.to_string();
                        }
                    }
                }
                _ => {}
            }
        }
        Message::DestinationSelected(Some(path)) => {
            app.view.destination = path.to_string_lossy().to_string();
        }
        Message::DestinationSelected(None) => {}
        Message::Job(JobEvent::Progress(event)) => {
            app.view.download_progress = event.percent;
            app.view.status_message = match event.phase {
                ProgressPhase::Downloading => format!("Downloading... {:.1}%", event.percent),
                ProgressPhase::Finished => "Download complete, finalizing...".to_string(),
            };
        }
        Message::Job(JobEvent::Completed(outcome)) => {
            app.view.is_downloading = false;
            if outcome.status == JobStatus::Failed {
                app.view.download_progress = 0.0;
            }
            app.view.status_message = outcome.message;
        }
    }
    Task::none()
}

pub fn view(app: &DownloadApp) -> iced::Element<'_, Message> {
    app.view.view().map(Message::UiMessage)
}
