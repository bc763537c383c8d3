mod app;
mod application;
mod config;
mod domain;
mod engine;
mod ui;
mod utils;

use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> iced::Result {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();

    info!("starting video downloader");

    iced::application(app::DownloadApp::default, app::update, app::view)
        .title("Video Downloader")
        .window_size((420.0, 720.0))
        .run()
}
