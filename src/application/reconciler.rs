use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{
    domain::{AudioMode, DownloadRequest, JobOutcome, JobStatus, PassKind, PassResult},
    utils::join_languages,
};

use super::plan_builder::SUBTITLE_LANGUAGES;

/// Containers a pass can leave behind before (or instead of) the final merge.
///
/// Matched by extension only, so a user's own `.webm`/`.mkv` files in the same
/// folder are removed too. Files a pass produced and files in the configured
/// merge container are kept.
pub const TRANSIENT_EXTENSIONS: [&str; 2] = ["webm", "mkv"];

#[derive(Debug, Clone)]
pub struct Reconciler {
    merge_container: String,
}

impl Reconciler {
    pub fn new(merge_container: impl Into<String>) -> Self {
        Self {
            merge_container: merge_container.into(),
        }
    }

    pub fn reconcile(&self, results: &[PassResult], request: &DownloadRequest) -> JobOutcome {
        let produced_files = produced_files(results);

        let removed = remove_transient_containers(
            &request.destination_dir,
            &produced_files,
            &self.merge_container,
            |path| std::fs::remove_file(path),
        );
        if removed > 0 {
            info!("removed {} intermediate file(s)", removed);
        }

        if let Some(failure) = results.iter().find_map(|r| r.failure.as_ref()) {
            return JobOutcome {
                status: JobStatus::Failed,
                message: failure.to_string(),
                produced_files,
            };
        }

        let base = base_message(request.audio_mode);
        let video = results.iter().find(|r| r.kind == PassKind::Video);

        match video {
            Some(video) if request.want_subtitles && !video.subtitle_file_found() => JobOutcome {
                status: JobStatus::PartialSuccess,
                message: format!(
                    "{}! {}",
                    base,
                    missing_subtitles_message(&video.reported_subtitle_languages_available)
                ),
                produced_files,
            },
            Some(video) if video.subtitle_file_found() => JobOutcome {
                status: JobStatus::Success,
                message: format!("{} (with subtitles)!", base),
                produced_files,
            },
            _ => JobOutcome {
                status: JobStatus::Success,
                message: format!("{}!", base),
                produced_files,
            },
        }
    }
}

fn base_message(mode: AudioMode) -> &'static str {
    match mode {
        AudioMode::Mp3Only => "Audio downloaded as MP3",
        AudioMode::Both => "Video and MP3 downloaded",
        AudioMode::VideoOnly => "Video downloaded",
    }
}

fn missing_subtitles_message(available: &BTreeSet<String>) -> String {
    let requested: Vec<String> = SUBTITLE_LANGUAGES.iter().map(|l| l.to_string()).collect();
    let any_requested_available = requested.iter().any(|l| available.contains(l));

    if any_requested_available {
        format!(
            "Failed to download subtitles (requested: {}; available: {}).",
            join_languages(&requested),
            join_languages(available)
        )
    } else if available.is_empty() {
        "No English subtitles (manual or auto-generated) available for this video.".to_string()
    } else {
        format!(
            "No English subtitles (manual or auto-generated) available for this video. Available languages: {}.",
            join_languages(available)
        )
    }
}

fn produced_files(results: &[PassResult]) -> BTreeSet<PathBuf> {
    results
        .iter()
        .filter(|r| !r.is_failed())
        .flat_map(|r| r.resolved_file_path.iter().chain(r.subtitle_file.iter()))
        .cloned()
        .collect()
}

fn is_transient(path: &Path, merge_container: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            !ext.eq_ignore_ascii_case(merge_container)
                && TRANSIENT_EXTENSIONS
                    .iter()
                    .any(|t| t.eq_ignore_ascii_case(ext))
        })
}

/// Best effort: failures are logged and skipped.
fn remove_transient_containers(
    dir: &Path,
    keep: &BTreeSet<PathBuf>,
    merge_container: &str,
    mut remove: impl FnMut(&Path) -> io::Result<()>,
) -> usize {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("cannot scan {} for cleanup: {}", dir.display(), e);
            return 0;
        }
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() || keep.contains(&path) || !is_transient(&path, merge_container) {
            continue;
        }

        match remove(&path) {
            Ok(()) => {
                debug!("removed {}", path.display());
                removed += 1;
            }
            Err(e) => debug!("could not remove {}: {}", path.display(), e),
        }
    }
    removed
}
