use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::{info, warn};

static PROBED: OnceLock<Capabilities> = OnceLock::new();

/// What the execution environment can do for us.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    ffmpeg_path: Option<PathBuf>,
}

impl Capabilities {
    pub fn new(ffmpeg_path: Option<PathBuf>) -> Self {
        Self { ffmpeg_path }
    }

    /// Probes once per process; later calls return the first answer.
    pub fn probe(ffmpeg_binary: &str) -> Self {
        PROBED.get_or_init(|| Self::detect(ffmpeg_binary)).clone()
    }

    fn detect(ffmpeg_binary: &str) -> Self {
        match which::which(ffmpeg_binary) {
            Ok(path) => {
                info!("merge tool found at {}", path.display());
                Self::new(Some(path))
            }
            Err(e) => {
                warn!(
                    "{} not found ({}), video and audio merging is unavailable",
                    ffmpeg_binary, e
                );
                Self::new(None)
            }
        }
    }

    pub fn is_merge_capable(&self) -> bool {
        self.ffmpeg_path.is_some()
    }

    pub fn ffmpeg_location(&self) -> Option<&Path> {
        self.ffmpeg_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_is_not_merge_capable() {
        let caps = Capabilities::detect("definitely-not-a-real-ffmpeg-binary-42");
        assert!(!caps.is_merge_capable());
        assert_eq!(caps.ffmpeg_location(), None);
    }

    #[test]
    fn test_explicit_path_is_merge_capable() {
        let caps = Capabilities::new(Some(PathBuf::from("/usr/bin/ffmpeg")));
        assert!(caps.is_merge_capable());
        assert_eq!(caps.ffmpeg_location(), Some(Path::new("/usr/bin/ffmpeg")));
    }

    #[test]
    fn test_probe_is_cached() {
        let first = Capabilities::probe("definitely-not-a-real-ffmpeg-binary-42");
        let second = Capabilities::probe("ffmpeg");
        assert_eq!(first, second);
    }
}
