use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    domain::{DownloadPlan, PassExecutionFailure, PassKind, PassResult, PassSpec},
    engine::{Capabilities, EngineInvocation, EngineReport, MediaEngine, RawProgress},
};

use super::progress::{PassProgress, ProgressReporter};

/// Runs a plan's passes one after another against the engine.
#[derive(Clone)]
pub struct Orchestrator {
    engine: Arc<dyn MediaEngine>,
    capabilities: Capabilities,
}

impl Orchestrator {
    pub fn new(engine: Arc<dyn MediaEngine>, capabilities: Capabilities) -> Self {
        Self {
            engine,
            capabilities,
        }
    }

    /// One result per attempted pass, in plan order. A failed pass ends the
    /// run; nothing is retried.
    pub fn execute(&self, plan: &DownloadPlan, sink: &dyn ProgressReporter) -> Vec<PassResult> {
        let mut results = Vec::with_capacity(plan.passes().len());

        for pass in plan.passes() {
            info!("starting {} pass with {}", pass.kind, self.engine.name());
            let result = self.execute_pass(plan, pass, sink);
            let failed = result.is_failed();
            results.push(result);

            if failed {
                break;
            }
        }

        results
    }

    fn execute_pass(
        &self,
        plan: &DownloadPlan,
        pass: &PassSpec,
        sink: &dyn ProgressReporter,
    ) -> PassResult {
        let invocation = EngineInvocation::for_pass(
            plan.url(),
            pass,
            self.capabilities.ffmpeg_location().map(Path::to_path_buf),
        );

        let mut progress = PassProgress::new();
        let outcome = self.engine.run(&invocation, &mut |raw: RawProgress| {
            if let Some(event) = progress.normalize(&raw) {
                sink.report(event);
            }
        });

        match outcome {
            Ok(report) => {
                sink.report(progress.finish());
                info!("{} pass done: {:?}", pass.kind, report.filepath);
                self.pass_result(plan, pass, report)
            }
            Err(e) => {
                warn!("{} pass failed: {}", pass.kind, e);
                PassResult::failed(
                    pass.kind,
                    PassExecutionFailure {
                        kind: pass.kind,
                        message: e.to_string(),
                    },
                )
            }
        }
    }

    fn pass_result(&self, plan: &DownloadPlan, pass: &PassSpec, report: EngineReport) -> PassResult {
        let (available, subtitle_file) = match (&pass.kind, &pass.subtitles) {
            (PassKind::Video, Some(subs)) => (
                report.available_subtitle_languages(),
                find_subtitle_file(plan.destination_dir(), &report, &subs.format),
            ),
            (PassKind::Video, None) => (report.available_subtitle_languages(), None),
            (PassKind::Audio, _) => (Default::default(), None),
        };

        PassResult {
            kind: pass.kind,
            resolved_file_path: report.filepath,
            reported_subtitle_languages_available: available,
            subtitle_file,
            failure: None,
        }
    }
}

/// The subtitle is written next to the video under the same base name.
fn find_subtitle_file(destination: &Path, report: &EngineReport, format: &str) -> Option<PathBuf> {
    let next_to_video = report
        .filepath
        .as_ref()
        .map(|path| path.with_extension(format));
    let by_title = (!report.title.is_empty())
        .then(|| destination.join(format!("{}.{}", report.title, format)));

    next_to_video
        .into_iter()
        .chain(by_title)
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        application::{plan_builder::PlanBuilder, progress::ProgressTracker},
        config::AppConfig,
        domain::{AudioMode, DownloadRequest, ProgressEvent, ProgressPhase, QualityTier},
        engine::EngineError,
    };
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    /// What the fake engine does for one pass.
    pub(crate) struct Script {
        pub progress: Vec<RawProgress>,
        pub result: Result<FakeFile, EngineError>,
    }

    pub(crate) struct FakeFile {
        pub title: String,
        pub file_name: String,
        pub write_subtitle: bool,
        pub subtitles: Vec<&'static str>,
        pub auto_captions: Vec<&'static str>,
        /// Intermediate files left behind in the destination.
        pub leftovers: Vec<&'static str>,
    }

    impl FakeFile {
        pub fn new(title: &str, file_name: &str) -> Self {
            Self {
                title: title.to_string(),
                file_name: file_name.to_string(),
                write_subtitle: false,
                subtitles: Vec::new(),
                auto_captions: Vec::new(),
                leftovers: Vec::new(),
            }
        }
    }

    /// Plays scripts in order and records every invocation.
    pub(crate) struct FakeEngine {
        destination: PathBuf,
        scripts: Mutex<Vec<Script>>,
        pub invocations: Mutex<Vec<EngineInvocation>>,
    }

    impl FakeEngine {
        pub fn new(destination: &Path, mut scripts: Vec<Script>) -> Self {
            scripts.reverse();
            Self {
                destination: destination.to_path_buf(),
                scripts: Mutex::new(scripts),
                invocations: Mutex::new(Vec::new()),
            }
        }
    }

    impl MediaEngine for FakeEngine {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn run(
            &self,
            invocation: &EngineInvocation,
            on_progress: &mut dyn FnMut(RawProgress),
        ) -> Result<EngineReport, EngineError> {
            self.invocations.lock().unwrap().push(invocation.clone());
            let script = self
                .scripts
                .lock()
                .unwrap()
                .pop()
                .expect("engine called more often than scripted");

            for raw in script.progress {
                on_progress(raw);
            }

            let file = script.result?;
            let path = self.destination.join(&file.file_name);
            std::fs::write(&path, b"media").unwrap();
            if file.write_subtitle {
                std::fs::write(path.with_extension("srt"), b"1\n").unwrap();
            }
            for leftover in &file.leftovers {
                std::fs::write(self.destination.join(leftover), b"partial").unwrap();
            }

            Ok(EngineReport {
                title: file.title,
                filepath: Some(path),
                subtitle_languages: file.subtitles.iter().map(|s| s.to_string()).collect(),
                automatic_caption_languages: file
                    .auto_captions
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            })
        }
    }

    fn downloading(percent: &str) -> RawProgress {
        RawProgress::new("downloading", percent)
    }

    fn plan_for(dir: &Path, audio_mode: AudioMode, want_subtitles: bool) -> DownloadPlan {
        let builder = PlanBuilder::new(
            Capabilities::new(Some(PathBuf::from("/usr/bin/ffmpeg"))),
            &AppConfig::default(),
        );
        builder
            .build(&DownloadRequest {
                url: "https://example/video".to_string(),
                quality: QualityTier::P720,
                audio_mode,
                want_subtitles,
                destination_dir: dir.to_path_buf(),
            })
            .unwrap()
    }

    fn orchestrator(engine: Arc<FakeEngine>) -> Orchestrator {
        Orchestrator::new(
            engine,
            Capabilities::new(Some(PathBuf::from("/usr/bin/ffmpeg"))),
        )
    }

    /// Records every event in order.
    #[derive(Default)]
    struct Recorder(Mutex<Vec<ProgressEvent>>);

    impl ProgressReporter for Recorder {
        fn report(&self, event: ProgressEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    #[test]
    fn test_passes_run_in_plan_order() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(FakeEngine::new(
            dir.path(),
            vec![
                Script {
                    progress: vec![],
                    result: Ok(FakeFile::new("clip", "clip.mp4")),
                },
                Script {
                    progress: vec![],
                    result: Ok(FakeFile::new("clip", "clip_audio.mp3")),
                },
            ],
        ));

        let plan = plan_for(dir.path(), AudioMode::Both, false);
        let results = orchestrator(engine.clone()).execute(&plan, &ProgressTracker::default());

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].kind, PassKind::Video);
        assert_eq!(results[1].kind, PassKind::Audio);
        assert_eq!(
            results[1].resolved_file_path,
            Some(dir.path().join("clip_audio.mp3"))
        );

        let invocations = engine.invocations.lock().unwrap();
        assert_eq!(invocations[0].merge_container.as_deref(), Some("mp4"));
        assert_eq!(invocations[1].format_selector, "bestaudio/best");
        assert_eq!(
            invocations[0].ffmpeg_location,
            Some(PathBuf::from("/usr/bin/ffmpeg"))
        );
    }

    #[test]
    fn test_failure_stops_remaining_passes() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(FakeEngine::new(
            dir.path(),
            vec![Script {
                progress: vec![downloading("12%")],
                result: Err(EngineError::Failed {
                    code: Some(1),
                    message: "ERROR: [generic] Video unavailable".to_string(),
                }),
            }],
        ));

        let recorder = Recorder::default();
        let plan = plan_for(dir.path(), AudioMode::Both, false);
        let results = orchestrator(engine.clone()).execute(&plan, &recorder);

        assert_eq!(results.len(), 1);
        let failure = results[0].failure.as_ref().unwrap();
        assert_eq!(failure.kind, PassKind::Video);
        assert_eq!(failure.message, "ERROR: [generic] Video unavailable");
        assert_eq!(engine.invocations.lock().unwrap().len(), 1);

        let events = recorder.0.lock().unwrap();
        assert!(events.iter().all(|e| e.phase == ProgressPhase::Downloading));
    }

    #[test]
    fn test_progress_is_monotonic_with_one_finish() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(FakeEngine::new(
            dir.path(),
            vec![Script {
                progress: vec![
                    downloading("  0.5%"),
                    downloading("40.0%"),
                    downloading("garbage"),
                    downloading("100.0%"),
                    RawProgress::new("finished", "100.0%"),
                    downloading("  3.0%"),
                    downloading("100.0%"),
                    RawProgress::new("finished", "100.0%"),
                ],
                result: Ok(FakeFile::new("clip", "clip.mp4")),
            }],
        ));

        let recorder = Recorder::default();
        let plan = plan_for(dir.path(), AudioMode::VideoOnly, false);
        orchestrator(engine).execute(&plan, &recorder);

        let events = recorder.0.lock().unwrap();
        let (finished, downloading): (Vec<&ProgressEvent>, Vec<&ProgressEvent>) = events
            .iter()
            .partition(|e| e.phase == ProgressPhase::Finished);

        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].percent, 100.0);
        assert_eq!(events.last().unwrap().phase, ProgressPhase::Finished);
        assert!(downloading.windows(2).all(|w| w[0].percent <= w[1].percent));
        assert_eq!(downloading.len(), 5);
    }

    #[test]
    fn test_subtitle_detection() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = FakeFile::new("clip", "clip.mp4");
        file.write_subtitle = true;
        file.subtitles = vec!["en"];
        file.auto_captions = vec!["en", "de"];
        let engine = Arc::new(FakeEngine::new(
            dir.path(),
            vec![Script {
                progress: vec![],
                result: Ok(file),
            }],
        ));

        let plan = plan_for(dir.path(), AudioMode::VideoOnly, true);
        let results = orchestrator(engine).execute(&plan, &ProgressTracker::default());

        assert!(results[0].subtitle_file_found());
        assert_eq!(results[0].subtitle_file, Some(dir.path().join("clip.srt")));
        let expected: BTreeSet<String> = ["de", "en"].iter().map(|s| s.to_string()).collect();
        assert_eq!(results[0].reported_subtitle_languages_available, expected);
    }

    #[test]
    fn test_missing_subtitle_file() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(FakeEngine::new(
            dir.path(),
            vec![Script {
                progress: vec![],
                result: Ok(FakeFile::new("clip", "clip.mp4")),
            }],
        ));

        let plan = plan_for(dir.path(), AudioMode::VideoOnly, true);
        let results = orchestrator(engine).execute(&plan, &ProgressTracker::default());

        assert!(!results[0].subtitle_file_found());
        assert!(results[0].reported_subtitle_languages_available.is_empty());
    }
}
