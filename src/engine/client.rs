use std::io::{self, BufRead, BufReader, Read};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use tracing::{debug, info};

use super::models::{EngineInvocation, EngineReport, RawProgress};
use super::traits::{EngineError, MediaEngine};

const PROGRESS_PREFIX: &str = "PROGRESS|";
const RESULT_PREFIX: &str = "RESULT|";

/// Runs the `yt-dlp` binary, one process per pass.
#[derive(Debug, Clone)]
pub struct YtDlpEngine {
    program: String,
    /// Arguments placed before ours, e.g. `["-m", "yt_dlp"]` for a python launcher.
    prefix_args: Vec<String>,
}

impl YtDlpEngine {
    pub fn new(program: impl Into<String>, prefix_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            prefix_args,
        }
    }

    /// Command line for one pass, URL last.
    pub fn build_args(invocation: &EngineInvocation) -> Vec<String> {
        let mut args: Vec<String> = [
            "--newline",
            "--no-playlist",
            "--progress",
            "--no-warnings",
            "--progress-template",
            "download:PROGRESS|%(progress.status)s|%(progress._percent_str)s",
            "--print",
            "after_move:RESULT|%(.{title,filepath,subtitles,automatic_captions})j",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        args.extend([
            "-f".to_string(),
            invocation.format_selector.clone(),
            "-o".to_string(),
            invocation.output_template.clone(),
        ]);

        if let Some(container) = &invocation.merge_container {
            args.extend(["--merge-output-format".to_string(), container.clone()]);
        }

        if let Some(location) = &invocation.ffmpeg_location {
            args.extend([
                "--ffmpeg-location".to_string(),
                location.to_string_lossy().to_string(),
            ]);
        }

        if let Some(subs) = &invocation.subtitles {
            args.push("--write-subs".to_string());
            if subs.include_auto_captions {
                args.push("--write-auto-subs".to_string());
            }
            args.extend([
                "--sub-langs".to_string(),
                subs.languages.join(","),
                "--sub-format".to_string(),
                format!("{}/best", subs.format),
                "--convert-subs".to_string(),
                subs.format.clone(),
                // Subtitle file shares the video's base name.
                "-o".to_string(),
                format!("subtitle:{}", invocation.output_template),
            ]);
        }

        if let Some(audio) = &invocation.audio_extraction {
            args.extend([
                "-x".to_string(),
                "--audio-format".to_string(),
                audio.codec.clone(),
                "--audio-quality".to_string(),
                format!("{}K", audio.quality),
            ]);
        }

        args.push(invocation.url.clone());
        args
    }
}

/// Splits a `PROGRESS|<status>|<percent>` line printed via our progress template.
pub fn parse_progress_line(line: &str) -> Option<RawProgress> {
    let rest = line.trim().strip_prefix(PROGRESS_PREFIX)?;
    let (status, percent) = rest.split_once('|').unwrap_or((rest, ""));
    Some(RawProgress::new(status.trim(), percent))
}

/// A line from one of the engine's output streams.
enum StreamLine {
    Stdout(String),
    Stderr(String),
    ReadFailed(String),
}

/// Reads one line, replacing invalid UTF-8 instead of failing on it.
fn read_lossy_line(reader: &mut impl BufRead, buffer: &mut Vec<u8>) -> io::Result<Option<String>> {
    buffer.clear();
    if reader.read_until(b'\n', buffer)? == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(buffer);
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

fn spawn_reader<R>(
    source: R,
    sender: Sender<StreamLine>,
    wrap: fn(String) -> StreamLine,
) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut reader = BufReader::new(source);
        let mut buffer = Vec::new();
        loop {
            match read_lossy_line(&mut reader, &mut buffer) {
                Ok(Some(line)) => {
                    if sender.send(wrap(line)).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    let _ = sender.send(StreamLine::ReadFailed(e.to_string()));
                    break;
                }
            }
        }
    })
}

impl MediaEngine for YtDlpEngine {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    fn run(
        &self,
        invocation: &EngineInvocation,
        on_progress: &mut dyn FnMut(RawProgress),
    ) -> Result<EngineReport, EngineError> {
        let args = Self::build_args(invocation);
        debug!("{} {:?} {:?}", self.program, self.prefix_args, args);

        let mut child = Command::new(&self.program)
            .args(&self.prefix_args)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| EngineError::Spawn {
                binary: self.program.clone(),
                message: e.to_string(),
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Io("engine stdout unavailable".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineError::Io("engine stderr unavailable".to_string()))?;

        // Both streams are drained on their own threads; lines come back here so
        // progress callbacks run on the calling thread.
        let (sender, lines) = mpsc::channel();
        let readers = [
            spawn_reader(stdout, sender.clone(), StreamLine::Stdout),
            spawn_reader(stderr, sender, StreamLine::Stderr),
        ];

        let mut printed_report: Option<String> = None;
        let mut last_error: Option<String> = None;
        let mut last_line: Option<String> = None;
        let mut read_error: Option<String> = None;

        for line in lines {
            let (text, from_stderr) = match line {
                StreamLine::Stdout(text) => (text, false),
                StreamLine::Stderr(text) => (text, true),
                StreamLine::ReadFailed(message) => {
                    if read_error.is_none() {
                        let _ = child.kill();
                        read_error = Some(message);
                    }
                    continue;
                }
            };

            // With --print yt-dlp goes quiet and progress may land on either stream.
            if let Some(progress) = parse_progress_line(&text) {
                on_progress(progress);
            } else if from_stderr {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if trimmed.starts_with("ERROR:") {
                    last_error = Some(trimmed.to_string());
                }
                last_line = Some(trimmed.to_string());
            } else if let Some(json) = text.trim().strip_prefix(RESULT_PREFIX) {
                printed_report = Some(json.to_string());
            }
        }

        let status = child.wait().map_err(|e| EngineError::Io(e.to_string()))?;
        for reader in readers {
            let _ = reader.join();
        }

        if let Some(message) = read_error {
            return Err(EngineError::Io(message));
        }

        if !status.success() {
            return Err(EngineError::Failed {
                code: status.code(),
                message: last_error
                    .or(last_line)
                    .unwrap_or_else(|| format!("{} exited with {}", self.program, status)),
            });
        }

        let json = printed_report.ok_or(EngineError::MissingReport)?;
        let report = EngineReport::from_printed_json(&json)
            .map_err(|e| EngineError::MalformedReport(e.to_string()))?;

        info!("{} finished: {:?}", self.name(), report.filepath);
        Ok(report)
    }
}
