//! Runs one job on a background thread and reports back over a channel.

use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use chrono::Local;

use m4s_core::config::Settings;
use m4s_core::logging::{JobLogger, LogCallback, LogConfig};
use m4s_core::models::{MergeJob, MuxJob, ProcessJob};
use m4s_core::orchestrator::{PipelineResult, SegmentProcessor};

/// A user request, captured as an owned job value when it is issued.
#[derive(Debug, Clone)]
pub enum Action {
    Video(MergeJob),
    Audio(MergeJob),
    Mux(MuxJob),
    All(ProcessJob),
}

impl Action {
    pub fn job_name(&self) -> &'static str {
        match self {
            Action::Video(_) => "merge_video",
            Action::Audio(_) => "merge_audio",
            Action::Mux(_) => "mux",
            Action::All(_) => "process_all",
        }
    }

    /// Run the job to completion on the current thread.
    pub fn run(self, processor: &SegmentProcessor) -> PipelineResult<PathBuf> {
        match self {
            Action::Video(job) | Action::Audio(job) => processor.merge(job),
            Action::Mux(job) => processor.mux_job(job),
            Action::All(job) => processor.process(job),
        }
    }
}

/// Messages from the worker thread.
#[derive(Debug)]
pub enum WorkerMsg {
    /// A formatted job log line.
    Log(String),
    /// A stage boundary.
    Progress {
        stage: String,
        percent: u32,
        message: String,
    },
    /// The job's single result. Always the last message.
    Finished(PipelineResult<PathBuf>),
}

/// Start `action` on a dedicated thread.
///
/// The receiver yields log and progress messages while the job runs and
/// then exactly one [`WorkerMsg::Finished`]; it closes when the thread ends.
pub fn spawn(
    action: Action,
    settings: Settings,
    log_config: LogConfig,
) -> io::Result<(JoinHandle<()>, Receiver<WorkerMsg>)> {
    let (tx, rx) = mpsc::channel();

    let handle = thread::Builder::new()
        .name("m4s-worker".to_string())
        .spawn(move || {
            let logger = job_logger(action.job_name(), &settings, log_config, &tx);

            let tx_progress = tx.clone();
            let processor = SegmentProcessor::new(settings)
                .with_logger(Arc::new(logger))
                .with_progress_callback(Arc::new(move |stage, percent, message| {
                    let _ = tx_progress.send(WorkerMsg::Progress {
                        stage: stage.to_string(),
                        percent,
                        message: message.to_string(),
                    });
                }));

            let result = action.run(&processor);
            let _ = tx.send(WorkerMsg::Finished(result));
        })?;

    Ok((handle, rx))
}

/// A logger writing to the configured logs folder, or detached when none
/// is configured or the file cannot be created.
fn job_logger(
    job_name: &str,
    settings: &Settings,
    config: LogConfig,
    tx: &Sender<WorkerMsg>,
) -> JobLogger {
    let callback = |tx: Sender<WorkerMsg>| -> LogCallback {
        Box::new(move |line: &str| {
            let _ = tx.send(WorkerMsg::Log(line.to_string()));
        })
    };

    if let Some(dir) = settings.paths.logs_dir() {
        let file_name = format!("{}_{}", job_name, Local::now().format("%Y%m%d_%H%M%S"));
        match JobLogger::create(file_name, &dir, config.clone(), Some(callback(tx.clone()))) {
            Ok(logger) => return logger,
            Err(e) => tracing::warn!("Cannot write job log in {}: {}", dir.display(), e),
        }
    }
    JobLogger::detached(job_name, config, Some(callback(tx.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use m4s_core::orchestrator::ErrorKind;
    use std::fs;
    use tempfile::tempdir;

    fn run_to_end(action: Action, settings: Settings) -> (Vec<String>, PipelineResult<PathBuf>) {
        let (handle, rx) = spawn(action, settings, LogConfig::default()).unwrap();
        let mut logs = Vec::new();
        let mut finished = None;
        for msg in rx {
            match msg {
                WorkerMsg::Log(line) => logs.push(line),
                WorkerMsg::Progress { .. } => {}
                WorkerMsg::Finished(result) => finished = Some(result),
            }
        }
        handle.join().unwrap();
        (logs, finished.unwrap())
    }

    #[test]
    fn empty_job_reports_no_input() {
        let dir = tempdir().unwrap();
        let action = Action::All(ProcessJob::without_segments(dir.path()));
        assert_eq!(action.job_name(), "process_all");

        let (_, result) = run_to_end(action, Settings::default());

        assert_eq!(result.unwrap_err().kind(), ErrorKind::NoInput);
    }

    #[test]
    fn failed_job_is_logged_to_channel_and_file() {
        let dir = tempdir().unwrap();
        let logs_dir = dir.path().join("logs");
        let mut settings = Settings::default();
        settings.paths.logs_folder = logs_dir.to_string_lossy().into_owned();

        let action = Action::Mux(MuxJob::new(
            dir.path().join("missing_video.mp4"),
            dir.path().join("missing_audio.mp4"),
            dir.path(),
        ));
        let (logs, result) = run_to_end(action, settings);

        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingInput);
        assert!(logs.iter().any(|l| l.contains("[ERROR]") && l.contains("missing_video.mp4")));

        let log_files: Vec<_> = fs::read_dir(&logs_dir).unwrap().flatten().collect();
        assert_eq!(log_files.len(), 1);
        let name = log_files[0].file_name().to_string_lossy().into_owned();
        assert!(name.starts_with("mux_") && name.ends_with(".log"));
        let content = fs::read_to_string(log_files[0].path()).unwrap();
        assert!(content.contains("=== Mux ==="));
    }
}
