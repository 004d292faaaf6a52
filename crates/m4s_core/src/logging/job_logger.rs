//! Per-job log: the user-facing lines of one merge or mux call.
//!
//! Lines go to an optional log file and an optional display callback,
//! and are mirrored into `tracing`. ffmpeg's own output is kept in a
//! bounded tail that is replayed when a command fails; outside compact
//! mode it is also shown as it arrives.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;

use super::types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

struct Sinks {
    file: Option<BufWriter<File>>,
    display: Option<LogCallback>,
}

/// Logger for one job. Share it behind an `Arc`.
pub struct JobLogger {
    name: String,
    path: Option<PathBuf>,
    config: LogConfig,
    sinks: Mutex<Sinks>,
    tail: Mutex<VecDeque<String>>,
}

impl JobLogger {
    /// Log to `<dir>/<name>.log` (created, truncated) and to `display`.
    pub fn create(
        name: impl Into<String>,
        dir: impl AsRef<Path>,
        config: LogConfig,
        display: Option<LogCallback>,
    ) -> io::Result<Self> {
        let name = name.into();
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let path = dir.join(format!("{}.log", file_stem_for(&name)));
        let file = File::create(&path)?;

        let mut logger = Self::detached(name, config, display);
        logger.sinks.get_mut().file = Some(BufWriter::new(file));
        logger.path = Some(path);
        Ok(logger)
    }

    /// Log to `display` only.
    pub fn detached(
        name: impl Into<String>,
        config: LogConfig,
        display: Option<LogCallback>,
    ) -> Self {
        let tail = VecDeque::with_capacity(config.error_tail);
        Self {
            name: name.into(),
            path: None,
            config,
            sinks: Mutex::new(Sinks {
                file: None,
                display,
            }),
            tail: Mutex::new(tail),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The log file, when logging to one.
    pub fn log_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn info(&self, message: &str) {
        self.emit(LogLevel::Info, MessagePrefix::None, message);
    }

    pub fn debug(&self, message: &str) {
        self.emit(LogLevel::Debug, MessagePrefix::None, message);
    }

    pub fn warn(&self, message: &str) {
        self.emit(LogLevel::Warn, MessagePrefix::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.emit(LogLevel::Error, MessagePrefix::Error, message);
    }

    /// `$ <command line>`
    pub fn command(&self, command: &str) {
        self.emit(LogLevel::Info, MessagePrefix::Command, command);
    }

    /// `=== <step> ===`
    pub fn phase(&self, name: &str) {
        self.emit(LogLevel::Info, MessagePrefix::Phase, name);
    }

    pub fn section(&self, name: &str) {
        self.emit(LogLevel::Info, MessagePrefix::Section, name);
    }

    pub fn success(&self, message: &str) {
        self.emit(LogLevel::Info, MessagePrefix::Success, message);
    }

    /// The command's arguments, one per line.
    pub fn command_pretty(&self, program: &str, args: &[OsString]) {
        let mut text = program.to_string();
        for arg in args {
            text.push_str(" \\\n    ");
            text.push_str(&arg.to_string_lossy());
        }
        self.emit(LogLevel::Info, MessagePrefix::None, &text);
    }

    /// The command's arguments as a JSON array.
    pub fn command_json(&self, args: &[OsString]) {
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy()).collect();
        match serde_json::to_string(&args) {
            Ok(json) => self.emit(LogLevel::Info, MessagePrefix::None, &json),
            Err(e) => tracing::debug!("Cannot encode arguments as JSON: {}", e),
        }
    }

    /// One line of ffmpeg output.
    pub fn tool_output(&self, line: &str, is_stderr: bool) {
        if self.config.error_tail > 0 {
            let mut tail = self.tail.lock();
            if tail.len() == self.config.error_tail {
                tail.pop_front();
            }
            tail.push_back(line.to_string());
        }

        if !self.config.compact && self.config.level <= LogLevel::Debug {
            let stream = if is_stderr { "[stderr] " } else { "" };
            self.write(&format!("{}{}", stream, line));
        }
    }

    /// Replay the kept ffmpeg output under a `[<header>/tail]` marker.
    pub fn dump_tail(&self, header: &str) {
        let tail = self.tail.lock();
        if tail.is_empty() {
            return;
        }
        self.write(&format!("[{}/tail]", header));
        for line in tail.iter() {
            self.write(line);
        }
    }

    pub fn tail(&self) -> Vec<String> {
        self.tail.lock().iter().cloned().collect()
    }

    pub fn clear_tail(&self) {
        self.tail.lock().clear();
    }

    pub fn flush(&self) {
        if let Some(file) = self.sinks.lock().file.as_mut() {
            if let Err(e) = file.flush() {
                tracing::warn!("Flushing job log {}: {}", self.name, e);
            }
        }
    }

    /// Flush and stop writing to the file. The display callback stays.
    pub fn close(&self) {
        self.flush();
        self.sinks.lock().file = None;
    }

    fn emit(&self, level: LogLevel, prefix: MessagePrefix, text: &str) {
        match level {
            LogLevel::Error => tracing::error!(job = %self.name, "{}", text),
            LogLevel::Warn => tracing::warn!(job = %self.name, "{}", text),
            _ => tracing::debug!(job = %self.name, "{}", text),
        }

        if level >= self.config.level {
            self.write(&prefix.format(text));
        }
    }

    fn write(&self, line: &str) {
        let line = if self.config.show_timestamps {
            format!("[{}] {}", Local::now().format("%H:%M:%S"), line)
        } else {
            line.to_string()
        };

        let mut sinks = self.sinks.lock();
        if let Some(file) = sinks.file.as_mut() {
            let _ = writeln!(file, "{}", line);
        }
        if let Some(display) = sinks.display.as_ref() {
            display(&line);
        }
    }
}

impl Drop for JobLogger {
    fn drop(&mut self) {
        self.close();
    }
}

/// Replace characters that are not allowed in file names.
fn file_stem_for(name: &str) -> String {
    name.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_")
}
