//! The configured ffmpeg executable and its invocations.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use crate::config::Settings;

use super::probe;
use super::runner::{new_command, run_with_timeout};
use super::types::{CommandOutput, FfmpegResult};

/// Executable used when none is configured (resolved on PATH).
pub const DEFAULT_PROGRAM: &str = "ffmpeg";

/// Wall-clock budget for a merge or mux invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3600);

/// Wall-clock budget for the `-version` probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// An ffmpeg executable plus the limits it is run under.
#[derive(Debug, Clone)]
pub struct FfmpegTool {
    /// Bare name (looked up on PATH) or full path.
    program: PathBuf,
    /// Budget for merge/mux runs.
    timeout: Duration,
    /// Budget for the availability probe.
    probe_timeout: Duration,
    /// Where concat manifests are written (None = system temp).
    manifest_dir: Option<PathBuf>,
}

impl FfmpegTool {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: DEFAULT_TIMEOUT,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            manifest_dir: None,
        }
    }

    /// Build from the `[ffmpeg]` and `[paths]` settings sections.
    pub fn from_settings(settings: &Settings) -> Self {
        let program = if settings.ffmpeg.path.trim().is_empty() {
            PathBuf::from(DEFAULT_PROGRAM)
        } else {
            PathBuf::from(settings.ffmpeg.path.trim())
        };

        Self {
            program,
            timeout: Duration::from_secs(settings.ffmpeg.timeout_secs),
            probe_timeout: Duration::from_secs(settings.ffmpeg.probe_timeout_secs),
            manifest_dir: settings.paths.temp_root_dir(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn with_manifest_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.manifest_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    pub fn manifest_dir(&self) -> Option<&Path> {
        self.manifest_dir.as_deref()
    }

    /// Short tool name for messages ("ffmpeg" for `/opt/bin/ffmpeg.exe`).
    pub fn name(&self) -> String {
        self.program
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_PROGRAM.to_string())
    }

    /// Stream-copy concatenation of the segments listed in `manifest`.
    pub fn concat_args(manifest: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-hide_banner", "-f", "concat", "-safe", "0", "-i"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(manifest.into());
        args.extend(["-c", "copy", "-y"].map(OsString::from));
        args.push(output.into());
        args
    }

    /// Video copied as-is, audio re-encoded to AAC.
    pub fn mux_args(video: &Path, audio: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-hide_banner".into(), "-i".into()];
        args.push(video.into());
        args.push("-i".into());
        args.push(audio.into());
        args.extend(
            ["-c:v", "copy", "-c:a", "aac", "-strict", "experimental", "-y"].map(OsString::from),
        );
        args.push(output.into());
        args
    }

    /// A `Command` for this executable with `args` applied.
    pub fn command(&self, args: &[OsString]) -> Command {
        let mut cmd = new_command(&self.program);
        cmd.args(args);
        cmd
    }

    /// Run with the merge/mux timeout.
    pub fn run(&self, args: &[OsString]) -> FfmpegResult<CommandOutput> {
        run_with_timeout(&mut self.command(args), self.timeout)
    }

    /// Whether `<program> -version` succeeds within the probe timeout.
    pub fn is_available(&self) -> bool {
        probe::is_available(&self.program, self.probe_timeout)
    }

    /// First line of `-version` output, if the probe succeeds.
    pub fn version(&self) -> Option<String> {
        probe::version_line(&self.program, self.probe_timeout)
    }

    /// Human-readable command line for logs.
    pub fn display_command(&self, args: &[OsString]) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(args.iter().map(|a| a.as_os_str()))
            .map(|part| {
                let part = part.to_string_lossy();
                if part.contains(char::is_whitespace) {
                    format!("\"{}\"", part)
                } else {
                    part.into_owned()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for FfmpegTool {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}
