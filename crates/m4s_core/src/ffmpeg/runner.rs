//! Subprocess execution with a wall-clock deadline.
//!
//! Both output pipes are drained on reader threads so a chatty child can
//! never block on a full pipe while we poll for its exit.

use std::ffi::OsStr;
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::types::{CommandOutput, FfmpegError, FfmpegResult};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Create a `Command` that does not pop up a console window on Windows.
pub fn new_command(program: impl AsRef<OsStr>) -> Command {
    let mut cmd = Command::new(program);
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        cmd.creation_flags(CREATE_NO_WINDOW);
    }
    cmd
}

/// Run a command to completion, killing it if `timeout` elapses first.
///
/// stdin is closed and both output streams are captured. On timeout the
/// child is killed and reaped; reader threads are left detached since a
/// grandchild may still hold the pipes open. A timeout too large to add to
/// the current instant means no deadline.
pub fn run_with_timeout(cmd: &mut Command, timeout: Duration) -> FfmpegResult<CommandOutput> {
    let program = cmd.get_program().to_string_lossy().into_owned();

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    tracing::debug!("Running: {:?} (timeout {}s)", cmd, timeout.as_secs());

    let start = Instant::now();
    let deadline = start.checked_add(timeout);
    let mut child = cmd.spawn().map_err(|source| FfmpegError::Spawn {
        program: program.clone(),
        source,
    })?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    kill_and_reap(&mut child, &program);
                    return Err(FfmpegError::TimedOut { program, timeout });
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(source) => {
                kill_and_reap(&mut child, &program);
                return Err(FfmpegError::Wait { program, source });
            }
        }
    };

    let output = CommandOutput {
        status,
        stdout: collect(stdout),
        stderr: collect(stderr),
        elapsed: start.elapsed(),
    };

    tracing::debug!(
        "{} exited with {} after {:.2}s",
        program,
        output.exit_code(),
        output.elapsed.as_secs_f64()
    );

    Ok(output)
}

fn drain<R>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>>
where
    R: Read + Send + 'static,
{
    pipe.map(|mut reader| {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            let _ = reader.read_to_end(&mut buffer);
            buffer
        })
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

fn kill_and_reap(child: &mut Child, program: &str) {
    if let Err(e) = child.kill() {
        tracing::warn!("Failed to kill {} (pid {}): {}", program, child.id(), e);
    }
    let _ = child.wait();
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut cmd = new_command("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[test]
    fn captures_both_streams_and_exit_code() {
        let output = run_with_timeout(
            &mut sh("echo out; echo err >&2; exit 3"),
            Duration::from_secs(10),
        )
        .unwrap();

        assert!(!output.success());
        assert_eq!(output.exit_code(), 3);
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.diagnostic(), "err");
    }

    #[test]
    fn large_output_does_not_deadlock() {
        let output = run_with_timeout(
            &mut sh("i=0; while [ $i -lt 20000 ]; do echo line $i >&2; i=$((i+1)); done"),
            Duration::from_secs(30),
        )
        .unwrap();

        assert!(output.success());
        assert_eq!(output.stderr.lines().count(), 20000);
    }

    #[test]
    fn kills_process_after_timeout() {
        let start = Instant::now();
        let result = run_with_timeout(&mut sh("exec sleep 30"), Duration::from_millis(300));

        assert!(matches!(result, Err(FfmpegError::TimedOut { .. })));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn unbounded_timeout_runs_to_completion() {
        let output = run_with_timeout(&mut sh("echo done"), Duration::MAX).unwrap();

        assert!(output.success());
        assert_eq!(output.stdout.trim(), "done");
    }

    #[test]
    fn oversized_configured_timeout_still_runs() {
        use crate::config::Settings;
        use crate::ffmpeg::FfmpegTool;

        let mut settings = Settings::default();
        settings.ffmpeg.path = "true".to_string();
        settings.ffmpeg.timeout_secs = u64::MAX;

        let output = FfmpegTool::from_settings(&settings).run(&[]).unwrap();
        assert!(output.success());
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let result = run_with_timeout(
            &mut new_command("/nonexistent/bin/ffmpeg"),
            Duration::from_secs(1),
        );
        assert!(matches!(result, Err(FfmpegError::Spawn { .. })));
    }
}
