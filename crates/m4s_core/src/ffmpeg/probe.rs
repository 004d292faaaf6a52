//! Availability probe: `<program> -version` with a short timeout.

use std::ffi::OsStr;
use std::time::Duration;

use super::runner::{new_command, run_with_timeout};
use super::types::{CommandOutput, FfmpegError};

/// Whether the executable answers a version query in time.
///
/// Returns `false`, never an error, when the executable is missing,
/// exits non-zero, or does not finish within `timeout`.
pub fn is_available(program: impl AsRef<OsStr>, timeout: Duration) -> bool {
    probe(program.as_ref(), timeout).is_some()
}

/// First line of the version banner (e.g. `ffmpeg version 6.1 ...`).
pub fn version_line(program: impl AsRef<OsStr>, timeout: Duration) -> Option<String> {
    probe(program.as_ref(), timeout)
        .and_then(|output| output.stdout.lines().next().map(|l| l.trim().to_string()))
}

fn probe(program: &OsStr, timeout: Duration) -> Option<CommandOutput> {
    let name = program.to_string_lossy();
    let mut cmd = new_command(program);
    cmd.arg("-version");

    match run_with_timeout(&mut cmd, timeout) {
        Ok(output) if output.success() => {
            tracing::debug!("{} is available", name);
            Some(output)
        }
        Ok(output) => {
            tracing::warn!(
                "{} -version failed with exit code {}",
                name,
                output.exit_code()
            );
            None
        }
        Err(FfmpegError::Spawn { source, .. }) => {
            tracing::info!("{} not found: {}", name, source);
            None
        }
        Err(FfmpegError::TimedOut { .. }) => {
            tracing::warn!(
                "{} -version did not answer within {}s",
                name,
                timeout.as_secs()
            );
            None
        }
        Err(e) => {
            tracing::warn!("Checking {} failed: {}", name, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_executable_is_unavailable() {
        assert!(!is_available(
            "/nonexistent/path/to/ffmpeg",
            Duration::from_secs(1)
        ));
        assert_eq!(
            version_line("/nonexistent/path/to/ffmpeg", Duration::from_secs(1)),
            None
        );
    }

    #[cfg(unix)]
    mod with_fake_tool {
        use super::*;
        use crate::test_support::{FakeBehavior, FakeFfmpeg};

        #[test]
        fn working_executable_is_available() {
            let fake = FakeFfmpeg::install(FakeBehavior::Concat);
            assert!(is_available(fake.program(), Duration::from_secs(5)));

            let version = version_line(fake.program(), Duration::from_secs(5)).unwrap();
            assert!(version.starts_with("ffmpeg version"));
        }

        #[test]
        fn failing_executable_is_unavailable() {
            let fake = FakeFfmpeg::install(FakeBehavior::Fail("broken build"));
            assert!(!is_available(fake.program(), Duration::from_secs(5)));
        }

        #[test]
        fn hanging_executable_is_unavailable() {
            let fake = FakeFfmpeg::install(FakeBehavior::Hang);
            assert!(!is_available(fake.program(), Duration::from_millis(300)));
        }
    }
}
