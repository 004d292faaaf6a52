//! Fake ffmpeg executable for exercising the pipeline without a real install.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use tempfile::TempDir;

use crate::ffmpeg::FfmpegTool;

const FAKE_VERSION: &str = "ffmpeg version 6.1-fake Copyright (c) 2000-2023 the FFmpeg developers";

/// How the fake executable responds.
#[derive(Debug, Clone, Copy)]
pub enum FakeBehavior {
    /// Concatenate inputs into the output (manifest order for concat mode).
    Concat,
    /// Print the message to stderr and exit 1, for every invocation.
    Fail(&'static str),
    /// Exit 0 without writing anything.
    NoOutput,
    /// Never finish.
    Hang,
}

/// A shell script standing in for ffmpeg, plus the record of its invocations.
pub struct FakeFfmpeg {
    dir: TempDir,
    program: PathBuf,
}

impl FakeFfmpeg {
    pub fn install(behavior: FakeBehavior) -> Self {
        let dir = TempDir::new().unwrap();
        let program = dir.path().join("ffmpeg");
        let script = format!(
            "#!/bin/sh\nSTATE='{}'\n[ \"$1\" = \"-fake-ready\" ] && exit 0\nprintf '%s\\n' \"$*\" >> \"$STATE/invocations.log\"\n{}",
            dir.path().display(),
            body(behavior)
        );
        fs::write(&program, script).unwrap();
        fs::set_permissions(&program, fs::Permissions::from_mode(0o755)).unwrap();
        wait_until_executable(&program);
        Self { dir, program }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn tool(&self) -> FfmpegTool {
        FfmpegTool::new(&self.program)
    }

    /// Argument lines of every recorded invocation, oldest first.
    pub fn invocations(&self) -> Vec<String> {
        fs::read_to_string(self.dir.path().join("invocations.log"))
            .map(|text| text.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Copy of the manifest the most recent concat invocation read.
    pub fn last_manifest(&self) -> Option<String> {
        fs::read_to_string(self.dir.path().join("last_manifest.txt")).ok()
    }
}

/// Write named segment files with the given contents.
pub fn write_segments(dir: &Path, segments: &[(&str, &[u8])]) -> Vec<PathBuf> {
    fs::create_dir_all(dir).unwrap();
    segments
        .iter()
        .map(|(name, data)| {
            let path = dir.join(name);
            fs::write(&path, data).unwrap();
            path
        })
        .collect()
}

fn body(behavior: FakeBehavior) -> String {
    let version = format!(
        "if [ \"$1\" = \"-version\" ]; then echo '{}'; exit 0; fi\n",
        FAKE_VERSION
    );
    match behavior {
        FakeBehavior::Concat => format!("{}{}", version, CONCAT_BODY),
        FakeBehavior::Fail(message) => format!("echo '{}' >&2\nexit 1\n", message),
        FakeBehavior::NoOutput => format!("{}echo 'fake: nothing written' >&2\nexit 0\n", version),
        FakeBehavior::Hang => "exec sleep 30\n".to_string(),
    }
}

const CONCAT_BODY: &str = r#"out=""
prev=""
concat=0
: > "$STATE/inputs"
for arg in "$@"; do
  if [ "$prev" = "-f" ] && [ "$arg" = "concat" ]; then concat=1; fi
  if [ "$prev" = "-i" ]; then printf '%s\n' "$arg" >> "$STATE/inputs"; fi
  prev="$arg"
  out="$arg"
done
: > "$out.fake" || exit 1
if [ "$concat" -eq 1 ]; then
  manifest=$(head -n 1 "$STATE/inputs")
  cp "$manifest" "$STATE/last_manifest.txt"
  while IFS= read -r line; do
    case "$line" in
      file*) eval "set -- $line"; cat "$2" >> "$out.fake" || exit 1 ;;
    esac
  done < "$manifest"
else
  while IFS= read -r input; do
    cat "$input" >> "$out.fake" || exit 1
  done < "$STATE/inputs"
fi
mv "$out.fake" "$out"
echo "fake: wrote $out" >&2
exit 0
"#;

/// Retry until the freshly written script can be exec'd (ETXTBSY while
/// another test thread's fork still holds the write handle).
fn wait_until_executable(program: &Path) {
    const ETXTBSY: i32 = 26;
    for _ in 0..100 {
        match Command::new(program).arg("-fake-ready").status() {
            Ok(_) => return,
            Err(e) if e.raw_os_error() == Some(ETXTBSY) => {
                std::thread::sleep(Duration::from_millis(10))
            }
            Err(e) => panic!("fake ffmpeg not executable: {}", e),
        }
    }
    panic!("fake ffmpeg stayed busy");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_invocations() {
        let fake = FakeFfmpeg::install(FakeBehavior::NoOutput);
        let status = Command::new(fake.program())
            .args(["-hide_banner", "-version"])
            .status()
            .unwrap();
        assert!(status.success());
        assert_eq!(fake.invocations(), vec!["-hide_banner -version".to_string()]);
    }
}
