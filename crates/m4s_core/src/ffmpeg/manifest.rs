//! Concat demuxer manifests.
//!
//! One line per segment, `file '<path>'`, in concatenation order. Paths
//! are absolute with forward slashes. A literal `'` is written as `'\''`
//! (close quote, escaped quote, reopen quote), which is how the demuxer's
//! tokenizer expects quotes inside a quoted path.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::TempPath;

use super::types::{FfmpegError, FfmpegResult};

/// A manifest file on disk, removed when dropped or closed.
#[derive(Debug)]
pub struct ConcatManifest {
    path: TempPath,
    entries: usize,
}

impl ConcatManifest {
    /// Write a manifest for `segments`, in the order given.
    ///
    /// Fails with [`FfmpegError::InputNotFound`] on the first segment that
    /// does not exist; no file is left behind in that case. The manifest
    /// is created in `dir` when given, otherwise in the system temp dir.
    pub fn create<P: AsRef<Path>>(segments: &[P], dir: Option<&Path>) -> FfmpegResult<Self> {
        let mut body = String::new();
        for segment in segments {
            let segment = segment.as_ref();
            if !segment.exists() {
                return Err(FfmpegError::InputNotFound(segment.to_path_buf()));
            }
            let absolute = std::path::absolute(segment).map_err(FfmpegError::Manifest)?;
            body.push_str(&manifest_line(&absolute));
            body.push('\n');
        }

        let mut builder = tempfile::Builder::new();
        builder.prefix("concat_").suffix(".txt");
        let mut file = match dir {
            Some(dir) => {
                fs::create_dir_all(dir).map_err(FfmpegError::Manifest)?;
                builder.tempfile_in(dir)
            }
            None => builder.tempfile(),
        }
        .map_err(FfmpegError::Manifest)?;

        file.write_all(body.as_bytes())
            .and_then(|_| file.flush())
            .map_err(FfmpegError::Manifest)?;

        tracing::debug!(
            "Wrote concat manifest {} ({} entries)",
            file.path().display(),
            segments.len()
        );

        // Close our handle so the executable can open the file on any platform.
        Ok(Self {
            path: file.into_temp_path(),
            entries: segments.len(),
        })
    }

    /// Path to pass after `-i`.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of segment lines.
    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Delete the manifest, reporting any failure.
    pub fn close(self) -> io::Result<()> {
        self.path.close()
    }
}

/// Format one manifest line for an (already absolute) path.
pub fn manifest_line(path: &Path) -> String {
    format!("file '{}'", escape_path(path))
}

/// Normalize separators to `/` and escape single quotes.
pub fn escape_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace('\'', r"'\''")
}

/// Read the entries of a manifest back, in order.
///
/// Blank lines, `#` comments and non-`file` directives are ignored.
/// Quoting follows the demuxer: text inside `'...'` is literal, and a
/// backslash outside quotes escapes the next character.
pub fn parse_manifest(text: &str) -> Vec<PathBuf> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            let rest = line.strip_prefix("file")?;
            if !rest.starts_with(char::is_whitespace) {
                return None;
            }
            Some(PathBuf::from(unquote(rest.trim_start())))
        })
        .collect()
}

fn unquote(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    let mut quoted = false;

    while let Some(c) = chars.next() {
        match c {
            '\'' => quoted = !quoted,
            '\\' if !quoted => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            _ => out.push(c),
        }
    }

    out
}
