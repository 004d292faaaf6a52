//! Media kinds and ordered segment sequences.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Container extension for every file the core writes.
pub const OUTPUT_EXTENSION: &str = "mp4";

/// The kind of stream a list of segments belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    /// Stem used for auto-generated merge output names.
    pub fn name_stem(&self) -> &'static str {
        match self {
            MediaKind::Video => "Merged_Video",
            MediaKind::Audio => "Merged_Audio",
        }
    }

    /// Fixed file name for the merged stream inside a workspace.
    pub fn intermediate_name(&self) -> &'static str {
        match self {
            MediaKind::Video => "temp_video.mp4",
            MediaKind::Audio => "temp_audio.mp4",
        }
    }

    /// Lowercase label for logs and step names.
    pub fn label(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One file holding a contiguous slice of a larger stream.
///
/// `index` is the segment's position in playback order. Sequences are
/// never sorted or deduplicated; the order given is the order written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSegment {
    /// Path to the segment file.
    pub path: PathBuf,
    /// Zero-based position in the concatenation order.
    pub index: usize,
}

impl MediaSegment {
    /// Create a segment at the given position.
    pub fn new(path: impl Into<PathBuf>, index: usize) -> Self {
        Self {
            path: path.into(),
            index,
        }
    }

    /// Number a list of paths in the order given.
    pub fn sequence<I, P>(paths: I) -> Vec<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        paths
            .into_iter()
            .enumerate()
            .map(|(index, path)| Self::new(path, index))
            .collect()
    }

    /// Whether the segment file exists on disk.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl AsRef<Path> for MediaSegment {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}
