//! Job values for merge, mux and combined processing.

use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::media::{MediaKind, MediaSegment, OUTPUT_EXTENSION};

/// Stem used for auto-generated mux output names.
pub const MUX_NAME_STEM: &str = "Muxed_Output";

/// Resolve an output file name.
///
/// An explicit name is used as given. Otherwise the name is
/// `<stem>_<YYYYMMDD_HHMMSS>.mp4` for the given local time.
pub fn output_file_name(explicit: Option<&str>, stem: &str, at: DateTime<Local>) -> String {
    match explicit {
        Some(name) => name.to_string(),
        None => format!(
            "{}_{}.{}",
            stem,
            at.format("%Y%m%d_%H%M%S"),
            OUTPUT_EXTENSION
        ),
    }
}

/// Concatenate one kind of segments into a single file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeJob {
    /// Which stream the segments belong to.
    pub kind: MediaKind,
    /// Segments in concatenation order.
    pub segments: Vec<MediaSegment>,
    /// Directory for the merged file (created if absent).
    pub output_dir: PathBuf,
    /// Output file name; auto-generated when `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_name: Option<String>,
}

impl MergeJob {
    pub fn new<I, P>(kind: MediaKind, paths: I, output_dir: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            kind,
            segments: MediaSegment::sequence(paths),
            output_dir: output_dir.into(),
            output_name: None,
        }
    }

    /// Set an explicit output file name.
    pub fn with_output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }
}

/// Combine one video file and one audio file into one container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MuxJob {
    /// Complete video input (never a segment list).
    pub video: PathBuf,
    /// Complete audio input (never a segment list).
    pub audio: PathBuf,
    /// Directory for the muxed file (created if absent).
    pub output_dir: PathBuf,
    /// Output file name; auto-generated when `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_name: Option<String>,
}

impl MuxJob {
    pub fn new(
        video: impl Into<PathBuf>,
        audio: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            video: video.into(),
            audio: audio.into(),
            output_dir: output_dir.into(),
            output_name: None,
        }
    }

    /// Set an explicit output file name.
    pub fn with_output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }
}

/// Which inputs a [`ProcessJob`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputShape {
    /// Neither video nor audio segments.
    Empty,
    VideoOnly,
    AudioOnly,
    /// Both kinds: merge each side, then mux.
    Combined,
}

/// Everything a pipeline call works from.
///
/// `output_name` names the call's final file: the merge output for
/// single-kind input, the mux output for combined input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessJob {
    #[serde(default)]
    pub video_segments: Vec<MediaSegment>,
    #[serde(default)]
    pub audio_segments: Vec<MediaSegment>,
    pub output_dir: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_name: Option<String>,
}

impl ProcessJob {
    pub fn new<V, A, P, Q>(video: V, audio: A, output_dir: impl Into<PathBuf>) -> Self
    where
        V: IntoIterator<Item = P>,
        A: IntoIterator<Item = Q>,
        P: Into<PathBuf>,
        Q: Into<PathBuf>,
    {
        Self {
            video_segments: MediaSegment::sequence(video),
            audio_segments: MediaSegment::sequence(audio),
            output_dir: output_dir.into(),
            output_name: None,
        }
    }

    /// A job with no segments, for calls whose inputs are complete files.
    pub fn without_segments(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    /// Set an explicit output file name.
    pub fn with_output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    pub fn shape(&self) -> InputShape {
        match (
            self.video_segments.is_empty(),
            self.audio_segments.is_empty(),
        ) {
            (true, true) => InputShape::Empty,
            (false, true) => InputShape::VideoOnly,
            (true, false) => InputShape::AudioOnly,
            (false, false) => InputShape::Combined,
        }
    }

    /// Segments of the given kind, in concatenation order.
    pub fn segments(&self, kind: MediaKind) -> &[MediaSegment] {
        match kind {
            MediaKind::Video => &self.video_segments,
            MediaKind::Audio => &self.audio_segments,
        }
    }

    /// Final output path for the given name stem, resolved now.
    pub fn output_path(&self, stem: &str) -> PathBuf {
        self.output_dir.join(output_file_name(
            self.output_name.as_deref(),
            stem,
            Local::now(),
        ))
    }
}

impl From<MergeJob> for ProcessJob {
    fn from(job: MergeJob) -> Self {
        let (video_segments, audio_segments) = match job.kind {
            MediaKind::Video => (job.segments, Vec::new()),
            MediaKind::Audio => (Vec::new(), job.segments),
        };
        Self {
            video_segments,
            audio_segments,
            output_dir: job.output_dir,
            output_name: job.output_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn explicit_name_wins() {
        let name = output_file_name(Some("final.mp4"), "Merged_Video", Local::now());
        assert_eq!(name, "final.mp4");
    }

    #[test]
    fn generated_name_uses_stem_and_second_timestamp() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(
            output_file_name(None, MUX_NAME_STEM, at),
            "Muxed_Output_20240309_070501.mp4"
        );
        assert_eq!(
            output_file_name(None, MediaKind::Audio.name_stem(), at),
            "Merged_Audio_20240309_070501.mp4"
        );
    }

    #[test]
    fn shape_follows_inputs() {
        let none: [&str; 0] = [];
        assert_eq!(ProcessJob::new(none, none, "out").shape(), InputShape::Empty);
        assert_eq!(
            ProcessJob::new(["v.m4s"], none, "out").shape(),
            InputShape::VideoOnly
        );
        assert_eq!(
            ProcessJob::new(none, ["a.m4s"], "out").shape(),
            InputShape::AudioOnly
        );
        assert_eq!(
            ProcessJob::new(["v.m4s"], ["a.m4s"], "out").shape(),
            InputShape::Combined
        );
    }

    #[test]
    fn merge_job_converts_to_single_kind_process_job() {
        let job = MergeJob::new(MediaKind::Audio, ["1.m4s", "2.m4s"], "out")
            .with_output_name("a.mp4");
        let process: ProcessJob = job.into();

        assert_eq!(process.shape(), InputShape::AudioOnly);
        assert_eq!(process.segments(MediaKind::Audio).len(), 2);
        assert_eq!(process.output_name.as_deref(), Some("a.mp4"));
    }

    #[test]
    fn process_job_serializes() {
        let job = ProcessJob::new(["v.m4s"], ["a.m4s"], "out");
        let json = serde_json::to_string(&job).unwrap();
        assert!(json.contains("\"video_segments\""));
        assert!(!json.contains("output_name"));
    }
}
