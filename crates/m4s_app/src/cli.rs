//! Command line definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use m4s_core::models::{MediaKind, MergeJob, MuxJob, ProcessJob};

use crate::worker::Action;

#[derive(Parser, Debug)]
#[command(
    name = "m4s-merge",
    version,
    about = "Merge .m4s segments and mux video with audio using ffmpeg"
)]
pub struct Cli {
    /// Settings file (default: <config dir>/m4s-merge/settings.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output directory (default: configured folder, then Desktop, then the current directory)
    #[arg(short, long, global = true, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Output file name (default: <Kind>_<YYYYMMDD_HHMMSS>.mp4)
    #[arg(short, long, global = true)]
    pub name: Option<String>,

    /// ffmpeg executable to use instead of the configured one
    #[arg(long, global = true, value_name = "PATH")]
    pub ffmpeg: Option<PathBuf>,

    /// Verbose output (debug log level, ffmpeg output shown)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Concatenate video segments, in the order given
    Video {
        #[arg(required = true)]
        segments: Vec<PathBuf>,
    },

    /// Concatenate audio segments, in the order given
    Audio {
        #[arg(required = true)]
        segments: Vec<PathBuf>,
    },

    /// Combine one video file and one audio file (audio re-encoded to AAC)
    Mux { video: PathBuf, audio: PathBuf },

    /// Merge video and audio segments and mux them into one file
    All {
        /// Video segments, in order
        #[arg(long, num_args = 1..)]
        video: Vec<PathBuf>,

        /// Audio segments, in order
        #[arg(long, num_args = 1..)]
        audio: Vec<PathBuf>,
    },

    /// Check that ffmpeg can be run and print its version
    Check,
}

impl Command {
    /// The job this command asks for, or `None` for commands that run no job.
    pub fn into_action(self, output_dir: PathBuf, name: Option<String>) -> Option<Action> {
        let action = match self {
            Command::Video { segments } => {
                Action::Video(with_name(MergeJob::new(MediaKind::Video, segments, output_dir), name))
            }
            Command::Audio { segments } => {
                Action::Audio(with_name(MergeJob::new(MediaKind::Audio, segments, output_dir), name))
            }
            Command::Mux { video, audio } => {
                let mut job = MuxJob::new(video, audio, output_dir);
                job.output_name = name;
                Action::Mux(job)
            }
            Command::All { video, audio } => {
                let mut job = ProcessJob::new(video, audio, output_dir);
                job.output_name = name;
                Action::All(job)
            }
            Command::Check => return None,
        };
        Some(action)
    }
}

fn with_name(mut job: MergeJob, name: Option<String>) -> MergeJob {
    job.output_name = name;
    job
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_video_segments_in_order() {
        let cli = Cli::try_parse_from(["m4s-merge", "video", "b.m4s", "a.m4s", "c.m4s"]).unwrap();
        let Command::Video { segments } = cli.command else {
            panic!("expected video command");
        };
        assert_eq!(
            segments,
            vec![
                PathBuf::from("b.m4s"),
                PathBuf::from("a.m4s"),
                PathBuf::from("c.m4s")
            ]
        );
    }

    #[test]
    fn video_requires_segments() {
        assert!(Cli::try_parse_from(["m4s-merge", "video"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "m4s-merge", "mux", "v.mp4", "a.mp4", "-o", "/out", "--name", "final.mp4", "-v",
        ])
        .unwrap();
        assert_eq!(cli.output, Some(PathBuf::from("/out")));
        assert_eq!(cli.name.as_deref(), Some("final.mp4"));
        assert!(cli.verbose);

        let Some(Action::Mux(job)) = cli.command.into_action("/out".into(), cli.name) else {
            panic!("expected mux action");
        };
        assert_eq!(job.video, PathBuf::from("v.mp4"));
        assert_eq!(job.audio, PathBuf::from("a.mp4"));
        assert_eq!(job.output_name.as_deref(), Some("final.mp4"));
    }

    #[test]
    fn all_collects_both_lists() {
        let cli = Cli::try_parse_from([
            "m4s-merge", "all", "--video", "v1.m4s", "v2.m4s", "--audio", "a1.m4s",
        ])
        .unwrap();
        let Some(Action::All(job)) = cli.command.into_action("/out".into(), None) else {
            panic!("expected all action");
        };
        assert_eq!(job.video_segments.len(), 2);
        assert_eq!(job.video_segments[1].path, PathBuf::from("v2.m4s"));
        assert_eq!(job.audio_segments.len(), 1);
        assert!(job.output_name.is_none());
    }

    #[test]
    fn all_accepts_no_segments() {
        let cli = Cli::try_parse_from(["m4s-merge", "all"]).unwrap();
        let Some(Action::All(job)) = cli.command.into_action("/out".into(), None) else {
            panic!("expected all action");
        };
        assert!(job.video_segments.is_empty() && job.audio_segments.is_empty());
    }

    #[test]
    fn check_runs_no_job() {
        let cli = Cli::try_parse_from(["m4s-merge", "check", "--ffmpeg", "/opt/ffmpeg"]).unwrap();
        assert_eq!(cli.ffmpeg, Some(PathBuf::from("/opt/ffmpeg")));
        assert!(cli.command.into_action("/out".into(), None).is_none());
    }
}
