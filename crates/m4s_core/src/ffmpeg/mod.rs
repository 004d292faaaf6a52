//! FFmpeg executable wrapper.
//!
//! This module provides:
//! - Argument builders for concat and mux invocations
//! - Subprocess execution bounded by a wall-clock timeout
//! - Concat demuxer manifests that clean up after themselves
//! - A version probe to check the executable is usable
//!
//! # Example
//!
//! ```no_run
//! use m4s_core::ffmpeg::{ConcatManifest, FfmpegTool};
//! use std::path::Path;
//!
//! let tool = FfmpegTool::new("ffmpeg");
//! if tool.is_available() {
//!     let manifest = ConcatManifest::create(&["a.m4s", "b.m4s"], None).unwrap();
//!     let args = FfmpegTool::concat_args(manifest.path(), Path::new("out.mp4"));
//!     let output = tool.run(&args).unwrap();
//!     println!("exit code {}", output.exit_code());
//! }
//! ```

mod manifest;
mod probe;
mod runner;
mod tool;
mod types;

pub use manifest::{escape_path, manifest_line, parse_manifest, ConcatManifest};
pub use probe::{is_available, version_line};
pub use runner::{new_command, run_with_timeout};
pub use tool::{FfmpegTool, DEFAULT_PROBE_TIMEOUT, DEFAULT_PROGRAM, DEFAULT_TIMEOUT};
pub use types::{CommandOutput, FfmpegError, FfmpegResult};
