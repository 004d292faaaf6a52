//! M4S Core - Backend logic for M4S Merge
//!
//! This crate merges ordered media segments (for example the `.m4s`
//! chunks a DASH download leaves behind) into single files and muxes a
//! video stream with an audio stream, driving an external `ffmpeg`
//! executable. It contains no UI code and can be used by a GUI or a CLI.
//!
//! The entry point is [`orchestrator::SegmentProcessor`]; every call is
//! blocking and returns either one output path or one classified
//! [`orchestrator::PipelineError`].

pub mod config;
pub mod ffmpeg;
pub mod logging;
pub mod models;
pub mod orchestrator;

#[cfg(all(test, unix))]
pub(crate) mod test_support;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
