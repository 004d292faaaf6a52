//! Data models for merge and mux jobs.
//!
//! Job values are built at the moment a user action fires and are passed
//! by value into the orchestrator. They hold no identity beyond the call.

mod jobs;
mod media;

pub use jobs::{output_file_name, InputShape, MergeJob, MuxJob, ProcessJob, MUX_NAME_STEM};
pub use media::{MediaKind, MediaSegment, OUTPUT_EXTENSION};
