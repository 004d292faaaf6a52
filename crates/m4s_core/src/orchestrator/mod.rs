//! Pipeline orchestrator for merge and mux jobs.
//!
//! Each call runs a short pipeline of steps chosen from the shape of its
//! input. Steps validate, execute, and record their results in a shared
//! [`JobState`].
//!
//! # Architecture
//!
//! ```text
//! SegmentProcessor::process
//!     ├── no segments        → NoInput
//!     ├── video only         → Pipeline[Merge video]
//!     ├── audio only         → Pipeline[Merge audio]
//!     └── video + audio      → Workspace
//!                                 └── Pipeline[Merge video, Merge audio, Mux]
//! ```
//!
//! # Example
//!
//! ```ignore
//! use m4s_core::orchestrator::{Context, JobState, MergeStep, MuxStep, Pipeline};
//!
//! let pipeline = Pipeline::new()
//!     .with_step(MergeStep::intermediate(MediaKind::Video, work_dir))
//!     .with_step(MergeStep::intermediate(MediaKind::Audio, work_dir))
//!     .with_step(MuxStep::new());
//!
//! let ctx = Context::new(tool, settings, job, "process_all", logger);
//! let mut state = JobState::new("job-123");
//! pipeline.run(&ctx, &mut state)?;
//! println!("Output: {:?}", state.final_output);
//! ```

mod errors;
mod pipeline;
mod processor;
mod step;
pub mod steps;
mod types;
mod workspace;

pub use errors::{ErrorKind, PipelineError, PipelineResult, StepError, StepResult};
pub use pipeline::{Pipeline, RunReport};
pub use processor::SegmentProcessor;
pub use step::PipelineStep;
pub use steps::{MergeStep, MuxStep};
pub use types::{Context, JobState, ProgressCallback, StageOutput, StepOutcome};
pub use workspace::Workspace;
