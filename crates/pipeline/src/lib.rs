//! The daily-challenge production pipeline.
//!
//! [`selector`] finds an unused candidate game, [`curator`] turns its
//! screenshots into a difficulty ladder, [`transcode`] renders the
//! optional GIF loop, and [`orchestrator`] runs the whole chain and
//! owns the schedule. Media lands behind the [`store::MediaStore`]
//! abstraction so tests never touch a real media directory.

pub mod config;
pub mod curator;
pub mod error;
pub mod orchestrator;
pub mod selector;
pub mod store;
pub mod transcode;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use orchestrator::{BackfillOutcome, Orchestrator, ProduceOutcome};
