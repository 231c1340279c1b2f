//! Pipeline orchestration for mg-migration.
//!
//! # Overview
//!
//! - [`PipelineOrchestrator`] is the run state machine: a fixed stage list,
//!   one bookkeeping artifact per stage, an append-only completed list.
//! - [`MigrationDriver`] binds real work to the stages: conversion through a
//!   [`Converter`], tool checks through [`ToolRunner`], validation through
//!   [`ArtifactValidator`](mg_validate::ArtifactValidator), and hand-off to a
//!   [`ChangeSubmitter`].
//!
//! Everything is synchronous. External commands block the calling thread up
//! to the configured timeout.

#![deny(clippy::all)]
#![warn(missing_docs)]

mod converter;
mod driver;
mod error;
mod orchestrator;
mod tools;
mod vcs;

pub use converter::{CommandConverter, Conversion, Converter, SOURCE_PATH_ENV, TEST_MARKER};
pub use driver::{
    ConversionRecord, ConversionStatus, DriverReport, MigrationDriver, STAGED_ARTIFACT_STAGE,
    STAGED_DIR, staged_header,
};
pub use error::PipelineError;
pub use orchestrator::{PipelineOrchestrator, STAGE_ARTIFACT_SUFFIX, render_stage_artifact};
pub use tools::{DEFAULT_TIMEOUT, ToolOutcome, ToolReport, ToolRunner};
pub use vcs::{ChangeSubmitter, Submission};
