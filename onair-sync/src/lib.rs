//! Turns the broadcast schedule into reminder tasks.
//!
//! [`Pipeline`] drives one run; [`format`] and [`reconcile`] are the pure
//! pieces it is built from.
pub mod format;
pub mod pipeline;
pub mod reconcile;

pub use pipeline::{Pipeline, PipelineError, PipelineSettings, RunOutcome, RunReport, RunState};
pub use reconcile::{ExistingTaskDigest, Reconciled, Reconciler};
