//! # passboard-sync
//!
//! Reconciliation and publish pipeline.
//!
//! Call [`pipeline::run_once`] for a single configured cycle, or build an
//! [`Orchestrator`] around any [`Extractor`] and call
//! [`Orchestrator::cycle`].

pub mod diff;
pub mod drift;
pub mod error;
pub mod extract;
pub mod orchestrator;
pub mod pipeline;
pub mod publish;
pub mod reconcile;
pub mod writer;

pub use error::{ExtractError, SyncError};
pub use extract::{CommandExtractor, Extractor};
pub use orchestrator::{CycleOutcome, Orchestrator};
pub use publish::{publish, BackupOutcome, PublishMode, PublishReceipt, PublishTarget};
pub use reconcile::{reconcile, Reconciliation};
pub use writer::WriteResult;
