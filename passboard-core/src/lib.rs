//! passboard core library: domain types, record store, watermark, config.
//!
//! - [`atomic`]: staged tmp-file-and-rename writes
//! - [`types`]: [`Record`], [`RawRecord`], [`ChangeReport`], [`PriorityOrder`]
//! - [`store`]: [`RecordStore`] load / save / snapshot slot
//! - [`watermark`]: snapshot freshness
//! - [`config`]: `passboard.yaml` and its resolved form
//! - [`error`]: [`StoreError`], [`ConfigError`]

pub mod atomic;
pub mod config;
pub mod error;
pub mod store;
pub mod types;
pub mod watermark;

pub use config::{Config, MaxAttempts, RegionMarker, ResolvedConfig};
pub use atomic::StagedFile;
pub use error::{ConfigError, StoreError, WriteError};
pub use store::{RecordStore, StoreLoad};
pub use types::{ChangeReport, PriorityOrder, RawRecord, Record, NOT_AVAILABLE};
pub use watermark::Watermark;
