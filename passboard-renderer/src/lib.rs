//! # passboard-renderer
//!
//! Renders the persisted dataset as HTML cards and splices them into the
//! listing region of the target document.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use passboard_core::{Record, RegionMarker};
//! use passboard_renderer::Renderer;
//!
//! fn refresh(document: &str, records: &[Record]) -> Option<String> {
//!     let renderer = Renderer::new(RegionMarker::default()).ok()?;
//!     renderer.render_document(document, records).ok()
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod region;

pub use context::ListingContext;
pub use engine::{Renderer, TemplateEngine, LISTING_TEMPLATE};
pub use error::RenderError;
pub use region::{locate_region, replace_region, Region};
