//! Template context for the listing template.

use serde::{Deserialize, Serialize};

use passboard_core::types::Record;

use crate::error::RenderError;

/// Rendering payload for `listing.html`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingContext {
    pub cards: Vec<CardCtx>,
    pub count: usize,
}

/// One card in the listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardCtx {
    /// 1-based display position.
    pub position: usize,
    pub name: String,
    pub secret: String,
    pub effective_date: String,
}

impl ListingContext {
    /// Build a [`ListingContext`] from records, keeping their order.
    pub fn from_records(records: &[Record]) -> Self {
        let cards: Vec<CardCtx> = records
            .iter()
            .enumerate()
            .map(|(i, r)| CardCtx {
                position: i + 1,
                name: r.name.clone(),
                secret: r.secret.clone(),
                effective_date: r.effective_date.clone(),
            })
            .collect();
        let count = cards.len();
        ListingContext { cards, count }
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}
