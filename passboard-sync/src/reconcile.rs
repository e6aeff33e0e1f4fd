//! Merge an incoming batch into the persisted dataset.
//!
//! The persisted dataset is the baseline and is never shrunk. Each usable
//! incoming name is classified exactly once:
//!
//! | baseline has name | fields equal | bucket      | effect              |
//! |-------------------|--------------|-------------|---------------------|
//! | no                | -            | `added`     | appended            |
//! | yes               | no           | `updated`   | replaced in place   |
//! | yes               | yes          | `unchanged` | baseline kept       |
//!
//! The merged list is then stably sorted by [`PriorityOrder`].

use std::collections::HashMap;

use passboard_core::types::{ChangeReport, PriorityOrder, Record};

/// Result of [`reconcile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub merged: Vec<Record>,
    pub report: ChangeReport,
}

/// Merge `incoming` into `persisted`.
///
/// Records with a blank or `"N/A"` name are dropped. If a name repeats within
/// `incoming`, the last occurrence supplies the fields and the name is
/// reported once, at its first position. Pure: the maps below are lookups
/// only and never drive output order.
pub fn reconcile(incoming: &[Record], persisted: &[Record], priority: &PriorityOrder) -> Reconciliation {
    let mut batch: Vec<&Record> = Vec::with_capacity(incoming.len());
    let mut batch_index: HashMap<&str, usize> = HashMap::with_capacity(incoming.len());
    for record in incoming.iter().filter(|r| r.has_usable_name()) {
        match batch_index.get(record.name.as_str()) {
            Some(&i) => batch[i] = record,
            None => {
                batch_index.insert(record.name.as_str(), batch.len());
                batch.push(record);
            }
        }
    }

    let mut merged: Vec<Record> = persisted.to_vec();
    let mut merged_index: HashMap<String, usize> = merged
        .iter()
        .enumerate()
        .map(|(i, r)| (r.name.clone(), i))
        .collect();
    let mut report = ChangeReport::default();

    for record in batch {
        match merged_index.get(&record.name) {
            Some(&i) if merged[i].differs_from(record) => {
                merged[i] = record.clone();
                report.updated.push(record.name.clone());
            }
            Some(_) => report.unchanged.push(record.name.clone()),
            None => {
                merged_index.insert(record.name.clone(), merged.len());
                merged.push(record.clone());
                report.added.push(record.name.clone());
            }
        }
    }

    priority.sort(&mut merged);
    Reconciliation { merged, report }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
