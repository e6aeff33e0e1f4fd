//! Domain types for passboard datasets.
//!
//! A [`Record`] is what gets persisted and rendered. A [`RawRecord`] is what an
//! extractor yields before defaults are applied.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Sentinel used for fields an extractor could not read.
pub const NOT_AVAILABLE: &str = "N/A";

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One named entry with its secret and effective date.
///
/// Field order here is the on-disk field order of the record store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub secret: String,
    pub effective_date: String,
}

impl Record {
    pub fn new(
        name: impl Into<String>,
        secret: impl Into<String>,
        effective_date: impl Into<String>,
    ) -> Self {
        Record {
            name: name.into(),
            secret: secret.into(),
            effective_date: effective_date.into(),
        }
    }

    /// `true` when the name can act as a natural key: not blank and not the
    /// [`NOT_AVAILABLE`] placeholder.
    pub fn has_usable_name(&self) -> bool {
        is_usable_name(&self.name)
    }

    /// `true` when either compared field differs from `other`.
    pub fn differs_from(&self, other: &Record) -> bool {
        self.secret != other.secret || self.effective_date != other.effective_date
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.effective_date)
    }
}

/// Whether `name` is acceptable as a record key.
pub fn is_usable_name(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty() && trimmed != NOT_AVAILABLE
}

// ---------------------------------------------------------------------------
// RawRecord
// ---------------------------------------------------------------------------

/// A candidate record straight from an extractor. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default)]
    pub effective_date: Option<String>,
}

impl RawRecord {
    /// Convert to a [`Record`], trimming values and filling gaps with
    /// [`NOT_AVAILABLE`].
    pub fn into_record(self) -> Record {
        fn field(value: Option<String>) -> String {
            match value {
                Some(v) if !v.trim().is_empty() => v.trim().to_string(),
                _ => NOT_AVAILABLE.to_string(),
            }
        }
        Record {
            name: field(self.name),
            secret: field(self.secret),
            effective_date: field(self.effective_date),
        }
    }
}

impl From<Record> for RawRecord {
    fn from(r: Record) -> Self {
        RawRecord {
            name: Some(r.name),
            secret: Some(r.secret),
            effective_date: Some(r.effective_date),
        }
    }
}

// ---------------------------------------------------------------------------
// ChangeReport
// ---------------------------------------------------------------------------

/// Partition of the names seen in an incoming batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeReport {
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub unchanged: Vec<String>,
}

impl ChangeReport {
    pub fn added_count(&self) -> usize {
        self.added.len()
    }

    pub fn updated_count(&self) -> usize {
        self.updated.len()
    }

    pub fn unchanged_count(&self) -> usize {
        self.unchanged.len()
    }

    /// A publish is warranted only when something was added or updated.
    pub fn has_changes(&self) -> bool {
        self.added_count() + self.updated_count() > 0
    }
}

// ---------------------------------------------------------------------------
// PriorityOrder
// ---------------------------------------------------------------------------

/// Canonical display order of known record names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriorityOrder {
    names: Vec<String>,
    ranks: HashMap<String, usize>,
}

impl PriorityOrder {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut ranks = HashMap::with_capacity(names.len());
        for (index, name) in names.iter().enumerate() {
            // First occurrence wins if the configured list repeats a name.
            ranks.entry(name.clone()).or_insert(index);
        }
        PriorityOrder { names, ranks }
    }

    /// Sort position for `name`; unknown names share the rank after every
    /// known one.
    pub fn rank(&self, name: &str) -> usize {
        self.ranks.get(name).copied().unwrap_or(self.names.len())
    }

    /// Stable sort of `records` by rank. Records with equal rank keep their
    /// relative order.
    pub fn sort(&self, records: &mut [Record]) {
        records.sort_by_key(|r| self.rank(&r.name));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
