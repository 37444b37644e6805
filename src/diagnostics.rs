//! Dropped-field diagnostics
//!
//! Normalization is best effort: inputs that cannot be resolved or converted are
//! left out of the outbound record. A [`DropObserver`] makes those omissions
//! visible without changing the output.

use std::sync::atomic::{AtomicU64, Ordering};

/// Why an input did not make it into a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// No relation for the field (or alias) in the model
    Unresolved,
    /// The value could not be converted with the relation's data type
    ConversionFailed,
    /// A nested field has no matching sub-relation
    UnmatchedSubField,
    /// Every nested object of a complex value came out empty
    EmptyComplexValue,
}

/// Details of one omitted input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedField {
    pub model: String,
    pub field: String,
    pub reason: DropReason,
}

/// Receives every omitted input during normalization
pub trait DropObserver: Send + Sync {
    fn on_drop(&self, dropped: &DroppedField);
}

/// Observer that tallies omitted inputs by reason
#[derive(Debug, Default)]
pub struct DropCounter {
    unresolved: AtomicU64,
    conversion_failed: AtomicU64,
    unmatched_sub_field: AtomicU64,
    empty_complex_value: AtomicU64,
}

impl DropCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, reason: DropReason) -> u64 {
        self.slot(reason).load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        [
            DropReason::Unresolved,
            DropReason::ConversionFailed,
            DropReason::UnmatchedSubField,
            DropReason::EmptyComplexValue,
        ]
        .into_iter()
        .map(|r| self.count(r))
        .sum()
    }

    fn slot(&self, reason: DropReason) -> &AtomicU64 {
        match reason {
            DropReason::Unresolved => &self.unresolved,
            DropReason::ConversionFailed => &self.conversion_failed,
            DropReason::UnmatchedSubField => &self.unmatched_sub_field,
            DropReason::EmptyComplexValue => &self.empty_complex_value,
        }
    }
}

impl DropObserver for DropCounter {
    fn on_drop(&self, dropped: &DroppedField) {
        self.slot(dropped.reason).fetch_add(1, Ordering::Relaxed);
    }
}

impl<F> DropObserver for F
where
    F: Fn(&DroppedField) + Send + Sync,
{
    fn on_drop(&self, dropped: &DroppedField) {
        self(dropped)
    }
}
