//! Summary of a batch run.

#[cfg(feature = "serde")]
use serde::Serialize;

/// Counts reported by [`export_batch`](crate::export_batch).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct BatchReport {
    /// Files written to the live tree.
    pub generated: usize,
    /// Records that could not be resolved or exported.
    pub skipped: usize,
    /// Pre-existing files moved into the archive tree.
    pub archived: usize,
    /// Pre-existing files whose archiving failed.
    pub archive_failures: usize,
    /// Distinct transformation groups among the exported records.
    pub groups: usize,
}
