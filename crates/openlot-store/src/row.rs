//! Versioned rows for optimistic concurrency.

/// A stored row paired with its version counter.
///
/// Versions start at 1 and increase by one on every committed update. A
/// writer reads a row, prepares its change, and commits with the version it
/// read; the store rejects the commit with `VersionConflict` if another
/// writer got there first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedRow<T> {
    pub version: u64,
    pub row: T,
}

impl<T> VersionedRow<T> {
    /// Wrap a freshly inserted row at version 1.
    #[must_use]
    pub fn new(row: T) -> Self {
        Self { version: 1, row }
    }

    /// Discard the version and keep the row.
    #[must_use]
    pub fn into_row(self) -> T {
        self.row
    }
}
