use std::fmt::Display;

use serde::Serialize;

/// Stable identifier of an input row.
///
/// Assigned once when the input is loaded (the zero-based position of the
/// data row) and never changed afterwards. It is the only key used to join
/// API results back onto the original rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RowId(usize);

impl RowId {
    /// Create a row id from a row position
    #[must_use]
    pub const fn new(position: usize) -> Self {
        Self(position)
    }

    /// The row position
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }
}

impl From<usize> for RowId {
    fn from(position: usize) -> Self {
        Self(position)
    }
}

impl Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An address waiting to be resolved
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AddressRecord {
    /// Row this address was composed from
    pub row_id: RowId,
    /// Single-line address as sent to the API
    pub address: String,
    /// Two-letter CLDR region code, e.g. `US`
    pub region_code: String,
}

impl AddressRecord {
    /// Create a new record
    pub fn new<A: Into<String>, R: Into<String>>(row_id: RowId, address: A, region_code: R) -> Self {
        Self {
            row_id,
            address: address.into(),
            region_code: region_code.into(),
        }
    }

    /// Records with a blank address are never sent to the API
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.address.trim().is_empty()
    }
}

impl Display for AddressRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {} ({})", self.row_id, self.address, self.region_code)
    }
}
