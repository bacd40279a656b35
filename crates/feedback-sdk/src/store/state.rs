use serde::Serialize;

use crate::model::{Record, RecordFilter};

/// Observable snapshot of the record store
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreState {
    /// Last successful listing, in listing order
    pub records: Vec<Record>,
    /// Filter the listing was made with
    pub filter: RecordFilter,
    pub loading: bool,
    /// Message of the last failed listing, cleared on success
    pub error: Option<String>,
}

impl StoreState {
    pub fn record(&self, number: u64) -> Option<&Record> {
        self.records.iter().find(|r| r.number == number)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
