//! Record store over the remote issue tracker
//!
//! Holds the most recent listing in a watch channel so views can observe
//! it, and performs every remote read and write the SDK makes.

mod record_store;
mod state;

pub use record_store::RecordStore;
pub use state::StoreState;
