pub mod entry;
pub mod store;

pub use entry::ClipboardEntry;
pub use store::{HistoryStore, InsertOutcome, PinUpdate, StoreError};
