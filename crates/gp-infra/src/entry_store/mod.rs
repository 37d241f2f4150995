//! Config entry store adapters.

mod file_store;
mod in_memory;

pub use file_store::{FileConfigEntryStore, DEFAULT_ENTRIES_FILE};
pub use in_memory::InMemoryConfigEntryStore;
