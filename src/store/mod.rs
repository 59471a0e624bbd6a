pub mod backend;
pub mod state;

pub use backend::{FileBackend, MemoryBackend, SlotBackend};
pub use state::{AppData, SharedStateStore, Slot, StateStore, PLAN_KEY};

use std::path::Path;
use std::sync::Arc;

/// Open and load the file-backed store in `data_dir`
pub fn open(data_dir: impl AsRef<Path>) -> SharedStateStore {
    let backend = Arc::new(FileBackend::new(data_dir.as_ref()));
    let store = Arc::new(StateStore::new(backend));
    store.load();
    store
}
