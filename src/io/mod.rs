pub mod config_io;
pub mod lock;
pub mod storage;

pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
