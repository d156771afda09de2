//! World persistence: engine plugin contract, the bundled flat engine and the
//! compressed save/load protocol with backup restore.
#![forbid(unsafe_code)]

mod engine;
mod error;
mod persist;

pub use engine::{EngineConfig, FLAT_MAGIC, FlatEngine, VoxelEngine};
pub use error::{DecodeError, PersistError};
pub use persist::{
    BACKUP_SUFFIX, SLOT_EXTENSION, backup_path, load, load_or_initialize, save, slot_path,
};
