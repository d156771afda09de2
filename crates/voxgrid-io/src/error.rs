use std::io;
use std::path::PathBuf;

use thiserror::Error;
use voxgrid_world::BoundsError;

/// A persisted payload that does not describe this world.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("bad magic {found:?}")]
    BadMagic { found: [u8; 4] },
    #[error("{field} mismatch: world has {expected}, file has {found}")]
    DimensionMismatch {
        field: &'static str,
        expected: u32,
        found: u32,
    },
    #[error("payload ends early")]
    Truncated,
    #[error("payload has trailing bytes")]
    TrailingData,
    #[error("corrupt compressed stream: {0}")]
    Corrupt(#[source] io::Error),
}

impl DecodeError {
    /// Classifies a read failure inside the payload.
    pub fn from_read(e: io::Error) -> PersistError {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => DecodeError::Truncated.into(),
            io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput => {
                DecodeError::Corrupt(e).into()
            }
            _ => PersistError::Io(e),
        }
    }
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("no save at {}", .0.display())]
    NotFound(PathBuf),
    #[error("grid does not fit registry: {0}")]
    Bounds(#[from] BoundsError),
}
