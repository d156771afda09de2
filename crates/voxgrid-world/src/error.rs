use std::path::PathBuf;

use thiserror::Error;
use voxgrid_geom::IVec3;

/// Invalid or unreadable world configuration. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid world configuration: {0}")]
    Invalid(String),
}

/// A coordinate or index that falls outside the world or a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BoundsError {
    #[error("world position ({}, {}, {}) is outside the world", pos.x, pos.y, pos.z)]
    OutsideWorld { pos: IVec3 },
    #[error("chunk index {index} out of range ({count} chunks)")]
    ChunkIndex { index: usize, count: usize },
    #[error("voxel index {index} out of range ({count} voxels per chunk)")]
    VoxelIndex { index: usize, count: usize },
}
