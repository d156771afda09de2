//! Chunk storage, lifecycle state and the registry that owns every chunk.
#![forbid(unsafe_code)]

mod grid;
mod registry;
mod state;
mod voxel;

pub use grid::VoxelGrid;
pub use registry::{Chunk, ChunkRegistry, ChunkVisibility, InstallSummary};
pub use state::ChunkState;
pub use voxel::Voxel;
