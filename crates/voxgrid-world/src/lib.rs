//! World sizing, derived constants and the spatial index.
#![forbid(unsafe_code)]

mod chunk_coord;
pub mod config;
mod direction;
mod error;
mod world;

pub use chunk_coord::ChunkCoord;
pub use config::WorldConfig;
pub use direction::Direction;
pub use error::{BoundsError, ConfigError};
pub use world::{ChunkId, VoxelAddress, World, WorldDims};
