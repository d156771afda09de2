//! CPU face-culling mesher for voxel chunks.
#![forbid(unsafe_code)]

mod chunk;
mod emit;
pub mod face;
mod mesh_build;
mod neighbors;

pub use chunk::ChunkMeshCPU;
pub use emit::{build_chunk_mesh, build_chunk_mesh_into};
pub use mesh_build::MeshBuild;
pub use neighbors::NeighborVoxels;
