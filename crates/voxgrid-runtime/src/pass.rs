use rayon::prelude::*;
use voxgrid_chunk::ChunkRegistry;
use voxgrid_mesh_cpu::{ChunkMeshCPU, NeighborVoxels, build_chunk_mesh};
use voxgrid_world::{BoundsError, World};

use crate::mesh_store::MeshStore;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MeshPassStats {
    pub built: usize,
    pub faces: usize,
}

/// Meshes every dirty chunk in parallel against a shared registry borrow, then
/// stores the results and moves each chunk to `MeshReady` on this thread.
pub fn mesh_pass(
    world: &World,
    registry: &mut ChunkRegistry,
    store: &mut MeshStore,
) -> Result<MeshPassStats, BoundsError> {
    let dirty = registry.dirty_ids();
    if dirty.is_empty() {
        return Ok(MeshPassStats::default());
    }
    let shared: &ChunkRegistry = registry;
    let built: Vec<ChunkMeshCPU> = dirty
        .par_iter()
        .map(|&id| {
            let chunk = shared.chunk(id)?;
            let neighbors = NeighborVoxels::new(shared.neighbor_voxels(id));
            Ok(build_chunk_mesh(world, id, chunk.voxels(), &neighbors))
        })
        .collect::<Result<_, BoundsError>>()?;

    let mut stats = MeshPassStats::default();
    for mesh in built {
        registry.mark_meshed(mesh.id)?;
        stats.built += 1;
        stats.faces += mesh.face_count();
        store.insert(mesh);
    }
    log::debug!(
        target: "mesh",
        "mesh pass built {} chunks, {} faces",
        stats.built,
        stats.faces
    );
    Ok(stats)
}
