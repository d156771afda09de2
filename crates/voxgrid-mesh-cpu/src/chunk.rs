use voxgrid_geom::{Aabb, IVec3};
use voxgrid_world::ChunkId;

use crate::mesh_build::MeshBuild;

/// Finished geometry of one chunk. Vertex positions are chunk-local; `origin`
/// places them in the world.
#[derive(Clone, Debug)]
pub struct ChunkMeshCPU {
    pub id: ChunkId,
    pub origin: IVec3,
    pub bbox: Aabb,
    pub mesh: MeshBuild,
}

impl ChunkMeshCPU {
    #[inline]
    pub fn face_count(&self) -> usize {
        self.mesh.face_count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mesh.is_empty()
    }
}
