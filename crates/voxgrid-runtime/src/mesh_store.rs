use hashbrown::HashMap;
use voxgrid_mesh_cpu::ChunkMeshCPU;
use voxgrid_world::ChunkId;

/// Latest finished mesh per chunk.
#[derive(Debug, Default)]
pub struct MeshStore {
    meshes: HashMap<ChunkId, ChunkMeshCPU>,
}

impl MeshStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `mesh`, returning the one it replaces.
    pub fn insert(&mut self, mesh: ChunkMeshCPU) -> Option<ChunkMeshCPU> {
        self.meshes.insert(mesh.id, mesh)
    }

    pub fn get(&self, id: ChunkId) -> Option<&ChunkMeshCPU> {
        self.meshes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChunkMeshCPU> + '_ {
        self.meshes.values()
    }

    pub fn total_faces(&self) -> usize {
        self.meshes.values().map(ChunkMeshCPU::face_count).sum()
    }
}
