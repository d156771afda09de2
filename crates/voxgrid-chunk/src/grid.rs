use voxgrid_world::{BoundsError, ChunkId, VoxelAddress, World};

use crate::voxel::Voxel;

/// Detached voxel storage for every chunk of a world, in chunk-index order.
///
/// Used as the scratch target of a load so a failed decode never touches live
/// chunks, and as the transfer format between engines and the registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoxelGrid {
    chunk_voxel_count: usize,
    chunks: Vec<Vec<Voxel>>,
}

impl VoxelGrid {
    /// An all-air grid shaped for `world`.
    pub fn new(world: &World) -> Self {
        let n = world.chunk_voxel_count();
        Self {
            chunk_voxel_count: n,
            chunks: (0..world.chunk_count()).map(|_| vec![Voxel::AIR; n]).collect(),
        }
    }

    #[inline]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    #[inline]
    pub fn chunk_voxel_count(&self) -> usize {
        self.chunk_voxel_count
    }

    pub fn chunk(&self, id: ChunkId) -> Result<&[Voxel], BoundsError> {
        let count = self.chunks.len();
        self.chunks
            .get(id.0)
            .map(Vec::as_slice)
            .ok_or(BoundsError::ChunkIndex { index: id.0, count })
    }

    pub fn chunk_mut(&mut self, id: ChunkId) -> Result<&mut [Voxel], BoundsError> {
        let count = self.chunks.len();
        self.chunks
            .get_mut(id.0)
            .map(Vec::as_mut_slice)
            .ok_or(BoundsError::ChunkIndex { index: id.0, count })
    }

    pub fn get(&self, addr: VoxelAddress) -> Result<Voxel, BoundsError> {
        let count = self.chunk_voxel_count;
        self.chunk(addr.chunk)?
            .get(addr.voxel)
            .copied()
            .ok_or(BoundsError::VoxelIndex {
                index: addr.voxel,
                count,
            })
    }

    pub fn set(&mut self, addr: VoxelAddress, v: Voxel) -> Result<(), BoundsError> {
        let count = self.chunk_voxel_count;
        let slot = self
            .chunk_mut(addr.chunk)?
            .get_mut(addr.voxel)
            .ok_or(BoundsError::VoxelIndex {
                index: addr.voxel,
                count,
            })?;
        *slot = v;
        Ok(())
    }

    /// Chunks in index order.
    pub fn iter(&self) -> impl Iterator<Item = (ChunkId, &[Voxel])> + '_ {
        self.chunks
            .iter()
            .enumerate()
            .map(|(i, c)| (ChunkId(i), c.as_slice()))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ChunkId, &mut [Voxel])> + '_ {
        self.chunks
            .iter_mut()
            .enumerate()
            .map(|(i, c)| (ChunkId(i), c.as_mut_slice()))
    }

    pub(crate) fn into_chunks(self) -> Vec<Vec<Voxel>> {
        self.chunks
    }
}
