use voxgrid_geom::IVec3;
use voxgrid_world::{BoundsError, ChunkId, Direction, VoxelAddress, World};

use crate::grid::VoxelGrid;
use crate::state::ChunkState;
use crate::voxel::Voxel;

/// One chunk record: dense storage, origin, neighbor links and lifecycle.
#[derive(Clone, Debug)]
pub struct Chunk {
    id: ChunkId,
    origin: IVec3,
    neighbors: [Option<ChunkId>; 6],
    voxels: Vec<Voxel>,
    state: ChunkState,
    rev: u64,
}

impl Chunk {
    #[inline]
    pub fn id(&self) -> ChunkId {
        self.id
    }

    #[inline]
    pub fn origin(&self) -> IVec3 {
        self.origin
    }

    /// Neighbor ids in back/front/top/bottom/left/right order.
    #[inline]
    pub fn neighbors(&self) -> &[Option<ChunkId>; 6] {
        &self.neighbors
    }

    #[inline]
    pub fn neighbor(&self, dir: Direction) -> Option<ChunkId> {
        self.neighbors[dir.index()]
    }

    #[inline]
    pub fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

    #[inline]
    pub fn voxel(&self, index: usize) -> Option<Voxel> {
        self.voxels.get(index).copied()
    }

    #[inline]
    pub fn state(&self) -> ChunkState {
        self.state
    }

    /// Revision of the chunk's mesh inputs; bumped by every storage write and
    /// every dirty mark.
    #[inline]
    pub fn rev(&self) -> u64 {
        self.rev
    }

    pub fn has_solid(&self) -> bool {
        self.voxels.iter().any(|v| v.is_solid())
    }
}

/// Per-chunk data for an external distance-based activation check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkVisibility {
    pub id: ChunkId,
    pub origin: IVec3,
    pub state: ChunkState,
}

/// Counts returned by [`ChunkRegistry::install_grid`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InstallSummary {
    /// Chunks that went `Created -> Loaded`.
    pub loaded: usize,
    /// Live chunks that went to `Dirty` for a rebuild.
    pub dirtied: usize,
}

/// Owns every chunk of a world. Chunks are allocated up front and never removed.
#[derive(Debug)]
pub struct ChunkRegistry {
    chunks: Vec<Chunk>,
    chunk_voxel_count: usize,
}

impl ChunkRegistry {
    /// Allocates all-air storage for every chunk and resolves neighbor links.
    pub fn new(world: &World) -> Self {
        let n = world.chunk_voxel_count();
        let chunks = world
            .chunk_origins()
            .iter()
            .enumerate()
            .map(|(i, &origin)| Chunk {
                id: ChunkId(i),
                origin,
                neighbors: world.chunk_neighbor_ids(origin),
                voxels: vec![Voxel::AIR; n],
                state: ChunkState::Created,
                rev: 0,
            })
            .collect::<Vec<_>>();
        log::debug!("allocated {} chunks of {} voxels", chunks.len(), n);
        Self {
            chunks,
            chunk_voxel_count: n,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    #[inline]
    pub fn chunk_voxel_count(&self) -> usize {
        self.chunk_voxel_count
    }

    #[inline]
    pub fn get(&self, id: ChunkId) -> Option<&Chunk> {
        self.chunks.get(id.0)
    }

    pub fn chunk(&self, id: ChunkId) -> Result<&Chunk, BoundsError> {
        self.chunks.get(id.0).ok_or(BoundsError::ChunkIndex {
            index: id.0,
            count: self.chunks.len(),
        })
    }

    fn chunk_mut(&mut self, id: ChunkId) -> Result<&mut Chunk, BoundsError> {
        let count = self.chunks.len();
        self.chunks.get_mut(id.0).ok_or(BoundsError::ChunkIndex {
            index: id.0,
            count,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chunk> + '_ {
        self.chunks.iter()
    }

    pub fn voxel(&self, addr: VoxelAddress) -> Result<Voxel, BoundsError> {
        let chunk = self.chunk(addr.chunk)?;
        chunk.voxel(addr.voxel).ok_or(BoundsError::VoxelIndex {
            index: addr.voxel,
            count: self.chunk_voxel_count,
        })
    }

    /// Reads the voxel at a world position; `None` outside the world.
    pub fn voxel_at(&self, world: &World, p: IVec3) -> Option<Voxel> {
        let addr = world.locate(p).ok()?;
        self.voxel(addr).ok()
    }

    /// Writes one voxel and bumps the chunk revision. Does not touch the lifecycle.
    /// Returns the previous value.
    pub fn write_voxel(&mut self, addr: VoxelAddress, v: Voxel) -> Result<Voxel, BoundsError> {
        let count = self.chunk_voxel_count;
        let chunk = self.chunk_mut(addr.chunk)?;
        let slot = chunk
            .voxels
            .get_mut(addr.voxel)
            .ok_or(BoundsError::VoxelIndex {
                index: addr.voxel,
                count,
            })?;
        let prev = std::mem::replace(slot, v);
        chunk.rev = chunk.rev.wrapping_add(1);
        Ok(prev)
    }

    /// Storage of the six neighbors in back/front/top/bottom/left/right order.
    /// A neighbor outside the world, or one whose storage was never populated,
    /// is `None`.
    pub fn neighbor_voxels(&self, id: ChunkId) -> [Option<&[Voxel]>; 6] {
        let mut out: [Option<&[Voxel]>; 6] = [None; 6];
        let Some(chunk) = self.get(id) else {
            return out;
        };
        for (slot, n) in out.iter_mut().zip(chunk.neighbors.iter()) {
            *slot = n
                .and_then(|nid| self.get(nid))
                .filter(|c| c.state.is_live())
                .map(Chunk::voxels);
        }
        out
    }

    // --- lifecycle ---

    pub fn mark_loaded(&mut self, id: ChunkId) -> Result<bool, BoundsError> {
        Ok(self.chunk_mut(id)?.state.loaded())
    }

    /// Marks the chunk's mesh inputs as changed. Always bumps the revision so an
    /// in-flight build of the old inputs is recognized as stale.
    pub fn mark_dirty(&mut self, id: ChunkId) -> Result<bool, BoundsError> {
        let chunk = self.chunk_mut(id)?;
        chunk.rev = chunk.rev.wrapping_add(1);
        Ok(chunk.state.dirtied())
    }

    pub fn mark_meshed(&mut self, id: ChunkId) -> Result<bool, BoundsError> {
        Ok(self.chunk_mut(id)?.state.meshed())
    }

    /// Moves every `Created` chunk to `Loaded`. Returns how many moved.
    pub fn mark_all_created_loaded(&mut self) -> usize {
        self.chunks
            .iter_mut()
            .filter(|c| c.state == ChunkState::Created)
            .map(|c| c.state.loaded())
            .filter(|ok| *ok)
            .count()
    }

    /// Schedules a freshly loaded world for its first mesh.
    pub fn mark_all_loaded_dirty(&mut self) -> usize {
        self.chunks
            .iter_mut()
            .filter(|c| c.state == ChunkState::Loaded)
            .map(|c| c.state.dirtied())
            .filter(|ok| *ok)
            .count()
    }

    /// Dirty chunk ids in ascending order.
    pub fn dirty_ids(&self) -> Vec<ChunkId> {
        self.chunks
            .iter()
            .filter(|c| c.state.is_dirty())
            .map(|c| c.id)
            .collect()
    }

    pub fn count_in_state(&self, state: ChunkState) -> usize {
        self.chunks.iter().filter(|c| c.state == state).count()
    }

    pub fn visibility(&self) -> impl Iterator<Item = ChunkVisibility> + '_ {
        self.chunks.iter().map(|c| ChunkVisibility {
            id: c.id,
            origin: c.origin,
            state: c.state,
        })
    }

    /// True when every voxel of the chunk's bottom layer is solid.
    pub fn is_bottom_solid(&self, world: &World, id: ChunkId) -> bool {
        self.get(id).is_some_and(|c| {
            world
                .bottom_voxel_indices()
                .iter()
                .all(|&i| c.voxels.get(i).is_some_and(|v| v.is_solid()))
        })
    }

    // --- bulk storage ---

    /// Copies all storage out into a detached grid.
    pub fn snapshot(&self, world: &World) -> VoxelGrid {
        let mut grid = VoxelGrid::new(world);
        for ((_, dst), chunk) in grid.iter_mut().zip(self.chunks.iter()) {
            dst.copy_from_slice(&chunk.voxels);
        }
        grid
    }

    /// Replaces all storage with `grid`. `Created` chunks become `Loaded`; live
    /// chunks become `Dirty` so their geometry is rebuilt.
    pub fn install_grid(&mut self, grid: VoxelGrid) -> Result<InstallSummary, BoundsError> {
        if grid.chunk_count() != self.chunks.len() {
            return Err(BoundsError::ChunkIndex {
                index: grid.chunk_count(),
                count: self.chunks.len(),
            });
        }
        if grid.chunk_voxel_count() != self.chunk_voxel_count {
            return Err(BoundsError::VoxelIndex {
                index: grid.chunk_voxel_count(),
                count: self.chunk_voxel_count,
            });
        }
        let mut summary = InstallSummary::default();
        for (chunk, voxels) in self.chunks.iter_mut().zip(grid.into_chunks()) {
            chunk.voxels = voxels;
            chunk.rev = chunk.rev.wrapping_add(1);
            if chunk.state == ChunkState::Created {
                if chunk.state.loaded() {
                    summary.loaded += 1;
                }
            } else if chunk.state.is_live() && chunk.state.dirtied() {
                summary.dirtied += 1;
            }
        }
        Ok(summary)
    }
}
