use voxgrid_chunk::Voxel;
use voxgrid_world::Direction;

/// Borrowed storage of the six neighbor chunks, in back/front/top/bottom/left/right
/// order. `None` means the neighbor is outside the world or not yet populated.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeighborVoxels<'a> {
    slots: [Option<&'a [Voxel]>; 6],
}

impl<'a> NeighborVoxels<'a> {
    #[inline]
    pub const fn new(slots: [Option<&'a [Voxel]>; 6]) -> Self {
        Self { slots }
    }

    /// No neighbor storage available on any side.
    #[inline]
    pub const fn empty() -> Self {
        Self { slots: [None; 6] }
    }

    #[inline]
    pub fn get(&self, dir: Direction) -> Option<&'a [Voxel]> {
        self.slots[dir.index()]
    }

    #[inline]
    pub fn with(mut self, dir: Direction, voxels: &'a [Voxel]) -> Self {
        self.slots[dir.index()] = Some(voxels);
        self
    }
}
