//! Voxel edit requests and their synchronous application to the registry.
#![forbid(unsafe_code)]

use voxgrid_chunk::{ChunkRegistry, Voxel};
use voxgrid_geom::IVec3;
use voxgrid_world::{BoundsError, ChunkId, Direction, VoxelAddress, World};

/// One resolved voxel write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EditRequest {
    pub pos: IVec3,
    pub addr: VoxelAddress,
    pub voxel: Voxel,
}

/// Result of draining an [`EditQueue`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditOutcome {
    /// Requests written to storage.
    pub applied: usize,
    /// Applied requests whose stored id was already the requested one.
    pub unchanged: usize,
    /// Chunks marked for a rebuild, ascending and unique.
    pub dirtied: Vec<ChunkId>,
}

/// FIFO of pending edits. Requests are bounds-checked on entry; nothing touches
/// storage until [`EditQueue::apply`].
#[derive(Debug, Default)]
pub struct EditQueue {
    pending: Vec<EditRequest>,
}

impl EditQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a solid voxel (id 1) at `p`.
    pub fn request_add_voxel(
        &mut self,
        world: &World,
        p: IVec3,
    ) -> Result<VoxelAddress, BoundsError> {
        self.request_add_voxel_with(world, p, Voxel::SOLID)
    }

    /// Queues `voxel` at `p`.
    pub fn request_add_voxel_with(
        &mut self,
        world: &World,
        p: IVec3,
        voxel: Voxel,
    ) -> Result<VoxelAddress, BoundsError> {
        self.push(world, p, voxel)
    }

    /// Queues air at `p`.
    pub fn request_remove_voxel(
        &mut self,
        world: &World,
        p: IVec3,
    ) -> Result<VoxelAddress, BoundsError> {
        self.push(world, p, Voxel::AIR)
    }

    fn push(&mut self, world: &World, p: IVec3, voxel: Voxel) -> Result<VoxelAddress, BoundsError> {
        let addr = world.locate(p).inspect_err(|e| {
            log::warn!(target: "edit", "rejected edit: {e}");
        })?;
        self.pending.push(EditRequest {
            pos: p,
            addr,
            voxel,
        });
        Ok(addr)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending(&self) -> &[EditRequest] {
        &self.pending
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Drains the queue in request order. Every write dirties its chunk, plus any
    /// linked neighbor whose shared face the voxel lies on.
    ///
    /// Every address is checked against `registry` first; on error nothing is
    /// written and the queue is left as it was.
    pub fn apply(
        &mut self,
        world: &World,
        registry: &mut ChunkRegistry,
    ) -> Result<EditOutcome, BoundsError> {
        for req in &self.pending {
            registry.voxel(req.addr)?;
        }
        let mut out = EditOutcome::default();
        for req in self.pending.drain(..) {
            let prev = registry.write_voxel(req.addr, req.voxel)?;
            out.applied += 1;
            if prev == req.voxel {
                out.unchanged += 1;
            }
            for id in affected_chunks(world, registry, req.addr)? {
                if registry.mark_dirty(id)? {
                    out.dirtied.push(id);
                } else {
                    log::debug!(target: "edit", "chunk {} not live, left as is", id.0);
                }
            }
            log::debug!(
                target: "edit",
                "set ({}, {}, {}) to {}",
                req.pos.x,
                req.pos.y,
                req.pos.z,
                req.voxel.id()
            );
        }
        out.dirtied.sort_unstable();
        out.dirtied.dedup();
        if out.applied > 0 {
            log::info!(
                target: "edit",
                "applied {} edits ({} unchanged), {} chunks dirty",
                out.applied,
                out.unchanged,
                out.dirtied.len()
            );
        }
        Ok(out)
    }
}

/// The chunk owning `addr` followed by every linked neighbor across a face the
/// voxel touches.
pub fn affected_chunks(
    world: &World,
    registry: &ChunkRegistry,
    addr: VoxelAddress,
) -> Result<Vec<ChunkId>, BoundsError> {
    let chunk = registry.chunk(addr.chunk)?;
    let lp = world.local_pos_from_voxel_index(addr.voxel);
    let mut out = vec![addr.chunk];
    if world.is_chunk_edge(lp) {
        out.extend(
            Direction::ALL
                .into_iter()
                .filter(|d| world.is_on_chunk_face(lp, *d))
                .filter_map(|d| chunk.neighbor(d)),
        );
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxgrid_chunk::ChunkState;
    use voxgrid_world::WorldConfig;

    fn setup(size_xz: u32, size_y: u32, cxz: u32, cy: u32) -> (World, ChunkRegistry) {
        let w = World::new(WorldConfig::with_sizes(size_xz, size_y, cxz, cy)).unwrap();
        let mut reg = ChunkRegistry::new(&w);
        reg.mark_all_created_loaded();
        (w, reg)
    }

    #[test]
    fn out_of_bounds_requests_are_rejected() {
        let (w, _) = setup(1, 1, 2, 2);
        let mut q = EditQueue::new();
        assert_eq!(
            q.request_add_voxel(&w, IVec3::new(2, 0, 0)),
            Err(BoundsError::OutsideWorld {
                pos: IVec3::new(2, 0, 0)
            })
        );
        assert!(q.request_remove_voxel(&w, IVec3::new(0, -1, 0)).is_err());
        assert!(q.is_empty());
    }

    #[test]
    fn add_then_remove_dirties_owner() {
        let (w, mut reg) = setup(1, 1, 4, 4);
        let mut q = EditQueue::new();
        let addr = q.request_add_voxel(&w, IVec3::new(1, 1, 1)).unwrap();
        let out = q.apply(&w, &mut reg).unwrap();
        assert_eq!(out.applied, 1);
        assert_eq!(out.unchanged, 0);
        assert_eq!(out.dirtied, vec![ChunkId(0)]);
        assert_eq!(reg.voxel(addr).unwrap(), Voxel::SOLID);
        assert!(q.is_empty());

        reg.mark_meshed(ChunkId(0)).unwrap();
        q.request_remove_voxel(&w, IVec3::new(1, 1, 1)).unwrap();
        q.apply(&w, &mut reg).unwrap();
        assert_eq!(reg.voxel(addr).unwrap(), Voxel::AIR);
        assert_eq!(reg.chunk(ChunkId(0)).unwrap().state(), ChunkState::Dirty);
    }

    #[test]
    fn unchanged_write_still_dirties() {
        let (w, mut reg) = setup(1, 1, 2, 2);
        let mut q = EditQueue::new();
        q.request_remove_voxel(&w, IVec3::ZERO).unwrap();
        let out = q.apply(&w, &mut reg).unwrap();
        assert_eq!(out.applied, 1);
        assert_eq!(out.unchanged, 1);
        assert_eq!(out.dirtied, vec![ChunkId(0)]);
    }

    #[test]
    fn seam_edit_dirties_neighbor() {
        let (w, mut reg) = setup(2, 1, 2, 2);
        let mut q = EditQueue::new();
        // x = 1 is the right face of chunk 0, z = 1 its front face
        q.request_add_voxel_with(&w, IVec3::new(1, 0, 1), Voxel(9))
            .unwrap();
        let out = q.apply(&w, &mut reg).unwrap();
        assert_eq!(out.dirtied, vec![ChunkId(0), ChunkId(1), ChunkId(2)]);
        assert_eq!(reg.chunk(ChunkId(3)).unwrap().state(), ChunkState::Loaded);
    }

    #[test]
    fn edits_apply_in_order() {
        let (w, mut reg) = setup(1, 1, 2, 2);
        let mut q = EditQueue::new();
        let p = IVec3::new(1, 1, 0);
        q.request_add_voxel_with(&w, p, Voxel(4)).unwrap();
        q.request_add_voxel_with(&w, p, Voxel(5)).unwrap();
        assert_eq!(q.len(), 2);
        let out = q.apply(&w, &mut reg).unwrap();
        assert_eq!(out.applied, 2);
        assert_eq!(reg.voxel_at(&w, p), Some(Voxel(5)));
    }

    #[test]
    fn mismatched_registry_applies_nothing() {
        let (wide, _) = setup(2, 1, 2, 2);
        let (narrow, mut reg) = setup(1, 1, 2, 2);
        let mut q = EditQueue::new();
        q.request_add_voxel(&wide, IVec3::ZERO).unwrap();
        // chunk 1 exists in the wide world only
        q.request_add_voxel(&wide, IVec3::new(3, 0, 0)).unwrap();
        assert!(matches!(
            q.apply(&narrow, &mut reg),
            Err(BoundsError::ChunkIndex { index: 1, .. })
        ));
        assert_eq!(q.len(), 2);
        assert_eq!(reg.voxel_at(&narrow, IVec3::ZERO), Some(Voxel::AIR));
        assert_eq!(reg.chunk(ChunkId(0)).unwrap().state(), ChunkState::Loaded);
    }

    #[test]
    fn affected_chunks_follow_faces() {
        let (w, reg) = setup(3, 1, 4, 4);
        // center chunk of the 3x3 layer
        let interior = w.locate(IVec3::new(5, 1, 5)).unwrap();
        assert_eq!(affected_chunks(&w, &reg, interior).unwrap(), vec![ChunkId(4)]);
        let corner = w.locate(IVec3::new(4, 0, 4)).unwrap();
        let mut got = affected_chunks(&w, &reg, corner).unwrap();
        got.sort_unstable();
        // back (z-) and left (x-) neighbors; no chunk below
        assert_eq!(got, vec![ChunkId(1), ChunkId(3), ChunkId(4)]);
    }
}
