use voxgrid_geom::IVec3;

use crate::chunk_coord::ChunkCoord;
use crate::config::WorldConfig;
use crate::direction::Direction;
use crate::error::{BoundsError, ConfigError};

/// Index of a chunk in the flat, world-covering chunk array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId(pub usize);

impl ChunkId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Chunk and in-chunk voxel index of one world position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VoxelAddress {
    pub chunk: ChunkId,
    pub voxel: usize,
}

/// Constants derived from a [`WorldConfig`]. Computing them again from the same
/// config yields the same values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldDims {
    pub size_xz: i32,
    pub size_y: i32,
    pub chunk_size_xz: i32,
    pub chunk_size_y: i32,
    /// World extent in voxels along X and Z.
    pub bounds_xz: i32,
    /// World extent in voxels along Y.
    pub bounds_y: i32,
    pub chunk_count: usize,
    pub chunk_voxel_count: usize,
    /// `chunk_size_xz * chunk_size_y`, the Z stride of voxel indexing.
    pub chunk_size_magic: i32,
    /// `size_xz * size_y`, the Z stride of chunk indexing.
    pub world_size_magic: i32,
    /// View distances in voxels.
    pub view_distance_xz: i32,
    pub view_distance_y: i32,
}

impl WorldDims {
    pub fn from_config(cfg: &WorldConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let size_xz = cfg.size_xz as i32;
        let size_y = cfg.size_y as i32;
        let chunk_size_xz = cfg.chunk_size_xz as i32;
        let chunk_size_y = cfg.chunk_size_y as i32;
        Ok(Self {
            size_xz,
            size_y,
            chunk_size_xz,
            chunk_size_y,
            bounds_xz: size_xz * chunk_size_xz,
            bounds_y: size_y * chunk_size_y,
            chunk_count: (size_xz as usize) * (size_xz as usize) * (size_y as usize),
            chunk_voxel_count: (chunk_size_xz as usize)
                * (chunk_size_xz as usize)
                * (chunk_size_y as usize),
            chunk_size_magic: chunk_size_xz * chunk_size_y,
            world_size_magic: size_xz * size_y,
            view_distance_xz: cfg.view_distance_xz as i32 * chunk_size_xz,
            view_distance_y: cfg.view_distance_y as i32 * chunk_size_y,
        })
    }
}

/// The world context: configuration, derived constants and the lookup tables
/// built once at initialization. Every component takes it by reference.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    dims: WorldDims,
    chunk_origins: Vec<IVec3>,
    chunk_neighbor_offsets: [IVec3; 6],
    voxel_neighbor_offsets: [IVec3; 6],
    voxel_positions: Vec<IVec3>,
    edge_voxel_positions: Vec<IVec3>,
    bottom_voxel_indices: Vec<usize>,
}

impl World {
    pub fn new(config: WorldConfig) -> Result<Self, ConfigError> {
        let dims = WorldDims::from_config(&config)?;
        let mut world = Self {
            config,
            dims,
            chunk_origins: Vec::with_capacity(dims.chunk_count),
            chunk_neighbor_offsets: [IVec3::ZERO; 6],
            voxel_neighbor_offsets: Direction::ALL.map(Direction::unit_offset),
            voxel_positions: Vec::with_capacity(dims.chunk_voxel_count),
            edge_voxel_positions: Vec::new(),
            bottom_voxel_indices: Vec::new(),
        };
        world.populate_chunk_origins();
        world.populate_chunk_neighbor_offsets();
        world.populate_voxel_positions();
        world.populate_edge_voxels();
        world.populate_bottom_indices();
        log::info!(
            "world initialized: {}x{}x{} chunks of {}x{}x{} voxels ({} chunks)",
            dims.size_xz,
            dims.size_y,
            dims.size_xz,
            dims.chunk_size_xz,
            dims.chunk_size_y,
            dims.chunk_size_xz,
            dims.chunk_count
        );
        Ok(world)
    }

    fn populate_chunk_origins(&mut self) {
        let d = self.dims;
        for z in 0..d.size_xz {
            for y in 0..d.size_y {
                for x in 0..d.size_xz {
                    self.chunk_origins.push(IVec3::new(
                        x * d.chunk_size_xz,
                        y * d.chunk_size_y,
                        z * d.chunk_size_xz,
                    ));
                }
            }
        }
    }

    fn populate_chunk_neighbor_offsets(&mut self) {
        let d = self.dims;
        for dir in Direction::ALL {
            let u = dir.unit_offset();
            self.chunk_neighbor_offsets[dir.index()] = IVec3::new(
                u.x * d.chunk_size_xz,
                u.y * d.chunk_size_y,
                u.z * d.chunk_size_xz,
            );
        }
    }

    fn populate_voxel_positions(&mut self) {
        let d = self.dims;
        for z in 0..d.chunk_size_xz {
            for y in 0..d.chunk_size_y {
                for x in 0..d.chunk_size_xz {
                    self.voxel_positions.push(IVec3::new(x, y, z));
                }
            }
        }
    }

    fn populate_edge_voxels(&mut self) {
        let edges: Vec<IVec3> = self
            .voxel_positions
            .iter()
            .copied()
            .filter(|p| self.is_chunk_edge(*p))
            .collect();
        self.edge_voxel_positions = edges;
    }

    fn populate_bottom_indices(&mut self) {
        let d = self.dims;
        let mut out = Vec::with_capacity((d.chunk_size_xz * d.chunk_size_xz) as usize);
        for z in 0..d.chunk_size_xz {
            for x in 0..d.chunk_size_xz {
                out.push(self.voxel_index_from_local_pos(IVec3::new(x, 0, z)));
            }
        }
        self.bottom_voxel_indices = out;
    }

    // --- accessors ---

    #[inline]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    #[inline]
    pub fn dims(&self) -> &WorldDims {
        &self.dims
    }

    #[inline]
    pub fn chunk_count(&self) -> usize {
        self.dims.chunk_count
    }

    #[inline]
    pub fn chunk_voxel_count(&self) -> usize {
        self.dims.chunk_voxel_count
    }

    #[inline]
    pub fn surface_material_count(&self) -> usize {
        self.config.surface_materials.len()
    }

    /// World extent in voxels as `(xz, y)`.
    #[inline]
    pub fn bounds(&self) -> IVec3 {
        IVec3::new(self.dims.bounds_xz, self.dims.bounds_y, self.dims.bounds_xz)
    }

    #[inline]
    pub fn view_distance_xz_voxels(&self) -> i32 {
        self.dims.view_distance_xz
    }

    #[inline]
    pub fn view_distance_y_voxels(&self) -> i32 {
        self.dims.view_distance_y
    }

    /// Origins of every chunk; entry `i` is the origin of chunk index `i`.
    #[inline]
    pub fn chunk_origins(&self) -> &[IVec3] {
        &self.chunk_origins
    }

    #[inline]
    pub fn chunk_origin(&self, id: ChunkId) -> IVec3 {
        self.chunk_origins[id.0]
    }

    #[inline]
    pub fn chunk_neighbor_offset(&self, dir: Direction) -> IVec3 {
        self.chunk_neighbor_offsets[dir.index()]
    }

    #[inline]
    pub fn chunk_neighbor_offsets(&self) -> &[IVec3; 6] {
        &self.chunk_neighbor_offsets
    }

    /// Unit voxel steps in back/front/top/bottom/left/right order.
    #[inline]
    pub fn voxel_neighbor_offsets(&self) -> &[IVec3; 6] {
        &self.voxel_neighbor_offsets
    }

    #[inline]
    pub fn voxel_neighbor_offset(&self, dir: Direction) -> IVec3 {
        self.voxel_neighbor_offsets[dir.index()]
    }

    /// Chunk-local positions in storage order.
    #[inline]
    pub fn voxel_positions(&self) -> &[IVec3] {
        &self.voxel_positions
    }

    /// Chunk-local positions lying on any face of a chunk.
    #[inline]
    pub fn edge_voxel_positions(&self) -> &[IVec3] {
        &self.edge_voxel_positions
    }

    /// Voxel indices of the chunk's lowest layer.
    #[inline]
    pub fn bottom_voxel_indices(&self) -> &[usize] {
        &self.bottom_voxel_indices
    }

    // --- spatial index ---

    /// Chunk index containing `p`. `p` must be inside the world.
    #[inline]
    pub fn chunk_index_from_world_pos(&self, p: IVec3) -> usize {
        debug_assert!(!self.is_outside_world(p), "position {p:?} outside world");
        let d = &self.dims;
        ((p.z / d.chunk_size_xz) * d.world_size_magic
            + (p.y / d.chunk_size_y) * d.size_xz
            + (p.x / d.chunk_size_xz)) as usize
    }

    #[inline]
    pub fn local_voxel_pos(&self, p: IVec3) -> IVec3 {
        let d = &self.dims;
        IVec3::new(
            p.x % d.chunk_size_xz,
            p.y % d.chunk_size_y,
            p.z % d.chunk_size_xz,
        )
    }

    #[inline]
    pub fn voxel_index_from_local_pos(&self, lp: IVec3) -> usize {
        let d = &self.dims;
        (lp.z * d.chunk_size_magic + lp.y * d.chunk_size_xz + lp.x) as usize
    }

    #[inline]
    pub fn local_pos_from_voxel_index(&self, index: usize) -> IVec3 {
        let d = &self.dims;
        let mut i = index as i32;
        let z = i / d.chunk_size_magic;
        i -= z * d.chunk_size_magic;
        let y = i / d.chunk_size_xz;
        let x = i % d.chunk_size_xz;
        IVec3::new(x, y, z)
    }

    #[inline]
    pub fn voxel_index_from_world_pos(&self, p: IVec3) -> usize {
        self.voxel_index_from_local_pos(self.local_voxel_pos(p))
    }

    #[inline]
    pub fn is_outside_chunk(&self, lp: IVec3) -> bool {
        let d = &self.dims;
        lp.x < 0
            || lp.x > d.chunk_size_xz - 1
            || lp.y < 0
            || lp.y > d.chunk_size_y - 1
            || lp.z < 0
            || lp.z > d.chunk_size_xz - 1
    }

    #[inline]
    pub fn is_outside_world(&self, p: IVec3) -> bool {
        let d = &self.dims;
        p.x < 0
            || p.x > d.bounds_xz - 1
            || p.y < 0
            || p.y > d.bounds_y - 1
            || p.z < 0
            || p.z > d.bounds_xz - 1
    }

    /// True when `lp` lies on the first or last layer of any axis.
    #[inline]
    pub fn is_chunk_edge(&self, lp: IVec3) -> bool {
        let d = &self.dims;
        lp.x == 0
            || lp.x == d.chunk_size_xz - 1
            || lp.y == 0
            || lp.y == d.chunk_size_y - 1
            || lp.z == 0
            || lp.z == d.chunk_size_xz - 1
    }

    /// True when `lp` lies on the chunk face pointing in `dir`.
    #[inline]
    pub fn is_on_chunk_face(&self, lp: IVec3, dir: Direction) -> bool {
        let d = &self.dims;
        match dir {
            Direction::Back => lp.z == 0,
            Direction::Front => lp.z == d.chunk_size_xz - 1,
            Direction::Top => lp.y == d.chunk_size_y - 1,
            Direction::Bottom => lp.y == 0,
            Direction::Left => lp.x == 0,
            Direction::Right => lp.x == d.chunk_size_xz - 1,
        }
    }

    /// Bounds-checked resolution of a world position.
    pub fn locate(&self, p: IVec3) -> Result<VoxelAddress, BoundsError> {
        if self.is_outside_world(p) {
            return Err(BoundsError::OutsideWorld { pos: p });
        }
        Ok(VoxelAddress {
            chunk: ChunkId(self.chunk_index_from_world_pos(p)),
            voxel: self.voxel_index_from_world_pos(p),
        })
    }

    /// World position of a voxel given its chunk and storage index.
    #[inline]
    pub fn world_pos_of(&self, chunk: ChunkId, voxel: usize) -> IVec3 {
        self.chunk_origin(chunk) + self.local_pos_from_voxel_index(voxel)
    }

    #[inline]
    pub fn chunk_coord(&self, id: ChunkId) -> ChunkCoord {
        let o = self.chunk_origin(id);
        ChunkCoord::new(
            o.x / self.dims.chunk_size_xz,
            o.y / self.dims.chunk_size_y,
            o.z / self.dims.chunk_size_xz,
        )
    }

    /// Chunk id at a chunk coordinate, `None` outside the world.
    pub fn chunk_id_at(&self, coord: ChunkCoord) -> Option<ChunkId> {
        let d = &self.dims;
        let origin = IVec3::new(
            coord.cx.checked_mul(d.chunk_size_xz)?,
            coord.cy.checked_mul(d.chunk_size_y)?,
            coord.cz.checked_mul(d.chunk_size_xz)?,
        );
        if self.is_outside_world(origin) {
            return None;
        }
        Some(ChunkId(self.chunk_index_from_world_pos(origin)))
    }

    /// Neighbor chunk ids of the chunk at `origin` in back/front/top/bottom/left/right
    /// order; `None` where the neighbor would lie outside the world.
    pub fn chunk_neighbor_ids(&self, origin: IVec3) -> [Option<ChunkId>; 6] {
        let mut out = [None; 6];
        for dir in Direction::ALL {
            let p = origin + self.chunk_neighbor_offset(dir);
            if !self.is_outside_world(p) {
                out[dir.index()] = Some(ChunkId(self.chunk_index_from_world_pos(p)));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world(size_xz: u32, size_y: u32, cxz: u32, cy: u32) -> World {
        World::new(WorldConfig::with_sizes(size_xz, size_y, cxz, cy)).unwrap()
    }

    #[test]
    fn derived_constants() {
        let w = world(3, 2, 4, 5);
        let d = w.dims();
        assert_eq!(d.chunk_count, 18);
        assert_eq!(d.bounds_xz, 12);
        assert_eq!(d.bounds_y, 10);
        assert_eq!(d.chunk_voxel_count, 80);
        assert_eq!(d.chunk_size_magic, 20);
        assert_eq!(d.world_size_magic, 6);
        assert_eq!(d.view_distance_xz, 12 * 4);
        assert_eq!(d.view_distance_y, 8 * 5);
        assert_eq!(w.view_distance_xz_voxels(), 48);
        assert_eq!(w.view_distance_y_voxels(), 40);
        assert_eq!(WorldDims::from_config(w.config()).unwrap(), *d);
    }

    #[test]
    fn chunk_index_formula() {
        let w = world(3, 2, 4, 5);
        // z chunk 2, y chunk 1, x chunk 1 -> 2*6 + 1*3 + 1
        assert_eq!(w.chunk_index_from_world_pos(IVec3::new(5, 7, 9)), 16);
        assert_eq!(w.local_voxel_pos(IVec3::new(5, 7, 9)), IVec3::new(1, 2, 1));
        assert_eq!(w.voxel_index_from_world_pos(IVec3::new(5, 7, 9)), 20 + 2 * 4 + 1);
    }

    #[test]
    fn x_is_fastest_axis() {
        let w = world(1, 1, 4, 3);
        assert_eq!(w.voxel_index_from_local_pos(IVec3::new(1, 0, 0)), 1);
        assert_eq!(w.voxel_index_from_local_pos(IVec3::new(0, 1, 0)), 4);
        assert_eq!(w.voxel_index_from_local_pos(IVec3::new(0, 0, 1)), 12);
    }

    #[test]
    fn neighbor_offsets_are_scaled_in_fixed_order() {
        let w = world(2, 2, 4, 3);
        assert_eq!(
            *w.chunk_neighbor_offsets(),
            [
                IVec3::new(0, 0, -4),
                IVec3::new(0, 0, 4),
                IVec3::new(0, 3, 0),
                IVec3::new(0, -3, 0),
                IVec3::new(-4, 0, 0),
                IVec3::new(4, 0, 0),
            ]
        );
        assert_eq!(
            *w.voxel_neighbor_offsets(),
            [
                IVec3::new(0, 0, -1),
                IVec3::new(0, 0, 1),
                IVec3::new(0, 1, 0),
                IVec3::new(0, -1, 0),
                IVec3::new(-1, 0, 0),
                IVec3::new(1, 0, 0),
            ]
        );
    }

    #[test]
    fn edge_and_bottom_tables() {
        let w = world(1, 1, 3, 3);
        // 27 voxels, only the center is interior
        assert_eq!(w.edge_voxel_positions().len(), 26);
        assert!(!w.edge_voxel_positions().contains(&IVec3::new(1, 1, 1)));
        assert_eq!(w.bottom_voxel_indices(), &[0, 1, 2, 9, 10, 11, 18, 19, 20]);

        let thin = world(1, 1, 2, 2);
        assert_eq!(thin.edge_voxel_positions().len(), 8);
    }

    #[test]
    fn locate_rejects_outside() {
        let w = world(2, 1, 2, 2);
        assert_eq!(
            w.locate(IVec3::new(4, 0, 0)),
            Err(BoundsError::OutsideWorld {
                pos: IVec3::new(4, 0, 0)
            })
        );
        assert!(w.locate(IVec3::new(0, -1, 0)).is_err());
        let a = w.locate(IVec3::new(3, 1, 2)).unwrap();
        assert_eq!(a.chunk, ChunkId(2 * 2 + 1));
        assert_eq!(w.world_pos_of(a.chunk, a.voxel), IVec3::new(3, 1, 2));
    }

    #[test]
    fn chunk_coord_round_trip() {
        let w = world(3, 2, 2, 2);
        for i in 0..w.chunk_count() {
            let id = ChunkId(i);
            assert_eq!(w.chunk_id_at(w.chunk_coord(id)), Some(id));
        }
        assert_eq!(w.chunk_id_at(ChunkCoord::new(3, 0, 0)), None);
        assert_eq!(w.chunk_id_at(ChunkCoord::new(0, -1, 0)), None);
    }

    #[test]
    fn neighbor_ids_absent_at_world_edge() {
        let w = world(2, 1, 2, 2);
        let n = w.chunk_neighbor_ids(IVec3::ZERO);
        assert_eq!(n[Direction::Back.index()], None);
        assert_eq!(n[Direction::Front.index()], Some(ChunkId(2)));
        assert_eq!(n[Direction::Top.index()], None);
        assert_eq!(n[Direction::Bottom.index()], None);
        assert_eq!(n[Direction::Left.index()], None);
        assert_eq!(n[Direction::Right.index()], Some(ChunkId(1)));
    }

    #[test]
    fn invalid_configs_are_rejected() {
        assert!(World::new(WorldConfig::with_sizes(0, 1, 2, 2)).is_err());
        assert!(World::new(WorldConfig::with_sizes(1, 1, 2, 0)).is_err());
        let mut cfg = WorldConfig::default();
        cfg.surface_materials.clear();
        assert!(matches!(World::new(cfg), Err(ConfigError::Invalid(_))));
        assert!(World::new(WorldConfig::with_sizes(1, 1, u32::MAX, 2)).is_err());
    }

    #[test]
    fn config_from_toml_uses_defaults() {
        let cfg = WorldConfig::from_toml_str("size_xz = 4\nchunk_size_y = 8\n").unwrap();
        assert_eq!(cfg.size_xz, 4);
        assert_eq!(cfg.size_y, 1);
        assert_eq!(cfg.chunk_size_xz, 2);
        assert_eq!(cfg.chunk_size_y, 8);
        assert_eq!(cfg.surface_materials, vec!["default".to_string()]);
        assert!(WorldConfig::from_toml_str("size_xz = 0").is_err());
        assert!(matches!(
            WorldConfig::from_toml_str("size_xz = \"wide\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
