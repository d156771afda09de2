use std::io::{self, Read, Write};

use serde::Deserialize;
use voxgrid_chunk::{ChunkRegistry, Voxel, VoxelGrid};
use voxgrid_world::World;

use crate::error::{DecodeError, PersistError};

/// Pluggable voxel encoding. The persistence layer owns files, compression and
/// backups; an engine only owns the bytes of the payload.
pub trait VoxelEngine: Send + Sync {
    /// Fills default storage and moves every `Created` chunk to `Loaded`.
    fn initialize(&self, world: &World, registry: &mut ChunkRegistry) -> Result<(), PersistError>;

    /// Writes every chunk in chunk-index order, voxels in voxel-index order.
    fn write_chunks(
        &self,
        world: &World,
        registry: &ChunkRegistry,
        out: &mut dyn Write,
    ) -> io::Result<()>;

    /// Decodes a payload into `scratch`, which is shaped for `world`.
    fn read_chunks(
        &self,
        world: &World,
        input: &mut dyn Read,
        scratch: &mut VoxelGrid,
    ) -> Result<(), PersistError>;
}

/// `[engine]` table of the config file.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    /// World layers (from y = 0) filled on initialization.
    #[serde(default = "default_floor_layers")]
    pub floor_layers: u32,
    /// Voxel id of the floor.
    #[serde(default = "default_floor_voxel")]
    pub floor_voxel: u16,
}

fn default_floor_layers() -> u32 {
    1
}
fn default_floor_voxel() -> u16 {
    1
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            floor_layers: default_floor_layers(),
            floor_voxel: default_floor_voxel(),
        }
    }
}

pub const FLAT_MAGIC: [u8; 4] = *b"VXG1";

/// Bundled engine: a flat floor on initialization and a fixed little-endian
/// payload of `magic, chunk_size_xz, chunk_size_y, size_xz, size_y` followed by
/// every voxel as a `u16`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlatEngine {
    pub floor_layers: u32,
    pub floor_voxel: Voxel,
}

impl Default for FlatEngine {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl FlatEngine {
    pub fn from_config(cfg: &EngineConfig) -> Self {
        Self {
            floor_layers: cfg.floor_layers,
            floor_voxel: Voxel(cfg.floor_voxel),
        }
    }

    fn header(world: &World) -> [(&'static str, u32); 4] {
        let cfg = world.config();
        [
            ("chunk_size_xz", cfg.chunk_size_xz),
            ("chunk_size_y", cfg.chunk_size_y),
            ("size_xz", cfg.size_xz),
            ("size_y", cfg.size_y),
        ]
    }
}

impl VoxelEngine for FlatEngine {
    fn initialize(&self, world: &World, registry: &mut ChunkRegistry) -> Result<(), PersistError> {
        let mut grid = VoxelGrid::new(world);
        let floor = self.floor_layers.min(i32::MAX as u32) as i32;
        for (id, voxels) in grid.iter_mut() {
            let origin = world.chunk_origin(id);
            if origin.y >= floor {
                continue;
            }
            for (v, lp) in voxels.iter_mut().zip(world.voxel_positions()) {
                if origin.y + lp.y < floor {
                    *v = self.floor_voxel;
                }
            }
        }
        let summary = registry.install_grid(grid)?;
        log::info!(
            target: "persist",
            "initialized flat world: {} floor layers of id {}, {} chunks loaded",
            self.floor_layers,
            self.floor_voxel.id(),
            summary.loaded
        );
        Ok(())
    }

    fn write_chunks(
        &self,
        world: &World,
        registry: &ChunkRegistry,
        out: &mut dyn Write,
    ) -> io::Result<()> {
        out.write_all(&FLAT_MAGIC)?;
        for (_, v) in Self::header(world) {
            out.write_all(&v.to_le_bytes())?;
        }
        let mut buf = Vec::with_capacity(world.chunk_voxel_count() * 2);
        for chunk in registry.iter() {
            buf.clear();
            for v in chunk.voxels() {
                buf.extend_from_slice(&v.id().to_le_bytes());
            }
            out.write_all(&buf)?;
        }
        Ok(())
    }

    fn read_chunks(
        &self,
        world: &World,
        input: &mut dyn Read,
        scratch: &mut VoxelGrid,
    ) -> Result<(), PersistError> {
        let mut magic = [0u8; 4];
        input.read_exact(&mut magic).map_err(DecodeError::from_read)?;
        if magic != FLAT_MAGIC {
            return Err(DecodeError::BadMagic { found: magic }.into());
        }
        for (field, expected) in Self::header(world) {
            let mut b = [0u8; 4];
            input.read_exact(&mut b).map_err(DecodeError::from_read)?;
            let found = u32::from_le_bytes(b);
            if found != expected {
                return Err(DecodeError::DimensionMismatch {
                    field,
                    expected,
                    found,
                }
                .into());
            }
        }
        let mut buf = vec![0u8; scratch.chunk_voxel_count() * 2];
        for (_, voxels) in scratch.iter_mut() {
            input.read_exact(&mut buf).map_err(DecodeError::from_read)?;
            for (v, b) in voxels.iter_mut().zip(buf.chunks_exact(2)) {
                *v = Voxel(u16::from_le_bytes([b[0], b[1]]));
            }
        }
        let mut extra = [0u8; 1];
        match input.read(&mut extra) {
            Ok(0) => Ok(()),
            Ok(_) => Err(DecodeError::TrailingData.into()),
            Err(e) => Err(DecodeError::from_read(e)),
        }
    }
}
