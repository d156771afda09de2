use std::fs;
use std::io::{self, Read, Write};

use flate2::Compression;
use flate2::write::DeflateEncoder;
use voxgrid_chunk::{ChunkRegistry, ChunkState, Voxel, VoxelGrid};
use voxgrid_geom::IVec3;
use voxgrid_io::{
    DecodeError, FlatEngine, PersistError, VoxelEngine, backup_path, load, load_or_initialize,
    save, slot_path,
};
use voxgrid_world::{VoxelAddress, World, WorldConfig};

fn world() -> World {
    World::new(WorldConfig::with_sizes(2, 1, 2, 2)).unwrap()
}

fn populated(w: &World) -> ChunkRegistry {
    let mut reg = ChunkRegistry::new(w);
    FlatEngine::default().initialize(w, &mut reg).unwrap();
    let addr = w.locate(IVec3::new(3, 1, 2)).unwrap();
    reg.write_voxel(addr, Voxel(42)).unwrap();
    reg
}

/// Writes part of a valid payload, then fails like a full disk.
struct FailingEngine {
    inner: FlatEngine,
    bytes_before_failure: usize,
}

impl VoxelEngine for FailingEngine {
    fn initialize(&self, world: &World, registry: &mut ChunkRegistry) -> Result<(), PersistError> {
        self.inner.initialize(world, registry)
    }

    fn write_chunks(
        &self,
        world: &World,
        registry: &ChunkRegistry,
        out: &mut dyn Write,
    ) -> io::Result<()> {
        let mut full = Vec::new();
        self.inner.write_chunks(world, registry, &mut full)?;
        let n = self.bytes_before_failure.min(full.len());
        out.write_all(&full[..n])?;
        Err(io::Error::other("disk full"))
    }

    fn read_chunks(
        &self,
        world: &World,
        input: &mut dyn Read,
        scratch: &mut VoxelGrid,
    ) -> Result<(), PersistError> {
        self.inner.read_chunks(world, input, scratch)
    }
}

fn failing() -> FailingEngine {
    FailingEngine {
        inner: FlatEngine::default(),
        bytes_before_failure: 10,
    }
}

#[test]
fn save_then_load_reproduces_grid() {
    let dir = tempfile::tempdir().unwrap();
    let path = slot_path(&dir.path().join("nested/saves"), "alpha");
    let w = world();
    let reg = populated(&w);
    save(&path, &FlatEngine::default(), &w, &reg).unwrap();
    assert!(path.exists());
    assert!(!backup_path(&path).exists());

    let mut fresh = ChunkRegistry::new(&w);
    load(&path, &FlatEngine::default(), &w, &mut fresh).unwrap();
    assert_eq!(fresh.snapshot(&w), reg.snapshot(&w));
    assert_eq!(fresh.count_in_state(ChunkState::Loaded), fresh.len());
}

#[test]
fn second_save_keeps_previous_generation_as_backup() {
    let dir = tempfile::tempdir().unwrap();
    let path = slot_path(dir.path(), "alpha");
    let w = world();
    let mut reg = populated(&w);
    save(&path, &FlatEngine::default(), &w, &reg).unwrap();
    let first = fs::read(&path).unwrap();

    let addr = VoxelAddress {
        chunk: voxgrid_world::ChunkId(0),
        voxel: 7,
    };
    reg.write_voxel(addr, Voxel(5)).unwrap();
    save(&path, &FlatEngine::default(), &w, &reg).unwrap();
    assert_eq!(fs::read(backup_path(&path)).unwrap(), first);
    assert_ne!(fs::read(&path).unwrap(), first);
}

#[test]
fn failed_save_restores_original_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = slot_path(dir.path(), "alpha");
    let w = world();
    let reg = populated(&w);
    save(&path, &FlatEngine::default(), &w, &reg).unwrap();
    let before = fs::read(&path).unwrap();

    let err = save(&path, &failing(), &w, &reg).unwrap_err();
    assert!(matches!(err, PersistError::Io(_)));
    assert_eq!(fs::read(&path).unwrap(), before);
    assert!(!backup_path(&path).exists());

    let mut fresh = ChunkRegistry::new(&w);
    load(&path, &FlatEngine::default(), &w, &mut fresh).unwrap();
    assert_eq!(fresh.snapshot(&w), reg.snapshot(&w));
}

#[test]
fn first_failed_save_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = slot_path(dir.path(), "alpha");
    let w = world();
    let reg = populated(&w);
    assert!(save(&path, &failing(), &w, &reg).is_err());
    assert!(!path.exists());
    assert!(!backup_path(&path).exists());
}

#[test]
fn missing_slot_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let path = slot_path(dir.path(), "nothing");
    let w = world();
    let mut reg = ChunkRegistry::new(&w);
    assert!(matches!(
        load(&path, &FlatEngine::default(), &w, &mut reg),
        Err(PersistError::NotFound(_))
    ));
    assert!(!load_or_initialize(&path, &FlatEngine::default(), &w, &mut reg).unwrap());
    assert_eq!(reg.count_in_state(ChunkState::Loaded), reg.len());
}

#[test]
fn corrupt_file_leaves_registry_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = slot_path(dir.path(), "junk");
    fs::write(&path, [0xFFu8; 64]).unwrap();
    let w = world();
    let mut reg = ChunkRegistry::new(&w);
    let err = load(&path, &FlatEngine::default(), &w, &mut reg).unwrap_err();
    assert!(matches!(err, PersistError::Decode(_)), "{err:?}");
    assert_eq!(reg.count_in_state(ChunkState::Created), reg.len());
}

#[test]
fn truncated_payload_is_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = slot_path(dir.path(), "short");
    let w = world();
    let reg = populated(&w);
    let mut payload = Vec::new();
    FlatEngine::default()
        .write_chunks(&w, &reg, &mut payload)
        .unwrap();
    payload.truncate(payload.len() / 2);
    let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
    enc.write_all(&payload).unwrap();
    fs::write(&path, enc.finish().unwrap()).unwrap();

    let mut live = populated(&w);
    let before = live.snapshot(&w);
    let err = load(&path, &FlatEngine::default(), &w, &mut live).unwrap_err();
    assert!(matches!(err, PersistError::Decode(DecodeError::Truncated)));
    assert_eq!(live.snapshot(&w), before);
}

#[test]
fn dimension_mismatch_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = slot_path(dir.path(), "alpha");
    let w = world();
    save(&path, &FlatEngine::default(), &w, &populated(&w)).unwrap();

    let other = World::new(WorldConfig::with_sizes(2, 1, 4, 2)).unwrap();
    let mut reg = ChunkRegistry::new(&other);
    let err = load(&path, &FlatEngine::default(), &other, &mut reg).unwrap_err();
    assert!(matches!(
        err,
        PersistError::Decode(DecodeError::DimensionMismatch {
            field: "chunk_size_xz",
            ..
        })
    ));
}

#[test]
fn load_into_live_world_schedules_rebuild() {
    let dir = tempfile::tempdir().unwrap();
    let path = slot_path(dir.path(), "alpha");
    let w = world();
    let saved = populated(&w);
    save(&path, &FlatEngine::default(), &w, &saved).unwrap();

    let mut live = ChunkRegistry::new(&w);
    FlatEngine::default().initialize(&w, &mut live).unwrap();
    live.mark_all_loaded_dirty();
    for id in live.dirty_ids() {
        live.mark_meshed(id).unwrap();
    }
    load(&path, &FlatEngine::default(), &w, &mut live).unwrap();
    assert_eq!(live.count_in_state(ChunkState::Dirty), live.len());
    assert_eq!(live.snapshot(&w), saved.snapshot(&w));
}
