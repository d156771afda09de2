use std::sync::Arc;

use voxgrid_chunk::{ChunkRegistry, ChunkState};
use voxgrid_edit::EditQueue;
use voxgrid_geom::IVec3;
use voxgrid_io::{FlatEngine, VoxelEngine};
use voxgrid_runtime::{JobKind, MeshStore, Runtime, mesh_pass};
use voxgrid_world::{ChunkId, World, WorldConfig};

fn flat_world() -> (World, ChunkRegistry) {
    let w = World::new(WorldConfig::with_sizes(2, 1, 2, 2)).unwrap();
    let mut reg = ChunkRegistry::new(&w);
    FlatEngine::default().initialize(&w, &mut reg).unwrap();
    (w, reg)
}

#[test]
fn first_pass_meshes_whole_floor() {
    let (w, mut reg) = flat_world();
    let mut store = MeshStore::new();
    assert_eq!(mesh_pass(&w, &mut reg, &mut store).unwrap().built, 0);

    assert_eq!(reg.mark_all_loaded_dirty(), 4);
    let stats = mesh_pass(&w, &mut reg, &mut store).unwrap();
    assert_eq!(stats.built, 4);
    // 16 tops plus 16 outer walls; seams between loaded chunks are culled
    assert_eq!(stats.faces, 32);
    assert_eq!(store.total_faces(), 32);
    assert_eq!(reg.count_in_state(ChunkState::MeshReady), 4);
    assert!(reg.dirty_ids().is_empty());
}

#[test]
fn edit_dirty_mesh_cycle() {
    let (w, mut reg) = flat_world();
    let mut store = MeshStore::new();
    reg.mark_all_loaded_dirty();
    mesh_pass(&w, &mut reg, &mut store).unwrap();

    let mut edits = EditQueue::new();
    edits.request_add_voxel(&w, IVec3::new(0, 1, 0)).unwrap();
    let out = edits.apply(&w, &mut reg).unwrap();
    assert_eq!(out.dirtied, vec![ChunkId(0)]);

    let stats = mesh_pass(&w, &mut reg, &mut store).unwrap();
    assert_eq!(stats.built, 1);
    // one floor top is covered, the new voxel shows five faces
    assert_eq!(store.get(ChunkId(0)).unwrap().face_count(), 12);
    assert_eq!(store.total_faces(), 36);
}

#[test]
fn runtime_meshes_until_clean() {
    let (w, mut reg) = flat_world();
    let w = Arc::new(w);
    let mut rt = Runtime::with_workers(w.clone(), 2).unwrap();
    let mut store = MeshStore::new();
    reg.mark_all_loaded_dirty();
    let stats = rt.run_until_clean(&mut reg, &mut store, JobKind::Bg);
    assert_eq!(stats.applied, 4);
    assert_eq!(store.total_faces(), 32);
    assert_eq!(reg.count_in_state(ChunkState::MeshReady), 4);
    assert_eq!(rt.in_flight(), 0);

    let mut edits = EditQueue::new();
    edits.request_remove_voxel(&w, IVec3::new(1, 0, 1)).unwrap();
    edits.apply(&w, &mut reg).unwrap();
    // the removed voxel sits on two seams, so three chunks rebuild
    assert_eq!(reg.dirty_ids().len(), 3);
    let stats = rt.run_until_clean(&mut reg, &mut store, JobKind::Edit);
    assert_eq!(stats.applied, 3);
    assert!(reg.dirty_ids().is_empty());
}

#[test]
fn in_flight_chunks_are_not_rescheduled() {
    let (w, mut reg) = flat_world();
    let mut rt = Runtime::with_workers(Arc::new(w), 0).unwrap();
    reg.mark_all_loaded_dirty();
    assert_eq!(rt.schedule(&reg, JobKind::Bg), 4);
    assert_eq!(rt.schedule(&reg, JobKind::Bg), 0);
    assert!(rt.is_scheduled(ChunkId(3)));
    let mut store = MeshStore::new();
    rt.run_until_clean(&mut reg, &mut store, JobKind::Bg);
    assert_eq!(store.len(), 4);
}

#[test]
fn stale_results_are_dropped_and_rebuilt() {
    let (w, mut reg) = flat_world();
    let w = Arc::new(w);
    let mut rt = Runtime::with_workers(w.clone(), 1).unwrap();
    let mut store = MeshStore::new();
    reg.mark_all_loaded_dirty();
    assert!(rt.schedule_chunk(&reg, ChunkId(0), JobKind::Edit));

    // edit after the snapshot was taken
    let mut edits = EditQueue::new();
    edits.request_add_voxel(&w, IVec3::new(0, 1, 0)).unwrap();
    edits.apply(&w, &mut reg).unwrap();

    let results = rt.wait_worker_results();
    assert_eq!(results.len(), 1);
    let stats = rt.apply_results(&mut reg, &mut store, results);
    assert_eq!(stats.stale, 1);
    assert_eq!(stats.applied, 0);
    assert_eq!(reg.chunk(ChunkId(0)).unwrap().state(), ChunkState::Dirty);
    assert!(store.get(ChunkId(0)).is_none());

    rt.run_until_clean(&mut reg, &mut store, JobKind::Bg);
    assert_eq!(store.get(ChunkId(0)).unwrap().face_count(), 12);
}
