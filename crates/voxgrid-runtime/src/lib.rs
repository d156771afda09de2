//! Mesh scheduling: a synchronous parallel pass and a threaded runtime with
//! worker lanes.
#![forbid(unsafe_code)]

mod mesh_store;
mod pass;

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, unbounded};
use hashbrown::HashSet;
use rayon::{ThreadPool, ThreadPoolBuilder};
use voxgrid_chunk::{ChunkRegistry, Voxel};
use voxgrid_mesh_cpu::{ChunkMeshCPU, NeighborVoxels, build_chunk_mesh};
use voxgrid_world::{ChunkId, World};

pub use mesh_store::MeshStore;
pub use pass::{MeshPassStats, mesh_pass};
pub use rayon::ThreadPoolBuildError;

/// Snapshot of everything a worker needs to mesh one chunk.
#[derive(Clone, Debug)]
pub struct MeshJob {
    pub id: ChunkId,
    pub rev: u64,
    pub job_id: u64,
    pub voxels: Arc<[Voxel]>,
    pub neighbors: [Option<Arc<[Voxel]>>; 6],
}

pub struct JobOut {
    pub mesh: ChunkMeshCPU,
    pub id: ChunkId,
    pub rev: u64,
    pub job_id: u64,
    pub kind: JobKind,
    pub t_mesh_ms: u32,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Lane {
    Edit,
    Bg,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobKind {
    /// Chunks dirtied by edits; a single dedicated worker.
    Edit,
    /// Bulk and initial meshing.
    Bg,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApplyStats {
    pub applied: usize,
    /// Results built from an outdated revision; the chunk stays dirty.
    pub stale: usize,
}

impl std::ops::AddAssign for ApplyStats {
    fn add_assign(&mut self, rhs: Self) {
        self.applied += rhs.applied;
        self.stale += rhs.stale;
    }
}

fn process_mesh_job(job: MeshJob, lane: Lane, world: &World, tx: &Sender<JobOut>) {
    let MeshJob {
        id,
        rev,
        job_id,
        voxels,
        neighbors,
    } = job;
    let t0 = Instant::now();
    let slots = neighbors.each_ref().map(|n| n.as_deref());
    let mesh = build_chunk_mesh(world, id, &voxels, &NeighborVoxels::new(slots));
    let t_mesh_ms = t0.elapsed().as_millis().min(u128::from(u32::MAX)) as u32;
    let kind = match lane {
        Lane::Edit => JobKind::Edit,
        Lane::Bg => JobKind::Bg,
    };
    let _ = tx.send(JobOut {
        mesh,
        id,
        rev,
        job_id,
        kind,
        t_mesh_ms,
    });
}

fn spawn_lane(
    pool: &ThreadPool,
    workers: usize,
    lane: Lane,
    rx: &Receiver<MeshJob>,
    tx: &Sender<JobOut>,
    world: &Arc<World>,
) {
    for _ in 0..workers {
        let rx = rx.clone();
        let tx = tx.clone();
        let world = world.clone();
        pool.spawn(move || {
            while let Ok(job) = rx.recv() {
                process_mesh_job(job, lane, world.as_ref(), &tx);
            }
        });
    }
}

/// Background mesher. Owns the worker pools; the caller owns the registry and
/// feeds it through [`Runtime::schedule`] and [`Runtime::apply_results`].
pub struct Runtime {
    job_tx_edit: Sender<MeshJob>,
    job_tx_bg: Sender<MeshJob>,
    res_rx: Receiver<JobOut>,
    _edit_pool: Arc<ThreadPool>,
    bg_pool: Option<Arc<ThreadPool>>,
    scheduled: HashSet<ChunkId>,
    next_job_id: u64,
}

impl Runtime {
    /// One edit worker, the remaining cores on the background lane.
    pub fn new(world: Arc<World>) -> Result<Self, ThreadPoolBuildError> {
        let worker_count: usize = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(8);
        Self::with_workers(world, worker_count.saturating_sub(1))
    }

    pub fn with_workers(world: Arc<World>, w_bg: usize) -> Result<Self, ThreadPoolBuildError> {
        let (job_tx_edit, job_rx_edit) = unbounded::<MeshJob>();
        let (job_tx_bg, job_rx_bg) = unbounded::<MeshJob>();
        let (res_tx, res_rx) = unbounded::<JobOut>();
        let w_edit = 1usize;

        let edit_pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(w_edit)
                .thread_name(|i| format!("voxgrid-edit-{i}"))
                .build()?,
        );
        spawn_lane(&edit_pool, w_edit, Lane::Edit, &job_rx_edit, &res_tx, &world);

        let bg_pool = if w_bg > 0 {
            let pool = Arc::new(
                ThreadPoolBuilder::new()
                    .num_threads(w_bg)
                    .thread_name(|i| format!("voxgrid-bg-{i}"))
                    .build()?,
            );
            spawn_lane(&pool, w_bg, Lane::Bg, &job_rx_bg, &res_tx, &world);
            Some(pool)
        } else {
            None
        };
        log::info!("mesh runtime started: {w_edit} edit worker(s), {w_bg} background worker(s)");

        Ok(Self {
            job_tx_edit,
            job_tx_bg,
            res_rx,
            _edit_pool: edit_pool,
            bg_pool,
            scheduled: HashSet::new(),
            next_job_id: 0,
        })
    }

    fn submit_edit(&self, job: MeshJob) {
        if self.job_tx_edit.send(job).is_err() {
            log::warn!(target: "mesh", "edit lane closed");
        }
    }

    fn submit_bg(&self, job: MeshJob) {
        if self.bg_pool.is_none() {
            return self.submit_edit(job);
        }
        if self.job_tx_bg.send(job).is_err() {
            log::warn!(target: "mesh", "background lane closed");
        }
    }

    /// True while a job for `id` has been handed out and its result not applied.
    pub fn is_scheduled(&self, id: ChunkId) -> bool {
        self.scheduled.contains(&id)
    }

    pub fn in_flight(&self) -> usize {
        self.scheduled.len()
    }

    /// Snapshots one dirty chunk and queues it on `kind`'s lane. Returns false if
    /// the chunk is not dirty or already has a job in flight.
    pub fn schedule_chunk(&mut self, registry: &ChunkRegistry, id: ChunkId, kind: JobKind) -> bool {
        if self.scheduled.contains(&id) {
            return false;
        }
        let Some(chunk) = registry.get(id).filter(|c| c.state().is_dirty()) else {
            return false;
        };
        let neighbors = registry
            .neighbor_voxels(id)
            .map(|n| n.map(Arc::<[Voxel]>::from));
        self.next_job_id = self.next_job_id.wrapping_add(1);
        let job = MeshJob {
            id,
            rev: chunk.rev(),
            job_id: self.next_job_id,
            voxels: Arc::from(chunk.voxels()),
            neighbors,
        };
        self.scheduled.insert(id);
        match kind {
            JobKind::Edit => self.submit_edit(job),
            JobKind::Bg => self.submit_bg(job),
        }
        true
    }

    /// Schedules every dirty chunk without a job in flight.
    pub fn schedule(&mut self, registry: &ChunkRegistry, kind: JobKind) -> usize {
        let mut n = 0;
        for id in registry.dirty_ids() {
            if self.schedule_chunk(registry, id, kind) {
                n += 1;
            }
        }
        if n > 0 {
            log::debug!(target: "mesh", "scheduled {n} chunks on {kind:?} lane");
        }
        n
    }

    /// Blocks for at least one result, then takes whatever else is ready.
    /// Empty when nothing is in flight.
    pub fn wait_worker_results(&self) -> Vec<JobOut> {
        if self.scheduled.is_empty() {
            return Vec::new();
        }
        match self.res_rx.recv() {
            Ok(first) => {
                let mut out = vec![first];
                out.extend(self.res_rx.try_iter());
                out
            }
            Err(_) => Vec::new(),
        }
    }

    /// Applies finished meshes whose revision still matches the chunk. A stale
    /// result is dropped and the chunk stays dirty for the next schedule.
    pub fn apply_results(
        &mut self,
        registry: &mut ChunkRegistry,
        store: &mut MeshStore,
        results: Vec<JobOut>,
    ) -> ApplyStats {
        let mut stats = ApplyStats::default();
        for out in results {
            self.scheduled.remove(&out.id);
            let current = registry
                .get(out.id)
                .filter(|c| c.state().is_dirty())
                .map(|c| c.rev());
            if current != Some(out.rev) {
                log::debug!(
                    target: "mesh",
                    "dropping stale mesh for chunk {} (job {}, rev {})",
                    out.id.0,
                    out.job_id,
                    out.rev
                );
                stats.stale += 1;
                continue;
            }
            if matches!(registry.mark_meshed(out.id), Ok(true)) {
                log::trace!(
                    target: "mesh",
                    "chunk {} meshed on {:?} lane in {} ms",
                    out.id.0,
                    out.kind,
                    out.t_mesh_ms
                );
                store.insert(out.mesh);
                stats.applied += 1;
            }
        }
        stats
    }

    /// Schedules, waits and applies until no chunk is dirty or in flight.
    pub fn run_until_clean(
        &mut self,
        registry: &mut ChunkRegistry,
        store: &mut MeshStore,
        kind: JobKind,
    ) -> ApplyStats {
        let mut total = ApplyStats::default();
        loop {
            self.schedule(registry, kind);
            if self.scheduled.is_empty() {
                break;
            }
            let results = self.wait_worker_results();
            if results.is_empty() {
                log::warn!(target: "mesh", "mesh workers disconnected");
                break;
            }
            total += self.apply_results(registry, store, results);
        }
        total
    }
}
