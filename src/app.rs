use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use voxgrid_chunk::{ChunkRegistry, ChunkState, Voxel};
use voxgrid_edit::EditQueue;
use voxgrid_geom::IVec3;
use voxgrid_io::{FlatEngine, PersistError, VoxelEngine, load, save, slot_path};
use voxgrid_mesh_cpu::MeshBuild;
use voxgrid_runtime::{JobKind, MeshStore, Runtime, ThreadPoolBuildError, mesh_pass};
use voxgrid_world::{BoundsError, ConfigError, World};

use crate::config::{AppConfig, load_config_from_path};

#[derive(Debug, Parser)]
#[command(name = "voxgrid", version, about = "Chunked voxel world tool")]
pub struct Cli {
    /// TOML file with `[world]` and `[engine]` tables; defaults apply when absent.
    #[arg(long, short)]
    pub config: Option<PathBuf>,
    /// Directory holding save slots.
    #[arg(long, default_value = "saves")]
    pub save_dir: PathBuf,
    /// Slot name; the file is `<save_dir>/<slot>.vxw`.
    #[arg(long, default_value = "world")]
    pub slot: String,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a fresh world, mesh it and save it.
    New,
    /// Load a slot, mesh it and print statistics.
    Info,
    /// Load a slot, apply voxel edits, remesh and save.
    Edit(EditArgs),
}

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Place a voxel at `x,y,z`. Repeatable.
    #[arg(long = "add", value_parser = parse_ivec3)]
    pub add: Vec<IVec3>,
    /// Clear the voxel at `x,y,z`. Repeatable.
    #[arg(long = "remove", value_parser = parse_ivec3)]
    pub remove: Vec<IVec3>,
    /// Voxel id used by `--add`.
    #[arg(long, default_value_t = 1)]
    pub voxel: u16,
}

fn parse_ivec3(s: &str) -> Result<IVec3, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(format!("expected x,y,z, got `{s}`"));
    };
    let n = |v: &str| v.parse::<i32>().map_err(|e| format!("`{v}`: {e}"));
    Ok(IVec3::new(n(x)?, n(y)?, n(z)?))
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error(transparent)]
    Bounds(#[from] BoundsError),
    #[error("failed to start mesh workers: {0}")]
    Workers(#[from] ThreadPoolBuildError),
}

/// Loaded world plus the state every command works on.
struct Session {
    world: Arc<World>,
    engine: FlatEngine,
    registry: ChunkRegistry,
    meshes: MeshStore,
    /// Started on first use and kept for the rest of the command.
    runtime: Option<Runtime>,
    path: PathBuf,
}

impl Session {
    fn open(cli: &Cli) -> Result<Self, AppError> {
        let cfg = match &cli.config {
            Some(p) => load_config_from_path(p)?,
            None => AppConfig::default(),
        };
        let world = Arc::new(World::new(cfg.world)?);
        let registry = ChunkRegistry::new(&world);
        Ok(Self {
            world,
            engine: FlatEngine::from_config(&cfg.engine),
            registry,
            meshes: MeshStore::new(),
            runtime: None,
            path: slot_path(&cli.save_dir, &cli.slot),
        })
    }

    fn load(&mut self) -> Result<(), AppError> {
        load(&self.path, &self.engine, &self.world, &mut self.registry)?;
        Ok(())
    }

    fn save(&self) -> Result<(), AppError> {
        save(&self.path, &self.engine, &self.world, &self.registry)?;
        Ok(())
    }

    /// Meshes every dirty chunk on the worker lanes.
    fn remesh(&mut self, kind: JobKind) -> Result<(), AppError> {
        let mut rt = match self.runtime.take() {
            Some(rt) => rt,
            None => Runtime::new(self.world.clone())?,
        };
        let stats = rt.run_until_clean(&mut self.registry, &mut self.meshes, kind);
        self.runtime = Some(rt);
        log::info!(
            target: "mesh",
            "meshed {} chunks ({} stale results retried)",
            stats.applied,
            stats.stale
        );
        Ok(())
    }
}

pub fn run(cli: Cli) -> Result<(), AppError> {
    let mut session = Session::open(&cli)?;
    match &cli.command {
        Command::New => {
            session.engine.initialize(&session.world, &mut session.registry)?;
            session.registry.mark_all_loaded_dirty();
            session.remesh(JobKind::Bg)?;
            session.save()?;
            print_stats(&session.world, &session.registry, &session.meshes, &session.path);
        }
        Command::Info => {
            session.load()?;
            session.registry.mark_all_loaded_dirty();
            mesh_pass(&session.world, &mut session.registry, &mut session.meshes)?;
            print_stats(&session.world, &session.registry, &session.meshes, &session.path);
        }
        Command::Edit(args) => {
            session.load()?;
            session.registry.mark_all_loaded_dirty();
            session.remesh(JobKind::Bg)?;

            let mut edits = EditQueue::new();
            for p in &args.add {
                edits.request_add_voxel_with(&session.world, *p, Voxel(args.voxel))?;
            }
            for p in &args.remove {
                edits.request_remove_voxel(&session.world, *p)?;
            }
            let outcome = edits.apply(&session.world, &mut session.registry)?;
            session.remesh(JobKind::Edit)?;
            session.save()?;
            println!(
                "applied {} edits ({} unchanged), rebuilt {} chunks",
                outcome.applied,
                outcome.unchanged,
                outcome.dirtied.len()
            );
            print_stats(&session.world, &session.registry, &session.meshes, &session.path);
        }
    }
    Ok(())
}

fn print_stats(world: &World, registry: &ChunkRegistry, meshes: &MeshStore, path: &Path) {
    let b = world.bounds();
    println!("slot        {}", path.display());
    println!(
        "world       {} chunks, {}x{}x{} voxels",
        registry.len(),
        b.x,
        b.y,
        b.z
    );
    println!(
        "view        {} voxels across, {} up",
        world.view_distance_xz_voxels(),
        world.view_distance_y_voxels()
    );
    for state in [
        ChunkState::Created,
        ChunkState::Loaded,
        ChunkState::Dirty,
        ChunkState::MeshReady,
    ] {
        println!(
            "  {:<10}{}",
            format!("{state:?}"),
            registry.count_in_state(state)
        );
    }
    let solid = registry.iter().filter(|c| c.has_solid()).count();
    let triangles: usize = meshes
        .iter()
        .map(|m| &m.mesh)
        .map(MeshBuild::triangle_count)
        .sum();
    println!("solid       {solid} chunks");
    println!(
        "mesh        {} faces, {} triangles",
        meshes.total_faces(),
        triangles
    );
}
