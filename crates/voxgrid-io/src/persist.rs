use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use voxgrid_chunk::{ChunkRegistry, VoxelGrid};
use voxgrid_world::World;

use crate::engine::VoxelEngine;
use crate::error::PersistError;

pub const SLOT_EXTENSION: &str = "vxw";
pub const BACKUP_SUFFIX: &str = ".bak";

/// `dir/name.vxw`
pub fn slot_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.{SLOT_EXTENSION}"))
}

/// Sibling holding the previous generation of `path`.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut s: OsString = path.as_os_str().to_owned();
    s.push(BACKUP_SUFFIX);
    PathBuf::from(s)
}

/// Writes the registry to `path` as a raw DEFLATE stream of the engine payload.
///
/// An existing file is first moved to its backup sibling. If anything fails the
/// partial file is removed and the backup, when this call made one, is moved back,
/// so the slot is either the new generation or byte-identical to the old one.
pub fn save(
    path: &Path,
    engine: &dyn VoxelEngine,
    world: &World,
    registry: &ChunkRegistry,
) -> Result<(), PersistError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let bak = backup_path(path);
    let had_previous = path.exists();
    if had_previous {
        if bak.exists() {
            fs::remove_file(&bak)?;
        }
        fs::rename(path, &bak)?;
    }
    match write_slot(path, engine, world, registry) {
        Ok(()) => {
            log::info!(
                target: "persist",
                "saved {} chunks to {}",
                registry.len(),
                path.display()
            );
            Ok(())
        }
        Err(e) => {
            log::warn!(target: "persist", "save to {} failed: {e}", path.display());
            rollback(path, &bak, had_previous);
            Err(e)
        }
    }
}

fn write_slot(
    path: &Path,
    engine: &dyn VoxelEngine,
    world: &World,
    registry: &ChunkRegistry,
) -> Result<(), PersistError> {
    let file = File::create(path)?;
    let mut enc = DeflateEncoder::new(BufWriter::new(file), Compression::default());
    engine.write_chunks(world, registry, &mut enc)?;
    let file = enc.finish()?.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    Ok(())
}

fn rollback(path: &Path, bak: &Path, had_previous: bool) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            log::warn!(target: "persist", "could not remove partial {}: {e}", path.display());
        }
    }
    if had_previous && bak.exists() {
        match fs::rename(bak, path) {
            Ok(()) => log::info!(target: "persist", "restored {} from backup", path.display()),
            Err(e) => log::warn!(target: "persist", "could not restore backup {}: {e}", bak.display()),
        }
    }
}

/// Reads `path` into the registry. The payload is decoded into a scratch grid
/// first, so a failed load leaves the live registry untouched.
pub fn load(
    path: &Path,
    engine: &dyn VoxelEngine,
    world: &World,
    registry: &mut ChunkRegistry,
) -> Result<(), PersistError> {
    if !path.exists() {
        return Err(PersistError::NotFound(path.to_path_buf()));
    }
    let file = File::open(path)?;
    let mut dec = DeflateDecoder::new(BufReader::new(file));
    let mut scratch = VoxelGrid::new(world);
    if let Err(e) = engine.read_chunks(world, &mut dec, &mut scratch) {
        log::warn!(target: "persist", "load of {} failed: {e}", path.display());
        return Err(e);
    }
    let summary = registry.install_grid(scratch)?;
    log::info!(
        target: "persist",
        "loaded {} ({} chunks loaded, {} rebuilt)",
        path.display(),
        summary.loaded,
        summary.dirtied
    );
    Ok(())
}

/// Loads `path` if it exists, otherwise lets the engine initialize a new world.
/// Returns whether a file was loaded.
pub fn load_or_initialize(
    path: &Path,
    engine: &dyn VoxelEngine,
    world: &World,
    registry: &mut ChunkRegistry,
) -> Result<bool, PersistError> {
    match load(path, engine, world, registry) {
        Ok(()) => Ok(true),
        Err(PersistError::NotFound(_)) => {
            engine.initialize(world, registry)?;
            Ok(false)
        }
        Err(e) => Err(e),
    }
}
