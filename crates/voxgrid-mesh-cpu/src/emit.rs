use voxgrid_chunk::Voxel;
use voxgrid_geom::{Aabb, IVec3, Vec3};
use voxgrid_world::{ChunkId, Direction, World};

use crate::chunk::ChunkMeshCPU;
use crate::mesh_build::MeshBuild;
use crate::neighbors::NeighborVoxels;

/// Submesh every emitted face goes to.
const SOLID_SUBMESH: usize = 0;

/// Whether the `dir` face of the solid voxel at chunk-local `lp` is visible.
///
/// World exterior counts as air except below the world floor. A missing
/// neighbor chunk counts as solid so no face leaks across an unloaded seam.
#[inline]
fn face_visible(
    world: &World,
    voxels: &[Voxel],
    neighbors: &NeighborVoxels<'_>,
    origin: IVec3,
    lp: IVec3,
    dir: Direction,
) -> bool {
    let step = world.voxel_neighbor_offset(dir);
    let np = origin + lp + step;
    if world.is_outside_world(np) {
        return dir != Direction::Bottom;
    }
    let nlp = lp + step;
    if !world.is_outside_chunk(nlp) {
        return voxels
            .get(world.voxel_index_from_local_pos(nlp))
            .is_some_and(|v| v.is_air());
    }
    match neighbors.get(dir) {
        Some(n) => n
            .get(world.voxel_index_from_world_pos(np))
            .is_some_and(|v| v.is_air()),
        None => false,
    }
}

/// Rebuilds `out` from one chunk's storage. `out` is cleared first and keeps its
/// capacity. Emission order follows storage order then direction order, so the
/// same inputs always produce the same buffers. Voxels missing from a short
/// slice count as solid.
pub fn build_chunk_mesh_into(
    world: &World,
    origin: IVec3,
    voxels: &[Voxel],
    neighbors: &NeighborVoxels<'_>,
    out: &mut MeshBuild,
) {
    out.clear_keep_capacity();
    out.set_submesh_count(world.surface_material_count());
    for (v, &lp) in voxels.iter().zip(world.voxel_positions()) {
        if v.is_air() {
            continue;
        }
        let base = lp.as_vec3();
        for dir in Direction::ALL {
            if face_visible(world, voxels, neighbors, origin, lp, dir) {
                out.add_face(dir, base, SOLID_SUBMESH);
            }
        }
    }
}

/// Builds the mesh of chunk `id` into fresh buffers.
pub fn build_chunk_mesh(
    world: &World,
    id: ChunkId,
    voxels: &[Voxel],
    neighbors: &NeighborVoxels<'_>,
) -> ChunkMeshCPU {
    let origin = world.chunk_origin(id);
    let mut mesh = MeshBuild::new(world.surface_material_count());
    build_chunk_mesh_into(world, origin, voxels, neighbors, &mut mesh);
    let bbox = Aabb::from_points(mesh.positions().iter().map(|p| Vec3::from(*p)))
        .unwrap_or_default();
    log::trace!(
        target: "mesh",
        "chunk {} meshed: {} faces",
        id.0,
        mesh.face_count()
    );
    ChunkMeshCPU {
        id,
        origin,
        bbox,
        mesh,
    }
}
