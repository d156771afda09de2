use voxgrid_geom::Vec3;
use voxgrid_world::Direction;

/// Corners of the unit cube.
pub const VOXEL_VERTS: [Vec3; 8] = [
    Vec3::new(0.0, 0.0, 0.0),
    Vec3::new(1.0, 0.0, 0.0),
    Vec3::new(1.0, 1.0, 0.0),
    Vec3::new(0.0, 1.0, 0.0),
    Vec3::new(0.0, 0.0, 1.0),
    Vec3::new(1.0, 0.0, 1.0),
    Vec3::new(1.0, 1.0, 1.0),
    Vec3::new(0.0, 1.0, 1.0),
];

/// Cube corner indices of each face, indexed by [`Direction::index`].
pub const FACE_VERTS: [[usize; 4]; 6] = [
    [0, 3, 1, 2], // back
    [5, 6, 4, 7], // front
    [3, 7, 2, 6], // top
    [1, 5, 0, 4], // bottom
    [4, 7, 0, 3], // left
    [1, 2, 5, 6], // right
];

/// Per-corner UVs shared by every face.
pub const FACE_UVS: [[f32; 2]; 4] = [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];

/// Triangle winding relative to the first vertex of a face.
pub const FACE_INDICES: [u32; 6] = [0, 1, 2, 1, 3, 2];

/// The four corners of `dir`'s face of the unit cube at `base`.
#[inline]
pub fn face_corners(dir: Direction, base: Vec3) -> [Vec3; 4] {
    FACE_VERTS[dir.index()].map(|i| base + VOXEL_VERTS[i])
}
