use voxgrid_geom::Vec3;
use voxgrid_world::Direction;

use crate::face::{FACE_INDICES, FACE_UVS, face_corners};

/// Growable geometry buffers for one chunk: shared vertex streams plus one
/// triangle index list per surface material.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshBuild {
    pub pos: Vec<[f32; 3]>,
    pub norm: Vec<[f32; 3]>,
    pub uv: Vec<[f32; 2]>,
    pub idx: Vec<Vec<u32>>,
}

impl MeshBuild {
    pub fn new(submeshes: usize) -> Self {
        Self {
            idx: vec![Vec::new(); submeshes.max(1)],
            ..Self::default()
        }
    }

    /// Clears all arrays but retains capacity for reuse across builds.
    #[inline]
    pub fn clear_keep_capacity(&mut self) {
        self.pos.clear();
        self.norm.clear();
        self.uv.clear();
        for list in &mut self.idx {
            list.clear();
        }
    }

    /// Resizes the submesh list to `n` (at least one), keeping existing buffers.
    pub fn set_submesh_count(&mut self, n: usize) {
        self.idx.resize_with(n.max(1), Vec::new);
    }

    /// Pre-reserve capacity for approximately `n_faces` faces in `submesh`.
    #[inline]
    pub fn reserve_faces(&mut self, submesh: usize, n_faces: usize) {
        self.pos.reserve(n_faces * 4);
        self.norm.reserve(n_faces * 4);
        self.uv.reserve(n_faces * 4);
        if let Some(list) = self.idx.get_mut(submesh) {
            list.reserve(n_faces * 6);
        }
    }

    /// Appends the `dir` face of the unit voxel at `base` to `submesh`.
    pub fn add_face(&mut self, dir: Direction, base: Vec3, submesh: usize) {
        let start = self.pos.len() as u32;
        let n = dir.normal().to_array();
        for (corner, uv) in face_corners(dir, base).into_iter().zip(FACE_UVS) {
            self.pos.push(corner.to_array());
            self.norm.push(n);
            self.uv.push(uv);
        }
        if self.idx.len() <= submesh {
            self.set_submesh_count(submesh + 1);
        }
        self.idx[submesh].extend(FACE_INDICES.iter().map(|i| start + i));
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.pos.len()
    }

    #[inline]
    pub fn face_count(&self) -> usize {
        self.pos.len() / 4
    }

    pub fn triangle_count(&self) -> usize {
        self.idx.iter().map(|l| l.len() / 3).sum()
    }

    #[inline]
    pub fn submesh_count(&self) -> usize {
        self.idx.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pos.is_empty()
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.pos
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        &self.norm
    }

    pub fn uvs(&self) -> &[[f32; 2]] {
        &self.uv
    }

    /// Triangle indices of one submesh; empty for an unknown submesh.
    pub fn indices(&self, submesh: usize) -> &[u32] {
        self.idx.get(submesh).map(Vec::as_slice).unwrap_or(&[])
    }
}
