/// Per-chunk lifecycle.
///
/// `Created -> Loaded -> Dirty -> MeshReady`, with `MeshReady -> Dirty` on every
/// later edit. `MarkedForDelete` is reserved; nothing in this crate enters it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ChunkState {
    #[default]
    Created,
    Loaded,
    Dirty,
    MeshReady,
    MarkedForDelete,
}

impl ChunkState {
    /// Storage has been populated. Only valid from `Created`.
    pub fn loaded(&mut self) -> bool {
        self.transition(ChunkState::Loaded, matches!(self, ChunkState::Created))
    }

    /// Voxel contents changed. Valid from `Loaded` and `MeshReady`; a chunk that is
    /// already `Dirty` stays dirty and reports success.
    pub fn dirtied(&mut self) -> bool {
        if *self == ChunkState::Dirty {
            return true;
        }
        self.transition(
            ChunkState::Dirty,
            matches!(self, ChunkState::Loaded | ChunkState::MeshReady),
        )
    }

    /// A mesh was built from the current contents. Only valid from `Dirty`.
    pub fn meshed(&mut self) -> bool {
        self.transition(ChunkState::MeshReady, matches!(self, ChunkState::Dirty))
    }

    #[inline]
    pub fn is_dirty(self) -> bool {
        self == ChunkState::Dirty
    }

    /// True once storage holds real contents.
    #[inline]
    pub fn is_live(self) -> bool {
        matches!(
            self,
            ChunkState::Loaded | ChunkState::Dirty | ChunkState::MeshReady
        )
    }

    fn transition(&mut self, to: ChunkState, allowed: bool) -> bool {
        if allowed {
            *self = to;
        } else {
            log::debug!("ignored chunk transition {:?} -> {:?}", self, to);
        }
        allowed
    }
}

#[cfg(test)]
mod tests {
    use super::ChunkState::*;
    use super::*;

    #[test]
    fn happy_path() {
        let mut s = ChunkState::default();
        assert_eq!(s, Created);
        assert!(s.loaded());
        assert!(s.dirtied());
        assert!(s.meshed());
        assert_eq!(s, MeshReady);
        assert!(s.dirtied());
        assert_eq!(s, Dirty);
    }

    #[test]
    fn illegal_transitions_are_noops() {
        let mut s = Created;
        assert!(!s.dirtied());
        assert!(!s.meshed());
        assert_eq!(s, Created);

        let mut s = Loaded;
        assert!(!s.loaded());
        assert!(!s.meshed());
        assert_eq!(s, Loaded);

        let mut s = MeshReady;
        assert!(!s.meshed());
        assert!(!s.loaded());
        assert_eq!(s, MeshReady);

        let mut s = MarkedForDelete;
        assert!(!s.loaded());
        assert!(!s.dirtied());
        assert!(!s.meshed());
        assert_eq!(s, MarkedForDelete);
    }

    #[test]
    fn dirty_is_idempotent() {
        let mut s = Dirty;
        assert!(s.dirtied());
        assert_eq!(s, Dirty);
    }
}
