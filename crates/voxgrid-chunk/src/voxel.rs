/// A single voxel id. `0` is air; any other value is solid with that material id.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Voxel(pub u16);

impl Voxel {
    pub const AIR: Voxel = Voxel(0);
    /// Id placed by a plain add request.
    pub const SOLID: Voxel = Voxel(1);

    #[inline]
    pub const fn id(self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn is_air(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_solid(self) -> bool {
        self.0 != 0
    }
}

impl From<u16> for Voxel {
    fn from(id: u16) -> Self {
        Voxel(id)
    }
}
