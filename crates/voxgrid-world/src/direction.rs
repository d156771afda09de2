use voxgrid_geom::{IVec3, Vec3};

/// The six face directions, in the fixed order every table in the crate uses.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Direction {
    /// -Z
    Back = 0,
    /// +Z
    Front = 1,
    /// +Y
    Top = 2,
    /// -Y
    Bottom = 3,
    /// -X
    Left = 4,
    /// +X
    Right = 5,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::Back,
        Direction::Front,
        Direction::Top,
        Direction::Bottom,
        Direction::Left,
        Direction::Right,
    ];

    /// Returns the `[0..6)` index of this direction.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Unit voxel step across this face.
    #[inline]
    pub const fn unit_offset(self) -> IVec3 {
        match self {
            Direction::Back => IVec3::new(0, 0, -1),
            Direction::Front => IVec3::new(0, 0, 1),
            Direction::Top => IVec3::new(0, 1, 0),
            Direction::Bottom => IVec3::new(0, -1, 0),
            Direction::Left => IVec3::new(-1, 0, 0),
            Direction::Right => IVec3::new(1, 0, 0),
        }
    }

    #[inline]
    pub fn normal(self) -> Vec3 {
        self.unit_offset().as_vec3()
    }

    #[inline]
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Back => Direction::Front,
            Direction::Front => Direction::Back,
            Direction::Top => Direction::Bottom,
            Direction::Bottom => Direction::Top,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}
