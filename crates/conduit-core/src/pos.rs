//! Block coordinates and the six face directions.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Block position
// ---------------------------------------------------------------------------

/// An integer block coordinate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Position shifted by `(dx, dy, dz)`.
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// The adjacent position across `face`.
    pub fn step(self, face: Face) -> Self {
        let (dx, dy, dz) = face.offset();
        self.offset(dx, dy, dz)
    }

    /// The six 6-connected neighbours, in scan order (+x, -x, +y, -y, +z, -z).
    pub fn neighbors(self) -> [BlockPos; 6] {
        Face::SCAN_ORDER.map(|face| self.step(face))
    }

    /// Where a block at this position with the given `axis` state pushes
    /// its contents: the neighbour on the far side of the axis.
    pub fn output_position(self, axis: Face) -> Self {
        self.step(axis.opposite())
    }

    /// Squared Euclidean distance. Orders identically to the true distance,
    /// saturating at `i64::MAX` for points near opposite ends of the range.
    pub fn distance_squared(&self, other: &BlockPos) -> i64 {
        let sq = |a: i32, b: i32| {
            let d = i64::from(a) - i64::from(b);
            d.saturating_mul(d)
        };
        sq(self.x, other.x)
            .saturating_add(sq(self.y, other.y))
            .saturating_add(sq(self.z, other.z))
    }

    /// Euclidean distance.
    pub fn distance(&self, other: &BlockPos) -> f64 {
        (self.distance_squared(other) as f64).sqrt()
    }
}

impl std::fmt::Display for BlockPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Faces
// ---------------------------------------------------------------------------

/// One of the six block faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Face {
    Up,
    Down,
    North,
    South,
    East,
    West,
}

impl Face {
    /// Neighbour expansion order used by every breadth-first scan.
    pub const SCAN_ORDER: [Face; 6] = [
        Face::East,
        Face::West,
        Face::Up,
        Face::Down,
        Face::South,
        Face::North,
    ];

    /// Order in which shape-state flags are written.
    pub const ALL: [Face; 6] = [
        Face::Up,
        Face::Down,
        Face::North,
        Face::South,
        Face::East,
        Face::West,
    ];

    /// Unit offset. North is -z, east is +x.
    pub fn offset(self) -> (i32, i32, i32) {
        match self {
            Face::Up => (0, 1, 0),
            Face::Down => (0, -1, 0),
            Face::North => (0, 0, -1),
            Face::South => (0, 0, 1),
            Face::East => (1, 0, 0),
            Face::West => (-1, 0, 0),
        }
    }

    pub fn opposite(self) -> Face {
        match self {
            Face::Up => Face::Down,
            Face::Down => Face::Up,
            Face::North => Face::South,
            Face::South => Face::North,
            Face::East => Face::West,
            Face::West => Face::East,
        }
    }

    /// Host state value (`"north"`, `"up"`, ...).
    pub fn name(self) -> &'static str {
        match self {
            Face::Up => "up",
            Face::Down => "down",
            Face::North => "north",
            Face::South => "south",
            Face::East => "east",
            Face::West => "west",
        }
    }

    pub fn from_name(name: &str) -> Option<Face> {
        match name {
            "up" => Some(Face::Up),
            "down" => Some(Face::Down),
            "north" => Some(Face::North),
            "south" => Some(Face::South),
            "east" => Some(Face::East),
            "west" => Some(Face::West),
            _ => None,
        }
    }
}

impl std::fmt::Display for Face {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
