use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

// Dungeon build
pub const MAX_DUNGEON_BUILD_ATTEMPTS: u32 = 10;
pub const MAX_DUNGEON_REBUILD_ATTEMPTS_FOR_ROOM_GRAPH: u32 = 1000;
// Children a single room node may link to
pub const MAX_CHILD_CORRIDORS: usize = 3;

// A* pathfinding
pub const DEFAULT_MOVEMENT_PENALTY: u32 = 40;
pub const PREFERRED_PATH_MOVEMENT_PENALTY: u32 = 1;
pub const ORTHOGONAL_STEP_COST: u32 = 10;
pub const DIAGONAL_STEP_COST: u32 = 14; // sqrt(10*10 + 10*10) without floats
pub const FRAMES_TO_SPREAD_PATHFINDING_OVER: u32 = 60;
pub const PLAYER_MOVE_DISTANCE_TO_REBUILD_PATH: f32 = 3.0;
pub const ENEMY_PATH_REBUILD_COOLDOWN: f32 = 2.0;

// World units per grid cell
pub const CELL_SIZE: f32 = 1.0;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Orientation {
    North,
    East,
    South,
    West,
    None,
}

pub const ORIENTATIONS: [Orientation; 4] = [
    Orientation::North,
    Orientation::East,
    Orientation::South,
    Orientation::West,
];

impl Orientation {
    pub fn opposite(&self) -> Orientation {
        match self {
            Orientation::North => Orientation::South,
            Orientation::East => Orientation::West,
            Orientation::South => Orientation::North,
            Orientation::West => Orientation::East,
            Orientation::None => Orientation::None,
        }
    }

    pub fn is_opposite(&self, other: &Orientation) -> bool {
        *self != Orientation::None && self.opposite() == *other
    }

    pub fn is_north_south(&self) -> bool {
        matches!(self, Orientation::North | Orientation::South)
    }

    pub fn is_east_west(&self) -> bool {
        matches!(self, Orientation::East | Orientation::West)
    }

    /// One-cell shift applied to a room whose doorway with this orientation is being
    /// attached to a parent doorway, so the two rooms sit side by side.
    pub fn placement_adjustment(&self) -> Vector2<i32> {
        match self {
            Orientation::North => Vector2::new(0, -1),
            Orientation::East => Vector2::new(-1, 0),
            Orientation::South => Vector2::new(0, 1),
            Orientation::West => Vector2::new(1, 0),
            Orientation::None => Vector2::zeros(),
        }
    }
}
