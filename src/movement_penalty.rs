use crate::constants::{
    Orientation, CELL_SIZE, DEFAULT_MOVEMENT_PENALTY, PREFERRED_PATH_MOVEMENT_PENALTY,
};
use crate::room::Room;
use nalgebra::Vector2;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CollisionTile {
    #[default]
    Walkable,
    Unwalkable,
    PreferredPath,
}

impl CollisionTile {
    pub fn movement_penalty(&self) -> u32 {
        match self {
            CollisionTile::Walkable => DEFAULT_MOVEMENT_PENALTY,
            CollisionTile::Unwalkable => 0,
            CollisionTile::PreferredPath => PREFERRED_PATH_MOVEMENT_PENALTY,
        }
    }
}

/// Collision tiles of one room keyed by template-local position. Missing tiles are walkable.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollisionTileMap {
    pub map: HashMap<Vector2<i32>, CollisionTile>,
}

impl CollisionTileMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, point: &Vector2<i32>) -> CollisionTile {
        self.map.get(point).copied().unwrap_or_default()
    }

    pub fn set(&mut self, point: Vector2<i32>, tile: CollisionTile) {
        self.map.insert(point, tile);
    }

    pub fn fill(&mut self, lower: Vector2<i32>, upper: Vector2<i32>, tile: CollisionTile) {
        for x in lower.x..=upper.x {
            for y in lower.y..=upper.y {
                self.set(Vector2::new(x, y), tile);
            }
        }
    }

    /// Walls off every doorway of `room` left unconnected by copying its copy region
    /// one tile across the opening: right for north/south doorways, down for east/west.
    pub fn block_unconnected_doorways(&mut self, room: &Room) {
        for doorway in room.doorways.iter().filter(|doorway| !doorway.is_connected) {
            let Some(region) = doorway.copy_region else {
                continue;
            };
            match doorway.orientation {
                Orientation::North | Orientation::South => {
                    for x in 0..region.width {
                        for y in 0..region.height {
                            let source = region.start + Vector2::new(x, -y);
                            self.set(source + Vector2::new(1, 0), self.get(&source));
                        }
                    }
                }
                Orientation::East | Orientation::West => {
                    for y in 0..region.height {
                        for x in 0..region.width {
                            let source = region.start + Vector2::new(x, -y);
                            self.set(source + Vector2::new(0, -1), self.get(&source));
                        }
                    }
                }
                Orientation::None => {}
            }
        }
    }
}

/// World-space bounds of a movable object.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleBounds {
    pub min: Vector2<f32>,
    pub max: Vector2<f32>,
}

/// Per-cell pathfinding cost of one placed room.
///
/// Two layers are kept. The static layer comes from the room's collision tiles
/// and never changes after construction. The item layer marks the cells covered
/// by movable objects and is rebuilt by [`MovementPenaltyGrid::update_moveable_obstacles`].
/// A cell costs the minimum of both, so 0 in either layer blocks it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementPenaltyGrid {
    width: i32,
    height: i32,
    lower_bounds: Vector2<i32>, // world position of grid cell (0, 0)
    movement_penalties: Vec<u32>,
    item_obstacles: Vec<u32>,
}

impl MovementPenaltyGrid {
    pub fn new(room: &Room, collision_tiles: &CollisionTileMap) -> Self {
        let mut collision_tiles = collision_tiles.clone();
        collision_tiles.block_unconnected_doorways(room);

        let mut grid = MovementPenaltyGrid::with_size(room.width(), room.height());
        grid.lower_bounds = room.lower_bounds;
        for y in 0..grid.height {
            for x in 0..grid.width {
                let tile = collision_tiles.get(&(room.template_lower_bounds + Vector2::new(x, y)));
                grid.movement_penalties[(y * grid.width + x) as usize] = tile.movement_penalty();
            }
        }
        grid
    }

    /// Grid with the default penalty everywhere, cell (0, 0) at the world origin.
    pub fn with_size(width: i32, height: i32) -> Self {
        let (width, height) = (width.max(0), height.max(0));
        let len = (width * height) as usize;
        MovementPenaltyGrid {
            width,
            height,
            lower_bounds: Vector2::zeros(),
            movement_penalties: vec![DEFAULT_MOVEMENT_PENALTY; len],
            item_obstacles: vec![DEFAULT_MOVEMENT_PENALTY; len],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn contains(&self, grid_position: &Vector2<i32>) -> bool {
        self.index(grid_position).is_some()
    }

    fn index(&self, grid_position: &Vector2<i32>) -> Option<usize> {
        if grid_position.x < 0
            || grid_position.y < 0
            || self.width <= grid_position.x
            || self.height <= grid_position.y
        {
            return None;
        }
        Some((grid_position.y * self.width + grid_position.x) as usize)
    }

    pub fn movement_penalty(&self, grid_position: &Vector2<i32>) -> u32 {
        self.index(grid_position)
            .map_or(0, |index| self.movement_penalties[index])
    }

    pub fn set_movement_penalty(&mut self, grid_position: &Vector2<i32>, penalty: u32) {
        if let Some(index) = self.index(grid_position) {
            self.movement_penalties[index] = penalty;
        }
    }

    pub fn item_obstacle(&self, grid_position: &Vector2<i32>) -> u32 {
        self.index(grid_position)
            .map_or(0, |index| self.item_obstacles[index])
    }

    /// Cost of entering a cell. Outside the grid everything is blocked.
    pub fn penalty_at(&self, grid_position: &Vector2<i32>) -> u32 {
        self.index(grid_position).map_or(0, |index| {
            self.movement_penalties[index].min(self.item_obstacles[index])
        })
    }

    pub fn is_walkable(&self, grid_position: &Vector2<i32>) -> bool {
        self.penalty_at(grid_position) != 0
    }

    /// Rebuilds the item layer from scratch, so calling it twice with the same
    /// bounds leaves the grid unchanged.
    pub fn update_moveable_obstacles(&mut self, obstacles: &[ObstacleBounds]) {
        self.item_obstacles.fill(DEFAULT_MOVEMENT_PENALTY);
        if self.width == 0 || self.height == 0 {
            return;
        }
        for obstacle in obstacles.iter() {
            let min = self.world_to_grid(&obstacle.min);
            let max = self.world_to_grid(&obstacle.max);
            if max.x < 0 || max.y < 0 || self.width <= min.x || self.height <= min.y {
                continue;
            }
            for x in min.x.max(0)..=max.x.min(self.width - 1) {
                for y in min.y.max(0)..=max.y.min(self.height - 1) {
                    self.item_obstacles[(y * self.width + x) as usize] = 0;
                }
            }
        }
    }

    fn world_to_grid(&self, world_position: &Vector2<f32>) -> Vector2<i32> {
        Vector2::new(
            (world_position.x / CELL_SIZE).floor() as i32,
            (world_position.y / CELL_SIZE).floor() as i32,
        ) - self.lower_bounds
    }

    /// The goal itself when walkable, otherwise a random walkable neighbour.
    /// Standing on a half-blocked tile can put the target on an obstacle cell.
    pub fn nearest_non_obstacle_position<R: Rng>(
        &self,
        goal: Vector2<i32>,
        rng: &mut R,
    ) -> Option<Vector2<i32>> {
        if self.is_walkable(&goal) {
            return Some(goal);
        }
        let mut surrounding_positions = (-1..=1)
            .flat_map(|x| (-1..=1).map(move |y| Vector2::new(x, y)))
            .filter(|offset| *offset != Vector2::zeros())
            .collect::<Vec<_>>();
        surrounding_positions.shuffle(rng);
        surrounding_positions
            .into_iter()
            .map(|offset| goal + offset)
            .find(|position| self.is_walkable(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doorway::Doorway;
    use crate::room_node::{RoomId, RoomNode, RoomNodeType};
    use crate::room_template::RoomTemplate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn room() -> Room {
        let template = RoomTemplate::new(
            "hall",
            RoomNodeType::SmallRoom,
            Vector2::new(-3, -3),
            Vector2::new(3, 3),
            vec![
                Doorway::new(Vector2::new(0, 3), Orientation::North).with_copy_region(
                    Vector2::new(-1, 3),
                    1,
                    1,
                ),
                Doorway::new(Vector2::new(3, 0), Orientation::East).with_copy_region(
                    Vector2::new(3, 1),
                    1,
                    1,
                ),
            ],
        );
        let mut room = Room::from_template(&template, &RoomNode::new(RoomId::first(), RoomNodeType::SmallRoom));
        room.move_doorway_to(Vector2::new(-3, -3), Vector2::new(10, 20));
        room
    }

    fn walled(room: &Room) -> CollisionTileMap {
        let (lower, upper) = (room.template_lower_bounds, room.template_upper_bounds);
        let mut tiles = CollisionTileMap::new();
        tiles.fill(lower, Vector2::new(upper.x, lower.y), CollisionTile::Unwalkable);
        tiles.fill(Vector2::new(lower.x, upper.y), upper, CollisionTile::Unwalkable);
        tiles.fill(lower, Vector2::new(lower.x, upper.y), CollisionTile::Unwalkable);
        tiles.fill(Vector2::new(upper.x, lower.y), upper, CollisionTile::Unwalkable);
        for doorway in room.doorways.iter() {
            tiles.set(doorway.position, CollisionTile::Walkable);
        }
        tiles
    }

    #[test]
    fn static_layer_follows_collision_tiles() {
        let room = room();
        let mut tiles = walled(&room);
        tiles.set(Vector2::new(0, 0), CollisionTile::PreferredPath);
        let grid = MovementPenaltyGrid::new(&room, &tiles);

        assert_eq!((grid.width(), grid.height()), (7, 7));
        assert_eq!(grid.penalty_at(&Vector2::new(0, 0)), 0);
        assert_eq!(grid.penalty_at(&Vector2::new(3, 3)), PREFERRED_PATH_MOVEMENT_PENALTY);
        assert_eq!(grid.penalty_at(&Vector2::new(1, 2)), DEFAULT_MOVEMENT_PENALTY);
        assert_eq!(grid.penalty_at(&Vector2::new(7, 3)), 0);
        assert!(!grid.contains(&Vector2::new(-1, 0)));
    }

    #[test]
    fn unconnected_doorways_are_walled_off() {
        let mut room = room();
        room.doorways[1].connect();
        let grid = MovementPenaltyGrid::new(&room, &walled(&room));

        // north doorway (0, 3) is template tile (3, 6) on the grid
        assert!(!grid.is_walkable(&Vector2::new(3, 6)));
        assert!(grid.is_walkable(&Vector2::new(6, 3)));

        room.doorways[1].is_connected = false;
        let grid = MovementPenaltyGrid::new(&room, &walled(&room));
        assert!(!grid.is_walkable(&Vector2::new(6, 3)));
    }

    #[test]
    fn moveable_obstacles_block_cells_until_refreshed() {
        let room = room();
        let mut grid = MovementPenaltyGrid::new(&room, &walled(&room));
        let crate_bounds = [ObstacleBounds {
            min: Vector2::new(12.2, 22.1),
            max: Vector2::new(13.7, 22.9),
        }];

        grid.update_moveable_obstacles(&crate_bounds);
        let once = grid.clone();
        grid.update_moveable_obstacles(&crate_bounds);
        assert_eq!(grid, once);

        assert_eq!(grid.item_obstacle(&Vector2::new(2, 2)), 0);
        assert_eq!(grid.item_obstacle(&Vector2::new(3, 2)), 0);
        assert_eq!(grid.movement_penalty(&Vector2::new(2, 2)), DEFAULT_MOVEMENT_PENALTY);
        assert!(!grid.is_walkable(&Vector2::new(2, 2)));
        assert!(grid.is_walkable(&Vector2::new(4, 2)));

        grid.update_moveable_obstacles(&[]);
        assert!(grid.is_walkable(&Vector2::new(2, 2)));
    }

    #[test]
    fn obstacles_outside_the_room_are_ignored() {
        let mut grid = MovementPenaltyGrid::with_size(4, 4);
        grid.update_moveable_obstacles(&[
            ObstacleBounds {
                min: Vector2::new(-5.0, -5.0),
                max: Vector2::new(-1.5, -1.5),
            },
            ObstacleBounds {
                min: Vector2::new(3.5, -2.0),
                max: Vector2::new(9.0, 0.5),
            },
        ]);
        assert!(!grid.is_walkable(&Vector2::new(3, 0)));
        assert_eq!(
            (0..4)
                .flat_map(|x| (0..4).map(move |y| Vector2::new(x, y)))
                .filter(|p| !grid.is_walkable(p))
                .count(),
            1
        );
    }

    #[test]
    fn nearest_position_steps_off_obstacles() {
        let mut grid = MovementPenaltyGrid::with_size(3, 3);
        let mut rng = StdRng::seed_from_u64(11);
        let centre = Vector2::new(1, 1);
        assert_eq!(grid.nearest_non_obstacle_position(centre, &mut rng), Some(centre));

        grid.set_movement_penalty(&centre, 0);
        let nearest = grid.nearest_non_obstacle_position(centre, &mut rng).unwrap();
        let offset = nearest - centre;
        assert!(grid.is_walkable(&nearest));
        assert!(offset.x.abs() <= 1 && offset.y.abs() <= 1);

        for x in 0..3 {
            for y in 0..3 {
                grid.set_movement_penalty(&Vector2::new(x, y), 0);
            }
        }
        assert_eq!(grid.nearest_non_obstacle_position(centre, &mut rng), None);
    }
}
