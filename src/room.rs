use crate::constants::{Orientation, CELL_SIZE};
use crate::doorway::Doorway;
use crate::intersect_rect_with_rect::intersect_rect_with_rect;
use crate::random_spawnable_object::RandomSpawnableObject;
use crate::room_node::{RoomId, RoomNode, RoomNodeType};
use crate::room_template::{
    DungeonLevel, RoomEnemySpawnParameters, RoomTemplate, SpawnableObjectsByLevel, TemplateId,
};
use nalgebra::Vector2;
use rand::Rng;

/// A room template placed into one generated dungeon.
#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    pub id: RoomId,
    pub template_id: TemplateId,
    pub room_node_type: RoomNodeType,
    pub lower_bounds: Vector2<i32>, // world
    pub upper_bounds: Vector2<i32>,
    pub template_lower_bounds: Vector2<i32>,
    pub template_upper_bounds: Vector2<i32>,
    pub spawn_positions: Vec<Vector2<i32>>,
    pub enemies_by_level: Vec<SpawnableObjectsByLevel<String>>,
    pub enemy_spawn_parameters: Vec<RoomEnemySpawnParameters>,
    pub parent_id: Option<RoomId>,
    pub child_ids: Vec<RoomId>,
    pub doorways: Vec<Doorway>,
    pub is_positioned: bool,
    pub is_lit: bool,
    pub is_cleared_of_enemies: bool,
    pub is_previously_visited: bool,
}

impl Room {
    /// The room starts at the template's own bounds and owns a fresh copy of its doorways.
    pub fn from_template(template: &RoomTemplate, room_node: &RoomNode) -> Self {
        Room {
            id: room_node.id,
            template_id: template.guid.clone(),
            room_node_type: template.room_node_type,
            lower_bounds: template.lower_bounds,
            upper_bounds: template.upper_bounds,
            template_lower_bounds: template.lower_bounds,
            template_upper_bounds: template.upper_bounds,
            spawn_positions: template.spawn_positions.clone(),
            enemies_by_level: template.enemies_by_level.clone(),
            enemy_spawn_parameters: template.enemy_spawn_parameters.clone(),
            parent_id: room_node.parent_id,
            child_ids: room_node.child_ids.clone(),
            doorways: template.doorways.clone(),
            is_positioned: false,
            is_lit: false,
            is_cleared_of_enemies: false,
            is_previously_visited: room_node.parent_id.is_none(),
        }
    }

    pub fn width(&self) -> i32 {
        self.template_upper_bounds.x - self.template_lower_bounds.x + 1
    }

    pub fn height(&self) -> i32 {
        self.template_upper_bounds.y - self.template_lower_bounds.y + 1
    }

    pub fn is_overlapping(&self, other: &Room) -> bool {
        intersect_rect_with_rect(
            (&self.lower_bounds, &self.upper_bounds),
            (&other.lower_bounds, &other.upper_bounds),
        )
    }

    pub fn connectable_doorway_indices(&self) -> Vec<usize> {
        self.doorways
            .iter()
            .enumerate()
            .filter(|(_, doorway)| doorway.is_connectable())
            .map(|(index, _)| index)
            .collect()
    }

    /// Index of the doorway that can face a parent doorway with `orientation`.
    pub fn opposite_doorway_index(&self, orientation: Orientation) -> Option<usize> {
        self.doorways
            .iter()
            .position(|doorway| orientation.is_opposite(&doorway.orientation))
    }

    pub fn doorway_world_position(&self, doorway: &Doorway) -> Vector2<i32> {
        self.lower_bounds + doorway.position - self.template_lower_bounds
    }

    /// Moves the room so its template-local `doorway` lands on the world tile `target`.
    pub fn move_doorway_to(&mut self, doorway_position: Vector2<i32>, target: Vector2<i32>) {
        self.lower_bounds = target + self.template_lower_bounds - doorway_position;
        self.upper_bounds = self.lower_bounds + self.template_upper_bounds - self.template_lower_bounds;
    }

    pub fn enemy_spawn_parameters(&self, dungeon_level: DungeonLevel) -> Option<&RoomEnemySpawnParameters> {
        self.enemy_spawn_parameters
            .iter()
            .find(|parameters| parameters.dungeon_level == dungeon_level)
    }

    pub fn number_of_enemies_to_spawn<R: Rng>(&self, dungeon_level: DungeonLevel, rng: &mut R) -> u32 {
        match self.enemy_spawn_parameters(dungeon_level) {
            Some(p) if p.min_total_enemies < p.max_total_enemies => {
                rng.gen_range(p.min_total_enemies..p.max_total_enemies)
            }
            Some(p) => p.min_total_enemies,
            None => 0,
        }
    }

    pub fn enemy_picker(&self, dungeon_level: DungeonLevel) -> RandomSpawnableObject<'_, String> {
        RandomSpawnableObject::new(&self.enemies_by_level, dungeon_level)
    }

    /// Grid cell (0-based inside the room) to the world position of the cell centre.
    pub fn grid_to_world(&self, grid_position: Vector2<i32>) -> Vector2<f32> {
        let cell = self.lower_bounds + grid_position;
        Vector2::new(
            cell.x as f32 * CELL_SIZE + CELL_SIZE * 0.5,
            cell.y as f32 * CELL_SIZE + CELL_SIZE * 0.5,
        )
    }

    pub fn world_to_grid(&self, world_position: Vector2<f32>) -> Vector2<i32> {
        Vector2::new(
            (world_position.x / CELL_SIZE).floor() as i32,
            (world_position.y / CELL_SIZE).floor() as i32,
        ) - self.lower_bounds
    }

    /// Template-local tile position to grid cell.
    pub fn tile_to_grid(&self, tile_position: Vector2<i32>) -> Vector2<i32> {
        tile_position - self.template_lower_bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn room() -> Room {
        let mut template = RoomTemplate::new(
            "t",
            RoomNodeType::SmallRoom,
            Vector2::new(-2, -2),
            Vector2::new(2, 2),
            vec![
                Doorway::new(Vector2::new(0, 2), Orientation::North),
                Doorway::new(Vector2::new(2, 0), Orientation::East),
            ],
        );
        template.enemy_spawn_parameters.push(RoomEnemySpawnParameters {
            dungeon_level: DungeonLevel(1),
            min_total_enemies: 2,
            max_total_enemies: 5,
            min_concurrent_enemies: 1,
            max_concurrent_enemies: 2,
            min_spawn_interval: 0,
            max_spawn_interval: 2,
        });
        template.enemies_by_level.push(SpawnableObjectsByLevel {
            dungeon_level: DungeonLevel(1),
            ratios: vec![("bat".to_string(), 1)],
        });
        let mut node = RoomNode::new(RoomId::first(), RoomNodeType::SmallRoom);
        node.parent_id = Some(RoomId::first());
        Room::from_template(&template, &node)
    }

    #[test]
    fn doorway_copies_are_owned_by_the_room() {
        let template = RoomTemplate::new(
            "t",
            RoomNodeType::Entrance,
            Vector2::new(0, 0),
            Vector2::new(4, 4),
            vec![Doorway::new(Vector2::new(2, 4), Orientation::North)],
        );
        let node = RoomNode::new(RoomId::first(), RoomNodeType::Entrance);
        let mut room = Room::from_template(&template, &node);
        room.doorways[0].connect();
        assert!(!template.doorways[0].is_connected);
        assert!(room.is_previously_visited);
        assert_eq!((room.width(), room.height()), (5, 5));
    }

    #[test]
    fn moving_a_doorway_moves_the_bounds() {
        let mut room = room();
        room.move_doorway_to(Vector2::new(0, 2), Vector2::new(10, 10));
        assert_eq!(room.lower_bounds, Vector2::new(8, 6));
        assert_eq!(room.upper_bounds, Vector2::new(12, 10));
        assert_eq!(room.doorway_world_position(&room.doorways[0]), Vector2::new(10, 10));
        assert_eq!(room.opposite_doorway_index(Orientation::South), Some(0));
        assert_eq!(room.opposite_doorway_index(Orientation::West), Some(1));
        assert_eq!(room.opposite_doorway_index(Orientation::North), None);
    }

    #[test]
    fn grid_and_world_positions_convert_both_ways() {
        let mut room = room();
        room.move_doorway_to(Vector2::new(0, 2), Vector2::new(10, 10));
        let world = room.grid_to_world(Vector2::new(1, 3));
        assert_eq!(world, Vector2::new(9.5, 9.5));
        assert_eq!(room.world_to_grid(world), Vector2::new(1, 3));
        assert_eq!(room.tile_to_grid(Vector2::new(-2, -2)), Vector2::new(0, 0));
    }

    #[test]
    fn enemy_count_is_drawn_for_the_level() {
        let room = room();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let count = room.number_of_enemies_to_spawn(DungeonLevel(1), &mut rng);
            assert!((2..5).contains(&count));
        }
        assert_eq!(room.number_of_enemies_to_spawn(DungeonLevel(2), &mut rng), 0);
        assert!(room.enemy_spawn_parameters(DungeonLevel(2)).is_none());
        assert_eq!(
            room.enemy_picker(DungeonLevel(1)).get_item(&mut rng).map(String::as_str),
            Some("bat")
        );
    }
}
