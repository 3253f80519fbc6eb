use crate::constants::Orientation;
use crate::doorway::Doorway;
use crate::room_node::RoomNodeType;
use crate::room_node_graph::RoomNodeGraph;
use nalgebra::Vector2;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct DungeonLevel(pub u32);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TemplateId(pub String);

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TemplateId {
    fn from(value: &str) -> Self {
        TemplateId(value.to_string())
    }
}

/// How many enemies a room spawns at one dungeon level. Every pair is a
/// `[min, max)` range a random value is drawn from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomEnemySpawnParameters {
    pub dungeon_level: DungeonLevel,
    pub min_total_enemies: u32,
    pub max_total_enemies: u32,
    pub min_concurrent_enemies: u32,
    pub max_concurrent_enemies: u32,
    pub min_spawn_interval: u32,
    pub max_spawn_interval: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnableObjectsByLevel<T> {
    pub dungeon_level: DungeonLevel,
    pub ratios: Vec<(T, u32)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomTemplate {
    pub guid: TemplateId,
    pub room_node_type: RoomNodeType,
    pub lower_bounds: Vector2<i32>, // local tilemap position, not world position
    pub upper_bounds: Vector2<i32>,
    pub doorways: Vec<Doorway>,
    #[serde(default)]
    pub spawn_positions: Vec<Vector2<i32>>,
    #[serde(default)]
    pub enemies_by_level: Vec<SpawnableObjectsByLevel<String>>,
    #[serde(default)]
    pub enemy_spawn_parameters: Vec<RoomEnemySpawnParameters>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("lower bounds {lower:?} exceed upper bounds {upper:?}")]
    InvalidBounds { lower: (i32, i32), upper: (i32, i32) },
    #[error("template has no doorways")]
    NoDoorways,
    #[error("doorway at {0:?} has no orientation")]
    DoorwayWithoutOrientation((i32, i32)),
    #[error("more than one doorway faces {0:?}")]
    DuplicateDoorwayOrientation(Orientation),
    #[error("doorway at {0:?} lies outside the template bounds")]
    DoorwayOutOfBounds((i32, i32)),
    #[error("spawn parameters for {0:?} have an empty or inverted range")]
    InvalidSpawnParameters(DungeonLevel),
    #[error("spawn parameters for {0:?} have no enemy types")]
    MissingEnemyTable(DungeonLevel),
    #[error("template spawns enemies but has no spawn positions")]
    NoSpawnPositions,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateLibraryError {
    #[error("duplicate room template id {0}")]
    DuplicateTemplateId(TemplateId),
    #[error("no valid room templates")]
    Empty,
}

impl RoomTemplate {
    pub fn new(
        guid: impl Into<String>,
        room_node_type: RoomNodeType,
        lower_bounds: Vector2<i32>,
        upper_bounds: Vector2<i32>,
        doorways: Vec<Doorway>,
    ) -> Self {
        RoomTemplate {
            guid: TemplateId(guid.into()),
            room_node_type,
            lower_bounds,
            upper_bounds,
            doorways,
            spawn_positions: Vec::new(),
            enemies_by_level: Vec::new(),
            enemy_spawn_parameters: Vec::new(),
        }
    }

    pub fn contains(&self, position: &Vector2<i32>) -> bool {
        (self.lower_bounds.x..=self.upper_bounds.x).contains(&position.x)
            && (self.lower_bounds.y..=self.upper_bounds.y).contains(&position.y)
    }

    pub fn validate(&self) -> Result<(), TemplateError> {
        if self.lower_bounds.x > self.upper_bounds.x || self.lower_bounds.y > self.upper_bounds.y {
            return Err(TemplateError::InvalidBounds {
                lower: (self.lower_bounds.x, self.lower_bounds.y),
                upper: (self.upper_bounds.x, self.upper_bounds.y),
            });
        }
        if self.doorways.is_empty() {
            return Err(TemplateError::NoDoorways);
        }
        let mut orientations = BTreeSet::new();
        for doorway in self.doorways.iter() {
            let position = (doorway.position.x, doorway.position.y);
            if doorway.orientation == Orientation::None {
                return Err(TemplateError::DoorwayWithoutOrientation(position));
            }
            if !orientations.insert(doorway.orientation) {
                return Err(TemplateError::DuplicateDoorwayOrientation(doorway.orientation));
            }
            if !self.contains(&doorway.position) {
                return Err(TemplateError::DoorwayOutOfBounds(position));
            }
        }

        for parameters in self.enemy_spawn_parameters.iter() {
            let level = parameters.dungeon_level;
            if parameters.min_total_enemies > parameters.max_total_enemies
                || parameters.min_spawn_interval > parameters.max_spawn_interval
                || parameters.min_concurrent_enemies == 0
                || parameters.min_concurrent_enemies > parameters.max_concurrent_enemies
            {
                return Err(TemplateError::InvalidSpawnParameters(level));
            }
            let has_enemy_types = self.enemies_by_level.iter().any(|by_level| {
                by_level.dungeon_level == level && by_level.ratios.iter().any(|(_, r)| *r > 0)
            });
            if !has_enemy_types {
                return Err(TemplateError::MissingEnemyTable(level));
            }
        }
        if !self.enemy_spawn_parameters.is_empty() && self.spawn_positions.is_empty() {
            return Err(TemplateError::NoSpawnPositions);
        }
        Ok(())
    }
}

/// Immutable set of validated room templates keyed by their id.
#[derive(Debug, Clone)]
pub struct TemplateLibrary {
    templates: Vec<RoomTemplate>,
    index: HashMap<TemplateId, usize>,
}

impl TemplateLibrary {
    /// Invalid templates are logged and left out; duplicate ids reject the library.
    pub fn new(
        templates: impl IntoIterator<Item = RoomTemplate>,
    ) -> Result<Self, TemplateLibraryError> {
        let mut library = TemplateLibrary {
            templates: Vec::new(),
            index: HashMap::new(),
        };
        let mut seen = BTreeSet::new();
        for template in templates {
            if !seen.insert(template.guid.clone()) {
                log::warn!("duplicate room template id {}", template.guid);
                return Err(TemplateLibraryError::DuplicateTemplateId(template.guid));
            }
            if let Err(err) = template.validate() {
                log::warn!("excluding room template {}: {}", template.guid, err);
                continue;
            }
            library
                .index
                .insert(template.guid.clone(), library.templates.len());
            library.templates.push(template);
        }
        if library.templates.is_empty() {
            return Err(TemplateLibraryError::Empty);
        }
        Ok(library)
    }

    pub fn get(&self, guid: &TemplateId) -> Option<&RoomTemplate> {
        self.index.get(guid).map(|i| &self.templates[*i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoomTemplate> + '_ {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn has_room_node_type(&self, room_node_type: RoomNodeType) -> bool {
        self.templates
            .iter()
            .any(|template| template.room_node_type == room_node_type)
    }

    pub fn random_template<R: Rng>(
        &self,
        room_node_type: RoomNodeType,
        rng: &mut R,
    ) -> Option<&RoomTemplate> {
        let matching = self
            .templates
            .iter()
            .filter(|template| template.room_node_type == room_node_type)
            .collect::<Vec<_>>();
        matching.choose(rng).copied()
    }

    /// Returns the first room type used by `graph` that no template can build.
    /// Graph corridors need both north/south and east/west corridor templates.
    pub fn missing_room_node_type(&self, graph: &RoomNodeGraph) -> Option<RoomNodeType> {
        let mut required = BTreeSet::new();
        for node in graph.nodes().filter(|node| !node.room_node_type.is_none()) {
            if node.room_node_type.is_corridor() {
                required.insert(RoomNodeType::CorridorNS);
                required.insert(RoomNodeType::CorridorEW);
            } else {
                required.insert(node.room_node_type);
            }
        }
        required
            .into_iter()
            .find(|room_node_type| !self.has_room_node_type(*room_node_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(guid: &str, room_node_type: RoomNodeType) -> RoomTemplate {
        RoomTemplate::new(
            guid,
            room_node_type,
            Vector2::new(0, 0),
            Vector2::new(4, 4),
            vec![
                Doorway::new(Vector2::new(2, 4), Orientation::North),
                Doorway::new(Vector2::new(2, 0), Orientation::South),
            ],
        )
    }

    fn spawn_parameters(level: u32) -> RoomEnemySpawnParameters {
        RoomEnemySpawnParameters {
            dungeon_level: DungeonLevel(level),
            min_total_enemies: 1,
            max_total_enemies: 4,
            min_concurrent_enemies: 1,
            max_concurrent_enemies: 2,
            min_spawn_interval: 1,
            max_spawn_interval: 3,
        }
    }

    #[test]
    fn validation_rejects_bad_templates() {
        let mut template = square("a", RoomNodeType::SmallRoom);
        assert_eq!(template.validate(), Ok(()));

        template.doorways.push(Doorway::new(Vector2::new(1, 4), Orientation::North));
        assert_eq!(
            template.validate(),
            Err(TemplateError::DuplicateDoorwayOrientation(Orientation::North))
        );

        template.doorways = vec![Doorway::new(Vector2::new(9, 9), Orientation::East)];
        assert_eq!(template.validate(), Err(TemplateError::DoorwayOutOfBounds((9, 9))));

        template.doorways.clear();
        assert_eq!(template.validate(), Err(TemplateError::NoDoorways));

        template.upper_bounds = Vector2::new(-1, 4);
        assert!(matches!(template.validate(), Err(TemplateError::InvalidBounds { .. })));
    }

    #[test]
    fn spawn_parameters_need_enemy_tables_and_positions() {
        let mut template = square("a", RoomNodeType::SmallRoom);
        template.enemy_spawn_parameters.push(spawn_parameters(1));
        assert_eq!(
            template.validate(),
            Err(TemplateError::MissingEnemyTable(DungeonLevel(1)))
        );

        template.enemies_by_level.push(SpawnableObjectsByLevel {
            dungeon_level: DungeonLevel(1),
            ratios: vec![("slime".to_string(), 1)],
        });
        assert_eq!(template.validate(), Err(TemplateError::NoSpawnPositions));

        template.spawn_positions.push(Vector2::new(2, 2));
        assert_eq!(template.validate(), Ok(()));

        template.enemy_spawn_parameters[0].min_concurrent_enemies = 0;
        assert_eq!(
            template.validate(),
            Err(TemplateError::InvalidSpawnParameters(DungeonLevel(1)))
        );
    }

    #[test]
    fn library_excludes_invalid_and_rejects_duplicates() {
        let mut broken = square("broken", RoomNodeType::SmallRoom);
        broken.doorways.clear();
        let library = TemplateLibrary::new(vec![
            square("entrance", RoomNodeType::Entrance),
            broken,
        ])
        .unwrap();
        assert_eq!(library.len(), 1);
        assert!(library.get(&TemplateId::from("broken")).is_none());
        assert!(library.get(&TemplateId::from("entrance")).is_some());

        assert_eq!(
            TemplateLibrary::new(vec![
                square("x", RoomNodeType::Entrance),
                square("x", RoomNodeType::BossRoom),
            ])
            .unwrap_err(),
            TemplateLibraryError::DuplicateTemplateId(TemplateId::from("x"))
        );
        assert_eq!(
            TemplateLibrary::new(Vec::new()).unwrap_err(),
            TemplateLibraryError::Empty
        );
    }

    #[test]
    fn corridors_need_both_orientations() {
        let mut graph = RoomNodeGraph::new("g");
        let entrance = graph.add_node(RoomNodeType::Entrance);
        let corridor = graph.add_node(RoomNodeType::Corridor);
        graph.add_child(entrance, corridor).unwrap();

        let library = TemplateLibrary::new(vec![
            square("entrance", RoomNodeType::Entrance),
            square("ns", RoomNodeType::CorridorNS),
        ])
        .unwrap();
        assert_eq!(
            library.missing_room_node_type(&graph),
            Some(RoomNodeType::CorridorEW)
        );
    }

    #[test]
    fn deserializes_from_json() {
        let json = r#"{
            "guid": "room-1",
            "room_node_type": "SmallRoom",
            "lower_bounds": [-3, -3],
            "upper_bounds": [3, 3],
            "doorways": [
                { "position": [0, 3], "orientation": "North", "copy_region": null }
            ]
        }"#;
        let template: RoomTemplate = serde_json::from_str(json).unwrap();
        assert_eq!(template.guid, TemplateId::from("room-1"));
        assert_eq!(template.lower_bounds, Vector2::new(-3, -3));
        assert!(!template.doorways[0].is_connected);
        assert_eq!(template.validate(), Ok(()));
    }
}
