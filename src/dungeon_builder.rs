use crate::constants::{
    Orientation, MAX_DUNGEON_BUILD_ATTEMPTS, MAX_DUNGEON_REBUILD_ATTEMPTS_FOR_ROOM_GRAPH,
};
use crate::room::Room;
use crate::room_node::{RoomId, RoomNode, RoomNodeType};
use crate::room_node_graph::{RoomNodeGraph, RoomNodeGraphError};
use crate::room_template::{DungeonLevel, RoomTemplate, TemplateLibrary, TemplateLibraryError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use thiserror::Error;

pub type RoomRegistry = BTreeMap<RoomId, Room>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DungeonBuilderConfig {
    pub seed: Option<u64>, // Seed value for random dungeon generation
    pub max_build_attempts: u32,
    pub max_rebuild_attempts_per_graph: u32,
    pub dungeon_level: DungeonLevel, // Selects the enemy spawn parameters of each room
}

impl Default for DungeonBuilderConfig {
    fn default() -> Self {
        DungeonBuilderConfig {
            seed: None,
            max_build_attempts: MAX_DUNGEON_BUILD_ATTEMPTS,
            max_rebuild_attempts_per_graph: MAX_DUNGEON_REBUILD_ATTEMPTS_FOR_ROOM_GRAPH,
            dungeon_level: DungeonLevel::default(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BuildState {
    Idle,
    Building,
    Ready,
    Failed,
}

/// Malformed input. Retrying cannot fix these, so generation stops immediately.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no room node graphs to choose from")]
    NoRoomNodeGraphs,
    #[error("room node graph {name:?} is malformed: {source}")]
    InvalidRoomNodeGraph {
        name: String,
        #[source]
        source: RoomNodeGraphError,
    },
    #[error("room node graph {graph:?} uses {room_node_type:?} but no template provides it")]
    MissingTemplate {
        graph: String,
        room_node_type: RoomNodeType,
    },
    #[error(transparent)]
    TemplateLibrary(#[from] TemplateLibraryError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("no dungeon layout found after {build_attempts} build attempts")]
    Exhausted { build_attempts: u32 },
}

/// Places rooms from a template library following one of several room node graphs.
///
/// The builder owns the resulting rooms. They are only visible once a build
/// succeeds: every failed attempt clears the registry before the next one.
#[derive(Debug)]
pub struct DungeonBuilder<R = StdRng> {
    config: DungeonBuilderConfig,
    rng: R,
    rooms: RoomRegistry,
    state: BuildState,
}

impl DungeonBuilder<StdRng> {
    pub fn new(config: DungeonBuilderConfig) -> Self {
        let rng: StdRng = config
            .seed
            .map(SeedableRng::seed_from_u64)
            .unwrap_or_else(StdRng::from_entropy);
        DungeonBuilder::with_rng(config, rng)
    }
}

impl<R: Rng> DungeonBuilder<R> {
    pub fn with_rng(config: DungeonBuilderConfig, rng: R) -> Self {
        DungeonBuilder {
            config,
            rng,
            rooms: RoomRegistry::new(),
            state: BuildState::Idle,
        }
    }

    pub fn config(&self) -> &DungeonBuilderConfig {
        &self.config
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(&id)
    }

    pub fn room_mut(&mut self, id: RoomId) -> Option<&mut Room> {
        self.rooms.get_mut(&id)
    }

    pub fn entrance_room(&self) -> Option<&Room> {
        self.rooms
            .values()
            .find(|room| room.room_node_type.is_entrance())
    }

    pub fn into_rooms(self) -> RoomRegistry {
        self.rooms
    }

    pub fn clear(&mut self) {
        self.rooms.clear();
        self.state = BuildState::Idle;
    }

    pub fn generate(
        &mut self,
        room_node_graphs: &[RoomNodeGraph],
        templates: &TemplateLibrary,
    ) -> Result<&RoomRegistry, BuildError> {
        self.rooms.clear();
        self.state = BuildState::Building;

        if let Err(err) = validate_inputs(room_node_graphs, templates) {
            log::warn!("dungeon generation aborted: {err}");
            self.state = BuildState::Failed;
            return Err(err.into());
        }

        let mut build_attempts = 0;
        while build_attempts < self.config.max_build_attempts {
            build_attempts += 1;
            let room_node_graph = &room_node_graphs[self.rng.gen_range(0..room_node_graphs.len())];

            for rebuild_attempt in 1..=self.config.max_rebuild_attempts_per_graph {
                self.rooms.clear();
                if self.attempt_to_build(room_node_graph, templates) {
                    log::debug!(
                        "built dungeon from graph {:?} with {} rooms (build attempt {}, rebuild {})",
                        room_node_graph.name,
                        self.rooms.len(),
                        build_attempts,
                        rebuild_attempt
                    );
                    self.state = BuildState::Ready;
                    return Ok(&self.rooms);
                }
            }
            log::debug!(
                "graph {:?} could not be laid out in {} rebuilds",
                room_node_graph.name,
                self.config.max_rebuild_attempts_per_graph
            );
        }

        self.rooms.clear();
        self.state = BuildState::Failed;
        log::warn!("dungeon generation failed after {build_attempts} build attempts");
        Err(BuildError::Exhausted { build_attempts })
    }

    // Breadth first from the entrance; a node's parent is always placed before it.
    fn attempt_to_build(&mut self, room_node_graph: &RoomNodeGraph, templates: &TemplateLibrary) -> bool {
        let Some(entrance) = room_node_graph.entrance() else {
            return false;
        };

        let mut open_room_nodes = VecDeque::from([entrance]);
        while let Some(room_node) = open_room_nodes.pop_front() {
            open_room_nodes.extend(room_node_graph.children_of(room_node.id));

            if room_node.room_node_type.is_entrance() {
                let Some(template) = templates.random_template(room_node.room_node_type, &mut self.rng)
                else {
                    return false;
                };
                let mut room = self.create_room(template, room_node);
                room.is_positioned = true;
                self.rooms.insert(room.id, room);
            } else if !self.place_room_with_no_overlaps(room_node, templates) {
                return false;
            }
        }
        true
    }

    // Doorways are tried in random order, not exhaustively: an attempt can fail on a
    // layout that has a solution, and the outer retry loops absorb that.
    fn place_room_with_no_overlaps(&mut self, room_node: &RoomNode, templates: &TemplateLibrary) -> bool {
        let Some(parent_id) = room_node.parent_id else {
            return false;
        };

        loop {
            let Some(parent_room) = self.rooms.get(&parent_id) else {
                return false;
            };
            let Some(&parent_doorway_index) =
                parent_room.connectable_doorway_indices().choose(&mut self.rng)
            else {
                log::debug!(
                    "room {:?} has no doorway left for {:?}",
                    parent_id,
                    room_node.id
                );
                return false;
            };
            let parent_orientation = parent_room.doorways[parent_doorway_index].orientation;

            let Some(template) =
                template_consistent_with_parent(room_node, parent_orientation, templates, &mut self.rng)
            else {
                self.mark_doorway_unavailable(parent_id, parent_doorway_index);
                continue;
            };

            let mut room = self.create_room(template, room_node);
            if self.place_room(parent_id, parent_doorway_index, &mut room) {
                room.is_positioned = true;
                self.rooms.insert(room.id, room);
                return true;
            }
        }
    }

    // Once tried, the parent doorway is unavailable for the rest of this attempt.
    fn place_room(&mut self, parent_id: RoomId, parent_doorway_index: usize, room: &mut Room) -> bool {
        let Some(parent_room) = self.rooms.get(&parent_id) else {
            return false;
        };
        let parent_doorway = &parent_room.doorways[parent_doorway_index];
        let parent_doorway_position = parent_room.doorway_world_position(parent_doorway);

        let Some(doorway_index) = room.opposite_doorway_index(parent_doorway.orientation) else {
            self.mark_doorway_unavailable(parent_id, parent_doorway_index);
            return false;
        };
        let doorway_position = room.doorways[doorway_index].position;
        let adjustment = room.doorways[doorway_index].orientation.placement_adjustment();
        room.move_doorway_to(doorway_position, parent_doorway_position + adjustment);

        let overlapping = self
            .rooms
            .values()
            .any(|other| other.id != room.id && other.is_positioned && room.is_overlapping(other));

        let Some(parent_room) = self.rooms.get_mut(&parent_id) else {
            return false;
        };
        let parent_doorway = &mut parent_room.doorways[parent_doorway_index];
        if overlapping {
            parent_doorway.is_unavailable = true;
            return false;
        }
        parent_doorway.connect();
        room.doorways[doorway_index].connect();
        true
    }

    fn mark_doorway_unavailable(&mut self, room_id: RoomId, doorway_index: usize) {
        if let Some(doorway) = self
            .rooms
            .get_mut(&room_id)
            .and_then(|room| room.doorways.get_mut(doorway_index))
        {
            doorway.is_unavailable = true;
        }
    }

    fn create_room(&mut self, template: &RoomTemplate, room_node: &RoomNode) -> Room {
        let mut room = Room::from_template(template, room_node);
        room.is_cleared_of_enemies =
            room.number_of_enemies_to_spawn(self.config.dungeon_level, &mut self.rng) == 0;
        room
    }
}

pub fn generate_dungeon(
    room_node_graphs: &[RoomNodeGraph],
    templates: &TemplateLibrary,
    config: DungeonBuilderConfig,
) -> Result<RoomRegistry, BuildError> {
    let mut builder = DungeonBuilder::new(config);
    builder.generate(room_node_graphs, templates)?;
    Ok(builder.into_rooms())
}

// Graph corridors become north/south or east/west corridor templates depending
// on the doorway they hang from.
fn template_consistent_with_parent<'a, R: Rng>(
    room_node: &RoomNode,
    parent_orientation: Orientation,
    templates: &'a TemplateLibrary,
    rng: &mut R,
) -> Option<&'a RoomTemplate> {
    let room_node_type = if room_node.room_node_type.is_corridor() {
        match parent_orientation {
            Orientation::North | Orientation::South => RoomNodeType::CorridorNS,
            Orientation::East | Orientation::West => RoomNodeType::CorridorEW,
            Orientation::None => return None,
        }
    } else {
        room_node.room_node_type
    };
    templates.random_template(room_node_type, rng)
}

fn validate_inputs(
    room_node_graphs: &[RoomNodeGraph],
    templates: &TemplateLibrary,
) -> Result<(), ConfigError> {
    if room_node_graphs.is_empty() {
        return Err(ConfigError::NoRoomNodeGraphs);
    }
    if templates.is_empty() {
        return Err(TemplateLibraryError::Empty.into());
    }
    for room_node_graph in room_node_graphs {
        room_node_graph
            .validate()
            .map_err(|source| ConfigError::InvalidRoomNodeGraph {
                name: room_node_graph.name.clone(),
                source,
            })?;
        if let Some(room_node_type) = templates.missing_room_node_type(room_node_graph) {
            return Err(ConfigError::MissingTemplate {
                graph: room_node_graph.name.clone(),
                room_node_type,
            });
        }
    }
    Ok(())
}
