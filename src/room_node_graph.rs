use crate::constants::MAX_CHILD_CORRIDORS;
use crate::room_node::{RoomId, RoomNode, RoomNodeType};
use pathfinding::prelude::bfs_reach;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomNodeGraphError {
    #[error("room node {0:?} does not exist")]
    UnknownNode(RoomId),
    #[error("room node {0:?} cannot be linked to itself")]
    SelfLink(RoomId),
    #[error("room node {child:?} is already a child of {parent:?}")]
    AlreadyLinked { parent: RoomId, child: RoomId },
    #[error("room node {child:?} is the parent of {parent:?}")]
    Cycle { parent: RoomId, child: RoomId },
    #[error("room node {0:?} already has a parent")]
    ChildAlreadyHasParent(RoomId),
    #[error("a boss room is already connected in this graph")]
    BossRoomAlreadyConnected,
    #[error("room node {0:?} has no room type")]
    NoneTypeChild(RoomId),
    #[error("the entrance {0:?} cannot be a child")]
    EntranceAsChild(RoomId),
    #[error("corridor {parent:?} cannot lead to corridor {child:?}")]
    CorridorToCorridor { parent: RoomId, child: RoomId },
    #[error("room {parent:?} must connect to {child:?} through a corridor")]
    RoomToRoom { parent: RoomId, child: RoomId },
    #[error("room node {0:?} already has the maximum number of children")]
    TooManyChildren(RoomId),
    #[error("corridor {0:?} already leads to a room")]
    CorridorAlreadyHasRoom(RoomId),
    #[error("graph has no entrance")]
    MissingEntrance,
    #[error("graph has more than one entrance")]
    MultipleEntrances,
    #[error("the entrance {entrance:?} has a parent {parent:?}")]
    EntranceHasParent { entrance: RoomId, parent: RoomId },
    #[error("room node stored under {key:?} has id {id:?}")]
    MismatchedNodeId { key: RoomId, id: RoomId },
    #[error("graph has more than one connected boss room")]
    MultipleBossRooms,
    #[error("room node {0:?} is not reachable from the entrance")]
    UnreachableNode(RoomId),
    #[error("room node {child:?} does not point back to its parent {parent:?}")]
    InconsistentLink { parent: RoomId, child: RoomId },
}

/// Abstract dungeon topology: which room types connect to which, before any
/// geometry is assigned. Rooted at a single entrance node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomNodeGraph {
    pub name: String,
    nodes: BTreeMap<RoomId, RoomNode>,
    next_id: RoomId,
}

impl RoomNodeGraph {
    pub fn new(name: impl Into<String>) -> Self {
        RoomNodeGraph {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn add_node(&mut self, room_node_type: RoomNodeType) -> RoomId {
        let id = self.next_id.gen_id();
        self.nodes.insert(id, RoomNode::new(id, room_node_type));
        id
    }

    /// Links `child` under `parent` following the authoring rules: corridors and
    /// rooms alternate, a corridor leads to one room, a room has at most
    /// `MAX_CHILD_CORRIDORS` children and only one boss room may be connected.
    pub fn add_child(&mut self, parent: RoomId, child: RoomId) -> Result<(), RoomNodeGraphError> {
        self.check_structural_link(parent, child)?;

        let parent_node = self.lookup(parent)?;
        let child_node = self.lookup(child)?;
        let parent_type = parent_node.room_node_type;
        let child_type = child_node.room_node_type;

        if child_type.is_none() {
            return Err(RoomNodeGraphError::NoneTypeChild(child));
        }
        if parent_node.parent_id == Some(child) {
            return Err(RoomNodeGraphError::Cycle { parent, child });
        }
        if child_type.is_corridor() && parent_type.is_corridor() {
            return Err(RoomNodeGraphError::CorridorToCorridor { parent, child });
        }
        if !child_type.is_corridor() && !parent_type.is_corridor() {
            return Err(RoomNodeGraphError::RoomToRoom { parent, child });
        }
        if !child_type.is_corridor() && !parent_node.child_ids.is_empty() {
            return Err(RoomNodeGraphError::CorridorAlreadyHasRoom(parent));
        }

        self.link(parent, child);
        Ok(())
    }

    /// Links `child` under `parent` checking only the invariants the dungeon builder
    /// relies on (single parent, entrance at the root, one connected boss room).
    pub fn link_child(&mut self, parent: RoomId, child: RoomId) -> Result<(), RoomNodeGraphError> {
        self.check_structural_link(parent, child)?;
        self.link(parent, child);
        Ok(())
    }

    pub fn remove_child(&mut self, parent: RoomId, child: RoomId) -> bool {
        let removed_child = match self.nodes.get_mut(&parent) {
            Some(parent_node) => {
                let len = parent_node.child_ids.len();
                parent_node.child_ids.retain(|id| *id != child);
                parent_node.child_ids.len() != len
            }
            None => false,
        };
        if let Some(child_node) = self.nodes.get_mut(&child) {
            if child_node.parent_id == Some(parent) {
                child_node.parent_id = None;
            }
        }
        removed_child
    }

    pub fn node(&self, id: RoomId) -> Option<&RoomNode> {
        self.nodes.get(&id)
    }

    pub fn node_by_type(&self, room_node_type: RoomNodeType) -> Option<&RoomNode> {
        self.nodes
            .values()
            .find(|node| node.room_node_type == room_node_type)
    }

    pub fn entrance(&self) -> Option<&RoomNode> {
        self.node_by_type(RoomNodeType::Entrance)
    }

    pub fn children_of(&self, id: RoomId) -> impl Iterator<Item = &RoomNode> + '_ {
        self.nodes
            .get(&id)
            .into_iter()
            .flat_map(|node| node.child_ids.iter())
            .filter_map(|child_id| self.nodes.get(child_id))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &RoomNode> + '_ {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Checks the graph can be handed to the dungeon builder.
    pub fn validate(&self) -> Result<(), RoomNodeGraphError> {
        let mut entrances = self.nodes.values().filter(|n| n.room_node_type.is_entrance());
        let entrance = entrances.next().ok_or(RoomNodeGraphError::MissingEntrance)?;
        if entrances.next().is_some() {
            return Err(RoomNodeGraphError::MultipleEntrances);
        }
        if let Some(parent) = entrance.parent_id {
            return Err(RoomNodeGraphError::EntranceHasParent {
                entrance: entrance.id,
                parent,
            });
        }

        if let Some((key, node)) = self.nodes.iter().find(|(key, node)| **key != node.id) {
            return Err(RoomNodeGraphError::MismatchedNodeId {
                key: *key,
                id: node.id,
            });
        }

        for node in self.nodes.values() {
            if node.child_ids.len() > MAX_CHILD_CORRIDORS {
                return Err(RoomNodeGraphError::TooManyChildren(node.id));
            }
            for (i, child_id) in node.child_ids.iter().enumerate() {
                if node.child_ids[..i].contains(child_id) {
                    return Err(RoomNodeGraphError::AlreadyLinked {
                        parent: node.id,
                        child: *child_id,
                    });
                }
                let child = self.lookup(*child_id)?;
                if child.parent_id != Some(node.id) {
                    return Err(RoomNodeGraphError::InconsistentLink {
                        parent: node.id,
                        child: *child_id,
                    });
                }
            }
            if let Some(parent_id) = node.parent_id {
                self.lookup(parent_id)?;
            }
        }

        let reachable: HashSet<RoomId> = bfs_reach(entrance.id, |id| {
            self.nodes
                .get(id)
                .map(|node| node.child_ids.clone())
                .unwrap_or_default()
        })
        .collect();

        // Unlinked `None` nodes are editor leftovers and never built.
        if let Some(node) = self
            .nodes
            .values()
            .find(|node| !node.room_node_type.is_none() && !reachable.contains(&node.id))
        {
            return Err(RoomNodeGraphError::UnreachableNode(node.id));
        }

        if self
            .nodes
            .values()
            .filter(|node| node.room_node_type.is_boss_room() && reachable.contains(&node.id))
            .count()
            > 1
        {
            return Err(RoomNodeGraphError::MultipleBossRooms);
        }

        Ok(())
    }

    fn lookup(&self, id: RoomId) -> Result<&RoomNode, RoomNodeGraphError> {
        self.nodes.get(&id).ok_or(RoomNodeGraphError::UnknownNode(id))
    }

    fn has_connected_boss_room(&self) -> bool {
        self.nodes
            .values()
            .any(|node| node.room_node_type.is_boss_room() && node.parent_id.is_some())
    }

    fn check_structural_link(&self, parent: RoomId, child: RoomId) -> Result<(), RoomNodeGraphError> {
        let parent_node = self.lookup(parent)?;
        let child_node = self.lookup(child)?;

        if parent == child {
            return Err(RoomNodeGraphError::SelfLink(parent));
        }
        if parent_node.child_ids.contains(&child) {
            return Err(RoomNodeGraphError::AlreadyLinked { parent, child });
        }
        if child_node.parent_id.is_some() {
            return Err(RoomNodeGraphError::ChildAlreadyHasParent(child));
        }
        if parent_node.child_ids.len() >= MAX_CHILD_CORRIDORS {
            return Err(RoomNodeGraphError::TooManyChildren(parent));
        }
        if child_node.room_node_type.is_entrance() {
            return Err(RoomNodeGraphError::EntranceAsChild(child));
        }
        if child_node.room_node_type.is_boss_room() && self.has_connected_boss_room() {
            return Err(RoomNodeGraphError::BossRoomAlreadyConnected);
        }
        Ok(())
    }

    fn link(&mut self, parent: RoomId, child: RoomId) {
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.child_ids.push(child);
        }
        if let Some(child_node) = self.nodes.get_mut(&child) {
            child_node.parent_id = Some(parent);
        }
    }
}
