use serde::{Deserialize, Serialize};

#[derive(Ord, PartialOrd, PartialEq, Eq, Hash, Copy, Clone, Debug, Serialize, Deserialize)]
pub struct RoomId(u64);

impl RoomId {
    pub fn first() -> Self {
        RoomId(1)
    }

    pub fn gen_id(&mut self) -> Self {
        let ret = *self;
        self.0 += 1;
        ret
    }

    pub fn inner(&self) -> u64 {
        self.0
    }
}

impl Default for RoomId {
    fn default() -> Self {
        RoomId::first()
    }
}

/// Room node graphs only use `Corridor`; templates are authored as either
/// `CorridorNS` or `CorridorEW` and picked by the orientation of the parent doorway.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum RoomNodeType {
    Entrance,
    Corridor,
    CorridorNS,
    CorridorEW,
    SmallRoom,
    MediumRoom,
    LargeRoom,
    ChestRoom,
    BossRoom,
    None,
}

impl RoomNodeType {
    pub fn is_entrance(&self) -> bool {
        *self == RoomNodeType::Entrance
    }

    pub fn is_corridor(&self) -> bool {
        matches!(
            self,
            RoomNodeType::Corridor | RoomNodeType::CorridorNS | RoomNodeType::CorridorEW
        )
    }

    pub fn is_corridor_ns(&self) -> bool {
        *self == RoomNodeType::CorridorNS
    }

    pub fn is_corridor_ew(&self) -> bool {
        *self == RoomNodeType::CorridorEW
    }

    pub fn is_boss_room(&self) -> bool {
        *self == RoomNodeType::BossRoom
    }

    pub fn is_none(&self) -> bool {
        *self == RoomNodeType::None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomNode {
    pub id: RoomId,
    pub room_node_type: RoomNodeType,
    pub parent_id: Option<RoomId>,
    pub child_ids: Vec<RoomId>,
}

impl RoomNode {
    pub fn new(id: RoomId, room_node_type: RoomNodeType) -> Self {
        RoomNode {
            id,
            room_node_type,
            parent_id: None,
            child_ids: Vec::new(),
        }
    }
}
