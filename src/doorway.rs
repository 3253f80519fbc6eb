use crate::constants::Orientation;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Tiles copied over an unconnected doorway to wall it off. For north/south
/// doorways the region is shifted one tile right, for east/west one tile down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorwayCopyRegion {
    pub start: Vector2<i32>,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doorway {
    pub position: Vector2<i32>, // template-local tile position
    pub orientation: Orientation,
    #[serde(default)]
    pub is_connected: bool,
    #[serde(default)]
    pub is_unavailable: bool,
    pub copy_region: Option<DoorwayCopyRegion>,
}

impl Doorway {
    pub fn new(position: Vector2<i32>, orientation: Orientation) -> Self {
        Doorway {
            position,
            orientation,
            is_connected: false,
            is_unavailable: false,
            copy_region: None,
        }
    }

    pub fn with_copy_region(mut self, start: Vector2<i32>, width: i32, height: i32) -> Self {
        self.copy_region = Some(DoorwayCopyRegion {
            start,
            width,
            height,
        });
        self
    }

    pub fn is_connectable(&self) -> bool {
        !self.is_connected && !self.is_unavailable
    }

    pub fn connect(&mut self) {
        self.is_connected = true;
        self.is_unavailable = true;
    }
}
