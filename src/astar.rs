use crate::constants::{DIAGONAL_STEP_COST, ORTHOGONAL_STEP_COST};
use crate::grid_node::GridNodes;
use crate::movement_penalty::MovementPenaltyGrid;
use crate::room::Room;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DiagonalMovement {
    Always,
    /// A diagonal step needs both orthogonal cells it passes to be walkable.
    #[default]
    NoCornerCutting,
}

/// World-space waypoints of one path, popped nearest step first.
/// The first waypoint is the cell the agent already stands on.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MovementPath {
    waypoints: Vec<Vector2<f32>>, // goal first, next step last
}

impl MovementPath {
    pub fn pop(&mut self) -> Option<Vector2<f32>> {
        self.waypoints.pop()
    }

    pub fn peek(&self) -> Option<&Vector2<f32>> {
        self.waypoints.last()
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Waypoints in travel order.
    pub fn iter(&self) -> impl Iterator<Item = &Vector2<f32>> + '_ {
        self.waypoints.iter().rev()
    }
}

/// Path between two template-local tiles of `room`, as world-space cell centres.
pub fn build_path(
    room: &Room,
    movement_penalties: &MovementPenaltyGrid,
    start_tile: Vector2<i32>,
    goal_tile: Vector2<i32>,
) -> Option<MovementPath> {
    let path = find_path(
        movement_penalties,
        room.tile_to_grid(start_tile),
        room.tile_to_grid(goal_tile),
    )?;
    Some(MovementPath {
        waypoints: path
            .iter()
            .rev()
            .map(|grid_position| room.grid_to_world(*grid_position))
            .collect(),
    })
}

pub fn find_path(
    movement_penalties: &MovementPenaltyGrid,
    start: Vector2<i32>,
    goal: Vector2<i32>,
) -> Option<Vec<Vector2<i32>>> {
    find_path_with(movement_penalties, start, goal, DiagonalMovement::default())
}

/// A* over the grid cells of one room. Returns the cells from `start` to `goal`,
/// both included, or `None` when the goal cannot be reached.
pub fn find_path_with(
    movement_penalties: &MovementPenaltyGrid,
    start: Vector2<i32>,
    goal: Vector2<i32>,
    diagonal_movement: DiagonalMovement,
) -> Option<Vec<Vector2<i32>>> {
    let mut grid_nodes = GridNodes::new(movement_penalties.width(), movement_penalties.height());
    let start_index = grid_nodes.index(&start)?;
    let goal_index = grid_nodes.index(&goal)?;

    let mut open_nodes = vec![start_index];
    let mut is_open = vec![false; grid_nodes.len()];
    is_open[start_index] = true;
    let mut closed_nodes = HashSet::new();

    while !open_nodes.is_empty() {
        // stable, so equal nodes keep insertion order
        open_nodes.sort_by_key(|index| {
            let node = grid_nodes.get(*index);
            (node.f_cost(), node.h_cost)
        });
        let current = open_nodes.remove(0);
        is_open[current] = false;

        if current == goal_index {
            return Some(create_path(&grid_nodes, current));
        }
        closed_nodes.insert(current);

        let current_node = *grid_nodes.get(current);
        for i in -1..=1 {
            for j in -1..=1 {
                if i == 0 && j == 0 {
                    continue;
                }
                let position = current_node.grid_position + Vector2::new(i, j);
                let Some(neighbour) = grid_nodes.index(&position) else {
                    continue;
                };
                if !movement_penalties.is_walkable(&position) || closed_nodes.contains(&neighbour) {
                    continue;
                }
                if i != 0
                    && j != 0
                    && diagonal_movement == DiagonalMovement::NoCornerCutting
                    && !(movement_penalties
                        .is_walkable(&(current_node.grid_position + Vector2::new(i, 0)))
                        && movement_penalties
                            .is_walkable(&(current_node.grid_position + Vector2::new(0, j))))
                {
                    continue;
                }

                let new_cost = current_node.g_cost
                    + get_distance(&current_node.grid_position, &position)
                    + movement_penalties.penalty_at(&position);
                let node = grid_nodes.get_mut(neighbour);
                if new_cost < node.g_cost || !is_open[neighbour] {
                    node.g_cost = new_cost;
                    node.h_cost = get_distance(&position, &goal);
                    node.parent = Some(current);
                    if !is_open[neighbour] {
                        is_open[neighbour] = true;
                        open_nodes.push(neighbour);
                    }
                }
            }
        }
    }
    None
}

/// Octile distance in step cost units.
pub fn get_distance(a: &Vector2<i32>, b: &Vector2<i32>) -> u32 {
    let dx = (a.x - b.x).unsigned_abs();
    let dy = (a.y - b.y).unsigned_abs();
    if dx > dy {
        DIAGONAL_STEP_COST * dy + ORTHOGONAL_STEP_COST * (dx - dy)
    } else {
        DIAGONAL_STEP_COST * dx + ORTHOGONAL_STEP_COST * (dy - dx)
    }
}

fn create_path(grid_nodes: &GridNodes, goal: usize) -> Vec<Vector2<i32>> {
    let mut path = Vec::new();
    let mut next = Some(goal);
    while let Some(index) = next {
        let node = grid_nodes.get(index);
        path.push(node.grid_position);
        next = node.parent;
    }
    path.reverse();
    path
}
