pub mod astar;
pub mod constants;
pub mod doorway;
pub mod dungeon_builder;
pub mod grid_node;
pub mod intersect_rect_with_rect;
pub mod movement_penalty;
pub mod path_schedule;
pub mod random_spawnable_object;
pub mod room;
pub mod room_node;
pub mod room_node_graph;
pub mod room_template;
