use nalgebra::Vector2;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GridNode {
    pub grid_position: Vector2<i32>,
    pub g_cost: u32, // distance from the start node
    pub h_cost: u32, // distance to the goal node
    pub parent: Option<usize>,
}

impl GridNode {
    pub fn new(grid_position: Vector2<i32>) -> Self {
        GridNode {
            grid_position,
            g_cost: 0,
            h_cost: 0,
            parent: None,
        }
    }

    pub fn f_cost(&self) -> u32 {
        self.g_cost + self.h_cost
    }
}

/// Search nodes of one room grid, stored row by row.
#[derive(Debug, Clone)]
pub struct GridNodes {
    width: i32,
    height: i32,
    nodes: Vec<GridNode>,
}

impl GridNodes {
    pub fn new(width: i32, height: i32) -> Self {
        let (width, height) = (width.max(0), height.max(0));
        let nodes = (0..height)
            .flat_map(|y| (0..width).map(move |x| GridNode::new(Vector2::new(x, y))))
            .collect();
        GridNodes {
            width,
            height,
            nodes,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn index(&self, grid_position: &Vector2<i32>) -> Option<usize> {
        if grid_position.x < 0
            || grid_position.y < 0
            || self.width <= grid_position.x
            || self.height <= grid_position.y
        {
            return None;
        }
        Some((grid_position.y * self.width + grid_position.x) as usize)
    }

    /// `index` must come from [`GridNodes::index`].
    pub(crate) fn get(&self, index: usize) -> &GridNode {
        &self.nodes[index]
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> &mut GridNode {
        &mut self.nodes[index]
    }

    pub fn node_at(&self, grid_position: &Vector2<i32>) -> Option<&GridNode> {
        self.index(grid_position).map(|index| &self.nodes[index])
    }
}
