//! Node placement.
//!
//! Real diagram layout is delegated to an external engine through
//! [`LayoutEngine`]. [`GridLayout`] is a deterministic row-major fallback.

use serde::Serialize;

use crate::ir::LayoutGraph;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodePosition {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Placement result: one position per node, in node order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layout {
    pub nodes: Vec<NodePosition>,
    pub width: f64,
    pub height: f64,
}

impl Layout {
    pub fn position(&self, id: &str) -> Option<&NodePosition> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

pub trait LayoutEngine {
    fn layout(&self, graph: &LayoutGraph) -> Layout;
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    pub columns: usize,
    pub gap_x: f64,
    pub gap_y: f64,
    pub margin: f64,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            columns: 4,
            gap_x: 80.0,
            gap_y: 60.0,
            margin: 40.0,
        }
    }
}

impl LayoutEngine for GridLayout {
    fn layout(&self, graph: &LayoutGraph) -> Layout {
        let columns = self.columns.max(1);
        let mut nodes = Vec::with_capacity(graph.nodes.len());
        let mut y = self.margin;
        let mut max_width: f64 = 0.0;

        for row in graph.nodes.chunks(columns) {
            let mut x = self.margin;
            let mut max_height: f64 = 0.0;

            for node in row {
                nodes.push(NodePosition {
                    id: node.id.clone(),
                    x,
                    y,
                    width: node.width,
                    height: node.height,
                });
                x += node.width + self.gap_x;
                max_height = max_height.max(node.height);
            }

            max_width = max_width.max(x - self.gap_x + self.margin);
            y += max_height + self.gap_y;
        }

        let height = if nodes.is_empty() {
            0.0
        } else {
            y - self.gap_y + self.margin
        };

        Layout {
            nodes,
            width: max_width,
            height,
        }
    }
}
