use std::collections::HashSet;

use serde::Serialize;

use crate::graph::{EntityKind, Relationship, SchemaEntity, SchemaGraph};
use crate::measure::NodeMetrics;

/// Input for a layout engine: sized nodes with ports, and port-to-port edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayoutGraph {
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutNode {
    pub id: String,
    pub kind: EntityKind,
    pub width: f64,
    pub height: f64,
    pub collapsed: bool,
    pub ports: Vec<Port>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PortSide {
    /// Incoming edges
    West,
    /// Outgoing edges
    East,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Port {
    pub id: String,
    pub side: PortSide,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub source_port: String,
    pub target_port: String,
}

pub fn node_source_port(entity: &str) -> String {
    format!("{entity}-source")
}

pub fn node_target_port(entity: &str) -> String {
    format!("{entity}-target")
}

pub fn field_source_port(entity: &str, field: &str) -> String {
    format!("{entity}.{field}-source")
}

pub fn field_target_port(entity: &str, field: &str) -> String {
    format!("{entity}.{field}-target")
}

impl LayoutGraph {
    /// Build layout input for `graph`. Entities in `collapsed` get header-only
    /// nodes without field ports. Relationships whose endpoints are not both
    /// entities of the graph (forward references) are left out.
    pub fn from_graph(graph: &SchemaGraph, collapsed: &HashSet<String>, metrics: &NodeMetrics) -> Self {
        let nodes: Vec<LayoutNode> = graph
            .entities
            .iter()
            .map(|e| {
                let is_collapsed = collapsed.contains(&e.id);
                let (width, height) = metrics.node_size(e, is_collapsed);
                LayoutNode {
                    id: e.id.clone(),
                    kind: e.kind(),
                    width,
                    height,
                    collapsed: is_collapsed,
                    ports: ports(e, is_collapsed),
                }
            })
            .collect();

        let edges = graph
            .relationships
            .iter()
            .filter_map(|rel| {
                let source = graph.entity(&rel.source_schema)?;
                let target = graph.entity(&rel.target_schema)?;
                Some(edge(rel, source, target, collapsed))
            })
            .collect();

        Self { nodes, edges }
    }

    pub fn node(&self, id: &str) -> Option<&LayoutNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

fn ports(entity: &SchemaEntity, collapsed: bool) -> Vec<Port> {
    let mut ports = vec![
        Port {
            id: node_target_port(&entity.id),
            side: PortSide::West,
        },
        Port {
            id: node_source_port(&entity.id),
            side: PortSide::East,
        },
    ];
    if !collapsed {
        for field in entity.fields() {
            ports.push(Port {
                id: field_source_port(&entity.id, &field.name),
                side: PortSide::East,
            });
            ports.push(Port {
                id: field_target_port(&entity.id, &field.name),
                side: PortSide::West,
            });
        }
    }
    ports
}

fn edge(rel: &Relationship, source: &SchemaEntity, target: &SchemaEntity, collapsed: &HashSet<String>) -> LayoutEdge {
    // a field port exists only on an expanded record that has the field
    let has_port = |entity: &SchemaEntity, field: &str| !collapsed.contains(&entity.id) && entity.field(field).is_some();

    let source_port = if !rel.source_field.is_empty() && has_port(source, &rel.source_field) {
        field_source_port(&source.id, &rel.source_field)
    } else {
        node_source_port(&source.id)
    };
    let target_port = match rel.target_field.as_deref() {
        Some(field) if has_port(target, field) => field_target_port(&target.id, field),
        _ => node_target_port(&target.id),
    };

    LayoutEdge {
        id: rel.id.clone(),
        source: source.id.clone(),
        target: target.id.clone(),
        source_port,
        target_port,
    }
}
