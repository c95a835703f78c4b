//! The rendered view model: one node per class, one edge per connection.
//!
//! A [`DiagramView`] is always rebuilt from scratch out of the backend's class
//! and connection lists. Each node's data carries the complete edge list and
//! an id-to-label map of every node, so incoming-relationship summaries can be
//! derived from a single node without consulting the rest of the view.

use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;

use kinro_core::{
    geometry::Point,
    identifier::Id,
    schema::{Attribute, ClassRecord, Connection, RelationKind},
};

/// Label shown for an incoming relationship whose source is not in the view.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// A rendered connection.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeView {
    pub id: Id,
    pub source: Id,
    pub target: Id,
    pub kind: RelationKind,
}

impl EdgeView {
    /// Returns the edge label, which is the relationship type's wire name.
    pub fn label(&self) -> &'static str {
        self.kind.as_str()
    }
}

impl From<&Connection> for EdgeView {
    fn from(connection: &Connection) -> Self {
        Self {
            id: connection.id.clone(),
            source: connection.source_class.clone(),
            target: connection.target_class.clone(),
            kind: connection.relationship_type,
        }
    }
}

/// Data carried by a node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    pub label: String,
    pub attributes: Vec<Attribute>,
    pub edges: Arc<[EdgeView]>,
    pub node_labels: Arc<IndexMap<Id, String>>,
}

/// How a node obtained its current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Stored at the `(0, 0)` sentinel and not laid out yet.
    Unplaced,
    /// Authoritative position read from the backend.
    Stored,
    /// Position assigned by the layout engine.
    Computed,
    /// Position set locally by a drag gesture.
    Dragged,
}

/// One incoming relationship of a node, as shown in its summary.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingRelationship {
    pub source_label: String,
    pub kind: RelationKind,
}

/// A rendered class.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeView {
    id: Id,
    data: NodeData,
    position: Point,
    placement: Placement,
}

impl NodeView {
    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn data(&self) -> &NodeData {
        &self.data
    }

    pub fn label(&self) -> &str {
        &self.data.label
    }

    /// Returns the top-left corner of the node box.
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub(crate) fn place(&mut self, position: Point, placement: Placement) {
        self.position = position;
        self.placement = placement;
    }

    /// Returns the relationships that end at this node, in edge order.
    ///
    /// Sources missing from the label map are reported as [`UNKNOWN_LABEL`].
    pub fn incoming_relationships(&self) -> Vec<IncomingRelationship> {
        self.data
            .edges
            .iter()
            .filter(|edge| edge.target == self.id)
            .map(|edge| IncomingRelationship {
                source_label: self
                    .data
                    .node_labels
                    .get(&edge.source)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
                kind: edge.kind,
            })
            .collect()
    }
}

/// The node and edge collections of the diagram.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagramView {
    nodes: Vec<NodeView>,
    edges: Vec<EdgeView>,
}

impl DiagramView {
    /// Builds the view from the backend's class and connection lists.
    ///
    /// Connections whose source or target is not in `classes` are dropped.
    /// Nodes keep their stored position; nodes stored at `(0, 0)` are marked
    /// [`Placement::Unplaced`] for the layout engine.
    pub fn build(classes: Vec<ClassRecord>, connections: Vec<Connection>) -> Self {
        let node_labels: IndexMap<Id, String> = classes
            .iter()
            .map(|class| (class.id.clone(), class.name.clone()))
            .collect();

        let edges: Vec<EdgeView> = connections
            .iter()
            .filter(|connection| {
                node_labels.contains_key(&connection.source_class)
                    && node_labels.contains_key(&connection.target_class)
            })
            .map(EdgeView::from)
            .collect();

        let dropped = connections.len() - edges.len();
        if dropped > 0 {
            debug!(dropped; "Dropped connections with missing endpoints");
        }

        let shared_edges: Arc<[EdgeView]> = edges.clone().into();
        let node_labels = Arc::new(node_labels);

        let nodes = classes
            .into_iter()
            .map(|class| {
                let placement = if class.has_authoritative_position() {
                    Placement::Stored
                } else {
                    Placement::Unplaced
                };
                NodeView {
                    position: class.position(),
                    placement,
                    data: NodeData {
                        label: class.name,
                        attributes: class.attributes,
                        edges: Arc::clone(&shared_edges),
                        node_labels: Arc::clone(&node_labels),
                    },
                    id: class.id,
                }
            })
            .collect();

        Self { nodes, edges }
    }

    pub fn nodes(&self) -> &[NodeView] {
        &self.nodes
    }

    pub fn edges(&self) -> &[EdgeView] {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node for `id`, if present.
    pub fn node(&self, id: &Id) -> Option<&NodeView> {
        self.nodes.iter().find(|node| &node.id == id)
    }

    pub(crate) fn node_mut(&mut self, id: &Id) -> Option<&mut NodeView> {
        self.nodes.iter_mut().find(|node| &node.id == id)
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [NodeView] {
        &mut self.nodes
    }

    /// Whether an edge already joins the ordered pair `(source, target)`.
    pub fn has_connection(&self, source: &Id, target: &Id) -> bool {
        self.edges
            .iter()
            .any(|edge| &edge.source == source && &edge.target == target)
    }

    /// Changes a node's label in place, including every node's label map.
    ///
    /// Returns `false` if no node has `id`.
    pub(crate) fn rename_node(&mut self, id: &Id, label: &str) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        node.data.label = label.to_string();

        let mut node_labels = node.data.node_labels.as_ref().clone();
        node_labels.insert(id.clone(), label.to_string());
        let node_labels = Arc::new(node_labels);
        for node in &mut self.nodes {
            node.data.node_labels = Arc::clone(&node_labels);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use kinro_core::schema::DataType;

    use super::*;

    fn class(id: u64, name: &str, x: f32, y: f32) -> ClassRecord {
        ClassRecord {
            id: Id::from(id),
            name: name.to_string(),
            position_x: x,
            position_y: y,
            attributes: Vec::new(),
        }
    }

    fn connection(id: u64, source: u64, target: u64, kind: RelationKind) -> Connection {
        Connection {
            id: Id::from(id),
            source_class: Id::from(source),
            target_class: Id::from(target),
            relationship_type: kind,
        }
    }

    #[test]
    fn test_build_marks_placement_and_drops_dangling_edges() {
        let view = DiagramView::build(
            vec![class(1, "Persona", 0.0, 0.0), class(2, "Pedido", 10.0, 40.0)],
            vec![
                connection(10, 1, 2, RelationKind::OneToMany),
                connection(11, 1, 99, RelationKind::OneToOne),
            ],
        );

        assert_eq!(view.nodes().len(), 2);
        assert_eq!(view.edges().len(), 1);
        assert_eq!(view.edges()[0].label(), "1-N");
        assert_eq!(view.nodes()[0].placement(), Placement::Unplaced);
        assert_eq!(view.nodes()[1].placement(), Placement::Stored);
        assert_eq!(view.nodes()[1].data().edges.len(), 1);
    }

    #[test]
    fn test_incoming_relationships() {
        let mut pedido = class(2, "Pedido", 0.0, 0.0);
        pedido.attributes.push(Attribute {
            id: Id::new("a"),
            class_id: Id::from(2u64),
            name: "total".to_string(),
            data_type: DataType::Float,
            properties: Vec::new(),
        });
        let view = DiagramView::build(
            vec![class(1, "Persona", 0.0, 0.0), pedido],
            vec![connection(10, 1, 2, RelationKind::ManyToMany)],
        );

        let incoming = view.node(&Id::from(2u64)).unwrap().incoming_relationships();
        assert_eq!(
            incoming,
            vec![IncomingRelationship {
                source_label: "Persona".to_string(),
                kind: RelationKind::ManyToMany,
            }]
        );
        assert!(view
            .node(&Id::from(1u64))
            .unwrap()
            .incoming_relationships()
            .is_empty());
    }

    #[test]
    fn test_unknown_source_label() {
        let mut view = DiagramView::build(
            vec![class(1, "A", 0.0, 0.0), class(2, "B", 0.0, 0.0)],
            vec![connection(10, 1, 2, RelationKind::OneToOne)],
        );
        let node = view.node_mut(&Id::from(2u64)).unwrap();
        node.data.node_labels = Arc::new(IndexMap::new());

        let incoming = view.node(&Id::from(2u64)).unwrap().incoming_relationships();
        assert_eq!(incoming[0].source_label, UNKNOWN_LABEL);
    }

    #[test]
    fn test_rename_updates_every_label_map() {
        let mut view = DiagramView::build(
            vec![class(1, "A", 0.0, 0.0), class(2, "B", 0.0, 0.0)],
            vec![connection(10, 1, 2, RelationKind::OneToOne)],
        );

        assert!(view.rename_node(&Id::from(1u64), "Cliente"));
        assert!(!view.rename_node(&Id::from(7u64), "Nobody"));

        assert_eq!(view.node(&Id::from(1u64)).unwrap().label(), "Cliente");
        let incoming = view.node(&Id::from(2u64)).unwrap().incoming_relationships();
        assert_eq!(incoming[0].source_label, "Cliente");
    }

    #[test]
    fn test_has_connection_is_directional() {
        let view = DiagramView::build(
            vec![class(1, "A", 0.0, 0.0), class(2, "B", 0.0, 0.0)],
            vec![connection(10, 1, 2, RelationKind::OneToOne)],
        );
        assert!(view.has_connection(&Id::from(1u64), &Id::from(2u64)));
        assert!(!view.has_connection(&Id::from(2u64), &Id::from(1u64)));
    }
}
