//! Automatic placement of diagram nodes.
//!
//! The [`LayoutEngine`] turns the node and edge set of a [`DiagramView`] into
//! a layered directed-graph layout and writes the computed coordinates onto
//! the nodes that have never been placed. Nodes with an authoritative stored
//! position are part of the layout problem but keep their position.
//!
//! Coordinates are computed as box centers and stored as top-left corners.

mod sugiyama;

use std::collections::HashSet;

use log::{debug, info, warn};
use petgraph::graph::{DiGraph, NodeIndex};

use kinro_core::{
    geometry::{Point, Size},
    identifier::Id,
};

use crate::{
    config::LayoutConfig,
    view::{DiagramView, Placement},
};

use sugiyama::Cell;

/// Layered layout over a [`DiagramView`].
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Returns the box size of a node with `attribute_count` attributes.
    pub fn node_size(&self, attribute_count: usize) -> Size {
        Size::new(
            self.config.node_width(),
            self.config.base_height() + attribute_count as f32 * self.config.attribute_height(),
        )
    }

    /// Computes a top-left position for every node, in view order.
    ///
    /// The result depends only on the nodes, their attribute counts and the
    /// edges, so identical views always produce identical positions.
    pub fn compute(&self, view: &DiagramView) -> Vec<Point> {
        let graph = self.build_graph(view);

        let cells = sugiyama::arrange(&graph).unwrap_or_else(|err| {
            warn!(err:%; "Layered layout failed, placing nodes in a single row");
            sugiyama::single_row(graph.node_count())
        });

        self.cells_to_positions(&graph, &cells)
    }

    /// Lays out `view` and moves every [`Placement::Unplaced`] node to its
    /// computed position. Returns the number of nodes moved.
    pub fn apply(&self, view: &mut DiagramView) -> usize {
        let unplaced = view
            .nodes()
            .iter()
            .filter(|node| node.placement() == Placement::Unplaced)
            .count();
        if unplaced == 0 {
            debug!("Every node has a stored position, skipping layout");
            return 0;
        }

        let positions = self.compute(view);
        for (node, position) in view.nodes_mut().iter_mut().zip(positions) {
            if node.placement() == Placement::Unplaced {
                node.place(position, Placement::Computed);
            }
        }

        info!(placed = unplaced, nodes = view.nodes().len(); "Applied layout");
        unplaced
    }

    /// Builds the layout graph; node indices match view order. Self-loops
    /// and repeated pairs are left out.
    fn build_graph(&self, view: &DiagramView) -> DiGraph<Size, ()> {
        let mut graph = DiGraph::with_capacity(view.nodes().len(), view.edges().len());
        for node in view.nodes() {
            graph.add_node(self.node_size(node.data().attributes.len()));
        }

        let index_of = |id: &Id| {
            view.nodes()
                .iter()
                .position(|node| node.id() == id)
                .map(NodeIndex::new)
        };

        let mut seen = HashSet::new();
        for edge in view.edges() {
            let (Some(source), Some(target)) = (index_of(&edge.source), index_of(&edge.target))
            else {
                continue;
            };
            if source != target && seen.insert((source, target)) {
                graph.add_edge(source, target, ());
            }
        }

        graph
    }

    fn cells_to_positions(&self, graph: &DiGraph<Size, ()>, cells: &[Cell]) -> Vec<Point> {
        let rank_count = cells.iter().map(|cell| cell.rank + 1).max().unwrap_or(0);

        let mut band_heights = vec![0.0_f32; rank_count];
        for (index, cell) in cells.iter().enumerate() {
            let height = graph[NodeIndex::new(index)].height();
            band_heights[cell.rank] = band_heights[cell.rank].max(height);
        }

        let mut band_tops = Vec::with_capacity(rank_count);
        let mut top = 0.0_f32;
        for height in &band_heights {
            band_tops.push(top);
            top += height + self.config.vertical_spacing();
        }

        let column_width = self.config.node_width() + self.config.horizontal_spacing();
        cells
            .iter()
            .enumerate()
            .map(|(index, cell)| {
                let size = graph[NodeIndex::new(index)];
                let center = Point::new(
                    cell.slot * column_width + self.config.node_width() / 2.0,
                    band_tops[cell.rank] + band_heights[cell.rank] / 2.0,
                );
                center.sub_point(size.half())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    use kinro_core::{
        identifier::Id,
        schema::{Attribute, ClassRecord, Connection, DataType, RelationKind},
    };

    use super::*;

    fn class(id: u64, x: f32, y: f32, attributes: usize) -> ClassRecord {
        ClassRecord {
            id: Id::from(id),
            name: format!("Class{id}"),
            position_x: x,
            position_y: y,
            attributes: (0..attributes)
                .map(|n| Attribute {
                    id: Id::new(format!("{id}-{n}")),
                    class_id: Id::from(id),
                    name: format!("field{n}"),
                    data_type: DataType::Text,
                    properties: Vec::new(),
                })
                .collect(),
        }
    }

    fn connection(id: u64, source: u64, target: u64) -> Connection {
        Connection {
            id: Id::from(id),
            source_class: Id::from(source),
            target_class: Id::from(target),
            relationship_type: RelationKind::OneToMany,
        }
    }

    #[test]
    fn test_node_size_grows_with_attributes() {
        let engine = LayoutEngine::default();
        assert_eq!(engine.node_size(0), Size::new(224.0, 50.0));
        assert_eq!(engine.node_size(3), Size::new(224.0, 170.0));
    }

    #[test]
    fn test_stored_positions_are_kept() {
        let mut view = DiagramView::build(
            vec![class(1, 300.0, 120.0, 0), class(2, 0.0, 0.0, 1)],
            vec![connection(10, 1, 2)],
        );

        let placed = LayoutEngine::default().apply(&mut view);

        assert_eq!(placed, 1);
        let stored = view.node(&Id::from(1u64)).unwrap();
        assert_eq!(stored.position(), Point::new(300.0, 120.0));
        assert_eq!(stored.placement(), Placement::Stored);
        assert_eq!(
            view.node(&Id::from(2u64)).unwrap().placement(),
            Placement::Computed
        );
    }

    #[test]
    fn test_unplaced_nodes_adopt_top_left_of_computed_center() {
        let engine = LayoutEngine::default();
        let mut view = DiagramView::build(vec![class(1, 0.0, 0.0, 2)], Vec::new());

        engine.apply(&mut view);

        // A lone node sits in slot 0 of rank 0; its box starts at the origin.
        let position = view.nodes()[0].position();
        assert!(approx_eq!(f32, position.x(), 0.0));
        assert!(approx_eq!(f32, position.y(), 0.0));
    }

    #[test]
    fn test_edges_point_downward() {
        let engine = LayoutEngine::default();
        let view = DiagramView::build(
            vec![class(1, 0.0, 0.0, 0), class(2, 0.0, 0.0, 3), class(3, 0.0, 0.0, 0)],
            vec![connection(10, 1, 2), connection(11, 2, 3)],
        );

        let positions = engine.compute(&view);

        assert!(positions[0].y() < positions[1].y());
        assert!(positions[1].y() < positions[2].y());
        // The middle rank is as tall as its box, so the next rank starts
        // after it plus the vertical spacing.
        let second_bottom = positions[1].y() + engine.node_size(3).height();
        assert!(approx_eq!(f32, positions[2].y(), second_bottom + 80.0));
    }

    #[test]
    fn test_layout_is_deterministic() {
        let engine = LayoutEngine::default();
        let view = DiagramView::build(
            vec![
                class(1, 0.0, 0.0, 1),
                class(2, 0.0, 0.0, 0),
                class(3, 0.0, 0.0, 2),
                class(4, 0.0, 0.0, 0),
            ],
            vec![connection(10, 1, 2), connection(11, 1, 3), connection(12, 3, 2)],
        );

        assert_eq!(engine.compute(&view), engine.compute(&view));
    }

    #[test]
    fn test_self_loops_and_repeated_pairs_are_ignored() {
        let engine = LayoutEngine::default();
        let view = DiagramView::build(
            vec![class(1, 0.0, 0.0, 0), class(2, 0.0, 0.0, 0)],
            vec![connection(10, 1, 1), connection(11, 1, 2), connection(12, 1, 2)],
        );

        let graph = engine.build_graph(&view);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(engine.compute(&view).len(), 2);
    }

    #[test]
    fn test_empty_view() {
        let mut view = DiagramView::default();
        assert!(LayoutEngine::default().compute(&view).is_empty());
        assert_eq!(LayoutEngine::default().apply(&mut view), 0);
    }
}
