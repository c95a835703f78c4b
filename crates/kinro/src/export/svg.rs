//! SVG rendering of a diagram view.
//!
//! Every node becomes a rounded box with its label and one row per
//! attribute. Every edge becomes an arrow from the bottom center of the
//! source box to the top center of the target box, colored by relationship
//! kind and labelled with its wire name.

use log::debug;
use svg::{Document, node::element as svg_element};

use kinro_core::{
    color::Color,
    geometry::{Bounds, Point},
    schema::RelationKind,
};

use super::{Error, Exporter};
use crate::{
    config::{LayoutConfig, StyleConfig},
    layout::LayoutEngine,
    view::{DiagramView, EdgeView, NodeView},
};

const MARGIN: f32 = 50.0;
const FONT_FAMILY: &str = "Arial, sans-serif";
const TITLE_FONT_SIZE: f32 = 16.0;
const ATTRIBUTE_FONT_SIZE: f32 = 13.0;
const LABEL_FONT_SIZE: f32 = 12.0;
const TEXT_INSET: f32 = 12.0;
const STROKE_COLOR: &str = "#1f2937";
const DEFAULT_NODE_FILL: &str = "#ffffff";

/// Relationship colors, in [`RelationKind::ALL`] order.
const RELATION_COLORS: [&str; 3] = ["#3b82f6", "#22c55e", "#f97316"];

/// Renders a [`DiagramView`] as an SVG document.
#[derive(Debug, Clone)]
pub struct SvgExporter {
    layout: LayoutEngine,
    background: Option<Color>,
    node_fill: Color,
    relation_colors: [Color; 3],
}

impl SvgExporter {
    /// Creates an exporter that sizes boxes with `layout` and paints them
    /// with `style`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if a configured color cannot be parsed.
    pub fn new(layout: LayoutConfig, style: &StyleConfig) -> Result<Self, Error> {
        let background = style.background_color().map_err(Error::Render)?;
        let node_fill = match style.node_fill().map_err(Error::Render)? {
            Some(color) => color,
            None => Color::new(DEFAULT_NODE_FILL).map_err(Error::Render)?,
        };

        let [one_to_one, one_to_many, many_to_many] = RELATION_COLORS;
        let relation_colors = [
            Color::new(one_to_one).map_err(Error::Render)?,
            Color::new(one_to_many).map_err(Error::Render)?,
            Color::new(many_to_many).map_err(Error::Render)?,
        ];

        Ok(Self {
            layout: LayoutEngine::new(layout),
            background,
            node_fill,
            relation_colors,
        })
    }

    /// Returns the stroke color of edges of `kind`.
    pub fn relation_color(&self, kind: RelationKind) -> Color {
        match kind {
            RelationKind::OneToOne => self.relation_colors[0],
            RelationKind::OneToMany => self.relation_colors[1],
            RelationKind::ManyToMany => self.relation_colors[2],
        }
    }

    fn node_bounds(&self, node: &NodeView) -> Bounds {
        let size = self.layout.node_size(node.data().attributes.len());
        Bounds::new_from_top_left(node.position(), size)
    }

    fn content_bounds(&self, view: &DiagramView) -> Bounds {
        let mut nodes = view.nodes().iter().map(|node| self.node_bounds(node));
        match nodes.next() {
            Some(first) => nodes.fold(first, |acc, bounds| acc.merge(&bounds)),
            None => Bounds::default(),
        }
    }

    fn marker_definitions(&self) -> svg_element::Definitions {
        let mut defs = svg_element::Definitions::new();
        for color in &self.relation_colors {
            let marker = svg_element::Marker::new()
                .set("id", marker_id(color))
                .set("viewBox", "0 0 10 10")
                .set("refX", 9)
                .set("refY", 5)
                .set("markerWidth", 6)
                .set("markerHeight", 6)
                .set("orient", "auto")
                .add(
                    svg_element::Path::new()
                        .set("d", "M 0 0 L 10 5 L 0 10 z")
                        .set("fill", color),
                );
            defs = defs.add(marker);
        }
        defs
    }

    fn render_node(&self, node: &NodeView) -> svg_element::Group {
        let bounds = self.node_bounds(node);
        let size = bounds.to_size();
        let top_left = bounds.min_point();

        let mut group = svg_element::Group::new().set("class", "node").add(
            svg_element::Rectangle::new()
                .set("x", top_left.x())
                .set("y", top_left.y())
                .set("width", size.width())
                .set("height", size.height())
                .set("rx", 8.0)
                .set("fill", &self.node_fill)
                .set("stroke", STROKE_COLOR)
                .set("stroke-width", 1.5),
        );

        let title_height = self.layout.config().base_height();
        group = group.add(
            svg_element::Text::new(node.label())
                .set("x", top_left.x() + size.width() / 2.0)
                .set("y", top_left.y() + title_height / 2.0)
                .set("text-anchor", "middle")
                .set("dominant-baseline", "middle")
                .set("font-family", FONT_FAMILY)
                .set("font-size", TITLE_FONT_SIZE)
                .set("font-weight", "bold"),
        );

        let row_height = self.layout.config().attribute_height();
        for (row, attribute) in node.data().attributes.iter().enumerate() {
            let y = top_left.y() + title_height + row as f32 * row_height + row_height / 2.0;
            group = group.add(
                svg_element::Text::new(format!(
                    "{}: {}",
                    attribute.name,
                    attribute.data_type.label()
                ))
                .set("x", top_left.x() + TEXT_INSET)
                .set("y", y)
                .set("dominant-baseline", "middle")
                .set("font-family", FONT_FAMILY)
                .set("font-size", ATTRIBUTE_FONT_SIZE),
            );
        }

        group
    }

    fn render_edge(&self, view: &DiagramView, edge: &EdgeView) -> Option<svg_element::Group> {
        let start = self.node_bounds(view.node(&edge.source)?).bottom_center();
        let end = self.node_bounds(view.node(&edge.target)?).top_center();
        let color = self.relation_color(edge.kind);
        let label_at = start.midpoint(end);

        let group = svg_element::Group::new()
            .set("class", "edge")
            .add(
                svg_element::Path::new()
                    .set("d", path_data(start, end))
                    .set("fill", "none")
                    .set("stroke", &color)
                    .set("stroke-width", 1.5)
                    .set("marker-end", format!("url(#{})", marker_id(&color))),
            )
            .add(
                svg_element::Text::new(edge.label())
                    .set("x", label_at.x())
                    .set("y", label_at.y())
                    .set("text-anchor", "middle")
                    .set("dominant-baseline", "middle")
                    .set("font-family", FONT_FAMILY)
                    .set("font-size", LABEL_FONT_SIZE)
                    .set("fill", &color),
            );
        Some(group)
    }
}

impl Exporter for SvgExporter {
    fn render(&self, view: &DiagramView) -> Result<String, Error> {
        let content_bounds = self.content_bounds(view);
        let content_size = content_bounds.to_size();
        let width = content_size.width() + MARGIN * 2.0;
        let height = content_size.height() + MARGIN * 2.0;
        debug!(width, height; "Rendering SVG document");

        let mut doc = Document::new()
            .set("viewBox", format!("0 0 {width} {height}"))
            .set("width", width)
            .set("height", height);

        if let Some(background) = &self.background {
            doc = doc.add(
                svg_element::Rectangle::new()
                    .set("x", 0)
                    .set("y", 0)
                    .set("width", width)
                    .set("height", height)
                    .set("fill", background),
            );
        }

        doc = doc.add(self.marker_definitions());

        let mut main_group = svg_element::Group::new().set(
            "transform",
            format!(
                "translate({}, {})",
                MARGIN - content_bounds.min_x(),
                MARGIN - content_bounds.min_y()
            ),
        );

        for edge in view.edges() {
            if let Some(rendered) = self.render_edge(view, edge) {
                main_group = main_group.add(rendered);
            }
        }
        for node in view.nodes() {
            main_group = main_group.add(self.render_node(node));
        }

        Ok(doc.add(main_group).to_string())
    }
}

fn marker_id(color: &Color) -> String {
    format!("arrow-{}", color.to_id_safe_string())
}

fn path_data(start: Point, end: Point) -> String {
    format!("M {} {} L {} {}", start.x(), start.y(), end.x(), end.y())
}

#[cfg(test)]
mod tests {
    use kinro_core::{
        identifier::Id,
        schema::{Attribute, ClassRecord, Connection, DataType},
    };

    use super::*;

    fn sample_view() -> DiagramView {
        DiagramView::build(
            vec![
                ClassRecord {
                    id: Id::from(1u64),
                    name: "Persona".to_string(),
                    position_x: 10.0,
                    position_y: 10.0,
                    attributes: vec![Attribute {
                        id: Id::new("a1"),
                        class_id: Id::from(1u64),
                        name: "edad".to_string(),
                        data_type: DataType::Integer,
                        properties: Vec::new(),
                    }],
                },
                ClassRecord {
                    id: Id::from(2u64),
                    name: "Pedido".to_string(),
                    position_x: 10.0,
                    position_y: 300.0,
                    attributes: Vec::new(),
                },
            ],
            vec![Connection {
                id: Id::from(3u64),
                source_class: Id::from(1u64),
                target_class: Id::from(2u64),
                relationship_type: RelationKind::OneToMany,
            }],
        )
    }

    #[test]
    fn test_render_contains_nodes_and_edges() {
        let exporter = SvgExporter::new(LayoutConfig::default(), &StyleConfig::default()).unwrap();
        let svg = exporter.render(&sample_view()).unwrap();

        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Persona"));
        assert!(svg.contains("edad: Number"));
        assert!(svg.contains("1-N"));
        assert!(svg.contains("M 122 100 L 122 300"));
    }

    #[test]
    fn test_edge_color_follows_kind() {
        let exporter = SvgExporter::new(LayoutConfig::default(), &StyleConfig::default()).unwrap();
        let green = exporter.relation_color(RelationKind::OneToMany);
        let svg = exporter.render(&sample_view()).unwrap();

        assert!(svg.contains(&format!("url(#{})", marker_id(&green))));
        assert_ne!(
            exporter.relation_color(RelationKind::OneToOne),
            exporter.relation_color(RelationKind::ManyToMany)
        );
    }

    #[test]
    fn test_empty_view_renders_margin_only() {
        let exporter = SvgExporter::new(LayoutConfig::default(), &StyleConfig::default()).unwrap();
        let svg = exporter.render(&DiagramView::default()).unwrap();
        assert!(svg.contains("viewBox=\"0 0 100 100\""));
    }
}
