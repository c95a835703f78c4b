//! Layered placement through `rust-sugiyama`.
//!
//! The library is asked for a layered drawing of every weakly connected
//! component; its coordinates are normalized here into integer ranks and
//! fractional horizontal slots, which the caller scales into pixels.

use std::collections::{HashMap, HashSet};

use log::{debug, trace};
use petgraph::{
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
};
use rust_sugiyama::configure::Config;

use kinro_core::geometry::Size;

/// Horizontal distance between neighbouring vertices in library output.
const VERTEX_SPACING: f64 = 3.0;

/// Tolerance when grouping library y coordinates into ranks.
const RANK_EPSILON: f64 = 1e-6;

/// Grid position of one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    /// Layer index; 0 is the top rank.
    pub rank: usize,
    /// Horizontal slot; slots in a rank are at least 1.0 apart.
    pub slot: f32,
}

type ComponentLayout = Vec<(usize, (f64, f64))>;

/// Assigns a cell to every node of `graph`, indexed by node index.
///
/// Components are packed left to right in order of their lowest node index;
/// isolated nodes follow them in rank 0.
///
/// # Errors
///
/// Returns a message when the layout library panics or leaves a connected
/// node without coordinates.
pub fn arrange(graph: &DiGraph<Size, ()>) -> Result<Vec<Cell>, String> {
    let node_count = graph.node_count();
    let mut cells: Vec<Option<Cell>> = vec![None; node_count];

    // rust-sugiyama creates a vertex for every id up to the largest, so only
    // connected nodes are numbered.
    let mut to_vertex: HashMap<NodeIndex, u32> = HashMap::new();
    let mut to_node: Vec<NodeIndex> = Vec::new();
    for node in graph.node_indices() {
        if graph.neighbors_undirected(node).next().is_some() {
            to_vertex.insert(node, to_node.len() as u32);
            to_node.push(node);
        }
    }

    let edges: Vec<(u32, u32)> = graph
        .edge_references()
        .map(|edge| (to_vertex[&edge.source()], to_vertex[&edge.target()]))
        .collect();

    let mut next_slot = 0.0_f32;

    if !edges.is_empty() {
        debug!(
            nodes = to_node.len(),
            edges = edges.len();
            "Applying Sugiyama algorithm"
        );

        let mut components = run_library(edges.clone())?;
        components.sort_by_key(|layout| layout.iter().map(|&(vertex, _)| vertex).min());

        let edge_set: HashSet<(usize, usize)> = edges
            .iter()
            .map(|&(source, target)| (source as usize, target as usize))
            .collect();

        for layout in &components {
            let placed = normalize_component(layout, &edge_set);
            let mut width = 0.0_f32;
            for (vertex, cell) in placed {
                let node = *to_node
                    .get(vertex)
                    .ok_or_else(|| format!("layout returned unknown vertex {vertex}"))?;
                width = width.max(cell.slot + 1.0);
                cells[node.index()] = Some(Cell {
                    rank: cell.rank,
                    slot: cell.slot + next_slot,
                });
            }
            next_slot += width;
        }
    }

    for node in graph.node_indices() {
        if !to_vertex.contains_key(&node) {
            cells[node.index()] = Some(Cell {
                rank: 0,
                slot: next_slot,
            });
            next_slot += 1.0;
        }
    }

    cells
        .into_iter()
        .enumerate()
        .map(|(index, cell)| cell.ok_or_else(|| format!("node {index} missing from layout")))
        .collect()
}

/// Places every node in rank 0, one slot apart, in index order.
pub fn single_row(node_count: usize) -> Vec<Cell> {
    (0..node_count)
        .map(|index| Cell {
            rank: 0,
            slot: index as f32,
        })
        .collect()
}

fn run_library(edges: Vec<(u32, u32)>) -> Result<Vec<ComponentLayout>, String> {
    let result = std::panic::catch_unwind(move || {
        let config = Config {
            minimum_length: 1,
            vertex_spacing: VERTEX_SPACING,
            ..Default::default()
        };
        rust_sugiyama::from_edges(&edges, &config)
    });

    match result {
        Ok(layouts) if layouts.is_empty() => {
            Err("rust-sugiyama returned empty layout results".to_string())
        }
        Ok(layouts) => Ok(layouts
            .into_iter()
            .map(|(coordinates, _, _)| coordinates)
            .collect()),
        Err(err) => match err.downcast_ref::<String>() {
            Some(message) => Err(format!("rust-sugiyama panicked: {message}")),
            None => Err("rust-sugiyama panicked with unknown error".to_string()),
        },
    }
}

/// Converts one component's coordinates into component-local cells.
///
/// Ranks are the distinct y values in order, flipped when most edges would
/// otherwise point upward. Slots are x offsets in vertex-spacing units,
/// pushed apart so no two nodes in a rank are closer than one slot.
fn normalize_component(
    layout: &ComponentLayout,
    edges: &HashSet<(usize, usize)>,
) -> Vec<(usize, Cell)> {
    let mut levels: Vec<f64> = layout.iter().map(|&(_, (_, y))| y).collect();
    levels.sort_by(f64::total_cmp);
    levels.dedup_by(|a, b| (*a - *b).abs() < RANK_EPSILON);

    let level_of = |y: f64| {
        levels
            .iter()
            .position(|level| (level - y).abs() < RANK_EPSILON)
            .unwrap_or(0)
    };

    let mut ranks: HashMap<usize, usize> = layout
        .iter()
        .map(|&(vertex, (_, y))| (vertex, level_of(y)))
        .collect();

    let (mut downward, mut upward) = (0usize, 0usize);
    for (source, target) in edges {
        if let (Some(source_rank), Some(target_rank)) = (ranks.get(source), ranks.get(target)) {
            if source_rank < target_rank {
                downward += 1;
            } else if source_rank > target_rank {
                upward += 1;
            }
        }
    }
    if upward > downward {
        let deepest = levels.len().saturating_sub(1);
        for rank in ranks.values_mut() {
            *rank = deepest - *rank;
        }
    }

    let min_x = layout
        .iter()
        .map(|&(_, (x, _))| x)
        .fold(f64::INFINITY, f64::min);

    let mut ordered: Vec<(usize, usize, f64)> = layout
        .iter()
        .map(|&(vertex, (x, _))| (ranks[&vertex], vertex, x))
        .collect();
    ordered.sort_by(|a, b| a.0.cmp(&b.0).then(a.2.total_cmp(&b.2)).then(a.1.cmp(&b.1)));

    let mut cells = Vec::with_capacity(ordered.len());
    let mut previous: Option<(usize, f32)> = None;
    for (rank, vertex, x) in ordered {
        let mut slot = ((x - min_x) / VERTEX_SPACING) as f32;
        if let Some((_, previous_slot)) =
            previous.filter(|&(previous_rank, _)| previous_rank == rank)
        {
            slot = slot.max(previous_slot + 1.0);
        }
        previous = Some((rank, slot));
        trace!(vertex, rank, slot; "Placed vertex");
        cells.push((vertex, Cell { rank, slot }));
    }
    cells
}
