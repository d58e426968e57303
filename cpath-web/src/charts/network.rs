//! Stage transition network
//!
//! Builds a weighted directed graph from the accumulated edge counts,
//! lays it out with a seeded force-directed algorithm and draws it.

use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use plotters::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeSet, HashMap};

use super::{Chart, ChartError, ChartOptions, CHART_HEIGHT, CHART_WIDTH};
use crate::db::Snapshot;
use crate::vocab::Stage;

/// Stage graph weighted by transition counts
pub type TransitionGraph = DiGraphMap<Stage, f64>;

const LAYOUT_ITERATIONS: usize = 60;
const MIN_DISTANCE: f64 = 0.01;

const EDGE_COLOR: RGBColor = RGBColor(120, 144, 156);
const NODE_COLOR: RGBColor = RGBColor(0, 102, 204);
const NODE_RADIUS: i32 = 6;
const MAX_EXTRA_EDGE_WIDTH: f64 = 7.0;

/// Build the transition graph
///
/// Every stage starts as a node; stored edges are added unless either end
/// is dropped; stages left without any edge are removed.
pub fn get_network(snapshot: &Snapshot, drop: &BTreeSet<Stage>) -> TransitionGraph {
    let mut graph = TransitionGraph::new();

    for stage in Stage::ALL {
        if !drop.contains(&stage) {
            graph.add_node(stage);
        }
    }

    for (&(from, to), &weight) in &snapshot.edges {
        if weight > 0.0 && !drop.contains(&from) && !drop.contains(&to) {
            graph.add_edge(from, to, weight);
        }
    }

    let isolates: Vec<Stage> = graph
        .nodes()
        .filter(|&n| {
            graph.neighbors_directed(n, Direction::Outgoing).next().is_none()
                && graph.neighbors_directed(n, Direction::Incoming).next().is_none()
        })
        .collect();
    for stage in isolates {
        graph.remove_node(stage);
    }

    graph
}

/// Fruchterman-Reingold layout normalized into the unit square
///
/// Deterministic for a given graph and seed. Heavier edges pull harder.
pub fn spring_layout(graph: &TransitionGraph, seed: u64) -> HashMap<Stage, (f64, f64)> {
    let mut nodes: Vec<Stage> = graph.nodes().collect();
    nodes.sort();

    match nodes.len() {
        0 => return HashMap::new(),
        1 => return HashMap::from([(nodes[0], (0.5, 0.5))]),
        _ => {}
    }

    let index: HashMap<Stage, usize> = nodes.iter().enumerate().map(|(i, &s)| (s, i)).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut pos: Vec<(f64, f64)> = nodes.iter().map(|_| (rng.gen(), rng.gen())).collect();

    let max_weight = graph
        .all_edges()
        .map(|(_, _, &w)| w)
        .fold(0.0_f64, f64::max)
        .max(f64::MIN_POSITIVE);
    let edges: Vec<(usize, usize, f64)> = graph
        .all_edges()
        .filter(|(a, b, _)| a != b)
        .map(|(a, b, &w)| (index[&a], index[&b], w / max_weight))
        .collect();

    let k = (1.0 / nodes.len() as f64).sqrt();
    let mut temperature = 0.1;
    let cooling = temperature / (LAYOUT_ITERATIONS as f64 + 1.0);

    for _ in 0..LAYOUT_ITERATIONS {
        let mut disp = vec![(0.0_f64, 0.0_f64); nodes.len()];

        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                let (dx, dy) = (pos[i].0 - pos[j].0, pos[i].1 - pos[j].1);
                let dist = dx.hypot(dy).max(MIN_DISTANCE);
                let force = k * k / dist;
                disp[i].0 += dx / dist * force;
                disp[i].1 += dy / dist * force;
                disp[j].0 -= dx / dist * force;
                disp[j].1 -= dy / dist * force;
            }
        }

        for &(a, b, weight) in &edges {
            let (dx, dy) = (pos[a].0 - pos[b].0, pos[a].1 - pos[b].1);
            let dist = dx.hypot(dy).max(MIN_DISTANCE);
            let force = dist * dist / k * weight;
            disp[a].0 -= dx / dist * force;
            disp[a].1 -= dy / dist * force;
            disp[b].0 += dx / dist * force;
            disp[b].1 += dy / dist * force;
        }

        for (p, d) in pos.iter_mut().zip(&disp) {
            let len = d.0.hypot(d.1).max(MIN_DISTANCE);
            let step = len.min(temperature);
            p.0 += d.0 / len * step;
            p.1 += d.1 / len * step;
        }

        temperature -= cooling;
    }

    normalize(&mut pos);
    nodes.into_iter().zip(pos).collect()
}

/// Rescale each axis into [0, 1]; a degenerate axis collapses to 0.5
fn normalize(pos: &mut [(f64, f64)]) {
    let (min_x, max_x) = bounds(pos.iter().map(|p| p.0));
    let (min_y, max_y) = bounds(pos.iter().map(|p| p.1));
    for p in pos.iter_mut() {
        p.0 = rescale(p.0, min_x, max_x);
        p.1 = rescale(p.1, min_y, max_y);
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

fn rescale(v: f64, lo: f64, hi: f64) -> f64 {
    if hi - lo < f64::EPSILON {
        0.5
    } else {
        (v - lo) / (hi - lo)
    }
}

/// Draw the graph: edge width follows weight, arrowheads mark direction
pub fn render_network(graph: &TransitionGraph, options: &ChartOptions) -> Result<Chart, ChartError> {
    let title = "Career transitions".to_string();

    if graph.edge_count() == 0 {
        return super::bars::placeholder(&title);
    }

    let layout = spring_layout(graph, options.seed);
    let max_weight = graph
        .all_edges()
        .map(|(_, _, &w)| w)
        .fold(0.0_f64, f64::max);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&title, ("sans-serif", 24))
            .margin(30)
            .build_cartesian_2d(-0.08f64..1.2f64, -0.08f64..1.08f64)?;

        for (from, to, &weight) in graph.all_edges() {
            let (Some(&a), Some(&b)) = (layout.get(&from), layout.get(&to)) else {
                continue;
            };
            let width = 1 + (MAX_EXTRA_EDGE_WIDTH * weight / max_weight).round() as u32;
            let style = EDGE_COLOR.stroke_width(width);

            if from == to {
                // Self-transition: small loop above the node
                chart.draw_series(std::iter::once(Circle::new(
                    (a.0, a.1 + 0.03),
                    8,
                    EDGE_COLOR.stroke_width(width.min(3)),
                )))?;
                continue;
            }

            chart.draw_series(std::iter::once(PathElement::new(vec![a, b], style)))?;
            if let Some(head) = arrowhead(a, b) {
                chart.draw_series(std::iter::once(Polygon::new(head, EDGE_COLOR.filled())))?;
            }
        }

        let mut nodes: Vec<(&Stage, &(f64, f64))> = layout.iter().collect();
        nodes.sort_by_key(|(stage, _)| **stage);
        chart.draw_series(nodes.into_iter().map(|(stage, &p)| {
            EmptyElement::at(p)
                + Circle::new((0, 0), NODE_RADIUS, NODE_COLOR.filled())
                + Text::new(stage.to_string(), (9, -6), ("sans-serif", 14).into_font())
        }))?;

        root.present()?;
    }

    Ok(Chart { title, svg })
}

/// Triangle just short of `to`, pointing along `from -> to`
fn arrowhead(from: (f64, f64), to: (f64, f64)) -> Option<Vec<(f64, f64)>> {
    const BACKOFF: f64 = 0.025;
    const LENGTH: f64 = 0.03;
    const HALF_WIDTH: f64 = 0.012;

    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let len = dx.hypot(dy);
    if len < BACKOFF + LENGTH {
        return None;
    }
    let (ux, uy) = (dx / len, dy / len);
    let tip = (to.0 - ux * BACKOFF, to.1 - uy * BACKOFF);
    let base = (tip.0 - ux * LENGTH, tip.1 - uy * LENGTH);
    let (px, py) = (-uy * HALF_WIDTH, ux * HALF_WIDTH);

    Some(vec![tip, (base.0 + px, base.1 + py), (base.0 - px, base.1 - py)])
}
