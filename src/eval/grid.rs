// eval/grid.rs — 2D grid evaluation
//
// Evaluates a density graph over an NxN grid of world-space positions at a
// fixed Y. Single-threaded: one `EvalState` per call, memo cleared per cell.

use crate::config::EvalOptions;
use crate::eval::graph::EvalGraph;
use crate::eval::nodes::{evaluate_point, EvalState};
use serde::Serialize;
use std::time::Instant;
use tracing::debug;

/// Result of evaluating a density graph over a 2D grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridResult {
    /// Row-major values; row is Z, column is X. Length = resolution².
    pub values: Vec<f64>,
    pub resolution: u32,
    pub min_value: f64,
    pub max_value: f64,
}

impl GridResult {
    /// All-zero grid with `min = max = 0`, used when there is nothing to
    /// evaluate.
    pub fn zeroed(resolution: u32) -> Self {
        let n = resolution.max(1);
        GridResult {
            values: vec![0.0; n as usize * n as usize],
            resolution: n,
            min_value: 0.0,
            max_value: 0.0,
        }
    }

    /// Value at `(row, col)`.
    pub fn at(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.resolution as usize + col]
    }
}

/// Evaluate a density graph over an NxN grid.
///
/// Cell `(row, col)` samples `(range_min + col·step, y_level,
/// range_min + row·step)` with `step = (range_max − range_min) / n`.
/// `resolution` is clamped to at least 1.
pub fn evaluate_grid(
    graph: &EvalGraph,
    resolution: u32,
    range_min: f64,
    range_max: f64,
    y_level: f64,
    options: &EvalOptions,
) -> GridResult {
    let started = Instant::now();
    let resolution = resolution.max(1);
    let n = resolution as usize;
    let step = (range_max - range_min) / n as f64;

    let mut state = EvalState::new(graph.node_count(), options);
    let mut values = Vec::with_capacity(n * n);
    let mut min_val = f64::INFINITY;
    let mut max_val = f64::NEG_INFINITY;

    for row in 0..n {
        let z = range_min + row as f64 * step;
        for col in 0..n {
            let x = range_min + col as f64 * step;
            let val = evaluate_point(graph, &mut state, x, y_level, z);
            min_val = min_val.min(val);
            max_val = max_val.max(val);
            values.push(val);
        }
    }

    if !min_val.is_finite() {
        min_val = 0.0;
    }
    if !max_val.is_finite() {
        max_val = 0.0;
    }

    debug!(
        resolution,
        nodes = graph.node_count(),
        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
        "grid evaluated"
    );

    GridResult {
        values,
        resolution,
        min_value: min_val,
        max_value: max_val,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::graph::{GraphEdge, GraphNode};
    use serde_json::{json, Map, Value};

    fn make_node(id: &str, density_type: &str, fields: Value) -> GraphNode {
        let fields = fields.as_object().cloned().unwrap_or_else(Map::new);
        GraphNode::new(id, density_type, fields)
    }

    #[test]
    fn constant_grid() {
        let nodes = vec![make_node("c", "Constant", json!({ "Value": 42.0 }))];
        let graph = EvalGraph::from_raw(nodes, vec![], Some("c")).unwrap();

        let result = evaluate_grid(&graph, 4, -10.0, 10.0, 64.0, &EvalOptions::default());

        assert_eq!(result.values.len(), 16);
        assert_eq!(result.resolution, 4);
        for &v in &result.values {
            assert!((v - 42.0).abs() < 1e-6);
        }
        assert!((result.min_value - 42.0).abs() < 1e-6);
        assert!((result.max_value - 42.0).abs() < 1e-6);
    }

    #[test]
    fn coordinate_x_grid_samples_cell_corners() {
        let nodes = vec![make_node("cx", "CoordinateX", json!({}))];
        let graph = EvalGraph::from_raw(nodes, vec![], Some("cx")).unwrap();

        // 2x2 over [-10, 10]: step 10, samples at -10 and 0
        let result = evaluate_grid(&graph, 2, -10.0, 10.0, 0.0, &EvalOptions::default());

        assert_eq!(result.values, vec![-10.0, 0.0, -10.0, 0.0]);
        assert_eq!(result.min_value, -10.0);
        assert_eq!(result.max_value, 0.0);
    }

    #[test]
    fn rows_follow_z() {
        let nodes = vec![make_node("cz", "CoordinateZ", json!({}))];
        let graph = EvalGraph::from_raw(nodes, vec![], None).unwrap();
        let result = evaluate_grid(&graph, 4, 0.0, 8.0, 0.0, &EvalOptions::default());
        assert_eq!(result.at(0, 3), 0.0);
        assert_eq!(result.at(3, 0), 6.0);
    }

    #[test]
    fn sum_grid() {
        let nodes = vec![
            make_node("a", "Constant", json!({ "Value": 10.0 })),
            make_node("b", "Constant", json!({ "Value": 20.0 })),
            make_node("s", "Sum", json!({})),
        ];
        let edges = vec![
            GraphEdge::new("a", "s", Some("Inputs[0]")),
            GraphEdge::new("b", "s", Some("Inputs[1]")),
        ];
        let graph = EvalGraph::from_raw(nodes, edges, Some("s")).unwrap();

        let result = evaluate_grid(&graph, 8, -64.0, 64.0, 64.0, &EvalOptions::default());

        assert_eq!(result.values.len(), 64);
        for &v in &result.values {
            assert!((v - 30.0).abs() < 1e-6);
        }
    }

    #[test]
    fn resolution_is_clamped_to_one() {
        let nodes = vec![make_node("c", "Constant", json!({ "Value": 7.0 }))];
        let graph = EvalGraph::from_raw(nodes, vec![], Some("c")).unwrap();

        let result = evaluate_grid(&graph, 0, 0.0, 10.0, 0.0, &EvalOptions::default());

        assert_eq!(result.resolution, 1);
        assert_eq!(result.values, vec![7.0]);
    }

    #[test]
    fn repeat_evaluation_is_bit_identical() {
        let nodes = vec![make_node(
            "n",
            "SimplexNoise2D",
            json!({ "Frequency": 0.03, "Octaves": 4, "Seed": "terrain" }),
        )];
        let graph = EvalGraph::from_raw(nodes, vec![], None).unwrap();
        let a = evaluate_grid(&graph, 16, -32.0, 32.0, 64.0, &EvalOptions::default());
        let b = evaluate_grid(&graph, 16, -32.0, 32.0, 64.0, &EvalOptions::default());
        let bits = |g: &GridResult| g.values.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn zeroed_grid() {
        let grid = GridResult::zeroed(3);
        assert_eq!(grid.values, vec![0.0; 9]);
        assert_eq!(grid.min_value, 0.0);
        assert_eq!(grid.max_value, 0.0);
    }
}
