use crate::analysis::{
    compute_histogram, compute_statistics, contour_levels, generate_contours, ContourLevel,
    Histogram, Statistics,
};
use crate::config::EvalOptions;
use crate::convert::{is_native_format, native_to_graph, AssetGraph};
use crate::error::GraphError;
use crate::eval::graph::GraphDocument;
use crate::eval::{
    evaluate_grid, evaluate_point, EvalGraph, EvalState, GraphEdge, GraphNode, GridResult,
};
use crate::schema::AssetCategory;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    /// The density graph: `{ nodes, edges, rootNodeId? }`
    pub graph: Value,
    /// Grid resolution (e.g., 128 for 128x128)
    pub resolution: u32,
    /// World coordinate range
    pub range_min: f64,
    pub range_max: f64,
    /// Y level for 2D evaluation
    pub y_level: f64,
    #[serde(default)]
    pub content_fields: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResponse {
    /// Flattened NxN density values (row-major, row = Z)
    pub values: Vec<f64>,
    /// Grid resolution
    pub resolution: u32,
    /// Min/max values in the result (for normalization)
    pub min_value: f64,
    pub max_value: f64,
}

impl From<GridResult> for EvaluateResponse {
    fn from(grid: GridResult) -> Self {
        EvaluateResponse {
            values: grid.values,
            resolution: grid.resolution,
            min_value: grid.min_value,
            max_value: grid.max_value,
        }
    }
}

/// Build an evaluation graph from an editor graph (`{ nodes, edges }`) or
/// from a nested density asset in internal or native form.
pub fn load_graph(value: &Value) -> Result<EvalGraph, GraphError> {
    if value.get("nodes").is_some() {
        return EvalGraph::from_json(value);
    }
    let (assets, root) = if is_native_format(value) {
        native_to_graph(value).value
    } else {
        AssetGraph::from_asset(value, AssetCategory::Density)
    };
    let root = root.ok_or(GraphError::NoRoot)?;
    let root_id = assets.nodes[root].id.clone();
    let (nodes, edges) = assets.to_eval_nodes();
    EvalGraph::from_raw(nodes, edges, Some(root_id.as_str()))
}

/// Evaluate a density graph at an NxN grid of positions.
///
/// A graph without any density node yields an all-zero grid; malformed JSON
/// is an error.
pub fn evaluate(
    graph_json: &Value,
    resolution: u32,
    range_min: f64,
    range_max: f64,
    y_level: f64,
) -> Result<EvaluateResponse, GraphError> {
    evaluate_with_options(graph_json, resolution, range_min, range_max, y_level, &EvalOptions::default())
}

pub fn evaluate_with_options(
    graph_json: &Value,
    resolution: u32,
    range_min: f64,
    range_max: f64,
    y_level: f64,
    options: &EvalOptions,
) -> Result<EvaluateResponse, GraphError> {
    let graph = match load_graph(graph_json) {
        Ok(graph) => graph,
        Err(GraphError::NoRoot) => {
            debug!("no root node, returning empty grid");
            return Ok(GridResult::zeroed(resolution).into());
        }
        Err(e) => return Err(e),
    };
    Ok(evaluate_grid(&graph, resolution, range_min, range_max, y_level, options).into())
}

pub fn evaluate_request(request: &EvaluateRequest) -> Result<EvaluateResponse, GraphError> {
    let options = EvalOptions { content_fields: request.content_fields.clone() };
    evaluate_with_options(
        &request.graph,
        request.resolution,
        request.range_min,
        request.range_max,
        request.y_level,
        &options,
    )
}

/// Evaluate a React Flow graph at specific sample points.
pub fn evaluate_points(
    nodes: Vec<Value>,
    edges: Vec<Value>,
    points: &[[f64; 3]],
    root_node_id: Option<&str>,
    content_fields: Option<BTreeMap<String, f64>>,
) -> Result<Vec<f64>, GraphError> {
    let nodes = nodes
        .into_iter()
        .map(serde_json::from_value::<GraphNode>)
        .collect::<Result<Vec<_>, _>>()?;
    let edges = edges
        .into_iter()
        .map(serde_json::from_value::<GraphEdge>)
        .collect::<Result<Vec<_>, _>>()?;

    let graph = match EvalGraph::from_raw(nodes, edges, root_node_id) {
        Ok(graph) => graph,
        Err(GraphError::NoRoot) => return Ok(vec![0.0; points.len()]),
        Err(e) => return Err(e),
    };
    let options = EvalOptions { content_fields: content_fields.unwrap_or_default() };
    let mut state = EvalState::new(graph.node_count(), &options);
    Ok(points
        .iter()
        .map(|&[x, y, z]| evaluate_point(&graph, &mut state, x, y, z))
        .collect())
}

/// Node and edge counts of a graph document, for status display.
pub fn graph_summary(graph_json: &Value) -> Result<(usize, usize), GraphError> {
    let (nodes, edges, _) = GraphDocument::from_value(graph_json)?.into_parts();
    Ok((nodes.len(), edges.len()))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub statistics: Statistics,
    pub histogram: Histogram,
    pub contours: Vec<ContourLevel>,
}

/// Statistics, histogram and contour lines for an evaluated grid.
pub fn analyze(grid: &EvaluateResponse, contour_interval: f64, histogram_bins: usize) -> AnalysisResponse {
    let levels = contour_levels(grid.min_value, grid.max_value, contour_interval);
    AnalysisResponse {
        statistics: compute_statistics(&grid.values),
        histogram: compute_histogram(&grid.values, histogram_bins),
        contours: generate_contours(&grid.values, grid.resolution as usize, &levels),
    }
}

/// Hands out request sequence numbers and drops results that a newer request
/// has superseded.
#[derive(Debug, Default)]
pub struct PreviewSession {
    latest: AtomicU64,
}

impl PreviewSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new request; every earlier one becomes stale.
    pub fn begin(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn is_current(&self, sequence: u64) -> bool {
        self.latest.load(Ordering::Acquire) == sequence
    }

    /// `Some(result)` only if no newer request was issued meanwhile.
    pub fn accept<T>(&self, sequence: u64, result: T) -> Option<T> {
        if self.is_current(sequence) {
            Some(result)
        } else {
            info!(sequence, latest = self.latest.load(Ordering::Acquire), "dropping superseded preview result");
            None
        }
    }

    /// Evaluate `request` as a new preview. Returns `Ok(None)` when a newer
    /// request started before this one finished.
    pub fn evaluate(&self, request: &EvaluateRequest) -> Result<Option<EvaluateResponse>, GraphError> {
        let sequence = self.begin();
        let response = evaluate_request(request)?;
        Ok(self.accept(sequence, response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn constant_graph(value: f64) -> Value {
        json!({
            "nodes": [{ "id": "c", "type": "Constant", "fields": { "Value": value } }],
            "edges": []
        })
    }

    #[test]
    fn evaluate_constant_graph() {
        let res = evaluate(&constant_graph(3.5), 4, -8.0, 8.0, 64.0).unwrap();
        assert_eq!(res.values.len(), 16);
        assert!(res.values.iter().all(|&v| (v - 3.5).abs() < 1e-6));
        assert_eq!(res.min_value, 3.5);
        assert_eq!(res.max_value, 3.5);
    }

    #[test]
    fn empty_graph_gives_zero_grid() {
        let res = evaluate(&json!({ "nodes": [], "edges": [] }), 3, 0.0, 1.0, 0.0).unwrap();
        assert_eq!(res.values, vec![0.0; 9]);
        assert_eq!(res.min_value, 0.0);
        assert_eq!(res.max_value, 0.0);
    }

    #[test]
    fn malformed_graph_is_an_error() {
        assert!(matches!(
            evaluate(&json!({ "nodes": 5, "edges": [] }), 4, 0.0, 1.0, 0.0),
            Err(GraphError::Parse(_))
        ));
    }

    #[test]
    fn root_node_id_is_honoured() {
        let graph = json!({
            "nodes": [
                { "id": "a", "type": "Constant", "fields": { "Value": 1.0 } },
                { "id": "b", "type": "Constant", "fields": { "Value": 2.0 } }
            ],
            "edges": [],
            "rootNodeId": "a"
        });
        let res = evaluate(&graph, 2, 0.0, 1.0, 0.0).unwrap();
        assert!(res.values.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn request_carries_content_fields() {
        let request: EvaluateRequest = serde_json::from_value(json!({
            "graph": {
                "nodes": [{ "id": "h", "type": "BaseHeight", "fields": { "BaseHeightName": "Base" } }],
                "edges": []
            },
            "resolution": 1,
            "rangeMin": 0.0,
            "rangeMax": 1.0,
            "yLevel": 0.0,
            "contentFields": { "Base": 80.0 }
        }))
        .unwrap();
        let res = evaluate_request(&request).unwrap();
        assert_eq!(res.values, vec![80.0]);
    }

    #[test]
    fn nested_assets_evaluate_directly() {
        let internal = json!({
            "Type": "Sum",
            "Inputs": [{ "Type": "Constant", "Value": 1.5 }, { "Type": "Constant", "Value": 2.0 }]
        });
        let res = evaluate(&internal, 2, 0.0, 1.0, 0.0).unwrap();
        assert!(res.values.iter().all(|&v| (v - 3.5).abs() < 1e-9));

        let native = json!({
            "Type": "Inverter",
            "$NodeId": "InverterDensityNode-1",
            "Input": { "Type": "Constant", "$NodeId": "ConstantDensityNode-2", "Value": 4.0 }
        });
        let res = evaluate(&native, 1, 0.0, 1.0, 0.0).unwrap();
        assert_eq!(res.values, vec![-4.0]);
    }

    #[test]
    fn points_follow_coordinates() {
        let nodes = vec![json!({ "id": "x", "type": "density", "data": { "type": "CoordinateX", "fields": {} } })];
        let values = evaluate_points(nodes, vec![], &[[1.0, 0.0, 0.0], [-4.5, 2.0, 9.0]], None, None).unwrap();
        assert_eq!(values, vec![1.0, -4.5]);
    }

    #[test]
    fn analysis_of_a_gradient() {
        let graph = json!({
            "nodes": [{ "id": "x", "type": "CoordinateX", "fields": {} }],
            "edges": []
        });
        let res = evaluate(&graph, 4, 0.0, 4.0, 0.0).unwrap();
        let analysis = analyze(&res, 1.0, 3);
        assert_eq!(analysis.statistics.min, 0.0);
        assert_eq!(analysis.statistics.max, 3.0);
        assert_eq!(analysis.histogram.bins.iter().sum::<usize>(), 16);
        let levels: Vec<f64> = analysis.contours.iter().map(|c| c.level).collect();
        assert_eq!(levels, vec![1.0, 2.0]);
    }

    #[test]
    fn session_drops_superseded_results() {
        let session = PreviewSession::new();
        let first = session.begin();
        let second = session.begin();
        assert_eq!(session.accept(first, "old"), None);
        assert_eq!(session.accept(second, "new"), Some("new"));

        let request = EvaluateRequest {
            graph: constant_graph(1.0),
            resolution: 2,
            range_min: 0.0,
            range_max: 1.0,
            y_level: 0.0,
            content_fields: BTreeMap::new(),
        };
        assert!(session.evaluate(&request).unwrap().is_some());
    }
}
