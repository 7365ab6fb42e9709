//! Density graph evaluation: graph construction, node rules, grid sampling.

pub mod compiled;
pub mod curves;
pub mod graph;
pub mod grid;
pub mod nodes;
pub mod noise;

pub use graph::{EvalGraph, GraphEdge, GraphNode, NodeData, RootStrategy};
pub use grid::{evaluate_grid, GridResult};
pub use nodes::{evaluate_point, EvalState};
