// eval/nodes.rs — Density node evaluation
//
// One recursive entry point (`evaluate_compiled`) guarded by a per-node
// visiting flag and a per-sample memo, and one `match` over `DensityKind`.
// Node rules return `Option<f64>`: `None` and non-finite values become 0 for
// that node at that sample.

use crate::config::EvalOptions;
use crate::eval::compiled::{DensityKind, Handle, ResolvedInputs};
use crate::eval::graph::EvalGraph;
use crate::eval::noise::{self, CellReturn, Cellular, Fractal, PermTable};
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Default `ToY` for Y gradients (world height).
const DEFAULT_WORLD_HEIGHT: f64 = 320.0;

/// Content-field height used when a `BaseHeight` name is not configured.
const DEFAULT_BASE_HEIGHT: f64 = 100.0;

/// Step used by `GradientWarp` finite differences.
const GRADIENT_WARP_EPS: f64 = 0.5;

/// Upper bound on octave loops.
const MAX_OCTAVES: f64 = 64.0;

// ── Smooth math helpers ─────────────────────────────────────────────

/// Polynomial smooth minimum; `k <= 0` is a hard minimum.
pub fn smooth_min(a: f64, b: f64, k: f64) -> f64 {
    if k <= 0.0 {
        return a.min(b);
    }
    let h = (0.5 + 0.5 * (b - a) / k).clamp(0.0, 1.0);
    b + (a - b) * h - k * h * (1.0 - h)
}

pub fn smooth_max(a: f64, b: f64, k: f64) -> f64 {
    -smooth_min(-a, -b, k)
}

// ── Evaluation state ────────────────────────────────────────────────

#[derive(Clone, Copy)]
struct MemoEntry {
    stamp: u32,
    pos: [f64; 3],
    value: f64,
}

const EMPTY_MEMO: MemoEntry = MemoEntry {
    stamp: 0,
    pos: [0.0; 3],
    value: 0.0,
};

/// Mutable state for one grid (or point) evaluation call.
pub struct EvalState {
    /// Per-node memo, valid for the current sample stamp and position.
    memo: Vec<MemoEntry>,
    stamp: u32,
    /// Cycle detection (indexed by node index).
    visiting: Vec<bool>,
    /// Permutation tables by seed; persists across samples.
    perm_cache: FxHashMap<i32, PermTable>,
    pub content_fields: BTreeMap<String, f64>,
}

impl EvalState {
    pub fn new(node_count: usize, options: &EvalOptions) -> Self {
        EvalState {
            memo: vec![EMPTY_MEMO; node_count],
            // stamp 0 marks empty entries
            stamp: 1,
            visiting: vec![false; node_count],
            perm_cache: FxHashMap::default(),
            content_fields: options.content_fields.clone(),
        }
    }

    /// Start a new sample: every memo entry becomes stale.
    #[inline]
    pub fn begin_sample(&mut self) {
        self.stamp = self.stamp.wrapping_add(1);
        if self.stamp == 0 {
            self.memo.fill(EMPTY_MEMO);
            self.stamp = 1;
        }
    }

    #[inline]
    fn get_memo(&self, idx: usize, pos: [f64; 3]) -> Option<f64> {
        let entry = &self.memo[idx];
        (entry.stamp == self.stamp && entry.pos == pos).then_some(entry.value)
    }

    #[inline]
    fn set_memo(&mut self, idx: usize, pos: [f64; 3], value: f64) {
        self.memo[idx] = MemoEntry {
            stamp: self.stamp,
            pos,
            value,
        };
    }

    /// Permutation table for `seed`, built on first use.
    pub fn perm(&mut self, seed: i32) -> &PermTable {
        self.perm_cache
            .entry(seed)
            .or_insert_with(|| PermTable::new(seed))
    }

    pub fn cached_seed_count(&self) -> usize {
        self.perm_cache.len()
    }
}

// ── Field helpers ───────────────────────────────────────────────────

/// Read a numeric field. Numeric strings are accepted.
fn field_f64(fields: &Map<String, Value>, key: &str, default: f64) -> f64 {
    match fields.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(default),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
        _ => default,
    }
}

fn field_str<'a>(fields: &'a Map<String, Value>, key: &str, default: &'a str) -> &'a str {
    fields.get(key).and_then(Value::as_str).unwrap_or(default)
}

fn field_vec3(fields: &Map<String, Value>, key: &str, default: [f64; 3]) -> [f64; 3] {
    match fields.get(key) {
        Some(Value::Object(obj)) => [
            obj.get("x").and_then(Value::as_f64).unwrap_or(default[0]),
            obj.get("y").and_then(Value::as_f64).unwrap_or(default[1]),
            obj.get("z").and_then(Value::as_f64).unwrap_or(default[2]),
        ],
        _ => default,
    }
}

fn field_range(fields: &Map<String, Value>, key: &str, default: (f64, f64)) -> (f64, f64) {
    crate::eval::curves::range_field(fields.get(key), default)
}

fn octaves(fields: &Map<String, Value>, default: f64) -> u32 {
    field_f64(fields, "Octaves", default).clamp(1.0, MAX_OCTAVES).ceil() as u32
}

fn fractal(fields: &Map<String, Value>, default_octaves: f64) -> Fractal {
    Fractal {
        frequency: field_f64(fields, "Frequency", 0.01),
        octaves: octaves(fields, default_octaves),
        lacunarity: field_f64(fields, "Lacunarity", 2.0),
        gain: field_f64(fields, "Gain", 0.5),
    }
}

fn seed(fields: &Map<String, Value>) -> i32 {
    noise::seed_from_field(fields.get("Seed"))
}

/// Zero components read as 1.
fn nonzero(v: f64) -> f64 {
    if v == 0.0 || v.is_nan() {
        1.0
    } else {
        v
    }
}

/// Linear map of `v` from `src` to `dst`; a zero-width source maps to `dst.0`.
fn remap(v: f64, src: (f64, f64), dst: (f64, f64)) -> f64 {
    let width = src.1 - src.0;
    let t = if width == 0.0 { 0.0 } else { (v - src.0) / width };
    dst.0 + t * (dst.1 - dst.0)
}

// ── Input helpers ───────────────────────────────────────────────────

#[inline]
fn input(
    graph: &EvalGraph,
    state: &mut EvalState,
    ri: &ResolvedInputs,
    handle: Handle,
    x: f64,
    y: f64,
    z: f64,
) -> f64 {
    match ri.get(handle) {
        Some(src) => evaluate_compiled(graph, state, src, x, y, z),
        None => 0.0,
    }
}

#[inline]
fn array_input(
    graph: &EvalGraph,
    state: &mut EvalState,
    ri: &ResolvedInputs,
    index: u32,
    x: f64,
    y: f64,
    z: f64,
) -> f64 {
    match ri.array_at(index) {
        Some(src) => evaluate_compiled(graph, state, src, x, y, z),
        None => 0.0,
    }
}

/// Values of every connected `Inputs[N]`, in index order.
fn array_values(
    graph: &EvalGraph,
    state: &mut EvalState,
    ri: &ResolvedInputs,
    x: f64,
    y: f64,
    z: f64,
) -> smallvec::SmallVec<[f64; 8]> {
    ri.array_sources()
        .map(|src| evaluate_compiled(graph, state, src, x, y, z))
        .collect()
}

// ── Entry points ────────────────────────────────────────────────────

/// Evaluate the graph root at one world position, as a fresh sample.
pub fn evaluate_point(graph: &EvalGraph, state: &mut EvalState, x: f64, y: f64, z: f64) -> f64 {
    state.begin_sample();
    evaluate_compiled(graph, state, graph.root_idx, x, y, z)
}

/// Evaluate one node at `(x, y, z)` within the current sample.
///
/// Revisiting a node that is still being evaluated returns 0. A node already
/// evaluated at the same position in this sample returns its memoised value.
pub fn evaluate_compiled(
    graph: &EvalGraph,
    state: &mut EvalState,
    node_idx: usize,
    x: f64,
    y: f64,
    z: f64,
) -> f64 {
    if state.visiting[node_idx] {
        return 0.0;
    }
    let pos = [x, y, z];
    if let Some(cached) = state.get_memo(node_idx, pos) {
        return cached;
    }

    state.visiting[node_idx] = true;
    let result = match evaluate_inner(graph, state, node_idx, x, y, z) {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    };
    state.visiting[node_idx] = false;
    state.set_memo(node_idx, pos, result);

    result
}

// ── Dispatch ────────────────────────────────────────────────────────

fn evaluate_inner(
    graph: &EvalGraph,
    state: &mut EvalState,
    node_idx: usize,
    x: f64,
    y: f64,
    z: f64,
) -> Option<f64> {
    let kind = graph.kinds[node_idx]?;
    let fields = &graph.node_list[node_idx].data.fields;
    let ri = &graph.resolved[node_idx];

    macro_rules! inp {
        ($h:ident) => {
            input(graph, state, ri, Handle::$h, x, y, z)
        };
        ($h:ident, $x:expr, $y:expr, $z:expr) => {
            input(graph, state, ri, Handle::$h, $x, $y, $z)
        };
    }

    let value = match kind {
        // ── Constants ───────────────────────────────────────────────
        DensityKind::Constant => field_f64(fields, "Value", 0.0),
        DensityKind::Zero => 0.0,
        DensityKind::One => 1.0,
        DensityKind::SwitchState => field_f64(fields, "State", 0.0),

        // ── Coordinates ─────────────────────────────────────────────
        DensityKind::CoordinateX => x,
        DensityKind::CoordinateY => y,
        DensityKind::CoordinateZ => z,
        DensityKind::DistanceFromOrigin => (x * x + y * y + z * z).sqrt(),
        DensityKind::DistanceFromAxis => match field_str(fields, "Axis", "Y") {
            "X" => (y * y + z * z).sqrt(),
            "Z" => (x * x + y * y).sqrt(),
            _ => (x * x + z * z).sqrt(),
        },
        DensityKind::DistanceFromPoint => {
            let [px, py, pz] = field_vec3(fields, "Point", [0.0; 3]);
            ((x - px).powi(2) + (y - py).powi(2) + (z - pz).powi(2)).sqrt()
        }
        DensityKind::AngleFromOrigin => z.atan2(x),
        DensityKind::AngleFromPoint => {
            let [px, _, pz] = field_vec3(fields, "Point", [0.0; 3]);
            (z - pz).atan2(x - px)
        }
        DensityKind::YGradient => {
            let from = field_f64(fields, "FromY", 0.0);
            let to = field_f64(fields, "ToY", DEFAULT_WORLD_HEIGHT);
            if to == from {
                0.0
            } else {
                (y - from) / (to - from)
            }
        }
        DensityKind::BaseHeight => {
            let name = field_str(fields, "BaseHeightName", "Base");
            let base = state
                .content_fields
                .get(name)
                .copied()
                .unwrap_or(DEFAULT_BASE_HEIGHT);
            if fields.get("Distance").and_then(Value::as_bool) == Some(true) {
                y - base
            } else {
                base
            }
        }

        // ── Noise ───────────────────────────────────────────────────
        DensityKind::SimplexNoise2D => {
            let amp = field_f64(fields, "Amplitude", 1.0);
            let fr = fractal(fields, 1.0);
            noise::fbm_2d(state.perm(seed(fields)), x, z, &fr) * amp
        }
        DensityKind::SimplexNoise3D => {
            let amp = field_f64(fields, "Amplitude", 1.0);
            let fr = fractal(fields, 1.0);
            noise::fbm_3d(state.perm(seed(fields)), x, y, z, &fr) * amp
        }
        DensityKind::SimplexRidgeNoise2D => {
            let amp = field_f64(fields, "Amplitude", 1.0);
            let freq = field_f64(fields, "Frequency", 0.01);
            let oct = octaves(fields, 1.0);
            noise::ridge_fbm_2d(state.perm(seed(fields)), x, z, freq, oct) * amp
        }
        DensityKind::SimplexRidgeNoise3D => {
            let amp = field_f64(fields, "Amplitude", 1.0);
            let freq = field_f64(fields, "Frequency", 0.01);
            let oct = octaves(fields, 1.0);
            noise::ridge_fbm_3d(state.perm(seed(fields)), x, y, z, freq, oct) * amp
        }
        DensityKind::FractalNoise2D => {
            let fr = fractal(fields, 4.0);
            noise::fbm_2d(state.perm(seed(fields)), x, z, &fr)
        }
        DensityKind::FractalNoise3D => {
            let fr = fractal(fields, 4.0);
            noise::fbm_3d(state.perm(seed(fields)), x, y, z, &fr)
        }
        DensityKind::VoronoiNoise2D => {
            let cell = Cellular {
                seed: seed(fields),
                jitter: field_f64(fields, "Jitter", 1.0),
                mode: CellReturn::from_name(field_str(fields, "CellType", "Euclidean")),
            };
            let fr = fractal(fields, 1.0);
            if fr.octaves > 1 {
                fr.sum(|f| cell.sample_2d(x * f, z * f))
            } else {
                cell.sample_2d(x * fr.frequency, z * fr.frequency)
            }
        }
        DensityKind::VoronoiNoise3D => {
            let cell = Cellular {
                seed: seed(fields),
                jitter: field_f64(fields, "Jitter", 1.0),
                mode: CellReturn::from_name(field_str(fields, "CellType", "Euclidean")),
            };
            let fr = fractal(fields, 1.0);
            if fr.octaves > 1 {
                fr.sum(|f| cell.sample_3d(x * f, y * f, z * f))
            } else {
                let f = fr.frequency;
                cell.sample_3d(x * f, y * f, z * f)
            }
        }
        DensityKind::Positions3D => {
            let freq = field_f64(fields, "Frequency", 0.01);
            let cell = Cellular {
                seed: seed(fields),
                jitter: 1.0,
                mode: CellReturn::Distance,
            };
            cell.sample_3d(x * freq, y * freq, z * freq)
        }
        DensityKind::PositionsCellNoise => {
            let max_dist = field_f64(fields, "MaxDistance", 0.0);
            let freq = if max_dist > 0.0 {
                1.0 / max_dist
            } else {
                field_f64(fields, "Frequency", 0.01)
            };
            let cell = Cellular {
                seed: seed(fields),
                jitter: 1.0,
                mode: CellReturn::from_name(field_str(fields, "DistanceFunction", "Euclidean")),
            };
            let raw = cell.sample_2d(x * freq, z * freq);
            if field_str(fields, "ReturnType", "Distance") == "Distance2Div" {
                raw.abs()
            } else {
                raw
            }
        }
        DensityKind::DomainWarp2D => {
            let amp = field_f64(fields, "Amplitude", 1.0);
            let freq = field_f64(fields, "Frequency", 0.01);
            let s = seed(fields);
            let (sx, sz) = (x * freq, z * freq);
            let wx = noise::simplex_2d(state.perm(s), sx, sz) * amp;
            let wz = noise::simplex_2d(state.perm(s.wrapping_add(1)), sx, sz) * amp;
            inp!(Input, x + wx, y, z + wz)
        }
        DensityKind::DomainWarp3D => {
            let amp = field_f64(fields, "Amplitude", 1.0);
            let freq = field_f64(fields, "Frequency", 0.01);
            let s = seed(fields);
            let (sx, sy, sz) = (x * freq, y * freq, z * freq);
            let wx = noise::simplex_3d(state.perm(s), sx, sy, sz) * amp;
            let wy = noise::simplex_3d(state.perm(s.wrapping_add(1)), sx, sy, sz) * amp;
            let wz = noise::simplex_3d(state.perm(s.wrapping_add(2)), sx, sy, sz) * amp;
            inp!(Input, x + wx, y + wy, z + wz)
        }

        // ── Unary arithmetic ────────────────────────────────────────
        DensityKind::Negate => -inp!(Input),
        DensityKind::Abs => inp!(Input).abs(),
        DensityKind::SquareRoot => inp!(Input).abs().sqrt(),
        DensityKind::CubeRoot => inp!(Input).cbrt(),
        DensityKind::Square => {
            let v = inp!(Input);
            v * v
        }
        DensityKind::Cube => {
            let v = inp!(Input);
            v * v * v
        }
        DensityKind::Inverse => {
            let v = inp!(Input);
            if v == 0.0 {
                return None;
            }
            1.0 / v
        }
        DensityKind::SumSelf => inp!(Input) * field_f64(fields, "Count", 2.0).max(1.0),
        DensityKind::Modulo => {
            let v = inp!(Input);
            let divisor = field_f64(fields, "Divisor", 1.0);
            if divisor == 0.0 {
                return None;
            }
            v % divisor
        }
        DensityKind::AmplitudeConstant => inp!(Input) * field_f64(fields, "Value", 1.0),
        DensityKind::Pow => {
            let v = inp!(Input);
            if v == 0.0 {
                0.0
            } else {
                v.abs().powf(field_f64(fields, "Exponent", 2.0)) * v.signum()
            }
        }
        DensityKind::LinearTransform => {
            inp!(Input) * field_f64(fields, "Scale", 1.0) + field_f64(fields, "Offset", 0.0)
        }
        DensityKind::Floor => inp!(Input).floor(),
        DensityKind::Ceiling => inp!(Input).ceil(),

        // ── Combinators ─────────────────────────────────────────────
        DensityKind::Sum => {
            let pair = inp!(InputA) + inp!(InputB);
            pair + array_values(graph, state, ri, x, y, z).iter().sum::<f64>()
        }
        DensityKind::Product => array_values(graph, state, ri, x, y, z).iter().product(),
        DensityKind::WeightedSum => {
            let weights = fields.get("Weights").and_then(Value::as_array);
            array_values(graph, state, ri, x, y, z)
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    let w = weights
                        .and_then(|ws| ws.get(i))
                        .and_then(Value::as_f64)
                        .unwrap_or(1.0);
                    v * w
                })
                .sum()
        }
        DensityKind::MinFunction => {
            let vals = array_values(graph, state, ri, x, y, z);
            vals.iter().copied().reduce(f64::min).unwrap_or(0.0)
        }
        DensityKind::MaxFunction => {
            let vals = array_values(graph, state, ri, x, y, z);
            vals.iter().copied().reduce(f64::max).unwrap_or(0.0)
        }
        DensityKind::AverageFunction => {
            let vals = array_values(graph, state, ri, x, y, z);
            if vals.is_empty() {
                0.0
            } else {
                vals.iter().sum::<f64>() / vals.len() as f64
            }
        }
        DensityKind::Interpolate => {
            let a = inp!(InputA);
            let b = inp!(InputB);
            let f = inp!(Factor);
            a + (b - a) * f
        }
        DensityKind::Blend => {
            let a = inp!(InputA);
            let b = inp!(InputB);
            let f = if ri.has(Handle::Factor) { inp!(Factor) } else { 0.5 };
            a + (b - a) * f
        }
        DensityKind::BlendCurve => {
            let a = inp!(InputA);
            let b = inp!(InputB);
            let f = apply_curve(graph, node_idx, inp!(Factor));
            a + (b - a) * f
        }
        DensityKind::Offset => inp!(Input) + inp!(Offset),
        DensityKind::Amplitude => inp!(Input) * inp!(Amplitude),

        // ── Ranges and selection ────────────────────────────────────
        DensityKind::Clamp => {
            let v = inp!(Input);
            let min = field_f64(fields, "Min", 0.0);
            let max = field_f64(fields, "Max", 1.0);
            v.min(max).max(min)
        }
        DensityKind::ClampToIndex => {
            let v = inp!(Input).floor();
            let min = field_f64(fields, "Min", 0.0);
            let max = field_f64(fields, "Max", 255.0);
            v.min(max).max(min)
        }
        DensityKind::Normalizer => remap(
            inp!(Input),
            field_range(fields, "SourceRange", (-1.0, 1.0)),
            field_range(fields, "TargetRange", (0.0, 1.0)),
        ),
        DensityKind::DoubleNormalizer => {
            let v = inp!(Input);
            if v < 0.0 {
                remap(
                    v,
                    field_range(fields, "SourceRangeA", (-1.0, 0.0)),
                    field_range(fields, "TargetRangeA", (0.0, 0.5)),
                )
            } else {
                remap(
                    v,
                    field_range(fields, "SourceRangeB", (0.0, 1.0)),
                    field_range(fields, "TargetRangeB", (0.5, 1.0)),
                )
            }
        }
        DensityKind::RangeChoice | DensityKind::Conditional => {
            let default_threshold = if kind == DensityKind::RangeChoice { 0.5 } else { 0.0 };
            let cond = inp!(Condition);
            if cond >= field_f64(fields, "Threshold", default_threshold) {
                inp!(TrueInput)
            } else {
                inp!(FalseInput)
            }
        }
        DensityKind::Switch => {
            let selector = field_f64(fields, "Selector", 0.0).floor().max(0.0);
            array_input(graph, state, ri, selector.min(u32::MAX as f64) as u32, x, y, z)
        }

        // ── Smooth operators ────────────────────────────────────────
        DensityKind::SmoothMin => {
            let a = array_input(graph, state, ri, 0, x, y, z);
            let b = array_input(graph, state, ri, 1, x, y, z);
            smooth_min(a, b, field_f64(fields, "Smoothness", 0.1))
        }
        DensityKind::SmoothMax => {
            let a = array_input(graph, state, ri, 0, x, y, z);
            let b = array_input(graph, state, ri, 1, x, y, z);
            smooth_max(a, b, field_f64(fields, "Smoothness", 0.1))
        }
        DensityKind::SmoothClamp => {
            let v = inp!(Input);
            let min = field_f64(fields, "Min", 0.0);
            let max = field_f64(fields, "Max", 1.0);
            let k = field_f64(fields, "Smoothness", 0.1);
            smooth_max(smooth_min(v, max, k), min, k)
        }
        DensityKind::SmoothFloor => smooth_max(
            inp!(Input),
            field_f64(fields, "Threshold", 0.0),
            field_f64(fields, "Smoothness", 0.1),
        ),
        DensityKind::SmoothCeiling => smooth_min(
            inp!(Input),
            field_f64(fields, "Threshold", 1.0),
            field_f64(fields, "Smoothness", 0.1),
        ),

        // ── Position transforms ─────────────────────────────────────
        DensityKind::TranslatedPosition => {
            let [dx, dy, dz] = field_vec3(fields, "Translation", [0.0; 3]);
            inp!(Input, x - dx, y - dy, z - dz)
        }
        DensityKind::ScaledPosition => {
            let [sx, sy, sz] = field_vec3(fields, "Scale", [1.0; 3]);
            inp!(Input, x / nonzero(sx), y / nonzero(sy), z / nonzero(sz))
        }
        DensityKind::RotatedPosition => {
            let rad = field_f64(fields, "AngleDegrees", 0.0).to_radians();
            let (sin, cos) = rad.sin_cos();
            inp!(Input, x * cos + z * sin, y, -x * sin + z * cos)
        }
        DensityKind::MirroredPosition => match field_str(fields, "Axis", "X") {
            "Y" => inp!(Input, x, y.abs(), z),
            "Z" => inp!(Input, x, y, z.abs()),
            "X" => inp!(Input, x.abs(), y, z),
            _ => inp!(Input),
        },
        DensityKind::QuantizedPosition => {
            let step = nonzero(field_f64(fields, "StepSize", 1.0));
            let q = |v: f64| (v / step).floor() * step;
            inp!(Input, q(x), q(y), q(z))
        }
        DensityKind::XOverride => inp!(Input, field_f64(fields, "OverrideX", 0.0), y, z),
        DensityKind::YOverride => {
            let oy = if fields.contains_key("OverrideY") {
                field_f64(fields, "OverrideY", 0.0)
            } else {
                field_f64(fields, "Y", 0.0)
            };
            inp!(Input, x, oy, z)
        }
        DensityKind::ZOverride => inp!(Input, x, y, field_f64(fields, "OverrideZ", 0.0)),
        DensityKind::Anchor => inp!(Input, 0.0, 0.0, 0.0),
        DensityKind::YSampled => {
            let sampled_y = inp!(YProvider);
            inp!(Input, x, sampled_y, z)
        }
        DensityKind::PositionsPinch => {
            let strength = field_f64(fields, "Strength", 1.0);
            let dist = (x * x + z * z).sqrt();
            let pinch = if dist > 0.0 {
                dist.powf(strength) / dist
            } else {
                1.0
            };
            inp!(Input, x * pinch, y, z * pinch)
        }
        DensityKind::PositionsTwist => {
            let rad = field_f64(fields, "Angle", 0.0).to_radians() * y;
            let (sin, cos) = rad.sin_cos();
            inp!(Input, x * cos - z * sin, y, x * sin + z * cos)
        }
        DensityKind::GradientWarp => {
            let scale = field_f64(fields, "WarpScale", 1.0);
            let base = inp!(WarpSource);
            let dfdx = (inp!(WarpSource, x + GRADIENT_WARP_EPS, y, z) - base) / GRADIENT_WARP_EPS;
            let dfdz = (inp!(WarpSource, x, y, z + GRADIENT_WARP_EPS) - base) / GRADIENT_WARP_EPS;
            inp!(Input, x + dfdx * scale, y, z + dfdz * scale)
        }

        // ── Curves ──────────────────────────────────────────────────
        DensityKind::CurveFunction | DensityKind::SplineFunction => {
            let v = inp!(Input);
            apply_curve(graph, node_idx, v)
        }
        DensityKind::Distance => {
            let dist = (x * x + y * y + z * z).sqrt();
            apply_curve(graph, node_idx, dist)
        }

        // ── Shapes ──────────────────────────────────────────────────
        DensityKind::Ellipsoid => {
            let [rx, ry, rz] = field_vec3(fields, "Radius", [1.0; 3]);
            let (rx, ry, rz) = (nonzero(rx), nonzero(ry), nonzero(rz));
            ((x / rx).powi(2) + (y / ry).powi(2) + (z / rz).powi(2)).sqrt() - 1.0
        }
        DensityKind::Cuboid => {
            let [sx, sy, sz] = field_vec3(fields, "Size", [1.0; 3]);
            let dx = x.abs() - nonzero(sx);
            let dy = y.abs() - nonzero(sy);
            let dz = z.abs() - nonzero(sz);
            let outside =
                (dx.max(0.0).powi(2) + dy.max(0.0).powi(2) + dz.max(0.0).powi(2)).sqrt();
            let inside = dx.max(dy).max(dz).min(0.0);
            outside + inside
        }
        DensityKind::Cylinder => {
            let radius = nonzero(field_f64(fields, "Radius", 1.0));
            let half_height = field_f64(fields, "Height", 2.0) / 2.0;
            let d_radial = (x * x + z * z).sqrt() - radius;
            let d_vertical = y.abs() - half_height;
            let outside = (d_radial.max(0.0).powi(2) + d_vertical.max(0.0).powi(2)).sqrt();
            outside + d_radial.max(d_vertical).min(0.0)
        }
        DensityKind::Plane => {
            let [nx, ny, nz] = field_vec3(fields, "Normal", [0.0, 1.0, 0.0]);
            let len = nonzero((nx * nx + ny * ny + nz * nz).sqrt());
            let d = field_f64(fields, "Distance", 0.0);
            (nx * x + ny * y + nz * z) / len - d
        }
        DensityKind::Shell => {
            let inner = field_f64(fields, "InnerRadius", 0.5);
            let outer = field_f64(fields, "OuterRadius", 1.0);
            let dist = (x * x + y * y + z * z).sqrt();
            (dist - (inner + outer) / 2.0).abs() - (outer - inner) / 2.0
        }

        // ── Caching and pass-through ────────────────────────────────
        DensityKind::CacheOnce | DensityKind::Passthrough => inp!(Input),

        DensityKind::ContextDependent => return None,
    };

    Some(value)
}

/// Map `v` through the node's prepared curve; no curve passes `v` through.
#[inline]
fn apply_curve(graph: &EvalGraph, node_idx: usize, v: f64) -> f64 {
    match &graph.curves[node_idx] {
        Some(curve) => curve.eval(v),
        None => v,
    }
}
