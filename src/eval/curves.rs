// eval/curves.rs — 1D curve evaluators
//
// A curve node maps a scalar to a scalar. Each previewable curve type is a
// `Curve` variant built once from its node fields; `Curve::from_node` is the
// registry that decides which types have a scalar preview at all.
// Point-list curves are smoothed with Catmull-Rom splines (32 segments per
// span) and the interpolated values are never clamped.

use serde_json::{Map, Value};

/// Catmull-Rom samples generated per span between two control points.
pub const SPLINE_SEGMENTS: usize = 32;

// ── Points ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePoint {
    pub x: f64,
    pub y: f64,
}

/// Read control points from either `[[x, y], …]` or `[{"x", "y"}, …]`.
/// Malformed entries read as `(0, 0)`.
pub fn normalize_points(raw: &Value) -> Vec<CurvePoint> {
    let Some(items) = raw.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .map(|item| match item {
            Value::Array(pair) => CurvePoint {
                x: pair.first().and_then(Value::as_f64).unwrap_or(0.0),
                y: pair.get(1).and_then(Value::as_f64).unwrap_or(0.0),
            },
            Value::Object(obj) => CurvePoint {
                x: obj.get("x").and_then(Value::as_f64).unwrap_or(0.0),
                y: obj.get("y").and_then(Value::as_f64).unwrap_or(0.0),
            },
            _ => CurvePoint { x: 0.0, y: 0.0 },
        })
        .collect()
}

/// Serialize points the way curve assets store them: sorted by x, each
/// coordinate rounded to 4 decimal places.
pub fn to_output_format(points: &[CurvePoint]) -> Value {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x));
    let round4 = |v: f64| (v * 10_000.0).round() / 10_000.0;
    Value::Array(
        sorted
            .iter()
            .map(|p| serde_json::json!([round4(p.x), round4(p.y)]))
            .collect(),
    )
}

// ── Catmull-Rom ─────────────────────────────────────────────────────

/// Densely sample a Catmull-Rom spline through `points` (sorted by x).
/// End tangents reuse the first/last point. Fewer than two points are
/// returned unchanged.
pub fn catmull_rom_interpolate(points: &[CurvePoint], segments: usize) -> Vec<CurvePoint> {
    let n = points.len();
    if n < 2 || segments == 0 {
        return points.to_vec();
    }

    let mut out = Vec::with_capacity((n - 1) * segments + 1);
    for i in 0..n - 1 {
        let p0 = points[i.saturating_sub(1)];
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = points[(i + 2).min(n - 1)];

        for s in 0..segments {
            let t = s as f64 / segments as f64;
            out.push(CurvePoint {
                x: catmull_rom(p0.x, p1.x, p2.x, p3.x, t),
                y: catmull_rom(p0.y, p1.y, p2.y, p3.y, t),
            });
        }
    }
    out.push(points[n - 1]);
    out
}

#[inline]
fn catmull_rom(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * (2.0 * p1
        + (-p0 + p2) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t3)
}

/// A point-list curve, pre-sampled once so lookups are a binary search.
#[derive(Debug, Clone, PartialEq)]
pub struct SplineCurve {
    samples: Vec<CurvePoint>,
    x_min: f64,
    x_max: f64,
}

impl SplineCurve {
    /// Build from raw points. Needs at least two points.
    pub fn from_points(mut points: Vec<CurvePoint>) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        points.sort_by(|a, b| a.x.total_cmp(&b.x));
        let x_min = points[0].x;
        let x_max = points[points.len() - 1].x;
        Some(SplineCurve {
            samples: catmull_rom_interpolate(&points, SPLINE_SEGMENTS),
            x_min,
            x_max,
        })
    }

    /// Build from a `Points` field value.
    pub fn from_field(raw: Option<&Value>) -> Option<Self> {
        raw.map(normalize_points).and_then(Self::from_points)
    }

    /// Look up `y` for `x`. The input is clamped to the control-point span;
    /// the output is not.
    pub fn sample(&self, x: f64) -> f64 {
        let clamped = x.max(self.x_min).min(self.x_max);
        let s = &self.samples;
        let mut lo = 0usize;
        let mut hi = s.len() - 1;
        while lo + 1 < hi {
            let mid = (lo + hi) >> 1;
            if s[mid].x <= clamped {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        let (p0, p1) = (s[lo], s[hi]);
        let dx = p1.x - p0.x;
        let t = if dx == 0.0 { 0.0 } else { (clamped - p0.x) / dx };
        p0.y + (p1.y - p0.y) * t
    }

    pub fn samples(&self) -> &[CurvePoint] {
        &self.samples
    }
}

// ── Curve kinds ─────────────────────────────────────────────────────

/// A previewable scalar curve.
#[derive(Debug, Clone, PartialEq)]
pub enum Curve {
    Constant(f64),
    Power { exponent: f64 },
    StepFunction { steps: f64 },
    Threshold { threshold: f64 },
    SmoothStep { edge0: f64, edge1: f64 },
    DistanceExponential { exponent: f64, min: f64, max: f64 },
    Inverter,
    Clamp { min: f64, max: f64 },
    LinearRemap { source: (f64, f64), target: (f64, f64) },
    Spline(SplineCurve),
}

impl Curve {
    /// Registry: build the curve for a node type, or `None` when the type
    /// has no scalar preview (multi-input combinators, unknown types, or a
    /// point curve with fewer than two points).
    pub fn from_node(curve_type: &str, fields: &Map<String, Value>) -> Option<Curve> {
        let num = |key: &str, default: f64| fields.get(key).and_then(Value::as_f64).unwrap_or(default);
        let kind = curve_type.strip_prefix("Curve:").unwrap_or(curve_type);

        let curve = match kind {
            "Constant" => Curve::Constant(num("Value", 1.0)),
            "Power" => Curve::Power {
                exponent: num("Exponent", 2.0),
            },
            "StepFunction" => Curve::StepFunction {
                steps: num("Steps", 4.0),
            },
            "Threshold" => Curve::Threshold {
                threshold: num("Threshold", 0.5),
            },
            "SmoothStep" => Curve::SmoothStep {
                edge0: num("Edge0", 0.0),
                edge1: num("Edge1", 1.0),
            },
            "DistanceExponential" => {
                let (min, max) = range_field(fields.get("Range"), (0.0, 1.0));
                Curve::DistanceExponential {
                    exponent: num("Exponent", 2.0),
                    min,
                    max,
                }
            }
            "Inverter" => Curve::Inverter,
            "Clamp" => Curve::Clamp {
                min: num("Min", 0.0),
                max: num("Max", 1.0),
            },
            "LinearRemap" => Curve::LinearRemap {
                source: range_field(fields.get("SourceRange"), (0.0, 1.0)),
                target: range_field(fields.get("TargetRange"), (0.0, 1.0)),
            },
            "Manual" | "Spline" | "Points" => {
                Curve::Spline(SplineCurve::from_field(fields.get("Points"))?)
            }
            _ => return None,
        };
        Some(curve)
    }

    pub fn eval(&self, x: f64) -> f64 {
        match self {
            Curve::Constant(v) => *v,
            Curve::Power { exponent } => x.powf(*exponent),
            Curve::StepFunction { steps } => {
                if *steps <= 0.0 {
                    x
                } else {
                    (x * steps).floor() / steps
                }
            }
            Curve::Threshold { threshold } => {
                if x >= *threshold {
                    1.0
                } else {
                    0.0
                }
            }
            Curve::SmoothStep { edge0, edge1 } => {
                if edge0 == edge1 {
                    return if x >= *edge0 { 1.0 } else { 0.0 };
                }
                let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
                t * t * (3.0 - 2.0 * t)
            }
            Curve::DistanceExponential { exponent, min, max } => {
                if max == min {
                    return 0.0;
                }
                ((x - min) / (max - min)).powf(*exponent)
            }
            Curve::Inverter => 1.0 - x,
            Curve::Clamp { min, max } => x.max(*min).min(*max),
            Curve::LinearRemap { source, target } => {
                let width = source.1 - source.0;
                if width == 0.0 {
                    return target.0;
                }
                let t = (x - source.0) / width;
                target.0 + t * (target.1 - target.0)
            }
            Curve::Spline(spline) => spline.sample(x),
        }
    }
}

/// Read a `{Min, Max}` object, falling back per component.
pub fn range_field(raw: Option<&Value>, default: (f64, f64)) -> (f64, f64) {
    match raw {
        Some(Value::Object(obj)) => (
            obj.get("Min").and_then(Value::as_f64).unwrap_or(default.0),
            obj.get("Max").and_then(Value::as_f64).unwrap_or(default.1),
        ),
        _ => default,
    }
}
