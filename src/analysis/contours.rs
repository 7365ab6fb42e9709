// analysis/contours.rs — Marching-squares iso-lines over a row-major grid
//
// Corner bits: TL=8, TR=4, BR=2, BL=1, set when the corner is >= level.
// Edges: 0=top, 1=right, 2=bottom, 3=left. Segment coordinates are in grid
// cells: `x` is the column, `z` the row.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContourSegment {
    pub x1: f64,
    pub z1: f64,
    pub x2: f64,
    pub z2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContourLevel {
    pub level: f64,
    pub segments: Vec<ContourSegment>,
}

/// Edge pairs to connect per 4-bit case. Saddles (5, 10) emit two segments.
const EDGE_TABLE: [&[u8]; 16] = [
    &[],
    &[3, 2],
    &[2, 1],
    &[3, 1],
    &[1, 0],
    &[3, 0, 1, 2],
    &[2, 0],
    &[3, 0],
    &[0, 3],
    &[0, 2],
    &[0, 1, 2, 3],
    &[0, 1],
    &[1, 3],
    &[1, 2],
    &[2, 3],
    &[],
];

/// Upper bound on the number of levels one call may produce.
pub const MAX_CONTOUR_LEVELS: usize = 10_000;

/// Evenly spaced levels strictly between `min` and `max`, starting at the
/// first multiple of `interval` at or above `min`. Each level is rounded to
/// 1e-6 and the result is strictly increasing. Empty when the range would
/// need more than [`MAX_CONTOUR_LEVELS`] steps.
pub fn contour_levels(min: f64, max: f64, interval: f64) -> Vec<f64> {
    if !(interval > 0.0 && max > min) {
        return Vec::new();
    }
    let first = (min / interval).ceil();
    let steps = ((max - min) / interval).floor() + 1.0;
    if !first.is_finite() || !(steps <= MAX_CONTOUR_LEVELS as f64) {
        return Vec::new();
    }
    let mut levels: Vec<f64> = Vec::new();
    for i in 0..steps as usize {
        let v = (first + i as f64) * interval;
        if v >= max {
            break;
        }
        let rounded = (v * 1e6).round() / 1e6;
        // Large magnitudes can collapse neighbouring steps onto one value.
        if rounded > min && rounded < max && levels.last().map_or(true, |&last| rounded > last) {
            levels.push(rounded);
        }
    }
    levels
}

#[inline]
fn interpolate(v1: f64, v2: f64, level: f64) -> f64 {
    if (v2 - v1).abs() < 1e-10 {
        0.5
    } else {
        (level - v1) / (v2 - v1)
    }
}

/// Contour segments for each level over an NxN row-major grid.
pub fn generate_contours(values: &[f64], resolution: usize, levels: &[f64]) -> Vec<ContourLevel> {
    let n = resolution;
    if n < 2 || values.len() < n * n {
        return levels
            .iter()
            .map(|&level| ContourLevel {
                level,
                segments: Vec::new(),
            })
            .collect();
    }

    levels
        .iter()
        .map(|&level| {
            let mut segments = Vec::new();
            for row in 0..n - 1 {
                for col in 0..n - 1 {
                    let tl = values[row * n + col];
                    let tr = values[row * n + col + 1];
                    let br = values[(row + 1) * n + col + 1];
                    let bl = values[(row + 1) * n + col];

                    let code = (usize::from(tl >= level) << 3)
                        | (usize::from(tr >= level) << 2)
                        | (usize::from(br >= level) << 1)
                        | usize::from(bl >= level);

                    let (c, r) = (col as f64, row as f64);
                    let point = |edge: u8| match edge {
                        0 => (c + interpolate(tl, tr, level), r),
                        1 => (c + 1.0, r + interpolate(tr, br, level)),
                        2 => (c + interpolate(bl, br, level), r + 1.0),
                        _ => (c, r + interpolate(tl, bl, level)),
                    };

                    for pair in EDGE_TABLE[code].chunks_exact(2) {
                        let (x1, z1) = point(pair[0]);
                        let (x2, z2) = point(pair[1]);
                        segments.push(ContourSegment { x1, z1, x2, z2 });
                    }
                }
            }
            ContourLevel { level, segments }
        })
        .collect()
}
