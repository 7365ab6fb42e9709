// analysis/cross_section.rs — Bilinear profile along a world-space line

use serde::{Deserialize, Serialize};

/// A point on the XZ plane in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CrossSectionSample {
    /// World distance from the start point.
    pub distance: f64,
    pub x: f64,
    pub z: f64,
    pub value: f64,
}

/// Bilinear lookup on an NxN row-major grid at grid coordinates
/// `(grid_x, grid_z)` in `0..resolution-1`. Indices are clamped to the grid.
pub fn bilinear_sample(values: &[f64], resolution: usize, grid_x: f64, grid_z: f64) -> f64 {
    if resolution == 0 || values.len() < resolution * resolution {
        return 0.0;
    }
    let last = (resolution - 1) as f64;
    let x0f = grid_x.floor();
    let z0f = grid_z.floor();
    let fx = grid_x - x0f;
    let fz = grid_z - z0f;

    let clamp = |v: f64| v.clamp(0.0, last) as usize;
    let x0 = clamp(x0f);
    let z0 = clamp(z0f);
    let x1 = clamp(x0f + 1.0);
    let z1 = clamp(z0f + 1.0);

    let v00 = values[z0 * resolution + x0];
    let v10 = values[z0 * resolution + x1];
    let v01 = values[z1 * resolution + x0];
    let v11 = values[z1 * resolution + x1];

    v00 * (1.0 - fx) * (1.0 - fz) + v10 * fx * (1.0 - fz) + v01 * (1.0 - fx) * fz + v11 * fx * fz
}

/// Equidistant samples from `start` to `end`, oversampled at twice the grid
/// density. Empty when the line is shorter than 1e-6.
pub fn sample_cross_section(
    values: &[f64],
    resolution: usize,
    range_min: f64,
    range_max: f64,
    start: WorldPoint,
    end: WorldPoint,
) -> Vec<CrossSectionSample> {
    let dx = end.x - start.x;
    let dz = end.z - start.z;
    let length = (dx * dx + dz * dz).sqrt();
    let range = range_max - range_min;
    if length < 1e-6 || range == 0.0 || resolution == 0 {
        return Vec::new();
    }

    let count = ((resolution as f64 * 2.0 * length / range).ceil().max(2.0)) as usize;
    let to_grid = |w: f64| (w - range_min) / range * (resolution as f64 - 1.0);

    (0..count)
        .map(|i| {
            let t = i as f64 / (count - 1) as f64;
            let x = start.x + t * dx;
            let z = start.z + t * dz;
            CrossSectionSample {
                distance: t * length,
                x,
                z,
                value: bilinear_sample(values, resolution, to_grid(x), to_grid(z)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bilinear_center_of_two_by_two() {
        let values = [0.0, 1.0, 2.0, 3.0];
        assert!((bilinear_sample(&values, 2, 0.5, 0.5) - 1.5).abs() < 1e-12);
        assert_eq!(bilinear_sample(&values, 2, 1.0, 1.0), 3.0);
    }

    #[test]
    fn bilinear_clamps_outside_grid() {
        let values = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(bilinear_sample(&values, 2, -5.0, 0.0), 0.0);
        assert_eq!(bilinear_sample(&values, 2, 9.0, 9.0), 3.0);
    }

    #[test]
    fn zero_length_line_is_empty() {
        let values = [0.0; 4];
        let p = WorldPoint { x: 1.0, z: 1.0 };
        assert!(sample_cross_section(&values, 2, -1.0, 1.0, p, p).is_empty());
    }

    #[test]
    fn samples_span_the_line() {
        // value = column index on a 3x3 grid over [0, 2]
        let values = [0.0, 1.0, 2.0, 0.0, 1.0, 2.0, 0.0, 1.0, 2.0];
        let samples = sample_cross_section(
            &values,
            3,
            0.0,
            2.0,
            WorldPoint { x: 0.0, z: 1.0 },
            WorldPoint { x: 2.0, z: 1.0 },
        );
        assert_eq!(samples.len(), 6);
        assert_eq!(samples[0].distance, 0.0);
        assert!((samples[5].distance - 2.0).abs() < 1e-12);
        assert!((samples[5].value - 2.0).abs() < 1e-12);
        for s in &samples {
            assert!((s.value - s.x).abs() < 1e-9);
        }
    }

    #[test]
    fn short_lines_get_two_samples() {
        let values = [0.0; 4];
        let samples = sample_cross_section(
            &values,
            2,
            -100.0,
            100.0,
            WorldPoint { x: 0.0, z: 0.0 },
            WorldPoint { x: 0.1, z: 0.0 },
        );
        assert_eq!(samples.len(), 2);
    }
}
