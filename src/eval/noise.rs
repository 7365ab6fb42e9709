// eval/noise.rs — Hytale-parity noise primitives
//
// Simplex noise here must agree sample-for-sample with what the engine and
// the editor preview render, so the permutation table, the gradient sets and
// the kernel constants are fixed. Seeds are 32-bit integers; string seeds go
// through Java's `String.hashCode`.

use serde_json::Value;

// ── Gradient sets ───────────────────────────────────────────────────

const GRAD2: [[f64; 2]; 8] = [
    [1.0, 0.0],
    [-1.0, 0.0],
    [0.0, 1.0],
    [0.0, -1.0],
    [1.0, 1.0],
    [-1.0, 1.0],
    [1.0, -1.0],
    [-1.0, -1.0],
];

const GRAD3: [[f64; 3]; 12] = [
    [1.0, 1.0, 0.0],
    [-1.0, 1.0, 0.0],
    [1.0, -1.0, 0.0],
    [-1.0, -1.0, 0.0],
    [1.0, 0.0, 1.0],
    [-1.0, 0.0, 1.0],
    [1.0, 0.0, -1.0],
    [-1.0, 0.0, -1.0],
    [0.0, 1.0, 1.0],
    [0.0, -1.0, 1.0],
    [0.0, 1.0, -1.0],
    [0.0, -1.0, -1.0],
];

// ── Seeds ───────────────────────────────────────────────────────────

/// Java `String.hashCode()` over UTF-16 code units.
pub fn java_string_hash_code(s: &str) -> i32 {
    s.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as i32))
}

/// Turn a `Seed` field into an integer seed.
///
/// Numbers are truncated to 32 bits the way `seed | 0` does in JS, strings are
/// hashed, anything else (including a missing field) is seed 0.
pub fn seed_from_field(seed: Option<&Value>) -> i32 {
    match seed {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => i as i32,
            None => n.as_f64().map(js_to_int32).unwrap_or(0),
        },
        Some(Value::String(s)) => java_string_hash_code(s),
        _ => 0,
    }
}

/// ECMAScript ToInt32 for finite doubles.
fn js_to_int32(v: f64) -> i32 {
    if !v.is_finite() {
        return 0;
    }
    let truncated = v.trunc();
    let modulo = truncated.rem_euclid(4294967296.0);
    (modulo as u64 as u32) as i32
}

// ── Mulberry32 ──────────────────────────────────────────────────────

/// Mulberry32 PRNG with 32-bit wrapping arithmetic.
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    pub fn new(seed: i32) -> Self {
        Self { state: seed as u32 }
    }

    /// Next value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.state = self.state.wrapping_add(0x6d2b79f5);
        let s = self.state;
        let mut t = (s ^ (s >> 15)).wrapping_mul(1 | s);
        t = t.wrapping_add((t ^ (t >> 7)).wrapping_mul(61 | t)) ^ t;
        f64::from(t ^ (t >> 14)) / 4294967296.0
    }
}

// ── Permutation table ───────────────────────────────────────────────

/// 512-entry permutation: a seeded Fisher-Yates shuffle of `0..=255`,
/// repeated twice so lattice hashing never needs a modulo.
#[derive(Clone, PartialEq, Eq)]
pub struct PermTable([u8; 512]);

impl PermTable {
    pub fn new(seed: i32) -> Self {
        let mut rng = Mulberry32::new(seed);
        let mut table = [0u8; 512];
        for (i, slot) in table.iter_mut().take(256).enumerate() {
            *slot = i as u8;
        }
        for i in (1..=255usize).rev() {
            let j = (rng.next_f64() * (i as f64 + 1.0)).floor() as usize;
            table.swap(i, j);
        }
        let (lo, hi) = table.split_at_mut(256);
        hi.copy_from_slice(lo);
        PermTable(table)
    }

    #[inline(always)]
    fn at(&self, i: usize) -> usize {
        self.0[i] as usize
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for PermTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PermTable").field(&&self.0[..8]).finish()
    }
}

// ── Simplex 2D ──────────────────────────────────────────────────────

const F2: f64 = 0.366_025_403_784_438_6; // (sqrt(3) - 1) / 2
const G2: f64 = 0.211_324_865_405_187_1; // (3 - sqrt(3)) / 6

#[inline(always)]
fn corner_2d(grad: usize, x: f64, y: f64) -> f64 {
    let t = 0.5 - x * x - y * y;
    if t < 0.0 {
        return 0.0;
    }
    let t2 = t * t;
    t2 * t2 * (GRAD2[grad][0] * x + GRAD2[grad][1] * y)
}

/// 2D simplex noise, roughly in `[-1, 1]`.
pub fn simplex_2d(perm: &PermTable, x: f64, y: f64) -> f64 {
    let s = (x + y) * F2;
    let i = (x + s).floor() as i64;
    let j = (y + s).floor() as i64;

    let t = (i + j) as f64 * G2;
    let x0 = x - (i as f64 - t);
    let y0 = y - (j as f64 - t);

    let (i1, j1) = if x0 > y0 { (1usize, 0usize) } else { (0, 1) };

    let x1 = x0 - i1 as f64 + G2;
    let y1 = y0 - j1 as f64 + G2;
    let x2 = x0 - 1.0 + 2.0 * G2;
    let y2 = y0 - 1.0 + 2.0 * G2;

    let ii = (i & 255) as usize;
    let jj = (j & 255) as usize;
    let g0 = perm.at(ii + perm.at(jj)) % 8;
    let g1 = perm.at(ii + i1 + perm.at(jj + j1)) % 8;
    let g2 = perm.at(ii + 1 + perm.at(jj + 1)) % 8;

    70.0 * (corner_2d(g0, x0, y0) + corner_2d(g1, x1, y1) + corner_2d(g2, x2, y2))
}

// ── Simplex 3D ──────────────────────────────────────────────────────

const F3: f64 = 1.0 / 3.0;
const G3: f64 = 1.0 / 6.0;

#[inline(always)]
fn corner_3d(grad: usize, x: f64, y: f64, z: f64) -> f64 {
    let t = 0.6 - x * x - y * y - z * z;
    if t < 0.0 {
        return 0.0;
    }
    let t2 = t * t;
    t2 * t2 * (GRAD3[grad][0] * x + GRAD3[grad][1] * y + GRAD3[grad][2] * z)
}

/// Offsets of the second and third simplex corners, picked by the ordering
/// of the fractional coordinates.
#[inline(always)]
fn simplex_3d_corners(x0: f64, y0: f64, z0: f64) -> ([usize; 3], [usize; 3]) {
    if x0 >= y0 {
        if y0 >= z0 {
            ([1, 0, 0], [1, 1, 0])
        } else if x0 >= z0 {
            ([1, 0, 0], [1, 0, 1])
        } else {
            ([0, 0, 1], [1, 0, 1])
        }
    } else if y0 < z0 {
        ([0, 0, 1], [0, 1, 1])
    } else if x0 < z0 {
        ([0, 1, 0], [0, 1, 1])
    } else {
        ([0, 1, 0], [1, 1, 0])
    }
}

/// 3D simplex noise, roughly in `[-1, 1]`.
pub fn simplex_3d(perm: &PermTable, x: f64, y: f64, z: f64) -> f64 {
    let s = (x + y + z) * F3;
    let i = (x + s).floor() as i64;
    let j = (y + s).floor() as i64;
    let k = (z + s).floor() as i64;

    let t = (i + j + k) as f64 * G3;
    let x0 = x - (i as f64 - t);
    let y0 = y - (j as f64 - t);
    let z0 = z - (k as f64 - t);

    let ([i1, j1, k1], [i2, j2, k2]) = simplex_3d_corners(x0, y0, z0);

    let x1 = x0 - i1 as f64 + G3;
    let y1 = y0 - j1 as f64 + G3;
    let z1 = z0 - k1 as f64 + G3;
    let x2 = x0 - i2 as f64 + 2.0 * G3;
    let y2 = y0 - j2 as f64 + 2.0 * G3;
    let z2 = z0 - k2 as f64 + 2.0 * G3;
    let x3 = x0 - 1.0 + 3.0 * G3;
    let y3 = y0 - 1.0 + 3.0 * G3;
    let z3 = z0 - 1.0 + 3.0 * G3;

    let ii = (i & 255) as usize;
    let jj = (j & 255) as usize;
    let kk = (k & 255) as usize;
    let hash = |a: usize, b: usize, c: usize| -> usize {
        perm.at(ii + a + perm.at(jj + b + perm.at(kk + c))) % 12
    };

    32.0 * (corner_3d(hash(0, 0, 0), x0, y0, z0)
        + corner_3d(hash(i1, j1, k1), x1, y1, z1)
        + corner_3d(hash(i2, j2, k2), x2, y2, z2)
        + corner_3d(hash(1, 1, 1), x3, y3, z3))
}

// ── Fractal sums ────────────────────────────────────────────────────

/// Octave parameters shared by every fractal sum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fractal {
    pub frequency: f64,
    pub octaves: u32,
    pub lacunarity: f64,
    pub gain: f64,
}

impl Fractal {
    /// Sum `octaves` samples of `sample`, scaling frequency by lacunarity and
    /// amplitude by gain after each octave.
    #[inline]
    pub fn sum(&self, mut sample: impl FnMut(f64) -> f64) -> f64 {
        let mut total = 0.0;
        let mut amp = 1.0;
        let mut freq = self.frequency;
        for _ in 0..self.octaves {
            total += sample(freq) * amp;
            freq *= self.lacunarity;
            amp *= self.gain;
        }
        total
    }
}

pub fn fbm_2d(perm: &PermTable, x: f64, z: f64, fractal: &Fractal) -> f64 {
    fractal.sum(|f| simplex_2d(perm, x * f, z * f))
}

pub fn fbm_3d(perm: &PermTable, x: f64, y: f64, z: f64, fractal: &Fractal) -> f64 {
    fractal.sum(|f| simplex_3d(perm, x * f, y * f, z * f))
}

/// Ridged multifractal: `(1 - |n|)²` per octave with fixed lacunarity 2 and
/// gain 0.5, remapped by `sum * 2 - 1`.
pub fn ridge_fbm_2d(perm: &PermTable, x: f64, z: f64, frequency: f64, octaves: u32) -> f64 {
    ridge(frequency, octaves, |f| simplex_2d(perm, x * f, z * f))
}

pub fn ridge_fbm_3d(perm: &PermTable, x: f64, y: f64, z: f64, frequency: f64, octaves: u32) -> f64 {
    ridge(frequency, octaves, |f| simplex_3d(perm, x * f, y * f, z * f))
}

fn ridge(frequency: f64, octaves: u32, sample: impl Fn(f64) -> f64) -> f64 {
    let fractal = Fractal {
        frequency,
        octaves,
        lacunarity: 2.0,
        gain: 0.5,
    };
    let total = fractal.sum(|f| {
        let n = 1.0 - sample(f).abs();
        n * n
    });
    total * 2.0 - 1.0
}

// ── Cellular (Voronoi) noise ────────────────────────────────────────

const HASH_PRIME_A: i64 = 374_761_393;
const HASH_PRIME_B: i64 = 668_265_263;
const HASH_PRIME_C: i64 = 1_103_515_245;

/// How the two nearest feature distances become the output value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellReturn {
    /// `F1 * 2 - 1`
    Distance,
    /// `(F1 / F2) * 2 - 1`, 0 when F2 is 0
    Distance2Div,
    /// `(F2 - F1) * 2 - 1`
    Distance2Sub,
}

impl CellReturn {
    pub fn from_name(name: &str) -> Self {
        match name {
            "Distance2Div" => CellReturn::Distance2Div,
            "Distance2Sub" => CellReturn::Distance2Sub,
            _ => CellReturn::Distance,
        }
    }

    fn finish(self, d1: f64, d2: f64) -> f64 {
        match self {
            CellReturn::Distance => d1 * 2.0 - 1.0,
            CellReturn::Distance2Div => {
                if d2 > 0.0 {
                    (d1 / d2) * 2.0 - 1.0
                } else {
                    0.0
                }
            }
            CellReturn::Distance2Sub => (d2 - d1) * 2.0 - 1.0,
        }
    }
}

/// Feature-point settings for cellular noise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cellular {
    pub seed: i32,
    pub jitter: f64,
    pub mode: CellReturn,
}

struct Nearest {
    d1: f64,
    d2: f64,
}

impl Nearest {
    fn new() -> Self {
        Nearest {
            d1: f64::INFINITY,
            d2: f64::INFINITY,
        }
    }

    #[inline]
    fn push(&mut self, dist: f64) {
        if dist < self.d1 {
            self.d2 = self.d1;
            self.d1 = dist;
        } else if dist < self.d2 {
            self.d2 = dist;
        }
    }
}

impl Cellular {
    /// Per-cell PRNG. The lattice hash is truncated to 32 bits; the noise
    /// seed is mixed in additively so seed 0 keeps the reference layout.
    fn cell_rng(&self, lattice_hash: i64) -> Mulberry32 {
        Mulberry32::new((lattice_hash as i32).wrapping_add(self.seed))
    }

    pub fn sample_2d(&self, x: f64, y: f64) -> f64 {
        let ix = x.floor() as i64;
        let iy = y.floor() as i64;
        let mut nearest = Nearest::new();
        for dx in -1..=1i64 {
            for dy in -1..=1i64 {
                let cx = ix + dx;
                let cy = iy + dy;
                let mut rng = self.cell_rng(cx * HASH_PRIME_A + cy * HASH_PRIME_B);
                let px = cx as f64 + rng.next_f64() * self.jitter;
                let py = cy as f64 + rng.next_f64() * self.jitter;
                nearest.push(((x - px).powi(2) + (y - py).powi(2)).sqrt());
            }
        }
        self.mode.finish(nearest.d1, nearest.d2)
    }

    pub fn sample_3d(&self, x: f64, y: f64, z: f64) -> f64 {
        let ix = x.floor() as i64;
        let iy = y.floor() as i64;
        let iz = z.floor() as i64;
        let mut nearest = Nearest::new();
        for dx in -1..=1i64 {
            for dy in -1..=1i64 {
                for dz in -1..=1i64 {
                    let (cx, cy, cz) = (ix + dx, iy + dy, iz + dz);
                    let mut rng = self.cell_rng(
                        cx * HASH_PRIME_A + cy * HASH_PRIME_B + cz * HASH_PRIME_C,
                    );
                    let px = cx as f64 + rng.next_f64() * self.jitter;
                    let py = cy as f64 + rng.next_f64() * self.jitter;
                    let pz = cz as f64 + rng.next_f64() * self.jitter;
                    nearest.push(
                        ((x - px).powi(2) + (y - py).powi(2) + (z - pz).powi(2)).sqrt(),
                    );
                }
            }
        }
        self.mode.finish(nearest.d1, nearest.d2)
    }
}

// ── Tests ───────────────────────────────────────────────────────────
