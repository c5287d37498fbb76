//! Seeded 2D gradient noise and fractal summation.
//!
//! Each [`NoiseField`] owns its lattice table; terrains hold several fields,
//! each built from `seed + offset` so the layers are decorrelated.

use noise::NoiseFn;
use serde::{Deserialize, Serialize};

use crate::rng::SeededRandom;

/// Perlin-style gradient noise over a 512-entry lattice table.
#[derive(Clone)]
pub struct NoiseField {
    seed: i64,
    perm: [u8; 512],
}

impl std::fmt::Debug for NoiseField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseField").field("seed", &self.seed).finish()
    }
}

impl NoiseField {
    /// Draw 256 lattice values from the seeded LCG and mirror them into the
    /// upper half so corner lookups never wrap.
    pub fn new(seed: i64) -> Self {
        let mut rng = SeededRandom::new(seed);
        let mut perm = [0u8; 512];
        for i in 0..256 {
            perm[i] = rng.next_byte();
        }
        let (low, high) = perm.split_at_mut(256);
        high.copy_from_slice(low);
        Self { seed, perm }
    }

    pub fn seed(&self) -> i64 {
        self.seed
    }

    /// Lattice table (256 values, duplicated).
    pub fn table(&self) -> &[u8; 512] {
        &self.perm
    }

    /// Evaluate noise at `(x, y)`. Roughly in `[-1, 1]`, exactly `0` on lattice points.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let xf = x.floor();
        let yf = y.floor();
        let xi = (xf as i64 & 255) as usize;
        let yi = (yf as i64 & 255) as usize;

        let x = x - xf;
        let y = y - yf;

        let u = fade(x);
        let v = fade(y);

        let p = &self.perm;
        let a = p[xi] as usize + yi;
        let aa = p[a] as usize;
        let ab = p[a + 1] as usize;
        let b = p[xi + 1] as usize + yi;
        let ba = p[b] as usize;
        let bb = p[b + 1] as usize;

        lerp(
            v,
            lerp(u, grad(p[aa], x, y), grad(p[ba], x - 1.0, y)),
            lerp(u, grad(p[ab], x, y - 1.0), grad(p[bb], x - 1.0, y - 1.0)),
        )
    }
}

impl NoiseFn<f64, 2> for NoiseField {
    fn get(&self, point: [f64; 2]) -> f64 {
        self.sample(point[0], point[1])
    }
}

/// Quintic fade curve `6t^5 - 15t^4 + 10t^3`.
#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

/// Map the low 4 bits of a hash to one of the gradient directions and dot it
/// with the corner offset.
#[inline]
fn grad(hash: u8, x: f64, y: f64) -> f64 {
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        x
    } else {
        0.0
    };
    (if h & 1 == 0 { u } else { -u }) + (if h & 2 == 0 { v } else { -v })
}

/// Sum `octaves` noise evaluations, doubling frequency and scaling amplitude
/// by `persistence` each step, normalised by the total amplitude.
pub fn fbm<F>(field: &F, x: f64, y: f64, octaves: u32, persistence: f64) -> f64
where
    F: NoiseFn<f64, 2> + ?Sized,
{
    let mut total = 0.0;
    let mut frequency = 1.0;
    let mut amplitude = 1.0;
    let mut max_value = 0.0;

    for _ in 0..octaves {
        total += field.get([x * frequency, y * frequency]) * amplitude;
        max_value += amplitude;
        amplitude *= persistence;
        frequency *= 2.0;
    }

    if max_value == 0.0 {
        return 0.0;
    }
    total / max_value
}

/// One fBm layer of the terrain: which field, how it is scaled, what it outputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseLayer {
    /// Added to the terrain seed to build this layer's field.
    pub seed_offset: i64,
    /// Multiplier applied to noise-space coordinates before sampling.
    pub frequency: f64,
    pub octaves: u32,
    #[serde(default = "default_persistence")]
    pub persistence: f64,
    /// Multiplier applied to the fBm result.
    #[serde(default = "default_amplitude")]
    pub amplitude: f64,
}

fn default_persistence() -> f64 {
    0.5
}
fn default_amplitude() -> f64 {
    1.0
}

impl NoiseLayer {
    pub const fn new(seed_offset: i64, frequency: f64, octaves: u32, amplitude: f64) -> Self {
        Self {
            seed_offset,
            frequency,
            octaves,
            persistence: 0.5,
            amplitude,
        }
    }

    /// Build this layer's field for a terrain seed.
    pub fn field(&self, seed: i64) -> NoiseField {
        NoiseField::new(seed + self.seed_offset)
    }

    /// Evaluate the layer at a noise-space position.
    #[inline]
    pub fn eval(&self, field: &NoiseField, x: f64, z: f64) -> f64 {
        let v = fbm(field, x * self.frequency, z * self.frequency, self.octaves, self.persistence);
        if self.amplitude == 1.0 {
            v
        } else {
            v * self.amplitude
        }
    }
}
