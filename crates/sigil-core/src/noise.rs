//! Deterministic continuous noise shared by every generator in the crate.
//!
//! Callers decorrelate multiple uses of the same field by adding their own
//! offsets to the inputs (for example `+20.0` or `+seed`).

use ::noise::{NoiseFn, OpenSimplex};

/// Seeded 2D/3D simplex noise with outputs in `[-1, 1]`.
#[derive(Clone, Debug)]
pub struct NoiseField {
    simplex: OpenSimplex,
    seed: u32,
}

impl NoiseField {
    pub const DEFAULT_SEED: u32 = 0x51_61_11;

    pub fn new(seed: u32) -> Self {
        Self {
            simplex: OpenSimplex::new(seed),
            seed,
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    #[inline]
    pub fn noise2(&self, x: f32, y: f32) -> f32 {
        let v = self.simplex.get([x as f64, y as f64]);
        (v as f32).clamp(-1.0, 1.0)
    }

    #[inline]
    pub fn noise3(&self, x: f32, y: f32, z: f32) -> f32 {
        let v = self.simplex.get([x as f64, y as f64, z as f64]);
        (v as f32).clamp(-1.0, 1.0)
    }
}

impl Default for NoiseField {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SEED)
    }
}
