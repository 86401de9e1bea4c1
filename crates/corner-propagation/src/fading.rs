//! Per-sample fading multiplier from a class tag and K-factor (§4.4).

use corner_core::CornerRng;
use corner_world::ClassTag;

/// Samples a Rician (or, when K=0, Rayleigh) fading multiplier. Owns a
/// per-stream RNG so repeated sampling is reproducible given the same seed
/// (§9 "RNG": no process-global RNG).
pub struct FadingModel {
    rng: CornerRng,
}

impl FadingModel {
    pub fn new(rng: CornerRng) -> Self {
        FadingModel { rng }
    }

    /// Draw one fading sample for `class` and Rician factor `k` (§4.4).
    ///
    /// - `k = +∞` is deterministic LOS: returns 1.
    /// - `class = OutOfRange` returns 0 regardless of `k`.
    /// - Otherwise draws a Rician envelope sample parameterised by `k`
    ///   (`k = 0` degenerates to Rayleigh).
    pub fn sample(&mut self, class: ClassTag, k: f64) -> f64 {
        if k.is_infinite() && k > 0.0 {
            return 1.0;
        }
        if class == ClassTag::OutOfRange {
            return 0.0;
        }

        // Rician envelope: R = sqrt((sqrt(K/(K+1)) + X)^2 + Y^2) / sqrt(K+1),
        // with X, Y ~ N(0, 1/2) independent, normalised so E[R^2] = 1.
        let s = (k / (k + 1.0)).sqrt();
        let sigma = (1.0 / (2.0 * (k + 1.0))).sqrt();
        let x = s + sigma * self.rng.standard_normal();
        let y = sigma * self.rng.standard_normal();
        (x * x + y * y).sqrt()
    }
}
