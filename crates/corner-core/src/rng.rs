//! Deterministic, explicitly-owned RNG wrapper.
//!
//! Per the design notes, there is no process-global RNG anywhere in this
//! workspace: `FadingModel` owns one `CornerRng` per query stream and
//! `Raytracer` owns one for its start-angle draw. Both reuse this same
//! wrapper type rather than reaching for the OS RNG directly, so seeding is
//! uniform and a run is exactly reproducible given the same seed.
//!
//! # Determinism strategy
//!
//! Child streams are derived by XOR-ing a draw from the parent with an
//! offset scaled by the 64-bit fractional part of the golden ratio — the
//! same mixing trick used to decorrelate adjacent per-agent seeds in
//! generator-style agent simulations. It spreads small, sequential offsets
//! (e.g. consecutive query indices) uniformly across the seed space.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// 64-bit fractional golden-ratio constant used for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// An explicitly-owned, seedable RNG. Never shared across threads (`!Sync`
/// by virtue of wrapping `SmallRng`); each `Raytracer` or `FadingModel` call
/// site holds its own instance.
pub struct CornerRng(SmallRng);

impl CornerRng {
    /// Seed directly from a 64-bit value.
    pub fn new(seed: u64) -> Self {
        CornerRng(SmallRng::seed_from_u64(seed))
    }

    /// Derive an independent child stream from `self` and an `offset`
    /// (e.g. a query sequence number) — useful for giving each query its own
    /// deterministic fading sample stream from one root seed.
    pub fn child(&mut self, offset: u64) -> CornerRng {
        let child_seed: u64 = self.0.r#gen::<u64>() ^ offset.wrapping_mul(MIXING_CONSTANT);
        CornerRng(SmallRng::seed_from_u64(child_seed))
    }

    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    /// Uniform sample in `[lo, hi)`.
    #[inline]
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        self.0.gen_range(lo..hi)
    }

    /// Standard normal sample via the Box-Muller transform. `rand_distr` is
    /// deliberately not pulled in as a dependency for a single distribution;
    /// two uniform draws and a transform are enough and keep the dependency
    /// surface aligned with the rest of the workspace.
    pub fn standard_normal(&mut self) -> f64 {
        let u1: f64 = self.uniform(f64::EPSILON, 1.0);
        let u2: f64 = self.uniform(0.0, 1.0);
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }
}
