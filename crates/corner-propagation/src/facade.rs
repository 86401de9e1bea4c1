//! Stateless per-query propagation entry point (§4.6), and the narrow
//! `AnalogueModel` boundary trait a network-simulator host expects (§9
//! "Polymorphism over AnalogueModel").

use std::sync::Mutex;

use corner_core::{CornerRng, Vector2D};
use corner_world::{ClassTag, StaticWorld};

use crate::classifier::Classifier;
use crate::raytracer::Raytracer;

/// Result of one [`PropagationFacade::query`] call (§4.6 `query`).
#[derive(Clone, Copy, Debug)]
pub struct QueryResult {
    pub class: ClassTag,
    pub k_factor: f64,
    pub pathloss: f64,
}

/// A cached Raytracer run, keyed by the transmitter position it was traced
/// from (§4.5 "Reuse policy").
struct RaytraceCache {
    tx: Vector2D,
}

/// Capability boundary a network-simulator host expects from any
/// propagation component (§9): filter one frame between a sender and
/// receiver position. Internal components (`Classifier`, `Raytracer`,
/// `FadingModel`) stay concrete; only this adapter is exposed as a trait
/// object at the boundary.
pub trait AnalogueModel {
    /// Returns the scalar attenuation applied to `frame` travelling from
    /// `sender_pos` to `receiver_pos` at the current time instant.
    fn filter_signal(&self, frame_power: f64, sender_pos: Vector2D, receiver_pos: Vector2D) -> f64;
}

/// Stateless adapter over `{Classifier, StaticWorld, Raytracer}` (§4.6).
/// Holds read-only references to `StaticWorld`, plus a cache of the most
/// recently run `Raytracer` for reuse while the transmitter hasn't moved far.
pub struct PropagationFacade<'w> {
    world: &'w StaticWorld,
    ray_count: usize,
    worker_count: usize,
    raytrace_distance: f64,
    rng: Mutex<CornerRng>,
    cache: Mutex<Option<(RaytraceCache, Raytracer<'w>)>>,
}

impl<'w> PropagationFacade<'w> {
    pub fn new(world: &'w StaticWorld, ray_count: usize, worker_count: usize, raytrace_distance: f64, seed: u64) -> Self {
        PropagationFacade {
            world,
            ray_count,
            worker_count,
            raytrace_distance,
            rng: Mutex::new(CornerRng::new(seed)),
            cache: Mutex::new(None),
        }
    }

    /// §4.6 `query`: resolve classification (road-id mapping, falling back
    /// to on-coordinate classification), resolve K-factor (static table,
    /// falling back to a fresh or cached Raytracer trace), and compute
    /// pathloss.
    pub fn query(
        &self,
        tx_pos: Vector2D,
        rx_pos: Vector2D,
        tx_road_id: Option<&str>,
        rx_road_id: Option<&str>,
    ) -> QueryResult {
        let classifier = Classifier::new(self.world);

        let (classification, tx_idx, rx_idx) = match (
            tx_road_id.and_then(|n| self.world.link_has_mapping(n)),
            rx_road_id.and_then(|n| self.world.link_has_mapping(n)),
        ) {
            (Some(tx_idx), Some(rx_idx)) => (self.world.classification(tx_idx, rx_idx), tx_idx, rx_idx),
            _ => {
                tracing::warn!(
                    tx_road_id = tx_road_id.unwrap_or(""),
                    rx_road_id = rx_road_id.unwrap_or(""),
                    "no road-id mapping for one or both endpoints, falling back to classifier-on-coordinates"
                );
                let result = classifier.classify(tx_pos, rx_pos);
                (result.classification, result.source_link, result.destination_link)
            }
        };

        let k_factor = self.resolve_k_factor(tx_idx, rx_idx, tx_pos, rx_pos);

        let pathloss = classifier.pathloss(tx_pos, rx_pos, &classification) / self.world.config().system_loss;

        QueryResult { class: classification.tag, k_factor, pathloss }
    }

    fn resolve_k_factor(
        &self,
        tx_idx: corner_core::SummedLinkId,
        rx_idx: corner_core::SummedLinkId,
        tx_pos: Vector2D,
        rx_pos: Vector2D,
    ) -> f64 {
        if let Some(table) = self.world.rice_table() {
            if let Some(k) = table.k_factor(tx_idx, rx_idx, tx_pos, rx_pos) {
                return k;
            }
        }

        self.ensure_trace(tx_pos);
        let guard = self.cache.lock().unwrap();
        match &*guard {
            Some((_, raytracer)) => raytracer.compute_k(rx_pos, 1.0),
            None => 0.0,
        }
    }

    /// Re-runs the Raytracer only when the transmitter has moved more than
    /// `raytrace_distance` from the cached trace's transmitter (§4.5 "Reuse
    /// policy"). The comparison is a plain linear distance, not squared —
    /// `raytraceDistance` is specified in metres, so comparing against its
    /// square would silently change the threshold's units.
    fn ensure_trace(&self, tx_pos: Vector2D) {
        let needs_new = {
            let guard = self.cache.lock().unwrap();
            match &*guard {
                Some((meta, _)) => (meta.tx - tx_pos).magnitude() > self.raytrace_distance,
                None => true,
            }
        };

        if !needs_new {
            return;
        }

        let mut rng = self.rng.lock().unwrap();
        let raytracer = Raytracer::new(self.world, tx_pos, self.ray_count, self.worker_count, &mut rng);
        raytracer.execute().expect("fresh Raytracer instance is never executed twice");
        drop(rng);

        *self.cache.lock().unwrap() = Some((RaytraceCache { tx: tx_pos }, raytracer));
    }
}

impl<'w> AnalogueModel for PropagationFacade<'w> {
    fn filter_signal(&self, frame_power: f64, sender_pos: Vector2D, receiver_pos: Vector2D) -> f64 {
        let result = self.query(sender_pos, receiver_pos, None, None);
        frame_power * result.pathloss
    }
}
