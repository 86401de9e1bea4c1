//! Multithreaded 2D ray-tracer: building-edge reflection and K-factor
//! estimation (§4.5).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;

use corner_core::{BuildingId, CornerRng, LineSegment, Rect, Vector2D};
use corner_world::StaticWorld;

use crate::error::{UsageError, UsageResult};

/// One traced ray segment, produced only by a `Raytracer` instance and
/// scoped to its lifetime (§3 `RayPathComponent`).
#[derive(Clone, Debug)]
pub struct RayPathComponent {
    pub segment: LineSegment,
    pub reflection_count: u32,
    /// Cumulative path length from the transmitter through this segment's
    /// endpoint, inclusive of this segment's own length.
    pub distance_sum: f64,
    pub reflection_coefficient: f64,
    pub last_reflector_index: Option<BuildingId>,
}

/// Spawns rays from a transmitter, reflects them off building edges up to a
/// power budget, and estimates K-factor from the intercepted set (§4.5).
///
/// Owns its own ray queue, worker pool, and output sequence; `execute` may
/// only be called once (§7 `UsageError::DoubleExecute`).
pub struct Raytracer<'w> {
    world: &'w StaticWorld,
    tx: Vector2D,
    free_space_range: f64,
    lane_width: f64,
    wavelength: f64,
    bucket_snapshot: Vec<BuildingId>,

    queue: Mutex<VecDeque<RayPathComponent>>,
    results: Mutex<Vec<RayPathComponent>>,
    in_flight: AtomicI64,
    executed: AtomicBool,
    worker_count: usize,
}

impl<'w> Raytracer<'w> {
    /// Construction (§4.5 step 1–2): seed `ray_count` rays at a random start
    /// angle and snapshot the building buckets within free-space range of
    /// `tx` into a private list, so concurrent reads of the world's own
    /// spatial index never need to cross the worker pool boundary.
    pub fn new(world: &'w StaticWorld, tx: Vector2D, ray_count: usize, worker_count: usize, rng: &mut CornerRng) -> Self {
        let alpha0 = rng.uniform(0.0, std::f64::consts::FRAC_PI_2);
        Self::new_with_start_angle(world, tx, ray_count, worker_count, alpha0)
    }

    /// As [`new`](Self::new), but with an explicit start angle instead of a
    /// random draw. Used by tests that need deterministic ray angles.
    pub(crate) fn new_with_start_angle(
        world: &'w StaticWorld,
        tx: Vector2D,
        ray_count: usize,
        worker_count: usize,
        alpha0: f64,
    ) -> Self {
        let free_space_range = world.config().free_space_range();
        let lane_width = world.config().lane_width;
        let wavelength = world.config().wavelength;

        let mut queue = VecDeque::with_capacity(ray_count);
        for r in 0..ray_count {
            let alpha = alpha0 + 2.0 * std::f64::consts::PI * r as f64 / ray_count as f64;
            let dir = Vector2D::new(alpha.cos(), alpha.sin());
            queue.push_back(RayPathComponent {
                segment: LineSegment::new(tx, tx + dir * free_space_range),
                reflection_count: 0,
                distance_sum: 0.0,
                reflection_coefficient: 1.0,
                last_reflector_index: None,
            });
        }

        let bucket_snapshot = world.collect_buildings_in_range(free_space_range, tx);

        tracing::debug!(ray_count, worker_count, tx = %tx, "raytracer constructed");

        Raytracer {
            world,
            tx,
            free_space_range,
            lane_width,
            wavelength,
            bucket_snapshot,
            queue: Mutex::new(queue),
            results: Mutex::new(Vec::new()),
            in_flight: AtomicI64::new(ray_count as i64),
            executed: AtomicBool::new(false),
            worker_count: worker_count.max(1),
        }
    }

    pub fn transmitter(&self) -> Vector2D {
        self.tx
    }

    /// Runs the worker pool to completion (§4.5 `execute`, §5, §9 thread
    /// pool). A shared FIFO queue and result vector are each guarded by
    /// their own mutex; no critical section holds both at once. Workers
    /// exit only once the queue is empty *and* the in-flight counter is
    /// zero, per the corrected termination condition in §9 (the naive
    /// "exit on empty queue" version races when another worker is about to
    /// enqueue a reflection).
    pub fn execute(&self) -> UsageResult<()> {
        if self.executed.swap(true, Ordering::SeqCst) {
            return Err(UsageError::DoubleExecute);
        }

        std::thread::scope(|scope| {
            for _ in 0..self.worker_count {
                scope.spawn(|| self.worker_loop());
            }
        });

        tracing::debug!(results = self.results.lock().unwrap().len(), "raytracer execute complete");
        Ok(())
    }

    fn worker_loop(&self) {
        loop {
            let popped = self.queue.lock().unwrap().pop_front();
            match popped {
                Some(ray) => {
                    let child = self.trace(ray);
                    if let Some(child) = child {
                        self.queue.lock().unwrap().push_back(child);
                        self.in_flight.fetch_add(1, Ordering::SeqCst);
                    }
                    self.in_flight.fetch_sub(1, Ordering::SeqCst);
                }
                None => {
                    if self.in_flight.load(Ordering::SeqCst) <= 0 {
                        break;
                    }
                    std::thread::yield_now();
                }
            }
        }
    }

    /// §4.5 `trace(ray)`: intersect against the snapshot bucket list, retain
    /// the closest valid intersection, append the (possibly truncated) ray
    /// to the result set, and return a reflected continuation ray if the
    /// power budget allows one.
    fn trace(&self, ray: RayPathComponent) -> Option<RayPathComponent> {
        let ray_aabb = Rect::bounding(ray.segment);
        let min_valid_distance = self.lane_width / 2.0;

        let mut best: Option<(Vector2D, LineSegment, BuildingId, f64, f64)> = None; // (point, edge, building, dist, permittivity)

        let buildings = self.world.buildings();
        for &building_id in &self.bucket_snapshot {
            if Some(building_id) == ray.last_reflector_index {
                continue;
            }
            let building = &buildings[building_id.index()];
            for edge in &building.edges {
                if !aabb_overlaps(ray_aabb, Rect::bounding(*edge)) {
                    continue;
                }
                if let Some(p) = ray.segment.intersect(*edge) {
                    let dist = (p - ray.segment.start).magnitude();
                    if dist < min_valid_distance {
                        continue;
                    }
                    let better = match &best {
                        None => true,
                        Some((_, _, _, best_dist, _)) => dist < *best_dist,
                    };
                    if better {
                        best = Some((p, *edge, building.id, dist, building.permittivity));
                    }
                }
            }
        }

        let Some((p, edge, building_id, _, permittivity)) = best else {
            self.results.lock().unwrap().push(ray);
            return None;
        };

        let truncated_segment = LineSegment::new(ray.segment.start, p);
        let new_distance_sum = ray.distance_sum + truncated_segment.length();
        let truncated = RayPathComponent {
            segment: truncated_segment,
            reflection_count: ray.reflection_count + 1,
            distance_sum: new_distance_sum,
            reflection_coefficient: ray.reflection_coefficient,
            last_reflector_index: Some(building_id),
        };

        let direction = ray.segment.vector().unitise();
        let mut theta = direction.angle_between(edge.normal());
        theta = theta.min(std::f64::consts::PI - theta);

        let cos2 = theta.cos().powi(2);
        let sqrt_term = (permittivity - cos2).max(0.0).sqrt();
        let e_sin = permittivity * theta.sin();
        let new_coef = ray.reflection_coefficient * (sqrt_term - e_sin) / (sqrt_term + e_sin).max(corner_core::EPSILON);

        self.results.lock().unwrap().push(truncated);

        let d = ray.reflection_coefficient * self.free_space_range - new_distance_sum;
        if d <= 0.0 {
            return None;
        }

        let reflected_dir = edge.reflect(direction).unitise();
        tracing::trace!(
            reflection_count = ray.reflection_count + 1,
            remaining_range = d,
            building = %building_id,
            "ray reflected"
        );
        Some(RayPathComponent {
            segment: LineSegment::new(p, p + reflected_dir * d),
            reflection_count: ray.reflection_count + 1,
            distance_sum: new_distance_sum,
            reflection_coefficient: new_coef,
            last_reflector_index: Some(building_id),
        })
    }

    /// §4.5 `computeK`: estimate the Rician K-factor at `rx` given antenna
    /// `gain`, from ray segments passing within the Fresnel-like radius `r`.
    pub fn compute_k(&self, rx: Vector2D, gain: f64) -> f64 {
        let r = gain.sqrt() * self.wavelength / (2.0 * std::f64::consts::PI);

        let results = self.results.lock().unwrap();
        let hits: Vec<&RayPathComponent> = results
            .iter()
            .filter(|c| {
                let along = c.segment.distance_along_line(rx);
                let len = c.segment.length();
                c.segment.distance_from_line(rx) < r && along > 0.0 && along < len
            })
            .collect();

        if hits.is_empty() {
            return 0.0;
        }

        let m = hits.iter().map(|h| h.reflection_count).min().unwrap();

        let mut max_power = 0.0;
        let mut diff_power = 0.0;
        for hit in &hits {
            let along = hit.segment.distance_along_line(rx);
            let prefix = hit.distance_sum - hit.segment.length();
            let phi = 2.0 * std::f64::consts::PI
                * (2.0 * (along + prefix) / self.wavelength + hit.reflection_count as f64);
            let p = hit.reflection_coefficient.powi(2) * (0.5 + phi.sin() / std::f64::consts::PI);

            if hit.reflection_count == m {
                max_power += p;
            } else {
                diff_power += p;
            }
        }

        if diff_power == 0.0 {
            f64::INFINITY
        } else {
            max_power / diff_power
        }
    }

    #[cfg(test)]
    pub(crate) fn results(&self) -> Vec<RayPathComponent> {
        self.results.lock().unwrap().clone()
    }
}

fn aabb_overlaps(a: Rect, b: Rect) -> bool {
    a.x <= b.x + b.w && a.x + a.w >= b.x && a.y <= b.y + b.h && a.y + a.h >= b.y
}
