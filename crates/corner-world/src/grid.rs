//! Spatial indices over buildings and links (§3 `BuildingBuckets`,
//! `LinkGrid`).

use corner_core::{BuildingId, LineSegment, Rect, SummedLinkId, Vector2D};

use crate::model::{Building, SummedLink};

/// `sin(45°)`, used to size the building-bucket grid (§4.2).
const SIN_45: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// Tight axis-aligned bound over all node positions and building vertices.
pub type MapRect = Rect;

fn bucket_count(extent: f64, cell_size: f64) -> usize {
    if cell_size <= 0.0 {
        return 1;
    }
    ((extent / cell_size - SIN_45).ceil() as i64).max(1) as usize
}

// ── BuildingBuckets ───────────────────────────────────────────────────────────

/// Square grid of building-id buckets (§3 `BuildingBuckets`).
pub struct BuildingBuckets {
    bx: usize,
    by: usize,
    centroid: Vector2D,
    bucket_size: f64,
    /// Row-major `[i * by + j]`, matching `(i, j)` bucket coordinates.
    buckets: Vec<Vec<BuildingId>>,
}

impl BuildingBuckets {
    /// Compute bucket dimensions and populate membership from `map_rect` and
    /// `buildings` (§4.2 `computeSpatialIndices`).
    pub fn compute(map_rect: MapRect, bucket_size: f64, buildings: &[Building]) -> Self {
        let bx = bucket_count(map_rect.w, bucket_size);
        let by = bucket_count(map_rect.h, bucket_size);
        let centroid = Vector2D::new(map_rect.x, map_rect.y);

        let mut buckets = vec![Vec::new(); bx * by];

        for building in buildings {
            for edge in &building.edges {
                // Bounding-box pre-filter: any bucket whose coverage circle
                // could plausibly touch this edge lies within one bucket
                // width of the edge's own bounding box.
                let b = Rect::bounding(edge_in_local_frame(*edge, centroid));
                let i_lo = ((b.x - bucket_size) / bucket_size).floor().max(0.0) as usize;
                let i_hi = (((b.x + b.w + bucket_size) / bucket_size).ceil() as usize).min(bx.saturating_sub(1));
                let j_lo = ((b.y - bucket_size) / bucket_size).floor().max(0.0) as usize;
                let j_hi = (((b.y + b.h + bucket_size) / bucket_size).ceil() as usize).min(by.saturating_sub(1));

                for i in i_lo..=i_hi.min(bx.saturating_sub(1)) {
                    for j in j_lo..=j_hi.min(by.saturating_sub(1)) {
                        let center = centroid + Vector2D::new(i as f64, j as f64) * bucket_size;
                        if edge.intersects_circle(center, bucket_size) {
                            let slot = &mut buckets[i * by + j];
                            if slot.last() != Some(&building.id) {
                                slot.push(building.id);
                            }
                        }
                    }
                }
            }
        }

        BuildingBuckets { bx, by, centroid, bucket_size, buckets }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.bx, self.by)
    }

    /// Union of bucket contents whose bucket centres lie within `r` of `p`
    /// (§4.2 `collectBuildingsInRange`). Order-insensitive; duplicates are
    /// tolerated by the caller (the Raytracer).
    pub fn collect_in_range(&self, r: f64, p: Vector2D) -> Vec<BuildingId> {
        let mut out = Vec::new();
        for i in 0..self.bx {
            for j in 0..self.by {
                let center = self.centroid
                    + Vector2D::new(i as f64 + 0.5, j as f64 + 0.5) * self.bucket_size;
                if (center - p).magnitude() <= r {
                    out.extend_from_slice(&self.buckets[i * self.by + j]);
                }
            }
        }
        out
    }
}

/// Express `edge` in the bucket grid's local frame (origin at `centroid`) so
/// bucket-index arithmetic can stay in `[0, extent)`.
fn edge_in_local_frame(edge: LineSegment, centroid: Vector2D) -> LineSegment {
    LineSegment::new(edge.start - centroid, edge.end - centroid)
}

// ── LinkGrid ──────────────────────────────────────────────────────────────────

/// Square grid of summed-link-index buckets (§3 `LinkGrid`).
pub struct LinkGrid {
    rows: usize,
    cols: usize,
    origin: Vector2D,
    cell_size: f64,
    cells: Vec<Vec<SummedLinkId>>,
}

impl LinkGrid {
    pub fn compute(map_rect: MapRect, cell_size: f64, links: &[SummedLink], positions: &[Vector2D]) -> Self {
        let cols = ((map_rect.w / cell_size.max(corner_core::EPSILON)).ceil() as usize).max(1);
        let rows = ((map_rect.h / cell_size.max(corner_core::EPSILON)).ceil() as usize).max(1);
        let origin = Vector2D::new(map_rect.x, map_rect.y);

        let mut cells = vec![Vec::new(); rows * cols];

        for link in links {
            let a = positions[link.node_a.index()];
            let b = positions[link.node_b.index()];
            let seg = LineSegment::new(a, b);
            let bnd = Rect::bounding(seg);

            let col_lo = (((bnd.x - origin.x) / cell_size).floor().max(0.0) as usize).min(cols - 1);
            let col_hi = ((((bnd.x + bnd.w) - origin.x) / cell_size).floor().max(0.0) as usize).min(cols - 1);
            let row_lo = (((bnd.y - origin.y) / cell_size).floor().max(0.0) as usize).min(rows - 1);
            let row_hi = ((((bnd.y + bnd.h) - origin.y) / cell_size).floor().max(0.0) as usize).min(rows - 1);

            for row in row_lo..=row_hi {
                for col in col_lo..=col_hi {
                    let cell_rect = Rect::new(
                        origin.x + col as f64 * cell_size,
                        origin.y + row as f64 * cell_size,
                        cell_size,
                        cell_size,
                    );
                    if cell_rect.intersects_segment(seg) {
                        cells[row * cols + col].push(link.index);
                    }
                }
            }
        }

        LinkGrid { rows, cols, origin, cell_size, cells }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Deterministic cell lookup; clamps to the edge cell if `p` lies
    /// outside the grid (§4.2 `grid(p)`).
    pub fn cell_for(&self, p: Vector2D) -> &[SummedLinkId] {
        let col = (((p.x - self.origin.x) / self.cell_size).floor() as i64)
            .clamp(0, self.cols as i64 - 1) as usize;
        let row = (((p.y - self.origin.y) / self.cell_size).floor() as i64)
            .clamp(0, self.rows as i64 - 1) as usize;
        &self.cells[row * self.cols + col]
    }

    /// The rectangle of the cell containing `p` (clamped as in
    /// [`cell_for`](Self::cell_for)); used by tests to verify the grid-
    /// containment invariant.
    pub fn cell_rect_for(&self, p: Vector2D) -> Rect {
        let col = (((p.x - self.origin.x) / self.cell_size).floor() as i64)
            .clamp(0, self.cols as i64 - 1) as usize;
        let row = (((p.y - self.origin.y) / self.cell_size).floor() as i64)
            .clamp(0, self.rows as i64 - 1) as usize;
        Rect::new(
            self.origin.x + col as f64 * self.cell_size,
            self.origin.y + row as f64 * self.cell_size,
            self.cell_size,
            self.cell_size,
        )
    }
}
