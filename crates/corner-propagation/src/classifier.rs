//! Nearest-link/node candidate selection and closed-form pathloss (§4.3).

use std::collections::HashSet;

use corner_core::{LineSegment, SummedLinkId, Vector2D, EPSILON};
use corner_world::{ClassTag, Classification, StaticWorld};

/// Outcome of [`Classifier::classify`]: the chosen classification plus the
/// summed-link pair it was selected for.
#[derive(Clone, Debug)]
pub struct ClassifyResult {
    pub classification: Classification,
    pub source_link: SummedLinkId,
    pub destination_link: SummedLinkId,
}

/// Stateless per-query classifier (§4.3). Holds no state of its own beyond
/// the world reference; safe to use concurrently across queries.
pub struct Classifier<'w> {
    world: &'w StaticWorld,
}

impl<'w> Classifier<'w> {
    pub fn new(world: &'w StaticWorld) -> Self {
        Classifier { world }
    }

    /// Step 1: candidate summed-link selection at one endpoint (§4.3 step 1).
    ///
    /// Returns the empty vec when no link's corridor contains `p` — the
    /// original dereferences `nearestLinkTx` unconditionally here even when
    /// no link qualifies; we return an empty candidate set instead, which
    /// propagates to OutOfRange in `classify` (§9 open question: treat as a
    /// bug, return OutOfRange safely).
    fn candidate_links(&self, p: Vector2D) -> Vec<SummedLinkId> {
        let lane_width = self.world.config().lane_width;
        let cell = self.world.grid(p);

        let mut nearest_link: Option<(SummedLinkId, f64)> = None;
        let mut nearest_node: Option<(usize, f64)> = None;
        let mut seen_nodes: HashSet<usize> = HashSet::new();

        for &link_id in cell {
            let link = &self.world.summed_links()[link_id.index()];
            let a = self.world.nodes()[link.node_a.index()].position;
            let b = self.world.nodes()[link.node_b.index()].position;
            let seg = LineSegment::new(a, b);

            let d = seg.distance_from_line(p);
            let corridor = lane_width * link.num_lanes as f64;
            if d < corridor && nearest_link.is_none_or(|(_, best)| d < best) {
                nearest_link = Some((link_id, d));
            }

            for node_id in [link.node_a, link.node_b] {
                let idx = node_id.index();
                if !seen_nodes.insert(idx) {
                    continue;
                }
                let node = &self.world.nodes()[idx];
                let dist = (node.position - p).magnitude();
                if dist < node.size && nearest_node.is_none_or(|(_, best)| dist < best) {
                    nearest_node = Some((idx, dist));
                }
            }
        }

        let mut candidates = Vec::new();
        if let Some((link_id, _)) = nearest_link {
            candidates.push(link_id);
        }
        if let Some((idx, _)) = nearest_node {
            candidates.extend(self.world.nodes()[idx].connected_links.iter().copied());
        }
        candidates
    }

    /// Steps 1–2: select the best classification between `src` and `dst`
    /// (§4.3 steps 1–2). Returns OutOfRange when either endpoint has no
    /// candidate link.
    pub fn classify(&self, src: Vector2D, dst: Vector2D) -> ClassifyResult {
        let tx_candidates = self.candidate_links(src);
        let rx_candidates = self.candidate_links(dst);

        if tx_candidates.is_empty() || rx_candidates.is_empty() {
            return ClassifyResult {
                classification: Classification::out_of_range(),
                source_link: SummedLinkId::INVALID,
                destination_link: SummedLinkId::INVALID,
            };
        }

        let mut best: Option<ClassifyResult> = None;
        'search: for &tx in &tx_candidates {
            for &rx in &rx_candidates {
                let c = self.world.classification(tx, rx);
                let is_better = match &best {
                    None => true,
                    Some(b) => c.tag < b.classification.tag,
                };
                if is_better {
                    let short_circuit = c.tag == ClassTag::Los;
                    best = Some(ClassifyResult { classification: c, source_link: tx, destination_link: rx });
                    if short_circuit {
                        break 'search;
                    }
                }
            }
        }

        best.unwrap_or(ClassifyResult {
            classification: Classification::out_of_range(),
            source_link: SummedLinkId::INVALID,
            destination_link: SummedLinkId::INVALID,
        })
    }

    /// Step 3: closed-form pathloss given an already-chosen classification
    /// (§4.3 step 3). `OutOfRange` returns 0 (no signal).
    pub fn pathloss(&self, src: Vector2D, dst: Vector2D, c: &Classification) -> f64 {
        let cfg = self.world.config();
        let l4pi = cfg.lambda_by_4pi_sq();
        let lambda = cfg.wavelength;
        let rho = cfg.loss_per_reflection;
        let lane_width = cfg.lane_width;

        match c.tag {
            ClassTag::Los => {
                let d2 = (dst - src).magnitude_sq().max(EPSILON);
                l4pi / d2
            }
            ClassTag::Nlos1 => {
                let n1 = self.world.nodes()[c.node_set[0].index()].position;
                let rm = (src - n1).magnitude().max(EPSILON);
                let rs = (n1 - dst).magnitude().max(EPSILON);
                let wm = (c.main_lanes * lane_width).max(EPSILON);
                let ws = (c.side_lanes * lane_width).max(EPSILON);

                let n_min = (2.0 * (rm * rs / (ws * wm)).sqrt()).floor();
                let plr = l4pi * rho.powf(2.0 * n_min) / (rm + rs).powi(2);

                let lo = rm.min(rs);
                let hi = rm.max(rs);
                let pld = l4pi * lambda / (4.0 * lo * hi.powi(2));

                plr + pld
            }
            ClassTag::Nlos2 => {
                let n1 = self.world.nodes()[c.node_set[0].index()].position;
                let n2 = self.world.nodes()[c.node_set[1].index()].position;
                let rm = (src - n1).magnitude().max(EPSILON);
                let rs = (n1 - n2).magnitude().max(EPSILON);
                let rp = (n2 - dst).magnitude().max(EPSILON);
                let rsp = rs + rp;

                let wm = (c.main_lanes * lane_width).max(EPSILON);
                let ws = (c.side_lanes * lane_width).max(EPSILON);
                let wp = (c.para_lanes.unwrap_or(0.0) * lane_width).max(EPSILON);

                let t = (rs * wm * wp / (ws * (rm * wp + rp * wm))).max(EPSILON).sqrt();
                let n_min = (rm * t / wm + rs / (ws * t) + rp * t / wp).floor();
                let n = (rp * rs / (wp * ws)).floor();

                let plr = l4pi * rho.powf(2.0 * n_min) / (rsp + rm).powi(2);

                let (lo_ms, hi_ms) = (rm.min(rs), rm.max(rs));
                let rm_is_smaller = rm < rs;
                let pldd_rp_term = if rm_is_smaller { rp * rp } else { rp };
                let pldd = l4pi * lambda * lambda / (16.0 * lo_ms * hi_ms * pldd_rp_term);

                let rs_smaller = rs < rp;
                let plrd_num_factor = if rs_smaller { rs } else { 1.0 };
                let plrd_denom_factor = if rs_smaller { rp * rp } else { rp };
                let plrd = l4pi * rho.powf(2.0 * n_min) * lambda * plrd_num_factor
                    / (4.0 * (rs + rm).powi(2) * plrd_denom_factor);

                let rm_smaller_rsp = rm < rsp;
                let pldr_denom_factor = if rm_smaller_rsp { 1.0 } else { rm / rsp };
                let pldr =
                    rho.powf(2.0 * n) * l4pi * lambda / (4.0 * rm * rsp.powi(2) * pldr_denom_factor.max(EPSILON));

                plr + pldd + plrd + pldr
            }
            ClassTag::OutOfRange => 0.0,
        }
    }
}
