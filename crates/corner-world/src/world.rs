//! `StaticWorld`: owns all loaded geometry and tables, read-only after
//! construction (§4.2).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use corner_core::{BuildingId, PropagationConfig, SummedLinkId, Vector2D};

use crate::error::{LoadError, LoadResult};
use crate::grid::{BuildingBuckets, LinkGrid, MapRect};
use crate::loader;
use crate::model::{Building, Classification, Link, Node};
use crate::rice::RiceTable;

fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            LoadError::FileMissing { path: path.display().to_string() }
        } else {
            LoadError::Io { path: path.display().to_string(), source: e }
        }
    })
}

/// Static road/building geometry and classification tables, immutable after
/// `load + computeSummedLinks + computeSpatialIndices` and safely shareable
/// across threads without synchronization (§4.2, §5).
pub struct StaticWorld {
    nodes: Vec<Node>,
    links: Vec<Link>,
    summed_links: Vec<crate::model::SummedLink>,
    classifications: HashMap<(SummedLinkId, SummedLinkId), Classification>,
    buildings: Vec<Building>,
    link_names: HashMap<String, SummedLinkId>,
    rice_table: Option<RiceTable>,

    map_rect: MapRect,
    building_buckets: BuildingBuckets,
    link_grid: LinkGrid,

    config: PropagationConfig,
}

impl StaticWorld {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn summed_links(&self) -> &[crate::model::SummedLink] {
        &self.summed_links
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn map_rect(&self) -> MapRect {
        self.map_rect
    }

    pub fn config(&self) -> &PropagationConfig {
        &self.config
    }

    /// Deterministic cell lookup; clamps to the edge cell for out-of-bounds
    /// points (§4.2 `grid(p)`).
    pub fn grid(&self, p: Vector2D) -> &[SummedLinkId] {
        self.link_grid.cell_for(p)
    }

    #[cfg(test)]
    pub(crate) fn link_grid(&self) -> &LinkGrid {
        &self.link_grid
    }

    /// Look up by summed-link index pair, canonicalised as `(min, max)`
    /// (§4.2 `classification(l1, l2)`). Missing key synthesises OutOfRange.
    pub fn classification(&self, l1: SummedLinkId, l2: SummedLinkId) -> Classification {
        let key = if l1.index() <= l2.index() { (l1, l2) } else { (l2, l1) };
        self.classifications.get(&key).cloned().unwrap_or_else(Classification::out_of_range)
    }

    /// Resolve both names via the link-name map, then classify (§4.2).
    /// Unresolvable names synthesise OutOfRange, same as a missing pair.
    pub fn classification_by_name(&self, name1: &str, name2: &str) -> Classification {
        match (self.link_names.get(name1), self.link_names.get(name2)) {
            (Some(&a), Some(&b)) => self.classification(a, b),
            _ => Classification::out_of_range(),
        }
    }

    pub fn link_has_mapping(&self, name: &str) -> Option<SummedLinkId> {
        self.link_names.get(name).copied()
    }

    /// Nearest-sample K-factor lookup for `link_pair` (§4.2 `kFactor`).
    /// Absent entry returns 0 (Rayleigh); `+∞` represents pure LOS.
    pub fn k_factor(
        &self,
        link_pair: (SummedLinkId, SummedLinkId),
        src_pos: Vector2D,
        dst_pos: Vector2D,
    ) -> f64 {
        match &self.rice_table {
            Some(table) => table.k_factor(link_pair.0, link_pair.1, src_pos, dst_pos).unwrap_or(0.0),
            None => 0.0,
        }
    }

    pub fn rice_table(&self) -> Option<&RiceTable> {
        self.rice_table.as_ref()
    }

    /// Union of building buckets whose centres lie within `r` of `p`
    /// (§4.2 `collectBuildingsInRange`).
    pub fn collect_buildings_in_range(&self, r: f64, p: Vector2D) -> Vec<BuildingId> {
        self.building_buckets.collect_in_range(r, p)
    }
}

/// Optional file paths for [`StaticWorldBuilder::load`]. Collapses the
/// original's multiple overloaded constructors into one builder accepting
/// optional paths (§9 open question).
#[derive(Clone, Debug, Default)]
pub struct WorldPaths {
    pub nodes: Option<PathBuf>,
    pub links: Option<PathBuf>,
    pub classifications: Option<PathBuf>,
    pub buildings: Option<PathBuf>,
    pub link_names: Option<PathBuf>,
    pub rice_table: Option<PathBuf>,
}

/// Builds a [`StaticWorld`] from input files and numeric parameters.
pub struct StaticWorldBuilder {
    paths: WorldPaths,
    config: PropagationConfig,
}

impl StaticWorldBuilder {
    pub fn new(config: PropagationConfig) -> Self {
        StaticWorldBuilder { paths: WorldPaths::default(), config }
    }

    pub fn nodes(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.nodes = Some(path.into());
        self
    }

    pub fn links(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.links = Some(path.into());
        self
    }

    pub fn classifications(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.classifications = Some(path.into());
        self
    }

    pub fn buildings(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.buildings = Some(path.into());
        self
    }

    pub fn link_names(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.link_names = Some(path.into());
        self
    }

    pub fn rice_table(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.rice_table = Some(path.into());
        self
    }

    /// Parse all configured files, compute summed links and spatial
    /// indices, and return an immutable [`StaticWorld`] (§4.2 `load`).
    /// When a file path is `None`, the affected data is empty and all
    /// dependent queries return default/empty values.
    pub fn load(self) -> LoadResult<StaticWorld> {
        let nodes = match &self.paths.nodes {
            Some(p) => loader::parse_nodes(&read_file(p)?)?,
            None => Vec::new(),
        };
        let links = match &self.paths.links {
            Some(p) => loader::parse_links(&read_file(p)?)?,
            None => Vec::new(),
        };
        let classifications = match &self.paths.classifications {
            Some(p) => loader::parse_classifications(&read_file(p)?)?,
            None => HashMap::new(),
        };
        let buildings = match &self.paths.buildings {
            Some(p) => loader::parse_buildings(&read_file(p)?)?,
            None => Vec::new(),
        };
        let link_names = match &self.paths.link_names {
            Some(p) => loader::parse_link_names(&read_file(p)?)?,
            None => HashMap::new(),
        };
        let rice_table = match &self.paths.rice_table {
            Some(p) => Some(loader::parse_rice_table(&read_file(p)?)?),
            None => None,
        };

        tracing::info!(
            nodes = nodes.len(),
            links = links.len(),
            classifications = classifications.len(),
            buildings = buildings.len(),
            "loaded static world inputs"
        );

        assemble_world(nodes, links, classifications, buildings, link_names, rice_table, self.config)
    }
}

/// Assembles a fully-formed [`StaticWorld`] directly from already-parsed
/// entities, bypassing the filesystem entirely. Used by
/// [`StaticWorldBuilder::load`] and by any caller (including downstream
/// crates' tests) that already has geometry in memory.
pub fn assemble_world(
    mut nodes: Vec<Node>,
    links: Vec<Link>,
    classifications: HashMap<(SummedLinkId, SummedLinkId), Classification>,
    buildings: Vec<Building>,
    link_names: HashMap<String, SummedLinkId>,
    rice_table: Option<RiceTable>,
    config: PropagationConfig,
) -> LoadResult<StaticWorld> {
    let summed_links = compute_summed_links(&links, &mut nodes);

    let positions: Vec<Vector2D> = nodes.iter().map(|n| n.position).collect();
    let map_rect = compute_map_rect(&nodes, &buildings);

    let bucket_size = config.grid_size;
    let building_buckets = BuildingBuckets::compute(map_rect, bucket_size, &buildings);
    let link_grid = LinkGrid::compute(map_rect, config.grid_size, &summed_links, &positions);

    tracing::debug!(
        summed_links = summed_links.len(),
        map_w = map_rect.w,
        map_h = map_rect.h,
        "computed spatial indices"
    );

    Ok(StaticWorld {
        nodes,
        links,
        summed_links,
        classifications,
        buildings,
        link_names,
        rice_table,
        map_rect,
        building_buckets,
        link_grid,
        config,
    })
}

/// §4.2 `computeSummedLinks`: scans links in load order, merging lane counts
/// for repeated unordered node-pairs and updating each endpoint node's
/// `connected_links`. Idempotent: re-running on the same link set in the
/// same order reproduces the identical summed-link sequence.
fn compute_summed_links(links: &[Link], nodes: &mut [Node]) -> Vec<crate::model::SummedLink> {
    let mut pair_to_index: HashMap<(u32, u32), usize> = HashMap::new();
    let mut summed: Vec<crate::model::SummedLink> = Vec::new();

    for link in links {
        let key = if link.node_a.index() <= link.node_b.index() {
            (link.node_a.0, link.node_b.0)
        } else {
            (link.node_b.0, link.node_a.0)
        };

        match pair_to_index.get(&key) {
            Some(&idx) => {
                summed[idx].num_lanes += link.num_lanes;
            }
            None => {
                let idx = summed.len();
                let id = SummedLinkId(idx as u32);
                summed.push(crate::model::SummedLink {
                    index: id,
                    node_a: link.node_a,
                    node_b: link.node_b,
                    num_lanes: link.num_lanes,
                    flow: link.flow,
                    speed: link.speed,
                });
                pair_to_index.insert(key, idx);

                if let Some(n) = nodes.get_mut(link.node_a.index()) {
                    n.connected_links.push(id);
                }
                if let Some(n) = nodes.get_mut(link.node_b.index()) {
                    n.connected_links.push(id);
                }
            }
        }
    }

    summed
}

/// §3 `MapRect`: tight axis-aligned bound over all node positions and
/// building vertices.
fn compute_map_rect(nodes: &[Node], buildings: &[Building]) -> MapRect {
    let mut min = Vector2D::new(f64::INFINITY, f64::INFINITY);
    let mut max = Vector2D::new(f64::NEG_INFINITY, f64::NEG_INFINITY);

    let mut touch = |p: Vector2D| {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    };

    for n in nodes {
        touch(n.position);
    }
    for b in buildings {
        for e in &b.edges {
            touch(e.start);
            touch(e.end);
        }
    }

    if !min.x.is_finite() {
        return MapRect::new(0.0, 0.0, 0.0, 0.0);
    }

    MapRect::new(min.x, min.y, (max.x - min.x).max(0.0), (max.y - min.y).max(0.0))
}
