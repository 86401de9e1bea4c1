//! Entity types of the data model (§3).

use corner_core::{BuildingId, LineSegment, LinkId, NodeId, SummedLinkId, Vector2D};

/// A road-network intersection (§3 `Node`).
#[derive(Clone, Debug)]
pub struct Node {
    pub index: NodeId,
    pub position: Vector2D,
    /// Indices into the *summed*-link set, not the raw link set.
    pub connected_links: Vec<SummedLinkId>,
    /// Intersection radius, treated as a circle.
    pub size: f64,
}

/// One stretch of physical road, as loaded from the links file (§3 `Link`).
#[derive(Clone, Debug)]
pub struct Link {
    pub index: LinkId,
    pub node_a: NodeId,
    pub node_b: NodeId,
    pub num_lanes: u32,
    pub flow: f64,
    pub speed: f64,
}

/// A virtual road between two nodes, one per unordered node-pair with ≥1
/// underlying physical link (§3 `SummedLink`).
#[derive(Clone, Debug)]
pub struct SummedLink {
    pub index: SummedLinkId,
    pub node_a: NodeId,
    pub node_b: NodeId,
    pub num_lanes: u32,
    pub flow: f64,
    pub speed: f64,
}

/// CORNER classification tag. Declared in ascending "quality" order so the
/// derived `Ord` directly implements the "smallest tag wins" comparison used
/// by the classifier's pairwise-best-candidate search (§4.3 step 2).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClassTag {
    Los = 0,
    Nlos1 = 1,
    Nlos2 = 2,
    OutOfRange = 3,
}

impl ClassTag {
    #[inline]
    pub fn corner_count(self) -> usize {
        match self {
            ClassTag::Los => 0,
            ClassTag::Nlos1 => 1,
            ClassTag::Nlos2 => 2,
            ClassTag::OutOfRange => 0,
        }
    }
}

/// A CORNER classification between a pair of summed links (§3
/// `Classification`).
#[derive(Clone, Debug)]
pub struct Classification {
    pub tag: ClassTag,
    /// Full node count traversed to reach this classification.
    /// `u32::MAX` represents the synthesised-OutOfRange "infinity" sentinel.
    pub full_node_count: u32,
    /// Corner nodes, length `tag.corner_count()`.
    pub node_set: Vec<NodeId>,
    pub main_lanes: f64,
    pub side_lanes: f64,
    /// Only meaningful for `Nlos2`.
    pub para_lanes: Option<f64>,
}

impl Classification {
    /// The canonical "no classification entry" value.
    pub fn out_of_range() -> Self {
        Classification {
            tag: ClassTag::OutOfRange,
            full_node_count: u32::MAX,
            node_set: Vec::new(),
            main_lanes: 0.0,
            side_lanes: 0.0,
            para_lanes: None,
        }
    }
}

/// A building footprint (§3 `Building`).
#[derive(Clone, Debug)]
pub struct Building {
    pub id: BuildingId,
    /// Polygon boundary, in load order: edges form a closed ring.
    pub edges: Vec<LineSegment>,
    pub permittivity: f64,
    pub max_height: f64,
    pub height_std_dev: f64,
}
