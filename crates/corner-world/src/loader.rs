//! Parsers for the whitespace-separated ASCII input files (§6).
//!
//! Each parser operates on the file's full text content rather than a
//! `Read` stream, which keeps the parsers trivially unit-testable against
//! string literals and defers all I/O to [`crate::world::StaticWorldBuilder`].

use std::collections::HashMap;

use corner_core::{BuildingId, LineSegment, LinkId, NodeId, SummedLinkId, Vector2D};

use crate::error::{LoadError, LoadResult};
use crate::model::{Building, ClassTag, Classification, Link, Node};
use crate::rice::{RiceSample, RiceTable};

/// A whitespace tokenizer with file/context-aware error reporting.
struct Tokens<'a> {
    file: &'static str,
    context: String,
    iter: std::str::SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(file: &'static str, text: &'a str) -> Self {
        Tokens { file, context: "header".to_string(), iter: text.split_whitespace() }
    }

    fn set_context(&mut self, context: impl Into<String>) {
        self.context = context.into();
    }

    fn next_str(&mut self) -> LoadResult<&'a str> {
        self.iter.next().ok_or_else(|| LoadError::UnexpectedEof {
            file: self.file,
            context: self.context.clone(),
        })
    }

    fn malformed(&self, reason: impl Into<String>) -> LoadError {
        LoadError::Malformed { file: self.file, context: self.context.clone(), reason: reason.into() }
    }

    fn next_usize(&mut self) -> LoadResult<usize> {
        let tok = self.next_str()?;
        tok.parse::<usize>().map_err(|e| self.malformed(format!("expected integer, got {tok:?}: {e}")))
    }

    fn next_u32(&mut self) -> LoadResult<u32> {
        let tok = self.next_str()?;
        tok.parse::<u32>().map_err(|e| self.malformed(format!("expected integer, got {tok:?}: {e}")))
    }

    fn next_f64(&mut self) -> LoadResult<f64> {
        let tok = self.next_str()?;
        tok.parse::<f64>().map_err(|e| self.malformed(format!("expected number, got {tok:?}: {e}")))
    }

    /// Parses a K-factor sample value, where `inf` denotes `+∞`.
    fn next_k(&mut self) -> LoadResult<f64> {
        let tok = self.next_str()?;
        if tok.eq_ignore_ascii_case("inf") {
            Ok(f64::INFINITY)
        } else {
            tok.parse::<f64>().map_err(|e| self.malformed(format!("expected number or 'inf', got {tok:?}: {e}")))
        }
    }
}

/// Parse the nodes file: `N` then `N` records of `index x y`.
///
/// `connected_links` is populated later by `computeSummedLinks`; nodes are
/// returned with an empty list here.
pub fn parse_nodes(text: &str) -> LoadResult<Vec<Node>> {
    let mut t = Tokens::new("nodes", text);
    let n = t.next_usize()?;
    let mut nodes = Vec::with_capacity(n);
    for i in 0..n {
        t.set_context(format!("record {i}"));
        let index = t.next_u32()?;
        let x = t.next_f64()?;
        let y = t.next_f64()?;
        nodes.push(Node {
            index: NodeId(index),
            position: Vector2D::new(x, y),
            connected_links: Vec::new(),
            size: 0.0,
        });
    }
    Ok(nodes)
}

/// Parse the links file: `M` then `M` records of
/// `index nodeA nodeB numLanes borderToken flow speed`. `borderToken` is
/// parsed and discarded (§6).
pub fn parse_links(text: &str) -> LoadResult<Vec<Link>> {
    let mut t = Tokens::new("links", text);
    let m = t.next_usize()?;
    let mut links = Vec::with_capacity(m);
    for i in 0..m {
        t.set_context(format!("record {i}"));
        let index = t.next_u32()?;
        let node_a = t.next_u32()?;
        let node_b = t.next_u32()?;
        let num_lanes = t.next_u32()?;
        let _border_token = t.next_str()?;
        let flow = t.next_f64()?;
        let speed = t.next_f64()?;
        links.push(Link {
            index: LinkId(index),
            node_a: NodeId(node_a),
            node_b: NodeId(node_b),
            num_lanes,
            flow,
            speed,
        });
    }
    Ok(links)
}

/// Parse the classification file: `C` then `C` records of
/// `l1 l2 tag fullNodeCount [mainLanes sideLanes [paraLanes]] [nodeIdx × tag]`.
/// Indices are into the *summed*-link set.
pub fn parse_classifications(
    text: &str,
) -> LoadResult<HashMap<(SummedLinkId, SummedLinkId), Classification>> {
    let mut t = Tokens::new("classification", text);
    let c = t.next_usize()?;
    let mut map = HashMap::with_capacity(c);
    for i in 0..c {
        t.set_context(format!("record {i}"));
        let l1 = t.next_u32()?;
        let l2 = t.next_u32()?;
        let tag_val = t.next_u32()?;
        let tag = match tag_val {
            0 => ClassTag::Los,
            1 => ClassTag::Nlos1,
            2 => ClassTag::Nlos2,
            3 => ClassTag::OutOfRange,
            other => return Err(t.malformed(format!("unknown class tag {other}"))),
        };
        let full_node_count = t.next_u32()?;

        let (main_lanes, side_lanes, para_lanes) = match tag {
            ClassTag::Nlos1 => {
                let m = t.next_f64()?;
                let s = t.next_f64()?;
                (m, s, None)
            }
            ClassTag::Nlos2 => {
                let m = t.next_f64()?;
                let s = t.next_f64()?;
                let p = t.next_f64()?;
                (m, s, Some(p))
            }
            ClassTag::Los | ClassTag::OutOfRange => (0.0, 0.0, None),
        };

        let mut node_set = Vec::with_capacity(tag.corner_count());
        for _ in 0..tag.corner_count() {
            node_set.push(NodeId(t.next_u32()?));
        }

        let key = canonical_pair(SummedLinkId(l1), SummedLinkId(l2));
        if map.contains_key(&key) {
            tracing::warn!(l1, l2, "duplicate classification entry, last write wins");
        }
        map.insert(
            key,
            Classification { tag, full_node_count, node_set, main_lanes, side_lanes, para_lanes },
        );
    }
    Ok(map)
}

fn canonical_pair(a: SummedLinkId, b: SummedLinkId) -> (SummedLinkId, SummedLinkId) {
    if a.index() <= b.index() { (a, b) } else { (b, a) }
}

/// Parse the buildings file: `B` then `B` records of
/// `tmp ε maxH heightStdDev vertexCount x1 y1 … xk yk`. Edges are consecutive
/// `(xi,yi) → (xi+1,yi+1)` pairs, forming a closed ring.
pub fn parse_buildings(text: &str) -> LoadResult<Vec<Building>> {
    let mut t = Tokens::new("buildings", text);
    let b = t.next_usize()?;
    let mut buildings = Vec::with_capacity(b);
    for i in 0..b {
        t.set_context(format!("record {i}"));
        let _tmp = t.next_str()?;
        let permittivity = t.next_f64()?;
        let max_height = t.next_f64()?;
        let height_std_dev = t.next_f64()?;
        let vertex_count = t.next_usize()?;

        let mut vertices = Vec::with_capacity(vertex_count);
        for _ in 0..vertex_count {
            let x = t.next_f64()?;
            let y = t.next_f64()?;
            vertices.push(Vector2D::new(x, y));
        }
        if vertices.is_empty() {
            return Err(t.malformed("building has zero vertices"));
        }

        let mut edges = Vec::with_capacity(vertex_count);
        for k in 0..vertices.len() {
            let next = (k + 1) % vertices.len();
            edges.push(LineSegment::new(vertices[k], vertices[next]));
        }

        buildings.push(Building {
            id: BuildingId(i as u32),
            edges,
            permittivity,
            max_height,
            height_std_dev,
        });
    }
    Ok(buildings)
}

/// Parse the link-name-mapping file: `K` then `K` records of `name index`.
/// Indices refer to the summed-link set.
pub fn parse_link_names(text: &str) -> LoadResult<HashMap<String, SummedLinkId>> {
    let mut t = Tokens::new("link-name-map", text);
    let k = t.next_usize()?;
    let mut map = HashMap::with_capacity(k);
    for i in 0..k {
        t.set_context(format!("record {i}"));
        let name = t.next_str()?.to_string();
        let index = t.next_u32()?;
        map.insert(name, SummedLinkId(index));
    }
    Ok(map)
}

/// Parse the optional Rice-factor file: `P` pairs, then for each pair
/// `l1 l2 nPoints` followed by `nPoints` records of `srcX srcY dstX dstY K`.
pub fn parse_rice_table(text: &str) -> LoadResult<RiceTable> {
    let mut t = Tokens::new("rice-table", text);
    let p = t.next_usize()?;
    let mut table = RiceTable::new();
    for i in 0..p {
        t.set_context(format!("pair {i} header"));
        let l1 = t.next_u32()?;
        let l2 = t.next_u32()?;
        let n_points = t.next_usize()?;

        for j in 0..n_points {
            t.set_context(format!("pair {i} sample {j}"));
            let src = Vector2D::new(t.next_f64()?, t.next_f64()?);
            let dst = Vector2D::new(t.next_f64()?, t.next_f64()?);
            let k = t.next_k()?;
            table.insert(SummedLinkId(l1), SummedLinkId(l2), RiceSample { src, dst, k });
        }
    }
    Ok(table)
}
