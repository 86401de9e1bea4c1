//! Static road/building geometry, spatial indices, and classification
//! tables for the CORNER propagation engine.
//!
//! Module map:
//! - [`model`] — entity types (`Node`, `Link`, `SummedLink`, `Classification`, `Building`).
//! - [`grid`] — `BuildingBuckets` and `LinkGrid` spatial indices.
//! - [`rice`] — the optional precomputed Rice (K-factor) table.
//! - [`loader`] — parsers for the six input file formats.
//! - [`world`] — `StaticWorld` and its builder, the read-only facade over everything above.
//! - [`error`] — `LoadError`.

pub mod error;
pub mod grid;
pub mod loader;
pub mod model;
pub mod rice;
pub mod world;

#[cfg(test)]
mod tests;

pub use error::{LoadError, LoadResult};
pub use grid::{BuildingBuckets, LinkGrid, MapRect};
pub use model::{Building, ClassTag, Classification, Link, Node, SummedLink};
pub use rice::{RiceSample, RiceTable};
pub use world::{assemble_world, StaticWorld, StaticWorldBuilder, WorldPaths};
