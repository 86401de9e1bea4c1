//! `corner-core` — geometry primitives, typed indices, RNG, and
//! configuration shared across the CORNER propagation engine.
//!
//! This crate is a dependency of every other crate in the workspace. It
//! intentionally has no workspace-internal dependencies and a minimal
//! external surface (`rand`, `thiserror`, `toml`, `serde`).
//!
//! # What lives here
//!
//! | Module     | Contents                                               |
//! |------------|----------------------------------------------------------|
//! | [`geom`]   | `Vector2D`, `LineSegment`, `Rect` ("GeomKit", §4.1)    |
//! | [`ids`]    | `NodeId`, `LinkId`, `SummedLinkId`, `BuildingId`       |
//! | [`rng`]    | `CornerRng` — explicitly owned, seedable RNG           |
//! | [`config`] | `PropagationConfig` — numeric parameters from §6       |
//! | [`error`]  | `ConfigError`, `ConfigResult`                          |

pub mod config;
pub mod error;
pub mod geom;
pub mod ids;
pub mod rng;

#[cfg(test)]
mod tests;

pub use config::PropagationConfig;
pub use error::{ConfigError, ConfigResult};
pub use geom::{LineSegment, Rect, Vector2D, EPSILON};
pub use ids::{BuildingId, LinkId, NodeId, SummedLinkId};
pub use rng::CornerRng;
