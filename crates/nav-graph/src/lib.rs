//! `nav-graph` — the static navigation graph and its file format.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`graph`]    | `NavGraph`, record types, spatial/membership queries      |
//! | [`file`]     | binary reader/writer (`from_bytes`/`to_bytes`)            |
//! | [`builder`]  | `NavGraphBuilder` for programmatic construction           |
//! | [`registry`] | `GraphRegistry` world-index → instance map                |
//! | [`error`]    | `GraphError`, `GraphResult<T>`                            |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                      |
//! |---------|-------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public record types.   |

pub mod builder;
pub mod error;
pub mod file;
pub mod graph;
pub mod registry;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use builder::{AreaSpec, NavGraphBuilder, NodeChild};
pub use error::{GraphError, GraphResult};
pub use file::FORMAT_VERSION;
pub use graph::{
    Area, AreaSettings, BspNode, Cluster, ClusterRef, Face, HullBox, NavGraph, Plane, Portal,
    Reachability, RevLink,
};
pub use registry::GraphRegistry;
