//! `nav-route` — hierarchical route queries with a bounded memo.
//!
//! # Crate layout
//!
//! | Module          | Contents                                               |
//! |-----------------|--------------------------------------------------------|
//! | [`router`]      | `HierarchicalRouter`, `RouteRequest`, `Route`          |
//! | [`cache`]       | `RoutingCache` arena, `RouteConfig` budgets            |
//! | [`alternative`] | `AlternativeRouteSelector` excluded-portal re-queries  |
//! | [`error`]       | `RouteError`, `RouteResult<T>`                         |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                      |
//! |---------|-------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on `RouteConfig`.         |

pub mod alternative;
pub mod cache;
pub mod error;
pub mod router;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use alternative::{AlternativeGoal, AlternativeRouteSelector};
pub use cache::{RouteConfig, RoutingCache};
pub use error::{RouteError, RouteResult};
pub use router::{HierarchicalRouter, Route, RouteRequest, Router};
