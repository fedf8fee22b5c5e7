//! `nav-core` — foundational types for the bot-navigation engine.
//!
//! This crate is a dependency of every other `nav-*` crate.  It intentionally
//! has no `nav-*` dependencies and no required external ones (only optional
//! `serde`).
//!
//! # What lives here
//!
//! | Module     | Contents                                                 |
//! |------------|----------------------------------------------------------|
//! | [`ids`]    | `AreaId`, `LinkId`, `ClusterId`, `PortalId`, `NodeId`    |
//! | [`vec`]    | `Vec3`, `Bounds3`                                        |
//! | [`travel`] | `TravelType`, `TravelFlags`, area contents/flags/presence|
//! | [`time`]   | `TravelTime` fixed-point cost unit                       |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod ids;
pub mod time;
pub mod travel;
pub mod vec;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use ids::{AreaId, ClusterId, LinkId, NodeId, PortalId, WorldId};
pub use time::TravelTime;
pub use travel::{AreaContents, AreaFlags, Presence, TravelFlags, TravelType};
pub use vec::{Bounds3, Vec3};
