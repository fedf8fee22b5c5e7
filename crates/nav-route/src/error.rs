//! Routing-subsystem error type.
//!
//! Per-query failures are returned as values so the agent decision layer
//! can fall back (wander, hold position) without crashing the simulation.
//! Nothing here is retried automatically except `Deferred`, which callers
//! re-issue on a later frame.

use thiserror::Error;

use nav_core::AreaId;

/// Errors produced by `nav-route`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    /// No path exists under the given travel flags.  Expected and common
    /// (agent fell into an isolated area, flags exclude the only bridge).
    #[error("no route from {from} to {goal} under the given travel flags")]
    Unreachable { from: AreaId, goal: AreaId },

    /// The query names an area the graph does not contain.
    #[error("area {0} out of range")]
    InvalidArea(AreaId),

    /// Answering would exceed this frame's cache-build budget.
    /// Retry on a later frame; partial build work is kept.
    #[error("routing tables not yet built; retry next frame")]
    Deferred,
}

pub type RouteResult<T> = Result<T, RouteError>;
