//! Hierarchical route queries over a [`NavGraph`].
//!
//! A query resolves in at most two phases:
//!
//! 1. **Local**: if start and goal share a cluster, the cluster's area
//!    cache answers directly.
//! 2. **Portal**: otherwise the portal cache gives the best remaining time
//!    from every portal to the goal, and the start cluster's portals are
//!    scanned for the one minimizing `local + max_crossing + remaining`.
//!
//! Either way the answer is a single step — the next link to take and the
//! total estimated time — on the premise that the caller re-queries from
//! wherever it actually ends up each frame, so a route self-heals after
//! pushes, falls and teleports without any stored path to repair.

use tracing::trace;

use nav_core::{AreaId, ClusterId, LinkId, PortalId, TravelFlags, TravelTime, Vec3};
use nav_graph::{ClusterRef, NavGraph};

use crate::cache::{RouteConfig, RoutingCache};
use crate::error::{RouteError, RouteResult};

// ── Request / answer types ────────────────────────────────────────────────────

/// One route query.
#[derive(Copy, Clone, Debug)]
pub struct RouteRequest {
    pub from_area: AreaId,
    pub from_origin: Vec3,
    pub goal_area: AreaId,
    pub goal_origin: Vec3,
    pub flags: TravelFlags,
}

/// The answer to a route query: the next step and the time estimate for
/// the whole remaining route.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Route {
    /// Link to traverse next; `None` when already in the goal area.
    pub next_link: Option<LinkId>,
    /// Estimated total travel time from the query origin to the goal.
    pub travel_time: TravelTime,
    /// Portal the route leaves the start cluster through, when it does.
    pub via_portal: Option<PortalId>,
}

impl Route {
    /// `true` when the query started inside the goal area.
    pub fn is_arrived(&self) -> bool {
        self.next_link.is_none()
    }
}

/// Anything that can answer route queries against a graph.
pub trait Router {
    fn route(&mut self, graph: &NavGraph, request: &RouteRequest) -> RouteResult<Route>;
}

// ── HierarchicalRouter ────────────────────────────────────────────────────────

/// The two-level router backed by a [`RoutingCache`].
///
/// Holds no reference to the graph; every call takes it as an argument so
/// one router can be rebuilt against a reloaded graph by recreating it.
pub struct HierarchicalRouter {
    cache: RoutingCache,
}

impl HierarchicalRouter {
    pub fn new(graph: &NavGraph, config: RouteConfig) -> Self {
        Self {
            cache: RoutingCache::new(graph, config),
        }
    }

    /// Reset the per-frame cache-build budget.  Call once per frame.
    pub fn begin_frame(&mut self) {
        self.cache.begin_frame();
    }

    pub fn cache(&self) -> &RoutingCache {
        &self.cache
    }

    /// Drop all cached tables.
    pub fn invalidate_all(&mut self) {
        self.cache.invalidate_all();
    }

    /// Drop cached tables that could route through `area` (its blockage
    /// or travel attributes changed).
    pub fn invalidate_area(&mut self, graph: &NavGraph, area: AreaId) {
        self.cache.invalidate_area(graph, area);
    }

    /// Whether any route exists for this request.
    pub fn reachable(&mut self, graph: &NavGraph, request: &RouteRequest) -> RouteResult<bool> {
        match self.route(graph, request) {
            Ok(_) => Ok(true),
            Err(RouteError::Unreachable { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Estimated travel time for the request, without the step details.
    pub fn travel_time_to_goal(
        &mut self,
        graph: &NavGraph,
        request: &RouteRequest,
    ) -> RouteResult<TravelTime> {
        Ok(self.route(graph, request)?.travel_time)
    }

    /// Route as [`Router::route`], but never through any of the
    /// `excluded` portals.  The basis of alternative-route selection.
    pub fn route_excluding(
        &mut self,
        graph: &NavGraph,
        request: &RouteRequest,
        excluded: &[PortalId],
    ) -> RouteResult<Route> {
        let from = request.from_area;
        let goal = request.goal_area;
        if from.index() >= graph.area_count() {
            return Err(RouteError::InvalidArea(from));
        }
        if goal.index() >= graph.area_count() {
            return Err(RouteError::InvalidArea(goal));
        }

        if from == goal {
            return Ok(Route {
                next_link: None,
                travel_time: graph.area_travel_time(
                    from,
                    request.from_origin,
                    request.goal_origin,
                ),
                via_portal: None,
            });
        }

        // Local phase: any shared cluster that numbers both endpoints can
        // answer without touching the portal level.
        for cluster in clusters_of(graph, from) {
            if graph.cluster_area_num(cluster, goal).is_none() {
                continue;
            }
            let Some(from_local) = graph.cluster_area_num(cluster, from) else { continue };
            let slot = self
                .cache
                .area_cache(graph, cluster, goal, request.flags)?;
            let times = self.cache.times(slot);
            if from_local as usize >= times.len() {
                continue;
            }
            let t = times[from_local as usize];
            if !t.is_reachable() {
                continue;
            }
            let link = link_at(graph, from, self.cache.first_links(slot)[from_local as usize])?;
            let time = self.refine(graph, request, t, link);
            trace!(%from, %goal, %cluster, %time, "local route");
            return Ok(Route {
                next_link: Some(link),
                travel_time: time,
                via_portal: None,
            });
        }

        // Portal phase.
        let pslot = self.cache.portal_cache(graph, goal, request.flags)?;
        // Area-cache lookups below may evict the portal entry; keep our
        // own copy of its table.
        let remaining: Vec<TravelTime> = self.cache.times(pslot).to_vec();

        let mut best_time = TravelTime::UNREACHABLE;
        let mut best_link: Option<LinkId> = None;
        let mut best_portal: Option<PortalId> = None;

        for cluster in clusters_of(graph, from) {
            let Some(from_local) = graph.cluster_area_num(cluster, from) else { continue };
            for &pnum in graph.portals_of_cluster(cluster) {
                if excluded.contains(&pnum) {
                    continue;
                }
                let Some(portal) = graph.portal(pnum) else { continue };
                // Standing in the portal area itself is the local phase's
                // business; this portal cannot be the exit.
                if portal.area == from {
                    continue;
                }
                if !remaining[pnum.index()].is_reachable() {
                    continue;
                }
                let slot = self
                    .cache
                    .area_cache(graph, cluster, portal.area, request.flags)?;
                let times = self.cache.times(slot);
                if from_local as usize >= times.len() {
                    continue;
                }
                let t_local = times[from_local as usize];
                if !t_local.is_reachable() {
                    continue;
                }
                let total = t_local
                    .saturating_add(portal.max_travel_time)
                    .saturating_add(remaining[pnum.index()]);
                if total < best_time {
                    best_time = total;
                    best_link = Some(link_at(
                        graph,
                        from,
                        self.cache.first_links(slot)[from_local as usize],
                    )?);
                    best_portal = Some(pnum);
                }
            }
        }

        match best_link {
            Some(link) => {
                let time = self.refine(graph, request, best_time, link);
                trace!(%from, %goal, portal = %best_portal.unwrap_or(PortalId::INVALID), %time, "portal route");
                Ok(Route {
                    next_link: Some(link),
                    travel_time: time,
                    via_portal: best_portal,
                })
            }
            None => Err(RouteError::Unreachable { from, goal }),
        }
    }

    /// Anchor the table estimate to the actual query points: add the time
    /// from the start origin to the first link's start point, and from
    /// the goal area's center to the goal origin.
    fn refine(
        &self,
        graph: &NavGraph,
        request: &RouteRequest,
        table_time: TravelTime,
        link: LinkId,
    ) -> TravelTime {
        let mut time = table_time;
        if let Some(l) = graph.link(link) {
            time = time.saturating_add(graph.area_travel_time(
                request.from_area,
                request.from_origin,
                l.start,
            ));
        }
        if let Some(goal) = graph.area(request.goal_area) {
            time = time.saturating_add(graph.area_travel_time(
                request.goal_area,
                goal.center,
                request.goal_origin,
            ));
        }
        time
    }
}

impl Router for HierarchicalRouter {
    fn route(&mut self, graph: &NavGraph, request: &RouteRequest) -> RouteResult<Route> {
        self.route_excluding(graph, request, &[])
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// The clusters an area can route in: one for a regular area, both sides
/// for a portal area.
fn clusters_of(graph: &NavGraph, area: AreaId) -> Vec<ClusterId> {
    match graph.cluster_of(area) {
        Some(ClusterRef::Cluster(c)) => vec![c],
        Some(ClusterRef::Portal(p)) => match graph.portal(p) {
            Some(portal) => vec![portal.front_cluster, portal.back_cluster],
            None => Vec::new(),
        },
        None => Vec::new(),
    }
}

/// Resolve an area-local link index from a travel-time table back to a
/// global link id.
fn link_at(graph: &NavGraph, area: AreaId, local: u8) -> RouteResult<LinkId> {
    let settings = graph
        .area_settings(area)
        .ok_or(RouteError::InvalidArea(area))?;
    if (local as u32) >= settings.num_links {
        return Err(RouteError::InvalidArea(area));
    }
    Ok(LinkId(settings.first_link + local as u32))
}
