//! Alternative route goals: distinct ways to reach the same goal.
//!
//! The primary route leaves the start cluster through some portal.
//! Re-querying with that portal excluded — then with each newly found
//! portal excluded too — yields routes through genuinely different
//! portals.  The portal areas of routes not much slower than the primary
//! become intermediate goals an agent can steer through to flank,
//! retreat along a different corridor, or avoid a blocked chokepoint.

use nav_core::{AreaId, PortalId, TravelTime, Vec3};
use nav_graph::NavGraph;

use crate::error::{RouteError, RouteResult};
use crate::router::{HierarchicalRouter, RouteRequest};

/// An intermediate goal on an alternative route.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AlternativeGoal {
    /// Portal area the alternative route passes through.
    pub area: AreaId,
    /// Point to steer toward (the portal area's center).
    pub origin: Vec3,
    /// Estimated total time of the alternative route.
    pub travel_time: TravelTime,
}

/// Enumerates alternative routes by excluded-portal re-queries.
#[derive(Copy, Clone, Debug)]
pub struct AlternativeRouteSelector {
    /// An alternative is kept while its time is at most this multiple of
    /// the primary route's time.
    pub max_time_factor: f32,
}

impl Default for AlternativeRouteSelector {
    fn default() -> Self {
        Self { max_time_factor: 2.0 }
    }
}

impl AlternativeRouteSelector {
    /// Up to `max_goals` alternative goals for `request`, cheapest first.
    ///
    /// Empty when the primary route stays inside one cluster (there is no
    /// portal to route around).  `Deferred` propagates so the caller can
    /// retry next frame.
    pub fn goals(
        &self,
        router: &mut HierarchicalRouter,
        graph: &NavGraph,
        request: &RouteRequest,
        max_goals: usize,
    ) -> RouteResult<Vec<AlternativeGoal>> {
        let primary = router.route_excluding(graph, request, &[])?;
        let Some(primary_portal) = primary.via_portal else {
            return Ok(Vec::new());
        };
        let limit = TravelTime(
            (primary.travel_time.0 as f32 * self.max_time_factor) as u32,
        );

        let mut excluded: Vec<PortalId> = vec![primary_portal];
        let mut goals = Vec::new();
        while goals.len() < max_goals {
            let route = match router.route_excluding(graph, request, &excluded) {
                Ok(r) => r,
                Err(RouteError::Unreachable { .. }) => break,
                Err(e) => return Err(e),
            };
            let Some(portal) = route.via_portal else {
                // A portal-free answer with portals excluded means a local
                // route surfaced; it is not an alternative corridor.
                break;
            };
            excluded.push(portal);
            if route.travel_time > limit {
                // Candidates come out cheapest-first; the rest are worse.
                break;
            }
            let Some(portal_area) = graph.portal(portal).map(|p| p.area) else { break };
            let Some(area) = graph.area(portal_area) else { break };
            goals.push(AlternativeGoal {
                area: portal_area,
                origin: area.center,
                travel_time: route.travel_time,
            });
        }
        Ok(goals)
    }
}
