//! Unit tests for nav-route.
//!
//! All fixtures place link endpoints at area centers, so every intra-area
//! crossing estimate and both endpoint refinements come out as
//! `TravelTime(1)` and expected route times can be computed by hand:
//! each hop costs its link time plus 1, and a full route adds 2 for the
//! origin refinements.

#[cfg(test)]
mod helpers {
    use nav_core::{AreaId, Bounds3, ClusterId, PortalId, TravelFlags, TravelTime, TravelType, Vec3};
    use nav_graph::{AreaSpec, NavGraph, NavGraphBuilder};

    use crate::RouteRequest;

    /// Axis-aligned box `[i*64, i*64+64)` on x, 0..64 on y and z.
    pub fn slab(i: u32) -> Bounds3 {
        let x0 = i as f32 * 64.0;
        Bounds3::new(Vec3::new(x0, 0.0, 0.0), Vec3::new(x0 + 64.0, 64.0, 64.0))
    }

    pub fn center(i: u32) -> Vec3 {
        Vec3::new(i as f32 * 64.0 + 32.0, 32.0, 32.0)
    }

    /// Symmetric walk pair between consecutive slabs, endpoints at the
    /// area centers.
    fn walk_pair(b: &mut NavGraphBuilder, a: AreaId, z: AreaId, tt: u32) {
        b.add_link_pair(a, z, TravelType::Walk, TravelTime(tt), center(a.0), center(z.0));
    }

    /// A single cluster of `n` areas chained by symmetric 100-unit walk
    /// links.
    pub fn line_cluster(n: u32) -> (NavGraph, Vec<AreaId>) {
        let mut b = NavGraphBuilder::new();
        let c = b.add_cluster();
        let areas: Vec<AreaId> = (0..n).map(|i| b.add_area(slab(i), AreaSpec::default())).collect();
        for &a in &areas {
            b.assign_cluster(a, c);
        }
        for w in areas.windows(2) {
            walk_pair(&mut b, w[0], w[1], 100);
        }
        (b.build().unwrap(), areas)
    }

    /// Two clusters joined by one portal area:
    ///
    /// ```text
    /// cluster 0: a0 ── a1 ── [a2 portal, max 50] ── a3 ── a4 : cluster 1
    /// ```
    pub fn two_cluster_graph() -> (NavGraph, [AreaId; 5], [ClusterId; 2], PortalId) {
        let mut b = NavGraphBuilder::new();
        let c0 = b.add_cluster();
        let c1 = b.add_cluster();

        let areas: Vec<AreaId> = (0..5).map(|i| b.add_area(slab(i), AreaSpec::default())).collect();
        b.assign_cluster(areas[0], c0);
        b.assign_cluster(areas[1], c0);
        let portal = b.add_portal(areas[2], c0, c1, TravelTime(50));
        b.assign_cluster(areas[3], c1);
        b.assign_cluster(areas[4], c1);

        for w in areas.windows(2) {
            walk_pair(&mut b, w[0], w[1], 100);
        }
        let graph = b.build().unwrap();
        (graph, [areas[0], areas[1], areas[2], areas[3], areas[4]], [c0, c1], portal)
    }

    /// Three clusters in a chain, one area each, joined by two portals:
    ///
    /// ```text
    /// c0: a0 ── [a1, max 50] ── a2 :c1── [a3, max 70] ── a4 :c2
    /// ```
    pub fn three_cluster_graph() -> (NavGraph, [AreaId; 5], [PortalId; 2]) {
        let mut b = NavGraphBuilder::new();
        let c0 = b.add_cluster();
        let c1 = b.add_cluster();
        let c2 = b.add_cluster();

        let areas: Vec<AreaId> = (0..5).map(|i| b.add_area(slab(i), AreaSpec::default())).collect();
        b.assign_cluster(areas[0], c0);
        let pa = b.add_portal(areas[1], c0, c1, TravelTime(50));
        b.assign_cluster(areas[2], c1);
        let pb = b.add_portal(areas[3], c1, c2, TravelTime(70));
        b.assign_cluster(areas[4], c2);

        for w in areas.windows(2) {
            walk_pair(&mut b, w[0], w[1], 100);
        }
        let graph = b.build().unwrap();
        (graph, [areas[0], areas[1], areas[2], areas[3], areas[4]], [pa, pb])
    }

    /// Two clusters joined by two parallel portals with opposite
    /// trade-offs: `px` is cheap to reach but crosses slowly, `py` is
    /// expensive to reach but crosses fast.
    ///
    /// ```text
    ///         [a1 = px, max 500]
    ///        /100             100\
    ///   c0: a0                    a3 :c1
    ///        \300              50/
    ///         [a2 = py, max 50]
    /// ```
    pub fn portal_choice_graph() -> (NavGraph, [AreaId; 4], [PortalId; 2]) {
        let mut b = NavGraphBuilder::new();
        let c0 = b.add_cluster();
        let c1 = b.add_cluster();

        let a0 = b.add_area(slab(0), AreaSpec::default());
        let a1 = b.add_area(slab(1), AreaSpec::default());
        let a2 = b.add_area(slab(2), AreaSpec::default());
        let a3 = b.add_area(slab(3), AreaSpec::default());

        b.assign_cluster(a0, c0);
        let px = b.add_portal(a1, c0, c1, TravelTime(500));
        let py = b.add_portal(a2, c0, c1, TravelTime(50));
        b.assign_cluster(a3, c1);

        walk_pair(&mut b, a0, a1, 100);
        walk_pair(&mut b, a1, a3, 100);
        walk_pair(&mut b, a0, a2, 300);
        walk_pair(&mut b, a2, a3, 50);

        let graph = b.build().unwrap();
        (graph, [a0, a1, a2, a3], [px, py])
    }

    /// One cluster where the middle area is flooded and only crossable by
    /// swimming: `a0 ──walk── [a1 water] ──swim── a2`.
    pub fn water_graph() -> (NavGraph, [AreaId; 3]) {
        let mut b = NavGraphBuilder::new();
        let c = b.add_cluster();
        let a0 = b.add_area(slab(0), AreaSpec::default());
        let a1 = b.add_area(slab(1), AreaSpec::water());
        let a2 = b.add_area(slab(2), AreaSpec::default());
        for &a in &[a0, a1, a2] {
            b.assign_cluster(a, c);
        }
        b.add_link_pair(a0, a1, TravelType::Walk, TravelTime(100), center(0), center(1));
        b.add_link_pair(a1, a2, TravelType::Swim, TravelTime(100), center(1), center(2));
        (b.build().unwrap(), [a0, a1, a2])
    }

    /// Request between two area centers with the default travel mask.
    pub fn request(graph: &NavGraph, from: AreaId, goal: AreaId) -> RouteRequest {
        let origin = |a: AreaId| graph.area(a).map(|r| r.center).unwrap_or(Vec3::ZERO);
        RouteRequest {
            from_area: from,
            from_origin: origin(from),
            goal_area: goal,
            goal_origin: origin(goal),
            flags: TravelFlags::DEFAULT,
        }
    }
}

// ── Single-cluster routing ────────────────────────────────────────────────────

#[cfg(test)]
mod local {
    use nav_core::{AreaId, TravelTime};

    use super::helpers::{line_cluster, request};
    use crate::{HierarchicalRouter, RouteConfig, RouteError, Router};

    #[test]
    fn arrival_in_goal_area() {
        let (g, a) = line_cluster(3);
        let mut r = HierarchicalRouter::new(&g, RouteConfig::default());
        let route = r.route(&g, &request(&g, a[1], a[1])).unwrap();
        assert!(route.is_arrived());
        assert_eq!(route.next_link, None);
        assert_eq!(route.via_portal, None);
        // Zero distance still charges the minimum crossing tick.
        assert_eq!(route.travel_time, TravelTime(1));
    }

    #[test]
    fn chain_times_are_exact() {
        let (g, a) = line_cluster(3);
        let mut r = HierarchicalRouter::new(&g, RouteConfig::default());

        // One hop: 100 link + 1 crossing + 2 refinement.
        let one = r.route(&g, &request(&g, a[0], a[1])).unwrap();
        assert_eq!(one.travel_time, TravelTime(103));
        assert_eq!(one.via_portal, None);

        // Two hops: 2 * 101 + 2.
        let two = r.route(&g, &request(&g, a[0], a[2])).unwrap();
        assert_eq!(two.travel_time, TravelTime(204));

        // The chain is symmetric.
        let back = r.route(&g, &request(&g, a[2], a[0])).unwrap();
        assert_eq!(back.travel_time, TravelTime(204));
    }

    #[test]
    fn next_link_leads_toward_goal() {
        let (g, a) = line_cluster(4);
        let mut r = HierarchicalRouter::new(&g, RouteConfig::default());
        let route = r.route(&g, &request(&g, a[1], a[3])).unwrap();
        let link = g.link(route.next_link.unwrap()).unwrap();
        assert_eq!(link.from_area, a[1]);
        assert_eq!(link.to_area, a[2]);
    }

    #[test]
    fn unlinked_area_is_unreachable() {
        let (g, a) = {
            // a2 shares the cluster but has no links at all.
            use nav_core::{TravelTime, TravelType};
            use nav_graph::{AreaSpec, NavGraphBuilder};

            use super::helpers::{center, slab};
            let mut b = NavGraphBuilder::new();
            let c = b.add_cluster();
            let areas: Vec<_> = (0..3).map(|i| b.add_area(slab(i), AreaSpec::default())).collect();
            for &x in &areas {
                b.assign_cluster(x, c);
            }
            b.add_link_pair(areas[0], areas[1], TravelType::Walk, TravelTime(100), center(0), center(1));
            (b.build().unwrap(), areas)
        };
        let mut r = HierarchicalRouter::new(&g, RouteConfig::default());
        assert_eq!(
            r.route(&g, &request(&g, a[0], a[2])),
            Err(RouteError::Unreachable { from: a[0], goal: a[2] })
        );
        assert_eq!(r.reachable(&g, &request(&g, a[0], a[2])), Ok(false));
        assert_eq!(r.reachable(&g, &request(&g, a[0], a[1])), Ok(true));
    }

    #[test]
    fn out_of_range_area_is_invalid() {
        let (g, a) = line_cluster(2);
        let mut r = HierarchicalRouter::new(&g, RouteConfig::default());
        let mut req = request(&g, a[0], a[1]);
        req.goal_area = AreaId(99);
        assert_eq!(r.route(&g, &req), Err(RouteError::InvalidArea(AreaId(99))));
    }
}

// ── Cross-cluster routing ─────────────────────────────────────────────────────

#[cfg(test)]
mod hierarchical {
    use nav_core::TravelTime;

    use super::helpers::{portal_choice_graph, request, three_cluster_graph, two_cluster_graph};
    use crate::{HierarchicalRouter, RouteConfig, Router};

    #[test]
    fn crosses_one_portal() {
        let (g, a, _, portal) = two_cluster_graph();
        let mut r = HierarchicalRouter::new(&g, RouteConfig::default());
        let route = r.route(&g, &request(&g, a[0], a[4])).unwrap();

        // Local 2 hops to the portal (202), its coarse crossing weight
        // (50), 2 hops beyond it (202), plus refinement.
        assert_eq!(route.travel_time, TravelTime(456));
        assert_eq!(route.via_portal, Some(portal));
        let link = g.link(route.next_link.unwrap()).unwrap();
        assert_eq!(link.to_area, a[1]);
    }

    #[test]
    fn crosses_two_portals() {
        let (g, a, [pa, _]) = three_cluster_graph();
        let mut r = HierarchicalRouter::new(&g, RouteConfig::default());
        let route = r.route(&g, &request(&g, a[0], a[4])).unwrap();

        // 101 to the first portal, +50 crossing, then 3 more hops with
        // the second portal's 70 in between, plus refinement.
        assert_eq!(route.travel_time, TravelTime(526));
        assert_eq!(route.via_portal, Some(pa));
        let link = g.link(route.next_link.unwrap()).unwrap();
        assert_eq!(link.to_area, a[1]);
    }

    #[test]
    fn picks_portal_minimizing_total_time() {
        let (g, a, [_, py]) = portal_choice_graph();
        let mut r = HierarchicalRouter::new(&g, RouteConfig::default());
        let route = r.route(&g, &request(&g, a[0], a[3])).unwrap();

        // Through px: 101 + 500 + 101.  Through py: 301 + 50 + 51.  The
        // nearer portal loses to the cheaper total.
        assert_eq!(route.travel_time, TravelTime(404));
        assert_eq!(route.via_portal, Some(py));
        let link = g.link(route.next_link.unwrap()).unwrap();
        assert_eq!(link.to_area, a[2]);
    }

    #[test]
    fn portal_area_routes_in_both_clusters() {
        let (g, a, _, _) = two_cluster_graph();
        let mut r = HierarchicalRouter::new(&g, RouteConfig::default());

        // Standing in the portal area, both sides are local routes.
        let fwd = r.route(&g, &request(&g, a[2], a[4])).unwrap();
        assert_eq!(fwd.travel_time, TravelTime(204));
        assert_eq!(fwd.via_portal, None);

        let back = r.route(&g, &request(&g, a[2], a[0])).unwrap();
        assert_eq!(back.travel_time, TravelTime(204));
        assert_eq!(back.via_portal, None);
    }
}

// ── Travel-flag masks ─────────────────────────────────────────────────────────

#[cfg(test)]
mod flags {
    use nav_core::{TravelFlags, TravelTime};

    use super::helpers::{request, water_graph};
    use crate::{HierarchicalRouter, RouteConfig, RouteError, Router};

    #[test]
    fn default_mask_swims_through_water() {
        let (g, a) = water_graph();
        let mut r = HierarchicalRouter::new(&g, RouteConfig::default());
        let route = r.route(&g, &request(&g, a[0], a[2])).unwrap();
        assert_eq!(route.travel_time, TravelTime(204));
    }

    #[test]
    fn water_blocks_mask_without_swim() {
        let (g, a) = water_graph();
        let mut r = HierarchicalRouter::new(&g, RouteConfig::default());
        let mask = TravelFlags(TravelFlags::DEFAULT.0 & !(TravelFlags::SWIM.0 | TravelFlags::WATER.0));

        let mut req = request(&g, a[0], a[2]);
        req.flags = mask;
        assert_eq!(
            r.route(&g, &req),
            Err(RouteError::Unreachable { from: a[0], goal: a[2] })
        );

        // Both directions: the return path enters the flooded area over
        // a walk link, which the content bit alone forbids.
        let mut back = request(&g, a[2], a[0]);
        back.flags = mask;
        assert_eq!(
            r.route(&g, &back),
            Err(RouteError::Unreachable { from: a[2], goal: a[0] })
        );

        // The dry hop next to the water stays routable.
        let mut dry = request(&g, a[0], a[1]);
        dry.flags = mask;
        // Walking INTO the water area is still a walk link; only passing
        // through it as an intermediate is gated off.
        assert!(r.route(&g, &dry).is_ok());
    }

    #[test]
    fn wider_mask_never_loses_a_route() {
        let (g, a) = water_graph();
        let mut r = HierarchicalRouter::new(&g, RouteConfig::default());

        let base = r.route(&g, &request(&g, a[0], a[2])).unwrap();

        // Granting extra capabilities can only keep or improve a route.
        let mut req = request(&g, a[0], a[2]);
        req.flags = TravelFlags(
            TravelFlags::DEFAULT.0 | TravelFlags::ROCKET_JUMP.0 | TravelFlags::GRAPPLE.0,
        );
        let wide = r.route(&g, &req).unwrap();
        assert!(wide.travel_time <= base.travel_time);
        assert_eq!(wide.travel_time, TravelTime(204));
    }

    #[test]
    fn mask_is_part_of_the_cache_key() {
        let (g, a) = water_graph();
        let mut r = HierarchicalRouter::new(&g, RouteConfig::default());

        let full = r.route(&g, &request(&g, a[0], a[2])).unwrap();

        let mut req = request(&g, a[0], a[2]);
        req.flags = TravelFlags(TravelFlags::DEFAULT.0 & !TravelFlags::SWIM.0);
        assert!(r.route(&g, &req).is_err());

        // The restricted query must not have poisoned the default one.
        let again = r.route(&g, &request(&g, a[0], a[2])).unwrap();
        assert_eq!(again, full);
    }
}

// ── Cache budget, eviction, invalidation ──────────────────────────────────────

#[cfg(test)]
mod cache {
    use nav_core::TravelFlags;

    use super::helpers::{request, two_cluster_graph};
    use crate::{HierarchicalRouter, RouteConfig, Router};

    /// Byte size of one area-cache entry in the fixture's cluster 0 (all
    /// three goals there produce equally sized tables).
    fn entry_bytes() -> usize {
        let (g, a, _, _) = two_cluster_graph();
        let mut r = HierarchicalRouter::new(&g, RouteConfig::default());
        r.route(&g, &request(&g, a[1], a[0])).unwrap();
        assert_eq!(r.cache().entry_count(), 1);
        r.cache().total_bytes()
    }

    #[test]
    fn lru_evicts_the_coldest_entry() {
        let (g, a, [c0, _], _) = two_cluster_graph();
        let unit = entry_bytes();
        let config = RouteConfig { max_cache_bytes: 2 * unit, ..RouteConfig::default() };
        let mut r = HierarchicalRouter::new(&g, config);
        let flags = TravelFlags::DEFAULT;

        r.route(&g, &request(&g, a[1], a[0])).unwrap(); // goal a0
        r.route(&g, &request(&g, a[0], a[1])).unwrap(); // goal a1
        assert_eq!(r.cache().entry_count(), 2);
        assert_eq!(r.cache().eviction_count(), 0);

        // Touch the a0 table so a1 becomes the LRU tail, then force a
        // third build past the two-entry budget.
        r.route(&g, &request(&g, a[1], a[0])).unwrap();
        r.route(&g, &request(&g, a[0], a[2])).unwrap(); // goal a2

        assert_eq!(r.cache().eviction_count(), 1);
        assert_eq!(r.cache().entry_count(), 2);
        assert!(r.cache().total_bytes() <= 2 * unit);
        assert!(r.cache().contains_area_cache(&g, c0, a[0], flags));
        assert!(!r.cache().contains_area_cache(&g, c0, a[1], flags));
        assert!(r.cache().contains_area_cache(&g, c0, a[2], flags));
    }

    #[test]
    fn budget_holds_across_query_mixes() {
        let (g, a, _, _) = two_cluster_graph();
        let unit = entry_bytes();
        let budget = 2 * unit;
        let config = RouteConfig { max_cache_bytes: budget, ..RouteConfig::default() };
        let mut r = HierarchicalRouter::new(&g, config);

        let pairs =
            [(0, 4), (4, 0), (1, 3), (0, 2), (3, 1), (2, 4), (1, 0), (4, 2), (0, 3), (2, 0)];
        for &(f, t) in &pairs {
            r.begin_frame();
            let _ = r.route(&g, &request(&g, a[f], a[t]));
            assert!(r.cache().total_bytes() <= budget);
        }
        assert!(r.cache().eviction_count() > 0);
    }

    #[test]
    fn invalidate_all_resets_and_rebuilds_identically() {
        let (g, a, _, _) = two_cluster_graph();
        let mut r = HierarchicalRouter::new(&g, RouteConfig::default());

        let first = r.route(&g, &request(&g, a[0], a[4])).unwrap();
        assert!(r.cache().entry_count() > 0);

        r.invalidate_all();
        assert_eq!(r.cache().entry_count(), 0);
        assert_eq!(r.cache().total_bytes(), 0);

        let second = r.route(&g, &request(&g, a[0], a[4])).unwrap();
        assert_eq!(second, first);
    }

    #[test]
    fn invalidate_area_spares_other_clusters() {
        let (g, a, [c0, c1], _) = two_cluster_graph();
        let mut r = HierarchicalRouter::new(&g, RouteConfig::default());
        let flags = TravelFlags::DEFAULT;

        r.route(&g, &request(&g, a[1], a[0])).unwrap(); // cluster 0 table
        r.route(&g, &request(&g, a[3], a[4])).unwrap(); // cluster 1 table
        assert!(r.cache().contains_area_cache(&g, c0, a[0], flags));
        assert!(r.cache().contains_area_cache(&g, c1, a[4], flags));

        r.invalidate_area(&g, a[0]);
        assert!(!r.cache().contains_area_cache(&g, c0, a[0], flags));
        assert!(r.cache().contains_area_cache(&g, c1, a[4], flags));
    }
}

// ── Frame budgets and deferral ────────────────────────────────────────────────

#[cfg(test)]
mod deferral {
    use nav_core::TravelTime;

    use super::helpers::{request, two_cluster_graph};
    use crate::{HierarchicalRouter, RouteConfig, RouteError, Router};

    #[test]
    fn zero_budget_defers_every_miss() {
        let (g, a, _, _) = two_cluster_graph();
        let config = RouteConfig { max_frame_builds: 0, ..RouteConfig::default() };
        let mut r = HierarchicalRouter::new(&g, config);

        assert_eq!(r.route(&g, &request(&g, a[0], a[1])), Err(RouteError::Deferred));
        r.begin_frame();
        assert_eq!(r.route(&g, &request(&g, a[0], a[1])), Err(RouteError::Deferred));
        // Arrival needs no tables at all.
        assert!(r.route(&g, &request(&g, a[0], a[0])).is_ok());
    }

    #[test]
    fn deferred_queries_amortize_over_frames() {
        let (g, a, _, _) = two_cluster_graph();
        let config = RouteConfig { max_frame_builds: 1, ..RouteConfig::default() };
        let mut r = HierarchicalRouter::new(&g, config);
        let req = request(&g, a[0], a[4]);

        let mut answer = None;
        for _frame in 0..8 {
            r.begin_frame();
            match r.route(&g, &req) {
                Ok(route) => {
                    answer = Some(route);
                    break;
                }
                Err(RouteError::Deferred) => continue,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        // Tables built before a deferral stay cached, so one build per
        // frame finishes the cross-cluster query in a few frames.
        let route = answer.expect("query never completed");
        assert_eq!(route.travel_time, TravelTime(456));
    }
}

// ── Determinism ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod determinism {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use super::helpers::{line_cluster, request, two_cluster_graph};
    use crate::{HierarchicalRouter, RouteConfig, Router};

    #[test]
    fn eviction_pressure_does_not_change_answers() {
        let (g, a, _, _) = two_cluster_graph();

        // Big enough to never evict.
        let mut reference = HierarchicalRouter::new(&g, RouteConfig::default());
        // Two entries max: almost every query rebuilds its tables.
        let tight = {
            let mut probe = HierarchicalRouter::new(&g, RouteConfig::default());
            probe.route(&g, &request(&g, a[1], a[0])).unwrap();
            probe.cache().total_bytes() * 2
        };
        let mut squeezed =
            HierarchicalRouter::new(&g, RouteConfig { max_cache_bytes: tight, ..RouteConfig::default() });

        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..64 {
            let from = a[rng.gen_range(0..a.len())];
            let goal = a[rng.gen_range(0..a.len())];
            let req = request(&g, from, goal);
            reference.begin_frame();
            squeezed.begin_frame();
            assert_eq!(squeezed.route(&g, &req), reference.route(&g, &req));
        }
        assert!(squeezed.cache().eviction_count() > 0);
    }

    #[test]
    fn chain_distances_match_closed_form() {
        let (g, a) = line_cluster(12);
        let mut r = HierarchicalRouter::new(&g, RouteConfig::default());
        let mut rng = SmallRng::seed_from_u64(11);

        for _ in 0..64 {
            r.begin_frame();
            let i = rng.gen_range(0..a.len());
            let j = rng.gen_range(0..a.len());
            let expected = if i == j {
                1
            } else {
                101 * (i.abs_diff(j) as u32) + 2
            };
            let t = r.travel_time_to_goal(&g, &request(&g, a[i], a[j])).unwrap();
            assert_eq!(t.0, expected, "route {i} -> {j}");
        }
    }

    #[test]
    fn estimates_respect_the_triangle_inequality() {
        let (g, a) = line_cluster(10);
        let mut r = HierarchicalRouter::new(&g, RouteConfig::default());
        let mut rng = SmallRng::seed_from_u64(13);
        let mut t = |from, to| {
            r.begin_frame();
            r.travel_time_to_goal(&g, &request(&g, from, to)).unwrap().0
        };

        for _ in 0..64 {
            let i = a[rng.gen_range(0..a.len())];
            let j = a[rng.gen_range(0..a.len())];
            let k = a[rng.gen_range(0..a.len())];
            assert!(t(i, k) <= t(i, j) + t(j, k), "{i} {j} {k}");
        }
    }
}

// ── Alternative routes ────────────────────────────────────────────────────────

#[cfg(test)]
mod alternative {
    use nav_core::TravelTime;

    use super::helpers::{line_cluster, portal_choice_graph, request};
    use crate::{AlternativeRouteSelector, HierarchicalRouter, RouteConfig, Router};

    #[test]
    fn no_alternatives_inside_one_cluster() {
        let (g, a) = line_cluster(4);
        let mut r = HierarchicalRouter::new(&g, RouteConfig::default());
        let goals = AlternativeRouteSelector::default()
            .goals(&mut r, &g, &request(&g, a[0], a[3]), 4)
            .unwrap();
        assert!(goals.is_empty());
    }

    #[test]
    fn second_portal_becomes_an_alternative() {
        let (g, a, [px, py]) = portal_choice_graph();
        let mut r = HierarchicalRouter::new(&g, RouteConfig::default());
        let req = request(&g, a[0], a[3]);

        let primary = r.route(&g, &req).unwrap();
        assert_eq!(primary.via_portal, Some(py));

        let goals = AlternativeRouteSelector::default().goals(&mut r, &g, &req, 4).unwrap();
        assert_eq!(goals.len(), 1);
        // The alternative steers through the other portal's area, never
        // the primary route's.
        assert_eq!(goals[0].area, g.portal(px).unwrap().area);
        assert_ne!(goals[0].area, g.portal(py).unwrap().area);
        assert_eq!(goals[0].origin, g.area(a[1]).unwrap().center);
        assert_eq!(goals[0].travel_time, TravelTime(704));
    }

    #[test]
    fn time_factor_prunes_slow_detours() {
        let (g, a, _) = portal_choice_graph();
        let mut r = HierarchicalRouter::new(&g, RouteConfig::default());
        let req = request(&g, a[0], a[3]);

        // Primary is 404; the detour is 704, above a 1.2x limit.
        let strict = AlternativeRouteSelector { max_time_factor: 1.2 };
        assert!(strict.goals(&mut r, &g, &req, 4).unwrap().is_empty());
    }

    #[test]
    fn zero_goal_limit_yields_nothing() {
        let (g, a, _) = portal_choice_graph();
        let mut r = HierarchicalRouter::new(&g, RouteConfig::default());
        let goals = AlternativeRouteSelector::default()
            .goals(&mut r, &g, &request(&g, a[0], a[3]), 0)
            .unwrap();
        assert!(goals.is_empty());
    }
}
