//! Memoized travel-time tables with a byte budget and LRU eviction.
//!
//! # Cache families
//!
//! Two kinds of entry share one arena:
//!
//! - **Area cache** `(cluster, goal area, travel flags)`: for every area in
//!   the cluster (indexed by its cluster-local number), the best travel
//!   time *to* the goal and the area-local index of the outgoing link that
//!   starts the best path.  Built by a FIFO label-correcting relaxation
//!   seeded at the goal, expanding backward over the reversed-reachability
//!   index.
//! - **Portal cache** `(goal area, travel flags)`: for every portal in the
//!   world, the best travel time from the portal's area to the goal across
//!   the coarse cluster graph.  Built on top of area caches, adding each
//!   portal's `max_travel_time` when a path crosses it into the next
//!   cluster.
//!
//! # Arena and lists
//!
//! Entries live in an arena of slots addressed by stable `u32` handles.
//! Each slot carries intrusive prev/next *indices* for two doubly linked
//! lists: the global LRU list (eviction order) and a per-bucket list
//! (lookup chain, walked comparing travel flags).  Unlink/relink is O(1),
//! exactly like the pointer lists it replaces, without the pointers.
//!
//! # Budget
//!
//! `sum(entry.size)` never exceeds `RouteConfig::max_cache_bytes` after a
//! build completes: the LRU tail is evicted until the newest entry fits.
//! The newest entry itself is never evicted, so a single entry larger
//! than the whole budget still works (and is evicted by the next build).
//!
//! # Determinism
//!
//! Relaxation visits incoming links in ascending link-id order and only
//! replaces a candidate on strictly smaller time, so equal-time ties keep
//! the first-discovered (lowest link index) choice.  Rebuilding an entry
//! after eviction reproduces it bit for bit.

use std::collections::VecDeque;

use tracing::{debug, trace};

use nav_core::{AreaId, ClusterId, TravelFlags, TravelTime};
use nav_graph::{ClusterRef, NavGraph};

use crate::error::{RouteError, RouteResult};

const NIL: u32 = u32::MAX;

// ── Config ────────────────────────────────────────────────────────────────────

/// Tunables for the routing cache.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteConfig {
    /// Upper bound on the summed byte size of all cache entries.
    pub max_cache_bytes: usize,
    /// Maximum number of area travel-time tables built per simulation
    /// frame.  A query that would exceed this returns
    /// [`RouteError::Deferred`]; tables already built for it are kept,
    /// so retries make progress.
    pub max_frame_builds: u32,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            max_cache_bytes: 4 * 1024 * 1024,
            max_frame_builds: 10,
        }
    }
}

// ── Arena slot ────────────────────────────────────────────────────────────────

struct CacheEntry {
    /// Owning cluster for area caches; `ClusterId::INVALID` marks a
    /// portal cache.
    cluster: ClusterId,
    goal_area: AreaId,
    flags: TravelFlags,
    /// Bucket this entry is chained into (index into `buckets`).
    bucket: u32,
    /// Byte size charged against the budget.
    size: usize,
    /// Last-access stamp; monotonically updated, drives nothing but
    /// debugging — eviction order is the LRU list itself.
    stamp: u64,
    /// Travel time to the goal, indexed by cluster-local area number
    /// (area cache) or portal number (portal cache).
    times: Vec<TravelTime>,
    /// Area-local index of the first link of the best path (area caches
    /// only; empty for portal caches).
    first_link: Vec<u8>,

    lru_prev: u32,
    lru_next: u32,
    bucket_prev: u32,
    bucket_next: u32,
}

impl CacheEntry {
    fn vacant() -> CacheEntry {
        CacheEntry {
            cluster: ClusterId::INVALID,
            goal_area: AreaId::INVALID,
            flags: TravelFlags::NONE,
            bucket: NIL,
            size: 0,
            stamp: 0,
            times: Vec::new(),
            first_link: Vec::new(),
            lru_prev: NIL,
            lru_next: NIL,
            bucket_prev: NIL,
            bucket_next: NIL,
        }
    }
}

// ── RoutingCache ──────────────────────────────────────────────────────────────

/// The bounded memo of travel-time tables for one [`NavGraph`].
///
/// Bucket layout is sized from the graph at construction, so a cache must
/// only ever be used with the graph it was created for.  Single-threaded
/// by design: the one execution thread owns it mutably; multi-threaded
/// agents must shard caches per thread or serialize access.
pub struct RoutingCache {
    config: RouteConfig,

    slots: Vec<CacheEntry>,
    free: Vec<u32>,

    /// Bucket chain heads: one bucket per `(cluster, local goal area)`
    /// for area caches, then one per goal area for portal caches.
    buckets: Vec<u32>,
    /// Prefix offsets of each cluster's area-bucket range.
    cluster_bucket_start: Vec<usize>,
    /// Offset of the portal-cache bucket range.
    portal_bucket_base: usize,

    lru_head: u32,
    lru_tail: u32,

    total_bytes: usize,
    stamp: u64,
    frame_builds: u32,
    evictions: u64,
}

impl RoutingCache {
    pub fn new(graph: &NavGraph, config: RouteConfig) -> Self {
        let mut cluster_bucket_start = Vec::with_capacity(graph.cluster_count() + 1);
        let mut offset = 0usize;
        for c in 0..graph.cluster_count() {
            cluster_bucket_start.push(offset);
            if let Some(cl) = graph.cluster(ClusterId(c as u32)) {
                offset += cl.num_areas as usize;
            }
        }
        cluster_bucket_start.push(offset);
        let portal_bucket_base = offset;
        let buckets = vec![NIL; offset + graph.area_count()];

        Self {
            config,
            slots: Vec::new(),
            free: Vec::new(),
            buckets,
            cluster_bucket_start,
            portal_bucket_base,
            lru_head: NIL,
            lru_tail: NIL,
            total_bytes: 0,
            stamp: 0,
            frame_builds: 0,
            evictions: 0,
        }
    }

    // ── Frame and stats surface ───────────────────────────────────────────

    /// Reset the per-frame build counter.  Call once per simulation frame.
    pub fn begin_frame(&mut self) {
        self.frame_builds = 0;
    }

    /// Summed byte size of all live entries; held at or under the budget
    /// whenever the budget fits at least one entry.
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    /// Number of live cache entries.
    pub fn entry_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Entries evicted since construction.
    pub fn eviction_count(&self) -> u64 {
        self.evictions
    }

    /// `true` if the area cache for this key is currently resident.
    /// A pure probe: does not touch LRU order and never builds.
    pub fn contains_area_cache(
        &self,
        graph: &NavGraph,
        cluster: ClusterId,
        goal: AreaId,
        flags: TravelFlags,
    ) -> bool {
        match graph.cluster_area_num(cluster, goal) {
            Some(local) => {
                let bucket = self.area_bucket(cluster, local);
                self.probe(bucket, cluster, goal, flags).is_some()
            }
            None => false,
        }
    }

    // ── Invalidation ──────────────────────────────────────────────────────

    /// Drop every cache entry (level unload, travel-flags universe change).
    pub fn invalidate_all(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.buckets.fill(NIL);
        self.lru_head = NIL;
        self.lru_tail = NIL;
        self.total_bytes = 0;
        debug!("routing cache invalidated");
    }

    /// Drop the caches that could reference `area`: all area caches of the
    /// cluster(s) it belongs to, and all portal caches (which are built on
    /// top of area caches from arbitrary clusters).
    pub fn invalidate_area(&mut self, graph: &NavGraph, area: AreaId) {
        let clusters: Vec<ClusterId> = match graph.cluster_of(area) {
            Some(ClusterRef::Cluster(c)) => vec![c],
            Some(ClusterRef::Portal(p)) => match graph.portal(p) {
                Some(portal) => vec![portal.front_cluster, portal.back_cluster],
                None => return,
            },
            None => return,
        };
        let mut freed = 0usize;
        for c in clusters {
            let start = self.cluster_bucket_start[c.index()];
            let end = self.cluster_bucket_start[c.index() + 1];
            for bucket in start..end {
                freed += self.free_bucket(bucket as u32);
            }
        }
        for a in 0..graph.area_count() {
            freed += self.free_bucket((self.portal_bucket_base + a) as u32);
        }
        debug!(%area, freed, "invalidated routing caches touching area");
    }

    // ── Lookup / build ────────────────────────────────────────────────────

    /// Area cache for `(cluster, goal, flags)`, building it on miss.
    pub(crate) fn area_cache(
        &mut self,
        graph: &NavGraph,
        cluster: ClusterId,
        goal: AreaId,
        flags: TravelFlags,
    ) -> RouteResult<u32> {
        let local_goal = graph
            .cluster_area_num(cluster, goal)
            .ok_or(RouteError::InvalidArea(goal))?;
        let bucket = self.area_bucket(cluster, local_goal);

        if let Some(slot) = self.probe(bucket, cluster, goal, flags) {
            self.touch(slot);
            return Ok(slot);
        }

        if self.frame_builds >= self.config.max_frame_builds {
            return Err(RouteError::Deferred);
        }
        self.frame_builds += 1;

        let (times, first_link) = build_area_table(graph, cluster, goal, flags);
        let slot = self.insert(cluster, goal, flags, bucket, times, first_link);
        debug!(
            %cluster,
            %goal,
            flags = flags.0,
            bytes = self.slots[slot as usize].size,
            "built area routing cache"
        );
        self.evict_over_budget(slot);
        Ok(slot)
    }

    /// Portal cache for `(goal, flags)`, building it on miss.
    ///
    /// Only the area tables it pulls in count against the frame budget;
    /// the coarse-graph pass itself is a scan over cached lookups.  A
    /// `Deferred` mid-way keeps the area tables already built, so a query
    /// retried across frames completes one build per frame.
    pub(crate) fn portal_cache(
        &mut self,
        graph: &NavGraph,
        goal: AreaId,
        flags: TravelFlags,
    ) -> RouteResult<u32> {
        if goal.index() >= graph.area_count() {
            return Err(RouteError::InvalidArea(goal));
        }
        let bucket = (self.portal_bucket_base + goal.index()) as u32;

        if let Some(slot) = self.probe(bucket, ClusterId::INVALID, goal, flags) {
            self.touch(slot);
            return Ok(slot);
        }

        let times = self.build_portal_table(graph, goal, flags)?;
        let slot = self.insert(ClusterId::INVALID, goal, flags, bucket, times, Vec::new());
        debug!(
            %goal,
            flags = flags.0,
            bytes = self.slots[slot as usize].size,
            "built portal routing cache"
        );
        self.evict_over_budget(slot);
        Ok(slot)
    }

    /// Travel-time table of a live entry.
    pub(crate) fn times(&self, slot: u32) -> &[TravelTime] {
        &self.slots[slot as usize].times
    }

    /// First-link table of a live area-cache entry.
    pub(crate) fn first_links(&self, slot: u32) -> &[u8] {
        &self.slots[slot as usize].first_link
    }

    // ── Portal-table construction ─────────────────────────────────────────

    /// Best time from every portal's area to `goal`.
    ///
    /// FIFO label-correcting over the coarse portal graph.  Each update is
    /// a `(cluster, area, time-so-far)` triple: the area cache of that
    /// cluster toward `area` yields exact local times from the cluster's
    /// portals, and crossing onward through a portal adds its
    /// `max_travel_time`.  Improvements are re-queued; stale queue entries
    /// fail the strictly-smaller test and die out.
    fn build_portal_table(
        &mut self,
        graph: &NavGraph,
        goal: AreaId,
        flags: TravelFlags,
    ) -> RouteResult<Vec<TravelTime>> {
        let mut times = vec![TravelTime::UNREACHABLE; graph.portal_count()];

        let mut queue: VecDeque<(ClusterId, AreaId, TravelTime)> = VecDeque::new();
        match graph.cluster_of(goal) {
            Some(ClusterRef::Cluster(c)) => queue.push_back((c, goal, TravelTime::ZERO)),
            Some(ClusterRef::Portal(p)) => {
                // A goal that is itself a portal belongs to both clusters.
                let portal = graph.portal(p).ok_or(RouteError::InvalidArea(goal))?;
                queue.push_back((portal.front_cluster, goal, TravelTime::ZERO));
                queue.push_back((portal.back_cluster, goal, TravelTime::ZERO));
            }
            None => return Err(RouteError::InvalidArea(goal)),
        }

        while let Some((cluster, area, base_time)) = queue.pop_front() {
            let slot = self.area_cache(graph, cluster, area, flags)?;
            for &pnum in graph.portals_of_cluster(cluster) {
                let Some(portal) = graph.portal(pnum) else { continue };
                let Some(p_local) = graph.cluster_area_num(cluster, portal.area) else {
                    continue;
                };
                let local_times = self.times(slot);
                if p_local as usize >= local_times.len() {
                    continue;
                }
                let t_local = local_times[p_local as usize];
                if !t_local.is_reachable() {
                    continue;
                }
                let t = base_time.saturating_add(t_local);
                if t < times[pnum.index()] {
                    times[pnum.index()] = t;
                    let next_cluster = if portal.front_cluster == cluster {
                        portal.back_cluster
                    } else {
                        portal.front_cluster
                    };
                    queue.push_back((
                        next_cluster,
                        portal.area,
                        t.saturating_add(portal.max_travel_time),
                    ));
                }
            }
        }
        Ok(times)
    }

    // ── Arena plumbing ────────────────────────────────────────────────────

    fn area_bucket(&self, cluster: ClusterId, local_goal: u32) -> u32 {
        (self.cluster_bucket_start[cluster.index()] + local_goal as usize) as u32
    }

    fn probe(
        &self,
        bucket: u32,
        cluster: ClusterId,
        goal: AreaId,
        flags: TravelFlags,
    ) -> Option<u32> {
        let mut slot = self.buckets[bucket as usize];
        while slot != NIL {
            let e = &self.slots[slot as usize];
            if e.cluster == cluster && e.goal_area == goal && e.flags == flags {
                return Some(slot);
            }
            slot = e.bucket_next;
        }
        None
    }

    fn insert(
        &mut self,
        cluster: ClusterId,
        goal: AreaId,
        flags: TravelFlags,
        bucket: u32,
        times: Vec<TravelTime>,
        first_link: Vec<u8>,
    ) -> u32 {
        let size = std::mem::size_of::<CacheEntry>()
            + times.len() * std::mem::size_of::<TravelTime>()
            + first_link.len();

        let slot = match self.free.pop() {
            Some(s) => s,
            None => {
                self.slots.push(CacheEntry::vacant());
                (self.slots.len() - 1) as u32
            }
        };

        self.stamp += 1;
        let e = &mut self.slots[slot as usize];
        e.cluster = cluster;
        e.goal_area = goal;
        e.flags = flags;
        e.bucket = bucket;
        e.size = size;
        e.stamp = self.stamp;
        e.times = times;
        e.first_link = first_link;

        self.bucket_link_front(slot, bucket);
        self.lru_link_front(slot);
        self.total_bytes += size;
        slot
    }

    /// Move a hit entry to the LRU head and refresh its access stamp.
    fn touch(&mut self, slot: u32) {
        self.stamp += 1;
        self.slots[slot as usize].stamp = self.stamp;
        self.lru_unlink(slot);
        self.lru_link_front(slot);
    }

    /// Evict from the LRU tail until the budget holds.  `protect` (the
    /// entry just built) is never evicted.
    fn evict_over_budget(&mut self, protect: u32) {
        while self.total_bytes > self.config.max_cache_bytes {
            let victim = self.lru_tail;
            if victim == NIL || victim == protect {
                break;
            }
            trace!(
                goal = %self.slots[victim as usize].goal_area,
                bytes = self.slots[victim as usize].size,
                "evicting routing cache entry"
            );
            self.free_slot(victim);
            self.evictions += 1;
        }
    }

    /// Free every entry chained in `bucket`; returns how many.
    fn free_bucket(&mut self, bucket: u32) -> usize {
        let mut freed = 0;
        let mut slot = self.buckets[bucket as usize];
        while slot != NIL {
            let next = self.slots[slot as usize].bucket_next;
            self.free_slot(slot);
            freed += 1;
            slot = next;
        }
        freed
    }

    fn free_slot(&mut self, slot: u32) {
        self.bucket_unlink(slot);
        self.lru_unlink(slot);
        let e = &mut self.slots[slot as usize];
        self.total_bytes -= e.size;
        e.size = 0;
        e.times = Vec::new();
        e.first_link = Vec::new();
        e.cluster = ClusterId::INVALID;
        e.goal_area = AreaId::INVALID;
        self.free.push(slot);
    }

    // ── Intrusive list operations ─────────────────────────────────────────

    fn lru_link_front(&mut self, slot: u32) {
        let old_head = self.lru_head;
        {
            let e = &mut self.slots[slot as usize];
            e.lru_prev = NIL;
            e.lru_next = old_head;
        }
        if old_head != NIL {
            self.slots[old_head as usize].lru_prev = slot;
        }
        self.lru_head = slot;
        if self.lru_tail == NIL {
            self.lru_tail = slot;
        }
    }

    fn lru_unlink(&mut self, slot: u32) {
        let (prev, next) = {
            let e = &self.slots[slot as usize];
            (e.lru_prev, e.lru_next)
        };
        if prev != NIL {
            self.slots[prev as usize].lru_next = next;
        } else if self.lru_head == slot {
            self.lru_head = next;
        }
        if next != NIL {
            self.slots[next as usize].lru_prev = prev;
        } else if self.lru_tail == slot {
            self.lru_tail = prev;
        }
        let e = &mut self.slots[slot as usize];
        e.lru_prev = NIL;
        e.lru_next = NIL;
    }

    fn bucket_link_front(&mut self, slot: u32, bucket: u32) {
        let old_head = self.buckets[bucket as usize];
        {
            let e = &mut self.slots[slot as usize];
            e.bucket_prev = NIL;
            e.bucket_next = old_head;
        }
        if old_head != NIL {
            self.slots[old_head as usize].bucket_prev = slot;
        }
        self.buckets[bucket as usize] = slot;
    }

    fn bucket_unlink(&mut self, slot: u32) {
        let (prev, next, bucket) = {
            let e = &self.slots[slot as usize];
            (e.bucket_prev, e.bucket_next, e.bucket)
        };
        if prev != NIL {
            self.slots[prev as usize].bucket_next = next;
        } else if bucket != NIL && self.buckets[bucket as usize] == slot {
            self.buckets[bucket as usize] = next;
        }
        if next != NIL {
            self.slots[next as usize].bucket_prev = prev;
        }
        let e = &mut self.slots[slot as usize];
        e.bucket_prev = NIL;
        e.bucket_next = NIL;
        e.bucket = NIL;
    }
}

// ── Area-table construction ───────────────────────────────────────────────────

/// Best time from every area of `cluster` to `goal`, and the area-local
/// index of the outgoing link starting each best path.
///
/// FIFO label-correcting seeded at the goal, relaxing backward over the
/// reversed-reachability index.  A link is usable when the query flags
/// contain its travel-type bit; an intermediate area is enterable when the
/// flags contain its content requirement.  Each step's weight is the link's
/// travel time plus the estimated crossing of the source area from its
/// center to the link's start point.
fn build_area_table(
    graph: &NavGraph,
    cluster: ClusterId,
    goal: AreaId,
    flags: TravelFlags,
) -> (Vec<TravelTime>, Vec<u8>) {
    let n = graph
        .cluster(cluster)
        .map(|c| c.num_reach_areas as usize)
        .unwrap_or(0);
    let mut times = vec![TravelTime::UNREACHABLE; n];
    let mut first_link = vec![0u8; n];

    let goal_local = match graph.cluster_area_num(cluster, goal) {
        Some(l) if (l as usize) < n => l as usize,
        _ => return (times, first_link),
    };
    times[goal_local] = TravelTime::ZERO;

    let mut in_queue = vec![false; graph.area_count()];
    let mut queue: VecDeque<AreaId> = VecDeque::new();
    queue.push_back(goal);
    in_queue[goal.index()] = true;

    while let Some(area) = queue.pop_front() {
        in_queue[area.index()] = false;
        // Membership is guaranteed: only in-cluster areas are enqueued.
        let Some(area_local) = graph.cluster_area_num(cluster, area) else { continue };
        if area_local as usize >= n {
            continue;
        }
        let t_area = times[area_local as usize];

        for rev in graph.reverse_reachabilities_of(area) {
            let source = rev.source;
            let Some(src_local) = graph.cluster_area_num(cluster, source) else {
                continue; // outside this cluster
            };
            if src_local as usize >= n {
                continue;
            }
            let Some(link) = graph.link(rev.link) else { continue };
            if !flags.contains(link.travel_type.flag()) {
                continue;
            }
            // The path occupies `source` before taking the link; its
            // contents must be admissible (the goal itself is exempt —
            // it is never a relaxation source of its own table entry).
            if source != goal && !flags.contains(graph.area_travel_flags(source)) {
                continue;
            }
            let crossing = match graph.area(source) {
                Some(a) => graph.area_travel_time(source, a.center, link.start),
                None => continue,
            };
            let t = t_area
                .saturating_add(link.travel_time)
                .saturating_add(crossing);
            if t < times[src_local as usize] {
                times[src_local as usize] = t;
                let base = graph
                    .area_settings(source)
                    .map(|s| s.first_link)
                    .unwrap_or(0);
                first_link[src_local as usize] = (rev.link.0 - base) as u8;
                if !in_queue[source.index()] {
                    queue.push_back(source);
                    in_queue[source.index()] = true;
                }
            }
        }
    }
    (times, first_link)
}
