//! Programmatic graph construction.
//!
//! The offline level compiler is the normal producer of navigation files,
//! but tests and tools need graphs without a compiled level on hand.
//! `NavGraphBuilder` accepts areas, links, portals, and an optional BSP
//! tree in any order; [`build`](NavGraphBuilder::build) derives the
//! cluster-local numbering, the portal index, and everything
//! [`NavGraph`] computes at load time, running the same validation as the
//! file loader.
//!
//! # Example
//!
//! ```
//! use nav_core::{Bounds3, TravelTime, TravelType, Vec3};
//! use nav_graph::{AreaSpec, NavGraphBuilder};
//!
//! let mut b = NavGraphBuilder::new();
//! let c = b.add_cluster();
//! let a0 = b.add_area(Bounds3::new(Vec3::ZERO, Vec3::new(64.0, 64.0, 64.0)), AreaSpec::default());
//! let a1 = b.add_area(Bounds3::new(Vec3::new(64.0, 0.0, 0.0), Vec3::new(128.0, 64.0, 64.0)), AreaSpec::default());
//! b.assign_cluster(a0, c);
//! b.assign_cluster(a1, c);
//! b.add_link(a0, a1, TravelType::Walk, TravelTime(100), Vec3::new(60.0, 32.0, 0.0), Vec3::new(68.0, 32.0, 0.0));
//! let graph = b.build().unwrap();
//! assert_eq!(graph.area_count(), 2);
//! ```

use nav_core::{
    AreaContents, AreaFlags, AreaId, Bounds3, ClusterId, NodeId, PortalId, Presence, TravelTime,
    TravelType, Vec3,
};

use crate::error::{GraphError, GraphResult};
use crate::graph::{
    Area, AreaSettings, BspNode, Cluster, ClusterRef, HullBox, NavGraph, Plane, Portal, RawGraph,
    Reachability,
};

/// Non-spatial attributes of an area under construction.
#[derive(Copy, Clone, Debug, Default)]
pub struct AreaSpec {
    pub contents: AreaContents,
    pub flags: AreaFlags,
    pub presence: Presence,
}

impl AreaSpec {
    /// A flooded area: water contents, liquid flag, swim presence.
    pub fn water() -> AreaSpec {
        AreaSpec {
            contents: AreaContents::WATER,
            flags: AreaFlags::LIQUID,
            presence: Presence::Swim,
        }
    }
}

/// Child slot of a builder-supplied BSP node.
#[derive(Copy, Clone, Debug)]
pub enum NodeChild {
    /// Descend into another node.  The root (first node added) cannot be
    /// a child.
    Node(NodeId),
    /// Solid geometry / outside the world.
    Solid,
    /// The walk terminates in this area.
    Area(AreaId),
}

struct PendingArea {
    bounds: Bounds3,
    spec: AreaSpec,
    cluster: Option<ClusterId>,
    portal: Option<PortalId>,
}

struct PendingPortal {
    area: AreaId,
    front: ClusterId,
    back: ClusterId,
    max_travel_time: TravelTime,
}

/// Construct a [`NavGraph`] incrementally, then call [`build`](Self::build).
#[derive(Default)]
pub struct NavGraphBuilder {
    hull_boxes: Vec<HullBox>,
    planes: Vec<Plane>,
    nodes: Vec<(u32, [NodeChild; 2])>,
    areas: Vec<PendingArea>,
    links: Vec<Reachability>,
    portals: Vec<PendingPortal>,
    num_clusters: u32,
}

impl NavGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a new cluster and return its id (sequential from 0).
    pub fn add_cluster(&mut self) -> ClusterId {
        let id = ClusterId(self.num_clusters);
        self.num_clusters += 1;
        id
    }

    /// Add an area with the given bounding box; its center is the box
    /// center.  Assign it to a cluster with [`assign_cluster`] or make it
    /// a portal with [`add_portal`] before building.
    pub fn add_area(&mut self, bounds: Bounds3, spec: AreaSpec) -> AreaId {
        let id = AreaId(self.areas.len() as u32);
        self.areas.push(PendingArea { bounds, spec, cluster: None, portal: None });
        id
    }

    /// Put `area` in `cluster`.
    pub fn assign_cluster(&mut self, area: AreaId, cluster: ClusterId) {
        self.areas[area.index()].cluster = Some(cluster);
    }

    /// Turn `area` into the portal joining `front` and `back`.
    /// `max_travel_time` is the coarse-graph crossing weight.
    pub fn add_portal(
        &mut self,
        area: AreaId,
        front: ClusterId,
        back: ClusterId,
        max_travel_time: TravelTime,
    ) -> PortalId {
        let id = PortalId(self.portals.len() as u32);
        self.portals.push(PendingPortal { area, front, back, max_travel_time });
        self.areas[area.index()].portal = Some(id);
        self.areas[area.index()].spec.contents =
            self.areas[area.index()].spec.contents | AreaContents::CLUSTER_PORTAL;
        id
    }

    /// Add a directed reachability link.
    ///
    /// Final link ids are assigned at build time, grouped by source area
    /// in insertion order; look links up through
    /// [`NavGraph::reachabilities_of`] afterwards.
    pub fn add_link(
        &mut self,
        from: AreaId,
        to: AreaId,
        travel_type: TravelType,
        travel_time: TravelTime,
        start: Vec3,
        end: Vec3,
    ) {
        self.links.push(Reachability {
            from_area: from,
            to_area: to,
            travel_type,
            travel_time,
            start,
            end,
        });
    }

    /// Convenience: a symmetric pair of links with mirrored endpoints.
    pub fn add_link_pair(
        &mut self,
        a: AreaId,
        b: AreaId,
        travel_type: TravelType,
        travel_time: TravelTime,
        a_point: Vec3,
        b_point: Vec3,
    ) {
        self.add_link(a, b, travel_type, travel_time, a_point, b_point);
        self.add_link(b, a, travel_type, travel_time, b_point, a_point);
    }

    /// Add a splitting plane for the BSP tree; returns its index.
    pub fn add_plane(&mut self, normal: Vec3, dist: f32) -> u32 {
        self.planes.push(Plane { normal, dist });
        (self.planes.len() - 1) as u32
    }

    /// Add a BSP node over `plane` with `[front, back]` children.  The
    /// first node added is the root the point walk starts from.
    pub fn add_node(&mut self, plane: u32, children: [NodeChild; 2]) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push((plane, children));
        id
    }

    /// Add an agent hull box (bounding-boxes lump).
    pub fn add_hull_box(&mut self, presence: Presence, bounds: Bounds3) {
        self.hull_boxes.push(HullBox { presence, bounds });
    }

    /// Consume the builder and produce a validated [`NavGraph`].
    pub fn build(self) -> GraphResult<NavGraph> {
        let num_areas = self.areas.len();

        // Group links by source area; stable sort preserves insertion
        // order within an area, which fixes the link-id tie-break order.
        let mut links = self.links;
        links.sort_by_key(|l| l.from_area);

        let mut first_link = vec![0u32; num_areas];
        let mut num_links = vec![0u32; num_areas];
        for (i, l) in links.iter().enumerate() {
            if l.from_area.index() >= num_areas {
                return Err(GraphError::Format(format!(
                    "link {i} leaves unknown area {}",
                    l.from_area
                )));
            }
            if num_links[l.from_area.index()] == 0 {
                first_link[l.from_area.index()] = i as u32;
            }
            num_links[l.from_area.index()] += 1;
        }

        // ── Portals ───────────────────────────────────────────────────────
        let mut portals: Vec<Portal> = self
            .portals
            .iter()
            .map(|p| Portal {
                area: p.area,
                front_cluster: p.front,
                back_cluster: p.back,
                cluster_area_num: [0, 0],
                max_travel_time: p.max_travel_time,
            })
            .collect();

        // ── Cluster-local numbering and the portal index ──────────────────
        // Per cluster: own areas ascending by id, then bordering portals
        // ascending by portal id.
        let mut cluster_area_num = vec![0u32; num_areas];
        let mut clusters = Vec::with_capacity(self.num_clusters as usize);
        let mut portal_index = Vec::new();

        for c in 0..self.num_clusters {
            let cluster = ClusterId(c);
            let mut next = 0u32;
            for (aid, pending) in self.areas.iter().enumerate() {
                if pending.cluster == Some(cluster) {
                    cluster_area_num[aid] = next;
                    next += 1;
                }
            }
            let first_portal = portal_index.len() as u32;
            for (pid, portal) in portals.iter_mut().enumerate() {
                let side = if portal.front_cluster == cluster {
                    0
                } else if portal.back_cluster == cluster {
                    1
                } else {
                    continue;
                };
                portal.cluster_area_num[side] = next;
                next += 1;
                portal_index.push(PortalId(pid as u32));
            }
            clusters.push(Cluster {
                num_areas: next,
                num_reach_areas: next,
                first_portal,
                num_portals: portal_index.len() as u32 - first_portal,
            });
        }

        // ── Area settings ─────────────────────────────────────────────────
        let mut settings = Vec::with_capacity(num_areas);
        let mut areas = Vec::with_capacity(num_areas);
        for (aid, pending) in self.areas.iter().enumerate() {
            let cluster = match (pending.cluster, pending.portal) {
                (None, Some(p)) => ClusterRef::Portal(p),
                (Some(c), None) => ClusterRef::Cluster(c),
                (None, None) => {
                    return Err(GraphError::Format(format!(
                        "area {aid} has no cluster and is not a portal"
                    )));
                }
                (Some(_), Some(_)) => {
                    return Err(GraphError::Format(format!(
                        "area {aid} is both clustered and a portal"
                    )));
                }
            };
            settings.push(AreaSettings {
                contents: pending.spec.contents,
                flags: pending.spec.flags,
                presence: pending.spec.presence,
                cluster,
                cluster_area_num: cluster_area_num[aid],
                first_link: first_link[aid],
                num_links: num_links[aid],
            });
            areas.push(Area {
                first_face: 0,
                num_faces: 0,
                bounds: pending.bounds,
                center: pending.bounds.center(),
            });
        }

        // ── BSP nodes ─────────────────────────────────────────────────────
        let mut nodes = Vec::with_capacity(self.nodes.len());
        for (i, (plane, children)) in self.nodes.iter().enumerate() {
            let mut encoded = [0i32; 2];
            for (slot, child) in children.iter().enumerate() {
                encoded[slot] = match *child {
                    NodeChild::Node(n) => {
                        if n.0 == 0 {
                            return Err(GraphError::Format(format!(
                                "node {i} references the root as a child"
                            )));
                        }
                        n.0 as i32
                    }
                    NodeChild::Solid => 0,
                    NodeChild::Area(a) => -(a.0 as i32 + 1),
                };
            }
            nodes.push(BspNode { plane: *plane, children: encoded });
        }

        NavGraph::assemble(RawGraph {
            hull_boxes: self.hull_boxes,
            vertices: Vec::new(),
            planes: self.planes,
            edges: Vec::new(),
            edge_index: Vec::new(),
            faces: Vec::new(),
            face_index: Vec::new(),
            areas,
            settings,
            links,
            nodes,
            portals,
            portal_index,
            clusters,
        })
    }
}
