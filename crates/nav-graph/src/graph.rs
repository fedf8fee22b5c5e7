//! The static navigation graph and its query surface.
//!
//! # Data layout
//!
//! All record arrays are flat `Vec`s indexed by the typed ids from
//! `nav-core`.  Per-area collections (reachability links, reversed links)
//! use **Compressed Sparse Row (CSR)** slices: the links leaving area `a`
//! occupy `links[settings[a].first_link .. + num_links]`, so enumeration is
//! a contiguous memory scan with no per-query allocation.
//!
//! # Immutability
//!
//! A `NavGraph` is built once — from a binary file via
//! [`NavGraph::from_bytes`](crate::file) or programmatically via
//! [`NavGraphBuilder`](crate::builder) — and is read-only thereafter.  The
//! routing layer keeps all mutable state (caches) on its own side.

use rstar::{RTree, RTreeObject, AABB};
use tracing::info;

use nav_core::{
    AreaContents, AreaFlags, AreaId, Bounds3, ClusterId, LinkId, NodeId, PortalId, Presence,
    TravelFlags, TravelTime, TravelType, Vec3,
};

use crate::error::{GraphError, GraphResult};

// ── Records ───────────────────────────────────────────────────────────────────

/// A hull bounding box from the bounding-boxes lump (agent presence hulls).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HullBox {
    pub presence: Presence,
    pub bounds: Bounds3,
}

/// A splitting plane, shared by faces and BSP nodes.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Plane {
    pub normal: Vec3,
    pub dist: f32,
}

impl Plane {
    /// `true` if `p` is on the front (normal) side of the plane.
    #[inline]
    pub fn front_side(&self, p: Vec3) -> bool {
        self.normal.dot(p) - self.dist > 0.0
    }
}

/// A polygonal boundary face of an area.
///
/// `front_area`/`back_area` are `AreaId::INVALID` where the face borders
/// solid geometry instead of another area.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Face {
    pub plane: u32,
    pub flags: u32,
    pub first_edge: u32,
    pub num_edges: u32,
    pub front_area: AreaId,
    pub back_area: AreaId,
}

/// A convex traversable region — the graph's vertex granularity.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Area {
    pub first_face: u32,
    pub num_faces: u32,
    pub bounds: Bounds3,
    pub center: Vec3,
}

/// Per-area settings from the area-settings lump.
///
/// `cluster` is the routing-side classification: either the cluster the
/// area belongs to, or the portal the area *is* (see [`ClusterRef`]).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AreaSettings {
    pub contents: AreaContents,
    pub flags: AreaFlags,
    pub presence: Presence,
    pub cluster: ClusterRef,
    /// Index of the area within its cluster's travel-time tables.
    /// Meaningless (zero) for portal areas — portals carry one per side.
    pub cluster_area_num: u32,
    pub first_link: u32,
    pub num_links: u32,
}

/// Routing-side classification of an area.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ClusterRef {
    /// The area belongs to this cluster.
    Cluster(ClusterId),
    /// The area is itself a cluster portal.
    Portal(PortalId),
}

/// A directed reachability link: the agent can move `from_area → to_area`
/// using `travel_type`, departing near `start` and arriving near `end`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reachability {
    pub from_area: AreaId,
    pub to_area: AreaId,
    pub travel_type: TravelType,
    pub travel_time: TravelTime,
    pub start: Vec3,
    pub end: Vec3,
}

/// A node of the point-location BSP tree.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BspNode {
    pub plane: u32,
    /// `[front, back]` children.  Positive: index of the next node.
    /// Zero: solid / out of world.  Negative `c`: area id `-(c + 1)`.
    pub children: [i32; 2],
}

/// A boundary area joining exactly two clusters.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Portal {
    pub area: AreaId,
    pub front_cluster: ClusterId,
    pub back_cluster: ClusterId,
    /// The portal area's index in the travel-time tables of
    /// `[front_cluster, back_cluster]` respectively.
    pub cluster_area_num: [u32; 2],
    /// Precomputed upper bound on the time to cross the portal area —
    /// the coarse-graph edge weight between its two clusters.
    pub max_travel_time: TravelTime,
}

/// A partition of areas used for hierarchical search.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cluster {
    /// Areas in this cluster, bordering portals included.
    pub num_areas: u32,
    /// Leading slice of the cluster-local numbering that can appear in
    /// travel-time tables (areas with reachability).
    pub num_reach_areas: u32,
    /// Slice into the shared portal-index array.
    pub first_portal: u32,
    pub num_portals: u32,
}

/// One entry of the reversed-reachability index: `link` terminates in the
/// indexed area and leaves from `source`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RevLink {
    pub source: AreaId,
    pub link: LinkId,
}

// ── R-tree entry ──────────────────────────────────────────────────────────────

/// Entry stored in the R-tree spatial index: an area's bounding box.
#[derive(Clone)]
struct AreaEntry {
    mins: [f32; 3],
    maxs: [f32; 3],
    id: AreaId,
}

impl RTreeObject for AreaEntry {
    type Envelope = AABB<[f32; 3]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.mins, self.maxs)
    }
}

// ── RawGraph ──────────────────────────────────────────────────────────────────

/// Unvalidated record arrays, as produced by the file reader or the builder.
///
/// [`NavGraph::assemble`] consumes one of these, cross-validates every
/// reference, and derives the reversed index and spatial index.
#[derive(Default)]
pub(crate) struct RawGraph {
    pub hull_boxes: Vec<HullBox>,
    pub vertices: Vec<Vec3>,
    pub planes: Vec<Plane>,
    pub edges: Vec<[u32; 2]>,
    pub edge_index: Vec<i32>,
    pub faces: Vec<Face>,
    pub face_index: Vec<i32>,
    pub areas: Vec<Area>,
    pub settings: Vec<AreaSettings>,
    pub links: Vec<Reachability>,
    pub nodes: Vec<BspNode>,
    pub portals: Vec<Portal>,
    pub portal_index: Vec<PortalId>,
    pub clusters: Vec<Cluster>,
}

// ── NavGraph ──────────────────────────────────────────────────────────────────

/// The loaded-once, read-only navigation graph.
///
/// Pass a `&NavGraph` to every routing call — there is deliberately no
/// global instance.  Multiple worlds keep theirs in a
/// [`GraphRegistry`](crate::registry::GraphRegistry).
pub struct NavGraph {
    pub(crate) hull_boxes: Vec<HullBox>,
    pub(crate) vertices: Vec<Vec3>,
    pub(crate) planes: Vec<Plane>,
    pub(crate) edges: Vec<[u32; 2]>,
    pub(crate) edge_index: Vec<i32>,
    pub(crate) faces: Vec<Face>,
    pub(crate) face_index: Vec<i32>,
    pub(crate) areas: Vec<Area>,
    pub(crate) settings: Vec<AreaSettings>,
    pub(crate) links: Vec<Reachability>,
    pub(crate) nodes: Vec<BspNode>,
    pub(crate) portals: Vec<Portal>,
    pub(crate) portal_index: Vec<PortalId>,
    pub(crate) clusters: Vec<Cluster>,

    // ── Derived at assembly ───────────────────────────────────────────────
    /// CSR row pointer: reversed links into area `a` are
    /// `rev_links[rev_start[a] .. rev_start[a + 1]]`.
    rev_start: Vec<u32>,
    rev_links: Vec<RevLink>,
    spatial_idx: RTree<AreaEntry>,
}

impl NavGraph {
    // ── Dimensions ────────────────────────────────────────────────────────

    pub fn area_count(&self) -> usize {
        self.areas.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    pub fn portal_count(&self) -> usize {
        self.portals.len()
    }

    // ── Record access ─────────────────────────────────────────────────────

    pub fn area(&self, area: AreaId) -> Option<&Area> {
        self.areas.get(area.index())
    }

    pub fn area_settings(&self, area: AreaId) -> Option<&AreaSettings> {
        self.settings.get(area.index())
    }

    pub fn link(&self, link: LinkId) -> Option<&Reachability> {
        self.links.get(link.index())
    }

    pub fn portal(&self, portal: PortalId) -> Option<&Portal> {
        self.portals.get(portal.index())
    }

    pub fn cluster(&self, cluster: ClusterId) -> Option<&Cluster> {
        self.clusters.get(cluster.index())
    }

    pub fn hull_boxes(&self) -> &[HullBox] {
        &self.hull_boxes
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// Area containing `point`, via the BSP node tree.  `None` means the
    /// point is in solid geometry or outside the world.
    ///
    /// Graphs built without a node tree (synthetic test graphs) fall back
    /// to a bounding-box probe, taking the lowest matching area id.
    pub fn area_for_point(&self, point: Vec3) -> Option<AreaId> {
        if self.nodes.is_empty() {
            let p = [point.x, point.y, point.z];
            return self
                .spatial_idx
                .locate_in_envelope_intersecting(&AABB::from_corners(p, p))
                .filter(|e| self.areas[e.id.index()].bounds.contains(point))
                .map(|e| e.id)
                .min();
        }
        let mut node = 0usize;
        loop {
            let n = &self.nodes[node];
            let plane = &self.planes[n.plane as usize];
            let side = if plane.front_side(point) { 0 } else { 1 };
            match n.children[side] {
                c if c > 0 => node = c as usize,
                0 => return None,
                c => return Some(AreaId((-(c + 1)) as u32)),
            }
        }
    }

    /// All areas whose bounding boxes overlap the given box, ascending by id.
    pub fn areas_in_box(&self, bounds: Bounds3) -> Vec<AreaId> {
        let envelope = AABB::from_corners(
            [bounds.mins.x, bounds.mins.y, bounds.mins.z],
            [bounds.maxs.x, bounds.maxs.y, bounds.maxs.z],
        );
        let mut out: Vec<AreaId> = self
            .spatial_idx
            .locate_in_envelope_intersecting(&envelope)
            .map(|e| e.id)
            .collect();
        out.sort_unstable();
        out
    }

    // ── Reachability enumeration ──────────────────────────────────────────

    /// Links leaving `area` — an O(1) contiguous slice.
    pub fn reachabilities_of(&self, area: AreaId) -> &[Reachability] {
        match self.settings.get(area.index()) {
            Some(s) => {
                let start = s.first_link as usize;
                &self.links[start..start + s.num_links as usize]
            }
            None => &[],
        }
    }

    /// Links arriving in `area`, from the reversed index built at load.
    pub fn reverse_reachabilities_of(&self, area: AreaId) -> &[RevLink] {
        if area.index() + 1 >= self.rev_start.len() {
            return &[];
        }
        let start = self.rev_start[area.index()] as usize;
        let end = self.rev_start[area.index() + 1] as usize;
        &self.rev_links[start..end]
    }

    // ── Cluster membership ────────────────────────────────────────────────

    /// Cluster-or-portal classification of `area`.
    pub fn cluster_of(&self, area: AreaId) -> Option<ClusterRef> {
        self.settings.get(area.index()).map(|s| s.cluster)
    }

    /// The area's index within `cluster`'s travel-time tables.
    ///
    /// Portal areas resolve through whichever of their two sides matches,
    /// so a portal is a member of both adjacent clusters for routing.
    pub fn cluster_area_num(&self, cluster: ClusterId, area: AreaId) -> Option<u32> {
        match self.cluster_of(area)? {
            ClusterRef::Cluster(c) if c == cluster => {
                Some(self.settings[area.index()].cluster_area_num)
            }
            ClusterRef::Cluster(_) => None,
            ClusterRef::Portal(p) => {
                let portal = &self.portals[p.index()];
                if portal.front_cluster == cluster {
                    Some(portal.cluster_area_num[0])
                } else if portal.back_cluster == cluster {
                    Some(portal.cluster_area_num[1])
                } else {
                    None
                }
            }
        }
    }

    /// Portals bordering `cluster`, in portal-index order.
    pub fn portals_of_cluster(&self, cluster: ClusterId) -> &[PortalId] {
        match self.clusters.get(cluster.index()) {
            Some(c) => {
                let start = c.first_portal as usize;
                &self.portal_index[start..start + c.num_portals as usize]
            }
            None => &[],
        }
    }

    // ── Attribute queries ─────────────────────────────────────────────────

    pub fn area_is_liquid(&self, area: AreaId) -> bool {
        self.settings.get(area.index()).is_some_and(|s| {
            s.contents
                .intersects(AreaContents::WATER | AreaContents::LAVA | AreaContents::SLIME)
        })
    }

    pub fn area_is_ladder(&self, area: AreaId) -> bool {
        self.settings
            .get(area.index())
            .is_some_and(|s| s.contents.intersects(AreaContents::LADDER))
    }

    pub fn area_is_jump_pad(&self, area: AreaId) -> bool {
        self.settings
            .get(area.index())
            .is_some_and(|s| s.contents.intersects(AreaContents::JUMP_PAD))
    }

    pub fn area_do_not_enter(&self, area: AreaId) -> bool {
        self.settings
            .get(area.index())
            .is_some_and(|s| s.contents.intersects(AreaContents::DO_NOT_ENTER))
    }

    pub fn area_presence(&self, area: AreaId) -> Option<Presence> {
        self.settings.get(area.index()).map(|s| s.presence)
    }

    /// Content-side travel flags a query mask must admit to enter `area`.
    pub fn area_travel_flags(&self, area: AreaId) -> TravelFlags {
        match self.settings.get(area.index()) {
            Some(s) => s.contents.required_travel_flags(),
            None => TravelFlags::NONE,
        }
    }

    /// Estimated time to cross `area` between two points inside it,
    /// scaled by the area's presence type.
    pub fn area_travel_time(&self, area: AreaId, from: Vec3, to: Vec3) -> TravelTime {
        let factor = match self.area_presence(area) {
            Some(p) => p.time_factor(),
            None => return TravelTime::UNREACHABLE,
        };
        TravelTime::from_distance(from.distance(to), factor)
    }

    // ── Assembly ──────────────────────────────────────────────────────────

    /// Validate raw record arrays and derive the reversed index and the
    /// spatial index.  Every cross-reference is checked here so queries
    /// can index without bounds anxiety.
    pub(crate) fn assemble(raw: RawGraph) -> GraphResult<NavGraph> {
        let RawGraph {
            hull_boxes,
            vertices,
            planes,
            edges,
            edge_index,
            faces,
            face_index,
            areas,
            settings,
            links,
            nodes,
            portals,
            portal_index,
            clusters,
        } = raw;

        let num_areas = areas.len();
        if settings.len() != num_areas {
            return Err(GraphError::Format(format!(
                "{} areas but {} area-settings records",
                num_areas,
                settings.len()
            )));
        }

        for (i, e) in edges.iter().enumerate() {
            if e[0] as usize >= vertices.len() || e[1] as usize >= vertices.len() {
                return Err(GraphError::Format(format!("edge {i} references bad vertex")));
            }
        }
        for (i, &ei) in edge_index.iter().enumerate() {
            let edge = if ei < 0 { -(ei + 1) } else { ei } as usize;
            if edge >= edges.len() {
                return Err(GraphError::Format(format!("edge index {i} out of range")));
            }
        }
        for (i, f) in faces.iter().enumerate() {
            if f.plane as usize >= planes.len() {
                return Err(GraphError::Format(format!("face {i} references bad plane")));
            }
            if f.first_edge as usize + f.num_edges as usize > edge_index.len() {
                return Err(GraphError::Format(format!("face {i} edge slice out of range")));
            }
            for a in [f.front_area, f.back_area] {
                if a != AreaId::INVALID && a.index() >= num_areas {
                    return Err(GraphError::Format(format!("face {i} references bad area")));
                }
            }
        }
        for (i, &fi) in face_index.iter().enumerate() {
            let face = if fi < 0 { -(fi + 1) } else { fi } as usize;
            if face >= faces.len() {
                return Err(GraphError::Format(format!("face index {i} out of range")));
            }
        }
        for (i, a) in areas.iter().enumerate() {
            if a.first_face as usize + a.num_faces as usize > face_index.len() {
                return Err(GraphError::Format(format!("area {i} face slice out of range")));
            }
        }

        for (i, link) in links.iter().enumerate() {
            if link.from_area.index() >= num_areas || link.to_area.index() >= num_areas {
                return Err(GraphError::Format(format!(
                    "reachability {i} references area out of range"
                )));
            }
        }

        for (aid, s) in settings.iter().enumerate() {
            let start = s.first_link as usize;
            let end = start + s.num_links as usize;
            if end > links.len() {
                return Err(GraphError::Format(format!("area {aid} link slice out of range")));
            }
            // Routing tables store the chosen outgoing link as an
            // area-local u8 index.
            if s.num_links > 256 {
                return Err(GraphError::Format(format!(
                    "area {aid} has {} links, more than 256",
                    s.num_links
                )));
            }
            for link in &links[start..end] {
                if link.from_area.index() != aid {
                    return Err(GraphError::Format(format!(
                        "area {aid} link slice contains link from {}",
                        link.from_area
                    )));
                }
            }
            match s.cluster {
                ClusterRef::Cluster(c) => {
                    let cluster = clusters.get(c.index()).ok_or_else(|| {
                        GraphError::Format(format!("area {aid} references bad cluster {c}"))
                    })?;
                    if s.cluster_area_num >= cluster.num_areas {
                        return Err(GraphError::Format(format!(
                            "area {aid} cluster-local number out of range"
                        )));
                    }
                }
                ClusterRef::Portal(p) => {
                    let portal = portals.get(p.index()).ok_or_else(|| {
                        GraphError::Format(format!("area {aid} references bad portal {p}"))
                    })?;
                    if portal.area.index() != aid {
                        return Err(GraphError::Format(format!(
                            "portal {p} does not point back at area {aid}"
                        )));
                    }
                }
            }
        }

        for (i, p) in portals.iter().enumerate() {
            if p.area.index() >= num_areas {
                return Err(GraphError::Format(format!("portal {i} references bad area")));
            }
            if p.front_cluster.index() >= clusters.len()
                || p.back_cluster.index() >= clusters.len()
            {
                return Err(GraphError::Format(format!("portal {i} references bad cluster")));
            }
            if p.front_cluster == p.back_cluster {
                return Err(GraphError::Format(format!(
                    "portal {i} joins cluster {} to itself",
                    p.front_cluster
                )));
            }
        }
        for (i, &p) in portal_index.iter().enumerate() {
            if p.index() >= portals.len() {
                return Err(GraphError::Format(format!("portal index {i} out of range")));
            }
        }
        for (i, c) in clusters.iter().enumerate() {
            if c.num_reach_areas > c.num_areas {
                return Err(GraphError::Format(format!(
                    "cluster {i} has more reach areas than areas"
                )));
            }
            if c.first_portal as usize + c.num_portals as usize > portal_index.len() {
                return Err(GraphError::Format(format!(
                    "cluster {i} portal slice out of range"
                )));
            }
        }

        for (i, n) in nodes.iter().enumerate() {
            if n.plane as usize >= planes.len() {
                return Err(GraphError::Format(format!("node {i} references bad plane")));
            }
            for c in n.children {
                if c > 0 && c as usize >= nodes.len() {
                    return Err(GraphError::Format(format!("node {i} child out of range")));
                }
                if c < 0 && (-(c + 1)) as usize >= num_areas {
                    return Err(GraphError::Format(format!("node {i} child area out of range")));
                }
            }
        }

        // ── Reversed-reachability CSR ─────────────────────────────────────
        // Fill in ascending LinkId order so each area's incoming list is
        // deterministic, which the routing tie-break relies on.
        let mut rev_start = vec![0u32; num_areas + 1];
        for link in &links {
            rev_start[link.to_area.index() + 1] += 1;
        }
        for i in 1..=num_areas {
            rev_start[i] += rev_start[i - 1];
        }
        let mut cursor = rev_start.clone();
        let mut rev_links = vec![RevLink { source: AreaId::INVALID, link: LinkId::INVALID }; links.len()];
        for (i, link) in links.iter().enumerate() {
            let slot = cursor[link.to_area.index()] as usize;
            rev_links[slot] = RevLink { source: link.from_area, link: LinkId(i as u32) };
            cursor[link.to_area.index()] += 1;
        }

        // ── Spatial index ─────────────────────────────────────────────────
        let entries: Vec<AreaEntry> = areas
            .iter()
            .enumerate()
            .map(|(i, a)| AreaEntry {
                mins: [a.bounds.mins.x, a.bounds.mins.y, a.bounds.mins.z],
                maxs: [a.bounds.maxs.x, a.bounds.maxs.y, a.bounds.maxs.z],
                id: AreaId(i as u32),
            })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        info!(
            areas = num_areas,
            links = links.len(),
            clusters = clusters.len(),
            portals = portals.len(),
            "navigation graph assembled"
        );

        Ok(NavGraph {
            hull_boxes,
            vertices,
            planes,
            edges,
            edge_index,
            faces,
            face_index,
            areas,
            settings,
            links,
            nodes,
            portals,
            portal_index,
            clusters,
            rev_start,
            rev_links,
            spatial_idx,
        })
    }
}

// Referenced by the BSP child encoding: NodeId is the public face of node
// indices even though the tree walk uses raw usize internally.
impl NavGraph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, node: NodeId) -> Option<&BspNode> {
        self.nodes.get(node.index())
    }
}
