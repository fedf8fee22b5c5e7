//! Binary navigation-file reader and writer.
//!
//! # Format
//!
//! Canonical little-endian, independent of host byte order and pointer
//! width: every record is read field by field through a byte cursor —
//! never by transmuting struct layouts.
//!
//! ```text
//! magic   b"NAVG"
//! version u32 (= FORMAT_VERSION)
//! lumps, each: count u32, then `count` fixed-width records, in order:
//!   hull boxes, vertices, planes, edges, edge index, faces, face index,
//!   areas, area settings, reachability links, BSP nodes, portals,
//!   portal index, clusters
//! checksum u32   — must equal the companion geometry file's checksum
//! ```
//!
//! Sign encodings shared with the in-memory records:
//! - BSP node child `c`: `> 0` node index, `0` solid, `< 0` area `-(c+1)`.
//! - Edge/face index entries use the same `-(i+1)` scheme for "reversed".
//! - Area-settings cluster `c`: `>= 0` cluster id, `< 0` portal `-(c+1)`.

use tracing::info;

use nav_core::{
    AreaContents, AreaFlags, AreaId, Bounds3, ClusterId, PortalId, Presence, TravelTime,
    TravelType, Vec3,
};

use crate::error::{GraphError, GraphResult};
use crate::graph::{
    Area, AreaSettings, BspNode, Cluster, ClusterRef, Face, HullBox, NavGraph, Plane, Portal,
    RawGraph, Reachability,
};

/// On-disk format version this build reads and writes.
pub const FORMAT_VERSION: u32 = 5;

const MAGIC: &[u8; 4] = b"NAVG";

// ── Byte cursor ───────────────────────────────────────────────────────────────

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> GraphResult<&'a [u8]> {
        if self.pos + n > self.buf.len() {
            return Err(GraphError::Truncated(self.buf.len()));
        }
        let s = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(s)
    }

    fn read_u16(&mut self) -> GraphResult<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn read_u32(&mut self) -> GraphResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_i32(&mut self) -> GraphResult<i32> {
        Ok(self.read_u32()? as i32)
    }

    fn read_f32(&mut self) -> GraphResult<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    fn read_vec3(&mut self) -> GraphResult<Vec3> {
        Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    fn read_bounds(&mut self) -> GraphResult<Bounds3> {
        Ok(Bounds3::new(self.read_vec3()?, self.read_vec3()?))
    }

    /// Read a lump's record count, rejecting counts that cannot possibly
    /// fit in the remaining bytes (guards the allocation below).
    fn read_count(&mut self, record_size: usize) -> GraphResult<usize> {
        let count = self.read_u32()? as usize;
        if count.saturating_mul(record_size) > self.buf.len() - self.pos {
            return Err(GraphError::Truncated(self.buf.len()));
        }
        Ok(count)
    }
}

// ── Byte writer ───────────────────────────────────────────────────────────────

struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn new() -> Self {
        Self { buf: Vec::new() }
    }

    fn u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn i32(&mut self, v: i32) {
        self.u32(v as u32);
    }

    fn f32(&mut self, v: f32) {
        self.u32(v.to_bits());
    }

    fn vec3(&mut self, v: Vec3) {
        self.f32(v.x);
        self.f32(v.y);
        self.f32(v.z);
    }

    fn bounds(&mut self, b: Bounds3) {
        self.vec3(b.mins);
        self.vec3(b.maxs);
    }
}

// ── Field encodings ───────────────────────────────────────────────────────────

fn encode_area(a: AreaId) -> u32 {
    if a == AreaId::INVALID { u32::MAX } else { a.0 }
}

fn decode_area(raw: u32) -> AreaId {
    if raw == u32::MAX { AreaId::INVALID } else { AreaId(raw) }
}

fn encode_cluster_ref(c: ClusterRef) -> i32 {
    match c {
        ClusterRef::Cluster(id) => id.0 as i32,
        ClusterRef::Portal(id) => -(id.0 as i32 + 1),
    }
}

fn decode_cluster_ref(raw: i32) -> ClusterRef {
    if raw >= 0 {
        ClusterRef::Cluster(ClusterId(raw as u32))
    } else {
        ClusterRef::Portal(PortalId((-(raw + 1)) as u32))
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl NavGraph {
    /// Parse and validate a navigation file.
    ///
    /// `geometry_checksum` is the checksum of the companion world-geometry
    /// file; the navigation file stores the checksum it was computed
    /// against, and a mismatch means the two files are from different
    /// compiles of the level.  Any error here is fatal to level load.
    pub fn from_bytes(buf: &[u8], geometry_checksum: u32) -> GraphResult<NavGraph> {
        let mut c = Cursor::new(buf);

        if c.take(4)? != MAGIC {
            return Err(GraphError::Magic);
        }
        let version = c.read_u32()?;
        if version != FORMAT_VERSION {
            return Err(GraphError::Version { found: version, expected: FORMAT_VERSION });
        }

        let mut raw = RawGraph::default();

        // Hull boxes: presence u32, mins/maxs.
        let n = c.read_count(28)?;
        for _ in 0..n {
            let presence_raw = c.read_u32()?;
            let presence = Presence::from_u32(presence_raw)
                .ok_or_else(|| GraphError::Format(format!("bad hull presence {presence_raw}")))?;
            raw.hull_boxes.push(HullBox { presence, bounds: c.read_bounds()? });
        }

        let n = c.read_count(12)?;
        for _ in 0..n {
            raw.vertices.push(c.read_vec3()?);
        }

        let n = c.read_count(16)?;
        for _ in 0..n {
            raw.planes.push(Plane { normal: c.read_vec3()?, dist: c.read_f32()? });
        }

        let n = c.read_count(8)?;
        for _ in 0..n {
            raw.edges.push([c.read_u32()?, c.read_u32()?]);
        }

        let n = c.read_count(4)?;
        for _ in 0..n {
            raw.edge_index.push(c.read_i32()?);
        }

        let n = c.read_count(24)?;
        for _ in 0..n {
            raw.faces.push(Face {
                plane: c.read_u32()?,
                flags: c.read_u32()?,
                first_edge: c.read_u32()?,
                num_edges: c.read_u32()?,
                front_area: decode_area(c.read_u32()?),
                back_area: decode_area(c.read_u32()?),
            });
        }

        let n = c.read_count(4)?;
        for _ in 0..n {
            raw.face_index.push(c.read_i32()?);
        }

        // Areas: face slice + bounds + center.
        let n = c.read_count(44)?;
        for _ in 0..n {
            raw.areas.push(Area {
                first_face: c.read_u32()?,
                num_faces: c.read_u32()?,
                bounds: c.read_bounds()?,
                center: c.read_vec3()?,
            });
        }

        // Area settings.
        let n = c.read_count(28)?;
        for i in 0..n {
            let contents = AreaContents(c.read_u32()?);
            let flags = AreaFlags(c.read_u32()?);
            let presence_raw = c.read_u32()?;
            let presence = Presence::from_u32(presence_raw).ok_or_else(|| {
                GraphError::Format(format!("area {i}: bad presence {presence_raw}"))
            })?;
            raw.settings.push(AreaSettings {
                contents,
                flags,
                presence,
                cluster: decode_cluster_ref(c.read_i32()?),
                cluster_area_num: c.read_u32()?,
                first_link: c.read_u32()?,
                num_links: c.read_u32()?,
            });
        }

        // Reachability links.
        let n = c.read_count(40)?;
        for i in 0..n {
            let from_area = AreaId(c.read_u32()?);
            let to_area = AreaId(c.read_u32()?);
            let ty_raw = c.read_u16()?;
            let travel_type = TravelType::from_u16(ty_raw).ok_or_else(|| {
                GraphError::Format(format!("reachability {i}: bad travel type {ty_raw}"))
            })?;
            let _pad = c.read_u16()?;
            raw.links.push(Reachability {
                from_area,
                to_area,
                travel_type,
                travel_time: TravelTime(c.read_u32()?),
                start: c.read_vec3()?,
                end: c.read_vec3()?,
            });
        }

        let n = c.read_count(12)?;
        for _ in 0..n {
            raw.nodes.push(BspNode {
                plane: c.read_u32()?,
                children: [c.read_i32()?, c.read_i32()?],
            });
        }

        let n = c.read_count(24)?;
        for _ in 0..n {
            raw.portals.push(Portal {
                area: AreaId(c.read_u32()?),
                front_cluster: ClusterId(c.read_u32()?),
                back_cluster: ClusterId(c.read_u32()?),
                cluster_area_num: [c.read_u32()?, c.read_u32()?],
                max_travel_time: TravelTime(c.read_u32()?),
            });
        }

        let n = c.read_count(4)?;
        for _ in 0..n {
            raw.portal_index.push(PortalId(c.read_u32()?));
        }

        let n = c.read_count(16)?;
        for _ in 0..n {
            raw.clusters.push(Cluster {
                num_areas: c.read_u32()?,
                num_reach_areas: c.read_u32()?,
                first_portal: c.read_u32()?,
                num_portals: c.read_u32()?,
            });
        }

        let file_checksum = c.read_u32()?;
        if file_checksum != geometry_checksum {
            return Err(GraphError::Checksum { file: file_checksum, geometry: geometry_checksum });
        }

        info!(bytes = buf.len(), version, "navigation file parsed");
        NavGraph::assemble(raw)
    }

    /// Serialize the graph back into the on-disk format.
    ///
    /// `geometry_checksum` is stamped as the trailing checksum, tying the
    /// output to a specific compile of the level geometry.
    pub fn to_bytes(&self, geometry_checksum: u32) -> Vec<u8> {
        let mut w = Writer::new();
        w.buf.extend_from_slice(MAGIC);
        w.u32(FORMAT_VERSION);

        w.u32(self.hull_boxes.len() as u32);
        for h in &self.hull_boxes {
            w.u32(h.presence as u32);
            w.bounds(h.bounds);
        }

        w.u32(self.vertices.len() as u32);
        for &v in &self.vertices {
            w.vec3(v);
        }

        w.u32(self.planes.len() as u32);
        for p in &self.planes {
            w.vec3(p.normal);
            w.f32(p.dist);
        }

        w.u32(self.edges.len() as u32);
        for e in &self.edges {
            w.u32(e[0]);
            w.u32(e[1]);
        }

        w.u32(self.edge_index.len() as u32);
        for &i in &self.edge_index {
            w.i32(i);
        }

        w.u32(self.faces.len() as u32);
        for f in &self.faces {
            w.u32(f.plane);
            w.u32(f.flags);
            w.u32(f.first_edge);
            w.u32(f.num_edges);
            w.u32(encode_area(f.front_area));
            w.u32(encode_area(f.back_area));
        }

        w.u32(self.face_index.len() as u32);
        for &i in &self.face_index {
            w.i32(i);
        }

        w.u32(self.areas.len() as u32);
        for a in &self.areas {
            w.u32(a.first_face);
            w.u32(a.num_faces);
            w.bounds(a.bounds);
            w.vec3(a.center);
        }

        w.u32(self.settings.len() as u32);
        for s in &self.settings {
            w.u32(s.contents.0);
            w.u32(s.flags.0);
            w.u32(s.presence as u32);
            w.i32(encode_cluster_ref(s.cluster));
            w.u32(s.cluster_area_num);
            w.u32(s.first_link);
            w.u32(s.num_links);
        }

        w.u32(self.links.len() as u32);
        for l in &self.links {
            w.u32(l.from_area.0);
            w.u32(l.to_area.0);
            w.u16(l.travel_type as u16);
            w.u16(0); // pad
            w.u32(l.travel_time.0);
            w.vec3(l.start);
            w.vec3(l.end);
        }

        w.u32(self.nodes.len() as u32);
        for n in &self.nodes {
            w.u32(n.plane);
            w.i32(n.children[0]);
            w.i32(n.children[1]);
        }

        w.u32(self.portals.len() as u32);
        for p in &self.portals {
            w.u32(p.area.0);
            w.u32(p.front_cluster.0);
            w.u32(p.back_cluster.0);
            w.u32(p.cluster_area_num[0]);
            w.u32(p.cluster_area_num[1]);
            w.u32(p.max_travel_time.0);
        }

        w.u32(self.portal_index.len() as u32);
        for &p in &self.portal_index {
            w.u32(p.0);
        }

        w.u32(self.clusters.len() as u32);
        for cl in &self.clusters {
            w.u32(cl.num_areas);
            w.u32(cl.num_reach_areas);
            w.u32(cl.first_portal);
            w.u32(cl.num_portals);
        }

        w.u32(geometry_checksum);
        w.buf
    }
}
