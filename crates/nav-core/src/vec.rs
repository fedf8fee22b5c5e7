//! Minimal 3-D vector and axis-aligned bounds types.
//!
//! The engine only needs distances, dot products, and box tests, so this is
//! deliberately not a full linear-algebra library.  `f32` matches the
//! on-disk format's precision; world coordinates are game units.

/// A 3-D point or direction in world units, stored as single-precision floats.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Euclidean distance between two points.
    #[inline]
    pub fn distance(self, other: Vec3) -> f32 {
        (self - other).length()
    }
}

impl std::ops::Add for Vec3 {
    type Output = Vec3;
    #[inline]
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Vec3;
    #[inline]
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Mul<f32> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl std::fmt::Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1})", self.x, self.y, self.z)
    }
}

// ── Bounds3 ───────────────────────────────────────────────────────────────────

/// An axis-aligned bounding box.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds3 {
    pub mins: Vec3,
    pub maxs: Vec3,
}

impl Bounds3 {
    #[inline]
    pub const fn new(mins: Vec3, maxs: Vec3) -> Self {
        Self { mins, maxs }
    }

    /// Geometric center of the box.
    #[inline]
    pub fn center(self) -> Vec3 {
        (self.mins + self.maxs) * 0.5
    }

    /// `true` if `p` lies inside or on the boundary of the box.
    #[inline]
    pub fn contains(self, p: Vec3) -> bool {
        p.x >= self.mins.x
            && p.x <= self.maxs.x
            && p.y >= self.mins.y
            && p.y <= self.maxs.y
            && p.z >= self.mins.z
            && p.z <= self.maxs.z
    }

    /// `true` if the two boxes overlap (boundary contact counts).
    #[inline]
    pub fn overlaps(self, other: Bounds3) -> bool {
        self.mins.x <= other.maxs.x
            && self.maxs.x >= other.mins.x
            && self.mins.y <= other.maxs.y
            && self.maxs.y >= other.mins.y
            && self.mins.z <= other.maxs.z
            && self.maxs.z >= other.mins.z
    }
}
