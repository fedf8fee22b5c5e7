//! Travel types, travel-flag masks, and area attribute vocabularies.
//!
//! # Travel flags
//!
//! Every reachability link carries a [`TravelType`]; every routing query
//! carries a [`TravelFlags`] mask selecting which types it may use.  Two
//! queries with different masks see logically different graphs, so the mask
//! is part of every routing-cache key.
//!
//! Content bits (`WATER`, `LAVA`, …) gate *entering* an area rather than
//! taking a link: a query whose mask lacks `SWIM | WATER` cannot route
//! through flooded areas even over `Walk` links.

/// The movement capability a reachability link requires.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
pub enum TravelType {
    /// Plain ground movement.
    Walk        = 1,
    /// Ground movement requiring a crouched presence.
    Crouch      = 2,
    /// Jump onto a barrier roughly chest height.
    BarrierJump = 3,
    /// Gap or height jump.
    Jump        = 4,
    /// Climb a ladder surface.
    Ladder      = 5,
    /// Step off a ledge and fall.
    WalkOffLedge = 6,
    /// Swim through liquid.
    Swim        = 7,
    /// Jump out of liquid onto a ledge.
    WaterJump   = 8,
    /// Instant teleporter.
    Teleport    = 9,
    /// Ride a lift/elevator platform.
    Elevator    = 10,
    /// Launch from a jump pad.
    JumpPad     = 11,
    /// Self-damage boost jump.
    RocketJump  = 12,
    /// Grappling hook traversal.
    Grapple     = 13,
}

impl TravelType {
    /// Decode the on-disk value.  Unknown values are a format error.
    pub fn from_u16(raw: u16) -> Option<TravelType> {
        Some(match raw {
            1 => TravelType::Walk,
            2 => TravelType::Crouch,
            3 => TravelType::BarrierJump,
            4 => TravelType::Jump,
            5 => TravelType::Ladder,
            6 => TravelType::WalkOffLedge,
            7 => TravelType::Swim,
            8 => TravelType::WaterJump,
            9 => TravelType::Teleport,
            10 => TravelType::Elevator,
            11 => TravelType::JumpPad,
            12 => TravelType::RocketJump,
            13 => TravelType::Grapple,
            _ => return None,
        })
    }

    /// The flag bit a query mask must contain to use a link of this type.
    #[inline]
    pub fn flag(self) -> TravelFlags {
        match self {
            TravelType::Walk         => TravelFlags::WALK,
            TravelType::Crouch       => TravelFlags::CROUCH,
            TravelType::BarrierJump  => TravelFlags::BARRIER_JUMP,
            TravelType::Jump         => TravelFlags::JUMP,
            TravelType::Ladder       => TravelFlags::LADDER,
            TravelType::WalkOffLedge => TravelFlags::WALK_OFF_LEDGE,
            TravelType::Swim         => TravelFlags::SWIM,
            TravelType::WaterJump    => TravelFlags::WATER_JUMP,
            TravelType::Teleport     => TravelFlags::TELEPORT,
            TravelType::Elevator     => TravelFlags::ELEVATOR,
            TravelType::JumpPad      => TravelFlags::JUMP_PAD,
            TravelType::RocketJump   => TravelFlags::ROCKET_JUMP,
            TravelType::Grapple      => TravelFlags::GRAPPLE,
        }
    }

    /// Human-readable label for log events.
    pub fn as_str(self) -> &'static str {
        match self {
            TravelType::Walk         => "walk",
            TravelType::Crouch       => "crouch",
            TravelType::BarrierJump  => "barrier-jump",
            TravelType::Jump         => "jump",
            TravelType::Ladder       => "ladder",
            TravelType::WalkOffLedge => "walk-off-ledge",
            TravelType::Swim         => "swim",
            TravelType::WaterJump    => "water-jump",
            TravelType::Teleport     => "teleport",
            TravelType::Elevator     => "elevator",
            TravelType::JumpPad      => "jump-pad",
            TravelType::RocketJump   => "rocket-jump",
            TravelType::Grapple      => "grapple",
        }
    }
}

impl std::fmt::Display for TravelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── TravelFlags ───────────────────────────────────────────────────────────────

/// Bitmask of permitted travel types and enterable contents for one query.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TravelFlags(pub u32);

impl TravelFlags {
    pub const NONE: TravelFlags = TravelFlags(0);

    // Link-type bits (paired 1:1 with TravelType).
    pub const WALK: TravelFlags           = TravelFlags(1 << 0);
    pub const CROUCH: TravelFlags         = TravelFlags(1 << 1);
    pub const BARRIER_JUMP: TravelFlags   = TravelFlags(1 << 2);
    pub const JUMP: TravelFlags           = TravelFlags(1 << 3);
    pub const LADDER: TravelFlags         = TravelFlags(1 << 4);
    pub const WALK_OFF_LEDGE: TravelFlags = TravelFlags(1 << 5);
    pub const SWIM: TravelFlags           = TravelFlags(1 << 6);
    pub const WATER_JUMP: TravelFlags     = TravelFlags(1 << 7);
    pub const TELEPORT: TravelFlags       = TravelFlags(1 << 8);
    pub const ELEVATOR: TravelFlags       = TravelFlags(1 << 9);
    pub const JUMP_PAD: TravelFlags       = TravelFlags(1 << 10);
    pub const ROCKET_JUMP: TravelFlags    = TravelFlags(1 << 11);
    pub const GRAPPLE: TravelFlags        = TravelFlags(1 << 12);

    // Content bits — what an area may contain for the query to enter it.
    pub const AIR: TravelFlags          = TravelFlags(1 << 16);
    pub const WATER: TravelFlags        = TravelFlags(1 << 17);
    pub const SLIME: TravelFlags        = TravelFlags(1 << 18);
    pub const LAVA: TravelFlags         = TravelFlags(1 << 19);
    pub const DO_NOT_ENTER: TravelFlags = TravelFlags(1 << 20);

    /// The standard bot mask: every ordinary movement plus water, but no
    /// self-damage jumps, no grapple, no harmful liquids, and do-not-enter
    /// areas are honored.
    pub const DEFAULT: TravelFlags = TravelFlags(
        TravelFlags::WALK.0
            | TravelFlags::CROUCH.0
            | TravelFlags::BARRIER_JUMP.0
            | TravelFlags::JUMP.0
            | TravelFlags::LADDER.0
            | TravelFlags::WALK_OFF_LEDGE.0
            | TravelFlags::SWIM.0
            | TravelFlags::WATER_JUMP.0
            | TravelFlags::TELEPORT.0
            | TravelFlags::ELEVATOR.0
            | TravelFlags::JUMP_PAD.0
            | TravelFlags::AIR.0
            | TravelFlags::WATER.0,
    );

    /// `true` if every bit of `other` is set in `self`.
    #[inline]
    pub fn contains(self, other: TravelFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// `true` if `self` and `other` share at least one bit.
    #[inline]
    pub fn intersects(self, other: TravelFlags) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for TravelFlags {
    type Output = TravelFlags;
    #[inline]
    fn bitor(self, rhs: TravelFlags) -> TravelFlags {
        TravelFlags(self.0 | rhs.0)
    }
}

impl std::ops::BitAnd for TravelFlags {
    type Output = TravelFlags;
    #[inline]
    fn bitand(self, rhs: TravelFlags) -> TravelFlags {
        TravelFlags(self.0 & rhs.0)
    }
}

impl std::ops::Not for TravelFlags {
    type Output = TravelFlags;
    #[inline]
    fn not(self) -> TravelFlags {
        TravelFlags(!self.0)
    }
}

impl std::ops::BitOrAssign for TravelFlags {
    #[inline]
    fn bitor_assign(&mut self, rhs: TravelFlags) {
        self.0 |= rhs.0;
    }
}

// ── Area attribute vocabularies ───────────────────────────────────────────────

/// What an area's volume contains, from the area-settings lump.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AreaContents(pub u32);

impl AreaContents {
    pub const NONE: AreaContents           = AreaContents(0);
    pub const WATER: AreaContents          = AreaContents(1 << 0);
    pub const LAVA: AreaContents           = AreaContents(1 << 1);
    pub const SLIME: AreaContents          = AreaContents(1 << 2);
    pub const LADDER: AreaContents         = AreaContents(1 << 3);
    pub const CLUSTER_PORTAL: AreaContents = AreaContents(1 << 4);
    pub const TELEPORTER: AreaContents     = AreaContents(1 << 5);
    pub const JUMP_PAD: AreaContents       = AreaContents(1 << 6);
    pub const DO_NOT_ENTER: AreaContents   = AreaContents(1 << 7);
    pub const MOVER: AreaContents          = AreaContents(1 << 8);

    #[inline]
    pub fn intersects(self, other: AreaContents) -> bool {
        self.0 & other.0 != 0
    }

    /// The content-side travel flags a query mask must admit to enter an
    /// area with these contents.  Plain areas require `AIR`.
    pub fn required_travel_flags(self) -> TravelFlags {
        let mut flags = TravelFlags::NONE;
        if self.intersects(AreaContents::WATER) {
            flags |= TravelFlags::WATER;
        }
        if self.intersects(AreaContents::LAVA) {
            flags |= TravelFlags::LAVA;
        }
        if self.intersects(AreaContents::SLIME) {
            flags |= TravelFlags::SLIME;
        }
        if self.intersects(AreaContents::DO_NOT_ENTER) {
            flags |= TravelFlags::DO_NOT_ENTER;
        }
        if flags.is_empty() {
            flags = TravelFlags::AIR;
        }
        flags
    }
}

impl std::ops::BitOr for AreaContents {
    type Output = AreaContents;
    #[inline]
    fn bitor(self, rhs: AreaContents) -> AreaContents {
        AreaContents(self.0 | rhs.0)
    }
}

/// Coarse area classification flags, from the area-settings lump.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AreaFlags(pub u32);

impl AreaFlags {
    pub const NONE: AreaFlags     = AreaFlags(0);
    /// The area floor is walkable ground.
    pub const GROUNDED: AreaFlags = AreaFlags(1 << 0);
    /// The area is fully or partially flooded.
    pub const LIQUID: AreaFlags   = AreaFlags(1 << 1);
    /// The area borders a climbable ladder surface.
    pub const LADDER: AreaFlags   = AreaFlags(1 << 2);

    #[inline]
    pub fn intersects(self, other: AreaFlags) -> bool {
        self.0 & other.0 != 0
    }
}

impl std::ops::BitOr for AreaFlags {
    type Output = AreaFlags;
    #[inline]
    fn bitor(self, rhs: AreaFlags) -> AreaFlags {
        AreaFlags(self.0 | rhs.0)
    }
}

/// How an agent's hull fits inside an area.
///
/// Crouch-only and swim areas cross slower than stand areas; the
/// intra-area travel-time estimate scales with this.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u32)]
pub enum Presence {
    /// Full standing hull fits.
    #[default]
    Stand = 1,
    /// Only the crouched hull fits.
    Crouch = 2,
    /// The area is traversed swimming.
    Swim = 3,
}

impl Presence {
    /// Decode the on-disk value.
    pub fn from_u32(raw: u32) -> Option<Presence> {
        Some(match raw {
            1 => Presence::Stand,
            2 => Presence::Crouch,
            3 => Presence::Swim,
            _ => return None,
        })
    }

    /// Distance-to-time factor in hundredths of a second per world unit.
    ///
    /// Derived from hull speeds: walking covers ~3 units per hundredth,
    /// crouching and swimming roughly 1.
    #[inline]
    pub fn time_factor(self) -> f32 {
        match self {
            Presence::Stand  => 0.33,
            Presence::Crouch => 1.0,
            Presence::Swim   => 1.0,
        }
    }
}
