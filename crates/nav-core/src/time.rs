//! Fixed-point travel-time cost unit.
//!
//! # Design
//!
//! Travel time is the engine's additive path cost, measured in hundredths
//! of a second of estimated movement — *not* wall-clock time.  Using an
//! integer unit keeps cache tables compact, comparisons exact, and replay
//! deterministic (no floating-point drift across platforms).
//!
//! Saturation: costs accumulate with [`TravelTime::saturating_add`], which
//! clamps at [`TravelTime::UNREACHABLE`] instead of wrapping.  The sentinel
//! is also what cache tables hold for areas the relaxation never reached,
//! so "cost overflow" and "no path" collapse into the same observable
//! answer.

use std::fmt;

/// Additive fixed-point path cost in hundredths of a second.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TravelTime(pub u32);

impl TravelTime {
    pub const ZERO: TravelTime = TravelTime(0);

    /// Sentinel for "no path exists" and for clamped overflow.
    pub const UNREACHABLE: TravelTime = TravelTime(u32::MAX);

    /// `true` for any value other than the sentinel.
    #[inline]
    pub fn is_reachable(self) -> bool {
        self != TravelTime::UNREACHABLE
    }

    /// Add two costs, clamping at the sentinel.  Adding anything to
    /// `UNREACHABLE` stays `UNREACHABLE`.
    #[inline]
    pub fn saturating_add(self, rhs: TravelTime) -> TravelTime {
        TravelTime(self.0.saturating_add(rhs.0))
    }

    /// Convert a world-unit distance to a cost using a presence-dependent
    /// factor.  Always at least 1 unit so zero-length hops still cost
    /// something (keeps relaxation loops finite on degenerate geometry).
    #[inline]
    pub fn from_distance(dist: f32, factor: f32) -> TravelTime {
        let t = (dist * factor) as u32;
        TravelTime(t.max(1))
    }

    /// Estimated seconds represented by this cost.
    #[inline]
    pub fn as_secs_f32(self) -> f32 {
        self.0 as f32 / 100.0
    }
}

impl fmt::Display for TravelTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_reachable() {
            write!(f, "{}.{:02}s", self.0 / 100, self.0 % 100)
        } else {
            f.write_str("unreachable")
        }
    }
}
