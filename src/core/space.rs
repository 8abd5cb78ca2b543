use cgmath::Vector2;
use std::fmt;

// -----------------------------------------------------------------------------
// World space (units, +x right, +y up)
// -----------------------------------------------------------------------------

/// Counter-clockwise perpendicular.
#[inline(always)]
pub fn perp(v: Vector2<f32>) -> Vector2<f32> {
    Vector2::new(-v.y, v.x)
}

// -----------------------------------------------------------------------------
// Monster handles
// -----------------------------------------------------------------------------

/// Non-owning handle to a monster. Stale handles simply fail lookups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonsterId(pub u32);

impl fmt::Display for MonsterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "monster#{}", self.0)
    }
}

// -----------------------------------------------------------------------------
// Spatial queries (collision detection lives with the host)
// -----------------------------------------------------------------------------
pub trait SpatialQuery {
    fn monsters_within_radius(&self, center: Vector2<f32>, radius: f32) -> Vec<MonsterId>;
    fn monster_at_point(&self, point: Vector2<f32>) -> Option<MonsterId>;
    fn position_of(&self, monster: MonsterId) -> Option<Vector2<f32>>;
}
