//! Pointer interaction.
//!
//! The pointer arrives as normalized device coordinates and is projected onto
//! the `z = 0` plane in world units. Particles inside the falloff radius are
//! pushed away from that point with a linear falloff.

use glam::{Vec2, Vec3};

/// World units per unit of normalized pointer coordinate.
pub const POINTER_SCALE: f32 = 50.0;
/// Default radius beyond which the pointer has no effect.
pub const DEFAULT_FALLOFF_RADIUS: f32 = 50.0;

/// Latest pointer position.
///
/// Updates simply overwrite the previous value; `None` means no pointer is
/// over the canvas and no interaction happens.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pointer {
    ndc: Option<Vec2>,
}

impl Pointer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new pointer position, clamped to [-1, 1].
    pub fn set(&mut self, x: f32, y: f32) {
        if x.is_finite() && y.is_finite() {
            self.ndc = Some(Vec2::new(x.clamp(-1.0, 1.0), y.clamp(-1.0, 1.0)));
        } else {
            self.ndc = None;
        }
    }

    /// Forget the pointer (e.g. it left the window).
    pub fn clear(&mut self) {
        self.ndc = None;
    }

    /// Current normalized position, if any.
    pub fn ndc(&self) -> Option<Vec2> {
        self.ndc
    }

    /// Interaction point in world space.
    pub fn world_point(&self) -> Option<Vec3> {
        self.ndc
            .map(|p| Vec3::new(p.x * POINTER_SCALE, p.y * POINTER_SCALE, 0.0))
    }
}

/// Repulsion field around the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Repulsor {
    /// Center of the field in world space.
    pub center: Vec3,
    /// Distance at which the push falls to zero.
    pub radius: f32,
    /// Displacement applied at the center.
    pub strength: f32,
}

impl Repulsor {
    /// Push one particle away from the center.
    ///
    /// Particles outside the radius, or exactly on the center, are untouched.
    #[inline]
    pub fn apply(&self, position: &mut Vec3) {
        let offset = *position - self.center;
        let distance = offset.length();
        if distance >= self.radius || distance <= f32::EPSILON {
            return;
        }
        let falloff = (1.0 - distance / self.radius).max(0.0);
        *position += offset / distance * falloff * self.strength;
    }
}
