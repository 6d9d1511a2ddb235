//! Data handed to the point renderer each frame.
//!
//! [`ShaderGlobals`] is the renderer-agnostic set of global inputs the engine
//! produces. [`Uniforms`] is its GPU layout once combined with the camera,
//! and [`FrameUpload`] lists which per-particle arrays actually need to be
//! pushed this frame.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};

use crate::store::{DirtyFlags, Population};
use crate::visuals::ParticleShape;

/// Global shading inputs produced by the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaderGlobals {
    /// Elapsed animation time.
    pub time: f32,
    /// Global multiplier on every particle's size.
    pub size_multiplier: f32,
    pub base_color: Vec3,
    pub accent_color: Vec3,
    pub shape: ParticleShape,
}

/// GPU layout of the render uniforms.
///
/// Matches the `Uniforms` struct in [`crate::visuals::render_shader`]
/// (144 bytes, 16-byte aligned).
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Uniforms {
    pub view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    pub base_color: [f32; 4],
    pub accent_color: [f32; 4],
    pub viewport: [f32; 2],
    pub time: f32,
    pub size_multiplier: f32,
    pub shape: u32,
    pub _padding: [u32; 3],
}

impl Uniforms {
    /// Combine engine globals with the camera state.
    pub fn new(globals: &ShaderGlobals, view_proj: Mat4, camera_position: Vec3, viewport: Vec2) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            camera_position: camera_position.extend(1.0).to_array(),
            base_color: globals.base_color.extend(1.0).to_array(),
            accent_color: globals.accent_color.extend(1.0).to_array(),
            viewport: viewport.max(Vec2::ONE).to_array(),
            time: globals.time,
            size_multiplier: globals.size_multiplier,
            shape: globals.shape.index(),
            _padding: [0; 3],
        }
    }
}

/// Per-frame upload set.
///
/// Positions are written every playing frame; colors only while the color
/// transition runs. Sizes and phases never change after creation and are
/// uploaded only when the population is recreated.
#[derive(Debug, Clone, Copy)]
pub struct FrameUpload<'a> {
    pub globals: ShaderGlobals,
    pub positions: Option<&'a [Vec3]>,
    pub colors: Option<&'a [Vec3]>,
}

impl<'a> FrameUpload<'a> {
    pub(crate) fn from_dirty(globals: ShaderGlobals, population: &'a Population, dirty: DirtyFlags) -> Self {
        Self {
            globals,
            positions: dirty.positions.then(|| population.positions()),
            colors: dirty.colors.then(|| population.colors()),
        }
    }

    /// Bytes of attribute data this upload pushes.
    pub fn byte_len(&self) -> usize {
        let vec3 = std::mem::size_of::<Vec3>();
        self.positions.map_or(0, |p| p.len() * vec3) + self.colors.map_or(0, |c| c.len() * vec3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn globals() -> ShaderGlobals {
        ShaderGlobals {
            time: 1.5,
            size_multiplier: 2.0,
            base_color: Vec3::new(1.0, 0.5, 0.0),
            accent_color: Vec3::new(0.0, 0.5, 1.0),
            shape: ParticleShape::Star,
        }
    }

    #[test]
    fn test_uniform_layout_size() {
        assert_eq!(std::mem::size_of::<Uniforms>(), 144);
        assert_eq!(std::mem::size_of::<Uniforms>() % 16, 0);
    }

    #[test]
    fn test_uniforms_from_globals() {
        let u = Uniforms::new(&globals(), Mat4::IDENTITY, Vec3::new(0.0, 0.0, 200.0), Vec2::new(1280.0, 720.0));
        assert_eq!(u.shape, 2);
        assert_eq!(u.time, 1.5);
        assert_eq!(u.size_multiplier, 2.0);
        assert_eq!(u.base_color, [1.0, 0.5, 0.0, 1.0]);
        assert_eq!(u.camera_position[2], 200.0);
        assert_eq!(u.viewport, [1280.0, 720.0]);
    }

    #[test]
    fn test_zero_viewport_is_clamped() {
        let u = Uniforms::new(&globals(), Mat4::IDENTITY, Vec3::ZERO, Vec2::ZERO);
        assert_eq!(u.viewport, [1.0, 1.0]);
    }
}
