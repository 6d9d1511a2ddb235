//! Point shading: shapes, pulsing, glow and sparkle.
//!
//! Every particle is drawn as a camera-facing quad whose interior is shaded
//! from a per-shape distance function in point-local UV space, where `(0, 0)`
//! is the center and the quad spans `[-0.5, 0.5]` on both axes.
//!
//! The WGSL produced by [`render_shader`] and the Rust functions in this
//! module share the same constants, so the CPU versions double as a
//! reference for what the GPU draws.
//!
//! # Pipeline
//!
//! 1. **Footprint**: `size · multiplier · (1 + sin(time·2 + phase)·0.3) / (1 + viewDistance·0.01)`
//! 2. **Shape**: distance from the center under the selected shape's metric
//! 3. **Edge and glow**: soft `smoothstep` edge plus an exponential halo
//! 4. **Pulse**: alpha and palette mix follow a phase-offset oscillation
//! 5. **Sparkle**: small hash of world position and time added to the color
//!
//! Particles are blended additively with depth testing but no depth writes,
//! so overlapping points brighten instead of hiding each other.

use std::f32::consts::FRAC_PI_2;
use std::fmt;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Amplitude of the footprint pulse.
pub const SIZE_PULSE: f32 = 0.3;
/// Angular rate of the footprint pulse.
pub const SIZE_PULSE_RATE: f32 = 2.0;
/// How quickly points shrink with distance from the camera.
pub const DISTANCE_ATTENUATION: f32 = 0.01;
/// Screen pixels per unit of footprint.
pub const POINT_PIXELS: f32 = 6.0;

/// Distance at which the soft edge starts fading.
pub const EDGE_INNER: f32 = 0.4;
/// Distance at which the soft edge reaches zero.
pub const EDGE_OUTER: f32 = 0.5;
/// Exponential decay of the glow halo.
pub const GLOW_FALLOFF: f32 = 6.0;
/// Peak glow contribution.
pub const GLOW_STRENGTH: f32 = 0.35;

/// Angular rate of the shading pulse.
pub const SHADE_PULSE_RATE: f32 = 3.0;
/// Maximum share of the base/accent palette mixed into a particle's color.
pub const PALETTE_MIX: f32 = 0.3;
/// Peak sparkle added to every channel.
pub const SPARKLE_STRENGTH: f32 = 0.1;

/// Points of the star shape.
const STAR_POINTS: f32 = 5.0;
/// Radius of the star's valleys relative to its tips.
const STAR_INNER: f32 = 0.4;
/// Vertical offset of the heart shape.
const HEART_OFFSET: f32 = 0.1;

/// Point shape selector.
///
/// The discriminant is the integer passed to the shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParticleShape {
    /// Round point (default).
    #[default]
    Circle = 0,
    /// Axis-aligned square.
    Square = 1,
    /// 5-pointed star, point facing up.
    Star = 2,
    /// Heart.
    Heart = 3,
}

impl ParticleShape {
    pub const ALL: [ParticleShape; 4] = [
        ParticleShape::Circle,
        ParticleShape::Square,
        ParticleShape::Star,
        ParticleShape::Heart,
    ];

    /// Look a shape up by name, ignoring case. Unknown names give a circle.
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.name().eq_ignore_ascii_case(name))
            .unwrap_or_default()
    }

    /// Shape for a shader selector value. Out-of-range values give a circle.
    pub fn from_index(index: u32) -> Self {
        Self::ALL
            .get(index as usize)
            .copied()
            .unwrap_or_default()
    }

    pub fn name(&self) -> &'static str {
        match self {
            ParticleShape::Circle => "circle",
            ParticleShape::Square => "square",
            ParticleShape::Star => "star",
            ParticleShape::Heart => "heart",
        }
    }

    /// Selector value used by the shader.
    #[inline]
    pub fn index(&self) -> u32 {
        *self as u32
    }
}

impl fmt::Display for ParticleShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for ParticleShape {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for ParticleShape {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(ParticleShape::from_name(&name))
    }
}

/// On-screen size of a point, in footprint units.
#[inline]
pub fn footprint(size: f32, multiplier: f32, time: f32, phase: f32, view_distance: f32) -> f32 {
    let pulse = 1.0 + (time * SIZE_PULSE_RATE + phase).sin() * SIZE_PULSE;
    let attenuation = 1.0 / (1.0 + view_distance * DISTANCE_ATTENUATION);
    size * multiplier * pulse * attenuation
}

/// Distance from the point center under the shape's metric.
///
/// Every shape puts its boundary at [`EDGE_OUTER`].
pub fn shape_distance(shape: ParticleShape, uv: Vec2) -> f32 {
    match shape {
        ParticleShape::Circle => uv.length(),
        ParticleShape::Square => uv.x.abs().max(uv.y.abs()),
        ParticleShape::Star => {
            let angle = uv.y.atan2(uv.x);
            let lobe = (STAR_POINTS * (angle - FRAC_PI_2)).cos();
            let reach = STAR_INNER + (1.0 - STAR_INNER) * (lobe * 0.5 + 0.5);
            uv.length() / reach
        }
        ParticleShape::Heart => {
            let h = (uv + Vec2::new(0.0, HEART_OFFSET)) * 2.0;
            let raw = h.x.abs().sqrt() + h.y.abs().sqrt() - 1.0;
            raw * 0.5 + EDGE_OUTER
        }
    }
}

/// Phase-driven pulse in [0, 1].
#[inline]
pub fn pulse(time: f32, phase: f32) -> f32 {
    0.5 + 0.5 * (time * SHADE_PULSE_RATE + phase).sin()
}

/// Position-and-time hash in `[0, SPARKLE_STRENGTH)`.
#[inline]
pub fn sparkle(world_position: Vec3, time: f32) -> f32 {
    let seed = world_position.x * 12.9898 + world_position.y * 78.233 + time * 5.0;
    let h = seed.sin() * 43758.5453;
    (h - h.floor()) * SPARKLE_STRENGTH
}

/// Hermite interpolation between two edges, matching WGSL `smoothstep`.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Inputs of a single fragment.
#[derive(Debug, Clone, Copy)]
pub struct Fragment {
    pub uv: Vec2,
    pub color: Vec3,
    pub phase: f32,
    pub world_position: Vec3,
}

/// Global shading parameters.
#[derive(Debug, Clone, Copy)]
pub struct ShadeParams {
    pub shape: ParticleShape,
    pub time: f32,
    pub base_color: Vec3,
    pub accent_color: Vec3,
}

/// Shaded color and alpha of one fragment, as the point shader computes it.
pub fn shade(fragment: &Fragment, params: &ShadeParams) -> (Vec3, f32) {
    let d = shape_distance(params.shape, fragment.uv);
    let edge = 1.0 - smoothstep(EDGE_INNER, EDGE_OUTER, d);
    let glow = (-d * GLOW_FALLOFF).exp() * GLOW_STRENGTH;
    let p = pulse(params.time, fragment.phase);
    let alpha = ((edge + glow) * (0.7 + 0.3 * p)).clamp(0.0, 1.0);

    let palette = params.base_color.lerp(params.accent_color, p);
    let color = fragment.color.lerp(palette, p * PALETTE_MIX)
        + Vec3::splat(sparkle(fragment.world_position, params.time));

    (color, alpha)
}

/// WGSL source of the point renderer.
///
/// Instance attributes: `@location(0)` position, `@location(1)` size,
/// `@location(2)` color, `@location(3)` phase. Six vertices per instance.
pub fn render_shader() -> String {
    format!(
        r#"struct Uniforms {{
    view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
    base_color: vec4<f32>,
    accent_color: vec4<f32>,
    viewport: vec2<f32>,
    time: f32,
    size_multiplier: f32,
    shape: u32,
}};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexOutput {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) phase: f32,
    @location(3) world_pos: vec3<f32>,
}};

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) particle_pos: vec3<f32>,
    @location(1) particle_size: f32,
    @location(2) particle_color: vec3<f32>,
    @location(3) particle_phase: f32,
) -> VertexOutput {{
    var quad_vertices = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
    );
    let corner = quad_vertices[vertex_index];

    let view_distance = distance(uniforms.camera_position.xyz, particle_pos);
    let size_pulse = 1.0 + sin(uniforms.time * {size_pulse_rate:?} + particle_phase) * {size_pulse:?};
    let attenuation = 1.0 / (1.0 + view_distance * {attenuation:?});
    let footprint = particle_size * uniforms.size_multiplier * size_pulse * attenuation * {point_pixels:?};

    var clip_pos = uniforms.view_proj * vec4<f32>(particle_pos, 1.0);
    clip_pos.x += corner.x * footprint / uniforms.viewport.x * clip_pos.w;
    clip_pos.y += corner.y * footprint / uniforms.viewport.y * clip_pos.w;

    var out: VertexOutput;
    out.clip_position = clip_pos;
    out.color = particle_color;
    out.uv = corner * 0.5;
    out.phase = particle_phase;
    out.world_pos = particle_pos;
    return out;
}}

fn shape_distance(uv: vec2<f32>) -> f32 {{
    var d = length(uv);
    if uniforms.shape == 1u {{
        d = max(abs(uv.x), abs(uv.y));
    }} else if uniforms.shape == 2u {{
        let angle = atan2(uv.y, uv.x);
        let lobe = cos({star_points:?} * (angle - 1.5707964));
        let reach = {star_inner:?} + (1.0 - {star_inner:?}) * (lobe * 0.5 + 0.5);
        d = length(uv) / reach;
    }} else if uniforms.shape == 3u {{
        let h = (uv + vec2<f32>(0.0, {heart_offset:?})) * 2.0;
        d = (sqrt(abs(h.x)) + sqrt(abs(h.y)) - 1.0) * 0.5 + {edge_outer:?};
    }}
    return d;
}}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {{
    let d = shape_distance(in.uv);
    let edge = 1.0 - smoothstep({edge_inner:?}, {edge_outer:?}, d);
    let glow = exp(-d * {glow_falloff:?}) * {glow_strength:?};
    let pulse = 0.5 + 0.5 * sin(uniforms.time * {shade_pulse_rate:?} + in.phase);
    let alpha = clamp((edge + glow) * (0.7 + 0.3 * pulse), 0.0, 1.0);
    if alpha <= 0.001 {{
        discard;
    }}

    let palette = mix(uniforms.base_color.rgb, uniforms.accent_color.rgb, pulse);
    var color = mix(in.color, palette, pulse * {palette_mix:?});

    let seed = dot(in.world_pos.xy, vec2<f32>(12.9898, 78.233)) + uniforms.time * 5.0;
    let sparkle = fract(sin(seed) * 43758.5453) * {sparkle_strength:?};
    color += vec3<f32>(sparkle);

    return vec4<f32>(color, alpha);
}}
"#,
        size_pulse_rate = SIZE_PULSE_RATE,
        size_pulse = SIZE_PULSE,
        attenuation = DISTANCE_ATTENUATION,
        point_pixels = POINT_PIXELS,
        star_points = STAR_POINTS,
        star_inner = STAR_INNER,
        heart_offset = HEART_OFFSET,
        edge_inner = EDGE_INNER,
        edge_outer = EDGE_OUTER,
        glow_falloff = GLOW_FALLOFF,
        glow_strength = GLOW_STRENGTH,
        shade_pulse_rate = SHADE_PULSE_RATE,
        palette_mix = PALETTE_MIX,
        sparkle_strength = SPARKLE_STRENGTH,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate_wgsl(code: &str) -> Result<(), String> {
        let module = naga::front::wgsl::parse_str(code)
            .map_err(|e| format!("WGSL parse error: {:?}", e))?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|e| format!("WGSL validation error: {:?}", e))?;

        Ok(())
    }

    fn params(shape: ParticleShape) -> ShadeParams {
        ShadeParams {
            shape,
            time: 0.0,
            base_color: Vec3::new(1.0, 0.0, 0.0),
            accent_color: Vec3::new(0.0, 0.0, 1.0),
        }
    }

    #[test]
    fn test_render_shader_is_valid() {
        let shader = render_shader();
        assert!(shader.contains("fn vs_main"));
        assert!(shader.contains("fn fs_main"));
        validate_wgsl(&shader).expect("Render shader should be valid");
    }

    #[test]
    fn test_shape_lookup() {
        assert_eq!(ParticleShape::from_name("Star"), ParticleShape::Star);
        assert_eq!(ParticleShape::from_name("hexagon"), ParticleShape::Circle);
        assert_eq!(ParticleShape::from_index(3), ParticleShape::Heart);
        assert_eq!(ParticleShape::from_index(9), ParticleShape::Circle);
        for shape in ParticleShape::ALL {
            assert_eq!(ParticleShape::from_index(shape.index()), shape);
        }
    }

    #[test]
    fn test_footprint_pulse_and_attenuation() {
        // sin(0) = 0: no pulse, no distance
        assert!((footprint(2.0, 1.5, 0.0, 0.0, 0.0) - 3.0).abs() < 1e-6);
        // Distance 100 halves the footprint
        assert!((footprint(2.0, 1.0, 0.0, 0.0, 100.0) - 1.0).abs() < 1e-6);
        // Peak pulse at sin = 1
        let peak = footprint(1.0, 1.0, 0.0, FRAC_PI_2, 0.0);
        assert!((peak - 1.3).abs() < 1e-6);
    }

    #[test]
    fn test_shape_boundaries() {
        let right_edge = Vec2::new(EDGE_OUTER, 0.0);
        assert!((shape_distance(ParticleShape::Circle, right_edge) - EDGE_OUTER).abs() < 1e-6);
        assert!((shape_distance(ParticleShape::Square, right_edge) - EDGE_OUTER).abs() < 1e-6);

        // The square's corner is inside the square but outside the circle
        let corner = Vec2::new(0.45, 0.45);
        assert!(shape_distance(ParticleShape::Square, corner) < EDGE_OUTER);
        assert!(shape_distance(ParticleShape::Circle, corner) > EDGE_OUTER);

        // Star tip points up, valleys reach less far
        let tip = Vec2::new(0.0, 0.45);
        assert!(shape_distance(ParticleShape::Star, tip) < EDGE_OUTER);
        let valley_angle = FRAC_PI_2 + std::f32::consts::PI / STAR_POINTS;
        let valley = Vec2::new(valley_angle.cos(), valley_angle.sin()) * 0.45;
        assert!(shape_distance(ParticleShape::Star, valley) > EDGE_OUTER);
    }

    #[test]
    fn test_center_is_opaque_for_every_shape() {
        for shape in [ParticleShape::Circle, ParticleShape::Square, ParticleShape::Star] {
            let fragment = Fragment {
                uv: Vec2::ZERO,
                color: Vec3::ONE,
                phase: FRAC_PI_2,
                world_position: Vec3::ZERO,
            };
            let (_, alpha) = shade(&fragment, &params(shape));
            assert_eq!(alpha, 1.0, "{} center alpha", shape);
        }
    }

    #[test]
    fn test_heart_interior_brighter_than_outside() {
        let inside = Fragment {
            uv: Vec2::new(0.0, -0.1),
            color: Vec3::ONE,
            phase: 0.0,
            world_position: Vec3::ZERO,
        };
        let outside = Fragment {
            uv: Vec2::new(0.49, 0.49),
            ..inside
        };
        let (_, a_in) = shade(&inside, &params(ParticleShape::Heart));
        let (_, a_out) = shade(&outside, &params(ParticleShape::Heart));
        assert!(a_in > a_out);
    }

    #[test]
    fn test_glow_outside_edge() {
        let fragment = Fragment {
            uv: Vec2::new(0.55, 0.0),
            color: Vec3::ONE,
            phase: 0.0,
            world_position: Vec3::ZERO,
        };
        let (_, alpha) = shade(&fragment, &params(ParticleShape::Circle));
        assert!(alpha > 0.0 && alpha < 0.1);
    }

    #[test]
    fn test_pulse_and_sparkle_ranges() {
        for i in 0..200 {
            let t = i as f32 * 0.13;
            let p = pulse(t, 0.4);
            assert!((0.0..=1.0).contains(&p));
            let s = sparkle(Vec3::new(t * 7.0, -t, 3.0), t);
            assert!((0.0..=SPARKLE_STRENGTH).contains(&s));
        }
    }

    #[test]
    fn test_smoothstep_matches_wgsl() {
        assert_eq!(smoothstep(0.4, 0.5, 0.3), 0.0);
        assert_eq!(smoothstep(0.4, 0.5, 0.6), 1.0);
        assert!((smoothstep(0.4, 0.5, 0.45) - 0.5).abs() < 1e-5);
    }
}
