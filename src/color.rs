//! Color transition between the base and accent colors.
//!
//! Each particle oscillates between the two colors on its own schedule,
//! offset by its phase, so the palette shimmers instead of pulsing in sync.

use glam::Vec3;

/// Angular rate of the color oscillation.
pub const TRANSITION_RATE: f32 = 0.5;

/// Blend weight in [0, 1] for a particle at `time` with the given phase.
#[inline]
pub fn blend_factor(time: f32, phase: f32) -> f32 {
    ((time * TRANSITION_RATE + phase).sin() + 1.0) * 0.5
}

/// Interpolated color for a particle.
///
/// Equal endpoints yield exactly that color.
#[inline]
pub fn transition_color(base: Vec3, accent: Vec3, time: f32, phase: f32) -> Vec3 {
    mix(base, accent, blend_factor(time, phase))
}

/// `base + (accent - base) * t`.
#[inline]
pub fn mix(base: Vec3, accent: Vec3, t: f32) -> Vec3 {
    base + (accent - base) * t
}

/// Parse a `#rrggbb` (or `rrggbb`, or `#rgb`) hex string into linear 0..1 RGB.
pub fn parse_hex(hex: &str) -> Option<Vec3> {
    let digits = hex.trim().trim_start_matches('#');
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| v as f32 / 255.0);

    match digits.len() {
        6 => Some(Vec3::new(
            channel(&digits[0..2])?,
            channel(&digits[2..4])?,
            channel(&digits[4..6])?,
        )),
        3 => {
            let short = |i: usize| channel(&digits[i..i + 1].repeat(2));
            Some(Vec3::new(short(0)?, short(1)?, short(2)?))
        }
        _ => None,
    }
}

/// Format a 0..1 RGB color as `#rrggbb`.
pub fn to_hex(color: Vec3) -> String {
    let c = (color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
    format!("#{:02x}{:02x}{:02x}", c.x as u8, c.y as u8, c.z as u8)
}
