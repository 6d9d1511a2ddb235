//! Motion presets.
//!
//! A preset moves one particle's *logical* position given its index and the
//! global elapsed time. Presets never look at other particles, so the
//! per-frame pass is embarrassingly parallel.
//!
//! | Preset | Motion |
//! |--------|--------|
//! | [`MotionPreset::Default`] | none, jitter alone animates the field |
//! | [`MotionPreset::Galaxy`] | differential rotation around Y, inner particles faster |
//! | [`MotionPreset::Nebula`] | slow trigonometric drift on every axis |
//! | [`MotionPreset::Explosion`] | breathing radial push along the direction from origin |
//! | [`MotionPreset::Wave`] | height follows a traveling sine over X |
//! | [`MotionPreset::Spiral`] | constant-radius rotation with a height twist |
//! | [`MotionPreset::Aurora`] | height is two crossed traveling waves plus shimmer |
//!
//! Switching presets is a hard cut: the next frame simply runs the new
//! function on whatever positions the previous preset left behind.

use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Smallest planar distance used by the polar presets.
pub const MIN_POLAR_DISTANCE: f32 = 1e-4;

/// Angular rate of the galaxy preset before distance falloff.
pub const GALAXY_SPIN: f32 = 0.01;
/// Amplitude of the galaxy's vertical bob.
const GALAXY_BOB: f32 = 0.1;

/// Amplitude of the nebula drift per axis.
const NEBULA_DRIFT: f32 = 0.1;

/// Scale applied to the pulsing outward factor of the explosion preset.
pub const EXPLOSION_STRENGTH: f32 = 2.0;

const WAVE_AMPLITUDE: f32 = 20.0;
const WAVE_FREQUENCY: f32 = 0.02;
const WAVE_RIPPLE: f32 = 0.5;

/// Rotation rate of the spiral preset, in radians per unit of elapsed time.
pub const SPIRAL_RATE: f32 = 0.5;
const SPIRAL_TWIST: f32 = 0.01;

const AURORA_AMPLITUDE: f32 = 15.0;
const AURORA_FREQUENCY: f32 = 0.01;
const AURORA_SHIMMER: f32 = 0.5;

/// Named per-particle motion model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MotionPreset {
    /// No preset motion.
    #[default]
    Default,
    /// Keplerian-like swirl in the XZ plane.
    Galaxy,
    /// Organic drift.
    Nebula,
    /// Pulsing radial expansion.
    Explosion,
    /// Traveling wave over X.
    Wave,
    /// Vertical spiral staircase.
    Spiral,
    /// Crossed curtain waves.
    Aurora,
}

impl MotionPreset {
    /// Every preset, in display order.
    pub const ALL: [MotionPreset; 7] = [
        MotionPreset::Default,
        MotionPreset::Galaxy,
        MotionPreset::Nebula,
        MotionPreset::Explosion,
        MotionPreset::Wave,
        MotionPreset::Spiral,
        MotionPreset::Aurora,
    ];

    /// Look a preset up by name, ignoring case.
    ///
    /// Unknown names resolve to [`MotionPreset::Default`].
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(name))
            .unwrap_or_default()
    }

    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            MotionPreset::Default => "default",
            MotionPreset::Galaxy => "galaxy",
            MotionPreset::Nebula => "nebula",
            MotionPreset::Explosion => "explosion",
            MotionPreset::Wave => "wave",
            MotionPreset::Spiral => "spiral",
            MotionPreset::Aurora => "aurora",
        }
    }

    /// The preset after this one, wrapping around.
    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|p| p == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Move one particle's logical position in place.
    #[inline]
    pub fn apply(&self, position: &mut Vec3, index: usize, time: f32) {
        let i = index as f32;
        match self {
            MotionPreset::Default => {}

            MotionPreset::Galaxy => {
                let distance = planar_distance(*position);
                let angle = position.z.atan2(position.x) + time * GALAXY_SPIN / (distance + 1.0);
                position.x = angle.cos() * distance;
                position.z = angle.sin() * distance;
                position.y += (time + i * 0.01).sin() * GALAXY_BOB;
            }

            MotionPreset::Nebula => {
                position.x += (time * 0.5 + i * 0.01).sin() * (time * 0.3).cos() * NEBULA_DRIFT;
                position.y += (time * 0.4 + i * 0.02).cos() * NEBULA_DRIFT;
                position.z += ((time * 0.3 + i * 0.015).sin() + (time * 0.2 + i * 0.005).cos())
                    * 0.5
                    * NEBULA_DRIFT;
            }

            MotionPreset::Explosion => {
                let outward = ((time * 0.5).sin() + 1.0) * 0.5;
                let direction = position.normalize_or_zero();
                *position += direction * outward * EXPLOSION_STRENGTH;
            }

            MotionPreset::Wave => {
                position.y = (position.x * WAVE_FREQUENCY + time).sin() * WAVE_AMPLITUDE
                    + (i * 0.1 + time * 2.0).sin() * WAVE_RIPPLE;
            }

            MotionPreset::Spiral => {
                let radius = planar_distance(*position);
                let angle = position.z.atan2(position.x)
                    + time * SPIRAL_RATE
                    + position.y * SPIRAL_TWIST;
                position.x = angle.cos() * radius;
                position.z = angle.sin() * radius;
            }

            MotionPreset::Aurora => {
                position.y = (position.x * AURORA_FREQUENCY + time).sin() * AURORA_AMPLITUDE
                    + (position.z * AURORA_FREQUENCY + time * 0.7).cos() * AURORA_AMPLITUDE
                    + (i * 0.1 + time * 3.0).sin() * AURORA_SHIMMER;
            }
        }
    }
}

#[inline]
fn planar_distance(position: Vec3) -> f32 {
    (position.x * position.x + position.z * position.z)
        .sqrt()
        .max(MIN_POLAR_DISTANCE)
}

/// Default amplitude of the phase-keyed jitter, in world units.
pub const DEFAULT_JITTER: f32 = 0.02;

/// Small per-particle oscillation applied after the preset and interaction.
///
/// Each axis runs at its own rate and phase multiplier so neighbouring
/// particles never wobble in lockstep.
#[inline]
pub fn jitter(position: &mut Vec3, phase: f32, time: f32, amplitude: f32) {
    position.x += (time * 2.0 + phase).sin() * amplitude;
    position.y += (time * 1.5 + phase * 1.3).cos() * amplitude;
    position.z += (time * 1.7 + phase * 0.7).sin() * amplitude;
}

impl fmt::Display for MotionPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for MotionPreset {
    fn from(name: &str) -> Self {
        MotionPreset::from_name(name)
    }
}

impl Serialize for MotionPreset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for MotionPreset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(MotionPreset::from_name(&name))
    }
}
