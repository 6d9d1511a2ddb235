//! Engine configuration and live property updates.
//!
//! [`EngineConfig`] is the full set of tunables; it can be loaded from a JSON
//! file whose keys match the UI's property names (`particleCount`,
//! `baseColor`, ...). [`PropertyUpdate`] is the partial form sent while the
//! engine runs. Every recognized key is listed explicitly; anything else is
//! collected into [`PropertyUpdate::unknown`] and ignored.
//!
//! ```ignore
//! let update = PropertyUpdate::from_json(r##"{ "baseColor": "#ff8800", "speed": 2.0 }"##)?;
//! engine.update_properties(&update)?;
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::color::{parse_hex, to_hex};
use crate::error::ConfigError;
use crate::interaction::DEFAULT_FALLOFF_RADIUS;
use crate::presets::{MotionPreset, DEFAULT_JITTER};
use crate::store::SpawnParams;
use crate::visuals::ParticleShape;

/// Particle count used when none is configured.
pub const DEFAULT_PARTICLE_COUNT: usize = 5000;

/// A color given either as a hex string or as an `[r, g, b]` triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorValue {
    Hex(String),
    Rgb([f32; 3]),
}

impl ColorValue {
    /// Resolve to 0..1 RGB, or `None` when malformed.
    pub fn to_rgb(&self) -> Option<Vec3> {
        match self {
            ColorValue::Hex(s) => parse_hex(s),
            ColorValue::Rgb(c) => {
                let v = Vec3::from_array(*c);
                v.is_finite().then(|| v.clamp(Vec3::ZERO, Vec3::ONE))
            }
        }
    }
}

impl From<Vec3> for ColorValue {
    fn from(v: Vec3) -> Self {
        ColorValue::Rgb(v.to_array())
    }
}

impl From<&str> for ColorValue {
    fn from(s: &str) -> Self {
        ColorValue::Hex(s.to_string())
    }
}

fn serialize_color<S: Serializer>(color: &Vec3, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&to_hex(*color))
}

fn deserialize_color<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec3, D::Error> {
    let value = ColorValue::deserialize(deserializer)?;
    value
        .to_rgb()
        .ok_or_else(|| serde::de::Error::custom(format!("invalid color {:?}", value)))
}

/// Full engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Number of particles. Changing it recreates the population.
    pub particle_count: usize,
    /// Random size range at spawn, and the global size multiplier.
    pub particle_size: f32,
    /// Point shape. Changing it recreates the population.
    pub particle_shape: ParticleShape,
    #[serde(serialize_with = "serialize_color", deserialize_with = "deserialize_color")]
    pub base_color: Vec3,
    #[serde(serialize_with = "serialize_color", deserialize_with = "deserialize_color")]
    pub accent_color: Vec3,
    /// Multiplier applied to frame time before it advances the animation.
    pub speed: f32,
    /// Rotation of the whole field around Y, in radians per second.
    pub rotation_speed: f32,
    /// Whether colors oscillate between base and accent.
    pub color_transition: bool,
    /// Whether the pointer pushes particles.
    pub mouse_interaction: bool,
    /// Displacement applied at the pointer.
    pub mouse_influence: f32,
    /// Distance at which pointer influence vanishes.
    pub interaction_radius: f32,
    /// Amplitude of the per-particle phase jitter.
    pub jitter: f32,
    /// Active motion preset.
    pub preset: MotionPreset,
    /// Seed for reproducible populations. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            particle_count: DEFAULT_PARTICLE_COUNT,
            particle_size: 2.0,
            particle_shape: ParticleShape::Circle,
            base_color: Vec3::new(0.29, 0.565, 0.886),  // #4a90e2
            accent_color: Vec3::new(0.886, 0.29, 0.565), // #e24a90
            speed: 1.0,
            rotation_speed: 0.05,
            color_transition: true,
            mouse_interaction: true,
            mouse_influence: 1.0,
            interaction_radius: DEFAULT_FALLOFF_RADIUS,
            jitter: DEFAULT_JITTER,
            preset: MotionPreset::Default,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from JSON text. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    /// Load a config from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn with_particle_count(mut self, count: usize) -> Self {
        self.particle_count = count;
        self
    }

    pub fn with_shape(mut self, shape: ParticleShape) -> Self {
        self.particle_shape = shape;
        self
    }

    pub fn with_colors(mut self, base: Vec3, accent: Vec3) -> Self {
        self.base_color = base;
        self.accent_color = accent;
        self
    }

    pub fn with_preset(mut self, preset: MotionPreset) -> Self {
        self.preset = preset;
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_color_transition(mut self, enabled: bool) -> Self {
        self.color_transition = enabled;
        self
    }

    pub fn with_mouse_interaction(mut self, enabled: bool) -> Self {
        self.mouse_interaction = enabled;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Clamp every field into its valid range.
    ///
    /// Non-finite numbers fall back to the default value.
    pub fn sanitized(mut self) -> Self {
        let defaults = EngineConfig::default();
        let finite_or = |v: f32, d: f32| if v.is_finite() { v } else { d };

        self.particle_count = self.particle_count.max(1);
        self.particle_size = finite_or(self.particle_size, defaults.particle_size).max(0.0);
        self.speed = finite_or(self.speed, defaults.speed).max(0.0);
        self.rotation_speed = finite_or(self.rotation_speed, defaults.rotation_speed);
        self.mouse_influence = finite_or(self.mouse_influence, defaults.mouse_influence);
        self.interaction_radius = finite_or(self.interaction_radius, defaults.interaction_radius).max(f32::EPSILON);
        self.jitter = finite_or(self.jitter, defaults.jitter).max(0.0);
        self.base_color = self.base_color.clamp(Vec3::ZERO, Vec3::ONE);
        self.accent_color = self.accent_color.clamp(Vec3::ZERO, Vec3::ONE);
        self
    }

    /// Spawn parameters derived from this config.
    pub fn spawn_params(&self) -> SpawnParams {
        SpawnParams {
            size_range: self.particle_size,
            base_color: self.base_color,
            accent_color: self.accent_color,
        }
    }

    /// Apply a partial update, reporting what changed.
    ///
    /// Malformed values (non-finite numbers, bad colors) are skipped with a
    /// warning; the rest of the update still applies.
    pub fn apply(&mut self, update: &PropertyUpdate) -> UpdateEffect {
        let mut effect = UpdateEffect::default();

        if let Some(count) = update.particle_count {
            let count = count.max(1);
            if count != self.particle_count {
                self.particle_count = count;
                effect.recreate = true;
                effect.changed.push("particleCount");
            }
        }

        if let Some(shape) = update.particle_shape {
            if shape != self.particle_shape {
                self.particle_shape = shape;
                effect.recreate = true;
                effect.changed.push("particleShape");
            }
        }

        macro_rules! apply_float {
            ($field:ident, $key:literal, $fix:expr) => {
                if let Some(v) = update.$field {
                    if v.is_finite() {
                        let fix: fn(f32) -> f32 = $fix;
                        self.$field = fix(v);
                        effect.changed.push($key);
                    } else {
                        log::warn!("Ignoring non-finite value for {}", $key);
                        effect.ignored.push($key.to_string());
                    }
                }
            };
        }

        apply_float!(particle_size, "particleSize", |v| v.max(0.0));
        apply_float!(speed, "speed", |v| v.max(0.0));
        apply_float!(rotation_speed, "rotationSpeed", |v| v);
        apply_float!(mouse_influence, "mouseInfluence", |v| v);

        macro_rules! apply_color {
            ($field:ident, $key:literal) => {
                if let Some(value) = &update.$field {
                    match value.to_rgb() {
                        Some(rgb) => {
                            self.$field = rgb;
                            effect.changed.push($key);
                        }
                        None => {
                            log::warn!("Ignoring malformed color for {}: {:?}", $key, value);
                            effect.ignored.push($key.to_string());
                        }
                    }
                }
            };
        }

        apply_color!(base_color, "baseColor");
        apply_color!(accent_color, "accentColor");

        if let Some(enabled) = update.color_transition {
            self.color_transition = enabled;
            effect.changed.push("colorTransition");
        }

        if let Some(enabled) = update.mouse_interaction {
            self.mouse_interaction = enabled;
            effect.changed.push("mouseInteraction");
        }

        for key in update.unknown.keys() {
            log::warn!("Ignoring unknown property '{}'", key);
            effect.ignored.push(key.clone());
        }

        effect
    }
}

/// A partial set of property changes.
///
/// Deserializes from the UI's camelCase property bag. Unrecognized keys are
/// kept in [`PropertyUpdate::unknown`] so they can be reported, and are never
/// applied.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PropertyUpdate {
    pub particle_count: Option<usize>,
    pub particle_size: Option<f32>,
    pub particle_shape: Option<ParticleShape>,
    pub base_color: Option<ColorValue>,
    pub accent_color: Option<ColorValue>,
    pub speed: Option<f32>,
    pub rotation_speed: Option<f32>,
    pub color_transition: Option<bool>,
    pub mouse_interaction: Option<bool>,
    pub mouse_influence: Option<f32>,
    /// Keys that are not engine properties.
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_json::Value>,
}

impl PropertyUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an update from a JSON object.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn particle_count(mut self, count: usize) -> Self {
        self.particle_count = Some(count);
        self
    }

    pub fn particle_size(mut self, size: f32) -> Self {
        self.particle_size = Some(size);
        self
    }

    pub fn particle_shape(mut self, shape: ParticleShape) -> Self {
        self.particle_shape = Some(shape);
        self
    }

    pub fn base_color(mut self, color: impl Into<ColorValue>) -> Self {
        self.base_color = Some(color.into());
        self
    }

    pub fn accent_color(mut self, color: impl Into<ColorValue>) -> Self {
        self.accent_color = Some(color.into());
        self
    }

    pub fn speed(mut self, speed: f32) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn rotation_speed(mut self, speed: f32) -> Self {
        self.rotation_speed = Some(speed);
        self
    }

    pub fn color_transition(mut self, enabled: bool) -> Self {
        self.color_transition = Some(enabled);
        self
    }

    pub fn mouse_interaction(mut self, enabled: bool) -> Self {
        self.mouse_interaction = Some(enabled);
        self
    }

    pub fn mouse_influence(mut self, influence: f32) -> Self {
        self.mouse_influence = Some(influence);
        self
    }
}

/// Outcome of applying a [`PropertyUpdate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateEffect {
    /// The population must be rebuilt (count or shape changed).
    pub recreate: bool,
    /// Property names that were applied.
    pub changed: Vec<&'static str>,
    /// Property names that were present but not applied.
    pub ignored: Vec<String>,
}

impl UpdateEffect {
    pub fn is_empty(&self) -> bool {
        !self.recreate && self.changed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.particle_count, 5000);
        assert_eq!(config.particle_shape, ParticleShape::Circle);
        assert_eq!(config.preset, MotionPreset::Default);
        assert!(config.color_transition);
    }

    #[test]
    fn test_from_json_partial() {
        let config = EngineConfig::from_json_str(
            r##"{ "particleCount": 1200, "baseColor": "#ff0000", "particleShape": "heart", "preset": "wave" }"##,
        )
        .unwrap();
        assert_eq!(config.particle_count, 1200);
        assert_eq!(config.base_color, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(config.particle_shape, ParticleShape::Heart);
        assert_eq!(config.preset, MotionPreset::Wave);
        assert_eq!(config.speed, 1.0);
    }

    #[test]
    fn test_from_json_rejects_bad_color() {
        let result = EngineConfig::from_json_str(r#"{ "baseColor": "not a color" }"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_json_round_trip() {
        let config = EngineConfig::default().with_seed(9).with_preset(MotionPreset::Aurora);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"baseColor\":\"#4a90e2\""));
        let back = EngineConfig::from_json_str(&json).unwrap();
        assert_eq!(back.preset, MotionPreset::Aurora);
        assert_eq!(back.seed, Some(9));
    }

    #[test]
    fn test_sanitize_clamps() {
        let mut config = EngineConfig::default();
        config.particle_count = 0;
        config.speed = -3.0;
        config.particle_size = f32::NAN;
        let config = config.sanitized();
        assert_eq!(config.particle_count, 1);
        assert_eq!(config.speed, 0.0);
        assert_eq!(config.particle_size, 2.0);
    }

    #[test]
    fn test_update_count_and_shape_recreate() {
        let mut config = EngineConfig::default();
        let effect = config.apply(&PropertyUpdate::new().particle_count(100));
        assert!(effect.recreate);

        let effect = config.apply(&PropertyUpdate::new().particle_shape(ParticleShape::Star));
        assert!(effect.recreate);

        // Same values again change nothing
        let effect = config.apply(
            &PropertyUpdate::new()
                .particle_count(100)
                .particle_shape(ParticleShape::Star),
        );
        assert!(!effect.recreate);
        assert!(effect.is_empty());
    }

    #[test]
    fn test_update_in_place_fields() {
        let mut config = EngineConfig::default();
        let effect = config.apply(
            &PropertyUpdate::new()
                .base_color("#00ff00")
                .accent_color(Vec3::new(0.0, 0.0, 1.0))
                .speed(2.5)
                .color_transition(false)
                .mouse_influence(-0.5),
        );
        assert!(!effect.recreate);
        assert_eq!(config.base_color, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(config.accent_color, Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(config.speed, 2.5);
        assert!(!config.color_transition);
        assert_eq!(config.mouse_influence, -0.5);
        assert_eq!(effect.changed.len(), 5);
    }

    #[test]
    fn test_update_from_json_with_unknown_keys() {
        let update = PropertyUpdate::from_json(
            r##"{ "speed": 0.5, "accentColor": [1.0, 1.0, 0.0], "wobble": 3, "__proto__": {} }"##,
        )
        .unwrap();
        assert_eq!(update.speed, Some(0.5));
        assert_eq!(update.unknown.len(), 2);

        let mut config = EngineConfig::default();
        let effect = config.apply(&update);
        assert_eq!(config.speed, 0.5);
        assert_eq!(config.accent_color, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(effect.ignored, vec!["__proto__".to_string(), "wobble".to_string()]);
    }

    #[test]
    fn test_malformed_color_is_skipped() {
        let mut config = EngineConfig::default();
        let before = config.base_color;
        let effect = config.apply(&PropertyUpdate::new().base_color("#zzzzzz").speed(3.0));
        assert_eq!(config.base_color, before);
        assert_eq!(config.speed, 3.0);
        assert_eq!(effect.ignored, vec!["baseColor".to_string()]);
    }

    #[test]
    fn test_negative_speed_clamped() {
        let mut config = EngineConfig::default();
        config.apply(&PropertyUpdate::new().speed(-1.0));
        assert_eq!(config.speed, 0.0);
    }
}
