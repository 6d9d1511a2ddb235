//! # stardust
//!
//! Procedural particle animation: a field of thousands of points driven by
//! named motion presets, nudged by the pointer, cycling between two colors
//! and drawn as soft glowing sprites.
//!
//! The animation runs on the CPU in [`Engine`]; a wgpu renderer uploads only
//! the attribute arrays that changed each frame.
//!
//! ## Quick Start
//!
//! ```ignore
//! use stardust::prelude::*;
//!
//! fn main() -> Result<(), RunError> {
//!     let config = EngineConfig::default()
//!         .with_particle_count(8000)
//!         .with_preset(MotionPreset::Galaxy)
//!         .with_shape(ParticleShape::Star);
//!     stardust::run(config)
//! }
//! ```
//!
//! ## Headless use
//!
//! The engine does not need a window. Drive it with your own clock and read
//! the arrays back:
//!
//! ```ignore
//! let mut engine = Engine::new(EngineConfig::default().with_seed(1))?;
//! engine.start();
//! for _ in 0..60 {
//!     engine.tick(1.0 / 60.0);
//! }
//! let positions = engine.population().unwrap().positions();
//! ```
//!
//! ## Modules
//!
//! | Module | Role |
//! |--------|------|
//! | [`store`] | per-particle arrays and dirty tracking |
//! | [`presets`] | the seven motion models and jitter |
//! | [`interaction`] | pointer repulsion |
//! | [`color`] | base/accent color transition |
//! | [`visuals`] | point shapes and the WGSL shader |
//! | [`uniforms`] | GPU uniform layout and per-frame upload set |
//! | [`engine`] | playback and lifecycle |
//! | [`config`] | configuration and live property updates |

pub mod clock;
pub mod color;
pub mod config;
pub mod engine;
pub mod error;
mod gpu;
pub mod input;
pub mod interaction;
pub mod presets;
pub mod store;
pub mod uniforms;
pub mod visuals;
mod window;

pub use clock::Clock;
pub use config::{ColorValue, EngineConfig, PropertyUpdate, UpdateEffect};
pub use engine::{Engine, FrameListener, FrameStats, PlaybackState};
pub use error::{ConfigError, EngineError, GpuError, RunError};
pub use presets::MotionPreset;
pub use store::{DirtyFlags, Population};
pub use uniforms::{FrameUpload, ShaderGlobals, Uniforms};
pub use visuals::ParticleShape;
pub use window::run;

pub use glam::{Vec2, Vec3};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use stardust::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{EngineConfig, PropertyUpdate};
    pub use crate::engine::{Engine, FrameStats, PlaybackState};
    pub use crate::error::{EngineError, RunError};
    pub use crate::presets::MotionPreset;
    pub use crate::visuals::ParticleShape;
    pub use crate::{Vec2, Vec3};
}
