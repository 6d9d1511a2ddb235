//! Playback and lifecycle controller.
//!
//! [`Engine`] owns the particle store and every piece of global animation
//! state. The host drives it explicitly: call [`Engine::tick`] once per
//! redraw with the wall-clock delta and ask [`Engine::wants_frame`] whether
//! another redraw should be scheduled.
//!
//! Each playing frame runs, per particle:
//!
//! 1. the active [`MotionPreset`]
//! 2. the pointer [`Repulsor`], when enabled and a pointer is present
//! 3. phase-keyed [`jitter`]
//! 4. the color transition, when enabled
//!
//! and then marks the touched arrays dirty for the renderer.
//!
//! ```ignore
//! let mut engine = Engine::new(EngineConfig::default())?;
//! engine.start();
//! while engine.wants_frame() {
//!     engine.tick(clock.tick());
//!     renderer.upload(engine.frame_upload());
//!     engine.clear_dirty();
//! }
//! ```

use std::error::Error;
use std::f32::consts::TAU;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::color::transition_color;
use crate::config::{EngineConfig, PropertyUpdate, UpdateEffect};
use crate::error::EngineError;
use crate::interaction::{Pointer, Repulsor};
use crate::presets::{jitter, MotionPreset};
use crate::store::{DirtyFlags, ParticleStore, Population};
use crate::uniforms::{FrameUpload, ShaderGlobals};

/// Playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Created but never started, or disposed.
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Summary of the most recent frame, handed to frame listeners.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameStats {
    /// Frames produced since creation.
    pub frame: u64,
    /// Animation time after this frame.
    pub elapsed: f32,
    /// Animation time this frame advanced by (wall delta times speed).
    pub delta: f32,
    pub particle_count: usize,
    pub preset: MotionPreset,
}

/// Callback run after every produced frame.
///
/// An `Err` is logged and the frame loop carries on.
pub type FrameListener = Box<dyn FnMut(&FrameStats) -> Result<(), Box<dyn Error>>>;

/// The particle animation engine.
pub struct Engine {
    config: EngineConfig,
    store: ParticleStore,
    rng: StdRng,
    pointer: Pointer,
    state: PlaybackState,
    elapsed: f32,
    rotation: f32,
    stats: FrameStats,
    listeners: Vec<FrameListener>,
    disposed: bool,
}

impl Engine {
    /// Create an engine and sample its initial population.
    ///
    /// The engine starts [`PlaybackState::Stopped`]; call [`Engine::start`].
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let config = config.sanitized();
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let store = ParticleStore::new(config.particle_count, &config.spawn_params(), &mut rng)?;

        Ok(Self {
            stats: FrameStats {
                particle_count: store.len(),
                preset: config.preset,
                ..FrameStats::default()
            },
            config,
            store,
            rng,
            pointer: Pointer::new(),
            state: PlaybackState::Stopped,
            elapsed: 0.0,
            rotation: 0.0,
            listeners: Vec::new(),
            disposed: false,
        })
    }

    /// Begin producing frames.
    pub fn start(&mut self) {
        if self.disposed {
            log::warn!("start() called on a disposed engine");
            return;
        }
        if self.state != PlaybackState::Playing {
            log::info!("Playback started ({} particles, preset {})", self.store.len(), self.config.preset);
            self.state = PlaybackState::Playing;
        }
    }

    /// Stop producing frames. Time and particle state freeze.
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            log::info!("Playback paused at t={:.2}", self.elapsed);
            self.state = PlaybackState::Paused;
        }
    }

    /// Continue after [`Engine::pause`].
    pub fn resume(&mut self) {
        if self.state == PlaybackState::Paused {
            log::info!("Playback resumed at t={:.2}", self.elapsed);
            self.state = PlaybackState::Playing;
        }
    }

    /// Flip between playing and paused. A stopped engine starts.
    pub fn toggle(&mut self) {
        match self.state {
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused => self.resume(),
            PlaybackState::Stopped => self.start(),
        }
    }

    /// Zero the elapsed time and sample a fresh population.
    ///
    /// Works in any playback state and leaves that state unchanged.
    pub fn reset(&mut self) -> Result<(), EngineError> {
        if self.disposed {
            return Err(EngineError::Disposed);
        }
        self.store
            .replace(self.config.particle_count, &self.config.spawn_params(), &mut self.rng)?;
        self.elapsed = 0.0;
        self.rotation = 0.0;
        self.stats.elapsed = 0.0;
        self.stats.delta = 0.0;
        self.stats.particle_count = self.store.len();
        log::info!("Engine reset");
        Ok(())
    }

    /// Select a preset by name. Unknown names select the default preset.
    pub fn set_preset(&mut self, name: &str) {
        self.set_motion_preset(MotionPreset::from_name(name));
    }

    /// Select a preset. Takes effect on the next frame.
    pub fn set_motion_preset(&mut self, preset: MotionPreset) {
        if preset != self.config.preset {
            log::debug!("Preset {} -> {}", self.config.preset, preset);
            self.config.preset = preset;
            self.stats.preset = preset;
        }
    }

    /// Record the pointer in normalized device coordinates.
    pub fn set_pointer(&mut self, x: f32, y: f32) {
        self.pointer.set(x, y);
    }

    /// The pointer left the canvas.
    pub fn clear_pointer(&mut self) {
        self.pointer.clear();
    }

    /// Apply a partial property update.
    ///
    /// Count and shape changes recreate the population; everything else is
    /// patched in place and shows up on the next frame. If recreation fails
    /// the engine keeps its previous config and population.
    pub fn update_properties(&mut self, update: &PropertyUpdate) -> Result<UpdateEffect, EngineError> {
        if self.disposed {
            return Err(EngineError::Disposed);
        }

        let mut next = self.config.clone();
        let effect = next.apply(update);

        if effect.recreate {
            self.store
                .replace(next.particle_count, &next.spawn_params(), &mut self.rng)?;
            self.stats.particle_count = self.store.len();
        }
        if !effect.changed.is_empty() {
            log::debug!("Updated properties: {}", effect.changed.join(", "));
        }

        self.config = next;
        Ok(effect)
    }

    /// Register a callback run after every frame.
    pub fn on_frame<F>(&mut self, listener: F)
    where
        F: FnMut(&FrameStats) -> Result<(), Box<dyn Error>> + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Advance one frame by `dt` seconds of wall time.
    ///
    /// Returns true if a frame was produced. Nothing happens unless the
    /// engine is playing.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.disposed || self.state != PlaybackState::Playing {
            return false;
        }

        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let step = dt * self.config.speed;
        self.elapsed += step;
        self.rotation = (self.rotation + self.config.rotation_speed * step).rem_euclid(TAU);

        let time = self.elapsed;
        let config = &self.config;
        let repulsor = if config.mouse_interaction {
            self.pointer.world_point().map(|center| Repulsor {
                center,
                radius: config.interaction_radius,
                strength: config.mouse_influence,
            })
        } else {
            None
        };

        let Some(population) = self.store.population_mut() else {
            return false;
        };
        advance(population, config, repulsor.as_ref(), time);

        self.store.mark_dirty(DirtyFlags {
            positions: true,
            colors: config.color_transition,
        });

        self.stats = FrameStats {
            frame: self.stats.frame + 1,
            elapsed: self.elapsed,
            delta: step,
            particle_count: self.store.len(),
            preset: config.preset,
        };
        self.notify();
        true
    }

    fn notify(&mut self) {
        let stats = self.stats;
        for listener in &mut self.listeners {
            if let Err(e) = listener(&stats) {
                log::warn!("Frame listener failed at frame {}: {}", stats.frame, e);
            }
        }
    }

    /// Release the population and stop for good.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.store.release();
        self.listeners.clear();
        self.state = PlaybackState::Stopped;
        self.disposed = true;
        log::info!("Engine disposed");
    }

    /// Whether the host should schedule another frame.
    pub fn wants_frame(&self) -> bool {
        !self.disposed && self.state == PlaybackState::Playing
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Animation time in seconds.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Model rotation about Y, in radians within [0, 2π).
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn particle_count(&self) -> usize {
        self.store.len()
    }

    pub fn population(&self) -> Option<&Population> {
        self.store.population()
    }

    /// Bumped whenever the population is recreated.
    pub fn generation(&self) -> u64 {
        self.store.generation()
    }

    pub fn dirty(&self) -> DirtyFlags {
        self.store.dirty()
    }

    /// Mark the current arrays as uploaded.
    pub fn clear_dirty(&mut self) {
        self.store.clear_dirty();
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn preset(&self) -> MotionPreset {
        self.config.preset
    }

    pub fn pointer(&self) -> &Pointer {
        &self.pointer
    }

    /// Stats of the most recent frame.
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Global shading inputs for the current frame.
    pub fn shader_globals(&self) -> ShaderGlobals {
        ShaderGlobals {
            time: self.elapsed,
            size_multiplier: self.config.particle_size,
            base_color: self.config.base_color,
            accent_color: self.config.accent_color,
            shape: self.config.particle_shape,
        }
    }

    /// Everything the renderer has to push this frame, or `None` once
    /// disposed.
    pub fn frame_upload(&self) -> Option<FrameUpload<'_>> {
        let population = self.store.population()?;
        Some(FrameUpload::from_dirty(self.shader_globals(), population, self.store.dirty()))
    }
}

/// Run one frame of motion and color over every particle.
fn advance(population: &mut Population, config: &EngineConfig, repulsor: Option<&Repulsor>, time: f32) {
    let preset = config.preset;
    let amplitude = config.jitter;

    for (i, (position, phase)) in population
        .positions
        .iter_mut()
        .zip(population.phases.iter())
        .enumerate()
    {
        preset.apply(position, i, time);
        if let Some(repulsor) = repulsor {
            repulsor.apply(position);
        }
        jitter(position, *phase, time, amplitude);
    }

    if config.color_transition {
        let (base, accent) = (config.base_color, config.accent_color);
        for (color, phase) in population.colors.iter_mut().zip(population.phases.iter()) {
            *color = transition_color(base, accent, time, *phase);
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state)
            .field("elapsed", &self.elapsed)
            .field("particles", &self.store.len())
            .field("preset", &self.config.preset)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
