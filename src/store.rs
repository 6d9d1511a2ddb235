//! Per-particle attribute storage.
//!
//! Particles are stored as parallel arrays (structure of arrays) so the
//! renderer can upload each attribute as its own instance buffer and skip
//! the ones that did not change this frame.
//!
//! # Spawn distribution
//!
//! | Attribute | Distribution |
//! |-----------|--------------|
//! | position  | uniform in the volume of the shell 20 <= r <= 100: `r = cbrt(20³ + u(100³ - 20³))`, azimuth uniform, polar angle `acos(2v - 1)` |
//! | velocity  | each axis uniform in [-0.01, 0.01] |
//! | color     | `base + (accent - base) * w`, `w` uniform in [0, 1] |
//! | size      | uniform in `[0.5, 0.5 + size_range]` |
//! | phase     | uniform in `[0, 2π)` |

use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;

use crate::color::mix;
use crate::error::EngineError;

/// Inner radius of the spawn shell.
pub const MIN_SPAWN_RADIUS: f32 = 20.0;
/// Outer radius of the spawn shell.
pub const MAX_SPAWN_RADIUS: f32 = 100.0;
/// Per-axis bound of the initial velocity.
pub const MAX_INITIAL_SPEED: f32 = 0.01;
/// Smallest particle size regardless of the configured range.
pub const BASE_PARTICLE_SIZE: f32 = 0.5;

/// Parameters that shape a freshly spawned population.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnParams {
    /// Width of the random size range added on top of [`BASE_PARTICLE_SIZE`].
    pub size_range: f32,
    /// First endpoint of the initial color blend.
    pub base_color: Vec3,
    /// Second endpoint of the initial color blend.
    pub accent_color: Vec3,
}

/// A fixed-size population of particles.
///
/// All five arrays always have the same length, and a particle's index never
/// changes for the lifetime of the population.
#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    pub(crate) positions: Vec<Vec3>,
    pub(crate) velocities: Vec<Vec3>,
    pub(crate) colors: Vec<Vec3>,
    pub(crate) sizes: Vec<f32>,
    pub(crate) phases: Vec<f32>,
}

fn alloc<T>(count: usize) -> Result<Vec<T>, EngineError> {
    let mut v = Vec::new();
    v.try_reserve_exact(count)
        .map_err(|_| EngineError::Allocation { requested: count })?;
    Ok(v)
}

impl Population {
    /// Sample a new population of `count` particles.
    pub fn create<R: Rng + ?Sized>(
        count: usize,
        params: &SpawnParams,
        rng: &mut R,
    ) -> Result<Self, EngineError> {
        let mut positions = alloc(count)?;
        let mut velocities = alloc(count)?;
        let mut colors = alloc(count)?;
        let mut sizes = alloc(count)?;
        let mut phases = alloc(count)?;

        let size_range = params.size_range.max(0.0);
        let inner = MIN_SPAWN_RADIUS.powi(3);
        let outer = MAX_SPAWN_RADIUS.powi(3);

        for _ in 0..count {
            // Cube-root transform spreads particles evenly through the shell volume
            let radius = (inner + rng.gen::<f32>() * (outer - inner))
                .cbrt()
                .clamp(MIN_SPAWN_RADIUS, MAX_SPAWN_RADIUS);
            let theta = rng.gen_range(0.0..TAU);
            // Inverse-transform on the polar angle keeps the sphere area-correct
            let phi = (2.0 * rng.gen::<f32>() - 1.0).clamp(-1.0, 1.0).acos();

            positions.push(Vec3::new(
                radius * phi.sin() * theta.cos(),
                radius * phi.sin() * theta.sin(),
                radius * phi.cos(),
            ));

            velocities.push(Vec3::new(
                rng.gen_range(-MAX_INITIAL_SPEED..=MAX_INITIAL_SPEED),
                rng.gen_range(-MAX_INITIAL_SPEED..=MAX_INITIAL_SPEED),
                rng.gen_range(-MAX_INITIAL_SPEED..=MAX_INITIAL_SPEED),
            ));

            let blend = rng.gen::<f32>();
            colors.push(mix(params.base_color, params.accent_color, blend));

            sizes.push(BASE_PARTICLE_SIZE + rng.gen::<f32>() * size_range);
            phases.push(rng.gen_range(0.0..TAU));
        }

        Ok(Self {
            positions,
            velocities,
            colors,
            sizes,
            phases,
        })
    }

    /// Number of particles.
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the population holds no particles.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    #[inline]
    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities
    }

    #[inline]
    pub fn colors(&self) -> &[Vec3] {
        &self.colors
    }

    #[inline]
    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    #[inline]
    pub fn phases(&self) -> &[f32] {
        &self.phases
    }
}

/// Which attribute arrays were written since the renderer last uploaded them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirtyFlags {
    pub positions: bool,
    pub colors: bool,
}

impl DirtyFlags {
    /// Flags with every array marked dirty.
    pub fn all() -> Self {
        Self {
            positions: true,
            colors: true,
        }
    }

    /// Returns true if nothing needs uploading.
    pub fn is_clean(&self) -> bool {
        !self.positions && !self.colors
    }
}

/// Owner of the current population.
///
/// Recreation builds the replacement completely before swapping it in, so a
/// reader never observes arrays of mismatched length.
#[derive(Debug, Default)]
pub struct ParticleStore {
    population: Option<Population>,
    generation: u64,
    dirty: DirtyFlags,
}

impl ParticleStore {
    /// Create a store holding a freshly sampled population.
    pub fn new<R: Rng + ?Sized>(
        count: usize,
        params: &SpawnParams,
        rng: &mut R,
    ) -> Result<Self, EngineError> {
        let mut store = Self::default();
        store.replace(count, params, rng)?;
        Ok(store)
    }

    /// Drop the current population and sample a new one.
    ///
    /// On failure the previous population is left untouched.
    pub fn replace<R: Rng + ?Sized>(
        &mut self,
        count: usize,
        params: &SpawnParams,
        rng: &mut R,
    ) -> Result<(), EngineError> {
        let fresh = Population::create(count, params, rng)?;
        self.population = Some(fresh);
        self.generation += 1;
        self.dirty = DirtyFlags::all();
        log::info!("Created particle population of {} (generation {})", count, self.generation);
        Ok(())
    }

    /// Release the population's buffers.
    pub fn release(&mut self) {
        if self.population.take().is_some() {
            log::debug!("Released particle population (generation {})", self.generation);
        }
        self.dirty = DirtyFlags::default();
    }

    /// The current population, if one exists.
    pub fn population(&self) -> Option<&Population> {
        self.population.as_ref()
    }

    pub(crate) fn population_mut(&mut self) -> Option<&mut Population> {
        self.population.as_mut()
    }

    /// Number of particles, or 0 when released.
    pub fn len(&self) -> usize {
        self.population.as_ref().map_or(0, Population::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Counter bumped on every recreation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    pub(crate) fn mark_dirty(&mut self, flags: DirtyFlags) {
        self.dirty.positions |= flags.positions;
        self.dirty.colors |= flags.colors;
    }

    /// Clear dirty flags once the renderer has consumed them.
    pub fn clear_dirty(&mut self) {
        self.dirty = DirtyFlags::default();
    }
}
