//! Integration tests for the engine's observable behaviour.
//!
//! Everything here runs headless: the engine is ticked with fixed deltas and
//! its arrays are inspected directly.

use std::cell::Cell;
use std::rc::Rc;

use stardust::prelude::*;
use stardust::{ConfigError, DirtyFlags};

const DT: f32 = 1.0 / 60.0;

fn seeded(count: usize) -> EngineConfig {
    EngineConfig::default().with_particle_count(count).with_seed(1234)
}

fn run_frames(engine: &mut Engine, frames: usize) {
    for _ in 0..frames {
        engine.tick(DT);
    }
}

// ============================================================================
// Particle store
// ============================================================================

#[test]
fn test_create_lengths_and_finite_positions() {
    for count in [1, 64, 5000] {
        let engine = Engine::new(seeded(count)).unwrap();
        let pop = engine.population().unwrap();
        assert_eq!(pop.len(), count);
        assert_eq!(pop.velocities().len(), count);
        assert_eq!(pop.colors().len(), count);
        assert_eq!(pop.sizes().len(), count);
        assert_eq!(pop.phases().len(), count);
        assert!(pop.positions().iter().all(|p| p.is_finite()));
    }
}

#[test]
fn test_same_seed_same_population() {
    let a = Engine::new(seeded(500)).unwrap();
    let b = Engine::new(seeded(500)).unwrap();
    assert_eq!(a.population(), b.population());
}

#[test]
fn test_phases_invariant_across_frames_and_presets() {
    let mut engine = Engine::new(seeded(1000)).unwrap();
    let phases = engine.population().unwrap().phases().to_vec();
    engine.start();

    for preset in MotionPreset::ALL {
        engine.set_motion_preset(preset);
        run_frames(&mut engine, 10);
    }
    assert_eq!(engine.population().unwrap().phases(), phases.as_slice());
}

// ============================================================================
// Playback
// ============================================================================

#[test]
fn test_pause_leaves_state_identical() {
    let mut engine = Engine::new(seeded(500).with_preset(MotionPreset::Nebula)).unwrap();
    engine.start();
    run_frames(&mut engine, 20);
    engine.pause();

    let elapsed = engine.elapsed();
    let snapshot = engine.population().unwrap().clone();
    run_frames(&mut engine, 50);

    assert_eq!(engine.elapsed(), elapsed);
    assert_eq!(engine.population().unwrap(), &snapshot);
}

#[test]
fn test_resume_continues_like_uninterrupted_run() {
    let config = seeded(800).with_preset(MotionPreset::Galaxy);

    let mut straight = Engine::new(config.clone()).unwrap();
    straight.start();
    run_frames(&mut straight, 11);

    let mut interrupted = Engine::new(config).unwrap();
    interrupted.start();
    run_frames(&mut interrupted, 10);
    interrupted.pause();
    run_frames(&mut interrupted, 30);
    interrupted.resume();
    run_frames(&mut interrupted, 1);

    assert_eq!(interrupted.elapsed(), straight.elapsed());
    assert_eq!(interrupted.population(), straight.population());
}

#[test]
fn test_reset_restores_count_and_time() {
    let mut engine = Engine::new(seeded(300)).unwrap();
    engine.start();
    engine.update_properties(&PropertyUpdate::new().particle_count(450)).unwrap();
    run_frames(&mut engine, 30);

    engine.reset().unwrap();
    assert_eq!(engine.particle_count(), 450);
    assert_eq!(engine.elapsed(), 0.0);
    assert_eq!(engine.state(), PlaybackState::Playing);
}

#[test]
fn test_speed_scales_elapsed_time() {
    let mut engine = Engine::new(seeded(10)).unwrap();
    engine.update_properties(&PropertyUpdate::new().speed(0.5)).unwrap();
    engine.start();
    run_frames(&mut engine, 60);
    assert!((engine.elapsed() - 0.5).abs() < 1e-4);
}

// ============================================================================
// Motion
// ============================================================================

#[test]
fn test_spiral_preserves_planar_radius() {
    // No jitter or pointer so the preset alone moves particles
    let mut config = seeded(400).with_preset(MotionPreset::Spiral);
    config.jitter = 0.0;
    let mut engine = Engine::new(config).unwrap();

    let radii: Vec<f32> = engine
        .population()
        .unwrap()
        .positions()
        .iter()
        .map(|p| (p.x * p.x + p.z * p.z).sqrt())
        .collect();

    engine.start();
    run_frames(&mut engine, 120);

    for (p, r) in engine.population().unwrap().positions().iter().zip(radii) {
        let now = (p.x * p.x + p.z * p.z).sqrt();
        assert!((now - r).abs() < 1e-2 * r.max(1.0), "radius {} -> {}", r, now);
    }
}

#[test]
fn test_explosion_end_to_end() {
    let mut engine = Engine::new(seeded(5000).with_preset(MotionPreset::Explosion)).unwrap();
    engine.start();
    run_frames(&mut engine, 60);

    assert!((engine.elapsed() - 1.0).abs() < 1e-3);
    for p in engine.population().unwrap().positions() {
        assert!(p.is_finite(), "non-finite position {:?}", p);
    }
}

#[test]
fn test_every_preset_stays_finite() {
    for preset in MotionPreset::ALL {
        let mut engine = Engine::new(seeded(300).with_preset(preset)).unwrap();
        engine.set_pointer(0.3, 0.3);
        engine.start();
        run_frames(&mut engine, 300);
        assert!(
            engine.population().unwrap().positions().iter().all(|p| p.is_finite()),
            "{} diverged",
            preset
        );
    }
}

#[test]
fn test_preset_switch_is_hard_cut() {
    let mut engine = Engine::new(seeded(50)).unwrap();
    engine.start();
    run_frames(&mut engine, 5);

    engine.set_preset("wave");
    let generation = engine.generation();
    engine.tick(DT);
    assert_eq!(engine.preset(), MotionPreset::Wave);
    // Switching presets never rebuilds the population
    assert_eq!(engine.generation(), generation);
}

// ============================================================================
// Color
// ============================================================================

#[test]
fn test_colors_fixed_when_transition_disabled() {
    let mut engine = Engine::new(seeded(500).with_color_transition(false)).unwrap();
    let colors = engine.population().unwrap().colors().to_vec();
    engine.start();
    run_frames(&mut engine, 100);
    assert_eq!(engine.population().unwrap().colors(), colors.as_slice());
}

#[test]
fn test_equal_base_and_accent_keep_colors_fixed() {
    let c = Vec3::new(0.3, 0.6, 0.9);
    let mut engine = Engine::new(seeded(200).with_colors(c, c)).unwrap();
    assert!(engine.population().unwrap().colors().iter().all(|color| *color == c));
    engine.start();
    for _ in 0..50 {
        engine.tick(DT);
        for color in engine.population().unwrap().colors() {
            assert_eq!(*color, c);
        }
    }
}

// ============================================================================
// Property updates
// ============================================================================

#[test]
fn test_shape_change_recreates_but_color_change_does_not() {
    let mut engine = Engine::new(seeded(300)).unwrap();
    let phases = engine.population().unwrap().phases().to_vec();

    let effect = engine
        .update_properties(&PropertyUpdate::new().base_color("#ff0000"))
        .unwrap();
    assert!(!effect.recreate);
    assert_eq!(engine.population().unwrap().phases(), phases.as_slice());

    let effect = engine
        .update_properties(&PropertyUpdate::new().particle_shape(ParticleShape::Heart))
        .unwrap();
    assert!(effect.recreate);
    assert_ne!(engine.population().unwrap().phases(), phases.as_slice());
    assert_eq!(engine.shader_globals().shape, ParticleShape::Heart);
}

#[test]
fn test_json_property_update() {
    let mut engine = Engine::new(seeded(100)).unwrap();
    let update = PropertyUpdate::from_json(
        r##"{
            "particleCount": 250,
            "particleShape": "star",
            "accentColor": "#00ff00",
            "mouseInfluence": 2.5,
            "sparkles": true
        }"##,
    )
    .unwrap();

    let effect = engine.update_properties(&update).unwrap();
    assert!(effect.recreate);
    assert_eq!(effect.ignored, vec!["sparkles".to_string()]);
    assert_eq!(engine.particle_count(), 250);
    assert_eq!(engine.config().accent_color, Vec3::new(0.0, 1.0, 0.0));
    assert_eq!(engine.config().mouse_influence, 2.5);
}

#[test]
fn test_bad_json_is_an_error() {
    assert!(matches!(
        PropertyUpdate::from_json("{ not json"),
        Err(ConfigError::Parse(_))
    ));
    assert!(matches!(
        PropertyUpdate::from_json(r#"{ "speed": "fast" }"#),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_oversized_population_is_allocation_error() {
    let result = Engine::new(seeded(usize::MAX / 8));
    assert!(matches!(result, Err(EngineError::Allocation { .. })));
}

#[test]
fn test_failed_recreation_keeps_previous_state() {
    let mut engine = Engine::new(seeded(300)).unwrap();
    let snapshot = engine.population().unwrap().clone();
    let generation = engine.generation();

    let result = engine.update_properties(&PropertyUpdate::new().particle_count(usize::MAX / 8));
    assert!(matches!(result, Err(EngineError::Allocation { .. })));

    assert_eq!(engine.particle_count(), 300);
    assert_eq!(engine.config().particle_count, 300);
    assert_eq!(engine.generation(), generation);
    assert_eq!(engine.population().unwrap(), &snapshot);

    // Still usable afterwards
    engine.start();
    assert!(engine.tick(DT));
}

#[test]
fn test_unknown_shape_and_preset_fall_back() {
    let config = EngineConfig::from_json_str(r#"{ "particleShape": "hexagon", "preset": "warp" }"#).unwrap();
    assert_eq!(config.particle_shape, ParticleShape::Circle);
    assert_eq!(config.preset, MotionPreset::Default);
}

// ============================================================================
// Renderer contract
// ============================================================================

#[test]
fn test_frame_upload_tracks_dirty_arrays() {
    let mut engine = Engine::new(seeded(100)).unwrap();
    engine.start();
    engine.clear_dirty();

    // Nothing ran yet
    let upload = engine.frame_upload().unwrap();
    assert!(upload.positions.is_none());
    assert!(upload.colors.is_none());
    assert_eq!(upload.byte_len(), 0);

    engine.tick(DT);
    let upload = engine.frame_upload().unwrap();
    assert_eq!(upload.positions.map(<[Vec3]>::len), Some(100));
    assert_eq!(upload.colors.map(<[Vec3]>::len), Some(100));
    assert_eq!(upload.byte_len(), 2 * 100 * 12);
    assert!((upload.globals.time - DT).abs() < 1e-6);
}

#[test]
fn test_generation_bumps_on_recreation_only() {
    let mut engine = Engine::new(seeded(100)).unwrap();
    assert_eq!(engine.generation(), 1);

    engine.update_properties(&PropertyUpdate::new().speed(3.0)).unwrap();
    assert_eq!(engine.generation(), 1);

    engine.update_properties(&PropertyUpdate::new().particle_count(101)).unwrap();
    assert_eq!(engine.generation(), 2);
    assert_eq!(engine.dirty(), DirtyFlags::all());

    engine.reset().unwrap();
    assert_eq!(engine.generation(), 3);
}

// ============================================================================
// Listeners and disposal
// ============================================================================

#[test]
fn test_failing_listener_does_not_stop_loop() {
    let mut engine = Engine::new(seeded(10)).unwrap();
    let frames = Rc::new(Cell::new(0u64));
    let counter = Rc::clone(&frames);

    engine.on_frame(|stats| {
        if stats.frame % 2 == 0 {
            Err(format!("even frame {}", stats.frame).into())
        } else {
            Ok(())
        }
    });
    engine.on_frame(move |stats| {
        counter.set(stats.frame);
        Ok(())
    });

    engine.start();
    run_frames(&mut engine, 6);
    assert_eq!(frames.get(), 6);
    assert_eq!(engine.stats().frame, 6);
}

#[test]
fn test_dispose_stops_frames() {
    let mut engine = Engine::new(seeded(10)).unwrap();
    engine.start();
    engine.tick(DT);
    engine.dispose();

    assert!(!engine.wants_frame());
    assert!(!engine.tick(DT));
    assert!(engine.population().is_none());
    assert!(matches!(engine.reset(), Err(EngineError::Disposed)));
}
