//! Spatial behavior through the facade: attenuation, pan, listener
//! motion, and master volume.

mod common;

use aurasonic::math::Vec3;
use aurasonic::{Attenuation, AuraSonicConfig};
use common::{mock_engine, wait_until};
use std::f32::consts::FRAC_PI_2;
use std::time::Duration;

#[test]
fn linear_attenuation_reaches_zero_at_the_limit() {
    let (engine, _backend) = mock_engine(AuraSonicConfig::default());
    engine
        .new_source(
            engine
                .source_desc("far", "80ms.wav")
                .position(Vec3::new(1000.0, 0.0, 0.0))
                .attenuation(Attenuation::Linear)
                .dist_or_roll(500.0),
        )
        .unwrap();
    engine.set_listener_position(Vec3::ZERO);

    assert!(wait_until(Duration::from_millis(300), || {
        engine.get_computed_gain("far").map(|g| g == 0.0).unwrap_or(false)
    }));
    assert_eq!(engine.get_distance("far").unwrap(), 1000.0);
}

#[test]
fn gain_at_listener_is_volume_times_master() {
    let (engine, _backend) = mock_engine(AuraSonicConfig::default());
    engine
        .new_source(
            engine
                .source_desc("here", "80ms.wav")
                .attenuation(Attenuation::InverseRolloff)
                .dist_or_roll(0.03),
        )
        .unwrap();
    engine.set_volume("here", 0.8).unwrap();
    engine.set_master_volume(0.5);

    assert!(wait_until(Duration::from_millis(300), || {
        engine
            .get_computed_gain("here")
            .map(|gain| (gain - 0.4).abs() < 1.0e-6)
            .unwrap_or(false)
    }));
}

#[test]
fn master_volume_zero_silences_every_source() {
    let (engine, _backend) = mock_engine(AuraSonicConfig::default());
    for (name, x) in [("a", 0.0), ("b", 5.0), ("c", 250.0)] {
        engine
            .new_source(
                engine
                    .source_desc(name, "80ms.wav")
                    .position(Vec3::new(x, 0.0, 0.0)),
            )
            .unwrap();
    }
    engine.set_master_volume(0.0);

    assert!(wait_until(Duration::from_millis(300), || {
        ["a", "b", "c"].iter().all(|name| {
            engine
                .get_computed_gain(name)
                .map(|g| g == 0.0)
                .unwrap_or(false)
        })
    }));
    assert_eq!(engine.master_volume(), 0.0);
}

#[test]
fn last_position_write_wins() {
    let (engine, _backend) = mock_engine(AuraSonicConfig::default());
    engine.new_source(engine.source_desc("a", "80ms.wav")).unwrap();
    for step in 0..50 {
        engine
            .set_position("a", Vec3::new(step as f32, 0.0, 0.0))
            .unwrap();
    }
    let final_position = Vec3::new(123.0, 0.0, -7.0);
    engine.set_position("a", final_position).unwrap();

    assert!(wait_until(Duration::from_millis(300), || {
        engine
            .get_position("a")
            .map(|p| p == final_position)
            .unwrap_or(false)
    }));
    // Gain reflects the final position.
    let expected_distance = final_position.length();
    assert!(wait_until(Duration::from_millis(300), || {
        engine
            .get_distance("a")
            .map(|d| (d - expected_distance).abs() < 1.0e-3)
            .unwrap_or(false)
    }));
}

#[test]
fn listener_position_round_trips() {
    let (engine, _backend) = mock_engine(AuraSonicConfig::default());
    let target = Vec3::new(10.0, 2.0, -3.0);
    engine.set_listener_position(target);
    assert!(wait_until(Duration::from_millis(300), || {
        engine.listener().position() == target
    }));

    engine.move_listener(Vec3::new(1.0, 0.0, 0.0));
    assert!(wait_until(Duration::from_millis(300), || {
        engine.listener().position() == Vec3::new(11.0, 2.0, -3.0)
    }));
}

#[test]
fn listener_orientation_is_normalized_on_read() {
    let (engine, _backend) = mock_engine(AuraSonicConfig::default());
    engine.set_listener_orientation(Vec3::new(0.0, 0.0, -9.0), Vec3::new(0.0, 4.0, 0.0));
    assert!(wait_until(Duration::from_millis(300), || {
        let listener = engine.listener();
        (listener.look().length() - 1.0).abs() < 1.0e-6
            && (listener.up().length() - 1.0).abs() < 1.0e-6
    }));
}

#[test]
fn turning_listener_swaps_pan_sides() {
    let (engine, backend) = mock_engine(AuraSonicConfig::default());
    engine
        .new_source(
            engine
                .source_desc("right", "5000ms.wav")
                .position(Vec3::new(10.0, 0.0, 0.0))
                .attenuation(Attenuation::None),
        )
        .unwrap();
    engine.play("right").unwrap();
    assert!(wait_until(Duration::from_millis(300), || engine.playing("right")));

    // Mock backend records the engine-computed pan. Find the voice by
    // its nonzero pan once the play settles.
    let voice_of = |backend: &aurasonic::MockBackend| {
        (0..40).find(|&v| backend.voice_pan(v).abs() > 0.5)
    };
    assert!(wait_until(Duration::from_millis(500), || {
        voice_of(&backend).is_some()
    }));
    let voice = voice_of(&backend).unwrap();
    assert!(backend.voice_pan(voice) > 0.5);

    // Turn to face the source: it is now dead ahead, so the pan
    // returns to center.
    engine.set_listener_angle(-FRAC_PI_2);
    assert!(wait_until(Duration::from_millis(500), || {
        backend.voice_pan(voice).abs() < 0.1
    }));
}

#[test]
fn moving_listener_updates_pushed_gain() {
    let (engine, backend) = mock_engine(AuraSonicConfig::default());
    engine
        .new_source(
            engine
                .source_desc("s", "5000ms.wav")
                .attenuation(Attenuation::Linear)
                .dist_or_roll(100.0),
        )
        .unwrap();
    engine.play("s").unwrap();
    assert!(wait_until(Duration::from_millis(300), || engine.playing("s")));

    // The only audible voice is the one backing "s".
    let voice = (0..40)
        .find(|&v| aurasonic::Backend::is_playing(&backend, v))
        .expect("no playing voice found");
    assert!(backend.voice_gain(voice) > 0.9);

    // Walk half the fade distance away; pushed gain tracks the drop.
    engine.set_listener_position(Vec3::new(50.0, 0.0, 0.0));
    assert!(wait_until(Duration::from_millis(500), || {
        (backend.voice_gain(voice) - 0.5).abs() < 0.05
    }));
}
