//! Playback lifecycle: one-shot sources, voice eviction, priority,
//! cull/activate, and the temporary-source reaper.

mod common;

use aurasonic::{AuraSonic, AuraSonicConfig, BackendChoice, NullBackend};
use common::{mock_engine, wait_until};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn oneshot_plays_and_completes() {
    let (engine, _backend) = mock_engine(AuraSonicConfig::default());
    engine.new_source(engine.source_desc("a", "80ms.wav")).unwrap();
    engine.play("a").unwrap();

    assert!(wait_until(Duration::from_millis(200), || engine.playing("a")));
    assert!(wait_until(Duration::from_secs(1), || !engine.playing("a")));
    // The source itself survives; only temporary sources are reaped.
    assert!(engine.list_sources().contains(&"a".to_string()));
}

#[test]
fn replay_after_completion_reuses_the_voice() {
    let (engine, _backend) = mock_engine(AuraSonicConfig::default());
    engine.new_source(engine.source_desc("a", "60ms.wav")).unwrap();
    engine.play("a").unwrap();
    assert!(wait_until(Duration::from_millis(200), || engine.playing("a")));
    assert!(wait_until(Duration::from_secs(1), || !engine.playing("a")));

    engine.play("a").unwrap();
    assert!(wait_until(Duration::from_millis(200), || engine.playing("a")));
}

#[test]
fn pause_and_resume() {
    let (engine, _backend) = mock_engine(AuraSonicConfig::default());
    engine.new_source(engine.source_desc("a", "5000ms.wav")).unwrap();
    engine.play("a").unwrap();
    assert!(wait_until(Duration::from_millis(200), || engine.playing("a")));

    engine.pause("a").unwrap();
    assert!(wait_until(Duration::from_millis(200), || !engine.playing("a")));

    engine.play("a").unwrap();
    assert!(wait_until(Duration::from_millis(200), || engine.playing("a")));

    engine.stop("a").unwrap();
    assert!(wait_until(Duration::from_millis(200), || !engine.playing("a")));
}

#[test]
fn eviction_steals_the_single_voice() {
    let config = AuraSonicConfig::default().num_normal_voices(1);
    let (engine, _backend) = mock_engine(config);
    engine.new_source(engine.source_desc("a", "5000ms.wav")).unwrap();
    engine.new_source(engine.source_desc("b", "5000ms.wav")).unwrap();

    engine.play("a").unwrap();
    assert!(wait_until(Duration::from_millis(200), || engine.playing("a")));

    engine.play("b").unwrap();
    assert!(wait_until(Duration::from_millis(200), || engine.playing("b")));
    assert!(!engine.playing("a"));
}

#[test]
fn priority_source_blocks_eviction() {
    let config = AuraSonicConfig::default().num_normal_voices(1);
    let (engine, _backend) = mock_engine(config);
    engine
        .new_source(engine.source_desc("a", "5000ms.wav").priority(true))
        .unwrap();
    engine.new_source(engine.source_desc("b", "5000ms.wav")).unwrap();

    engine.play("a").unwrap();
    assert!(wait_until(Duration::from_millis(200), || engine.playing("a")));

    // The play fails silently; "a" keeps its voice.
    engine.play("b").unwrap();
    std::thread::sleep(Duration::from_millis(100));
    assert!(engine.playing("a"));
    assert!(!engine.playing("b"));
}

#[test]
fn cull_releases_and_activate_reinstates() {
    let (engine, _backend) = mock_engine(AuraSonicConfig::default());
    engine
        .new_source(engine.source_desc("a", "5000ms.wav").looping(true))
        .unwrap();
    engine.play("a").unwrap();
    assert!(wait_until(Duration::from_millis(200), || engine.playing("a")));

    engine.cull("a").unwrap();
    assert!(wait_until(Duration::from_millis(200), || !engine.playing("a")));

    // Culled and looping: reactivation replays it automatically.
    engine.activate("a").unwrap();
    assert!(wait_until(Duration::from_millis(500), || engine.playing("a")));
}

#[test]
fn play_while_culled_defers_until_activate() {
    let (engine, _backend) = mock_engine(AuraSonicConfig::default());
    engine
        .new_source(engine.source_desc("a", "5000ms.wav").looping(true))
        .unwrap();
    engine.cull("a").unwrap();
    engine.play("a").unwrap();
    std::thread::sleep(Duration::from_millis(100));
    assert!(!engine.playing("a"));

    engine.activate("a").unwrap();
    assert!(wait_until(Duration::from_millis(500), || engine.playing("a")));
}

#[test]
fn quick_play_temporary_is_reaped() {
    let (engine, _backend) = mock_engine(AuraSonicConfig::default());
    engine
        .quick_play(engine.source_desc("t", "100ms.wav").temporary(true))
        .unwrap();
    assert!(wait_until(Duration::from_millis(300), || engine.playing("t")));
    assert!(wait_until(Duration::from_millis(400), || !engine.playing("t")));

    // The reaper runs on a ten second cadence.
    assert!(wait_until(Duration::from_secs(13), || {
        !engine.list_sources().contains(&"t".to_string())
    }));
}

#[test]
fn remove_source_takes_effect() {
    let (engine, _backend) = mock_engine(AuraSonicConfig::default());
    engine.new_source(engine.source_desc("a", "5000ms.wav")).unwrap();
    engine.play("a").unwrap();
    assert!(wait_until(Duration::from_millis(200), || engine.playing("a")));

    engine.remove_source("a").unwrap();
    assert!(wait_until(Duration::from_millis(300), || {
        !engine.list_sources().contains(&"a".to_string())
    }));
    assert!(!engine.playing("a"));
}

#[test]
fn empty_sourcename_is_rejected_synchronously() {
    let (engine, _backend) = mock_engine(AuraSonicConfig::default());
    assert!(engine.play("").is_err());
    assert!(engine.new_source(engine.source_desc("", "80ms.wav")).is_err());
    assert!(engine.set_volume("", 0.5).is_err());
}

#[test]
fn unknown_source_queries_fail_quietly() {
    let (engine, _backend) = mock_engine(AuraSonicConfig::default());
    assert!(!engine.playing("ghost"));
    assert!(engine.get_volume("ghost").is_err());
    assert!(engine.get_position("ghost").is_err());
    // Commands against unknown names are absorbed by the worker.
    engine.play("ghost").unwrap();
    engine.stop("ghost").unwrap();
}

#[test]
fn null_backend_is_always_silent() {
    let mut engine = AuraSonic::with_loader(
        AuraSonicConfig::default(),
        Arc::new(common::ToneLoader),
    );
    engine.init(vec![BackendChoice::Custom(Box::new(NullBackend::new()))]);
    engine.new_source(engine.source_desc("a", "80ms.wav")).unwrap();
    engine.play("a").unwrap();
    std::thread::sleep(Duration::from_millis(150));
    // The null backend never reports playback.
    assert!(!engine.playing("a"));
    assert!(engine.list_sources().contains(&"a".to_string()));
    engine.shutdown();
}

#[test]
fn shutdown_is_idempotent_and_quick() {
    let (mut engine, _backend) = mock_engine(AuraSonicConfig::default());
    engine.new_source(engine.source_desc("a", "5000ms.wav")).unwrap();
    engine.play("a").unwrap();
    wait_until(Duration::from_millis(200), || engine.playing("a"));
    engine.shutdown();
    engine.shutdown();
}
