//! Streaming sources: pump refill, loop wraps, and edge cases.

mod common;

use aurasonic::AuraSonicConfig;
use common::{mock_engine, wait_until};
use std::time::Duration;

fn streaming_config() -> AuraSonicConfig {
    AuraSonicConfig::default()
        .num_streaming_voices(1)
        .stream_buffer_bytes(2000)
        .num_stream_buffers(2)
}

// With one streaming voice configured, the pool creates it first, so it
// always gets backend handle zero.
const STREAM_VOICE: usize = 0;

#[test]
fn stream_plays_to_completion_and_stops() {
    let (engine, _backend) = mock_engine(streaming_config());
    // 500ms of audio in 2000-byte (125ms) chunks.
    engine
        .new_source(engine.source_desc("s", "500ms.wav").streaming(true))
        .unwrap();
    engine.play("s").unwrap();

    assert!(wait_until(Duration::from_millis(300), || engine.playing("s")));
    assert!(wait_until(Duration::from_secs(2), || !engine.playing("s")));
}

#[test]
fn looping_stream_wraps_and_keeps_playing() {
    let (engine, backend) = mock_engine(streaming_config());
    // 375ms clip: initial preload covers 250ms, so the wrap happens
    // well inside the polling window.
    engine
        .new_source(
            engine
                .source_desc("loop", "375ms.wav")
                .streaming(true)
                .looping(true),
        )
        .unwrap();
    engine.play("loop").unwrap();

    assert!(wait_until(Duration::from_millis(500), || engine.playing("loop")));
    // At least one full wrap: the pump preloads once per lap.
    assert!(wait_until(Duration::from_secs(3), || {
        backend.preload_count(STREAM_VOICE) >= 2
    }));
    // Still audibly playing after the wrap, with no dropout observed.
    assert!(engine.playing("loop"));

    engine.stop("loop").unwrap();
    assert!(wait_until(Duration::from_millis(300), || !engine.playing("loop")));
}

#[test]
fn zero_length_stream_completes_immediately() {
    let (engine, _backend) = mock_engine(streaming_config());
    engine
        .new_source(engine.source_desc("empty", "0ms.wav").streaming(true))
        .unwrap();
    engine.play("empty").unwrap();
    // The pump drops it on the first pass; it never becomes audible.
    assert!(wait_until(Duration::from_millis(500), || !engine.playing("empty")));
}

#[test]
fn paused_stream_holds_position_until_resumed() {
    let (engine, _backend) = mock_engine(streaming_config());
    engine
        .new_source(
            engine
                .source_desc("s", "2000ms.wav")
                .streaming(true)
                .looping(true),
        )
        .unwrap();
    engine.play("s").unwrap();
    assert!(wait_until(Duration::from_millis(300), || engine.playing("s")));

    engine.pause("s").unwrap();
    assert!(wait_until(Duration::from_millis(300), || !engine.playing("s")));
    // Paused streams stay watched; resuming picks the refill back up.
    engine.play("s").unwrap();
    assert!(wait_until(Duration::from_millis(500), || engine.playing("s")));
}

#[test]
fn streaming_voice_contention_stops_the_older_stream() {
    let (engine, _backend) = mock_engine(streaming_config());
    engine
        .new_source(
            engine
                .source_desc("first", "2000ms.wav")
                .streaming(true)
                .looping(true),
        )
        .unwrap();
    engine
        .new_source(
            engine
                .source_desc("second", "2000ms.wav")
                .streaming(true)
                .looping(true),
        )
        .unwrap();

    engine.play("first").unwrap();
    assert!(wait_until(Duration::from_millis(300), || engine.playing("first")));

    // One streaming voice: the second play steals it.
    engine.play("second").unwrap();
    assert!(wait_until(Duration::from_millis(500), || engine.playing("second")));
    assert!(!engine.playing("first"));
}

#[test]
fn rewound_stream_restarts_from_the_top() {
    let (engine, backend) = mock_engine(streaming_config());
    engine
        .new_source(engine.source_desc("s", "2000ms.wav").streaming(true))
        .unwrap();
    engine.play("s").unwrap();
    assert!(wait_until(Duration::from_millis(300), || engine.playing("s")));
    let preloads_before = backend.preload_count(STREAM_VOICE);

    engine.rewind("s").unwrap();
    // Rewinding a playing stream restarts it with a fresh preload.
    assert!(wait_until(Duration::from_secs(1), || {
        backend.preload_count(STREAM_VOICE) > preloads_before
    }));
    assert!(wait_until(Duration::from_millis(500), || engine.playing("s")));
}
