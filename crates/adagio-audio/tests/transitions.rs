//! Fade-out and crossfade edits on a streaming engine.

#![allow(clippy::unwrap_used)]

mod common;

use adagio_audio::{OutputDevice, OutputHandle, Renderer, StreamSpec, StreamState};
use adagio_core::{Error, Result};
use common::{frames, SnippetDir};

const GUARD_MS: u64 = 100;

fn queue_dir() -> SnippetDir {
    let dir = SnippetDir::new();
    dir.constant("a_1.wav", 1_000, 1_000)
        .constant("a_2.wav", 1_000, 1_000)
        .constant("a_3.wav", 1_000, 1_000)
        .constant("b_1.wav", 1_000, -1_000)
        .constant("b_2.wav", 500, -2_000);
    dir
}

#[test]
fn test_fade_out_over_pending_tail() {
    let dir = queue_dir();
    let (engine, output) = dir.streaming();
    engine.write_to_pipeline(&["a_1.wav", "a_2.wav"]).unwrap();
    engine.fade_and_stop_playback();

    let snapshot = engine.pipeline_snapshot();
    assert_eq!(snapshot.names, vec!["a_1.wav", "a_2.wav"]);

    let total = frames(2_000 + GUARD_MS);
    let rendered = output.pull_frames(total, 4_096).unwrap();
    // Untouched up to the guard of the faded snippet, then falling to silence
    assert!(rendered[..frames(1_100) * 2].iter().all(|&s| s == 1_000));
    let mid = rendered[frames(1_500) * 2];
    assert!(0 < mid && mid < 1_000);
    assert!(rendered[rendered.len() - 2..].iter().all(|&s| s == 0));
    assert!(!engine.is_silent());

    let after = output.pull(256).unwrap();
    assert!(after.iter().all(|&s| s == 0));
    assert!(engine.is_silent());
}

#[test]
fn test_fade_out_truncates_to_lookahead_window() {
    let dir = queue_dir();
    let (engine, _output) = dir.streaming();
    let names = ["a_1.wav", "a_2.wav", "a_3.wav", "a_1.wav", "a_2.wav", "a_3.wav", "a_1.wav"];
    engine.write_to_pipeline(&names).unwrap();

    engine.fade_and_stop_playback();
    let snapshot = engine.pipeline_snapshot();
    assert_eq!(snapshot.cursor, 0);
    assert_eq!(snapshot.pending().len(), engine.config().lookahead_window);
    assert_eq!(snapshot.names, names[..5].to_vec());
}

#[test]
fn test_fade_out_of_live_snippet() {
    let dir = queue_dir();
    let (engine, output) = dir.streaming();
    engine.write_to_pipeline(&["a_1.wav"]).unwrap();
    output.pull(frames(500)).unwrap();

    engine.fade_and_stop_playback();
    let rendered = output.pull(frames(500 + GUARD_MS)).unwrap();
    assert!(rendered[..frames(GUARD_MS) * 2].iter().all(|&s| s == 1_000));
    assert!(rendered[rendered.len() - 2..].iter().all(|&s| s == 0));

    output.pull(16).unwrap();
    assert!(engine.is_silent());
}

#[test]
fn test_fade_out_while_silent_is_a_no_op() {
    let dir = queue_dir();
    let (engine, output) = dir.streaming();
    engine.fade_and_stop_playback();
    assert!(engine.is_silent());
    assert!(output.pull(512).unwrap().iter().all(|&s| s == 0));
}

#[test]
fn test_mix_replaces_pending_tail() {
    let dir = queue_dir();
    let (engine, output) = dir.streaming();
    engine.write_to_pipeline(&["a_1.wav", "a_2.wav"]).unwrap();
    engine.fade_and_mix(&["b_1.wav", "b_2.wav"], 0).unwrap();

    let snapshot = engine.pipeline_snapshot();
    assert_eq!(snapshot.names, vec!["a_1.wav", "b_1.wav", "b_2.wav"]);
    assert_eq!(engine.get_future_snippet(1).unwrap(), "b_1.wav");

    let total = frames(1_000) + frames(1_000 + GUARD_MS) + frames(500);
    let rendered = output.pull_frames(total, 3_000).unwrap();
    assert_eq!(rendered.len(), total * 2);

    // a_1 plays untouched, then a_2's guard before the crossfade
    assert!(rendered[..frames(1_100) * 2].iter().all(|&s| s == 1_000));
    // Crossfade passes through zero on the way to b_1
    let crossing = frames(1_550) * 2;
    assert!(rendered[crossing].abs() < 1_000);
    // b_1 plays out after the crossfade, then b_2
    let b1_tail = frames(2_000)..frames(2_100);
    assert!(rendered[b1_tail.start * 2..b1_tail.end * 2].iter().all(|&s| s == -1_000));
    assert!(rendered[frames(2_100) * 2..].iter().all(|&s| s == -2_000));
}

#[test]
fn test_mix_into_live_snippet() {
    let dir = queue_dir();
    let (engine, output) = dir.streaming();
    engine.write_to_pipeline(&["a_1.wav"]).unwrap();
    output.pull(frames(500)).unwrap();

    engine.fade_and_mix(&["b_1.wav"], 0).unwrap();
    let snapshot = engine.pipeline_snapshot();
    assert_eq!(snapshot.names, vec!["b_1.wav"]);
    assert_eq!(snapshot.cursor, 0);

    // 500 ms left of a_1, crossfaded over 400 ms into the 1000 ms of b_1
    let rendered = output.pull(frames(1_100)).unwrap();
    assert!(rendered[..frames(GUARD_MS) * 2].iter().all(|&s| s == 1_000));
    assert!(rendered[frames(500) * 2..].iter().all(|&s| s == -1_000));
    assert!(!engine.is_silent());
}

#[test]
fn test_mix_while_silent_starts_new_material() {
    let dir = queue_dir();
    let (engine, output) = dir.streaming();
    engine.fade_and_mix(&["b_1.wav", "b_2.wav"], 0).unwrap();

    assert_eq!(engine.pipeline_snapshot().names, vec!["b_1.wav", "b_2.wav"]);
    assert!(!engine.is_silent());
    let rendered = output.pull(frames(1_000)).unwrap();
    assert!(rendered.iter().all(|&s| s == -1_000));
}

#[test]
fn test_mix_starts_at_location() {
    let dir = queue_dir();
    let (engine, _output) = dir.streaming();
    engine.write_to_pipeline(&["a_1.wav", "a_2.wav"]).unwrap();
    engine
        .fade_and_mix(&["a_3.wav", "b_1.wav", "b_2.wav"], 1)
        .unwrap();

    assert_eq!(
        engine.pipeline_snapshot().names,
        vec!["a_1.wav", "b_1.wav", "b_2.wav"]
    );
}

#[test]
fn test_failed_mix_keeps_truncation() {
    let dir = queue_dir();
    dir.garbage("broken.wav");
    let (engine, output) = dir.streaming();
    let names = ["a_1.wav", "a_2.wav", "a_3.wav", "a_1.wav", "a_2.wav", "a_3.wav", "a_1.wav"];
    engine.write_to_pipeline(&names).unwrap();

    let err = engine.fade_and_mix(&["broken.wav", "b_1.wav"], 0).unwrap_err();
    assert!(matches!(err, Error::Mix(_)));

    let snapshot = engine.pipeline_snapshot();
    assert_eq!(snapshot.names, names[..5].to_vec());
    // Nothing was spliced: the queued material still plays
    assert!(output.pull(frames(100)).unwrap().iter().all(|&s| s == 1_000));
}

#[test]
fn test_failed_snippet_after_splice_keeps_the_splice() {
    let dir = queue_dir();
    dir.garbage("broken.wav");
    let (engine, _output) = dir.streaming();
    engine.write_to_pipeline(&["a_1.wav", "a_2.wav"]).unwrap();

    let err = engine
        .fade_and_mix(&["b_1.wav", "broken.wav", "b_2.wav"], 0)
        .unwrap_err();
    assert!(matches!(err, Error::Mix(_)));

    // The crossfade landed; queueing stopped at the broken snippet
    let snapshot = engine.pipeline_snapshot();
    assert_eq!(snapshot.names, vec!["a_1.wav", "b_1.wav"]);
}

#[test]
fn test_mix_location_out_of_range() {
    let dir = queue_dir();
    let (engine, _output) = dir.streaming();
    assert!(matches!(
        engine.fade_and_mix(&["b_1.wav"], 1),
        Err(Error::Mix(_))
    ));
    assert!(matches!(
        engine.fade_and_mix::<&str>(&[], 0),
        Err(Error::Mix(_))
    ));
}

#[test]
fn test_lookahead_beyond_queue() {
    let dir = queue_dir();
    let (engine, _output) = dir.streaming();
    engine.write_to_pipeline(&["a_1.wav", "a_2.wav"]).unwrap();

    assert_eq!(engine.get_future_snippet(0).unwrap(), "a_1.wav");
    assert_eq!(engine.get_future_snippet(1).unwrap(), "a_2.wav");
    assert!(matches!(
        engine.get_future_snippet(2),
        Err(Error::Lookahead {
            requested: 2,
            available: 2
        })
    ));
}

struct UnpluggedOutput;

impl OutputDevice for UnpluggedOutput {
    fn open(&mut self, _spec: StreamSpec, _renderer: Renderer) -> Result<Box<dyn OutputHandle>> {
        Err(Error::Device("device unplugged".to_string()))
    }
}

#[test]
fn test_device_failure_leaves_engine_idle() {
    let dir = queue_dir();
    let mut engine = dir.engine();

    let err = engine.open_stream(&mut UnpluggedOutput).unwrap_err();
    assert!(matches!(err, Error::Device(_)));
    assert!(!err.is_recoverable());
    assert_eq!(engine.stream_state(), StreamState::Idle);

    // A later open on a working output succeeds
    let output = adagio_audio::ManualOutput::new();
    engine.open_stream(&mut output.clone()).unwrap();
    assert_eq!(engine.stream_state(), StreamState::Streaming);
}
