//! Streaming behaviour of the engine against generated snippet files.

#![allow(clippy::unwrap_used)]

mod common;

use adagio_core::Error;
use common::{frames, SnippetDir};
use proptest::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[test]
fn test_end_to_end_two_snippets() {
    let dir = SnippetDir::new();
    dir.sine("A.wav", 2_000, 440.0).sine("A.wav_2.wav", 2_000, 660.0);
    let store = dir.store();
    let first = store.load("A.wav").unwrap();
    let second = store.load("A.wav_2.wav").unwrap();

    let (engine, output) = dir.streaming();
    assert_eq!(engine.write_to_pipeline(&["A.wav", "A.wav_2.wav"]).unwrap(), 2);
    assert_eq!(engine.get_future_snippet(1).unwrap(), "A.wav_2.wav");

    let mut rendered = Vec::new();
    for _ in 0..5 {
        rendered.extend(output.pull(frames(500)).unwrap());
        assert!(!engine.is_silent());
    }

    let split = first.samples().len();
    assert_eq!(rendered.len(), split + second.head(frames(500)).samples().len());
    assert_eq!(&rendered[..split], first.samples());
    assert_eq!(&rendered[split..], second.head(frames(500)).samples());
    assert_eq!(engine.get_future_snippet(0).unwrap(), "A.wav_2.wav");
}

#[test]
fn test_silence_without_writes() {
    let dir = SnippetDir::new();
    let (engine, output) = dir.streaming();

    for _ in 0..20 {
        let pulled = output.pull(1_024).unwrap();
        assert_eq!(pulled.len(), 2_048);
        assert!(pulled.iter().all(|&s| s == 0));
        assert!(engine.is_silent());
    }
    assert!(matches!(
        engine.get_future_snippet(0),
        Err(Error::Lookahead {
            requested: 0,
            available: 0
        })
    ));
}

#[test]
fn test_snippets_join_without_gaps() {
    let dir = SnippetDir::new();
    dir.constant("p_1.wav", 300, 1_000)
        .constant("p_2.wav", 250, 2_000)
        .constant("p_3.wav", 400, 3_000);

    let (engine, output) = dir.streaming();
    engine
        .write_to_pipeline(&["p_1.wav", "p_2.wav", "p_3.wav"])
        .unwrap();

    let total = frames(300) + frames(250) + frames(400);
    let rendered = output.pull_frames(total, 1_237).unwrap();
    let expected: Vec<i16> = [(300, 1_000), (250, 2_000), (400, 3_000)]
        .iter()
        .flat_map(|&(ms, value)| std::iter::repeat(value).take(frames(ms) * 2))
        .collect();
    assert_eq!(rendered, expected);
}

#[test]
fn test_material_queued_while_idle_starts_on_open() {
    let dir = SnippetDir::new();
    dir.constant("p_1.wav", 200, 500);

    let mut engine = dir.engine();
    engine.write_to_pipeline(&["p_1.wav"]).unwrap();
    let output = adagio_audio::ManualOutput::new();
    engine.open_stream(&mut output.clone()).unwrap();

    let pulled = output.pull(100).unwrap();
    assert!(pulled.iter().all(|&s| s == 500));
}

#[test]
fn test_playback_resumes_after_running_dry() {
    let dir = SnippetDir::new();
    dir.constant("p_1.wav", 100, 100).constant("p_2.wav", 100, 200);

    let (engine, output) = dir.streaming();
    engine.write_to_pipeline(&["p_1.wav"]).unwrap();

    let pulled = output.pull(frames(150)).unwrap();
    assert!(pulled[..frames(100) * 2].iter().all(|&s| s == 100));
    assert!(pulled[frames(100) * 2..].iter().all(|&s| s == 0));
    assert!(engine.is_silent());

    engine.write_to_pipeline(&["p_2.wav"]).unwrap();
    assert!(!engine.is_silent());
    let pulled = output.pull(frames(100)).unwrap();
    assert!(pulled.iter().all(|&s| s == 200));

    let snapshot = engine.pipeline_snapshot();
    assert_eq!(snapshot.names, vec!["p_1.wav", "p_2.wav"]);
    assert_eq!(snapshot.cursor, 1);
}

#[test]
fn test_failed_write_keeps_snippets_before_the_failure() {
    let dir = SnippetDir::new();
    dir.constant("p_1.wav", 100, 100)
        .constant("p_2.wav", 100, 200)
        .garbage("broken.wav");

    let (engine, output) = dir.streaming();
    let err = engine
        .write_to_pipeline(&["p_1.wav", "broken.wav", "p_2.wav"])
        .unwrap_err();
    assert!(err.is_snippet_error());
    assert_eq!(engine.pipeline_snapshot().names, vec!["p_1.wav"]);
    assert!(!engine.is_silent());
    assert!(output.pull(frames(100)).unwrap().iter().all(|&s| s == 100));
}

#[test]
fn test_failed_first_write_stays_silent() {
    let dir = SnippetDir::new();
    let (engine, _output) = dir.streaming();
    assert!(matches!(
        engine.write_to_pipeline(&["missing.wav"]),
        Err(Error::Decode(_))
    ));
    assert!(engine.pipeline_snapshot().names.is_empty());
    assert!(engine.is_silent());
}

#[test]
fn test_resampled_snippet_plays_at_canonical_length() {
    let dir = SnippetDir::new();
    common::write_wav(&dir.path().join("low.wav"), 22_050, 1, 22_050, |_| 800);

    let (engine, output) = dir.streaming();
    engine.write_to_pipeline(&["low.wav"]).unwrap();

    let loaded = dir.store().load("low.wav").unwrap();
    assert_eq!(loaded.frames(), 44_100);
    let pulled = output.pull(44_100).unwrap();
    assert_eq!(pulled, loaded.samples());
}

#[derive(Debug, Clone)]
enum Op {
    Pull(usize),
    Write(usize),
    Mix(usize),
    Fade,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (1usize..6_000).prop_map(Op::Pull),
        2 => (1usize..4).prop_map(Op::Write),
        1 => (1usize..3).prop_map(Op::Mix),
        1 => Just(Op::Fade),
    ]
}

const NAMES: [&str; 3] = ["s_1.wav", "s_2.wav", "s_3.wav"];

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn test_callbacks_never_starve(ops in prop::collection::vec(op(), 1..40)) {
        let dir = SnippetDir::new();
        dir.constant(NAMES[0], 150, 1_000)
            .constant(NAMES[1], 90, -1_000)
            .sine(NAMES[2], 220, 330.0);
        let (engine, output) = dir.streaming();

        for op in ops {
            match op {
                Op::Pull(frames) => {
                    let pulled = output.pull(frames).unwrap();
                    prop_assert_eq!(pulled.len(), frames * 2);
                }
                Op::Write(count) => {
                    prop_assert_eq!(engine.write_to_pipeline(&NAMES[..count]).unwrap(), count);
                }
                Op::Mix(count) => {
                    engine.fade_and_mix(&NAMES[..count], 0).unwrap();
                    let window = engine.config().lookahead_window;
                    prop_assert!(engine.pipeline_snapshot().pending().len() <= window + count);
                }
                Op::Fade => {
                    engine.fade_and_stop_playback();
                    let window = engine.config().lookahead_window;
                    prop_assert!(engine.pipeline_snapshot().pending().len() <= window);
                }
            }
        }
        prop_assert_eq!(engine.missed_callbacks(), 0);
    }
}

#[test]
fn test_callbacks_stay_whole_under_concurrent_edits() {
    let dir = SnippetDir::new();
    dir.constant(NAMES[0], 150, 1_000)
        .constant(NAMES[1], 90, -1_000)
        .sine(NAMES[2], 220, 330.0);
    let (engine, output) = dir.streaming();
    let done = Arc::new(AtomicBool::new(false));

    let callback = {
        let output = output.clone();
        let done = Arc::clone(&done);
        std::thread::spawn(move || {
            let mut pulls = 0usize;
            loop {
                let frames = 64 + (pulls * 37) % 1_000;
                let pulled = output.pull(frames).unwrap();
                assert_eq!(pulled.len(), frames * 2);
                pulls += 1;
                if done.load(Ordering::Acquire) {
                    return pulls;
                }
            }
        })
    };

    let window = engine.config().lookahead_window;
    for round in 0..200 {
        match round % 4 {
            0 | 1 => {
                engine.write_to_pipeline(&NAMES).unwrap();
            }
            2 => engine.fade_and_mix(&NAMES[1..], 0).unwrap(),
            _ => engine.fade_and_stop_playback(),
        }
        assert!(engine.pipeline_snapshot().pending().len() <= window + 2 * NAMES.len());
    }

    done.store(true, Ordering::Release);
    assert!(callback.join().unwrap() > 0);
}
