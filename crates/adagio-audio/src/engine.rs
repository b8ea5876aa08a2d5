//! Playback engine bridging the snippet pipeline to a pull-based audio output.
//!
//! Two threads touch the pipeline and the live segment: the output's real-time
//! callback (through [`Renderer`]) and the control thread (through
//! [`PlaybackEngine`]). Both go through one mutex. The callback waits for it
//! only a bounded time and emits silence when it cannot get it, so the output
//! is never starved. Edits that crossfade or fade material are computed outside
//! the lock and committed afterwards, keeping the control thread's hold short.

use crate::buffer::AudioBuffer;
use crate::mix::MixEditor;
use crate::output::{OutputDevice, OutputHandle, StreamSpec};
use crate::pipeline::{Pipeline, PipelineEntry, PipelineSnapshot};
use crate::store::SnippetStore;
use adagio_core::{Error, PlayerConfig, Result};
use parking_lot::Mutex;
use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Unlocked tries an edit gets before it is computed under the pipeline lock.
const EDIT_ATTEMPTS: usize = 3;

/// Whether an output stream is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    #[default]
    Idle,
    Streaming,
}

/// The PCM currently being drained by the callback.
#[derive(Debug)]
enum LiveSegment {
    /// Generated silence; never allocated.
    Silence { remaining: usize },
    Program {
        buffer: Arc<AudioBuffer>,
        position: usize,
    },
}

impl LiveSegment {
    const fn is_silence(&self) -> bool {
        matches!(self, Self::Silence { .. })
    }

    /// Copy as many frames as fit into `out`, returning the number of frames copied.
    fn read_into(&mut self, out: &mut [i16], channels: usize) -> usize {
        let wanted = out.len() / channels;
        match self {
            Self::Silence { remaining } => {
                let frames = wanted.min(*remaining);
                out[..frames * channels].fill(0);
                *remaining -= frames;
                frames
            }
            Self::Program { buffer, position } => {
                let source = buffer.frame_slice(*position..*position + wanted);
                out[..source.len()].copy_from_slice(source);
                let frames = source.len() / channels;
                *position += frames;
                frames
            }
        }
    }
}

/// A buffer an edit will replace, captured so the edit can run unlocked.
enum EditTarget {
    /// The last pending pipeline entry.
    Tail {
        index: usize,
        buffer: Arc<AudioBuffer>,
    },
    /// What is left of the live segment.
    Live {
        buffer: Arc<AudioBuffer>,
        position: usize,
    },
    Nothing,
}

impl EditTarget {
    /// The material the edit starts from.
    fn source(&self) -> Option<Cow<'_, AudioBuffer>> {
        match self {
            Self::Tail { buffer, .. } => Some(Cow::Borrowed(buffer.as_ref())),
            Self::Live { buffer, position } => Some(Cow::Owned(buffer.tail_from(*position))),
            Self::Nothing => None,
        }
    }
}

#[derive(Debug)]
struct PlayerState {
    pipeline: Pipeline,
    live: LiveSegment,
    /// Set once the first pipeline entry has been loaded into the live segment.
    primed: bool,
}

impl PlayerState {
    /// Silent: live segment is silence and nothing is queued behind it.
    fn is_silent(&self) -> bool {
        self.live.is_silence() && self.pipeline.pending_len() == 0
    }

    /// Replace the initial silence with the first entry if nothing has played yet.
    fn prime(&mut self) -> bool {
        if self.primed {
            return false;
        }
        let Some(entry) = self.pipeline.current() else {
            return false;
        };
        self.live = LiveSegment::Program {
            buffer: Arc::clone(&entry.buffer),
            position: 0,
        };
        self.primed = true;
        true
    }

    /// Buffer to continue with once the live segment runs dry.
    fn next_segment(&mut self) -> Option<Arc<AudioBuffer>> {
        if !self.primed {
            let buffer = Arc::clone(&self.pipeline.current()?.buffer);
            self.primed = true;
            return Some(buffer);
        }
        if let Some(entry) = self.pipeline.advance() {
            return Some(Arc::clone(&entry.buffer));
        }
        // Nothing queued yet; stay on the last entry so the next append is picked up
        self.pipeline.retreat();
        None
    }

    /// Fill `out` completely, returning whether playback is now silent.
    fn render(&mut self, out: &mut [i16], channels: usize) -> bool {
        let total = out.len() / channels;
        let (frames_out, remainder) = out.split_at_mut(total * channels);
        remainder.fill(0);

        let mut written = 0;
        while written < total {
            written += self
                .live
                .read_into(&mut frames_out[written * channels..], channels);
            if written == total {
                break;
            }

            match self.next_segment() {
                Some(buffer) => {
                    trace!("Live segment advanced to cursor {}", self.pipeline.cursor());
                    self.live = LiveSegment::Program {
                        buffer,
                        position: 0,
                    };
                }
                None => {
                    // Out of material: pad this callback with silence
                    frames_out[written * channels..].fill(0);
                    self.live = LiveSegment::Silence { remaining: 0 };
                    break;
                }
            }
        }

        self.is_silent()
    }

    fn edit_target(&self) -> EditTarget {
        if self.pipeline.pending_len() > 0 {
            let index = self.pipeline.len() - 1;
            return EditTarget::Tail {
                index,
                buffer: Arc::clone(&self.pipeline.entries()[index].buffer),
            };
        }
        match &self.live {
            LiveSegment::Program { buffer, position } if *position < buffer.frames() => {
                EditTarget::Live {
                    buffer: Arc::clone(buffer),
                    position: *position,
                }
            }
            _ => EditTarget::Nothing,
        }
    }

    /// Swap `edited` in for `target` if the callback has not moved past it.
    fn commit(&mut self, target: &EditTarget, edited: AudioBuffer, name: Option<&str>) -> bool {
        match target {
            EditTarget::Tail { index, buffer } => {
                let cursor = self.pipeline.cursor();
                let Some(entry) = self.pipeline.pending_tail_mut() else {
                    return false;
                };
                if *index <= cursor || !Arc::ptr_eq(&entry.buffer, buffer) {
                    return false;
                }
                entry.buffer = Arc::new(edited);
                if let Some(name) = name {
                    entry.name = name.to_owned();
                }
                true
            }
            EditTarget::Live { buffer, position } => {
                let LiveSegment::Program {
                    buffer: live,
                    position: now,
                } = &mut self.live
                else {
                    return false;
                };
                // Frames the callback played while the edit was being computed
                let consumed = now.saturating_sub(*position);
                if !Arc::ptr_eq(live, buffer) || consumed >= edited.frames() {
                    return false;
                }
                let edited = Arc::new(edited);
                *live = Arc::clone(&edited);
                *now = consumed;
                if let Some(name) = name {
                    if let Some(current) = self.pipeline.current_mut() {
                        *current = PipelineEntry::new(name, edited);
                    }
                }
                true
            }
            EditTarget::Nothing => false,
        }
    }
}

/// State shared between the engine and its renderer.
struct Shared {
    state: Mutex<PlayerState>,
    silent: AtomicBool,
    /// Callbacks that gave up on the lock and emitted silence.
    missed_callbacks: AtomicU64,
    channels: usize,
    lock_timeout: Duration,
}

impl Shared {
    fn publish_silence(&self, state: &PlayerState) {
        self.silent.store(state.is_silent(), Ordering::Release);
    }
}

/// The callback side of the engine, handed to an output when a stream opens.
#[derive(Clone)]
pub struct Renderer {
    shared: Arc<Shared>,
}

impl Renderer {
    /// Fill `out` with interleaved frames. Always writes the whole slice and never blocks
    /// longer than the configured lock timeout.
    pub fn render(&self, out: &mut [i16]) {
        let Some(mut state) = self.shared.state.try_lock_for(self.shared.lock_timeout) else {
            out.fill(0);
            self.shared.missed_callbacks.fetch_add(1, Ordering::Relaxed);
            return;
        };
        let silent = state.render(out, self.shared.channels);
        drop(state);
        self.shared.silent.store(silent, Ordering::Release);
    }
}

/// Sequences decoded snippets into a continuous stream.
pub struct PlaybackEngine {
    config: PlayerConfig,
    store: SnippetStore,
    editor: MixEditor,
    shared: Arc<Shared>,
    stream: Option<Box<dyn OutputHandle>>,
}

impl PlaybackEngine {
    /// Create an idle engine loading snippets from `config.snippet_dir`.
    pub fn new(config: PlayerConfig) -> Self {
        let store = SnippetStore::new(config.snippet_dir.clone(), config.format);
        Self::with_store(config, store)
    }

    pub fn with_store(config: PlayerConfig, store: SnippetStore) -> Self {
        let state = PlayerState {
            pipeline: Pipeline::new(config.history_retention),
            live: LiveSegment::Silence {
                remaining: config.tick_frames(),
            },
            primed: false,
        };
        let shared = Arc::new(Shared {
            state: Mutex::new(state),
            silent: AtomicBool::new(true),
            missed_callbacks: AtomicU64::new(0),
            channels: usize::from(config.format.channels.max(1)),
            lock_timeout: config.callback_lock_timeout(),
        });

        Self {
            editor: MixEditor::from_config(&config),
            config,
            store,
            shared,
            stream: None,
        }
    }

    pub const fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub const fn store(&self) -> &SnippetStore {
        &self.store
    }

    pub const fn stream_state(&self) -> StreamState {
        if self.stream.is_some() {
            StreamState::Streaming
        } else {
            StreamState::Idle
        }
    }

    /// Start streaming to `output`.
    ///
    /// A silent engine begins with one tick of silence. Material queued while
    /// idle, or the unplayed rest of the snippet a previous stream stopped in,
    /// plays from the first callback.
    pub fn open_stream(&mut self, output: &mut dyn OutputDevice) -> Result<()> {
        if self.stream.is_some() {
            return Err(Error::InvalidState("stream is already open".to_string()));
        }

        {
            let mut state = self.shared.state.lock();
            if state.live.is_silence() {
                state.live = LiveSegment::Silence {
                    remaining: self.config.tick_frames(),
                };
                state.prime();
            }
            self.shared.publish_silence(&state);
        }

        let spec = StreamSpec {
            format: self.config.format,
            frames_per_buffer: self.config.frames_per_buffer,
        };
        let renderer = Renderer {
            shared: Arc::clone(&self.shared),
        };
        self.stream = Some(output.open(spec, renderer)?);

        info!(
            "Stream opened: {} Hz, {} channels, {} frames per buffer",
            spec.format.sample_rate, spec.format.channels, spec.frames_per_buffer
        );
        Ok(())
    }

    /// Stop the stream, waiting for any callback in flight.
    pub fn close_stream(&mut self) -> Result<()> {
        let stream = self
            .stream
            .take()
            .ok_or_else(|| Error::InvalidState("no stream is open".to_string()))?;
        stream.close()?;
        info!("Stream closed");
        Ok(())
    }

    /// Load `names` in order, queueing each at the tail of the pipeline as soon
    /// as it is decoded.
    ///
    /// Stops at the first snippet that fails to load; the ones before it stay
    /// queued. If nothing has played yet the first snippet replaces the initial
    /// silence immediately.
    pub fn write_to_pipeline<S: AsRef<str>>(&self, names: &[S]) -> Result<usize> {
        let mut queued = 0;
        for name in names {
            let entry = match self.load(name.as_ref()) {
                Ok(entry) => entry,
                Err(e) => {
                    if queued > 0 {
                        info!("Queued {queued} of {} snippets", names.len());
                    }
                    return Err(e);
                }
            };
            self.append_entries(vec![entry]);
            queued += 1;
        }
        if queued > 0 {
            info!("Queued {queued} snippets");
        }
        Ok(queued)
    }

    /// Fade the program out over the last snippet kept in the lookahead window.
    pub fn fade_and_stop_playback(&self) {
        let window = self.config.lookahead_window;
        let dropped = self.shared.state.lock().pipeline.truncate_ahead(window);
        debug!("Fading out, dropped {dropped} queued snippets");

        let editor = self.editor;
        if !self.edit(|source| editor.fade_to_silence(source), None) {
            debug!("Nothing playing to fade out");
        }
    }

    /// Crossfade from the current program into `names[location]`, then queue the
    /// snippets after it.
    ///
    /// The pipeline is truncated to the lookahead window before anything is loaded.
    /// If `names[location]` fails to load the truncation stays and nothing is
    /// spliced; if a later snippet fails, the ones before it stay queued. Both
    /// return [`Error::Mix`].
    pub fn fade_and_mix<S: AsRef<str>>(&self, names: &[S], location: usize) -> Result<()> {
        let window = self.config.lookahead_window;
        let dropped = self.shared.state.lock().pipeline.truncate_ahead(window);
        debug!("Mixing into new material, dropped {dropped} queued snippets");

        let incoming = names
            .get(location)
            .ok_or_else(|| {
                Error::Mix(format!(
                    "location {location} is outside the {} names given",
                    names.len()
                ))
            })
            .and_then(|name| {
                self.load(name.as_ref())
                    .map_err(|e| Error::Mix(format!("snippet failed to load: {e}")))
            });
        let incoming = match incoming {
            Ok(incoming) => incoming,
            Err(e) => {
                warn!("Mix abandoned, pipeline left truncated: {e}");
                return Err(e);
            }
        };

        let editor = self.editor;
        let spliced = self.edit(
            |source| editor.crossfade_into(source, &incoming.buffer),
            Some(incoming.name.as_str()),
        );
        if spliced {
            debug!("Crossfaded into {}", incoming.name);
        } else {
            // Nothing audible to crossfade from, start the new material directly
            self.append_entries(vec![incoming]);
        }

        self.write_to_pipeline(&names[location + 1..])
            .map_err(|e| Error::Mix(format!("snippet after the splice failed to load: {e}")))?;
        Ok(())
    }

    /// Name of the snippet `distance` entries after the one playing now.
    pub fn get_future_snippet(&self, distance: usize) -> Result<String> {
        let state = self.shared.state.lock();
        let pipeline = &state.pipeline;
        pipeline
            .peek_future(distance)
            .map(str::to_owned)
            .ok_or(Error::Lookahead {
                requested: distance,
                available: pipeline.len().saturating_sub(pipeline.cursor()),
            })
    }

    /// Whether the output is playing silence with nothing queued.
    pub fn is_silent(&self) -> bool {
        self.shared.silent.load(Ordering::Acquire)
    }

    /// Names in the pipeline and the cursor position.
    pub fn pipeline_snapshot(&self) -> PipelineSnapshot {
        self.shared.state.lock().pipeline.snapshot()
    }

    /// Number of callbacks that emitted silence because the pipeline was locked.
    pub fn missed_callbacks(&self) -> u64 {
        self.shared.missed_callbacks.load(Ordering::Relaxed)
    }

    fn load(&self, name: &str) -> Result<PipelineEntry> {
        self.store
            .load(name)
            .map(|buffer| PipelineEntry::new(name, buffer))
            .inspect_err(|e| warn!("Failed to load snippet {name}: {e}"))
    }

    pub(crate) fn append_entries(&self, entries: Vec<PipelineEntry>) {
        let mut state = self.shared.state.lock();
        state.pipeline.append(entries);
        if state.prime() {
            debug!("Live segment primed with the first snippet");
        }
        self.shared.publish_silence(&state);
    }

    /// Replace the pending tail (or the live remainder) with `edit` applied to it.
    ///
    /// The edit is computed unlocked and recomputed against a fresh target when
    /// the callback moves past the old one; only after [`EDIT_ATTEMPTS`] misses is
    /// it run under the lock. Returns false if there was nothing to edit.
    fn edit<F>(&self, edit: F, name: Option<&str>) -> bool
    where
        F: Fn(&AudioBuffer) -> AudioBuffer,
    {
        for attempt in 1..=EDIT_ATTEMPTS {
            let target = self.shared.state.lock().edit_target();
            let Some(source) = target.source() else {
                return false;
            };
            let edited = edit(&source);

            let mut state = self.shared.state.lock();
            if state.commit(&target, edited, name) {
                self.shared.publish_silence(&state);
                return true;
            }
            trace!("Edit raced the callback (attempt {attempt})");
        }

        debug!("Edit kept racing the callback, finishing it under the lock");
        let mut state = self.shared.state.lock();
        let target = state.edit_target();
        let Some(source) = target.source() else {
            return false;
        };
        let edited = edit(&source);
        let committed = state.commit(&target, edited, name);
        if committed {
            self.shared.publish_silence(&state);
        }
        committed
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.close() {
                warn!("Failed to close stream on drop: {e}");
            }
        }
    }
}
