//! The per-tick control loop.

use crate::catalog::SnippetSelector;
use crate::control::PlaybackControl;
use crate::mood::{MoodDecision, MoodResolver};
use adagio_core::{Error, GameState, Mood, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorConfig {
    /// How far ahead of the playing snippet the program must reach before it is extended.
    pub lookahead_distance: usize,
    /// Snippets requested from the selector at a time.
    pub batch_size: usize,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            lookahead_distance: 2,
            batch_size: 8,
        }
    }
}

/// What a tick did to playback.
#[derive(Debug)]
pub enum TickOutcome {
    /// Nothing needed doing.
    Unchanged,
    /// A program was written from silence.
    Started { mood: Mood, queued: usize },
    /// The program was crossfaded into new material.
    Mixed { mood: Mood, queued: usize },
    /// The current program was topped up.
    Extended { mood: Mood, queued: usize },
    /// Playback is fading out.
    Stopping,
    /// The tick failed; playback carries on as it was.
    Failed(Error),
}

impl TickOutcome {
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Drives a player from game-state ticks.
pub struct Director<R, S> {
    config: DirectorConfig,
    resolver: R,
    selector: S,
    previous: GameState,
    /// Mood of the program the director last started, `None` once stopped.
    playing: Option<Mood>,
}

impl<R, S> Director<R, S>
where
    R: MoodResolver,
    S: SnippetSelector,
{
    pub const fn new(config: DirectorConfig, resolver: R, selector: S) -> Self {
        Self {
            config,
            resolver,
            selector,
            previous: GameState::Unknown,
            playing: None,
        }
    }

    pub const fn config(&self) -> &DirectorConfig {
        &self.config
    }

    pub const fn playing(&self) -> Option<Mood> {
        self.playing
    }

    /// React to one detected game state.
    ///
    /// Failures are logged and reported in the outcome; the director stays usable.
    pub fn tick<P>(&mut self, player: &P, state: GameState) -> TickOutcome
    where
        P: PlaybackControl + ?Sized,
    {
        let previous = std::mem::replace(&mut self.previous, state);
        let decision = self.resolver.resolve(previous, state);
        debug!("Tick {previous} -> {state}: {decision:?}");

        match self.apply(player, decision) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Tick for {state} failed: {e}");
                TickOutcome::Failed(e)
            }
        }
    }

    fn apply<P>(&mut self, player: &P, decision: MoodDecision) -> Result<TickOutcome>
    where
        P: PlaybackControl + ?Sized,
    {
        match decision {
            MoodDecision::Stop => {
                if self.playing.take().is_none() {
                    return Ok(TickOutcome::Unchanged);
                }
                info!("Stopping playback");
                player.fade_and_stop_playback();
                Ok(TickOutcome::Stopping)
            }
            MoodDecision::Keep => match self.playing {
                Some(mood) => self.extend(player, mood),
                None => Ok(TickOutcome::Unchanged),
            },
            MoodDecision::Play(mood) if self.playing == Some(mood) => self.extend(player, mood),
            MoodDecision::Play(mood) if self.playing.is_none() || player.is_silent() => {
                let names = self.selector.select(mood, None)?;
                let queued = player.write_to_pipeline(&names)?;
                self.playing = Some(mood);
                info!("Started {mood} program with {queued} snippets");
                Ok(TickOutcome::Started { mood, queued })
            }
            MoodDecision::Play(mood) => {
                let reference = player
                    .get_future_snippet(self.config.lookahead_distance)
                    .ok()
                    .or_else(|| player.pipeline_snapshot().last_queued().map(str::to_owned));
                let names = self.selector.select(mood, reference.as_deref())?;
                player.fade_and_mix(&names, 0)?;
                self.playing = Some(mood);
                info!("Mixed into {mood} program with {} snippets", names.len());
                Ok(TickOutcome::Mixed {
                    mood,
                    queued: names.len(),
                })
            }
        }
    }

    /// Top up the program when fewer than `lookahead_distance` snippets are queued.
    fn extend<P>(&mut self, player: &P, mood: Mood) -> Result<TickOutcome>
    where
        P: PlaybackControl + ?Sized,
    {
        if player
            .get_future_snippet(self.config.lookahead_distance)
            .is_ok()
        {
            return Ok(TickOutcome::Unchanged);
        }

        let snapshot = player.pipeline_snapshot();
        let names = self.selector.select(mood, snapshot.last_queued())?;
        let queued = player.write_to_pipeline(&names)?;
        debug!("Extended {mood} program by {queued} snippets");
        Ok(TickOutcome::Extended { mood, queued })
    }
}
