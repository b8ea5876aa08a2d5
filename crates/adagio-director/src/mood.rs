//! Deciding what a change of game state means for the music.

use adagio_core::{GameState, Mood};
use std::collections::HashMap;

/// What the music should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoodDecision {
    /// Carry on with whatever is playing.
    Keep,
    /// Fade out to silence.
    Stop,
    /// Play material of this mood.
    Play(Mood),
}

/// Maps game-state transitions to mood decisions.
pub trait MoodResolver {
    fn resolve(&mut self, previous: GameState, current: GameState) -> MoodDecision;
}

/// A fixed game state to mood table.
///
/// States outside the game, and in-game states without a mood, stop playback.
#[derive(Debug, Clone)]
pub struct StaticMoodMap {
    moods: HashMap<GameState, Mood>,
}

impl StaticMoodMap {
    /// A map with no states assigned.
    pub fn empty() -> Self {
        Self {
            moods: HashMap::new(),
        }
    }

    /// Assign `mood` to `state`.
    #[must_use]
    pub fn with(mut self, state: GameState, mood: Mood) -> Self {
        self.moods.insert(state, mood);
        self
    }

    pub fn mood_for(&self, state: GameState) -> Option<Mood> {
        if !state.is_in_game() {
            return None;
        }
        self.moods.get(&state).copied()
    }
}

impl Default for StaticMoodMap {
    fn default() -> Self {
        Self::empty()
            .with(GameState::Docking, Mood::Calm)
            .with(GameState::Travel, Mood::Chill)
            .with(GameState::SlowTravel, Mood::Chill)
            .with(GameState::ConflictZone, Mood::Epic)
            .with(GameState::CanyonRunning, Mood::Epic)
            .with(GameState::ConflictDogFight, Mood::Dark)
            .with(GameState::PlanetaryLanding, Mood::Ethereal)
            .with(GameState::PlanetaryExploration, Mood::Ethereal)
    }
}

impl MoodResolver for StaticMoodMap {
    fn resolve(&mut self, previous: GameState, current: GameState) -> MoodDecision {
        match self.mood_for(current) {
            None => MoodDecision::Stop,
            Some(_) if previous == current => MoodDecision::Keep,
            Some(mood) => MoodDecision::Play(mood),
        }
    }
}
