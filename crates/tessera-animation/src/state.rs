//! Animator states, transitions, and per-layer state machines

use crate::blend::cross_fade_weight;
use crate::clip::AnimationClip;
use std::collections::HashMap;
use std::sync::Arc;
use tessera_core::{Result, TesseraError};

/// Handle to a state within one layer's state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub usize);

impl StateId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Playback phase of a state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayType {
    #[default]
    Playing,
    /// A cross-fade out of this state is in progress
    Fading,
    /// The cross-fade out of this state completed this tick
    Finished,
}

/// A timed cross-fade from the owning state to `destination`
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatorStateTransition {
    pub destination: StateId,
    /// Fade length in seconds
    pub duration: f32,
    /// Start time in the destination clip, seconds
    pub offset: f32,
    /// Effective source time when the fade was requested
    pub exit_time: f32,
    pub cross_fade_elapsed: f32,
    /// Marks the transition currently driving playback
    pub solo: bool,
}

impl AnimatorStateTransition {
    pub fn new(destination: StateId, duration: f32, offset: f32, exit_time: f32) -> Self {
        Self {
            destination,
            duration,
            offset,
            exit_time,
            cross_fade_elapsed: 0.0,
            solo: true,
        }
    }

    /// Fade progress in [0, 1] given the source clip length
    pub fn weight(&self, source_length: f32) -> f32 {
        cross_fade_weight(source_length, self.exit_time, self.duration, self.cross_fade_elapsed)
    }
}

/// A named clip plus its playback cursor
#[derive(Debug, Clone)]
pub struct AnimatorState {
    name: String,
    clip: Arc<AnimationClip>,
    pub(crate) frame_time: f32,
    pub(crate) play_type: PlayType,
    pub(crate) transitions: Vec<AnimatorStateTransition>,
}

impl AnimatorState {
    pub fn new(name: impl Into<String>, clip: Arc<AnimationClip>) -> Self {
        Self {
            name: name.into(),
            clip,
            frame_time: 0.0,
            play_type: PlayType::Playing,
            transitions: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn clip(&self) -> &Arc<AnimationClip> {
        &self.clip
    }

    /// Playback cursor in seconds (unwrapped)
    pub fn frame_time(&self) -> f32 {
        self.frame_time
    }

    /// Cursor mapped through the clip's wrap mode
    pub fn effective_time(&self) -> f32 {
        self.clip.effective_time(self.frame_time)
    }

    pub fn play_type(&self) -> PlayType {
        self.play_type
    }

    pub fn transitions(&self) -> &[AnimatorStateTransition] {
        &self.transitions
    }

    pub fn solo_transition(&self) -> Option<&AnimatorStateTransition> {
        self.transitions.iter().find(|t| t.solo)
    }

    pub(crate) fn solo_transition_mut(&mut self) -> Option<&mut AnimatorStateTransition> {
        self.transitions.iter_mut().find(|t| t.solo)
    }

    /// Drop any transition currently driving playback
    pub(crate) fn clear_solo_transitions(&mut self) {
        self.transitions.retain(|t| !t.solo);
    }

    /// Reset the cursor and phase, keeping the clip
    pub(crate) fn reset(&mut self, frame_time: f32) {
        self.frame_time = frame_time;
        self.play_type = PlayType::Playing;
        self.clear_solo_transitions();
    }
}

/// The states of one layer, addressed by `StateId` or name
#[derive(Debug, Clone, Default)]
pub struct AnimatorStateMachine {
    states: Vec<AnimatorState>,
    by_name: HashMap<String, StateId>,
}

impl AnimatorStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a state. Names are unique within a machine.
    pub fn add_state(&mut self, state: AnimatorState) -> Result<StateId> {
        if self.by_name.contains_key(state.name()) {
            return Err(TesseraError::AnimationError(format!(
                "duplicate state name '{}'",
                state.name()
            )));
        }
        let id = StateId(self.states.len());
        self.by_name.insert(state.name().to_string(), id);
        self.states.push(state);
        Ok(id)
    }

    pub fn find(&self, name: &str) -> Option<StateId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, id: StateId) -> Option<&AnimatorState> {
        self.states.get(id.0)
    }

    pub fn get_mut(&mut self, id: StateId) -> Option<&mut AnimatorState> {
        self.states.get_mut(id.0)
    }

    /// The state registered first, used when a layer has none playing
    pub fn first(&self) -> Option<StateId> {
        if self.states.is_empty() {
            None
        } else {
            Some(StateId(0))
        }
    }

    /// Mutable access to two distinct states at once
    pub(crate) fn pair_mut(&mut self, a: StateId, b: StateId) -> Option<(&mut AnimatorState, &mut AnimatorState)> {
        if a == b || a.0 >= self.states.len() || b.0 >= self.states.len() {
            return None;
        }
        if a.0 < b.0 {
            let (lo, hi) = self.states.split_at_mut(b.0);
            Some((&mut lo[a.0], &mut hi[0]))
        } else {
            let (lo, hi) = self.states.split_at_mut(a.0);
            Some((&mut hi[0], &mut lo[b.0]))
        }
    }

    pub fn states(&self) -> &[AnimatorState] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_clip(name: &str) -> Arc<AnimationClip> {
        Arc::new(AnimationClip::new(name, vec![]))
    }

    #[test]
    fn states_are_found_by_name() {
        let mut machine = AnimatorStateMachine::new();
        let idle = machine.add_state(AnimatorState::new("idle", empty_clip("idle"))).unwrap();
        let walk = machine.add_state(AnimatorState::new("walk", empty_clip("walk"))).unwrap();

        assert_eq!(machine.find("walk"), Some(walk));
        assert_eq!(machine.find("run"), None);
        assert_eq!(machine.first(), Some(idle));
        assert_eq!(machine.get(walk).unwrap().name(), "walk");
        assert!(machine.add_state(AnimatorState::new("idle", empty_clip("x"))).is_err());
    }

    #[test]
    fn pair_mut_returns_requested_order() {
        let mut machine = AnimatorStateMachine::new();
        let a = machine.add_state(AnimatorState::new("a", empty_clip("a"))).unwrap();
        let b = machine.add_state(AnimatorState::new("b", empty_clip("b"))).unwrap();

        let (first, second) = machine.pair_mut(b, a).unwrap();
        assert_eq!(first.name(), "b");
        assert_eq!(second.name(), "a");
        assert!(machine.pair_mut(a, a).is_none());
        assert!(machine.pair_mut(a, StateId(9)).is_none());
    }

    #[test]
    fn solo_transition_lifecycle() {
        let mut state = AnimatorState::new("a", empty_clip("a"));
        state.transitions.push(AnimatorStateTransition::new(StateId(1), 1.0, 0.0, 1.0));
        assert!(state.solo_transition().is_some());

        state.solo_transition_mut().unwrap().cross_fade_elapsed = 0.5;
        assert!((state.solo_transition().unwrap().weight(2.0) - 0.5).abs() < 1e-6);

        state.reset(0.25);
        assert!(state.solo_transition().is_none());
        assert_eq!(state.frame_time(), 0.25);
        assert_eq!(state.play_type(), PlayType::Playing);
    }
}
