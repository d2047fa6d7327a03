//! Controller layers: one state machine, its playing state and its cross-fade

use crate::clip::AnimationClip;
use crate::state::{AnimatorState, AnimatorStateMachine, AnimatorStateTransition, PlayType, StateId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tessera_core::{Result, TesseraError};

/// How a layer composes onto the layers below it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerBlendingMode {
    /// Blend from the current value toward the sampled value by layer weight
    #[default]
    Override,
    /// Apply the delta from the clip's first frame, scaled by layer weight
    Additive,
}

/// What a layer should evaluate after its clocks advanced one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum LayerStep {
    /// No states to play
    Idle,
    Plain(StateId),
    CrossFade {
        source: StateId,
        destination: StateId,
        weight: f32,
    },
}

fn state_not_found(name: &str, layer_index: usize) -> TesseraError {
    TesseraError::StateNotFound {
        state: name.to_string(),
        layer: layer_index,
    }
}

/// One independently weighted track of the controller
#[derive(Debug, Clone)]
pub struct AnimatorControllerLayer {
    name: String,
    state_machine: AnimatorStateMachine,
    playing: Option<StateId>,
    fading: Option<StateId>,
    weight: f32,
    blending_mode: LayerBlendingMode,
}

impl AnimatorControllerLayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state_machine: AnimatorStateMachine::new(),
            playing: None,
            fading: None,
            weight: 1.0,
            blending_mode: LayerBlendingMode::Override,
        }
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.set_weight(weight);
        self
    }

    pub fn with_blending_mode(mut self, mode: LayerBlendingMode) -> Self {
        self.blending_mode = mode;
        self
    }

    /// Register a state playing `clip`
    pub fn add_state(&mut self, name: impl Into<String>, clip: Arc<AnimationClip>) -> Result<StateId> {
        self.state_machine.add_state(AnimatorState::new(name, clip))
    }

    /// Make `name` the playing state without a fade
    pub fn set_entry_state(&mut self, name: &str) -> Result<StateId> {
        let id = self.state_machine.find(name).ok_or_else(|| {
            TesseraError::AnimationError(format!("entry state '{}' not in layer '{}'", name, self.name))
        })?;
        self.playing = Some(id);
        Ok(id)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state_machine(&self) -> &AnimatorStateMachine {
        &self.state_machine
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f32) {
        self.weight = weight.clamp(0.0, 1.0);
    }

    pub fn blending_mode(&self) -> LayerBlendingMode {
        self.blending_mode
    }

    pub(crate) fn force_blending_mode(&mut self, mode: LayerBlendingMode) {
        self.blending_mode = mode;
    }

    pub fn playing_state(&self) -> Option<StateId> {
        self.playing
    }

    pub fn fading_state(&self) -> Option<StateId> {
        self.fading
    }

    /// The playing state, defaulting to the first registered one
    pub fn ensure_playing(&mut self) -> Option<StateId> {
        if self.playing.is_none() {
            self.playing = self.state_machine.first();
        }
        self.playing
    }

    /// Progress of the active cross-fade, if any
    pub fn cross_fade_weight(&self) -> Option<f32> {
        let source = self.state_machine.get(self.playing?)?;
        source.solo_transition().map(|t| t.weight(source.clip().length()))
    }

    /// Start fading from the playing state into `destination`.
    ///
    /// Durations and offsets are fractions of the source and destination clip
    /// lengths. Returns `false` when `destination` is already playing. A fade
    /// already in progress is replaced.
    pub fn cross_fade(
        &mut self,
        layer_index: usize,
        destination: &str,
        normalized_duration: f32,
        normalized_offset: f32,
    ) -> Result<bool> {
        let dest = self
            .state_machine
            .find(destination)
            .ok_or_else(|| state_not_found(destination, layer_index))?;
        let source = self
            .ensure_playing()
            .ok_or_else(|| state_not_found(destination, layer_index))?;

        if source == dest {
            log::debug!(
                "Layer '{}': '{}' is already playing, cross-fade ignored",
                self.name,
                destination
            );
            return Ok(false);
        }

        let Some((src, dst)) = self.state_machine.pair_mut(source, dest) else {
            return Err(state_not_found(destination, layer_index));
        };

        let transition = AnimatorStateTransition::new(
            dest,
            normalized_duration * src.clip().length(),
            normalized_offset * dst.clip().length(),
            src.effective_time(),
        );
        log::debug!(
            "Layer '{}': cross-fade '{}' -> '{}' over {:.3}s (offset {:.3}s, exit {:.3}s)",
            self.name,
            src.name(),
            dst.name(),
            transition.duration,
            transition.offset,
            transition.exit_time
        );

        src.clear_solo_transitions();
        src.play_type = PlayType::Fading;
        dst.reset(transition.offset);
        src.transitions.push(transition);
        self.fading = Some(dest);
        Ok(true)
    }

    /// Jump straight into `state` at a fraction of its clip length, dropping
    /// any fade in progress.
    pub fn play_immediate(&mut self, layer_index: usize, state: &str, normalized_time: f32) -> Result<StateId> {
        let dest = self
            .state_machine
            .find(state)
            .ok_or_else(|| state_not_found(state, layer_index))?;

        if let Some(current) = self.playing.and_then(|id| self.state_machine.get_mut(id)) {
            let frame_time = current.frame_time;
            current.reset(frame_time);
        }

        if let Some(dst) = self.state_machine.get_mut(dest) {
            let start = normalized_time * dst.clip().length();
            dst.reset(start);
        }
        self.playing = Some(dest);
        self.fading = None;
        Ok(dest)
    }

    /// Advance the playing (and fading) clocks by `dt` and report what to
    /// evaluate this tick. A fade that reaches full weight swaps the playing
    /// state to its destination before returning.
    pub(crate) fn step(&mut self, dt: f32) -> LayerStep {
        let Some(source) = self.ensure_playing() else {
            return LayerStep::Idle;
        };

        let fading = self
            .state_machine
            .get(source)
            .filter(|s| s.play_type == PlayType::Fading)
            .and_then(|s| s.solo_transition())
            .map(|t| t.destination);

        let Some(destination) = fading else {
            if let Some(state) = self.state_machine.get_mut(source) {
                state.frame_time += dt;
                state.play_type = PlayType::Playing;
            }
            self.fading = None;
            return LayerStep::Plain(source);
        };

        let Some((src, dst)) = self.state_machine.pair_mut(source, destination) else {
            return LayerStep::Plain(source);
        };

        src.frame_time += dt;
        dst.frame_time = (dst.frame_time + dt).min(dst.clip().length());

        let source_length = src.clip().length();
        let weight = match src.solo_transition_mut() {
            Some(transition) => {
                transition.cross_fade_elapsed += dt;
                transition.weight(source_length)
            }
            None => 1.0,
        };

        if weight >= 1.0 {
            src.play_type = PlayType::Finished;
            src.clear_solo_transitions();
            dst.play_type = PlayType::Playing;
            log::debug!("Layer '{}': cross-fade '{}' -> '{}' finished", self.name, src.name(), dst.name());
            self.playing = Some(destination);
            self.fading = None;
        }

        LayerStep::CrossFade {
            source,
            destination,
            weight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::{AnimatedProperty, ClipCurve};
    use crate::curve::{AnimationCurve, Interpolation, Keyframe};
    use tessera_core::PropertyValue;

    fn clip(name: &str, length: f32) -> Arc<AnimationClip> {
        let curve = AnimationCurve::new(
            Interpolation::Linear,
            vec![
                Keyframe::new(0.0, PropertyValue::Float(0.0)),
                Keyframe::new(length, PropertyValue::Float(1.0)),
            ],
        )
        .unwrap();
        Arc::new(AnimationClip::new(
            name,
            vec![ClipCurve::new("", AnimatedProperty::Custom("v".into()), curve)],
        ))
    }

    fn layer() -> AnimatorControllerLayer {
        let mut layer = AnimatorControllerLayer::new("base");
        layer.add_state("idle", clip("idle", 2.0)).unwrap();
        layer.add_state("walk", clip("walk", 1.0)).unwrap();
        layer
    }

    #[test]
    fn first_state_plays_by_default() {
        let mut layer = layer();
        assert_eq!(layer.playing_state(), None);
        assert_eq!(layer.step(0.1), LayerStep::Plain(StateId(0)));
        assert_eq!(layer.playing_state(), Some(StateId(0)));
    }

    #[test]
    fn empty_layer_is_idle() {
        let mut layer = AnimatorControllerLayer::new("empty");
        assert_eq!(layer.step(0.1), LayerStep::Idle);
        assert!(matches!(
            layer.cross_fade(0, "idle", 0.5, 0.0),
            Err(TesseraError::StateNotFound { .. })
        ));
        assert!(layer.play_immediate(0, "idle", 0.0).is_err());
    }

    #[test]
    fn cross_fade_records_transition() {
        let mut layer = layer();
        layer.step(1.0);
        assert!(layer.cross_fade(0, "walk", 0.5, 0.25).unwrap());

        let idle = layer.state_machine().get(StateId(0)).unwrap();
        let transition = idle.solo_transition().unwrap();
        assert_eq!(transition.destination, StateId(1));
        assert_eq!(transition.duration, 1.0);
        assert_eq!(transition.offset, 0.25);
        assert_eq!(transition.exit_time, 1.0);
        assert_eq!(idle.play_type(), PlayType::Fading);
        assert_eq!(layer.fading_state(), Some(StateId(1)));
        assert_eq!(layer.state_machine().get(StateId(1)).unwrap().frame_time(), 0.25);
    }

    #[test]
    fn destination_cursor_holds_at_clip_end() {
        let mut layer = layer();
        layer.step(1.9);
        layer.cross_fade(0, "walk", 1.0, 0.9).unwrap();
        // Only 0.1s left in the source, so the fade finishes immediately
        let step = layer.step(0.5);
        assert!(matches!(step, LayerStep::CrossFade { weight, .. } if weight == 1.0));
        assert_eq!(layer.state_machine().get(StateId(1)).unwrap().frame_time(), 1.0);
        assert_eq!(layer.playing_state(), Some(StateId(1)));
    }

    #[test]
    fn cross_fade_to_playing_state_is_noop() {
        let mut layer = layer();
        layer.step(0.5);
        assert!(!layer.cross_fade(0, "idle", 0.5, 0.0).unwrap());
        assert_eq!(layer.fading_state(), None);
        assert_eq!(layer.cross_fade_weight(), None);
    }

    #[test]
    fn play_immediate_cancels_fade() {
        let mut layer = layer();
        layer.step(0.5);
        layer.cross_fade(0, "walk", 0.5, 0.0).unwrap();
        layer.play_immediate(0, "walk", 0.5).unwrap();

        assert_eq!(layer.playing_state(), Some(StateId(1)));
        assert_eq!(layer.fading_state(), None);
        assert!(layer.state_machine().get(StateId(0)).unwrap().solo_transition().is_none());
        assert_eq!(layer.state_machine().get(StateId(1)).unwrap().frame_time(), 0.5);
        assert_eq!(layer.step(0.1), LayerStep::Plain(StateId(1)));
    }

    #[test]
    fn entry_state_and_weight() {
        let mut layer = layer().with_weight(1.5);
        assert_eq!(layer.weight(), 1.0);
        layer.set_entry_state("walk").unwrap();
        assert_eq!(layer.playing_state(), Some(StateId(1)));
        assert!(layer.set_entry_state("run").is_err());
    }
}
