//! Per-entity animation driver
//!
//! An `Animator` owns a controller instance (its playback cursors) and a
//! binding table from `(relative path, property)` to target entities. Each
//! `advance` steps every layer's clocks, then writes the layer's pose onto
//! the targets:
//!
//! - layer 0 writes sampled values directly
//! - override layers blend from the current value by layer weight
//! - additive layers apply the delta from the curve's first frame
//!
//! While a layer cross-fades, the source and destination clips are sampled
//! together and every property either clip touches is blended by the fade
//! weight, fading properties the other clip lacks to or from their rest value.

use crate::blend::{
    apply_additive, blend_property, compute_delta, lerp_value, neutral_delta, AdditivePositionPolicy,
};
use crate::clip::{AnimatedProperty, ClipCurve};
use crate::controller::{AnimatorController, ParameterValue};
use crate::layer::{LayerBlendingMode, LayerStep};
use crate::state::AnimatorState;
use crate::target::AnimationTargets;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tessera_core::{EntityId, PropertyValue, Result, TesseraError};

/// Whether `advance` moves the clocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    /// Stopped: `advance` leaves cursors and targets untouched
    #[default]
    Offline,
    Playback,
}

/// Tunables applied to an animator, loadable from TOML
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatorSettings {
    /// Multiplier on every `advance` delta
    pub speed: f32,
    pub playback_mode: PlaybackMode,
    pub additive_position: AdditivePositionPolicy,
}

impl Default for AnimatorSettings {
    fn default() -> Self {
        Self {
            speed: 1.0,
            playback_mode: PlaybackMode::default(),
            additive_position: AdditivePositionPolicy::default(),
        }
    }
}

/// A resolved curve target and the value it had when bound
#[derive(Debug, Clone, Copy)]
struct Binding {
    entity: EntityId,
    rest: Option<PropertyValue>,
}

type Bindings = HashMap<String, HashMap<AnimatedProperty, Binding>>;

/// Drives one controller against the entities below `root`
#[derive(Debug)]
pub struct Animator {
    root: EntityId,
    controller: Option<AnimatorController>,
    mode: PlaybackMode,
    speed: f32,
    additive_position: AdditivePositionPolicy,
    bindings: Bindings,
}

impl Animator {
    pub fn new(root: EntityId) -> Self {
        Self::with_settings(root, AnimatorSettings::default())
    }

    pub fn with_settings(root: EntityId, settings: AnimatorSettings) -> Self {
        let mut animator = Self {
            root,
            controller: None,
            mode: PlaybackMode::Offline,
            speed: 1.0,
            additive_position: AdditivePositionPolicy::default(),
            bindings: HashMap::new(),
        };
        animator.apply_settings(&settings);
        animator
    }

    pub fn apply_settings(&mut self, settings: &AnimatorSettings) {
        self.speed = settings.speed;
        self.mode = settings.playback_mode;
        self.additive_position = settings.additive_position;
    }

    pub fn settings(&self) -> AnimatorSettings {
        AnimatorSettings {
            speed: self.speed,
            playback_mode: self.mode,
            additive_position: self.additive_position,
        }
    }

    pub fn root(&self) -> EntityId {
        self.root
    }

    pub fn controller(&self) -> Option<&AnimatorController> {
        self.controller.as_ref()
    }

    pub fn controller_mut(&mut self) -> Option<&mut AnimatorController> {
        self.controller.as_mut()
    }

    fn controller_or_err(&mut self) -> Result<&mut AnimatorController> {
        self.controller.as_mut().ok_or(TesseraError::NoController)
    }

    /// Install a controller and bind its curves against `targets`
    pub fn set_controller<T: AnimationTargets + ?Sized>(&mut self, controller: AnimatorController, targets: &T) {
        self.controller = Some(controller);
        self.rebind(targets);
    }

    /// Re-resolve every curve path and capture rest values
    pub fn rebind<T: AnimationTargets + ?Sized>(&mut self, targets: &T) {
        self.bindings.clear();
        let Some(controller) = &self.controller else {
            return;
        };

        for clip in controller.clips() {
            for curve in clip.curves() {
                let by_property = self.bindings.entry(curve.relative_path.clone()).or_default();
                if by_property.contains_key(&curve.property) {
                    continue;
                }
                let Some(entity) = targets.resolve(self.root, &curve.relative_path) else {
                    log::warn!(
                        "Clip '{}': no entity at '{}' below {}, curve '{}' unbound",
                        clip.name(),
                        curve.relative_path,
                        self.root,
                        curve.property
                    );
                    continue;
                };
                let rest = targets.read(entity, &curve.property);
                by_property.insert(curve.property.clone(), Binding { entity, rest });
            }
        }
        self.bindings.retain(|_, by_property| !by_property.is_empty());
    }

    /// Number of bound `(path, property)` pairs
    pub fn bound_count(&self) -> usize {
        self.bindings.values().map(HashMap::len).sum()
    }

    /// Entity a curve path resolved to, if bound
    pub fn bound_entity(&self, path: &str, property: &AnimatedProperty) -> Option<EntityId> {
        self.bindings.get(path)?.get(property).map(|b| b.entity)
    }

    // --- Playback control ---

    pub fn play(&mut self) {
        self.mode = PlaybackMode::Playback;
    }

    pub fn stop(&mut self) {
        self.mode = PlaybackMode::Offline;
    }

    pub fn playback_mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn set_playback_mode(&mut self, mode: PlaybackMode) {
        self.mode = mode;
    }

    pub fn is_playing(&self) -> bool {
        self.mode == PlaybackMode::Playback
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, multiplier: f32) {
        self.speed = multiplier;
    }

    pub fn additive_position_policy(&self) -> AdditivePositionPolicy {
        self.additive_position
    }

    pub fn set_additive_position_policy(&mut self, policy: AdditivePositionPolicy) {
        self.additive_position = policy;
    }

    /// Jump `layer` into `state` at a fraction of its length and start playback
    pub fn play_state(&mut self, state: &str, layer: usize, normalized_time: f32) -> Result<()> {
        self.controller_or_err()?
            .layer_mut(layer)?
            .play_immediate(layer, state, normalized_time)?;
        self.mode = PlaybackMode::Playback;
        Ok(())
    }

    /// Fade `layer` from its playing state into `state`.
    ///
    /// Returns `false` when `state` is already the playing state.
    pub fn cross_fade(
        &mut self,
        state: &str,
        layer: usize,
        normalized_duration: f32,
        normalized_offset: f32,
    ) -> Result<bool> {
        self.controller_or_err()?
            .layer_mut(layer)?
            .cross_fade(layer, state, normalized_duration, normalized_offset)
    }

    // --- Parameters ---

    pub fn set_parameter(&mut self, name: &str, value: ParameterValue) -> Result<()> {
        self.controller_or_err()?.set_parameter(name, value)
    }

    pub fn parameter(&self, name: &str) -> Option<ParameterValue> {
        self.controller.as_ref()?.parameter(name)
    }

    pub fn set_trigger(&mut self, name: &str) -> Result<()> {
        self.controller_or_err()?.set_trigger(name)
    }

    pub fn reset_trigger(&mut self, name: &str) -> Result<()> {
        self.controller_or_err()?.reset_trigger(name)
    }

    // --- Update ---

    /// Advance every layer by `dt` seconds (scaled by speed) and write the
    /// resulting pose onto `targets`.
    pub fn advance<T: AnimationTargets + ?Sized>(&mut self, dt: f32, targets: &mut T) {
        if self.mode == PlaybackMode::Offline {
            return;
        }
        let Some(controller) = self.controller.as_mut() else {
            return;
        };
        let dt = dt * self.speed;
        if !dt.is_finite() {
            log::warn!("Animator {}: ignoring non-finite time step {}", self.root, dt);
            return;
        }

        for (index, layer) in controller.layers_mut().iter_mut().enumerate() {
            let step = layer.step(dt);
            let writer = LayerWriter {
                bindings: &self.bindings,
                layer_index: index,
                mode: layer.blending_mode(),
                weight: layer.weight(),
                policy: self.additive_position,
            };
            let machine = layer.state_machine();

            match step {
                LayerStep::Idle => {}
                LayerStep::Plain(id) => {
                    if let Some(state) = machine.get(id) {
                        writer.write_plain(state, targets);
                    }
                }
                LayerStep::CrossFade {
                    source,
                    destination,
                    weight,
                } => {
                    if let (Some(src), Some(dst)) = (machine.get(source), machine.get(destination)) {
                        writer.write_cross_fade(src, dst, weight, targets);
                    }
                }
            }
        }
    }
}

/// Composes one layer's sampled values onto the targets
struct LayerWriter<'a> {
    bindings: &'a Bindings,
    layer_index: usize,
    mode: LayerBlendingMode,
    weight: f32,
    policy: AdditivePositionPolicy,
}

impl LayerWriter<'_> {
    fn binding(&self, curve: &ClipCurve) -> Option<&Binding> {
        self.bindings
            .get(curve.relative_path.as_str())?
            .get(&curve.property)
    }

    /// Rest value a property fades to or from: the authored default, else the
    /// value captured at bind time, else the neutral value of its type.
    fn default_value(&self, curve: &ClipCurve) -> PropertyValue {
        let value_type = curve.value_type();
        curve
            .default_value
            .or_else(|| self.binding(curve).and_then(|b| b.rest))
            .filter(|v| v.value_type() == value_type)
            .unwrap_or_else(|| curve.property.neutral_value(value_type))
    }

    fn write_plain<T: AnimationTargets + ?Sized>(&self, state: &AnimatorState, targets: &mut T) {
        let time = state.effective_time();
        for curve in state.clip().curves() {
            self.compose(curve, curve.curve.evaluate(time), targets);
        }
    }

    fn write_cross_fade<T: AnimationTargets + ?Sized>(
        &self,
        source: &AnimatorState,
        destination: &AnimatorState,
        weight: f32,
        targets: &mut T,
    ) {
        let source_time = source.effective_time();
        let destination_time = destination.frame_time();

        let destination_curves: HashMap<(&str, &AnimatedProperty), &ClipCurve> = destination
            .clip()
            .curves()
            .iter()
            .map(|c| ((c.relative_path.as_str(), &c.property), c))
            .collect();
        let mut seen: HashSet<(&str, &AnimatedProperty)> = HashSet::new();

        for curve in source.clip().curves() {
            let key = (curve.relative_path.as_str(), &curve.property);
            if !seen.insert(key) {
                continue;
            }
            let sampled = curve.curve.evaluate(source_time);
            let dest = destination_curves
                .get(&key)
                .map(|dest| (*dest, dest.curve.evaluate(destination_time)));

            if self.is_additive() {
                let from = self.delta_of(curve, &sampled);
                let to = match &dest {
                    Some((dest, value)) => self.delta_of(dest, value),
                    None => Some(neutral_delta(&curve.property, curve.value_type())),
                };
                let delta = from.zip(to).and_then(|(a, b)| lerp_value(&a, &b, weight));
                self.compose_delta(curve, delta, targets);
                continue;
            }

            let blended = match dest {
                Some((_, target)) => blend_property(&curve.property, &sampled, &target, weight),
                None => blend_property(&curve.property, &self.default_value(curve), &sampled, 1.0 - weight),
            };
            self.compose_blended(curve, blended, targets);
        }

        for curve in destination.clip().curves() {
            if !seen.insert((curve.relative_path.as_str(), &curve.property)) {
                continue;
            }
            let sampled = curve.curve.evaluate(destination_time);

            if self.is_additive() {
                let neutral = neutral_delta(&curve.property, curve.value_type());
                let delta = self
                    .delta_of(curve, &sampled)
                    .and_then(|d| lerp_value(&neutral, &d, weight));
                self.compose_delta(curve, delta, targets);
                continue;
            }

            let blended = blend_property(&curve.property, &self.default_value(curve), &sampled, weight);
            self.compose_blended(curve, blended, targets);
        }
    }

    fn is_additive(&self) -> bool {
        self.layer_index > 0 && self.mode == LayerBlendingMode::Additive
    }

    /// Delta of `value` from its own curve's first frame
    fn delta_of(&self, curve: &ClipCurve, value: &PropertyValue) -> Option<PropertyValue> {
        compute_delta(&curve.property, &curve.first_frame_value(), value)
    }

    fn current_value<T: AnimationTargets + ?Sized>(&self, binding: &Binding, curve: &ClipCurve, targets: &T) -> PropertyValue {
        targets
            .read(binding.entity, &curve.property)
            .unwrap_or_else(|| self.default_value(curve))
    }

    fn compose_blended<T: AnimationTargets + ?Sized>(
        &self,
        curve: &ClipCurve,
        value: Option<PropertyValue>,
        targets: &mut T,
    ) {
        match value {
            Some(value) => self.compose(curve, value, targets),
            None => log::trace!(
                "Skipping '{}'.{}: values do not blend",
                curve.relative_path,
                curve.property
            ),
        }
    }

    /// Apply an already blended additive delta at layer weight
    fn compose_delta<T: AnimationTargets + ?Sized>(
        &self,
        curve: &ClipCurve,
        delta: Option<PropertyValue>,
        targets: &mut T,
    ) {
        let Some(binding) = self.binding(curve) else {
            return;
        };
        let current = self.current_value(binding, curve, &*targets);
        let out = delta.and_then(|delta| {
            apply_additive(&curve.property, &current, &delta, self.weight, self.policy)
        });
        self.store(curve, binding, out, targets);
    }

    /// Apply `value` with this layer's composition rule
    fn compose<T: AnimationTargets + ?Sized>(&self, curve: &ClipCurve, value: PropertyValue, targets: &mut T) {
        let Some(binding) = self.binding(curve) else {
            return;
        };
        let property = &curve.property;

        let out = if self.layer_index == 0 {
            property.accepts(&value).then_some(value)
        } else {
            let current = self.current_value(binding, curve, &*targets);
            match self.mode {
                LayerBlendingMode::Override => blend_property(property, &current, &value, self.weight),
                LayerBlendingMode::Additive => self
                    .delta_of(curve, &value)
                    .and_then(|delta| apply_additive(property, &current, &delta, self.weight, self.policy)),
            }
        };
        self.store(curve, binding, out, targets);
    }

    fn store<T: AnimationTargets + ?Sized>(
        &self,
        curve: &ClipCurve,
        binding: &Binding,
        out: Option<PropertyValue>,
        targets: &mut T,
    ) {
        match out {
            Some(out) => {
                if !targets.write(binding.entity, &curve.property, out) {
                    log::trace!("Target {} refused '{}'", binding.entity, curve.property);
                }
            }
            None => log::trace!(
                "Skipping '{}'.{} on layer {}: {} values do not fit",
                curve.relative_path,
                curve.property,
                self.layer_index,
                curve.value_type()
            ),
        }
    }
}
