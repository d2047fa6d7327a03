//! Animator controller: ordered layers plus a parameter table

use crate::clip::AnimationClip;
use crate::layer::{AnimatorControllerLayer, LayerBlendingMode};
use std::collections::HashMap;
use std::sync::Arc;
use tessera_core::{Result, TesseraError};

/// A controller parameter value. Parameters are stored for hosts and
/// future condition-driven transitions; the animator never reads them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterValue {
    Float(f32),
    Int(i32),
    Bool(bool),
    /// A bool that is cleared once consumed
    Trigger(bool),
}

impl ParameterValue {
    pub fn kind(&self) -> &'static str {
        match self {
            ParameterValue::Float(_) => "float",
            ParameterValue::Int(_) => "int",
            ParameterValue::Bool(_) => "bool",
            ParameterValue::Trigger(_) => "trigger",
        }
    }

    fn same_kind(&self, other: &ParameterValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// A named parameter
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatorControllerParameter {
    pub name: String,
    pub value: ParameterValue,
}

/// Ordered layers (layer 0 is the base pose) and parameters
#[derive(Debug, Clone, Default)]
pub struct AnimatorController {
    name: String,
    layers: Vec<AnimatorControllerLayer>,
    layer_names: HashMap<String, usize>,
    parameters: Vec<AnimatorControllerParameter>,
}

impl AnimatorController {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a layer and return its index. The first layer always
    /// overrides, whatever mode it was configured with.
    pub fn add_layer(&mut self, mut layer: AnimatorControllerLayer) -> Result<usize> {
        if self.layer_names.contains_key(layer.name()) {
            return Err(TesseraError::AnimationError(format!(
                "duplicate layer name '{}'",
                layer.name()
            )));
        }
        let index = self.layers.len();
        if index == 0 && layer.blending_mode() != LayerBlendingMode::Override {
            log::debug!("Layer '{}' is the base layer, forcing override blending", layer.name());
            layer.force_blending_mode(LayerBlendingMode::Override);
        }
        self.layer_names.insert(layer.name().to_string(), index);
        self.layers.push(layer);
        Ok(index)
    }

    pub fn layer(&self, index: usize) -> Result<&AnimatorControllerLayer> {
        self.layers
            .get(index)
            .ok_or_else(|| TesseraError::LayerNotFound(index.to_string()))
    }

    pub fn layer_mut(&mut self, index: usize) -> Result<&mut AnimatorControllerLayer> {
        self.layers
            .get_mut(index)
            .ok_or_else(|| TesseraError::LayerNotFound(index.to_string()))
    }

    pub fn find_layer(&self, name: &str) -> Option<usize> {
        self.layer_names.get(name).copied()
    }

    pub fn layers(&self) -> &[AnimatorControllerLayer] {
        &self.layers
    }

    pub(crate) fn layers_mut(&mut self) -> &mut [AnimatorControllerLayer] {
        &mut self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn set_layer_weight(&mut self, index: usize, weight: f32) -> Result<()> {
        self.layer_mut(index)?.set_weight(weight);
        Ok(())
    }

    /// Change a layer's blending mode. The base layer cannot become additive.
    pub fn set_blending_mode(&mut self, index: usize, mode: LayerBlendingMode) -> Result<()> {
        if index == 0 && mode == LayerBlendingMode::Additive {
            return Err(TesseraError::AnimationError(
                "the base layer must use override blending".into(),
            ));
        }
        self.layer_mut(index)?.force_blending_mode(mode);
        Ok(())
    }

    /// Every clip referenced by any state, deduplicated by identity
    pub fn clips(&self) -> Vec<Arc<AnimationClip>> {
        let mut clips: Vec<Arc<AnimationClip>> = Vec::new();
        for state in self.layers.iter().flat_map(|l| l.state_machine().states()) {
            if !clips.iter().any(|c| Arc::ptr_eq(c, state.clip())) {
                clips.push(Arc::clone(state.clip()));
            }
        }
        clips
    }

    // --- Parameters ---

    pub fn add_parameter(&mut self, name: impl Into<String>, value: ParameterValue) -> Result<()> {
        let name = name.into();
        if self.parameters.iter().any(|p| p.name == name) {
            return Err(TesseraError::AnimationError(format!(
                "duplicate parameter '{}'",
                name
            )));
        }
        self.parameters.push(AnimatorControllerParameter { name, value });
        Ok(())
    }

    /// Overwrite a parameter, keeping its kind
    pub fn set_parameter(&mut self, name: &str, value: ParameterValue) -> Result<()> {
        let param = self
            .parameters
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| TesseraError::AnimationError(format!("unknown parameter '{}'", name)))?;
        if !param.value.same_kind(&value) {
            return Err(TesseraError::InvalidFieldType {
                expected: param.value.kind().to_string(),
                got: value.kind().to_string(),
            });
        }
        param.value = value;
        Ok(())
    }

    pub fn parameter(&self, name: &str) -> Option<ParameterValue> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value)
    }

    pub fn set_trigger(&mut self, name: &str) -> Result<()> {
        self.set_parameter(name, ParameterValue::Trigger(true))
    }

    pub fn reset_trigger(&mut self, name: &str) -> Result<()> {
        self.set_parameter(name, ParameterValue::Trigger(false))
    }

    pub fn parameters(&self) -> &[AnimatorControllerParameter] {
        &self.parameters
    }
}
