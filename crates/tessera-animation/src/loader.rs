//! TOML loading for clips, controllers, and animator settings

use crate::animator::AnimatorSettings;
use crate::clip::{AnimatedProperty, AnimationClip, ClipCurve, WrapMode};
use crate::controller::{AnimatorController, ParameterValue};
use crate::curve::{AnimationCurve, Interpolation, Keyframe};
use crate::layer::{AnimatorControllerLayer, LayerBlendingMode};
use crate::library::ClipLibrary;
use serde::Deserialize;
use std::path::Path;
use tessera_core::{PropertyValue, Result, TesseraError, ValueType};

/// Value type names used in clip files
#[derive(Debug, Clone, Copy, Deserialize)]
enum ValueTypeName {
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "vec2")]
    Vector2,
    #[serde(rename = "vec3")]
    Vector3,
    #[serde(rename = "vec4")]
    Vector4,
    #[serde(rename = "quat")]
    Quaternion,
}

impl From<ValueTypeName> for ValueType {
    fn from(name: ValueTypeName) -> Self {
        match name {
            ValueTypeName::Float => ValueType::Float,
            ValueTypeName::Vector2 => ValueType::Vector2,
            ValueTypeName::Vector3 => ValueType::Vector3,
            ValueTypeName::Vector4 => ValueType::Vector4,
            ValueTypeName::Quaternion => ValueType::Quaternion,
        }
    }
}

/// A scalar or a component array
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawValue {
    Scalar(f32),
    Components(Vec<f32>),
}

impl RawValue {
    fn components(&self) -> &[f32] {
        match self {
            RawValue::Scalar(v) => std::slice::from_ref(v),
            RawValue::Components(c) => c,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ClipFile {
    name: String,
    #[serde(default)]
    wrap_mode: WrapMode,
    #[serde(default)]
    curves: Vec<CurveFile>,
}

#[derive(Debug, Deserialize)]
struct CurveFile {
    #[serde(default)]
    path: String,
    property: AnimatedProperty,
    value_type: ValueTypeName,
    #[serde(default)]
    interpolation: Interpolation,
    #[serde(default)]
    default: Option<RawValue>,
    #[serde(default)]
    keyframes: Vec<KeyframeFile>,
}

#[derive(Debug, Deserialize)]
struct KeyframeFile {
    time: f32,
    value: RawValue,
    #[serde(default)]
    in_tangent: Option<RawValue>,
    #[serde(default)]
    out_tangent: Option<RawValue>,
}

/// Load an animation clip from a `.anim.toml` file.
///
/// ```toml
/// name = "platform_bob"
/// wrap_mode = "loop"
///
/// [[curves]]
/// path = "platform"
/// property = "position"
/// value_type = "vec3"
/// interpolation = "Linear"
///
/// [[curves.keyframes]]
/// time = 0.0
/// value = [0.0, 2.0, 0.0]
/// # ...more keyframes
/// ```
pub fn load_clip_from_file(path: &Path) -> Result<AnimationClip> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        TesseraError::AnimationError(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let file: ClipFile = toml::from_str(&content).map_err(|e| {
        TesseraError::AnimationError(format!("Failed to parse {}: {}", path.display(), e))
    })?;
    build_clip(file)
}

/// Parse an animation clip from a TOML string.
pub fn load_clip_from_str(content: &str) -> Result<AnimationClip> {
    build_clip(toml::from_str(content)?)
}

fn build_clip(file: ClipFile) -> Result<AnimationClip> {
    let mut curves = Vec::with_capacity(file.curves.len());

    for (i, curve) in file.curves.into_iter().enumerate() {
        let value_type = ValueType::from(curve.value_type);
        let convert = |raw: &RawValue, what: &str| {
            let components = raw.components();
            PropertyValue::from_components(value_type, components)
                .map(|v| match v {
                    PropertyValue::Quaternion(q) => PropertyValue::Quaternion(q.normalize()),
                    v => v,
                })
                .ok_or_else(|| {
                    TesseraError::AnimationError(format!(
                        "Clip '{}' curve {} {}: expected {} components for {}, got {}",
                        file.name,
                        i,
                        what,
                        value_type.component_count(),
                        value_type,
                        components.len()
                    ))
                })
        };

        if curve.keyframes.is_empty() {
            return Err(TesseraError::AnimationError(format!(
                "Clip '{}' curve {} has no keyframes",
                file.name, i
            )));
        }

        let mut keyframes = Vec::with_capacity(curve.keyframes.len());
        for kf in &curve.keyframes {
            let mut keyframe = Keyframe::new(kf.time, convert(&kf.value, "value")?);
            keyframe.in_tangent = kf.in_tangent.as_ref().map(|t| convert(t, "in_tangent")).transpose()?;
            keyframe.out_tangent = kf.out_tangent.as_ref().map(|t| convert(t, "out_tangent")).transpose()?;
            keyframes.push(keyframe);
        }

        let animation_curve = AnimationCurve::new(curve.interpolation, keyframes).map_err(|e| {
            TesseraError::AnimationError(format!("Clip '{}' curve {}: {}", file.name, i, e))
        })?;
        let mut clip_curve = ClipCurve::new(curve.path, curve.property, animation_curve);
        if let Some(default) = &curve.default {
            clip_curve = clip_curve.with_default(convert(default, "default")?);
        }
        curves.push(clip_curve);
    }

    Ok(AnimationClip::new(file.name, curves).with_wrap_mode(file.wrap_mode))
}

#[derive(Debug, Deserialize)]
struct ControllerFile {
    name: String,
    #[serde(default)]
    parameters: Vec<ParameterFile>,
    #[serde(default)]
    layers: Vec<LayerFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ParameterKind {
    Float,
    Int,
    Bool,
    Trigger,
}

#[derive(Debug, Deserialize)]
struct ParameterFile {
    name: String,
    #[serde(rename = "type")]
    kind: ParameterKind,
    #[serde(default)]
    default: Option<toml::Value>,
}

impl ParameterFile {
    fn value(&self) -> Result<ParameterValue> {
        let mismatch = |expected: &str| TesseraError::InvalidFieldType {
            expected: expected.to_string(),
            got: format!("{:?} for parameter '{}'", self.default, self.name),
        };
        let default = self.default.as_ref();
        Ok(match self.kind {
            ParameterKind::Float => ParameterValue::Float(match default {
                None => 0.0,
                Some(v) => v
                    .as_float()
                    .or_else(|| v.as_integer().map(|i| i as f64))
                    .ok_or_else(|| mismatch("float"))? as f32,
            }),
            ParameterKind::Int => ParameterValue::Int(match default {
                None => 0,
                Some(v) => v
                    .as_integer()
                    .and_then(|i| i32::try_from(i).ok())
                    .ok_or_else(|| mismatch("int"))?,
            }),
            ParameterKind::Bool => ParameterValue::Bool(match default {
                None => false,
                Some(v) => v.as_bool().ok_or_else(|| mismatch("bool"))?,
            }),
            ParameterKind::Trigger => ParameterValue::Trigger(false),
        })
    }
}

#[derive(Debug, Deserialize)]
struct LayerFile {
    name: String,
    #[serde(default = "full_weight")]
    weight: f32,
    #[serde(default)]
    blending: LayerBlendingMode,
    #[serde(default)]
    entry: Option<String>,
    #[serde(default)]
    states: Vec<StateFile>,
}

fn full_weight() -> f32 {
    1.0
}

#[derive(Debug, Deserialize)]
struct StateFile {
    name: String,
    clip: String,
}

/// Load a controller from a `.controller.toml` file, resolving state clips
/// from `library`.
///
/// ```toml
/// name = "robot"
///
/// [[parameters]]
/// name = "speed"
/// type = "float"
/// default = 1.0
///
/// [[layers]]
/// name = "base"
/// entry = "idle"
///
/// [[layers.states]]
/// name = "idle"
/// clip = "robot_idle"
/// ```
pub fn load_controller_from_file(path: &Path, library: &ClipLibrary) -> Result<AnimatorController> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        TesseraError::AnimationError(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let file: ControllerFile = toml::from_str(&content).map_err(|e| {
        TesseraError::AnimationError(format!("Failed to parse {}: {}", path.display(), e))
    })?;
    build_controller(file, library)
}

/// Parse a controller from a TOML string.
pub fn load_controller_from_str(content: &str, library: &ClipLibrary) -> Result<AnimatorController> {
    build_controller(toml::from_str(content)?, library)
}

fn build_controller(file: ControllerFile, library: &ClipLibrary) -> Result<AnimatorController> {
    let mut controller = AnimatorController::new(file.name);

    for param in &file.parameters {
        controller.add_parameter(param.name.clone(), param.value()?)?;
    }

    for layer_file in file.layers {
        let mut layer = AnimatorControllerLayer::new(layer_file.name)
            .with_weight(layer_file.weight)
            .with_blending_mode(layer_file.blending);
        for state in &layer_file.states {
            let clip = library
                .get(&state.clip)
                .ok_or_else(|| TesseraError::ClipNotFound(state.clip.clone()))?;
            layer.add_state(state.name.clone(), clip)?;
        }
        if let Some(entry) = &layer_file.entry {
            layer.set_entry_state(entry)?;
        }
        controller.add_layer(layer)?;
    }

    Ok(controller)
}

/// Load animator settings from a TOML file; missing keys take defaults.
pub fn load_settings_from_file(path: &Path) -> Result<AnimatorSettings> {
    let content = std::fs::read_to_string(path)?;
    load_settings_from_str(&content)
}

pub fn load_settings_from_str(content: &str) -> Result<AnimatorSettings> {
    Ok(toml::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    const CLIP: &str = r#"
name = "wave"
wrap_mode = "once"

[[curves]]
path = "arm"
property = "rotation"
value_type = "quat"
interpolation = "Linear"

[[curves.keyframes]]
time = 0.0
value = [0.0, 0.0, 0.0, 1.0]

[[curves.keyframes]]
time = 2.0
value = [0.0, 0.0, 0.0, 2.0]

[[curves]]
property = "intensity"
value_type = "float"
interpolation = "step"
default = 0.5

[[curves.keyframes]]
time = 0.0
value = 1.0

[[curves.keyframes]]
time = 1.0
value = 3
"#;

    #[test]
    fn parse_clip() {
        let clip = load_clip_from_str(CLIP).unwrap();
        assert_eq!(clip.name(), "wave");
        assert_eq!(clip.wrap_mode(), WrapMode::Once);
        assert_eq!(clip.length(), 2.0);
        assert_eq!(clip.curves().len(), 2);

        let rotation = &clip.curves()[0];
        assert_eq!(rotation.relative_path, "arm");
        assert_eq!(rotation.property, AnimatedProperty::Rotation);
        // Authored quaternions are normalized
        assert_eq!(rotation.curve.evaluate(2.0), PropertyValue::Quaternion(Quat::IDENTITY));

        let intensity = &clip.curves()[1];
        assert_eq!(intensity.relative_path, "");
        assert_eq!(intensity.property, AnimatedProperty::Custom("intensity".into()));
        assert_eq!(intensity.curve.interpolation(), Interpolation::Step);
        assert_eq!(intensity.default_value, Some(PropertyValue::Float(0.5)));
        assert_eq!(intensity.curve.evaluate(1.5), PropertyValue::Float(3.0));
    }

    #[test]
    fn parse_tangents() {
        let clip = load_clip_from_str(
            r#"
name = "ease"

[[curves]]
property = "position"
value_type = "vec3"
interpolation = "CubicSpline"

[[curves.keyframes]]
time = 0.0
value = [0.0, 0.0, 0.0]
in_tangent = [0.0, 0.0, 0.0]
out_tangent = [1.0, 0.0, 0.0]

[[curves.keyframes]]
time = 1.0
value = [1.0, 0.0, 0.0]
"#,
        )
        .unwrap();
        let kf = &clip.curves()[0].curve.keyframes()[0];
        assert_eq!(kf.out_tangent, Some(PropertyValue::Vector3(Vec3::X)));
    }

    #[test]
    fn reject_wrong_arity() {
        let result = load_clip_from_str(
            r#"
name = "bad"

[[curves]]
property = "position"
value_type = "vec3"

[[curves.keyframes]]
time = 0.0
value = [1.0, 2.0]
"#,
        );
        assert!(matches!(result, Err(TesseraError::AnimationError(_))));
    }

    #[test]
    fn reject_empty_curve() {
        let result = load_clip_from_str(
            r#"
name = "empty"

[[curves]]
property = "position"
value_type = "vec3"
keyframes = []
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn reject_decreasing_times() {
        let result = load_clip_from_str(
            r#"
name = "backwards"

[[curves]]
property = "scale"
value_type = "vec3"

[[curves.keyframes]]
time = 1.0
value = [1.0, 1.0, 1.0]

[[curves.keyframes]]
time = 0.5
value = [2.0, 2.0, 2.0]
"#,
        );
        assert!(result.is_err());
    }

    fn library() -> ClipLibrary {
        let mut library = ClipLibrary::new();
        library.add_clip(load_clip_from_str(CLIP).unwrap());
        library.add_clip(AnimationClip::new("idle", vec![]));
        library
    }

    const CONTROLLER: &str = r#"
name = "robot"

[[parameters]]
name = "speed"
type = "float"
default = 2

[[parameters]]
name = "jump"
type = "trigger"

[[layers]]
name = "base"
blending = "additive"
entry = "wave"

[[layers.states]]
name = "idle"
clip = "idle"

[[layers.states]]
name = "wave"
clip = "wave"

[[layers]]
name = "face"
weight = 0.5
blending = "additive"

[[layers.states]]
name = "blink"
clip = "idle"
"#;

    #[test]
    fn parse_controller() {
        let controller = load_controller_from_str(CONTROLLER, &library()).unwrap();
        assert_eq!(controller.name(), "robot");
        assert_eq!(controller.layer_count(), 2);

        let base = controller.layer(0).unwrap();
        assert_eq!(base.blending_mode(), LayerBlendingMode::Override);
        assert_eq!(base.state_machine().len(), 2);
        assert_eq!(base.playing_state(), base.state_machine().find("wave"));

        let face = controller.layer(1).unwrap();
        assert_eq!(face.weight(), 0.5);
        assert_eq!(face.blending_mode(), LayerBlendingMode::Additive);

        assert_eq!(controller.parameter("speed"), Some(ParameterValue::Float(2.0)));
        assert_eq!(controller.parameter("jump"), Some(ParameterValue::Trigger(false)));
    }

    #[test]
    fn controller_reports_missing_clip() {
        let result = load_controller_from_str(
            r#"
name = "c"

[[layers]]
name = "base"

[[layers.states]]
name = "run"
clip = "run"
"#,
            &library(),
        );
        assert!(matches!(result, Err(TesseraError::ClipNotFound(name)) if name == "run"));
    }

    #[test]
    fn controller_rejects_mistyped_parameter() {
        let result = load_controller_from_str(
            r#"
name = "c"

[[parameters]]
name = "grounded"
type = "bool"
default = 1.5
"#,
            &library(),
        );
        assert!(matches!(result, Err(TesseraError::InvalidFieldType { .. })));
    }

    #[test]
    fn settings_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("animator.toml");
        std::fs::write(&path, "speed = 1.5\nadditive_position = \"weighted\"\n").unwrap();
        let settings = load_settings_from_file(&path).unwrap();
        assert_eq!(settings.speed, 1.5);
        assert_eq!(settings.additive_position, crate::blend::AdditivePositionPolicy::Weighted);
        assert!(load_settings_from_str("speed = \"fast\"").is_err());
    }
}
