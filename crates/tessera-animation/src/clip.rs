//! Animation clips: curves bound to relative paths and properties

use crate::curve::{AnimationCurve, Interpolation, Keyframe};
use serde::{Deserialize, Serialize};
use std::fmt;
use tessera_core::{PropertyValue, Result, TesseraError, ValueType};
use tessera_import::{ImportedClip, ImportedProperty};

/// What an animation curve drives on its target entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AnimatedProperty {
    /// Drives transform.position
    Position,
    /// Drives transform.rotation
    Rotation,
    /// Drives transform.scale
    Scale,
    /// Drives a named custom property (e.g. a light's `intensity`)
    Custom(String),
}

impl AnimatedProperty {
    /// Resolve a property name. `translation` is accepted for glTF sources;
    /// any unrecognized name becomes a custom property.
    pub fn from_name(name: &str) -> Self {
        match name {
            "position" | "translation" => AnimatedProperty::Position,
            "rotation" => AnimatedProperty::Rotation,
            "scale" => AnimatedProperty::Scale,
            other => AnimatedProperty::Custom(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            AnimatedProperty::Position => "position",
            AnimatedProperty::Rotation => "rotation",
            AnimatedProperty::Scale => "scale",
            AnimatedProperty::Custom(name) => name,
        }
    }

    /// Scale deltas are ratios rather than differences
    pub fn is_scale(&self) -> bool {
        matches!(self, AnimatedProperty::Scale)
    }

    /// Whether a value has the type this property stores
    pub fn accepts(&self, value: &PropertyValue) -> bool {
        match self {
            AnimatedProperty::Position | AnimatedProperty::Scale => {
                value.value_type() == ValueType::Vector3
            }
            AnimatedProperty::Rotation => value.value_type() == ValueType::Quaternion,
            AnimatedProperty::Custom(_) => true,
        }
    }

    /// Value used when neither the curve nor the target supplies a default
    pub fn neutral_value(&self, value_type: ValueType) -> PropertyValue {
        match (self, value_type) {
            (AnimatedProperty::Scale, ValueType::Vector3) => {
                PropertyValue::Vector3(glam::Vec3::ONE)
            }
            _ => PropertyValue::zero(value_type),
        }
    }
}

impl From<String> for AnimatedProperty {
    fn from(name: String) -> Self {
        AnimatedProperty::from_name(&name)
    }
}

impl From<AnimatedProperty> for String {
    fn from(property: AnimatedProperty) -> Self {
        property.name().to_string()
    }
}

impl fmt::Display for AnimatedProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What happens when playback runs past the end of a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WrapMode {
    /// Wrap back to the start
    #[default]
    Loop,
    /// Hold the last frame
    Once,
}

/// One curve of a clip and the entity property it drives
#[derive(Debug, Clone)]
pub struct ClipCurve {
    /// Slash-separated path from the animator root ("" is the root itself)
    pub relative_path: String,
    pub property: AnimatedProperty,
    pub curve: AnimationCurve,
    /// Authored bind-pose value
    pub default_value: Option<PropertyValue>,
}

impl ClipCurve {
    pub fn new(relative_path: impl Into<String>, property: AnimatedProperty, curve: AnimationCurve) -> Self {
        Self {
            relative_path: relative_path.into(),
            property,
            curve,
            default_value: None,
        }
    }

    pub fn with_default(mut self, value: PropertyValue) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn value_type(&self) -> ValueType {
        self.curve.value_type()
    }

    /// Base value for additive deltas
    pub fn first_frame_value(&self) -> PropertyValue {
        self.curve.first_value()
    }
}

/// An immutable set of curves played together.
///
/// Clips are shared between states and animators via `Arc`.
#[derive(Debug, Clone)]
pub struct AnimationClip {
    name: String,
    curves: Vec<ClipCurve>,
    wrap_mode: WrapMode,
    length: f32,
}

impl AnimationClip {
    /// Build a clip; its length is the latest key time of any curve.
    pub fn new(name: impl Into<String>, curves: Vec<ClipCurve>) -> Self {
        let length = curves
            .iter()
            .map(|c| c.curve.length())
            .fold(0.0_f32, f32::max);
        Self {
            name: name.into(),
            curves,
            wrap_mode: WrapMode::default(),
            length,
        }
    }

    pub fn with_wrap_mode(mut self, wrap_mode: WrapMode) -> Self {
        self.wrap_mode = wrap_mode;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn curves(&self) -> &[ClipCurve] {
        &self.curves
    }

    pub fn wrap_mode(&self) -> WrapMode {
        self.wrap_mode
    }

    /// Length in seconds
    pub fn length(&self) -> f32 {
        self.length
    }

    /// Find the curve driving `(path, property)`
    pub fn curve_for(&self, path: &str, property: &AnimatedProperty) -> Option<&ClipCurve> {
        self.curves
            .iter()
            .find(|c| c.relative_path == path && &c.property == property)
    }

    /// Convert an imported glTF node animation.
    ///
    /// Curve paths are the node paths from the glTF scene root.
    pub fn from_imported(imported: &ImportedClip) -> Result<Self> {
        let curves = imported
            .channels
            .iter()
            .map(|ch| -> Result<ClipCurve> {
                let (property, value_type) = match ch.property {
                    ImportedProperty::Translation => (AnimatedProperty::Position, ValueType::Vector3),
                    ImportedProperty::Rotation => (AnimatedProperty::Rotation, ValueType::Quaternion),
                    ImportedProperty::Scale => (AnimatedProperty::Scale, ValueType::Vector3),
                };
                let to_value = |components: &[f32]| {
                    PropertyValue::from_components(value_type, components).ok_or_else(|| {
                        TesseraError::ImportError(format!(
                            "clip '{}': {} value for '{}' has {} components",
                            imported.name,
                            property,
                            ch.node_path,
                            components.len()
                        ))
                    })
                };

                let keyframes = ch
                    .keyframes
                    .iter()
                    .map(|kf| -> Result<Keyframe> {
                        let keyframe = Keyframe::new(kf.time, to_value(&kf.value)?);
                        Ok(match (&kf.in_tangent, &kf.out_tangent) {
                            (Some(i), Some(o)) => keyframe.with_tangents(to_value(i)?, to_value(o)?),
                            _ => keyframe,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;

                let curve = AnimationCurve::new(Interpolation::from_gltf(&ch.interpolation), keyframes)?;
                Ok(ClipCurve::new(ch.node_path.clone(), property, curve))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(imported.name.clone(), curves))
    }

    /// Map a playback cursor to the time curves are sampled at
    pub fn effective_time(&self, time: f32) -> f32 {
        if self.length <= 0.0 {
            return 0.0;
        }
        match self.wrap_mode {
            WrapMode::Loop => time.rem_euclid(self.length),
            WrapMode::Once => time.clamp(0.0, self.length),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn linear_x(length: f32, to: f32) -> AnimationCurve {
        AnimationCurve::new(
            Interpolation::Linear,
            vec![
                Keyframe::new(0.0, PropertyValue::Vector3(Vec3::ZERO)),
                Keyframe::new(length, PropertyValue::Vector3(Vec3::new(to, 0.0, 0.0))),
            ],
        )
        .unwrap()
    }

    #[test]
    fn length_is_latest_key() {
        let clip = AnimationClip::new(
            "walk",
            vec![
                ClipCurve::new("", AnimatedProperty::Position, linear_x(1.0, 1.0)),
                ClipCurve::new("arm", AnimatedProperty::Position, linear_x(2.5, 1.0)),
            ],
        );
        assert_eq!(clip.length(), 2.5);
        assert_eq!(clip.curves().len(), 2);
        assert!(clip.curve_for("arm", &AnimatedProperty::Position).is_some());
        assert!(clip.curve_for("arm", &AnimatedProperty::Scale).is_none());
    }

    #[test]
    fn effective_time_wraps_or_clamps() {
        let curves = vec![ClipCurve::new("", AnimatedProperty::Position, linear_x(2.0, 1.0))];
        let looping = AnimationClip::new("a", curves.clone());
        assert!((looping.effective_time(2.5) - 0.5).abs() < 1e-6);
        assert!((looping.effective_time(-0.5) - 1.5).abs() < 1e-6);

        let once = AnimationClip::new("b", curves).with_wrap_mode(WrapMode::Once);
        assert_eq!(once.effective_time(5.0), 2.0);
        assert_eq!(once.effective_time(-1.0), 0.0);

        let empty = AnimationClip::new("c", vec![]);
        assert_eq!(empty.length(), 0.0);
        assert_eq!(empty.effective_time(3.0), 0.0);
    }

    #[test]
    fn converts_imported_channels() {
        use tessera_import::{ImportedChannel, ImportedKeyframe};

        let imported = ImportedClip {
            name: "spin".into(),
            duration: 1.0,
            channels: vec![
                ImportedChannel {
                    node_index: 0,
                    node_name: "arm".into(),
                    node_path: "robot/arm".into(),
                    property: ImportedProperty::Rotation,
                    interpolation: "LINEAR".into(),
                    keyframes: vec![
                        ImportedKeyframe::new(0.0, vec![0.0, 0.0, 0.0, 1.0]),
                        ImportedKeyframe::new(1.0, vec![0.0, 1.0, 0.0, 0.0]),
                    ],
                },
                ImportedChannel {
                    node_index: 0,
                    node_name: "arm".into(),
                    node_path: "robot/arm".into(),
                    property: ImportedProperty::Translation,
                    interpolation: "STEP".into(),
                    keyframes: vec![ImportedKeyframe::new(0.5, vec![1.0, 2.0, 3.0])],
                },
            ],
        };

        let clip = AnimationClip::from_imported(&imported).unwrap();
        assert_eq!(clip.name(), "spin");
        assert_eq!(clip.length(), 1.0);
        let rotation = clip.curve_for("robot/arm", &AnimatedProperty::Rotation).unwrap();
        assert_eq!(rotation.value_type(), ValueType::Quaternion);
        let position = clip.curve_for("robot/arm", &AnimatedProperty::Position).unwrap();
        assert_eq!(position.curve.interpolation(), Interpolation::Step);

        let mut bad = imported.clone();
        bad.channels[1].keyframes[0].value = vec![1.0];
        assert!(matches!(
            AnimationClip::from_imported(&bad),
            Err(TesseraError::ImportError(_))
        ));
    }

    #[test]
    fn property_names_round_trip() {
        assert_eq!(AnimatedProperty::from_name("translation"), AnimatedProperty::Position);
        assert_eq!(
            AnimatedProperty::from_name("intensity"),
            AnimatedProperty::Custom("intensity".into())
        );
        let name: String = AnimatedProperty::Scale.into();
        assert_eq!(name, "scale");
        assert!(AnimatedProperty::Scale.is_scale());
        assert!(!AnimatedProperty::Position.is_scale());
    }

    #[test]
    fn transform_properties_check_value_type() {
        assert!(AnimatedProperty::Position.accepts(&PropertyValue::Vector3(Vec3::ONE)));
        assert!(!AnimatedProperty::Position.accepts(&PropertyValue::Float(1.0)));
        assert!(AnimatedProperty::Rotation.accepts(&PropertyValue::Quaternion(glam::Quat::IDENTITY)));
        assert!(AnimatedProperty::Custom("x".into()).accepts(&PropertyValue::Float(1.0)));
        assert_eq!(
            AnimatedProperty::Scale.neutral_value(ValueType::Vector3),
            PropertyValue::Vector3(Vec3::ONE)
        );
    }
}
