//! Value blending, cross-fade weights, and additive deltas
//!
//! Cross-layer and cross-fade blending interpolate two sampled values
//! (lerp for vectors, shortest-arc slerp for rotations). Additive layers
//! turn a sample into a delta from the curve's first frame and compose that
//! delta onto whatever earlier layers wrote.

use crate::clip::AnimatedProperty;
use glam::{Quat, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use tessera_core::{PropertyValue, ValueType};

const EPSILON: f32 = 1e-6;

/// How additive layers scale position deltas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdditivePositionPolicy {
    /// Position deltas are added at full magnitude regardless of layer weight;
    /// only rotation and scale deltas are weighted.
    #[default]
    Unweighted,
    /// Position deltas are scaled by the layer weight like rotation and scale.
    Weighted,
}

/// Cross-fade progress in [0, 1].
///
/// The fade completes after `duration` seconds, or after the time left in
/// the source clip past `exit_time` if that is shorter. A zero or negative
/// denominator means the fade completes immediately.
pub fn cross_fade_weight(clip_length: f32, exit_time: f32, duration: f32, elapsed: f32) -> f32 {
    let remaining = clip_length - exit_time;
    let denom = if duration > remaining { remaining } else { duration };
    if denom <= 0.0 {
        return 1.0;
    }
    (elapsed / denom).clamp(0.0, 1.0)
}

/// Shortest-arc spherical interpolation, normalized.
pub fn slerp_shortest(a: Quat, b: Quat, t: f32) -> Quat {
    a.slerp(b, t).normalize()
}

/// Interpolate two values of the same type.
///
/// Scalars and vectors lerp component-wise; quaternions slerp along the
/// shortest arc. Returns `None` when the types differ.
pub fn lerp_value(a: &PropertyValue, b: &PropertyValue, t: f32) -> Option<PropertyValue> {
    Some(match (a, b) {
        (PropertyValue::Float(a), PropertyValue::Float(b)) => PropertyValue::Float(a + (b - a) * t),
        (PropertyValue::Vector2(a), PropertyValue::Vector2(b)) => PropertyValue::Vector2(a.lerp(*b, t)),
        (PropertyValue::Vector3(a), PropertyValue::Vector3(b)) => PropertyValue::Vector3(a.lerp(*b, t)),
        (PropertyValue::Vector4(a), PropertyValue::Vector4(b)) => PropertyValue::Vector4(a.lerp(*b, t)),
        (PropertyValue::Quaternion(a), PropertyValue::Quaternion(b)) => {
            PropertyValue::Quaternion(slerp_shortest(*a, *b, t))
        }
        _ => return None,
    })
}

/// Blend two samples of `property` by `t`.
///
/// Transform properties only accept their own value type (vec3 for position
/// and scale, quaternion for rotation); anything else yields `None` and the
/// caller skips the write.
pub fn blend_property(
    property: &AnimatedProperty,
    a: &PropertyValue,
    b: &PropertyValue,
    t: f32,
) -> Option<PropertyValue> {
    if !property.accepts(a) || !property.accepts(b) {
        return None;
    }
    lerp_value(a, b, t)
}

fn ratio(d: f32, s: f32) -> f32 {
    if s.abs() < EPSILON {
        1.0
    } else {
        d / s
    }
}

fn ratio_components<const N: usize>(d: [f32; N], s: [f32; N]) -> [f32; N] {
    std::array::from_fn(|i| ratio(d[i], s[i]))
}

/// Delta from `base` (first-frame value) to `value`.
///
/// Scale deltas are ratios `value / base`, where a zero base component
/// yields 1. Other scalars and vectors subtract. Rotations produce the
/// relative rotation `conjugate(base) * value`.
pub fn compute_delta(
    property: &AnimatedProperty,
    base: &PropertyValue,
    value: &PropertyValue,
) -> Option<PropertyValue> {
    let multiplicative = property.is_scale();
    Some(match (base, value) {
        (PropertyValue::Float(s), PropertyValue::Float(d)) => {
            PropertyValue::Float(if multiplicative { ratio(*d, *s) } else { d - s })
        }
        (PropertyValue::Vector2(s), PropertyValue::Vector2(d)) => PropertyValue::Vector2(if multiplicative {
            Vec2::from_array(ratio_components(d.to_array(), s.to_array()))
        } else {
            *d - *s
        }),
        (PropertyValue::Vector3(s), PropertyValue::Vector3(d)) => PropertyValue::Vector3(if multiplicative {
            Vec3::from_array(ratio_components(d.to_array(), s.to_array()))
        } else {
            *d - *s
        }),
        (PropertyValue::Vector4(s), PropertyValue::Vector4(d)) => PropertyValue::Vector4(if multiplicative {
            Vec4::from_array(ratio_components(d.to_array(), s.to_array()))
        } else {
            *d - *s
        }),
        (PropertyValue::Quaternion(s), PropertyValue::Quaternion(d)) => {
            PropertyValue::Quaternion(s.conjugate() * *d)
        }
        _ => return None,
    })
}

/// The delta that leaves a value unchanged: identity for rotations, one for
/// scale components, zero otherwise.
pub fn neutral_delta(property: &AnimatedProperty, value_type: ValueType) -> PropertyValue {
    if value_type == ValueType::Quaternion {
        return PropertyValue::Quaternion(Quat::IDENTITY);
    }
    if property.is_scale() {
        let ones = vec![1.0; value_type.component_count()];
        if let Some(value) = PropertyValue::from_components(value_type, &ones) {
            return value;
        }
    }
    PropertyValue::zero(value_type)
}

/// Scale a rotation delta's angle by `weight`, keeping its axis.
pub fn weight_rotation_delta(delta: Quat, weight: f32) -> Quat {
    let delta = if delta.w < 0.0 { -delta } else { delta };
    let (axis, angle) = delta.to_axis_angle();
    if angle.abs() < EPSILON {
        return Quat::IDENTITY;
    }
    Quat::from_axis_angle(axis, angle * weight).normalize()
}

/// Scale a multiplicative scale delta's deviation from 1 by `weight`.
pub fn weight_scale_delta(delta: Vec3, weight: f32) -> Vec3 {
    Vec3::ONE + (delta - Vec3::ONE) * weight
}

/// Compose an additive `delta` onto `current` at layer `weight`.
///
/// - Position: `current + delta` (or `delta * weight` under
///   `AdditivePositionPolicy::Weighted`)
/// - Rotation: `current * weighted_delta`
/// - Scale: `current * (1 + (delta - 1) * weight)`
/// - Custom: `current + delta`, unweighted (quaternions compose)
pub fn apply_additive(
    property: &AnimatedProperty,
    current: &PropertyValue,
    delta: &PropertyValue,
    weight: f32,
    policy: AdditivePositionPolicy,
) -> Option<PropertyValue> {
    match property {
        AnimatedProperty::Position => {
            let (c, d) = (current.as_vec3()?, delta.as_vec3()?);
            let d = match policy {
                AdditivePositionPolicy::Unweighted => d,
                AdditivePositionPolicy::Weighted => d * weight,
            };
            Some(PropertyValue::Vector3(c + d))
        }
        AnimatedProperty::Rotation => {
            let (c, d) = (current.as_quat()?, delta.as_quat()?);
            Some(PropertyValue::Quaternion(
                (c * weight_rotation_delta(d, weight)).normalize(),
            ))
        }
        AnimatedProperty::Scale => {
            let (c, d) = (current.as_vec3()?, delta.as_vec3()?);
            Some(PropertyValue::Vector3(c * weight_scale_delta(d, weight)))
        }
        AnimatedProperty::Custom(_) => add_values(current, delta),
    }
}

fn add_values(a: &PropertyValue, b: &PropertyValue) -> Option<PropertyValue> {
    Some(match (a, b) {
        (PropertyValue::Float(a), PropertyValue::Float(b)) => PropertyValue::Float(a + b),
        (PropertyValue::Vector2(a), PropertyValue::Vector2(b)) => PropertyValue::Vector2(*a + *b),
        (PropertyValue::Vector3(a), PropertyValue::Vector3(b)) => PropertyValue::Vector3(*a + *b),
        (PropertyValue::Vector4(a), PropertyValue::Vector4(b)) => PropertyValue::Vector4(*a + *b),
        (PropertyValue::Quaternion(a), PropertyValue::Quaternion(b)) => {
            PropertyValue::Quaternion((*a * *b).normalize())
        }
        _ => return None,
    })
}
