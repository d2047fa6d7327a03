//! Keyframe curves: binary search plus typed interpolation

use crate::blend::lerp_value;
use serde::{Deserialize, Serialize};
use tessera_core::{PropertyValue, Result, TesseraError, ValueType};

/// How to interpolate between keyframes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub enum Interpolation {
    /// Jump to next value (no blending)
    #[serde(alias = "step", alias = "STEP")]
    Step,
    /// Linear interpolation (spherical for rotations)
    #[default]
    #[serde(alias = "linear", alias = "LINEAR")]
    Linear,
    /// Cubic Hermite spline (uses tangents, zero when absent)
    #[serde(alias = "cubic_spline", alias = "CUBICSPLINE")]
    CubicSpline,
}

impl Interpolation {
    /// Map a glTF sampler interpolation name; unknown names are linear
    pub fn from_gltf(name: &str) -> Self {
        match name {
            "STEP" => Interpolation::Step,
            "CUBICSPLINE" => Interpolation::CubicSpline,
            _ => Interpolation::Linear,
        }
    }
}

/// A keyframe: a value at a point in time
#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe {
    /// Time in seconds from clip start
    pub time: f32,
    pub value: PropertyValue,
    /// Incoming tangent for cubic spline
    pub in_tangent: Option<PropertyValue>,
    /// Outgoing tangent for cubic spline
    pub out_tangent: Option<PropertyValue>,
}

impl Keyframe {
    pub fn new(time: f32, value: PropertyValue) -> Self {
        Self {
            time,
            value,
            in_tangent: None,
            out_tangent: None,
        }
    }

    pub fn with_tangents(mut self, in_tangent: PropertyValue, out_tangent: PropertyValue) -> Self {
        self.in_tangent = Some(in_tangent);
        self.out_tangent = Some(out_tangent);
        self
    }
}

/// A time-keyed function producing values of one `ValueType`.
///
/// Keyframes are sorted by time and never empty.
#[derive(Debug, Clone)]
pub struct AnimationCurve {
    value_type: ValueType,
    interpolation: Interpolation,
    keyframes: Vec<Keyframe>,
}

impl AnimationCurve {
    /// Build a curve, checking that it has keys, that every key (and
    /// tangent) matches the first key's type, and that times do not decrease.
    pub fn new(interpolation: Interpolation, keyframes: Vec<Keyframe>) -> Result<Self> {
        let first = keyframes
            .first()
            .ok_or_else(|| TesseraError::AnimationError("curve has no keyframes".into()))?;
        let value_type = first.value.value_type();

        for (i, kf) in keyframes.iter().enumerate() {
            let tangent_types = kf
                .in_tangent
                .iter()
                .chain(kf.out_tangent.iter())
                .map(|t| t.value_type());
            for got in std::iter::once(kf.value.value_type()).chain(tangent_types) {
                if got != value_type {
                    return Err(TesseraError::InvalidFieldType {
                        expected: value_type.to_string(),
                        got: format!("{} at keyframe {}", got, i),
                    });
                }
            }
            if !kf.time.is_finite() {
                return Err(TesseraError::AnimationError(format!(
                    "keyframe {} has non-finite time",
                    i
                )));
            }
        }

        if keyframes.windows(2).any(|w| w[1].time < w[0].time) {
            return Err(TesseraError::AnimationError(
                "keyframe times must be non-decreasing".into(),
            ));
        }

        Ok(Self {
            value_type,
            interpolation,
            keyframes,
        })
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Time of the last keyframe
    pub fn length(&self) -> f32 {
        self.keyframes.last().map(|kf| kf.time).unwrap_or(0.0)
    }

    /// Value of the first keyframe; the base for additive deltas
    pub fn first_value(&self) -> PropertyValue {
        self.keyframes[0].value
    }

    /// Sample the curve at `time`, clamping outside the keyed range.
    pub fn evaluate(&self, time: f32) -> PropertyValue {
        let keyframes = &self.keyframes;

        // Before first keyframe (or NaN), clamp to first value
        if time.is_nan() || time <= keyframes[0].time {
            return keyframes[0].value;
        }

        // After last keyframe, clamp to last value
        let last = &keyframes[keyframes.len() - 1];
        if time >= last.time {
            return last.value;
        }

        // First key strictly after `time`; guaranteed in 1..len by the clamps above
        let idx = keyframes.partition_point(|kf| kf.time <= time);
        let prev = &keyframes[idx - 1];
        let next = &keyframes[idx];

        let span = next.time - prev.time;
        if span <= 0.0 {
            return prev.value;
        }
        let t = (time - prev.time) / span;

        match self.interpolation {
            Interpolation::Step => prev.value,
            Interpolation::Linear => lerp_value(&prev.value, &next.value, t).unwrap_or(prev.value),
            Interpolation::CubicSpline => {
                let components = self.value_type.component_count();
                let zero_tangent = || vec![0.0; components];
                let m0 = prev
                    .out_tangent
                    .map(|v| v.to_components())
                    .unwrap_or_else(zero_tangent);
                let m1 = next
                    .in_tangent
                    .map(|v| v.to_components())
                    .unwrap_or_else(zero_tangent);
                let p0 = prev.value.to_components();
                let p1 = next.value.to_components();
                let out = cubic_hermite(&p0, &m0, &p1, &m1, span, t);
                match PropertyValue::from_components(self.value_type, &out) {
                    Some(PropertyValue::Quaternion(q)) => PropertyValue::Quaternion(q.normalize()),
                    Some(v) => v,
                    None => prev.value,
                }
            }
        }
    }
}

/// Cubic Hermite spline interpolation over raw components.
///
/// `p0`, `m0`: start value and outgoing tangent (scaled by `dt`)
/// `p1`, `m1`: end value and incoming tangent (scaled by `dt`)
/// `dt`: time span of the interval (for tangent scaling)
/// `t`: normalized [0..1] parameter
pub fn cubic_hermite(p0: &[f32], m0: &[f32], p1: &[f32], m1: &[f32], dt: f32, t: f32) -> Vec<f32> {
    let t2 = t * t;
    let t3 = t2 * t;

    // Hermite basis functions
    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;

    (0..p0.len())
        .map(|i| {
            let m0i = m0.get(i).copied().unwrap_or(0.0);
            let m1i = m1.get(i).copied().unwrap_or(0.0);
            let p1i = p1.get(i).copied().unwrap_or(0.0);
            h00 * p0[i] + h10 * (m0i * dt) + h01 * p1i + h11 * (m1i * dt)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    fn vec3_key(time: f32, v: [f32; 3]) -> Keyframe {
        Keyframe::new(time, PropertyValue::Vector3(Vec3::from_array(v)))
    }

    fn as_vec3(v: PropertyValue) -> Vec3 {
        v.as_vec3().expect("vector3 value")
    }

    fn same_rotation(a: Quat, b: Quat) -> bool {
        a.dot(b).abs() > 1.0 - 1e-5
    }

    #[test]
    fn nan_time_clamps_to_first_key() {
        let curve = AnimationCurve::new(
            Interpolation::Linear,
            vec![vec3_key(0.0, [1.0; 3]), vec3_key(1.0, [3.0; 3])],
        )
        .unwrap();
        assert_eq!(as_vec3(curve.evaluate(f32::NAN)), Vec3::ONE);
        assert_eq!(as_vec3(curve.evaluate(f32::INFINITY)), Vec3::splat(3.0));
        assert_eq!(as_vec3(curve.evaluate(f32::NEG_INFINITY)), Vec3::ONE);
    }

    #[test]
    fn empty_curve_is_rejected() {
        assert!(AnimationCurve::new(Interpolation::Linear, vec![]).is_err());
    }

    #[test]
    fn mixed_value_types_are_rejected() {
        let result = AnimationCurve::new(
            Interpolation::Linear,
            vec![
                vec3_key(0.0, [0.0; 3]),
                Keyframe::new(1.0, PropertyValue::Float(1.0)),
            ],
        );
        assert!(matches!(result, Err(TesseraError::InvalidFieldType { .. })));
    }

    #[test]
    fn decreasing_times_are_rejected() {
        let result = AnimationCurve::new(
            Interpolation::Linear,
            vec![vec3_key(1.0, [0.0; 3]), vec3_key(0.5, [1.0; 3])],
        );
        assert!(result.is_err());
    }

    #[test]
    fn sample_before_first_keyframe_clamps() {
        let curve = AnimationCurve::new(Interpolation::Linear, vec![vec3_key(1.0, [5.0, 10.0, 15.0])]).unwrap();
        assert_eq!(as_vec3(curve.evaluate(0.0)), Vec3::new(5.0, 10.0, 15.0));
    }

    #[test]
    fn sample_after_last_keyframe_clamps() {
        let curve = AnimationCurve::new(
            Interpolation::Linear,
            vec![vec3_key(0.0, [0.0; 3]), vec3_key(1.0, [10.0, 20.0, 30.0])],
        )
        .unwrap();
        assert_eq!(as_vec3(curve.evaluate(5.0)), Vec3::new(10.0, 20.0, 30.0));
        assert_eq!(curve.length(), 1.0);
    }

    #[test]
    fn sample_linear_midpoint() {
        let curve = AnimationCurve::new(
            Interpolation::Linear,
            vec![vec3_key(0.0, [0.0; 3]), vec3_key(2.0, [10.0, 20.0, 30.0])],
        )
        .unwrap();
        let v = as_vec3(curve.evaluate(1.0));
        assert!((v.x - 5.0).abs() < 1e-5);
        assert!((v.y - 10.0).abs() < 1e-5);
        assert!((v.z - 15.0).abs() < 1e-5);
    }

    #[test]
    fn sample_step_holds_previous() {
        let curve = AnimationCurve::new(
            Interpolation::Step,
            vec![vec3_key(0.0, [1.0, 2.0, 3.0]), vec3_key(1.0, [4.0, 5.0, 6.0])],
        )
        .unwrap();
        assert_eq!(as_vec3(curve.evaluate(0.5)), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn sample_exact_keyframe_time() {
        let curve = AnimationCurve::new(
            Interpolation::Linear,
            vec![
                vec3_key(0.0, [0.0; 3]),
                vec3_key(1.0, [10.0; 3]),
                vec3_key(2.0, [20.0; 3]),
            ],
        )
        .unwrap();
        assert_eq!(as_vec3(curve.evaluate(1.0)), Vec3::splat(10.0));
    }

    #[test]
    fn sample_rotation_uses_slerp() {
        let end = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let curve = AnimationCurve::new(
            Interpolation::Linear,
            vec![
                Keyframe::new(0.0, PropertyValue::Quaternion(Quat::IDENTITY)),
                Keyframe::new(1.0, PropertyValue::Quaternion(end)),
            ],
        )
        .unwrap();

        let mid = curve.evaluate(0.5).as_quat().unwrap();
        let expected = Quat::from_rotation_y(std::f32::consts::FRAC_PI_4);
        assert!(same_rotation(mid, expected));
        assert!((mid.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn sample_cubic_hermite_with_zero_tangents() {
        let curve = AnimationCurve::new(
            Interpolation::CubicSpline,
            vec![
                vec3_key(0.0, [0.0; 3]).with_tangents(
                    PropertyValue::Vector3(Vec3::ZERO),
                    PropertyValue::Vector3(Vec3::ZERO),
                ),
                vec3_key(1.0, [10.0; 3]).with_tangents(
                    PropertyValue::Vector3(Vec3::ZERO),
                    PropertyValue::Vector3(Vec3::ZERO),
                ),
            ],
        )
        .unwrap();
        assert_eq!(as_vec3(curve.evaluate(0.0)), Vec3::ZERO);
        assert_eq!(as_vec3(curve.evaluate(1.0)), Vec3::splat(10.0));
        // Smoothstep shape: symmetric about the midpoint
        let mid = as_vec3(curve.evaluate(0.5));
        assert!((mid.x - 5.0).abs() < 1e-4);
        let quarter = as_vec3(curve.evaluate(0.25));
        assert!(quarter.x < 2.5);
    }

    #[test]
    fn first_value_is_first_key() {
        let curve = AnimationCurve::new(
            Interpolation::Linear,
            vec![vec3_key(0.5, [3.0; 3]), vec3_key(1.0, [4.0; 3])],
        )
        .unwrap();
        assert_eq!(curve.first_value(), PropertyValue::Vector3(Vec3::splat(3.0)));
        assert_eq!(curve.value_type(), ValueType::Vector3);
    }
}
