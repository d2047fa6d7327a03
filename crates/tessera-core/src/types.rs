//! Spatial and common types

use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 3D transform with position, quaternion rotation, and scale
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Local matrix (scale, then rotate, then translate)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// The shape of a value produced by an animation curve
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Float,
    Vector2,
    Vector3,
    Vector4,
    /// Rotation quaternion, stored xyzw
    Quaternion,
}

impl ValueType {
    /// Number of f32 components in a value of this type
    pub fn component_count(&self) -> usize {
        match self {
            ValueType::Float => 1,
            ValueType::Vector2 => 2,
            ValueType::Vector3 => 3,
            ValueType::Vector4 | ValueType::Quaternion => 4,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Float => "float",
            ValueType::Vector2 => "vec2",
            ValueType::Vector3 => "vec3",
            ValueType::Vector4 => "vec4",
            ValueType::Quaternion => "quat",
        };
        f.write_str(name)
    }
}

/// A typed value read from or written to an entity property
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Float(f32),
    Vector2(Vec2),
    Vector3(Vec3),
    Vector4(Vec4),
    Quaternion(Quat),
}

impl PropertyValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            PropertyValue::Float(_) => ValueType::Float,
            PropertyValue::Vector2(_) => ValueType::Vector2,
            PropertyValue::Vector3(_) => ValueType::Vector3,
            PropertyValue::Vector4(_) => ValueType::Vector4,
            PropertyValue::Quaternion(_) => ValueType::Quaternion,
        }
    }

    /// The neutral value of a type: zero for vectors and scalars, identity
    /// for rotations.
    pub fn zero(value_type: ValueType) -> Self {
        match value_type {
            ValueType::Float => PropertyValue::Float(0.0),
            ValueType::Vector2 => PropertyValue::Vector2(Vec2::ZERO),
            ValueType::Vector3 => PropertyValue::Vector3(Vec3::ZERO),
            ValueType::Vector4 => PropertyValue::Vector4(Vec4::ZERO),
            ValueType::Quaternion => PropertyValue::Quaternion(Quat::IDENTITY),
        }
    }

    /// Build a value from raw components. Returns `None` if the slice length
    /// does not match the type's component count.
    pub fn from_components(value_type: ValueType, c: &[f32]) -> Option<Self> {
        if c.len() != value_type.component_count() {
            return None;
        }
        Some(match value_type {
            ValueType::Float => PropertyValue::Float(c[0]),
            ValueType::Vector2 => PropertyValue::Vector2(Vec2::new(c[0], c[1])),
            ValueType::Vector3 => PropertyValue::Vector3(Vec3::new(c[0], c[1], c[2])),
            ValueType::Vector4 => PropertyValue::Vector4(Vec4::new(c[0], c[1], c[2], c[3])),
            ValueType::Quaternion => PropertyValue::Quaternion(Quat::from_xyzw(c[0], c[1], c[2], c[3])),
        })
    }

    /// Flatten into raw components (quaternions as xyzw)
    pub fn to_components(&self) -> Vec<f32> {
        match self {
            PropertyValue::Float(v) => vec![*v],
            PropertyValue::Vector2(v) => v.to_array().to_vec(),
            PropertyValue::Vector3(v) => v.to_array().to_vec(),
            PropertyValue::Vector4(v) => v.to_array().to_vec(),
            PropertyValue::Quaternion(q) => q.to_array().to_vec(),
        }
    }

    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            PropertyValue::Vector3(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_quat(&self) -> Option<Quat> {
        match self {
            PropertyValue::Quaternion(q) => Some(*q),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .to_components()
            .iter()
            .map(|c| format!("{:.4}", c))
            .collect();
        write!(f, "{}({})", self.value_type(), parts.join(", "))
    }
}
