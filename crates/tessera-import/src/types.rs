//! Import result types

/// Which node transform property a channel animates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportedProperty {
    Translation,
    Rotation,
    Scale,
}

/// A single keyframe of a node animation channel
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedKeyframe {
    pub time: f32,
    /// 3 floats for translation/scale, 4 for rotation (quaternion xyzw)
    pub value: Vec<f32>,
    /// Cubic spline tangents, present only for CUBICSPLINE samplers
    pub in_tangent: Option<Vec<f32>>,
    pub out_tangent: Option<Vec<f32>>,
}

impl ImportedKeyframe {
    pub fn new(time: f32, value: Vec<f32>) -> Self {
        Self {
            time,
            value,
            in_tangent: None,
            out_tangent: None,
        }
    }
}

/// An animation channel targeting one node's transform property
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedChannel {
    pub node_index: usize,
    pub node_name: String,
    /// Slash-separated node names from the scene root, e.g. `robot/arm`
    pub node_path: String,
    pub property: ImportedProperty,
    /// glTF sampler interpolation: `LINEAR`, `STEP` or `CUBICSPLINE`
    pub interpolation: String,
    pub keyframes: Vec<ImportedKeyframe>,
}

/// A complete node-level animation clip
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedClip {
    pub name: String,
    /// Latest keyframe time across all channels
    pub duration: f32,
    pub channels: Vec<ImportedChannel>,
}
