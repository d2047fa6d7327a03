//! Tessera Import - glTF animation importer
//!
//! Extracts node-level animation channels (translation, rotation, scale)
//! from glTF/GLB files as plain keyframe data. Meshes, materials and
//! textures are not read.

mod gltf_import;
mod types;

pub use gltf_import::{import_gltf_animations, import_gltf_animations_from_slice};
pub use types::{ImportedChannel, ImportedClip, ImportedKeyframe, ImportedProperty};
