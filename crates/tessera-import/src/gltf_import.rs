//! glTF/GLB animation importer

use crate::types::{ImportedChannel, ImportedClip, ImportedKeyframe, ImportedProperty};
use gltf::animation::util::ReadOutputs;
use gltf::animation::{Interpolation, Property};
use std::path::Path;
use tessera_core::{Result, TesseraError};

/// Import all node animations from a glTF or GLB file
pub fn import_gltf_animations<P: AsRef<Path>>(path: P) -> Result<Vec<ImportedClip>> {
    let path = path.as_ref();
    let (document, buffers, _images) = gltf::import(path).map_err(|e| {
        TesseraError::ImportError(format!("Failed to import glTF {}: {}", path.display(), e))
    })?;
    Ok(extract_animations(&document, &buffers))
}

/// Import all node animations from in-memory glTF or GLB bytes
pub fn import_gltf_animations_from_slice(bytes: &[u8]) -> Result<Vec<ImportedClip>> {
    let (document, buffers, _images) = gltf::import_slice(bytes)
        .map_err(|e| TesseraError::ImportError(format!("Failed to import glTF: {}", e)))?;
    Ok(extract_animations(&document, &buffers))
}

/// Node names joined from the scene root down, indexed by node
fn node_paths(document: &gltf::Document) -> Vec<String> {
    let names: Vec<String> = document
        .nodes()
        .map(|n| {
            n.name()
                .map(String::from)
                .unwrap_or_else(|| format!("node_{}", n.index()))
        })
        .collect();

    let mut parents: Vec<Option<usize>> = vec![None; names.len()];
    for node in document.nodes() {
        for child in node.children() {
            parents[child.index()] = Some(node.index());
        }
    }

    (0..names.len())
        .map(|index| {
            let mut segments = vec![names[index].as_str()];
            let mut current = index;
            while let Some(parent) = parents[current] {
                // glTF node graphs are trees; the bound only guards bad input
                if segments.len() > names.len() {
                    break;
                }
                segments.push(names[parent].as_str());
                current = parent;
            }
            segments.reverse();
            segments.join("/")
        })
        .collect()
}

fn extract_animations(document: &gltf::Document, buffers: &[gltf::buffer::Data]) -> Vec<ImportedClip> {
    let paths = node_paths(document);
    let mut clips = Vec::new();

    for animation in document.animations() {
        let name = animation
            .name()
            .map(String::from)
            .unwrap_or_else(|| format!("animation_{}", animation.index()));

        let mut channels = Vec::new();
        for channel in animation.channels() {
            let target = channel.target();
            let node = target.node();

            let property = match target.property() {
                Property::Translation => ImportedProperty::Translation,
                Property::Rotation => ImportedProperty::Rotation,
                Property::Scale => ImportedProperty::Scale,
                Property::MorphTargetWeights => {
                    log::warn!(
                        "Animation '{}': skipping morph weight channel on node {}",
                        name,
                        node.index()
                    );
                    continue;
                }
            };

            let interpolation = channel.sampler().interpolation();
            let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));

            let Some(inputs) = reader.read_inputs() else {
                log::warn!("Animation '{}': channel without input times skipped", name);
                continue;
            };
            let times: Vec<f32> = inputs.collect();

            let values: Vec<Vec<f32>> = match reader.read_outputs() {
                Some(ReadOutputs::Translations(iter)) => iter.map(|v| v.to_vec()).collect(),
                Some(ReadOutputs::Rotations(iter)) => iter.into_f32().map(|v| v.to_vec()).collect(),
                Some(ReadOutputs::Scales(iter)) => iter.map(|v| v.to_vec()).collect(),
                Some(ReadOutputs::MorphTargetWeights(_)) | None => {
                    log::warn!("Animation '{}': channel without transform outputs skipped", name);
                    continue;
                }
            };

            let cubic = matches!(interpolation, Interpolation::CubicSpline);
            let Some(keyframes) = build_keyframes(&times, values, cubic) else {
                log::warn!(
                    "Animation '{}': output count does not match {} input times, channel skipped",
                    name,
                    times.len()
                );
                continue;
            };

            channels.push(ImportedChannel {
                node_index: node.index(),
                node_name: node
                    .name()
                    .map(String::from)
                    .unwrap_or_else(|| format!("node_{}", node.index())),
                node_path: paths[node.index()].clone(),
                property,
                interpolation: interpolation_name(interpolation).to_string(),
                keyframes,
            });
        }

        let duration = channels
            .iter()
            .filter_map(|c| c.keyframes.last().map(|k| k.time))
            .fold(0.0_f32, f32::max);

        clips.push(ImportedClip {
            name,
            duration,
            channels,
        });
    }

    clips
}

fn interpolation_name(interpolation: Interpolation) -> &'static str {
    match interpolation {
        Interpolation::Linear => "LINEAR",
        Interpolation::Step => "STEP",
        Interpolation::CubicSpline => "CUBICSPLINE",
    }
}

/// Pair sampler outputs with input times. Cubic spline samplers store
/// `[in_tangent, value, out_tangent]` per key.
pub(crate) fn build_keyframes(times: &[f32], values: Vec<Vec<f32>>, cubic: bool) -> Option<Vec<ImportedKeyframe>> {
    if cubic {
        if values.len() != times.len() * 3 {
            return None;
        }
        Some(
            times
                .iter()
                .zip(values.chunks_exact(3))
                .map(|(time, key)| ImportedKeyframe {
                    time: *time,
                    value: key[1].clone(),
                    in_tangent: Some(key[0].clone()),
                    out_tangent: Some(key[2].clone()),
                })
                .collect(),
        )
    } else {
        if values.len() != times.len() {
            return None;
        }
        Some(
            times
                .iter()
                .zip(values)
                .map(|(time, value)| ImportedKeyframe::new(*time, value))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn floats(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    /// A GLB with a `robot/arm` hierarchy and one animation moving and
    /// rotating the arm.
    fn glb() -> Vec<u8> {
        let mut bin = floats(&[0.0, 1.0]);
        bin.extend(floats(&[0.0, 0.0, 0.0, 1.0, 2.0, 3.0]));
        bin.extend(floats(&[0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0]));

        let document = json!({
            "asset": { "version": "2.0" },
            "scene": 0,
            "scenes": [{ "nodes": [0] }],
            "nodes": [
                { "name": "robot", "children": [1] },
                { "name": "arm" }
            ],
            "buffers": [{ "byteLength": bin.len() }],
            "bufferViews": [
                { "buffer": 0, "byteOffset": 0, "byteLength": 8 },
                { "buffer": 0, "byteOffset": 8, "byteLength": 24 },
                { "buffer": 0, "byteOffset": 32, "byteLength": 32 }
            ],
            "accessors": [
                { "bufferView": 0, "componentType": 5126, "count": 2, "type": "SCALAR",
                  "min": [0.0], "max": [1.0] },
                { "bufferView": 1, "componentType": 5126, "count": 2, "type": "VEC3" },
                { "bufferView": 2, "componentType": 5126, "count": 2, "type": "VEC4" }
            ],
            "animations": [{
                "name": "wave",
                "channels": [
                    { "sampler": 0, "target": { "node": 1, "path": "translation" } },
                    { "sampler": 1, "target": { "node": 1, "path": "rotation" } }
                ],
                "samplers": [
                    { "input": 0, "output": 1, "interpolation": "LINEAR" },
                    { "input": 0, "output": 2, "interpolation": "STEP" }
                ]
            }]
        });

        let mut json_chunk = serde_json::to_vec(&document).unwrap();
        while json_chunk.len() % 4 != 0 {
            json_chunk.push(b' ');
        }
        while bin.len() % 4 != 0 {
            bin.push(0);
        }

        let total = 12 + 8 + json_chunk.len() + 8 + bin.len();
        let mut out = Vec::with_capacity(total);
        out.extend(b"glTF");
        out.extend(2u32.to_le_bytes());
        out.extend((total as u32).to_le_bytes());
        out.extend((json_chunk.len() as u32).to_le_bytes());
        out.extend(b"JSON");
        out.extend(&json_chunk);
        out.extend((bin.len() as u32).to_le_bytes());
        out.extend(b"BIN\0");
        out.extend(&bin);
        out
    }

    #[test]
    fn imports_node_channels_with_paths() {
        let clips = import_gltf_animations_from_slice(&glb()).unwrap();
        assert_eq!(clips.len(), 1);

        let clip = &clips[0];
        assert_eq!(clip.name, "wave");
        assert_eq!(clip.duration, 1.0);
        assert_eq!(clip.channels.len(), 2);

        let translation = &clip.channels[0];
        assert_eq!(translation.node_name, "arm");
        assert_eq!(translation.node_path, "robot/arm");
        assert_eq!(translation.property, ImportedProperty::Translation);
        assert_eq!(translation.interpolation, "LINEAR");
        assert_eq!(translation.keyframes[1].value, vec![1.0, 2.0, 3.0]);

        let rotation = &clip.channels[1];
        assert_eq!(rotation.property, ImportedProperty::Rotation);
        assert_eq!(rotation.interpolation, "STEP");
        assert_eq!(rotation.keyframes[1].value, vec![0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn imports_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("robot.glb");
        std::fs::write(&path, glb()).unwrap();
        let clips = import_gltf_animations(&path).unwrap();
        assert_eq!(clips[0].channels[0].node_path, "robot/arm");
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            import_gltf_animations_from_slice(b"not a gltf file"),
            Err(TesseraError::ImportError(_))
        ));
    }

    #[test]
    fn cubic_outputs_unpack_tangents() {
        let values = vec![
            vec![0.0, 0.0, 0.0],
            vec![1.0, 1.0, 1.0],
            vec![2.0, 0.0, 0.0],
            vec![0.5, 0.0, 0.0],
            vec![3.0, 3.0, 3.0],
            vec![0.0, 0.0, 0.0],
        ];
        let keys = build_keyframes(&[0.0, 1.0], values, true).unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].value, vec![1.0, 1.0, 1.0]);
        assert_eq!(keys[0].out_tangent, Some(vec![2.0, 0.0, 0.0]));
        assert_eq!(keys[1].in_tangent, Some(vec![0.5, 0.0, 0.0]));

        assert!(build_keyframes(&[0.0, 1.0], vec![vec![0.0; 3]; 5], true).is_none());
        assert!(build_keyframes(&[0.0], vec![vec![0.0; 3]; 2], false).is_none());
    }
}
