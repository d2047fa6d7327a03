//! Clip registry shared by controllers

use crate::clip::AnimationClip;
use crate::loader::load_clip_from_file;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tessera_core::Result;

/// Clip registry: holds loaded animation clips by name.
#[derive(Debug, Clone, Default)]
pub struct ClipLibrary {
    clips: BTreeMap<String, Arc<AnimationClip>>,
}

impl ClipLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a clip. Overwrites any existing clip with the same name.
    pub fn add_clip(&mut self, clip: AnimationClip) -> Arc<AnimationClip> {
        let clip = Arc::new(clip);
        self.clips.insert(clip.name().to_string(), Arc::clone(&clip));
        clip
    }

    /// Look up a clip by name.
    pub fn get(&self, name: &str) -> Option<Arc<AnimationClip>> {
        self.clips.get(name).cloned()
    }

    pub fn has_clip(&self, name: &str) -> bool {
        self.clips.contains_key(name)
    }

    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    /// Clip names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.clips.keys().map(String::as_str)
    }

    pub fn clips(&self) -> impl Iterator<Item = &Arc<AnimationClip>> {
        self.clips.values()
    }

    /// Load every `.anim.toml` file in `dir`. Returns the number loaded.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(".anim.toml"))
            })
            .collect();
        paths.sort();

        for path in &paths {
            let clip = load_clip_from_file(path)?;
            log::debug!("Loaded clip '{}' from {}", clip.name(), path.display());
            self.add_clip(clip);
        }
        Ok(paths.len())
    }

    /// Import node animations from a glTF/GLB file. Returns the clip names.
    pub fn import_gltf(&mut self, path: &Path) -> Result<Vec<String>> {
        let imported = tessera_import::import_gltf_animations(path)?;
        let mut names = Vec::with_capacity(imported.len());
        for clip in &imported {
            let clip = AnimationClip::from_imported(clip)?;
            names.push(clip.name().to_string());
            self.add_clip(clip);
        }
        Ok(names)
    }
}
