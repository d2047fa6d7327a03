//! Asset inspection command

use anyhow::{bail, Context, Result};
use std::path::Path;
use tessera_animation::loader::{load_clip_from_file, load_controller_from_file};
use tessera_animation::{AnimationClip, AnimatorController, ClipLibrary};

pub fn run(path: &str, clips: Option<&str>) -> Result<()> {
    let file = Path::new(path);
    let file_name = file.file_name().and_then(|n| n.to_str()).unwrap_or_default();

    if file_name.ends_with(".controller.toml") {
        let Some(clips) = clips else {
            bail!("Inspecting a controller requires --clips <DIR>");
        };
        let library = super::load_library(clips)?;
        let controller = load_controller_from_file(file, &library)
            .with_context(|| format!("Failed to load controller {}", path))?;
        print_controller(&controller);
    } else if file_name.ends_with(".anim.toml") {
        let clip = load_clip_from_file(file).with_context(|| format!("Failed to load clip {}", path))?;
        print_clip(&clip);
    } else if file_name.ends_with(".gltf") || file_name.ends_with(".glb") {
        let mut library = ClipLibrary::new();
        let names = library
            .import_gltf(file)
            .with_context(|| format!("Failed to import {}", path))?;
        println!("{} animation(s) in {}", names.len(), path);
        for clip in library.clips() {
            print_clip(clip);
        }
    } else {
        bail!(
            "Unrecognized file '{}'; expected .anim.toml, .controller.toml, .gltf or .glb",
            path
        );
    }

    Ok(())
}

fn print_clip(clip: &AnimationClip) {
    println!(
        "Clip: {} ({:.3}s, {:?})",
        clip.name(),
        clip.length(),
        clip.wrap_mode()
    );
    for curve in clip.curves() {
        println!(
            "  {}.{}: {} keys, {}, {:?}",
            curve.relative_path,
            curve.property,
            curve.curve.keyframes().len(),
            curve.value_type(),
            curve.curve.interpolation()
        );
    }
}

fn print_controller(controller: &AnimatorController) {
    println!("Controller: {}", controller.name());

    for (index, layer) in controller.layers().iter().enumerate() {
        println!(
            "  Layer {} '{}' (weight {:.2}, {:?})",
            index,
            layer.name(),
            layer.weight(),
            layer.blending_mode()
        );
        let entry = layer.playing_state().or(layer.state_machine().first());
        for (i, state) in layer.state_machine().states().iter().enumerate() {
            let marker = if entry.map(|id| id.index()) == Some(i) { " [entry]" } else { "" };
            println!(
                "    {} -> {} ({:.3}s){}",
                state.name(),
                state.clip().name(),
                state.clip().length(),
                marker
            );
        }
    }

    if !controller.parameters().is_empty() {
        println!("  Parameters:");
        for param in controller.parameters() {
            println!("    {} = {:?}", param.name, param.value);
        }
    }
}
