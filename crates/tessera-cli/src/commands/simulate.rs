//! Headless animator simulation command

use anyhow::{anyhow, Context, Result};
use std::path::Path;
use tessera_animation::loader::{load_controller_from_file, load_settings_from_file};
use tessera_animation::{AnimationSystem, AnimatorController, AnimatorSettings};
use tessera_core::EntityId;
use tessera_runtime::RuntimeSystem;
use tessera_scene::{EntityInfo, SceneWorld};

pub struct SimulateArgs {
    pub controller: String,
    pub clips: String,
    pub settings: Option<String>,
    pub ticks: u32,
    pub dt: f32,
    pub cross_fade: Option<String>,
    pub at: u32,
    pub duration: f32,
    pub layer: usize,
    pub format: String,
}

pub fn run(args: SimulateArgs) -> Result<()> {
    let world = simulate(&args)?;

    let entities = world.all_entities();
    if args.format == "json" {
        print_json(&entities, args.ticks, args.dt)?;
    } else {
        print_text(&entities, args.ticks, args.dt);
    }

    Ok(())
}

/// Build the target world, run the animator for `args.ticks` updates and
/// return the posed world.
fn simulate(args: &SimulateArgs) -> Result<SceneWorld> {
    let library = super::load_library(&args.clips)?;
    let controller = load_controller_from_file(Path::new(&args.controller), &library)
        .with_context(|| format!("Failed to load controller {}", args.controller))?;

    let settings = match &args.settings {
        Some(path) => load_settings_from_file(Path::new(path))
            .with_context(|| format!("Failed to load settings {}", path))?,
        None => AnimatorSettings::default(),
    };

    let mut world = SceneWorld::new();
    let root = spawn_targets(&mut world, &controller)?;

    let mut system = AnimationSystem::with_library(library);
    system.attach(&world, root, controller, settings)?.play();
    system.initialize(&mut world)?;

    for tick in 0..args.ticks {
        if tick == args.at {
            if let Some(state) = &args.cross_fade {
                let animator = system
                    .animator_mut(root)
                    .ok_or_else(|| anyhow!("Animator for root entity is missing"))?;
                let started = animator.cross_fade(state, args.layer, args.duration, 0.0)?;
                if started {
                    log::info!("Tick {}: cross-fading layer {} into '{}'", tick, args.layer, state);
                } else {
                    println!("'{}' is already playing on layer {}, no cross-fade", state, args.layer);
                }
            }
        }
        system.update(&mut world, f64::from(args.dt))?;
    }
    system.shutdown()?;

    Ok(world)
}

/// Spawn a root entity plus one child entity per curve path the controller's
/// clips animate.
fn spawn_targets(world: &mut SceneWorld, controller: &AnimatorController) -> Result<EntityId> {
    let root = world.spawn("root")?;
    for clip in controller.clips() {
        for curve in clip.curves() {
            world.spawn_path(root, &curve.relative_path)?;
        }
    }
    Ok(root)
}

fn print_text(entities: &[EntityInfo], ticks: u32, dt: f32) {
    println!(
        "After {} tick(s) ({:.3}s):",
        ticks,
        ticks as f32 * dt
    );
    for entity in entities {
        let t = &entity.transform;
        println!(
            "  {}: position [{:.4}, {:.4}, {:.4}] rotation [{:.4}, {:.4}, {:.4}, {:.4}] scale [{:.4}, {:.4}, {:.4}]",
            entity.path,
            t.position.x,
            t.position.y,
            t.position.z,
            t.rotation.x,
            t.rotation.y,
            t.rotation.z,
            t.rotation.w,
            t.scale.x,
            t.scale.y,
            t.scale.z
        );
    }
}

fn print_json(entities: &[EntityInfo], ticks: u32, dt: f32) -> Result<()> {
    let output = serde_json::json!({
        "ticks": ticks,
        "elapsed": ticks as f32 * dt,
        "entities": entities,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
