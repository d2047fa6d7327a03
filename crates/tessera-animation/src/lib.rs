//! Animation runtime for Tessera
//!
//! Layered state-machine animation over keyframe curves:
//! - **Curves and clips**: typed keyframe curves bound to entity paths
//! - **Controllers**: ordered override/additive layers of named states
//! - **Animator**: per-entity driver with cross-fades and additive blending
//!
//! `AnimationSystem` ties animators to a `SceneWorld` as a `RuntimeSystem`.

pub mod animator;
pub mod blend;
pub mod clip;
pub mod controller;
pub mod curve;
pub mod layer;
pub mod library;
pub mod loader;
pub mod state;
pub mod target;

pub use animator::{Animator, AnimatorSettings, PlaybackMode};
pub use blend::AdditivePositionPolicy;
pub use clip::{AnimatedProperty, AnimationClip, ClipCurve, WrapMode};
pub use controller::{AnimatorController, AnimatorControllerParameter, ParameterValue};
pub use curve::{AnimationCurve, Interpolation, Keyframe};
pub use layer::{AnimatorControllerLayer, LayerBlendingMode};
pub use library::ClipLibrary;
pub use state::{AnimatorState, AnimatorStateMachine, AnimatorStateTransition, PlayType, StateId};
pub use target::AnimationTargets;

use std::collections::BTreeMap;
use tessera_core::{EntityId, Result, TesseraError};
use tessera_runtime::RuntimeSystem;
use tessera_scene::SceneWorld;

/// Top-level animation system: one animator per animated root entity,
/// advanced in entity id order, plus the clip library they share.
pub struct AnimationSystem {
    pub library: ClipLibrary,
    animators: BTreeMap<EntityId, Animator>,
}

impl AnimationSystem {
    pub fn new() -> Self {
        Self::with_library(ClipLibrary::new())
    }

    pub fn with_library(library: ClipLibrary) -> Self {
        Self {
            library,
            animators: BTreeMap::new(),
        }
    }

    /// Create an animator for `root`, bound against `world`. Replaces any
    /// animator already driving `root`.
    pub fn attach(
        &mut self,
        world: &SceneWorld,
        root: EntityId,
        controller: AnimatorController,
        settings: AnimatorSettings,
    ) -> Result<&mut Animator> {
        if !world.contains(root) {
            return Err(TesseraError::EntityNotFound(root.to_string()));
        }
        let mut animator = Animator::with_settings(root, settings);
        animator.set_controller(controller, world);
        self.animators.insert(root, animator);
        self.animators
            .get_mut(&root)
            .ok_or_else(|| TesseraError::EntityNotFound(root.to_string()))
    }

    pub fn animator(&self, root: EntityId) -> Option<&Animator> {
        self.animators.get(&root)
    }

    pub fn animator_mut(&mut self, root: EntityId) -> Option<&mut Animator> {
        self.animators.get_mut(&root)
    }

    pub fn remove_animator(&mut self, root: EntityId) -> Option<Animator> {
        self.animators.remove(&root)
    }

    pub fn animator_count(&self) -> usize {
        self.animators.len()
    }

    /// Drop all animators, keeping the clip library.
    pub fn clear(&mut self) {
        self.animators.clear();
    }
}

impl Default for AnimationSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeSystem for AnimationSystem {
    fn initialize(&mut self, world: &mut SceneWorld) -> Result<()> {
        for animator in self.animators.values_mut() {
            animator.rebind(&*world);
        }
        log::info!(
            "Animation system initialized ({} clips, {} animators)",
            self.library.clip_count(),
            self.animators.len()
        );
        Ok(())
    }

    fn fixed_update(&mut self, _world: &mut SceneWorld, _dt: f64) -> Result<()> {
        // Animation interpolates smoothly in variable update
        Ok(())
    }

    fn update(&mut self, world: &mut SceneWorld, dt: f64) -> Result<()> {
        self.animators.retain(|root, _| {
            let alive = world.contains(*root);
            if !alive {
                log::debug!("Animator root {} despawned, dropping animator", root);
            }
            alive
        });
        for animator in self.animators.values_mut() {
            animator.advance(dt as f32, world);
        }
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        log::info!("Animation system shut down");
        Ok(())
    }

    fn name(&self) -> &str {
        "animation"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use tessera_core::PropertyValue;
    use tessera_runtime::SystemSchedule;

    fn library() -> ClipLibrary {
        let curve = AnimationCurve::new(
            Interpolation::Linear,
            vec![
                Keyframe::new(0.0, PropertyValue::Vector3(Vec3::ZERO)),
                Keyframe::new(2.0, PropertyValue::Vector3(Vec3::new(0.0, 4.0, 0.0))),
            ],
        )
        .unwrap();
        let mut library = ClipLibrary::new();
        library.add_clip(AnimationClip::new(
            "lift",
            vec![ClipCurve::new("arm", AnimatedProperty::Position, curve)],
        ));
        library
    }

    fn controller(library: &ClipLibrary) -> AnimatorController {
        let mut layer = AnimatorControllerLayer::new("base");
        layer.add_state("lift", library.get("lift").unwrap()).unwrap();
        let mut controller = AnimatorController::new("robot");
        controller.add_layer(layer).unwrap();
        controller
    }

    #[test]
    fn system_advances_animators_in_schedule() {
        let mut world = SceneWorld::new();
        let root = world.spawn("robot").unwrap();
        let arm = world.spawn_child(root, "arm").unwrap();

        let mut system = AnimationSystem::with_library(library());
        let controller = controller(&system.library);
        let settings = AnimatorSettings {
            playback_mode: PlaybackMode::Playback,
            ..Default::default()
        };
        system.attach(&world, root, controller, settings).unwrap();
        assert_eq!(system.animator_count(), 1);

        let mut schedule = SystemSchedule::new();
        schedule.add_system(Box::new(system), &mut world).unwrap();
        schedule.update(&mut world, 1.0).unwrap();

        let p = world.transform(arm).unwrap().position;
        assert!((p.y - 2.0).abs() < 1e-4);
    }

    #[test]
    fn despawned_roots_drop_their_animator() {
        let mut world = SceneWorld::new();
        let root = world.spawn("robot").unwrap();
        world.spawn_child(root, "arm").unwrap();

        let mut system = AnimationSystem::with_library(library());
        let controller = controller(&system.library);
        system
            .attach(&world, root, controller, AnimatorSettings::default())
            .unwrap()
            .play();

        world.despawn(root).unwrap();
        system.update(&mut world, 0.1).unwrap();
        assert_eq!(system.animator_count(), 0);
    }

    #[test]
    fn attach_requires_existing_root() {
        let world = SceneWorld::new();
        let mut system = AnimationSystem::new();
        let result = system.attach(
            &world,
            EntityId::from_raw(99),
            AnimatorController::new("c"),
            AnimatorSettings::default(),
        );
        assert!(matches!(result, Err(TesseraError::EntityNotFound(_))));
    }
}
