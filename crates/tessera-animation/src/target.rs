//! The write surface animation drives

use crate::clip::AnimatedProperty;
use tessera_core::{EntityId, PropertyValue};
use tessera_scene::SceneWorld;

/// Entities an animator can resolve, read, and write.
pub trait AnimationTargets {
    /// Resolve a slash-separated path below `root`; "" is `root` itself
    fn resolve(&self, root: EntityId, path: &str) -> Option<EntityId>;

    fn read(&self, entity: EntityId, property: &AnimatedProperty) -> Option<PropertyValue>;

    /// Store `value`; returns false when the entity is gone or the value
    /// does not fit the property.
    fn write(&mut self, entity: EntityId, property: &AnimatedProperty, value: PropertyValue) -> bool;
}

impl AnimationTargets for SceneWorld {
    fn resolve(&self, root: EntityId, path: &str) -> Option<EntityId> {
        self.resolve_path(root, path)
    }

    fn read(&self, entity: EntityId, property: &AnimatedProperty) -> Option<PropertyValue> {
        match property {
            AnimatedProperty::Position => self.transform(entity).map(|t| PropertyValue::Vector3(t.position)),
            AnimatedProperty::Rotation => self.transform(entity).map(|t| PropertyValue::Quaternion(t.rotation)),
            AnimatedProperty::Scale => self.transform(entity).map(|t| PropertyValue::Vector3(t.scale)),
            AnimatedProperty::Custom(name) => self.property(entity, name),
        }
    }

    fn write(&mut self, entity: EntityId, property: &AnimatedProperty, value: PropertyValue) -> bool {
        if let AnimatedProperty::Custom(name) = property {
            return self.set_property(entity, name.as_str(), value).is_ok();
        }
        let Some(transform) = self.transform_mut(entity) else {
            return false;
        };
        match (property, value) {
            (AnimatedProperty::Position, PropertyValue::Vector3(v)) => transform.position = v,
            (AnimatedProperty::Rotation, PropertyValue::Quaternion(q)) => transform.rotation = q,
            (AnimatedProperty::Scale, PropertyValue::Vector3(v)) => transform.scale = v,
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    #[test]
    fn scene_world_round_trips_properties() {
        let mut world = SceneWorld::new();
        let root = world.spawn("rig").unwrap();
        let hand = world.spawn_path(root, "arm/hand").unwrap();

        assert_eq!(AnimationTargets::resolve(&world, root, "arm/hand"), Some(hand));
        assert!(world.write(hand, &AnimatedProperty::Position, PropertyValue::Vector3(Vec3::X)));
        assert!(world.write(
            hand,
            &AnimatedProperty::Rotation,
            PropertyValue::Quaternion(Quat::from_rotation_z(0.5))
        ));
        assert!(world.write(
            hand,
            &AnimatedProperty::Custom("grip".into()),
            PropertyValue::Float(0.75)
        ));

        assert_eq!(
            world.read(hand, &AnimatedProperty::Position),
            Some(PropertyValue::Vector3(Vec3::X))
        );
        assert_eq!(
            world.read(hand, &AnimatedProperty::Custom("grip".into())),
            Some(PropertyValue::Float(0.75))
        );
        assert_eq!(
            world.read(hand, &AnimatedProperty::Scale),
            Some(PropertyValue::Vector3(Vec3::ONE))
        );
    }

    #[test]
    fn mismatched_values_are_refused() {
        let mut world = SceneWorld::new();
        let root = world.spawn("rig").unwrap();
        assert!(!world.write(root, &AnimatedProperty::Position, PropertyValue::Float(1.0)));
        assert_eq!(world.transform(root).unwrap().position, Vec3::ZERO);

        world.despawn(root).unwrap();
        assert!(!world.write(root, &AnimatedProperty::Scale, PropertyValue::Vector3(Vec3::ONE)));
    }
}
