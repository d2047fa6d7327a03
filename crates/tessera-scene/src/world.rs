//! SceneWorld - ECS world with stable IDs, a named hierarchy, and animatable components

use crate::entity::EntityInfo;
use bimap::BiMap;
use std::collections::HashMap;
use tessera_core::{EntityId, PropertyValue, Result, TesseraError, Transform};

/// Named custom properties on an entity (e.g. a light's `intensity`)
#[derive(Debug, Clone, Default)]
pub struct Properties(pub HashMap<String, PropertyValue>);

/// The scene world animation reads from and writes to
///
/// Wraps hecs::World with:
/// - Stable EntityId mapping
/// - Parent/child links with names unique among siblings
/// - `Transform` and `Properties` components on every entity
pub struct SceneWorld {
    /// The underlying hecs world
    world: hecs::World,
    /// Bidirectional mapping: EntityId <-> hecs::Entity
    id_map: BiMap<EntityId, hecs::Entity>,
    /// Entity names
    names: HashMap<EntityId, String>,
    /// Parent relationships: child -> parent
    parents: HashMap<EntityId, EntityId>,
    /// Children in spawn order: parent -> children
    children: HashMap<EntityId, Vec<EntityId>>,
    /// Top-level entities in spawn order
    roots: Vec<EntityId>,
    next_id: EntityId,
}

impl Default for SceneWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneWorld {
    /// Create a new empty world
    pub fn new() -> Self {
        Self {
            world: hecs::World::new(),
            id_map: BiMap::new(),
            names: HashMap::new(),
            parents: HashMap::new(),
            children: HashMap::new(),
            roots: Vec::new(),
            next_id: EntityId::from_raw(1),
        }
    }

    /// Spawn a top-level entity
    pub fn spawn(&mut self, name: impl Into<String>) -> Result<EntityId> {
        let name = name.into();
        if self.find_root(&name).is_some() {
            return Err(TesseraError::DuplicateEntityName(name));
        }

        let id = self.insert(name);
        self.roots.push(id);
        Ok(id)
    }

    /// Spawn an entity under `parent`
    pub fn spawn_child(&mut self, parent: EntityId, name: impl Into<String>) -> Result<EntityId> {
        let name = name.into();
        if !self.contains(parent) {
            return Err(TesseraError::EntityNotFound(parent.to_string()));
        }
        if self.find_child(parent, &name).is_some() {
            return Err(TesseraError::DuplicateEntityName(name));
        }

        let id = self.insert(name);
        self.parents.insert(id, parent);
        self.children.entry(parent).or_default().push(id);
        Ok(id)
    }

    /// Resolve `path` below `root`, spawning any missing segments.
    pub fn spawn_path(&mut self, root: EntityId, path: &str) -> Result<EntityId> {
        let mut current = root;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = match self.find_child(current, segment) {
                Some(child) => child,
                None => self.spawn_child(current, segment)?,
            };
        }
        Ok(current)
    }

    fn insert(&mut self, name: String) -> EntityId {
        let id = self.next_id;
        self.next_id = id.next();

        let hecs_entity = self
            .world
            .spawn((Transform::IDENTITY, Properties::default()));
        self.id_map.insert(id, hecs_entity);
        self.names.insert(id, name);
        id
    }

    /// Despawn an entity and all of its descendants
    pub fn despawn(&mut self, id: EntityId) -> Result<()> {
        let hecs_entity = self
            .id_map
            .get_by_left(&id)
            .copied()
            .ok_or_else(|| TesseraError::EntityNotFound(id.to_string()))?;

        for child in self.children.remove(&id).unwrap_or_default() {
            self.despawn(child)?;
        }

        self.world
            .despawn(hecs_entity)
            .map_err(|_| TesseraError::EntityNotFound(id.to_string()))?;
        self.id_map.remove_by_left(&id);
        self.names.remove(&id);

        match self.parents.remove(&id) {
            Some(parent) => {
                if let Some(siblings) = self.children.get_mut(&parent) {
                    siblings.retain(|c| *c != id);
                }
            }
            None => self.roots.retain(|r| *r != id),
        }
        Ok(())
    }

    /// Find a top-level entity by name
    pub fn find_root(&self, name: &str) -> Option<EntityId> {
        self.roots
            .iter()
            .copied()
            .find(|id| self.names.get(id).map(String::as_str) == Some(name))
    }

    /// Find a direct child of `parent` by name
    pub fn find_child(&self, parent: EntityId, name: &str) -> Option<EntityId> {
        self.children.get(&parent)?.iter().copied().find(|id| {
            self.names.get(id).map(String::as_str) == Some(name)
        })
    }

    /// Resolve a slash-separated path relative to `root`.
    ///
    /// An empty path resolves to `root` itself.
    pub fn resolve_path(&self, root: EntityId, path: &str) -> Option<EntityId> {
        if !self.contains(root) {
            return None;
        }
        path.split('/')
            .filter(|s| !s.is_empty())
            .try_fold(root, |current, segment| self.find_child(current, segment))
    }

    /// Full path of an entity from its top-level ancestor
    pub fn path_of(&self, id: EntityId) -> Option<String> {
        let mut segments = vec![self.names.get(&id)?.clone()];
        let mut current = id;
        while let Some(parent) = self.parents.get(&current) {
            segments.push(self.names.get(parent)?.clone());
            current = *parent;
        }
        segments.reverse();
        Some(segments.join("/"))
    }

    /// Get entity name by ID
    pub fn get_name(&self, id: EntityId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Get parent of an entity
    pub fn get_parent(&self, child: EntityId) -> Option<EntityId> {
        self.parents.get(&child).copied()
    }

    /// Get children of an entity in spawn order
    pub fn get_children(&self, parent: EntityId) -> &[EntityId] {
        self.children.get(&parent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Read an entity's local transform
    pub fn transform(&self, id: EntityId) -> Option<Transform> {
        let entity = *self.id_map.get_by_left(&id)?;
        self.world.get::<&Transform>(entity).ok().map(|t| *t)
    }

    /// Mutable access to an entity's local transform
    pub fn transform_mut(&mut self, id: EntityId) -> Option<&mut Transform> {
        let entity = *self.id_map.get_by_left(&id)?;
        self.world.query_one_mut::<&mut Transform>(entity).ok()
    }

    /// Replace an entity's local transform
    pub fn set_transform(&mut self, id: EntityId, transform: Transform) -> Result<()> {
        let slot = self
            .transform_mut(id)
            .ok_or_else(|| TesseraError::EntityNotFound(id.to_string()))?;
        *slot = transform;
        Ok(())
    }

    /// Read a named custom property
    pub fn property(&self, id: EntityId, name: &str) -> Option<PropertyValue> {
        let entity = *self.id_map.get_by_left(&id)?;
        let props = self.world.get::<&Properties>(entity).ok()?;
        props.0.get(name).copied()
    }

    /// Write a named custom property, creating it if absent
    pub fn set_property(
        &mut self,
        id: EntityId,
        name: impl Into<String>,
        value: PropertyValue,
    ) -> Result<()> {
        let entity = *self
            .id_map
            .get_by_left(&id)
            .ok_or_else(|| TesseraError::EntityNotFound(id.to_string()))?;
        let props = self
            .world
            .query_one_mut::<&mut Properties>(entity)
            .map_err(|_| TesseraError::EntityNotFound(id.to_string()))?;
        props.0.insert(name.into(), value);
        Ok(())
    }

    /// Info about all entities, ordered by id
    pub fn all_entities(&self) -> Vec<EntityInfo> {
        let mut ids: Vec<EntityId> = self.names.keys().copied().collect();
        ids.sort();
        ids.into_iter()
            .filter_map(|id| {
                Some(EntityInfo {
                    id,
                    name: self.names.get(&id)?.clone(),
                    path: self.path_of(id)?,
                    parent: self.get_parent(id),
                    transform: self.transform(id)?,
                })
            })
            .collect()
    }

    /// Get number of entities
    pub fn entity_count(&self) -> usize {
        self.names.len()
    }

    /// Check if an entity exists
    pub fn contains(&self, id: EntityId) -> bool {
        self.id_map.contains_left(&id)
    }

    /// Clear the world
    pub fn clear(&mut self) {
        self.world.clear();
        self.id_map.clear();
        self.names.clear();
        self.parents.clear();
        self.children.clear();
        self.roots.clear();
    }
}
