//! Tessera Scene - Entity storage for animation targets
//!
//! This crate wraps hecs with stable entity identifiers, a named
//! parent/child hierarchy, and the two component kinds animation writes:
//! transforms and named custom properties.

mod entity;
mod world;

pub use entity::EntityInfo;
pub use world::{Properties, SceneWorld};
