//! Tessera Core - Foundational types for the Tessera engine
//!
//! This crate provides the core types that all other Tessera crates depend on:
//! - `EntityId` - Stable entity identifiers
//! - `Transform` - Position / rotation / scale of a scene entity
//! - `PropertyValue`, `ValueType` - Typed values written by animation curves
//! - Error types and Result alias

mod error;
mod id;
mod types;

pub use error::{Result, TesseraError};
pub use id::EntityId;
pub use types::{PropertyValue, Transform, ValueType};
