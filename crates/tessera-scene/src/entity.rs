//! Entity information and metadata

use tessera_core::{EntityId, Transform};
use serde::Serialize;

/// Snapshot of one entity for listing and CLI output
#[derive(Debug, Clone, Serialize)]
pub struct EntityInfo {
    /// The stable entity ID
    pub id: EntityId,
    /// Name, unique among siblings
    pub name: String,
    /// Slash-separated path from the top-level ancestor (inclusive)
    pub path: String,
    /// Parent entity (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<EntityId>,
    /// Local transform
    pub transform: Transform,
}
