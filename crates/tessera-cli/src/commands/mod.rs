//! CLI command implementations

pub mod inspect;
pub mod simulate;

use anyhow::{Context, Result};
use std::path::Path;
use tessera_animation::ClipLibrary;

/// Load every clip in `dir` into a fresh library
pub(crate) fn load_library(dir: &str) -> Result<ClipLibrary> {
    let mut library = ClipLibrary::new();
    let count = library
        .load_dir(Path::new(dir))
        .with_context(|| format!("Failed to load clips from {}", dir))?;
    log::info!("Loaded {} clip(s) from {}", count, dir);
    Ok(library)
}
