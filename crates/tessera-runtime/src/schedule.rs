//! Ordered system execution

use crate::system::RuntimeSystem;
use tessera_core::Result;
use tessera_scene::SceneWorld;

/// Runs registered systems in order against one world.
///
/// Systems later in the list observe the writes of earlier ones within
/// the same frame.
#[derive(Default)]
pub struct SystemSchedule {
    systems: Vec<Box<dyn RuntimeSystem>>,
}

impl SystemSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register and initialize a system
    pub fn add_system(
        &mut self,
        mut system: Box<dyn RuntimeSystem>,
        world: &mut SceneWorld,
    ) -> Result<()> {
        system.initialize(world)?;
        log::debug!("Registered system '{}'", system.name());
        self.systems.push(system);
        Ok(())
    }

    /// Run one variable-rate frame
    pub fn update(&mut self, world: &mut SceneWorld, dt: f64) -> Result<()> {
        for system in &mut self.systems {
            system.update(world, dt)?;
        }
        Ok(())
    }

    /// Run one fixed step
    pub fn fixed_update(&mut self, world: &mut SceneWorld, dt: f64) -> Result<()> {
        for system in &mut self.systems {
            system.fixed_update(world, dt)?;
        }
        Ok(())
    }

    /// Shut down all systems in reverse registration order
    pub fn shutdown(&mut self) -> Result<()> {
        for system in self.systems.iter_mut().rev() {
            system.shutdown()?;
        }
        self.systems.clear();
        Ok(())
    }

    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}
