//! Tessera Runtime - Update loop infrastructure
//!
//! - `RuntimeSystem`: trait for systems ticked by the host loop
//! - `SystemSchedule`: ordered list of systems sharing one `SceneWorld`

mod schedule;
mod system;

pub use schedule::SystemSchedule;
pub use system::RuntimeSystem;
