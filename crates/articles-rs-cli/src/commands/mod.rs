//! Built-in commands of the `articles` binary.

pub mod check;
pub mod cycle_cache;
pub mod render;
pub mod reverse;

pub use check::CheckCommand;
pub use cycle_cache::CycleCacheCommand;
pub use render::RenderCommand;
pub use reverse::ReverseCommand;

use crate::command::CommandRegistry;

/// Registers every built-in command.
pub fn register_builtin_commands(registry: &mut CommandRegistry) {
    registry.register(Box::new(CheckCommand));
    registry.register(Box::new(ReverseCommand));
    registry.register(Box::new(CycleCacheCommand));
    registry.register(Box::new(RenderCommand));
}
