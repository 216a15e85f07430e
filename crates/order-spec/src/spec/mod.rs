pub mod catalogue;
pub mod group;
pub mod registry;

pub use group::OptionGroup;
pub use registry::{CompositeRule, Registry, RegistryError, SecondaryPrompt};
