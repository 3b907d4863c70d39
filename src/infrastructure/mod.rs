pub mod handle_registry;

pub use handle_registry::{DisplayHandle, HandleRegistry, HandleRole, HandleStats};
