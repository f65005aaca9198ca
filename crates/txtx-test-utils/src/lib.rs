mod addon_registry;
pub mod assertions;
pub mod builders;

pub use addon_registry::test_addons;
pub use builders::RunbookBuilder;

// Re-export common types for convenience
pub use txtx_doctor::{Diagnostic, ManifestSnapshot, Severity, ValidationResult};
