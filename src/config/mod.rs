pub mod applicator;
pub mod loader;
pub mod schema;

pub use applicator::{
    apply_patch_set, apply_patch_sets, check_patch_set, ApplicationError, ApplyOptions,
    CheckStatus, FailurePolicy,
};
pub use loader::{discover_patch_files, load_from_path, load_from_str, ConfigError};
pub use schema::{Metadata, PatchConfig, RuleDefinition, ValidationError, ValidationIssue};
