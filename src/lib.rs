//! Text Patcher: declarative text patching for whole files
//!
//! A patch is an ordered list of rules bound to one target file. Each rule is
//! either a literal substring replacement or a regular-expression
//! substitution; rules run in declared order, each seeing the output of the
//! one before it, and the result is written back to the file once.
//!
//! # Architecture
//!
//! - [`rule`]: a single [`Rule`], compiled and applied as a pure function.
//! - [`ruleset`]: the ordered fold of rules over a string.
//! - [`runner`]: reads a target, runs its rules, writes it back atomically.
//! - [`config`]: TOML patch files, workspace resolution, batch application.
//! - [`presets`]: the built-in page clean-ups.
//! - [`message`]: one-line error rendering for the binaries.
//!
//! # Guarantees
//!
//! - A rule that matches nothing is a no-op, never an error
//! - Content is written at most once per target (tempfile + fsync + rename)
//! - Unchanged content is not rewritten
//! - Workspace-relative targets cannot escape the workspace
//!
//! # Example
//!
//! ```
//! use text_patcher::{Rule, RuleSet, Scope};
//!
//! let rules = RuleSet::default()
//!     .with(Rule::literal("stat", "label: 'Veteran Owned'", "label: 'Live Support'"))
//!     .with(Rule::pattern("badge", r"<!--start-->.*?<!--end-->", "").with_scope(Scope::First));
//!
//! let out = rules
//!     .apply("<!--start-->\nbadge\n<!--end-->{ value: '100%', label: 'Veteran Owned' }")
//!     .unwrap();
//! assert_eq!(out.content, "{ value: '100%', label: 'Live Support' }");
//! ```

pub mod config;
pub mod logging;
pub mod message;
pub mod presets;
pub mod rule;
pub mod ruleset;
pub mod runner;
pub mod safety;

// Re-exports
pub use config::{
    apply_patch_set, apply_patch_sets, check_patch_set, discover_patch_files, load_from_path,
    load_from_str, ApplicationError, ApplyOptions, CheckStatus, ConfigError, FailurePolicy,
    PatchConfig,
};
pub use rule::{CompiledRule, PatternError, Rule, Scope};
pub use ruleset::{CompiledRuleSet, RuleOutcome, RuleSet, RuleSetOutput};
pub use runner::{patch_file, PatchError, PatchReport, PatchSet, PatchStatus, RunMode, Target};
pub use safety::{SafetyError, WorkspaceGuard};
