use crate::rule::{Rule, Scope};
use crate::ruleset::RuleSet;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// One patch file: a rule set bound to a single target.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct PatchConfig {
    /// Path of the document to patch.
    #[serde(default)]
    pub target_path: String,
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

impl PatchConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.target_path.trim().is_empty() {
            issues.push(ValidationIssue::MissingField {
                rule_id: None,
                field: "target_path",
            });
        }

        if self.rules.is_empty() {
            issues.push(ValidationIssue::EmptyRuleList);
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            let id = rule.id();
            if id.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    rule_id: None,
                    field: "id",
                });
            } else if !seen.insert(id) {
                issues.push(ValidationIssue::DuplicateId(id.to_string()));
            }

            let rule_id = Some(id.to_string()).filter(|id| !id.trim().is_empty());
            match rule {
                RuleDefinition::Literal { find, .. } if find.is_empty() => {
                    issues.push(ValidationIssue::MissingField {
                        rule_id,
                        field: "find",
                    });
                }
                RuleDefinition::Pattern { pattern, .. } if pattern.is_empty() => {
                    issues.push(ValidationIssue::MissingField {
                        rule_id,
                        field: "pattern",
                    });
                }
                _ => {}
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Display name: `meta.name`, falling back to the target path.
    pub fn name(&self) -> &str {
        if self.meta.name.trim().is_empty() {
            &self.target_path
        } else {
            &self.meta.name
        }
    }

    /// Where the target lives, honoring `meta.workspace_relative`.
    pub fn resolve_target(&self, workspace_root: &Path) -> PathBuf {
        if self.meta.workspace_relative {
            workspace_root.join(&self.target_path)
        } else {
            PathBuf::from(&self.target_path)
        }
    }

    pub fn rule_set(&self) -> RuleSet {
        self.rules.iter().map(Rule::from).collect()
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub workspace_relative: bool,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RuleDefinition {
    /// Exact substring replacement
    Literal {
        id: String,
        find: String,
        #[serde(default)]
        replace: String,
        #[serde(default)]
        scope: Scope,
    },
    /// Regular expression replacement (dot matches newline)
    Pattern {
        id: String,
        pattern: String,
        #[serde(default)]
        replace: String,
        #[serde(default)]
        scope: Scope,
        /// Unset keeps each quantifier as written.
        #[serde(default)]
        greedy: Option<bool>,
        #[serde(default)]
        expand_captures: bool,
    },
}

impl RuleDefinition {
    pub fn id(&self) -> &str {
        match self {
            RuleDefinition::Literal { id, .. } | RuleDefinition::Pattern { id, .. } => id,
        }
    }
}

impl From<&RuleDefinition> for Rule {
    fn from(def: &RuleDefinition) -> Self {
        match def.clone() {
            RuleDefinition::Literal {
                id,
                find,
                replace,
                scope,
            } => Rule::Literal {
                id,
                find,
                replace,
                scope,
            },
            RuleDefinition::Pattern {
                id,
                pattern,
                replace,
                scope,
                greedy,
                expand_captures,
            } => Rule::Pattern {
                id,
                pattern,
                replace,
                scope,
                greedy,
                expand_captures,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyRuleList,
    MissingField {
        rule_id: Option<String>,
        field: &'static str,
    },
    DuplicateId(String),
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyRuleList => write!(f, "patch file contains no rules"),
            ValidationIssue::MissingField { rule_id, field } => match rule_id {
                Some(id) => write!(f, "rule '{id}' missing required field '{field}'"),
                None => write!(f, "missing required field '{field}'"),
            },
            ValidationIssue::DuplicateId(id) => write!(f, "rule id '{id}' is used more than once"),
        }
    }
}
