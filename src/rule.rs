//! Single-rule evaluation.
//!
//! A [`Rule`] is one atomic text transformation: either a literal substring
//! replacement or a regular-expression substitution. Rules are compiled once
//! into a [`CompiledRule`] and then applied as pure functions of the input
//! text. A rule that matches nothing returns its input untouched.

use crate::message::one_line;
use regex::{NoExpand, Regex, RegexBuilder};
use regex_syntax::ast::{self, Ast, Flag, GroupKind};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use thiserror::Error;

/// How many matches a rule replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Only the leftmost match.
    First,
    /// Every non-overlapping match, scanning left to right.
    #[default]
    All,
}

impl Scope {
    /// Replacement limit in the `regex::Regex::replacen` convention (0 = unlimited).
    fn limit(self) -> usize {
        match self {
            Scope::First => 1,
            Scope::All => 0,
        }
    }
}

/// One text transformation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Exact substring match, exact replacement.
    Literal {
        id: String,
        find: String,
        replace: String,
        scope: Scope,
    },
    /// Regular-expression match. `.` always matches `\n`, so a pattern may
    /// span several lines.
    Pattern {
        id: String,
        pattern: String,
        replace: String,
        scope: Scope,
        /// `Some(g)` makes every repetition in the pattern greedy (`true`) or
        /// lazy (`false`). `None` keeps each quantifier as written.
        greedy: Option<bool>,
        /// Expand `$1` / `${name}` in `replace` instead of inserting it verbatim.
        expand_captures: bool,
    },
}

#[derive(Error, Debug)]
pub enum PatternError {
    #[error("rule '{rule_id}': invalid pattern: {}", one_line(.source))]
    Invalid {
        rule_id: String,
        #[source]
        source: regex::Error,
    },

    #[error("rule '{rule_id}': cannot set greediness: {reason}")]
    Greediness { rule_id: String, reason: String },

    #[error("rule '{rule_id}': {field} must not be empty")]
    Empty {
        rule_id: String,
        field: &'static str,
    },
}

impl PatternError {
    /// Id of the rule that failed to compile.
    pub fn rule_id(&self) -> &str {
        match self {
            PatternError::Invalid { rule_id, .. }
            | PatternError::Greediness { rule_id, .. }
            | PatternError::Empty { rule_id, .. } => rule_id,
        }
    }
}

impl Rule {
    /// Literal rule replacing every occurrence of `find`.
    pub fn literal(
        id: impl Into<String>,
        find: impl Into<String>,
        replace: impl Into<String>,
    ) -> Self {
        Rule::Literal {
            id: id.into(),
            find: find.into(),
            replace: replace.into(),
            scope: Scope::All,
        }
    }

    /// Pattern rule replacing every match, quantifiers as written, with a
    /// verbatim replacement.
    pub fn pattern(
        id: impl Into<String>,
        pattern: impl Into<String>,
        replace: impl Into<String>,
    ) -> Self {
        Rule::Pattern {
            id: id.into(),
            pattern: pattern.into(),
            replace: replace.into(),
            scope: Scope::All,
            greedy: None,
            expand_captures: false,
        }
    }

    #[must_use]
    pub fn with_scope(mut self, new_scope: Scope) -> Self {
        match &mut self {
            Rule::Literal { scope, .. } | Rule::Pattern { scope, .. } => *scope = new_scope,
        }
        self
    }

    /// Make every repetition in a pattern rule lazy. No effect on literal rules.
    #[must_use]
    pub fn ungreedy(self) -> Self {
        self.with_greediness(false)
    }

    /// Make every repetition in a pattern rule greedy (`true`) or lazy
    /// (`false`). No effect on literal rules.
    #[must_use]
    pub fn with_greediness(mut self, value: bool) -> Self {
        if let Rule::Pattern { greedy, .. } = &mut self {
            *greedy = Some(value);
        }
        self
    }

    /// Enable capture-group expansion in the replacement. No effect on literal rules.
    #[must_use]
    pub fn expanding_captures(mut self) -> Self {
        if let Rule::Pattern {
            expand_captures, ..
        } = &mut self
        {
            *expand_captures = true;
        }
        self
    }

    pub fn id(&self) -> &str {
        match self {
            Rule::Literal { id, .. } | Rule::Pattern { id, .. } => id,
        }
    }

    pub fn scope(&self) -> Scope {
        match self {
            Rule::Literal { scope, .. } | Rule::Pattern { scope, .. } => *scope,
        }
    }

    /// Validate and compile the rule.
    pub fn compile(&self) -> Result<CompiledRule, PatternError> {
        let matcher = match self {
            Rule::Literal { id, find, .. } => {
                if find.is_empty() {
                    return Err(PatternError::Empty {
                        rule_id: id.clone(),
                        field: "find",
                    });
                }
                Matcher::Literal(find.clone())
            }
            Rule::Pattern {
                id,
                pattern,
                greedy,
                expand_captures,
                ..
            } => {
                if pattern.is_empty() {
                    return Err(PatternError::Empty {
                        rule_id: id.clone(),
                        field: "pattern",
                    });
                }
                let mut regex = build_regex(id, pattern)?;
                if let Some(greedy) = *greedy {
                    let forced = force_greediness(pattern, greedy).map_err(|reason| {
                        PatternError::Greediness {
                            rule_id: id.clone(),
                            reason,
                        }
                    })?;
                    regex = build_regex(id, &forced)?;
                }
                Matcher::Pattern {
                    regex,
                    expand_captures: *expand_captures,
                }
            }
        };

        let replace = match self {
            Rule::Literal { replace, .. } | Rule::Pattern { replace, .. } => replace.clone(),
        };

        Ok(CompiledRule {
            id: self.id().to_string(),
            matcher,
            replace,
            scope: self.scope(),
        })
    }
}

fn build_regex(rule_id: &str, pattern: &str) -> Result<Regex, PatternError> {
    RegexBuilder::new(pattern)
        .dot_matches_new_line(true)
        .build()
        .map_err(|source| PatternError::Invalid {
            rule_id: rule_id.to_string(),
            source,
        })
}

/// Rewrite `pattern` so that every repetition has the given greediness.
///
/// Inline `U` flags are rejected: they would invert the forced setting
/// for part of the pattern.
fn force_greediness(pattern: &str, greedy: bool) -> Result<String, String> {
    let mut parsed = ast::parse::Parser::new()
        .parse(pattern)
        .map_err(|e| one_line(&e))?;
    set_greediness(&mut parsed, greedy)?;

    let mut forced = String::new();
    ast::print::Printer::new()
        .print(&parsed, &mut forced)
        .map_err(|e| e.to_string())?;
    Ok(forced)
}

fn set_greediness(node: &mut Ast, greedy: bool) -> Result<(), String> {
    const SWAP_GREED: &str = "inline (?U) flag conflicts with an explicit greedy setting";

    match node {
        Ast::Repetition(repetition) => {
            repetition.greedy = greedy;
            set_greediness(&mut repetition.ast, greedy)
        }
        Ast::Group(group) => {
            if let GroupKind::NonCapturing(flags) = &group.kind {
                if flags.flag_state(Flag::SwapGreed).is_some() {
                    return Err(SWAP_GREED.to_string());
                }
            }
            set_greediness(&mut group.ast, greedy)
        }
        Ast::Flags(set) if set.flags.flag_state(Flag::SwapGreed).is_some() => {
            Err(SWAP_GREED.to_string())
        }
        Ast::Alternation(alternation) => alternation
            .asts
            .iter_mut()
            .try_for_each(|branch| set_greediness(branch, greedy)),
        Ast::Concat(concat) => concat
            .asts
            .iter_mut()
            .try_for_each(|item| set_greediness(item, greedy)),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    Literal(String),
    Pattern { regex: Regex, expand_captures: bool },
}

/// A rule ready to be applied.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    id: String,
    matcher: Matcher,
    replace: String,
    scope: Scope,
}

/// Output of one rule against one input.
#[derive(Debug)]
pub struct RuleApplication<'a> {
    /// Borrowed from the input when nothing matched.
    pub content: Cow<'a, str>,
    pub replacements: usize,
}

impl CompiledRule {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Apply the rule to `content`.
    pub fn apply<'a>(&self, content: &'a str) -> RuleApplication<'a> {
        let replacements = self.count_matches(content);
        if replacements == 0 {
            return RuleApplication {
                content: Cow::Borrowed(content),
                replacements,
            };
        }

        let replaced = match &self.matcher {
            Matcher::Literal(find) => match self.scope {
                Scope::First => Cow::Owned(content.replacen(find.as_str(), &self.replace, 1)),
                Scope::All => Cow::Owned(content.replace(find.as_str(), &self.replace)),
            },
            Matcher::Pattern {
                regex,
                expand_captures: true,
            } => regex.replacen(content, self.scope.limit(), self.replace.as_str()),
            Matcher::Pattern {
                regex,
                expand_captures: false,
            } => regex.replacen(content, self.scope.limit(), NoExpand(self.replace.as_str())),
        };

        RuleApplication {
            content: replaced,
            replacements,
        }
    }

    fn count_matches(&self, content: &str) -> usize {
        match (&self.matcher, self.scope) {
            (Matcher::Literal(find), Scope::First) => usize::from(content.contains(find.as_str())),
            (Matcher::Literal(find), Scope::All) => content.matches(find.as_str()).count(),
            (Matcher::Pattern { regex, .. }, Scope::First) => usize::from(regex.is_match(content)),
            (Matcher::Pattern { regex, .. }, Scope::All) => regex.find_iter(content).count(),
        }
    }
}
