//! Ordered rule sets.
//!
//! A [`RuleSet`] folds its rules over the input left to right: each rule sees
//! the output of the rule before it. Order is never rearranged.

use crate::rule::{CompiledRule, PatternError, Rule};
use serde::Serialize;
use std::borrow::Cow;
use tracing::trace;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

/// Replacement count for one rule within a rule set run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleOutcome {
    pub rule_id: String,
    pub replacements: usize,
}

/// Final content plus per-rule outcomes, in rule order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "RuleSetOutput carries the patched content"]
pub struct RuleSetOutput {
    pub content: String,
    pub outcomes: Vec<RuleOutcome>,
}

impl RuleSetOutput {
    pub fn total_replacements(&self) -> usize {
        self.outcomes.iter().map(|o| o.replacements).sum()
    }
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Append a rule; it runs after every rule already in the set.
    #[must_use]
    pub fn with(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Compile every rule, stopping at the first invalid one.
    pub fn compile(&self) -> Result<CompiledRuleSet, PatternError> {
        let rules = self
            .rules
            .iter()
            .map(Rule::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CompiledRuleSet { rules })
    }

    /// Compile and apply in one step.
    pub fn apply(&self, content: &str) -> Result<RuleSetOutput, PatternError> {
        Ok(self.compile()?.apply(content))
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone)]
pub struct CompiledRuleSet {
    rules: Vec<CompiledRule>,
}

impl CompiledRuleSet {
    pub fn apply(&self, content: &str) -> RuleSetOutput {
        let mut current = content.to_string();
        let mut outcomes = Vec::with_capacity(self.rules.len());

        for rule in &self.rules {
            let (next, replacements) = {
                let applied = rule.apply(&current);
                let next = match applied.content {
                    Cow::Owned(next) => Some(next),
                    Cow::Borrowed(_) => None,
                };
                (next, applied.replacements)
            };
            if let Some(next) = next {
                current = next;
            }

            trace!(rule = rule.id(), replacements, "rule evaluated");
            outcomes.push(RuleOutcome {
                rule_id: rule.id().to_string(),
                replacements,
            });
        }

        RuleSetOutput {
            content: current,
            outcomes,
        }
    }

    /// Whether a second pass over the set's own output changes nothing.
    ///
    /// Rule sets are expected to satisfy this: re-running a patch over an
    /// already patched document must be a no-op.
    pub fn is_idempotent(&self, content: &str) -> bool {
        let once = self.apply(content);
        let twice = self.apply(&once.content);
        twice.content == once.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Scope;

    #[test]
    fn test_rules_see_previous_output() {
        let rules = RuleSet::default()
            .with(Rule::literal("a-to-b", "a", "b"))
            .with(Rule::literal("b-to-c", "b", "c"));
        let out = rules.apply("ab").unwrap();
        assert_eq!(out.content, "cc");
        assert_eq!(
            out.outcomes,
            vec![
                RuleOutcome {
                    rule_id: "a-to-b".to_string(),
                    replacements: 1
                },
                RuleOutcome {
                    rule_id: "b-to-c".to_string(),
                    replacements: 2
                },
            ]
        );
        assert_eq!(out.total_replacements(), 3);
    }

    #[test]
    fn test_order_matters() {
        let remove = Rule::literal("remove", "Veteran Owned", "");
        let insert = Rule::literal("insert", "label", "label Veteran Owned");

        let forward = RuleSet::new(vec![remove.clone(), insert.clone()]);
        let reverse = RuleSet::new(vec![insert, remove]);

        let content = "label: Veteran Owned";
        assert_eq!(forward.apply(content).unwrap().content, "label Veteran Owned: ");
        assert_eq!(reverse.apply(content).unwrap().content, "label : ");
    }

    #[test]
    fn test_empty_set_is_identity() {
        let out = RuleSet::default().apply("unchanged").unwrap();
        assert_eq!(out.content, "unchanged");
        assert!(out.outcomes.is_empty());
    }

    #[test]
    fn test_invalid_rule_stops_compilation() {
        let rules = RuleSet::default()
            .with(Rule::literal("ok", "a", "b"))
            .with(Rule::pattern("bad", "[", ""));
        let err = rules.compile().unwrap_err();
        assert_eq!(err.rule_id(), "bad");
    }

    #[test]
    fn test_idempotence_detection() {
        let clean = RuleSet::default().with(Rule::literal("r", "Veteran", "Experienced"));
        assert!(clean.compile().unwrap().is_idempotent("Veteran Leadership"));

        let growing =
            RuleSet::default().with(Rule::literal("r", "a", "aa").with_scope(Scope::First));
        assert!(!growing.compile().unwrap().is_idempotent("a"));
    }

    #[test]
    fn test_collect_into_rule_set() {
        let rules: RuleSet = ["x", "y"]
            .iter()
            .map(|s| Rule::literal(*s, *s, "z"))
            .collect();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules.apply("xy").unwrap().content, "zz");
    }
}
