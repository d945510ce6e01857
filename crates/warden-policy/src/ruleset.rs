//! Ordered rule sets.

use std::io::Read;

use serde::Serialize;

use warden_core::{ResourceAttributes, UserInfo, Verdict};

use crate::error::{PolicyError, Result};
use crate::rule::Rule;

/// An ordered, validated list of rules. First match wins.
///
/// Only constructed through validation; it serializes as the plain list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Validate and wrap a list of rules.
    pub fn new(rules: Vec<Rule>) -> Result<Self> {
        for (index, rule) in rules.iter().enumerate() {
            if let Some(field) = rule.empty_field() {
                return Err(PolicyError::InvalidRule {
                    index,
                    reason: format!("empty {} pattern (use \"*\" to match all)", field),
                });
            }
        }
        Ok(Self { rules })
    }

    /// Parse a JSON rule list.
    pub fn from_json(source: &str) -> Result<Self> {
        let rules: Vec<Rule> = serde_json::from_str(source)?;
        Self::new(rules)
    }

    /// Parse a JSON rule list from a reader.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let rules: Vec<Rule> = serde_json::from_reader(reader)?;
        Self::new(rules)
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

    /// Index and rule of the first match.
    pub fn first_match(&self, user: &UserInfo, attrs: &ResourceAttributes) -> Option<(usize, &Rule)> {
        self.rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.matches(user, attrs))
    }

    /// Evaluate a request. No match is NoOpinion.
    pub fn evaluate(&self, user: &UserInfo, attrs: &ResourceAttributes) -> Verdict {
        match self.first_match(user, attrs) {
            Some((index, rule)) => Verdict {
                decision: rule.decision.into(),
                reason: format!("policy rule #{} ({})", index, rule),
            },
            None => Verdict::no_opinion("no policy rule matched"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{Pattern, RuleDecision};
    use warden_core::Decision;

    const SOURCE: &str = r#"[
        {"user": "mallory", "group": "*", "resource": "*", "namespace": "*", "verb": "*", "decision": "Deny"},
        {"user": "*", "group": "ops", "resource": "secrets", "namespace": "prod", "verb": "get", "decision": "Allow"},
        {"user": "*", "group": "ops", "resource": "*", "namespace": "*", "verb": "*", "decision": "Deny"}
    ]"#;

    fn attrs(verb: &str, resource: &str, namespace: &str) -> ResourceAttributes {
        ResourceAttributes {
            verb: verb.into(),
            api_group: String::new(),
            resource: resource.into(),
            name: "x".into(),
            namespace: namespace.into(),
        }
    }

    #[test]
    fn test_first_match_wins() {
        let set = RuleSet::from_json(SOURCE).unwrap();
        assert_eq!(set.len(), 3);

        let ops = UserInfo::new("olivia").with_group("ops");
        let verdict = set.evaluate(&ops, &attrs("get", "secrets", "prod"));
        assert_eq!(verdict.decision, Decision::Allow);
        assert!(verdict.reason.starts_with("policy rule #1"));

        let verdict = set.evaluate(&ops, &attrs("delete", "secrets", "prod"));
        assert_eq!(verdict.decision, Decision::Deny);
        assert!(verdict.reason.starts_with("policy rule #2"));

        let mallory = UserInfo::new("mallory").with_group("ops");
        let verdict = set.evaluate(&mallory, &attrs("get", "secrets", "prod"));
        assert_eq!(verdict.decision, Decision::Deny);
        assert!(verdict.reason.starts_with("policy rule #0"));
    }

    #[test]
    fn test_no_match_is_no_opinion() {
        let set = RuleSet::from_json(SOURCE).unwrap();
        let verdict = set.evaluate(&UserInfo::new("dev"), &attrs("get", "pods", "ns0"));
        assert_eq!(verdict.decision, Decision::NoOpinion);

        let empty = RuleSet::default();
        let verdict = empty.evaluate(&UserInfo::new("dev"), &attrs("get", "pods", "ns0"));
        assert_eq!(verdict.decision, Decision::NoOpinion);
    }

    #[test]
    fn test_malformed_sources_fail() {
        assert!(matches!(
            RuleSet::from_json("not json"),
            Err(PolicyError::Malformed(_))
        ));
        assert!(matches!(
            RuleSet::from_json(r#"{"rules": []}"#),
            Err(PolicyError::Malformed(_))
        ));
        assert!(matches!(
            RuleSet::from_json(r#"[{"user": "*"}]"#),
            Err(PolicyError::Malformed(_))
        ));
    }

    #[test]
    fn test_empty_pattern_rejected() {
        let source = r#"[
            {"user": "*", "group": "*", "resource": "*", "namespace": "*", "verb": "*", "decision": "Allow"},
            {"user": "*", "group": "", "resource": "*", "namespace": "*", "verb": "*", "decision": "Allow"}
        ]"#;
        let err = RuleSet::from_json(source).unwrap_err();
        assert!(matches!(err, PolicyError::InvalidRule { index: 1, .. }));
        assert!(err.to_string().contains("group"));
    }

    #[test]
    fn test_from_reader() {
        let set = RuleSet::from_reader(SOURCE.as_bytes()).unwrap();
        assert_eq!(set.rules()[0].user, Pattern::exact("mallory"));
        assert_eq!(set.rules()[0].decision, RuleDecision::Deny);
    }
}
