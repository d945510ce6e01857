//! Rule records and attribute patterns.

use serde::{Deserialize, Serialize};
use std::fmt;

use warden_core::{Decision, ResourceAttributes, UserInfo};

/// Value that matches every attribute.
pub const WILDCARD: &str = "*";

/// A single attribute matcher: the wildcard or one exact value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Pattern {
    Any,
    Exact(String),
}

impl Pattern {
    pub fn exact(value: impl Into<String>) -> Self {
        Pattern::Exact(value.into())
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Pattern::Any => true,
            Pattern::Exact(expected) => expected == value,
        }
    }

    /// Matches if the wildcard, or if any candidate matches exactly.
    pub fn matches_any<'a>(&self, mut values: impl Iterator<Item = &'a str>) -> bool {
        match self {
            Pattern::Any => true,
            Pattern::Exact(expected) => values.any(|v| v == expected),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Pattern::Exact(v) if v.is_empty())
    }
}

impl From<String> for Pattern {
    fn from(s: String) -> Self {
        if s == WILDCARD {
            Pattern::Any
        } else {
            Pattern::Exact(s)
        }
    }
}

impl From<&str> for Pattern {
    fn from(s: &str) -> Self {
        Pattern::from(s.to_string())
    }
}

impl From<Pattern> for String {
    fn from(p: Pattern) -> Self {
        match p {
            Pattern::Any => WILDCARD.to_string(),
            Pattern::Exact(s) => s,
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Any => f.write_str(WILDCARD),
            Pattern::Exact(s) => f.write_str(s),
        }
    }
}

/// What a matching rule decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleDecision {
    #[serde(alias = "allow", alias = "ALLOW")]
    Allow,
    #[serde(alias = "deny", alias = "DENY")]
    Deny,
}

impl From<RuleDecision> for Decision {
    fn from(d: RuleDecision) -> Self {
        match d {
            RuleDecision::Allow => Decision::Allow,
            RuleDecision::Deny => Decision::Deny,
        }
    }
}

/// One rule: a predicate over request attributes and a decision.
///
/// Every field is required in the rule source; use `"*"` to match all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    pub user: Pattern,
    pub group: Pattern,
    pub resource: Pattern,
    pub namespace: Pattern,
    pub verb: Pattern,
    pub decision: RuleDecision,
}

impl Rule {
    /// A rule matching everything, to be narrowed with the setters.
    pub fn any(decision: RuleDecision) -> Self {
        Self {
            user: Pattern::Any,
            group: Pattern::Any,
            resource: Pattern::Any,
            namespace: Pattern::Any,
            verb: Pattern::Any,
            decision,
        }
    }

    pub fn user(mut self, p: impl Into<Pattern>) -> Self {
        self.user = p.into();
        self
    }

    pub fn group(mut self, p: impl Into<Pattern>) -> Self {
        self.group = p.into();
        self
    }

    pub fn resource(mut self, p: impl Into<Pattern>) -> Self {
        self.resource = p.into();
        self
    }

    pub fn namespace(mut self, p: impl Into<Pattern>) -> Self {
        self.namespace = p.into();
        self
    }

    pub fn verb(mut self, p: impl Into<Pattern>) -> Self {
        self.verb = p.into();
        self
    }

    pub fn matches(&self, user: &UserInfo, attrs: &ResourceAttributes) -> bool {
        self.user.matches(&user.name)
            && self.group.matches_any(user.groups.iter().map(String::as_str))
            && self.resource.matches(&attrs.resource)
            && self.namespace.matches(&attrs.namespace)
            && self.verb.matches(&attrs.verb)
    }

    /// Name of the first empty pattern, if any.
    pub(crate) fn empty_field(&self) -> Option<&'static str> {
        [
            ("user", &self.user),
            ("group", &self.group),
            ("resource", &self.resource),
            ("namespace", &self.namespace),
            ("verb", &self.verb),
        ]
        .into_iter()
        .find(|(_, p)| p.is_empty())
        .map(|(field, _)| field)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} user={} group={} resource={} namespace={} verb={}",
            self.decision, self.user, self.group, self.resource, self.namespace, self.verb
        )
    }
}
