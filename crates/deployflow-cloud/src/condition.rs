//! Tag value conditions
//!
//! A [`Condition`] is a small boolean expression evaluated against a single
//! tag value. Trees are built once (in code, from CLI flags, or deserialized
//! from the config file) and then reused for every candidate resource.
//!
//! ```yaml
//! env:
//!   or:
//!     - equals: prod
//!     - equals: staging
//! ```
//!
//! Each variant is a single-key map. With `serde_yaml`, read the tree through
//! `serde_yaml::with::singleton_map_recursive`; plain `from_str` expects
//! YAML tags (`!equals prod`) instead.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Caller-defined leaf condition
///
/// Implementations must be pure: the same value always gives the same answer.
pub trait Predicate: fmt::Debug + Send + Sync {
    fn evaluate(&self, value: &str) -> bool;
}

/// Boolean expression over a single string value
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Exact, case-sensitive match
    Equals(String),

    /// True if any child matches; an empty list never matches
    Or(Vec<Condition>),

    /// True if every child matches; an empty list always matches
    And(Vec<Condition>),

    /// Negates the child
    Not(Box<Condition>),

    /// Leaf backed by a [`Predicate`] implementation
    #[serde(skip)]
    Custom(Arc<dyn Predicate>),
}

impl Condition {
    pub fn equals(argument: impl Into<String>) -> Self {
        Condition::Equals(argument.into())
    }

    /// `Or` of `Equals` leaves, one per argument
    pub fn any_of<I, S>(arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Condition::Or(
            arguments
                .into_iter()
                .map(|argument| Condition::Equals(argument.into()))
                .collect(),
        )
    }

    pub fn custom(predicate: impl Predicate + 'static) -> Self {
        Condition::Custom(Arc::new(predicate))
    }

    /// Evaluate this tree against `value`
    pub fn evaluate(&self, value: &str) -> bool {
        match self {
            Condition::Equals(argument) => argument == value,
            Condition::Or(children) => children.iter().any(|c| c.evaluate(value)),
            Condition::And(children) => children.iter().all(|c| c.evaluate(value)),
            Condition::Not(child) => !child.evaluate(value),
            Condition::Custom(predicate) => predicate.evaluate(value),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, op: &str, children: &[Condition]) -> fmt::Result {
            write!(f, "{}(", op)?;
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", child)?;
            }
            write!(f, ")")
        }

        match self {
            Condition::Equals(argument) => write!(f, "equals({:?})", argument),
            Condition::Or(children) => join(f, "or", children),
            Condition::And(children) => join(f, "and", children),
            Condition::Not(child) => write!(f, "not({})", child),
            Condition::Custom(predicate) => write!(f, "custom({:?})", predicate),
        }
    }
}

/// A condition registered for one tag key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedCondition {
    /// Tag key the condition applies to
    pub name: String,
    pub condition: Condition,
}

impl NamedCondition {
    pub fn new(name: impl Into<String>, condition: Condition) -> Self {
        Self {
            name: name.into(),
            condition,
        }
    }

    /// Parse a `key=value[|value...]` flag into an `Or` of `Equals` leaves
    ///
    /// A single value produces a bare `Equals`.
    pub fn parse(spec: &str) -> Option<Self> {
        let (key, values) = spec.split_once('=')?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }

        let values: Vec<&str> = values.split('|').collect();
        let condition = if values.len() == 1 {
            Condition::equals(values[0])
        } else {
            Condition::any_of(values)
        };
        Some(Self::new(key, condition))
    }

    pub fn evaluate(&self, value: &str) -> bool {
        self.condition.evaluate(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct Counting {
        calls: AtomicUsize,
        answer: bool,
    }

    impl Predicate for Arc<Counting> {
        fn evaluate(&self, _value: &str) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer
        }
    }

    #[test]
    fn test_equals_is_exact() {
        let cond = Condition::equals("prod");
        assert!(cond.evaluate("prod"));
        assert!(!cond.evaluate("Prod"));
        assert!(!cond.evaluate("prod "));
        assert!(!cond.evaluate(""));
    }

    #[test]
    fn test_empty_or_never_matches() {
        let cond = Condition::Or(vec![]);
        assert!(!cond.evaluate(""));
        assert!(!cond.evaluate("anything"));
    }

    #[test]
    fn test_or_matches_any_child() {
        let cond = Condition::any_of(["prod", "staging"]);
        assert!(cond.evaluate("prod"));
        assert!(cond.evaluate("staging"));
        assert!(!cond.evaluate("dev"));
    }

    #[test]
    fn test_or_short_circuits() {
        let spy = Arc::new(Counting::default());
        let cond = Condition::Or(vec![
            Condition::equals("prod"),
            Condition::custom(spy.clone()),
        ]);

        assert!(cond.evaluate("prod"));
        assert_eq!(spy.calls.load(Ordering::SeqCst), 0);

        assert!(!cond.evaluate("dev"));
        assert_eq!(spy.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_and_and_not() {
        let cond = Condition::And(vec![
            Condition::Not(Box::new(Condition::equals("dev"))),
            Condition::Not(Box::new(Condition::equals("test"))),
        ]);
        assert!(cond.evaluate("prod"));
        assert!(!cond.evaluate("dev"));
        assert!(Condition::And(vec![]).evaluate("x"));
    }

    #[test]
    fn test_evaluate_is_repeatable() {
        let cond = Condition::Or(vec![
            Condition::equals("a"),
            Condition::Or(vec![Condition::equals("b"), Condition::equals("c")]),
        ]);
        for value in ["a", "b", "c", "d"] {
            assert_eq!(cond.evaluate(value), cond.evaluate(value));
        }
        assert!(cond.evaluate("c"));
        assert!(!cond.evaluate("d"));
    }

    fn from_yaml(yaml: &str) -> std::result::Result<Condition, serde_yaml::Error> {
        serde_yaml::with::singleton_map_recursive::deserialize(serde_yaml::Deserializer::from_str(
            yaml,
        ))
    }

    #[test]
    fn test_deserialize_from_yaml() {
        let yaml = "or:\n  - equals: prod\n  - equals: staging\n";
        let cond = from_yaml(yaml).unwrap();
        assert!(cond.evaluate("staging"));
        assert!(!cond.evaluate("dev"));
    }

    #[test]
    fn test_deserialize_nested_not() {
        let yaml = "and:\n  - not:\n      equals: dev\n  - not:\n      equals: test\n";
        let cond = from_yaml(yaml).unwrap();
        assert!(cond.evaluate("prod"));
        assert!(!cond.evaluate("test"));
    }

    #[test]
    fn test_deserialize_rejects_unknown_kind() {
        assert!(from_yaml("matches: prod\n").is_err());
        assert!(from_yaml("equals: prod\n").is_ok());
    }

    #[test]
    fn test_parse_flag() {
        let named = NamedCondition::parse("env=prod|staging").unwrap();
        assert_eq!(named.name, "env");
        assert!(named.evaluate("staging"));
        assert!(!named.evaluate("prod|staging"));

        let single = NamedCondition::parse("team=core").unwrap();
        assert!(matches!(single.condition, Condition::Equals(ref a) if a == "core"));

        assert!(NamedCondition::parse("novalue").is_none());
        assert!(NamedCondition::parse("=prod").is_none());
    }

    #[test]
    fn test_display() {
        let cond = Condition::Or(vec![
            Condition::equals("prod"),
            Condition::Not(Box::new(Condition::equals("dev"))),
        ]);
        assert_eq!(cond.to_string(), "or(equals(\"prod\"), not(equals(\"dev\")))");
    }
}
