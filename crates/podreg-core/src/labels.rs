//! Equality-based selectors over label and field sets.
//!
//! A selector is a conjunction of `key=value` / `key!=value` requirements,
//! written as a comma-separated string:
//!
//! ```
//! use std::collections::BTreeMap;
//! use podreg_core::Selector;
//!
//! let selector: Selector = "env=prod,tier!=cache".parse().unwrap();
//!
//! let mut labels = BTreeMap::new();
//! labels.insert("env".to_string(), "prod".to_string());
//! labels.insert("tier".to_string(), "web".to_string());
//!
//! assert!(selector.matches(&labels));
//! ```
//!
//! The same type is used for field selectors; the caller decides which set it
//! is matched against.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Comparison operator of a single requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `key=value` or `key==value`.
    Equals,
    /// `key!=value`.
    NotEquals,
}

/// One `key <op> value` term.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Requirement {
    key: String,
    operator: Operator,
    value: String,
}

impl Requirement {
    /// Create a requirement.
    #[must_use]
    pub fn new(key: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            operator,
            value: value.into(),
        }
    }

    /// Key being tested.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Check this requirement against a set. A missing key reads as the empty string.
    #[must_use]
    pub fn matches(&self, set: &BTreeMap<String, String>) -> bool {
        let actual = set.get(&self.key).map_or("", String::as_str);
        match self.operator {
            Operator::Equals => actual == self.value,
            Operator::NotEquals => actual != self.value,
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.operator {
            Operator::Equals => "=",
            Operator::NotEquals => "!=",
        };
        write!(f, "{}{op}{}", self.key, self.value)
    }
}

/// A conjunction of requirements. The empty selector matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Selector {
    requirements: Vec<Requirement>,
}

impl Selector {
    /// A selector that matches every set.
    #[must_use]
    pub fn everything() -> Self {
        Self::default()
    }

    /// A selector requiring every pair in `set` to be present with that value.
    #[must_use]
    pub fn from_set(set: &BTreeMap<String, String>) -> Self {
        Self {
            requirements: set
                .iter()
                .map(|(k, v)| Requirement::new(k.clone(), Operator::Equals, v.clone()))
                .collect(),
        }
    }

    /// Add a requirement, builder style.
    #[must_use]
    pub fn and(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    /// Returns true if this selector has no requirements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// Returns true if every requirement matches `set`.
    #[must_use]
    pub fn matches(&self, set: &BTreeMap<String, String>) -> bool {
        self.requirements.iter().all(|r| r.matches(set))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, requirement) in self.requirements.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{requirement}")?;
        }
        Ok(())
    }
}

/// Errors from parsing a selector string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// A term has no `=` or `!=` operator.
    #[error("selector term {0:?} has no operator")]
    MissingOperator(String),

    /// A term has an empty key.
    #[error("selector term {0:?} has an empty key")]
    EmptyKey(String),
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut requirements = Vec::new();
        for term in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let (key, operator, value) = if let Some((k, v)) = term.split_once("!=") {
                (k, Operator::NotEquals, v)
            } else if let Some((k, v)) = term.split_once("==") {
                (k, Operator::Equals, v)
            } else if let Some((k, v)) = term.split_once('=') {
                (k, Operator::Equals, v)
            } else {
                return Err(SelectorError::MissingOperator(term.to_string()));
            };

            let key = key.trim();
            if key.is_empty() {
                return Err(SelectorError::EmptyKey(term.to_string()));
            }
            requirements.push(Requirement::new(key, operator, value.trim()));
        }
        Ok(Self { requirements })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn empty_selector_matches_everything() {
        let selector: Selector = "".parse().unwrap();
        assert!(selector.is_empty());
        assert!(selector.matches(&set(&[])));
        assert!(selector.matches(&set(&[("a", "b")])));
    }

    #[test]
    fn equality_and_inequality() {
        let selector: Selector = "env=prod, tier!=cache".parse().unwrap();
        assert!(selector.matches(&set(&[("env", "prod"), ("tier", "web")])));
        assert!(selector.matches(&set(&[("env", "prod")])));
        assert!(!selector.matches(&set(&[("env", "prod"), ("tier", "cache")])));
        assert!(!selector.matches(&set(&[("env", "dev")])));
    }

    #[test]
    fn double_equals_is_accepted() {
        let selector: Selector = "ID==42".parse().unwrap();
        assert!(selector.matches(&set(&[("ID", "42")])));
    }

    #[test]
    fn missing_key_reads_as_empty() {
        let selector: Selector = "owner=".parse().unwrap();
        assert!(selector.matches(&set(&[])));
        assert!(!selector.matches(&set(&[("owner", "ops")])));
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(
            "env".parse::<Selector>(),
            Err(SelectorError::MissingOperator(_))
        ));
        assert!(matches!(
            "=prod".parse::<Selector>(),
            Err(SelectorError::EmptyKey(_))
        ));
    }

    #[test]
    fn display_roundtrips() {
        let selector: Selector = "a=1,b!=2".parse().unwrap();
        assert_eq!(selector.to_string(), "a=1,b!=2");
        assert_eq!(selector.to_string().parse::<Selector>().unwrap(), selector);
    }

    #[test]
    fn from_set_requires_all_pairs() {
        let selector = Selector::from_set(&set(&[("app", "web"), ("env", "prod")]));
        assert!(selector.matches(&set(&[("app", "web"), ("env", "prod"), ("x", "y")])));
        assert!(!selector.matches(&set(&[("app", "web")])));
    }
}
