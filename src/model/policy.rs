//! Field selection policies.
//!
//! A [`SelectionPolicy`] decides which declared fields of a type participate
//! in binding, and scopes registry overrides to subsets of fields.

use crate::{Error, Result};
use regex::Regex;

/// Inclusion/exclusion policy applied to declared field names.
///
/// Precedence is strict and mutually exclusive: a non-empty use-list governs
/// alone; otherwise a non-empty omit-list; otherwise a use-pattern; otherwise
/// an omit-pattern; otherwise every candidate field is selected.
///
/// Patterns match the whole field name, not a substring.
#[derive(Debug, Clone, Default)]
pub struct SelectionPolicy {
    use_names: Vec<String>,
    omit_names: Vec<String>,
    use_pattern: Option<Regex>,
    omit_pattern: Option<Regex>,
}

impl SelectionPolicy {
    /// Creates a pass-all policy.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Sets the explicit allow-list.
    #[must_use]
    pub fn with_use<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.use_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the explicit deny-list.
    #[must_use]
    pub fn with_omit<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.omit_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the allow-pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern does not compile.
    pub fn with_use_pattern(mut self, pattern: &str) -> Result<Self> {
        self.use_pattern = Some(compile_anchored(pattern)?);
        Ok(self)
    }

    /// Sets the deny-pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern does not compile.
    pub fn with_omit_pattern(mut self, pattern: &str) -> Result<Self> {
        self.omit_pattern = Some(compile_anchored(pattern)?);
        Ok(self)
    }

    /// Returns whether this policy selects the given field name.
    #[must_use]
    pub fn selects(&self, name: &str) -> bool {
        if !self.use_names.is_empty() {
            return self.use_names.iter().any(|n| n == name);
        }
        if !self.omit_names.is_empty() {
            return !self.omit_names.iter().any(|n| n == name);
        }
        if let Some(pattern) = &self.use_pattern {
            return pattern.is_match(name);
        }
        if let Some(pattern) = &self.omit_pattern {
            return !pattern.is_match(name);
        }
        true
    }
}

fn compile_anchored(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|e| Error::OperationFailed {
        operation: "compile_selection_pattern",
        cause: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_policy_selects_everything() {
        let policy = SelectionPolicy::all();
        assert!(policy.selects("a"));
        assert!(policy.selects("anything"));
    }

    #[test]
    fn use_list_wins_over_all_other_inputs() {
        let policy = SelectionPolicy::all()
            .with_use(["a"])
            .with_omit(["a", "b"])
            .with_use_pattern("b.*")
            .and_then(|p| p.with_omit_pattern("a.*"))
            .unwrap();
        assert!(policy.selects("a"));
        assert!(!policy.selects("b"));
        assert!(!policy.selects("banana"));
    }

    #[test]
    fn omit_list_governs_when_use_list_empty() {
        let policy = SelectionPolicy::all()
            .with_omit(["b"])
            .with_use_pattern("b.*")
            .unwrap();
        assert!(policy.selects("a"));
        assert!(!policy.selects("b"));
        // use-pattern is ignored while the omit-list is populated
        assert!(policy.selects("c"));
    }

    #[test]
    fn use_pattern_governs_when_lists_empty() {
        let policy = SelectionPolicy::all()
            .with_use_pattern("f_.*")
            .and_then(|p| p.with_omit_pattern("f_a"))
            .unwrap();
        assert!(policy.selects("f_a"));
        assert!(policy.selects("f_b"));
        assert!(!policy.selects("g_a"));
    }

    #[test]
    fn omit_pattern_is_the_last_resort() {
        let policy = SelectionPolicy::all().with_omit_pattern("tmp_.*").unwrap();
        assert!(!policy.selects("tmp_x"));
        assert!(policy.selects("x"));
    }

    #[test]
    fn patterns_match_the_whole_name() {
        let policy = SelectionPolicy::all().with_use_pattern("ab").unwrap();
        assert!(policy.selects("ab"));
        assert!(!policy.selects("abc"));
        assert!(!policy.selects("xab"));
    }
}
