// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Selection of tests to run.

use regex::Regex;

/// Selection of [`Test`]s to run, by full name and categories.
///
/// A [`Test`] is selected when all of the following hold:
/// - its full name matches the name [`Regex`], if any;
/// - it has at least one of the included categories, if any are included;
/// - it has none of the excluded categories.
///
/// Categories of a [`Test`] include the ones of all its enclosing [`Suite`]s.
///
/// [`Suite`]: super::Suite
/// [`Test`]: super::Test
#[derive(Clone, Debug, Default)]
pub struct Filter {
    /// [`Regex`] to match full test names against.
    pub name: Option<Regex>,

    /// Categories at least one of which is required.
    pub include: Vec<String>,

    /// Categories none of which is allowed.
    pub exclude: Vec<String>,
}

impl Filter {
    /// Creates a new [`Filter`] selecting every test.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts selection to tests whose full name matches `re`.
    #[must_use]
    pub fn with_name(mut self, re: Regex) -> Self {
        self.name = Some(re);
        self
    }

    /// Requires at least one of the given `categories`.
    #[must_use]
    pub fn including<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include.extend(categories.into_iter().map(Into::into));
        self
    }

    /// Rejects tests having any of the given `categories`.
    #[must_use]
    pub fn excluding<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(categories.into_iter().map(Into::into));
        self
    }

    /// Indicates whether this [`Filter`] selects every test.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.include.is_empty() && self.exclude.is_empty()
    }

    /// Checks whether a test with the given `full_name` and effective
    /// `categories` is selected.
    #[must_use]
    pub fn matches<S: AsRef<str>>(&self, full_name: &str, categories: &[S]) -> bool {
        let has = |wanted: &String| categories.iter().any(|c| c.as_ref() == wanted);

        self.name.as_ref().map_or(true, |re| re.is_match(full_name))
            && (self.include.is_empty() || self.include.iter().any(has))
            && !self.exclude.iter().any(has)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_everything_by_default() {
        let filter = Filter::new();

        assert!(filter.is_empty());
        assert!(filter.matches::<&str>("any.test", &[]));
    }

    #[test]
    fn matches_name_regex_against_full_name() {
        let filter =
            Filter::new().with_name(Regex::new(r"^widgets\.render").expect("valid"));

        assert!(filter.matches::<&str>("widgets.renders_label", &[]));
        assert!(!filter.matches::<&str>("layout.widgets.renders", &[]));
    }

    #[test]
    fn applies_categories() {
        let filter = Filter::new().including(["gui"]).excluding(["slow"]);

        assert!(filter.matches("t", &["gui"]));
        assert!(!filter.matches("t", &["gui", "slow"]));
        assert!(!filter.matches("t", &["net"]));
        assert!(!filter.matches::<&str>("t", &[]));
    }
}
