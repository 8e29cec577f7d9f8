//! Two-step confirmation for destructive actions.
//!
//! `propose_*` on a service hands back a [`Confirmation`]; the destructive
//! call only accepts that value, so it cannot run without the proposal step.

use std::fmt;

/// A proposed destructive action awaiting the user's go-ahead.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a confirmation does nothing until it is passed to the confirming call"]
pub struct Confirmation<T> {
    target: T,
    title: &'static str,
    prompt: &'static str,
}

impl<T> Confirmation<T> {
    pub(crate) fn new(target: T, title: &'static str, prompt: &'static str) -> Self {
        Self {
            target,
            title,
            prompt,
        }
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn title(&self) -> &'static str {
        self.title
    }

    /// Question to put to the user.
    pub fn prompt(&self) -> &'static str {
        self.prompt
    }

    pub(crate) fn into_target(self) -> T {
        self.target
    }
}

impl<T> fmt::Display for Confirmation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.prompt)
    }
}
