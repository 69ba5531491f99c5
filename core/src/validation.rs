//! Field-level validation for request payloads.
//!
//! Payloads implement [`Validate`]; a failing payload yields a
//! [`ValidationError`] whose `Display` form is the exact body returned with
//! a `400 Bad Request`: every message, sorted, de-duplicated and joined by a
//! payload-specific separator.

use std::collections::BTreeSet;
use std::fmt;

/// A payload that can check its own field constraints.
pub trait Validate {
    /// Check every field constraint.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] carrying one message per violated
    /// constraint.
    fn validate(&self) -> Result<(), ValidationError>;
}

/// One or more field constraints failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    messages: BTreeSet<String>,
    separator: &'static str,
}

impl ValidationError {
    /// Build an error from the collected messages.
    #[must_use]
    pub fn new<I>(messages: I, separator: &'static str) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            messages: messages.into_iter().collect(),
            separator,
        }
    }

    /// `Ok(())` when `messages` is empty, otherwise the joined error.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when at least one message was collected.
    pub fn check(messages: Vec<String>, separator: &'static str) -> Result<(), Self> {
        if messages.is_empty() {
            Ok(())
        } else {
            Err(Self::new(messages, separator))
        }
    }

    /// Messages in sorted order.
    #[must_use]
    pub fn messages(&self) -> Vec<&str> {
        self.messages.iter().map(String::as_str).collect()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .messages
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(self.separator);
        f.write_str(&joined)
    }
}

impl std::error::Error for ValidationError {}
