//! Scoped collection of validation errors
//!
//! Loading a config runs many independent checks. Instead of stopping at the
//! first failure, each check records its message in an [`ErrorCollector`] and
//! loading carries on with sibling entries, so a single run reports every
//! problem at once.
//!
//! Scopes nest: [`ErrorCollector::scope`] hands a fresh child collector to a
//! closure and, once the closure returns, merges the child's lines into the
//! parent with the scope label prepended. A nested [`Error::Config`] returned
//! from the closure is unwrapped the same way, so the final report carries the
//! full label path of every line (`hook: before-all command: ...`).
//!
//! In fail-fast mode (chosen when the terminal shows debug logs) a
//! non-aggregate error escapes the scope immediately instead of being
//! recorded.

use lohup_core::{AggregateError, Error, Result};

/// Accumulator for validation failures within one scope
#[derive(Debug, Default)]
pub struct ErrorCollector {
    fail_fast: bool,
    lines: Vec<String>,
}

impl ErrorCollector {
    /// Create a root collector
    pub fn new(fail_fast: bool) -> Self {
        Self {
            fail_fast,
            lines: Vec::new(),
        }
    }

    /// Record a validation failure
    pub fn error(&mut self, message: impl Into<String>) {
        self.lines.push(message.into());
    }

    /// True when nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines recorded so far
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Run `f` inside a child scope labelled `label`
    ///
    /// Returns `Ok(Some(value))` only when `f` succeeded and recorded nothing.
    /// Anything the child recorded, or the error `f` returned, is merged into
    /// this collector with `label` prepended to each line and `Ok(None)` is
    /// returned. The only `Err` is a non-aggregate error in fail-fast mode.
    pub fn scope<T, F>(&mut self, label: &str, f: F) -> Result<Option<T>>
    where
        F: FnOnce(&mut ErrorCollector) -> Result<T>,
    {
        let mut child = ErrorCollector::new(self.fail_fast);

        let value = match f(&mut child) {
            Ok(value) => Some(value),
            Err(Error::Config(report)) => {
                child.lines.extend(report.into_lines());
                None
            }
            Err(err) if self.fail_fast => return Err(err),
            Err(err) => {
                child.error(err.to_string());
                None
            }
        };

        if child.is_empty() {
            return Ok(value);
        }

        self.lines.extend(
            child
                .lines
                .into_iter()
                .map(|line| prefixed(label, &line)),
        );
        Ok(None)
    }

    /// Close the scope, turning any recorded lines into one error
    pub fn finish(self) -> Result<()> {
        if self.lines.is_empty() {
            Ok(())
        } else {
            Err(self.into_error())
        }
    }

    /// Abort the scope, reporting whatever was recorded so far
    pub fn into_error(self) -> Error {
        Error::Config(AggregateError::new(self.lines))
    }
}

fn prefixed(label: &str, line: &str) -> String {
    if label.is_empty() {
        line.to_string()
    } else {
        format!("{label} {line}")
    }
}
