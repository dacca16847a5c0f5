//! `$NAME` substitution for config string fields
//!
//! Values come from the flat global table in `[settings.globals]` plus the
//! computed `BDIR` and `BUILDDIR` entries, optionally overridden per call.
//! Substitution is single-pass: a substituted value is never scanned again.

use indexmap::IndexMap;
use lohup_core::{Error, Result};
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// Flat variable table
pub type Variables = IndexMap<String, String>;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\w+)").expect("token pattern is valid"));

/// Variable expander shared by every entity built during a load
#[derive(Debug, Clone, Default)]
pub struct Expander {
    globals: Variables,
}

impl Expander {
    /// Create an expander over a global table
    pub fn new(globals: Variables) -> Self {
        Self { globals }
    }

    /// The global table
    pub fn globals(&self) -> &Variables {
        &self.globals
    }

    /// Expand `text` using the global table only
    pub fn expand<'a>(&self, text: &'a str) -> Result<Cow<'a, str>> {
        self.expand_with(text, None)
    }

    /// Expand `text`, letting `extras` extend and override the globals
    ///
    /// Text without `$` is returned untouched. Every `$NAME` token must
    /// resolve, otherwise [`Error::UndefinedVariable`] names the token. Text
    /// containing `$` but no token at all is rejected as
    /// [`Error::MalformedReference`].
    pub fn expand_with<'a>(
        &self,
        text: &'a str,
        extras: Option<&Variables>,
    ) -> Result<Cow<'a, str>> {
        if !text.contains('$') {
            return Ok(Cow::Borrowed(text));
        }

        let lookup = |name: &str| {
            extras
                .and_then(|vars| vars.get(name))
                .or_else(|| self.globals.get(name))
        };

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        let mut matched = false;

        for caps in TOKEN.captures_iter(text) {
            let (Some(token), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            matched = true;

            let value = lookup(name.as_str()).ok_or_else(|| Error::UndefinedVariable {
                token: token.as_str().to_string(),
            })?;

            out.push_str(&text[last..token.start()]);
            out.push_str(value);
            last = token.end();
        }

        if !matched {
            return Err(Error::MalformedReference {
                text: text.to_string(),
            });
        }

        out.push_str(&text[last..]);
        Ok(Cow::Owned(out))
    }

    /// Expand an optional field, keeping `None` as `None`
    pub fn expand_opt(&self, text: Option<&str>) -> Result<Option<String>> {
        text.map(|t| self.expand(t).map(Cow::into_owned)).transpose()
    }
}
