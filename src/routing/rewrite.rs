//! Outbound path rewriting.

use std::borrow::Cow;

/// Replace a leading path prefix before forwarding.
///
/// Only an occurrence anchored at the start of the path is replaced. The
/// prefix is a literal string, not a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRule {
    prefix: String,
    replacement: String,
}

impl RewriteRule {
    pub fn new(prefix: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            replacement: replacement.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    pub fn apply<'a>(&self, path: &'a str) -> Cow<'a, str> {
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => Cow::Owned(format!("{}{}", self.replacement, rest)),
            None => Cow::Borrowed(path),
        }
    }
}

/// Outbound path for a request path and the matched route's rule.
pub fn outbound_path<'a>(path: &'a str, rule: Option<&RewriteRule>) -> Cow<'a, str> {
    match rule {
        Some(rule) => {
            let rewritten = rule.apply(path);
            if rewritten != path {
                tracing::debug!(from = %path, to = %rewritten, "Path rewritten");
            }
            rewritten
        }
        None => Cow::Borrowed(path),
    }
}
