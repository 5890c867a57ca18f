//! Route table and route entries.
//!
//! # Responsibilities
//! - Store route entries in registration order
//! - Look up the first entry whose prefix matches a request path
//! - Validate backend URLs when an entry is built
//!
//! # Design Decisions
//! - Registration order is match priority. A table holding `/api` then
//!   `/api/v1` sends `/api/v1/x` to `/api`: entries are not ranked by
//!   specificity, so register narrower prefixes first.
//! - Prefixes are compared with `str::starts_with`, with no path-segment
//!   awareness (`/api` matches `/apiary`).
//! - O(n) scan (route counts are small and static)
//! - Built before serving; the `Dispatcher` owns it and only reads it afterwards

use std::fmt;

use url::Url;

use crate::config::RouteConfig;
use crate::routing::rewrite::RewriteRule;

/// Error raised while building a route entry.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("route prefix must not be empty")]
    EmptyPrefix,

    #[error("invalid backend URL {url:?}: {source}")]
    InvalidBackendUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("backend URL {url:?} uses unsupported scheme {scheme:?} (expected http or https)")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("backend URL {url:?} has no host")]
    MissingHost { url: String },

    #[error("backend URL {url:?} must not carry a query or fragment")]
    UnexpectedSuffix { url: String },
}

/// Validated backend base URL.
///
/// The configured string is kept as written so the outbound path is appended
/// verbatim (`http://host:5001` + `/core` gives `http://host:5001/core`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendUrl(String);

impl BackendUrl {
    pub fn parse(raw: &str) -> Result<Self, RouteError> {
        let url = Url::parse(raw).map_err(|source| RouteError::InvalidBackendUrl {
            url: raw.to_string(),
            source,
        })?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(RouteError::UnsupportedScheme {
                    url: raw.to_string(),
                    scheme: other.to_string(),
                })
            }
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(RouteError::MissingHost { url: raw.to_string() });
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(RouteError::UnexpectedSuffix { url: raw.to_string() });
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Full target URL for an outbound path and optional query.
    pub fn join(&self, path: &str, query: Option<&str>) -> String {
        match query {
            Some(query) => format!("{}{}?{}", self.0, path, query),
            None => format!("{}{}", self.0, path),
        }
    }
}

impl fmt::Display for BackendUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A path-prefix to backend mapping. Immutable once built.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    name: String,
    match_prefix: String,
    backend: BackendUrl,
    rewrite: Option<RewriteRule>,
}

impl RouteEntry {
    pub fn new(match_prefix: impl Into<String>, backend: &str) -> Result<Self, RouteError> {
        let match_prefix = match_prefix.into();
        if match_prefix.is_empty() {
            return Err(RouteError::EmptyPrefix);
        }
        let backend = BackendUrl::parse(backend)?;

        Ok(Self {
            name: match_prefix.clone(),
            match_prefix,
            backend,
            rewrite: None,
        })
    }

    pub fn with_rewrite(mut self, rule: RewriteRule) -> Self {
        self.rewrite = Some(rule);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn match_prefix(&self) -> &str {
        &self.match_prefix
    }

    pub fn backend(&self) -> &BackendUrl {
        &self.backend
    }

    pub fn rewrite(&self) -> Option<&RewriteRule> {
        self.rewrite.as_ref()
    }

    /// Literal prefix comparison against the request path.
    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.match_prefix)
    }
}

impl TryFrom<&RouteConfig> for RouteEntry {
    type Error = RouteError;

    fn try_from(config: &RouteConfig) -> Result<Self, Self::Error> {
        let mut entry = RouteEntry::new(config.path_prefix.clone(), &config.backend)?;
        if let Some(name) = &config.name {
            entry = entry.with_name(name.clone());
        }
        if let Some(rewrite) = &config.rewrite {
            entry = entry.with_rewrite(RewriteRule::new(rewrite.prefix.clone(), rewrite.replacement.clone()));
        }
        Ok(entry)
    }
}

/// Ordered route table. First registered match wins.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from route configs, keeping their order.
    pub fn from_config(routes: &[RouteConfig]) -> Result<Self, RouteError> {
        let mut table = Self::new();
        for route in routes {
            table.add(RouteEntry::try_from(route)?);
        }
        Ok(table)
    }

    /// Append an entry. Duplicate and shadowed prefixes are accepted.
    pub fn add(&mut self, entry: RouteEntry) {
        tracing::debug!(
            route = %entry.name,
            prefix = %entry.match_prefix,
            backend = %entry.backend,
            priority = self.entries.len(),
            "Route registered"
        );
        self.entries.push(entry);
    }

    /// First entry, in registration order, whose prefix starts `path`.
    pub fn find_match(&self, path: &str) -> Option<&RouteEntry> {
        self.entries.iter().find(|entry| entry.matches(path))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteEntry> {
        self.entries.iter()
    }
}
