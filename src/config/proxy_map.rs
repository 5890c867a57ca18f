//! Compact route list parsing.
//!
//! Format: `prefix|target,prefix|target,...`. Entries keep their order, so
//! the first entry has the highest match priority.

use crate::config::schema::RouteConfig;

/// Error for a malformed compact route list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProxyMapError {
    #[error("proxy map is empty")]
    Empty,

    #[error("proxy map entry #{index} {entry:?} is not of the form `prefix|target`")]
    Malformed { index: usize, entry: String },

    #[error("proxy map entry #{index} has an empty {part}")]
    EmptyPart { index: usize, part: &'static str },
}

/// Parse a compact route list into route configs.
///
/// Backend URLs are not checked here; route construction validates them.
pub fn parse_proxy_map(raw: &str) -> Result<Vec<RouteConfig>, ProxyMapError> {
    if raw.trim().is_empty() {
        return Err(ProxyMapError::Empty);
    }

    raw.split(',')
        .enumerate()
        .map(|(index, entry)| {
            let parts: Vec<&str> = entry.split('|').map(str::trim).collect();
            match parts.as_slice() {
                [prefix, _] if prefix.is_empty() => Err(ProxyMapError::EmptyPart { index, part: "prefix" }),
                [_, target] if target.is_empty() => Err(ProxyMapError::EmptyPart { index, part: "target" }),
                [prefix, target] => Ok(RouteConfig::new(*prefix, *target)),
                _ => Err(ProxyMapError::Malformed {
                    index,
                    entry: entry.to_string(),
                }),
            }
        })
        .collect()
}
