// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration diagnostics.
//!
//! Figment errors are turned into [`ConfigError`] values that miette can
//! render with a pointer into `cadence.toml`. Unknown keys get a
//! "did you mean" hint ranked by Jaro-Winkler similarity.

#![allow(unused_assignments)] // false positive from the miette derive

use figment::error::Kind;
use miette::{Diagnostic, GraphicalReportHandler, NamedSource, SourceSpan};
use thiserror::Error;

/// Below this similarity an unknown key gets no suggestion.
const MIN_SIMILARITY: f64 = 0.75;

/// A configuration problem found while loading or validating.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(cadence::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Closest valid key, when one is similar enough.
        suggestion: Option<String>,
        /// Comma-separated keys accepted in the same table.
        valid_keys: String,
        #[label("not a cadence setting")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: found {found}")]
    #[diagnostic(code(cadence::config::invalid_value), help("use {expected}"))]
    InvalidValue {
        /// Dotted path such as `pool.max_concurrent`.
        key: String,
        found: String,
        expected: String,
        #[label("expected {expected}")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value that parsed but is out of range or inconsistent.
    #[error("validation error: {message}")]
    #[diagnostic(code(cadence::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(cadence::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(key) => format!("did you mean `{key}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Loaded TOML text, keyed by the path it was read from.
struct Sources<'a>(&'a [(String, String)]);

impl Sources<'_> {
    /// The source an error came from. With a single source (inline strings,
    /// explicit files) that source is used even without file metadata.
    fn for_error(&self, error: &figment::Error) -> Option<&(String, String)> {
        let origin = error
            .metadata
            .as_ref()
            .and_then(|meta| meta.source.as_ref())
            .and_then(|source| match source {
                figment::Source::File(path) => Some(path.display().to_string()),
                _ => None,
            });
        match origin {
            Some(path) => self.0.iter().find(|(name, _)| *name == path),
            None if self.0.len() == 1 => self.0.first(),
            None => None,
        }
    }

    /// Span of `key` inside `table` and the source to show it in.
    fn locate(
        &self,
        error: &figment::Error,
        table: &[String],
        key: &str,
    ) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
        let Some((name, text)) = self.for_error(error) else {
            return (None, None);
        };
        match key_offset(text, table, key) {
            Some(offset) => (
                Some(SourceSpan::new(offset.into(), key.len())),
                Some(NamedSource::new(name, text.clone())),
            ),
            None => (None, None),
        }
    }
}

/// Translate every error carried by `err` into a [`ConfigError`].
///
/// `toml_sources` holds `(path, content)` pairs used to point at the
/// offending line.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    let sources = Sources(toml_sources);
    err.into_iter()
        .map(|error| {
            let path: Vec<String> = error.path.clone();
            match &error.kind {
                Kind::UnknownField(key, expected) => {
                    let (span, src) = sources.locate(&error, &path, key);
                    ConfigError::UnknownKey {
                        key: key.clone(),
                        suggestion: suggest_key(key, expected),
                        valid_keys: expected.join(", "),
                        span,
                        src,
                    }
                }
                Kind::InvalidType(found, expected) => {
                    let (table, key) = match path.split_last() {
                        Some((key, table)) => (table, key.as_str()),
                        None => (&path[..], ""),
                    };
                    let (span, src) = if key.is_empty() {
                        (None, None)
                    } else {
                        sources.locate(&error, table, key)
                    };
                    ConfigError::InvalidValue {
                        key: path.join("."),
                        found: found.to_string(),
                        expected: expected.to_string(),
                        span,
                        src,
                    }
                }
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

/// Byte offset of `key` as written inside `[table]` (or before any table
/// header when `table` is empty). Keys in other tables are ignored.
pub fn key_offset(content: &str, table: &[String], key: &str) -> Option<usize> {
    let wanted = table.join(".");
    let mut current = String::new();
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        let trimmed = line.trim_start();

        if let Some(header) = trimmed.strip_prefix('[') {
            current = header
                .split(']')
                .next()
                .unwrap_or_default()
                .trim()
                .to_string();
            continue;
        }
        if current != wanted {
            continue;
        }
        let Some(rest) = trimmed.strip_prefix(key) else {
            continue;
        };
        if rest.trim_start().starts_with('=') {
            return Some(start + (line.len() - trimmed.len()));
        }
    }
    None
}

/// The valid key most similar to `unknown`, if any is close enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > MIN_SIMILARITY)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Render `errors` with miette's graphical report handler.
pub fn render_to_string(errors: &[ConfigError]) -> String {
    let handler = GraphicalReportHandler::new();
    errors
        .iter()
        .map(|error| {
            let mut report = String::new();
            match handler.render_report(&mut report, error as &dyn Diagnostic) {
                Ok(()) => report,
                Err(_) => format!("Error: {error}\n"),
            }
        })
        .collect()
}

/// Print `errors` to stderr.
pub fn render_errors(errors: &[ConfigError]) {
    eprint!("{}", render_to_string(errors));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str) -> Vec<String> {
        vec![name.to_string()]
    }

    #[test]
    fn typos_get_the_closest_key() {
        let player = &["log_level", "max_retries", "retry_backoff_ms"];
        assert_eq!(suggest_key("max_retires", player).as_deref(), Some("max_retries"));
        assert_eq!(
            suggest_key("ttl_sec", &["max_size", "ttl_secs"]).as_deref(),
            Some("ttl_secs")
        );
        assert_eq!(suggest_key("zzzzzz", &["max_size", "ttl_secs"]), None);
    }

    #[test]
    fn key_is_found_only_in_its_own_table() {
        let content = "[cache]\nmax_size = 10\n\n[player]\n  max_retires = 3\n";
        let offset = key_offset(content, &table("player"), "max_retires").unwrap();
        assert_eq!(&content[offset..offset + 11], "max_retires");

        assert_eq!(key_offset(content, &table("player"), "max_size"), None);
        assert_eq!(key_offset(content, &table("pool"), "max_size"), None);
    }

    #[test]
    fn key_prefix_does_not_match_a_longer_key() {
        let content = "[cache]\nttl_secs = 5\nttl_sec = 1\n";
        let offset = key_offset(content, &table("cache"), "ttl_sec").unwrap();
        assert_eq!(offset, content.find("ttl_sec =").unwrap());
    }

    #[test]
    fn unknown_key_in_inline_toml_points_at_the_line() {
        let toml = "[player]\nmax_retires = 3\n";
        let err = crate::loader::load_config_from_str(toml).unwrap_err();
        let sources = vec![("<inline>".to_string(), toml.to_string())];
        let errors = figment_to_config_errors(err, &sources);

        let span = errors.iter().find_map(|e| match e {
            ConfigError::UnknownKey { span, .. } => *span,
            _ => None,
        });
        assert_eq!(span.map(|s| s.offset()), Some(toml.find("max_retires").unwrap()));
        assert!(render_to_string(&errors).contains("max_retires"));
    }

    #[test]
    fn validation_errors_render_their_message() {
        let errors = vec![ConfigError::Validation {
            message: "pool.max_concurrent must be greater than 0".to_string(),
        }];
        assert!(render_to_string(&errors).contains("pool.max_concurrent"));
    }
}
