//! Token Lookup
//!
//! Where a request may carry its session token. Sources are tried in the
//! configured order and the first one that yields a token wins.
//!
//! The lookup is configured with a comma separated list of `kind: name`
//! pairs, for example `header: Authorization, query: token, cookie: jwt`.

use crate::error::AuthError;

use axum::extract::Query;
use axum::http::{header, HeaderMap, Uri};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Default lookup order
pub const DEFAULT_TOKEN_LOOKUP: &str = "header: Authorization, query: token, cookie: jwt";

/// Default prefix expected in front of header tokens
pub const DEFAULT_TOKEN_HEAD_NAME: &str = "Bearer";

/// A single place a token can be read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    Header(String),
    Query(String),
    Cookie(String),
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenSource::Header(name) => write!(f, "header: {}", name),
            TokenSource::Query(name) => write!(f, "query: {}", name),
            TokenSource::Cookie(name) => write!(f, "cookie: {}", name),
        }
    }
}

/// Ordered list of token sources plus the expected header prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenLookup {
    sources: Vec<TokenSource>,
    head_name: String,
}

impl TokenLookup {
    pub fn new(sources: Vec<TokenSource>, head_name: impl Into<String>) -> Self {
        Self {
            sources,
            head_name: head_name.into(),
        }
    }

    pub fn with_head_name(mut self, head_name: impl Into<String>) -> Self {
        self.head_name = head_name.into();
        self
    }

    pub fn sources(&self) -> &[TokenSource] {
        &self.sources
    }

    pub fn head_name(&self) -> &str {
        &self.head_name
    }

    /// Extract the raw token from request headers and URI
    pub fn extract(&self, headers: &HeaderMap, uri: &Uri) -> Result<String, AuthError> {
        self.sources
            .iter()
            .find_map(|source| match source {
                TokenSource::Header(name) => self.header_token(headers, name),
                TokenSource::Query(name) => query_token(uri, name),
                TokenSource::Cookie(name) => cookie_token(headers, name),
            })
            .ok_or(AuthError::MissingToken)
    }

    fn header_token(&self, headers: &HeaderMap, name: &str) -> Option<String> {
        let value = headers.get(name)?.to_str().ok()?;
        let (head, token) = value.split_once(' ')?;
        if head != self.head_name {
            return None;
        }
        non_empty(token.trim())
    }
}

impl fmt::Display for TokenLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, source) in self.sources.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", source)?;
        }
        Ok(())
    }
}

impl Default for TokenLookup {
    fn default() -> Self {
        Self {
            sources: vec![
                TokenSource::Header("Authorization".to_string()),
                TokenSource::Query("token".to_string()),
                TokenSource::Cookie("jwt".to_string()),
            ],
            head_name: DEFAULT_TOKEN_HEAD_NAME.to_string(),
        }
    }
}

impl FromStr for TokenLookup {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut sources = Vec::new();

        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (kind, name) = entry.split_once(':').ok_or_else(|| {
                AuthError::Config(format!("TOKEN_LOOKUP entry `{}` is not `kind: name`", entry))
            })?;

            let name = name.trim();
            if name.is_empty() {
                return Err(AuthError::Config(format!(
                    "TOKEN_LOOKUP entry `{}` has an empty name",
                    entry
                )));
            }

            let source = match kind.trim() {
                "header" => TokenSource::Header(name.to_string()),
                "query" => TokenSource::Query(name.to_string()),
                "cookie" => TokenSource::Cookie(name.to_string()),
                other => {
                    return Err(AuthError::Config(format!(
                        "TOKEN_LOOKUP source `{}` must be header, query or cookie",
                        other
                    )))
                }
            };
            sources.push(source);
        }

        if sources.is_empty() {
            return Err(AuthError::Config("TOKEN_LOOKUP is empty".to_string()));
        }

        Ok(Self {
            sources,
            head_name: DEFAULT_TOKEN_HEAD_NAME.to_string(),
        })
    }
}

fn query_token(uri: &Uri, name: &str) -> Option<String> {
    let Query(params) = Query::<HashMap<String, String>>::try_from_uri(uri).ok()?;
    params.get(name).and_then(|v| non_empty(v.trim()))
}

fn cookie_token(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .and_then(|(_, value)| non_empty(value.trim_matches('"')))
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
