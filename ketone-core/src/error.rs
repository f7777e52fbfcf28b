use std::fmt::{self, Write};

use serde::de::{Expected, Unexpected};

/// Error type for decoding operations.
///
/// Failures inside nested values are wrapped with the object key (or array
/// index) they occurred under, so the outermost error carries the full path
/// to the offending value.
///
/// Members buffered by `#[serde(flatten)]` are decoded by serde itself and
/// carry no key context.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input is not well-formed JSON, or reading it failed.
    #[error("malformed JSON: {0}")]
    Syntax(#[from] serde_json::Error),
    /// A value has the wrong JSON type for its target.
    #[error("invalid type: expected {expected}, found {found}")]
    ShapeMismatch { expected: String, found: String },
    /// The value under `key` could not be decoded.
    #[error("key `{key}`: {source}")]
    ValueDecodeFailure { key: String, source: Box<Error> },
    /// The array element at `index` could not be decoded.
    #[error("index {index}: {source}")]
    ElementDecodeFailure { index: usize, source: Box<Error> },
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("{0}")]
    Message(String),
}

impl Error {
    pub(crate) fn at_key(key: &str, source: Error) -> Self {
        Error::ValueDecodeFailure {
            key: key.to_string(),
            source: Box::new(source),
        }
    }

    pub(crate) fn at_index(index: usize, source: Error) -> Self {
        Error::ElementDecodeFailure {
            index,
            source: Box::new(source),
        }
    }

    /// Returns the outermost object key this error is attributed to, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Error::ValueDecodeFailure { key, .. } => Some(key.as_str()),
            _ => None,
        }
    }

    /// Renders the location of the failure, e.g. `messages.one.m1.name` or
    /// `tags[2]`. Empty when the failure is at the document root.
    pub fn path(&self) -> String {
        let mut path = String::new();
        let mut current = self;
        loop {
            match current {
                Error::ValueDecodeFailure { key, source } => {
                    if !path.is_empty() {
                        path.push('.');
                    }
                    path.push_str(key);
                    current = &**source;
                }
                Error::ElementDecodeFailure { index, source } => {
                    let _ = write!(path, "[{index}]");
                    current = &**source;
                }
                _ => return path,
            }
        }
    }

    /// Returns the innermost error, with all key and index context removed.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::ValueDecodeFailure { source, .. }
            | Error::ElementDecodeFailure { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }

    fn invalid_type(unexp: Unexpected, exp: &dyn Expected) -> Self {
        Error::ShapeMismatch {
            expected: exp.to_string(),
            found: unexp.to_string(),
        }
    }

    fn missing_field(field: &'static str) -> Self {
        Error::MissingField(field)
    }
}
