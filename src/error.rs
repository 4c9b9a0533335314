//! Translation error types.
//!
//! This allows proper error propagation using `?` for the two failure
//! kinds the translator can surface: malformed input and constructs the
//! translator does not (yet) know how to lower.

/// Error produced by any stage of the translation pipeline.
///
/// Mirrors the two non-recoverable error kinds in the error-handling
/// design: `MalformedInput` (missing `setup()`/`loop()`, unbalanced
/// braces, a `for` header that doesn't parse) and `UnsupportedConstruct`
/// (`switch`, nested function definitions, statements that are neither
/// a recognised declaration nor a terminated statement).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    /// Input could not be parsed into the expected shape. Carries the
    /// offending slice (or a description of what was expected).
    MalformedInput(String),
    /// A construct was recognised but is not supported by this translator.
    UnsupportedConstruct(String),
}

impl std::fmt::Display for TranslateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranslateError::MalformedInput(s) => write!(f, "malformed input: {}", s),
            TranslateError::UnsupportedConstruct(s) => write!(f, "unsupported construct: {}", s),
        }
    }
}

impl std::error::Error for TranslateError {}

impl From<String> for TranslateError {
    fn from(s: String) -> Self {
        TranslateError::MalformedInput(s)
    }
}

impl From<&str> for TranslateError {
    fn from(s: &str) -> Self {
        TranslateError::MalformedInput(s.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TranslateError>;
