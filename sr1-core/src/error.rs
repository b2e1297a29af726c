use std::fmt;

use sr1_types::mutate::IndexOutOfRange;

/// Errors surfaced to callers.
///
/// Malformed store data and failing listeners never show up here: both are
/// recovered where they happen and logged.
#[derive(Debug)]
pub enum Error {
    /// A call with an argument of the wrong shape, e.g. `update` with a
    /// non-object value.
    InvalidArgument(String),
    /// An accessor that exists only as a placeholder.
    Unimplemented(&'static str),
    /// An href that cannot be resolved against the current location.
    InvalidUrl {
        href: String,
        source: url::ParseError,
    },
    /// A route pattern that does not compile.
    InvalidPattern { pattern: String, message: String },
    Config(toml::de::Error),
    Io(std::io::Error),
    Json(serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Self::Config(e)
    }
}

impl From<IndexOutOfRange> for Error {
    fn from(e: IndexOutOfRange) -> Self {
        Self::InvalidArgument(e.to_string())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            Self::Unimplemented(what) => write!(f, "{} not yet implemented", what),
            Self::InvalidUrl { href, source } => write!(f, "invalid url '{}': {}", href, source),
            Self::InvalidPattern { pattern, message } => {
                write!(f, "invalid route pattern '{}': {}", pattern, message)
            }
            Self::Config(e) => write!(f, "config error: {}", e),
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidUrl { source, .. } => Some(source),
            Self::Config(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}
