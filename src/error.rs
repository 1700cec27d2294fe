//! Error types shared by the loader, the route table and the router.

use thiserror::Error;

/// Failure to obtain the package index.
///
/// Cloneable because one failed fetch is reported to every waiter that was
/// sharing it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexLoadError {
    /// The transport failed before a response body was read.
    #[error("failed to fetch package index from {location}: {message}")]
    Fetch { location: String, message: String },

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {location}")]
    Status { location: String, status: u16 },

    /// The body looked gzip-compressed but could not be inflated.
    #[error("failed to decompress package index: {0}")]
    Decompress(String),

    /// The body was not a valid package index document.
    #[error("package index is not valid JSON: {0}")]
    Parse(String),
}

/// A route pattern that cannot be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("invalid parameter name ':{name}' in route pattern '{pattern}'")]
    InvalidParam { pattern: String, name: String },

    #[error("invalid route pattern '{pattern}': {message}")]
    Invalid { pattern: String, message: String },

    #[error("parameter ':{name}' appears more than once in route pattern '{pattern}'")]
    DuplicateParam { pattern: String, name: String },
}

/// Navigation could not produce a view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    /// The route needed the package index and loading it failed.
    #[error("could not load the package index: {0}")]
    IndexLoadFailed(#[from] IndexLoadError),

    #[error("too many redirects while navigating from '{0}'")]
    RedirectLoop(String),

    /// No route matched and no catch-all redirect is configured.
    #[error("no route matches '{0}'")]
    NoRoute(String),
}
