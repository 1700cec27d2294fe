//! pkgdocs - package documentation browser
//!
//! Loads a package/type documentation index once and serves navigable views
//! (front page, package page, type page) over it.

pub mod controllers;
pub mod docs;
pub mod error;
pub mod routes;

// Re-export commonly used types
pub use controllers::{FrontView, PackageView, TypeView, View};
pub use docs::{IndexLoader, PackageEntry, PackageIndex, TypeEntry};
pub use error::{IndexLoadError, NavigationError, RouteError};
pub use routes::{Navigation, RouteParams, RouteTable, Router};
