//! Package documentation index
//!
//! This module owns the documentation data: the index types, the sources the
//! index document can be fetched from, and the loader that fetches it once and
//! shares the result with every view that needs it.
//!
//! # Usage
//!
//! ```no_run
//! use pkgdocs::docs::{IndexLoader, source_for};
//! use std::time::Duration;
//!
//! # async fn demo() -> Result<(), pkgdocs::IndexLoadError> {
//! let source = source_for("http://localhost:8080/resources/shortcuts.json", Duration::from_secs(30))?;
//! let loader = IndexLoader::new(source);
//!
//! // Fetches on the first call, served from memory afterwards
//! let index = loader.load().await?;
//! if let Some(pkg) = index.package("groovyx.gaelyk") {
//!     for (key, _) in pkg.types() {
//!         println!("{}", key);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod loader;
mod source;
mod types;

pub use loader::{IndexFuture, IndexLoader, LoadResult, LoadStatus};
pub use source::{DEFAULT_INDEX_PATH, FileSource, HttpSource, IndexSource, source_for};
pub use types::{PackageEntry, PackageIndex, TypeEntry};
