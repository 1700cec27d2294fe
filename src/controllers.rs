//! View controllers.
//!
//! A controller receives the route parameters and, for routes that require
//! it, the loaded index, and picks out the part of the index its view shows.
//! Lookups that find nothing leave the field empty; the view decides how to
//! present a missing package or type.

use std::sync::Arc;

use crate::docs::{PackageEntry, PackageIndex, TypeEntry};
use crate::routes::RouteParams;

/// An activated view, ready for rendering.
#[derive(Debug, Clone)]
pub enum View {
    Front(FrontView),
    Package(PackageView),
    Type(TypeView),
}

/// The landing page. Lists packages only when the index is already cached.
#[derive(Debug, Clone, Default)]
pub struct FrontView {
    packages: Option<Arc<PackageIndex>>,
}

impl FrontView {
    pub fn new(packages: Option<Arc<PackageIndex>>) -> Self {
        Self { packages }
    }

    pub fn packages(&self) -> Option<&PackageIndex> {
        self.packages.as_deref()
    }
}

#[derive(Debug, Clone)]
pub struct PackageView {
    packages: Option<Arc<PackageIndex>>,
    package: String,
}

impl PackageView {
    /// The package named in the route, if the index has it.
    pub fn pkg(&self) -> Option<&PackageEntry> {
        self.packages.as_deref()?.package(&self.package)
    }

    pub fn package_name(&self) -> &str {
        &self.package
    }
}

#[derive(Debug, Clone)]
pub struct TypeView {
    packages: Option<Arc<PackageIndex>>,
    package: String,
    name: String,
    cls_key: Option<String>,
}

impl TypeView {
    pub fn pkg(&self) -> Option<&PackageEntry> {
        self.packages.as_deref()?.package(&self.package)
    }

    /// The type entry, found by bare or qualified name.
    pub fn cls(&self) -> Option<&TypeEntry> {
        self.pkg()?.get(self.cls_key.as_deref()?)
    }

    /// The type name from the route, set whether or not the lookup succeeded.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn package_name(&self) -> &str {
        &self.package
    }

    /// Index key the type was found under.
    pub fn resolved_key(&self) -> Option<&str> {
        self.cls_key.as_deref()
    }
}

pub fn package_controller(
    packages: Option<Arc<PackageIndex>>,
    params: &RouteParams,
) -> PackageView {
    PackageView {
        packages,
        package: params.package().unwrap_or_default().to_string(),
    }
}

pub fn type_controller(packages: Option<Arc<PackageIndex>>, params: &RouteParams) -> TypeView {
    let package = params.package().unwrap_or_default().to_string();
    let name = params.type_name().unwrap_or_default().to_string();

    let cls_key = packages
        .as_deref()
        .and_then(|index| index.package(&package))
        .and_then(|pkg| pkg.lookup(&package, &name))
        .map(|(key, _)| key.to_string());

    TypeView {
        packages,
        package,
        name,
        cls_key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn index() -> Arc<PackageIndex> {
        Arc::new(
            PackageIndex::from_bytes(
                br#"{"pkgA": {"Type1": {"doc": "first"}, "pkgA.Type2": {"doc": "second"}}}"#,
            )
            .unwrap(),
        )
    }

    fn params(pairs: &[(&str, &str)]) -> RouteParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_type_controller_bare_name() {
        let view = type_controller(
            Some(index()),
            &params(&[("package", "pkgA"), ("type", "Type1")]),
        );
        assert_eq!(view.cls().unwrap().as_value(), &json!({"doc": "first"}));
        assert_eq!(view.resolved_key(), Some("Type1"));
        assert_eq!(view.name(), "Type1");
    }

    #[test]
    fn test_type_controller_qualified_fallback() {
        let view = type_controller(
            Some(index()),
            &params(&[("package", "pkgA"), ("type", "Type2")]),
        );
        assert_eq!(view.cls().unwrap().as_value(), &json!({"doc": "second"}));
        assert_eq!(view.resolved_key(), Some("pkgA.Type2"));
    }

    #[test]
    fn test_type_controller_missing_type_keeps_name() {
        let view = type_controller(
            Some(index()),
            &params(&[("package", "pkgA"), ("type", "Missing")]),
        );
        assert!(view.pkg().is_some());
        assert!(view.cls().is_none());
        assert_eq!(view.name(), "Missing");
    }

    #[test]
    fn test_type_controller_missing_package() {
        let view = type_controller(
            Some(index()),
            &params(&[("package", "missingPkg"), ("type", "Anything")]),
        );
        assert!(view.pkg().is_none());
        assert!(view.cls().is_none());
        assert_eq!(view.name(), "Anything");
        assert_eq!(view.package_name(), "missingPkg");
    }

    #[test]
    fn test_package_controller() {
        let view = package_controller(Some(index()), &params(&[("package", "pkgA")]));
        assert_eq!(view.pkg().unwrap().len(), 2);

        let missing = package_controller(Some(index()), &params(&[("package", "nope")]));
        assert!(missing.pkg().is_none());
        assert_eq!(missing.package_name(), "nope");
    }

    #[test]
    fn test_controllers_without_index_degrade() {
        let view = type_controller(None, &params(&[("package", "pkgA"), ("type", "Type1")]));
        assert!(view.pkg().is_none());
        assert_eq!(view.name(), "Type1");

        let view = package_controller(None, &RouteParams::default());
        assert!(view.pkg().is_none());
        assert_eq!(view.package_name(), "");
    }
}
