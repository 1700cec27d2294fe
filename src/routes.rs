//! Path routing.
//!
//! A [`RouteTable`] maps path patterns such as `/docs/:package/:type` to a
//! view and the data it needs before its controller may run. The [`Router`]
//! follows redirects, waits for that data, and activates the view.
//!
//! Routes are tried in declaration order and the first match wins.

use lazy_static::lazy_static;
use percent_encoding::percent_decode_str;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::controllers::{FrontView, View, package_controller, type_controller};
use crate::docs::{IndexLoader, PackageIndex};
use crate::error::{NavigationError, RouteError};

const MAX_REDIRECTS: usize = 10;

lazy_static! {
    static ref PARAM_NAME: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// Values captured from `:name` segments of the navigated path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams(BTreeMap<String, String>);

impl RouteParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn package(&self) -> Option<&str> {
        self.get("package")
    }

    pub fn type_name(&self) -> Option<&str> {
        self.get("type")
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for RouteParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Front,
    Package,
    Type,
}

impl ViewKind {
    pub fn name(self) -> &'static str {
        match self {
            ViewKind::Front => "front",
            ViewKind::Package => "package",
            ViewKind::Type => "type",
        }
    }
}

/// Data that must be available before a view's controller runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prerequisite {
    /// The package index, from the loader.
    Packages,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteTarget {
    View {
        kind: ViewKind,
        requires: Option<Prerequisite>,
    },
    /// Redirect to a path template; `:name` segments are filled from the match.
    Redirect(String),
}

/// A compiled path pattern.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    source: String,
    regex: Regex,
    params: Vec<String>,
}

impl RoutePattern {
    pub fn parse(pattern: &str) -> Result<Self, RouteError> {
        let mut params: Vec<String> = Vec::new();
        let mut parts = Vec::new();

        for segment in pattern.split('/') {
            match segment.strip_prefix(':') {
                Some(name) => {
                    if !PARAM_NAME.is_match(name) {
                        return Err(RouteError::InvalidParam {
                            pattern: pattern.to_string(),
                            name: name.to_string(),
                        });
                    }
                    if params.iter().any(|p| p == name) {
                        return Err(RouteError::DuplicateParam {
                            pattern: pattern.to_string(),
                            name: name.to_string(),
                        });
                    }
                    params.push(name.to_string());
                    parts.push("([^/]+)".to_string());
                }
                None => parts.push(regex::escape(segment)),
            }
        }

        let regex = Regex::new(&format!("^{}$", parts.join("/"))).map_err(|e| {
            RouteError::Invalid {
                pattern: pattern.to_string(),
                message: e.to_string(),
            }
        })?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
            params,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Match a path, capturing its parameters percent-decoded.
    pub fn matches(&self, path: &str) -> Option<RouteParams> {
        let captures = self.regex.captures(path)?;
        Some(
            self.params
                .iter()
                .enumerate()
                .filter_map(|(i, name)| {
                    captures
                        .get(i + 1)
                        .map(|m| (name.clone(), decode_segment(m.as_str())))
                })
                .collect(),
        )
    }

    /// The same pattern with its trailing slash added or removed.
    fn toggled_slash(&self) -> String {
        match self.source.strip_suffix('/') {
            Some(trimmed) => trimmed.to_string(),
            None => format!("{}/", self.source),
        }
    }
}

/// Segments that are not valid UTF-8 once decoded are kept as written.
fn decode_segment(segment: &str) -> String {
    percent_decode_str(segment)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

/// Fill `:name` segments of a path template from `params`.
///
/// Parameters that were not captured become empty segments.
pub fn interpolate(template: &str, params: &RouteParams) -> String {
    template
        .split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) => params.get(name).unwrap_or_default(),
            None => segment,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[derive(Debug, Clone)]
struct RouteDefinition {
    pattern: RoutePattern,
    target: RouteTarget,
}

/// Outcome of matching one path against the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    View {
        kind: ViewKind,
        requires: Option<Prerequisite>,
        params: RouteParams,
    },
    Redirect(String),
}

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteDefinition>,
    otherwise: Option<String>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The documentation browser's routes: front page, type page, package
    /// page, and everything else back to the front page.
    pub fn standard() -> Result<Self, RouteError> {
        Ok(Self::new()
            .when("/", ViewKind::Front, None)?
            .when(
                "/docs/:package/:type",
                ViewKind::Type,
                Some(Prerequisite::Packages),
            )?
            .when(
                "/docs/:package/",
                ViewKind::Package,
                Some(Prerequisite::Packages),
            )?
            .otherwise("/"))
    }

    /// Register a view route.
    ///
    /// Also registers a redirect from the same pattern with its trailing
    /// slash toggled, unless that pattern is already routed or would be
    /// empty (paths are always rooted, so `""` can never match).
    pub fn when(
        self,
        pattern: &str,
        kind: ViewKind,
        requires: Option<Prerequisite>,
    ) -> Result<Self, RouteError> {
        let pattern = RoutePattern::parse(pattern)?;
        let toggled = pattern.toggled_slash();
        let target = pattern.as_str().to_string();

        let mut table = self.insert(pattern, RouteTarget::View { kind, requires });
        if !toggled.is_empty() && !table.contains(&toggled) {
            let companion = RoutePattern::parse(&toggled)?;
            table = table.insert(companion, RouteTarget::Redirect(target));
        }
        Ok(table)
    }

    /// Register an explicit redirect.
    pub fn redirect(self, pattern: &str, to: &str) -> Result<Self, RouteError> {
        let pattern = RoutePattern::parse(pattern)?;
        Ok(self.insert(pattern, RouteTarget::Redirect(to.to_string())))
    }

    /// Where to send paths no route matches.
    pub fn otherwise(mut self, to: &str) -> Self {
        self.otherwise = Some(to.to_string());
        self
    }

    /// Re-registering a pattern replaces its target in place.
    fn insert(mut self, pattern: RoutePattern, target: RouteTarget) -> Self {
        match self
            .routes
            .iter_mut()
            .find(|route| route.pattern.as_str() == pattern.as_str())
        {
            Some(existing) => existing.target = target,
            None => self.routes.push(RouteDefinition { pattern, target }),
        }
        self
    }

    fn contains(&self, pattern: &str) -> bool {
        self.routes
            .iter()
            .any(|route| route.pattern.as_str() == pattern)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Match `path` against the routes in order, falling back to the
    /// catch-all redirect.
    pub fn resolve(&self, path: &str) -> Option<Resolution> {
        let path = normalize(path);

        for route in &self.routes {
            let Some(params) = route.pattern.matches(&path) else {
                continue;
            };
            debug!(path = %path, pattern = route.pattern.as_str(), "route matched");
            return Some(match &route.target {
                RouteTarget::View { kind, requires } => Resolution::View {
                    kind: *kind,
                    requires: *requires,
                    params,
                },
                RouteTarget::Redirect(template) => {
                    Resolution::Redirect(interpolate(template, &params))
                }
            });
        }

        self.otherwise.clone().map(Resolution::Redirect)
    }
}

/// Drop the query string and fragment, and root relative paths.
fn normalize(path: &str) -> String {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = &path[..end];
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// Result of a completed navigation.
#[derive(Debug, Clone)]
pub struct Navigation {
    /// The path that was finally rendered.
    pub path: String,
    /// Paths redirected away from, in order.
    pub redirects: Vec<String>,
    pub params: RouteParams,
    pub view: View,
}

/// Resolves paths against a route table and activates views.
pub struct Router {
    table: RouteTable,
    loader: Arc<IndexLoader>,
}

impl Router {
    pub fn new(table: RouteTable, loader: Arc<IndexLoader>) -> Self {
        Self { table, loader }
    }

    pub fn loader(&self) -> &Arc<IndexLoader> {
        &self.loader
    }

    /// Navigate to `path`.
    ///
    /// Redirects are followed first. If the matched route has a prerequisite,
    /// the controller is only run once that data has loaded.
    pub async fn navigate(&self, path: &str) -> Result<Navigation, NavigationError> {
        let mut current = normalize(path);
        let mut redirects = Vec::new();

        loop {
            match self.table.resolve(&current) {
                Some(Resolution::Redirect(to)) => {
                    if redirects.len() >= MAX_REDIRECTS {
                        return Err(NavigationError::RedirectLoop(normalize(path)));
                    }
                    debug!(from = %current, to = %to, "redirecting");
                    redirects.push(std::mem::replace(&mut current, normalize(&to)));
                }
                Some(Resolution::View {
                    kind,
                    requires,
                    params,
                }) => {
                    let view = self.activate(kind, requires, &params).await?;
                    debug!(path = %current, view = kind.name(), "view activated");
                    return Ok(Navigation {
                        path: current,
                        redirects,
                        params,
                        view,
                    });
                }
                None => return Err(NavigationError::NoRoute(current)),
            }
        }
    }

    async fn activate(
        &self,
        kind: ViewKind,
        requires: Option<Prerequisite>,
        params: &RouteParams,
    ) -> Result<View, NavigationError> {
        let packages: Option<Arc<PackageIndex>> = match requires {
            Some(Prerequisite::Packages) => Some(self.loader.load().await?),
            None => self.loader.cached(),
        };

        Ok(match kind {
            ViewKind::Front => View::Front(FrontView::new(packages)),
            ViewKind::Package => View::Package(package_controller(packages, params)),
            ViewKind::Type => View::Type(type_controller(packages, params)),
        })
    }
}
