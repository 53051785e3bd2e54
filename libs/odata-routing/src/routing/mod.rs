//! Routing-convention dispatch.
//!
//! A [`RoutingConventions`] list maps a parsed [`ODataPath`] plus the request
//! method onto a controller action name. Conventions are tried in order and
//! the first one that returns a name wins; `None` from every convention is a
//! no-match (the host answers 404/405). Conventions record binding values
//! (`key`, `navigationProperty`, function parameters) into a request-scoped
//! [`RouteData`] passed explicitly by the caller.

mod conventions;
mod operation;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use http::Method;

use crate::error::Error;
use crate::path::{KeySegment, ODataPath};

pub use conventions::{
    ActionRoutingConvention, EntityRoutingConvention, EntitySetRoutingConvention,
    FunctionRoutingConvention, NavigationRoutingConvention, OperationImportRoutingConvention,
    SingletonRoutingConvention,
};

/// Route-data key of a single-part entity key.
pub const KEY: &str = "key";
/// Route-data key of the navigation property name.
pub const NAVIGATION_PROPERTY: &str = "navigationProperty";

/// Per-request values recorded by the matching convention.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteData {
    values: BTreeMap<String, String>,
}

impl RouteData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Record `key` as `key` (single part) or `key{Name}` per part (composite).
    pub fn add_key(&mut self, key: &KeySegment) {
        match key.keys() {
            [(_, value)] => self.insert(KEY, value.to_route_value()),
            parts => {
                for (name, value) in parts {
                    self.insert(format!("{KEY}{name}"), value.to_route_value());
                }
            }
        }
    }
}

/// Action names available on the target controller.
pub trait ActionMap {
    fn contains(&self, action_name: &str) -> bool;

    /// First of `candidates` present in the map.
    #[must_use]
    fn find_matching_action(&self, candidates: &[&str]) -> Option<String> {
        candidates
            .iter()
            .find(|name| self.contains(name))
            .map(|name| (*name).to_owned())
    }
}

/// Set-backed [`ActionMap`].
#[derive(Clone, Debug, Default)]
pub struct ActionTable {
    actions: BTreeSet<String>,
}

impl ActionTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_action(mut self, name: &str) -> Self {
        self.actions.insert(name.to_owned());
        self
    }
}

impl<S: Into<String>> FromIterator<S> for ActionTable {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            actions: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl ActionMap for ActionTable {
    fn contains(&self, action_name: &str) -> bool {
        self.actions.contains(action_name)
    }
}

/// What the dispatcher needs to know about the current request.
#[derive(Clone, Debug)]
pub struct ControllerContext {
    method: Method,
    path: Option<ODataPath>,
}

impl ControllerContext {
    #[must_use]
    pub fn new(method: Method) -> Self {
        Self { method, path: None }
    }

    #[must_use]
    pub fn with_path(mut self, path: ODataPath) -> Self {
        self.path = Some(path);
        self
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> Option<&ODataPath> {
        self.path.as_ref()
    }
}

/// Selects an action for a path; `None` when the convention does not apply.
pub trait RoutingConvention: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn select_action(
        &self,
        path: &ODataPath,
        ctx: &ControllerContext,
        actions: &dyn ActionMap,
        route_data: &mut RouteData,
    ) -> Option<String>;
}

/// Ordered convention list; first match wins.
#[derive(Clone)]
pub struct RoutingConventions {
    conventions: Vec<Arc<dyn RoutingConvention>>,
}

impl fmt::Debug for RoutingConventions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.conventions.iter().map(|c| c.name()))
            .finish()
    }
}

impl Default for RoutingConventions {
    /// The standard conventions in their usual order.
    fn default() -> Self {
        Self::empty()
            .with(EntitySetRoutingConvention)
            .with(SingletonRoutingConvention)
            .with(EntityRoutingConvention)
            .with(NavigationRoutingConvention)
            .with(ActionRoutingConvention)
            .with(FunctionRoutingConvention)
            .with(OperationImportRoutingConvention)
    }
}

impl RoutingConventions {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            conventions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, convention: impl RoutingConvention + 'static) -> Self {
        self.conventions.push(Arc::new(convention));
        self
    }

    pub fn push(&mut self, convention: Arc<dyn RoutingConvention>) {
        self.conventions.push(convention);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.conventions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conventions.is_empty()
    }

    /// Action for the request, or `None` if no convention matches.
    ///
    /// # Errors
    /// Returns `Error::ArgumentNull` if `ctx` carries no `OData` path.
    pub fn select_action(
        &self,
        ctx: &ControllerContext,
        actions: &dyn ActionMap,
        route_data: &mut RouteData,
    ) -> Result<Option<String>, Error> {
        let path = ctx.path().ok_or(Error::ArgumentNull("odata_path"))?;
        let template = path.path_template();

        for convention in &self.conventions {
            if let Some(action) = convention.select_action(path, ctx, actions, route_data) {
                tracing::debug!(
                    convention = convention.name(),
                    method = %ctx.method(),
                    template = %template,
                    action = %action,
                    "routing convention matched"
                );
                return Ok(Some(action));
            }
        }

        tracing::debug!(
            method = %ctx.method(),
            template = %template,
            "no routing convention matched"
        );
        Ok(None)
    }
}
