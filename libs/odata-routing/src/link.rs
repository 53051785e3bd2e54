//! Absolute link generation from path segments.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::config::ODataRoutingConfig;
use crate::error::Error;
use crate::path::{ODataPath, PathHandler, PathSegment};

/// Turns a route name plus a service-root-relative path into an absolute URL.
pub trait UrlResolver: Send + Sync {
    /// # Errors
    /// Returns `Error::UnknownRoute` if `route_name` is not registered.
    fn resolve(&self, route_name: &str, odata_path: &str) -> Result<String, Error>;
}

/// Resolver backed by a base URL and a table of route prefixes.
#[derive(Clone, Debug)]
pub struct RouteUrlResolver {
    base: Url,
    routes: BTreeMap<String, String>,
}

impl RouteUrlResolver {
    /// `base` supplies scheme, host and port; its path and query are ignored.
    #[must_use]
    pub fn new(base: Url) -> Self {
        Self {
            base,
            routes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_route(mut self, route_name: &str, prefix: &str) -> Self {
        self.routes
            .insert(route_name.to_owned(), prefix.trim_matches('/').to_owned());
        self
    }

    #[must_use]
    pub fn from_config(base: Url, config: &ODataRoutingConfig) -> Self {
        config
            .routes
            .iter()
            .fold(Self::new(base), |resolver, (name, prefix)| {
                resolver.with_route(name, prefix)
            })
    }
}

impl UrlResolver for RouteUrlResolver {
    fn resolve(&self, route_name: &str, odata_path: &str) -> Result<String, Error> {
        let prefix = self
            .routes
            .get(route_name)
            .ok_or_else(|| Error::UnknownRoute(route_name.to_owned()))?;

        let odata_path = odata_path.trim_start_matches('/');
        let path = match (prefix.is_empty(), odata_path.is_empty()) {
            (true, _) => format!("/{odata_path}"),
            (false, true) => format!("/{prefix}"),
            (false, false) => format!("/{prefix}/{odata_path}"),
        };

        let mut url = self.base.clone();
        url.set_path(&path);
        url.set_query(None);
        url.set_fragment(None);
        Ok(url.into())
    }
}

/// Request-scoped link helper: route name, path handler and URL resolver.
#[derive(Clone)]
pub struct ODataUrlHelper {
    route_name: Option<String>,
    path_handler: Option<Arc<dyn PathHandler>>,
    resolver: Arc<dyn UrlResolver>,
}

impl fmt::Debug for ODataUrlHelper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ODataUrlHelper")
            .field("route_name", &self.route_name)
            .field("has_path_handler", &self.path_handler.is_some())
            .finish_non_exhaustive()
    }
}

impl ODataUrlHelper {
    #[must_use]
    pub fn new(resolver: Arc<dyn UrlResolver>) -> Self {
        Self {
            route_name: None,
            path_handler: None,
            resolver,
        }
    }

    /// Helper defaulting to the configured route name.
    #[must_use]
    pub fn from_config(resolver: Arc<dyn UrlResolver>, config: &ODataRoutingConfig) -> Self {
        Self::new(resolver).with_route_name(config.route_name.clone())
    }

    #[must_use]
    pub fn with_route_name(mut self, route_name: impl Into<String>) -> Self {
        self.route_name = Some(route_name.into());
        self
    }

    #[must_use]
    pub fn with_path_handler(mut self, handler: Arc<dyn PathHandler>) -> Self {
        self.path_handler = Some(handler);
        self
    }

    #[must_use]
    pub fn route_name(&self) -> Option<&str> {
        self.route_name.as_deref()
    }

    #[must_use]
    pub fn path_handler(&self) -> Option<&Arc<dyn PathHandler>> {
        self.path_handler.as_ref()
    }

    /// Link for `segments` using this request's route name and path handler.
    ///
    /// # Errors
    /// See [`ODataUrlHelper::create_link_with`].
    pub fn create_link(&self, segments: Vec<PathSegment>) -> Result<String, Error> {
        self.create_link_with(
            self.route_name.as_deref().unwrap_or_default(),
            self.path_handler.as_deref(),
            segments,
        )
    }

    /// Absolute link for `segments` on route `route_name`.
    ///
    /// # Errors
    /// - `Error::MissingRouteName` if `route_name` is empty
    /// - `Error::ArgumentNull` if no path handler is available
    /// - `Error::InvalidPath` if `segments` do not form a valid path
    /// - whatever the resolver reports for the route
    pub fn create_link_with(
        &self,
        route_name: &str,
        path_handler: Option<&dyn PathHandler>,
        segments: Vec<PathSegment>,
    ) -> Result<String, Error> {
        if route_name.is_empty() {
            return Err(Error::MissingRouteName);
        }
        let handler = path_handler.ok_or(Error::ArgumentNull("path_handler"))?;
        let path = ODataPath::new(segments)?;
        self.resolver.resolve(route_name, &handler.link(&path))
    }
}
