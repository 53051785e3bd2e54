//! Configuration for `OData` routing and link generation.

use std::collections::BTreeMap;

use figment::Figment;
use serde::Deserialize;

/// Key of the configuration section read by [`ODataRoutingConfig::from_figment`].
pub const CONFIG_SECTION: &str = "odata";

/// Configuration for `OData` routing and link generation.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct ODataRoutingConfig {
    /// Route used for links when the caller does not name one.
    /// Default: `"odata"`
    pub route_name: String,

    /// Route name to URL prefix (relative to the host root).
    /// Default: `{"odata": "odata"}`
    pub routes: BTreeMap<String, String>,

    /// Namespace of the container that hosts synthesized entity sets
    /// for contained navigation sources. Default: `"NS"`
    pub default_namespace: String,

    /// Name of that container. Default: `"Default"`
    pub default_container: String,
}

impl Default for ODataRoutingConfig {
    fn default() -> Self {
        Self {
            route_name: "odata".to_owned(),
            routes: BTreeMap::from([("odata".to_owned(), "odata".to_owned())]),
            default_namespace: "NS".to_owned(),
            default_container: "Default".to_owned(),
        }
    }
}

impl ODataRoutingConfig {
    /// Extract the `odata` section; a missing section yields the defaults.
    ///
    /// # Errors
    /// Returns a `figment::Error` if the section exists but does not deserialize.
    pub fn from_figment(figment: &Figment) -> Result<Self, figment::Error> {
        if figment.find_value(CONFIG_SECTION).is_err() {
            return Ok(Self::default());
        }
        figment.extract_inner(CONFIG_SECTION)
    }

    /// Prefix registered for `route_name`, if any.
    #[must_use]
    pub fn route_prefix(&self, route_name: &str) -> Option<&str> {
        self.routes.get(route_name).map(String::as_str)
    }
}
