//! `OData` protocol headers.

use http::HeaderMap;

/// `OData-Version`
pub const ODATA_VERSION: &str = "odata-version";
/// `OData-MaxVersion`
pub const ODATA_MAX_VERSION: &str = "odata-maxversion";
/// `OData-EntityId`, sent with `204 No Content` responses to inserts and upserts.
pub const ODATA_ENTITY_ID: &str = "odata-entityid";

/// Protocol versions understood by this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ODataVersion {
    V4,
    V401,
}

impl ODataVersion {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().trim_end_matches(';').trim() {
            "4.0" => Some(ODataVersion::V4),
            "4.01" => Some(ODataVersion::V401),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ODataVersion::V4 => "4.0",
            ODataVersion::V401 => "4.01",
        }
    }
}

impl std::fmt::Display for ODataVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn first_version(headers: &HeaderMap, name: &str) -> Option<ODataVersion> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(ODataVersion::parse)
}

/// Version requested via `OData-Version`.
#[must_use]
pub fn odata_version(headers: &HeaderMap) -> Option<ODataVersion> {
    first_version(headers, ODATA_VERSION)
}

/// Highest version the client accepts, via `OData-MaxVersion`.
#[must_use]
pub fn odata_max_version(headers: &HeaderMap) -> Option<ODataVersion> {
    first_version(headers, ODATA_MAX_VERSION)
}
