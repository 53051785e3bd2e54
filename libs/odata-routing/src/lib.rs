#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! `OData` v4 resource paths, routing conventions and link generation.
//!
//! The crate is host-agnostic: the web framework supplies the parsed request
//! (method, path, query), the controller's action names and a [`UrlResolver`]
//! for absolute links. Everything here is synchronous and pure apart from the
//! request-scoped [`RouteData`] and the batch-scoped [`ContentIdMapping`].

pub mod config;
pub mod containment;
pub mod content_id;
pub mod edm;
pub mod entity_link;
pub mod error;
pub mod headers;
pub mod link;
pub mod paging;
pub mod path;
pub mod problem;
pub mod routing;

pub use config::ODataRoutingConfig;
pub use containment::ContainmentPathBuilder;
pub use content_id::{ContentIdMapping, resolve_content_id};
pub use edm::EdmModel;
pub use entity_link::{
    ConventionalLinkBuilder, NavigationSourceLinkBuilder, ResourceContext, add_entity_id,
    generate_odata_link,
};
pub use error::{Error, ErrorKind};
pub use link::{ODataUrlHelper, RouteUrlResolver, UrlResolver};
pub use paging::{next_page_link, next_page_link_for};
pub use path::{DefaultPathHandler, ODataPath, PathHandler, PathSegment};
pub use problem::{Problem, error_to_problem};
pub use routing::{
    ActionMap, ActionTable, ControllerContext, RouteData, RoutingConvention, RoutingConventions,
};
