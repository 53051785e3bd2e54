//! Entity-id and edit links for created or updated entities.
//!
//! [`generate_odata_link`] yields the value of the `Location` header
//! (`is_entity_id == false`) or of the `OData-EntityId` header
//! (`is_entity_id == true`) for the entity described by a [`ResourceContext`].

use std::fmt;
use std::sync::Arc;

use http::header::HeaderName;
use http::{HeaderMap, HeaderValue, StatusCode};

use crate::containment::ContainmentPathBuilder;
use crate::edm::{EdmModel, EntityType, NavigationSource, NavigationSourceKind, SchemaType};
use crate::error::Error;
use crate::headers::ODATA_ENTITY_ID;
use crate::link::ODataUrlHelper;
use crate::path::{KeySegment, KeyValue, ODataPath, PathSegment, TypeSegment};

/// The entity a link is generated for.
#[derive(Clone)]
pub struct ResourceContext<'a> {
    model: &'a EdmModel,
    navigation_source: Arc<NavigationSource>,
    entity_type: Arc<EntityType>,
    key: Vec<(String, KeyValue)>,
    request_path: Option<&'a ODataPath>,
}

impl fmt::Debug for ResourceContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceContext")
            .field("navigation_source", &self.navigation_source.name())
            .field("entity_type", &self.entity_type.full_name())
            .field("key", &self.key)
            .field("request_path", &self.request_path.map(ToString::to_string))
            .finish_non_exhaustive()
    }
}

impl<'a> ResourceContext<'a> {
    /// `entity_type` is the runtime type, which may derive from the source's declared type.
    #[must_use]
    pub fn new(
        model: &'a EdmModel,
        navigation_source: Arc<NavigationSource>,
        entity_type: Arc<EntityType>,
        key: Vec<(String, KeyValue)>,
    ) -> Self {
        Self {
            model,
            navigation_source,
            entity_type,
            key,
            request_path: None,
        }
    }

    #[must_use]
    pub fn with_request_path(mut self, path: &'a ODataPath) -> Self {
        self.request_path = Some(path);
        self
    }

    /// Build the context from the request path and the runtime type name of the entity.
    ///
    /// # Errors
    /// - `Error::PathMissing` if the request has no `OData` path
    /// - `Error::NavigationSourceMissing` if the path addresses no navigation source
    /// - `Error::TypeNotInModel` if `type_name` is unknown
    /// - `Error::TypeMustBeEntity` if `type_name` is not an entity type
    pub fn from_request(
        model: &'a EdmModel,
        request_path: Option<&'a ODataPath>,
        type_name: &str,
        key: Vec<(String, KeyValue)>,
    ) -> Result<Self, Error> {
        let path = request_path.ok_or(Error::PathMissing)?;
        let navigation_source = path
            .navigation_source()
            .ok_or(Error::NavigationSourceMissing)?;
        let entity_type = match model.schema_type(type_name) {
            Some(SchemaType::Entity(t)) => t,
            Some(SchemaType::Complex(name)) => return Err(Error::TypeMustBeEntity(name)),
            None => return Err(Error::TypeNotInModel(type_name.to_owned())),
        };
        Ok(
            Self::new(model, Arc::clone(navigation_source), entity_type, key)
                .with_request_path(path),
        )
    }

    #[must_use]
    pub fn model(&self) -> &EdmModel {
        self.model
    }

    #[must_use]
    pub fn navigation_source(&self) -> &Arc<NavigationSource> {
        &self.navigation_source
    }

    #[must_use]
    pub fn entity_type(&self) -> &Arc<EntityType> {
        &self.entity_type
    }

    #[must_use]
    pub fn key(&self) -> &[(String, KeyValue)] {
        &self.key
    }

    #[must_use]
    pub fn request_path(&self) -> Option<&ODataPath> {
        self.request_path
    }

    /// `true` when the runtime type is not the source's declared type.
    #[must_use]
    pub fn is_derived_type(&self) -> bool {
        self.entity_type.full_name() != self.navigation_source.entity_type().full_name()
    }

    fn key_segment(&self, source: &Arc<NavigationSource>) -> PathSegment {
        PathSegment::Key(KeySegment::new(
            self.key.clone(),
            Arc::clone(&self.entity_type),
            Some(Arc::clone(source)),
        ))
    }

    fn cast_segment(&self, source: &Arc<NavigationSource>) -> PathSegment {
        PathSegment::TypeCast(TypeSegment::new(
            Arc::clone(&self.entity_type),
            Arc::clone(source.entity_type()),
            false,
            Some(Arc::clone(source)),
        ))
    }
}

/// Per-navigation-source link builder, attached to the model as an annotation.
///
/// `Ok(None)` means the builder cannot produce that kind of link.
pub trait NavigationSourceLinkBuilder: Send + Sync {
    /// # Errors
    /// Returns an error if link construction fails.
    fn build_id_link(
        &self,
        ctx: &ResourceContext<'_>,
        urls: &ODataUrlHelper,
    ) -> Result<Option<String>, Error>;

    /// # Errors
    /// Returns an error if link construction fails.
    fn build_edit_link(
        &self,
        ctx: &ResourceContext<'_>,
        urls: &ODataUrlHelper,
    ) -> Result<Option<String>, Error>;
}

/// `Set(key)` ids, with a type cast in the edit link for derived entities.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConventionalLinkBuilder;

impl ConventionalLinkBuilder {
    fn id_segments(ctx: &ResourceContext<'_>) -> Option<Vec<PathSegment>> {
        let source = ctx.navigation_source();
        match source.kind() {
            NavigationSourceKind::EntitySet if !ctx.key().is_empty() => Some(vec![
                PathSegment::EntitySet(Arc::clone(source)),
                ctx.key_segment(source),
            ]),
            NavigationSourceKind::Singleton => {
                Some(vec![PathSegment::Singleton(Arc::clone(source))])
            }
            NavigationSourceKind::EntitySet | NavigationSourceKind::ContainedEntitySet => None,
        }
    }
}

impl NavigationSourceLinkBuilder for ConventionalLinkBuilder {
    fn build_id_link(
        &self,
        ctx: &ResourceContext<'_>,
        urls: &ODataUrlHelper,
    ) -> Result<Option<String>, Error> {
        Self::id_segments(ctx)
            .map(|segments| urls.create_link(segments))
            .transpose()
    }

    fn build_edit_link(
        &self,
        ctx: &ResourceContext<'_>,
        urls: &ODataUrlHelper,
    ) -> Result<Option<String>, Error> {
        let Some(mut segments) = Self::id_segments(ctx) else {
            return Ok(None);
        };
        if ctx.is_derived_type() {
            segments.push(ctx.cast_segment(ctx.navigation_source()));
        }
        urls.create_link(segments).map(Some)
    }
}

/// Location (`is_entity_id == false`) or entity-id link for `ctx`.
///
/// # Errors
/// - `Error::PathMissing` for a contained entity without a request path
/// - `Error::IdLinkUnavailable` if an entity id is requested and no id link exists
/// - `Error::LocationLinkUnavailable` if neither an edit nor an id link exists
/// - link construction errors from [`ODataUrlHelper::create_link`]
pub fn generate_odata_link(
    ctx: &ResourceContext<'_>,
    urls: &ODataUrlHelper,
    is_entity_id: bool,
) -> Result<String, Error> {
    let source = ctx.navigation_source();
    if source.kind() == NavigationSourceKind::ContainedEntitySet {
        return containment_link(ctx, urls, is_entity_id);
    }

    let conventional = ConventionalLinkBuilder;
    let builder: &dyn NavigationSourceLinkBuilder = match ctx.model().link_builder(source.name()) {
        Some(builder) => builder.as_ref(),
        None => &conventional,
    };

    let id_link = builder.build_id_link(ctx, urls)?;
    if is_entity_id {
        return id_link.ok_or_else(|| {
            tracing::warn!(navigation_source = source.name(), "id link builder returned no link");
            Error::IdLinkUnavailable {
                navigation_source: source.name().to_owned(),
            }
        });
    }

    match builder.build_edit_link(ctx, urls)? {
        Some(edit_link) => Ok(edit_link),
        None => id_link.ok_or_else(|| {
            tracing::warn!(
                navigation_source = source.name(),
                "edit and id link builders returned no link"
            );
            Error::LocationLinkUnavailable {
                navigation_source: source.name().to_owned(),
            }
        }),
    }
}

/// Canonical containing path + `Set(key)` (+ cast) for an entity of a contained set.
fn containment_link(
    ctx: &ResourceContext<'_>,
    urls: &ODataUrlHelper,
    is_entity_id: bool,
) -> Result<String, Error> {
    let path = ctx.request_path().ok_or_else(|| {
        tracing::warn!(
            navigation_source = ctx.navigation_source().name(),
            "contained entity link requested without a request path"
        );
        Error::PathMissing
    })?;
    let mut segments = ContainmentPathBuilder::new(ctx.model())
        .try_compute_canonical_containing_path(path)?
        .into_segments();

    // stand-in entity set for the contained source; never registered in the model
    let source = ctx.navigation_source();
    let set = Arc::new(NavigationSource::entity_set(
        &ctx.model().container_name(),
        source.name(),
        Arc::clone(source.entity_type()),
    ));

    segments.push(PathSegment::EntitySet(Arc::clone(&set)));
    segments.push(ctx.key_segment(&set));
    if !is_entity_id && ctx.is_derived_type() {
        segments.push(ctx.cast_segment(&set));
    }
    urls.create_link(segments)
}

/// Add `OData-EntityId` to a `204 No Content` response; other statuses are left untouched.
///
/// `entity_id` is only evaluated for 204.
///
/// # Errors
/// Returns the error of `entity_id`, or `Error::InvalidHeaderValue` if the
/// link is not a valid header value.
pub fn add_entity_id<F>(
    status: StatusCode,
    headers: &mut HeaderMap,
    entity_id: F,
) -> Result<(), Error>
where
    F: FnOnce() -> Result<String, Error>,
{
    if status != StatusCode::NO_CONTENT {
        return Ok(());
    }
    let id = entity_id()?;
    let value = HeaderValue::from_str(&id).map_err(|_| Error::InvalidHeaderValue(id.clone()))?;
    headers.append(HeaderName::from_static(ODATA_ENTITY_ID), value);
    Ok(())
}
