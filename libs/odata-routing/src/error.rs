//! Unified error type for path, routing and link operations.
//!
//! Ordinary non-matches (a routing convention that does not apply, an unknown
//! Content-ID alias, a non-numeric `$top`) are never errors: they surface as
//! `None` or as a pass-through value.

/// Broad classification used by the HTTP layer to pick a status code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required argument was missing.
    PreconditionViolation,
    /// The request or model state does not allow the operation.
    InvalidOperation,
    /// The caller supplied a malformed value.
    InvalidInput,
}

/// Unified error type for all `OData` routing and link operations
///
/// ## HTTP Mapping
///
/// See [`crate::problem`]:
/// - precondition violations and invalid operations map to 500
/// - invalid input maps to 400
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("value cannot be null: {0}")]
    ArgumentNull(&'static str),

    #[error("the request must have an associated OData route name")]
    MissingRouteName,

    #[error("no OData route registered with name '{0}'")]
    UnknownRoute(String),

    #[error("the request must have an associated OData path")]
    PathMissing,

    #[error("the related navigation source could not be found from the OData path; the navigation source is required during serialization")]
    NavigationSourceMissing,

    #[error(
        "the Id link builder for the navigation source '{navigation_source}' returned null; an Id link is required for the OData-EntityId header"
    )]
    IdLinkUnavailable { navigation_source: String },

    #[error(
        "the Edit link builder for the navigation source '{navigation_source}' returned null; an Edit link is required for the Location header"
    )]
    LocationLinkUnavailable { navigation_source: String },

    #[error("cannot find the resource type '{0}' in the model")]
    TypeNotInModel(String),

    #[error("the type '{0}' must be an entity type")]
    TypeMustBeEntity(String),

    #[error("invalid OData path: {0}")]
    InvalidPath(String),

    #[error("page size must be greater than zero")]
    InvalidPageSize,

    #[error("'{0}' is not a valid header value")]
    InvalidHeaderValue(String),
}

impl Error {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ArgumentNull(_) => ErrorKind::PreconditionViolation,
            Error::MissingRouteName
            | Error::PathMissing
            | Error::NavigationSourceMissing
            | Error::IdLinkUnavailable { .. }
            | Error::LocationLinkUnavailable { .. }
            | Error::TypeNotInModel(_)
            | Error::TypeMustBeEntity(_)
            | Error::InvalidHeaderValue(_) => ErrorKind::InvalidOperation,
            Error::UnknownRoute(_) | Error::InvalidPath(_) | Error::InvalidPageSize => {
                ErrorKind::InvalidInput
            }
        }
    }
}
