//! Typed `OData` resource paths.
//!
//! An [`ODataPath`] is an ordered, non-empty sequence of [`PathSegment`]s.
//! Construction enforces the structural rules:
//! - `$count` and `$value` may only appear as the last segment
//! - a key segment must follow a segment yielding a collection of entities
//!   whose type declares a key, and must name exactly those key properties
//!
//! Keys inherited from a base type can only be checked against the model;
//! [`ODataPath::with_model`] does that, [`ODataPath::new`] checks keys
//! declared on the key's own entity type.
//!
//! The path template (e.g. `~/entityset/key/action`) is derived from the
//! segment kinds and drives routing-convention matching.

pub mod handler;
mod key;
mod segment;

use std::fmt;
use std::sync::Arc;

pub use handler::{DefaultPathHandler, PathHandler};
pub use key::KeyValue;
pub use segment::{
    KeySegment, NavigationPropertySegment, OperationSegment, PathSegment, TypeSegment,
};

use crate::edm::{EdmModel, NavigationSource};
use crate::error::Error;

#[derive(Clone, Debug)]
pub struct ODataPath {
    segments: Vec<PathSegment>,
}

impl ODataPath {
    /// Build a path, validating segment order.
    ///
    /// # Errors
    /// Returns `Error::InvalidPath` if the path is empty, if `$count`/`$value`
    /// is not the last segment, if a key does not follow a keyed collection or
    /// if it does not match the key its entity type declares.
    pub fn new(segments: Vec<PathSegment>) -> Result<Self, Error> {
        if segments.is_empty() {
            return Err(Error::InvalidPath("path must not be empty".to_owned()));
        }

        let last = segments.len() - 1;
        for (i, segment) in segments.iter().enumerate() {
            match segment {
                PathSegment::Count | PathSegment::Value if i != last => {
                    return Err(Error::InvalidPath(format!(
                        "'{segment}' must be the last segment"
                    )));
                }
                PathSegment::Key(key) => {
                    let follows_collection = i > 0 && segments[i - 1].yields_entity_collection();
                    if !follows_collection || key.keys().is_empty() {
                        return Err(Error::InvalidPath(format!(
                            "key '{key}' must follow a collection of a keyed entity type"
                        )));
                    }
                    let declared = key.entity_type().declared_key();
                    if !declared.is_empty() {
                        check_key_names(key, declared)?;
                    }
                }
                _ => {}
            }
        }

        Ok(Self { segments })
    }

    /// [`ODataPath::new`], then every key is checked against the key its
    /// entity type declares or inherits in `model`.
    ///
    /// # Errors
    /// As [`ODataPath::new`], and `Error::InvalidPath` if a key's entity type
    /// has no key or the key names other properties.
    pub fn with_model(model: &EdmModel, segments: Vec<PathSegment>) -> Result<Self, Error> {
        let path = Self::new(segments)?;
        for segment in &path.segments {
            if let PathSegment::Key(key) = segment {
                check_key_names(key, model.key_of(key.entity_type()))?;
            }
        }
        Ok(path)
    }

    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    #[must_use]
    pub fn into_segments(self) -> Vec<PathSegment> {
        self.segments
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    #[must_use]
    pub fn last_segment(&self) -> &PathSegment {
        // non-empty by construction
        &self.segments[self.segments.len() - 1]
    }

    /// Path template such as `~/entityset/key/navigation`.
    #[must_use]
    pub fn path_template(&self) -> String {
        let mut template = String::from("~");
        for segment in &self.segments {
            template.push('/');
            template.push_str(segment.template_token());
        }
        template
    }

    /// Navigation source addressed by the path, ignoring trailing `$count`/`$value`.
    #[must_use]
    pub fn navigation_source(&self) -> Option<&Arc<NavigationSource>> {
        self.segments
            .iter()
            .rev()
            .find(|s| !matches!(s, PathSegment::Count | PathSegment::Value))
            .and_then(PathSegment::navigation_source)
    }

    #[must_use]
    pub fn is_count_request(&self) -> bool {
        matches!(self.last_segment(), PathSegment::Count)
    }

    #[must_use]
    pub fn is_raw_value_request(&self) -> bool {
        matches!(self.last_segment(), PathSegment::Value)
    }
}

fn check_key_names(key: &KeySegment, key_properties: &[String]) -> Result<(), Error> {
    if key_properties.is_empty() {
        return Err(Error::InvalidPath(format!(
            "'{}' declares no key",
            key.entity_type()
        )));
    }
    let matches = key.keys().len() == key_properties.len()
        && key
            .keys()
            .iter()
            .all(|(name, _)| key_properties.contains(name));
    if matches {
        Ok(())
    } else {
        Err(Error::InvalidPath(format!(
            "key '{key}' does not match the key of '{}'",
            key.entity_type()
        )))
    }
}

impl fmt::Display for ODataPath {
    /// Unescaped rendering, keys appended to their collection segment.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 && !matches!(segment, PathSegment::Key(_)) {
                f.write_str("/")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}
