//! Canonical containing paths for entities of contained entity sets.
//!
//! `Customers(1)/Orders` addresses a contained set; the entity created there
//! is identified relative to its container, `Customers(1)`. Navigation
//! through bound, non-contained sources collapses onto the target: a keyed
//! collection navigation becomes its entity set, so
//! `Customers(1)/Friends(2)/Orders` is canonically contained in
//! `Customers(2)`, and a navigation bound to a singleton becomes that
//! singleton.

use std::sync::Arc;

use crate::edm::{EdmModel, EntityType, NavigationSourceKind};
use crate::error::Error;
use crate::path::{ODataPath, PathSegment, TypeSegment};

#[derive(Clone, Copy, Debug)]
pub struct ContainmentPathBuilder<'m> {
    model: &'m EdmModel,
}

impl<'m> ContainmentPathBuilder<'m> {
    /// Builder resolving inheritance against `model`.
    #[must_use]
    pub fn new(model: &'m EdmModel) -> Self {
        Self { model }
    }

    /// Shortest canonical path to the container of the last contained set in `path`.
    ///
    /// Type casts are dropped, except a cast to the declaring type in front of
    /// a navigation property the uncast type does not have. The path is cut
    /// before the last containment navigation and the remainder is re-rooted
    /// at the nearest entity set, singleton, keyed navigation into a bound
    /// entity set or navigation bound to a singleton. Without a containment
    /// navigation the cast-free path is returned.
    ///
    /// # Errors
    /// Returns `Error::InvalidPath` if nothing remains after cutting.
    pub fn try_compute_canonical_containing_path(
        &self,
        path: &ODataPath,
    ) -> Result<ODataPath, Error> {
        let mut segments = self.without_casts(path.segments());

        let last_containment = segments.iter().rposition(|s| {
            matches!(s, PathSegment::NavigationProperty(nav) if nav.property().contains_target)
        });
        let Some(cut) = last_containment else {
            return ODataPath::new(segments);
        };
        segments.truncate(cut);

        if let Some(root) = find_root(&mut segments) {
            segments.drain(..root);
        }
        ODataPath::new(segments)
    }

    fn without_casts(&self, segments: &[PathSegment]) -> Vec<PathSegment> {
        let mut out: Vec<PathSegment> = Vec::with_capacity(segments.len());
        // entity type of the last segment as it reads without casts
        let mut uncast: Option<Arc<EntityType>> = None;

        for segment in segments {
            match segment {
                PathSegment::TypeCast(_) => continue,
                PathSegment::Key(_) => {}
                PathSegment::NavigationProperty(nav) => {
                    if let Some(from) = uncast.as_ref() {
                        let declaring = nav.declaring_type();
                        if !self.model.is_or_derives_from(from, declaring) {
                            let source =
                                out.last().and_then(PathSegment::navigation_source).cloned();
                            out.push(PathSegment::TypeCast(TypeSegment::new(
                                Arc::clone(declaring),
                                Arc::clone(from),
                                false,
                                source,
                            )));
                        }
                    }
                    uncast = Some(Arc::clone(nav.target_type()));
                }
                other => uncast = other.entity_type().cloned(),
            }
            out.push(segment.clone());
        }
        out
    }
}

/// Index of the canonical root, rewriting a bound navigation into its target source.
fn find_root(segments: &mut [PathSegment]) -> Option<usize> {
    for i in (0..segments.len()).rev() {
        let replacement = match &segments[i] {
            PathSegment::EntitySet(_) | PathSegment::Singleton(_) => return Some(i),
            PathSegment::NavigationProperty(nav) if !nav.property().contains_target => {
                let keyed = nav.property().is_collection
                    && matches!(segments.get(i + 1), Some(PathSegment::Key(_)));
                match nav.navigation_source() {
                    Some(source) if source.kind() == NavigationSourceKind::Singleton => {
                        Some(PathSegment::Singleton(Arc::clone(source)))
                    }
                    Some(source) if keyed && source.kind() == NavigationSourceKind::EntitySet => {
                        Some(PathSegment::EntitySet(Arc::clone(source)))
                    }
                    _ => None,
                }
            }
            _ => None,
        };
        if let Some(root) = replacement {
            segments[i] = root;
            return Some(i);
        }
    }
    None
}
