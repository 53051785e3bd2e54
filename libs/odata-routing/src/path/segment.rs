use std::fmt;
use std::sync::Arc;

use crate::edm::{EntityType, NavigationProperty, NavigationSource, Operation, OperationKind};
use crate::path::KeyValue;

/// One addressable unit of a resource path.
#[derive(Clone, Debug)]
pub enum PathSegment {
    EntitySet(Arc<NavigationSource>),
    Singleton(Arc<NavigationSource>),
    Key(KeySegment),
    NavigationProperty(NavigationPropertySegment),
    TypeCast(TypeSegment),
    Operation(OperationSegment),
    Count,
    Value,
}

/// Ordered key-name to value pairs addressing one entity.
#[derive(Clone, Debug)]
pub struct KeySegment {
    keys: Vec<(String, KeyValue)>,
    entity_type: Arc<EntityType>,
    navigation_source: Option<Arc<NavigationSource>>,
}

impl KeySegment {
    #[must_use]
    pub fn new(
        keys: Vec<(String, KeyValue)>,
        entity_type: Arc<EntityType>,
        navigation_source: Option<Arc<NavigationSource>>,
    ) -> Self {
        Self {
            keys,
            entity_type,
            navigation_source,
        }
    }

    #[must_use]
    pub fn keys(&self) -> &[(String, KeyValue)] {
        &self.keys
    }

    #[must_use]
    pub fn entity_type(&self) -> &Arc<EntityType> {
        &self.entity_type
    }

    #[must_use]
    pub fn navigation_source(&self) -> Option<&Arc<NavigationSource>> {
        self.navigation_source.as_ref()
    }
}

impl fmt::Display for KeySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        if let [(_, value)] = self.keys.as_slice() {
            write!(f, "{value}")?;
        } else {
            for (i, (name, value)) in self.keys.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{name}={value}")?;
            }
        }
        f.write_str(")")
    }
}

#[derive(Clone, Debug)]
pub struct NavigationPropertySegment {
    property: NavigationProperty,
    declaring_type: Arc<EntityType>,
    target_type: Arc<EntityType>,
    navigation_source: Option<Arc<NavigationSource>>,
}

impl NavigationPropertySegment {
    #[must_use]
    pub fn new(
        property: NavigationProperty,
        declaring_type: Arc<EntityType>,
        target_type: Arc<EntityType>,
        navigation_source: Option<Arc<NavigationSource>>,
    ) -> Self {
        Self {
            property,
            declaring_type,
            target_type,
            navigation_source,
        }
    }

    #[must_use]
    pub fn property(&self) -> &NavigationProperty {
        &self.property
    }

    /// Type that declares the property; a base of the navigated entity's type.
    #[must_use]
    pub fn declaring_type(&self) -> &Arc<EntityType> {
        &self.declaring_type
    }

    #[must_use]
    pub fn target_type(&self) -> &Arc<EntityType> {
        &self.target_type
    }

    /// Target navigation source; `None` for an unbound, non-contained navigation.
    #[must_use]
    pub fn navigation_source(&self) -> Option<&Arc<NavigationSource>> {
        self.navigation_source.as_ref()
    }
}

/// A type cast from `from` to `target`.
#[derive(Clone, Debug)]
pub struct TypeSegment {
    target: Arc<EntityType>,
    from: Arc<EntityType>,
    is_collection: bool,
    navigation_source: Option<Arc<NavigationSource>>,
}

impl TypeSegment {
    #[must_use]
    pub fn new(
        target: Arc<EntityType>,
        from: Arc<EntityType>,
        is_collection: bool,
        navigation_source: Option<Arc<NavigationSource>>,
    ) -> Self {
        Self {
            target,
            from,
            is_collection,
            navigation_source,
        }
    }

    #[must_use]
    pub fn target(&self) -> &Arc<EntityType> {
        &self.target
    }

    #[must_use]
    pub fn from(&self) -> &Arc<EntityType> {
        &self.from
    }

    #[must_use]
    pub fn is_collection(&self) -> bool {
        self.is_collection
    }

    #[must_use]
    pub fn navigation_source(&self) -> Option<&Arc<NavigationSource>> {
        self.navigation_source.as_ref()
    }
}

/// A bound operation or an operation import invocation.
#[derive(Clone, Debug)]
pub struct OperationSegment {
    operations: Vec<Arc<Operation>>,
    parameters: Vec<(String, String)>,
    import_name: Option<String>,
    return_entity: Option<Arc<EntityType>>,
    navigation_source: Option<Arc<NavigationSource>>,
}

impl OperationSegment {
    /// Bound operation; `operations` holds the overloads in resolution order.
    #[must_use]
    pub fn bound(operations: Vec<Arc<Operation>>, parameters: Vec<(String, String)>) -> Self {
        Self {
            operations,
            parameters,
            import_name: None,
            return_entity: None,
            navigation_source: None,
        }
    }

    /// Operation import invoked at the service root.
    #[must_use]
    pub fn import(
        import_name: &str,
        operation: Arc<Operation>,
        parameters: Vec<(String, String)>,
    ) -> Self {
        Self {
            operations: vec![operation],
            parameters,
            import_name: Some(import_name.to_owned()),
            return_entity: None,
            navigation_source: None,
        }
    }

    /// Entity type (and its navigation source) produced by the invocation.
    #[must_use]
    pub fn with_result(
        mut self,
        entity_type: Arc<EntityType>,
        navigation_source: Option<Arc<NavigationSource>>,
    ) -> Self {
        self.return_entity = Some(entity_type);
        self.navigation_source = navigation_source;
        self
    }

    #[must_use]
    pub fn operations(&self) -> &[Arc<Operation>] {
        &self.operations
    }

    /// First resolved operation.
    #[must_use]
    pub fn operation(&self) -> Option<&Arc<Operation>> {
        self.operations.first()
    }

    #[must_use]
    pub fn parameters(&self) -> &[(String, String)] {
        &self.parameters
    }

    #[must_use]
    pub fn import_name(&self) -> Option<&str> {
        self.import_name.as_deref()
    }

    #[must_use]
    pub fn is_import(&self) -> bool {
        self.import_name.is_some()
    }

    #[must_use]
    pub fn return_entity(&self) -> Option<&Arc<EntityType>> {
        self.return_entity.as_ref()
    }

    #[must_use]
    pub fn navigation_source(&self) -> Option<&Arc<NavigationSource>> {
        self.navigation_source.as_ref()
    }

    #[must_use]
    pub fn returns_collection(&self) -> bool {
        self.operation()
            .and_then(|op| op.return_type())
            .is_some_and(|r| r.is_collection)
    }
}

impl PathSegment {
    /// Token used in path templates.
    #[must_use]
    pub fn template_token(&self) -> &'static str {
        match self {
            PathSegment::EntitySet(_) => "entityset",
            PathSegment::Singleton(_) => "singleton",
            PathSegment::Key(_) => "key",
            PathSegment::NavigationProperty(_) => "navigation",
            PathSegment::TypeCast(_) => "cast",
            PathSegment::Operation(op) => {
                let is_action = op
                    .operation()
                    .is_some_and(|o| o.kind() == OperationKind::Action);
                match (op.is_import(), is_action) {
                    (false, true) => "action",
                    (false, false) => "function",
                    (true, true) => "unboundaction",
                    (true, false) => "unboundfunction",
                }
            }
            PathSegment::Count => "$count",
            PathSegment::Value => "$value",
        }
    }

    /// Navigation source this segment addresses, if any.
    #[must_use]
    pub fn navigation_source(&self) -> Option<&Arc<NavigationSource>> {
        match self {
            PathSegment::EntitySet(source) | PathSegment::Singleton(source) => Some(source),
            PathSegment::Key(key) => key.navigation_source(),
            PathSegment::NavigationProperty(nav) => nav.navigation_source(),
            PathSegment::TypeCast(cast) => cast.navigation_source(),
            PathSegment::Operation(op) => op.navigation_source(),
            PathSegment::Count | PathSegment::Value => None,
        }
    }

    /// Entity type this segment yields, if any.
    #[must_use]
    pub fn entity_type(&self) -> Option<&Arc<EntityType>> {
        match self {
            PathSegment::EntitySet(source) | PathSegment::Singleton(source) => {
                Some(source.entity_type())
            }
            PathSegment::Key(key) => Some(key.entity_type()),
            PathSegment::NavigationProperty(nav) => Some(nav.target_type()),
            PathSegment::TypeCast(cast) => Some(cast.target()),
            PathSegment::Operation(op) => op.return_entity(),
            PathSegment::Count | PathSegment::Value => None,
        }
    }

    /// `true` when this segment yields a collection of entities.
    #[must_use]
    pub fn yields_entity_collection(&self) -> bool {
        match self {
            PathSegment::EntitySet(_) => true,
            PathSegment::NavigationProperty(nav) => nav.property().is_collection,
            PathSegment::TypeCast(cast) => cast.is_collection(),
            PathSegment::Operation(op) => op.return_entity().is_some() && op.returns_collection(),
            PathSegment::Singleton(_)
            | PathSegment::Key(_)
            | PathSegment::Count
            | PathSegment::Value => false,
        }
    }
}

impl fmt::Display for PathSegment {
    /// Unescaped `OData` rendering of the segment.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::EntitySet(source) | PathSegment::Singleton(source) => {
                f.write_str(source.name())
            }
            PathSegment::Key(key) => write!(f, "{key}"),
            PathSegment::NavigationProperty(nav) => f.write_str(&nav.property().name),
            PathSegment::TypeCast(cast) => write!(f, "{}", cast.target()),
            PathSegment::Operation(op) => {
                match (op.import_name(), op.operation()) {
                    (Some(import), _) => f.write_str(import)?,
                    (None, Some(operation)) => f.write_str(&operation.full_name())?,
                    (None, None) => {}
                }
                let is_function = op
                    .operation()
                    .is_some_and(|o| o.kind() == OperationKind::Function);
                if is_function {
                    f.write_str("(")?;
                    for (i, (name, value)) in op.parameters().iter().enumerate() {
                        if i > 0 {
                            f.write_str(",")?;
                        }
                        write!(f, "{name}={value}")?;
                    }
                    f.write_str(")")?;
                }
                Ok(())
            }
            PathSegment::Count => f.write_str("$count"),
            PathSegment::Value => f.write_str("$value"),
        }
    }
}
