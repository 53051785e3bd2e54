//! Read-only entity data model consumed by the path, routing and link layers.
//!
//! The model is built once at startup and shared as `Arc<EdmModel>`. Path
//! segments hold `Arc` handles to its navigation sources and types; nothing in
//! this crate mutates a model after construction.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::config::ODataRoutingConfig;
use crate::entity_link::NavigationSourceLinkBuilder;

/// Navigation property declared on an entity type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavigationProperty {
    pub name: String,
    /// Qualified name of the target entity type.
    pub target_type: String,
    pub is_collection: bool,
    pub contains_target: bool,
}

impl NavigationProperty {
    #[must_use]
    pub fn single(name: &str, target_type: &str) -> Self {
        Self {
            name: name.to_owned(),
            target_type: target_type.to_owned(),
            is_collection: false,
            contains_target: false,
        }
    }

    #[must_use]
    pub fn collection(name: &str, target_type: &str) -> Self {
        Self {
            is_collection: true,
            ..Self::single(name, target_type)
        }
    }

    /// Mark the property as a containment navigation.
    #[must_use]
    pub fn contained(mut self) -> Self {
        self.contains_target = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityType {
    namespace: String,
    name: String,
    key: Vec<String>,
    base_type: Option<String>,
    navigation_properties: Vec<NavigationProperty>,
}

impl EntityType {
    #[must_use]
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            namespace: namespace.to_owned(),
            name: name.to_owned(),
            key: Vec::new(),
            base_type: None,
            navigation_properties: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: &[&str]) -> Self {
        self.key = key.iter().map(|k| (*k).to_owned()).collect();
        self
    }

    /// Derive from `base` (qualified name). Key and navigation properties are inherited.
    #[must_use]
    pub fn with_base_type(mut self, base: &str) -> Self {
        self.base_type = Some(base.to_owned());
        self
    }

    #[must_use]
    pub fn with_navigation(mut self, property: NavigationProperty) -> Self {
        self.navigation_properties.push(property);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    #[must_use]
    pub fn base_type(&self) -> Option<&str> {
        self.base_type.as_deref()
    }

    /// Key properties declared directly on this type.
    #[must_use]
    pub fn declared_key(&self) -> &[String] {
        &self.key
    }

    #[must_use]
    pub fn declared_navigation_properties(&self) -> &[NavigationProperty] {
        &self.navigation_properties
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavigationSourceKind {
    EntitySet,
    Singleton,
    ContainedEntitySet,
}

/// An entity set, singleton or contained entity set.
#[derive(Clone, Debug)]
pub struct NavigationSource {
    name: String,
    kind: NavigationSourceKind,
    entity_type: Arc<EntityType>,
    container: String,
    /// Navigation property name to target entity set name.
    bindings: BTreeMap<String, String>,
}

impl NavigationSource {
    #[must_use]
    pub fn entity_set(container: &str, name: &str, entity_type: Arc<EntityType>) -> Self {
        Self {
            name: name.to_owned(),
            kind: NavigationSourceKind::EntitySet,
            entity_type,
            container: container.to_owned(),
            bindings: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn singleton(container: &str, name: &str, entity_type: Arc<EntityType>) -> Self {
        Self {
            kind: NavigationSourceKind::Singleton,
            ..Self::entity_set(container, name, entity_type)
        }
    }

    /// Contained entity set reached through `property` from `parent`.
    #[must_use]
    pub fn contained(
        parent: &NavigationSource,
        property: &str,
        entity_type: Arc<EntityType>,
    ) -> Self {
        Self {
            kind: NavigationSourceKind::ContainedEntitySet,
            ..Self::entity_set(&parent.container, property, entity_type)
        }
    }

    /// Bind navigation property `property` to the entity set or singleton `target`.
    #[must_use]
    pub fn with_binding(mut self, property: &str, target: &str) -> Self {
        self.bindings.insert(property.to_owned(), target.to_owned());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> NavigationSourceKind {
        self.kind
    }

    #[must_use]
    pub fn entity_type(&self) -> &Arc<EntityType> {
        &self.entity_type
    }

    /// Qualified name of the owning entity container.
    #[must_use]
    pub fn container(&self) -> &str {
        &self.container
    }

    #[must_use]
    pub fn binding(&self, property: &str) -> Option<&str> {
        self.bindings.get(property).map(String::as_str)
    }
}

impl PartialEq for NavigationSource {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.name == other.name && self.container == other.container
    }
}

impl Eq for NavigationSource {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationKind {
    Action,
    Function,
}

/// Type reference used for binding parameters and return types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeRef {
    /// Qualified type name.
    pub type_name: String,
    pub is_collection: bool,
}

impl TypeRef {
    #[must_use]
    pub fn single(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_owned(),
            is_collection: false,
        }
    }

    #[must_use]
    pub fn collection(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_owned(),
            is_collection: true,
        }
    }
}

/// An action or function; bound when it has a binding parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Operation {
    namespace: String,
    name: String,
    kind: OperationKind,
    binding: Option<TypeRef>,
    parameters: Vec<String>,
    return_type: Option<TypeRef>,
}

impl Operation {
    #[must_use]
    pub fn action(namespace: &str, name: &str) -> Self {
        Self {
            namespace: namespace.to_owned(),
            name: name.to_owned(),
            kind: OperationKind::Action,
            binding: None,
            parameters: Vec::new(),
            return_type: None,
        }
    }

    #[must_use]
    pub fn function(namespace: &str, name: &str) -> Self {
        Self {
            kind: OperationKind::Function,
            ..Self::action(namespace, name)
        }
    }

    #[must_use]
    pub fn bound_to(mut self, binding: TypeRef) -> Self {
        self.binding = Some(binding);
        self
    }

    #[must_use]
    pub fn with_parameter(mut self, name: &str) -> Self {
        self.parameters.push(name.to_owned());
        self
    }

    #[must_use]
    pub fn returns(mut self, return_type: TypeRef) -> Self {
        self.return_type = Some(return_type);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    #[must_use]
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    #[must_use]
    pub fn binding(&self) -> Option<&TypeRef> {
        self.binding.as_ref()
    }

    /// Non-binding parameter names.
    #[must_use]
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    #[must_use]
    pub fn return_type(&self) -> Option<&TypeRef> {
        self.return_type.as_ref()
    }
}

/// Unbound operation exposed at the service root.
#[derive(Clone, Debug)]
pub struct OperationImport {
    pub name: String,
    pub operation: Arc<Operation>,
    /// Entity set the returned entities belong to, if any.
    pub entity_set: Option<String>,
}

/// Schema type lookup result.
#[derive(Clone, Debug)]
pub enum SchemaType {
    Entity(Arc<EntityType>),
    Complex(String),
}

/// The read-only model.
#[derive(Clone)]
pub struct EdmModel {
    namespace: String,
    container: String,
    entity_types: BTreeMap<String, Arc<EntityType>>,
    complex_types: BTreeSet<String>,
    entity_sets: BTreeMap<String, Arc<NavigationSource>>,
    singletons: BTreeMap<String, Arc<NavigationSource>>,
    operations: Vec<Arc<Operation>>,
    operation_imports: BTreeMap<String, Arc<OperationImport>>,
    link_builders: BTreeMap<String, Arc<dyn NavigationSourceLinkBuilder>>,
}

impl fmt::Debug for EdmModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdmModel")
            .field("container", &self.container_name())
            .field("entity_types", &self.entity_types.keys().collect::<Vec<_>>())
            .field("entity_sets", &self.entity_sets.keys().collect::<Vec<_>>())
            .field("singletons", &self.singletons.keys().collect::<Vec<_>>())
            .field("operations", &self.operations.len())
            .field("link_builders", &self.link_builders.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl EdmModel {
    #[must_use]
    pub fn new(namespace: &str, container: &str) -> Self {
        Self {
            namespace: namespace.to_owned(),
            container: container.to_owned(),
            entity_types: BTreeMap::new(),
            complex_types: BTreeSet::new(),
            entity_sets: BTreeMap::new(),
            singletons: BTreeMap::new(),
            operations: Vec::new(),
            operation_imports: BTreeMap::new(),
            link_builders: BTreeMap::new(),
        }
    }

    /// Empty model whose container comes from configuration.
    #[must_use]
    pub fn from_config(config: &ODataRoutingConfig) -> Self {
        Self::new(&config.default_namespace, &config.default_container)
    }

    /// Qualified name of the default entity container.
    #[must_use]
    pub fn container_name(&self) -> String {
        format!("{}.{}", self.namespace, self.container)
    }

    pub fn add_entity_type(&mut self, entity_type: EntityType) -> Arc<EntityType> {
        let entity_type = Arc::new(entity_type);
        self.entity_types
            .insert(entity_type.full_name(), Arc::clone(&entity_type));
        entity_type
    }

    pub fn add_complex_type(&mut self, qualified_name: &str) {
        self.complex_types.insert(qualified_name.to_owned());
    }

    pub fn add_entity_set(
        &mut self,
        name: &str,
        entity_type: &Arc<EntityType>,
    ) -> Arc<NavigationSource> {
        self.insert_entity_set(NavigationSource::entity_set(
            &self.container_name(),
            name,
            Arc::clone(entity_type),
        ))
    }

    /// Register a prepared entity set (e.g. one carrying navigation bindings).
    pub fn insert_entity_set(&mut self, set: NavigationSource) -> Arc<NavigationSource> {
        let set = Arc::new(set);
        self.entity_sets.insert(set.name().to_owned(), Arc::clone(&set));
        set
    }

    pub fn add_singleton(
        &mut self,
        name: &str,
        entity_type: &Arc<EntityType>,
    ) -> Arc<NavigationSource> {
        let singleton = Arc::new(NavigationSource::singleton(
            &self.container_name(),
            name,
            Arc::clone(entity_type),
        ));
        self.singletons
            .insert(singleton.name().to_owned(), Arc::clone(&singleton));
        singleton
    }

    pub fn add_operation(&mut self, operation: Operation) -> Arc<Operation> {
        let operation = Arc::new(operation);
        self.operations.push(Arc::clone(&operation));
        operation
    }

    pub fn add_operation_import(
        &mut self,
        name: &str,
        operation: &Arc<Operation>,
        entity_set: Option<&str>,
    ) -> Arc<OperationImport> {
        let import = Arc::new(OperationImport {
            name: name.to_owned(),
            operation: Arc::clone(operation),
            entity_set: entity_set.map(str::to_owned),
        });
        self.operation_imports
            .insert(name.to_owned(), Arc::clone(&import));
        import
    }

    /// Attach a link-builder annotation to a navigation source.
    pub fn set_link_builder(
        &mut self,
        navigation_source: &str,
        builder: Arc<dyn NavigationSourceLinkBuilder>,
    ) {
        self.link_builders
            .insert(navigation_source.to_owned(), builder);
    }

    #[must_use]
    pub fn link_builder(
        &self,
        navigation_source: &str,
    ) -> Option<&Arc<dyn NavigationSourceLinkBuilder>> {
        self.link_builders.get(navigation_source)
    }

    #[must_use]
    pub fn entity_type(&self, qualified_name: &str) -> Option<&Arc<EntityType>> {
        self.entity_types.get(qualified_name)
    }

    #[must_use]
    pub fn schema_type(&self, qualified_name: &str) -> Option<SchemaType> {
        if let Some(entity) = self.entity_types.get(qualified_name) {
            return Some(SchemaType::Entity(Arc::clone(entity)));
        }
        self.complex_types
            .get(qualified_name)
            .map(|name| SchemaType::Complex(name.clone()))
    }

    #[must_use]
    pub fn entity_set(&self, name: &str) -> Option<&Arc<NavigationSource>> {
        self.entity_sets.get(name)
    }

    #[must_use]
    pub fn singleton(&self, name: &str) -> Option<&Arc<NavigationSource>> {
        self.singletons.get(name)
    }

    #[must_use]
    pub fn operation_import(&self, name: &str) -> Option<&Arc<OperationImport>> {
        self.operation_imports.get(name)
    }

    /// Bound operations named `qualified_name`, in registration order.
    pub fn bound_operations<'a>(
        &'a self,
        qualified_name: &'a str,
    ) -> impl Iterator<Item = &'a Arc<Operation>> + 'a {
        self.operations
            .iter()
            .filter(move |op| op.is_bound() && op.full_name() == qualified_name)
    }

    /// Key properties of `entity_type`, inherited from the nearest base type that declares one.
    #[must_use]
    pub fn key_of<'a>(&'a self, entity_type: &'a EntityType) -> &'a [String] {
        let mut current = entity_type;
        loop {
            if !current.key.is_empty() {
                return &current.key;
            }
            match current.base_type.as_deref().and_then(|b| self.entity_types.get(b)) {
                Some(base) => current = &**base,
                None => return &[],
            }
        }
    }

    /// Find a navigation property on `entity_type` or any of its base types.
    #[must_use]
    pub fn find_navigation_property<'a>(
        &'a self,
        entity_type: &'a EntityType,
        name: &str,
    ) -> Option<(&'a NavigationProperty, &'a EntityType)> {
        let mut current = entity_type;
        loop {
            if let Some(nav) = current.navigation_properties.iter().find(|n| n.name == name) {
                return Some((nav, current));
            }
            current = &**self.entity_types.get(current.base_type.as_deref()?)?;
        }
    }

    /// `true` when `derived` is `base` or inherits from it.
    #[must_use]
    pub fn is_or_derives_from(&self, derived: &EntityType, base: &EntityType) -> bool {
        let target = base.full_name();
        let mut current = derived;
        loop {
            if current.full_name() == target {
                return true;
            }
            match current.base_type.as_deref().and_then(|b| self.entity_types.get(b)) {
                Some(next) => current = &**next,
                None => return false,
            }
        }
    }
}
