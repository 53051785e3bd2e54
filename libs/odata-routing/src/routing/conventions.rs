//! Standard routing conventions.
//!
//! Each convention matches on the path template and the request method and
//! picks the first candidate action name the controller exposes.

use std::sync::Arc;

use crate::edm::{Operation, OperationKind};
use crate::path::{KeySegment, KeyValue, ODataPath, OperationSegment, PathSegment};
use crate::routing::{
    ActionMap, ControllerContext, NAVIGATION_PROPERTY, RouteData, RoutingConvention,
};

fn segment_name(path: &ODataPath, index: usize) -> Option<&str> {
    match path.segments().get(index)? {
        PathSegment::EntitySet(source) | PathSegment::Singleton(source) => Some(source.name()),
        PathSegment::TypeCast(cast) => Some(cast.target().name()),
        _ => None,
    }
}

fn key_at(path: &ODataPath, index: usize) -> Option<&KeySegment> {
    match path.segments().get(index)? {
        PathSegment::Key(key) => Some(key),
        _ => None,
    }
}

/// Operation segment at `index` whose first overload is of `kind`.
fn operation_at(
    path: &ODataPath,
    index: usize,
    kind: OperationKind,
) -> Option<(&OperationSegment, &Arc<Operation>)> {
    match path.segments().get(index)? {
        PathSegment::Operation(segment) => segment
            .operation()
            .filter(|op| op.kind() == kind)
            .map(|op| (segment, op)),
        _ => None,
    }
}

/// Path template without a trailing `/$count`, and whether one was removed.
fn strip_count(path: &ODataPath) -> (String, bool) {
    let template = path.path_template();
    match template.strip_suffix("/$count") {
        Some(stripped) => (stripped.to_owned(), true),
        None => (template, false),
    }
}

/// Verb prefix of read/write actions, `None` for methods conventions never route.
fn verb(ctx: &ControllerContext) -> Option<&'static str> {
    match ctx.method().as_str() {
        "GET" => Some("Get"),
        "POST" => Some("Post"),
        "PUT" => Some("Put"),
        "PATCH" | "MERGE" => Some("Patch"),
        "DELETE" => Some("Delete"),
        _ => None,
    }
}

fn record_parameters(segment: &OperationSegment, route_data: &mut RouteData) {
    for (name, value) in segment.parameters() {
        route_data.insert(name.clone(), KeyValue::parse_literal(value).to_route_value());
    }
}

/// `GET`/`POST` on `~/entityset`, `~/entityset/cast` and their `$count`.
#[derive(Clone, Copy, Debug, Default)]
pub struct EntitySetRoutingConvention;

impl RoutingConvention for EntitySetRoutingConvention {
    fn name(&self) -> &'static str {
        "entity_set"
    }

    fn select_action(
        &self,
        path: &ODataPath,
        ctx: &ControllerContext,
        actions: &dyn ActionMap,
        _route_data: &mut RouteData,
    ) -> Option<String> {
        let (template, is_count) = strip_count(path);
        let set = segment_name(path, 0)?;
        let entity_type = path.segments()[0].entity_type()?.name();

        match (ctx.method().as_str(), template.as_str(), is_count) {
            ("GET", "~/entityset", _) => {
                actions.find_matching_action(&[&format!("Get{set}"), "Get"])
            }
            ("POST", "~/entityset", false) => {
                actions.find_matching_action(&[&format!("Post{entity_type}"), "Post"])
            }
            ("GET", "~/entityset/cast", _) => {
                let cast = segment_name(path, 1)?;
                actions.find_matching_action(&[
                    &format!("Get{set}From{cast}"),
                    &format!("GetFrom{cast}"),
                ])
            }
            ("POST", "~/entityset/cast", false) => {
                let cast = segment_name(path, 1)?;
                actions.find_matching_action(&[
                    &format!("Post{entity_type}From{cast}"),
                    &format!("PostFrom{cast}"),
                ])
            }
            _ => None,
        }
    }
}

/// `GET`/`PUT`/`PATCH` on `~/singleton` and `~/singleton/cast`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SingletonRoutingConvention;

impl RoutingConvention for SingletonRoutingConvention {
    fn name(&self) -> &'static str {
        "singleton"
    }

    fn select_action(
        &self,
        path: &ODataPath,
        ctx: &ControllerContext,
        actions: &dyn ActionMap,
        _route_data: &mut RouteData,
    ) -> Option<String> {
        let verb = match ctx.method().as_str() {
            "GET" | "PUT" | "PATCH" | "MERGE" => verb(ctx)?,
            _ => return None,
        };
        let singleton = segment_name(path, 0)?;

        match path.path_template().as_str() {
            "~/singleton" => actions.find_matching_action(&[&format!("{verb}{singleton}"), verb]),
            "~/singleton/cast" => {
                let cast = segment_name(path, 1)?;
                actions.find_matching_action(&[
                    &format!("{verb}{singleton}From{cast}"),
                    &format!("{verb}From{cast}"),
                ])
            }
            _ => None,
        }
    }
}

/// `GET`/`PUT`/`PATCH`/`DELETE` on `~/entityset/key` and `~/entityset/key/cast`.
#[derive(Clone, Copy, Debug, Default)]
pub struct EntityRoutingConvention;

impl RoutingConvention for EntityRoutingConvention {
    fn name(&self) -> &'static str {
        "entity"
    }

    fn select_action(
        &self,
        path: &ODataPath,
        ctx: &ControllerContext,
        actions: &dyn ActionMap,
        route_data: &mut RouteData,
    ) -> Option<String> {
        let verb = match ctx.method().as_str() {
            "GET" | "PUT" | "PATCH" | "MERGE" | "DELETE" => verb(ctx)?,
            _ => return None,
        };
        if !matches!(path.path_template().as_str(), "~/entityset/key" | "~/entityset/key/cast") {
            return None;
        }

        let entity_type = path.last_segment().entity_type()?.name();
        let action = actions.find_matching_action(&[&format!("{verb}{entity_type}"), verb])?;
        route_data.add_key(key_at(path, 1)?);
        Some(action)
    }
}

/// Navigation properties of a keyed entity or singleton, optionally cast first.
#[derive(Clone, Copy, Debug, Default)]
pub struct NavigationRoutingConvention;

impl RoutingConvention for NavigationRoutingConvention {
    fn name(&self) -> &'static str {
        "navigation"
    }

    fn select_action(
        &self,
        path: &ODataPath,
        ctx: &ControllerContext,
        actions: &dyn ActionMap,
        route_data: &mut RouteData,
    ) -> Option<String> {
        let (template, is_count) = strip_count(path);
        let keyed = match template.strip_suffix("/navigation")? {
            "~/entityset/key" | "~/entityset/key/cast" => true,
            "~/singleton" | "~/singleton/cast" => false,
            _ => return None,
        };

        let index = template.matches('/').count() - 1;
        let PathSegment::NavigationProperty(nav) = &path.segments()[index] else {
            return None;
        };
        let property = &nav.property().name;
        let declaring = path.segments()[index - 1].entity_type()?.name();

        let action = match (ctx.method().as_str(), is_count, nav.property().is_collection) {
            ("GET", _, _) => actions.find_matching_action(&[
                &format!("Get{property}From{declaring}"),
                &format!("Get{property}"),
            ]),
            ("POST", false, true) => actions.find_matching_action(&[
                &format!("PostTo{property}From{declaring}"),
                &format!("PostTo{property}"),
            ]),
            ("PUT" | "PATCH" | "MERGE", false, false) => {
                let verb = verb(ctx)?;
                actions.find_matching_action(&[
                    &format!("{verb}To{property}From{declaring}"),
                    &format!("{verb}To{property}"),
                ])
            }
            _ => None,
        }?;

        if keyed {
            route_data.add_key(key_at(path, 1)?);
        }
        route_data.insert(NAVIGATION_PROPERTY, property.clone());
        Some(action)
    }
}

/// `POST` invocations of bound actions.
#[derive(Clone, Copy, Debug, Default)]
pub struct ActionRoutingConvention;

impl RoutingConvention for ActionRoutingConvention {
    fn name(&self) -> &'static str {
        "action"
    }

    fn select_action(
        &self,
        path: &ODataPath,
        ctx: &ControllerContext,
        actions: &dyn ActionMap,
        route_data: &mut RouteData,
    ) -> Option<String> {
        if ctx.method().as_str() != "POST" {
            return None;
        }
        let last = path.len() - 1;
        let action = |is_collection| {
            operation_at(path, last, OperationKind::Action)
                .and_then(|(_, op)| op.select_action(actions, is_collection))
        };

        match path.path_template().as_str() {
            "~/entityset/key/cast/action" | "~/entityset/key/action" => {
                let name = action(false)?;
                route_data.add_key(key_at(path, 1)?);
                Some(name)
            }
            "~/entityset/cast/action" | "~/entityset/action" => action(true),
            "~/singleton/action" | "~/singleton/cast/action" => action(false),
            _ => None,
        }
    }
}

/// `GET` invocations of bound functions, including `$count` over their results.
#[derive(Clone, Copy, Debug, Default)]
pub struct FunctionRoutingConvention;

impl RoutingConvention for FunctionRoutingConvention {
    fn name(&self) -> &'static str {
        "function"
    }

    fn select_action(
        &self,
        path: &ODataPath,
        ctx: &ControllerContext,
        actions: &dyn ActionMap,
        route_data: &mut RouteData,
    ) -> Option<String> {
        if ctx.method().as_str() != "GET" {
            return None;
        }
        let (template, _) = strip_count(path);
        let (keyed, is_collection) = match template.as_str() {
            "~/entityset/key/function" | "~/entityset/key/cast/function" => (true, false),
            "~/entityset/function" | "~/entityset/cast/function" => (false, true),
            "~/singleton/function" | "~/singleton/cast/function" => (false, false),
            _ => return None,
        };

        let index = template.matches('/').count() - 1;
        let (segment, function) = operation_at(path, index, OperationKind::Function)?;
        let name = function.select_action(actions, is_collection)?;
        if keyed {
            route_data.add_key(key_at(path, 1)?);
        }
        record_parameters(segment, route_data);
        Some(name)
    }
}

/// Operation imports at the service root: `POST` for actions, `GET` for functions.
#[derive(Clone, Copy, Debug, Default)]
pub struct OperationImportRoutingConvention;

impl RoutingConvention for OperationImportRoutingConvention {
    fn name(&self) -> &'static str {
        "operation_import"
    }

    fn select_action(
        &self,
        path: &ODataPath,
        ctx: &ControllerContext,
        actions: &dyn ActionMap,
        route_data: &mut RouteData,
    ) -> Option<String> {
        let (template, _) = strip_count(path);
        let kind = match (ctx.method().as_str(), template.as_str()) {
            ("POST", "~/unboundaction") if !path.is_count_request() => OperationKind::Action,
            ("GET", "~/unboundfunction") => OperationKind::Function,
            _ => return None,
        };

        let (segment, _) = operation_at(path, 0, kind)?;
        let name = actions.find_matching_action(&[segment.import_name()?])?;
        record_parameters(segment, route_data);
        Some(name)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::edm::{EdmModel, EntityType, NavigationProperty, TypeRef};
    use crate::path::{DefaultPathHandler, PathHandler};
    use crate::routing::{ActionTable, KEY};
    use http::Method;

    fn model() -> EdmModel {
        let mut model = EdmModel::new("Sales", "Container");
        let car = model.add_entity_type(
            EntityType::new("Sales", "Car")
                .with_key(&["Id"])
                .with_navigation(
                    NavigationProperty::collection("Wheels", "Sales.Wheel").contained(),
                )
                .with_navigation(NavigationProperty::single("Owner", "Sales.Person")),
        );
        model.add_entity_type(EntityType::new("Sales", "SportsCar").with_base_type("Sales.Car"));
        model.add_entity_type(EntityType::new("Sales", "Wheel").with_key(&["Position"]));
        let person = model.add_entity_type(EntityType::new("Sales", "Person").with_key(&["Id"]));
        model.add_entity_set("Cars", &car);
        model.add_entity_set("People", &person);
        model.add_singleton("Fleet", &car);
        model.add_operation(
            Operation::action("Sales", "Wash").bound_to(TypeRef::single("Sales.Car")),
        );
        model.add_operation(
            Operation::action("Sales", "Wash").bound_to(TypeRef::collection("Sales.Car")),
        );
        model.add_operation(
            Operation::function("Sales", "Mileage")
                .bound_to(TypeRef::single("Sales.Car"))
                .with_parameter("unit"),
        );
        model.add_operation(
            Operation::function("Sales", "Fastest")
                .bound_to(TypeRef::collection("Sales.Car"))
                .returns(TypeRef::collection("Sales.Car")),
        );
        let reset = model.add_operation(Operation::action("Sales", "ResetAll"));
        model.add_operation_import("ResetAll", &reset, None);
        let top = model.add_operation(
            Operation::function("Sales", "TopCars")
                .with_parameter("n")
                .returns(TypeRef::collection("Sales.Car")),
        );
        model.add_operation_import("TopCars", &top, Some("Cars"));
        model
    }

    fn select(
        convention: &dyn RoutingConvention,
        method: Method,
        path: &str,
        actions: &[&str],
    ) -> (Option<String>, RouteData) {
        let path = DefaultPathHandler.parse(&model(), path).unwrap();
        let ctx = ControllerContext::new(method).with_path(path.clone());
        let actions: ActionTable = actions.iter().copied().collect();
        let mut route_data = RouteData::new();
        let selected = convention.select_action(&path, &ctx, &actions, &mut route_data);
        (selected, route_data)
    }

    #[test]
    fn test_action_on_keyed_entity_writes_key() {
        let (selected, data) =
            select(&ActionRoutingConvention, Method::POST, "Cars(7)/Sales.Wash", &["Wash"]);
        assert_eq!(selected.as_deref(), Some("Wash"));
        assert_eq!(data.get(KEY), Some("7"));
    }

    #[test]
    fn test_action_requires_post() {
        let (selected, data) =
            select(&ActionRoutingConvention, Method::GET, "Cars(7)/Sales.Wash", &["Wash"]);
        assert_eq!(selected, None);
        assert!(data.is_empty());
    }

    #[test]
    fn test_action_key_written_only_when_found() {
        let (selected, data) =
            select(&ActionRoutingConvention, Method::POST, "Cars(7)/Sales.Wash", &["Paint"]);
        assert_eq!(selected, None);
        assert!(data.is_empty());
    }

    #[test]
    fn test_action_overloads_by_path_shape() {
        let actions = ["WashOnCar", "WashOnCollectionOfCar"];
        let (single, _) =
            select(&ActionRoutingConvention, Method::POST, "Cars(1)/Sales.Wash", &actions);
        let (collection, data) =
            select(&ActionRoutingConvention, Method::POST, "Cars/Sales.Wash", &actions);
        assert_eq!(single.as_deref(), Some("WashOnCar"));
        assert_eq!(collection.as_deref(), Some("WashOnCollectionOfCar"));
        assert!(data.is_empty());

        let (on_singleton, _) =
            select(&ActionRoutingConvention, Method::POST, "Fleet/Sales.Wash", &actions);
        assert_eq!(on_singleton.as_deref(), Some("WashOnCar"));

        let (cast, data) = select(
            &ActionRoutingConvention,
            Method::POST,
            "Cars(2)/Sales.SportsCar/Sales.Wash",
            &actions,
        );
        assert_eq!(cast.as_deref(), Some("WashOnCar"));
        assert_eq!(data.get(KEY), Some("2"));
    }

    #[test]
    fn test_action_ignores_functions() {
        let (selected, _) = select(
            &ActionRoutingConvention,
            Method::POST,
            "Cars(1)/Sales.Mileage(unit='km')",
            &["Mileage"],
        );
        assert_eq!(selected, None);
    }

    #[test]
    fn test_entity_set_convention() {
        let conv = EntitySetRoutingConvention;
        assert_eq!(select(&conv, Method::GET, "Cars", &["Get"]).0.as_deref(), Some("Get"));
        assert_eq!(
            select(&conv, Method::GET, "Cars", &["GetCars", "Get"]).0.as_deref(),
            Some("GetCars")
        );
        assert_eq!(
            select(&conv, Method::GET, "Cars/$count", &["GetCars"]).0.as_deref(),
            Some("GetCars")
        );
        assert_eq!(select(&conv, Method::POST, "Cars", &["PostCar"]).0.as_deref(), Some("PostCar"));
        assert_eq!(select(&conv, Method::POST, "Cars/$count", &["Post"]).0, None);
        assert_eq!(
            select(&conv, Method::GET, "Cars/Sales.SportsCar", &["GetFromSportsCar"]).0.as_deref(),
            Some("GetFromSportsCar")
        );
        assert_eq!(select(&conv, Method::DELETE, "Cars", &["Delete"]).0, None);
    }

    #[test]
    fn test_singleton_convention() {
        let conv = SingletonRoutingConvention;
        assert_eq!(
            select(&conv, Method::GET, "Fleet", &["GetFleet"]).0.as_deref(),
            Some("GetFleet")
        );
        assert_eq!(select(&conv, Method::PATCH, "Fleet", &["Patch"]).0.as_deref(), Some("Patch"));
        assert_eq!(
            select(&conv, Method::GET, "Fleet/Sales.SportsCar", &["GetFromSportsCar"]).0.as_deref(),
            Some("GetFromSportsCar")
        );
        assert_eq!(select(&conv, Method::DELETE, "Fleet", &["Delete"]).0, None);
    }

    #[test]
    fn test_entity_convention_writes_key() {
        let conv = EntityRoutingConvention;
        let (selected, data) = select(&conv, Method::DELETE, "Cars(3)", &["Delete"]);
        assert_eq!(selected.as_deref(), Some("Delete"));
        assert_eq!(data.get(KEY), Some("3"));

        let (selected, data) =
            select(&conv, Method::PUT, "Cars(4)/Sales.SportsCar", &["PutSportsCar", "Put"]);
        assert_eq!(selected.as_deref(), Some("PutSportsCar"));
        assert_eq!(data.get(KEY), Some("4"));

        let (selected, data) = select(&conv, Method::POST, "Cars(3)", &["Post"]);
        assert_eq!(selected, None);
        assert!(data.is_empty());
    }

    #[test]
    fn test_navigation_convention() {
        let conv = NavigationRoutingConvention;
        let (selected, data) = select(&conv, Method::GET, "Cars(5)/Wheels", &["GetWheels"]);
        assert_eq!(selected.as_deref(), Some("GetWheels"));
        assert_eq!(data.get(KEY), Some("5"));
        assert_eq!(data.get(NAVIGATION_PROPERTY), Some("Wheels"));

        let (selected, _) =
            select(&conv, Method::GET, "Cars(5)/Wheels/$count", &["GetWheelsFromCar"]);
        assert_eq!(selected.as_deref(), Some("GetWheelsFromCar"));

        let (selected, _) = select(&conv, Method::POST, "Cars(5)/Wheels", &["PostToWheels"]);
        assert_eq!(selected.as_deref(), Some("PostToWheels"));

        let (selected, data) = select(&conv, Method::PUT, "Fleet/Owner", &["PutToOwner"]);
        assert_eq!(selected.as_deref(), Some("PutToOwner"));
        assert_eq!(data.get(KEY), None);

        let (selected, _) = select(&conv, Method::POST, "Fleet/Owner", &["PostToOwner"]);
        assert_eq!(selected, None);

        let (selected, _) = select(
            &conv,
            Method::GET,
            "Cars(5)/Sales.SportsCar/Wheels",
            &["GetWheelsFromSportsCar"],
        );
        assert_eq!(selected.as_deref(), Some("GetWheelsFromSportsCar"));
    }

    #[test]
    fn test_function_convention_records_parameters() {
        let conv = FunctionRoutingConvention;
        let (selected, data) =
            select(&conv, Method::GET, "Cars(9)/Sales.Mileage(unit='km')", &["Mileage"]);
        assert_eq!(selected.as_deref(), Some("Mileage"));
        assert_eq!(data.get(KEY), Some("9"));
        assert_eq!(data.get("unit"), Some("km"));

        let (selected, _) = select(
            &conv,
            Method::GET,
            "Cars/Sales.Fastest()/$count",
            &["FastestOnCollectionOfCar"],
        );
        assert_eq!(selected.as_deref(), Some("FastestOnCollectionOfCar"));

        let (selected, _) =
            select(&conv, Method::POST, "Cars(9)/Sales.Mileage(unit='km')", &["Mileage"]);
        assert_eq!(selected, None);
    }

    #[test]
    fn test_operation_import_convention() {
        let conv = OperationImportRoutingConvention;
        assert_eq!(
            select(&conv, Method::POST, "ResetAll", &["ResetAll"]).0.as_deref(),
            Some("ResetAll")
        );
        assert_eq!(select(&conv, Method::GET, "ResetAll", &["ResetAll"]).0, None);

        let (selected, data) = select(&conv, Method::GET, "TopCars(n=3)", &["TopCars"]);
        assert_eq!(selected.as_deref(), Some("TopCars"));
        assert_eq!(data.get("n"), Some("3"));
        assert_eq!(
            select(&conv, Method::GET, "TopCars(n=3)/$count", &["TopCars"]).0.as_deref(),
            Some("TopCars")
        );
    }
}
