#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end dispatch: parse a request path, pick the controller action.

mod common;

use http::Method;
use odata_routing::routing::{KEY, NAVIGATION_PROPERTY};
use odata_routing::{ActionTable, ControllerContext, Error, RouteData, RoutingConventions};

fn dispatch(method: Method, path: &str, actions: &[&str]) -> (Option<String>, RouteData) {
    let model = common::sales_model();
    let ctx = ControllerContext::new(method).with_path(common::parse(&model, path));
    let actions: ActionTable = actions.iter().copied().collect();
    let mut route_data = RouteData::new();
    let selected = RoutingConventions::default()
        .select_action(&ctx, &actions, &mut route_data)
        .unwrap();
    (selected, route_data)
}

#[test]
fn post_bound_action_on_keyed_entity() {
    let (selected, data) = dispatch(Method::POST, "Customers(42)/Sales.Wash", &["Wash", "Get"]);
    assert_eq!(selected.as_deref(), Some("Wash"));
    assert_eq!(data.get(KEY), Some("42"));
}

#[test]
fn get_on_action_path_does_not_match() {
    let (selected, data) = dispatch(Method::GET, "Customers(42)/Sales.Wash", &["Wash"]);
    assert_eq!(selected, None);
    assert!(data.is_empty());
}

#[test]
fn collection_and_single_overloads_are_split_by_path_shape() {
    let actions = ["WashOnCustomer", "WashOnCollectionOfCustomer"];
    assert_eq!(
        dispatch(Method::POST, "Customers/Sales.Wash", &actions).0.as_deref(),
        Some("WashOnCollectionOfCustomer")
    );
    assert_eq!(
        dispatch(Method::POST, "Customers(1)/Sales.VipCustomer/Sales.Wash", &actions).0.as_deref(),
        Some("WashOnCustomer")
    );
    assert_eq!(
        dispatch(Method::POST, "Me/Sales.Wash", &actions).0.as_deref(),
        Some("WashOnCustomer")
    );
}

#[test]
fn crud_on_sets_entities_and_singletons() {
    let actions =
        ["GetCustomers", "PostCustomer", "GetCustomer", "PatchCustomer", "Delete", "GetMe"];
    assert_eq!(dispatch(Method::GET, "Customers", &actions).0.as_deref(), Some("GetCustomers"));
    assert_eq!(dispatch(Method::POST, "Customers", &actions).0.as_deref(), Some("PostCustomer"));
    assert_eq!(
        dispatch(Method::GET, "Customers/$count", &actions).0.as_deref(),
        Some("GetCustomers")
    );
    assert_eq!(
        dispatch(Method::PATCH, "Customers(3)", &actions).0.as_deref(),
        Some("PatchCustomer")
    );
    assert_eq!(dispatch(Method::GET, "Me", &actions).0.as_deref(), Some("GetMe"));

    let (selected, data) = dispatch(Method::DELETE, "Customers(3)", &actions);
    assert_eq!(selected.as_deref(), Some("Delete"));
    assert_eq!(data.get(KEY), Some("3"));
}

#[test]
fn navigation_records_key_and_property() {
    let (selected, data) = dispatch(Method::GET, "Customers(8)/Orders", &["GetOrdersFromCustomer"]);
    assert_eq!(selected.as_deref(), Some("GetOrdersFromCustomer"));
    assert_eq!(data.get(KEY), Some("8"));
    assert_eq!(data.get(NAVIGATION_PROPERTY), Some("Orders"));
}

#[test]
fn composite_keys_are_recorded_per_part() {
    let (selected, data) = dispatch(Method::GET, "Regions(Code='EU',Zone=2)", &["Get"]);
    assert_eq!(selected.as_deref(), Some("Get"));
    assert_eq!(data.get("keyCode"), Some("EU"));
    assert_eq!(data.get("keyZone"), Some("2"));
}

#[test]
fn functions_and_imports() {
    let (selected, data) =
        dispatch(Method::GET, "Customers(5)/Sales.TopOrders(count=3)", &["TopOrders"]);
    assert_eq!(selected.as_deref(), Some("TopOrders"));
    assert_eq!(data.get(KEY), Some("5"));
    assert_eq!(data.get("count"), Some("3"));

    assert_eq!(dispatch(Method::POST, "Reset", &["Reset"]).0.as_deref(), Some("Reset"));
}

#[test]
fn unmatched_requests_yield_none() {
    assert_eq!(dispatch(Method::PUT, "Customers", &["Put"]).0, None);
    assert_eq!(dispatch(Method::GET, "Customers(1)", &[]).0, None);
}

#[test]
fn missing_path_is_a_precondition_violation() {
    let err = RoutingConventions::default()
        .select_action(
            &ControllerContext::new(Method::GET),
            &ActionTable::new(),
            &mut RouteData::new(),
        )
        .unwrap_err();
    assert_eq!(err, Error::ArgumentNull("odata_path"));
    assert_eq!(err.kind(), odata_routing::ErrorKind::PreconditionViolation);
}
