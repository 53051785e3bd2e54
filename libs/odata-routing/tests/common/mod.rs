#![allow(dead_code)]

use std::sync::Arc;

use odata_routing::edm::{
    EdmModel, EntityType, NavigationProperty, NavigationSource, Operation, TypeRef,
};
use odata_routing::link::{ODataUrlHelper, RouteUrlResolver};
use odata_routing::{DefaultPathHandler, ODataPath, ODataRoutingConfig, PathHandler};
use url::Url;

/// Sales model:
/// - `Customers` (`Sales.Customer`, derived `Sales.VipCustomer`) with contained
///   `Orders`, `Region` bound to `Regions` and, on VIPs only, contained `Perks`
/// - `Regions` with a composite key
/// - singleton `Me`
/// - bound action `Wash`, bound function `TopOrders`, import `Reset`
pub fn sales_model() -> EdmModel {
    let mut model = EdmModel::from_config(&ODataRoutingConfig::default());
    let customer = model.add_entity_type(
        EntityType::new("Sales", "Customer")
            .with_key(&["Id"])
            .with_navigation(NavigationProperty::collection("Orders", "Sales.Order").contained())
            .with_navigation(NavigationProperty::single("Region", "Sales.Region")),
    );
    model.add_entity_type(
        EntityType::new("Sales", "VipCustomer")
            .with_base_type("Sales.Customer")
            .with_navigation(NavigationProperty::collection("Perks", "Sales.Perk").contained()),
    );
    model.add_entity_type(EntityType::new("Sales", "Perk").with_key(&["Id"]));
    model.add_entity_type(EntityType::new("Sales", "Order").with_key(&["Id"]));
    model.add_entity_type(EntityType::new("Sales", "RushOrder").with_base_type("Sales.Order"));
    let region =
        model.add_entity_type(EntityType::new("Sales", "Region").with_key(&["Code", "Zone"]));
    model.add_complex_type("Sales.Address");

    let container = model.container_name();
    model.insert_entity_set(
        NavigationSource::entity_set(&container, "Customers", Arc::clone(&customer))
            .with_binding("Region", "Regions"),
    );
    model.add_entity_set("Regions", &region);
    model.add_singleton("Me", &customer);

    model.add_operation(
        Operation::action("Sales", "Wash").bound_to(TypeRef::single("Sales.Customer")),
    );
    model.add_operation(
        Operation::action("Sales", "Wash").bound_to(TypeRef::collection("Sales.Customer")),
    );
    model.add_operation(
        Operation::function("Sales", "TopOrders")
            .bound_to(TypeRef::single("Sales.Customer"))
            .with_parameter("count")
            .returns(TypeRef::collection("Sales.Order")),
    );
    let reset = model.add_operation(Operation::action("Sales", "Reset"));
    model.add_operation_import("Reset", &reset, None);
    model
}

pub fn parse(model: &EdmModel, path: &str) -> ODataPath {
    DefaultPathHandler
        .parse(model, path)
        .unwrap_or_else(|e| panic!("failed to parse '{path}': {e}"))
}

pub fn url_helper() -> ODataUrlHelper {
    let config = ODataRoutingConfig::default();
    let resolver =
        RouteUrlResolver::from_config(Url::parse("https://shop.example.com/").unwrap(), &config);
    ODataUrlHelper::from_config(Arc::new(resolver), &config)
        .with_path_handler(Arc::new(DefaultPathHandler))
}
