mod common;

use std::sync::Arc;

use relocation_calc::accessibility::AccessibilityService;
use relocation_calc::calculations::vehicles::VehicleCostTable;
use relocation_calc::calculations::{ComputedField, MonthlyCostService};
use relocation_calc::survey::{
    operation_name, AddressUpdate, DeferredOperations, OperationStatus, ResultsSectionUpdater,
    SectionAction,
};
use serde_json::json;

use common::{FixedPredictor, RecordingGateway};

fn updater(
    gateway: Arc<RecordingGateway>,
) -> ResultsSectionUpdater<FixedPredictor, RecordingGateway> {
    let costs = MonthlyCostService::new(
        Arc::new(FixedPredictor(1)),
        Arc::new(VehicleCostTable::builtin()),
    );
    ResultsSectionUpdater::new(
        Arc::new(costs),
        Arc::new(AccessibilityService::new(gateway)),
        common::config(),
    )
}

fn entered(section: &str) -> Vec<SectionAction> {
    vec![
        SectionAction {
            section: "home".to_string(),
            action: Some("start".to_string()),
        },
        SectionAction {
            section: section.to_string(),
            action: Some("start".to_string()),
        },
    ]
}

#[tokio::test]
async fn ignores_actions_outside_the_results_section() {
    let gateway = Arc::new(RecordingGateway::default());
    let updater = updater(gateway.clone());
    let interview = common::interview(&[("office", "ok")]);

    let update = updater
        .on_section_actions(&interview, &entered("destinations"))
        .await;

    assert!(update.is_empty());
    assert!(update.field_updates().is_empty());
    assert!(updater.on_section_actions(&interview, &[]).await.is_empty());
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn schedules_accessibility_and_returns_costs_immediately() {
    let gateway = Arc::new(RecordingGateway::default());
    let operations = Arc::new(DeferredOperations::new());
    let updater = updater(gateway.clone()).with_operations(operations.clone());
    let mut interview = common::interview(&[("office", "ok")]);

    let update = updater
        .on_section_actions(&interview, &entered("results"))
        .await;

    let fields = update.field_updates();
    assert_eq!(fields["addresses.home-1.monthlyCost"]["housingCostMonthly"], json!(1500.0));
    assert_eq!(fields["addresses.home-1.monthlyCost"]["currentNumberOfVehicles"], json!(1));
    assert_eq!(fields["addresses.home-1.monthlyCost"]["predictedNumberOfVehicles"], json!(1));
    assert_eq!(fields["addresses.home-1.accessibilityMapsByMode"], json!("calculating"));
    assert_eq!(fields["addresses.home-1.routingTimeDistances"], json!("calculating"));
    assert_eq!(update.scheduled, vec![operation_name("home-1")]);

    update.apply(&mut interview);
    let address = common::address(&interview, "home-1");
    assert_eq!(address.routing_time_distances, Some(ComputedField::Calculating));
    assert!(address.monthly_cost.is_some());

    match operations.wait(&operation_name("home-1")).await {
        OperationStatus::Completed(AddressUpdate::Accessibility {
            address_id,
            maps,
            routing,
        }) => {
            assert_eq!(address_id, "home-1");
            assert!(maps.ready().and_then(|maps| maps.transit.as_ref()).is_some());
            let routing = routing.ready().expect("routing computed");
            assert!(routing["office"].is_some());
        }
        other => panic!("expected accessibility update, got {other:?}"),
    }
    assert_eq!(gateway.route_requests().len(), 1);
}

#[tokio::test]
async fn without_registry_accessibility_is_unavailable() {
    let gateway = Arc::new(RecordingGateway::default());
    let updater = updater(gateway.clone());
    let interview = common::interview(&[("office", "ok")]);

    let update = updater.refresh(&interview).await;

    let fields = update.field_updates();
    assert_eq!(fields["addresses.home-1.accessibilityMapsByMode"], json!(null));
    assert_eq!(fields["addresses.home-1.routingTimeDistances"], json!(null));
    assert!(update.scheduled.is_empty());
    assert!(updater.operations().is_none());
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn address_without_point_is_not_scheduled() {
    let gateway = Arc::new(RecordingGateway::default());
    let operations = Arc::new(DeferredOperations::new());
    let updater = updater(gateway.clone()).with_operations(operations.clone());
    let mut interview = common::interview(&[("office", "ok")]);
    if let Some(address) = interview.addresses.get_mut("home-1") {
        address.geography = None;
    }

    let update = updater.refresh(&interview).await;

    let fields = update.field_updates();
    assert_eq!(fields["addresses.home-1.routingTimeDistances"], json!(null));
    assert!(operations.names().is_empty());
    assert_eq!(
        operations.status(&operation_name("home-1")),
        OperationStatus::Unknown
    );
}

#[tokio::test]
async fn every_address_gets_its_own_operation() {
    let gateway = Arc::new(RecordingGateway::default());
    let operations = Arc::new(DeferredOperations::new());
    let updater = updater(gateway.clone()).with_operations(operations.clone());
    let mut interview = common::interview(&[("office", "ok")]);
    let mut second = common::address(&interview, "home-1");
    second.uuid = "home-2".to_string();
    second.sequence = 2;
    second.rent_monthly = Some(900.0);
    interview.addresses.insert("home-2".to_string(), second);

    let update = updater.refresh(&interview).await;

    assert_eq!(
        update.scheduled,
        vec![operation_name("home-1"), operation_name("home-2")]
    );
    assert_eq!(update.updates.len(), 4);
    assert_eq!(
        update.field_updates()["addresses.home-2.monthlyCost"]["housingCostMonthly"],
        json!(900.0)
    );
    for name in operations.names() {
        assert!(matches!(
            operations.wait(&name).await,
            OperationStatus::Completed(_)
        ));
    }
}
