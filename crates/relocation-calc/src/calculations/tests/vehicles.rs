use super::common::*;
use crate::calculations::domain::{EngineType, Vehicle, VehicleCategory};
use crate::calculations::vehicles::{
    CarCostAggregator, CarCostError, CarCostEstimate, PredictionError, VehicleCostTable,
};
use serde_json::json;
use std::sync::Arc;

fn aggregator(predictor: StubPredictor, table: VehicleCostTable) -> CarCostAggregator<StubPredictor> {
    CarCostAggregator::new(Arc::new(predictor), Arc::new(table))
}

fn vehicle(sequence: u32, category: Option<VehicleCategory>, engine: Option<EngineType>) -> Vehicle {
    Vehicle {
        sequence,
        uuid: format!("car-{sequence}"),
        nickname: None,
        category,
        engine_type: engine,
    }
}

#[test]
fn average_cost_is_the_mean_of_the_fleet() {
    let aggregator = aggregator(StubPredictor::predicting(1), VehicleCostTable::builtin());
    let gas = vehicle(1, Some(VehicleCategory::PassengerCar), Some(EngineType::Gas));
    let electric = vehicle(2, Some(VehicleCategory::PassengerCar), Some(EngineType::Electric));

    let average = aggregator
        .average_annual_cost(&[&gas, &electric])
        .expect("both vehicles are priced");
    assert!((average - (9_399.17 + 5_947.69) / 2.0).abs() < 1e-9);
}

#[test]
fn empty_fleet_uses_reference_car() {
    let aggregator = aggregator(StubPredictor::predicting(1), VehicleCostTable::builtin());
    assert_eq!(aggregator.average_annual_cost(&[]), Ok(9_399.17));
}

#[test]
fn fleet_costing_fails_closed() {
    let aggregator = aggregator(StubPredictor::predicting(1), VehicleCostTable::builtin());
    let complete = vehicle(1, Some(VehicleCategory::Suv), Some(EngineType::Gas));
    let no_engine = vehicle(2, Some(VehicleCategory::Suv), None);
    let unmapped = vehicle(3, Some(VehicleCategory::Pickup), Some(EngineType::PluginHybrid));
    let unrecognized = vehicle(4, Some(VehicleCategory::Unrecognized), Some(EngineType::Gas));

    assert_eq!(
        aggregator.average_annual_cost(&[&complete, &no_engine]),
        Err(CarCostError::IncompleteVehicle { sequence: 2 })
    );
    assert_eq!(
        aggregator.average_annual_cost(&[&unmapped]),
        Err(CarCostError::UnmappedVehicle {
            sequence: 3,
            category: "pickup",
            engine: "pluginHybrid"
        })
    );
    assert!(matches!(
        aggregator.average_annual_cost(&[&unrecognized]),
        Err(CarCostError::UnmappedVehicle { sequence: 4, .. })
    ));
}

#[test]
fn table_without_reference_car_cannot_price_fleetless_household() {
    let table = VehicleCostTable::from_csv_reader("category,engine,annual_cost\nsuv,gas,1000\n".as_bytes())
        .expect("table parses");
    let aggregator = aggregator(StubPredictor::predicting(1), table);
    assert_eq!(
        aggregator.average_annual_cost(&[]),
        Err(CarCostError::MissingReferenceCost)
    );
}

#[tokio::test]
async fn estimate_reports_counts_and_monthly_cost() {
    let aggregator = aggregator(StubPredictor::predicting(2), VehicleCostTable::builtin());
    let interview = interview_with_cars(json!(60_000), &[("suv", "electric")]);

    let estimate = aggregator
        .estimate(&rented_address(1_000.0), &interview)
        .await;

    assert_eq!(estimate.current_vehicles, 1);
    assert_eq!(estimate.predicted_vehicles, Some(2));
    let monthly = estimate.monthly_cost.expect("car cost present");
    assert!((monthly - 2.0 * 8_120.93 / 12.0).abs() < 1e-9);
}

#[tokio::test]
async fn estimate_without_prediction_is_empty() {
    let aggregator = aggregator(
        StubPredictor::failing(PredictionError::PermitsExceedHousehold {
            permits: 3,
            household_size: 2,
        }),
        VehicleCostTable::builtin(),
    );
    let interview = interview_with_cars(json!(60_000), &[]);

    let estimate = aggregator
        .estimate(&rented_address(1_000.0), &interview)
        .await;

    assert_eq!(
        estimate,
        CarCostEstimate {
            current_vehicles: 0,
            predicted_vehicles: None,
            monthly_cost: None,
        }
    );
}
