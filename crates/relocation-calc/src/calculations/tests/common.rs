use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use crate::calculations::domain::{Address, Interview, Ownership};
use crate::calculations::service::MonthlyCostService;
use crate::calculations::vehicles::{
    OwnershipPredictor, OwnershipQuery, PredictionError, VehicleCostTable,
};

/// Predictor returning a canned answer and recording every query.
pub(super) struct StubPredictor {
    outcome: Result<u32, PredictionError>,
    queries: Mutex<Vec<OwnershipQuery>>,
}

impl StubPredictor {
    pub(super) fn predicting(count: u32) -> Self {
        Self {
            outcome: Ok(count),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn failing(error: PredictionError) -> Self {
        Self {
            outcome: Err(error),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn queries(&self) -> Vec<OwnershipQuery> {
        self.queries.lock().expect("predictor mutex poisoned").clone()
    }
}

#[async_trait]
impl OwnershipPredictor for StubPredictor {
    async fn predict(&self, query: &OwnershipQuery) -> Result<u32, PredictionError> {
        self.queries
            .lock()
            .expect("predictor mutex poisoned")
            .push(query.clone());
        self.outcome.clone()
    }
}

pub(super) fn build_service(
    predictor: StubPredictor,
) -> (MonthlyCostService<StubPredictor>, Arc<StubPredictor>) {
    let predictor = Arc::new(predictor);
    let service = MonthlyCostService::new(
        predictor.clone(),
        Arc::new(VehicleCostTable::builtin()),
    );
    (service, predictor)
}

pub(super) fn rented_address(rent: f64) -> Address {
    Address {
        sequence: 1,
        uuid: "address-1".to_string(),
        ownership: Some(Ownership::Rent),
        rent_monthly: Some(rent),
        are_utilities_included: Some(true),
        geography: serde_json::from_value(json!({
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [-73.6, 45.5] },
            "properties": {}
        }))
        .ok(),
        ..Address::default()
    }
}

/// Two adults, one with a permit, with the given vehicles as `(category, engine)`.
pub(super) fn interview_with_cars(income: serde_json::Value, cars: &[(&str, &str)]) -> Interview {
    let cars: serde_json::Map<String, serde_json::Value> = cars
        .iter()
        .enumerate()
        .map(|(index, (category, engine))| {
            let uuid = format!("car-{}", index + 1);
            let mut car = json!({ "_sequence": index + 1, "_uuid": uuid.clone() });
            if !category.is_empty() {
                car["category"] = json!(category);
            }
            if !engine.is_empty() {
                car["engineType"] = json!(engine);
            }
            (uuid, car)
        })
        .collect();

    serde_json::from_value(json!({
        "household": {
            "income": income,
            "persons": {
                "person-1": { "_sequence": 1, "_uuid": "person-1", "drivingLicenseOwnership": "yes" },
                "person-2": { "_sequence": 2, "_uuid": "person-2", "drivingLicenseOwnership": "no" }
            }
        },
        "cars": cars
    }))
    .expect("interview fixture parses")
}

pub(super) fn assert_between(value: Option<f64>, low: f64, high: f64) {
    let value = value.expect("value is present");
    assert!(
        value > low && value < high,
        "expected {value} between {low} and {high}"
    );
}
