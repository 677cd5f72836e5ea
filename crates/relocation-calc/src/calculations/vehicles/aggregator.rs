use std::sync::Arc;

use super::cost_table::VehicleCostTable;
use super::ownership::{OwnershipPredictor, OwnershipQuery, PredictionError};
use crate::calculations::domain::{Address, Interview, Vehicle};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CarCostError {
    #[error(transparent)]
    Prediction(#[from] PredictionError),
    #[error("incomplete vehicle information for vehicle {sequence}")]
    IncompleteVehicle { sequence: u32 },
    #[error("no average cost for vehicle {sequence} ({category}/{engine})")]
    UnmappedVehicle {
        sequence: u32,
        category: &'static str,
        engine: &'static str,
    },
    #[error("cost table has no reference passenger car cost")]
    MissingReferenceCost,
}

/// Vehicle side of an address cost calculation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CarCostEstimate {
    pub current_vehicles: u32,
    pub predicted_vehicles: Option<u32>,
    pub monthly_cost: Option<f64>,
}

/// Monthly car cost at a candidate address: the predicted vehicle count priced
/// at the average annual cost of the household's current fleet.
pub struct CarCostAggregator<P> {
    predictor: Arc<P>,
    costs: Arc<VehicleCostTable>,
}

impl<P> CarCostAggregator<P>
where
    P: OwnershipPredictor + 'static,
{
    pub fn new(predictor: Arc<P>, costs: Arc<VehicleCostTable>) -> Self {
        Self { predictor, costs }
    }

    /// Never fails; every error is logged and leaves the affected figure empty.
    pub async fn estimate(&self, address: &Address, interview: &Interview) -> CarCostEstimate {
        let vehicles = interview.vehicles();
        let mut estimate = CarCostEstimate {
            current_vehicles: vehicles.len() as u32,
            ..CarCostEstimate::default()
        };

        let query = OwnershipQuery {
            location: address.point(),
            household_size: interview.household.persons.len(),
            permit_count: interview.permit_count(),
            income: interview
                .household
                .income
                .as_ref()
                .map(|income| income.as_raw())
                .unwrap_or_default(),
        };

        let predicted = match self.predictor.predict(&query).await {
            Ok(predicted) => predicted,
            Err(error) => {
                let error = CarCostError::from(error);
                tracing::error!(address_id = %address.uuid, %error, "error calculating monthly car cost");
                return estimate;
            }
        };
        estimate.predicted_vehicles = Some(predicted);

        match self.average_annual_cost(&vehicles) {
            Ok(annual) => estimate.monthly_cost = Some(f64::from(predicted) * (annual / 12.0)),
            Err(error) => {
                tracing::error!(address_id = %address.uuid, %error, "error calculating monthly car cost");
            }
        }
        estimate
    }

    /// Mean annual cost over the current fleet, or the reference car when the
    /// household has none. Any vehicle that cannot be costed fails the whole
    /// fleet.
    pub fn average_annual_cost(&self, vehicles: &[&Vehicle]) -> Result<f64, CarCostError> {
        if vehicles.is_empty() {
            return self
                .costs
                .reference_annual_cost()
                .ok_or(CarCostError::MissingReferenceCost);
        }

        let mut total = 0.0;
        for vehicle in vehicles {
            total += self.vehicle_annual_cost(vehicle)?;
        }
        Ok(total / vehicles.len() as f64)
    }

    fn vehicle_annual_cost(&self, vehicle: &Vehicle) -> Result<f64, CarCostError> {
        let (Some(category), Some(engine)) = (vehicle.category, vehicle.engine_type) else {
            return Err(CarCostError::IncompleteVehicle {
                sequence: vehicle.sequence,
            });
        };
        self.costs
            .average_annual_cost(category, engine)
            .ok_or(CarCostError::UnmappedVehicle {
                sequence: vehicle.sequence,
                category: category.as_str(),
                engine: engine.as_str(),
            })
    }
}
