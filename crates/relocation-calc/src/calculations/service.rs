use std::sync::Arc;

use super::domain::{Address, CalculationResult, Interview};
use super::housing::HousingCostCalculator;
use super::mortgage::{Amortizer, FixedRateAmortizer};
use super::percentage::income_share_percentage;
use super::vehicles::{CarCostAggregator, OwnershipPredictor, VehicleCostTable};

/// Service composing the housing calculator, the car cost aggregator and the
/// income share into one result per address.
pub struct MonthlyCostService<P, A = FixedRateAmortizer> {
    housing: HousingCostCalculator<A>,
    cars: CarCostAggregator<P>,
}

impl<P> MonthlyCostService<P>
where
    P: OwnershipPredictor + 'static,
{
    pub fn new(predictor: Arc<P>, costs: Arc<VehicleCostTable>) -> Self {
        Self::with_amortizer(predictor, costs, FixedRateAmortizer)
    }
}

impl<P, A> MonthlyCostService<P, A>
where
    P: OwnershipPredictor + 'static,
    A: Amortizer,
{
    pub fn with_amortizer(predictor: Arc<P>, costs: Arc<VehicleCostTable>, amortizer: A) -> Self {
        Self {
            housing: HousingCostCalculator::new(amortizer),
            cars: CarCostAggregator::new(predictor, costs),
        }
    }

    /// Computes every figure that the available answers allow. Missing data
    /// leaves the matching fields empty; this never fails.
    pub async fn calculate(&self, address: &Address, interview: &Interview) -> CalculationResult {
        let housing = self.housing.monthly_cost(address);
        let cars = self.cars.estimate(address, interview).await;

        let (percentage, total) = match (housing, cars.monthly_cost) {
            (Some(housing), Some(car)) => (
                income_share_percentage(housing, car, interview.household.income.as_ref()),
                Some(housing + car),
            ),
            _ => (None, None),
        };

        tracing::debug!(
            address_id = %address.uuid,
            housing = ?housing,
            car = ?cars.monthly_cost,
            "calculated monthly cost"
        );

        CalculationResult {
            housing_cost_monthly: housing,
            car_cost_monthly: cars.monthly_cost,
            housing_and_transport_cost_percentage_of_income: percentage,
            total_cost_monthly: total,
            current_number_of_vehicles: Some(cars.current_vehicles),
            predicted_number_of_vehicles: cars.predicted_vehicles,
        }
    }
}
