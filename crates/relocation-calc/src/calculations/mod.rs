//! Monthly housing and transport cost of a candidate address.
//!
//! Each figure degrades to `None` on missing or inconsistent answers so the
//! remaining figures can still be reported.

pub mod domain;
pub mod housing;
pub mod income;
pub mod mortgage;
pub mod percentage;
pub mod service;
pub mod vehicles;

#[cfg(test)]
mod tests;

pub use domain::{
    Address, CalculationResult, ComputedField, Destination, EngineType, Household,
    HouseholdIncome, Interview, Ownership, Person, Vehicle, VehicleCategory, CALCULATING,
};
pub use housing::{HousingCostCalculator, HousingCostError};
pub use income::{estimate_annual_income, map_to_ordinal_level, IncomeError, IncomeLevel};
pub use mortgage::{Amortizer, FixedRateAmortizer};
pub use percentage::income_share_percentage;
pub use service::MonthlyCostService;
