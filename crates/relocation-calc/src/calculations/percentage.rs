use super::domain::HouseholdIncome;
use super::income::{estimate_annual_income, IncomeError};

/// Share of annual household income spent on housing and transport, rounded to
/// a whole percent.
pub fn income_share_percentage(
    housing_monthly: f64,
    transport_monthly: f64,
    income: Option<&HouseholdIncome>,
) -> Option<i64> {
    let income = income?;
    let annual_income = match estimate_annual_income(income) {
        Ok(annual_income) => annual_income,
        Err(IncomeError::Unknown | IncomeError::Declined) => return None,
        Err(error) => {
            tracing::error!(%error, "cannot use household income for cost percentage");
            return None;
        }
    };

    let annual_cost = housing_monthly * 12.0 + transport_monthly * 12.0;
    Some((annual_cost / annual_income * 100.0).round() as i64)
}
