use std::sync::OnceLock;

use regex::Regex;

use super::domain::{Address, Ownership};
use super::mortgage::{Amortizer, FixedRateAmortizer};

/// Reasons a housing cost cannot be derived from an address.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HousingCostError {
    #[error("incomplete rent or utilities information")]
    IncompleteRent,
    #[error("incomplete mortgage information")]
    IncompleteMortgage,
    #[error("invalid amortization period '{0}'")]
    InvalidAmortizationPeriod(String),
    #[error("unknown ownership type")]
    UnknownOwnership,
}

/// Monthly housing cost keyed on the address ownership mode.
#[derive(Debug, Clone, Default)]
pub struct HousingCostCalculator<A = FixedRateAmortizer> {
    amortizer: A,
}

impl<A: Amortizer> HousingCostCalculator<A> {
    pub fn new(amortizer: A) -> Self {
        Self { amortizer }
    }

    /// Housing cost, or `None` with the reason logged.
    pub fn monthly_cost(&self, address: &Address) -> Option<f64> {
        match self.try_monthly_cost(address) {
            Ok(cost) => Some(cost),
            Err(error) => {
                tracing::error!(address_id = %address.uuid, %error, "cannot compute monthly housing cost");
                None
            }
        }
    }

    pub fn try_monthly_cost(&self, address: &Address) -> Result<f64, HousingCostError> {
        match address.ownership {
            Some(Ownership::Rent) => rent_cost(address),
            Some(Ownership::Buy) => self.ownership_cost(address),
            Some(Ownership::Unrecognized) | None => Err(HousingCostError::UnknownOwnership),
        }
    }

    fn ownership_cost(&self, address: &Address) -> Result<f64, HousingCostError> {
        let (Some(mortgage), Some(interest_rate), Some(period)) = (
            address.mortgage,
            address.interest_rate,
            address.amortization_period_in_years.as_deref(),
        ) else {
            return Err(HousingCostError::IncompleteMortgage);
        };

        let years = amortization_years(period)
            .ok_or_else(|| HousingCostError::InvalidAmortizationPeriod(period.to_string()))?;

        let payment = if mortgage == 0.0 {
            0.0
        } else {
            self.amortizer
                .monthly_payment(mortgage, interest_rate / 100.0, years * 12)
        };
        let taxes = address.taxes_yearly.map_or(0.0, |taxes| taxes / 12.0);
        let utilities = address.utilities_monthly.unwrap_or(0.0);

        Ok(payment + taxes + utilities)
    }
}

/// Leading integer of the answer (`"25.5"` and `"25 years"` read as 25); must be positive.
fn amortization_years(period: &str) -> Option<u32> {
    static LEADING_INTEGER: OnceLock<Regex> = OnceLock::new();
    let pattern = LEADING_INTEGER
        .get_or_init(|| Regex::new(r"^\s*([+-]?[0-9]+)").expect("static period pattern"));
    let digits = pattern.captures(period)?.get(1)?.as_str();
    digits
        .trim_start_matches('+')
        .parse::<u32>()
        .ok()
        .filter(|years| *years > 0)
}

fn rent_cost(address: &Address) -> Result<f64, HousingCostError> {
    let rent = address.rent_monthly.ok_or(HousingCostError::IncompleteRent)?;
    if address.are_utilities_included == Some(false) {
        let utilities = address
            .utilities_monthly
            .ok_or(HousingCostError::IncompleteRent)?;
        return Ok(rent + utilities);
    }
    Ok(rent)
}
