/// Monthly payment calculator for a fixed-rate loan.
pub trait Amortizer: Send + Sync {
    /// `annual_rate` is a decimal (0.05 for 5 %), `months` the number of payments.
    fn monthly_payment(&self, principal: f64, annual_rate: f64, months: u32) -> f64;
}

/// Standard annuity formula with the zero-interest limit handled explicitly.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedRateAmortizer;

impl Amortizer for FixedRateAmortizer {
    fn monthly_payment(&self, principal: f64, annual_rate: f64, months: u32) -> f64 {
        let months = f64::from(months);
        let rate = annual_rate / 12.0;
        if rate == 0.0 {
            return principal / months;
        }

        let growth = (1.0 + rate).powf(months);
        principal * rate * growth / (growth - 1.0)
    }
}
