//! Household income normalization.
//!
//! Two readings of the same answer coexist. The ownership model needs *some*
//! ordinal level, so unparseable answers fall back to the "don't know" level.
//! The income-share percentage needs a *correct* amount, so the same answers
//! yield an [`IncomeError`] there instead.

use std::sync::OnceLock;

use regex::Regex;

use super::domain::HouseholdIncome;

pub const DONT_KNOW: &str = "dontKnow";
pub const REFUSAL: &str = "refusal";

/// Upper bounds at or above this value mark an "and more" bracket.
pub const OPEN_ENDED_UPPER_BOUND: u64 = 999_999;

/// Ordinal income level used as a categorical model feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct IncomeLevel(u8);

impl IncomeLevel {
    pub const DECLINED: IncomeLevel = IncomeLevel(9);
    pub const UNKNOWN: IncomeLevel = IncomeLevel(10);

    pub fn value(self) -> u8 {
        self.0
    }
}

const BRACKET_LEVELS: [(&str, u8); 17] = [
    ("000000_009999", 1),
    ("010000_019999", 1),
    ("020000_029999", 1),
    ("030000_039999", 2),
    ("040000_049999", 2),
    ("050000_059999", 2),
    ("060000_069999", 3),
    ("070000_079999", 3),
    ("080000_089999", 3),
    ("090000_099999", 4),
    ("100000_119999", 4),
    ("120000_149999", 5),
    ("150000_179999", 6),
    ("180000_209999", 7),
    ("210000_999999", 8),
    (REFUSAL, 9),
    (DONT_KNOW, 10),
];

// Lower bound of levels 2 through 8.
const LEVEL_THRESHOLDS: [f64; 7] = [
    30_000.0, 60_000.0, 90_000.0, 120_000.0, 150_000.0, 180_000.0, 210_000.0,
];

/// Maps a raw income answer to the model's ordinal level, defaulting to
/// [`IncomeLevel::UNKNOWN`] for anything it cannot read.
pub fn map_to_ordinal_level(income: &str) -> IncomeLevel {
    let trimmed = income.trim();
    if let Some((_, level)) = BRACKET_LEVELS.iter().find(|(code, _)| *code == trimmed) {
        return IncomeLevel(*level);
    }

    match trimmed.parse::<f64>() {
        Ok(amount) if amount.is_finite() => level_for_amount(amount),
        _ => {
            tracing::warn!(income = %income, "unknown income format, using the unknown level");
            IncomeLevel::UNKNOWN
        }
    }
}

fn level_for_amount(amount: f64) -> IncomeLevel {
    let passed = LEVEL_THRESHOLDS
        .iter()
        .take_while(|threshold| amount >= **threshold)
        .count();
    IncomeLevel(1 + passed as u8)
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IncomeError {
    #[error("household income is unknown to the respondent")]
    Unknown,
    #[error("respondent declined to report household income")]
    Declined,
    #[error("invalid income format: {0}")]
    InvalidFormat(String),
    #[error("income {0} is not a positive amount")]
    NotPositive(f64),
}

/// Estimates a continuous annual income from the raw answer.
///
/// Closed brackets give the mean of their bounds. Open-ended brackets give
/// their lower bound, since a midpoint against the 999 999 sentinel would make
/// the income share look far smaller than it is.
pub fn estimate_annual_income(income: &HouseholdIncome) -> Result<f64, IncomeError> {
    let estimate = match income {
        HouseholdIncome::Amount(amount) => *amount,
        HouseholdIncome::Code(code) => estimate_from_code(code)?,
    };

    if !estimate.is_finite() || estimate <= 0.0 {
        return Err(IncomeError::NotPositive(estimate));
    }
    Ok(estimate)
}

fn estimate_from_code(code: &str) -> Result<f64, IncomeError> {
    match code {
        DONT_KNOW => return Err(IncomeError::Unknown),
        REFUSAL => return Err(IncomeError::Declined),
        _ => {}
    }

    if code.contains('_') {
        let (lower, upper) = parse_bracket(code)?;
        if upper >= OPEN_ENDED_UPPER_BOUND {
            return Ok(lower as f64);
        }
        return Ok((lower + upper) as f64 / 2.0);
    }

    let trimmed = code.trim();
    if !numeric_pattern().is_match(trimmed) {
        return Err(IncomeError::InvalidFormat(code.to_string()));
    }
    trimmed
        .parse::<f64>()
        .map_err(|_| IncomeError::InvalidFormat(code.to_string()))
}

fn parse_bracket(code: &str) -> Result<(u64, u64), IncomeError> {
    let invalid = || IncomeError::InvalidFormat(code.to_string());
    let mut parts = code.split('_');
    let (Some(lower), Some(upper), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid());
    };
    let lower = lower.trim().parse::<u64>().map_err(|_| invalid())?;
    let upper = upper.trim().parse::<u64>().map_err(|_| invalid())?;
    Ok((lower, upper))
}

fn numeric_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]+(\.[0-9]+)?$").expect("static income pattern"))
}
