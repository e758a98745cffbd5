use serde::Serialize;
use thiserror::Error;

/// Longest combined horizon accepted by the engine.
pub const MAX_HORIZON_YEARS: i64 = 200;

pub const MONTHS_PER_YEAR: i64 = 12;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("invalid input `{field}`: {reason}")]
    InvalidInput { field: &'static str, reason: String },
    #[error("balance is no longer finite at month {month}")]
    NumericOverflow { month: usize },
}

impl ProjectionError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Accumulation,
    Decumulation,
}

impl Phase {
    /// Month 0 is the starting point and counts as accumulation.
    pub fn for_month(month: usize, months_to_retirement: usize) -> Self {
        if month <= months_to_retirement {
            Phase::Accumulation
        } else {
            Phase::Decumulation
        }
    }
}

/// Plan parameters supplied by the caller for one projection.
///
/// Monetary values are monthly amounts in today's money. The annual return is
/// a fraction (`0.07` for 7%).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanInputs {
    pub monthly_expense_retired: f64,
    pub years_after_retirement: i64,
    pub years_to_retirement: i64,
    pub current_savings: f64,
    pub monthly_contribution: f64,
    pub expected_annual_return: f64,
}

impl Default for PlanInputs {
    fn default() -> Self {
        Self {
            monthly_expense_retired: 5_000.0,
            years_after_retirement: 30,
            years_to_retirement: 25,
            current_savings: 100_000.0,
            monthly_contribution: 1_000.0,
            expected_annual_return: 0.07,
        }
    }
}

impl PlanInputs {
    pub fn validate(&self) -> Result<(), ProjectionError> {
        if self.years_to_retirement < 0 {
            return Err(ProjectionError::invalid(
                "yearsToRetirement",
                "must be >= 0",
            ));
        }
        if self.years_after_retirement < 0 {
            return Err(ProjectionError::invalid(
                "yearsAfterRetirement",
                "must be >= 0",
            ));
        }
        if self
            .years_to_retirement
            .saturating_add(self.years_after_retirement)
            > MAX_HORIZON_YEARS
        {
            return Err(ProjectionError::invalid(
                "yearsAfterRetirement",
                format!("combined horizon must be <= {MAX_HORIZON_YEARS} years"),
            ));
        }
        if !self.expected_annual_return.is_finite() || self.expected_annual_return <= -1.0 {
            return Err(ProjectionError::invalid(
                "expectedAnnualReturn",
                "must be a finite rate > -1",
            ));
        }
        for (field, value) in [
            ("monthlyExpenseRetired", self.monthly_expense_retired),
            ("currentSavings", self.current_savings),
            ("monthlyContribution", self.monthly_contribution),
        ] {
            if !value.is_finite() {
                return Err(ProjectionError::invalid(field, "must be finite"));
            }
        }
        Ok(())
    }

    pub fn months_to_retirement(&self) -> usize {
        self.years_to_retirement
            .clamp(0, MAX_HORIZON_YEARS)
            .saturating_mul(MONTHS_PER_YEAR) as usize
    }

    /// Meaningful once [`PlanInputs::validate`] has passed; out-of-range year
    /// counts are clamped to the accepted horizon.
    pub fn total_months(&self) -> usize {
        let years = self.years_to_retirement.clamp(0, MAX_HORIZON_YEARS)
            + self.years_after_retirement.clamp(0, MAX_HORIZON_YEARS);
        (years * MONTHS_PER_YEAR) as usize
    }
}

/// Converts a year count coming from JSON or the command line, rejecting
/// negative and fractional values.
pub fn whole_years(field: &'static str, value: f64) -> Result<i64, ProjectionError> {
    if !value.is_finite() {
        return Err(ProjectionError::invalid(field, "must be finite"));
    }
    if value < 0.0 {
        return Err(ProjectionError::invalid(field, "must be >= 0"));
    }
    if value.fract() != 0.0 {
        return Err(ProjectionError::invalid(field, "must be a whole number of years"));
    }
    if value > MAX_HORIZON_YEARS as f64 {
        return Err(ProjectionError::invalid(
            field,
            format!("must be <= {MAX_HORIZON_YEARS}"),
        ));
    }
    Ok(value as i64)
}

/// Month-indexed balance and cash-flow series. Index 0 is today.
///
/// Only the engine builds these, so both series always hold `total_months + 1`
/// points.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionResult {
    pub(crate) months_to_retirement: usize,
    pub(crate) total_months: usize,
    pub(crate) balance: Vec<f64>,
    pub(crate) net_cash_flow: Vec<f64>,
}

impl ProjectionResult {
    pub fn balance(&self) -> &[f64] {
        &self.balance
    }

    pub fn net_cash_flow(&self) -> &[f64] {
        &self.net_cash_flow
    }

    pub fn months_to_retirement(&self) -> usize {
        self.months_to_retirement
    }

    pub fn total_months(&self) -> usize {
        self.total_months
    }

    pub fn len(&self) -> usize {
        self.balance.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balance.is_empty()
    }

    pub fn phase(&self, month: usize) -> Phase {
        Phase::for_month(month, self.months_to_retirement)
    }
}
