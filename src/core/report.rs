use serde::Serialize;

use super::engine::monthly_rate_from_annual;
use super::types::{MONTHS_PER_YEAR, PlanInputs, ProjectionResult};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Sustainable,
    Depleted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialOverview {
    pub working_years: i64,
    pub monthly_contribution: f64,
    pub total_contributions: f64,
    pub retirement_years: i64,
    pub monthly_expense_retired: f64,
    pub total_retirement_needs: f64,
    pub starting_savings: f64,
    pub expected_annual_return_pct: f64,
}

impl FinancialOverview {
    pub fn from_inputs(inputs: &PlanInputs) -> Self {
        let months_per_year = MONTHS_PER_YEAR as f64;
        Self {
            working_years: inputs.years_to_retirement,
            monthly_contribution: inputs.monthly_contribution,
            total_contributions: inputs.monthly_contribution
                * months_per_year
                * inputs.years_to_retirement as f64,
            retirement_years: inputs.years_after_retirement,
            monthly_expense_retired: inputs.monthly_expense_retired,
            total_retirement_needs: inputs.monthly_expense_retired
                * months_per_year
                * inputs.years_after_retirement as f64,
            starting_savings: inputs.current_savings,
            expected_annual_return_pct: inputs.expected_annual_return * 100.0,
        }
    }
}

/// Headline figures a report or chart shows next to the projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub peak_balance: f64,
    pub balance_at_retirement: f64,
    pub final_balance: f64,
    pub retirement_delta: f64,
    pub verdict: Verdict,
    pub depletion_month: Option<usize>,
    pub depletion_year: Option<f64>,
    pub shortfall: f64,
    pub additional_monthly_contribution: Option<f64>,
    pub discounted_shortfall_estimate: Option<f64>,
    pub overview: FinancialOverview,
}

impl PlanSummary {
    pub fn from_projection(inputs: &PlanInputs, result: &ProjectionResult) -> Self {
        let depletion = depletion_month(result);
        let verdict = verdict(result);
        let (additional, discounted) = match verdict {
            Verdict::Sustainable => (None, None),
            Verdict::Depleted => (
                required_additional_contribution(inputs, result),
                discounted_shortfall_estimate(inputs, result),
            ),
        };

        Self {
            peak_balance: peak_balance(result),
            balance_at_retirement: balance_at_retirement(result),
            final_balance: final_balance(result),
            retirement_delta: retirement_delta(result),
            verdict,
            depletion_month: depletion,
            depletion_year: depletion.map(|month| month as f64 / MONTHS_PER_YEAR as f64),
            shortfall: shortfall(result),
            additional_monthly_contribution: additional,
            discounted_shortfall_estimate: discounted,
            overview: FinancialOverview::from_inputs(inputs),
        }
    }
}

pub fn peak_balance(result: &ProjectionResult) -> f64 {
    result
        .balance()
        .iter()
        .copied()
        .max_by(|a, b| a.total_cmp(b))
        .unwrap_or(0.0)
}

pub fn balance_at_retirement(result: &ProjectionResult) -> f64 {
    result.balance()[result.months_to_retirement()]
}

pub fn final_balance(result: &ProjectionResult) -> f64 {
    result.balance()[result.total_months()]
}

pub fn retirement_delta(result: &ProjectionResult) -> f64 {
    final_balance(result) - balance_at_retirement(result)
}

/// First month whose balance is below zero.
pub fn depletion_month(result: &ProjectionResult) -> Option<usize> {
    result.balance().iter().position(|&balance| balance < 0.0)
}

pub fn verdict(result: &ProjectionResult) -> Verdict {
    if final_balance(result) >= 0.0 {
        Verdict::Sustainable
    } else {
        Verdict::Depleted
    }
}

pub fn shortfall(result: &ProjectionResult) -> f64 {
    (-final_balance(result)).max(0.0)
}

/// Extra monthly contribution during the working years that brings the final
/// balance back to zero.
///
/// The final balance is affine in the contribution: each extra unit saved in
/// month `k` is worth `(1 + r)^(total - k)` at the end. Summing over the
/// accumulation months gives the future-value annuity factor used below, with
/// `r` the same compounded monthly rate the engine uses. Returns `None` when
/// there are no working months left to contribute in.
pub fn required_additional_contribution(
    inputs: &PlanInputs,
    result: &ProjectionResult,
) -> Option<f64> {
    let working_months = result.months_to_retirement();
    if working_months == 0 {
        return None;
    }
    let gap = shortfall(result);
    if gap == 0.0 {
        return Some(0.0);
    }

    let rate = monthly_rate_from_annual(inputs.expected_annual_return);
    let retired_months = result.total_months() - working_months;
    let factor = future_value_annuity_factor(rate, working_months)
        * (1.0 + rate).powi(retired_months as i32);
    if !factor.is_finite() || factor <= 0.0 {
        return None;
    }
    Some(gap / factor)
}

/// Rough shortfall estimate in the simple discounted form:
/// `shortfall / n * (1 + annual / 12)^-n` over the `n` working months.
///
/// It discounts with the simple `annual / 12` rate instead of the compounded
/// monthly rate the projection uses, and it does not model the growth of the
/// extra savings through retirement, so it is not the contribution that
/// actually closes the gap. Prefer [`required_additional_contribution`].
pub fn discounted_shortfall_estimate(
    inputs: &PlanInputs,
    result: &ProjectionResult,
) -> Option<f64> {
    let working_months = result.months_to_retirement();
    if working_months == 0 {
        return None;
    }
    let simple_rate = inputs.expected_annual_return / MONTHS_PER_YEAR as f64;
    let discount = (1.0 + simple_rate).powi(working_months as i32).recip();
    Some(shortfall(result) / working_months as f64 * discount)
}

pub(crate) fn future_value_annuity_factor(rate: f64, months: usize) -> f64 {
    if rate.abs() < 1e-12 {
        return months as f64;
    }
    ((1.0 + rate).powi(months as i32) - 1.0) / rate
}
