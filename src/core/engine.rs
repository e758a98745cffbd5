use super::types::{MONTHS_PER_YEAR, Phase, PlanInputs, ProjectionError, ProjectionResult};

/// Projects the savings balance month by month from today to the end of retirement.
///
/// Each month the previous balance grows by the monthly rate first, then the
/// month's contribution is added (accumulation) or the retirement expense is
/// withdrawn (decumulation). Balances are never clamped; a negative balance
/// means the plan ran out of money.
pub fn project(inputs: &PlanInputs) -> Result<ProjectionResult, ProjectionError> {
    inputs.validate()?;

    let growth = 1.0 + monthly_rate_from_annual(inputs.expected_annual_return);
    let months_to_retirement = inputs.months_to_retirement();
    let total_months = inputs.total_months();

    let mut balance = Vec::with_capacity(total_months + 1);
    let mut net_cash_flow = Vec::with_capacity(total_months + 1);
    balance.push(inputs.current_savings);
    net_cash_flow.push(0.0);

    let mut current = inputs.current_savings;
    for month in 1..=total_months {
        let flow = match Phase::for_month(month, months_to_retirement) {
            Phase::Accumulation => inputs.monthly_contribution,
            Phase::Decumulation => -inputs.monthly_expense_retired,
        };
        current = current * growth + flow;
        if !current.is_finite() {
            return Err(ProjectionError::NumericOverflow { month });
        }
        balance.push(current);
        net_cash_flow.push(flow);
    }

    Ok(ProjectionResult {
        months_to_retirement,
        total_months,
        balance,
        net_cash_flow,
    })
}

/// Effective monthly rate that compounds to `annual_return` over twelve months.
pub fn monthly_rate_from_annual(annual_return: f64) -> f64 {
    (1.0 + annual_return).powf(1.0 / MONTHS_PER_YEAR as f64) - 1.0
}

/// Time in years for every month index of the projection.
pub fn time_axis_years(result: &ProjectionResult) -> Vec<f64> {
    (0..result.len())
        .map(|month| month as f64 / MONTHS_PER_YEAR as f64)
        .collect()
}
