mod engine;
mod report;
mod solver;
mod types;

pub use engine::{monthly_rate_from_annual, project, time_axis_years};
pub use report::{
    FinancialOverview, PlanSummary, Verdict, balance_at_retirement, depletion_month,
    discounted_shortfall_estimate, final_balance, peak_balance, required_additional_contribution,
    retirement_delta, shortfall, verdict,
};
pub use solver::{GoalSolveConfig, GoalSolveResult, GoalType, solve_goal};
pub use types::{
    MAX_HORIZON_YEARS, MONTHS_PER_YEAR, Phase, PlanInputs, ProjectionError, ProjectionResult,
    whole_years,
};
