use serde::{Deserialize, Serialize};

use super::engine::{monthly_rate_from_annual, project};
use super::report::{final_balance, future_value_annuity_factor};
use super::types::{PlanInputs, ProjectionError};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GoalType {
    #[serde(alias = "requiredContribution", alias = "required_contribution")]
    RequiredContribution,
    #[serde(alias = "maxMonthlyExpense", alias = "max_monthly_expense", alias = "max-expense")]
    MaxMonthlyExpense,
}

#[derive(Debug, Clone, Copy)]
pub struct GoalSolveConfig {
    pub goal_type: GoalType,
    pub target_final_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSolveResult {
    pub goal_type: GoalType,
    pub target_final_balance: f64,
    pub solved_value: Option<f64>,
    pub achieved_final_balance: Option<f64>,
    pub feasible: bool,
    pub message: String,
}

/// Solves for the monthly contribution or retirement expense that hits the
/// target final balance.
///
/// The final balance is affine in either lever, so one projection with the
/// lever at zero plus the lever's annuity factor pins the answer down without
/// searching. The solved value is projected again to report what it achieves.
pub fn solve_goal(
    inputs: &PlanInputs,
    config: GoalSolveConfig,
) -> Result<GoalSolveResult, ProjectionError> {
    validate_config(config)?;
    inputs.validate()?;

    let rate = monthly_rate_from_annual(inputs.expected_annual_return);
    let working_months = inputs.months_to_retirement();
    let retired_months = inputs.total_months() - working_months;
    let target = config.target_final_balance;

    let (solved_value, message) = match config.goal_type {
        GoalType::RequiredContribution => {
            if working_months == 0 {
                (None, "No working months left to contribute in.".to_string())
            } else {
                let baseline = final_balance(&project(&PlanInputs {
                    monthly_contribution: 0.0,
                    ..inputs.clone()
                })?);
                let slope = future_value_annuity_factor(rate, working_months)
                    * (1.0 + rate).powi(retired_months as i32);
                if baseline >= target {
                    (
                        Some(0.0),
                        "Already meets target without contributions.".to_string(),
                    )
                } else {
                    match solve_affine(target - baseline, slope) {
                        Some(value) => (Some(value), "Solved required contribution.".to_string()),
                        None => (
                            None,
                            "Contributions have no measurable effect on the final balance."
                                .to_string(),
                        ),
                    }
                }
            }
        }
        GoalType::MaxMonthlyExpense => {
            if retired_months == 0 {
                (
                    None,
                    "No retirement months; expenses do not affect the final balance.".to_string(),
                )
            } else {
                let baseline = final_balance(&project(&PlanInputs {
                    monthly_expense_retired: 0.0,
                    ..inputs.clone()
                })?);
                let slope = future_value_annuity_factor(rate, retired_months);
                if baseline < target {
                    (
                        None,
                        "Target is not reachable even with zero retirement expenses.".to_string(),
                    )
                } else {
                    match solve_affine(baseline - target, slope) {
                        Some(value) => (
                            Some(value),
                            "Solved maximum sustainable monthly expense.".to_string(),
                        ),
                        None => (
                            None,
                            "Retirement expenses have no measurable effect on the final balance."
                                .to_string(),
                        ),
                    }
                }
            }
        }
    };

    let achieved_final_balance = match solved_value {
        Some(value) => {
            let mut solved_inputs = inputs.clone();
            match config.goal_type {
                GoalType::RequiredContribution => solved_inputs.monthly_contribution = value,
                GoalType::MaxMonthlyExpense => solved_inputs.monthly_expense_retired = value,
            }
            Some(final_balance(&project(&solved_inputs)?))
        }
        None => None,
    };

    Ok(GoalSolveResult {
        goal_type: config.goal_type,
        target_final_balance: target,
        solved_value,
        achieved_final_balance,
        feasible: solved_value.is_some(),
        message,
    })
}

/// Lever value that moves the final balance by `gap` given `slope` per unit.
///
/// With returns close to -100% the slope can underflow to zero, in which case
/// no finite value of the lever reaches the target.
fn solve_affine(gap: f64, slope: f64) -> Option<f64> {
    if !slope.is_finite() || slope <= 0.0 {
        return None;
    }
    let value = gap / slope;
    value.is_finite().then_some(value)
}

fn validate_config(config: GoalSolveConfig) -> Result<(), ProjectionError> {
    if !config.target_final_balance.is_finite() {
        return Err(ProjectionError::invalid(
            "targetFinalBalance",
            "must be finite",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn deterministic_inputs() -> PlanInputs {
        PlanInputs {
            monthly_expense_retired: 1_000.0,
            years_after_retirement: 1,
            years_to_retirement: 1,
            current_savings: 0.0,
            monthly_contribution: 0.0,
            expected_annual_return: 0.0,
        }
    }

    #[test]
    fn required_contribution_solver_finds_deterministic_solution() {
        let config = GoalSolveConfig {
            goal_type: GoalType::RequiredContribution,
            target_final_balance: 0.0,
        };
        let result = solve_goal(&deterministic_inputs(), config).expect("must solve");
        assert!(result.feasible);
        assert_close(result.solved_value.expect("value expected"), 1_000.0, 1e-9);
        assert_close(
            result.achieved_final_balance.expect("balance expected"),
            0.0,
            1e-6,
        );
    }

    #[test]
    fn required_contribution_hits_positive_target_with_growth() {
        let inputs = PlanInputs {
            expected_annual_return: 0.07,
            years_to_retirement: 25,
            years_after_retirement: 30,
            current_savings: 50_000.0,
            monthly_expense_retired: 6_000.0,
            ..deterministic_inputs()
        };
        let config = GoalSolveConfig {
            goal_type: GoalType::RequiredContribution,
            target_final_balance: 250_000.0,
        };
        let result = solve_goal(&inputs, config).expect("must solve");
        assert!(result.feasible);
        assert!(result.solved_value.expect("value expected") > 0.0);
        assert_close(
            result.achieved_final_balance.expect("balance expected"),
            250_000.0,
            1e-3,
        );
    }

    #[test]
    fn required_contribution_is_zero_when_already_funded() {
        let inputs = PlanInputs {
            current_savings: 1_000_000.0,
            ..deterministic_inputs()
        };
        let config = GoalSolveConfig {
            goal_type: GoalType::RequiredContribution,
            target_final_balance: 0.0,
        };
        let result = solve_goal(&inputs, config).expect("must solve");
        assert_eq!(result.solved_value, Some(0.0));
        assert!(result.feasible);
    }

    #[test]
    fn required_contribution_reports_infeasible_without_working_years() {
        let inputs = PlanInputs {
            years_to_retirement: 0,
            ..deterministic_inputs()
        };
        let config = GoalSolveConfig {
            goal_type: GoalType::RequiredContribution,
            target_final_balance: 0.0,
        };
        let result = solve_goal(&inputs, config).expect("must return result");
        assert!(!result.feasible);
        assert!(result.solved_value.is_none());
        assert!(result.achieved_final_balance.is_none());
    }

    #[test]
    fn max_expense_solver_finds_deterministic_solution() {
        let inputs = PlanInputs {
            current_savings: 500.0,
            years_to_retirement: 0,
            ..deterministic_inputs()
        };
        let config = GoalSolveConfig {
            goal_type: GoalType::MaxMonthlyExpense,
            target_final_balance: 0.0,
        };
        let result = solve_goal(&inputs, config).expect("must solve");
        assert!(result.feasible);
        assert_close(result.solved_value.expect("value expected"), 500.0 / 12.0, 1e-9);
    }

    #[test]
    fn max_expense_with_growth_spends_down_to_target() {
        let inputs = PlanInputs {
            expected_annual_return: 0.04,
            years_after_retirement: 30,
            ..PlanInputs::default()
        };
        let config = GoalSolveConfig {
            goal_type: GoalType::MaxMonthlyExpense,
            target_final_balance: 0.0,
        };
        let result = solve_goal(&inputs, config).expect("must solve");
        assert!(result.feasible);
        assert_close(
            result.achieved_final_balance.expect("balance expected"),
            0.0,
            1e-3,
        );
    }

    #[test]
    fn max_expense_reports_infeasible_when_target_too_high() {
        let config = GoalSolveConfig {
            goal_type: GoalType::MaxMonthlyExpense,
            target_final_balance: 1_000_000.0,
        };
        let result = solve_goal(&deterministic_inputs(), config).expect("must return result");
        assert!(!result.feasible);
        assert!(result.solved_value.is_none());
    }

    #[test]
    fn required_contribution_is_infeasible_when_growth_underflows() {
        let inputs = PlanInputs {
            expected_annual_return: -0.99999999,
            years_to_retirement: 1,
            years_after_retirement: 50,
            ..PlanInputs::default()
        };
        assert!(project(&inputs).is_ok());

        let config = GoalSolveConfig {
            goal_type: GoalType::RequiredContribution,
            target_final_balance: 0.0,
        };
        let result = solve_goal(&inputs, config).expect("must return result");
        assert!(!result.feasible);
        assert!(result.solved_value.is_none());
        assert!(result.achieved_final_balance.is_none());
    }

    #[test]
    fn max_expense_solves_near_total_loss() {
        let inputs = PlanInputs {
            expected_annual_return: -0.99999999,
            years_to_retirement: 1,
            years_after_retirement: 50,
            ..PlanInputs::default()
        };
        let config = GoalSolveConfig {
            goal_type: GoalType::MaxMonthlyExpense,
            target_final_balance: -1_000_000.0,
        };
        let result = solve_goal(&inputs, config).expect("must solve");
        assert!(result.feasible);
        assert!(result.solved_value.expect("value expected").is_finite());
        assert_close(
            result.achieved_final_balance.expect("balance expected"),
            -1_000_000.0,
            1e-3,
        );
    }

    #[test]
    fn solve_affine_rejects_degenerate_slopes() {
        assert_eq!(solve_affine(10.0, 0.0), None);
        assert_eq!(solve_affine(10.0, -1.0), None);
        assert_eq!(solve_affine(10.0, f64::NAN), None);
        assert_eq!(solve_affine(10.0, f64::MIN_POSITIVE), None);
        assert_eq!(solve_affine(10.0, 4.0), Some(2.5));
    }

    #[test]
    fn solver_rejects_invalid_inputs_and_target() {
        let bad_inputs = PlanInputs {
            expected_annual_return: -1.5,
            ..deterministic_inputs()
        };
        let config = GoalSolveConfig {
            goal_type: GoalType::RequiredContribution,
            target_final_balance: 0.0,
        };
        assert!(matches!(
            solve_goal(&bad_inputs, config),
            Err(ProjectionError::InvalidInput { .. })
        ));

        let bad_target = GoalSolveConfig {
            target_final_balance: f64::NAN,
            ..config
        };
        assert!(solve_goal(&deterministic_inputs(), bad_target).is_err());
    }
}
