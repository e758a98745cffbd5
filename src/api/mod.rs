use axum::{
    Router,
    extract::{Json, Query},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::core::{
    GoalSolveConfig, GoalSolveResult, GoalType, Phase, PlanInputs, PlanSummary, ProjectionError,
    ProjectionResult, project, solve_goal, time_axis_years, whole_years,
};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Projection(#[from] ProjectionError),
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliGoal {
    RequiredContribution,
    MaxExpense,
}

impl From<CliGoal> for GoalType {
    fn from(value: CliGoal) -> Self {
        match value {
            CliGoal::RequiredContribution => GoalType::RequiredContribution,
            CliGoal::MaxExpense => GoalType::MaxMonthlyExpense,
        }
    }
}

impl From<GoalType> for CliGoal {
    fn from(value: GoalType) -> Self {
        match value {
            GoalType::RequiredContribution => CliGoal::RequiredContribution,
            GoalType::MaxMonthlyExpense => CliGoal::MaxExpense,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    monthly_expense_retired: Option<f64>,
    years_after_retirement: Option<f64>,
    years_to_retirement: Option<f64>,
    current_savings: Option<f64>,
    monthly_contribution: Option<f64>,
    expected_return: Option<f64>,

    goal: Option<GoalType>,
    target_final_balance: Option<f64>,
    summary_only: Option<bool>,
}

#[derive(Parser, Debug)]
#[command(
    name = "nestegg",
    about = "Monthly retirement savings projection (working years, then retirement withdrawals)",
    allow_negative_numbers = true
)]
struct Cli {
    #[arg(
        long,
        default_value_t = 5000.0,
        help = "Monthly spending in retirement, in today's money"
    )]
    monthly_expense_retired: f64,
    #[arg(long, default_value_t = 30.0, help = "Years spent in retirement")]
    years_after_retirement: f64,
    #[arg(long, default_value_t = 25.0, help = "Years until retirement")]
    years_to_retirement: f64,
    #[arg(long, default_value_t = 100000.0, help = "Current savings balance")]
    current_savings: f64,
    #[arg(
        long,
        default_value_t = 1000.0,
        help = "Monthly contribution during working years"
    )]
    monthly_contribution: f64,
    #[arg(
        long,
        default_value_t = 7.0,
        help = "Expected annual return in percent, inflation-adjusted"
    )]
    expected_return: f64,
    #[arg(
        long,
        value_enum,
        help = "Also solve for the contribution or retirement expense that hits --target-final-balance"
    )]
    solve: Option<CliGoal>,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Final balance the goal solver aims for"
    )]
    target_final_balance: f64,
    #[arg(long, help = "Print only the summary, without the monthly series")]
    summary_only: bool,
}

#[derive(Debug)]
struct ApiRequest {
    inputs: PlanInputs,
    goal: Option<GoalSolveConfig>,
    summary_only: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SeriesResponse {
    years: Vec<f64>,
    balance: Vec<f64>,
    net_cash_flow: Vec<f64>,
    phase: Vec<Phase>,
}

impl SeriesResponse {
    fn from_projection(result: &ProjectionResult) -> Self {
        Self {
            years: time_axis_years(result),
            balance: result.balance().to_vec(),
            net_cash_flow: result.net_cash_flow().to_vec(),
            phase: (0..result.len()).map(|month| result.phase(month)).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    inputs: PlanInputs,
    total_months: usize,
    months_to_retirement: usize,
    summary: PlanSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    series: Option<SeriesResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    goal: Option<GoalSolveResult>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_inputs(cli: &Cli) -> Result<PlanInputs, ProjectionError> {
    for (field, value) in [
        ("monthlyExpenseRetired", cli.monthly_expense_retired),
        ("currentSavings", cli.current_savings),
        ("monthlyContribution", cli.monthly_contribution),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(ProjectionError::invalid(field, "must be >= 0"));
        }
    }

    if !cli.expected_return.is_finite() || cli.expected_return <= -100.0 {
        return Err(ProjectionError::invalid(
            "expectedReturn",
            "must be > -100 percent",
        ));
    }

    let inputs = PlanInputs {
        monthly_expense_retired: cli.monthly_expense_retired,
        years_after_retirement: whole_years("yearsAfterRetirement", cli.years_after_retirement)?,
        years_to_retirement: whole_years("yearsToRetirement", cli.years_to_retirement)?,
        current_savings: cli.current_savings,
        monthly_contribution: cli.monthly_contribution,
        expected_annual_return: cli.expected_return / 100.0,
    };
    inputs.validate()?;
    Ok(inputs)
}

fn api_request_from_cli(cli: &Cli) -> Result<ApiRequest, ProjectionError> {
    let inputs = build_inputs(cli)?;
    let goal = cli.solve.map(|goal| GoalSolveConfig {
        goal_type: goal.into(),
        target_final_balance: cli.target_final_balance,
    });
    Ok(ApiRequest {
        inputs,
        goal,
        summary_only: cli.summary_only,
    })
}

fn build_project_response(request: &ApiRequest) -> Result<ProjectResponse, ProjectionError> {
    let result = project(&request.inputs)?;
    let summary = PlanSummary::from_projection(&request.inputs, &result);
    let goal = request
        .goal
        .map(|config| solve_goal(&request.inputs, config))
        .transpose()?;

    Ok(ProjectResponse {
        inputs: request.inputs.clone(),
        total_months: result.total_months(),
        months_to_retirement: result.months_to_retirement(),
        summary,
        series: (!request.summary_only).then(|| SeriesResponse::from_projection(&result)),
        goal,
    })
}

/// Parses command-line arguments, runs the projection and returns the JSON report.
pub fn run_cli<I, T>(args: I) -> Result<String, ApiError>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    let request = api_request_from_cli(&cli)?;
    let response = build_project_response(&request)?;
    tracing::debug!(
        total_months = response.total_months,
        verdict = ?response.summary.verdict,
        "projection complete"
    );
    Ok(serde_json::to_string_pretty(&response)?)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("projection API listening on http://{addr}");
    tracing::info!("local access: http://127.0.0.1:{port}/api/project");

    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, serde_json::json!({ "status": "ok" }))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(Query(payload): Query<ProjectPayload>) -> Response {
    project_handler_impl(payload).await
}

async fn project_post_handler(Json(payload): Json<ProjectPayload>) -> Response {
    project_handler_impl(payload).await
}

async fn project_handler_impl(payload: ProjectPayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(err) => {
            tracing::warn!(%err, "rejected projection request");
            return error_response(error_status(&err), &err.to_string());
        }
    };

    match build_project_response(&request) {
        Ok(response) => {
            tracing::info!(
                total_months = response.total_months,
                verdict = ?response.summary.verdict,
                "projection served"
            );
            json_response(StatusCode::OK, response)
        }
        Err(err) => {
            tracing::warn!(%err, "projection failed");
            error_response(error_status(&err), &err.to_string())
        }
    }
}

fn error_status(err: &ProjectionError) -> StatusCode {
    match err {
        ProjectionError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
        ProjectionError::NumericOverflow { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<ProjectPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload).map_err(|e| e.to_string())
}

fn api_request_from_payload(payload: ProjectPayload) -> Result<ApiRequest, ProjectionError> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.monthly_expense_retired {
        cli.monthly_expense_retired = v;
    }
    if let Some(v) = payload.years_after_retirement {
        cli.years_after_retirement = v;
    }
    if let Some(v) = payload.years_to_retirement {
        cli.years_to_retirement = v;
    }
    if let Some(v) = payload.current_savings {
        cli.current_savings = v;
    }
    if let Some(v) = payload.monthly_contribution {
        cli.monthly_contribution = v;
    }
    if let Some(v) = payload.expected_return {
        cli.expected_return = v;
    }

    if let Some(v) = payload.goal {
        cli.solve = Some(v.into());
    }
    if let Some(v) = payload.target_final_balance {
        cli.target_final_balance = v;
    }
    if let Some(v) = payload.summary_only {
        cli.summary_only = v;
    }

    api_request_from_cli(&cli)
}

fn default_cli_for_api() -> Cli {
    let defaults = PlanInputs::default();
    Cli {
        monthly_expense_retired: defaults.monthly_expense_retired,
        years_after_retirement: defaults.years_after_retirement as f64,
        years_to_retirement: defaults.years_to_retirement as f64,
        current_savings: defaults.current_savings,
        monthly_contribution: defaults.monthly_contribution,
        expected_return: defaults.expected_annual_return * 100.0,
        solve: None,
        target_final_balance: 0.0,
        summary_only: false,
    }
}
