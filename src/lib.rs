//! Deterministic month-by-month retirement savings projection.
//!
//! [`core::project`] turns a [`core::PlanInputs`] into balance and cash-flow
//! series; [`core::PlanSummary`] and [`core::solve_goal`] post-process them.
//! [`api`] wraps the engine in a command line and an HTTP JSON API.

pub mod api;
pub mod core;
