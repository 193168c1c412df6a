// Query module for the distributed planner
//
// This module provides the per-agent plan rewriting pipeline:
// - The IR graph each agent fragment is built on
// - Node-level and fragment-level rewrite rules
// - The fleet-wide rewriter that drives them

pub mod planner;

pub use crate::core::{PlannerError, PlannerResult};
