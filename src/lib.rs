//! DistPlan - distributed query plan rewriting for agent fleets
//!
//! 在查询计划被拆分为各 agent 的 fragment 之后、交给执行层之前运行：
//! 裁剪 agent 无法提供的数据源，移除空 fragment，为 Limit 标注可提前取消的源，
//! 并校验每个标量函数都能在其所在的 agent 类别上执行。

pub mod api;
pub mod config;
pub mod core;
pub mod expression;
pub mod query;
pub mod utils;
