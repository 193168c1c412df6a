//! Planner module for distributed plan fragments
//! Contains the IR graph, the distributed rules and the rewriter driving them

// 核心模块
pub mod plan;

// 分布式规则
pub mod distributed;

// 重新导出主要的类型
pub use distributed::{AgentInfo, AgentInstance, DistributedPlan, DistributedRewriter};
pub use plan::{PlanGraph, PlanNodeEnum};
