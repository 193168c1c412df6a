//! 分布式计划
//!
//! 每个 agent 持有一份私有的计划 fragment。本模块负责在 fragment 交给执行层之前：
//! 裁剪 agent 无法提供的源、移除空 fragment、为 Limit 标注可取消的源，
//! 并校验函数放置。

pub mod agent;
pub mod distributed_plan;
pub mod locality;
pub mod rewriter;
pub mod rules;

pub use agent::{AgentInfo, AgentInstance};
pub use distributed_plan::DistributedPlan;
pub use locality::{load_schema_map, DistributedState, LocalityMap, SchemaInfo};
pub use rewriter::{DistributedRewriter, RewriteSummary};
