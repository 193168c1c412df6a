//! 分布式计划规则
//!
//! # 模块结构
//!
//! - `pattern`: 模式匹配定义
//! - `rule`: 规则 trait、节点规则驱动器与 fleet 规则包装器
//! - `prune_unavailable_sources`: 裁剪 agent 无法提供的源
//! - `prune_empty_plans`: 移除 fragment 为空的 agent
//! - `annotate_abortable_srcs`: 为 Limit 标注可提前取消的源
//! - `scalar_udf_placement`: 标量函数放置校验
//!
//! # 规则分类
//!
//! ## 节点规则 (`Rule`)
//! 在单个 fragment 上按模式匹配节点并应用，可声明重复执行到不动点。
//!
//! ## fragment 规则 (`FragmentRule`)
//! 为每个 agent 构造节点规则并执行，经 `RuleWrapper` 提升为 fleet 规则，可并行。
//!
//! ## fleet 规则 (`DistributedRule`)
//! 作用于整个 fleet 计划，可以增删 agent。

pub mod annotate_abortable_srcs;
pub mod pattern;
pub mod prune_empty_plans;
pub mod prune_unavailable_sources;
pub mod rule;
pub mod scalar_udf_placement;

pub use annotate_abortable_srcs::{
    AnnotateAbortableSrcsForLimitsRule, DistributedAnnotateAbortableSrcsForLimitsRule,
};
pub use pattern::{MatchNode, Pattern};
pub use prune_empty_plans::PruneEmptyPlansRule;
pub use prune_unavailable_sources::{
    DistributedPruneUnavailableSourcesRule, PruneUnavailableSourcesRule,
};
pub use rule::{
    DistributedRule, FragmentRule, IntoRuleWrapper, Rule, RuleExecutor, RuleWrapper,
    TraversalOrder, DEFAULT_MAX_ITERATION_ROUNDS,
};
pub use scalar_udf_placement::{
    check_scalar_func_executor, operator_udfs_run_on_aggregator, operator_udfs_run_on_edge,
    DistributedScalarUdfPlacementRule, ScalarUdfsRunOnAggregatorRule, ScalarUdfsRunOnEdgeRule,
};
