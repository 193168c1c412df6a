//! 为 Limit 标注可提前取消的源
//!
//! 对每个 Limit 节点 L：把 L 从边关系中移除后，若源 S 无法再到达任何 Sink，
//! 说明 S 到 Sink 的每条路径都经过 L，L 输出满额后 S 就可以立即取消。
//! 同时供给 L 和另一个独立 Sink 的源永远不会被标注。
//!
//! 标注结果只增不减地记录在 L 上，供执行层消费。

use crate::core::error::{GraphError, PlannerResult};
use crate::query::planner::distributed::agent::AgentInstance;
use crate::query::planner::distributed::rules::pattern::Pattern;
use crate::query::planner::distributed::rules::rule::{FragmentRule, Rule, RuleExecutor};
use crate::query::planner::plan::PlanGraph;

#[derive(Debug, Default, Clone, Copy)]
pub struct AnnotateAbortableSrcsForLimitsRule;

impl AnnotateAbortableSrcsForLimitsRule {
    pub fn new() -> Self {
        Self
    }

    fn abortable_sources(graph: &PlanGraph, limit_id: i64) -> PlannerResult<Vec<i64>> {
        let sinks = graph.sinks();
        let mut abortable = Vec::new();
        for src in graph.sources() {
            let reachable = graph.transitive_dependents_without(src, limit_id)?;
            if !sinks.iter().any(|sink| reachable.contains(sink)) {
                abortable.push(src);
            }
        }
        Ok(abortable)
    }
}

impl Rule for AnnotateAbortableSrcsForLimitsRule {
    fn name(&self) -> &'static str {
        "AnnotateAbortableSrcsForLimitsRule"
    }

    fn pattern(&self) -> Pattern {
        Pattern::limit()
    }

    fn apply(&self, graph: &mut PlanGraph, node_id: i64) -> PlannerResult<bool> {
        let abortable = Self::abortable_sources(graph, node_id)?;

        let node = graph.get_mut(node_id)?;
        let actual = node.name();
        let limit = node.as_limit_mut().ok_or(GraphError::UnexpectedNodeType {
            id: node_id,
            expected: "Limit",
            actual,
        })?;

        let mut changed = false;
        for src in abortable {
            changed |= limit.add_abortable_source(src);
        }
        Ok(changed)
    }
}

/// fleet 级 Limit 标注
#[derive(Debug, Default, Clone, Copy)]
pub struct DistributedAnnotateAbortableSrcsForLimitsRule {
    executor: RuleExecutor,
}

impl DistributedAnnotateAbortableSrcsForLimitsRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iteration_rounds(mut self, rounds: usize) -> Self {
        self.executor = RuleExecutor::new(rounds);
        self
    }
}

impl FragmentRule for DistributedAnnotateAbortableSrcsForLimitsRule {
    fn name(&self) -> &'static str {
        "DistributedAnnotateAbortableSrcsForLimitsRule"
    }

    fn apply(&self, instance: &mut AgentInstance) -> PlannerResult<bool> {
        self.executor
            .execute(&AnnotateAbortableSrcsForLimitsRule, &mut instance.plan)
    }
}
