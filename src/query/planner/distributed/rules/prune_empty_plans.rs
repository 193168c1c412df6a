//! 移除 fragment 为空的 agent
//!
//! 源裁剪之后，若某个 agent 的 fragment 中已没有任何能到达 Sink 的算子，
//! 该 agent 不再参与本次查询的执行。

use crate::core::error::PlannerResult;
use crate::query::planner::distributed::distributed_plan::DistributedPlan;
use crate::query::planner::distributed::rules::rule::DistributedRule;
use crate::query::planner::plan::PlanGraph;

#[derive(Debug, Default, Clone, Copy)]
pub struct PruneEmptyPlansRule;

impl PruneEmptyPlansRule {
    pub fn new() -> Self {
        Self
    }

    /// fragment 中是否还有能到达 Sink 的算子
    ///
    /// 等价于存在至少一个有输入的 Sink。
    fn has_live_operators(plan: &PlanGraph) -> bool {
        plan.sinks().into_iter().any(|sink| {
            plan.dependents_of(sink)
                .map(|inputs| !inputs.is_empty())
                .unwrap_or(false)
        })
    }
}

impl DistributedRule for PruneEmptyPlansRule {
    fn name(&self) -> &'static str {
        "PruneEmptyPlansRule"
    }

    fn execute(&self, plan: &mut DistributedPlan) -> PlannerResult<bool> {
        let mut changed = false;
        for id in plan.instance_ids() {
            if Self::has_live_operators(&plan.get(id)?.plan) {
                continue;
            }
            let removed = plan.delete_instance(id)?;
            log::debug!(
                "agent {} ({}) 的 fragment 为空，移出本次查询",
                id,
                removed.info.agent_id
            );
            changed = true;
        }
        Ok(changed)
    }
}
