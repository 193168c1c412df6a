//! 分布式计划重写器
//!
//! 按固定顺序在 fleet 计划上执行各条规则：
//! 1. 裁剪各 agent 无法提供的源
//! 2. 移除 fragment 为空的 agent
//! 3. 为 Limit 标注可提前取消的源
//! 4. 校验函数放置
//!
//! 任一步骤失败则整个查询编译失败，不存在部分 agent 成功的结果。

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::PlannerConfig;
use crate::core::error::PlannerResult;
use crate::expression::RegistryInfo;
use crate::query::planner::distributed::distributed_plan::DistributedPlan;
use crate::query::planner::distributed::locality::{load_schema_map, DistributedState, LocalityMap};
use crate::query::planner::distributed::rules::{
    DistributedAnnotateAbortableSrcsForLimitsRule, DistributedPruneUnavailableSourcesRule,
    DistributedRule, DistributedScalarUdfPlacementRule, IntoRuleWrapper, PruneEmptyPlansRule,
};

/// 一次重写的结果摘要
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteSummary {
    /// 是否有源被裁剪
    pub pruned_sources: bool,
    /// 因 fragment 为空而移出本次查询的 agent
    pub removed_agents: Vec<Uuid>,
    /// 是否有 Limit 新增了可取消的源
    pub annotated_limits: bool,
}

/// 分布式计划重写器
#[derive(Debug, Clone)]
pub struct DistributedRewriter {
    config: PlannerConfig,
    registry: Arc<RegistryInfo>,
    schema_map: Arc<LocalityMap>,
}

impl DistributedRewriter {
    pub fn new(config: PlannerConfig, registry: Arc<RegistryInfo>, schema_map: Arc<LocalityMap>) -> Self {
        Self {
            config,
            registry,
            schema_map,
        }
    }

    /// 由 fleet 状态构造，局部性映射中的 agent 按 `plan` 中的实例ID解析
    pub fn from_state(
        config: PlannerConfig,
        registry: Arc<RegistryInfo>,
        state: &DistributedState,
        plan: &DistributedPlan,
    ) -> PlannerResult<Self> {
        let schema_map = load_schema_map(state, &plan.uuid_to_id_map())?;
        Ok(Self::new(config, registry, Arc::new(schema_map)))
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn rewrite(&self, plan: &mut DistributedPlan) -> PlannerResult<RewriteSummary> {
        let mut summary = RewriteSummary::default();
        let parallel = self.config.parallel_fragments;
        let rounds = self.config.max_iteration_rounds;

        let prune = DistributedPruneUnavailableSourcesRule::new(Arc::clone(&self.schema_map))
            .with_strict_udtf_executor(self.config.strict_udtf_executor)
            .with_max_iteration_rounds(rounds)
            .into_wrapper()
            .with_parallel(parallel);
        summary.pruned_sources = self.run(&prune, plan)?;

        let before: Vec<(i64, Uuid)> = plan.instances().map(|i| (i.id, i.info.agent_id)).collect();
        if self.run(&PruneEmptyPlansRule::new(), plan)? {
            summary.removed_agents = before
                .into_iter()
                .filter(|(id, _)| !plan.contains(*id))
                .map(|(_, uuid)| uuid)
                .collect();
        }

        if self.config.annotate_limits {
            let annotate = DistributedAnnotateAbortableSrcsForLimitsRule::new()
                .with_max_iteration_rounds(rounds)
                .into_wrapper()
                .with_parallel(parallel);
            summary.annotated_limits = self.run(&annotate, plan)?;
        }

        if self.config.validate_udf_placement {
            let validate = DistributedScalarUdfPlacementRule::new(Arc::clone(&self.registry))
                .into_wrapper()
                .with_parallel(parallel);
            self.run(&validate, plan)?;
        }

        log::info!(
            "分布式计划重写完成: 剩余 {} 个 agent，移除 {} 个",
            plan.len(),
            summary.removed_agents.len()
        );
        Ok(summary)
    }

    fn run(&self, rule: &dyn DistributedRule, plan: &mut DistributedPlan) -> PlannerResult<bool> {
        log::debug!("执行规则 {}", rule.name());
        rule.execute(plan).map_err(|e| {
            log::error!("规则 {} 执行失败: {}", rule.name(), e);
            e
        })
    }
}
