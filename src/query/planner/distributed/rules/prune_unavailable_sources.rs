//! 裁剪 agent 无法提供的源算子
//!
//! # 转换示例
//!
//! Before (聚合 agent 的 fragment):
//! ```text
//!   MemorySource(http_events)
//!       |
//!   Sink
//! ```
//!
//! After:
//! ```text
//!   (空)
//! ```
//!
//! # 适用条件
//!
//! - MemorySource：agent 不是边缘 agent，或局部性映射中该表不包含本 agent
//! - UdtfSource：执行者与 agent 类别不兼容，或参数约束（UPID 的 ASID、agent UUID）不满足
//!
//! 源被删除时一并删除因此失去全部输入的下游节点。其他类型的源暂不裁剪。

use std::sync::Arc;

use crate::core::error::{PlacementError, PlannerResult};
use crate::core::types::Upid;
use crate::expression::{SemanticType, UdtfExecutor};
use crate::query::planner::distributed::agent::{AgentInfo, AgentInstance};
use crate::query::planner::distributed::locality::LocalityMap;
use crate::query::planner::distributed::rules::pattern::Pattern;
use crate::query::planner::distributed::rules::rule::{FragmentRule, Rule, RuleExecutor};
use crate::query::planner::plan::{MemorySourceNode, PlanGraph, PlanNodeEnum, UdtfSourceNode};

/// 单个 fragment 上的源裁剪规则
#[derive(Debug)]
pub struct PruneUnavailableSourcesRule<'a> {
    agent_id: i64,
    agent_info: &'a AgentInfo,
    schema_map: &'a LocalityMap,
    strict_udtf_executor: bool,
}

impl<'a> PruneUnavailableSourcesRule<'a> {
    pub fn new(agent_id: i64, agent_info: &'a AgentInfo, schema_map: &'a LocalityMap) -> Self {
        Self {
            agent_id,
            agent_info,
            schema_map,
            strict_udtf_executor: true,
        }
    }

    /// 关闭后，`AllAggregator` 执行者只记录告警并裁剪该源，而不是报错
    pub fn with_strict_udtf_executor(mut self, strict: bool) -> Self {
        self.strict_udtf_executor = strict;
        self
    }

    fn agent_has_table(&self, table_name: &str) -> bool {
        self.schema_map.agent_has_table(table_name, self.agent_id)
    }

    fn keep_memory_source(&self, mem_src: &MemorySourceNode) -> bool {
        self.agent_info.is_edge() && self.agent_has_table(&mem_src.table_name)
    }

    fn keep_udtf_source(&self, udtf_src: &UdtfSourceNode) -> PlannerResult<bool> {
        Ok(self.agent_executes_udtf(udtf_src)? && self.udtf_matches_filters(udtf_src)?)
    }

    /// 执行者与 agent 类别是否兼容
    fn agent_executes_udtf(&self, udtf_src: &UdtfSourceNode) -> PlannerResult<bool> {
        let spec = &udtf_src.spec;
        match spec.executor {
            UdtfExecutor::AllAgents => Ok(true),
            UdtfExecutor::AllEdge | UdtfExecutor::SubsetEdge => Ok(self.agent_info.is_edge()),
            UdtfExecutor::SubsetAggregator | UdtfExecutor::OneAggregator => {
                Ok(self.agent_info.is_aggregator())
            }
            UdtfExecutor::AllAggregator => {
                if self.strict_udtf_executor {
                    return Err(PlacementError::unsupported(format!(
                        "UDTF '{}' 的执行者 {} 尚未支持",
                        spec.name, spec.executor
                    ))
                    .into());
                }
                log::error!(
                    "UDTF '{}' 的执行者 {} 尚未支持，按不兼容处理",
                    spec.name,
                    spec.executor
                );
                Ok(false)
            }
        }
    }

    /// 参数约束是否满足
    fn udtf_matches_filters(&self, udtf_src: &UdtfSourceNode) -> PlannerResult<bool> {
        let spec = &udtf_src.spec;
        for (idx, arg) in spec.args.iter().enumerate() {
            if arg.semantic_type == SemanticType::None {
                continue;
            }
            let value = udtf_src.arg_values.get(idx).ok_or_else(|| {
                PlacementError::malformed_udtf(&spec.name, format!("参数 '{}' 没有绑定值", arg.name))
            })?;

            let satisfied = match arg.semantic_type {
                SemanticType::None => Some(true),
                SemanticType::Upid => value
                    .as_u128()
                    .map(|raw| Upid::from_u128(raw).asid() == self.agent_info.asid),
                SemanticType::AgentUid => value
                    .as_str()
                    .map(|uid| self.agent_info.agent_id.to_string() == uid),
            };
            match satisfied {
                Some(true) => {}
                Some(false) => return Ok(false),
                None => {
                    return Err(PlacementError::malformed_udtf(
                        &spec.name,
                        format!(
                            "参数 '{}' 的语义类型 {:?} 与绑定值类型 {} 不一致",
                            arg.name,
                            arg.semantic_type,
                            value.type_name()
                        ),
                    )
                    .into());
                }
            }
        }
        Ok(true)
    }
}

impl Rule for PruneUnavailableSourcesRule<'_> {
    fn name(&self) -> &'static str {
        "PruneUnavailableSourcesRule"
    }

    fn pattern(&self) -> Pattern {
        Pattern::source()
    }

    fn apply(&self, graph: &mut PlanGraph, node_id: i64) -> PlannerResult<bool> {
        let keep = match graph.get(node_id)? {
            PlanNodeEnum::MemorySource(mem_src) => self.keep_memory_source(mem_src),
            PlanNodeEnum::UdtfSource(udtf_src) => self.keep_udtf_source(udtf_src)?,
            _ => return Ok(false),
        };
        if keep {
            return Ok(false);
        }

        let deleted = graph.delete_orphans_in_subtree(node_id)?;
        log::debug!(
            "agent {} 裁剪源节点 {}，共删除 {} 个节点: {:?}",
            self.agent_id,
            node_id,
            deleted.len(),
            deleted
        );
        Ok(true)
    }
}

/// fleet 级源裁剪
///
/// 为每个 agent 构造节点规则并在其 fragment 上执行。删除源不会暴露新的源，单轮即可收敛。
#[derive(Debug, Clone)]
pub struct DistributedPruneUnavailableSourcesRule {
    schema_map: Arc<LocalityMap>,
    strict_udtf_executor: bool,
    executor: RuleExecutor,
}

impl DistributedPruneUnavailableSourcesRule {
    pub fn new(schema_map: Arc<LocalityMap>) -> Self {
        Self {
            schema_map,
            strict_udtf_executor: true,
            executor: RuleExecutor::default(),
        }
    }

    pub fn with_strict_udtf_executor(mut self, strict: bool) -> Self {
        self.strict_udtf_executor = strict;
        self
    }

    pub fn with_max_iteration_rounds(mut self, rounds: usize) -> Self {
        self.executor = RuleExecutor::new(rounds);
        self
    }
}

impl FragmentRule for DistributedPruneUnavailableSourcesRule {
    fn name(&self) -> &'static str {
        "DistributedPruneUnavailableSourcesRule"
    }

    fn apply(&self, instance: &mut AgentInstance) -> PlannerResult<bool> {
        let AgentInstance { id, info, plan } = instance;
        let rule = PruneUnavailableSourcesRule::new(*id, info, &self.schema_map)
            .with_strict_udtf_executor(self.strict_udtf_executor);
        self.executor.execute(&rule, plan)
    }
}
