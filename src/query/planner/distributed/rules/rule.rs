//! 规则 trait 定义与执行驱动
//!
//! 两种规则形态：
//! - `Rule`: 节点规则，按模式匹配单个节点并应用，声明遍历顺序以及是否重复执行到不动点
//! - `FragmentRule` / `DistributedRule`: 以 agent fragment 或整个 fleet 计划为单位应用
//!
//! 节点规则在执行过程中可能删除节点，驱动器在每一轮开始前对匹配集合做快照，
//! 应用前再确认节点仍然存在，保证每个存活节点每轮最多被访问一次。

use rayon::prelude::*;

use crate::core::error::PlannerResult;
use crate::query::planner::distributed::agent::AgentInstance;
use crate::query::planner::distributed::distributed_plan::DistributedPlan;
use crate::query::planner::distributed::rules::pattern::Pattern;
use crate::query::planner::plan::PlanGraph;

/// 节点规则默认的最大执行轮数
pub const DEFAULT_MAX_ITERATION_ROUNDS: usize = 16;

/// 节点遍历顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalOrder {
    /// 上游在前
    Topological,
    /// 下游在前
    ReverseTopological,
    /// 按节点ID顺序
    Unordered,
}

/// 节点规则 trait
///
/// 返回值表示本次应用是否修改了 fragment。
pub trait Rule: std::fmt::Debug + Send + Sync {
    /// 规则名称
    fn name(&self) -> &'static str;

    /// 返回规则的模式
    fn pattern(&self) -> Pattern;

    fn traversal_order(&self) -> TraversalOrder {
        TraversalOrder::Unordered
    }

    /// 是否重复执行直到某一轮没有任何修改
    fn reexecute_until_fixpoint(&self) -> bool {
        false
    }

    /// 对单个匹配节点应用规则
    fn apply(&self, graph: &mut PlanGraph, node_id: i64) -> PlannerResult<bool>;

    /// 检查规则是否匹配
    fn matches(&self, graph: &PlanGraph, node_id: i64) -> bool {
        graph
            .get(node_id)
            .map(|node| self.pattern().matches(node))
            .unwrap_or(false)
    }

    /// 在整个 fragment 上执行规则
    fn execute(&self, graph: &mut PlanGraph) -> PlannerResult<bool>
    where
        Self: Sized,
    {
        RuleExecutor::default().execute(self, graph)
    }
}

/// 节点规则驱动器
#[derive(Debug, Clone, Copy)]
pub struct RuleExecutor {
    max_iteration_rounds: usize,
}

impl Default for RuleExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITERATION_ROUNDS)
    }
}

impl RuleExecutor {
    pub fn new(max_iteration_rounds: usize) -> Self {
        Self {
            max_iteration_rounds: max_iteration_rounds.max(1),
        }
    }

    pub fn max_iteration_rounds(&self) -> usize {
        self.max_iteration_rounds
    }

    pub fn execute(&self, rule: &dyn Rule, graph: &mut PlanGraph) -> PlannerResult<bool> {
        let mut changed = false;
        let mut rounds = 0;
        loop {
            let round_changed = self.execute_once(rule, graph)?;
            changed |= round_changed;
            rounds += 1;

            if !rule.reexecute_until_fixpoint() || !round_changed {
                break;
            }
            if rounds >= self.max_iteration_rounds {
                log::warn!(
                    "规则 {} 在 {} 轮后仍未收敛，停止执行",
                    rule.name(),
                    rounds
                );
                break;
            }
        }
        Ok(changed)
    }

    /// 单轮：先快照匹配集合，再逐个应用
    fn execute_once(&self, rule: &dyn Rule, graph: &mut PlanGraph) -> PlannerResult<bool> {
        let pattern = rule.pattern();
        let mut candidates: Vec<i64> = match rule.traversal_order() {
            TraversalOrder::Topological => graph.topological_sort(),
            TraversalOrder::ReverseTopological => {
                let mut order = graph.topological_sort();
                order.reverse();
                order
            }
            TraversalOrder::Unordered => graph.node_ids(),
        };
        candidates.retain(|id| graph.get(*id).map(|n| pattern.matches(n)).unwrap_or(false));

        let mut changed = false;
        for id in candidates {
            // 前面的应用可能已经级联删除了该节点
            if !rule.matches(graph, id) {
                continue;
            }
            changed |= rule.apply(graph, id)?;
        }
        Ok(changed)
    }
}

/// fragment 规则 trait
///
/// 以单个 agent 的 fragment 为单位应用；不同 agent 之间互不影响。
pub trait FragmentRule: std::fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, instance: &mut AgentInstance) -> PlannerResult<bool>;
}

/// fleet 规则 trait
///
/// 以整个 fleet 计划为单位执行，可以增删 agent。
pub trait DistributedRule: std::fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn execute(&self, plan: &mut DistributedPlan) -> PlannerResult<bool>;
}

/// 规则包装器
///
/// 把 fragment 规则提升为 fleet 规则：对每个 agent 各执行一次，
/// 开启 `parallel` 时各 fragment 并行处理。任一 fragment 失败则整体失败，
/// 报告的是ID最小的那个 agent 的错误。
#[derive(Debug)]
pub struct RuleWrapper<T: FragmentRule> {
    inner: T,
    parallel: bool,
}

impl<T: FragmentRule> RuleWrapper<T> {
    pub fn new(rule: T) -> Self {
        Self {
            inner: rule,
            parallel: false,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: FragmentRule> DistributedRule for RuleWrapper<T> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn execute(&self, plan: &mut DistributedPlan) -> PlannerResult<bool> {
        if self.parallel {
            let results: Vec<PlannerResult<bool>> = plan
                .instances_mut()
                .par_iter_mut()
                .map(|(_, instance)| self.inner.apply(instance))
                .collect();
            let mut changed = false;
            for result in results {
                changed |= result?;
            }
            return Ok(changed);
        }

        // 顺序执行时遇到第一个错误即停止，后续 agent 不再处理
        let mut changed = false;
        for (_, instance) in plan.instances_mut().iter_mut() {
            changed |= self.inner.apply(instance)?;
        }
        Ok(changed)
    }
}

/// 规则适配器 trait
pub trait IntoRuleWrapper: FragmentRule + Sized {
    fn into_wrapper(self) -> RuleWrapper<Self> {
        RuleWrapper::new(self)
    }
}

impl<T: FragmentRule + Sized> IntoRuleWrapper for T {}
