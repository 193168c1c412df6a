//! 标量函数放置校验
//!
//! 两个校验器结构相同，只是可接受的执行者集合不同：
//! - 边缘 agent：{Any, EdgeOnly}
//! - 聚合 agent：{Any, AggregatorOnly}
//!
//! 对每个算子自底向上遍历其表达式树，遇到第一个不可放置的标量函数即失败。
//! 聚合函数和显式豁免的函数不参与检查。校验器不修改计划。

use std::sync::Arc;

use crate::core::error::{AgentClass, PlacementError, PlannerError, PlannerResult};
use crate::expression::{FuncExpr, RegistryInfo, ScalarExpr, UdfExecType, UdfSourceExecutor};
use crate::query::planner::distributed::agent::AgentInstance;
use crate::query::planner::distributed::rules::pattern::Pattern;
use crate::query::planner::distributed::rules::rule::{FragmentRule, Rule, RuleExecutor};
use crate::query::planner::plan::{PlanGraph, PlanNodeEnum};

const EDGE_EXECUTORS: &[UdfSourceExecutor] = &[UdfSourceExecutor::Any, UdfSourceExecutor::EdgeOnly];
const AGGREGATOR_EXECUTORS: &[UdfSourceExecutor] =
    &[UdfSourceExecutor::Any, UdfSourceExecutor::AggregatorOnly];

fn valid_executors(class: AgentClass) -> &'static [UdfSourceExecutor] {
    match class {
        AgentClass::Edge => EDGE_EXECUTORS,
        AgentClass::Aggregator => AGGREGATOR_EXECUTORS,
    }
}

/// 检查表达式树中的标量函数
///
/// 返回第一个执行者不在 `valid` 中的函数名；全部可放置时返回 `None`。
/// 参数先于函数本身被检查。
pub fn check_scalar_func_executor(
    registry: &RegistryInfo,
    expr: &ScalarExpr,
    valid: &[UdfSourceExecutor],
) -> PlannerResult<Option<String>> {
    match expr {
        ScalarExpr::Column { .. } | ScalarExpr::Literal(_) => Ok(None),
        ScalarExpr::Func(func) => check_func(registry, func, valid),
    }
}

fn check_func(
    registry: &RegistryInfo,
    func: &FuncExpr,
    valid: &[UdfSourceExecutor],
) -> PlannerResult<Option<String>> {
    for arg in &func.args {
        if let Some(bad) = check_scalar_func_executor(registry, arg, valid)? {
            return Ok(Some(bad));
        }
    }

    let mut arg_types = Vec::with_capacity(func.args.len());
    for arg in &func.args {
        let data_type = arg.evaluated_data_type();
        if !data_type.is_resolved() {
            return Err(PlannerError::unresolved_type(&func.name, arg.to_string()));
        }
        arg_types.push(data_type);
    }

    if registry.udf_exec_type(&func.name)? != UdfExecType::Scalar {
        return Ok(None);
    }
    let executor = registry.udf_source_executor(&func.name, &arg_types)?;
    if valid.contains(&executor) {
        Ok(None)
    } else {
        Ok(Some(func.name.clone()))
    }
}

/// 检查单个算子的全部表达式，返回第一个不可放置的函数名
fn first_misplaced_udf(
    registry: &RegistryInfo,
    node: &PlanNodeEnum,
    valid: &[UdfSourceExecutor],
) -> PlannerResult<Option<String>> {
    for expr in node.expressions() {
        if let Some(bad) = check_scalar_func_executor(registry, expr, valid)? {
            return Ok(Some(bad));
        }
    }
    Ok(None)
}

/// 算子中的函数是否都能在边缘 agent 上执行
pub fn operator_udfs_run_on_edge(registry: &RegistryInfo, node: &PlanNodeEnum) -> PlannerResult<bool> {
    Ok(first_misplaced_udf(registry, node, EDGE_EXECUTORS)?.is_none())
}

/// 算子中的函数是否都能在聚合 agent 上执行
pub fn operator_udfs_run_on_aggregator(
    registry: &RegistryInfo,
    node: &PlanNodeEnum,
) -> PlannerResult<bool> {
    Ok(first_misplaced_udf(registry, node, AGGREGATOR_EXECUTORS)?.is_none())
}

fn validate_node(
    registry: &RegistryInfo,
    graph: &PlanGraph,
    node_id: i64,
    agent_id: i64,
    class: AgentClass,
) -> PlannerResult<bool> {
    let node = graph.get(node_id)?;
    match first_misplaced_udf(registry, node, valid_executors(class))? {
        Some(func) => Err(PlacementError::function_placement(node_id, agent_id, func, class).into()),
        None => Ok(false),
    }
}

/// 边缘 agent fragment 的放置校验
#[derive(Debug)]
pub struct ScalarUdfsRunOnEdgeRule<'a> {
    registry: &'a RegistryInfo,
    agent_id: i64,
}

impl<'a> ScalarUdfsRunOnEdgeRule<'a> {
    pub fn new(registry: &'a RegistryInfo, agent_id: i64) -> Self {
        Self { registry, agent_id }
    }
}

impl Rule for ScalarUdfsRunOnEdgeRule<'_> {
    fn name(&self) -> &'static str {
        "ScalarUdfsRunOnEdgeRule"
    }

    fn pattern(&self) -> Pattern {
        Pattern::operator()
    }

    fn apply(&self, graph: &mut PlanGraph, node_id: i64) -> PlannerResult<bool> {
        validate_node(self.registry, graph, node_id, self.agent_id, AgentClass::Edge)
    }
}

/// 聚合 agent fragment 的放置校验
#[derive(Debug)]
pub struct ScalarUdfsRunOnAggregatorRule<'a> {
    registry: &'a RegistryInfo,
    agent_id: i64,
}

impl<'a> ScalarUdfsRunOnAggregatorRule<'a> {
    pub fn new(registry: &'a RegistryInfo, agent_id: i64) -> Self {
        Self { registry, agent_id }
    }
}

impl Rule for ScalarUdfsRunOnAggregatorRule<'_> {
    fn name(&self) -> &'static str {
        "ScalarUdfsRunOnAggregatorRule"
    }

    fn pattern(&self) -> Pattern {
        Pattern::operator()
    }

    fn apply(&self, graph: &mut PlanGraph, node_id: i64) -> PlannerResult<bool> {
        validate_node(
            self.registry,
            graph,
            node_id,
            self.agent_id,
            AgentClass::Aggregator,
        )
    }
}

/// fleet 级放置校验：按 agent 类别选择校验器
#[derive(Debug, Clone)]
pub struct DistributedScalarUdfPlacementRule {
    registry: Arc<RegistryInfo>,
}

impl DistributedScalarUdfPlacementRule {
    pub fn new(registry: Arc<RegistryInfo>) -> Self {
        Self { registry }
    }
}

impl FragmentRule for DistributedScalarUdfPlacementRule {
    fn name(&self) -> &'static str {
        "DistributedScalarUdfPlacementRule"
    }

    fn apply(&self, instance: &mut AgentInstance) -> PlannerResult<bool> {
        let executor = RuleExecutor::default();
        match instance.info.agent_class() {
            Some(AgentClass::Edge) => executor.execute(
                &ScalarUdfsRunOnEdgeRule::new(&self.registry, instance.id),
                &mut instance.plan,
            ),
            Some(AgentClass::Aggregator) => executor.execute(
                &ScalarUdfsRunOnAggregatorRule::new(&self.registry, instance.id),
                &mut instance.plan,
            ),
            None => {
                log::debug!(
                    "agent {} ({}) 不处理数据，跳过函数放置校验",
                    instance.id,
                    instance.info.agent_id
                );
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::DataType;
    use crate::core::value::Value;
    use crate::expression::ColumnExpr;
    use crate::query::planner::distributed::agent::AgentInfo;
    use crate::query::planner::plan::{
        AggNode, FilterNode, MapNode, MemorySourceNode, SinkNode,
    };
    use uuid::Uuid;

    fn build_registry() -> PlannerResult<RegistryInfo> {
        let mut registry = RegistryInfo::new();
        registry
            .register_scalar("pod_name", vec![DataType::UInt128], UdfSourceExecutor::EdgeOnly)?
            .register_scalar(
                "service_for_ip",
                vec![DataType::String],
                UdfSourceExecutor::AggregatorOnly,
            )?
            .register_scalar(
                "add",
                vec![DataType::Int64, DataType::Int64],
                UdfSourceExecutor::Any,
            )?
            .register_scalar("upper", vec![DataType::String], UdfSourceExecutor::Any)?
            .register_aggregate("count")?
            .register_exempt("now")?;
        Ok(registry)
    }

    fn registry() -> RegistryInfo {
        build_registry().expect("registry should build")
    }

    fn fragment_with_map(expr: ScalarExpr) -> (PlanGraph, i64) {
        let mut graph = PlanGraph::new();
        let src = graph.add_node(PlanNodeEnum::MemorySource(MemorySourceNode::new("conn")));
        let map = graph
            .add_node_with_inputs(
                PlanNodeEnum::Map(MapNode {
                    exprs: vec![ColumnExpr::new("out", expr)],
                }),
                &[src],
            )
            .expect("add map");
        graph
            .add_node_with_inputs(PlanNodeEnum::Sink(SinkNode::new("out")), &[map])
            .expect("add sink");
        (graph, map)
    }

    fn aggregator_only_call() -> ScalarExpr {
        ScalarExpr::func(
            "service_for_ip",
            vec![ScalarExpr::column("remote_addr", DataType::String)],
            DataType::String,
        )
    }

    #[test]
    fn test_aggregator_only_function_rejected_on_edge() {
        let registry = registry();
        let (mut graph, map) = fragment_with_map(aggregator_only_call());

        let err = ScalarUdfsRunOnEdgeRule::new(&registry, 7)
            .execute(&mut graph)
            .expect_err("edge validator should reject");
        assert_eq!(
            err,
            PlannerError::Placement(PlacementError::function_placement(
                map,
                7,
                "service_for_ip",
                AgentClass::Edge
            ))
        );
        let msg = err.to_string();
        assert!(msg.contains("service_for_ip"));
        assert!(msg.contains("after blocking nodes"));
        assert!(err.is_user_facing());
    }

    #[test]
    fn test_aggregator_only_function_accepted_on_aggregator() {
        let registry = registry();
        let (mut graph, _) = fragment_with_map(aggregator_only_call());
        let before = graph.clone();

        let changed = ScalarUdfsRunOnAggregatorRule::new(&registry, 1)
            .execute(&mut graph)
            .expect("aggregator validator should accept");
        assert!(!changed);
        assert_eq!(graph, before);
    }

    #[test]
    fn test_edge_only_function_rejected_on_aggregator() {
        let registry = registry();
        let expr = ScalarExpr::func(
            "pod_name",
            vec![ScalarExpr::column("upid", DataType::UInt128)],
            DataType::String,
        );
        let (mut graph, _) = fragment_with_map(expr);

        let err = ScalarUdfsRunOnAggregatorRule::new(&registry, 2)
            .execute(&mut graph)
            .expect_err("aggregator validator should reject");
        assert!(err.to_string().contains("before blocking nodes"));
        match err {
            PlannerError::Placement(p) => assert_eq!(p.func_name(), Some("pod_name")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_innermost_offending_function_reported_first() {
        let registry = registry();
        let expr = ScalarExpr::func(
            "upper",
            vec![aggregator_only_call()],
            DataType::String,
        );
        let (graph, map) = fragment_with_map(expr);
        let node = graph.get(map).expect("map exists");

        let bad = first_misplaced_udf(&registry, node, EDGE_EXECUTORS).expect("check should run");
        assert_eq!(bad.as_deref(), Some("service_for_ip"));
        assert!(!operator_udfs_run_on_edge(&registry, node).expect("check should run"));
        assert!(operator_udfs_run_on_aggregator(&registry, node).expect("check should run"));
    }

    #[test]
    fn test_unresolved_argument_type_is_internal_error() {
        let registry = registry();
        let expr = ScalarExpr::func(
            "upper",
            vec![ScalarExpr::column("name", DataType::Unknown)],
            DataType::String,
        );
        let (mut graph, _) = fragment_with_map(expr);

        let err = ScalarUdfsRunOnEdgeRule::new(&registry, 1)
            .execute(&mut graph)
            .expect_err("unresolved type should fail");
        assert_eq!(err, PlannerError::unresolved_type("upper", "col(name)"));
        assert!(!err.is_user_facing());
    }

    #[test]
    fn test_aggregate_and_exempt_functions_not_checked() {
        let registry = registry();
        let mut graph = PlanGraph::new();
        let src = graph.add_node(PlanNodeEnum::MemorySource(MemorySourceNode::new("conn")));
        let filter = graph
            .add_node_with_inputs(
                PlanNodeEnum::Filter(FilterNode {
                    condition: ScalarExpr::func("now", vec![], DataType::Time64ns),
                }),
                &[src],
            )
            .expect("add filter");
        let agg = graph
            .add_node_with_inputs(
                PlanNodeEnum::Agg(AggNode {
                    groups: vec!["service".to_string()],
                    aggregates: vec![ColumnExpr::new(
                        "cnt",
                        ScalarExpr::func(
                            "count",
                            vec![ScalarExpr::column("latency", DataType::Int64)],
                            DataType::Int64,
                        ),
                    )],
                }),
                &[filter],
            )
            .expect("add agg");
        graph
            .add_node_with_inputs(PlanNodeEnum::Sink(SinkNode::new("out")), &[agg])
            .expect("add sink");

        for class in [AgentClass::Edge, AgentClass::Aggregator] {
            for id in graph.node_ids() {
                assert!(!validate_node(&registry, &graph, id, 1, class).expect("should accept"));
            }
        }
    }

    #[test]
    fn test_any_function_accepted_everywhere() {
        let registry = registry();
        let expr = ScalarExpr::func(
            "add",
            vec![
                ScalarExpr::column("latency", DataType::Int64),
                ScalarExpr::literal(Value::Int64(1)),
            ],
            DataType::Int64,
        );
        let (graph, map) = fragment_with_map(expr);
        let node = graph.get(map).expect("map exists");
        assert!(operator_udfs_run_on_edge(&registry, node).expect("check should run"));
        assert!(operator_udfs_run_on_aggregator(&registry, node).expect("check should run"));
    }

    #[test]
    fn test_unknown_function_is_registry_error() {
        let registry = registry();
        let expr = ScalarExpr::func("mystery", vec![], DataType::Int64);
        let (mut graph, _) = fragment_with_map(expr);

        let err = ScalarUdfsRunOnEdgeRule::new(&registry, 1)
            .execute(&mut graph)
            .expect_err("unknown function should fail");
        assert!(matches!(err, PlannerError::Registry(_)));
    }

    #[test]
    fn test_distributed_rule_picks_validator_by_agent_class() {
        let rule = DistributedScalarUdfPlacementRule::new(Arc::new(registry()));
        let (graph, _) = fragment_with_map(aggregator_only_call());

        let mut edge = AgentInstance::new(1, AgentInfo::edge(Uuid::new_v4(), 1), graph.clone());
        assert!(rule.apply(&mut edge).is_err());

        let mut aggregator =
            AgentInstance::new(2, AgentInfo::aggregator(Uuid::new_v4(), 2), graph.clone());
        assert!(!rule.apply(&mut aggregator).expect("aggregator should accept"));

        let mut idle_info = AgentInfo::edge(Uuid::new_v4(), 3);
        idle_info.processes_data = false;
        let mut idle = AgentInstance::new(3, idle_info, graph);
        assert!(!rule.apply(&mut idle).expect("idle agent is skipped"));
    }
}
