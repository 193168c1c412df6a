//! 集成测试共享工具模块
//!
//! 提供 fleet、函数注册表和 fragment 的构造函数

#![allow(dead_code)]

pub mod assertions;

use distplan::core::{DataType, PlannerResult, Upid, Value};
use distplan::expression::{
    ColumnExpr, RegistryInfo, ScalarExpr, SemanticType, UdfSourceExecutor, UdtfArg, UdtfExecutor,
    UdtfSpec,
};
use distplan::query::planner::distributed::{AgentInfo, DistributedState, SchemaInfo};
use distplan::query::planner::plan::{
    FilterNode, LimitNode, MapNode, MemorySourceNode, SinkNode, UdtfSourceNode,
};
use distplan::query::planner::{PlanGraph, PlanNodeEnum};
use uuid::Uuid;

/// 逐个加入节点的 fragment 构造器
#[derive(Default)]
pub struct FragmentBuilder {
    graph: PlanGraph,
}

impl FragmentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&mut self, node: PlanNodeEnum, inputs: &[i64]) -> i64 {
        self.graph
            .add_node_with_inputs(node, inputs)
            .expect("添加节点应该成功")
    }

    pub fn memory_source(&mut self, table: &str) -> i64 {
        self.node(PlanNodeEnum::MemorySource(MemorySourceNode::new(table)), &[])
    }

    pub fn udtf_source(&mut self, spec: UdtfSpec, args: Vec<Value>) -> i64 {
        self.node(PlanNodeEnum::UdtfSource(UdtfSourceNode::new(spec, args)), &[])
    }

    pub fn filter(&mut self, input: i64) -> i64 {
        self.node(
            PlanNodeEnum::Filter(FilterNode {
                condition: ScalarExpr::literal(Value::Boolean(true)),
            }),
            &[input],
        )
    }

    pub fn map(&mut self, input: i64, expr: ScalarExpr) -> i64 {
        self.node(
            PlanNodeEnum::Map(MapNode {
                exprs: vec![ColumnExpr::new("out", expr)],
            }),
            &[input],
        )
    }

    pub fn limit(&mut self, input: i64, count: i64) -> i64 {
        self.node(PlanNodeEnum::Limit(LimitNode::new(count)), &[input])
    }

    pub fn sink(&mut self, input: i64, name: &str) -> i64 {
        self.node(PlanNodeEnum::Sink(SinkNode::new(name)), &[input])
    }

    pub fn build(self) -> PlanGraph {
        self.graph
    }
}

/// `MemorySource(table) -> Sink`
pub fn source_to_sink(table: &str) -> PlanGraph {
    let mut b = FragmentBuilder::new();
    let src = b.memory_source(table);
    b.sink(src, "out");
    b.build()
}

/// fleet 状态：agents 与表分布
pub fn state_with(agents: &[AgentInfo], tables: &[(&str, Vec<Uuid>)]) -> DistributedState {
    DistributedState {
        agents: agents.to_vec(),
        schema_info: tables
            .iter()
            .map(|(name, holders)| SchemaInfo {
                name: name.to_string(),
                agent_list: holders.iter().map(|u| u.to_string()).collect(),
            })
            .collect(),
    }
}

fn build_registry() -> PlannerResult<RegistryInfo> {
    let mut registry = RegistryInfo::new();
    registry
        .register_scalar("upid_to_pod", vec![DataType::UInt128], UdfSourceExecutor::EdgeOnly)?
        .register_scalar(
            "service_for_ip",
            vec![DataType::String],
            UdfSourceExecutor::AggregatorOnly,
        )?
        .register_scalar("upper", vec![DataType::String], UdfSourceExecutor::Any)?
        .register_aggregate("count")?
        .register_exempt("now")?;
    Ok(registry)
}

/// 测试用函数注册表
pub fn registry() -> RegistryInfo {
    build_registry().expect("test registry should build")
}

pub fn call(name: &str, arg: ScalarExpr) -> ScalarExpr {
    ScalarExpr::func(name, vec![arg], DataType::String)
}

pub fn string_col(name: &str) -> ScalarExpr {
    ScalarExpr::column(name, DataType::String)
}

/// 绑定一个 UPID 参数的 UDTF
pub fn upid_udtf(executor: UdtfExecutor, asid: u32) -> (UdtfSpec, Vec<Value>) {
    let spec = UdtfSpec::new("process_stats", executor).with_arg(UdtfArg::new(
        "upid",
        DataType::UInt128,
        SemanticType::Upid,
    ));
    let upid = Upid::new(asid, 42, 1_000);
    (spec, vec![Value::UInt128(upid.value())])
}
