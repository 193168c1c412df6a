//! PlanNode 枚举定义
//!
//! 单个 agent fragment 中的算子节点。节点只保存自身参数，
//! 输入输出关系由 `PlanGraph` 以节点ID维护。

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::value::Value;
use crate::expression::{ColumnExpr, ScalarExpr, UdtfSpec};

/// 读取本地表数据的源节点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorySourceNode {
    pub table_name: String,
    #[serde(default)]
    pub columns: Vec<String>,
}

impl MemorySourceNode {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: Vec::new(),
        }
    }
}

/// UDTF 源节点
///
/// `arg_values` 与 `spec.args` 按位置一一对应。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UdtfSourceNode {
    pub spec: UdtfSpec,
    #[serde(default)]
    pub arg_values: Vec<Value>,
}

impl UdtfSourceNode {
    pub fn new(spec: UdtfSpec, arg_values: Vec<Value>) -> Self {
        Self { spec, arg_values }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MapNode {
    #[serde(default)]
    pub exprs: Vec<ColumnExpr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterNode {
    pub condition: ScalarExpr,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AggNode {
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub aggregates: Vec<ColumnExpr>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupByNode {
    #[serde(default)]
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
    Outer,
}

/// 连接节点，输入顺序为 (左, 右)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JoinNode {
    #[serde(default)]
    pub join_type: JoinType,
    #[serde(default)]
    pub left_on: Vec<String>,
    #[serde(default)]
    pub right_on: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UnionNode {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingNode {
    pub window_column: String,
    pub window_size: i64,
}

/// 限制节点
///
/// `abortable_srcs` 记录在本节点输出满额后可以被提前取消的源节点ID，只增不减。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitNode {
    pub count: i64,
    #[serde(default)]
    pub abortable_srcs: BTreeSet<i64>,
}

impl LimitNode {
    pub fn new(count: i64) -> Self {
        Self {
            count,
            abortable_srcs: BTreeSet::new(),
        }
    }

    /// 记录可提前取消的源节点，返回是否为新增
    pub fn add_abortable_source(&mut self, source_id: i64) -> bool {
        self.abortable_srcs.insert(source_id)
    }

    pub fn abortable_srcs(&self) -> &BTreeSet<i64> {
        &self.abortable_srcs
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkNode {
    pub name: String,
}

impl SinkNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// PlanNode 枚举，包含分布式 fragment 中所有可能的算子
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanNodeEnum {
    /// 内存表源
    MemorySource(MemorySourceNode),
    /// UDTF 源
    #[serde(rename = "udtf_source")]
    UdtfSource(UdtfSourceNode),
    Map(MapNode),
    Filter(FilterNode),
    Agg(AggNode),
    GroupBy(GroupByNode),
    Join(JoinNode),
    Union(UnionNode),
    Rolling(RollingNode),
    Limit(LimitNode),
    /// 结果输出节点
    Sink(SinkNode),
}

impl PlanNodeEnum {
    pub fn name(&self) -> &'static str {
        match self {
            PlanNodeEnum::MemorySource(_) => "MemorySource",
            PlanNodeEnum::UdtfSource(_) => "UdtfSource",
            PlanNodeEnum::Map(_) => "Map",
            PlanNodeEnum::Filter(_) => "Filter",
            PlanNodeEnum::Agg(_) => "Agg",
            PlanNodeEnum::GroupBy(_) => "GroupBy",
            PlanNodeEnum::Join(_) => "Join",
            PlanNodeEnum::Union(_) => "Union",
            PlanNodeEnum::Rolling(_) => "Rolling",
            PlanNodeEnum::Limit(_) => "Limit",
            PlanNodeEnum::Sink(_) => "Sink",
        }
    }

    pub fn is_source(&self) -> bool {
        matches!(
            self,
            PlanNodeEnum::MemorySource(_) | PlanNodeEnum::UdtfSource(_)
        )
    }

    pub fn is_sink(&self) -> bool {
        matches!(self, PlanNodeEnum::Sink(_))
    }

    pub fn is_limit(&self) -> bool {
        matches!(self, PlanNodeEnum::Limit(_))
    }

    pub fn is_join(&self) -> bool {
        matches!(self, PlanNodeEnum::Join(_))
    }

    pub fn as_limit(&self) -> Option<&LimitNode> {
        match self {
            PlanNodeEnum::Limit(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_limit_mut(&mut self) -> Option<&mut LimitNode> {
        match self {
            PlanNodeEnum::Limit(n) => Some(n),
            _ => None,
        }
    }

    /// 节点直接携带的标量表达式
    pub fn expressions(&self) -> Vec<&ScalarExpr> {
        match self {
            PlanNodeEnum::Map(n) => n.exprs.iter().map(|c| &c.expr).collect(),
            PlanNodeEnum::Filter(n) => vec![&n.condition],
            PlanNodeEnum::Agg(n) => n.aggregates.iter().map(|c| &c.expr).collect(),
            PlanNodeEnum::MemorySource(_)
            | PlanNodeEnum::UdtfSource(_)
            | PlanNodeEnum::GroupBy(_)
            | PlanNodeEnum::Join(_)
            | PlanNodeEnum::Union(_)
            | PlanNodeEnum::Rolling(_)
            | PlanNodeEnum::Limit(_)
            | PlanNodeEnum::Sink(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::DataType;

    #[test]
    fn test_node_categories() {
        let src = PlanNodeEnum::MemorySource(MemorySourceNode::new("http_events"));
        assert!(src.is_source());
        assert!(!src.is_sink());
        assert_eq!(src.name(), "MemorySource");

        let sink = PlanNodeEnum::Sink(SinkNode::new("out"));
        assert!(sink.is_sink());
        assert!(!sink.is_source());
    }

    #[test]
    fn test_limit_abortable_set_grows() {
        let mut limit = LimitNode::new(10);
        assert!(limit.add_abortable_source(1));
        assert!(!limit.add_abortable_source(1));
        assert!(limit.add_abortable_source(4));
        assert_eq!(limit.abortable_srcs().len(), 2);
    }

    #[test]
    fn test_expressions_of_map_and_filter() {
        let map = PlanNodeEnum::Map(MapNode {
            exprs: vec![
                ColumnExpr::new("a", ScalarExpr::column("a", DataType::Int64)),
                ColumnExpr::new("b", ScalarExpr::column("b", DataType::String)),
            ],
        });
        assert_eq!(map.expressions().len(), 2);

        let filter = PlanNodeEnum::Filter(FilterNode {
            condition: ScalarExpr::literal(Value::Boolean(true)),
        });
        assert_eq!(filter.expressions().len(), 1);
        assert!(PlanNodeEnum::Union(UnionNode::default()).expressions().is_empty());
    }
}
