//! 计划表示
//!
//! - `node`: 算子节点的闭合标签联合
//! - `graph`: 以ID索引的可变 DAG

pub mod graph;
pub mod node;

pub use graph::PlanGraph;
pub use node::{
    AggNode, FilterNode, GroupByNode, JoinNode, JoinType, LimitNode, MapNode, MemorySourceNode,
    PlanNodeEnum, RollingNode, SinkNode, UdtfSourceNode, UnionNode,
};
