//! 模式匹配定义
//!
//! 节点规则通过模式声明自己关心的节点，驱动器只对匹配的节点调用规则。

use crate::query::planner::plan::PlanNodeEnum;

/// 节点匹配条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchNode {
    /// 匹配任意算子
    Operator,
    /// 匹配任意源算子
    Source,
    /// 按节点名称匹配
    Single(&'static str),
}

impl MatchNode {
    pub fn matches(&self, node: &PlanNodeEnum) -> bool {
        match self {
            MatchNode::Operator => true,
            MatchNode::Source => node.is_source(),
            MatchNode::Single(name) => node.name() == *name,
        }
    }
}

/// 模式结构体
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub node: MatchNode,
}

impl Pattern {
    pub fn with_node(node: MatchNode) -> Self {
        Self { node }
    }

    /// 使用节点名称创建模式
    pub fn new_with_name(name: &'static str) -> Self {
        Self::with_node(MatchNode::Single(name))
    }

    pub fn operator() -> Self {
        Self::with_node(MatchNode::Operator)
    }

    pub fn source() -> Self {
        Self::with_node(MatchNode::Source)
    }

    pub fn limit() -> Self {
        Self::new_with_name("Limit")
    }

    /// 检查模式是否匹配给定的计划节点
    pub fn matches(&self, node: &PlanNodeEnum) -> bool {
        self.node.matches(node)
    }
}
