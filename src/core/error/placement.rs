//! 放置校验错误类型
//!
//! 函数或 UDTF 无法在所分配的 agent 类别上执行时产生的编译错误。

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// agent 类别
///
/// 边缘 agent 持有本地数据分片，聚合 agent 负责接收并合并部分结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentClass {
    Edge,
    Aggregator,
}

impl fmt::Display for AgentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentClass::Edge => write!(f, "edge"),
            AgentClass::Aggregator => write!(f, "aggregator"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlacementError {
    /// 标量函数不允许在该类 agent 上执行
    #[error("agent {agent_id} 上节点 {node_id}: UDF '{func}' {}", placement_hint(.agent_class))]
    FunctionPlacement {
        node_id: i64,
        agent_id: i64,
        func: String,
        agent_class: AgentClass,
    },

    /// UDTF 规格本身有缺陷（参数与绑定值不一致等）
    #[error("UDTF '{udtf}' 规格错误: {reason}")]
    MalformedUdtfSpec { udtf: String, reason: String },

    /// 尚未实现的放置组合，不能被静默地错误调度
    #[error("不支持的特性: {0}")]
    Unsupported(String),
}

fn placement_hint(class: &AgentClass) -> &'static str {
    match class {
        AgentClass::Edge => "must execute after blocking nodes such as limit, agg, and join",
        AgentClass::Aggregator => "must execute before blocking nodes such as limit, agg, and join",
    }
}

impl PlacementError {
    pub fn function_placement(
        node_id: i64,
        agent_id: i64,
        func: impl Into<String>,
        agent_class: AgentClass,
    ) -> Self {
        Self::FunctionPlacement {
            node_id,
            agent_id,
            func: func.into(),
            agent_class,
        }
    }

    pub fn malformed_udtf(udtf: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedUdtfSpec {
            udtf: udtf.into(),
            reason: reason.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// 违规函数名称（仅函数放置错误）
    pub fn func_name(&self) -> Option<&str> {
        match self {
            PlacementError::FunctionPlacement { func, .. } => Some(func),
            _ => None,
        }
    }
}
