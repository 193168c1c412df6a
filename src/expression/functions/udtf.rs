//! UDTF 规格
//!
//! UDTF 是以自定义逻辑产出行的源算子。规格声明它应在哪些 agent 上执行，
//! 以及每个参数的语义类别（语义类别决定参数是否约束执行位置）。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::types::DataType;

/// UDTF 执行者
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UdtfExecutor {
    /// 所有 agent
    AllAgents,
    /// 所有边缘 agent
    AllEdge,
    /// 部分边缘 agent（由参数过滤）
    SubsetEdge,
    /// 所有聚合 agent，尚未支持
    AllAggregator,
    /// 部分聚合 agent
    SubsetAggregator,
    /// 恰好一个聚合 agent
    OneAggregator,
}

impl fmt::Display for UdtfExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UdtfExecutor::AllAgents => "all_agents",
            UdtfExecutor::AllEdge => "all_edge",
            UdtfExecutor::SubsetEdge => "subset_edge",
            UdtfExecutor::AllAggregator => "all_aggregator",
            UdtfExecutor::SubsetAggregator => "subset_aggregator",
            UdtfExecutor::OneAggregator => "one_aggregator",
        };
        write!(f, "{}", name)
    }
}

/// 参数语义类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    /// 不约束执行位置
    #[default]
    None,
    /// 进程标识，其中的 ASID 必须与 agent 一致
    Upid,
    /// agent UUID 字符串，必须与 agent 一致
    AgentUid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UdtfArg {
    pub name: String,
    pub arg_type: DataType,
    #[serde(default)]
    pub semantic_type: SemanticType,
}

impl UdtfArg {
    pub fn new(name: impl Into<String>, arg_type: DataType, semantic_type: SemanticType) -> Self {
        Self {
            name: name.into(),
            arg_type,
            semantic_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UdtfSpec {
    pub name: String,
    pub executor: UdtfExecutor,
    #[serde(default)]
    pub args: Vec<UdtfArg>,
}

impl UdtfSpec {
    pub fn new(name: impl Into<String>, executor: UdtfExecutor) -> Self {
        Self {
            name: name.into(),
            executor,
            args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, arg: UdtfArg) -> Self {
        self.args.push(arg);
        self
    }
}
