//! agent 能力描述与 agent 实例
//!
//! 边缘 agent：有本地数据存储、处理数据、没有网络接收端。
//! 聚合 agent：有网络接收端、处理数据。两者由 fleet 的构造保证互斥。

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::error::AgentClass;
use crate::query::planner::plan::PlanGraph;

/// agent 能力描述
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentInfo {
    pub agent_id: Uuid,
    /// 地址空间ID
    pub asid: u32,
    #[serde(default)]
    pub has_data_store: bool,
    #[serde(default)]
    pub has_network_receiver: bool,
    #[serde(default)]
    pub processes_data: bool,
}

impl AgentInfo {
    /// 边缘 agent 描述
    pub fn edge(agent_id: Uuid, asid: u32) -> Self {
        Self {
            agent_id,
            asid,
            has_data_store: true,
            has_network_receiver: false,
            processes_data: true,
        }
    }

    /// 聚合 agent 描述
    pub fn aggregator(agent_id: Uuid, asid: u32) -> Self {
        Self {
            agent_id,
            asid,
            has_data_store: false,
            has_network_receiver: true,
            processes_data: true,
        }
    }

    pub fn is_edge(&self) -> bool {
        self.has_data_store && self.processes_data && !self.has_network_receiver
    }

    pub fn is_aggregator(&self) -> bool {
        self.has_network_receiver && self.processes_data
    }

    /// 推导出的 agent 类别，不处理数据的 agent 没有类别
    pub fn agent_class(&self) -> Option<AgentClass> {
        if self.is_edge() {
            Some(AgentClass::Edge)
        } else if self.is_aggregator() {
            Some(AgentClass::Aggregator)
        } else {
            None
        }
    }
}

/// fleet 计划中的一个 agent：能力描述 + 它私有的 fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInstance {
    pub id: i64,
    pub info: AgentInfo,
    pub plan: PlanGraph,
}

impl AgentInstance {
    pub fn new(id: i64, info: AgentInfo, plan: PlanGraph) -> Self {
        Self { id, info, plan }
    }
}
