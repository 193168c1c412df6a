//! 计划编译输入输出格式
//!
//! `PlanBundle` 是一次查询编译的完整输入：fleet 状态、函数注册表内容以及
//! 每个 agent 的初始 fragment。`PlanOutput` 是重写后的结果。

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::error::{PlannerError, PlannerResult};
use crate::expression::RegistryInfo;
use crate::query::planner::distributed::{DistributedPlan, DistributedState, RewriteSummary};
use crate::query::planner::plan::PlanGraph;

/// 一个 agent 的初始 fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentSpec {
    pub agent_id: Uuid,
    pub plan: PlanGraph,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanBundle {
    #[serde(default)]
    pub state: DistributedState,
    #[serde(default)]
    pub registry: RegistryInfo,
    #[serde(default)]
    pub fragments: Vec<FragmentSpec>,
}

impl PlanBundle {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }

    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    /// 按 fragment 顺序构造 fleet 计划
    ///
    /// 每个 fragment 必须对应 `state.agents` 中的一个 agent，同一 agent 不能出现两次。
    pub fn to_distributed_plan(&self) -> PlannerResult<DistributedPlan> {
        let mut plan = DistributedPlan::new();
        let mut seen = HashSet::new();
        for fragment in &self.fragments {
            if !seen.insert(fragment.agent_id) {
                return Err(PlannerError::distributed_plan(format!(
                    "agent {} 有多个 fragment",
                    fragment.agent_id
                )));
            }
            let info = self
                .state
                .agents
                .iter()
                .find(|a| a.agent_id == fragment.agent_id)
                .ok_or_else(|| {
                    PlannerError::distributed_plan(format!(
                        "fragment 引用了未知的 agent {}",
                        fragment.agent_id
                    ))
                })?;
            plan.add_instance(info.clone(), fragment.plan.clone());
        }
        Ok(plan)
    }
}

/// 重写结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanOutput {
    pub summary: RewriteSummary,
    pub plan: DistributedPlan,
}

impl PlanOutput {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
