//! fleet 计划
//!
//! 一次查询编译中所有 agent 的 fragment 集合。agent 的 fragment 之间相互独立。

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::error::{PlannerError, PlannerResult};
use crate::query::planner::distributed::agent::{AgentInfo, AgentInstance};
use crate::query::planner::plan::PlanGraph;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributedPlan {
    instances: BTreeMap<i64, AgentInstance>,
    next_id: i64,
}

impl DistributedPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入一个 agent 及其 fragment，返回 agent 在本计划中的ID
    pub fn add_instance(&mut self, info: AgentInfo, plan: PlanGraph) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        self.instances.insert(id, AgentInstance::new(id, info, plan));
        id
    }

    pub fn get(&self, id: i64) -> PlannerResult<&AgentInstance> {
        self.instances
            .get(&id)
            .ok_or_else(|| PlannerError::distributed_plan(format!("agent 不存在: {}", id)))
    }

    pub fn get_mut(&mut self, id: i64) -> PlannerResult<&mut AgentInstance> {
        self.instances
            .get_mut(&id)
            .ok_or_else(|| PlannerError::distributed_plan(format!("agent 不存在: {}", id)))
    }

    /// 把 agent 从本次查询中移除
    pub fn delete_instance(&mut self, id: i64) -> PlannerResult<AgentInstance> {
        self.instances
            .remove(&id)
            .ok_or_else(|| PlannerError::distributed_plan(format!("agent 不存在: {}", id)))
    }

    pub fn contains(&self, id: i64) -> bool {
        self.instances.contains_key(&id)
    }

    pub fn instance_ids(&self) -> Vec<i64> {
        self.instances.keys().copied().collect()
    }

    pub fn instances(&self) -> impl Iterator<Item = &AgentInstance> {
        self.instances.values()
    }

    pub(crate) fn instances_mut(&mut self) -> &mut BTreeMap<i64, AgentInstance> {
        &mut self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// agent UUID 到计划内ID的映射
    pub fn uuid_to_id_map(&self) -> HashMap<Uuid, i64> {
        self.instances
            .values()
            .map(|instance| (instance.info.agent_id, instance.id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_delete_instance() {
        let mut plan = DistributedPlan::new();
        let uuid = Uuid::new_v4();
        let id = plan.add_instance(AgentInfo::edge(uuid, 1), PlanGraph::new());
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.uuid_to_id_map().get(&uuid), Some(&id));

        let removed = plan.delete_instance(id).expect("instance exists");
        assert_eq!(removed.id, id);
        assert!(plan.is_empty());
        assert!(plan.delete_instance(id).is_err());
    }

    #[test]
    fn test_instance_ids_not_reused() {
        let mut plan = DistributedPlan::new();
        let a = plan.add_instance(AgentInfo::edge(Uuid::new_v4(), 1), PlanGraph::new());
        plan.delete_instance(a).expect("instance exists");
        let b = plan.add_instance(AgentInfo::edge(Uuid::new_v4(), 2), PlanGraph::new());
        assert_ne!(a, b);
    }
}
