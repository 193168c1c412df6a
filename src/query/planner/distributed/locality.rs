//! 表 -> agent 局部性映射
//!
//! 由 fleet 的 schema 元数据构建，只保留当前计划中出现的 agent。

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::error::{PlannerError, PlannerResult};
use crate::query::planner::distributed::agent::AgentInfo;

/// 一张表及持有它数据的 agent 列表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaInfo {
    pub name: String,
    /// agent UUID 字符串
    #[serde(default)]
    pub agent_list: Vec<String>,
}

/// fleet 状态：agent 能力描述和 schema 可用性记录
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributedState {
    #[serde(default)]
    pub agents: Vec<AgentInfo>,
    #[serde(default)]
    pub schema_info: Vec<SchemaInfo>,
}

/// 表名 -> 持有该表的 agent ID 集合；未出现的表对应空集合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalityMap {
    tables: HashMap<String, HashSet<i64>>,
}

impl LocalityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: impl Into<String>, agents: HashSet<i64>) {
        self.tables.insert(table.into(), agents);
    }

    /// agent 是否持有该表
    pub fn agent_has_table(&self, table: &str, agent_id: i64) -> bool {
        self.tables
            .get(table)
            .is_some_and(|agents| agents.contains(&agent_id))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// 从 fleet 状态构建局部性映射
///
/// 不属于当前计划的 agent UUID 会被跳过；无法解析的 UUID 是错误。
pub fn load_schema_map(
    state: &DistributedState,
    uuid_to_id: &HashMap<Uuid, i64>,
) -> PlannerResult<LocalityMap> {
    let mut map = LocalityMap::new();
    for schema in &state.schema_info {
        let mut agent_ids = HashSet::new();
        for uid in &schema.agent_list {
            let uuid = Uuid::parse_str(uid).map_err(|e| {
                PlannerError::distributed_plan(format!(
                    "表 {} 的 agent UUID '{}' 无法解析: {}",
                    schema.name, uid, e
                ))
            })?;
            match uuid_to_id.get(&uuid) {
                Some(id) => {
                    agent_ids.insert(*id);
                }
                None => {
                    log::debug!("UUID {} 不在当前计划的 agent 列表中", uuid);
                }
            }
        }
        map.insert(schema.name.clone(), agent_ids);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_schema_map_filters_unknown_agents() {
        let known = Uuid::new_v4();
        let unknown = Uuid::new_v4();
        let state = DistributedState {
            agents: Vec::new(),
            schema_info: vec![
                SchemaInfo {
                    name: "http_events".to_string(),
                    agent_list: vec![known.to_string(), unknown.to_string()],
                },
                SchemaInfo {
                    name: "process_stats".to_string(),
                    agent_list: vec![unknown.to_string()],
                },
            ],
        };
        let uuid_to_id = HashMap::from([(known, 0)]);

        let map = load_schema_map(&state, &uuid_to_id).expect("valid schema info");
        assert!(map.agent_has_table("http_events", 0));
        assert!(!map.agent_has_table("process_stats", 0));
        assert!(!map.agent_has_table("missing_table", 0));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_load_schema_map_rejects_bad_uuid() {
        let state = DistributedState {
            agents: Vec::new(),
            schema_info: vec![SchemaInfo {
                name: "t".to_string(),
                agent_list: vec!["not-a-uuid".to_string()],
            }],
        };
        let err = load_schema_map(&state, &HashMap::new()).expect_err("bad uuid");
        assert!(err.to_string().contains("not-a-uuid"));
    }
}
