//! 计划图 (fragment)
//!
//! 以节点ID为索引的算子 arena，边关系存放为ID列表。
//! 边 `parent -> child` 表示数据从 parent 流向 child：
//! - `dependencies_of(id)` 返回 id 的下游消费者（children）
//! - `dependents_of(id)` 返回 id 的上游输入（parents），保持输入顺序（Join 为左、右）
//!
//! 节点ID在 fragment 生命周期内单调分配，删除后不会被复用。
//! 任何删除操作之后都不存在悬空边。

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::core::error::{GraphError, GraphResult};
use crate::query::planner::plan::node::PlanNodeEnum;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PlanGraphDef", into = "PlanGraphDef")]
pub struct PlanGraph {
    nodes: BTreeMap<i64, PlanNodeEnum>,
    /// 下游边: id -> 消费 id 输出的节点
    children: BTreeMap<i64, Vec<i64>>,
    /// 上游边: id -> id 的输入节点（有序）
    parents: BTreeMap<i64, Vec<i64>>,
    next_id: i64,
}

impl PlanGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加节点并分配新的ID
    pub fn add_node(&mut self, node: PlanNodeEnum) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(id, node);
        self.children.insert(id, Vec::new());
        self.parents.insert(id, Vec::new());
        id
    }

    /// 添加节点，并按顺序连上它的输入
    pub fn add_node_with_inputs(&mut self, node: PlanNodeEnum, inputs: &[i64]) -> GraphResult<i64> {
        for input in inputs {
            self.ensure_node(*input)?;
        }
        let id = self.add_node(node);
        for input in inputs {
            self.add_edge(*input, id)?;
        }
        Ok(id)
    }

    /// 添加边 `parent -> child`
    pub fn add_edge(&mut self, parent: i64, child: i64) -> GraphResult<()> {
        self.ensure_node(parent)?;
        self.ensure_node(child)?;
        if self.children_ref(parent).contains(&child) {
            return Err(GraphError::DuplicateEdge(parent, child));
        }
        if parent == child || self.reachable_downstream(child, None).contains(&parent) {
            return Err(GraphError::CycleDetected(parent, child));
        }
        self.children.entry(parent).or_default().push(child);
        self.parents.entry(child).or_default().push(parent);
        Ok(())
    }

    pub fn has_node(&self, id: i64) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: i64) -> GraphResult<&PlanNodeEnum> {
        self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))
    }

    pub fn get_mut(&mut self, id: i64) -> GraphResult<&mut PlanNodeEnum> {
        self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))
    }

    /// 下游消费者（children）
    pub fn dependencies_of(&self, id: i64) -> GraphResult<&[i64]> {
        self.ensure_node(id)?;
        Ok(self.children_ref(id))
    }

    /// 上游输入（parents）
    pub fn dependents_of(&self, id: i64) -> GraphResult<&[i64]> {
        self.ensure_node(id)?;
        Ok(self.parents_ref(id))
    }

    /// 沿数据流方向可达的所有节点（不含 id 自身）
    ///
    /// 注意方向与 `dependents_of` 相反：这里沿 children 向下游展开，
    /// 即 `dependencies_of` 的传递闭包。用于判断一个节点的输出能否到达某个 Sink。
    pub fn transitive_dependents_of(&self, id: i64) -> GraphResult<BTreeSet<i64>> {
        self.ensure_node(id)?;
        Ok(self.reachable_downstream(id, None))
    }

    /// 与 `transitive_dependents_of` 相同（向下游展开），但把 `excluded` 节点视为已从边关系中移除
    pub fn transitive_dependents_without(&self, id: i64, excluded: i64) -> GraphResult<BTreeSet<i64>> {
        self.ensure_node(id)?;
        Ok(self.reachable_downstream(id, Some(excluded)))
    }

    /// 删除单个节点及其所有关联边
    pub fn delete_node(&mut self, id: i64) -> GraphResult<()> {
        self.ensure_node(id)?;
        self.remove_node(id);
        Ok(())
    }

    /// 删除节点并级联删除因此变成孤儿的节点
    ///
    /// 1. 下游：失去全部输入的消费者被删除，并继续向下游级联
    /// 2. 上游：不再有任何消费者、且自身不是 Sink 的输入节点被删除，并继续向上游级联
    ///
    /// Join 只失去一侧输入时保留，另一侧分支不做处理，只记录告警。
    /// 返回被删除的节点ID（按删除顺序）。
    pub fn delete_orphans_in_subtree(&mut self, id: i64) -> GraphResult<Vec<i64>> {
        self.ensure_node(id)?;

        let mut deleted = Vec::new();
        let mut upstream = Vec::new();
        let mut stack = vec![id];

        while let Some(current) = stack.pop() {
            if !self.has_node(current) {
                continue;
            }
            let children = self.children_ref(current).to_vec();
            upstream.extend_from_slice(self.parents_ref(current));
            self.remove_node(current);
            deleted.push(current);

            for child in children {
                if !self.has_node(child) {
                    continue;
                }
                if self.parents_ref(child).is_empty() {
                    stack.push(child);
                } else if self.nodes.get(&child).is_some_and(PlanNodeEnum::is_join) {
                    log::warn!(
                        "删除节点 {} 后 Join 节点 {} 只剩一侧输入，另一侧分支未被清理",
                        current,
                        child
                    );
                }
            }
        }

        while let Some(candidate) = upstream.pop() {
            let orphaned = match self.nodes.get(&candidate) {
                Some(node) => !node.is_sink() && self.children_ref(candidate).is_empty(),
                None => false,
            };
            if orphaned {
                upstream.extend_from_slice(self.parents_ref(candidate));
                self.remove_node(candidate);
                deleted.push(candidate);
            }
        }

        Ok(deleted)
    }

    /// 查找所有匹配谓词的节点，按ID升序返回
    pub fn find_nodes_that_match<F>(&self, predicate: F) -> Vec<i64>
    where
        F: Fn(&PlanNodeEnum) -> bool,
    {
        self.nodes
            .iter()
            .filter(|(_, node)| predicate(node))
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn sources(&self) -> Vec<i64> {
        self.find_nodes_that_match(PlanNodeEnum::is_source)
    }

    pub fn sinks(&self) -> Vec<i64> {
        self.find_nodes_that_match(PlanNodeEnum::is_sink)
    }

    pub fn node_ids(&self) -> Vec<i64> {
        self.nodes.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &PlanNodeEnum)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 所有边 `(parent, child)`，按 child 升序，同一 child 保持输入顺序
    pub fn edges(&self) -> Vec<(i64, i64)> {
        let mut edges = Vec::new();
        for (child, parents) in &self.parents {
            for parent in parents {
                edges.push((*parent, *child));
            }
        }
        edges
    }

    /// 拓扑序（上游在前），同层按ID升序
    pub fn topological_sort(&self) -> Vec<i64> {
        let mut in_degree: BTreeMap<i64, usize> = self
            .nodes
            .keys()
            .map(|id| (*id, self.parents_ref(*id).len()))
            .collect();
        let mut ready: BTreeSet<i64> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| *id)
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(id) = ready.pop_first() {
            order.push(id);
            for child in self.children_ref(id) {
                if let Some(degree) = in_degree.get_mut(child) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(*child);
                    }
                }
            }
        }
        order
    }

    /// 校验图结构：无悬空边、无环
    pub fn validate(&self) -> GraphResult<()> {
        for (parent, children) in &self.children {
            for child in children {
                if !self.has_node(*parent) || !self.has_node(*child) {
                    return Err(GraphError::DanglingEdge(*parent, *child));
                }
            }
        }
        for (child, parents) in &self.parents {
            for parent in parents {
                if !self.has_node(*parent) || !self.has_node(*child) {
                    return Err(GraphError::DanglingEdge(*parent, *child));
                }
            }
        }
        let order = self.topological_sort();
        if order.len() != self.nodes.len() {
            let on_cycle = self
                .nodes
                .keys()
                .find(|id| !order.contains(id))
                .copied()
                .unwrap_or_default();
            return Err(GraphError::CycleDetected(on_cycle, on_cycle));
        }
        Ok(())
    }

    fn ensure_node(&self, id: i64) -> GraphResult<()> {
        if self.has_node(id) {
            Ok(())
        } else {
            Err(GraphError::NodeNotFound(id))
        }
    }

    fn children_ref(&self, id: i64) -> &[i64] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn parents_ref(&self, id: i64) -> &[i64] {
        self.parents.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn remove_node(&mut self, id: i64) {
        self.nodes.remove(&id);
        if let Some(children) = self.children.remove(&id) {
            for child in children {
                if let Some(parents) = self.parents.get_mut(&child) {
                    parents.retain(|p| *p != id);
                }
            }
        }
        if let Some(parents) = self.parents.remove(&id) {
            for parent in parents {
                if let Some(children) = self.children.get_mut(&parent) {
                    children.retain(|c| *c != id);
                }
            }
        }
    }

    fn reachable_downstream(&self, start: i64, excluded: Option<i64>) -> BTreeSet<i64> {
        let mut visited = BTreeSet::new();
        let mut queue: VecDeque<i64> = VecDeque::new();
        queue.push_back(start);
        while let Some(id) = queue.pop_front() {
            for child in self.children_ref(id) {
                if Some(*child) == excluded {
                    continue;
                }
                if visited.insert(*child) {
                    queue.push_back(*child);
                }
            }
        }
        visited
    }
}

/// 序列化形式：节点列表 + 边列表
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PlanGraphDef {
    nodes: Vec<NodeEntry>,
    #[serde(default)]
    edges: Vec<(i64, i64)>,
    #[serde(default)]
    next_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct NodeEntry {
    id: i64,
    node: PlanNodeEnum,
}

impl TryFrom<PlanGraphDef> for PlanGraph {
    type Error = GraphError;

    fn try_from(def: PlanGraphDef) -> Result<Self, Self::Error> {
        let mut graph = PlanGraph::new();
        graph.next_id = def.next_id.max(0);
        for entry in def.nodes {
            if graph.nodes.contains_key(&entry.id) {
                return Err(GraphError::DuplicateNode(entry.id));
            }
            graph.nodes.insert(entry.id, entry.node);
            graph.children.insert(entry.id, Vec::new());
            graph.parents.insert(entry.id, Vec::new());
            graph.next_id = graph.next_id.max(entry.id + 1);
        }
        for (parent, child) in def.edges {
            graph.add_edge(parent, child)?;
        }
        Ok(graph)
    }
}

impl From<PlanGraph> for PlanGraphDef {
    fn from(graph: PlanGraph) -> Self {
        let edges = graph.edges();
        let next_id = graph.next_id;
        let nodes = graph
            .nodes
            .into_iter()
            .map(|(id, node)| NodeEntry { id, node })
            .collect();
        PlanGraphDef {
            nodes,
            edges,
            next_id,
        }
    }
}
