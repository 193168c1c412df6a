//! 计划图错误类型
//!
//! 传入未知节点ID、在已删除节点上连边等情况属于调用方的编程错误，
//! 这里以错误值返回而不是 panic，由上层终止编译。

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("节点不存在: {0}")]
    NodeNotFound(i64),

    #[error("节点ID重复: {0}")]
    DuplicateNode(i64),

    #[error("边已存在: {0} -> {1}")]
    DuplicateEdge(i64, i64),

    #[error("循环检测: 添加边 {0} -> {1} 会形成环")]
    CycleDetected(i64, i64),

    #[error("悬空边: {0} -> {1}")]
    DanglingEdge(i64, i64),

    #[error("节点类型不匹配: 节点 {id} 期望 {expected}, 实际 {actual}")]
    UnexpectedNodeType {
        id: i64,
        expected: &'static str,
        actual: &'static str,
    },
}

pub type GraphResult<T> = Result<T, GraphError>;
