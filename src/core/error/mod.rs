//! 统一错误处理系统 for DistPlan
//!
//! ## 设计理念
//!
//! 1. **分层定义**：
//!    - 图结构误用（未知节点ID、环）归入 `GraphError`
//!    - 编译期拒绝（函数放置违规、UDTF 规格错误、未支持特性）归入 `PlacementError`
//!
//! 2. **自动转换**：子错误通过 `#[from]` 注解转换为 `PlannerError`，`?` 直接传播
//!
//! 3. **统一接口**：`PlannerResult<T>` 作为所有规则与驱动器的返回类型
//!
//! 规划器内部不做任何重试，任何错误都会终止当前查询的编译。

use thiserror::Error;

pub mod graph;
pub mod placement;

pub use graph::{GraphError, GraphResult};
pub use placement::{AgentClass, PlacementError};

/// 规划器统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlannerError {
    #[error("计划图错误: {0}")]
    Graph(#[from] GraphError),

    #[error("放置校验错误: {0}")]
    Placement(#[from] PlacementError),

    /// 表达式类型在放置检查前尚未解析，属于上游前置条件违例
    #[error("内部错误: 函数 '{func}' 的参数 {arg} 类型未解析")]
    UnresolvedType { func: String, arg: String },

    #[error("函数注册表错误: {0}")]
    Registry(String),

    #[error("分布式计划错误: {0}")]
    DistributedPlan(String),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

impl PlannerError {
    pub fn unresolved_type(func: impl Into<String>, arg: impl Into<String>) -> Self {
        Self::UnresolvedType {
            func: func.into(),
            arg: arg.into(),
        }
    }

    pub fn registry(msg: impl Into<String>) -> Self {
        Self::Registry(msg.into())
    }

    pub fn distributed_plan(msg: impl Into<String>) -> Self {
        Self::DistributedPlan(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// 是否为面向用户的编译错误（区别于内部缺陷）
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            PlannerError::Placement(PlacementError::FunctionPlacement { .. })
                | PlannerError::Placement(PlacementError::Unsupported(_))
        )
    }
}

/// 规划器结果类型
pub type PlannerResult<T> = Result<T, PlannerError>;
