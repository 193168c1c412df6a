//! 函数注册表
//!
//! 提供函数执行类别与放置元数据的注册和查找。
//! 同名函数可按参数类型重载，不同重载可以有不同的可执行 agent 集合。

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::error::{PlannerError, PlannerResult};
use crate::core::types::DataType;

/// 函数执行类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UdfExecType {
    /// 普通标量函数，需要放置检查
    Scalar,
    /// 聚合函数，由聚合算子自身的放置决定
    Aggregate,
    /// 显式豁免放置检查的函数
    Exempt,
}

/// 标量函数可执行的 agent 集合
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UdfSourceExecutor {
    Any,
    EdgeOnly,
    AggregatorOnly,
}

impl fmt::Display for UdfSourceExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UdfSourceExecutor::Any => write!(f, "any"),
            UdfSourceExecutor::EdgeOnly => write!(f, "edge-only"),
            UdfSourceExecutor::AggregatorOnly => write!(f, "aggregator-only"),
        }
    }
}

/// 一个重载签名及其放置元数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UdfSignature {
    pub arg_types: Vec<DataType>,
    pub executor: UdfSourceExecutor,
}

/// 注册的函数定义
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UdfDefinition {
    pub name: String,
    pub exec_type: UdfExecType,
    #[serde(default)]
    pub signatures: Vec<UdfSignature>,
}

/// 函数注册表信息
///
/// 在一次编译期间只读，可在多个 fragment 的并行处理之间共享。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<UdfDefinition>", into = "Vec<UdfDefinition>")]
pub struct RegistryInfo {
    udfs: HashMap<String, UdfDefinition>,
}

impl RegistryInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册标量函数的一个重载
    ///
    /// 同名函数已按其他类别注册，或同一参数类型已登记了不同的执行者时返回错误。
    pub fn register_scalar(
        &mut self,
        name: &str,
        arg_types: Vec<DataType>,
        executor: UdfSourceExecutor,
    ) -> PlannerResult<&mut Self> {
        self.merge(UdfDefinition {
            name: name.to_string(),
            exec_type: UdfExecType::Scalar,
            signatures: vec![UdfSignature { arg_types, executor }],
        })?;
        Ok(self)
    }

    /// 注册聚合函数
    pub fn register_aggregate(&mut self, name: &str) -> PlannerResult<&mut Self> {
        self.register_kind(name, UdfExecType::Aggregate)
    }

    /// 注册豁免放置检查的函数
    pub fn register_exempt(&mut self, name: &str) -> PlannerResult<&mut Self> {
        self.register_kind(name, UdfExecType::Exempt)
    }

    fn register_kind(&mut self, name: &str, exec_type: UdfExecType) -> PlannerResult<&mut Self> {
        self.merge(UdfDefinition {
            name: name.to_string(),
            exec_type,
            signatures: Vec::new(),
        })?;
        Ok(self)
    }

    /// 合并一个函数定义，已有的重载保留，新重载追加
    fn merge(&mut self, def: UdfDefinition) -> PlannerResult<()> {
        let existing = self
            .udfs
            .entry(def.name.clone())
            .or_insert_with(|| UdfDefinition {
                name: def.name.clone(),
                exec_type: def.exec_type,
                signatures: Vec::new(),
            });

        if existing.exec_type != def.exec_type {
            return Err(PlannerError::registry(format!(
                "函数 {} 已注册为 {:?}，不能再注册为 {:?}",
                def.name, existing.exec_type, def.exec_type
            )));
        }

        for sig in def.signatures {
            let known = existing
                .signatures
                .iter()
                .find(|s| s.arg_types == sig.arg_types)
                .map(|s| s.executor);
            match known {
                Some(executor) if executor == sig.executor => {}
                Some(executor) => {
                    return Err(PlannerError::registry(format!(
                        "函数 {} 的同一重载登记了不同的执行者: {} / {}",
                        def.name, executor, sig.executor
                    )));
                }
                None => existing.signatures.push(sig),
            }
        }
        Ok(())
    }

    /// 获取函数执行类别
    pub fn udf_exec_type(&self, name: &str) -> PlannerResult<UdfExecType> {
        self.udfs
            .get(name)
            .map(|def| def.exec_type)
            .ok_or_else(|| PlannerError::registry(format!("未定义的函数: {}", name)))
    }

    /// 按参数类型获取标量函数的可执行 agent 集合
    pub fn udf_source_executor(
        &self,
        name: &str,
        arg_types: &[DataType],
    ) -> PlannerResult<UdfSourceExecutor> {
        let def = self
            .udfs
            .get(name)
            .ok_or_else(|| PlannerError::registry(format!("未定义的函数: {}", name)))?;

        def.signatures
            .iter()
            .find(|sig| sig.arg_types == arg_types)
            .map(|sig| sig.executor)
            .ok_or_else(|| {
                let actual = arg_types
                    .iter()
                    .map(|t| t.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                PlannerError::registry(format!(
                    "函数 {} 没有匹配参数类型 ({}) 的重载",
                    name, actual
                ))
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.udfs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.udfs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.udfs.is_empty()
    }
}

/// 同名定义合并重载，类别冲突时拒绝整个列表
impl TryFrom<Vec<UdfDefinition>> for RegistryInfo {
    type Error = PlannerError;

    fn try_from(defs: Vec<UdfDefinition>) -> Result<Self, Self::Error> {
        let mut registry = Self::new();
        for def in defs {
            registry.merge(def)?;
        }
        Ok(registry)
    }
}

impl From<RegistryInfo> for Vec<UdfDefinition> {
    fn from(registry: RegistryInfo) -> Self {
        let mut defs: Vec<UdfDefinition> = registry.udfs.into_values().collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }
}
