//! 核心类型定义
//!
//! 表达式求值类型与进程标识类型

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod upid;

pub use upid::Upid;

/// 表达式求值后的数据类型
///
/// `Unknown` 表示类型推导尚未运行或未能确定，放置检查遇到它时视为前置条件违例。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    #[default]
    Unknown,
    Boolean,
    Int64,
    #[serde(rename = "uint128")]
    UInt128,
    Float64,
    String,
    Time64ns,
}

impl DataType {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, DataType::Unknown)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Unknown => "UNKNOWN",
            DataType::Boolean => "BOOLEAN",
            DataType::Int64 => "INT64",
            DataType::UInt128 => "UINT128",
            DataType::Float64 => "FLOAT64",
            DataType::String => "STRING",
            DataType::Time64ns => "TIME64NS",
        };
        write!(f, "{}", name)
    }
}
