//! 标量表达式树
//!
//! 算子（Map、Filter、Agg 等）的参数以表达式树的形式挂在节点上，
//! 每个表达式节点都记录类型推导阶段写入的求值类型。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::types::DataType;
use crate::core::value::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarExpr {
    Column {
        name: String,
        #[serde(default)]
        data_type: DataType,
    },
    Literal(Value),
    Func(FuncExpr),
}

/// 函数调用表达式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncExpr {
    pub name: String,
    #[serde(default)]
    pub args: Vec<ScalarExpr>,
    #[serde(default)]
    pub data_type: DataType,
}

impl FuncExpr {
    pub fn new(name: impl Into<String>, args: Vec<ScalarExpr>) -> Self {
        Self {
            name: name.into(),
            args,
            data_type: DataType::Unknown,
        }
    }

    pub fn with_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }
}

impl ScalarExpr {
    pub fn column(name: impl Into<String>, data_type: DataType) -> Self {
        ScalarExpr::Column {
            name: name.into(),
            data_type,
        }
    }

    pub fn literal(value: Value) -> Self {
        ScalarExpr::Literal(value)
    }

    pub fn func(name: impl Into<String>, args: Vec<ScalarExpr>, data_type: DataType) -> Self {
        ScalarExpr::Func(FuncExpr::new(name, args).with_type(data_type))
    }

    /// 类型推导后的求值类型
    pub fn evaluated_data_type(&self) -> DataType {
        match self {
            ScalarExpr::Column { data_type, .. } => *data_type,
            ScalarExpr::Literal(value) => value.data_type(),
            ScalarExpr::Func(func) => func.data_type,
        }
    }
}

impl fmt::Display for ScalarExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarExpr::Column { name, .. } => write!(f, "col({})", name),
            ScalarExpr::Literal(value) => write!(f, "{}", value),
            ScalarExpr::Func(func) => {
                write!(f, "{}(", func.name)?;
                for (i, arg) in func.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// 带输出列名的表达式（Map 投影、Agg 聚合值）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnExpr {
    pub name: String,
    pub expr: ScalarExpr,
}

impl ColumnExpr {
    pub fn new(name: impl Into<String>, expr: ScalarExpr) -> Self {
        Self {
            name: name.into(),
            expr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_nested_func() {
        let expr = ScalarExpr::func(
            "add",
            vec![
                ScalarExpr::column("latency", DataType::Int64),
                ScalarExpr::literal(Value::Int64(1)),
            ],
            DataType::Int64,
        );
        assert_eq!(expr.to_string(), "add(col(latency), 1)");
        assert_eq!(expr.evaluated_data_type(), DataType::Int64);
    }

    #[test]
    fn test_func_default_type_is_unknown() {
        let func = FuncExpr::new("pod_name", vec![]);
        assert_eq!(func.data_type, DataType::Unknown);
    }
}
