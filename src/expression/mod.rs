//! 标量表达式与函数元数据
//!
//! - `expr`: 算子携带的标量表达式树
//! - `functions`: 函数放置元数据注册表与 UDTF 规格

pub mod expr;
pub mod functions;

pub use expr::{ColumnExpr, FuncExpr, ScalarExpr};
pub use functions::{
    RegistryInfo, SemanticType, UdfExecType, UdfSourceExecutor, UdtfArg, UdtfExecutor, UdtfSpec,
};
