pub mod error;
pub mod types;
pub mod value;

// 错误和结果类型
pub use error::{AgentClass, GraphError, PlacementError, PlannerError, PlannerResult};

// 核心数据类型
pub use types::{DataType, Upid};
pub use value::Value;
