//! 函数元数据
//!
//! 只关心放置相关的元数据：标量函数可在哪类 agent 上执行、UDTF 的执行者与参数语义。
//! 函数本身的类型检查由注册表的所有者负责。

pub mod registry;
pub mod udtf;

pub use registry::{RegistryInfo, UdfDefinition, UdfExecType, UdfSignature, UdfSourceExecutor};
pub use udtf::{SemanticType, UdtfArg, UdtfExecutor, UdtfSpec};
