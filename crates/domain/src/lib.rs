//! 聊天室核心领域模型
//!
//! 包含参与者、消息两个实体，以及名称、条数限制等值对象的校验规则。

pub mod errors;
pub mod message;
pub mod participant;
pub mod value_objects;

// 重新导出常用类型
pub use errors::*;
pub use message::*;
pub use participant::*;
pub use value_objects::*;
