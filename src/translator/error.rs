//! 转换错误类型
//!
//! 转换失败会使整个请求失败，不产生部分结果。未识别的 content block
//! 或 part 类型不是错误，由转换函数静默跳过。

use thiserror::Error;

/// 协议转换错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TranslateError {
    /// tool_result 引用了整个对话中不存在的 tool_use id
    #[error("tool_result references unknown tool_use_id: {0}")]
    UnknownToolUseId(String),
}
