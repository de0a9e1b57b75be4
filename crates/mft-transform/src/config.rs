//! 变换配置.

use serde::{Deserialize, Serialize};

/// 默认的音频输出缓冲区大小 (字节)
pub const DEFAULT_AUDIO_OUTPUT_BUFFER_SIZE: u32 = 192_000;

/// 变换配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// 输出流信息中报告的音频缓冲区大小
    pub audio_output_buffer_size: u32,
    /// 调用方缓冲区与采样长度不一致时是否记录截断日志
    pub log_truncation: bool,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            audio_output_buffer_size: DEFAULT_AUDIO_OUTPUT_BUFFER_SIZE,
            log_truncation: true,
        }
    }
}
