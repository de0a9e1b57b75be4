//! 顶层配置.
//!
//! 从 JSON 加载, 所有字段都有默认值, 空对象 `{}` 即为默认配置.

use std::path::Path;

use anyhow::{Context, Result};
use mft_transform::TransformConfig;
use serde::{Deserialize, Serialize};

use crate::logging::LoggingConfig;

/// 顶层配置
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// 日志
    pub logging: LoggingConfig,
    /// 解码变换
    pub transform: TransformConfig,
}

impl Config {
    /// 从 JSON 字符串解析
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("解析配置 JSON 失败")
    }

    /// 从 JSON 文件加载
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败, path={}", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("加载配置文件失败, path={}", path.display()))
    }
}
