//! # mft
//!
//! 纯 Rust 实现的流式解码变换控制器.
//!
//! 调用方推入压缩数据包, 拉取解码后的未压缩采样:
//! - **类型协商**: 先输入后输出, 输出固定为 32 位浮点 PCM 或 NV12
//! - **背压**: 解码引擎的背压被内部队列吸收
//! - **格式漂移**: 解码过程中输出尺寸变化时只通知一次, 由调用方重新协商
//! - **排空/清空**: 不丢失也不重复已产出的采样
//!
//! # 快速开始
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use mft::core::{FormatDescriptor, Subtype};
//! use mft::transform::{InputSample, OutputDataBuffer, OutputStatus, TransformController};
//!
//! let mft = TransformController::with_registry(Arc::new(mft::default_codec_registry()));
//!
//! let input = FormatDescriptor::audio(Subtype::Pcm, 1, 8000);
//! mft.set_input_type(0, Some(&input), false).unwrap();
//! let output = mft.output_available_type(0, 0).unwrap();
//! mft.set_output_type(0, Some(&output), false).unwrap();
//!
//! mft.process_input(0, &InputSample::new(vec![0u8; 160], 0, 100_000), 0).unwrap();
//! let mut buffers = [OutputDataBuffer::default()];
//! assert_eq!(mft.process_output(&mut buffers).unwrap(), OutputStatus::Delivered);
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `mft-core` | 错误码、格式描述符与媒体基础类型 |
//! | `mft-codec` | 解码引擎抽象与内置引擎 |
//! | `mft-resample` | 音频采样格式转换 |
//! | `mft-scale` | 像素格式转换 |
//! | `mft-transform` | 类型协商、解码会话与推拉状态机 |

pub mod config;
pub mod logging;

/// 核心类型: 错误码、格式描述符、采样/像素格式
pub use mft_core as core;

/// 解码引擎抽象与注册表
pub use mft_codec as codec;

/// 音频采样格式转换
pub use mft_resample as resample;

/// 像素格式转换
pub use mft_scale as scale;

/// 解码变换控制器
pub use mft_transform as transform;

/// 获取 mft 版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// 创建已注册所有内置解码引擎与头部修正器的注册表
pub fn default_codec_registry() -> mft_codec::CodecRegistry {
    let mut registry = mft_codec::CodecRegistry::new();
    mft_codec::register_all(&mut registry);
    registry
}
