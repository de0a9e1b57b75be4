//! # mft-transform
//!
//! 流式解码变换控制器.
//!
//! 在推入压缩数据的调用方与拉取解码采样的调用方之间协调:
//! - 两阶段类型协商 (先输入, 后输出)
//! - 吸收解码引擎的背压
//! - 检测解码过程中的输出格式漂移, 并只通知一次
//! - 排空/清空控制, 不丢失也不重复已产出的采样
//!
//! ## 使用示例
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use mft_codec::CodecRegistry;
//! use mft_core::{FormatDescriptor, Subtype};
//! use mft_transform::{InputSample, OutputDataBuffer, OutputStatus, TransformController};
//!
//! let mut registry = CodecRegistry::new();
//! mft_codec::register_all(&mut registry);
//! let mft = TransformController::with_registry(Arc::new(registry));
//!
//! let input = FormatDescriptor::audio(Subtype::Pcm, 2, 48000);
//! mft.set_input_type(0, Some(&input), false).unwrap();
//! let output = mft.output_available_type(0, 0).unwrap();
//! mft.set_output_type(0, Some(&output), false).unwrap();
//!
//! // 480 个立体声 s16 采样
//! mft.process_input(0, &InputSample::new(vec![0u8; 1920], 0, 100_000), 0).unwrap();
//!
//! let mut buffers = [OutputDataBuffer::default()];
//! assert_eq!(mft.process_output(&mut buffers).unwrap(), OutputStatus::Delivered);
//! assert_eq!(buffers[0].sample.as_ref().unwrap().data.len(), 480 * 2 * 4);
//! ```

pub mod config;
pub mod controller;
pub mod negotiator;
pub mod postprocess;
pub mod sample;
pub mod session;
pub mod stream_info;

// 重导出常用类型
pub use config::TransformConfig;
pub use controller::{ControlMessage, TransformController, TransformState};
pub use negotiator::TypeNegotiator;
pub use postprocess::{AudioPostProcessor, FramePostProcessor, VideoPostProcessor};
pub use sample::{
    DecodeStatus, InputSample, InputStatus, OutputDataBuffer, OutputSample, OutputStatus,
    PendingSample,
};
pub use session::DecodeSession;
pub use stream_info::{
    InputStatusFlags, InputStreamFlags, InputStreamInfo, OutputStatusFlags, OutputStreamFlags,
    OutputStreamInfo, ShutdownStatus, StreamLimits,
};
