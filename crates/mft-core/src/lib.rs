//! # mft-core
//!
//! 解码变换核心库: 格式描述符、统一错误与结果码, 以及采样格式、像素格式、
//! 声道布局、时间基等媒体基础类型.

pub mod channel_layout;
pub mod descriptor;
pub mod error;
pub mod media_kind;
pub mod pixel_format;
pub mod rational;
pub mod sample_format;
pub mod time;

// 重导出常用类型
pub use channel_layout::{ChannelLayout, ChannelMask};
pub use descriptor::{AttributeKey, AttributeValue, FormatDescriptor};
pub use error::{MftError, MftResult, ResultCode};
pub use media_kind::{MediaKind, Subtype};
pub use pixel_format::PixelFormat;
pub use rational::Rational;
pub use sample_format::SampleFormat;
