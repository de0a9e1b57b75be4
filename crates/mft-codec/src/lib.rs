//! # mft-codec
//!
//! 解码引擎抽象: 数据包、帧、编解码参数、引擎注册表与容器头部修正.
//!
//! ## 使用示例
//!
//! ```rust
//! use mft_codec::{CodecId, CodecRegistry};
//!
//! let mut reg = CodecRegistry::new();
//! mft_codec::register_all(&mut reg);
//!
//! let decoder = reg.create_decoder(CodecId::PcmS16le).unwrap();
//! assert_eq!(decoder.name(), "pcm_s16le");
//! ```

pub mod codec_id;
pub mod codec_parameters;
pub mod decoder;
pub mod decoders;
pub mod frame;
pub mod header;
pub mod packet;
pub mod registry;

// 重导出常用类型
pub use codec_id::CodecId;
pub use codec_parameters::{AudioCodecParams, CodecParameters, CodecParamsType, VideoCodecParams};
pub use decoder::Decoder;
pub use frame::{AudioFrame, Frame, VideoFrame};
pub use header::{HeaderFixup, XiphHeaderFixup};
pub use packet::Packet;
pub use registry::CodecRegistry;

/// 注册所有内置解码引擎与头部修正器
pub fn register_all(registry: &mut CodecRegistry) {
    decoders::register_all_decoders(registry);
    registry.register_header_fixup(CodecId::Vorbis, Box::new(XiphHeaderFixup::new()));
}
