//! 内置解码引擎.
//!
//! 只包含无需码流算法的 PCM 与原始视频, 其余编解码器由宿主注册.

pub mod pcm;
pub mod rawvideo;

use crate::codec_id::CodecId;
use crate::registry::CodecRegistry;

/// 注册所有内置解码器
pub fn register_all_decoders(registry: &mut CodecRegistry) {
    registry.register_decoder(
        CodecId::RawVideo,
        "rawvideo",
        rawvideo::RawVideoDecoder::create,
    );
    registry.register_decoder(CodecId::PcmS16le, "pcm_s16le", pcm::PcmDecoder::new_s16le);
    registry.register_decoder(CodecId::PcmF32le, "pcm_f32le", pcm::PcmDecoder::new_f32le);
}
