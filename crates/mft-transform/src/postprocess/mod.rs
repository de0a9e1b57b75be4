//! 帧后处理.
//!
//! 把引擎解码出的原始帧转换为输出类型要求的字节: 音频为交错 f32, 视频为 NV12.
//! 会话初始化时按输出类别选定一种实现, 之后不再更换.

mod audio;
mod video;

pub use audio::AudioPostProcessor;
pub use video::VideoPostProcessor;

use mft_codec::{Decoder, Frame};
use mft_core::{FormatDescriptor, MediaKind, MftResult};

/// 帧后处理器
pub trait FramePostProcessor: Send {
    /// 后处理器名称
    fn name(&self) -> &str;

    /// 按引擎参数和协商好的类型完成初始化
    fn initialize(
        &mut self,
        engine: &dyn Decoder,
        input: &FormatDescriptor,
        output: &FormatDescriptor,
    ) -> MftResult<()>;

    /// 转换一帧, 返回的字节在下一次调用前有效
    fn process_decoded_frame(&mut self, engine: &dyn Decoder, frame: &Frame) -> MftResult<&[u8]>;
}

/// 按输出类别创建后处理器
pub fn create_post_processor(output: &FormatDescriptor) -> Box<dyn FramePostProcessor> {
    match output.kind {
        MediaKind::Audio => Box::new(AudioPostProcessor::new()),
        MediaKind::Video => Box::new(VideoPostProcessor::new()),
    }
}

#[cfg(test)]
pub(crate) mod test_engine {
    //! 后处理器测试用的最小引擎, 只报告参数.

    use mft_codec::{CodecId, CodecParamsType, Decoder, Frame, Packet};
    use mft_core::{MftError, MftResult, Rational};

    pub struct ParamsOnly {
        pub params: CodecParamsType,
    }

    impl Decoder for ParamsOnly {
        fn codec_id(&self) -> CodecId {
            match self.params {
                CodecParamsType::Video(_) => CodecId::RawVideo,
                _ => CodecId::PcmS16le,
            }
        }

        fn name(&self) -> &str {
            "params_only"
        }

        fn send_packet(&mut self, _packet: &Packet) -> MftResult<()> {
            Ok(())
        }

        fn receive_frame(&mut self) -> MftResult<Frame> {
            Err(MftError::NeedMoreData)
        }

        fn flush(&mut self) {}

        fn time_base(&self) -> Rational {
            Rational::new(1, 48000)
        }

        fn stream_params(&self) -> CodecParamsType {
            self.params.clone()
        }
    }
}
