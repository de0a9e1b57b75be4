//! 音频后处理: 任意采样格式转为交错 f32.

use log::debug;
use mft_codec::{AudioFrame, CodecParamsType, Decoder, Frame};
use mft_core::error::try_alloc_zeroed;
use mft_core::{ChannelLayout, FormatDescriptor, MftError, MftResult, SampleFormat, Subtype};
use mft_resample::ResampleContext;

use super::FramePostProcessor;

/// 音频后处理器
///
/// 输出为引擎采样率下、按引擎声道数取默认布局的交错 f32.
/// 连续帧的声道数和采样数不变时复用同一块输出缓冲区.
pub struct AudioPostProcessor {
    resampler: Option<ResampleContext>,
    buffer: Vec<u8>,
    /// 上一次分配缓冲区时的 (声道数, 采样数)
    last_shape: Option<(u32, u32)>,
    allocations: usize,
}

impl AudioPostProcessor {
    /// 创建音频后处理器
    pub fn new() -> Self {
        Self {
            resampler: None,
            buffer: Vec::new(),
            last_shape: None,
            allocations: 0,
        }
    }

    /// 输出缓冲区累计分配次数
    pub fn buffer_allocations(&self) -> usize {
        self.allocations
    }

    /// 确保转换上下文与帧的源参数一致
    fn ensure_resampler(&mut self, frame: &AudioFrame) -> MftResult<&ResampleContext> {
        let stale = match &self.resampler {
            Some(ctx) => {
                ctx.sample_rate != frame.sample_rate
                    || ctx.src_sample_format != frame.sample_format
                    || ctx.src_channel_layout.channels != frame.channel_layout.channels
            }
            None => true,
        };
        if stale {
            self.resampler = Some(build_resampler(
                frame.sample_rate,
                frame.sample_format,
                frame.channel_layout,
            )?);
        }
        self.resampler
            .as_ref()
            .ok_or_else(|| MftError::Internal("重采样上下文缺失".into()))
    }
}

impl Default for AudioPostProcessor {
    fn default() -> Self {
        Self::new()
    }
}

fn build_resampler(
    sample_rate: u32,
    sample_format: SampleFormat,
    layout: ChannelLayout,
) -> MftResult<ResampleContext> {
    // 声道布局未知时按声道数取默认布局
    let src_layout = if layout.mask.is_empty() {
        ChannelLayout::from_channels(layout.channels)
    } else {
        layout
    };
    ResampleContext::new(
        sample_rate,
        sample_format,
        src_layout,
        sample_rate,
        SampleFormat::F32,
        ChannelLayout::from_channels(layout.channels),
    )
}

impl FramePostProcessor for AudioPostProcessor {
    fn name(&self) -> &str {
        "audio"
    }

    fn initialize(
        &mut self,
        engine: &dyn Decoder,
        _input: &FormatDescriptor,
        output: &FormatDescriptor,
    ) -> MftResult<()> {
        if output.codec != Subtype::Float {
            return Err(MftError::InvalidMediaType(format!(
                "音频输出只支持 float, 实际为 {}",
                output.codec
            )));
        }
        self.resampler = None;
        self.buffer = Vec::new();
        self.last_shape = None;

        // 压缩格式在解码前不知道采样格式, 此时推迟到第一帧再建上下文
        if let CodecParamsType::Audio(a) = engine.stream_params() {
            if a.sample_format != SampleFormat::None && a.sample_rate > 0 {
                self.resampler = Some(build_resampler(
                    a.sample_rate,
                    a.sample_format,
                    a.channel_layout,
                )?);
            }
            debug!(
                "音频后处理初始化: {} Hz, {} 声道, {} -> f32",
                a.sample_rate, a.channel_layout.channels, a.sample_format
            );
        }
        Ok(())
    }

    fn process_decoded_frame(&mut self, _engine: &dyn Decoder, frame: &Frame) -> MftResult<&[u8]> {
        let Frame::Audio(af) = frame else {
            return Err(MftError::InvalidData("音频后处理收到视频帧".into()));
        };

        let shape = (af.channel_layout.channels, af.nb_samples);
        let size = self.ensure_resampler(af)?.output_size(af.nb_samples);
        if self.last_shape != Some(shape) || self.buffer.len() != size {
            self.buffer = try_alloc_zeroed(size, "音频输出缓冲区")?;
            self.last_shape = Some(shape);
            self.allocations += 1;
        }

        let ctx = self
            .resampler
            .as_ref()
            .ok_or_else(|| MftError::Internal("重采样上下文缺失".into()))?;
        ctx.convert_into(&af.data, af.nb_samples, &mut self.buffer)?;
        Ok(&self.buffer)
    }
}
