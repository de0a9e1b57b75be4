//! PCM 音频引擎.
//!
//! 每个数据包直接切成一帧交错音频, 不做格式转换.

use log::debug;
use mft_core::{ChannelLayout, MftError, MftResult, Rational, SampleFormat};

use crate::codec_id::CodecId;
use crate::codec_parameters::{AudioCodecParams, CodecParameters, CodecParamsType};
use crate::decoder::Decoder;
use crate::frame::{AudioFrame, Frame};
use crate::packet::Packet;

/// PCM 音频引擎
pub struct PcmDecoder {
    codec_id: CodecId,
    /// 码流与输出共用的采样格式
    sample_format: SampleFormat,
    sample_rate: u32,
    channel_layout: ChannelLayout,
    /// 每个采样块的字节数 (每样本字节数 * 声道数)
    block_align: u32,
    /// 已解码帧缓冲
    output_frame: Option<Frame>,
    opened: bool,
    /// 是否已收到流结束信号 (空包)
    flushing: bool,
}

impl PcmDecoder {
    fn create(codec_id: CodecId) -> MftResult<Box<dyn Decoder>> {
        let sample_format = match codec_id {
            CodecId::PcmS16le => SampleFormat::S16,
            CodecId::PcmF32le => SampleFormat::F32,
            other => {
                return Err(MftError::CodecNotFound(format!(
                    "不支持的 PCM 格式: {other}"
                )));
            }
        };
        Ok(Box::new(Self {
            codec_id,
            sample_format,
            sample_rate: 0,
            channel_layout: ChannelLayout::MONO,
            block_align: 0,
            output_frame: None,
            opened: false,
            flushing: false,
        }))
    }

    pub fn new_s16le() -> MftResult<Box<dyn Decoder>> {
        Self::create(CodecId::PcmS16le)
    }

    pub fn new_f32le() -> MftResult<Box<dyn Decoder>> {
        Self::create(CodecId::PcmF32le)
    }
}

impl Decoder for PcmDecoder {
    fn codec_id(&self) -> CodecId {
        self.codec_id
    }

    fn name(&self) -> &str {
        self.codec_id.name()
    }

    fn open(&mut self, params: &CodecParameters) -> MftResult<()> {
        let audio = params
            .audio()
            .ok_or_else(|| MftError::InvalidArgument("PCM 解码器需要音频参数".into()))?;
        if audio.sample_rate == 0 {
            return Err(MftError::InvalidArgument("采样率不能为 0".into()));
        }
        if audio.channel_layout.channels == 0 {
            return Err(MftError::InvalidArgument("声道数不能为 0".into()));
        }

        self.sample_rate = audio.sample_rate;
        self.channel_layout = audio.channel_layout;
        self.block_align = self.sample_format.bytes_per_sample() * audio.channel_layout.channels;
        self.output_frame = None;
        self.opened = true;
        self.flushing = false;

        debug!(
            "打开 {} 解码器: {} Hz, {} 声道",
            self.name(),
            self.sample_rate,
            self.channel_layout.channels,
        );
        Ok(())
    }

    fn send_packet(&mut self, packet: &Packet) -> MftResult<()> {
        if !self.opened {
            return Err(MftError::Codec("解码器未打开, 请先调用 open()".into()));
        }
        if self.output_frame.is_some() {
            return Err(MftError::TryAgain);
        }
        if packet.is_empty() {
            self.flushing = true;
            return Ok(());
        }

        let nb_samples = sample_count(packet.data.len(), self.block_align)?;
        let mut frame = AudioFrame::new(
            nb_samples,
            self.sample_rate,
            self.sample_format,
            self.channel_layout,
        );
        frame.pts = packet.pts;
        frame.time_base = packet.time_base;
        frame.data[0] = packet.data.clone();

        self.output_frame = Some(Frame::Audio(frame));
        Ok(())
    }

    fn receive_frame(&mut self) -> MftResult<Frame> {
        if let Some(frame) = self.output_frame.take() {
            return Ok(frame);
        }
        if self.flushing {
            return Err(MftError::Eof);
        }
        Err(MftError::NeedMoreData)
    }

    fn flush(&mut self) {
        self.output_frame = None;
        self.flushing = false;
    }

    fn time_base(&self) -> Rational {
        if self.sample_rate == 0 {
            return Rational::UNDEFINED;
        }
        Rational::new(1, self.sample_rate as i32)
    }

    fn stream_params(&self) -> CodecParamsType {
        CodecParamsType::Audio(AudioCodecParams {
            sample_rate: self.sample_rate,
            channel_layout: self.channel_layout,
            sample_format: self.sample_format,
            frame_size: 0,
            block_align: self.block_align,
        })
    }
}

/// 按块对齐计算数据包中的采样数
fn sample_count(data_len: usize, block_align: u32) -> MftResult<u32> {
    let block = block_align as usize;
    if data_len % block != 0 {
        return Err(MftError::InvalidData(format!(
            "数据大小 {data_len} 不是 block_align {block_align} 的整数倍"
        )));
    }
    u32::try_from(data_len / block)
        .map_err(|_| MftError::InvalidData(format!("数据包过大: {data_len} 字节")))
}
