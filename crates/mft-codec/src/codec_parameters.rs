//! 编解码器参数.
//!
//! 由协商好的输入/输出描述符生成, 用来打开解码引擎. 描述符缺省的属性按
//! 媒体类别补齐 (例如按声道数取默认声道布局).

use log::debug;
use mft_core::{
    AttributeKey, ChannelLayout, FormatDescriptor, MediaKind, MftError, MftResult, PixelFormat,
    Rational, SampleFormat,
};

use crate::codec_id::CodecId;
use crate::registry::CodecRegistry;

/// 编解码器参数
#[derive(Debug, Clone)]
pub struct CodecParameters {
    /// 编解码器标识
    pub codec_id: CodecId,
    /// 额外数据 (已按引擎期望的布局修正)
    pub extra_data: Vec<u8>,
    /// 码率 (bits/s)
    pub bit_rate: u64,
    /// 媒体类型特定参数
    pub params: CodecParamsType,
}

/// 媒体类型特定参数
#[derive(Debug, Clone, PartialEq)]
pub enum CodecParamsType {
    /// 视频参数
    Video(VideoCodecParams),
    /// 音频参数
    Audio(AudioCodecParams),
    /// 无特定参数
    None,
}

/// 视频编解码器参数
#[derive(Debug, Clone, PartialEq)]
pub struct VideoCodecParams {
    /// 宽度 (像素)
    pub width: u32,
    /// 高度 (像素)
    pub height: u32,
    /// 像素格式, 压缩格式在解码前通常未知
    pub pixel_format: PixelFormat,
    /// 帧率
    pub frame_rate: Rational,
    /// 采样宽高比
    pub sample_aspect_ratio: Rational,
}

/// 音频编解码器参数
#[derive(Debug, Clone, PartialEq)]
pub struct AudioCodecParams {
    /// 采样率 (Hz)
    pub sample_rate: u32,
    /// 声道布局
    pub channel_layout: ChannelLayout,
    /// 采样格式, 压缩格式在解码前通常未知
    pub sample_format: SampleFormat,
    /// 每帧采样数 (0 表示可变)
    pub frame_size: u32,
    /// 块对齐 (字节, 0 表示未知)
    pub block_align: u32,
}

impl CodecParameters {
    /// 从协商好的描述符生成引擎参数
    ///
    /// 容器给出的头部数据只在布局与引擎期望不符时才经过修正.
    pub fn from_descriptors(
        input: &FormatDescriptor,
        output: &FormatDescriptor,
        registry: &CodecRegistry,
    ) -> MftResult<Self> {
        let codec_id = CodecId::from_subtype(input.codec).ok_or_else(|| {
            MftError::InvalidMediaType(format!("{} 不是可解码的输入格式", input.codec))
        })?;
        if codec_id.media_kind() != input.kind {
            return Err(MftError::InvalidMediaType(format!(
                "{} 与流类别 {} 不符",
                codec_id, input.kind
            )));
        }

        let extra_data = match input.blob(AttributeKey::UserData) {
            Some(raw) => registry.prepare_extra_data(codec_id, raw)?,
            None => Vec::new(),
        };

        let (bit_rate, params) = match input.kind {
            MediaKind::Audio => audio_params(codec_id, input, output)?,
            MediaKind::Video => video_params(codec_id, input)?,
        };

        debug!(
            "生成 {} 引擎参数: 码率={}, 额外数据 {} 字节",
            codec_id,
            bit_rate,
            extra_data.len()
        );
        Ok(Self {
            codec_id,
            extra_data,
            bit_rate,
            params,
        })
    }

    /// 获取视频参数
    pub fn video(&self) -> Option<&VideoCodecParams> {
        match &self.params {
            CodecParamsType::Video(v) => Some(v),
            _ => None,
        }
    }

    /// 获取音频参数
    pub fn audio(&self) -> Option<&AudioCodecParams> {
        match &self.params {
            CodecParamsType::Audio(a) => Some(a),
            _ => None,
        }
    }
}

fn audio_params(
    codec_id: CodecId,
    input: &FormatDescriptor,
    output: &FormatDescriptor,
) -> MftResult<(u64, CodecParamsType)> {
    let channels = input
        .u32(AttributeKey::ChannelCount)
        .filter(|&c| c > 0)
        .ok_or_else(|| MftError::InvalidMediaType("音频输入缺少声道数".into()))?;
    let sample_rate = input
        .u32(AttributeKey::SampleRate)
        .filter(|&r| r > 0)
        .ok_or_else(|| MftError::InvalidMediaType("音频输入缺少采样率".into()))?;

    // 输出掩码与声道数一致时沿用, 否则取默认布局
    let channel_layout = output
        .u32(AttributeKey::ChannelMask)
        .and_then(ChannelLayout::from_mask)
        .filter(|l| l.channels == channels)
        .unwrap_or_else(|| ChannelLayout::from_channels(channels));

    let sample_format = match codec_id {
        CodecId::PcmS16le => SampleFormat::S16,
        CodecId::PcmF32le => SampleFormat::F32,
        _ => SampleFormat::None,
    };

    let bit_rate = input
        .u64(AttributeKey::AvgBytesPerSecond)
        .map_or(0, |b| b * 8);

    Ok((
        bit_rate,
        CodecParamsType::Audio(AudioCodecParams {
            sample_rate,
            channel_layout,
            sample_format,
            frame_size: input.u32(AttributeKey::SamplesPerBlock).unwrap_or(0),
            block_align: input.u32(AttributeKey::BlockAlignment).unwrap_or(0),
        }),
    ))
}

fn video_params(codec_id: CodecId, input: &FormatDescriptor) -> MftResult<(u64, CodecParamsType)> {
    let (width, height) = input
        .frame_size()
        .filter(|&(w, h)| w > 0 && h > 0)
        .ok_or_else(|| MftError::InvalidMediaType("视频输入缺少帧尺寸".into()))?;

    let frame_rate = input
        .ratio(AttributeKey::FrameRate)
        .and_then(to_rational)
        .unwrap_or(Rational::UNDEFINED);
    let sample_aspect_ratio = input
        .ratio(AttributeKey::PixelAspectRatio)
        .and_then(to_rational)
        .unwrap_or(Rational::new(1, 1));

    let pixel_format = match codec_id {
        CodecId::RawVideo => PixelFormat::Yuv420p,
        _ => PixelFormat::None,
    };

    Ok((
        input.u64(AttributeKey::AvgBitrate).unwrap_or(0),
        CodecParamsType::Video(VideoCodecParams {
            width,
            height,
            pixel_format,
            frame_rate,
            sample_aspect_ratio,
        }),
    ))
}

fn to_rational((num, den): (u32, u32)) -> Option<Rational> {
    Some(Rational::new(i32::try_from(num).ok()?, i32::try_from(den).ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mft_core::{AttributeValue, Subtype};

    #[test]
    fn test_音频参数缺省声道布局() {
        let registry = CodecRegistry::new();
        let input = FormatDescriptor::audio(Subtype::Pcm, 2, 48000)
            .with(AttributeKey::AvgBytesPerSecond, AttributeValue::U32(192_000))
            .with(AttributeKey::BlockAlignment, AttributeValue::U32(4));
        let output = FormatDescriptor::new(MediaKind::Audio, Subtype::Float);

        let params = CodecParameters::from_descriptors(&input, &output, &registry).unwrap();
        assert_eq!(params.codec_id, CodecId::PcmS16le);
        assert_eq!(params.bit_rate, 1_536_000);
        let audio = params.audio().unwrap();
        assert_eq!(audio.channel_layout, ChannelLayout::STEREO);
        assert_eq!(audio.sample_format, SampleFormat::S16);
        assert_eq!(audio.block_align, 4);
    }

    #[test]
    fn test_输出声道掩码优先() {
        let registry = CodecRegistry::new();
        let input = FormatDescriptor::audio(Subtype::Vorbis, 3, 44100);
        let output = FormatDescriptor::new(MediaKind::Audio, Subtype::Float)
            .with(AttributeKey::ChannelMask, AttributeValue::U32(0x103));
        let params = CodecParameters::from_descriptors(&input, &output, &registry).unwrap();
        assert_eq!(params.audio().unwrap().channel_layout.mask.bits(), 0x103);
    }

    #[test]
    fn test_视频参数() {
        let registry = CodecRegistry::new();
        let input = FormatDescriptor::video(Subtype::I420, 320, 240)
            .with(
                AttributeKey::FrameRate,
                AttributeValue::Ratio { num: 25, den: 1 },
            );
        let output = FormatDescriptor::new(MediaKind::Video, Subtype::Nv12);
        let params = CodecParameters::from_descriptors(&input, &output, &registry).unwrap();
        let video = params.video().unwrap();
        assert_eq!((video.width, video.height), (320, 240));
        assert_eq!(video.pixel_format, PixelFormat::Yuv420p);
        assert_eq!(video.frame_rate, Rational::new(25, 1));
        assert_eq!(video.sample_aspect_ratio, Rational::new(1, 1));
    }

    #[test]
    fn test_缺少必需属性() {
        let registry = CodecRegistry::new();
        let output = FormatDescriptor::new(MediaKind::Audio, Subtype::Float);
        let input = FormatDescriptor::new(MediaKind::Audio, Subtype::Aac);
        assert!(matches!(
            CodecParameters::from_descriptors(&input, &output, &registry),
            Err(MftError::InvalidMediaType(_))
        ));
    }
}
