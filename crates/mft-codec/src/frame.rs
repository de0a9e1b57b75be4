//! 解码后的原始帧.

use mft_core::time::NOPTS_VALUE;
use mft_core::{ChannelLayout, PixelFormat, Rational, SampleFormat};

/// 视频帧
///
/// 多平面存储, 例如 YUV420P 有 Y/U/V 三个平面.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// 各平面的像素数据
    pub data: Vec<Vec<u8>>,
    /// 各平面每行的字节数
    pub linesize: Vec<usize>,
    /// 宽度 (像素)
    pub width: u32,
    /// 高度 (像素)
    pub height: u32,
    /// 像素格式
    pub pixel_format: PixelFormat,
    /// 显示时间戳
    pub pts: i64,
    /// 时间基
    pub time_base: Rational,
    /// 帧时长 (以 time_base 为单位), 0 表示未知
    pub duration: i64,
}

impl VideoFrame {
    /// 创建空的视频帧
    pub fn new(width: u32, height: u32, pixel_format: PixelFormat) -> Self {
        let plane_count = pixel_format.plane_count() as usize;
        Self {
            data: vec![Vec::new(); plane_count],
            linesize: vec![0; plane_count],
            width,
            height,
            pixel_format,
            pts: NOPTS_VALUE,
            time_base: Rational::UNDEFINED,
            duration: 0,
        }
    }
}

/// 音频帧
///
/// 平面格式: data 中每个 Vec 对应一个声道; 交错格式: data 只有一个 Vec.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// 音频采样数据
    pub data: Vec<Vec<u8>>,
    /// 每声道采样数
    pub nb_samples: u32,
    /// 采样率 (Hz)
    pub sample_rate: u32,
    /// 采样格式
    pub sample_format: SampleFormat,
    /// 声道布局
    pub channel_layout: ChannelLayout,
    /// 显示时间戳
    pub pts: i64,
    /// 时间基
    pub time_base: Rational,
    /// 帧时长 (以 time_base 为单位), 0 表示未知
    pub duration: i64,
}

impl AudioFrame {
    /// 创建空的音频帧
    pub fn new(
        nb_samples: u32,
        sample_rate: u32,
        sample_format: SampleFormat,
        channel_layout: ChannelLayout,
    ) -> Self {
        let plane_count = if sample_format.is_planar() {
            channel_layout.channels as usize
        } else {
            1
        };
        Self {
            data: vec![Vec::new(); plane_count],
            nb_samples,
            sample_rate,
            sample_format,
            channel_layout,
            pts: NOPTS_VALUE,
            time_base: Rational::UNDEFINED,
            duration: 0,
        }
    }
}

/// 帧 (视频帧或音频帧)
#[derive(Debug, Clone)]
pub enum Frame {
    /// 视频帧
    Video(VideoFrame),
    /// 音频帧
    Audio(AudioFrame),
}

impl Frame {
    /// 显示时间戳
    pub fn pts(&self) -> i64 {
        match self {
            Self::Video(v) => v.pts,
            Self::Audio(a) => a.pts,
        }
    }

    /// 时间基
    pub fn time_base(&self) -> Rational {
        match self {
            Self::Video(v) => v.time_base,
            Self::Audio(a) => a.time_base,
        }
    }

    /// 帧时长 (以 time_base 为单位)
    pub fn duration(&self) -> i64 {
        match self {
            Self::Video(v) => v.duration,
            Self::Audio(a) => a.duration,
        }
    }

    /// 采样数, 只有音频帧已知
    pub fn nb_samples(&self) -> Option<u32> {
        match self {
            Self::Audio(a) if a.nb_samples > 0 => Some(a.nb_samples),
            _ => None,
        }
    }
}
