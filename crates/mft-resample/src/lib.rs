//! # mft-resample
//!
//! 音频后处理的转换后端: 采样格式转换、平面转交错, 以及声道数不同时的简单映射.
//! 采样率保持不变.

mod convert;

use log::debug;
use mft_core::{ChannelLayout, MftError, MftResult, SampleFormat};

/// 重采样上下文
///
/// 配置一次后可多次复用.
#[derive(Debug, Clone)]
pub struct ResampleContext {
    /// 采样率 (输入输出相同)
    pub sample_rate: u32,
    /// 源采样格式
    pub src_sample_format: SampleFormat,
    /// 源声道布局
    pub src_channel_layout: ChannelLayout,
    /// 目标采样格式, 必须是交错格式
    pub dst_sample_format: SampleFormat,
    /// 目标声道布局
    pub dst_channel_layout: ChannelLayout,
}

impl ResampleContext {
    /// 创建新的重采样上下文
    pub fn new(
        src_sample_rate: u32,
        src_sample_format: SampleFormat,
        src_channel_layout: ChannelLayout,
        dst_sample_rate: u32,
        dst_sample_format: SampleFormat,
        dst_channel_layout: ChannelLayout,
    ) -> MftResult<Self> {
        if src_sample_rate != dst_sample_rate {
            return Err(MftError::Unsupported(format!(
                "不支持采样率转换: {src_sample_rate} -> {dst_sample_rate}"
            )));
        }
        if src_sample_format.bytes_per_sample() == 0 || dst_sample_format.bytes_per_sample() == 0 {
            return Err(MftError::InvalidArgument(format!(
                "无效的采样格式: {src_sample_format} -> {dst_sample_format}"
            )));
        }
        if dst_sample_format.is_planar() {
            return Err(MftError::Unsupported(format!(
                "目标格式必须为交错格式: {dst_sample_format}"
            )));
        }
        if src_channel_layout.channels == 0 || dst_channel_layout.channels == 0 {
            return Err(MftError::InvalidArgument("声道数不能为 0".into()));
        }
        debug!(
            "创建重采样上下文: {} {} -> {} {}, {} Hz",
            src_sample_format,
            src_channel_layout,
            dst_sample_format,
            dst_channel_layout,
            src_sample_rate
        );
        Ok(Self {
            sample_rate: src_sample_rate,
            src_sample_format,
            src_channel_layout,
            dst_sample_format,
            dst_channel_layout,
        })
    }

    /// 是否只需原样拷贝
    pub fn is_passthrough(&self) -> bool {
        self.src_sample_format == self.dst_sample_format
            && self.src_channel_layout.channels == self.dst_channel_layout.channels
    }

    /// 转换 `nb_samples` 个采样所需的输出字节数
    pub fn output_size(&self, nb_samples: u32) -> usize {
        nb_samples as usize
            * self.dst_channel_layout.channels as usize
            * self.dst_sample_format.bytes_per_sample() as usize
    }

    /// 转换一帧数据, 写入调用方提供的缓冲区
    ///
    /// `planes` 为平面格式时每声道一个平面, 交错格式时只有一个平面.
    /// `out` 长度必须等于 `output_size(nb_samples)`.
    pub fn convert_into(&self, planes: &[Vec<u8>], nb_samples: u32, out: &mut [u8]) -> MftResult<()> {
        let nb = nb_samples as usize;
        let src_ch = self.src_channel_layout.channels as usize;
        let dst_ch = self.dst_channel_layout.channels as usize;
        let src_bps = self.src_sample_format.bytes_per_sample() as usize;
        let dst_bps = self.dst_sample_format.bytes_per_sample() as usize;
        let planar = self.src_sample_format.is_planar();

        if out.len() != self.output_size(nb_samples) {
            return Err(MftError::InvalidArgument(format!(
                "输出缓冲区大小 {} 与期望 {} 不符",
                out.len(),
                self.output_size(nb_samples)
            )));
        }
        let (expected_planes, plane_len) = if planar {
            (src_ch, nb * src_bps)
        } else {
            (1, nb * src_ch * src_bps)
        };
        if planes.len() < expected_planes || planes.iter().take(expected_planes).any(|p| p.len() < plane_len) {
            return Err(MftError::InvalidData(format!(
                "输入数据不足: 需要 {expected_planes} 个平面, 每个 {plane_len} 字节"
            )));
        }

        if self.is_passthrough() && !planar {
            out.copy_from_slice(&planes[0][..plane_len]);
            return Ok(());
        }

        for s in 0..nb {
            for dc in 0..dst_ch {
                let value = if src_ch == 1 {
                    // 单声道复制到所有声道
                    self.read(planes, planar, s, 0)?
                } else if dst_ch == 1 {
                    let mut sum = 0.0;
                    for sc in 0..src_ch {
                        sum += self.read(planes, planar, s, sc)?;
                    }
                    sum / src_ch as f64
                } else if dc < src_ch {
                    self.read(planes, planar, s, dc)?
                } else {
                    0.0
                };
                let offset = (s * dst_ch + dc) * dst_bps;
                convert::write_sample(value, self.dst_sample_format, &mut out[offset..])?;
            }
        }
        Ok(())
    }

    fn read(&self, planes: &[Vec<u8>], planar: bool, sample: usize, channel: usize) -> MftResult<f64> {
        let bps = self.src_sample_format.bytes_per_sample() as usize;
        let (plane, offset) = if planar {
            (&planes[channel], sample * bps)
        } else {
            let channels = self.src_channel_layout.channels as usize;
            (&planes[0], (sample * channels + channel) * bps)
        };
        convert::read_sample(&plane[offset..offset + bps], self.src_sample_format)
    }
}
