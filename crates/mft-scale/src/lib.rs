//! # mft-scale
//!
//! 视频帧像素格式转换.
//!
//! 解码引擎输出的帧可能是任意受支持的 8 位像素格式, 变换输出固定为紧密排列的 NV12.
//! 本 crate 只做格式转换, 不做缩放: 源和目标尺寸始终相同.

pub mod convert;

use log::debug;
use mft_core::{MftError, MftResult, PixelFormat};

/// 判断是否支持该转换
pub fn is_conversion_supported(src: PixelFormat, dst: PixelFormat) -> bool {
    dst == PixelFormat::Nv12 && convert::is_supported_source(src)
}

/// 像素格式转换上下文
///
/// 针对一组 (尺寸, 源格式) 配置一次, 之后可对每一帧重复调用 [`ScaleContext::scale`].
/// 引擎输出的尺寸或像素格式变化时需要重建上下文.
#[derive(Debug, Clone)]
pub struct ScaleContext {
    /// 宽度
    pub width: u32,
    /// 高度
    pub height: u32,
    /// 源像素格式
    pub src_format: PixelFormat,
    /// 目标像素格式
    pub dst_format: PixelFormat,
}

impl ScaleContext {
    /// 创建转换上下文
    pub fn new(
        width: u32,
        height: u32,
        src_format: PixelFormat,
        dst_format: PixelFormat,
    ) -> MftResult<Self> {
        if width == 0 || height == 0 {
            return Err(MftError::InvalidArgument(format!(
                "无效的图像尺寸: {width}x{height}"
            )));
        }
        if !is_conversion_supported(src_format, dst_format) {
            return Err(MftError::Unsupported(format!(
                "不支持的像素格式转换: {src_format} -> {dst_format}"
            )));
        }
        debug!("创建像素转换上下文: {width}x{height} {src_format} -> {dst_format}");
        Ok(Self {
            width,
            height,
            src_format,
            dst_format,
        })
    }

    /// 目标图像字节数
    pub fn output_size(&self) -> usize {
        self.dst_format
            .frame_size(self.width, self.height)
            .unwrap_or(0)
    }

    /// 判断上下文是否与给定的源参数一致
    pub fn matches(&self, width: u32, height: u32, src_format: PixelFormat) -> bool {
        self.width == width && self.height == height && self.src_format == src_format
    }

    /// 执行像素格式转换
    ///
    /// # 参数
    /// - `src_data`: 源图像各平面数据
    /// - `src_linesize`: 源图像各平面行字节数
    /// - `dst`: 目标缓冲区, 长度必须等于 [`ScaleContext::output_size`]
    pub fn scale(&self, src_data: &[&[u8]], src_linesize: &[usize], dst: &mut [u8]) -> MftResult<()> {
        let expected = self.output_size();
        if dst.len() != expected {
            return Err(MftError::InvalidArgument(format!(
                "目标缓冲区大小不符: {} 字节, 期望 {expected}",
                dst.len()
            )));
        }
        let luma = self.width as usize * self.height as usize;
        let (y, uv) = dst.split_at_mut(luma);
        let input = convert::ConvertInput {
            planes: src_data,
            linesize: src_linesize,
            width: self.width,
            height: self.height,
            format: self.src_format,
        };
        convert::to_nv12(&input, y, uv)
    }
}
