//! 视频后处理: 任意受支持的像素格式转为 NV12.

use log::debug;
use mft_codec::{CodecParamsType, Decoder, Frame, VideoFrame};
use mft_core::error::try_alloc_zeroed;
use mft_core::{FormatDescriptor, MftError, MftResult, PixelFormat, Subtype};
use mft_scale::ScaleContext;

use super::FramePostProcessor;

/// 视频后处理器
///
/// 以引擎报告的真实尺寸输出紧密排列的 NV12 (Y 平面后接 UV 交错平面).
/// 引擎的像素格式或尺寸与建上下文时不同, 就先重建转换上下文.
pub struct VideoPostProcessor {
    scaler: Option<ScaleContext>,
    buffer: Vec<u8>,
    rebuilds: usize,
}

impl VideoPostProcessor {
    /// 创建视频后处理器
    pub fn new() -> Self {
        Self {
            scaler: None,
            buffer: Vec::new(),
            rebuilds: 0,
        }
    }

    /// 转换上下文累计创建次数
    pub fn scaler_rebuilds(&self) -> usize {
        self.rebuilds
    }

    fn rebuild(&mut self, width: u32, height: u32, format: PixelFormat) -> MftResult<()> {
        let ctx = ScaleContext::new(width, height, format, PixelFormat::Nv12)?;
        let size = ctx.output_size();
        if self.buffer.len() != size {
            self.buffer = try_alloc_zeroed(size, "NV12 输出缓冲区")?;
        }
        debug!("重建像素转换上下文: {width}x{height} {format} -> nv12");
        self.scaler = Some(ctx);
        self.rebuilds += 1;
        Ok(())
    }
}

impl Default for VideoPostProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// 引擎当前的 (宽, 高, 像素格式), 未知项取帧上的值
fn source_params(engine: &dyn Decoder, frame: &VideoFrame) -> (u32, u32, PixelFormat) {
    match engine.stream_params() {
        CodecParamsType::Video(v) => {
            let (w, h) = if v.width > 0 && v.height > 0 {
                (v.width, v.height)
            } else {
                (frame.width, frame.height)
            };
            let format = match v.pixel_format {
                PixelFormat::None => frame.pixel_format,
                pf => pf,
            };
            (w, h, format)
        }
        _ => (frame.width, frame.height, frame.pixel_format),
    }
}

impl FramePostProcessor for VideoPostProcessor {
    fn name(&self) -> &str {
        "video"
    }

    fn initialize(
        &mut self,
        engine: &dyn Decoder,
        _input: &FormatDescriptor,
        output: &FormatDescriptor,
    ) -> MftResult<()> {
        if output.codec != Subtype::Nv12 {
            return Err(MftError::InvalidMediaType(format!(
                "视频输出只支持 nv12, 实际为 {}",
                output.codec
            )));
        }
        self.scaler = None;
        if let CodecParamsType::Video(v) = engine.stream_params() {
            // 压缩格式在解码前像素格式未知, 推迟到第一帧
            if v.pixel_format != PixelFormat::None && v.width > 0 && v.height > 0 {
                self.rebuild(v.width, v.height, v.pixel_format)?;
            }
        }
        Ok(())
    }

    fn process_decoded_frame(&mut self, engine: &dyn Decoder, frame: &Frame) -> MftResult<&[u8]> {
        let Frame::Video(vf) = frame else {
            return Err(MftError::InvalidData("视频后处理收到音频帧".into()));
        };

        let (width, height, format) = source_params(engine, vf);
        if vf.width != width || vf.height != height {
            return Err(MftError::InvalidData(format!(
                "帧尺寸 {}x{} 与引擎报告的 {width}x{height} 不符",
                vf.width, vf.height
            )));
        }
        let stale = self
            .scaler
            .as_ref()
            .is_none_or(|ctx| !ctx.matches(width, height, format));
        if stale {
            self.rebuild(width, height, format)?;
        }

        let ctx = self
            .scaler
            .as_ref()
            .ok_or_else(|| MftError::Internal("像素转换上下文缺失".into()))?;
        let planes: Vec<&[u8]> = vf.data.iter().map(Vec::as_slice).collect();
        ctx.scale(&planes, &vf.linesize, &mut self.buffer)?;
        Ok(&self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postprocess::test_engine::ParamsOnly;
    use mft_codec::VideoCodecParams;
    use mft_core::Rational;

    fn engine(width: u32, height: u32, pixel_format: PixelFormat) -> ParamsOnly {
        ParamsOnly {
            params: CodecParamsType::Video(VideoCodecParams {
                width,
                height,
                pixel_format,
                frame_rate: Rational::new(30, 1),
                sample_aspect_ratio: Rational::new(1, 1),
            }),
        }
    }

    fn i420_frame(width: u32, height: u32, y: u8, u: u8, v: u8) -> Frame {
        let mut vf = VideoFrame::new(width, height, PixelFormat::Yuv420p);
        let (cw, ch) = (width.div_ceil(2) as usize, height.div_ceil(2) as usize);
        vf.data = vec![
            vec![y; (width * height) as usize],
            vec![u; cw * ch],
            vec![v; cw * ch],
        ];
        vf.linesize = vec![width as usize, cw, cw];
        Frame::Video(vf)
    }

    #[test]
    fn test_i420_转为_nv12() {
        let eng = engine(4, 2, PixelFormat::Yuv420p);
        let mut pp = VideoPostProcessor::new();
        let out_type = FormatDescriptor::video(Subtype::Nv12, 4, 2);
        pp.initialize(&eng, &out_type, &out_type).unwrap();
        assert_eq!(pp.scaler_rebuilds(), 1);

        let out = pp
            .process_decoded_frame(&eng, &i420_frame(4, 2, 16, 90, 240))
            .unwrap();
        assert_eq!(out.len(), 12);
        assert!(out[..8].iter().all(|&b| b == 16));
        assert_eq!(&out[8..], &[90, 240, 90, 240]);
    }

    #[test]
    fn test_像素格式未知时推迟到第一帧() {
        let eng = engine(2, 2, PixelFormat::None);
        let mut pp = VideoPostProcessor::new();
        let out_type = FormatDescriptor::video(Subtype::Nv12, 2, 2);
        pp.initialize(&eng, &out_type, &out_type).unwrap();
        assert_eq!(pp.scaler_rebuilds(), 0);

        pp.process_decoded_frame(&eng, &i420_frame(2, 2, 1, 2, 3))
            .unwrap();
        pp.process_decoded_frame(&eng, &i420_frame(2, 2, 1, 2, 3))
            .unwrap();
        assert_eq!(pp.scaler_rebuilds(), 1);
    }

    #[test]
    fn test_引擎尺寸变化时重建上下文() {
        let mut pp = VideoPostProcessor::new();
        let out_type = FormatDescriptor::video(Subtype::Nv12, 4, 2);
        let first = engine(4, 2, PixelFormat::Yuv420p);
        pp.initialize(&first, &out_type, &out_type).unwrap();

        let grown = engine(4, 4, PixelFormat::Yuv420p);
        let out = pp
            .process_decoded_frame(&grown, &i420_frame(4, 4, 0, 0, 0))
            .unwrap();
        assert_eq!(out.len(), 24);
        assert_eq!(pp.scaler_rebuilds(), 2);
    }

    #[test]
    fn test_帧尺寸与引擎不符() {
        let eng = engine(4, 4, PixelFormat::Yuv420p);
        let mut pp = VideoPostProcessor::new();
        let out_type = FormatDescriptor::video(Subtype::Nv12, 4, 4);
        pp.initialize(&eng, &out_type, &out_type).unwrap();
        assert!(matches!(
            pp.process_decoded_frame(&eng, &i420_frame(4, 2, 0, 0, 0)),
            Err(MftError::InvalidData(_))
        ));
    }
}
