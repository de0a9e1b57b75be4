//! 原始视频引擎 (I420).
//!
//! 不做解压缩, 按像素格式把数据包拆成平面.

use log::debug;
use mft_core::{MftError, MftResult, PixelFormat, Rational};

use crate::codec_id::CodecId;
use crate::codec_parameters::{CodecParameters, CodecParamsType, VideoCodecParams};
use crate::decoder::Decoder;
use crate::frame::{Frame, VideoFrame};
use crate::packet::Packet;

/// 原始视频引擎
pub struct RawVideoDecoder {
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
    frame_rate: Rational,
    /// 预计算: 每帧总字节数
    frame_size: usize,
    /// 预计算: 各平面 (每行字节数, 行数)
    planes: Vec<(usize, usize)>,
    output_frame: Option<Frame>,
    opened: bool,
    flushing: bool,
}

impl RawVideoDecoder {
    pub fn create() -> MftResult<Box<dyn Decoder>> {
        Ok(Box::new(Self {
            width: 0,
            height: 0,
            pixel_format: PixelFormat::None,
            frame_rate: Rational::UNDEFINED,
            frame_size: 0,
            planes: Vec::new(),
            output_frame: None,
            opened: false,
            flushing: false,
        }))
    }
}

impl Decoder for RawVideoDecoder {
    fn codec_id(&self) -> CodecId {
        CodecId::RawVideo
    }

    fn name(&self) -> &str {
        "rawvideo"
    }

    fn open(&mut self, params: &CodecParameters) -> MftResult<()> {
        let video = params
            .video()
            .ok_or_else(|| MftError::InvalidArgument("rawvideo 解码器需要视频参数".into()))?;
        if video.width == 0 || video.height == 0 {
            return Err(MftError::InvalidArgument("宽度和高度不能为 0".into()));
        }
        // 压缩格式才需要解码后确定像素格式, 原始视频缺省按 I420 处理
        let pf = match video.pixel_format {
            PixelFormat::None => PixelFormat::Yuv420p,
            pf => pf,
        };
        let frame_size = pf
            .frame_size(video.width, video.height)
            .ok_or_else(|| MftError::InvalidArgument(format!("无法计算 {pf} 的帧大小")))?;

        let mut planes = Vec::with_capacity(pf.plane_count() as usize);
        for i in 0..pf.plane_count() as usize {
            let ls = pf.plane_linesize(i, video.width);
            let ph = pf.plane_height(i, video.height);
            match (ls, ph) {
                (Some(ls), Some(ph)) => planes.push((ls, ph)),
                _ => {
                    return Err(MftError::InvalidArgument(format!(
                        "无法计算平面 {i} 的布局"
                    )));
                }
            }
        }

        self.width = video.width;
        self.height = video.height;
        self.pixel_format = pf;
        self.frame_rate = video.frame_rate;
        self.frame_size = frame_size;
        self.planes = planes;
        self.output_frame = None;
        self.opened = true;
        self.flushing = false;

        debug!(
            "打开 rawvideo 解码器: {}x{}, 格式={}, 帧大小={}",
            self.width, self.height, self.pixel_format, self.frame_size,
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
        if packet.data.len() != self.frame_size {
            return Err(MftError::InvalidData(format!(
                "数据大小 {} 与预期帧大小 {} 不匹配",
                packet.data.len(),
                self.frame_size,
            )));
        }

        let mut frame = VideoFrame::new(self.width, self.height, self.pixel_format);
        frame.pts = packet.pts;
        frame.time_base = packet.time_base;
        frame.duration = packet.duration;

        let mut offset = 0usize;
        for (i, &(linesize, rows)) in self.planes.iter().enumerate() {
            let plane_size = linesize * rows;
            frame.data[i] = packet.data[offset..offset + plane_size].to_vec();
            frame.linesize[i] = linesize;
            offset += plane_size;
        }

        self.output_frame = Some(Frame::Video(frame));
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
        if self.frame_rate.is_valid() && self.frame_rate.num > 0 {
            Rational::new(self.frame_rate.den, self.frame_rate.num)
        } else {
            Rational::UNDEFINED
        }
    }

    fn stream_params(&self) -> CodecParamsType {
        CodecParamsType::Video(VideoCodecParams {
            width: self.width,
            height: self.height,
            pixel_format: self.pixel_format,
            frame_rate: self.frame_rate,
            sample_aspect_ratio: Rational::new(1, 1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_video_params(w: u32, h: u32) -> CodecParameters {
        CodecParameters {
            codec_id: CodecId::RawVideo,
            extra_data: Vec::new(),
            bit_rate: 0,
            params: CodecParamsType::Video(VideoCodecParams {
                width: w,
                height: h,
                pixel_format: PixelFormat::Yuv420p,
                frame_rate: Rational::new(25, 1),
                sample_aspect_ratio: Rational::new(1, 1),
            }),
        }
    }

    #[test]
    fn test_basic_decode_yuv420p() {
        let mut dec = RawVideoDecoder::create().unwrap();
        dec.open(&make_video_params(4, 4)).unwrap();

        // 4x4 YUV420P: Y=16, U=4, V=4 = 24 字节
        let data: Vec<u8> = (0..24).collect();
        let mut pkt = Packet::from_data(data);
        pkt.pts = 400_000;
        dec.send_packet(&pkt).unwrap();
        match dec.receive_frame().unwrap() {
            Frame::Video(vf) => {
                assert_eq!(vf.data.len(), 3);
                assert_eq!(vf.data[0].len(), 16);
                assert_eq!(vf.data[1], vec![16, 17, 18, 19]);
                assert_eq!(vf.linesize, vec![4, 2, 2]);
                assert_eq!(vf.pts, 400_000);
            }
            _ => panic!("期望视频帧"),
        }
        assert_eq!(dec.time_base(), Rational::new(1, 25));
    }

    #[test]
    fn test_not_open_error() {
        let mut dec = RawVideoDecoder::create().unwrap();
        let err = dec.send_packet(&Packet::from_data(vec![0u8; 24])).unwrap_err();
        assert!(matches!(err, MftError::Codec(_)));
    }

    #[test]
    fn test_data_size_mismatch() {
        let mut dec = RawVideoDecoder::create().unwrap();
        dec.open(&make_video_params(4, 4)).unwrap();
        let err = dec.send_packet(&Packet::from_data(vec![0u8; 10])).unwrap_err();
        assert!(matches!(err, MftError::InvalidData(_)));
    }

    #[test]
    fn test_stream_params_报告实际尺寸() {
        let mut dec = RawVideoDecoder::create().unwrap();
        dec.open(&make_video_params(6, 2)).unwrap();
        match dec.stream_params() {
            CodecParamsType::Video(v) => {
                assert_eq!((v.width, v.height), (6, 2));
                assert_eq!(v.pixel_format, PixelFormat::Yuv420p);
            }
            _ => panic!("期望视频参数"),
        }
    }
}
