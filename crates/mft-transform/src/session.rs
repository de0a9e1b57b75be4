//! 解码会话.
//!
//! 独占一个解码引擎和一个帧后处理器, 负责 数据包 -> 帧 -> 采样 的流水线,
//! 并持有按 FIFO 顺序等待拉取的输出队列.
//!
//! 格式变更检测: 引擎报告的真实帧尺寸相对上一次观察到的值发生变化, 且与当前
//! 输出描述符不一致时, 会话把输出描述符的帧尺寸改为真实尺寸, 并置位一次性的
//! 格式变更标志, 直到消费者通过 [`DecodeSession::take_format_change`] 读走.

use std::collections::VecDeque;
use std::sync::Arc;

use log::{debug, error, warn};
use mft_codec::{CodecParameters, CodecParamsType, CodecRegistry, Decoder, Packet};
use mft_core::time::{is_valid, samples_to_hns};
use mft_core::{
    AttributeKey, AttributeValue, FormatDescriptor, MediaKind, MftError, MftResult, Rational,
};

use crate::postprocess::{FramePostProcessor, create_post_processor};
use crate::sample::{DecodeStatus, PendingSample};

/// 解码会话
pub struct DecodeSession {
    registry: Arc<CodecRegistry>,
    input: FormatDescriptor,
    output: FormatDescriptor,
    params: CodecParameters,
    engine: Box<dyn Decoder>,
    post: Box<dyn FramePostProcessor>,
    queue: VecDeque<PendingSample>,
    /// 上一次观察到的引擎帧尺寸
    observed_size: Option<(u32, u32)>,
    format_change: bool,
}

impl DecodeSession {
    /// 按协商好的输入/输出类型创建会话
    ///
    /// 描述符被复制保存, 调用方的原值随后可以释放.
    pub fn initialize(
        registry: Arc<CodecRegistry>,
        input: &FormatDescriptor,
        output: &FormatDescriptor,
    ) -> MftResult<Self> {
        if input.kind != output.kind {
            return Err(MftError::InvalidMediaType(format!(
                "输入 {} 与输出 {} 的流类别不一致",
                input.kind, output.kind
            )));
        }
        let params = CodecParameters::from_descriptors(input, output, &registry)?;
        let engine = open_engine(&registry, &params)?;

        let mut post = create_post_processor(output);
        post.initialize(engine.as_ref(), input, output)?;
        debug!(
            "解码会话初始化: {} -> {}, 引擎 {}, 后处理 {}",
            input,
            output,
            engine.name(),
            post.name()
        );

        let mut session = Self {
            registry,
            input: input.clone(),
            output: output.clone(),
            params,
            engine,
            post,
            queue: VecDeque::new(),
            observed_size: input.frame_size(),
            format_change: false,
        };
        session.check_format_change();
        Ok(session)
    }

    /// 解码一个数据包, 产出的采样进入输出队列
    ///
    /// 每次都把引擎的输出取空, 因此引擎在下一次送包时总能接收.
    pub fn decode(&mut self, packet: &Packet) -> MftResult<DecodeStatus> {
        // 未读取的格式变更必须先被处理
        if self.format_change {
            return Ok(DecodeStatus::NotAccepting);
        }

        match self.engine.send_packet(packet) {
            Ok(()) => {}
            Err(MftError::TryAgain) => {
                error!("{} 引擎输出未取空却收到新数据包", self.engine.name());
                return Err(MftError::Internal(
                    "解码引擎在送包前未被取空".into(),
                ));
            }
            Err(e) => return Err(e),
        }

        let mut queued = 0usize;
        loop {
            let frame = match self.engine.receive_frame() {
                Ok(frame) => frame,
                Err(MftError::NeedMoreData) | Err(MftError::Eof) => break,
                Err(e) => return Err(e),
            };

            let time = frame_time(frame.pts(), frame.time_base(), packet.pts);
            let frame_duration = if frame.duration() > 0 {
                to_hns(frame.duration(), frame.time_base())
            } else {
                frame
                    .nb_samples()
                    .map(|nb| samples_to_hns(nb, self.engine.time_base()))
                    .unwrap_or(0)
            };
            let duration = if packet.duration > 0 {
                packet.duration
            } else {
                frame_duration
            };

            let data = match self.post.process_decoded_frame(self.engine.as_ref(), &frame) {
                Ok(data) => data.to_vec(),
                Err(e) => {
                    // 引擎必须被取空, 否则下一次送包会失败
                    let dropped = self.discard_engine_frames();
                    warn!("帧后处理失败, 丢弃同一数据包的其余 {dropped} 帧: {e}");
                    return Err(e);
                }
            };
            self.queue.push_back(PendingSample {
                data,
                time,
                duration,
            });
            queued += 1;

            self.check_format_change();
        }

        if queued == 0 {
            return Ok(DecodeStatus::NeedMoreInput);
        }
        Ok(DecodeStatus::Queued)
    }

    /// 取出最早的采样
    pub fn pop_sample(&mut self) -> Option<PendingSample> {
        self.queue.pop_front()
    }

    /// 是否有待拉取的采样
    pub fn has_samples(&self) -> bool {
        !self.queue.is_empty()
    }

    /// 待拉取的采样数
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// 只重建解码引擎, 输出队列保持不变
    pub fn flush_input(&mut self) -> MftResult<()> {
        self.engine.flush();
        self.engine = open_engine(&self.registry, &self.params)?;
        self.observed_size = self.input.frame_size();
        debug!("重建解码引擎 {}, 队列中保留 {} 个采样", self.engine.name(), self.queue.len());
        self.check_format_change();
        Ok(())
    }

    /// 丢弃所有待拉取的采样并重建引擎
    pub fn flush(&mut self) -> MftResult<()> {
        let dropped = self.queue.len();
        self.queue.clear();
        if dropped > 0 {
            debug!("清空输出队列, 丢弃 {dropped} 个采样");
        }
        self.flush_input()
    }

    /// 读取并清除格式变更标志
    ///
    /// 有变更时返回已更新帧尺寸的输出描述符.
    pub fn take_format_change(&mut self) -> Option<FormatDescriptor> {
        std::mem::take(&mut self.format_change).then(|| self.output.clone())
    }

    /// 是否有未读取的格式变更
    pub fn has_format_change(&self) -> bool {
        self.format_change
    }

    /// 会话当前的输入描述符
    pub fn input(&self) -> &FormatDescriptor {
        &self.input
    }

    /// 会话当前的输出描述符
    pub fn output(&self) -> &FormatDescriptor {
        &self.output
    }

    /// 当前解码引擎
    pub fn engine(&self) -> &dyn Decoder {
        self.engine.as_ref()
    }

    /// 取空引擎中剩余的帧并丢弃, 返回丢弃的帧数
    fn discard_engine_frames(&mut self) -> usize {
        let mut dropped = 0;
        while self.engine.receive_frame().is_ok() {
            dropped += 1;
        }
        dropped
    }

    fn check_format_change(&mut self) {
        if self.output.kind != MediaKind::Video {
            return;
        }
        let CodecParamsType::Video(v) = self.engine.stream_params() else {
            return;
        };
        if v.width == 0 || v.height == 0 {
            return;
        }
        let actual = (v.width, v.height);
        if self.observed_size == Some(actual) {
            return;
        }
        self.observed_size = Some(actual);
        if self.output.frame_size() == Some(actual) {
            return;
        }

        debug!(
            "输出格式变更: {:?} -> {}x{}",
            self.output.frame_size(),
            actual.0,
            actual.1
        );
        self.output.set(
            AttributeKey::FrameSize,
            AttributeValue::Size {
                width: actual.0,
                height: actual.1,
            },
        );
        self.format_change = true;
    }
}

fn open_engine(registry: &CodecRegistry, params: &CodecParameters) -> MftResult<Box<dyn Decoder>> {
    let mut engine = registry.create_decoder(params.codec_id)?;
    engine.open(params)?;
    Ok(engine)
}

/// 帧时间戳有效时换算为 100ns, 否则沿用数据包时间
fn frame_time(pts: i64, time_base: Rational, packet_pts: i64) -> i64 {
    if !is_valid(pts) {
        return packet_pts;
    }
    if time_base.is_valid() {
        time_base.rescale(pts, Rational::HNS).unwrap_or(packet_pts)
    } else {
        pts
    }
}

fn to_hns(value: i64, time_base: Rational) -> i64 {
    if time_base.is_valid() {
        time_base.rescale(value, Rational::HNS).unwrap_or(0)
    } else {
        value
    }
}
