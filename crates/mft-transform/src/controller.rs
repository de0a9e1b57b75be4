//! 变换控制器.
//!
//! 顶层状态机: 持有类型协商器, 并按需创建解码会话. 调用方通过推入
//! (`process_input`)、拉取 (`process_output`) 与控制消息 (`process_message`)
//! 驱动整个流程.
//!
//! 锁顺序固定为 状态锁 -> 会话槽锁. 推入在状态锁下完成准入检查和会话的延迟创建,
//! 释放状态锁后只持有会话槽锁解码; 拉取、控制消息和类型协商全程持有状态锁.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, warn};
use mft_codec::{CodecRegistry, Packet};
use mft_core::{FormatDescriptor, MediaKind, MftError, MftResult};

use crate::config::TransformConfig;
use crate::negotiator::TypeNegotiator;
use crate::sample::{InputSample, InputStatus, OutputDataBuffer, OutputStatus};
use crate::session::DecodeSession;
use crate::stream_info::{
    InputStatusFlags, InputStreamFlags, InputStreamInfo, OutputStatusFlags, OutputStreamFlags,
    OutputStreamInfo, ShutdownStatus, StreamLimits,
};

/// NV12 每像素位数
const NV12_BITS_PER_PIXEL: u64 = 12;

/// 控制消息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    /// 新流开始, 清空之前的全部状态
    StartOfStream,
    /// 流结束, 不再有输入
    EndOfStream {
        /// 流编号, 必须为 0
        stream_id: u32,
    },
    /// 停止接收输入, 直到已有输出全部被取走
    Drain,
    /// 丢弃所有待输出的采样
    Flush,
    /// 宿主即将开始推流
    BeginStreaming,
    /// 宿主结束推流
    EndStreaming,
    /// 宿主标记
    Marker(u64),
}

/// 变换状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformState {
    /// 类型尚未协商完成
    Idle,
    /// 输入输出类型均已提交
    TypesNegotiated,
    /// 正在推流
    Streaming,
    /// 排空中, 拒绝输入
    Draining,
    /// 类型变更中, 拒绝输入
    FormatChanging,
    /// 已关闭
    Shutdown,
}

impl fmt::Display for TransformState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::TypesNegotiated => "types-negotiated",
            Self::Streaming => "streaming",
            Self::Draining => "draining",
            Self::FormatChanging => "format-changing",
            Self::Shutdown => "shutdown",
        };
        write!(f, "{name}")
    }
}

/// 推流阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamMode {
    Idle,
    TypesNegotiated,
    Streaming,
}

/// 状态锁保护的控制状态
struct ControlState {
    negotiator: TypeNegotiator,
    mode: StreamMode,
    draining: bool,
    format_changing: bool,
    shutdown: bool,
}

impl ControlState {
    fn check_shutdown(&self) -> MftResult<()> {
        if self.shutdown {
            return Err(MftError::Shutdown);
        }
        Ok(())
    }

    /// 类型提交或清除后更新推流阶段
    fn refresh_mode(&mut self) {
        if self.mode == StreamMode::Streaming {
            return;
        }
        let negotiated = self.negotiator.input().is_some() && self.negotiator.output().is_some();
        self.mode = if negotiated {
            StreamMode::TypesNegotiated
        } else {
            StreamMode::Idle
        };
    }
}

/// 会话槽: 唯一的解码会话与复用的暂存数据包
struct SessionSlot {
    session: Option<DecodeSession>,
    scratch: Packet,
}

impl SessionSlot {
    fn has_samples(&self) -> bool {
        self.session.as_ref().is_some_and(DecodeSession::has_samples)
    }
}

/// 变换控制器
///
/// 单输入单输出流, 流编号固定为 0.
pub struct TransformController {
    registry: Arc<CodecRegistry>,
    config: TransformConfig,
    state: Mutex<ControlState>,
    slot: Mutex<SessionSlot>,
}

impl TransformController {
    /// 创建控制器
    pub fn new(registry: Arc<CodecRegistry>, config: TransformConfig) -> Self {
        Self {
            registry,
            config,
            state: Mutex::new(ControlState {
                negotiator: TypeNegotiator::new(),
                mode: StreamMode::Idle,
                draining: false,
                format_changing: false,
                shutdown: false,
            }),
            slot: Mutex::new(SessionSlot {
                session: None,
                scratch: Packet::empty(),
            }),
        }
    }

    /// 使用默认配置创建控制器
    pub fn with_registry(registry: Arc<CodecRegistry>) -> Self {
        Self::new(registry, TransformConfig::default())
    }

    /// 当前配置
    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    fn lock_state(&self) -> MftResult<MutexGuard<'_, ControlState>> {
        self.state
            .lock()
            .map_err(|_| MftError::Internal("状态锁已中毒".into()))
    }

    fn lock_slot(&self) -> MftResult<MutexGuard<'_, SessionSlot>> {
        self.slot
            .lock()
            .map_err(|_| MftError::Internal("会话槽锁已中毒".into()))
    }

    fn check_stream(stream_id: u32) -> MftResult<()> {
        if stream_id != 0 {
            return Err(MftError::InvalidStreamNumber(stream_id));
        }
        Ok(())
    }

    /// 检查流编号, 获取状态锁并检查关闭状态
    fn enter(&self, stream_id: u32) -> MftResult<MutexGuard<'_, ControlState>> {
        Self::check_stream(stream_id)?;
        let st = self.lock_state()?;
        st.check_shutdown()?;
        Ok(st)
    }

    // ========================
    // 类型协商
    // ========================

    /// 设置输入类型, `None` 表示清除
    pub fn set_input_type(
        &self,
        stream_id: u32,
        descriptor: Option<&FormatDescriptor>,
        test_only: bool,
    ) -> MftResult<()> {
        let mut st = self.enter(stream_id)?;
        if st.negotiator.set_input(descriptor, test_only)? {
            self.on_type_committed(&mut st)?;
        }
        st.refresh_mode();
        Ok(())
    }

    /// 设置输出类型, `None` 表示清除
    pub fn set_output_type(
        &self,
        stream_id: u32,
        descriptor: Option<&FormatDescriptor>,
        test_only: bool,
    ) -> MftResult<()> {
        let mut st = self.enter(stream_id)?;
        if st.negotiator.set_output(descriptor, test_only)? {
            self.on_type_committed(&mut st)?;
        }
        st.refresh_mode();
        Ok(())
    }

    /// 会话存活时提交新类型, 需要在输出排空后重建会话
    fn on_type_committed(&self, st: &mut ControlState) -> MftResult<()> {
        let slot = self.lock_slot()?;
        if slot.session.is_some() && !st.format_changing {
            debug!("会话运行中提交了新类型, 进入格式变更状态");
            st.format_changing = true;
        }
        Ok(())
    }

    /// 枚举输入候选类型
    pub fn input_available_type(&self, stream_id: u32, index: usize) -> MftResult<FormatDescriptor> {
        self.enter(stream_id)?.negotiator.input_candidate(index)
    }

    /// 枚举输出候选类型
    pub fn output_available_type(
        &self,
        stream_id: u32,
        index: usize,
    ) -> MftResult<FormatDescriptor> {
        self.enter(stream_id)?.negotiator.output_candidate(index)
    }

    /// 当前输入类型
    pub fn input_current_type(&self, stream_id: u32) -> MftResult<FormatDescriptor> {
        self.enter(stream_id)?
            .negotiator
            .input()
            .cloned()
            .ok_or(MftError::TypeNotSet)
    }

    /// 当前输出类型
    pub fn output_current_type(&self, stream_id: u32) -> MftResult<FormatDescriptor> {
        self.enter(stream_id)?
            .negotiator
            .output()
            .cloned()
            .ok_or(MftError::TypeNotSet)
    }

    // ========================
    // 查询
    // ========================

    /// 输入流信息
    pub fn input_stream_info(&self, stream_id: u32) -> MftResult<InputStreamInfo> {
        let _st = self.enter(stream_id)?;
        Ok(InputStreamInfo {
            max_latency: 0,
            flags: InputStreamFlags::WHOLE_SAMPLES
                | InputStreamFlags::SINGLE_SAMPLE_PER_BUFFER
                | InputStreamFlags::DOES_NOT_ADDREF,
            size: 0,
            max_lookahead: 0,
            alignment: 0,
        })
    }

    /// 输出流信息
    pub fn output_stream_info(&self, stream_id: u32) -> MftResult<OutputStreamInfo> {
        let st = self.enter(stream_id)?;
        let output = st.negotiator.output().ok_or(MftError::TypeNotSet)?;
        match output.kind {
            MediaKind::Video => {
                let (w, h) = output.frame_size().ok_or_else(|| {
                    MftError::InvalidMediaType("视频输出类型缺少帧尺寸".into())
                })?;
                let size = u64::from(w) * u64::from(h) * NV12_BITS_PER_PIXEL / 8;
                Ok(OutputStreamInfo {
                    flags: OutputStreamFlags::WHOLE_SAMPLES
                        | OutputStreamFlags::SINGLE_SAMPLE_PER_BUFFER
                        | OutputStreamFlags::FIXED_SAMPLE_SIZE,
                    size: u32::try_from(size).map_err(|_| {
                        MftError::InvalidMediaType(format!("帧尺寸过大: {w}x{h}"))
                    })?,
                    alignment: 0,
                })
            }
            MediaKind::Audio => Ok(OutputStreamInfo {
                flags: OutputStreamFlags::WHOLE_SAMPLES | OutputStreamFlags::PROVIDES_SAMPLES,
                size: self.config.audio_output_buffer_size,
                alignment: 0,
            }),
        }
    }

    /// 流数量上下限, 固定为单输入单输出
    pub fn stream_limits(&self) -> MftResult<StreamLimits> {
        self.lock_state()?.check_shutdown()?;
        Ok(StreamLimits {
            input_min: 1,
            input_max: 1,
            output_min: 1,
            output_max: 1,
        })
    }

    /// 当前流数量 (输入, 输出)
    pub fn stream_count(&self) -> MftResult<(u32, u32)> {
        self.lock_state()?.check_shutdown()?;
        Ok((1, 1))
    }

    /// 流编号固定为 0, 不提供枚举
    pub fn stream_ids(&self) -> MftResult<(Vec<u32>, Vec<u32>)> {
        self.lock_state()?.check_shutdown()?;
        Err(MftError::NotImplemented("流编号固定为 0".into()))
    }

    /// 输入状态
    pub fn input_status(&self, stream_id: u32) -> MftResult<InputStatusFlags> {
        let st = self.enter(stream_id)?;
        if st.negotiator.input().is_none() {
            return Err(MftError::TypeNotSet);
        }
        let slot = self.lock_slot()?;
        let pending_change = slot
            .session
            .as_ref()
            .is_some_and(DecodeSession::has_format_change);
        if st.draining || st.format_changing || pending_change {
            return Ok(InputStatusFlags::empty());
        }
        Ok(InputStatusFlags::ACCEPT_DATA)
    }

    /// 输出状态
    pub fn output_status(&self) -> MftResult<OutputStatusFlags> {
        let st = self.lock_state()?;
        st.check_shutdown()?;
        if st.negotiator.output().is_none() {
            return Err(MftError::TypeNotSet);
        }
        if self.lock_slot()?.has_samples() {
            return Ok(OutputStatusFlags::SAMPLE_READY);
        }
        Ok(OutputStatusFlags::empty())
    }

    /// 当前状态
    ///
    /// 关闭后仍可调用.
    pub fn state(&self) -> MftResult<TransformState> {
        let st = self.lock_state()?;
        Ok(if st.shutdown {
            TransformState::Shutdown
        } else if st.format_changing {
            TransformState::FormatChanging
        } else if st.draining {
            TransformState::Draining
        } else {
            match st.mode {
                StreamMode::Idle => TransformState::Idle,
                StreamMode::TypesNegotiated => TransformState::TypesNegotiated,
                StreamMode::Streaming => TransformState::Streaming,
            }
        })
    }

    // ========================
    // 控制
    // ========================

    /// 处理控制消息, 未识别的消息直接忽略
    pub fn process_message(&self, message: ControlMessage) -> MftResult<()> {
        let mut st = self.lock_state()?;
        st.check_shutdown()?;
        match message {
            ControlMessage::StartOfStream => {
                let mut slot = self.lock_slot()?;
                if let Some(session) = slot.session.as_mut() {
                    session.flush()?;
                }
                // 队列已清空, 排空与格式变更随之结束
                Self::evaluate_edges(&mut st, &mut slot);
                st.mode = StreamMode::Streaming;
                debug!("流开始");
            }
            ControlMessage::EndOfStream { stream_id } => {
                Self::check_stream(stream_id)?;
                if st.mode == StreamMode::Streaming {
                    st.mode = StreamMode::Idle;
                    st.refresh_mode();
                    debug!("流结束");
                }
            }
            ControlMessage::Drain => {
                if let Some(session) = self.lock_slot()?.session.as_mut() {
                    session.flush_input()?;
                    st.draining = true;
                    debug!("开始排空, 剩余 {} 个采样", session.queue_len());
                }
            }
            ControlMessage::Flush => {
                let mut slot = self.lock_slot()?;
                if let Some(session) = slot.session.as_mut() {
                    session.flush()?;
                }
                Self::evaluate_edges(&mut st, &mut slot);
            }
            ControlMessage::BeginStreaming
            | ControlMessage::EndStreaming
            | ControlMessage::Marker(_) => {}
        }
        Ok(())
    }

    /// 推入一个压缩采样
    ///
    /// `flags` 必须为 0. 空负载直接接受. 第一次推入时按已协商的类型创建解码会话.
    pub fn process_input(
        &self,
        stream_id: u32,
        sample: &InputSample,
        flags: u32,
    ) -> MftResult<InputStatus> {
        Self::check_stream(stream_id)?;
        if flags != 0 {
            return Err(MftError::InvalidArgument(format!(
                "输入标志必须为 0, 实际为 {flags:#x}"
            )));
        }

        let st = self.lock_state()?;
        st.check_shutdown()?;
        if sample.data.is_empty() {
            return Ok(InputStatus::Accepted);
        }
        if st.draining || st.format_changing {
            warn!(
                "拒绝输入: draining={}, format_changing={}",
                st.draining, st.format_changing
            );
            return Ok(InputStatus::NotAccepting);
        }

        let mut slot = self.lock_slot()?;
        if slot.session.is_none() {
            let input = st.negotiator.input().ok_or(MftError::TypeNotSet)?;
            let output = st.negotiator.output().ok_or(MftError::TypeNotSet)?;
            slot.session = Some(DecodeSession::initialize(
                Arc::clone(&self.registry),
                input,
                output,
            )?);
        }
        drop(st);

        let SessionSlot { session, scratch } = &mut *slot;
        scratch.fill_from(&sample.data, sample.time, sample.duration)?;
        let session = session
            .as_mut()
            .ok_or_else(|| MftError::Internal("解码会话缺失".into()))?;
        let status = InputStatus::from(session.decode(scratch)?);
        if status == InputStatus::NotAccepting {
            warn!("有未读取的格式变更, 数据包未被消费");
        }
        Ok(status)
    }

    /// 拉取一个输出采样
    ///
    /// `buffers` 必须恰好包含一个流编号为 0 的输出槽. 槽中已有采样时把数据拷入
    /// 调用方缓冲区, 长度不一致时按较短者截断.
    pub fn process_output(&self, buffers: &mut [OutputDataBuffer]) -> MftResult<OutputStatus> {
        if buffers.len() != 1 {
            return Err(MftError::InvalidArgument(format!(
                "需要恰好 1 个输出槽, 实际为 {}",
                buffers.len()
            )));
        }
        let buffer = &mut buffers[0];
        Self::check_stream(buffer.stream_id)?;

        let mut st = self.lock_state()?;
        st.check_shutdown()?;
        let mut slot = self.lock_slot()?;

        let status = self.deliver(&mut st, &mut slot, buffer);
        Self::evaluate_edges(&mut st, &mut slot);
        status
    }

    fn deliver(
        &self,
        st: &mut ControlState,
        slot: &mut SessionSlot,
        buffer: &mut OutputDataBuffer,
    ) -> MftResult<OutputStatus> {
        let Some(session) = slot.session.as_mut() else {
            return Ok(OutputStatus::NeedMoreInput);
        };

        if let Some(changed) = session.take_format_change() {
            debug!("输出格式变更, 建议输出类型: {changed}");
            st.negotiator.suggest_output(changed);
            st.negotiator.clear_output();
            buffer.format_change = true;
            return Ok(OutputStatus::StreamChange);
        }

        let Some(pending) = session.pop_sample() else {
            return Ok(OutputStatus::NeedMoreInput);
        };
        match buffer.sample.as_mut() {
            None => buffer.sample = Some(pending.into()),
            Some(dst) => {
                let n = pending.data.len().min(dst.data.len());
                if pending.data.len() != dst.data.len() && self.config.log_truncation {
                    warn!(
                        "输出长度不一致, 按 {n} 字节截断 (采样 {} 字节, 缓冲区 {} 字节)",
                        pending.data.len(),
                        dst.data.len()
                    );
                }
                dst.data[..n].copy_from_slice(&pending.data[..n]);
                dst.data.truncate(n);
                dst.time = pending.time;
                dst.duration = pending.duration;
            }
        }
        Ok(OutputStatus::Delivered)
    }

    /// 按当前队列状态检查排空结束与格式变更重建
    fn evaluate_edges(st: &mut ControlState, slot: &mut SessionSlot) {
        if slot.has_samples() {
            return;
        }
        if st.draining {
            st.draining = false;
            debug!("排空完成, 恢复接收输入");
        }
        if st.format_changing {
            slot.session = None;
            st.format_changing = false;
            debug!("输出已排空, 丢弃解码会话, 下次推入时按新类型重建");
        }
    }

    // ========================
    // 关闭
    // ========================

    /// 关闭变换, 释放会话与类型; 重复调用无副作用
    pub fn shutdown(&self) -> MftResult<()> {
        let mut st = self.lock_state()?;
        if st.shutdown {
            return Ok(());
        }
        st.shutdown = true;
        st.negotiator.reset();
        st.draining = false;
        st.format_changing = false;
        self.lock_slot()?.session = None;
        debug!("变换已关闭");
        Ok(())
    }

    /// 关闭状态, 未关闭时返回 `InvalidArgument`
    pub fn shutdown_status(&self) -> MftResult<ShutdownStatus> {
        if self.lock_state()?.shutdown {
            return Ok(ShutdownStatus::Completed);
        }
        Err(MftError::InvalidArgument("变换尚未关闭".into()))
    }
}
