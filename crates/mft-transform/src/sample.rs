//! 推拉接口上流动的采样与状态.
//!
//! 需要更多输入、暂不接收、流格式变更都是正常的流控结果, 以枚举返回而不是错误.

use bytes::Bytes;
use mft_core::ResultCode;

/// 解码完成、等待拉取的采样
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSample {
    /// 输出字节 (交错 f32 音频或 NV12 图像)
    pub data: Vec<u8>,
    /// 显示时间 (100ns)
    pub time: i64,
    /// 时长 (100ns)
    pub duration: i64,
}

/// 调用方推入的压缩采样
#[derive(Debug, Clone, Default)]
pub struct InputSample {
    /// 压缩数据
    pub data: Bytes,
    /// 显示时间 (100ns)
    pub time: i64,
    /// 时长 (100ns), 未知时为 0
    pub duration: i64,
}

impl InputSample {
    /// 创建输入采样
    pub fn new(data: impl Into<Bytes>, time: i64, duration: i64) -> Self {
        Self {
            data: data.into(),
            time,
            duration,
        }
    }
}

/// 交给调用方的输出采样
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputSample {
    /// 输出字节
    pub data: Vec<u8>,
    /// 显示时间 (100ns)
    pub time: i64,
    /// 时长 (100ns)
    pub duration: i64,
}

impl OutputSample {
    /// 预分配指定长度的输出缓冲区
    pub fn with_capacity(len: usize) -> Self {
        Self {
            data: vec![0; len],
            time: 0,
            duration: 0,
        }
    }
}

impl From<PendingSample> for OutputSample {
    fn from(s: PendingSample) -> Self {
        Self {
            data: s.data,
            time: s.time,
            duration: s.duration,
        }
    }
}

/// 拉取时的输出槽
///
/// `sample` 为 `None` 时由变换直接交出采样; 为 `Some` 时把数据拷入调用方缓冲区.
#[derive(Debug, Clone, Default)]
pub struct OutputDataBuffer {
    /// 流编号, 必须为 0
    pub stream_id: u32,
    /// 采样
    pub sample: Option<OutputSample>,
    /// 输出格式已变更, 需要重新协商输出类型
    pub format_change: bool,
}

/// 解码一个数据包的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// 至少有一个采样进入输出队列
    Queued,
    /// 引擎需要更多数据包
    NeedMoreInput,
    /// 有未读取的格式变更, 数据包未被消费
    NotAccepting,
}

/// 推入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputStatus {
    /// 数据包已被消费
    Accepted,
    /// 引擎需要更多数据包, 尚无输出
    NeedMoreInput,
    /// 正在排空或变更格式, 数据包未被消费
    NotAccepting,
}

/// 拉取结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStatus {
    /// 已交出一个采样
    Delivered,
    /// 输出队列为空
    NeedMoreInput,
    /// 输出格式变更, 需要重新协商
    StreamChange,
}

impl From<DecodeStatus> for InputStatus {
    fn from(s: DecodeStatus) -> Self {
        match s {
            DecodeStatus::Queued => Self::Accepted,
            DecodeStatus::NeedMoreInput => Self::NeedMoreInput,
            DecodeStatus::NotAccepting => Self::NotAccepting,
        }
    }
}

impl InputStatus {
    /// 宿主结果码
    pub fn code(&self) -> ResultCode {
        match self {
            Self::Accepted => ResultCode::Ok,
            Self::NeedMoreInput => ResultCode::NeedMoreInput,
            Self::NotAccepting => ResultCode::NotAccepting,
        }
    }
}

impl OutputStatus {
    /// 宿主结果码
    pub fn code(&self) -> ResultCode {
        match self {
            Self::Delivered => ResultCode::Ok,
            Self::NeedMoreInput => ResultCode::NeedMoreInput,
            Self::StreamChange => ResultCode::StreamChangePending,
        }
    }
}
