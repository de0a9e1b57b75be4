//! 流信息与状态标志.

use bitflags::bitflags;

bitflags! {
    /// 输入流特性
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct InputStreamFlags: u32 {
        /// 每个采样都是完整单元
        const WHOLE_SAMPLES            = 0x1;
        /// 每个缓冲区只含一个采样
        const SINGLE_SAMPLE_PER_BUFFER = 0x2;
        /// 采样大小固定
        const FIXED_SAMPLE_SIZE        = 0x4;
        /// 不保留输入采样的引用
        const DOES_NOT_ADDREF          = 0x100;
    }
}

bitflags! {
    /// 输出流特性
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OutputStreamFlags: u32 {
        /// 每个采样都是完整单元
        const WHOLE_SAMPLES            = 0x1;
        /// 每个缓冲区只含一个采样
        const SINGLE_SAMPLE_PER_BUFFER = 0x2;
        /// 采样大小固定
        const FIXED_SAMPLE_SIZE        = 0x4;
        /// 变换自行分配输出采样
        const PROVIDES_SAMPLES         = 0x100;
    }
}

bitflags! {
    /// 输入状态
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct InputStatusFlags: u32 {
        /// 当前可以接收输入
        const ACCEPT_DATA = 0x1;
    }
}

bitflags! {
    /// 输出状态
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OutputStatusFlags: u32 {
        /// 有可拉取的采样
        const SAMPLE_READY = 0x1;
    }
}

/// 输入流信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputStreamInfo {
    /// 最大延迟 (100ns)
    pub max_latency: i64,
    /// 特性
    pub flags: InputStreamFlags,
    /// 最小缓冲区大小, 0 表示无要求
    pub size: u32,
    /// 最大预读字节数
    pub max_lookahead: u32,
    /// 对齐要求
    pub alignment: u32,
}

/// 输出流信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputStreamInfo {
    /// 特性
    pub flags: OutputStreamFlags,
    /// 输出缓冲区大小
    pub size: u32,
    /// 对齐要求
    pub alignment: u32,
}

/// 输入/输出流数量上下限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamLimits {
    pub input_min: u32,
    pub input_max: u32,
    pub output_min: u32,
    pub output_max: u32,
}

/// 关闭状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownStatus {
    /// 已完成关闭
    Completed,
}
