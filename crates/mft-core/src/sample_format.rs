//! 音频采样格式.

use std::fmt;

/// 音频采样格式
///
/// - 交错: 所有声道的采样点交替排列, 如 LRLRLR...
/// - 平面: 每个声道独立存储一个平面, 如 LLL...RRR...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// 未指定
    None,

    // ========================
    // 交错格式
    // ========================
    /// 无符号 8 位整数
    U8,
    /// 有符号 16 位整数
    S16,
    /// 有符号 32 位整数
    S32,
    /// 32 位浮点
    F32,

    // ========================
    // 平面格式
    // ========================
    /// 有符号 16 位整数, 平面
    S16p,
    /// 有符号 32 位整数, 平面
    S32p,
    /// 32 位浮点, 平面
    F32p,
}

impl SampleFormat {
    /// 每个采样点占用的字节数
    pub const fn bytes_per_sample(&self) -> u32 {
        match self {
            Self::None => 0,
            Self::U8 => 1,
            Self::S16 | Self::S16p => 2,
            Self::S32 | Self::S32p | Self::F32 | Self::F32p => 4,
        }
    }

    /// 是否为平面格式
    pub const fn is_planar(&self) -> bool {
        matches!(self, Self::S16p | Self::S32p | Self::F32p)
    }

    /// 对应的交错格式
    pub const fn to_interleaved(&self) -> Self {
        match self {
            Self::S16p => Self::S16,
            Self::S32p => Self::S32,
            Self::F32p => Self::F32,
            other => *other,
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::U8 => "u8",
            Self::S16 => "s16",
            Self::S32 => "s32",
            Self::F32 => "flt",
            Self::S16p => "s16p",
            Self::S32p => "s32p",
            Self::F32p => "fltp",
        };
        write!(f, "{name}")
    }
}
