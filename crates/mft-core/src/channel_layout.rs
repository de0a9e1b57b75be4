//! 音频声道布局.
//!
//! 位掩码按 WAVE 扩展格式的扬声器位置排列, 可以直接写入描述符的声道掩码属性.

use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// 声道位掩码, 每个位代表一个扬声器位置
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ChannelMask: u32 {
        const FRONT_LEFT            = 1 << 0;
        const FRONT_RIGHT           = 1 << 1;
        const FRONT_CENTER          = 1 << 2;
        /// 低频效果 (LFE)
        const LOW_FREQUENCY         = 1 << 3;
        const BACK_LEFT             = 1 << 4;
        const BACK_RIGHT            = 1 << 5;
        const FRONT_LEFT_OF_CENTER  = 1 << 6;
        const FRONT_RIGHT_OF_CENTER = 1 << 7;
        const BACK_CENTER           = 1 << 8;
        const SIDE_LEFT             = 1 << 9;
        const SIDE_RIGHT            = 1 << 10;
    }
}

/// 声道布局
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelLayout {
    /// 声道数量
    pub channels: u32,
    /// 声道位掩码, 非标准布局为空
    pub mask: ChannelMask,
}

impl ChannelLayout {
    /// 单声道
    pub const MONO: Self = Self {
        channels: 1,
        mask: ChannelMask::FRONT_CENTER,
    };

    /// 立体声
    pub const STEREO: Self = Self {
        channels: 2,
        mask: ChannelMask::FRONT_LEFT.union(ChannelMask::FRONT_RIGHT),
    };

    /// 5.1 环绕声
    pub const SURROUND_5_1: Self = Self {
        channels: 6,
        mask: ChannelMask::FRONT_LEFT
            .union(ChannelMask::FRONT_RIGHT)
            .union(ChannelMask::FRONT_CENTER)
            .union(ChannelMask::LOW_FREQUENCY)
            .union(ChannelMask::BACK_LEFT)
            .union(ChannelMask::BACK_RIGHT),
    };

    /// 7.1 环绕声
    pub const SURROUND_7_1: Self = Self {
        channels: 8,
        mask: Self::SURROUND_5_1
            .mask
            .union(ChannelMask::SIDE_LEFT)
            .union(ChannelMask::SIDE_RIGHT),
    };

    /// 根据声道数创建默认布局
    pub fn from_channels(channels: u32) -> Self {
        match channels {
            1 => Self::MONO,
            2 => Self::STEREO,
            6 => Self::SURROUND_5_1,
            8 => Self::SURROUND_7_1,
            n => Self {
                channels: n,
                mask: ChannelMask::empty(),
            },
        }
    }

    /// 根据位掩码创建布局, 声道数取置位数量
    ///
    /// 掩码为空或含未知位时返回 `None`.
    pub fn from_mask(mask: u32) -> Option<Self> {
        let mask = ChannelMask::from_bits(mask)?;
        if mask.is_empty() {
            return None;
        }
        Some(Self {
            channels: mask.bits().count_ones(),
            mask,
        })
    }
}

impl fmt::Display for ChannelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::MONO => write!(f, "mono"),
            Self::STEREO => write!(f, "stereo"),
            Self::SURROUND_5_1 => write!(f, "5.1"),
            Self::SURROUND_7_1 => write!(f, "7.1"),
            _ => write!(f, "{}ch", self.channels),
        }
    }
}
