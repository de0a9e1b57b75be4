//! 编解码器标识符.
//!
//! 与容器无关地标识一种解码算法, 并负责从协商得到的子类型翻译过来.

use std::fmt;

use mft_core::{MediaKind, Subtype};

/// 编解码器标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecId {
    // ========================
    // 视频
    // ========================
    /// H.264 / AVC
    H264,
    /// H.265 / HEVC
    H265,
    /// VP8
    Vp8,
    /// VP9
    Vp9,
    /// MPEG-4 Part 2
    Mpeg4,
    /// Theora
    Theora,
    /// 未压缩视频
    RawVideo,

    // ========================
    // 音频
    // ========================
    /// AAC
    Aac,
    /// MP3
    Mp3,
    /// Opus
    Opus,
    /// Vorbis
    Vorbis,
    /// FLAC
    Flac,
    /// PCM 有符号 16 位小端
    PcmS16le,
    /// PCM 32 位浮点小端
    PcmF32le,
}

impl CodecId {
    /// 所属媒体类别
    pub const fn media_kind(&self) -> MediaKind {
        match self {
            Self::H264
            | Self::H265
            | Self::Vp8
            | Self::Vp9
            | Self::Mpeg4
            | Self::Theora
            | Self::RawVideo => MediaKind::Video,
            Self::Aac
            | Self::Mp3
            | Self::Opus
            | Self::Vorbis
            | Self::Flac
            | Self::PcmS16le
            | Self::PcmF32le => MediaKind::Audio,
        }
    }

    /// 短名称
    pub const fn name(&self) -> &'static str {
        match self {
            Self::H264 => "h264",
            Self::H265 => "hevc",
            Self::Vp8 => "vp8",
            Self::Vp9 => "vp9",
            Self::Mpeg4 => "mpeg4",
            Self::Theora => "theora",
            Self::RawVideo => "rawvideo",
            Self::Aac => "aac",
            Self::Mp3 => "mp3",
            Self::Opus => "opus",
            Self::Vorbis => "vorbis",
            Self::Flac => "flac",
            Self::PcmS16le => "pcm_s16le",
            Self::PcmF32le => "pcm_f32le",
        }
    }

    /// 从输入子类型翻译, 输出格式 (float/nv12) 没有对应的解码器
    pub const fn from_subtype(subtype: Subtype) -> Option<Self> {
        Some(match subtype {
            Subtype::Pcm => Self::PcmS16le,
            Subtype::FloatPcm => Self::PcmF32le,
            Subtype::Vorbis => Self::Vorbis,
            Subtype::Flac => Self::Flac,
            Subtype::Opus => Self::Opus,
            Subtype::Mp3 => Self::Mp3,
            Subtype::Aac => Self::Aac,
            Subtype::I420 => Self::RawVideo,
            Subtype::H264 => Self::H264,
            Subtype::Hevc => Self::H265,
            Subtype::Vp8 => Self::Vp8,
            Subtype::Vp9 => Self::Vp9,
            Subtype::Mpeg4 => Self::Mpeg4,
            Subtype::Theora => Self::Theora,
            Subtype::Float | Subtype::Nv12 => return None,
        })
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
