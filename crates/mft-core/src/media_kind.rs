//! 媒体流类别与子类型 (编码格式标识).
//!
//! 子类型对应宿主管线里 "主类型 + 子类型" 的组合, 输入侧是压缩编码,
//! 输出侧是解码后的原始格式.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 媒体流类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// 音频流
    Audio,
    /// 视频流
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Audio => "音频",
            Self::Video => "视频",
        };
        write!(f, "{name}")
    }
}

/// 编码格式标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subtype {
    // ========================
    // 音频输入
    // ========================
    /// PCM 有符号 16 位小端
    Pcm,
    /// PCM 32 位浮点小端
    FloatPcm,
    /// Vorbis
    Vorbis,
    /// FLAC
    Flac,
    /// Opus
    Opus,
    /// MP3
    Mp3,
    /// AAC
    Aac,

    // ========================
    // 视频输入
    // ========================
    /// 原始 YUV 4:2:0 平面 (I420)
    I420,
    /// H.264 / AVC
    H264,
    /// H.265 / HEVC
    Hevc,
    /// VP8
    Vp8,
    /// VP9
    Vp9,
    /// MPEG-4 Part 2
    Mpeg4,
    /// Theora
    Theora,

    // ========================
    // 解码输出
    // ========================
    /// 32 位浮点交错音频
    Float,
    /// NV12: Y 平面 + UV 交错
    Nv12,
}

impl Subtype {
    /// 子类型所属的媒体类别
    pub const fn kind(&self) -> MediaKind {
        match self {
            Self::Pcm
            | Self::FloatPcm
            | Self::Vorbis
            | Self::Flac
            | Self::Opus
            | Self::Mp3
            | Self::Aac
            | Self::Float => MediaKind::Audio,
            Self::I420
            | Self::H264
            | Self::Hevc
            | Self::Vp8
            | Self::Vp9
            | Self::Mpeg4
            | Self::Theora
            | Self::Nv12 => MediaKind::Video,
        }
    }

    /// 短名称
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Pcm => "pcm",
            Self::FloatPcm => "float_pcm",
            Self::Vorbis => "vorbis",
            Self::Flac => "flac",
            Self::Opus => "opus",
            Self::Mp3 => "mp3",
            Self::Aac => "aac",
            Self::I420 => "i420",
            Self::H264 => "h264",
            Self::Hevc => "hevc",
            Self::Vp8 => "vp8",
            Self::Vp9 => "vp9",
            Self::Mpeg4 => "mpeg4",
            Self::Theora => "theora",
            Self::Float => "float",
            Self::Nv12 => "nv12",
        }
    }
}

impl fmt::Display for Subtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtype_kind() {
        assert_eq!(Subtype::Vorbis.kind(), MediaKind::Audio);
        assert_eq!(Subtype::Float.kind(), MediaKind::Audio);
        assert_eq!(Subtype::H264.kind(), MediaKind::Video);
        assert_eq!(Subtype::Nv12.kind(), MediaKind::Video);
    }
}
