//! 媒体格式描述符.
//!
//! 描述一条流的类别、编码格式和一组命名属性. 描述符一旦被协商接受就不再修改,
//! 存储方总是保存自己的副本, 调用方的原值在设置调用返回后即可释放.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::media_kind::{MediaKind, Subtype};

/// 属性名
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKey {
    // ========================
    // 音频
    // ========================
    /// 声道数
    ChannelCount,
    /// 采样率 (Hz)
    SampleRate,
    /// 每采样位数
    BitsPerSample,
    /// 每采样有效位数
    ValidBitsPerSample,
    /// 声道位掩码
    ChannelMask,
    /// 平均每秒字节数
    AvgBytesPerSecond,
    /// 块对齐 (字节)
    BlockAlignment,
    /// 每块采样数
    SamplesPerBlock,

    // ========================
    // 视频
    // ========================
    /// 帧尺寸 (宽, 高)
    FrameSize,
    /// 帧率 (分子/分母)
    FrameRate,
    /// 像素宽高比
    PixelAspectRatio,
    /// 平均码率 (bit/s)
    AvgBitrate,
    /// 隔行模式
    InterlaceMode,
    /// 旋转角度
    VideoRotation,

    // ========================
    // 通用
    // ========================
    /// 所有采样均可独立解码
    AllSamplesIndependent,
    /// 容器导出的编解码头部数据
    UserData,
}

/// 属性值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeValue {
    /// 32 位无符号整数
    U32(u32),
    /// 64 位无符号整数
    U64(u64),
    /// 尺寸
    Size { width: u32, height: u32 },
    /// 比值
    Ratio { num: u32, den: u32 },
    /// 字节块
    Blob(Vec<u8>),
}

/// 媒体格式描述符
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatDescriptor {
    /// 流类别
    pub kind: MediaKind,
    /// 编码格式
    pub codec: Subtype,
    /// 命名属性
    #[serde(default)]
    pub attributes: BTreeMap<AttributeKey, AttributeValue>,
}

impl FormatDescriptor {
    /// 创建不带属性的描述符
    pub fn new(kind: MediaKind, codec: Subtype) -> Self {
        Self {
            kind,
            codec,
            attributes: BTreeMap::new(),
        }
    }

    /// 创建带声道数与采样率的音频描述符
    pub fn audio(codec: Subtype, channels: u32, sample_rate: u32) -> Self {
        Self::new(MediaKind::Audio, codec)
            .with(AttributeKey::ChannelCount, AttributeValue::U32(channels))
            .with(AttributeKey::SampleRate, AttributeValue::U32(sample_rate))
    }

    /// 创建带帧尺寸的视频描述符
    pub fn video(codec: Subtype, width: u32, height: u32) -> Self {
        Self::new(MediaKind::Video, codec).with(
            AttributeKey::FrameSize,
            AttributeValue::Size { width, height },
        )
    }

    /// 追加属性 (构建器形式)
    pub fn with(mut self, key: AttributeKey, value: AttributeValue) -> Self {
        self.attributes.insert(key, value);
        self
    }

    /// 设置属性, 已存在时覆盖
    pub fn set(&mut self, key: AttributeKey, value: AttributeValue) {
        self.attributes.insert(key, value);
    }

    /// 读取属性
    pub fn get(&self, key: AttributeKey) -> Option<&AttributeValue> {
        self.attributes.get(&key)
    }

    /// 是否包含属性
    pub fn contains(&self, key: AttributeKey) -> bool {
        self.attributes.contains_key(&key)
    }

    /// 以 u32 读取属性
    pub fn u32(&self, key: AttributeKey) -> Option<u32> {
        match self.get(key)? {
            AttributeValue::U32(v) => Some(*v),
            AttributeValue::U64(v) => u32::try_from(*v).ok(),
            _ => None,
        }
    }

    /// 以 u64 读取属性
    pub fn u64(&self, key: AttributeKey) -> Option<u64> {
        match self.get(key)? {
            AttributeValue::U32(v) => Some(u64::from(*v)),
            AttributeValue::U64(v) => Some(*v),
            _ => None,
        }
    }

    /// 以 (宽, 高) 读取属性
    pub fn size(&self, key: AttributeKey) -> Option<(u32, u32)> {
        match self.get(key)? {
            AttributeValue::Size { width, height } => Some((*width, *height)),
            _ => None,
        }
    }

    /// 以 (分子, 分母) 读取属性
    pub fn ratio(&self, key: AttributeKey) -> Option<(u32, u32)> {
        match self.get(key)? {
            AttributeValue::Ratio { num, den } => Some((*num, *den)),
            _ => None,
        }
    }

    /// 以字节块读取属性
    pub fn blob(&self, key: AttributeKey) -> Option<&[u8]> {
        match self.get(key)? {
            AttributeValue::Blob(b) => Some(b.as_slice()),
            _ => None,
        }
    }

    /// 帧尺寸
    pub fn frame_size(&self) -> Option<(u32, u32)> {
        self.size(AttributeKey::FrameSize)
    }
}

impl fmt::Display for FormatDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.codec)?;
        match self.kind {
            MediaKind::Audio => {
                if let (Some(ch), Some(rate)) = (
                    self.u32(AttributeKey::ChannelCount),
                    self.u32(AttributeKey::SampleRate),
                ) {
                    write!(f, " {ch}ch {rate}Hz")?;
                }
            }
            MediaKind::Video => {
                if let Some((w, h)) = self.frame_size() {
                    write!(f, " {w}x{h}")?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_描述符属性读取() {
        let d = FormatDescriptor::audio(Subtype::Vorbis, 2, 48000)
            .with(AttributeKey::UserData, AttributeValue::Blob(vec![1, 2, 3]));
        assert_eq!(d.u32(AttributeKey::ChannelCount), Some(2));
        assert_eq!(d.u64(AttributeKey::SampleRate), Some(48000));
        assert_eq!(d.blob(AttributeKey::UserData), Some(&[1u8, 2, 3][..]));
        // 类型不符时读不到
        assert_eq!(d.size(AttributeKey::ChannelCount), None);
        assert_eq!(d.to_string(), "音频/vorbis 2ch 48000Hz");
    }

    #[test]
    fn test_描述符副本互不影响() {
        let original = FormatDescriptor::video(Subtype::H264, 1920, 1080);
        let mut copy = original.clone();
        copy.set(
            AttributeKey::FrameSize,
            AttributeValue::Size {
                width: 1920,
                height: 1088,
            },
        );
        assert_eq!(original.frame_size(), Some((1920, 1080)));
        assert_eq!(copy.frame_size(), Some((1920, 1088)));
    }

    #[test]
    fn test_描述符从_json_加载() {
        let json = r#"{
            "kind": "video",
            "codec": "h264",
            "attributes": {
                "frame_size": { "size": { "width": 640, "height": 360 } },
                "frame_rate": { "ratio": { "num": 30000, "den": 1001 } }
            }
        }"#;
        let d: FormatDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(d.kind, MediaKind::Video);
        assert_eq!(d.frame_size(), Some((640, 360)));
        assert_eq!(d.ratio(AttributeKey::FrameRate), Some((30000, 1001)));
    }
}
