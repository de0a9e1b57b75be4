//! 媒体类型协商.
//!
//! 两阶段协议: 先提交输入类型, 再提交输出类型. 所有校验都没有副作用,
//! `test_only` 提交只做校验. 格式变更后可以放入一个建议输出类型,
//! 输出候选枚举会原样返回它, 直到下一次提交输出类型.

use mft_core::{
    AttributeKey, AttributeValue, ChannelLayout, FormatDescriptor, MediaKind, MftError,
    MftResult, Subtype,
};

/// 支持的音频输入格式
pub const INPUT_AUDIO_TYPES: [Subtype; 7] = [
    Subtype::Pcm,
    Subtype::FloatPcm,
    Subtype::Vorbis,
    Subtype::Flac,
    Subtype::Opus,
    Subtype::Mp3,
    Subtype::Aac,
];

/// 支持的视频输入格式
pub const INPUT_VIDEO_TYPES: [Subtype; 7] = [
    Subtype::I420,
    Subtype::H264,
    Subtype::Hevc,
    Subtype::Vp8,
    Subtype::Vp9,
    Subtype::Mpeg4,
    Subtype::Theora,
];

/// 支持的音频输出格式
pub const OUTPUT_AUDIO_TYPES: [Subtype; 1] = [Subtype::Float];

/// 支持的视频输出格式
pub const OUTPUT_VIDEO_TYPES: [Subtype; 1] = [Subtype::Nv12];

/// 输出音频固定为 32 位浮点
const OUTPUT_BITS_PER_SAMPLE: u32 = 32;

fn input_types(kind: MediaKind) -> &'static [Subtype] {
    match kind {
        MediaKind::Audio => &INPUT_AUDIO_TYPES,
        MediaKind::Video => &INPUT_VIDEO_TYPES,
    }
}

fn output_types(kind: MediaKind) -> &'static [Subtype] {
    match kind {
        MediaKind::Audio => &OUTPUT_AUDIO_TYPES,
        MediaKind::Video => &OUTPUT_VIDEO_TYPES,
    }
}

/// 类型协商器
#[derive(Debug, Clone, Default)]
pub struct TypeNegotiator {
    input: Option<FormatDescriptor>,
    output: Option<FormatDescriptor>,
    suggested_output: Option<FormatDescriptor>,
}

impl TypeNegotiator {
    /// 创建空的协商器
    pub fn new() -> Self {
        Self::default()
    }

    /// 校验输入类型
    pub fn validate_input(&self, descriptor: &FormatDescriptor) -> MftResult<()> {
        if descriptor.codec.kind() != descriptor.kind
            || !input_types(descriptor.kind).contains(&descriptor.codec)
        {
            return Err(MftError::InvalidMediaType(format!(
                "不支持的输入类型: {}/{}",
                descriptor.kind, descriptor.codec
            )));
        }
        match descriptor.kind {
            MediaKind::Audio => {
                if descriptor.u32(AttributeKey::ChannelCount).is_none() {
                    return Err(MftError::InvalidMediaType("音频输入缺少声道数".into()));
                }
                if descriptor.u32(AttributeKey::SampleRate).is_none() {
                    return Err(MftError::InvalidMediaType("音频输入缺少采样率".into()));
                }
            }
            MediaKind::Video => {
                if descriptor.frame_size().is_none() {
                    return Err(MftError::InvalidMediaType("视频输入缺少帧尺寸".into()));
                }
            }
        }
        Ok(())
    }

    /// 设置输入类型
    ///
    /// `None` 清除已提交的输入类型. 返回是否实际提交了新类型.
    pub fn set_input(
        &mut self,
        descriptor: Option<&FormatDescriptor>,
        test_only: bool,
    ) -> MftResult<bool> {
        let Some(descriptor) = descriptor else {
            self.input = None;
            return Ok(false);
        };
        self.validate_input(descriptor)?;
        if test_only {
            return Ok(false);
        }
        self.input = Some(descriptor.clone());
        Ok(true)
    }

    /// 按序号枚举输入候选: 先全部音频, 再全部视频
    pub fn input_candidate(&self, index: usize) -> MftResult<FormatDescriptor> {
        let audio = INPUT_AUDIO_TYPES.len();
        let (kind, codec) = if index < audio {
            (MediaKind::Audio, INPUT_AUDIO_TYPES[index])
        } else {
            let codec = INPUT_VIDEO_TYPES
                .get(index - audio)
                .ok_or(MftError::NoMoreTypes)?;
            (MediaKind::Video, *codec)
        };
        Ok(FormatDescriptor::new(kind, codec))
    }

    /// 校验输出类型, 要求已提交输入类型
    pub fn validate_output(&self, descriptor: &FormatDescriptor) -> MftResult<()> {
        let input = self.input.as_ref().ok_or(MftError::TypeNotSet)?;
        if descriptor.kind != input.kind {
            return Err(MftError::InvalidMediaType(format!(
                "输出类别 {} 与输入类别 {} 不一致",
                descriptor.kind, input.kind
            )));
        }
        if !output_types(descriptor.kind).contains(&descriptor.codec) {
            return Err(MftError::InvalidMediaType(format!(
                "不支持的输出类型: {}",
                descriptor.codec
            )));
        }
        Ok(())
    }

    /// 设置输出类型, 提交后清除建议输出类型
    ///
    /// `None` 清除已提交的输出类型. 返回是否实际提交了新类型.
    pub fn set_output(
        &mut self,
        descriptor: Option<&FormatDescriptor>,
        test_only: bool,
    ) -> MftResult<bool> {
        if self.input.is_none() {
            return Err(MftError::TypeNotSet);
        }
        let Some(descriptor) = descriptor else {
            self.output = None;
            return Ok(false);
        };
        self.validate_output(descriptor)?;
        if test_only {
            return Ok(false);
        }
        self.output = Some(descriptor.clone());
        self.suggested_output = None;
        Ok(true)
    }

    /// 按序号枚举输出候选
    ///
    /// 有建议输出类型时不论序号都原样返回它, 否则由输入类型推导.
    pub fn output_candidate(&self, index: usize) -> MftResult<FormatDescriptor> {
        let input = self.input.as_ref().ok_or(MftError::TypeNotSet)?;
        if let Some(suggested) = &self.suggested_output {
            return Ok(suggested.clone());
        }
        let codec = *output_types(input.kind)
            .get(index)
            .ok_or(MftError::NoMoreTypes)?;
        Ok(match input.kind {
            MediaKind::Audio => derive_audio_output(input, codec),
            MediaKind::Video => derive_video_output(input, codec),
        })
    }

    /// 放入建议输出类型
    pub fn suggest_output(&mut self, descriptor: FormatDescriptor) {
        self.suggested_output = Some(descriptor);
    }

    /// 清除已提交的输出类型, 建议输出类型保留
    pub fn clear_output(&mut self) {
        self.output = None;
    }

    /// 当前输入类型
    pub fn input(&self) -> Option<&FormatDescriptor> {
        self.input.as_ref()
    }

    /// 当前输出类型
    pub fn output(&self) -> Option<&FormatDescriptor> {
        self.output.as_ref()
    }

    /// 当前建议输出类型
    pub fn suggested_output(&self) -> Option<&FormatDescriptor> {
        self.suggested_output.as_ref()
    }

    /// 清除全部类型
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn derive_audio_output(input: &FormatDescriptor, codec: Subtype) -> FormatDescriptor {
    let mut out = FormatDescriptor::new(MediaKind::Audio, codec);
    let channels = input.u32(AttributeKey::ChannelCount).unwrap_or(0);
    let rate = input.u32(AttributeKey::SampleRate).unwrap_or(0);
    let bytes_per_sample = OUTPUT_BITS_PER_SAMPLE / 8;

    let mask = match channels {
        6 => ChannelLayout::SURROUND_5_1.mask,
        2 => ChannelLayout::STEREO.mask,
        1 => ChannelLayout::MONO.mask,
        n => ChannelLayout::from_channels(n).mask,
    };

    out.set(AttributeKey::ChannelCount, AttributeValue::U32(channels));
    out.set(AttributeKey::SampleRate, AttributeValue::U32(rate));
    out.set(
        AttributeKey::BitsPerSample,
        AttributeValue::U32(OUTPUT_BITS_PER_SAMPLE),
    );
    out.set(
        AttributeKey::ValidBitsPerSample,
        AttributeValue::U32(OUTPUT_BITS_PER_SAMPLE),
    );
    out.set(AttributeKey::ChannelMask, AttributeValue::U32(mask.bits()));
    out.set(
        AttributeKey::AvgBytesPerSecond,
        AttributeValue::U32(bytes_per_sample * channels * rate),
    );
    out.set(
        AttributeKey::BlockAlignment,
        AttributeValue::U32(bytes_per_sample * channels),
    );
    out.set(AttributeKey::AllSamplesIndependent, AttributeValue::U32(1));
    out
}

fn derive_video_output(input: &FormatDescriptor, codec: Subtype) -> FormatDescriptor {
    let mut out = FormatDescriptor::new(MediaKind::Video, codec);
    for key in [
        AttributeKey::AvgBitrate,
        AttributeKey::VideoRotation,
        AttributeKey::FrameRate,
        AttributeKey::FrameSize,
    ] {
        if let Some(value) = input.get(key) {
            out.set(key, value.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo_vorbis() -> FormatDescriptor {
        FormatDescriptor::audio(Subtype::Vorbis, 2, 48000)
    }

    #[test]
    fn test_输入校验() {
        let n = TypeNegotiator::new();
        assert!(n.validate_input(&stereo_vorbis()).is_ok());
        // 缺少采样率
        let d = FormatDescriptor::new(MediaKind::Audio, Subtype::Aac)
            .with(AttributeKey::ChannelCount, AttributeValue::U32(2));
        assert!(matches!(n.validate_input(&d), Err(MftError::InvalidMediaType(_))));
        // 类别与编码格式不一致
        let d = FormatDescriptor::video(Subtype::Vorbis, 640, 480);
        assert!(matches!(n.validate_input(&d), Err(MftError::InvalidMediaType(_))));
        // 输出格式不能作为输入
        let d = FormatDescriptor::video(Subtype::Nv12, 640, 480);
        assert!(n.validate_input(&d).is_err());
    }

    #[test]
    fn test_输入候选先音频后视频() {
        let n = TypeNegotiator::new();
        assert_eq!(n.input_candidate(0).unwrap().codec, Subtype::Pcm);
        assert_eq!(n.input_candidate(6).unwrap().codec, Subtype::Aac);
        let first_video = n.input_candidate(7).unwrap();
        assert_eq!(first_video.kind, MediaKind::Video);
        assert_eq!(first_video.codec, Subtype::I420);
        assert_eq!(n.input_candidate(13).unwrap().codec, Subtype::Theora);
        assert!(matches!(n.input_candidate(14), Err(MftError::NoMoreTypes)));
    }

    #[test]
    fn test_未设置输入时不能设置输出() {
        let mut n = TypeNegotiator::new();
        let out = FormatDescriptor::audio(Subtype::Float, 2, 48000);
        assert!(matches!(n.set_output(Some(&out), false), Err(MftError::TypeNotSet)));
        assert!(matches!(n.set_output(Some(&out), true), Err(MftError::TypeNotSet)));
        assert!(matches!(n.output_candidate(0), Err(MftError::TypeNotSet)));
    }

    #[test]
    fn test_仅测试不修改状态() {
        let mut n = TypeNegotiator::new();
        assert!(!n.set_input(Some(&stereo_vorbis()), true).unwrap());
        assert!(n.input().is_none());

        assert!(n.set_input(Some(&stereo_vorbis()), false).unwrap());
        let out = FormatDescriptor::audio(Subtype::Float, 2, 48000);
        n.set_output(Some(&out), true).unwrap();
        assert!(n.output().is_none());
        n.set_output(Some(&out), false).unwrap();
        assert_eq!(n.output(), Some(&out));
    }

    #[test]
    fn test_输出类别必须与输入一致() {
        let mut n = TypeNegotiator::new();
        n.set_input(Some(&stereo_vorbis()), false).unwrap();
        let out = FormatDescriptor::video(Subtype::Nv12, 640, 480);
        assert!(matches!(
            n.validate_output(&out),
            Err(MftError::InvalidMediaType(_))
        ));
    }

    #[test]
    fn test_推导音频输出候选() {
        let mut n = TypeNegotiator::new();
        n.set_input(Some(&FormatDescriptor::audio(Subtype::Aac, 6, 44100)), false)
            .unwrap();
        let out = n.output_candidate(0).unwrap();
        assert_eq!(out.codec, Subtype::Float);
        assert_eq!(out.u32(AttributeKey::ChannelCount), Some(6));
        assert_eq!(out.u32(AttributeKey::SampleRate), Some(44100));
        assert_eq!(out.u32(AttributeKey::BitsPerSample), Some(32));
        assert_eq!(out.u32(AttributeKey::ChannelMask), Some(0x3F));
        assert_eq!(out.u32(AttributeKey::AvgBytesPerSecond), Some(4 * 6 * 44100));
        assert_eq!(out.u32(AttributeKey::BlockAlignment), Some(24));
        assert!(matches!(n.output_candidate(1), Err(MftError::NoMoreTypes)));
    }

    #[test]
    fn test_推导视频输出候选() {
        let mut n = TypeNegotiator::new();
        let input = FormatDescriptor::video(Subtype::H264, 1280, 720)
            .with(AttributeKey::FrameRate, AttributeValue::Ratio { num: 30, den: 1 })
            .with(AttributeKey::InterlaceMode, AttributeValue::U32(2));
        n.set_input(Some(&input), false).unwrap();
        let out = n.output_candidate(0).unwrap();
        assert_eq!(out.codec, Subtype::Nv12);
        assert_eq!(out.frame_size(), Some((1280, 720)));
        assert_eq!(out.ratio(AttributeKey::FrameRate), Some((30, 1)));
        assert!(!out.contains(AttributeKey::InterlaceMode));
    }

    #[test]
    fn test_建议输出类型优先() {
        let mut n = TypeNegotiator::new();
        n.set_input(Some(&FormatDescriptor::video(Subtype::H264, 1920, 1080)), false)
            .unwrap();
        let suggested = FormatDescriptor::video(Subtype::Nv12, 1920, 1088);
        n.suggest_output(suggested.clone());
        n.clear_output();
        // 不论序号都返回建议类型
        assert_eq!(n.output_candidate(0).unwrap(), suggested);
        assert_eq!(n.output_candidate(5).unwrap(), suggested);

        n.set_output(Some(&suggested), false).unwrap();
        assert!(n.suggested_output().is_none());
        assert_eq!(n.output_candidate(0).unwrap().frame_size(), Some((1920, 1080)));
    }

    #[test]
    fn test_清除类型() {
        let mut n = TypeNegotiator::new();
        n.set_input(Some(&stereo_vorbis()), false).unwrap();
        n.set_output(Some(&FormatDescriptor::audio(Subtype::Float, 2, 48000)), false)
            .unwrap();
        n.set_output(None, false).unwrap();
        assert!(n.output().is_none());
        n.set_input(None, false).unwrap();
        assert!(n.input().is_none());
    }
}
