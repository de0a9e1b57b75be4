//! 音频推拉流水线集成测试.
//!
//! 覆盖类型协商、排空、清空以及采样不丢失.

use std::sync::Arc;

use mft::codec::{
    AudioCodecParams, AudioFrame, CodecId, CodecParameters, CodecParamsType, Decoder, Frame,
    Packet,
};
use mft::core::{
    AttributeKey, AttributeValue, ChannelLayout, FormatDescriptor, MftError, MftResult, Rational,
    ResultCode, SampleFormat, Subtype,
};
use mft::transform::{
    ControlMessage, InputSample, InputStatus, OutputDataBuffer, OutputStatus, TransformController,
    TransformState,
};

/// 每包 480 个立体声 s16 采样
const SAMPLES_PER_PACKET: usize = 480;
const PACKET_BYTES: usize = SAMPLES_PER_PACKET * 2 * 2;
/// 10ms (100ns 单位)
const PACKET_DURATION: i64 = 100_000;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// 延迟一个数据包输出的 PCM 引擎, 模拟有解码延迟的音频编解码器
struct DelayedPcm {
    held: Option<Packet>,
    ready: Option<Frame>,
    layout: ChannelLayout,
    sample_rate: u32,
}

impl DelayedPcm {
    fn create() -> MftResult<Box<dyn Decoder>> {
        Ok(Box::new(Self {
            held: None,
            ready: None,
            layout: ChannelLayout::STEREO,
            sample_rate: 48000,
        }))
    }
}

impl Decoder for DelayedPcm {
    fn codec_id(&self) -> CodecId {
        CodecId::PcmS16le
    }

    fn name(&self) -> &str {
        "delayed_pcm"
    }

    fn open(&mut self, params: &CodecParameters) -> MftResult<()> {
        let audio = params
            .audio()
            .ok_or_else(|| MftError::InvalidArgument("需要音频参数".into()))?;
        self.layout = audio.channel_layout;
        self.sample_rate = audio.sample_rate;
        Ok(())
    }

    fn send_packet(&mut self, packet: &Packet) -> MftResult<()> {
        if self.ready.is_some() {
            return Err(MftError::TryAgain);
        }
        if let Some(prev) = self.held.replace(packet.clone()) {
            let block = 2 * self.layout.channels as usize;
            let mut frame = AudioFrame::new(
                (prev.data.len() / block) as u32,
                self.sample_rate,
                SampleFormat::S16,
                self.layout,
            );
            frame.pts = prev.pts;
            frame.time_base = prev.time_base;
            frame.data[0] = prev.data;
            self.ready = Some(Frame::Audio(frame));
        }
        Ok(())
    }

    fn receive_frame(&mut self) -> MftResult<Frame> {
        self.ready.take().ok_or(MftError::NeedMoreData)
    }

    fn flush(&mut self) {
        self.held = None;
        self.ready = None;
    }

    fn time_base(&self) -> Rational {
        Rational::new(1, self.sample_rate as i32)
    }

    fn stream_params(&self) -> CodecParamsType {
        CodecParamsType::Audio(AudioCodecParams {
            sample_rate: self.sample_rate,
            channel_layout: self.layout,
            sample_format: SampleFormat::S16,
            frame_size: 0,
            block_align: 0,
        })
    }
}

fn builtin_controller() -> TransformController {
    TransformController::with_registry(Arc::new(mft::default_codec_registry()))
}

fn delayed_controller() -> TransformController {
    let mut registry = mft::default_codec_registry();
    registry.register_decoder(CodecId::PcmS16le, "delayed_pcm", DelayedPcm::create);
    TransformController::with_registry(Arc::new(registry))
}

fn stereo_input() -> FormatDescriptor {
    FormatDescriptor::audio(Subtype::Pcm, 2, 48000)
}

fn negotiate(mft: &TransformController) {
    mft.set_input_type(0, Some(&stereo_input()), false).unwrap();
    let output = mft.output_available_type(0, 0).unwrap();
    assert_eq!(output.codec, Subtype::Float);
    mft.set_output_type(0, Some(&output), false).unwrap();
}

fn packet(index: i64) -> InputSample {
    InputSample::new(
        vec![0u8; PACKET_BYTES],
        index * PACKET_DURATION,
        PACKET_DURATION,
    )
}

fn pull(mft: &TransformController) -> (OutputStatus, OutputDataBuffer) {
    let mut buffers = [OutputDataBuffer::default()];
    let status = mft.process_output(&mut buffers).unwrap();
    let [buffer] = buffers;
    (status, buffer)
}

#[test]
fn test_三个数据包_排空后取完剩余采样() {
    init_logger();
    let mft = delayed_controller();
    negotiate(&mft);
    mft.process_message(ControlMessage::StartOfStream).unwrap();
    assert_eq!(mft.state().unwrap(), TransformState::Streaming);

    // 第一个数据包被引擎缓存, 没有输出
    assert_eq!(
        mft.process_input(0, &packet(0), 0).unwrap(),
        InputStatus::NeedMoreInput
    );
    assert_eq!(
        mft.process_input(0, &packet(1), 0).unwrap(),
        InputStatus::Accepted
    );
    assert_eq!(
        mft.process_input(0, &packet(2), 0).unwrap(),
        InputStatus::Accepted
    );

    mft.process_message(ControlMessage::Drain).unwrap();
    assert_eq!(mft.state().unwrap(), TransformState::Draining);
    assert_eq!(
        mft.process_input(0, &packet(3), 0).unwrap(),
        InputStatus::NotAccepting
    );

    let mut times = Vec::new();
    loop {
        let (status, buffer) = pull(&mft);
        if status == OutputStatus::NeedMoreInput {
            break;
        }
        assert_eq!(status, OutputStatus::Delivered);
        let sample = buffer.sample.unwrap();
        assert_eq!(sample.data.len(), SAMPLES_PER_PACKET * 2 * 4);
        assert_eq!(sample.duration, PACKET_DURATION);
        times.push(sample.time);
    }
    assert_eq!(times, vec![0, PACKET_DURATION]);
    assert!(times.windows(2).all(|w| w[0] <= w[1]));

    // 队列取空后排空结束, 再次接收输入
    assert_eq!(mft.state().unwrap(), TransformState::Streaming);
    assert_eq!(
        mft.process_input(0, &packet(4), 0).unwrap(),
        InputStatus::NeedMoreInput
    );
}

#[test]
fn test_排空期间推入一直被拒绝() {
    init_logger();
    let mft = builtin_controller();
    negotiate(&mft);
    for i in 0..3 {
        assert_eq!(mft.process_input(0, &packet(i), 0).unwrap(), InputStatus::Accepted);
    }
    mft.process_message(ControlMessage::Drain).unwrap();

    for _ in 0..3 {
        let status = mft.process_input(0, &packet(9), 0).unwrap();
        assert_eq!(status, InputStatus::NotAccepting);
        assert_eq!(status.code(), ResultCode::NotAccepting);
        assert_eq!(pull(&mft).0, OutputStatus::Delivered);
    }
    assert_eq!(pull(&mft).0, OutputStatus::NeedMoreInput);
    assert_eq!(mft.process_input(0, &packet(9), 0).unwrap(), InputStatus::Accepted);
}

#[test]
fn test_清空后下一次拉取需要更多输入() {
    init_logger();
    let mft = builtin_controller();
    negotiate(&mft);
    mft.process_input(0, &packet(0), 0).unwrap();
    mft.process_input(0, &packet(1), 0).unwrap();

    mft.process_message(ControlMessage::Flush).unwrap();
    let (status, buffer) = pull(&mft);
    assert_eq!(status, OutputStatus::NeedMoreInput);
    assert_eq!(status.code(), ResultCode::NeedMoreInput);
    assert!(buffer.sample.is_none());
}

#[test]
fn test_推入的采样都能按序取回() {
    init_logger();
    let mft = builtin_controller();
    negotiate(&mft);

    let mut expected = Vec::new();
    for i in 0..8 {
        assert_eq!(mft.process_input(0, &packet(i), 0).unwrap(), InputStatus::Accepted);
        expected.push(i * PACKET_DURATION);
        // 隔一个拉一次, 让队列里积压采样
        if i % 2 == 1 {
            let (status, buffer) = pull(&mft);
            assert_eq!(status, OutputStatus::Delivered);
            assert_eq!(buffer.sample.unwrap().time, expected.remove(0));
        }
    }
    while let (OutputStatus::Delivered, buffer) = pull(&mft) {
        assert_eq!(buffer.sample.unwrap().time, expected.remove(0));
    }
    assert!(expected.is_empty(), "丢失了采样: {expected:?}");
}

#[test]
fn test_当前类型与设置的一致() {
    init_logger();
    let mft = builtin_controller();
    let input = stereo_input();
    mft.set_input_type(0, Some(&input), false).unwrap();
    let output = mft.output_available_type(0, 0).unwrap();
    mft.set_output_type(0, Some(&output), false).unwrap();

    assert_eq!(mft.input_current_type(0).unwrap(), input);
    assert_eq!(mft.output_current_type(0).unwrap(), output);
    assert_eq!(mft.state().unwrap(), TransformState::TypesNegotiated);
}

#[test]
fn test_未设置输入时设置输出失败() {
    init_logger();
    let mft = builtin_controller();
    let output = FormatDescriptor::audio(Subtype::Float, 2, 48000);
    for test_only in [false, true] {
        let err = mft.set_output_type(0, Some(&output), test_only).unwrap_err();
        assert_eq!(err.code(), ResultCode::TypeNotSet);
    }
    assert!(matches!(
        mft.output_available_type(0, 0),
        Err(MftError::TypeNotSet)
    ));
}

#[test]
fn test_仅测试的设置不改变当前输出() {
    init_logger();
    let mft = builtin_controller();
    mft.set_input_type(0, Some(&stereo_input()), false).unwrap();
    let output = mft.output_available_type(0, 0).unwrap();

    mft.set_output_type(0, Some(&output), true).unwrap();
    assert!(matches!(mft.output_current_type(0), Err(MftError::TypeNotSet)));

    mft.set_output_type(0, Some(&output), false).unwrap();
    let mut other = output.clone();
    other.set(AttributeKey::SampleRate, AttributeValue::U32(44100));
    let _ = mft.set_output_type(0, Some(&other), true);
    assert_eq!(mft.output_current_type(0).unwrap(), output);
}

#[test]
fn test_s16_转为_f32_的数值() {
    init_logger();
    let mft = builtin_controller();
    negotiate(&mft);

    let mut payload = Vec::new();
    for v in [16384i16, -32768] {
        // 左右声道相同
        payload.extend_from_slice(&v.to_le_bytes());
        payload.extend_from_slice(&v.to_le_bytes());
    }
    mft.process_input(0, &InputSample::new(payload, 0, 0), 0)
        .unwrap();

    let (status, buffer) = pull(&mft);
    assert_eq!(status, OutputStatus::Delivered);
    let sample = buffer.sample.unwrap();
    let values: Vec<f32> = sample
        .data
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    assert_eq!(values, vec![0.5, 0.5, -1.0, -1.0]);
    // 数据包没有时长时按采样数与引擎时间基计算
    assert_eq!(sample.duration, 2 * 10_000_000 / 48000);
}
