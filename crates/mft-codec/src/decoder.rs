//! 解码引擎 trait.
//!
//! 解码会话只通过这个 trait 驱动引擎, 码流算法本身由具体实现提供.

use mft_core::{MftResult, Rational};

use crate::codec_id::CodecId;
use crate::codec_parameters::{CodecParameters, CodecParamsType};
use crate::frame::Frame;
use crate::packet::Packet;

/// 解码引擎
///
/// 解码流程:
/// 1. `open()` 配置参数
/// 2. `send_packet()` 送入压缩数据
/// 3. 反复 `receive_frame()` 直到返回 `NeedMoreData`
/// 4. 重复 2~3; 送入空包表示流结束, 之后 `receive_frame()` 返回 `Eof`
pub trait Decoder: Send {
    /// 解码器标识
    fn codec_id(&self) -> CodecId;

    /// 解码器名称
    fn name(&self) -> &str;

    /// 使用参数配置解码器
    fn open(&mut self, _params: &CodecParameters) -> MftResult<()> {
        Ok(())
    }

    /// 送入一个压缩数据包
    ///
    /// # 返回
    /// - `Ok(())`: 数据包已接受
    /// - `Err(MftError::TryAgain)`: 还有未取出的帧, 必须先取空输出
    fn send_packet(&mut self, packet: &Packet) -> MftResult<()>;

    /// 取出一帧解码数据
    ///
    /// # 返回
    /// - `Ok(frame)`: 成功取出一帧
    /// - `Err(MftError::NeedMoreData)`: 需要送入更多数据包
    /// - `Err(MftError::Eof)`: 所有帧已取出
    fn receive_frame(&mut self) -> MftResult<Frame>;

    /// 清空内部状态
    fn flush(&mut self);

    /// 引擎时间基, 用于把采样数换算为时长
    fn time_base(&self) -> Rational;

    /// 引擎当前的实际输出参数
    ///
    /// 部分解码器要到解码开始后才知道真实的尺寸和像素格式, 因此每帧之后都可能变化.
    fn stream_params(&self) -> CodecParamsType;
}
