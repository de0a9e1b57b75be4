//! 统一错误类型与宿主结果码.
//!
//! 解码变换的所有 crate 共用 `MftError`. 流控信号 (需要更多输入、暂不接收、
//! 流格式变更) 不是错误, 它们由 transform 层的状态枚举返回, 这里只通过
//! `ResultCode` 给出对应的宿主结果码.

use std::fmt;

use thiserror::Error;

/// 解码变换统一错误类型
#[derive(Debug, Error)]
pub enum MftError {
    // ========================
    // 调用方用法错误
    // ========================
    /// 无效参数 (非零标志位、输出槽数量不对等)
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 流编号不是 0
    #[error("无效的流编号: {0}")]
    InvalidStreamNumber(u32),

    // ========================
    // 类型协商错误
    // ========================
    /// 尚未设置所需的媒体类型
    #[error("媒体类型尚未设置")]
    TypeNotSet,

    /// 候选类型枚举越界
    #[error("没有更多的媒体类型")]
    NoMoreTypes,

    /// 媒体类型不受支持或缺少必需属性
    #[error("无效的媒体类型: {0}")]
    InvalidMediaType(String),

    // ========================
    // 生命周期
    // ========================
    /// 变换已关闭
    #[error("变换已关闭")]
    Shutdown,

    /// 内存分配失败
    #[error("内存分配失败: {0}")]
    OutOfMemory(String),

    // ========================
    // 解码引擎相关
    // ========================
    /// 解码引擎错误
    #[error("解码引擎错误: {0}")]
    Codec(String),

    /// 未找到指定的解码引擎
    #[error("未找到解码引擎: {0}")]
    CodecNotFound(String),

    /// 无效数据 (损坏的码流、尺寸不符的帧等)
    #[error("无效数据: {0}")]
    InvalidData(String),

    /// 引擎内部数据不足, 需要更多输入 (仅在引擎接口上使用)
    #[error("数据不足, 需要更多输入")]
    NeedMoreData,

    /// 引擎尚有未取走的帧, 暂不能接收新数据包 (仅在引擎接口上使用)
    #[error("引擎输出未取空, 暂不能接收新数据")]
    TryAgain,

    /// 引擎已到达流末尾
    #[error("已到达流末尾")]
    Eof,

    /// 不支持的操作
    #[error("不支持的操作: {0}")]
    Unsupported(String),

    /// 功能未实现
    #[error("功能未实现: {0}")]
    NotImplemented(String),

    /// I/O 错误 (仅出现在配置/日志初始化路径)
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 内部不变量被破坏 (正确的调用顺序下不应发生)
    #[error("内部错误: {0}")]
    Internal(String),
}

/// 统一 Result 类型
pub type MftResult<T> = Result<T, MftError>;

/// 返回给宿主管线的结果码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    /// 成功
    Ok,
    /// 需要更多输入
    NeedMoreInput,
    /// 暂不接收输入
    NotAccepting,
    /// 无效的流编号
    InvalidStreamNumber,
    /// 媒体类型尚未设置
    TypeNotSet,
    /// 没有更多的媒体类型
    NoMoreTypes,
    /// 无效的媒体类型
    InvalidMediaType,
    /// 输出流格式变更, 需要重新协商
    StreamChangePending,
    /// 已关闭
    Shutdown,
    /// 内存不足
    OutOfMemory,
    /// 无效参数
    InvalidArgument,
    /// 通用失败
    GenericFailure,
}

impl MftError {
    /// 映射为宿主结果码
    pub fn code(&self) -> ResultCode {
        match self {
            Self::InvalidArgument(_) => ResultCode::InvalidArgument,
            Self::InvalidStreamNumber(_) => ResultCode::InvalidStreamNumber,
            Self::TypeNotSet => ResultCode::TypeNotSet,
            Self::NoMoreTypes => ResultCode::NoMoreTypes,
            Self::InvalidMediaType(_) => ResultCode::InvalidMediaType,
            Self::Shutdown => ResultCode::Shutdown,
            Self::OutOfMemory(_) => ResultCode::OutOfMemory,
            Self::Codec(_)
            | Self::CodecNotFound(_)
            | Self::InvalidData(_)
            | Self::NeedMoreData
            | Self::TryAgain
            | Self::Eof
            | Self::Unsupported(_)
            | Self::NotImplemented(_)
            | Self::Io(_)
            | Self::Internal(_) => ResultCode::GenericFailure,
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ok => "ok",
            Self::NeedMoreInput => "need-more-input",
            Self::NotAccepting => "not-accepting",
            Self::InvalidStreamNumber => "invalid-stream-number",
            Self::TypeNotSet => "type-not-set",
            Self::NoMoreTypes => "no-more-types",
            Self::InvalidMediaType => "invalid-media-type",
            Self::StreamChangePending => "stream-change-pending",
            Self::Shutdown => "shutdown",
            Self::OutOfMemory => "out-of-memory",
            Self::InvalidArgument => "invalid-argument",
            Self::GenericFailure => "generic-failure",
        };
        write!(f, "{name}")
    }
}

/// 按精确大小预留缓冲区, 分配失败时返回 `OutOfMemory`
pub fn try_alloc_zeroed(len: usize, what: &str) -> MftResult<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|e| MftError::OutOfMemory(format!("{what} ({len} 字节): {e}")))?;
    buf.resize(len, 0);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_引擎错误统一映射为通用失败() {
        assert_eq!(MftError::TryAgain.code(), ResultCode::GenericFailure);
        assert_eq!(
            MftError::Codec("坏帧".into()).code(),
            ResultCode::GenericFailure
        );
        assert_eq!(
            MftError::Internal("x".into()).code(),
            ResultCode::GenericFailure
        );
    }

    #[test]
    fn test_协商错误保留各自结果码() {
        assert_eq!(MftError::TypeNotSet.code(), ResultCode::TypeNotSet);
        assert_eq!(MftError::NoMoreTypes.code(), ResultCode::NoMoreTypes);
        assert_eq!(
            MftError::InvalidStreamNumber(3).code(),
            ResultCode::InvalidStreamNumber
        );
        assert_eq!(ResultCode::StreamChangePending.to_string(), "stream-change-pending");
    }

    #[test]
    fn test_try_alloc_zeroed() {
        let buf = try_alloc_zeroed(16, "测试").unwrap();
        assert_eq!(buf.len(), 16);
        assert!(buf.iter().all(|&b| b == 0));
        assert!(matches!(
            try_alloc_zeroed(usize::MAX, "超大缓冲区"),
            Err(MftError::OutOfMemory(_))
        ));
    }
}
