//! 压缩数据包.
//!
//! 变换层复用同一个数据包作为暂存缓冲区, 时间戳沿用宿主的 100 纳秒单位.

use mft_core::time::NOPTS_VALUE;
use mft_core::{MftResult, Rational, error::try_alloc_zeroed};

/// 压缩数据包
#[derive(Debug, Clone)]
pub struct Packet {
    /// 压缩数据
    pub data: Vec<u8>,
    /// 显示时间戳, `NOPTS_VALUE` 表示未知
    pub pts: i64,
    /// 时长 (以 time_base 为单位), 0 表示未知
    pub duration: i64,
    /// 时间基
    pub time_base: Rational,
}

impl Packet {
    /// 创建空数据包
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            pts: NOPTS_VALUE,
            duration: 0,
            time_base: Rational::HNS,
        }
    }

    /// 从数据创建数据包
    pub fn from_data(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            ..Self::empty()
        }
    }

    /// 用新负载填充数据包, 并带上宿主的时间与时长
    ///
    /// 当前缓冲区大小与负载相同时原地复用, 否则重新分配.
    /// 分配失败返回 `OutOfMemory`, 此时数据包保持原样.
    /// 返回值表示是否复用了原缓冲区.
    pub fn fill_from(&mut self, payload: &[u8], pts: i64, duration: i64) -> MftResult<bool> {
        let reused = self.data.len() == payload.len();
        if reused {
            self.data.copy_from_slice(payload);
        } else {
            let mut buf = try_alloc_zeroed(payload.len(), "数据包缓冲区")?;
            buf.copy_from_slice(payload);
            self.data = buf;
        }
        self.pts = pts;
        self.duration = duration;
        self.time_base = Rational::HNS;
        Ok(reused)
    }

    /// 数据大小 (字节)
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 是否为空包
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
