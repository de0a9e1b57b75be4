//! 像素格式.
//!
//! 只保留解码引擎常见的 8 位输出格式和变换输出的 NV12.

use std::fmt;

/// 像素格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 未指定
    None,

    // ========================
    // YUV 平面格式
    // ========================
    /// YUV 4:2:0 平面 (I420)
    Yuv420p,
    /// YUV 4:2:2 平面
    Yuv422p,
    /// YUV 4:4:4 平面
    Yuv444p,

    // ========================
    // YUV 半平面格式
    // ========================
    /// NV12: Y 平面 + UV 交错, 4:2:0
    Nv12,
    /// NV21: Y 平面 + VU 交错, 4:2:0
    Nv21,

    // ========================
    // 其他
    // ========================
    /// RGB 各 8 位, 打包
    Rgb24,
    /// 灰度 8 位
    Gray8,
}

impl PixelFormat {
    /// 色度子采样 (log2 水平, log2 垂直)
    pub const fn chroma_subsampling(&self) -> (u32, u32) {
        match self {
            Self::Yuv420p | Self::Nv12 | Self::Nv21 => (1, 1),
            Self::Yuv422p => (1, 0),
            _ => (0, 0),
        }
    }

    /// 平面数量
    pub const fn plane_count(&self) -> u32 {
        match self {
            Self::None => 0,
            Self::Yuv420p | Self::Yuv422p | Self::Yuv444p => 3,
            Self::Nv12 | Self::Nv21 => 2,
            Self::Rgb24 | Self::Gray8 => 1,
        }
    }

    /// 指定平面每行的字节数
    ///
    /// 奇数宽度的色度平面向上取整.
    pub fn plane_linesize(&self, plane: usize, width: u32) -> Option<usize> {
        if plane >= self.plane_count() as usize {
            return None;
        }
        let w = width as usize;
        let (sub_h, _) = self.chroma_subsampling();
        Some(match self {
            Self::Yuv420p | Self::Yuv422p | Self::Yuv444p => {
                if plane == 0 {
                    w
                } else {
                    ceil_shift(w, sub_h)
                }
            }
            // plane1 为 UV 交错, 每个色度样本 2 字节
            Self::Nv12 | Self::Nv21 => {
                if plane == 0 {
                    w
                } else {
                    ceil_shift(w, 1) * 2
                }
            }
            Self::Rgb24 => w * 3,
            Self::Gray8 => w,
            Self::None => return None,
        })
    }

    /// 指定平面的行数
    pub fn plane_height(&self, plane: usize, height: u32) -> Option<usize> {
        if plane >= self.plane_count() as usize {
            return None;
        }
        let h = height as usize;
        let (_, sub_v) = self.chroma_subsampling();
        Some(if plane == 0 { h } else { ceil_shift(h, sub_v) })
    }

    /// 整帧字节数 (紧密排列)
    pub fn frame_size(&self, width: u32, height: u32) -> Option<usize> {
        if *self == Self::None {
            return None;
        }
        let mut total = 0usize;
        for plane in 0..self.plane_count() as usize {
            total += self.plane_linesize(plane, width)? * self.plane_height(plane, height)?;
        }
        Some(total)
    }
}

fn ceil_shift(v: usize, shift: u32) -> usize {
    (v + (1 << shift) - 1) >> shift
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Yuv420p => "yuv420p",
            Self::Yuv422p => "yuv422p",
            Self::Yuv444p => "yuv444p",
            Self::Nv12 => "nv12",
            Self::Nv21 => "nv21",
            Self::Rgb24 => "rgb24",
            Self::Gray8 => "gray8",
        };
        write!(f, "{name}")
    }
}
