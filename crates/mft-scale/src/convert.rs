//! 转换到 NV12.
//!
//! 支持的源格式: YUV420P / YUV422P / YUV444P / NV12 / NV21 / Gray8 / RGB24.
//! 亮度逐行并行复制或计算, 色度按 2x2 块 (不足时按边缘) 取值后交错写入 UV 平面.
//!
//! RGB 使用 BT.601 色彩矩阵:
//! ```text
//! Y  =  0.299 * R + 0.587 * G + 0.114 * B
//! Cb = -0.169 * R - 0.331 * G + 0.500 * B + 128
//! Cr =  0.500 * R - 0.419 * G - 0.081 * B + 128
//! ```

use mft_core::{MftError, MftResult, PixelFormat};
use rayon::prelude::*;

/// 转换输入 (各平面数据切片)
pub struct ConvertInput<'a> {
    /// 各平面数据
    pub planes: &'a [&'a [u8]],
    /// 各平面行字节数
    pub linesize: &'a [usize],
    /// 宽度
    pub width: u32,
    /// 高度
    pub height: u32,
    /// 像素格式
    pub format: PixelFormat,
}

/// 检查是否支持从该格式转换到 NV12
pub fn is_supported_source(src: PixelFormat) -> bool {
    matches!(
        src,
        PixelFormat::Yuv420p
            | PixelFormat::Yuv422p
            | PixelFormat::Yuv444p
            | PixelFormat::Nv12
            | PixelFormat::Nv21
            | PixelFormat::Gray8
            | PixelFormat::Rgb24
    )
}

// BT.601 系数 (x256)
const Y_R: i32 = 77;
const Y_G: i32 = 150;
const Y_B: i32 = 29;
const CB_R: i32 = -43;
const CB_G: i32 = -85;
const CB_B: i32 = 128;
const CR_R: i32 = 128;
const CR_G: i32 = -107;
const CR_B: i32 = -21;

/// 转换为紧密排列的 NV12: Y 平面 (w*h) 后接 UV 平面 (ceil(w/2)*2 * ceil(h/2))
pub fn to_nv12(src: &ConvertInput, y: &mut [u8], uv: &mut [u8]) -> MftResult<()> {
    let w = src.width as usize;
    let h = src.height as usize;
    let cw = w.div_ceil(2);
    let ch = h.div_ceil(2);
    if y.len() != w * h || uv.len() != cw * 2 * ch {
        return Err(MftError::InvalidArgument(format!(
            "NV12 输出平面大小不符: Y={} UV={}, 期望 {}x{}",
            y.len(),
            uv.len(),
            w,
            h
        )));
    }
    validate_input(src)?;
    if w == 0 || h == 0 {
        return Ok(());
    }

    // 亮度
    match src.format {
        PixelFormat::Rgb24 => {
            let (rgb, stride) = (src.planes[0], src.linesize[0]);
            y.par_chunks_mut(w).enumerate().for_each(|(row, out)| {
                let line = &rgb[row * stride..];
                for (col, px) in out.iter_mut().enumerate() {
                    let (r, g, b) = rgb_at(line, col);
                    *px = ((Y_R * r + Y_G * g + Y_B * b + 128) >> 8).clamp(0, 255) as u8;
                }
            });
        }
        _ => {
            let (luma, stride) = (src.planes[0], src.linesize[0]);
            y.par_chunks_mut(w).enumerate().for_each(|(row, out)| {
                out.copy_from_slice(&luma[row * stride..row * stride + w]);
            });
        }
    }

    // 色度
    let mut fill = |sample: &(dyn Fn(usize, usize) -> (u8, u8) + Sync)| {
        uv.par_chunks_mut(cw * 2).enumerate().for_each(|(cy, out)| {
            for cx in 0..cw {
                let (u, v) = sample(cx, cy);
                out[cx * 2] = u;
                out[cx * 2 + 1] = v;
            }
        });
    };

    match src.format {
        PixelFormat::Yuv420p => {
            let (u, v) = (src.planes[1], src.planes[2]);
            let (us, vs) = (src.linesize[1], src.linesize[2]);
            fill(&|cx, cy| (u[cy * us + cx], v[cy * vs + cx]));
        }
        PixelFormat::Yuv422p => {
            // 垂直方向两行取平均
            let (u, v) = (src.planes[1], src.planes[2]);
            let (us, vs) = (src.linesize[1], src.linesize[2]);
            fill(&|cx, cy| {
                let r0 = cy * 2;
                let r1 = (r0 + 1).min(h - 1);
                (
                    avg2(u[r0 * us + cx], u[r1 * us + cx]),
                    avg2(v[r0 * vs + cx], v[r1 * vs + cx]),
                )
            });
        }
        PixelFormat::Yuv444p => {
            let (u, v) = (src.planes[1], src.planes[2]);
            let (us, vs) = (src.linesize[1], src.linesize[2]);
            fill(&|cx, cy| {
                (
                    avg_block(u, us, cx, cy, w, h),
                    avg_block(v, vs, cx, cy, w, h),
                )
            });
        }
        PixelFormat::Nv12 | PixelFormat::Nv21 => {
            let (chroma, cs) = (src.planes[1], src.linesize[1]);
            let swap = src.format == PixelFormat::Nv21;
            fill(&|cx, cy| {
                let a = chroma[cy * cs + cx * 2];
                let b = chroma[cy * cs + cx * 2 + 1];
                if swap { (b, a) } else { (a, b) }
            });
        }
        PixelFormat::Gray8 => fill(&|_, _| (128, 128)),
        PixelFormat::Rgb24 => {
            let (rgb, stride) = (src.planes[0], src.linesize[0]);
            fill(&|cx, cy| {
                let (mut sr, mut sg, mut sb, mut n) = (0, 0, 0, 0);
                for row in (cy * 2)..(cy * 2 + 2).min(h) {
                    for col in (cx * 2)..(cx * 2 + 2).min(w) {
                        let (r, g, b) = rgb_at(&rgb[row * stride..], col);
                        sr += r;
                        sg += g;
                        sb += b;
                        n += 1;
                    }
                }
                let (r, g, b) = (sr / n, sg / n, sb / n);
                let cb = ((CB_R * r + CB_G * g + CB_B * b + 128) >> 8) + 128;
                let cr = ((CR_R * r + CR_G * g + CR_B * b + 128) >> 8) + 128;
                (cb.clamp(0, 255) as u8, cr.clamp(0, 255) as u8)
            });
        }
        other => {
            return Err(MftError::Unsupported(format!("不支持的像素格式转换: {other} -> nv12")));
        }
    }
    Ok(())
}

/// 检查各平面数据是否足够
fn validate_input(src: &ConvertInput) -> MftResult<()> {
    if !is_supported_source(src.format) {
        return Err(MftError::Unsupported(format!(
            "不支持的像素格式转换: {} -> nv12",
            src.format
        )));
    }
    let planes = src.format.plane_count() as usize;
    if src.planes.len() < planes || src.linesize.len() < planes {
        return Err(MftError::InvalidData(format!(
            "{} 需要 {} 个平面, 实际 {}",
            src.format,
            planes,
            src.planes.len()
        )));
    }
    for i in 0..planes {
        let row_bytes = src.format.plane_linesize(i, src.width).unwrap_or(0);
        let rows = src.format.plane_height(i, src.height).unwrap_or(0);
        if rows == 0 {
            continue;
        }
        let stride = src.linesize[i];
        if stride < row_bytes || src.planes[i].len() < stride * (rows - 1) + row_bytes {
            return Err(MftError::InvalidData(format!(
                "平面 {i} 数据不足: {} 字节, 行宽 {stride}, {rows} 行",
                src.planes[i].len()
            )));
        }
    }
    Ok(())
}

fn rgb_at(line: &[u8], col: usize) -> (i32, i32, i32) {
    let off = col * 3;
    (
        i32::from(line[off]),
        i32::from(line[off + 1]),
        i32::from(line[off + 2]),
    )
}

fn avg2(a: u8, b: u8) -> u8 {
    ((u16::from(a) + u16::from(b) + 1) / 2) as u8
}

fn avg_block(plane: &[u8], stride: usize, cx: usize, cy: usize, w: usize, h: usize) -> u8 {
    let mut sum = 0u32;
    let mut n = 0u32;
    for row in (cy * 2)..(cy * 2 + 2).min(h) {
        for col in (cx * 2)..(cx * 2 + 2).min(w) {
            sum += u32::from(plane[row * stride + col]);
            n += 1;
        }
    }
    ((sum + n / 2) / n) as u8
}
