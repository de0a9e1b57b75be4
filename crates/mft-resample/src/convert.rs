//! 单个采样点的读写.
//!
//! 所有格式经 f64 中间值转换, 整数格式归一化到 -1.0..1.0.

use mft_core::{MftError, MftResult, SampleFormat};

/// 读取一个采样点并归一化
pub(crate) fn read_sample(data: &[u8], format: SampleFormat) -> MftResult<f64> {
    match format.to_interleaved() {
        SampleFormat::U8 => Ok((f64::from(data[0]) - 128.0) / 128.0),
        SampleFormat::S16 => Ok(f64::from(i16::from_le_bytes([data[0], data[1]])) / 32768.0),
        SampleFormat::S32 => {
            let v = i32::from_le_bytes([data[0], data[1], data[2], data[3]]);
            Ok(f64::from(v) / 2_147_483_648.0)
        }
        SampleFormat::F32 => Ok(f64::from(f32::from_le_bytes([
            data[0], data[1], data[2], data[3],
        ]))),
        _ => Err(MftError::Unsupported(format!("不支持的采样格式: {format}"))),
    }
}

/// 把归一化采样写入 `out` 开头
pub(crate) fn write_sample(value: f64, format: SampleFormat, out: &mut [u8]) -> MftResult<()> {
    match format.to_interleaved() {
        SampleFormat::U8 => {
            out[0] = ((value * 128.0) + 128.0).round().clamp(0.0, 255.0) as u8;
        }
        SampleFormat::S16 => {
            let v = (value * 32768.0).round().clamp(-32768.0, 32767.0) as i16;
            out[..2].copy_from_slice(&v.to_le_bytes());
        }
        SampleFormat::S32 => {
            let v = (value * 2_147_483_648.0)
                .round()
                .clamp(-2_147_483_648.0, 2_147_483_647.0) as i32;
            out[..4].copy_from_slice(&v.to_le_bytes());
        }
        SampleFormat::F32 => {
            out[..4].copy_from_slice(&(value as f32).to_le_bytes());
        }
        _ => {
            return Err(MftError::Unsupported(format!("不支持的采样格式: {format}")));
        }
    }
    Ok(())
}
