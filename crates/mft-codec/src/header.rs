//! 容器头部修正.
//!
//! 某些容器导出的编解码头部与解码引擎期望的布局不同, 需要按编解码器重新打包.
//! 修正器注册在 `CodecRegistry` 中, 仅当头部不是引擎布局时才调用.

use byteorder::{ByteOrder, LittleEndian};
use log::debug;
use mft_core::{MftError, MftResult};

/// 头部修正器
pub trait HeaderFixup: Send + Sync {
    /// 修正器名称
    fn name(&self) -> &str;

    /// 头部是否已经是引擎期望的布局
    fn matches_engine_layout(&self, header: &[u8]) -> bool;

    /// 把容器布局的头部转换为引擎布局
    fn transform(&self, header: &[u8]) -> MftResult<Vec<u8>>;
}

/// 容器前缀: channels, samples_per_sec, bits_per_sample, header_size[3], 均为 u32 小端
const CONTAINER_PREFIX_LEN: usize = 24;

/// Vorbis 头部修正器
///
/// 容器布局为 24 字节前缀加三个头部包; 引擎布局为 Xiph lacing:
/// `0x02`, 前两个头部长度的 lacing 编码, 然后三个头部依次拼接.
#[derive(Debug, Default, Clone, Copy)]
pub struct XiphHeaderFixup;

impl XiphHeaderFixup {
    pub fn new() -> Self {
        Self
    }
}

impl HeaderFixup for XiphHeaderFixup {
    fn name(&self) -> &str {
        "xiph_lacing"
    }

    fn matches_engine_layout(&self, header: &[u8]) -> bool {
        if header.first() != Some(&2) {
            return false;
        }
        let mut pos = 1;
        let mut sizes = [0usize; 2];
        for size in &mut sizes {
            match read_lacing(header, &mut pos) {
                Some(s) => *size = s,
                None => return false,
            }
        }
        let payload = &header[pos..];
        // 第三个头部不能为空, 且第一个包必须是 identification 头
        sizes[0] + sizes[1] < payload.len() && payload.starts_with(b"\x01vorbis")
    }

    fn transform(&self, header: &[u8]) -> MftResult<Vec<u8>> {
        if header.len() < CONTAINER_PREFIX_LEN {
            return Err(MftError::InvalidMediaType(format!(
                "Vorbis 头部过短: {} 字节",
                header.len()
            )));
        }
        let size0 = LittleEndian::read_u32(&header[12..16]) as usize;
        let size1 = LittleEndian::read_u32(&header[16..20]) as usize;
        let size2 = LittleEndian::read_u32(&header[20..24]) as usize;
        let packets = &header[CONTAINER_PREFIX_LEN..];

        if size0 == 0 || size1 == 0 || size0 + size1 >= packets.len() {
            return Err(MftError::InvalidMediaType(format!(
                "Vorbis 头部长度不一致: {size0}+{size1} / {} 字节",
                packets.len()
            )));
        }
        if size0 + size1 + size2 != packets.len() {
            debug!(
                "Vorbis 第三个头部长度 {} 与实际 {} 不符, 按实际长度处理",
                size2,
                packets.len() - size0 - size1
            );
        }

        let mut out = Vec::with_capacity(1 + lacing_len(size0) + lacing_len(size1) + packets.len());
        out.push(2);
        write_lacing(size0, &mut out);
        write_lacing(size1, &mut out);
        out.extend_from_slice(packets);
        Ok(out)
    }
}

/// Xiph lacing: 每满 255 写一个 0xFF, 最后写余数
fn write_lacing(mut size: usize, out: &mut Vec<u8>) {
    while size >= 255 {
        out.push(0xFF);
        size -= 255;
    }
    out.push(size as u8);
}

fn lacing_len(size: usize) -> usize {
    size / 255 + 1
}

fn read_lacing(data: &[u8], pos: &mut usize) -> Option<usize> {
    let mut size = 0usize;
    loop {
        let b = *data.get(*pos)?;
        *pos += 1;
        size += usize::from(b);
        if b != 0xFF {
            return Some(size);
        }
    }
}
