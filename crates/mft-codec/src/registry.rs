//! 解码引擎注册表.
//!
//! 按 `CodecId` 查找并实例化解码引擎, 同时登记各编解码器的头部修正器.

use std::collections::HashMap;

use log::debug;
use mft_core::{MftError, MftResult};

use crate::codec_id::CodecId;
use crate::decoder::Decoder;
use crate::header::HeaderFixup;

/// 解码器工厂函数类型
pub type DecoderFactory = fn() -> MftResult<Box<dyn Decoder>>;

/// 解码引擎注册表
pub struct CodecRegistry {
    /// 解码器工厂映射
    decoders: HashMap<CodecId, Vec<DecoderEntry>>,
    /// 头部修正器映射
    fixups: HashMap<CodecId, Box<dyn HeaderFixup>>,
}

/// 解码器注册条目
struct DecoderEntry {
    name: String,
    factory: DecoderFactory,
}

impl CodecRegistry {
    /// 创建空的注册表
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
            fixups: HashMap::new(),
        }
    }

    /// 注册一个解码器
    ///
    /// 同一 `CodecId` 后注册的优先.
    pub fn register_decoder(
        &mut self,
        codec_id: CodecId,
        name: impl Into<String>,
        factory: DecoderFactory,
    ) {
        self.decoders.entry(codec_id).or_default().insert(
            0,
            DecoderEntry {
                name: name.into(),
                factory,
            },
        );
    }

    /// 登记头部修正器, 已存在时替换
    pub fn register_header_fixup(&mut self, codec_id: CodecId, fixup: Box<dyn HeaderFixup>) {
        self.fixups.insert(codec_id, fixup);
    }

    /// 创建指定编解码器的解码器实例
    pub fn create_decoder(&self, codec_id: CodecId) -> MftResult<Box<dyn Decoder>> {
        let entry = self
            .decoders
            .get(&codec_id)
            .and_then(|entries| entries.first())
            .ok_or_else(|| MftError::CodecNotFound(format!("未找到 {} 的解码器", codec_id)))?;
        debug!("创建 {} 解码器: {}", codec_id, entry.name);
        (entry.factory)()
    }

    /// 是否可以为该编解码器创建解码器
    pub fn has_decoder(&self, codec_id: CodecId) -> bool {
        self.decoders.contains_key(&codec_id)
    }

    /// 获取头部修正器
    pub fn header_fixup(&self, codec_id: CodecId) -> Option<&dyn HeaderFixup> {
        self.fixups.get(&codec_id).map(|f| f.as_ref())
    }

    /// 把容器头部整理为引擎可用的额外数据
    ///
    /// 没有修正器或头部已是引擎布局时原样返回.
    pub fn prepare_extra_data(&self, codec_id: CodecId, raw: &[u8]) -> MftResult<Vec<u8>> {
        match self.header_fixup(codec_id) {
            Some(fixup) if !fixup.matches_engine_layout(raw) => {
                debug!("{} 头部经 {} 修正 ({} 字节)", codec_id, fixup.name(), raw.len());
                fixup.transform(raw)
            }
            _ => Ok(raw.to_vec()),
        }
    }

    /// 获取所有已注册的解码器名称
    pub fn list_decoders(&self) -> Vec<(CodecId, &str)> {
        let mut result = Vec::new();
        for (id, entries) in &self.decoders {
            for entry in entries {
                result.push((*id, entry.name.as_str()));
            }
        }
        result
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::XiphHeaderFixup;

    #[test]
    fn test_注册所有内置引擎() {
        let mut registry = CodecRegistry::new();
        crate::register_all(&mut registry);

        assert_eq!(registry.list_decoders().len(), 3);
        for id in [CodecId::PcmS16le, CodecId::PcmF32le, CodecId::RawVideo] {
            let dec = registry.create_decoder(id);
            assert!(dec.is_ok(), "创建 {} 解码器失败", id);
            assert_eq!(dec.unwrap().codec_id(), id);
        }
        assert!(registry.header_fixup(CodecId::Vorbis).is_some());
    }

    #[test]
    fn test_未注册的解码器返回错误() {
        let registry = CodecRegistry::new();
        assert!(matches!(
            registry.create_decoder(CodecId::H264),
            Err(MftError::CodecNotFound(_))
        ));
    }

    #[test]
    fn test_已是引擎布局的头部不修正() {
        let mut registry = CodecRegistry::new();
        registry.register_header_fixup(CodecId::Vorbis, Box::new(XiphHeaderFixup::new()));

        let mut laced = vec![2u8, 7, 1];
        laced.extend_from_slice(b"\x01vorbis");
        laced.extend_from_slice(&[0xAB, 0xCD]);
        let out = registry.prepare_extra_data(CodecId::Vorbis, &laced).unwrap();
        assert_eq!(out, laced);

        // 没有修正器的编解码器原样返回
        let out = registry.prepare_extra_data(CodecId::Flac, &[1, 2, 3]).unwrap();
        assert_eq!(out, vec![1, 2, 3]);
    }
}
