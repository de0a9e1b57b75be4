//! 时间戳约定.
//!
//! 宿主管线的采样时间和时长均以 100 纳秒为单位. 引擎侧沿用
//! `NOPTS_VALUE` 表示未定义时间戳.

use crate::rational::Rational;

/// 表示"未定义"的时间戳值
pub const NOPTS_VALUE: i64 = i64::MIN;

/// 每秒的 100 纳秒单位数
pub const HNS_PER_SECOND: i64 = 10_000_000;

/// 将采样数按引擎时间基换算为 100 纳秒时长
///
/// 引擎时间基无效时返回 0.
pub fn samples_to_hns(nb_samples: u32, time_base: Rational) -> i64 {
    time_base
        .rescale(i64::from(nb_samples), Rational::HNS)
        .unwrap_or(0)
}

/// 时间戳是否有效
pub const fn is_valid(ts: i64) -> bool {
    ts != NOPTS_VALUE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_采样数换算() {
        assert_eq!(samples_to_hns(48000, Rational::new(1, 48000)), HNS_PER_SECOND);
        assert_eq!(samples_to_hns(480, Rational::new(1, 48000)), 100_000);
        assert_eq!(samples_to_hns(480, Rational::UNDEFINED), 0);
    }
}
