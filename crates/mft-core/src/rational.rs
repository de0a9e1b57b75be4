//! 有理数类型, 用于时间基、帧率和宽高比.

use std::fmt;

/// 有理数, 由分子和分母组成
///
/// 时间基 1/48000 表示每个单位为一个 48kHz 采样, 帧率 30000/1001 表示 29.97fps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    /// 分子
    pub num: i32,
    /// 分母
    pub den: i32,
}

impl Rational {
    /// 创建新的有理数
    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /// 零值
    pub const ZERO: Self = Self { num: 0, den: 1 };

    /// 未定义 (分母为 0)
    pub const UNDEFINED: Self = Self { num: 0, den: 0 };

    /// 宿主管线时间单位: 100 纳秒 (1/10_000_000)
    pub const HNS: Self = Self {
        num: 1,
        den: 10_000_000,
    };

    /// 判断是否有效 (分母不为 0)
    pub const fn is_valid(&self) -> bool {
        self.den != 0
    }

    /// 转换为 f64, 分母为 0 时返回 NaN
    pub fn to_f64(self) -> f64 {
        if self.den == 0 {
            return f64::NAN;
        }
        f64::from(self.num) / f64::from(self.den)
    }

    /// 约分, 并保证分母为正
    pub fn reduce(self) -> Self {
        if self.den == 0 {
            return self;
        }
        let g = gcd(self.num.unsigned_abs(), self.den.unsigned_abs());
        if g == 0 {
            return self;
        }
        let g = g as i32;
        let sign = if self.den < 0 { -1 } else { 1 };
        Self {
            num: sign * self.num / g,
            den: sign * self.den / g,
        }
    }

    /// 将以 `self` 为单位的值换算到 `target` 单位 (向零取整)
    ///
    /// 任一时间基无效时返回 `None`.
    pub fn rescale(self, value: i64, target: Rational) -> Option<i64> {
        if !self.is_valid() || !target.is_valid() || target.num == 0 {
            return None;
        }
        let num = i128::from(value) * i128::from(self.num) * i128::from(target.den);
        let den = i128::from(self.den) * i128::from(target.num);
        i64::try_from(num / den).ok()
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl From<(i32, i32)> for Rational {
    fn from((num, den): (i32, i32)) -> Self {
        Self { num, den }
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}
