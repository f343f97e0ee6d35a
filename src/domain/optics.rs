//! 驗光度數的正規化與編碼。
//!
//! 庫存以「正規化後的字串」作為查詢鍵：使用者輸入的 (SPH, CYL) 先經過
//! [`transpose`] 轉成負柱鏡形式，再由 [`format_power`] 編成 `SDD.dd`。
//! 匯入 CSV 與搜尋都必須走同一條路徑，否則精確比對會靜默失敗。

use crate::utils::error::{LensError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// 以 tick 計數時容許的浮點誤差
const RANGE_EPSILON: f64 = 1e-9;

/// 單次產生的選項數上限，超過時回傳空序列
pub const MAX_RANGE_TICKS: f64 = 1_000_000.0;

// 2^40 以下乘 100 取整仍精確；更大的值改用 f64 的精確十進位展開
const SCALED_LIMIT: f64 = 1_099_511_627_776.0;

/// 四捨五入到小數第二位（half away from zero）。
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 將正柱鏡處方轉成等效的負柱鏡處方。
///
/// `cyl > 0` 時回傳 `(round2(sph + cyl), round2(-cyl))`，其餘原樣回傳。
/// 結果的柱鏡恆為 `<= 0`，因此重複套用不會再改變。
/// 不做任何驗證：NaN / inf 會直接傳遞到輸出。
pub fn transpose(sph: f64, cyl: f64) -> (f64, f64) {
    if cyl > 0.0 {
        (round2(sph + cyl), round2(-cyl))
    } else {
        (sph, cyl)
    }
}

/// 將度數編碼成固定格式 `SDD.dd`，例如 `+01.50`、`-00.25`、`+20.00`。
///
/// 正負號取自四捨五入後的值，所以 `0`、`-0.0` 與 `-0.001` 都編成 `+00.00`。
/// 整數部分至少補到兩位，超過兩位不截斷（`1e20` 編成 `+100000000000000000000.00`）。
///
/// 非有限值是呼叫端的契約錯誤，會得到 `NaN` / `+inf` / `-inf` 這類字串而不是 panic。
pub fn format_power(value: f64) -> String {
    if !value.is_finite() {
        return format!("{:+}", value);
    }
    encode_power(value)
}

/// 產生 `[min, max]`（含端點）間每隔 `step` 的編碼字串。
///
/// 以整數 tick（`min + i * step`）計算，避免連加 0.25 之類造成的漂移。
/// `step <= 0`、`min > max`、任何非有限參數，或超過 [`MAX_RANGE_TICKS`] 個間隔，
/// 都回傳空序列。
pub fn generate_range(min: f64, max: f64, step: f64) -> Vec<String> {
    let finite = min.is_finite() && max.is_finite() && step.is_finite();
    if !finite || step <= 0.0 || min > max {
        return Vec::new();
    }

    let ticks = ((max - min) / step + RANGE_EPSILON).floor();
    if ticks > MAX_RANGE_TICKS {
        return Vec::new();
    }

    (0..=ticks as usize)
        .map(|i| format_power(min + i as f64 * step))
        .collect()
}

fn to_hundredths(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

fn encode_power(value: f64) -> String {
    let (negative, digits) = if value.abs() < SCALED_LIMIT {
        let hundredths = to_hundredths(value);
        let magnitude = hundredths.unsigned_abs();
        (
            hundredths < 0,
            format!("{:02}.{:02}", magnitude / 100, magnitude % 100),
        )
    } else {
        (value < 0.0, format!("{:.2}", value.abs()))
    };

    let sign = if negative { '-' } else { '+' };
    format!("{}{}", sign, digits)
}

fn power_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)$").expect("power pattern is a valid regex")
    })
}

/// 一個已確認為有限值的度數（屈光度）。
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Power(f64);

impl Power {
    pub fn new(value: f64) -> Option<Self> {
        value.is_finite().then_some(Self(value))
    }

    /// 解析使用者輸入，接受 `1`、`1.0`、`+1.00`、`-0.25`、`.5` 等寫法。
    /// `field` 只用於錯誤訊息（例如 `SPH`、`CYL`）。
    pub fn parse(field: &str, text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let invalid = || LensError::InvalidPowerError {
            field: field.to_string(),
            value: text.to_string(),
        };

        if !power_pattern().is_match(trimmed) {
            return Err(invalid());
        }

        trimmed
            .parse::<f64>()
            .ok()
            .and_then(Power::new)
            .ok_or_else(invalid)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn encode(self) -> String {
        format_power(self.0)
    }

    pub fn sign(self) -> PowerSign {
        let hundredths = (self.0 * 100.0).round();
        if hundredths < 0.0 {
            PowerSign::Negative
        } else if hundredths == 0.0 {
            PowerSign::Zero
        } else {
            PowerSign::Positive
        }
    }
}

impl fmt::Display for Power {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for Power {
    type Err = LensError;

    fn from_str(s: &str) -> Result<Self> {
        Power::parse("power", s)
    }
}

/// 顯示用的正負分類（負值與非負值用不同顏色）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerSign {
    Negative,
    Zero,
    Positive,
}

impl PowerSign {
    /// 無法解析的文字視為 `Zero`（中性色）。
    pub fn of_text(text: &str) -> Self {
        Power::parse("power", text)
            .map(Power::sign)
            .unwrap_or(PowerSign::Zero)
    }
}

/// 單一處方：球鏡 + 柱鏡（不含軸度）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prescription {
    pub sphere: Power,
    pub cylinder: Power,
}

/// 正規化後的查詢鍵
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncodedPrescription {
    pub sph: String,
    pub cyl: String,
}

impl Prescription {
    pub fn new(sphere: Power, cylinder: Power) -> Self {
        Self { sphere, cylinder }
    }

    pub fn parse(sph: &str, cyl: &str) -> Result<Self> {
        Ok(Self::new(Power::parse("SPH", sph)?, Power::parse("CYL", cyl)?))
    }

    pub fn canonical(&self) -> Self {
        let (sph, cyl) = transpose(self.sphere.value(), self.cylinder.value());
        Self {
            sphere: Power(sph),
            cylinder: Power(cyl),
        }
    }

    pub fn encode(&self) -> EncodedPrescription {
        let canonical = self.canonical();
        EncodedPrescription {
            sph: canonical.sphere.encode(),
            cyl: canonical.cylinder.encode(),
        }
    }
}

/// 度數選單的範圍設定
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl PowerRange {
    pub const SPHERE: PowerRange = PowerRange {
        min: -20.0,
        max: 20.0,
        step: 0.25,
    };

    pub const CYLINDER: PowerRange = PowerRange {
        min: -6.0,
        max: 6.0,
        step: 0.25,
    };

    pub fn values(&self) -> Vec<String> {
        generate_range(self.min, self.max, self.step)
    }
}
