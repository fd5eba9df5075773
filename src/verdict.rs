use std::fmt;

use serde::Serialize;

/// 判定为"很可能是同一物品"的分数下限（不含）
pub const HIGH_THRESHOLD: f32 = 0.85;
/// 判定为"风格相近"的分数下限（不含）
pub const MEDIUM_THRESHOLD: f32 = 0.70;

/// 相似度分数的定性结论
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    High,
    Medium,
    Low,
}

impl Verdict {
    /// 按固定阈值把余弦相似度分数映射为定性结论
    ///
    /// [-1, 1] 全区间都有归属：score > 0.85 为 High，0.70 < score <= 0.85
    /// 为 Medium，其余为 Low。两处边界都是严格大于，落在阈值上归入下一档。
    pub fn classify(score: f32) -> Self {
        if score > HIGH_THRESHOLD {
            Verdict::High
        } else if score > MEDIUM_THRESHOLD {
            Verdict::Medium
        } else {
            Verdict::Low
        }
    }

    /// 展示给操作者的结论文案
    pub fn comment(&self) -> &'static str {
        match self {
            Verdict::High => "很可能是同一物品，或同一场景的照片",
            Verdict::Medium => "风格相近，但不一定是同一物品",
            Verdict::Low => "相似度不高，可能是新的物品",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Verdict::High => "high",
            Verdict::Medium => "medium",
            Verdict::Low => "low",
        };
        f.write_str(text)
    }
}
