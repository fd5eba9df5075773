use anyhow::Result;
use ndarray::ArrayView1;

use crate::corpus::CorpusIndex;
use crate::error::ArchiveError;

/// 计算两个向量的余弦相似度
///
/// 使用 f64 累加，避免长向量上的精度损失。任何一方是零向量、空向量，
/// 或两者长度不一致时返回 0.0，不会 panic。
pub fn cosine_similarity(a: ArrayView1<f32>, b: ArrayView1<f32>) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0f64;
    let mut norm_a = 0f64;
    let mut norm_b = 0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    (dot / denom) as f32
}

/// 原地把向量归一化为单位长度，零向量保持不变
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x = (*x as f64 / norm) as f32;
        }
    }
}

/// 在索引的所有行里找到与查询向量最相似的一行，返回（行号, 分数）
///
/// 分数相同时取语料顺序里最先出现的行，同一份照片库的匹配结果可复现。
pub fn best_match(query: ArrayView1<f32>, index: &CorpusIndex) -> Result<(usize, f32)> {
    if index.is_empty() {
        return Err(ArchiveError::EmptyIndex.into());
    }
    let embeddings = index.embeddings();
    let mut best = (0, cosine_similarity(query, embeddings.row(0)));
    for (i, row) in embeddings.rows().into_iter().enumerate().skip(1) {
        let score = cosine_similarity(query, row);
        if score > best.1 {
            best = (i, score);
        }
    }
    Ok(best)
}

/// 返回全部行按分数降序排列的（行号, 分数）列表
///
/// 稳定排序，分数相同的行保持语料顺序。
pub fn rank(query: ArrayView1<f32>, index: &CorpusIndex) -> Result<Vec<(usize, f32)>> {
    if index.is_empty() {
        return Err(ArchiveError::EmptyIndex.into());
    }
    let mut scored: Vec<(usize, f32)> = index
        .embeddings()
        .rows()
        .into_iter()
        .enumerate()
        .map(|(i, row)| (i, cosine_similarity(query, row)))
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    Ok(scored)
}
