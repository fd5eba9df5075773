#![allow(dead_code)]

use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::Result;
use image::{Rgb, RgbImage};
use photomatch::embed::EmbeddingBackend;

/// 基于平均颜色的确定性嵌入后端，不依赖任何模型权重
///
/// 相同的像素输入产生相同的向量，纯色图片之间的相似度接近 0，
/// 足以驱动匹配管线的全部测试。
pub struct MeanColorEmbedding;

impl EmbeddingBackend for MeanColorEmbedding {
    fn dimension(&self) -> usize {
        3
    }

    fn normalized(&self) -> bool {
        false
    }

    fn encode(&mut self, images: &[RgbImage]) -> Result<Vec<Vec<f32>>> {
        Ok(images
            .iter()
            .map(|img| {
                let mut sum = [0f64; 3];
                for px in img.pixels() {
                    for c in 0..3 {
                        sum[c] += px.0[c] as f64;
                    }
                }
                let n = (img.width() * img.height()).max(1) as f64;
                // 每个分量加 1，避免纯黑图片变成零向量
                sum.iter().map(|s| (s / n + 1.0) as f32).collect()
            })
            .collect())
    }
}

/// 包装 MeanColorEmbedding 并记录每次批量编码的图片数
///
/// 查询编码总是单张图片，多于一张的批量只会来自索引构建，
/// 据此可以数出索引实际被构建了几次。
pub struct CountingBackend {
    inner: MeanColorEmbedding,
    batch_sizes: Vec<usize>,
}

impl CountingBackend {
    pub fn new() -> Self {
        Self { inner: MeanColorEmbedding, batch_sizes: Vec::new() }
    }

    /// 至今发生的索引构建批量，按发生顺序给出每批的图片数
    pub fn corpus_batches(&self) -> Vec<usize> {
        self.batch_sizes.iter().copied().filter(|n| *n > 1).collect()
    }
}

impl EmbeddingBackend for CountingBackend {
    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn normalized(&self) -> bool {
        self.inner.normalized()
    }

    fn encode(&mut self, images: &[RgbImage]) -> Result<Vec<Vec<f32>>> {
        self.batch_sizes.push(images.len());
        self.inner.encode(images)
    }
}

/// 写一张 8x8 的纯色图片，格式由扩展名决定
pub fn solid_image(dir: &Path, name: &str, rgb: [u8; 3]) -> PathBuf {
    let path = dir.join(name);
    RgbImage::from_pixel(8, 8, Rgb(rgb)).save(&path).unwrap();
    path
}

/// 一张 8x8 纯色 PNG 的字节内容
pub fn png_bytes(rgb: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(8, 8, Rgb(rgb));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

pub const RED: [u8; 3] = [255, 0, 0];
pub const GREEN: [u8; 3] = [0, 255, 0];
pub const BLUE: [u8; 3] = [0, 0, 255];
