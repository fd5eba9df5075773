use anyhow::{Context, Result};
use clap::ValueEnum;
use fastembed::{ImageEmbedding, ImageEmbeddingModel, ImageInitOptions};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use log::{debug, info};

use crate::config::EmbedOptions;
use crate::error::ArchiveError;

/// 嵌入后端的统一接口
///
/// 后端把一张 RGB 图片映射为定长实值向量。相同的模型版本加上相同的像素
/// 输入必须产生相同的输出，匹配结果才可复现。图片在进入后端之前已经统一
/// 为 RGB 三通道，后端不需要处理其他布局。
pub trait EmbeddingBackend {
    /// 输出向量的维度
    fn dimension(&self) -> usize;
    /// 输出是否已经是单位向量，为 false 时由调用方在比较之前归一化
    fn normalized(&self) -> bool;
    /// 批量编码，输出顺序与输入顺序一一对应
    fn encode(&mut self, images: &[RgbImage]) -> Result<Vec<Vec<f32>>>;
}

/// 可选的预训练视觉模型
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedModel {
    /// OpenAI CLIP ViT-B/32，512 维
    ClipVitB32,
    /// ResNet-50，2048 维
    Resnet50,
    /// Unicom ViT-B/32，512 维
    UnicomVitB32,
    /// Unicom ViT-L/14，768 维
    UnicomVitL14,
    /// Nomic Embed Vision v1.5，768 维
    NomicEmbedVisionV15,
}

impl EmbedModel {
    fn to_fastembed(self) -> ImageEmbeddingModel {
        match self {
            EmbedModel::ClipVitB32 => ImageEmbeddingModel::ClipVitB32,
            EmbedModel::Resnet50 => ImageEmbeddingModel::Resnet50,
            EmbedModel::UnicomVitB32 => ImageEmbeddingModel::UnicomVitB32,
            EmbedModel::UnicomVitL14 => ImageEmbeddingModel::UnicomVitL14,
            EmbedModel::NomicEmbedVisionV15 => ImageEmbeddingModel::NomicEmbedVisionV15,
        }
    }

    /// 模型输出向量的维度
    pub fn dimension(self) -> usize {
        match self {
            EmbedModel::ClipVitB32 | EmbedModel::UnicomVitB32 => 512,
            EmbedModel::UnicomVitL14 | EmbedModel::NomicEmbedVisionV15 => 768,
            EmbedModel::Resnet50 => 2048,
        }
    }
}

/// 基于 fastembed 预训练视觉模型的嵌入后端
pub struct ClipEmbedding {
    model: ImageEmbedding,
    dimension: usize,
}

impl ClipEmbedding {
    /// 加载模型权重
    ///
    /// 首次使用时 fastembed 会自动下载权重到缓存目录。加载失败属于进程级
    /// 致命错误，不做任何降级。
    pub fn load(opts: &EmbedOptions) -> Result<Self> {
        let mut init = ImageInitOptions::new(opts.model.to_fastembed())
            .with_show_download_progress(opts.download_progress);
        if let Some(dir) = &opts.model_cache {
            init = init.with_cache_dir(dir.clone());
        }

        info!("正在加载嵌入模型 {:?}", opts.model);
        let model = ImageEmbedding::try_new(init)
            .map_err(|e| ArchiveError::ModelUnavailable { reason: e.to_string() })?;
        Ok(Self { model, dimension: opts.model.dimension() })
    }
}

impl EmbeddingBackend for ClipEmbedding {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn normalized(&self) -> bool {
        // fastembed 的图像模型输出不保证是单位向量
        false
    }

    fn encode(&mut self, images: &[RgbImage]) -> Result<Vec<Vec<f32>>> {
        // 已解码的像素重新编码为无损 PNG 再交给 fastembed 的预处理管线，
        // 无法解码的文件在进入这里之前就已经被隔离
        let mut encoded = Vec::with_capacity(images.len());
        for img in images {
            let mut buf = Vec::new();
            PngEncoder::new(&mut buf)
                .write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgb8)
                .context("图片重编码失败")?;
            encoded.push(buf);
        }

        debug!("批量编码 {} 张图片", encoded.len());
        let refs: Vec<&[u8]> = encoded.iter().map(|buf| buf.as_slice()).collect();
        let embeddings = self.model.embed_bytes(&refs, None).context("嵌入模型推理失败")?;
        Ok(embeddings)
    }
}
