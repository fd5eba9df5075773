use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use image::RgbImage;
use log::{debug, info, warn};
use ndarray::{Array2, ArrayView2};
use walkdir::WalkDir;

use crate::embed::EmbeddingBackend;
use crate::error::ArchiveError;
use crate::matcher;

/// 参考照片允许的扩展名，大小写不敏感
pub const PHOTO_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// 构建索引时被跳过的文件和原因
#[derive(Debug, Clone)]
pub struct SkippedPhoto {
    pub path: PathBuf,
    pub reason: String,
}

/// 照片库的内存特征索引
///
/// embeddings 的第 i 行与 paths[i] 一一对应，这一对应关系由构建过程保证。
/// 索引只会整体重建，从不原地修改。
#[derive(Debug)]
pub struct CorpusIndex {
    embeddings: Array2<f32>,
    paths: Vec<PathBuf>,
    skipped: Vec<SkippedPhoto>,
}

impl CorpusIndex {
    /// 直接用现成的矩阵和路径列表组装索引
    pub fn from_parts(embeddings: Array2<f32>, paths: Vec<PathBuf>) -> Self {
        assert_eq!(embeddings.nrows(), paths.len(), "索引行数与路径数不一致");
        Self { embeddings, paths, skipped: vec![] }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn embeddings(&self) -> ArrayView2<'_, f32> {
        self.embeddings.view()
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// 第 i 行对应的参考照片路径，i 超出行数时返回 None
    pub fn path(&self, i: usize) -> Option<&Path> {
        self.paths.get(i).map(PathBuf::as_path)
    }

    /// 构建过程中被跳过的文件
    pub fn skipped(&self) -> &[SkippedPhoto] {
        &self.skipped
    }
}

/// 扫描照片库目录并构建特征索引
///
/// # Arguments
///
/// * `dir` - 参考照片目录，只扫描第一层
/// * `backend` - 嵌入后端
/// * `max_photos` - 接收的照片数量上限，None 表示不限制
///
/// 候选文件按路径排序后再截断，同一目录反复构建得到相同的索引。
/// 单个文件解码失败只会被跳过并记录警告，不会中断整个构建。
pub fn build(
    dir: &Path,
    backend: &mut dyn EmbeddingBackend,
    max_photos: Option<usize>,
) -> Result<CorpusIndex> {
    let mut candidates = scan_photos(dir);
    if candidates.is_empty() {
        return Err(ArchiveError::EmptyCorpus(dir.to_path_buf()).into());
    }
    if let Some(max) = max_photos {
        candidates.truncate(max);
    }

    let mut images = Vec::new();
    let mut paths = Vec::new();
    let mut skipped = Vec::new();
    for path in candidates {
        match open_rgb(&path) {
            Ok(img) => {
                images.push(img);
                paths.push(path);
            }
            Err(e) => {
                warn!("跳过无法读取的图片 {}: {}", path.display(), e);
                skipped.push(SkippedPhoto { path, reason: e.to_string() });
            }
        }
    }
    if images.is_empty() {
        return Err(ArchiveError::EmptyCorpus(dir.to_path_buf()).into());
    }

    debug!("开始编码 {} 张参考照片", images.len());
    let mut vectors = backend.encode(&images)?;
    if !backend.normalized() {
        for v in &mut vectors {
            matcher::l2_normalize(v);
        }
    }

    let dim = backend.dimension();
    let mut flat = Vec::with_capacity(paths.len() * dim);
    for (vector, path) in vectors.iter().zip(&paths) {
        if vector.len() != dim {
            bail!("{} 的向量维度为 {}，与模型维度 {} 不一致", path.display(), vector.len(), dim);
        }
        flat.extend_from_slice(vector);
    }
    let embeddings = Array2::from_shape_vec((paths.len(), dim), flat)?;

    info!("索引构建完成: {} 张照片，跳过 {} 个文件", paths.len(), skipped.len());
    Ok(CorpusIndex { embeddings, paths, skipped })
}

/// 枚举目录第一层的参考照片，结果按路径排序
pub fn scan_photos(dir: &Path) -> Vec<PathBuf> {
    let mut photos: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_photo_ext(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    photos.sort();
    photos
}

/// 判断文件名是否带有受支持的图片扩展名
pub fn is_photo_ext(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| PHOTO_EXTENSIONS.iter().any(|ok| ext.eq_ignore_ascii_case(ok)))
        .unwrap_or(false)
}

/// 打开一张图片并统一转换为 RGB 三通道
pub fn open_rgb(path: &Path) -> Result<RgbImage> {
    let decoded = image::ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| unreadable(path, e))?
        .decode()
        .map_err(|e| unreadable(path, e))?;
    Ok(decoded.to_rgb8())
}

fn unreadable(path: &Path, e: impl ToString) -> anyhow::Error {
    ArchiveError::UnreadableImage { path: path.to_path_buf(), reason: e.to_string() }.into()
}
