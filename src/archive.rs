use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use log::{debug, info};
use ndarray::Array1;
use serde::Serialize;

use crate::config::CorpusOptions;
use crate::corpus::{self, CorpusIndex};
use crate::embed::EmbeddingBackend;
use crate::error::ArchiveError;
use crate::matcher;
use crate::metadata;
use crate::utils::StagedUpload;
use crate::verdict::Verdict;

/// 一次匹配的结果
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    /// 照片库中最相似的参考照片
    pub path: PathBuf,
    /// 余弦相似度分数，范围 [-1, 1]
    pub score: f32,
    /// 参考照片的拍摄时间
    pub capture_time: String,
}

impl MatchResult {
    /// 由分数派生的定性结论
    pub fn verdict(&self) -> Verdict {
        Verdict::classify(self.score)
    }
}

pub struct PhotoArchive {
    corpus_dir: PathBuf,
    max_photos: Option<usize>,
    index: Option<CorpusIndex>,
}

pub struct PhotoArchiveBuilder {
    corpus_dir: PathBuf,
    max_photos: Option<usize>,
}

impl PhotoArchiveBuilder {
    pub fn new(corpus_dir: impl Into<PathBuf>) -> Self {
        Self { corpus_dir: corpus_dir.into(), max_photos: None }
    }

    /// 照片库的容量上限，None 表示不限制
    pub fn max_photos(mut self, max: Option<usize>) -> Self {
        self.max_photos = max;
        self
    }

    /// 接受命令行的照片库参数
    pub fn corpus_options(self, opts: &CorpusOptions) -> Self {
        self.max_photos(opts.limit())
    }

    /// 创建照片库实例，目录不存在时先创建
    pub fn open(self) -> Result<PhotoArchive> {
        fs::create_dir_all(&self.corpus_dir)
            .with_context(|| format!("创建照片库目录 {} 失败", self.corpus_dir.display()))?;
        Ok(PhotoArchive { corpus_dir: self.corpus_dir, max_photos: self.max_photos, index: None })
    }
}

impl PhotoArchive {
    pub fn corpus_dir(&self) -> &Path {
        &self.corpus_dir
    }

    /// 返回特征索引，必要时先构建
    ///
    /// 索引在第一次使用时构建，之后一直复用，直到 invalidate 或一次成功的
    /// add_photo 使其失效。重建总是整体进行，新索引完整构建出来之后才替换
    /// 旧索引，构建失败时旧缓存保持不变。
    pub fn index(&mut self, backend: &mut dyn EmbeddingBackend) -> Result<&CorpusIndex> {
        let index = match self.index.take() {
            Some(index) => index,
            None => corpus::build(&self.corpus_dir, backend, self.max_photos)?,
        };
        Ok(self.index.insert(index))
    }

    /// 丢弃缓存的索引，下一次匹配时整体重建
    pub fn invalidate(&mut self) {
        if self.index.take().is_some() {
            debug!("特征索引已失效，下次匹配时重建");
        }
    }

    /// 用一张新照片在照片库中寻找最相似的参考照片
    ///
    /// 查询照片本身无法解码时本次查询失败，但不影响照片库和缓存的索引。
    pub fn find_match(
        &mut self,
        backend: &mut dyn EmbeddingBackend,
        photo: &Path,
    ) -> Result<MatchResult> {
        let query = query_embedding(backend, photo)?;
        let index = self.index(backend)?;
        let (best, score) = matcher::best_match(query.view(), index)?;
        let path = index.path(best).context("匹配结果超出索引范围")?.to_path_buf();
        let capture_time = metadata::capture_time(&path);
        info!("最相似的参考照片: {} 分数 {:.4}", path.display(), score);
        Ok(MatchResult { path, score, capture_time })
    }

    /// 与 find_match 相同，但照片以字节形式提交
    pub fn find_match_bytes(
        &mut self,
        backend: &mut dyn EmbeddingBackend,
        filename: &str,
        bytes: &[u8],
    ) -> Result<MatchResult> {
        let staged = StagedUpload::stage(filename, bytes)?;
        self.find_match(backend, staged.path())
    }

    /// 返回按相似度降序排列的前 count 个匹配
    pub fn rank_matches(
        &mut self,
        backend: &mut dyn EmbeddingBackend,
        photo: &Path,
        count: usize,
    ) -> Result<Vec<MatchResult>> {
        let query = query_embedding(backend, photo)?;
        let index = self.index(backend)?;
        let mut ranked = matcher::rank(query.view(), index)?;
        ranked.truncate(count);
        let mut results = Vec::with_capacity(ranked.len());
        for (i, score) in ranked {
            let path = index.path(i).context("匹配结果超出索引范围")?.to_path_buf();
            let capture_time = metadata::capture_time(&path);
            results.push(MatchResult { path, score, capture_time });
        }
        Ok(results)
    }

    /// 与 rank_matches 相同，但照片以字节形式提交
    pub fn rank_matches_bytes(
        &mut self,
        backend: &mut dyn EmbeddingBackend,
        filename: &str,
        bytes: &[u8],
        count: usize,
    ) -> Result<Vec<MatchResult>> {
        let staged = StagedUpload::stage(filename, bytes)?;
        self.rank_matches(backend, staged.path(), count)
    }

    /// 向照片库写入一张新的参考照片
    ///
    /// 同名文件直接拒绝，不覆盖也不去重；配置了容量上限且已满时拒绝；
    /// 内容必须能解码为图片，坏文件不落盘。写入成功后缓存的索引立即失效，
    /// 下一次匹配就能看到新照片。
    pub fn add_photo(&mut self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        let name = Path::new(filename)
            .file_name()
            .and_then(|name| name.to_str())
            .context("无效的文件名")?
            .to_string();
        if !corpus::is_photo_ext(Path::new(&name)) {
            bail!("不支持的扩展名（仅接受 jpg/jpeg/png）: {name}");
        }

        let target = self.corpus_dir.join(&name);
        if target.exists() {
            return Err(ArchiveError::DuplicateFilename { name }.into());
        }
        if let Some(limit) = self.max_photos {
            let current = corpus::scan_photos(&self.corpus_dir).len();
            if current >= limit {
                return Err(ArchiveError::CapacityExceeded { limit }.into());
            }
        }

        // 落盘之前确认内容确实能解码
        image::load_from_memory(bytes).map_err(|e| ArchiveError::UnreadableImage {
            path: PathBuf::from(&name),
            reason: e.to_string(),
        })?;

        fs::write(&target, bytes)
            .with_context(|| format!("写入照片 {} 失败", target.display()))?;
        info!("已加入照片库: {}", target.display());
        self.invalidate();
        Ok(target)
    }

    /// 照片库中当前的参考照片，按路径排序
    pub fn photos(&self) -> Vec<PathBuf> {
        corpus::scan_photos(&self.corpus_dir)
    }
}

/// 计算查询照片的嵌入向量，后端输出不保证归一化时在这里归一化
fn query_embedding(backend: &mut dyn EmbeddingBackend, photo: &Path) -> Result<Array1<f32>> {
    let image = corpus::open_rgb(photo)?;
    let vectors = backend.encode(std::slice::from_ref(&image))?;
    let mut vector = vectors.into_iter().next().context("后端没有返回任何向量")?;
    if vector.len() != backend.dimension() {
        bail!("查询向量维度为 {}，与模型维度 {} 不一致", vector.len(), backend.dimension());
    }
    if !backend.normalized() {
        matcher::l2_normalize(&mut vector);
    }
    Ok(Array1::from_vec(vector))
}
