use std::path::PathBuf;

use thiserror::Error;

/// 照片库操作的错误分类
///
/// 调用方通常只需要 anyhow 的错误链，这里单独建枚举是为了让上层能区分
/// "拒绝操作"（重名、容量满）和 "数据有问题"（文件损坏、照片库为空）。
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// 照片库目录里没有任何参考照片
    #[error("照片库为空，找不到任何可用的参考照片: {0}")]
    EmptyCorpus(PathBuf),
    /// 特征索引没有任何行，无法完成匹配
    #[error("特征索引为空，无法匹配")]
    EmptyIndex,
    /// 文件存在但无法解码为图片
    #[error("无法读取图片 {path}: {reason}")]
    UnreadableImage { path: PathBuf, reason: String },
    /// 模型权重加载失败，属于进程级的致命错误
    #[error("嵌入模型不可用: {reason}")]
    ModelUnavailable { reason: String },
    /// 照片库中已经存在同名文件，拒绝覆盖
    #[error("文件名已存在，请改名后重新上传: {name}")]
    DuplicateFilename { name: String },
    /// 照片库已经达到容量上限
    #[error("照片库已达到容量上限（{limit} 张），拒绝添加")]
    CapacityExceeded { limit: usize },
}
