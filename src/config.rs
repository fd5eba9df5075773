use std::path::PathBuf;
use std::sync::LazyLock;

use clap::{Parser, Subcommand};
use directories::ProjectDirs;

use crate::cli::*;
use crate::embed::EmbedModel;

static CORPUS_DIR: LazyLock<PathBuf> = LazyLock::new(|| {
    let proj_dirs = ProjectDirs::from("", "", "photomatch").expect("failed to get project dir");
    proj_dirs.data_dir().join("photos")
});

fn default_corpus_dir() -> &'static str {
    CORPUS_DIR.to_str().unwrap()
}

#[derive(Parser, Debug, Clone)]
pub struct EmbedOptions {
    /// 使用的预训练视觉模型
    #[arg(long, value_enum, value_name = "MODEL", default_value_t = EmbedModel::ClipVitB32)]
    pub model: EmbedModel,
    /// 模型权重的缓存目录，默认使用 fastembed 的内置位置
    #[arg(long, value_name = "DIR")]
    pub model_cache: Option<PathBuf>,
    /// 下载模型权重时显示进度
    #[arg(long)]
    pub download_progress: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct CorpusOptions {
    /// 照片库接收的照片数量上限，0 表示不限制
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub max_photos: usize,
}

impl CorpusOptions {
    /// 把命令行的 0 值翻译成"不限制"
    pub fn limit(&self) -> Option<usize> {
        (self.max_photos > 0).then_some(self.max_photos)
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "photomatch", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
    /// 参考照片库目录
    #[arg(short, long, value_name = "DIR", default_value = default_corpus_dir())]
    pub corpus_dir: PathBuf,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// 用一张新照片在照片库中检索最相似的参考照片
    Search(SearchCommand),
    /// 添加一张参考照片到照片库
    Add(AddCommand),
    /// 列出照片库中的参考照片和拍摄时间
    List(ListCommand),
}
