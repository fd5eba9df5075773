use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

/// 上传照片的临时落盘守卫
///
/// 以字节形式提交的照片先写进一个独立的临时目录再按路径处理。守卫被
/// 丢弃时整个目录连同里面的文件一起删除，成功、出错、panic 展开都不会
/// 留下残留文件。
pub struct StagedUpload {
    _dir: TempDir,
    path: PathBuf,
}

impl StagedUpload {
    /// 把字节内容写成临时文件，文件名沿用上传时的名字
    pub fn stage(filename: &str, bytes: &[u8]) -> Result<Self> {
        let dir = TempDir::with_prefix("photomatch-")?;
        let name = Path::new(filename).file_name().context("无效的文件名")?;
        let path = dir.path().join(name);
        fs::write(&path, bytes).with_context(|| format!("写入临时文件 {} 失败", path.display()))?;
        Ok(Self { _dir: dir, path })
    }

    /// 临时文件的路径，仅在守卫存活期间有效
    pub fn path(&self) -> &Path {
        &self.path
    }
}
