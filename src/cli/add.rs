use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::PhotoArchiveBuilder;
use crate::cli::SubCommandExtend;
use crate::config::{CorpusOptions, Opts};

#[derive(Parser, Debug, Clone)]
pub struct AddCommand {
    #[command(flatten)]
    pub corpus: CorpusOptions,
    /// 要加入照片库的图片文件
    pub file: PathBuf,
    /// 存入照片库时使用的文件名，默认沿用原文件名
    #[arg(short, long, value_name = "NAME")]
    pub name: Option<String>,
}

impl SubCommandExtend for AddCommand {
    fn run(&self, opts: &Opts) -> Result<()> {
        let bytes =
            fs::read(&self.file).with_context(|| format!("读取 {} 失败", self.file.display()))?;
        let name = match &self.name {
            Some(name) => name.clone(),
            None => self
                .file
                .file_name()
                .and_then(|name| name.to_str())
                .context("无法从路径推断文件名，请用 --name 指定")?
                .to_string(),
        };

        let mut archive =
            PhotoArchiveBuilder::new(&opts.corpus_dir).corpus_options(&self.corpus).open()?;
        let target = archive.add_photo(&name, &bytes)?;
        println!("已加入照片库: {}", target.display());
        Ok(())
    }
}
