use std::convert::Infallible;
use std::io::Read;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::json;

use crate::PhotoArchiveBuilder;
use crate::archive::MatchResult;
use crate::cli::SubCommandExtend;
use crate::config::{CorpusOptions, EmbedOptions, Opts};
use crate::embed::ClipEmbedding;

#[derive(Parser, Debug, Clone)]
pub struct SearchCommand {
    #[command(flatten)]
    pub embed: EmbedOptions,
    #[command(flatten)]
    pub corpus: CorpusOptions,
    /// 新照片的路径，传 "-" 时从标准输入读取
    pub photo: PathBuf,
    /// 显示的结果数量
    #[arg(long, value_name = "COUNT", default_value_t = 1)]
    pub count: usize,
    /// 输出格式
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    pub output_format: OutputFormat,
}

impl SubCommandExtend for SearchCommand {
    fn run(&self, opts: &Opts) -> Result<()> {
        let mut backend = ClipEmbedding::load(&self.embed)?;
        let mut archive =
            PhotoArchiveBuilder::new(&opts.corpus_dir).corpus_options(&self.corpus).open()?;

        if self.photo.as_os_str() == "-" {
            let mut bytes = Vec::new();
            std::io::stdin().read_to_end(&mut bytes).context("读取标准输入失败")?;
            if self.count > 1 {
                let results =
                    archive.rank_matches_bytes(&mut backend, "stdin", &bytes, self.count)?;
                return print_ranked(&results, self);
            }
            let result = archive.find_match_bytes(&mut backend, "stdin", &bytes)?;
            return print_single(&result, self);
        }

        if self.count > 1 {
            let results = archive.rank_matches(&mut backend, &self.photo, self.count)?;
            print_ranked(&results, self)
        } else {
            let result = archive.find_match(&mut backend, &self.photo)?;
            print_single(&result, self)
        }
    }
}

fn print_single(result: &MatchResult, opts: &SearchCommand) -> Result<()> {
    match opts.output_format {
        OutputFormat::Json => {
            let value = json!({
                "path": result.path,
                "score": result.score,
                "capture_time": result.capture_time,
                "verdict": result.verdict(),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Table => {
            println!("最相似的参考照片: {}", result.path.display());
            println!("相似度分数: {:.4}", result.score);
            println!("拍摄时间: {}", result.capture_time);
            println!("结论: {}", result.verdict().comment());
        }
    }
    Ok(())
}

fn print_ranked(results: &[MatchResult], opts: &SearchCommand) -> Result<()> {
    match opts.output_format {
        OutputFormat::Json => {
            let rows: Vec<_> = results
                .iter()
                .map(|r| {
                    json!({
                        "path": r.path,
                        "score": r.score,
                        "capture_time": r.capture_time,
                        "verdict": r.verdict(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Table => {
            for r in results {
                println!("{:.4}\t{}\t{}", r.score, r.path.display(), r.capture_time);
            }
        }
    }
    Ok(())
}

#[derive(ValueEnum, Debug, Clone)]
pub enum OutputFormat {
    Json,
    Table,
}

impl FromStr for OutputFormat {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "table" => Ok(Self::Table),
            _ => unreachable!(),
        }
    }
}
