use anyhow::Result;
use clap::Parser;
use serde_json::json;

use crate::PhotoArchiveBuilder;
use crate::cli::{OutputFormat, SubCommandExtend};
use crate::config::Opts;
use crate::metadata;

#[derive(Parser, Debug, Clone)]
pub struct ListCommand {
    /// 输出格式
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    pub output_format: OutputFormat,
}

impl SubCommandExtend for ListCommand {
    fn run(&self, opts: &Opts) -> Result<()> {
        let archive = PhotoArchiveBuilder::new(&opts.corpus_dir).open()?;
        let photos = archive.photos();
        match self.output_format {
            OutputFormat::Json => {
                let rows: Vec<_> = photos
                    .iter()
                    .map(|path| json!({ "path": path, "capture_time": metadata::capture_time(path) }))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            }
            OutputFormat::Table => {
                for path in &photos {
                    println!("{}\t{}", path.display(), metadata::capture_time(path));
                }
                println!("照片库中共有 {} 张照片", photos.len());
            }
        }
        Ok(())
    }
}
