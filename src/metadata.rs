use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, Local};
use exif::{In, Tag, Value};
use log::debug;

/// 连文件修改时间都拿不到时的兜底文案
pub const UNKNOWN_TIME: &str = "unknown time";

/// EXIF 时间标签的查找顺序：拍摄时间、修改时间、数字化时间
const TIME_TAGS: [Tag; 3] = [Tag::DateTimeOriginal, Tag::DateTime, Tag::DateTimeDigitized];

/// 尽力恢复一张照片的拍摄时间
///
/// 依次尝试 EXIF 时间标签，返回第一个命中标签的原始字符串（EXIF 惯用的
/// `YYYY:MM:DD HH:MM:SS` 格式）。照片没有 EXIF 信息或解析失败时退回文件
/// 修改时间，连修改时间都拿不到时返回 "unknown time"。
/// 本函数从不失败，任何照片都能得到一个字符串。
pub fn capture_time(path: &Path) -> String {
    if let Some(time) = exif_time(path) {
        return time;
    }
    match std::fs::metadata(path).and_then(|meta| meta.modified()) {
        Ok(mtime) => DateTime::<Local>::from(mtime).format("%Y:%m:%d %H:%M:%S").to_string(),
        Err(e) => {
            debug!("读取 {} 的修改时间失败: {}", path.display(), e);
            UNKNOWN_TIME.to_string()
        }
    }
}

/// 按标签优先级在照片的 EXIF 里找时间，任何一步失败都静默回退
fn exif_time(path: &Path) -> Option<String> {
    let file = File::open(path).ok()?;
    let exif = exif::Reader::new().read_from_container(&mut BufReader::new(file)).ok()?;
    TIME_TAGS
        .iter()
        .find_map(|&tag| exif.get_field(tag, In::PRIMARY).and_then(field_text))
        .filter(|text| !text.is_empty())
}

/// 取出单个字段自身的字符串值
fn field_text(field: &exif::Field) -> Option<String> {
    match &field.value {
        Value::Ascii(lines) => {
            lines.first().map(|line| {
                String::from_utf8_lossy(line).trim_end_matches('\0').trim().to_string()
            })
        }
        _ => Some(field.display_value().to_string()),
    }
}
