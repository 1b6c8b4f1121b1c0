//! 结果输出 - 业务能力层
//!
//! 只负责"把结果写成文件"，支持 JSON / XML / CSV，超过阈值时 gzip 压缩

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use tokio::fs;
use tracing::{debug, info};

use crate::config::{CompressionConfig, Config};
use crate::error::{AppError, AppResult};
use crate::models::{ClassificationRecord, OutputFormat, RecordField};

/// 输出文件名前缀
pub const FILE_PREFIX: &str = "language_detection";
/// 压缩文件后缀
pub const COMPRESSED_SUFFIX: &str = "gz";
/// XML 根节点
pub const XML_ROOT: &str = "LanguageDetectionResults";
/// XML 中每条记录的节点名
pub const XML_RECORD: &str = "results";

const COLUMNS: [RecordField; 3] = [
    RecordField::PageName,
    RecordField::Sentence,
    RecordField::Language,
];

/// 结果管理器
///
/// 职责：
/// - 序列化结果集合
/// - 写入输出目录，按需压缩
/// - 提供过滤、排序的派生视图（不修改输入）
#[derive(Debug, Clone)]
pub struct ResultsManager {
    output_dir: PathBuf,
    compression: CompressionConfig,
    /// 生成文件名时间戳的时钟
    clock: fn() -> DateTime<Utc>,
}

impl ResultsManager {
    /// 创建结果管理器，输出目录不存在时自动创建
    pub fn new(output_dir: impl Into<PathBuf>, compression: CompressionConfig) -> AppResult<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self {
            output_dir,
            compression,
            clock: Utc::now,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        Self::new(&config.output_dir, config.compression.clone())
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// 清空输出目录中的内容（目录本身保留）
    ///
    /// # 返回
    /// 返回删除的条目数量
    pub async fn clear_output_dir(&self) -> AppResult<usize> {
        let mut removed = 0;
        let mut entries = fs::read_dir(&self.output_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                fs::remove_dir_all(&path).await?;
            } else {
                fs::remove_file(&path).await?;
            }
            debug!("已删除: {}", path.display());
            removed += 1;
        }

        if removed > 0 {
            info!("🧹 已清理输出目录 {}，删除 {} 项", self.output_dir.display(), removed);
        }
        Ok(removed)
    }

    /// 保存结果
    ///
    /// # 返回
    /// 返回实际写入的文件路径（压缩时带 `.gz` 后缀）
    pub async fn save_results(
        &self,
        records: &[ClassificationRecord],
        format: OutputFormat,
    ) -> AppResult<PathBuf> {
        let content = serialize(records, format)?;
        let file_name = format!("{}.{}", timestamped_name((self.clock)()), format.extension());
        let output_path = self.output_dir.join(file_name);

        if self.compression.enabled && content.len() > self.compression.threshold {
            let compressed = compress(content.as_bytes())?;
            let compressed_path = with_suffix(&output_path, COMPRESSED_SUFFIX);
            fs::write(&compressed_path, &compressed).await?;
            debug!(
                "{} 输出 {} 字节，压缩后 {} 字节",
                format,
                content.len(),
                compressed.len()
            );
            Ok(compressed_path)
        } else {
            fs::write(&output_path, content.as_bytes()).await?;
            Ok(output_path)
        }
    }

    /// 按字段相等过滤，所有条件都满足才保留
    pub fn filter_results(
        records: &[ClassificationRecord],
        filters: &[(RecordField, &str)],
    ) -> Vec<ClassificationRecord> {
        records
            .iter()
            .filter(|r| filters.iter().all(|(field, value)| r.field(*field) == *value))
            .cloned()
            .collect()
    }

    /// 按字段排序（稳定排序），返回新的集合
    pub fn sort_results(
        records: &[ClassificationRecord],
        field: RecordField,
        ascending: bool,
    ) -> Vec<ClassificationRecord> {
        let mut sorted = records.to_vec();
        sorted.sort_by(|a, b| {
            let ordering = a.field(field).cmp(b.field(field));
            if ascending {
                ordering
            } else {
                ordering.reverse()
            }
        });
        sorted
    }
}

/// `language_detection_<UTC 时间戳>`，`:` 和 `.` 替换为 `-` 以便用作文件名
pub fn timestamped_name(now: DateTime<Utc>) -> String {
    format!("{}_{}", FILE_PREFIX, now.format("%Y-%m-%dT%H-%M-%S-%3fZ"))
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".");
    os.push(suffix);
    PathBuf::from(os)
}

/// 序列化为指定格式
pub fn serialize(records: &[ClassificationRecord], format: OutputFormat) -> AppResult<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(records)?),
        OutputFormat::Xml => to_xml(records),
        OutputFormat::Csv => Ok(to_csv(records)),
    }
}

/// CSV：固定表头，字段包含逗号、引号或换行时加引号并把引号加倍
pub fn to_csv(records: &[ClassificationRecord]) -> String {
    let header = COLUMNS
        .iter()
        .map(|c| c.column_name())
        .collect::<Vec<_>>()
        .join(",");

    let rows = records.iter().map(|r| {
        COLUMNS
            .iter()
            .map(|c| escape_csv_field(r.field(*c)))
            .collect::<Vec<_>>()
            .join(",")
    });

    std::iter::once(header)
        .chain(rows)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn escape_csv_field(field: &str) -> String {
    if field.contains(&['"', ',', '\n'][..]) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn xml_error(err: impl std::fmt::Display) -> AppError {
    AppError::serialization("xml", err)
}

/// XML：`<LanguageDetectionResults>` 下每条记录一个 `<results>`
pub fn to_xml(records: &[ClassificationRecord]) -> AppResult<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .map_err(xml_error)?;
    writer
        .write_event(Event::Start(BytesStart::new(XML_ROOT)))
        .map_err(xml_error)?;

    for record in records {
        writer
            .write_event(Event::Start(BytesStart::new(XML_RECORD)))
            .map_err(xml_error)?;
        for column in COLUMNS {
            let name = column.column_name();
            writer
                .write_event(Event::Start(BytesStart::new(name)))
                .map_err(xml_error)?;
            writer
                .write_event(Event::Text(BytesText::new(record.field(column))))
                .map_err(xml_error)?;
            writer
                .write_event(Event::End(BytesEnd::new(name)))
                .map_err(xml_error)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(XML_RECORD)))
            .map_err(xml_error)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(XML_ROOT)))
        .map_err(xml_error)?;

    String::from_utf8(writer.into_inner()).map_err(xml_error)
}

fn compress(content: &[u8]) -> AppResult<Vec<u8>> {
    let gzip_error = |e: std::io::Error| AppError::serialization(COMPRESSED_SUFFIX, e);
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content).map_err(gzip_error)?;
    encoder.finish().map_err(gzip_error)
}
