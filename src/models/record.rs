//! 输入与结果的数据结构

use serde::{Deserialize, Serialize};

/// 检测失败（校验失败或重试耗尽）时写入的语言标记
pub const DETECTION_ERROR: &str = "detection error";

/// 一个页面上爬取到的所有句子
///
/// 爬虫输出的 JSON 中句子列表的键名是 `content`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceGroup {
    #[serde(rename = "pageName")]
    pub page_name: String,
    #[serde(rename = "content", alias = "sentences", default)]
    pub sentences: Vec<String>,
}

impl SentenceGroup {
    pub fn new(page_name: impl Into<String>, sentences: Vec<String>) -> Self {
        Self {
            page_name: page_name.into(),
            sentences,
        }
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }
}

/// 单句的检测结果，创建后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    #[serde(rename = "PageName")]
    pub page_name: String,
    #[serde(rename = "Sentence")]
    pub sentence: String,
    #[serde(rename = "Language")]
    pub language: String,
}

impl ClassificationRecord {
    pub fn new(
        page_name: impl Into<String>,
        sentence: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            page_name: page_name.into(),
            sentence: sentence.into(),
            language: language.into(),
        }
    }

    /// 检测失败的结果
    pub fn detection_error(page_name: impl Into<String>, sentence: impl Into<String>) -> Self {
        Self::new(page_name, sentence, DETECTION_ERROR)
    }

    pub fn is_error(&self) -> bool {
        self.language == DETECTION_ERROR
    }

    /// 按字段取值，供过滤和排序使用
    pub fn field(&self, field: RecordField) -> &str {
        match field {
            RecordField::PageName => &self.page_name,
            RecordField::Sentence => &self.sentence,
            RecordField::Language => &self.language,
        }
    }
}

/// 结果字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    PageName,
    Sentence,
    Language,
}

impl RecordField {
    /// 序列化时使用的列名
    pub fn column_name(self) -> &'static str {
        match self {
            RecordField::PageName => "PageName",
            RecordField::Sentence => "Sentence",
            RecordField::Language => "Language",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentence_group_accepts_scraper_format() {
        let json = r#"[{"pageName":"Home","content":["Hello world","Bonjour"]}]"#;
        let groups: Vec<SentenceGroup> = serde_json::from_str(json).unwrap();
        assert_eq!(groups[0].page_name, "Home");
        assert_eq!(groups[0].len(), 2);

        let json = r#"{"pageName":"About","sentences":["Hi"]}"#;
        let group: SentenceGroup = serde_json::from_str(json).unwrap();
        assert_eq!(group.sentences, vec!["Hi".to_string()]);
    }

    #[test]
    fn test_record_serializes_with_column_names() {
        let record = ClassificationRecord::new("Home", "Hello world", "english");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["PageName"], "Home");
        assert_eq!(value["Sentence"], "Hello world");
        assert_eq!(value["Language"], "english");
    }

    #[test]
    fn test_detection_error_record() {
        let record = ClassificationRecord::detection_error("Home", "");
        assert!(record.is_error());
        assert_eq!(record.field(RecordField::Language), DETECTION_ERROR);
    }
}
