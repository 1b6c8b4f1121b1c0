pub mod format;
pub mod loaders;
pub mod record;

pub use format::OutputFormat;
pub use loaders::load_page_texts;
pub use record::{ClassificationRecord, RecordField, SentenceGroup, DETECTION_ERROR};
