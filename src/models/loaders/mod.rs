pub mod json_loader;

pub use json_loader::{load_page_texts, parse_page_texts};
