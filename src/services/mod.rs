pub mod classifier;
pub mod llm_service;
pub mod progress_monitor;
pub mod results_manager;
pub mod validation;

pub use classifier::Classifier;
pub use llm_service::{LlmService, UNKNOWN_LANGUAGE};
pub use progress_monitor::{MetricsSummary, ProgressMonitor};
pub use results_manager::ResultsManager;
pub use validation::SentenceValidator;
