pub mod sentence_ctx;
pub mod sentence_flow;

pub use sentence_ctx::SentenceCtx;
pub use sentence_flow::SentenceFlow;
