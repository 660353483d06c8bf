//! Retrieval-augmented question answering.

pub mod context;
pub mod pipeline;
pub mod types;

pub use context::build_context;
pub use pipeline::{QaPipeline, DEFAULT_RETRIEVAL_MULTIPLIER};
pub use types::{
    AnswerOutcome, QaResponse, QualityReport, NO_DOCUMENTS_MESSAGE, NO_RELEVANT_DOCUMENTS_MESSAGE,
};
