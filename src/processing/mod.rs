//! Document processing pipeline: extraction cleanup, token-bounded chunking,
//! hierarchical summarization, and orchestration.

pub mod chunking;
pub mod normalize;
mod service;
mod summarize;
pub mod types;

pub use chunking::TokenChunker;
pub use normalize::clean_extracted_text;
pub use service::{PipelineApi, PipelineService, PipelineSettings};
pub use summarize::{LengthBounds, SummaryReduction};
pub use types::{
    ChunkingError, PipelineError, PipelineOutcome, PipelineStage, SubmissionOutcome,
};
