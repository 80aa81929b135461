//! Multi-level input classification.
//!
//! Stage A is ordered pattern matching over the lower-cased input; its
//! manual-override types bypass the LLM entirely. Stage B asks the LLM to
//! fill the remaining axes and falls back to a deterministic keyword
//! heuristic when the provider is unavailable. Pattern-detected confusion
//! dominates both stages.

mod content;
mod conversation;
mod patterns;
mod pipeline;
mod types;

pub use content::{extract_topics, ContentAnalysis, ContentAnalyzer, ContentQuality};
pub use conversation::{
    jaccard_overlap, ConversationPatternAnalyzer, ConversationPatterns, Trend,
};
pub use patterns::{
    contains_confusion_phrasing, is_example_request_text, match_interaction_type,
};
pub use pipeline::ClassificationPipeline;
pub use types::{
    ConfidenceLevel, CoreClassification, EngagementLevel, InteractionType, ThreadContext,
    UnderstandingLevel,
};
