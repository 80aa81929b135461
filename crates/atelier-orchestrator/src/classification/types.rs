//! Classification value types.

use serde::{Deserialize, Serialize};

/// What kind of move the learner just made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    /// Asking to be taught a concept.
    KnowledgeRequest,
    /// Asking for precedents, case studies, references.
    ExampleRequest,
    /// Asking for a review of their work.
    FeedbackRequest,
    /// Asking about codes, standards, requirements.
    TechnicalQuestion,
    /// Expressing confusion.
    ConfusionExpression,
    /// Asking how to approach a design move.
    DesignGuidanceRequest,
    /// Stating a design problem to work through.
    DesignProblem,
    /// Asking the tutor to do the design work.
    DirectAnswerRequest,
    /// Asking how to make existing work better.
    ImprovementSeeking,
    /// Announcing a next step ("I'll start by...").
    ImplementationRequest,
    /// Describing their project.
    ProjectDescription,
    /// A plain statement.
    GeneralStatement,
    /// A plain question.
    GeneralQuestion,
    /// Answering the tutor's previous question.
    QuestionResponse,
}

impl InteractionType {
    /// Stable string form used in metadata and prompts.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            InteractionType::KnowledgeRequest => "knowledge_request",
            InteractionType::ExampleRequest => "example_request",
            InteractionType::FeedbackRequest => "feedback_request",
            InteractionType::TechnicalQuestion => "technical_question",
            InteractionType::ConfusionExpression => "confusion_expression",
            InteractionType::DesignGuidanceRequest => "design_guidance_request",
            InteractionType::DesignProblem => "design_problem",
            InteractionType::DirectAnswerRequest => "direct_answer_request",
            InteractionType::ImprovementSeeking => "improvement_seeking",
            InteractionType::ImplementationRequest => "implementation_request",
            InteractionType::ProjectDescription => "project_description",
            InteractionType::GeneralStatement => "general_statement",
            InteractionType::GeneralQuestion => "general_question",
            InteractionType::QuestionResponse => "question_response",
        }
    }

    /// Manual-override types skip the LLM's interaction-type verdict; the
    /// pattern stage is authoritative for them.
    #[must_use]
    pub fn is_manual_override(self) -> bool {
        matches!(
            self,
            InteractionType::ConfusionExpression
                | InteractionType::DirectAnswerRequest
                | InteractionType::ImplementationRequest
                | InteractionType::ExampleRequest
                | InteractionType::FeedbackRequest
                | InteractionType::TechnicalQuestion
                | InteractionType::ImprovementSeeking
        )
    }

    /// Parses the snake_case form produced by the LLM stage.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "knowledge_request" => Some(InteractionType::KnowledgeRequest),
            "example_request" => Some(InteractionType::ExampleRequest),
            "feedback_request" => Some(InteractionType::FeedbackRequest),
            "technical_question" => Some(InteractionType::TechnicalQuestion),
            "confusion_expression" => Some(InteractionType::ConfusionExpression),
            "design_guidance_request" => Some(InteractionType::DesignGuidanceRequest),
            "design_problem" => Some(InteractionType::DesignProblem),
            "direct_answer_request" => Some(InteractionType::DirectAnswerRequest),
            "improvement_seeking" => Some(InteractionType::ImprovementSeeking),
            "implementation_request" => Some(InteractionType::ImplementationRequest),
            "project_description" => Some(InteractionType::ProjectDescription),
            "general_statement" => Some(InteractionType::GeneralStatement),
            "general_question" => Some(InteractionType::GeneralQuestion),
            "question_response" => Some(InteractionType::QuestionResponse),
            _ => None,
        }
    }
}

/// How well the learner understands the material at hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnderstandingLevel {
    /// Struggling with fundamentals.
    Low,
    /// Working knowledge.
    #[default]
    Medium,
    /// Fluent.
    High,
}

impl UnderstandingLevel {
    /// Parses the snake_case form produced by the LLM stage.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(UnderstandingLevel::Low),
            "medium" => Some(UnderstandingLevel::Medium),
            "high" => Some(UnderstandingLevel::High),
            _ => None,
        }
    }
}

/// How sure of themselves the learner sounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    /// Hedging, asking for reassurance.
    Uncertain,
    /// Appropriately confident.
    #[default]
    Confident,
    /// Certain beyond their evidence.
    Overconfident,
}

impl ConfidenceLevel {
    /// Parses the snake_case form produced by the LLM stage.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "uncertain" => Some(ConfidenceLevel::Uncertain),
            "confident" => Some(ConfidenceLevel::Confident),
            "overconfident" => Some(ConfidenceLevel::Overconfident),
            _ => None,
        }
    }
}

/// How invested the learner is in the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EngagementLevel {
    /// Terse, disengaged.
    Low,
    /// Participating.
    #[default]
    Medium,
    /// Driving the conversation.
    High,
}

impl EngagementLevel {
    /// Parses the snake_case form produced by the LLM stage.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(EngagementLevel::Low),
            "medium" => Some(EngagementLevel::Medium),
            "high" => Some(EngagementLevel::High),
            _ => None,
        }
    }
}

/// Whether this turn continues a question the tutor asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThreadContext {
    /// A fresh turn.
    #[default]
    NormalTurn,
    /// The learner is answering the tutor's last question.
    AnsweringPreviousQuestion,
}

/// Full classification of one learner input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreClassification {
    /// The kind of move the learner made.
    pub interaction_type: InteractionType,
    /// Understanding axis.
    pub understanding_level: UnderstandingLevel,
    /// Confidence axis.
    pub confidence_level: ConfidenceLevel,
    /// Engagement axis.
    pub engagement_level: EngagementLevel,
    /// Input answers the tutor's previous question.
    pub is_response_to_question: bool,
    /// Input asks about codes/standards.
    pub is_technical_question: bool,
    /// Input asks for a review.
    pub is_feedback_request: bool,
    /// Confusion phrasing present.
    pub shows_confusion: bool,
    /// Overconfidence signals present.
    pub demonstrates_overconfidence: bool,
    /// Confidence in this classification, in [0,1]. Pattern overrides score
    /// at least 0.85; otherwise the LLM's self-confidence.
    pub classification_confidence: f64,
    /// Thread continuity marker.
    pub thread_context: ThreadContext,
}

impl Default for CoreClassification {
    fn default() -> Self {
        Self {
            interaction_type: InteractionType::GeneralStatement,
            understanding_level: UnderstandingLevel::Medium,
            confidence_level: ConfidenceLevel::Confident,
            engagement_level: EngagementLevel::Medium,
            is_response_to_question: false,
            is_technical_question: false,
            is_feedback_request: false,
            shows_confusion: false,
            demonstrates_overconfidence: false,
            classification_confidence: 0.5,
            thread_context: ThreadContext::NormalTurn,
        }
    }
}

impl CoreClassification {
    /// The degenerate classification used when the context agent fails.
    #[must_use]
    pub fn fallback() -> Self {
        Self { classification_confidence: 0.4, ..Self::default() }
    }
}
