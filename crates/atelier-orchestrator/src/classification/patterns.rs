//! Stage-A pattern rules.
//!
//! Ordered keyword-family matching over the lower-cased input. The first
//! matching rule wins; rule order encodes precedence. These rules are fully
//! deterministic, which is what makes classification repeatable under the
//! round-trip law.

use super::types::InteractionType;
use crate::state::ConversationState;

/// Phrases that ask the tutor to do the design work.
const DIRECT_ANSWER_PATTERNS: &[&str] = &[
    "can you design",
    "design this for me",
    "design it for me",
    "do it for me",
    "make it for me",
    "complete design",
    "full design",
    "finished design",
    "what should i design",
    "give me the answer",
    "give me the solution",
    "tell me what to do",
    "just tell me",
    "solve this for me",
];

/// Keywords that gate example-request detection.
const EXAMPLE_KEYWORDS: &[&str] =
    &["example", "precedent", "case stud", "reference", "project"];

/// Phrasings that, combined with an example keyword, ask for precedents.
const EXAMPLE_REQUEST_PATTERNS: &[&str] = &[
    "show me",
    "give me",
    "provide",
    "need",
    "can you give",
    "can you show",
    "can i get",
    "i want to see",
    "i'd like to see",
    "precedent",
    "case stud",
    "built projects",
    "real projects",
    "inspiration",
];

/// Knowledge-seeking phrasings.
const KNOWLEDGE_REQUEST_PATTERNS: &[&str] = &[
    "tell me about",
    "what are",
    "what is",
    "explain",
    "describe",
    "how does",
    "why does",
    "when should",
    "where should",
    "can you explain",
    "can you describe",
    "definition of",
    "meaning of",
    "concept of",
    "what should i consider",
    "what considerations",
    "what factors",
    "what aspects",
    "curious about",
    "wondering about",
    "i need to understand",
    "i want to learn",
    "i want to know about",
];

/// Review-seeking phrasings.
const FEEDBACK_PATTERNS: &[&str] = &[
    "feedback",
    "review my",
    "critique",
    "evaluate my",
    "assess my",
    "what do you think",
    "how is this",
    "is this good",
    "am i on track",
    "your thoughts",
    "your opinion",
    "your take",
];

/// Design-guidance phrasings.
const DESIGN_GUIDANCE_PATTERNS: &[&str] = &[
    "how should i",
    "how should we",
    "what approach",
    "what strategy",
    "organize around",
    "help me organize",
    "can you help me",
    "could you help me",
    "i need help with",
    "can you guide me",
    "i need guidance",
    "guidance on",
    "i need advice",
    "advice on",
    "can you suggest",
    "suggestions for",
    "what should i",
    "what should my",
    "how would you approach",
];

/// Confusion phrasings. These dominate every other rule.
const CONFUSION_PATTERNS: &[&str] = &[
    "confused",
    "don't understand",
    "do not understand",
    "unclear",
    "i'm lost",
    "i am lost",
    "i'm stuck",
    "i am stuck",
    "struggling",
    "what does this mean",
    "what does that mean",
    "i don't get it",
    "doesn't make sense",
    "this is confusing",
    "makes no sense",
];

/// Indicators that the question is about codes and standards.
const TECHNICAL_INDICATORS: &[&str] = &[
    "requirement",
    "requirements",
    "standard",
    "standards",
    "code",
    "codes",
    "regulation",
    "regulations",
    "specification",
    "specifications",
    "ada",
    "ibc",
    "building code",
    "clear-width",
    "clearance",
    "egress",
    "fire rating",
];

/// Project self-description phrasings.
const PROJECT_DESCRIPTION_PATTERNS: &[&str] = &[
    "i am designing",
    "i'm designing",
    "i am working on",
    "i'm working on",
    "i am creating",
    "i'm creating",
    "my project is",
    "my design is",
    "i have a project",
    "this is my project",
];

/// Improvement-seeking phrasings.
const IMPROVEMENT_PATTERNS: &[&str] = &[
    "improve",
    "make it better",
    "make this better",
    "enhance",
    "optimize",
    "refine",
    "what should i change",
    "how can i make",
];

/// Future-action phrasings announcing implementation.
const IMPLEMENTATION_PATTERNS: &[&str] = &[
    "i'll start by",
    "i will start",
    "i'll begin with",
    "i plan to",
    "i'm going to",
    "i am going to",
    "let me try",
    "i'll try",
    "i will try",
    "first i'll",
    "next i'll",
    "then i'll",
    "my approach is",
    "i'm thinking of",
    "i'd like to test",
];

/// Words a tutor question typically opens with.
const QUESTION_STARTERS: &[&str] = &[
    "what", "how", "why", "where", "when", "which", "who", "can", "could", "would", "do",
    "does", "is", "are", "have", "tell",
];

/// First-person markers of an answer rather than a new request.
const RESPONSE_MARKERS: &[&str] = &[
    "i think",
    "i would",
    "i want",
    "i believe",
    "i'd",
    "i feel",
    "i guess",
    "my ",
    "because",
    "yes",
    "no,",
    "probably",
    "maybe",
    "it depends",
];

/// Words that describe a design situation, used by the response-content
/// sub-classifier.
const DESIGN_ASPECT_WORDS: &[&str] = &[
    "circulation",
    "lighting",
    "daylight",
    "structure",
    "material",
    "program",
    "context",
    "site",
    "space",
    "spatial",
    "courtyard",
    "facade",
    "entrance",
    "layout",
    "form",
    "massing",
];

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Whether the input carries confusion phrasing. This check also runs as a
/// final precedence pass over both classification stages.
#[must_use]
pub fn contains_confusion_phrasing(input: &str) -> bool {
    contains_any(&input.to_lowercase(), CONFUSION_PATTERNS)
}

/// Whether the input reads as an example/precedent request on its own,
/// independent of rule ordering. The router uses this for the pure-example
/// and cooling-off rules.
#[must_use]
pub fn is_example_request_text(input: &str) -> bool {
    let lower = input.to_lowercase();
    contains_any(&lower, EXAMPLE_KEYWORDS) && contains_any(&lower, EXAMPLE_REQUEST_PATTERNS)
}

/// Whether the input carries technical code/standard indicators.
#[must_use]
pub fn has_technical_indicators(input: &str) -> bool {
    let lower = input.to_lowercase();
    contains_any(&lower, TECHNICAL_INDICATORS)
}

/// Whether the latest learner input answers the tutor's previous question.
#[must_use]
pub fn is_response_to_previous_question(input: &str, state: &ConversationState) -> bool {
    let Some(previous) = state.assistant_message_before_last_user() else {
        return false;
    };
    let previous_lower = previous.content.to_lowercase();
    let asked_question = previous.content.contains('?')
        || QUESTION_STARTERS
            .iter()
            .any(|starter| previous_lower.starts_with(starter));
    if !asked_question {
        return false;
    }

    let input_lower = input.to_lowercase();
    // An input that is itself a question is a new request, not an answer.
    !input.trim_end().ends_with('?') && contains_any(&input_lower, RESPONSE_MARKERS)
}

/// Classifies the content of an answer to a previous tutor question.
///
/// Answers that describe the design situation become `DesignProblem` (the
/// common case); bare acknowledgements stay `QuestionResponse`.
#[must_use]
pub fn classify_response_content(input: &str) -> InteractionType {
    let lower = input.to_lowercase();
    if contains_any(&lower, CONFUSION_PATTERNS) {
        return InteractionType::ConfusionExpression;
    }
    if contains_any(&lower, DESIGN_ASPECT_WORDS) || lower.split_whitespace().count() > 12 {
        return InteractionType::DesignProblem;
    }
    InteractionType::QuestionResponse
}

/// Stage-A ordered rule matching. Returns the interaction type and whether
/// the input was a response to the tutor's previous question.
///
/// The rule order is the precedence table; the first match wins.
#[must_use]
pub fn match_interaction_type(
    input: &str,
    state: &ConversationState,
) -> (InteractionType, bool) {
    let lower = input.to_lowercase();

    // 1. Direct answer seeking.
    if contains_any(&lower, DIRECT_ANSWER_PATTERNS) {
        return (InteractionType::DirectAnswerRequest, false);
    }

    // 2. Response to the tutor's previous question, classified by content.
    if is_response_to_previous_question(input, state) {
        return (classify_response_content(input), true);
    }

    // 3. Example/precedent request.
    if is_example_request_text(input) {
        return (InteractionType::ExampleRequest, false);
    }

    // 4. Knowledge request, unless example keywords or technical indicators
    //    pull it elsewhere.
    if !contains_any(&lower, EXAMPLE_KEYWORDS)
        && !has_technical_indicators(input)
        && contains_any(&lower, KNOWLEDGE_REQUEST_PATTERNS)
    {
        return (InteractionType::KnowledgeRequest, false);
    }

    // 4.5. Review-seeking.
    if contains_any(&lower, FEEDBACK_PATTERNS) {
        return (InteractionType::FeedbackRequest, false);
    }

    // 5. Design guidance.
    if contains_any(&lower, DESIGN_GUIDANCE_PATTERNS) {
        return (InteractionType::DesignGuidanceRequest, false);
    }

    // 6. Confusion.
    if contains_any(&lower, CONFUSION_PATTERNS) {
        return (InteractionType::ConfusionExpression, false);
    }

    // 7. Technical code/standard question.
    if has_technical_indicators(input)
        && (lower.contains("what is")
            || lower.contains("what are")
            || lower.contains("how to")
            || input.contains('?'))
    {
        return (InteractionType::TechnicalQuestion, false);
    }

    // 8. Project self-description.
    if contains_any(&lower, PROJECT_DESCRIPTION_PATTERNS) {
        return (InteractionType::ProjectDescription, false);
    }

    // 9. Improvement seeking.
    if contains_any(&lower, IMPROVEMENT_PATTERNS) {
        return (InteractionType::ImprovementSeeking, false);
    }

    // 10. Implementation / future action.
    if contains_any(&lower, IMPLEMENTATION_PATTERNS) {
        return (InteractionType::ImplementationRequest, false);
    }

    // 11/12. Default on the question mark.
    if input.trim_end().ends_with('?') {
        (InteractionType::GeneralQuestion, false)
    } else {
        (InteractionType::GeneralStatement, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_state() -> ConversationState {
        ConversationState::with_brief("Design a 2000 m2 community center.")
    }

    fn classify(input: &str) -> InteractionType {
        match_interaction_type(input, &empty_state()).0
    }

    #[test]
    fn test_direct_answer_request_wins_first() {
        assert_eq!(classify("Design this for me please"), InteractionType::DirectAnswerRequest);
        assert_eq!(
            classify("Can you design the whole floor plan? Show me examples too."),
            InteractionType::DirectAnswerRequest
        );
    }

    #[test]
    fn test_example_request_needs_example_keyword() {
        assert_eq!(
            classify("Can you give me some precedent projects?"),
            InteractionType::ExampleRequest
        );
        assert_eq!(
            classify("Show me adaptive reuse precedents for a community center."),
            InteractionType::ExampleRequest
        );
    }

    #[test]
    fn test_knowledge_request_without_example_keywords() {
        assert_eq!(
            classify("Tell me about passive cooling strategies"),
            InteractionType::KnowledgeRequest
        );
        assert_eq!(classify("What is spatial hierarchy?"), InteractionType::KnowledgeRequest);
    }

    #[test]
    fn test_technical_question_beats_knowledge_on_indicators() {
        assert_eq!(
            classify("What are the ADA clear-width requirements for a corridor?"),
            InteractionType::TechnicalQuestion
        );
        assert_eq!(
            classify("What is the egress requirement for assembly spaces?"),
            InteractionType::TechnicalQuestion
        );
    }

    #[test]
    fn test_design_guidance_phrasings() {
        assert_eq!(
            classify("How should I organize circulation around the central courtyard?"),
            InteractionType::DesignGuidanceRequest
        );
        assert_eq!(
            classify("What approach makes sense for the entry sequence"),
            InteractionType::DesignGuidanceRequest
        );
    }

    #[test]
    fn test_confusion_detection() {
        assert_eq!(
            classify("I don't understand what spatial organization means."),
            InteractionType::ConfusionExpression
        );
        assert!(contains_confusion_phrasing("honestly this is confusing"));
        assert!(!contains_confusion_phrasing("the plan is clear"));
    }

    #[test]
    fn test_project_description_and_implementation() {
        assert_eq!(
            classify("I am designing a community center on a sloped site"),
            InteractionType::ProjectDescription
        );
        assert_eq!(
            classify("I'll start by sketching the site section"),
            InteractionType::ImplementationRequest
        );
        assert_eq!(classify("I plan to test a courtyard scheme"), InteractionType::ImplementationRequest);
    }

    #[test]
    fn test_improvement_seeking() {
        assert_eq!(
            classify("How can I make the entry sequence better"),
            InteractionType::ImprovementSeeking
        );
        assert_eq!(classify("I need to refine the roofline"), InteractionType::ImprovementSeeking);
    }

    #[test]
    fn test_feedback_request() {
        assert_eq!(
            classify("What do you think of my parti diagram so far"),
            InteractionType::FeedbackRequest
        );
    }

    #[test]
    fn test_question_mark_fallback() {
        assert_eq!(classify("Courtyards?"), InteractionType::GeneralQuestion);
        assert_eq!(classify("Nice weather today"), InteractionType::GeneralStatement);
        assert_eq!(classify(""), InteractionType::GeneralStatement);
    }

    #[test]
    fn test_response_to_previous_question() {
        let mut state = empty_state();
        state.add_user_message("I am designing a community center.");
        state.add_assistant_message("What site constraints shape your massing?");
        state.add_user_message("I think the slope pushes the program into two levels.");

        let (interaction, is_response) = match_interaction_type(
            "I think the slope pushes the program into two levels.",
            &state,
        );
        assert!(is_response);
        // Mentions massing-adjacent design content, so it reads as a design problem.
        assert_eq!(interaction, InteractionType::DesignProblem);
    }

    #[test]
    fn test_short_acknowledgement_is_question_response() {
        let mut state = empty_state();
        state.add_user_message("Starting out.");
        state.add_assistant_message("Have you visited the site yet?");
        state.add_user_message("Yes, I walked it twice.");

        let (interaction, is_response) =
            match_interaction_type("Yes, I walked it twice.", &state);
        assert!(is_response);
        assert_eq!(interaction, InteractionType::QuestionResponse);
    }

    #[test]
    fn test_question_is_not_treated_as_answer() {
        let mut state = empty_state();
        state.add_user_message("Starting out.");
        state.add_assistant_message("Have you considered daylight?");
        state.add_user_message("What is daylight factor?");

        let (interaction, is_response) =
            match_interaction_type("What is daylight factor?", &state);
        assert!(!is_response);
        assert_eq!(interaction, InteractionType::KnowledgeRequest);
    }
}
