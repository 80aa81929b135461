//! Search query sanitization.
//!
//! Conversational input makes a poor search query; this strips the
//! conversation out of it before any store or provider sees it.

use regex::Regex;
use std::sync::OnceLock;

/// Maximum sanitized query length in characters.
const MAX_QUERY_LEN: usize = 150;

/// Conversational fillers and question scaffolding removed from queries.
const FILLER_PATTERNS: &[&str] = &[
    r"\bi don'?t know\b",
    r"\bcan you\b",
    r"\bcould you\b",
    r"\bplease\b",
    r"\bgive me\b",
    r"\bshow me\b",
    r"\bsome of them\b",
    r"\bprovide\b",
    r"\bwhat is\b",
    r"\bwhat are\b",
    r"\bhow (do|to|can|should)\b",
    r"\bwhy (do|does|is|are)\b",
    r"\bwhere (do|does|is|are)\b",
    r"\bhelp\b",
    r"\btell me\b",
];

fn filler_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!("({})", FILLER_PATTERNS.join("|")))
            .unwrap_or_else(|e| unreachable!("filler regex is static: {e}"))
    })
}

fn punctuation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[^\w\s-]").unwrap_or_else(|e| unreachable!("punctuation regex is static: {e}"))
    })
}

fn whitespace_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\s+").unwrap_or_else(|e| unreachable!("whitespace regex is static: {e}"))
    })
}

/// Sanitizes a raw topic or learner utterance into a search query:
/// ASCII-fold, strip fillers, drop punctuation except dashes, collapse
/// whitespace, truncate.
#[must_use]
pub fn sanitize_query(raw: &str) -> String {
    // Best-effort ASCII fold: keep ASCII, drop the rest.
    let ascii: String = raw.chars().filter(char::is_ascii).collect();
    let lowered = ascii.to_lowercase();

    let without_fillers = filler_regex().replace_all(&lowered, " ");
    let without_punctuation = punctuation_regex().replace_all(&without_fillers, " ");
    let collapsed = whitespace_regex()
        .replace_all(&without_punctuation, " ")
        .trim()
        .to_string();

    if collapsed.len() > MAX_QUERY_LEN {
        // Truncate on a word boundary within the cap.
        let mut cut = MAX_QUERY_LEN;
        while cut > 0 && !collapsed.is_char_boundary(cut) {
            cut -= 1;
        }
        collapsed[..cut]
            .rsplit_once(' ')
            .map_or_else(|| collapsed[..cut].to_string(), |(head, _)| head.to_string())
    } else {
        collapsed
    }
}

/// Builds the final search query from a topic plus optional building-type
/// context, always anchored to the domain.
#[must_use]
pub fn build_search_query(topic: &str, building_type: Option<&str>) -> String {
    let mut parts = vec![sanitize_query(topic)];
    if let Some(bt) = building_type {
        if bt != "general" {
            parts.push(bt.replace('_', " "));
        }
    }
    parts.push("architecture".to_string());
    let query = parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if query.len() > MAX_QUERY_LEN {
        sanitize_query(&query)
    } else {
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_fillers_and_punctuation() {
        let query = sanitize_query("Can you please show me what is adaptive reuse?!");
        assert_eq!(query, "adaptive reuse");
    }

    #[test]
    fn test_keeps_dashes() {
        let query = sanitize_query("mixed-use circulation");
        assert_eq!(query, "mixed-use circulation");
    }

    #[test]
    fn test_drops_non_ascii() {
        let query = sanitize_query("café façade daylighting");
        assert_eq!(query, "caf faade daylighting");
    }

    #[test]
    fn test_truncates_long_input_on_word_boundary() {
        let long = "daylight ".repeat(40);
        let query = sanitize_query(&long);
        assert!(query.len() <= 150);
        assert!(!query.ends_with(' '));
        assert!(query.ends_with("daylight"));
    }

    #[test]
    fn test_build_search_query_appends_context() {
        let query = build_search_query("courtyard circulation", Some("community_center"));
        assert_eq!(query, "courtyard circulation community center architecture");

        let query = build_search_query("courtyard", Some("general"));
        assert_eq!(query, "courtyard architecture");

        let query = build_search_query("courtyard", None);
        assert_eq!(query, "courtyard architecture");
    }

    #[test]
    fn test_empty_input_yields_domain_anchor() {
        assert_eq!(build_search_query("", None), "architecture");
    }
}
