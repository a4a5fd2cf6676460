//! Search query preparation.
//!
//! The raw issue text is journalist phrasing, not a search query: filler
//! phrases are stripped, known compound proper nouns are quoted to force
//! exact matching, and the subject company's canonical name is prepended
//! when absent.

/// Canonical name of the subject company.
pub const COMPANY_NAME: &str = "포스코인터내셔널";

/// Filler phrases that carry no search signal.
const FILLER_PHRASES: &[&str] = &[
    // Longest first so partial overlaps don't leave fragments behind
    "관련 문의드립니다",
    "관련 문의",
    "문의드립니다",
    "해명 요구",
    "해명 요청",
    "입장 문의",
    "에 대한",
    "에 대해",
    "확인 부탁드립니다",
    "답변 부탁드립니다",
];

/// Compound proper nouns wrapped in quotes so the search API keeps them whole.
const COMPOUND_NOUNS: &[&str] = &[
    "미얀마 가스전",
    "포스코인터내셔널",
    "구동모터코아",
    "세넥스에너지",
    "주요사업별 실적",
];

/// Build the search query for an issue text.
pub fn prepare(issue_text: &str) -> String {
    let mut text = issue_text.to_string();

    for filler in FILLER_PHRASES {
        text = text.replace(filler, " ");
    }

    for noun in COMPOUND_NOUNS {
        if text.contains(noun) && !text.contains(&format!("\"{noun}\"")) {
            text = text.replace(noun, &format!("\"{noun}\""));
        }
    }

    let mut query = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if !query.contains(COMPANY_NAME) {
        query = format!("\"{COMPANY_NAME}\" {query}");
    }

    query
}

/// Terms used for relevance scoring: whitespace tokens of the prepared
/// query with quoting stripped, two characters or longer.
pub fn scoring_terms(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(|t| t.trim_matches('"'))
        .filter(|t| t.chars().count() >= 2)
        .map(String::from)
        .collect()
}
