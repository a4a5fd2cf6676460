//! Department relevance ranking.
//!
//! Pure CPU scoring over the loaded department records. The weight table:
//! exact department-name hit 8.0, whole owned-issue-title hit 6.0 each,
//! extracted-keyword-inside-title hit 3.0 per title, exact keyword hit 4.0,
//! fuzzy (substring) keyword hit 2.0, domain bonus 1.5 per matched keyword.

use issuebrief_shared::{Department, DepartmentMatch};

/// Maximum departments attached to a report.
const MAX_MATCHES: usize = 3;

/// Standalone tokens dropped before keyword matching.
const STOP_WORDS: &[&str] = &[
    "관련", "문의", "및", "등", "대한", "대해", "위한", "요청", "확인", "부탁", "드립니다",
    "있는", "있습니다", "해당", "이번", "올해", "내년", "지난해", "향후", "주요",
];

/// Curated patterns kept as keywords even when tokenization would split them.
const IMPORTANT_PATTERNS: &[&str] = &[
    "식량사업",
    "미얀마 가스전",
    "가스전",
    "영업이익",
    "분기 실적",
    "사업별 실적",
    "압수수색",
    "희망퇴직",
    "탄소포집",
    "구동모터코아",
];

/// Trailing particles stripped from tokens longer than two characters.
const PARTICLES: &[char] = &['은', '는', '이', '가', '을', '를', '과', '와', '의', '에', '로'];

/// Domain term in the issue text → department-name fragment it boosts.
const DOMAIN_BONUS: &[(&str, &str)] = &[
    ("식량", "식량"),
    ("곡물", "식량"),
    ("팜", "식량"),
    ("에너지", "에너지"),
    ("가스전", "에너지"),
    ("LNG", "에너지"),
    ("철강", "철강"),
    ("모빌리티", "모빌리티"),
    ("실적", "IR"),
    ("공시", "IR"),
    ("재무", "IR"),
];

/// Extract matching keywords from the raw issue text: strip stop words,
/// keep tokens of length ≥ 2, and add any curated pattern present.
pub fn extract_keywords(issue_text: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();

    for pattern in IMPORTANT_PATTERNS {
        if issue_text.contains(pattern) && !keywords.iter().any(|k| k == pattern) {
            keywords.push((*pattern).to_string());
        }
    }

    for raw in issue_text.split(|c: char| c.is_whitespace() || ",.?!()[]\"'·:;".contains(c)) {
        let token = strip_particle(raw.trim());
        if token.chars().count() < 2 {
            continue;
        }
        if STOP_WORDS.contains(&token) {
            continue;
        }
        if !keywords.iter().any(|k| k == token) {
            keywords.push(token.to_string());
        }
    }

    keywords
}

/// Drop one trailing particle from tokens of three or more characters.
fn strip_particle(token: &str) -> &str {
    let mut chars = token.chars();
    let count = chars.clone().count();
    if count >= 3 {
        if let Some(last) = chars.next_back() {
            if PARTICLES.contains(&last) {
                return &token[..token.len() - last.len_utf8()];
            }
        }
    }
    token
}

/// Rank departments by relevance. Only departments with a positive score are
/// returned, sorted by score desc, priority asc, name asc, capped at 3.
pub fn rank(departments: &[Department], issue_text: &str) -> Vec<DepartmentMatch> {
    let keywords = extract_keywords(issue_text);

    let mut matches: Vec<DepartmentMatch> = departments
        .iter()
        .filter(|d| d.active)
        .filter_map(|d| {
            let (score, matched_terms) = score_department(d, issue_text, &keywords);
            (score > 0.0).then(|| DepartmentMatch {
                department: d.clone(),
                score,
                matched_terms,
            })
        })
        .collect();

    matches.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.department.priority.cmp(&b.department.priority))
            .then(a.department.name.cmp(&b.department.name))
    });
    matches.truncate(MAX_MATCHES);
    matches
}

fn score_department(
    department: &Department,
    issue_text: &str,
    keywords: &[String],
) -> (f64, Vec<String>) {
    let mut score = 0.0;
    let mut matched: Vec<String> = Vec::new();

    if issue_text.contains(&department.name) {
        score += 8.0;
        matched.push(department.name.clone());
    }

    for title in &department.owned_issues {
        if issue_text.contains(title.as_str()) {
            score += 6.0;
            matched.push(title.clone());
        } else if keywords.iter().any(|k| title.contains(k.as_str())) {
            score += 3.0;
            matched.push(title.clone());
        }
    }

    let mut keyword_hits = 0usize;
    for keyword in &department.keywords {
        if keywords.iter().any(|k| k == keyword) {
            score += 4.0;
            matched.push(keyword.clone());
            keyword_hits += 1;
        } else if issue_text.contains(keyword.as_str()) {
            score += 2.0;
            matched.push(keyword.clone());
            keyword_hits += 1;
        }
    }

    if keyword_hits > 0 {
        let domain_applies = DOMAIN_BONUS.iter().any(|(term, fragment)| {
            issue_text.contains(term) && department.name.contains(fragment)
        });
        if domain_applies {
            score += 1.5 * keyword_hits as f64;
        }
    }

    (score, matched)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dept(name: &str, keywords: &[&str], owned: &[&str], priority: i32) -> Department {
        Department {
            name: name.into(),
            owner: "담당자".into(),
            contacts: String::new(),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            owned_issues: owned.iter().map(|s| s.to_string()).collect(),
            priority,
            active: true,
        }
    }

    #[test]
    fn extracts_patterns_and_tokens() {
        let keywords =
            extract_keywords("포스코인터내셔널 식량사업 생산지, 주요 납품처, 올해 매출 계획 관련 문의");
        assert!(keywords.iter().any(|k| k == "식량사업"));
        assert!(keywords.iter().any(|k| k == "생산지"));
        // Stop words are dropped
        assert!(!keywords.iter().any(|k| k == "관련"));
        assert!(!keywords.iter().any(|k| k == "올해"));
    }

    #[test]
    fn short_tokens_are_dropped() {
        let keywords = extract_keywords("이 그 올해 매출 계획 관련 안내 부탁드립니다");
        assert!(!keywords.iter().any(|k| k == "이"));
        assert!(keywords.iter().any(|k| k == "매출"));
    }

    #[test]
    fn food_issue_ranks_food_department_first() {
        let departments = vec![
            dept("커뮤니케이션그룹", &["홍보", "보도"], &["언론 대응"], 1),
            dept(
                "식량사업부",
                &["식량", "곡물", "팜오일"],
                &["식량사업 실적", "곡물 조달"],
                2,
            ),
            dept("에너지사업부", &["가스전", "LNG"], &["미얀마 가스전"], 2),
        ];

        let ranked = rank(
            &departments,
            "포스코인터내셔널 식량사업 생산지, 주요 납품처, 올해 매출 계획 관련 문의",
        );
        assert!(!ranked.is_empty());
        assert_eq!(ranked[0].department.name, "식량사업부");
        assert!(ranked[0].score > 0.0);
        assert!(ranked.len() <= 3);
    }

    #[test]
    fn zero_hits_yield_empty_list() {
        let departments = vec![dept("식량사업부", &["식량"], &["식량사업 실적"], 2)];
        let ranked = rank(&departments, "날씨가 참 좋은 하루였습니다 그렇지 않나요 여러분");
        assert!(ranked.is_empty());
    }

    #[test]
    fn ties_break_by_priority_then_name() {
        let departments = vec![
            dept("나그룹", &["공통키워드"], &[], 2),
            dept("가그룹", &["공통키워드"], &[], 2),
            dept("다그룹", &["공통키워드"], &[], 1),
        ];
        let ranked = rank(&departments, "공통키워드 문제에 대해 문의드리고자 연락드립니다");
        assert_eq!(ranked[0].department.name, "다그룹");
        assert_eq!(ranked[1].department.name, "가그룹");
        assert_eq!(ranked[2].department.name, "나그룹");
    }

    #[test]
    fn inactive_departments_never_match() {
        let mut d = dept("식량사업부", &["식량"], &[], 2);
        d.active = false;
        let ranked = rank(
            std::slice::from_ref(&d),
            "식량 사업 현황 문의드립니다 자세한 답변 부탁드립니다",
        );
        assert!(ranked.is_empty());
    }

    #[test]
    fn cap_is_three() {
        let departments: Vec<Department> = (0..6)
            .map(|i| dept(&format!("부서{i}"), &["공통"], &[], i))
            .collect();
        let ranked = rank(&departments, "공통 현안에 대한 입장 문의드립니다 답변 부탁드립니다");
        assert_eq!(ranked.len(), 3);
    }
}
