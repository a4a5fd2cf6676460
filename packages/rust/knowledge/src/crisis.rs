//! Crisis-level assessment from keyword tables.
//!
//! Tier-4 keywords short-circuit to level 4. Otherwise the score starts at
//! 1.0 and each tier-3 signal category present in the text contributes its
//! weight at most once; the final level is `min(4, floor(score))`.

use issuebrief_shared::CrisisLevel;

/// Keywords that force level 4 (비상) immediately.
const TIER4_KEYWORDS: &[&str] = &[
    "압수수색",
    "구속영장",
    "비자금",
    "유엔 제재",
    "UN 제재",
    "기밀 유출",
    "정보기관",
];

struct SignalCategory {
    name: &'static str,
    weight: f64,
    terms: &'static [&'static str],
}

/// Tier-3 signal categories. Each fires at most once per assessment.
const SIGNAL_CATEGORIES: &[SignalCategory] = &[
    SignalCategory {
        name: "political",
        weight: 1.0,
        terms: &["군부", "쿠데타", "정치권", "로비", "정권", "대선"],
    },
    SignalCategory {
        name: "legal",
        weight: 0.5,
        terms: &["의혹", "소송", "고발", "배임", "횡령", "불법", "위반"],
    },
    SignalCategory {
        name: "esg",
        weight: 0.5,
        terms: &["인권", "환경오염", "중대재해", "아동노동", "탄소배출 조작"],
    },
    SignalCategory {
        name: "international",
        weight: 0.5,
        terms: &["미얀마", "제재", "국제기구", "해외 소송", "OFAC"],
    },
    SignalCategory {
        name: "media",
        weight: 0.5,
        terms: &["단독", "특종", "탐사보도", "보도 예정"],
    },
];

/// Assess the crisis level of the issue text. Returns the level and the
/// names of the signals that fired (tier-4 keyword or category names).
pub fn assess(issue_text: &str) -> (CrisisLevel, Vec<String>) {
    for keyword in TIER4_KEYWORDS {
        if issue_text.contains(keyword) {
            return (CrisisLevel::Emergency, vec![(*keyword).to_string()]);
        }
    }

    let mut score = 1.0_f64;
    let mut signals: Vec<String> = Vec::new();

    for category in SIGNAL_CATEGORIES {
        if let Some(term) = category.terms.iter().find(|t| issue_text.contains(**t)) {
            score += category.weight;
            signals.push(format!("{}:{}", category.name, term));
        }
    }

    let level = CrisisLevel::from_score(score.floor().min(4.0) as u8);
    (level, signals)
}
