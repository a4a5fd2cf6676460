//! Canned financial figures for the financial enhancer.
//!
//! These are static template strings keyed by reporting period, deliberately
//! not a live data feed. They are updated by hand when IR publishes.

pub struct SegmentLine {
    pub name: &'static str,
    pub commentary: &'static str,
}

pub struct PeriodFigures {
    pub period: &'static str,
    pub revenue: &'static str,
    pub operating_profit: &'static str,
    pub net_profit: &'static str,
    pub revenue_yoy: &'static str,
    pub operating_profit_yoy: &'static str,
    pub net_profit_yoy: &'static str,
    pub segments: &'static [SegmentLine],
}

impl PeriodFigures {
    /// Whether any canned delta is negative.
    pub fn has_negative_delta(&self) -> bool {
        [self.revenue_yoy, self.operating_profit_yoy, self.net_profit_yoy]
            .iter()
            .any(|d| d.starts_with('-'))
    }
}

pub const Q2_2025: PeriodFigures = PeriodFigures {
    period: "2025년 2분기",
    revenue: "8조 1,440억 원",
    operating_profit: "3,137억 원",
    net_profit: "905억 원",
    revenue_yoy: "-1.7%",
    operating_profit_yoy: "-10.3%",
    net_profit_yoy: "-52.3%",
    segments: &[
        SegmentLine {
            name: "철강",
            commentary: "트레이딩 물량 확대로 외형 유지, 시황 약세로 마진은 축소",
        },
        SegmentLine {
            name: "에너지",
            commentary: "가스전 판매 물량 안정적 유지, 발전 부문 계절적 비수기 영향",
        },
        SegmentLine {
            name: "식량",
            commentary: "곡물 취급량 증가 지속, 국제 곡물가 하락으로 단가는 약세",
        },
    ],
};

pub const FY_2024: PeriodFigures = PeriodFigures {
    period: "2024년 연간",
    revenue: "33조 1,328억 원",
    operating_profit: "1조 658억 원",
    net_profit: "4,920억 원",
    revenue_yoy: "+0.9%",
    operating_profit_yoy: "-8.7%",
    net_profit_yoy: "-13.1%",
    segments: &[
        SegmentLine {
            name: "철강",
            commentary: "연간 트레이딩 물량 최대치 경신",
        },
        SegmentLine {
            name: "에너지",
            commentary: "가스전 4단계 개발 계획대로 진행",
        },
        SegmentLine {
            name: "식량",
            commentary: "취급량 기준 성장 지속",
        },
    ],
};

/// Pick the figure set the inquiry is about: annual wording selects the
/// full-year table, anything else gets the latest quarter.
pub fn for_issue(issue_text: &str) -> &'static PeriodFigures {
    if issue_text.contains("연간") || issue_text.contains("연결 결산") {
        &FY_2024
    } else {
        &Q2_2025
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_is_the_default_period() {
        assert_eq!(for_issue("2분기 실적 문의").period, "2025년 2분기");
        assert_eq!(for_issue("연간 실적 전망 문의").period, "2024년 연간");
    }

    #[test]
    fn q2_carries_negative_deltas() {
        assert!(Q2_2025.has_negative_delta());
        assert_eq!(Q2_2025.segments.len(), 3);
    }
}
