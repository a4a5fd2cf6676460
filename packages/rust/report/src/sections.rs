//! Section-indexed report draft.
//!
//! The draft holds the six mandatory sections plus the reference block as
//! structured fields. Enhancers mutate fields; [`Draft::render`] serializes
//! once, so nobody ever has to re-find a section header by substring.

/// Substituted wherever a field has no data yet.
pub const PLACEHOLDER: &str = "추후 업데이트";

/// One report draft, mutable until rendered.
#[derive(Debug, Clone)]
pub struct Draft {
    /// Section 1 — formatted `YYYY. MM. DD. HH:MM`.
    pub occurred_at: String,
    /// Section 2 heading, `발생 단계` until the crisis enhancer relabels it.
    pub stage_heading: String,
    /// Section 2 value, `<level>(<label>)`.
    pub stage_value: String,
    /// Section 3 body lines, starting with `(<outlet> <reporter>)`.
    pub content: Vec<String>,
    /// Section 4 heading, `부서명/담당자명` entries joined with `, `.
    pub opinion_heading: String,
    pub fact_confirmation: String,
    pub explanation: Vec<String>,
    pub message_direction: String,
    /// Extra section-4 lines injected by enhancers (contact roster).
    pub contact_block: Vec<String>,
    /// Section 5 one-voice body, rendered inside quotation marks.
    pub one_voice: String,
    pub follow_ups: Vec<String>,
    /// Section 6 body, rendered in parentheses.
    pub result: String,
    pub similar_cases: Vec<String>,
    pub concept_notes: Vec<String>,
    /// Optional Q&A bridge appended after the reference block.
    pub qa_bridge: Vec<String>,
    pub footnote: Option<String>,
}

impl Default for Draft {
    fn default() -> Self {
        Self {
            occurred_at: PLACEHOLDER.into(),
            stage_heading: "발생 단계".into(),
            stage_value: PLACEHOLDER.into(),
            content: Vec::new(),
            opinion_heading: String::new(),
            fact_confirmation: String::new(),
            explanation: Vec::new(),
            message_direction: String::new(),
            contact_block: Vec::new(),
            one_voice: String::new(),
            follow_ups: Vec::new(),
            result: PLACEHOLDER.into(),
            similar_cases: Vec::new(),
            concept_notes: Vec::new(),
            qa_bridge: Vec::new(),
            footnote: None,
        }
    }
}

fn or_placeholder(s: &str) -> &str {
    if s.trim().is_empty() { PLACEHOLDER } else { s }
}

fn push_bullets(out: &mut String, lines: &[String], indent: &str) {
    if lines.is_empty() {
        out.push_str(indent);
        out.push_str("- ");
        out.push_str(PLACEHOLDER);
        out.push('\n');
        return;
    }
    for line in lines {
        out.push_str(indent);
        out.push_str("- ");
        out.push_str(line);
        out.push('\n');
    }
}

impl Draft {
    /// Serialize the draft into the final UTF-8 report.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(2_048);

        out.push_str("<이슈 발생 보고>\n\n");
        out.push_str(&format!("1. 발생 일시: {}\n", or_placeholder(&self.occurred_at)));
        out.push_str(&format!(
            "2. {}: {}\n",
            self.stage_heading,
            or_placeholder(&self.stage_value)
        ));

        out.push_str("3. 발생 내용:\n");
        if self.content.is_empty() {
            out.push_str(PLACEHOLDER);
            out.push('\n');
        } else {
            for line in &self.content {
                out.push_str(line);
                out.push('\n');
            }
        }
        out.push('\n');

        out.push_str(&format!(
            "4. 유관 의견({}):\n",
            or_placeholder(&self.opinion_heading)
        ));
        out.push_str(&format!(
            "- 사실 확인: {}\n",
            or_placeholder(&self.fact_confirmation)
        ));
        match self.explanation.as_slice() {
            [] => out.push_str(&format!("- 설명 논리: {PLACEHOLDER}\n")),
            [single] => out.push_str(&format!("- 설명 논리: {single}\n")),
            many => {
                out.push_str("- 설명 논리:\n");
                push_bullets(&mut out, many, "  ");
            }
        }
        out.push_str(&format!(
            "- 메시지 방향성: {}\n",
            or_placeholder(&self.message_direction)
        ));
        for line in &self.contact_block {
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');

        out.push_str("5. 대응 방안:\n");
        out.push_str(&format!("- 원보이스: \"{}\"\n", or_placeholder(&self.one_voice)));
        out.push_str("- 이후 대응 방향성:\n");
        push_bullets(&mut out, &self.follow_ups, "  ");
        out.push('\n');

        out.push_str(&format!("6. 대응 결과: ({})\n", or_placeholder(&self.result)));
        out.push('\n');

        out.push_str("=== 참조 ===\n");
        out.push_str("참조. 최근 유사 사례:\n");
        push_bullets(&mut out, &self.similar_cases, "");
        out.push_str("참조. 이슈 정의 및 개념 정립:\n");
        push_bullets(&mut out, &self.concept_notes, "");

        if !self.qa_bridge.is_empty() {
            out.push('\n');
            for line in &self.qa_bridge {
                out.push_str(line);
                out.push('\n');
            }
        }

        if let Some(footnote) = &self.footnote {
            out.push('\n');
            out.push_str(footnote);
            out.push('\n');
        }

        out
    }
}
