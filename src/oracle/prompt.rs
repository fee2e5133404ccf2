//! Prompt construction for the four analysis stages.
//!
//! System prompts carry the role and the rules; the built user prompts
//! carry the serialized event data and the JSON pattern the stage must
//! answer with.

pub const EVIDENCE_SYSTEM_PROMPT: &str = r#"
You are a reconciliation analyst for dividend events, working the evidence-gathering
phase. Your task is to analyze one corporate-action event thoroughly and identify every
potential discrepancy between the internal ledger and custody bookings.

Focus on:
1. EVIDENCE: list every specific field mismatch you observe. Be precise about field
   names and values.
2. HYPOTHESIS: a detailed analytical discussion of what might be wrong and what could
   have happened. Consider multiple scenarios, root causes, and systemic versus
   isolated issues.

Do not make a final call on whether this is a break; that decision belongs to a later
phase. Evidence points are simple factual observations, one specific mismatch each.

Output strictly valid JSON matching the requested pattern. Do not restate inputs.
"#;

pub const CRITIC_SYSTEM_PROMPT: &str = r#"
You are a critic supervising an evidence analyst who is hunting reconciliation breaks
in dividend events. Your input is the analyst's report and the processed event data the
analyst worked from.

Your responsibilities:
- Verify every evidence point aligns with the data. There must be no hallucination.
- Verify the analyst's assumptions and hypothesis are reasonable for the given data and
  the given domain.
- Verify all relevant information has been captured, with as little redundant
  information as possible.
- Verify no irrelevant information or false leads are included.
- Approve the report when the evidence and analysis are valid and reasonable.

Write your feedback as bullet points; it is handed to the analyst for the next
iteration.

DO NOT approve unless you are completely satisfied with all evidence and analysis.

After your approval the report is accepted, and the conclusion phase decides whether
this event is a reconciliation break.

Output strictly valid JSON matching the requested pattern.
"#;

pub const CONCLUSION_SYSTEM_PROMPT: &str = r#"
You are a reconciliation analyst in the conclusion phase, judging one dividend event
with an approved evidence report in hand.

Make the definitive call:
- is_break: true when this represents a genuine reconciliation break, false when not
- classification: brief category of the issue (e.g. "Tax Discrepancy", "Data Quality",
  "Timing Difference")
- root_cause_summary: concise explanation of what caused the issue

Important: if the data agrees in actual meaning and only naming conventions differ,
this is NOT a break. Keep only the evidence relevant to the classification, and pass
those evidence points through exactly as the analyst wrote them. You are the judge who
makes the final call.

Output strictly valid JSON matching the requested pattern. Do not restate inputs.
"#;

pub const PRIORITY_SYSTEM_PROMPT: &str = r#"
You are a reconciliation analyst ranking confirmed dividend break events by impact and
urgency.

For materiality, consider:
- Financial impact (amounts, rates, quantities involved)
- Scope of the issue (single account versus multiple accounts)
- Complexity of the mismatch (simple data difference versus systematic issue)
- Keep it concise, ideally a number with a unit; at most three such figures.

For consequence, consider:
- Whether the materiality becomes a costly problem, and whether this is a data issue or
  a systematic failure with tangible consequences
- Regulatory and compliance implications
- Operational impact on downstream processes
- Risk of the issue spreading or recurring
- Impact on reporting accuracy

For priority, assign exactly one of "High", "Medium", "Low":
- High: urgent financial impact, regulatory risk, or systematic issues
- Medium: smaller financial or systematic impact requiring timely attention
- Low: minor discrepancies with low immediate impact

Output strictly valid JSON matching the requested pattern. Do not restate inputs.
"#;

/// Build the evidence-stage prompt.
///
/// `prior_json` and `feedback` are present from the second critic round
/// onward; blank feedback is treated as no feedback.
pub fn build_evidence_prompt(
    event_json: &str,
    prior_json: Option<&str>,
    feedback: Option<&str>,
) -> String {
    let prior_section = match prior_json {
        Some(json) => format!(
            "Your previous report was not approved by review:\n{json}\n\n"
        ),
        None => String::new(),
    };
    let feedback_section = match feedback {
        Some(notes) if !notes.trim().is_empty() => {
            format!("Reviewer feedback to address this round:\n{notes}\n\n")
        }
        _ => String::new(),
    };

    format!(
        r#"{prior_section}{feedback_section}The event under analysis:
{event_json}

Respond with JSON matching this pattern:
```json
{{
  "evidence": ["string"],
  "hypothesis": "string"
}}
```"#
    )
}

/// Build the critic-stage prompt from the report under review and the
/// event it must be checked against.
pub fn build_critic_prompt(event_json: &str, report_json: &str) -> String {
    format!(
        r#"The report you are evaluating:
{report_json}

The data you are cross-checking it against:
{event_json}

Respond with JSON matching this pattern:
```json
{{
  "approved": false,
  "feedback": "string"
}}
```"#
    )
}

/// Build the conclusion-stage prompt from the approved evidence report.
pub fn build_conclusion_prompt(event_json: &str, evidence_json: &str, hypothesis: &str) -> String {
    let hypothesis = if hypothesis.trim().is_empty() {
        "No hypothesis provided"
    } else {
        hypothesis
    };

    format!(
        r#"Evidence report from your colleague:
Evidence: {evidence_json}
Hypothesis: {hypothesis}

The original event for reference:
{event_json}

Respond with JSON matching this pattern:
```json
{{
  "evidence": ["string"],
  "is_break": true,
  "classification": "string",
  "root_cause_summary": "string"
}}
```"#
    )
}

/// Build the priority-stage prompt for a confirmed break.
pub fn build_priority_prompt(
    event_key: &str,
    classification: &str,
    root_cause_summary: &str,
    event_json: &str,
) -> String {
    format!(
        r#"The break event you are prioritizing:
Event key: {event_key}
Classification: {classification}
Root cause: {root_cause_summary}
Event details:
{event_json}

Respond with JSON matching this pattern:
```json
{{
  "materiality": "string",
  "consequence": "string",
  "priority": "High"
}}
```"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evidence_prompt_contains_event_and_pattern() {
        let prompt = build_evidence_prompt(r#"{"event_key":"EV1"}"#, None, None);
        assert!(prompt.contains(r#""event_key":"EV1""#));
        assert!(prompt.contains(r#""hypothesis": "string""#));
        assert!(!prompt.contains("Reviewer feedback"));
        assert!(!prompt.contains("previous report"));
    }

    #[test]
    fn evidence_prompt_includes_prior_attempt_and_feedback() {
        let prompt = build_evidence_prompt(
            "{}",
            Some(r#"{"evidence":["old"]}"#),
            Some("- cite the exact amounts"),
        );
        assert!(prompt.contains("previous report was not approved"));
        assert!(prompt.contains(r#""evidence":["old"]"#));
        assert!(prompt.contains("- cite the exact amounts"));
    }

    #[test]
    fn blank_feedback_is_omitted() {
        let prompt = build_evidence_prompt("{}", Some("{}"), Some("   "));
        assert!(!prompt.contains("Reviewer feedback"));
    }

    #[test]
    fn critic_prompt_carries_report_and_data() {
        let prompt = build_critic_prompt(r#"{"accounts":{}}"#, r#"{"evidence":[]}"#);
        assert!(prompt.contains(r#"{"evidence":[]}"#));
        assert!(prompt.contains(r#"{"accounts":{}}"#));
        assert!(prompt.contains(r#""approved": false"#));
    }

    #[test]
    fn conclusion_prompt_defaults_missing_hypothesis() {
        let prompt = build_conclusion_prompt("{}", "[]", "");
        assert!(prompt.contains("No hypothesis provided"));
        assert!(prompt.contains(r#""root_cause_summary": "string""#));
    }

    #[test]
    fn priority_prompt_names_the_break() {
        let prompt = build_priority_prompt("EV7", "Tax Discrepancy", "Missing restitution", "{}");
        assert!(prompt.contains("Event key: EV7"));
        assert!(prompt.contains("Classification: Tax Discrepancy"));
        assert!(prompt.contains("Root cause: Missing restitution"));
    }

    #[test]
    fn system_prompts_enforce_stage_discipline() {
        assert!(EVIDENCE_SYSTEM_PROMPT.contains("Do not make a final call"));
        assert!(CRITIC_SYSTEM_PROMPT.contains("DO NOT approve"));
        assert!(CONCLUSION_SYSTEM_PROMPT.contains("NOT a break"));
        assert!(PRIORITY_SYSTEM_PROMPT.contains(r#""High", "Medium", "Low"#));
        for prompt in [
            EVIDENCE_SYSTEM_PROMPT,
            CRITIC_SYSTEM_PROMPT,
            CONCLUSION_SYSTEM_PROMPT,
            PRIORITY_SYSTEM_PROMPT,
        ] {
            assert!(prompt.contains("strictly valid JSON"));
        }
    }
}
