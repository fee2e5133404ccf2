//! Plain-text report over ranked breaks.
//!
//! Output is meant for a terminal or a log attachment: one block per
//! break, long fields wrapped to a fixed width with a hanging indent
//! under the label.

use crate::oracle::BreakRecord;

const REPORT_WIDTH: usize = 100;
const FIELD_INDENT: usize = 4;

/// Render ranked breaks as the final operator-facing report.
pub fn render(breaks: &[BreakRecord]) -> String {
    let mut out = String::new();
    out.push_str(&"-".repeat(REPORT_WIDTH));
    out.push('\n');
    out.push_str("---Discovered reconciliation breaks---\n");

    if breaks.is_empty() {
        out.push_str("No breaks detected.\n");
        return out;
    }

    for record in breaks {
        out.push_str("Event Key: ");
        out.push_str(&record.event_key);
        out.push('\n');

        let assessment = record.priority.as_ref();
        wrap_field(&mut out, "Classification", &record.classification);
        wrap_field(
            &mut out,
            "Materiality",
            assessment.map(|a| a.materiality.as_str()).unwrap_or(""),
        );
        wrap_field(
            &mut out,
            "Priority",
            &assessment.map(|a| a.priority.to_string()).unwrap_or_default(),
        );
        wrap_field(&mut out, "Root Cause", &record.root_cause_summary);
        wrap_field(
            &mut out,
            "Consequence",
            assessment.map(|a| a.consequence.as_str()).unwrap_or(""),
        );
        wrap_field(&mut out, "Evidence", &record.evidence.join("; "));
        out.push_str("---\n");
    }

    out
}

/// Append one labelled field, wrapping long text onto continuation lines
/// aligned under the start of the value. An empty value prints "Unknown".
fn wrap_field(out: &mut String, label: &str, text: &str) {
    let text = if text.is_empty() { "Unknown" } else { text };
    let chars: Vec<char> = text.chars().collect();
    let label_width = label.chars().count();

    // First line shares space with the label.
    let first_available = REPORT_WIDTH.saturating_sub(label_width + 2);
    out.push_str(&" ".repeat(FIELD_INDENT));
    out.push_str(label);
    out.push_str(": ");

    if chars.len() <= first_available {
        out.extend(chars.iter());
        out.push('\n');
        return;
    }

    let split = split_pos(&chars, first_available);
    out.extend(chars[..split].iter());
    out.push('\n');

    let label_indent = FIELD_INDENT + label_width + 2;
    let available = REPORT_WIDTH.saturating_sub(label_indent).max(1);
    let mut rest = lstrip(&chars[split..]);
    while !rest.is_empty() {
        if rest.len() <= available {
            push_line(out, label_indent, rest);
            break;
        }
        let split = split_pos(rest, available);
        push_line(out, label_indent, &rest[..split]);
        rest = lstrip(&rest[split..]);
    }
}

/// Last space within the limit, or a forced break when the text has none.
fn split_pos(chars: &[char], available: usize) -> usize {
    let limit = available.min(chars.len());
    chars[..limit]
        .iter()
        .rposition(|c| *c == ' ')
        .unwrap_or(available)
}

fn lstrip(chars: &[char]) -> &[char] {
    let start = chars
        .iter()
        .position(|c| !c.is_whitespace())
        .unwrap_or(chars.len());
    &chars[start..]
}

fn push_line(out: &mut String, indent: usize, content: &[char]) {
    out.push_str(&" ".repeat(indent));
    out.extend(content.iter());
    out.push('\n');
}
