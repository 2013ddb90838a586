//! Report printed at the end of a headless run.
//!
//! The text report is the final screen followed by the chat transcript, the
//! notice left on screen and a one-line run summary. The JSON report carries
//! the same data plus the state snapshot.

use ratatui::buffer::Buffer;
use serde::Serialize;

use super::{HeadlessResult, HeadlessState};
use crate::app::{Notice, NoticeLevel};
use crate::cli::OutputFormat;
use crate::session::ChatTurn;

/// Text of a rendered buffer: one line per row, trailing blanks dropped.
pub fn screen_text(buffer: &Buffer) -> String {
    let area = buffer.area;
    let mut rows: Vec<String> = (0..area.height)
        .map(|y| {
            let row: String = (0..area.width)
                .filter_map(|x| buffer.cell((x, y)))
                .map(|cell| cell.symbol())
                .collect();
            row.trim_end().to_string()
        })
        .collect();

    while rows.last().is_some_and(|row| row.is_empty()) {
        rows.pop();
    }

    let mut text = rows.join("\n");
    text.push('\n');
    text
}

/// Renders the report for a finished run.
pub fn format_report(result: &HeadlessResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => text_report(result),
        OutputFormat::Json => json_report(result),
    }
}

fn text_report(result: &HeadlessResult) -> String {
    let mut out = result.screen.clone();

    out.push_str("\nTranscript:\n");
    for turn in &result.transcript {
        let mut lines = turn.content.lines();
        let first = lines.next().unwrap_or_default();
        out.push_str(&format!("  {}: {first}\n", turn.role.label()));
        for line in lines {
            out.push_str(&format!("    {line}\n"));
        }
    }

    if let Some(notice) = &result.notice {
        let level = match notice.level {
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        out.push_str(&format!("Notice ({level}): {}\n", notice.message));
    }

    out.push_str(&format!(
        "Events: {} executed in {}ms",
        result.events_executed,
        result.duration.as_millis()
    ));
    if result.assertions_passed + result.assertions_failed > 0 {
        out.push_str(&format!(
            " | Assertions: {} passed, {} failed",
            result.assertions_passed, result.assertions_failed
        ));
    }
    out.push('\n');
    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    screen: &'a str,
    screen_lines: Vec<&'a str>,
    transcript: &'a [ChatTurn],
    notice: Option<&'a Notice>,
    events_executed: usize,
    duration_ms: u128,
    assertions: Assertions,
    state: &'a HeadlessState,
}

#[derive(Serialize)]
struct Assertions {
    passed: usize,
    failed: usize,
}

fn json_report(result: &HeadlessResult) -> String {
    let report = JsonReport {
        screen: &result.screen,
        screen_lines: result.screen.lines().collect(),
        transcript: &result.transcript,
        notice: result.notice.as_ref(),
        events_executed: result.events_executed,
        duration_ms: result.duration.as_millis(),
        assertions: Assertions {
            passed: result.assertions_passed,
            failed: result.assertions_failed,
        },
        state: &result.state,
    };

    serde_json::to_string_pretty(&report)
        .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize report: {e}\"}}"))
}
