use chrono::{DateTime, Utc};
use colored::Colorize;
use pagesmith::document::BlockSummary;
use pagesmith::notify::{CmdMessage, MessageLevel};
use timeago::Formatter;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const LINE_WIDTH: usize = 100;
const LABEL_WIDTH: usize = 8;

pub(super) fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Error => eprintln!("{}", message.content.red()),
        }
    }
}

pub(super) fn print_summaries(title: &str, summaries: &[BlockSummary]) {
    println!("{}", title.bold());
    if summaries.is_empty() {
        println!("No content yet.");
        return;
    }

    let idx_width = summaries.len().to_string().len() + 2;
    for summary in summaries {
        let idx_str = format!("{}.", summary.index + 1);
        let idx_padded = format!("{:<width$}", idx_str, width = idx_width);

        let label_padded = format!("{:<width$}", summary.label, width = LABEL_WIDTH);

        let fixed_width = 2 + idx_width + LABEL_WIDTH + 1;
        let available = LINE_WIDTH.saturating_sub(fixed_width);
        let title_display = truncate_to_width(&summary.title, available);

        println!(
            "  {}{} {}",
            idx_padded.yellow(),
            label_padded.dimmed(),
            title_display
        );
    }
}

/// `key = value` lines, keys aligned.
pub(super) fn print_pairs(pairs: &[(&str, String)]) {
    let key_width = pairs.iter().map(|(k, _)| k.width()).max().unwrap_or(0);
    for (key, value) in pairs {
        println!("{:<width$} = {}", key, value, width = key_width);
    }
}

pub(super) fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }

    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }

    result
}

pub(super) fn format_time_ago(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(timestamp);
    Formatter::new().convert(duration.to_std().unwrap_or_default())
}
