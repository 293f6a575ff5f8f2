//! Event journal: `[category] text` messages packed into category cells.
//!
//! The journal file is a JSON array of cells. Each cell starts with a
//! `[category]` line followed by one message per line. Merging a tick's
//! messages into an existing journal regroups everything by category, orders
//! categories by configured priority, repacks cells under the character
//! budget, and caps the number of cells.

use anyhow::{Context, Result};
use arcsim_core::LogEntry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Category for messages without a `[category]` prefix.
pub const UNCATEGORIZED: &str = "Без категории";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalSettings {
    /// Maximum number of cells kept; an overflow notice is appended past it.
    pub max_total_messages: usize,
    /// Character budget of one cell, header included.
    pub max_characters_per_cell: usize,
    /// Lower sorts first; categories not listed go last.
    pub category_priority: BTreeMap<String, u32>,
    pub disabled_categories: Vec<String>,
}

impl Default for JournalSettings {
    fn default() -> Self {
        Self {
            max_total_messages: 1000,
            max_characters_per_cell: 50_000,
            category_priority: BTreeMap::from([
                ("Ошибка".to_string(), 1),
                ("Предупреждение".to_string(), 2),
                ("Постройки".to_string(), 3),
            ]),
            disabled_categories: Vec::new(),
        }
    }
}

impl JournalSettings {
    fn is_disabled(&self, category: &str) -> bool {
        self.disabled_categories.iter().any(|c| c == category)
    }

    fn priority(&self, category: &str) -> u32 {
        self.category_priority
            .get(category)
            .copied()
            .filter(|&p| p > 0)
            .unwrap_or(u32::MAX)
    }
}

/// Formats a tick log entry as a journal line.
pub fn format_entry(entry: &LogEntry) -> String {
    format!("[{}] {}", entry.category.label(), entry.message)
}

/// Splits `[category] text` into its parts. Lines without a prefix are
/// uncategorized and kept whole.
pub fn parse_line(line: &str) -> (&str, &str) {
    line.strip_prefix('[')
        .and_then(|rest| rest.split_once(']'))
        .map(|(category, text)| (category, text.trim_start()))
        .unwrap_or((UNCATEGORIZED, line))
}

/// Messages grouped by category, in order of first appearance.
#[derive(Debug, Default)]
struct Categorized(Vec<(String, Vec<String>)>);

impl Categorized {
    fn push(&mut self, category: &str, text: &str) {
        match self.0.iter_mut().find(|(c, _)| c == category) {
            Some((_, messages)) => messages.push(text.to_string()),
            None => self.0.push((category.to_string(), vec![text.to_string()])),
        }
    }

    /// Adds the messages of a stored cell: a header line, then one message per line.
    fn push_cell(&mut self, cell: &str, settings: &JournalSettings) {
        let mut lines = cell.lines();
        let Some(first) = lines.next() else {
            return;
        };
        let (category, text) = parse_line(first);
        if settings.is_disabled(category) {
            return;
        }
        if !text.is_empty() {
            self.push(category, text);
        }
        for line in lines.filter(|l| !l.trim().is_empty()) {
            self.push(category, line);
        }
    }

    fn push_line(&mut self, line: &str, settings: &JournalSettings) {
        let (category, text) = parse_line(line);
        if !settings.is_disabled(category) {
            self.push(category, text);
        }
    }
}

/// Packs grouped messages into cells under the character budget.
fn pack(categorized: Categorized, settings: &JournalSettings) -> Vec<String> {
    let mut groups = categorized.0;
    // Stable: equal priorities keep first-appearance order.
    groups.sort_by_key(|(category, _)| settings.priority(category));

    let mut cells = Vec::new();
    for (category, messages) in groups {
        let header = format!("[{category}]");
        let mut cell = header.clone();
        let mut cell_len = header.chars().count();
        let mut has_messages = false;

        for message in messages {
            let added = 1 + message.chars().count();
            if has_messages && cell_len + added > settings.max_characters_per_cell {
                cells.push(std::mem::replace(&mut cell, header.clone()));
                cell_len = header.chars().count();
            }
            cell.push('\n');
            cell.push_str(&message);
            cell_len += added;
            has_messages = true;
        }
        cells.push(cell);
    }
    cells
}

const OVERFLOW_PREFIX: &str = "Достигнут лимит в ";

fn cap(mut cells: Vec<String>, settings: &JournalSettings) -> Vec<String> {
    let max = settings.max_total_messages;
    if cells.len() > max {
        log::warn!("Journal has {} cells, dropping {}", cells.len(), cells.len() - max);
        cells.truncate(max);
        cells.push(format!(
            "{OVERFLOW_PREFIX}{max} сообщений. Некоторые сообщения были опущены."
        ));
    }
    cells
}

/// Merges new `[category] text` lines into existing journal cells.
pub fn merge_journal(
    existing: &[String],
    new_lines: &[String],
    settings: &JournalSettings,
) -> Vec<String> {
    let mut categorized = Categorized::default();
    // A previous overflow notice is regenerated if still needed.
    for cell in existing
        .iter()
        .filter(|c| !c.trim().is_empty() && !c.starts_with(OVERFLOW_PREFIX))
    {
        categorized.push_cell(cell, settings);
    }
    for line in new_lines {
        categorized.push_line(line, settings);
    }
    cap(pack(categorized, settings), settings)
}

/// Reads a journal file. A missing file is an empty journal.
pub fn load_journal(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read journal {}", path.display()))?;
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse journal {}", path.display()))
}

pub fn save_journal(path: &Path, cells: &[String]) -> Result<()> {
    let text = serde_json::to_string_pretty(cells)?;
    std::fs::write(path, text).with_context(|| format!("Failed to write journal {}", path.display()))
}
