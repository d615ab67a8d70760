//! Title selection: the catalog table, the selection expression parser, and
//! the sources a selection can come from.

use async_trait::async_trait;
use discforge_common::output::console_raw;
use discforge_common::TitleDescriptor;
use std::collections::BTreeSet;
use std::io::BufRead;

/// Parse a selection expression against the valid filtered indices.
///
/// Accepts `all`, comma-separated indices, and inclusive ranges `a-b`, case-
/// and whitespace-insensitive. Malformed tokens are skipped. The result is
/// intersected with `valid`, deduplicated, and sorted.
///
/// ```
/// use discforge::selection::parse_selection;
///
/// let valid: Vec<usize> = (0..8).collect();
/// assert_eq!(parse_selection("0,2,5-7", &valid), vec![0, 2, 5, 6, 7]);
/// assert_eq!(parse_selection("9", &[0, 1, 2]), Vec::<usize>::new());
/// ```
pub fn parse_selection(input: &str, valid: &[usize]) -> Vec<usize> {
    let expr: String = input
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();

    if expr == "all" {
        let all: BTreeSet<usize> = valid.iter().copied().collect();
        return all.into_iter().collect();
    }

    let mut chosen = BTreeSet::new();
    for token in expr.split(',') {
        match token.split_once('-') {
            Some((start, end)) => {
                let (Some(start), Some(end)) = (parse_index(start), parse_index(end)) else {
                    continue;
                };
                // A reversed range is simply empty.
                chosen.extend(valid.iter().copied().filter(|i| (start..=end).contains(i)));
            }
            None => {
                if let Some(index) = parse_index(token) {
                    if valid.contains(&index) {
                        chosen.insert(index);
                    }
                }
            }
        }
    }

    chosen.into_iter().collect()
}

/// Plain decimal digits only; `+1` and the like are malformed.
fn parse_index(token: &str) -> Option<usize> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// Render the catalog as the `Idx | Title | Length | Size` table.
pub fn format_catalog(disc_label: &str, titles: &[TitleDescriptor]) -> String {
    let rule = "=".repeat(60);
    let mut out = format!("\n{rule}\n DISC: {disc_label}\n{rule}\n");
    out.push_str(&format!(
        " {:<4} | {:<24} | {:<10} | {:<10}\n",
        "Idx", "Title", "Length", "Size"
    ));
    out.push_str(&format!(
        " {} + {} + {} + {}\n",
        "-".repeat(4),
        "-".repeat(24),
        "-".repeat(10),
        "-".repeat(10)
    ));
    for title in titles {
        out.push_str(&format!(
            " {:<4} | {:<24} | {:<10} | {:<10}\n",
            title.filtered_index, title.display_name, title.length_label, title.size_label
        ));
    }
    out.push_str(&format!("{rule}\n"));
    out
}

/// Source of a selection expression for one disc.
#[async_trait]
pub trait TitleSelector: Send + Sync {
    /// Return the raw selection expression for `titles`. An empty string
    /// selects nothing.
    async fn select(&self, disc_label: &str, titles: &[TitleDescriptor]) -> String;
}

/// Interactive prompt on the console.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsolePrompt;

#[async_trait]
impl TitleSelector for ConsolePrompt {
    async fn select(&self, disc_label: &str, titles: &[TitleDescriptor]) -> String {
        console_raw(format_catalog(disc_label, titles));
        console_raw("\nEnter titles to rip (e.g. 0,1 or 1-4 or all): ");

        let line = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line).map(|_| line)
        })
        .await;

        match line {
            Ok(Ok(line)) => line,
            Ok(Err(e)) => {
                tracing::warn!("Failed to read selection: {e}");
                String::new()
            }
            Err(e) => {
                tracing::warn!("Selection prompt aborted: {e}");
                String::new()
            }
        }
    }
}

/// Answers every prompt with the same expression.
#[derive(Debug, Clone)]
pub struct FixedSelection {
    expression: String,
}

impl FixedSelection {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
        }
    }
}

#[async_trait]
impl TitleSelector for FixedSelection {
    async fn select(&self, disc_label: &str, titles: &[TitleDescriptor]) -> String {
        console_raw(format_catalog(disc_label, titles));
        console_raw(format!("\nSelection: {}\n", self.expression));
        self.expression.clone()
    }
}
