//! Title catalog resolution.
//!
//! Turns a parsed [`Report`] into the ordered list of [`TitleDescriptor`]s
//! the pipeline works with. Both numbering schemes are fixed here, at parse
//! time: `native_index` is copied from the report and `filtered_index` is
//! assigned densely over the retained titles. Neither is ever derived from
//! the other afterwards.
//!
//! The minimum-duration filter is a heuristic. Some discs carry a decoy
//! title at the first or last native index whose runtime is the sum of all
//! other titles, alongside a flood of very short segments; nothing in the
//! report marks them as junk other than their length.

use discforge_common::paths::sanitize_filename;
use discforge_common::TitleDescriptor;
use regex::Regex;
use std::sync::LazyLock;

use super::report::{RawTitle, Report};

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d{1,2}):(\d{2})(?::(\d{2}))?\s*$").expect("static regex")
});

static SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d+(?:\.\d+)?)\s*([GMK]i?B)\s*$").expect("static regex")
});

/// Whether a value looks like `H:MM[:SS]`.
pub fn is_duration(value: &str) -> bool {
    DURATION_RE.is_match(value)
}

/// Whether a value looks like a number followed by a byte unit.
pub fn is_size(value: &str) -> bool {
    SIZE_RE.is_match(value)
}

/// Parse `H:MM[:SS]` into seconds; 0 if the value does not match.
///
/// # Examples
///
/// ```
/// use discforge_av::makemkv::parse_duration;
///
/// assert_eq!(parse_duration("1:32:10"), 5530);
/// assert_eq!(parse_duration("0:04:50"), 290);
/// assert_eq!(parse_duration("24.3 GB"), 0);
/// ```
pub fn parse_duration(value: &str) -> u64 {
    let Some(caps) = DURATION_RE.captures(value) else {
        return 0;
    };
    let field = |i: usize| -> u64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };
    field(1) * 3600 + field(2) * 60 + field(3)
}

/// Decide which raw value is the duration and which is the size.
///
/// Depending on the tool version the two codes may carry each other's
/// values, so the shape of the value wins over the code it arrived under.
fn assign_fields(raw: &RawTitle) -> (String, String) {
    let by_duration_code = raw.duration.clone().unwrap_or_default();
    let by_size_code = raw.size.clone().unwrap_or_default();

    if !is_duration(&by_duration_code) && is_duration(&by_size_code) {
        (by_size_code, by_duration_code)
    } else {
        (by_duration_code, by_size_code)
    }
}

/// Build the retained, indexed catalog.
///
/// Titles are visited in ascending native index, titles shorter than
/// `min_title_length` seconds are dropped, and the survivors receive
/// `filtered_index` 0..N-1 in that order.
pub fn build_catalog(report: &Report, disc_label: &str, min_title_length: u64) -> Vec<TitleDescriptor> {
    let safe_label = sanitize_filename(disc_label);

    report
        .titles
        .iter()
        .filter_map(|(&native_index, raw)| {
            let (length_label, size_label) = assign_fields(raw);
            let duration_seconds = parse_duration(&length_label);

            if duration_seconds < min_title_length {
                tracing::debug!(
                    native_index,
                    duration_seconds,
                    "Skipping title below minimum length"
                );
                return None;
            }

            Some((native_index, duration_seconds, length_label, size_label))
        })
        .enumerate()
        .map(
            |(filtered_index, (native_index, duration_seconds, length_label, size_label))| {
                TitleDescriptor {
                    native_index,
                    filtered_index,
                    duration_seconds,
                    length_label,
                    size_label,
                    display_name: format!("{safe_label}_t{native_index:02}"),
                }
            },
        )
        .collect()
}
