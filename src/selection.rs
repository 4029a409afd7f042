//! Selection file parsing.
//!
//! A selection file is a line-oriented list grouped under bracketed section
//! headers:
//!
//! ```text
//! # keep the core driver and the audio package
//! [Packages]
//! Driver Core
//! HDMI Audio
//!
//! [ScheduledTasks]
//! ; every task not listed here gets disabled
//! Update Check
//! ```
//!
//! Only three section names are recognized. Anything the parser does not
//! understand (unknown headers, text before the first header, a header with
//! no closing bracket) is dropped without error.
//!
//! Lines end at `\r\n`, `\n` or a lone `\r`. A byte order mark at the very
//! start of the text is not part of the first line.

use std::collections::BTreeMap;
use std::str::FromStr;

use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Recognized selection sections, one per artifact kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum Section {
    Packages,
    ScheduledTasks,
    DisplayComponents,
}

/// Parsed selection file.
///
/// Every [`Section`] is always present, so lookups never fail. The document
/// is built once per run and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionDocument {
    sections: BTreeMap<Section, Vec<String>>,
}

impl SelectionDocument {
    /// Parse selection text.
    pub fn parse(text: &str) -> Self {
        Self::from_lines(split_lines(text))
    }

    /// Parse selection lines in file order.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut sections: BTreeMap<Section, Vec<String>> =
            Section::iter().map(|section| (section, Vec::new())).collect();
        let mut current: Option<Section> = None;

        for (index, raw) in lines.into_iter().enumerate() {
            let raw = raw.as_ref();
            let raw = if index == 0 {
                raw.strip_prefix(BYTE_ORDER_MARK).unwrap_or(raw)
            } else {
                raw
            };
            let line = raw.trim();

            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(name) = header_name(line) {
                current = Section::from_str(name).ok();
                if current.is_none() {
                    tracing::debug!(line = index + 1, header = name, "Ignoring unknown section");
                }
                continue;
            }

            match current {
                Some(section) => {
                    if let Some(entries) = sections.get_mut(&section) {
                        entries.push(line.to_string());
                    }
                }
                None => {
                    tracing::trace!(line = index + 1, "Dropping line outside a known section");
                }
            }
        }

        Self { sections }
    }

    /// Entries listed under `section`, in file order.
    pub fn get(&self, section: Section) -> &[String] {
        self.sections
            .get(&section)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// All sections with their entries, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Section, &[String])> + '_ {
        self.sections
            .iter()
            .map(|(section, entries)| (*section, entries.as_slice()))
    }

    /// True when no section has any entry.
    pub fn is_empty(&self) -> bool {
        self.sections.values().all(Vec::is_empty)
    }
}

impl Default for SelectionDocument {
    fn default() -> Self {
        Self::from_lines(std::iter::empty::<&str>())
    }
}

const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// Split text into lines without their terminators.
///
/// `\r\n`, `\n` and a lone `\r` all end a line. A terminator at the very
/// end does not start another, empty line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let Some(end) = rest.find(['\r', '\n']) else {
            lines.push(rest);
            break;
        };
        lines.push(&rest[..end]);
        let terminator = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
        rest = &rest[end + terminator..];
    }

    lines
}

/// Text between the brackets of a `[Header]` line, trimmed.
fn header_name(line: &str) -> Option<&str> {
    if line.len() >= 2 && line.starts_with('[') && line.ends_with(']') {
        Some(line[1..line.len() - 1].trim())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_sections_present_for_empty_input() {
        let doc = SelectionDocument::parse("");
        assert_eq!(doc.iter().count(), 3);
        for section in Section::iter() {
            assert!(doc.get(section).is_empty());
        }
        assert!(doc.is_empty());
    }

    #[test]
    fn test_mixed_sections_with_unknown_header() {
        let text = "[Packages]\n\
                    Driver Core\n\
                    # comment\n\
                    [ScheduledTasks]\n\
                    Telemetry Task\n\
                    [Unknown]\n\
                    Ignored Line\n";
        let doc = SelectionDocument::parse(text);

        assert_eq!(doc.get(Section::Packages), ["Driver Core"]);
        assert_eq!(doc.get(Section::ScheduledTasks), ["Telemetry Task"]);
        assert!(doc.get(Section::DisplayComponents).is_empty());
        assert!(
            doc.iter()
                .all(|(_, entries)| !entries.iter().any(|e| e == "Ignored Line"))
        );
    }

    #[test]
    fn test_unclosed_header_is_plain_line() {
        let doc = SelectionDocument::parse("[Packages\nDriver Core\n");
        assert!(doc.is_empty());

        // Under a real section the unclosed header is an ordinary entry.
        let doc = SelectionDocument::parse("[Packages]\n[Packages\n");
        assert_eq!(doc.get(Section::Packages), ["[Packages"]);
    }

    #[test]
    fn test_lines_before_first_header_are_dropped() {
        let doc = SelectionDocument::parse("Orphan\n[DisplayComponents]\nHDMI Audio\n");
        assert_eq!(doc.get(Section::DisplayComponents), ["HDMI Audio"]);
        assert!(doc.get(Section::Packages).is_empty());
    }

    #[test]
    fn test_header_matching_is_case_insensitive_and_trimmed() {
        let doc = SelectionDocument::parse("  [  scheduledtasks ]  \nUpdate Check\n");
        assert_eq!(doc.get(Section::ScheduledTasks), ["Update Check"]);
    }

    #[test]
    fn test_unknown_header_resets_current_section() {
        let doc = SelectionDocument::parse("[Packages]\nA\n[Extras]\nB\n[packages]\nC\n");
        assert_eq!(doc.get(Section::Packages), ["A", "C"]);
    }

    #[test]
    fn test_entries_trimmed_and_comments_skipped() {
        let text = "[Packages]\n   Driver Core\t\n\n  # hidden\n ; also hidden\nAudio # not a comment\n";
        let doc = SelectionDocument::parse(text);
        assert_eq!(
            doc.get(Section::Packages),
            ["Driver Core", "Audio # not a comment"]
        );
    }

    #[test]
    fn test_repeated_section_appends_in_order() {
        let doc = SelectionDocument::parse("[Packages]\nB\n[ScheduledTasks]\nT\n[Packages]\nA\nB\n");
        assert_eq!(doc.get(Section::Packages), ["B", "A", "B"]);
    }

    #[test]
    fn test_empty_brackets_are_unknown_header() {
        let doc = SelectionDocument::parse("[Packages]\nA\n[]\nB\n");
        assert_eq!(doc.get(Section::Packages), ["A"]);
    }

    #[test]
    fn test_crlf_input() {
        let doc = SelectionDocument::parse("[Packages]\r\nDriver Core\r\n");
        assert_eq!(doc.get(Section::Packages), ["Driver Core"]);
    }

    #[test]
    fn test_leading_byte_order_mark_ignored() {
        let doc = SelectionDocument::parse("\u{FEFF}[Packages]\r\nDriver Core\r\n");
        assert_eq!(doc.get(Section::Packages), ["Driver Core"]);

        let doc = SelectionDocument::from_lines(["\u{FEFF}[ScheduledTasks]", "Update Check"]);
        assert_eq!(doc.get(Section::ScheduledTasks), ["Update Check"]);
    }

    #[test]
    fn test_byte_order_mark_only_stripped_from_first_line() {
        let doc = SelectionDocument::from_lines(["[Packages]", "\u{FEFF}Driver Core"]);
        assert_eq!(doc.get(Section::Packages), ["\u{FEFF}Driver Core"]);
    }

    #[test]
    fn test_split_lines_handles_every_terminator() {
        assert_eq!(split_lines("a\r\nb\nc\rd"), ["a", "b", "c", "d"]);
        assert_eq!(split_lines("a\r\r\nb\n"), ["a", "", "b"]);
        assert_eq!(split_lines("\n"), [""]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn test_lone_carriage_return_separates_lines() {
        let doc = SelectionDocument::parse("[Packages]\rDriver Core\r[DisplayComponents]\rOverlay");
        assert_eq!(doc.get(Section::Packages), ["Driver Core"]);
        assert_eq!(doc.get(Section::DisplayComponents), ["Overlay"]);
    }

    #[test]
    fn test_section_names_parse_case_insensitively() {
        assert_eq!("PACKAGES".parse::<Section>(), Ok(Section::Packages));
        assert_eq!(
            "displaycomponents".parse::<Section>(),
            Ok(Section::DisplayComponents)
        );
        assert!("Package".parse::<Section>().is_err());
        assert_eq!(Section::ScheduledTasks.to_string(), "ScheduledTasks");
    }
}
