/*!
 * Section-scoped paper title parser.
 *
 * Turns a loosely structured "best papers" README into paper records grouped
 * by venue section. The parser is a single forward pass over the lines of the
 * document:
 * - `sections`: header recognition (which section a header line opens)
 * - `lines`: candidacy filter and title extraction for all other lines
 *
 * Parsing never fails. Malformed input degrades to empty sections.
 */

pub mod lines;
pub mod sections;

use log::{debug, trace};
use serde::Serialize;

pub use lines::{extract_title_from_line, is_paper_title_line};
pub use sections::{DEFAULT_SECTIONS, SectionRule, TEST_OF_TIME_KEY};

/// Extracted titles must be longer than this (in characters)
pub const MIN_TITLE_CHARS: usize = 10;

/// Substrings that disqualify an extracted title (compared lowercase)
pub const BANNED_TITLE_SUBSTRINGS: &[&str] = &[
    "readme",
    "back to top",
    "table of contents",
    "best papers",
    "best paper",
    "authors:",
    "venue:",
    "year:",
];

/// A paper title found in the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaperRecord {
    /// Cleaned, human-readable title
    pub title: String,
    /// Section the line appeared under
    pub section: String,
    /// Source line exactly as it appeared in the document
    pub raw_line: String,
}

/// Papers found under one section, in document order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionPapers {
    pub name: String,
    pub papers: Vec<PaperRecord>,
}

/// Papers grouped by section. Every configured section is present, in
/// configuration order, even when no paper was found under it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct ParseResult {
    sections: Vec<SectionPapers>,
}

impl ParseResult {
    /// Empty result holding one entry per distinct section name
    pub fn with_sections<'a, I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut result = Self::default();
        for name in names {
            if result.get(name).is_none() {
                result.sections.push(SectionPapers {
                    name: name.to_string(),
                    papers: Vec::new(),
                });
            }
        }
        result
    }

    /// Papers found under a section, or `None` for an unknown section
    pub fn get(&self, section: &str) -> Option<&[PaperRecord]> {
        self.sections
            .iter()
            .find(|s| s.name == section)
            .map(|s| s.papers.as_slice())
    }

    /// Sections in configuration order
    pub fn iter(&self) -> impl Iterator<Item = &SectionPapers> {
        self.sections.iter()
    }

    pub fn section_names(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.name.as_str()).collect()
    }

    /// Total number of records across all sections
    pub fn total_papers(&self) -> usize {
        self.sections.iter().map(|s| s.papers.len()).sum()
    }

    /// All records, section by section, each section in document order
    pub fn into_records(self) -> Vec<PaperRecord> {
        self.sections.into_iter().flat_map(|s| s.papers).collect()
    }

    fn push(&mut self, record: PaperRecord) {
        if let Some(section) = self.sections.iter_mut().find(|s| s.name == record.section) {
            section.papers.push(record);
        }
    }
}

/// Final check on an extracted title
pub fn is_acceptable_title(title: &str) -> bool {
    if title.chars().count() <= MIN_TITLE_CHARS {
        return false;
    }
    let lowered = title.to_lowercase();
    !BANNED_TITLE_SUBSTRINGS
        .iter()
        .any(|banned| lowered.contains(banned))
}

/// Parse `document` into paper records for the sections opened by `rules`.
///
/// Rule order decides which section wins when several header patterns match
/// the same line.
pub fn parse(document: &str, rules: &[SectionRule]) -> ParseResult {
    let mut result = ParseResult::with_sections(rules.iter().map(SectionRule::name));
    let mut current_section: Option<&str> = None;

    for line in document.split('\n') {
        let stripped = line.trim();

        if let Some(rule) = sections::detect_section(rules, stripped) {
            debug!("Found section: {}", rule.name());
            current_section = Some(rule.name());
            continue;
        }

        let Some(section) = current_section else {
            continue;
        };

        if !is_paper_title_line(stripped) {
            continue;
        }

        let title = extract_title_from_line(stripped);
        if !is_acceptable_title(&title) {
            trace!("Rejected extracted title: {:?}", title);
            continue;
        }

        debug!("Added paper: {}", truncate_chars(&title, 60));
        result.push(PaperRecord {
            title,
            section: section.to_string(),
            raw_line: line.to_string(),
        });
    }

    result
}

/// Parse `document` for plain section names.
///
/// Each name becomes a header rule via [`SectionRule::for_name`], so the
/// Test-of-Time key is matched by its phrase.
pub fn parse_with_names<S: AsRef<str>>(document: &str, names: &[S]) -> ParseResult {
    parse(document, &SectionRule::from_names(names))
}

/// Parser bound to a fixed, ordered set of section rules
#[derive(Debug, Clone)]
pub struct ReadmeParser {
    rules: Vec<SectionRule>,
}

impl ReadmeParser {
    /// Create a parser from explicit rules
    pub fn new(rules: Vec<SectionRule>) -> Self {
        Self { rules }
    }

    /// Create a parser recognizing the given section keys
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        Self::new(SectionRule::from_names(names))
    }

    pub fn rules(&self) -> &[SectionRule] {
        &self.rules
    }

    /// Parse a document with this parser's rules
    pub fn parse(&self, document: &str) -> ParseResult {
        parse(document, &self.rules)
    }
}

impl Default for ReadmeParser {
    fn default() -> Self {
        Self::new(SectionRule::defaults())
    }
}

/// Truncate on a character boundary for log output
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}
