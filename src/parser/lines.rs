/*!
 * Line classification and title extraction.
 *
 * Both stages are expressed as ordered rule tables: the first skip pattern that
 * matches rejects a line, and the first extraction rule that applies produces
 * the raw title before the shared cleanup step.
 */

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// Lines shorter than this (in characters) are never candidates
pub const MIN_LINE_CHARS: usize = 10;

/// Lines without a paper marker must be longer than this to be candidates
pub const MIN_UNMARKED_LINE_CHARS: usize = 15;

/// Prefixes that mark a line as a bare URL or code fence rather than a title
const NON_TITLE_PREFIXES: &[&str] = &["http", "www", "```"];

fn ci(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .unwrap()
}

/// Structural lines that never carry a paper title, anchored at line start
static SKIP_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (ci(r"^authors?:"), "author label"),
        (ci(r"^#"), "header"),
        (ci(r"^best papers?\s"), "best papers banner"),
        (ci(r"^best paper\s"), "best paper award banner"),
        (ci(r"^best student\s"), "best student paper banner"),
        (ci(r"^longuet-higgins\s"), "Longuet-Higgins prize"),
        (ci(r"^test of time\s"), "test of time banner"),
        (ci(r"^helmholtz\s"), "Helmholtz prize"),
        (ci(r"^outstanding\s"), "outstanding papers banner"),
        (ci(r"^award candidates"), "award candidates banner"),
        (ci(r"^runners?\s?ups?"), "runner-up banner"),
        (ci(r"^contents?$"), "contents"),
        (ci(r"^\[.*\]\[.*\]"), "link reference"),
        (ci(r"^back to top"), "navigation"),
        (ci(r"^table of contents"), "navigation"),
        (ci(r"^\d{4}\s*$"), "bare year"),
        (ci(r"^-+$"), "separator"),
        (ci(r"^=+$"), "separator"),
        (ci(r"^\*+$"), "separator"),
        (ci(r"^\s*\|"), "table row"),
        (ci(r"^venue\s"), "venue column header"),
        (ci(r"^year\s"), "year column header"),
    ]
});

static PAPER_MARKER: Lazy<Regex> = Lazy::new(|| ci(r"\[paper\]|\[pdf\]|\[link\]"));

static BOLD_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*").unwrap());

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Ways of pulling a raw title out of a candidate line
#[derive(Debug)]
enum ExtractionRule {
    /// `Title (Venue Year) [Paper]`: keep the text before the parenthetical
    BeforeMetadata(Regex),
    /// `[Title](url)` anywhere in the line: keep the link label
    LinkLabel(Regex),
    /// Anything else: drop a trailing `[...]`, then a trailing `(... 2023 ...)`
    StripTrailing { bracket: Regex, year_paren: Regex },
}

impl ExtractionRule {
    fn apply(&self, line: &str) -> Option<String> {
        match self {
            Self::BeforeMetadata(re) | Self::LinkLabel(re) => re
                .captures(line)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string()),
            Self::StripTrailing { bracket, year_paren } => {
                let title = bracket.replace(line, "");
                let title = year_paren.replace(title.trim(), "");
                Some(title.trim().to_string())
            }
        }
    }
}

static EXTRACTION_RULES: Lazy<Vec<ExtractionRule>> = Lazy::new(|| {
    vec![
        ExtractionRule::BeforeMetadata(Regex::new(r"^(.+?)\s*\([^)]+\)\s*\[.*?\]").unwrap()),
        ExtractionRule::LinkLabel(Regex::new(r"\[(.+?)\]\([^)]+\)").unwrap()),
        ExtractionRule::StripTrailing {
            bracket: Regex::new(r"\s*\[.*?\]\s*$").unwrap(),
            year_paren: Regex::new(r"\s*\([^)]*\d{4}[^)]*\)\s*$").unwrap(),
        },
    ]
});

/// Name of the first skip pattern rejecting the line, if any
pub fn skip_reason(stripped: &str) -> Option<&'static str> {
    SKIP_PATTERNS
        .iter()
        .find(|(pattern, _)| pattern.is_match(stripped))
        .map(|(_, reason)| *reason)
}

/// Whether a line looks like it names a paper (as opposed to metadata or markup)
pub fn is_paper_title_line(line: &str) -> bool {
    let line = line.trim();

    if line.is_empty() || skip_reason(line).is_some() {
        return false;
    }

    let length = line.chars().count();
    if length < MIN_LINE_CHARS {
        return false;
    }

    let has_paper_marker = PAPER_MARKER.is_match(line);
    let is_reasonable_title = length > MIN_UNMARKED_LINE_CHARS
        && !NON_TITLE_PREFIXES.iter().any(|prefix| line.starts_with(prefix));

    has_paper_marker || is_reasonable_title
}

/// Extract a clean paper title from a candidate line
pub fn extract_title_from_line(line: &str) -> String {
    let line = line.trim();

    let title = EXTRACTION_RULES
        .iter()
        .find_map(|rule| rule.apply(line))
        .unwrap_or_else(|| line.to_string());

    let title = BOLD_MARKER.replace_all(&title, "");
    let title = WHITESPACE_RUN.replace_all(&title, " ");

    title.trim().to_string()
}
