/*!
 * Section header recognition.
 *
 * Each configured section is matched by a rule. Most sections are opened by a
 * markdown header carrying their literal name; the test-of-time section is
 * opened by the phrase "test of time papers" instead of its key text.
 */

use regex::{Regex, RegexBuilder};

/// Key of the section matched by phrase rather than by name
pub const TEST_OF_TIME_KEY: &str = "Test-of-Time-Papers";

/// Phrase that opens the test-of-time section (the final word may be pluralized)
pub const TEST_OF_TIME_PHRASE: &str = "test of time paper";

/// Sections recognized when the configuration does not name any
pub const DEFAULT_SECTIONS: &[&str] = &[
    "CVPR",
    "ICLR",
    "NeurIPS",
    "ICCV",
    "ICML",
    "ECCV",
    "AAAI",
    "WACV",
    "BMVC",
    TEST_OF_TIME_KEY,
];

/// Rule deciding whether a trimmed line opens a section
#[derive(Debug, Clone)]
pub enum SectionRule {
    /// Header markers followed by the section name itself
    NameMatch {
        /// Section key
        name: String,
        /// Compiled header pattern
        pattern: Regex,
    },
    /// Header markers followed by a descriptive phrase
    PhraseMatch {
        /// Section key reported for matches
        name: String,
        /// The phrase, without its optional plural suffix
        phrase: String,
        /// Compiled header pattern
        pattern: Regex,
    },
}

impl SectionRule {
    /// Rule matching `#... <name>` followed by whitespace or end of line
    pub fn name_match(name: impl Into<String>) -> Self {
        let name = name.into();
        let source = format!(r"^#+\s*{}(?:\s|$)", regex::escape(&name));
        Self::NameMatch {
            pattern: header_regex(&source),
            name,
        }
    }

    /// Rule matching `#... <phrase>[s]` followed by whitespace or end of line.
    /// Words of the phrase may be separated by any whitespace run.
    pub fn phrase_match(name: impl Into<String>, phrase: impl Into<String>) -> Self {
        let phrase = phrase.into();
        let words: Vec<String> = phrase.split_whitespace().map(regex::escape).collect();
        let source = format!(r"^#+\s*{}s?(?:\s|$)", words.join(r"\s+"));
        Self::PhraseMatch {
            name: name.into(),
            pattern: header_regex(&source),
            phrase,
        }
    }

    /// Build the rule for a configured section key
    pub fn for_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case(TEST_OF_TIME_KEY) {
            Self::phrase_match(name, TEST_OF_TIME_PHRASE)
        } else {
            Self::name_match(name)
        }
    }

    /// Rules for every name, in the given order
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Vec<Self> {
        names.iter().map(|n| Self::for_name(n.as_ref())).collect()
    }

    /// Rules for [`DEFAULT_SECTIONS`]
    pub fn defaults() -> Vec<Self> {
        Self::from_names(DEFAULT_SECTIONS)
    }

    /// Section key this rule opens
    pub fn name(&self) -> &str {
        match self {
            Self::NameMatch { name, .. } | Self::PhraseMatch { name, .. } => name,
        }
    }

    /// Whether the trimmed line is a header for this section
    pub fn matches(&self, stripped: &str) -> bool {
        match self {
            Self::NameMatch { pattern, .. } | Self::PhraseMatch { pattern, .. } => {
                pattern.is_match(stripped)
            }
        }
    }
}

/// First rule (in priority order) whose header pattern matches the line
pub fn detect_section<'a>(rules: &'a [SectionRule], stripped: &str) -> Option<&'a SectionRule> {
    rules.iter().find(|rule| rule.matches(stripped))
}

fn header_regex(source: &str) -> Regex {
    // Inputs are escaped, so the pattern is always well-formed
    RegexBuilder::new(source)
        .case_insensitive(true)
        .build()
        .expect("escaped section pattern must compile")
}
