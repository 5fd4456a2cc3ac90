/*!
 * Paper deduplication.
 *
 * The same paper is often listed under several sections (for instance as a
 * best paper and later as a test-of-time paper). Records are collapsed on a
 * fingerprint of the normalized title, keeping the first one seen.
 */

use std::collections::HashSet;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::parser::PaperRecord;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());

/// A record that survived deduplication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniquePaper {
    /// Hex-encoded fingerprint of the normalized title
    pub fingerprint: String,
    pub record: PaperRecord,
}

/// Lowercase, trim, and drop everything that is not a word character or whitespace
pub fn clean_title(title: &str) -> String {
    NON_WORD
        .replace_all(title.to_lowercase().trim(), "")
        .into_owned()
}

/// Fingerprint of a paper, optionally including its authors
pub fn fingerprint(title: &str, authors: Option<&[String]>) -> String {
    let cleaned = clean_title(title);

    let input = match authors {
        Some(authors) if !authors.is_empty() => {
            let mut names: Vec<String> = authors
                .iter()
                .filter(|a| !a.is_empty())
                .map(|a| a.trim().to_lowercase())
                .collect();
            names.sort();
            format!("{}_{}", cleaned, names.concat())
        }
        _ => cleaned,
    };

    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Keep the first record for each title fingerprint, preserving first-seen order
pub fn deduplicate<I>(records: I) -> Vec<UniquePaper>
where
    I: IntoIterator<Item = PaperRecord>,
{
    let mut seen = HashSet::new();
    let mut unique = Vec::new();

    for record in records {
        let fp = fingerprint(&record.title, None);
        if seen.insert(fp.clone()) {
            unique.push(UniquePaper {
                fingerprint: fp,
                record,
            });
        } else {
            debug!("Duplicate paper skipped: {} ({})", record.title, record.section);
        }
    }

    unique
}
