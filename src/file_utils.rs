use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

// @module: File and directory utilities

/// Characters that are not allowed in file names on common platforms
static INVALID_FILENAME_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[<>:"/\\|?*]"#).unwrap());

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Fingerprint characters appended to a colliding file name
const FINGERPRINT_SUFFIX_CHARS: usize = 8;

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Whether a file exists and is larger than `min_bytes`.
    /// Smaller files are treated as leftovers of a failed download.
    pub fn file_larger_than<P: AsRef<Path>>(path: P, min_bytes: u64) -> bool {
        fs::metadata(path.as_ref())
            .map(|meta| meta.is_file() && meta.len() > min_bytes)
            .unwrap_or(false)
    }

    // @generates: PDF file name for a paper
    // @params: title, section prefix, max title chars
    pub fn sanitize_filename(title: &str, section: &str, max_chars: usize) -> String {
        let safe_title = INVALID_FILENAME_CHARS.replace_all(title, "");
        let safe_title = safe_title.replace(['\n', '\r'], " ");
        let safe_title = WHITESPACE_RUN.replace_all(safe_title.trim(), "_");

        let mut safe_title: String = safe_title.chars().take(max_chars).collect();

        if !section.is_empty() {
            safe_title = format!("{}_{}", section, safe_title);
        }

        format!("{}.pdf", safe_title)
    }

    // @generates: File name not yet in `taken` (compared lowercased), then records it
    // @params: base file name, paper fingerprint, names taken so far
    pub fn unique_filename(base: &str, fingerprint: &str, taken: &mut HashSet<String>) -> String {
        let mut candidate = base.to_string();
        if taken.contains(&candidate.to_lowercase()) {
            let stem = base.strip_suffix(".pdf").unwrap_or(base);
            let suffix: String = fingerprint.chars().take(FINGERPRINT_SUFFIX_CHARS).collect();
            candidate = format!("{}_{}.pdf", stem, suffix);

            let mut counter = 2;
            while taken.contains(&candidate.to_lowercase()) {
                candidate = format!("{}_{}_{}.pdf", stem, suffix, counter);
                counter += 1;
            }
        }
        taken.insert(candidate.to_lowercase());
        candidate
    }

    // @generates: Timestamped report path
    // @params: output_dir, file stem, timestamp, extension
    pub fn stamped_path<P: AsRef<Path>>(
        output_dir: P,
        stem: &str,
        timestamp: &str,
        extension: &str,
    ) -> PathBuf {
        output_dir
            .as_ref()
            .join(format!("{}_{}.{}", stem, timestamp, extension))
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }
}
