/*!
 * Run statistics and result reports.
 *
 * Statistics are plain values: the controller builds one from the parse
 * result and one from the per-paper outcomes and merges them. The final report
 * is written as a JSON summary plus an xlsx workbook with two sheets
 * (successes and failures). When the workbook cannot be written the two sheets
 * go to CSV files instead.
 */

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};
use rust_xlsxwriter::Workbook;
use serde::Serialize;

use crate::file_utils::FileManager;
use crate::parser::ParseResult;

/// Name of the JSON summary file
pub const JSON_REPORT_FILE: &str = "download_report.json";

pub const DOWNLOADED_SHEET: &str = "Downloaded Papers";
pub const FAILED_SHEET: &str = "Failed Papers";

/// Cell A1 of a sheet without rows
pub const NO_DOWNLOADS_PLACEHOLDER: &str = "No papers were downloaded";
pub const NO_FAILURES_PLACEHOLDER: &str = "No failed downloads";

const DOWNLOADED_HEADERS: [&str; 6] = [
    "Paper Title",
    "Authors",
    "Conference/Section",
    "Filename",
    "Source",
    "Status",
];

const FAILED_HEADERS: [&str; 6] = [
    "Paper Title",
    "Authors",
    "Conference/Section",
    "Reason",
    "PDF URL",
    "Source",
];

/// Final state of one unique paper
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Downloaded,
    AlreadyExisted,
    Failed { reason: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    /// Label used in the downloaded-papers sheet
    pub fn status_label(&self) -> &str {
        match self {
            Self::Downloaded => "Downloaded",
            Self::AlreadyExisted => "Already Existed",
            Self::Failed { .. } => "Failed",
        }
    }
}

/// Everything the report needs to know about one processed paper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperOutcome {
    pub title: String,
    pub section: String,
    pub authors: Vec<String>,
    /// Target file name, when a PDF link was found
    pub filename: Option<String>,
    pub pdf_url: Option<String>,
    /// Search service that produced the result
    pub source: String,
    pub outcome: Outcome,
}

/// Counters for one section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SectionStats {
    pub total: usize,
    pub downloaded: usize,
    pub already_existed: usize,
    pub failed: usize,
}

impl SectionStats {
    fn merge(&mut self, other: &SectionStats) {
        self.total += other.total;
        self.downloaded += other.downloaded;
        self.already_existed += other.already_existed;
        self.failed += other.failed;
    }

    /// Share of successful papers among the section total, in percent
    pub fn success_rate(&self) -> f64 {
        percentage(self.downloaded + self.already_existed, self.total)
    }
}

/// Counters for a whole run
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RunStats {
    pub total_papers: usize,
    pub unique_papers: usize,
    pub downloaded: usize,
    pub already_existed: usize,
    pub failed: usize,
    pub sections: BTreeMap<String, SectionStats>,
}

impl RunStats {
    /// Paper counts found by the parser, before deduplication
    pub fn from_parse(parsed: &ParseResult) -> Self {
        let mut stats = Self::default();
        for section in parsed.iter().filter(|s| !s.papers.is_empty()) {
            stats.total_papers += section.papers.len();
            stats.sections.insert(
                section.name.clone(),
                SectionStats {
                    total: section.papers.len(),
                    ..Default::default()
                },
            );
        }
        stats
    }

    /// Outcome counts for the unique papers of a run
    pub fn from_outcomes(outcomes: &[PaperOutcome]) -> Self {
        let mut stats = Self::default();
        for outcome in outcomes {
            stats.record(outcome);
        }
        stats
    }

    /// Count one processed unique paper
    pub fn record(&mut self, paper: &PaperOutcome) {
        self.unique_papers += 1;
        let section = self.sections.entry(paper.section.clone()).or_default();
        match paper.outcome {
            Outcome::Downloaded => {
                self.downloaded += 1;
                section.downloaded += 1;
            }
            Outcome::AlreadyExisted => {
                self.already_existed += 1;
                section.already_existed += 1;
            }
            Outcome::Failed { .. } => {
                self.failed += 1;
                section.failed += 1;
            }
        }
    }

    /// Combine two sets of counters
    pub fn merge(mut self, other: RunStats) -> Self {
        self.total_papers += other.total_papers;
        self.unique_papers += other.unique_papers;
        self.downloaded += other.downloaded;
        self.already_existed += other.already_existed;
        self.failed += other.failed;
        for (name, section) in other.sections {
            self.sections.entry(name).or_default().merge(&section);
        }
        self
    }

    /// Share of successful papers among unique papers, in percent
    pub fn success_rate(&self) -> f64 {
        percentage(self.downloaded + self.already_existed, self.unique_papers)
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// JSON summary written at the end of a run
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub summary: &'a RunStats,
    pub downloaded_count: usize,
    pub failed_count: usize,
    pub timestamp: String,
}

type Row = [String; 6];

/// Where the two result sheets ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableFiles {
    Workbook(PathBuf),
    /// Written when the workbook failed
    Csv { downloaded: PathBuf, failed: PathBuf },
}

/// Paths written by [`Report::write`]
#[derive(Debug, Clone)]
pub struct ReportFiles {
    pub json: PathBuf,
    pub tables: Option<TableFiles>,
}

/// Results of a complete run
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub stats: RunStats,
    pub outcomes: Vec<PaperOutcome>,
}

impl Report {
    pub fn new(stats: RunStats, outcomes: Vec<PaperOutcome>) -> Self {
        Self { stats, outcomes }
    }

    pub fn downloaded(&self) -> impl Iterator<Item = &PaperOutcome> {
        self.outcomes.iter().filter(|o| o.outcome.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &PaperOutcome> {
        self.outcomes.iter().filter(|o| !o.outcome.is_success())
    }

    /// Build the JSON summary
    pub fn json_report(&self, timestamp: String) -> JsonReport<'_> {
        JsonReport {
            summary: &self.stats,
            downloaded_count: self.downloaded().count(),
            failed_count: self.failed().count(),
            timestamp,
        }
    }

    /// Write the JSON summary and, when `write_tables` is set, the result sheets
    pub fn write(&self, output_dir: &Path, write_tables: bool) -> Result<ReportFiles> {
        FileManager::ensure_dir(output_dir)?;
        let now = chrono::Local::now();

        let json_path = output_dir.join(JSON_REPORT_FILE);
        let json = serde_json::to_string_pretty(&self.json_report(now.format("%Y-%m-%d %H:%M:%S").to_string()))
            .context("Failed to serialize report")?;
        FileManager::write_to_file(&json_path, &json)?;
        info!("Detailed report saved to: {:?}", json_path);

        let tables = if write_tables {
            Some(self.write_tables(output_dir, &now.format("%Y%m%d_%H%M%S").to_string())?)
        } else {
            None
        };

        Ok(ReportFiles {
            json: json_path,
            tables,
        })
    }

    /// Write both sheets into `paper_download_results_<stamp>.xlsx`, or into
    /// two stamped CSV files when the workbook cannot be saved
    pub fn write_tables(&self, output_dir: &Path, stamp: &str) -> Result<TableFiles> {
        let workbook = FileManager::stamped_path(output_dir, "paper_download_results", stamp, "xlsx");
        match self.write_workbook(&workbook) {
            Ok(()) => {
                info!(
                    "Results workbook saved to: {:?} ({} downloaded, {} failed)",
                    workbook,
                    self.downloaded().count(),
                    self.failed().count()
                );
                return Ok(TableFiles::Workbook(workbook));
            }
            Err(e) => warn!("Could not write workbook {:?}: {:#}. Falling back to CSV", workbook, e),
        }

        let downloaded = FileManager::stamped_path(output_dir, "downloaded_papers", stamp, "csv");
        let failed = FileManager::stamped_path(output_dir, "failed_papers", stamp, "csv");
        self.write_downloaded_csv(&downloaded)?;
        self.write_failed_csv(&failed)?;
        info!("Downloaded papers sheet: {:?} ({} papers)", downloaded, self.downloaded().count());
        info!("Failed papers sheet: {:?} ({} papers)", failed, self.failed().count());
        Ok(TableFiles::Csv { downloaded, failed })
    }

    /// Write the two-sheet workbook
    pub fn write_workbook(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            FileManager::ensure_dir(parent)?;
        }

        let mut workbook = Workbook::new();
        let sheets = [
            (DOWNLOADED_SHEET, &DOWNLOADED_HEADERS, self.downloaded_rows(), NO_DOWNLOADS_PLACEHOLDER),
            (FAILED_SHEET, &FAILED_HEADERS, self.failed_rows(), NO_FAILURES_PLACEHOLDER),
        ];
        for (name, headers, rows, placeholder) in sheets {
            let sheet = workbook.add_worksheet();
            sheet.set_name(name).context("Failed to name worksheet")?;

            if rows.is_empty() {
                sheet
                    .write_string(0, 0, placeholder)
                    .context("Failed to write worksheet cell")?;
                continue;
            }

            for (col, header) in (0u16..).zip(headers.iter()) {
                sheet
                    .write_string(0, col, *header)
                    .context("Failed to write worksheet cell")?;
            }
            for (row, cells) in (1u32..).zip(rows.iter()) {
                for (col, cell) in (0u16..).zip(cells.iter()) {
                    sheet
                        .write_string(row, col, cell.as_str())
                        .context("Failed to write worksheet cell")?;
                }
            }
        }

        workbook
            .save(path)
            .with_context(|| format!("Failed to save workbook: {:?}", path))
    }

    /// Write the sheet of downloaded or already present papers
    pub fn write_downloaded_csv(&self, path: &Path) -> Result<()> {
        write_csv(path, &DOWNLOADED_HEADERS, &self.downloaded_rows())
    }

    /// Write the sheet of papers that could not be obtained
    pub fn write_failed_csv(&self, path: &Path) -> Result<()> {
        write_csv(path, &FAILED_HEADERS, &self.failed_rows())
    }

    fn downloaded_rows(&self) -> Vec<Row> {
        self.downloaded()
            .map(|paper| {
                [
                    paper.title.clone(),
                    paper.authors.join("; "),
                    paper.section.clone(),
                    paper.filename.clone().unwrap_or_default(),
                    paper.source.clone(),
                    paper.outcome.status_label().to_string(),
                ]
            })
            .collect()
    }

    fn failed_rows(&self) -> Vec<Row> {
        self.failed()
            .map(|paper| {
                let reason = match &paper.outcome {
                    Outcome::Failed { reason } => reason.clone(),
                    _ => String::new(),
                };
                [
                    paper.title.clone(),
                    paper.authors.join("; "),
                    paper.section.clone(),
                    reason,
                    paper.pdf_url.clone().unwrap_or_default(),
                    paper.source.clone(),
                ]
            })
            .collect()
    }

    /// Log the human-readable final statistics
    pub fn log_summary(&self) {
        let stats = &self.stats;
        info!("FINAL STATISTICS");
        info!("Total papers found: {}", stats.total_papers);
        info!("Unique papers: {}", stats.unique_papers);
        info!("Successfully downloaded: {}", stats.downloaded);
        info!("Already existed: {}", stats.already_existed);
        info!("Failed downloads: {}", stats.failed);
        if stats.unique_papers > 0 {
            info!("Overall success rate: {:.1}%", stats.success_rate());
        }

        for (name, section) in stats.sections.iter().filter(|(_, s)| s.total > 0) {
            info!(
                "{}: total {}, downloaded {}, already existed {}, failed {}, success rate {:.1}%",
                name,
                section.total,
                section.downloaded,
                section.already_existed,
                section.failed,
                section.success_rate()
            );
        }
    }
}

fn write_csv(path: &Path, headers: &[&str], rows: &[Row]) -> Result<()> {
    if let Some(parent) = path.parent() {
        FileManager::ensure_dir(parent)?;
    }
    let mut writer = csv::Writer::from_path(path).context("Failed to create CSV writer")?;
    writer
        .write_record(headers)
        .context("Failed to write CSV header")?;
    for row in rows {
        writer.write_record(row).context("Failed to write CSV record")?;
    }
    writer.flush().context("Failed to flush CSV")?;
    Ok(())
}
