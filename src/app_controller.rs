use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::Config;
use crate::dedup::{self, UniquePaper};
use crate::downloader::{DownloadStatus, Downloader};
use crate::errors::AppError;
use crate::fetcher::{self, DocumentSource};
use crate::file_utils::FileManager;
use crate::parser::{ParseResult, ReadmeParser, truncate_chars};
use crate::providers::arxiv::Arxiv;
use crate::providers::semantic_scholar::SemanticScholar;
use crate::providers::SearchProvider;
use crate::report::{Outcome, PaperOutcome, Report, RunStats};
use crate::resolver::Resolver;

// @module: Application controller for the paper mirroring pipeline

/// Main application controller: fetch, parse, deduplicate, resolve, download, report
pub struct Controller {
    // @field: App configuration
    config: Config,
    parser: ReadmeParser,
    resolver: Resolver,
    downloader: Downloader,
    show_progress: bool,
}

impl Controller {
    // @method: Create a new controller with the default search providers
    pub fn with_config(config: Config) -> Result<Self> {
        let providers: Vec<Arc<dyn SearchProvider>> = vec![
            Arc::new(SemanticScholar::new(
                config.search.semantic_scholar_endpoint.clone(),
                config.semantic_scholar_api_key(),
                config.search.timeout_secs,
            )),
            Arc::new(Arxiv::new(
                config.search.arxiv_endpoint.clone(),
                config.search.timeout_secs,
            )),
        ];
        Self::with_providers(config, providers)
    }

    // @method: Create a controller querying the given providers in order
    pub fn with_providers(config: Config, providers: Vec<Arc<dyn SearchProvider>>) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;

        let parser = ReadmeParser::from_names(&config.sections);
        let resolver = Resolver::new(
            providers,
            Duration::from_millis(config.search.request_delay_ms),
        );
        let downloader = Downloader::new(
            &config.download.output_dir,
            config.download.min_existing_bytes,
            config.download.timeout_secs,
        );

        Ok(Self {
            config,
            parser,
            resolver,
            downloader,
            show_progress: true,
        })
    }

    /// Enable or disable the progress bar
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Retrieve the README from the configured source
    pub async fn fetch_document(&self) -> Result<String, AppError> {
        let source = DocumentSource::parse(&self.config.source);
        info!("Fetching README from {}", source);
        let text = fetcher::fetch_document(&source, self.config.search.timeout_secs).await?;
        Ok(text)
    }

    /// Parse README text with the configured sections
    pub fn parse_document(&self, text: &str) -> ParseResult {
        let parsed = self.parser.parse(text);
        for section in parsed.iter() {
            info!("{}: {} papers", section.name, section.papers.len());
        }
        info!("Total papers found: {}", parsed.total_papers());
        parsed
    }

    /// Run the whole pipeline and write the reports
    pub async fn run(&self) -> Result<Report> {
        let start_time = std::time::Instant::now();

        let text = self
            .fetch_document()
            .await
            .with_context(|| format!("Failed to fetch README from {}", self.config.source))?;
        let parsed = self.parse_document(&text);

        if parsed.total_papers() == 0 {
            error!("No papers found. Please check the README parsing logic.");
            return Ok(Report::default());
        }

        let report = self.process_papers(parsed).await?;

        report.log_summary();
        report.write(Path::new(&self.config.report.output_dir), self.config.report.write_tables)?;

        info!(
            "Finished in {}. Downloaded papers saved to: {}",
            format_duration(start_time.elapsed()),
            self.config.download.output_dir
        );
        Ok(report)
    }

    /// Deduplicate, resolve and download the parsed papers
    pub async fn process_papers(&self, parsed: ParseResult) -> Result<Report> {
        FileManager::ensure_dir(self.downloader.output_dir())?;

        let parse_stats = RunStats::from_parse(&parsed);
        let unique = dedup::deduplicate(parsed.into_records());
        info!("Unique papers after deduplication: {}", unique.len());

        let filenames = self.assign_filenames(&unique);
        let progress_bar = self.progress_bar(unique.len() as u64);
        let total = unique.len();

        let outcomes: Vec<PaperOutcome> = stream::iter(unique.iter().zip(&filenames).enumerate())
            .map(|(index, (paper, filename))| {
                debug!(
                    "[{}/{}] Processing: {} (from section {})",
                    index + 1,
                    total,
                    truncate_chars(&paper.record.title, 60),
                    paper.record.section
                );
                self.process_paper(paper, filename)
            })
            .buffered(self.config.download.concurrent_downloads.max(1))
            .inspect(|outcome| {
                progress_bar.set_message(truncate_chars(&outcome.title, 40));
                progress_bar.inc(1);
            })
            .collect()
            .await;

        progress_bar.finish_and_clear();

        let stats = parse_stats.merge(RunStats::from_outcomes(&outcomes));
        Ok(Report::new(stats, outcomes))
    }

    /// PDF file name for every paper, in order.
    ///
    /// Names are unique within the run (ignoring case): a paper whose truncated
    /// name is already taken gets a fingerprint suffix. Assignment follows
    /// document order, so reruns produce the same names.
    pub fn assign_filenames(&self, papers: &[UniquePaper]) -> Vec<String> {
        let max_chars = self.config.download.max_filename_chars;
        let mut taken = HashSet::new();
        papers
            .iter()
            .map(|paper| {
                let base = FileManager::sanitize_filename(&paper.record.title, &paper.record.section, max_chars);
                let filename = FileManager::unique_filename(&base, &paper.fingerprint, &mut taken);
                if filename != base {
                    debug!("File name {} already taken, using {}", base, filename);
                }
                filename
            })
            .collect()
    }

    /// Resolve one paper and download its PDF to `filename`
    pub async fn process_paper(&self, paper: &UniquePaper, filename: &str) -> PaperOutcome {
        let title = &paper.record.title;
        let section = &paper.record.section;

        let result = self.resolver.resolve(title).await;

        let mut outcome = PaperOutcome {
            title: title.clone(),
            section: section.clone(),
            authors: result.authors.clone(),
            filename: None,
            pdf_url: result.pdf_url.clone(),
            source: result.source.clone(),
            outcome: Outcome::Failed {
                reason: "PDF not found".to_string(),
            },
        };

        let Some(pdf_url) = result.pdf_url.as_deref().filter(|_| result.has_pdf()) else {
            warn!("PDF not found: {}", truncate_chars(title, 60));
            return outcome;
        };

        outcome.outcome = match self.downloader.download(pdf_url, filename).await {
            Ok(DownloadStatus::Downloaded) => {
                info!("Downloaded: {}", filename);
                Outcome::Downloaded
            }
            Ok(DownloadStatus::AlreadyExisted) => {
                info!("Already exists: {}", filename);
                Outcome::AlreadyExisted
            }
            Err(e) => {
                warn!("Download failed for {}: {}", filename, e);
                Outcome::Failed {
                    reason: format!("Download failed: {}", e),
                }
            }
        };
        outcome.filename = Some(filename.to_string());
        outcome
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let progress_bar = ProgressBar::new(len);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} papers ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar
    }
}

/// Format a duration as `1h 2m 3s`, `2m 3s` or `3.4s`
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}
