/*!
 * End-to-end pipeline tests.
 *
 * The README is read from a local file. Titles are resolved by mock providers,
 * or by the real clients pointed at a local server. PDFs are either pre-created
 * in the output directory or served from that local server.
 */

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use bestpapers::app_config::Config;
use bestpapers::app_controller::{Controller, format_duration};
use bestpapers::dedup::deduplicate;
use bestpapers::errors::{AppError, FetchError};
use bestpapers::file_utils::FileManager;
use bestpapers::parser::ParseResult;
use bestpapers::providers::SearchProvider;
use bestpapers::providers::arxiv::Arxiv;
use bestpapers::providers::semantic_scholar::SemanticScholar;
use bestpapers::report::{JSON_REPORT_FILE, Outcome};
use crate::common;
use crate::common::http_server::{Route, TestServer};
use crate::common::mock_providers::{MockAnswer, MockSearchProvider};

const VISUAL_PROGRAMMING: &str = "Visual Programming: Compositional visual reasoning without training";
const UNIAD: &str = "Planning-oriented Autonomous Driving";
const UNIVERSAL_TRANSFORMERS: &str = "Universal Transformers";
const RESNET: &str = "Deep Residual Learning for Image Recognition";

/// Unroutable address: any real request fails fast
const DEAD_URL: &str = "http://127.0.0.1:9/paper.pdf";

fn test_config(root: &Path, readme: &Path) -> Config {
    let mut config = Config::default();
    config.source = readme.to_string_lossy().to_string();
    config.search.request_delay_ms = 0;
    config.download.output_dir = root.join("pdfs").to_string_lossy().to_string();
    config.download.timeout_secs = 1;
    config.report.output_dir = root.join("reports").to_string_lossy().to_string();
    config
}

fn mock_chain() -> (MockSearchProvider, MockSearchProvider) {
    let primary = MockSearchProvider::new("semantic_scholar")
        .with_answer(VISUAL_PROGRAMMING, MockAnswer::Pdf(DEAD_URL.to_string()))
        .with_answer(RESNET, MockAnswer::NoPdf);
    let fallback = MockSearchProvider::new("arxiv")
        .with_answer(UNIAD, MockAnswer::Pdf(DEAD_URL.to_string()));
    (primary, fallback)
}

fn providers(primary: MockSearchProvider, fallback: MockSearchProvider) -> Vec<Arc<dyn SearchProvider>> {
    vec![Arc::new(primary), Arc::new(fallback)]
}

#[tokio::test]
async fn test_run_withSampleReadme_shouldReportEveryUniquePaper() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let readme = common::create_test_file(temp_dir.path(), "README.md", common::SAMPLE_README)?;
    let config = test_config(temp_dir.path(), &readme);

    // Mirror already holds both papers that resolve to a PDF
    let pdf_dir = Path::new(&config.download.output_dir).to_path_buf();
    FileManager::ensure_dir(&pdf_dir)?;
    common::create_sized_file(&pdf_dir, &FileManager::sanitize_filename(VISUAL_PROGRAMMING, "CVPR", 80), 4096)?;
    common::create_sized_file(&pdf_dir, &FileManager::sanitize_filename(UNIAD, "CVPR", 80), 4096)?;

    let (primary, fallback) = mock_chain();
    let primary_calls = primary.tracker();
    let fallback_calls = fallback.tracker();

    let controller = Controller::with_providers(config.clone(), providers(primary, fallback))?.with_progress(false);
    let report = controller.run().await?;

    let stats = &report.stats;
    assert_eq!(stats.total_papers, 5);
    assert_eq!(stats.unique_papers, 4);
    assert_eq!(stats.downloaded, 0);
    assert_eq!(stats.already_existed, 2);
    assert_eq!(stats.failed, 2);
    assert_eq!(stats.sections["CVPR"].total, 2);
    assert_eq!(stats.sections["CVPR"].already_existed, 2);
    assert_eq!(stats.sections["ICLR"].failed, 1);
    assert_eq!(stats.sections["Test-of-Time-Papers"].total, 2);
    assert_eq!(stats.sections["Test-of-Time-Papers"].failed, 1);

    // Every unique title goes to the primary provider once, in document order
    assert_eq!(
        primary_calls.lock().unwrap().queries,
        vec![VISUAL_PROGRAMMING, UNIAD, UNIVERSAL_TRANSFORMERS, RESNET]
    );
    // Only the titles the primary did not find reach the fallback
    assert_eq!(fallback_calls.lock().unwrap().queries, vec![UNIAD, UNIVERSAL_TRANSFORMERS]);

    let uniad = report.outcomes.iter().find(|o| o.title == UNIAD).expect("UniAD outcome");
    assert_eq!(uniad.source, "arxiv");
    assert_eq!(uniad.outcome, Outcome::AlreadyExisted);
    assert_eq!(uniad.filename.as_deref(), Some("CVPR_Planning-oriented_Autonomous_Driving.pdf"));

    let failed: Vec<&str> = report.failed().map(|o| o.title.as_str()).collect();
    assert_eq!(failed, vec![UNIVERSAL_TRANSFORMERS, RESNET]);
    assert!(report.failed().all(|o| o.outcome == Outcome::Failed { reason: "PDF not found".to_string() }));

    let report_dir = Path::new(&config.report.output_dir);
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(report_dir.join(JSON_REPORT_FILE))?)?;
    assert_eq!(json["downloaded_count"], 2);
    assert_eq!(json["failed_count"], 2);
    assert_eq!(json["summary"]["total_papers"], 5);

    let extensions: Vec<String> = std::fs::read_dir(report_dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.path().extension().map(|ext| ext.to_string_lossy().to_string()))
        .collect();
    assert_eq!(extensions.iter().filter(|ext| *ext == "xlsx").count(), 1);
    assert!(!extensions.iter().any(|ext| ext == "csv"));
    Ok(())
}

#[tokio::test]
async fn test_run_twice_shouldBeIdempotent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let readme = common::create_test_file(temp_dir.path(), "README.md", common::SAMPLE_README)?;
    let config = test_config(temp_dir.path(), &readme);
    let pdf_dir = Path::new(&config.download.output_dir).to_path_buf();
    FileManager::ensure_dir(&pdf_dir)?;
    common::create_sized_file(&pdf_dir, &FileManager::sanitize_filename(VISUAL_PROGRAMMING, "CVPR", 80), 4096)?;
    common::create_sized_file(&pdf_dir, &FileManager::sanitize_filename(UNIAD, "CVPR", 80), 4096)?;

    let (primary, fallback) = mock_chain();
    let first = Controller::with_providers(config.clone(), providers(primary, fallback))?
        .with_progress(false)
        .run()
        .await?;
    let (primary, fallback) = mock_chain();
    let second = Controller::with_providers(config, providers(primary, fallback))?
        .with_progress(false)
        .run()
        .await?;

    assert_eq!(first.stats, second.stats);
    assert_eq!(first.outcomes, second.outcomes);
    Ok(())
}

#[tokio::test]
async fn test_run_withNoRecognizedSections_shouldReturnEmptyReportWithoutWriting() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let readme = common::create_test_file(temp_dir.path(), "README.md", "# Nothing here\nJust some prose about papers.\n")?;
    let config = test_config(temp_dir.path(), &readme);
    let (primary, fallback) = mock_chain();
    let primary_calls = primary.tracker();

    let report = Controller::with_providers(config.clone(), providers(primary, fallback))?
        .with_progress(false)
        .run()
        .await?;

    assert_eq!(report.stats.total_papers, 0);
    assert!(report.outcomes.is_empty());
    assert_eq!(primary_calls.lock().unwrap().call_count, 0);
    assert!(!Path::new(&config.report.output_dir).join(JSON_REPORT_FILE).exists());
    Ok(())
}

#[tokio::test]
async fn test_run_withMissingReadme_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = test_config(temp_dir.path(), &temp_dir.path().join("missing.md"));
    let (primary, fallback) = mock_chain();

    let controller = Controller::with_providers(config, providers(primary, fallback))?.with_progress(false);

    assert!(matches!(
        controller.fetch_document().await,
        Err(AppError::Fetch(FetchError::Io(_)))
    ));
    let err = controller.run().await.unwrap_err();
    assert!(err.to_string().starts_with("Failed to fetch README from"));
    Ok(())
}

#[tokio::test]
async fn test_processPaper_whenDownloadFails_shouldRecordReason() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let readme = common::create_test_file(temp_dir.path(), "README.md", common::SAMPLE_README)?;
    let config = test_config(temp_dir.path(), &readme);
    let (primary, fallback) = mock_chain();

    let controller = Controller::with_providers(config, providers(primary, fallback))?.with_progress(false);
    let text = controller.fetch_document().await?;
    let unique = deduplicate(controller.parse_document(&text).into_records());
    let paper = unique
        .iter()
        .find(|p| p.record.title == VISUAL_PROGRAMMING)
        .expect("paper parsed");

    let filename = FileManager::sanitize_filename(&paper.record.title, &paper.record.section, 80);
    let outcome = controller.process_paper(paper, &filename).await;

    assert_eq!(outcome.section, "CVPR");
    assert_eq!(outcome.pdf_url.as_deref(), Some(DEAD_URL));
    assert_eq!(
        outcome.filename.as_deref(),
        Some("CVPR_Visual_Programming_Compositional_visual_reasoning_without_training.pdf")
    );
    match outcome.outcome {
        Outcome::Failed { reason } => assert!(reason.starts_with("Download failed:")),
        other => panic!("expected a failure, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_run_withServedPdfs_shouldDownloadEveryResolvedPaper() -> Result<()> {
    common::init_test_logging();
    let empty_search = r#"{"total": 0, "data": []}"#;
    let feed_placeholder = "PDF_URL";
    let feed = r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry>
        <title>Served Paper</title><author><name>Test Author</name></author>
        <link title="pdf" href="PDF_URL" rel="related"/>
    </entry></feed>"#;

    // The feed carries the PDF server's address, so that server starts first
    let body = common::pdf_body(2048);
    let pdf_server = TestServer::start(vec![Route::pdf("/pdf/served.pdf", body.clone())]).await?;
    let feed = feed.replace(feed_placeholder, &pdf_server.url("/pdf/served.pdf"));
    let api_server = TestServer::start(vec![
        Route::json("/graph/v1/paper/search", empty_search),
        Route::atom("/api/query", &feed),
    ])
    .await?;

    let temp_dir = common::create_temp_dir()?;
    let readme = common::create_test_file(temp_dir.path(), "README.md", common::SAMPLE_README)?;
    let config = test_config(temp_dir.path(), &readme);
    let live: Vec<Arc<dyn SearchProvider>> = vec![
        Arc::new(SemanticScholar::new(api_server.url("/graph/v1"), None, 5)),
        Arc::new(Arxiv::new(api_server.url("/api/query"), 5)),
    ];

    let report = Controller::with_providers(config.clone(), live)?
        .with_progress(false)
        .run()
        .await?;

    assert_eq!(report.stats.unique_papers, 4);
    assert_eq!(report.stats.downloaded, 4);
    assert_eq!(report.stats.failed, 0);
    assert!(report.outcomes.iter().all(|o| o.outcome == Outcome::Downloaded && o.source == "arxiv"));
    assert_eq!(pdf_server.requests().len(), 4);

    let uniad = report.outcomes.iter().find(|o| o.title == UNIAD).expect("UniAD outcome");
    assert_eq!(uniad.authors, vec!["Test Author"]);
    let pdf_path = Path::new(&config.download.output_dir).join(uniad.filename.as_deref().unwrap());
    assert_eq!(std::fs::read(pdf_path)?, body);

    // Second run finds everything on disk
    let live: Vec<Arc<dyn SearchProvider>> = vec![
        Arc::new(SemanticScholar::new(api_server.url("/graph/v1"), None, 5)),
        Arc::new(Arxiv::new(api_server.url("/api/query"), 5)),
    ];
    let again = Controller::with_providers(config, live)?.with_progress(false).run().await?;
    assert_eq!(again.stats.already_existed, 4);
    assert_eq!(pdf_server.requests().len(), 4);
    Ok(())
}

#[tokio::test]
async fn test_run_withTitlesSharingTruncatedPrefix_shouldWriteDistinctFiles() -> Result<()> {
    let prefix = "A Remarkably Long Paper Title That Keeps Going Well Past The Filename Limit Of Eighty";
    let first_title = format!("{} Chars, Part One", prefix);
    let second_title = format!("{} Chars, Part Two", prefix);
    let document = format!("## CVPR\n{} [Paper]\n{} [Paper]\n", first_title, second_title);

    let first_body = common::pdf_body(1500);
    let second_body = common::pdf_body(3000);
    let server = TestServer::start(vec![
        Route::pdf("/one.pdf", first_body.clone()),
        Route::pdf("/two.pdf", second_body.clone()),
    ])
    .await?;

    let temp_dir = common::create_temp_dir()?;
    let readme = common::create_test_file(temp_dir.path(), "README.md", &document)?;
    let mut config = test_config(temp_dir.path(), &readme);
    config.sections = vec!["CVPR".to_string()];
    config.download.concurrent_downloads = 2;
    let primary = MockSearchProvider::new("semantic_scholar")
        .with_answer(&first_title, MockAnswer::Pdf(server.url("/one.pdf")))
        .with_answer(&second_title, MockAnswer::Pdf(server.url("/two.pdf")));
    let fallback = MockSearchProvider::new("arxiv");

    let controller = Controller::with_providers(config.clone(), providers(primary, fallback))?.with_progress(false);
    let unique = deduplicate(controller.parse_document(&document).into_records());
    let filenames = controller.assign_filenames(&unique);
    assert_eq!(filenames.len(), 2);
    assert_ne!(filenames[0].to_lowercase(), filenames[1].to_lowercase());
    assert_eq!(filenames[0], FileManager::sanitize_filename(&first_title, "CVPR", 80));
    let suffix = &unique[1].fingerprint[..8];
    assert!(filenames[1].ends_with(&format!("_{}.pdf", suffix)));

    let report = controller.run().await?;

    assert_eq!(report.stats.downloaded, 2);
    let pdf_dir = Path::new(&config.download.output_dir);
    assert_eq!(std::fs::read(pdf_dir.join(&filenames[0]))?, first_body);
    assert_eq!(std::fs::read(pdf_dir.join(&filenames[1]))?, second_body);
    Ok(())
}

#[test]
fn test_assignFilenames_withNoPapers_shouldBeEmpty() -> Result<()> {
    let controller = Controller::with_providers(Config::default(), Vec::new())?;
    let unique = deduplicate(ParseResult::default().into_records());
    assert!(controller.assign_filenames(&unique).is_empty());
    Ok(())
}

#[test]
fn test_withProviders_withInvalidConfig_shouldFail() {
    let mut config = Config::default();
    config.sections.clear();

    assert!(Controller::with_providers(config, Vec::new()).is_err());
}

#[test]
fn test_formatDuration_shouldPickLargestUnit() {
    use std::time::Duration;

    assert_eq!(format_duration(Duration::from_secs(3723)), "1h 2m 3s");
    assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    assert_eq!(format_duration(Duration::from_millis(3400)), "3.4s");
}
