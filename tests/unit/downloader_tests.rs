/*!
 * Tests for the PDF downloader: existence checks and transfers from a local server
 */

use anyhow::Result;
use bestpapers::downloader::{DownloadStatus, Downloader};
use bestpapers::errors::DownloadError;
use crate::common;
use crate::common::http_server::{Route, TestServer};

#[test]
fn test_download_withLargeExistingFile_shouldSkipWithoutRequest() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_sized_file(temp_dir.path(), "CVPR_Some_Paper.pdf", 2048)?;
    let downloader = Downloader::new(temp_dir.path(), 1000, 1);

    // The URL is unroutable: reaching the network would fail the test
    let status = tokio_test::block_on(async {
        downloader
            .download("http://127.0.0.1:9/unused.pdf", "CVPR_Some_Paper.pdf")
            .await
    })?;

    assert_eq!(status, DownloadStatus::AlreadyExisted);
    Ok(())
}

#[tokio::test]
async fn test_download_withSmallLeftoverFile_shouldRetryAndCleanUpOnFailure() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let leftover = common::create_sized_file(temp_dir.path(), "ICLR_Partial.pdf", 1000)?;
    let downloader = Downloader::new(temp_dir.path(), 1000, 1);

    assert!(!downloader.already_present("ICLR_Partial.pdf"));

    let result = downloader
        .download("http://127.0.0.1:9/unused.pdf", "ICLR_Partial.pdf")
        .await;

    assert!(result.is_err());
    assert!(!leftover.exists());
    Ok(())
}

#[tokio::test]
async fn test_download_withMissingOutputDir_shouldCreateIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let output = temp_dir.path().join("nested").join("pdfs");
    let downloader = Downloader::new(&output, 1000, 1);

    let _ = downloader.download("http://127.0.0.1:9/unused.pdf", "Any.pdf").await;

    assert!(output.is_dir());
    assert!(!output.join("Any.pdf").exists());
    Ok(())
}

#[test]
fn test_targetPath_shouldJoinOutputDir() {
    let downloader = Downloader::new("downloaded_papers", 1000, 30);
    assert_eq!(
        downloader.target_path("CVPR_X.pdf"),
        std::path::PathBuf::from("downloaded_papers/CVPR_X.pdf")
    );
    assert_eq!(downloader.output_dir(), std::path::Path::new("downloaded_papers"));
}

#[tokio::test]
async fn test_download_withServedPdf_shouldWriteFileThenSkipIt() -> Result<()> {
    let body = common::pdf_body(4096);
    let server = TestServer::start(vec![Route::pdf("/papers/resnet.pdf", body.clone())]).await?;
    let temp_dir = common::create_temp_dir()?;
    let downloader = Downloader::new(temp_dir.path(), 1000, 5);
    let url = server.url("/papers/resnet.pdf");

    let first = downloader.download(&url, "CVPR_ResNet.pdf").await?;
    assert_eq!(first, DownloadStatus::Downloaded);
    assert_eq!(std::fs::read(temp_dir.path().join("CVPR_ResNet.pdf"))?, body);

    let second = downloader.download(&url, "CVPR_ResNet.pdf").await?;
    assert_eq!(second, DownloadStatus::AlreadyExisted);
    assert_eq!(server.requests().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_download_withSmallServedFile_shouldDownloadAgainNextTime() -> Result<()> {
    let server = TestServer::start(vec![Route::pdf("/tiny.pdf", common::pdf_body(200))]).await?;
    let temp_dir = common::create_temp_dir()?;
    let downloader = Downloader::new(temp_dir.path(), 1000, 5);

    let url = server.url("/tiny.pdf");
    assert_eq!(downloader.download(&url, "Tiny.pdf").await?, DownloadStatus::Downloaded);
    assert_eq!(downloader.download(&url, "Tiny.pdf").await?, DownloadStatus::Downloaded);
    assert_eq!(server.requests().len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_download_withNotFoundStatus_shouldFailWithoutLeavingFile() -> Result<()> {
    let server = TestServer::start(Vec::new()).await?;
    let temp_dir = common::create_temp_dir()?;
    let downloader = Downloader::new(temp_dir.path(), 1000, 5);

    let result = downloader.download(&server.url("/missing.pdf"), "ICLR_Missing.pdf").await;

    assert!(matches!(result, Err(DownloadError::Status { status_code: 404 })));
    assert!(!temp_dir.path().join("ICLR_Missing.pdf").exists());
    assert_eq!(server.requests(), vec!["/missing.pdf"]);
    Ok(())
}
