//! Downloads driven through a fake yt-dlp, without touching the network.

#![cfg(unix)]

mod common;

use std::time::Duration;
use tempfile::TempDir;
use tubeloader::catalog::FormatSelection;
use tubeloader::downloader::{DownloadOrchestrator, DownloadRequest};
use tubeloader::TubeloaderError;

fn request(dir: &TempDir) -> DownloadRequest {
    DownloadRequest::new(
        "https://example.com/watch?v=abc123",
        FormatSelection::Merge {
            video: "137".to_string(),
            audio: "140".to_string(),
        },
        dir.path().join("out"),
    )
}

#[tokio::test]
async fn download_reports_progress_then_completes() {
    let dir = TempDir::new().unwrap();
    let ytdlp = common::fake_ytdlp(dir.path(), &common::successful_download());

    let mut task = DownloadOrchestrator::new(ytdlp).start(&request(&dir)).unwrap();

    let mut fractions = Vec::new();
    while let Some(event) = task.next_event().await {
        fractions.push(event.fraction);
    }
    assert_eq!(fractions, vec![0.0, 0.43, 1.0]);
    task.wait().await.unwrap();
    assert!(dir.path().join("out").is_dir());
}

#[tokio::test]
async fn nonzero_exit_after_progress_is_failure() {
    let dir = TempDir::new().unwrap();
    let body = "printf '[download]  50.0%% of 1.00MiB at 1.00MiB/s ETA 00:01\\n'\n\
                echo 'ERROR: unable to download video data: HTTP Error 403' >&2\n\
                exit 1";
    let ytdlp = common::fake_ytdlp(dir.path(), body);

    let mut task = DownloadOrchestrator::new(ytdlp).start(&request(&dir)).unwrap();
    let first = task.next_event().await.unwrap();
    assert_eq!(first.percent(), 50);
    assert!(task.next_event().await.is_none());

    match task.wait().await.unwrap_err() {
        TubeloaderError::ProcessExit { code, stderr } => {
            assert_eq!(code, Some(1));
            assert!(stderr.contains("HTTP Error 403"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn cancel_kills_running_download() {
    let dir = TempDir::new().unwrap();
    let body = "printf '[download]  10.0%% of 1.00MiB at 1.00MiB/s ETA 00:09\\n'\nexec sleep 30";
    let ytdlp = common::fake_ytdlp(dir.path(), body);

    let mut task = DownloadOrchestrator::new(ytdlp).start(&request(&dir)).unwrap();
    assert_eq!(task.next_event().await.unwrap().percent(), 10);

    task.cancel();
    let outcome = tokio::time::timeout(Duration::from_secs(10), task.wait())
        .await
        .expect("cancelled download should finish promptly");
    assert!(matches!(outcome, Err(TubeloaderError::Cancelled)));
}

#[tokio::test]
async fn missing_executable_fails_synchronously() {
    let dir = TempDir::new().unwrap();
    let orchestrator = DownloadOrchestrator::new(dir.path().join("no-such-yt-dlp"));
    let err = orchestrator.start(&request(&dir)).unwrap_err();
    assert!(err.is_launch_error());
}

#[tokio::test]
async fn receiver_dropped_does_not_block_completion() {
    let dir = TempDir::new().unwrap();
    let ytdlp = common::fake_ytdlp(dir.path(), &common::successful_download());

    let task = DownloadOrchestrator::new(ytdlp).start(&request(&dir)).unwrap();
    let (events, completion, _cancel) = task.into_parts();
    drop(events);
    completion.wait().await.unwrap();
}
