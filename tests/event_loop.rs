// tests/event_loop.rs

mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use backwatch::backup::{BackupWriter, Clock};
use backwatch::config::ConfigFile;
use backwatch::engine::{decide, BackupCore, EventDecision, EventLoop, EventOutcome, LoopExit};
use backwatch::errors::{BackupFailureReason, BackwatchError};
use backwatch::fs::mock::MockFileSystem;
use backwatch::types::{ChangeEvent, ChangeKind, SubscriptionPolicy};
use backwatch::watch::IgnoreFilter;
use backwatch_test_utils::builders::ConfigFileBuilder;
use backwatch_test_utils::clock::{at, FixedClock, SteppingClock};
use backwatch_test_utils::fake_source::{ChannelSource, SourceHandle};
use backwatch_test_utils::with_timeout;

type TestResult = Result<(), Box<dyn Error>>;

fn scenario_config() -> ConfigFile {
    ConfigFileBuilder::new("/bk")
        .watch("/data")
        .ignore("*.tmp")
        .build()
}

fn core_for(cfg: &ConfigFile, fs: &MockFileSystem, clock: Arc<dyn Clock>) -> BackupCore {
    BackupCore::from_config(cfg, Arc::new(fs.clone()), clock)
}

struct Harness {
    fs: MockFileSystem,
    source: SourceHandle,
    shutdown: CancellationToken,
    task: tokio::task::JoinHandle<backwatch::errors::Result<LoopExit>>,
}

impl Harness {
    async fn start(cfg: ConfigFile, source: ChannelSource, handle: SourceHandle) -> Harness {
        let fs = MockFileSystem::new();
        let core = core_for(&cfg, &fs, Arc::new(SteppingClock::from_epoch_2024()));
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(EventLoop::new(&cfg, core, source).run(shutdown.clone()));
        Harness {
            fs,
            source: handle,
            shutdown,
            task,
        }
    }

    /// Wait until at least `n` files exist below `/bk`.
    async fn wait_for_backups(&self, n: usize) -> Vec<PathBuf> {
        with_timeout(async {
            loop {
                let files = self.fs.files_under("/bk");
                if files.len() >= n {
                    return files;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
    }

    async fn finish(self) -> backwatch::errors::Result<LoopExit> {
        self.shutdown.cancel();
        with_timeout(self.task).await.expect("event loop task panicked")
    }
}

#[test]
fn decide_only_backs_up_create_and_write() {
    let filter = IgnoreFilter::new(&["*.tmp"]);

    let cases = [
        (ChangeKind::Create, "/data/a.txt", EventDecision::Backup),
        (ChangeKind::Write, "/data/a.txt", EventDecision::Backup),
        (ChangeKind::Other, "/data/a.txt", EventDecision::Skip),
        (ChangeKind::Write, "/data/a.tmp", EventDecision::Ignore),
        (ChangeKind::Other, "/data/a.tmp", EventDecision::Skip),
    ];
    for (kind, path, expected) in cases {
        assert_eq!(decide(&filter, &ChangeEvent::new(path, kind)), expected, "{kind:?} {path}");
    }
}

#[test]
fn process_writes_scenario_backup_at_fixed_time() {
    init_tracing();
    let cfg = scenario_config();
    let fs = MockFileSystem::new();
    fs.add_file("/data/sub/report.csv", "a,b\n");
    let core = core_for(&cfg, &fs, Arc::new(FixedClock(at("2024-01-02T03:04:05"))));

    let outcome = core.process(&ChangeEvent::new("/data/sub/report.csv", ChangeKind::Write));

    match outcome {
        EventOutcome::BackedUp(dest) => {
            assert_eq!(dest, PathBuf::from("/bk/2024-01-02_03-04-05/sub/report.csv"));
        }
        other => panic!("expected BackedUp, got {other:?}"),
    }
    assert_eq!(
        fs.read_file("/bk/2024-01-02_03-04-05/sub/report.csv"),
        Some(b"a,b\n".to_vec())
    );
}

#[test]
fn process_drops_ignored_file_without_writing() {
    let cfg = scenario_config();
    let fs = MockFileSystem::new();
    fs.add_file("/data/a.tmp", "scratch");
    let core = core_for(&cfg, &fs, Arc::new(FixedClock(at("2024-01-02T03:04:05"))));

    let outcome = core.process(&ChangeEvent::new("/data/a.tmp", ChangeKind::Write));

    assert!(matches!(outcome, EventOutcome::Ignored));
    assert!(!fs.exists("/bk"));
}

#[test]
fn process_reports_injected_path_outside_roots() {
    let cfg = scenario_config();
    let fs = MockFileSystem::new();
    fs.add_file("/elsewhere/x.txt", "x");
    let core = core_for(&cfg, &fs, Arc::new(FixedClock(at("2024-01-02T03:04:05"))));

    match core.process(&ChangeEvent::new("/elsewhere/x.txt", ChangeKind::Create)) {
        EventOutcome::Failed(err) => assert_eq!(err.reason(), BackupFailureReason::NoMatchingRoot),
        other => panic!("expected Failed, got {other:?}"),
    }
    assert!(fs.files_under("/").iter().all(|p| !p.starts_with("/bk")));
}

#[test]
fn each_event_gets_its_own_snapshot() {
    let cfg = scenario_config();
    let fs = MockFileSystem::new();
    fs.add_file("/data/a.txt", "v1");
    let core = core_for(&cfg, &fs, Arc::new(SteppingClock::new(at("2024-01-02T03:04:05"))));

    let event = ChangeEvent::new("/data/a.txt", ChangeKind::Write);
    core.process(&event);
    core.process(&event);

    assert_eq!(
        fs.files_under("/bk"),
        vec![
            PathBuf::from("/bk/2024-01-02_03-04-05/a.txt"),
            PathBuf::from("/bk/2024-01-02_03-04-06/a.txt"),
        ]
    );
}

#[test]
fn writer_is_built_from_config() {
    let cfg = scenario_config();
    let writer = BackupWriter::from_config(&cfg, Arc::new(MockFileSystem::new()));
    assert_eq!(writer.backup_base(), Path::new("/bk"));
}

#[tokio::test]
async fn loop_backs_up_writes_and_skips_ignored_files() -> TestResult {
    init_tracing();
    let (source, handle) = ChannelSource::new();
    let h = Harness::start(scenario_config(), source, handle).await;
    h.fs.add_file("/data/a.tmp", "scratch");
    h.fs.add_file("/data/sub/report.csv", "a,b\n");

    let subscribed = with_timeout(h.source.wait_subscribed()).await;
    assert_eq!(subscribed, Some(vec![PathBuf::from("/data")]));

    assert!(h.source.send("/data/a.tmp", ChangeKind::Write));
    assert!(h.source.send("/data/sub/report.csv", ChangeKind::Write));

    let files = h.wait_for_backups(1).await;
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with("sub/report.csv"));
    assert_eq!(h.fs.read_file(&files[0]), Some(b"a,b\n".to_vec()));

    assert_eq!(h.finish().await?, LoopExit::Cancelled);
    Ok(())
}

#[tokio::test]
async fn failures_do_not_stop_the_loop() -> TestResult {
    init_tracing();
    let (source, handle) = ChannelSource::new();
    let h = Harness::start(scenario_config(), source, handle).await;
    h.fs.add_file("/data/later.txt", "still here");
    with_timeout(h.source.wait_subscribed()).await;

    // Deleted before the loop got to it, outside every root, not a write.
    h.source.send("/data/deleted.txt", ChangeKind::Write);
    h.source.send("/tmp/injected.txt", ChangeKind::Create);
    h.source.send("/data/later.txt", ChangeKind::Other);
    h.source.send_error(notify::Error::generic("queue overflow"));
    h.source.send("/data/later.txt", ChangeKind::Create);

    let files = h.wait_for_backups(1).await;
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with("later.txt"));
    assert_eq!(h.fs.read_file(&files[0]), Some(b"still here".to_vec()));

    assert_eq!(h.finish().await?, LoopExit::Cancelled);
    Ok(())
}

#[tokio::test]
async fn rapid_changes_to_one_file_are_backed_up_independently() -> TestResult {
    init_tracing();
    let (source, handle) = ChannelSource::new();
    let h = Harness::start(scenario_config(), source, handle).await;
    h.fs.add_file("/data/hot.log", "line");
    with_timeout(h.source.wait_subscribed()).await;

    for _ in 0..3 {
        h.source.send("/data/hot.log", ChangeKind::Write);
    }

    let files = h.wait_for_backups(3).await;
    assert_eq!(
        files,
        vec![
            PathBuf::from("/bk/2024-01-01_00-00-00/hot.log"),
            PathBuf::from("/bk/2024-01-01_00-00-01/hot.log"),
            PathBuf::from("/bk/2024-01-01_00-00-02/hot.log"),
        ]
    );

    h.finish().await?;
    Ok(())
}

#[tokio::test]
async fn closing_the_event_channel_stops_the_loop() -> TestResult {
    init_tracing();
    let (source, handle) = ChannelSource::new();
    let h = Harness::start(scenario_config(), source, handle).await;
    with_timeout(h.source.wait_subscribed()).await;

    h.source.close_events();

    let exit = with_timeout(h.task).await??;
    assert_eq!(exit, LoopExit::EventsClosed);
    assert!(h.source.is_dropped());
    Ok(())
}

#[tokio::test]
async fn closing_the_error_channel_stops_the_loop() -> TestResult {
    init_tracing();
    let (source, handle) = ChannelSource::new();
    let h = Harness::start(scenario_config(), source, handle).await;
    with_timeout(h.source.wait_subscribed()).await;

    h.source.close_errors();

    let exit = with_timeout(h.task).await??;
    assert_eq!(exit, LoopExit::ErrorsClosed);
    Ok(())
}

#[tokio::test]
async fn stop_drops_the_subscription() -> TestResult {
    init_tracing();
    let (source, handle) = ChannelSource::new();
    let h = Harness::start(scenario_config(), source, handle).await;
    with_timeout(h.source.wait_subscribed()).await;
    let handle = h.source.clone();

    assert_eq!(h.finish().await?, LoopExit::Cancelled);
    assert!(handle.is_dropped());
    assert!(!handle.send("/data/a.txt", ChangeKind::Write));
    Ok(())
}

#[tokio::test]
async fn subscription_failure_aborts_under_abort_policy() {
    init_tracing();
    let cfg = ConfigFileBuilder::new("/bk")
        .watch("/data")
        .watch("/missing")
        .on_watch_error(SubscriptionPolicy::Abort)
        .build();
    let (source, handle) = ChannelSource::new();
    let source = source.fail_on("/missing");
    let h = Harness::start(cfg, source, handle).await;

    match with_timeout(h.task).await.expect("event loop task panicked") {
        Err(BackwatchError::WatchRoot { path, .. }) => assert_eq!(path, PathBuf::from("/missing")),
        other => panic!("expected WatchRoot error, got {other:?}"),
    }
}

#[tokio::test]
async fn subscription_failure_is_skipped_under_skip_policy() -> TestResult {
    init_tracing();
    let cfg = ConfigFileBuilder::new("/bk")
        .watch("/missing")
        .watch("/data")
        .on_watch_error(SubscriptionPolicy::Skip)
        .build();
    let (source, handle) = ChannelSource::new();
    let source = source.fail_on("/missing");
    let h = Harness::start(cfg, source, handle).await;
    h.fs.add_file("/data/a.txt", "ok");

    let subscribed = with_timeout(h.source.wait_subscribed()).await;
    assert_eq!(subscribed, Some(vec![PathBuf::from("/data")]));

    h.source.send("/data/a.txt", ChangeKind::Write);
    let files = h.wait_for_backups(1).await;
    assert!(files[0].ends_with("a.txt"));

    assert_eq!(h.finish().await?, LoopExit::Cancelled);
    Ok(())
}

#[tokio::test]
async fn skip_policy_still_fails_when_nothing_can_be_watched() {
    init_tracing();
    let cfg = ConfigFileBuilder::new("/bk")
        .watch("/missing")
        .on_watch_error(SubscriptionPolicy::Skip)
        .build();
    let (source, handle) = ChannelSource::new();
    let h = Harness::start(cfg, source.fail_on("/missing"), handle).await;

    let res = with_timeout(h.task).await.expect("event loop task panicked");
    assert!(matches!(res, Err(BackwatchError::NothingToWatch(1))));
}
