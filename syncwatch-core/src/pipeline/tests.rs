use super::*;
use crate::error::WatchError;
use crate::watch::ChannelSource;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::sleep;

#[derive(Default)]
struct RecordingNotifier {
    calls: Mutex<Vec<(String, String)>>,
    delay: Duration,
}

impl RecordingNotifier {
    fn slow(delay: Duration) -> Self {
        Self { delay, ..Self::default() }
    }

    fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn rescan(&self, repo: &str, sub: &str) -> Result<(), ApiError> {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        self.calls.lock().unwrap().push((repo.to_string(), sub.to_string()));
        Ok(())
    }
}

struct RejectingNotifier;

#[async_trait]
impl Notifier for RejectingNotifier {
    async fn rescan(&self, _repo: &str, _sub: &str) -> Result<(), ApiError> {
        Err(ApiError::Status { method: "POST", url: "http://stub/rest/scan".to_string(), status: 403 })
    }
}

fn sync_root() -> WatchRoot {
    WatchRoot::new("default", "/srv/sync")
}

fn pipeline(notifier: Arc<dyn Notifier>) -> Pipeline {
    Pipeline::new(sync_root(), DebouncerConfig::default(), notifier)
}

#[tokio::test(start_paused = true)]
async fn test_pipeline_reports_collapsed_batch() {
    let notifier = Arc::new(RecordingNotifier::default());
    let (source, tx) = ChannelSource::new();
    let running = tokio::spawn(pipeline(notifier.clone()).run(Box::new(source)));

    for i in 0..11 {
        tx.send(Ok(format!("/srv/sync/photos/img{i}.jpg"))).unwrap();
    }
    tx.send(Ok("/srv/sync/todo.txt".to_string())).unwrap();
    sleep(Duration::from_millis(100)).await;
    assert!(notifier.calls().is_empty());

    sleep(Duration::from_millis(300)).await;
    // `photos` crosses the threshold alone, so the lone root-level file does
    // not widen the report to the whole root
    assert_eq!(
        notifier.calls(),
        [
            ("default".to_string(), "photos".to_string()),
            ("default".to_string(), "todo.txt".to_string()),
        ]
    );

    tx.send(Ok("/srv/sync/todo.txt".to_string())).unwrap();
    sleep(Duration::from_millis(400)).await;
    assert_eq!(notifier.calls()[2], ("default".to_string(), "todo.txt".to_string()));

    tx.send(Err(WatchError::Source("disk unplugged".to_string()))).unwrap();
    let err = running.await.unwrap().unwrap_err();
    assert_eq!(err.repo(), "default");
    assert!(matches!(err, PipelineError::Watch { source: WatchError::Source(_), .. }));
}

#[tokio::test(start_paused = true)]
async fn test_directory_burst_reports_subdirectory() {
    let notifier = Arc::new(RecordingNotifier::default());
    let (source, tx) = ChannelSource::new();
    let _running = tokio::spawn(pipeline(notifier.clone()).run(Box::new(source)));

    for i in 0..11 {
        tx.send(Ok(format!("/srv/sync/music/album/track{i}.flac"))).unwrap();
    }
    sleep(Duration::from_millis(400)).await;

    assert_eq!(notifier.calls(), [("default".to_string(), "music/album".to_string())]);
}

#[tokio::test]
async fn test_source_close_ends_pipeline() {
    let (source, tx) = ChannelSource::new();
    drop(tx);

    let err = pipeline(Arc::new(RecordingNotifier::default()))
        .run(Box::new(source))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Watch { source: WatchError::Closed, .. }));
}

#[tokio::test(start_paused = true)]
async fn test_notifier_failure_ends_pipeline() {
    let (source, tx) = ChannelSource::new();
    let running = tokio::spawn(pipeline(Arc::new(RejectingNotifier)).run(Box::new(source)));

    tx.send(Ok("/srv/sync/a.txt".to_string())).unwrap();
    let err = running.await.unwrap().unwrap_err();

    assert!(matches!(err, PipelineError::Notify { source: ApiError::Status { status: 403, .. }, .. }));
}

#[tokio::test(start_paused = true)]
async fn test_slow_notifier_does_not_stall_accumulation() {
    let notifier = Arc::new(RecordingNotifier::slow(Duration::from_secs(10)));
    let (source, tx) = ChannelSource::new();
    let _running = tokio::spawn(pipeline(notifier.clone()).run(Box::new(source)));

    tx.send(Ok("/srv/sync/first.txt".to_string())).unwrap();
    sleep(Duration::from_millis(400)).await;

    // First delivery is still in flight while the next batch accumulates
    tx.send(Ok("/srv/sync/second.txt".to_string())).unwrap();
    sleep(Duration::from_millis(400)).await;
    assert!(notifier.calls().is_empty());

    sleep(Duration::from_secs(30)).await;
    assert_eq!(
        notifier.calls(),
        [
            ("default".to_string(), "first.txt".to_string()),
            ("default".to_string(), "second.txt".to_string()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_abort_all_on_single_root_failure() {
    let senders = Arc::new(Mutex::new(HashMap::new()));
    let registry = senders.clone();
    let supervisor = Supervisor::new(
        SupervisorConfig::default(),
        DebouncerConfig::default(),
        Arc::new(RecordingNotifier::default()),
        move |root: &WatchRoot| {
            let (source, tx) = ChannelSource::new();
            registry.lock().unwrap().insert(root.id.clone(), tx);
            Ok(Box::new(source) as Box<dyn EventSource>)
        },
    );
    let roots = vec![WatchRoot::new("docs", "/srv/docs"), WatchRoot::new("music", "/srv/music")];

    let fail_music = async {
        tokio::task::yield_now().await;
        let tx = senders.lock().unwrap().get("music").cloned().unwrap();
        tx.send(Err(WatchError::Source("disk gone".to_string()))).unwrap();
    };
    let (result, ()) = tokio::join!(supervisor.run(roots), fail_music);

    let err = result.unwrap_err();
    assert_eq!(err.repo(), "music");
}

#[tokio::test(start_paused = true)]
async fn test_abort_all_drops_pending_batches() {
    let notifier = Arc::new(RecordingNotifier::default());
    let senders = Arc::new(Mutex::new(HashMap::new()));
    let registry = senders.clone();
    let supervisor = Supervisor::new(
        SupervisorConfig::default(),
        DebouncerConfig::default(),
        notifier.clone(),
        move |root: &WatchRoot| {
            let (source, tx) = ChannelSource::new();
            registry.lock().unwrap().insert(root.id.clone(), tx);
            Ok(Box::new(source) as Box<dyn EventSource>)
        },
    );
    let roots = vec![WatchRoot::new("docs", "/srv/docs"), WatchRoot::new("music", "/srv/music")];

    let fail_music = async {
        tokio::task::yield_now().await;
        let docs = senders.lock().unwrap().get("docs").cloned().unwrap();
        let music = senders.lock().unwrap().get("music").cloned().unwrap();
        docs.send(Ok("/srv/docs/pending.txt".to_string())).unwrap();
        tokio::task::yield_now().await;
        music.send(Err(WatchError::Source("disk gone".to_string()))).unwrap();
    };
    let (result, ()) = tokio::join!(supervisor.run(roots), fail_music);
    assert_eq!(result.unwrap_err().repo(), "music");

    // The healthy root's debouncer went down with the supervisor
    sleep(Duration::from_secs(2)).await;
    assert!(notifier.calls().is_empty());
}

/// Source that fails after a fixed time
struct FailingSource {
    after: Duration,
}

#[async_trait]
impl EventSource for FailingSource {
    async fn next_event(&mut self) -> Option<Result<String, WatchError>> {
        sleep(self.after).await;
        Some(Err(WatchError::Source("watch lost".to_string())))
    }
}

#[tokio::test(start_paused = true)]
async fn test_long_healthy_run_resets_restart_budget() {
    let opened = Arc::new(AtomicUsize::new(0));
    let counter = opened.clone();
    let config = SupervisorConfig {
        policy: FailurePolicy::RestartRoot,
        max_restarts: 1,
        restart_delay_ms: 50,
        stable_after_secs: 60,
    };
    let supervisor = Supervisor::new(
        config,
        DebouncerConfig::default(),
        Arc::new(RecordingNotifier::default()),
        move |_root: &WatchRoot| {
            // Second watch stays healthy for two minutes, the others fail at once
            let after = match counter.fetch_add(1, Ordering::SeqCst) {
                1 => Duration::from_secs(120),
                _ => Duration::ZERO,
            };
            Ok(Box::new(FailingSource { after }) as Box<dyn EventSource>)
        },
    );

    let err = supervisor.run(vec![sync_root()]).await.unwrap_err();

    assert!(matches!(err, PipelineError::Watch { source: WatchError::Source(_), .. }));
    assert_eq!(opened.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_restart_root_reopens_failed_source() {
    let opened = Arc::new(AtomicUsize::new(0));
    let counter = opened.clone();
    let config = SupervisorConfig {
        policy: FailurePolicy::RestartRoot,
        max_restarts: 2,
        restart_delay_ms: 50,
        stable_after_secs: 600,
    };
    let supervisor = Supervisor::new(
        config,
        DebouncerConfig::default(),
        Arc::new(RecordingNotifier::default()),
        move |_root: &WatchRoot| {
            counter.fetch_add(1, Ordering::SeqCst);
            // Sender dropped right away: the source reports closed
            let (source, _tx) = ChannelSource::new();
            Ok(Box::new(source) as Box<dyn EventSource>)
        },
    );

    let err = supervisor.run(vec![sync_root()]).await.unwrap_err();

    assert!(matches!(err, PipelineError::Watch { source: WatchError::Closed, .. }));
    assert_eq!(opened.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_open_failure_is_reported() {
    let supervisor = Supervisor::new(
        SupervisorConfig::default(),
        DebouncerConfig::default(),
        Arc::new(RecordingNotifier::default()),
        |_root: &WatchRoot| -> Result<Box<dyn EventSource>, WatchError> {
            Err(WatchError::Source("permission denied".to_string()))
        },
    );

    let err = supervisor.run(vec![sync_root()]).await.unwrap_err();
    assert_eq!(err.repo(), "default");
}

#[tokio::test]
async fn test_no_roots_returns_immediately() {
    let supervisor = Supervisor::new(
        SupervisorConfig::default(),
        DebouncerConfig::default(),
        Arc::new(RecordingNotifier::default()),
        |_root: &WatchRoot| -> Result<Box<dyn EventSource>, WatchError> { Err(WatchError::Closed) },
    );
    assert!(supervisor.run(Vec::new()).await.is_ok());
}
