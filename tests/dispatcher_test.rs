use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use coursesmith::application::ports::{ContentProvider, ContentProviderError, JobStore};
use coursesmith::application::services::{JobDispatcher, Watchdog};
use coursesmith::domain::{
    ChapterContent, CourseKind, CourseSpec, GenerationErrorKind, JobStatus,
};
use coursesmith::infrastructure::persistence::MemoryJobStore;

/// Records every (chapter, topic) call; fails chapters at or past `fail_at`.
struct ScriptedProvider {
    calls: Mutex<Vec<(u32, String)>>,
    fail_at: Option<u32>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    fn new(fail_at: Option<u32>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_at,
            delay: None,
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn calls(&self) -> Vec<(u32, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentProvider for ScriptedProvider {
    async fn generate_chapter(
        &self,
        _spec: &CourseSpec,
        topic: &str,
        chapter_number: u32,
    ) -> Result<ChapterContent, ContentProviderError> {
        self.calls
            .lock()
            .unwrap()
            .push((chapter_number, topic.to_string()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_at.is_some_and(|n| chapter_number >= n) {
            return Err(ContentProviderError::Timeout("upstream stalled".to_string()));
        }

        Ok(ChapterContent {
            title: format!("Chapter {}", chapter_number),
            introduction: format!("About {}", topic),
            vocabulary: vec![],
            grammar_points: vec![],
            exercises: vec![],
            sections: vec![],
            estimated_minutes: 12,
        })
    }
}

fn spec(topics: &[&str], total_chapters: u32) -> CourseSpec {
    CourseSpec {
        title: "Test Course".to_string(),
        level: 3,
        kind: CourseKind::Lesson,
        topics: topics.iter().map(|t| t.to_string()).collect(),
        total_chapters,
        include_exercises: true,
        include_vocabulary: true,
        references: vec![],
    }
}

fn dispatcher(
    store: &Arc<MemoryJobStore>,
    provider: &Arc<ScriptedProvider>,
    worker_id: &str,
) -> JobDispatcher {
    let store: Arc<dyn JobStore> = Arc::clone(store) as Arc<dyn JobStore>;
    JobDispatcher::new(
        store,
        Arc::clone(provider) as Arc<dyn ContentProvider>,
        worker_id.to_string(),
        Duration::from_millis(10),
    )
}

#[tokio::test]
async fn given_queued_job_when_dispatched_then_job_completes_with_all_chapters() {
    let store = Arc::new(MemoryJobStore::new());
    let provider = Arc::new(ScriptedProvider::new(None));
    let id = store
        .create_queued(spec(&["greetings"], 2), None)
        .await
        .unwrap();

    let processed = dispatcher(&store, &provider, "w1").run_once().await.unwrap();
    assert!(processed);

    let job = store.get(id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.completed_chapters, 2);
    assert_eq!(job.current_chapter, 2);
    assert_eq!(store.chapters(id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn given_fewer_topics_than_chapters_then_topics_rotate_in_order() {
    let store = Arc::new(MemoryJobStore::new());
    let provider = Arc::new(ScriptedProvider::new(None));
    store
        .create_queued(spec(&["A", "B"], 5), None)
        .await
        .unwrap();

    dispatcher(&store, &provider, "w1").run_once().await.unwrap();

    let topics: Vec<String> = provider.calls().into_iter().map(|(_, t)| t).collect();
    assert_eq!(topics, ["A", "B", "A", "B", "A"]);
}

#[tokio::test]
async fn given_provider_failure_at_chapter_four_then_first_three_chapters_survive() {
    let store = Arc::new(MemoryJobStore::new());
    let provider = Arc::new(ScriptedProvider::new(Some(4)));
    let id = store
        .create_queued(spec(&["greetings"], 10), None)
        .await
        .unwrap();

    dispatcher(&store, &provider, "w1").run_once().await.unwrap();

    let job = store.get(id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.completed_chapters, 3);

    let error = job.last_error.unwrap();
    assert_eq!(error.failed_at_chapter, 4);
    assert_eq!(error.kind, GenerationErrorKind::Timeout);

    // The loop stopped at the failure: no skip-ahead calls.
    assert_eq!(provider.calls().len(), 4);
    assert_eq!(store.chapters(id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn given_reclaimed_job_when_redispatched_then_generation_resumes_not_restarts() {
    let store = Arc::new(MemoryJobStore::new());
    let id = store
        .create_queued(spec(&["A", "B"], 5), None)
        .await
        .unwrap();

    // First worker checkpoints chapters 1-3 and then goes silent.
    let crashed = Arc::new(ScriptedProvider::new(None));
    store.claim(id, "crashed-worker").await.unwrap();
    for n in 1..=3 {
        let content = crashed
            .generate_chapter(&spec(&["A", "B"], 5), "A", n)
            .await
            .unwrap();
        store.upsert_chapter(id, n, content).await.unwrap();
    }

    tokio::time::sleep(Duration::from_millis(20)).await;
    let store_dyn: Arc<dyn JobStore> = Arc::clone(&store) as Arc<dyn JobStore>;
    let watchdog = Watchdog::new(
        store_dyn,
        Duration::from_millis(5),
        Duration::from_millis(10),
    );
    assert_eq!(watchdog.run_once().await.unwrap(), 1);

    let fresh = Arc::new(ScriptedProvider::new(None));
    dispatcher(&store, &fresh, "w2").run_once().await.unwrap();

    // Only the remaining chapters were generated.
    let chapters: Vec<u32> = fresh.calls().into_iter().map(|(n, _)| n).collect();
    assert_eq!(chapters, [4, 5]);

    let job = store.get(id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.completed_chapters, 5);
}

#[tokio::test]
async fn given_empty_queue_when_dispatching_then_nothing_happens() {
    let store = Arc::new(MemoryJobStore::new());
    let provider = Arc::new(ScriptedProvider::new(None));

    let processed = dispatcher(&store, &provider, "w1").run_once().await.unwrap();
    assert!(!processed);
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn given_busy_queue_when_shutdown_signalled_then_dispatcher_stops_between_jobs() {
    let store = Arc::new(MemoryJobStore::new());
    let provider = Arc::new(ScriptedProvider::new(None).with_delay(Duration::from_millis(100)));
    for _ in 0..3 {
        store.create_queued(spec(&["A"], 1), None).await.unwrap();
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let handle = tokio::spawn(dispatcher(&store, &provider, "w1").run(shutdown_rx));

    // Signal while the first job is still in flight and two more are queued.
    tokio::time::sleep(Duration::from_millis(30)).await;
    shutdown_tx.send(true).unwrap();

    // The in-flight job finishes; the rest of the queue must not be drained.
    tokio::time::timeout(Duration::from_millis(200), handle)
        .await
        .expect("dispatcher should stop before the queue empties")
        .unwrap();

    assert!(store.next_queued().await.unwrap().is_some());
}

#[tokio::test]
async fn given_healthy_worker_when_watchdog_scans_then_no_job_is_reclaimed() {
    let store = Arc::new(MemoryJobStore::new());
    let id = store
        .create_queued(spec(&["A"], 3), None)
        .await
        .unwrap();
    store.claim(id, "w1").await.unwrap();

    let store_dyn: Arc<dyn JobStore> = Arc::clone(&store) as Arc<dyn JobStore>;
    let watchdog = Watchdog::new(store_dyn, Duration::from_secs(300), Duration::from_secs(60));
    assert_eq!(watchdog.run_once().await.unwrap(), 0);
}
