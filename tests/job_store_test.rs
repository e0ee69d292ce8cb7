use std::sync::Arc;
use std::time::Duration;

use coursesmith::application::ports::JobStore;
use coursesmith::domain::{
    ChapterContent, CourseKind, CourseSpec, GenerationErrorKind, JobError, JobStatus,
};
use coursesmith::infrastructure::persistence::MemoryJobStore;

fn spec(total_chapters: u32) -> CourseSpec {
    CourseSpec {
        title: "Test Course".to_string(),
        level: 2,
        kind: CourseKind::Lesson,
        topics: vec!["greetings".to_string()],
        total_chapters,
        include_exercises: true,
        include_vocabulary: true,
        references: vec![],
    }
}

fn chapter(title: &str) -> ChapterContent {
    ChapterContent {
        title: title.to_string(),
        introduction: "intro".to_string(),
        vocabulary: vec![],
        grammar_points: vec![],
        exercises: vec![],
        sections: vec![],
        estimated_minutes: 10,
    }
}

#[tokio::test]
async fn given_same_chapter_upserted_twice_then_count_is_unchanged_and_latest_write_wins() {
    let store = MemoryJobStore::new();
    let id = store.create_queued(spec(3), None).await.unwrap();
    store.claim(id, "w1").await.unwrap();

    store.upsert_chapter(id, 1, chapter("first")).await.unwrap();
    store
        .upsert_chapter(id, 1, chapter("rewritten"))
        .await
        .unwrap();

    let job = store.get(id).await.unwrap().unwrap();
    assert_eq!(job.completed_chapters, 1);
    assert_eq!(job.current_chapter, 1);

    let chapters = store.chapters(id).await.unwrap();
    assert_eq!(chapters.len(), 1);
    assert_eq!(chapters[0].content.title, "rewritten");
}

#[tokio::test]
async fn given_incomplete_job_when_marking_completed_then_transition_is_refused() {
    let store = MemoryJobStore::new();
    let id = store.create_queued(spec(2), None).await.unwrap();
    store.claim(id, "w1").await.unwrap();
    store.upsert_chapter(id, 1, chapter("one")).await.unwrap();

    assert!(!store.mark_completed(id).await.unwrap());
    assert_eq!(
        store.get(id).await.unwrap().unwrap().status,
        JobStatus::Generating
    );

    store.upsert_chapter(id, 2, chapter("two")).await.unwrap();
    assert!(store.mark_completed(id).await.unwrap());

    let job = store.get(id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.completed_chapters, job.spec.total_chapters);
    assert!(job.completed_at.is_some());
}

#[tokio::test]
async fn given_concurrent_claims_then_exactly_one_worker_wins() {
    let store = Arc::new(MemoryJobStore::new());
    let id = store.create_queued(spec(3), None).await.unwrap();

    let mut handles = Vec::new();
    for worker in 0..8 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.claim(id, &format!("w{}", worker)).await.unwrap()
        }));
    }

    let mut wins = 0;
    for handle in handles {
        if handle.await.unwrap() {
            wins += 1;
        }
    }
    assert_eq!(wins, 1);

    let job = store.get(id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Generating);
    assert!(job.claimed_by.is_some());
    assert!(job.started_at.is_some());
}

#[tokio::test]
async fn given_failed_job_then_persisted_chapters_are_retained() {
    let store = MemoryJobStore::new();
    let id = store.create_queued(spec(10), None).await.unwrap();
    store.claim(id, "w1").await.unwrap();
    for n in 1..=3 {
        store
            .upsert_chapter(id, n, chapter(&format!("ch{}", n)))
            .await
            .unwrap();
    }

    let recorded = store
        .mark_failed(
            id,
            "w1",
            JobError {
                kind: GenerationErrorKind::Timeout,
                message: "request timed out".to_string(),
                failed_at_chapter: 4,
            },
        )
        .await
        .unwrap();
    assert!(recorded);

    let job = store.get(id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.completed_chapters, 3);
    let error = job.last_error.unwrap();
    assert_eq!(error.failed_at_chapter, 4);
    assert_eq!(error.kind, GenerationErrorKind::Timeout);

    assert_eq!(store.chapters(id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn given_completed_job_when_former_claimant_fails_it_then_terminal_state_is_kept() {
    let store = MemoryJobStore::new();
    let id = store.create_queued(spec(1), None).await.unwrap();

    // Worker a stalls, the watchdog reclaims, worker b finishes the job.
    store.claim(id, "worker-a").await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(store.reclaim(id, Duration::from_millis(5)).await.unwrap());
    assert!(store.claim(id, "worker-b").await.unwrap());
    store.upsert_chapter(id, 1, chapter("one")).await.unwrap();
    assert!(store.mark_completed(id).await.unwrap());

    // The slow-but-alive worker a comes back with a failure.
    let recorded = store
        .mark_failed(
            id,
            "worker-a",
            JobError {
                kind: GenerationErrorKind::Timeout,
                message: "request timed out".to_string(),
                failed_at_chapter: 1,
            },
        )
        .await
        .unwrap();
    assert!(!recorded);

    let job = store.get(id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.completed_chapters, job.spec.total_chapters);
    assert!(job.last_error.is_none());
}

#[tokio::test]
async fn given_reclaimed_job_when_former_claimant_fails_it_then_failure_is_refused() {
    let store = MemoryJobStore::new();
    let id = store.create_queued(spec(2), None).await.unwrap();

    store.claim(id, "worker-a").await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(store.reclaim(id, Duration::from_millis(5)).await.unwrap());
    assert!(store.claim(id, "worker-b").await.unwrap());

    // Still Generating, but under worker b's claim now.
    let recorded = store
        .mark_failed(
            id,
            "worker-a",
            JobError {
                kind: GenerationErrorKind::RequestFailed,
                message: "connection reset".to_string(),
                failed_at_chapter: 1,
            },
        )
        .await
        .unwrap();
    assert!(!recorded);

    let job = store.get(id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Generating);
    assert_eq!(job.claimed_by.as_deref(), Some("worker-b"));
}

#[tokio::test]
async fn given_fresh_heartbeat_when_reclaiming_then_claim_is_kept() {
    let store = MemoryJobStore::new();
    let id = store.create_queued(spec(2), None).await.unwrap();
    store.claim(id, "w1").await.unwrap();

    let reclaimed = store.reclaim(id, Duration::from_secs(300)).await.unwrap();
    assert!(!reclaimed);
    assert_eq!(
        store.get(id).await.unwrap().unwrap().status,
        JobStatus::Generating
    );
}

#[tokio::test]
async fn given_stale_heartbeat_when_reclaiming_then_job_returns_to_queue() {
    let store = MemoryJobStore::new();
    let id = store.create_queued(spec(2), None).await.unwrap();
    store.claim(id, "w1").await.unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;
    let reclaimed = store.reclaim(id, Duration::from_millis(5)).await.unwrap();
    assert!(reclaimed);

    let job = store.get(id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Queued);
    assert!(job.claimed_by.is_none());
    assert!(job.claimed_at.is_none());

    // Reclaimed jobs are claimable again.
    assert!(store.claim(id, "w2").await.unwrap());
}

#[tokio::test]
async fn given_queued_job_when_cancelling_then_job_is_terminal_and_unclaimable() {
    let store = MemoryJobStore::new();
    let id = store.create_queued(spec(2), None).await.unwrap();

    assert!(store.cancel(id).await.unwrap());
    let job = store.get(id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Cancelled);

    assert!(!store.claim(id, "w1").await.unwrap());
}

#[tokio::test]
async fn given_claimed_job_when_cancelling_then_cancel_is_refused() {
    let store = MemoryJobStore::new();
    let id = store.create_queued(spec(2), None).await.unwrap();
    store.claim(id, "w1").await.unwrap();

    assert!(!store.cancel(id).await.unwrap());
}

#[tokio::test]
async fn given_two_queued_jobs_when_polling_then_oldest_is_returned_first() {
    let store = MemoryJobStore::new();
    let first = store.create_queued(spec(1), None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = store.create_queued(spec(1), None).await.unwrap();

    assert_eq!(store.next_queued().await.unwrap(), Some(first));
    store.claim(first, "w1").await.unwrap();
    assert_eq!(store.next_queued().await.unwrap(), Some(second));
}
