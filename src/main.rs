use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;

use coursesmith::application::ports::{ContentProvider, JobStore};
use coursesmith::application::services::{JobDispatcher, RateLimiter, Watchdog};
use coursesmith::infrastructure::cache::MemoryKeyValueStore;
use coursesmith::infrastructure::llm::{CannedProvider, OpenAiProvider};
use coursesmith::infrastructure::observability::init_tracing;
use coursesmith::infrastructure::persistence::{create_pool, MemoryJobStore, PgJobStore};
use coursesmith::presentation::{create_router, AppState, ScaffoldConfig, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env();
    let scaffold = ScaffoldConfig::default();

    init_tracing(
        &settings.logging.environment,
        settings.logging.json_format,
        settings.server.port,
    );

    let (job_store, provider): (Arc<dyn JobStore>, Arc<dyn ContentProvider>) = if scaffold.enabled
    {
        tracing::warn!("Scaffold mode: in-memory store, canned content provider");
        (
            Arc::new(MemoryJobStore::new()),
            Arc::new(CannedProvider::new(std::time::Duration::from_millis(
                scaffold.chapter_delay_ms,
            ))),
        )
    } else {
        let pool = create_pool(
            &settings.database.url,
            settings.database.max_connections,
        )
        .await?;
        sqlx::migrate!().run(&pool).await?;

        let provider = OpenAiProvider::new(
            settings.provider.base_url.clone(),
            settings.provider.api_key.clone(),
            settings.provider.model.clone(),
            settings.provider.timeout(),
        )?;
        (Arc::new(PgJobStore::new(pool)), Arc::new(provider))
    };

    let kv_store = Arc::new(MemoryKeyValueStore::new());
    let rate_limiter = Arc::new(RateLimiter::new(kv_store));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    for worker in 0..settings.dispatcher.workers {
        let dispatcher = JobDispatcher::new(
            Arc::clone(&job_store),
            Arc::clone(&provider),
            format!("worker-{}-{}", worker, uuid::Uuid::new_v4()),
            settings.dispatcher.poll_interval(),
        );
        tokio::spawn(dispatcher.run(shutdown_rx.clone()));
    }

    let watchdog = Watchdog::new(
        Arc::clone(&job_store),
        settings.watchdog.stale_after(),
        settings.watchdog.scan_interval(),
    );
    tokio::spawn(watchdog.run(shutdown_rx));

    let state = AppState::new(job_store, rate_limiter, settings.rate_limit.clone());
    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    // Stop dispatcher and watchdog loops once the listener is down.
    let _ = shutdown_tx.send(true);

    Ok(())
}
