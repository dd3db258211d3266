// src/main.rs

use std::sync::Arc;
use std::time::Duration;

use arena::catalog::Catalog;
use arena::config::{Config, JudgeMode};
use arena::routes;
use arena::services::judge::{Judge, Judge0Judge, PatternJudge};
use arena::services::rail::{DisabledRail, HttpRewardRail, RewardRail};
use arena::state::AppState;
use arena::store::{MemoryStore, PgStore, Store};
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let store = connect_store(&config).await;

    let catalog = match &config.catalog_path {
        Some(path) => Catalog::from_path(path),
        None => Catalog::builtin(),
    }
    .expect("Failed to load the quiz and problem catalog");
    tracing::info!(
        "Catalog loaded: {} quiz stacks, {} problems",
        catalog.stacks.len(),
        catalog.problems.len()
    );

    let judge: Arc<dyn Judge> = match (config.judge_mode, &config.judge0_url) {
        (JudgeMode::Judge0, Some(url)) => {
            tracing::info!("Judging submissions on {}", url);
            Arc::new(
                Judge0Judge::new(
                    url,
                    config.judge0_api_key.clone(),
                    Duration::from_secs(config.judge0_max_wait_secs),
                )
                .expect("Failed to set up the Judge0 client"),
            )
        }
        (JudgeMode::Judge0, None) => {
            tracing::warn!("JUDGE_MODE=judge0 but JUDGE0_URL is unset, using the pattern judge");
            Arc::new(PatternJudge)
        }
        (JudgeMode::Pattern, _) => Arc::new(PatternJudge),
    };

    let rail: Arc<dyn RewardRail> = match &config.reward_rail_url {
        Some(url) => Arc::new(
            HttpRewardRail::new(
                url,
                config.reward_rail_api_key.clone(),
                Duration::from_secs(config.reward_rail_timeout_secs),
            )
            .expect("Failed to set up the reward rail client"),
        ),
        None => {
            tracing::warn!("REWARD_RAIL_URL is unset, on-chain payouts are disabled");
            Arc::new(DisabledRail)
        }
    };

    let addr = config.bind_addr;
    let state = AppState::new(store, config, catalog, judge, rail);
    let app = routes::create_router(state);

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    axum::serve(listener, app).await.unwrap();
}

/// Postgres when `DATABASE_URL` is set (with connect retries and
/// migrations), otherwise the in-memory store.
async fn connect_store(config: &Config) -> Arc<dyn Store> {
    let Some(database_url) = &config.database_url else {
        tracing::warn!("DATABASE_URL is unset, using the in-memory store. Data is lost on exit.");
        return Arc::new(MemoryStore::new());
    };

    let mut retry_count = 0;
    let pool = loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    panic!("Failed to connect to database after 5 retries: {}", e);
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };
    tracing::info!("Database connected...");

    tracing::info!("Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations applied successfully.");

    Arc::new(PgStore::new(pool))
}
