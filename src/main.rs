mod app;
mod auth;
mod config;
mod db;
mod error;
mod households;
mod invitations;
mod patch;
mod people;
mod profile;
mod state;
mod storage;
mod tasks;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "homeshare=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = state::AppState::init().await?;
    db::run_migrations(&app_state.db).await?;

    app::serve(app::build_app(app_state)).await
}
