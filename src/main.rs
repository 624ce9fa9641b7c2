use signup::{app, logging, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init_tracing("signup=debug,axum=info,tower_http=info");

    let app_state = AppState::init().await?;
    tracing::info!(
        csv_path = %app_state.config.csv_path.display(),
        csv_strategy = ?app_state.config.csv_strategy,
        "signup service ready"
    );

    let (host, port) = (app_state.config.host.clone(), app_state.config.port);
    app::serve(app::build_app(app_state), &host, port).await
}
